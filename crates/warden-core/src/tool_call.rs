//! The immutable view of a requested tool operation.
//!
//! A [`ToolCall`] is constructed once per invocation and never mutated.
//! Parameters arrive as loose JSON from the agent runtime; accessors treat
//! absent or mistyped fields as empty rather than failing, so malformed
//! input can never abort signal extraction.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// A tool invocation the agent wants to perform.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    /// Tool name as reported by the runtime (e.g. `exec`, `message:send`).
    pub name: String,
    /// Raw tool parameters.
    pub parameters: Map<String, Value>,
}

impl ToolCall {
    /// Create a new tool call.
    #[must_use]
    pub fn new(name: impl Into<String>, parameters: Map<String, Value>) -> Self {
        Self {
            name: name.into(),
            parameters,
        }
    }

    /// Create a tool call with no parameters.
    #[must_use]
    pub fn bare(name: impl Into<String>) -> Self {
        Self::new(name, Map::new())
    }

    /// Classify the call by tool kind.
    #[must_use]
    pub fn kind(&self) -> ToolKind {
        ToolKind::from_name(&self.name)
    }

    /// Get a string parameter, treating anything non-string as absent.
    #[must_use]
    pub fn param_str(&self, key: &str) -> Option<&str> {
        self.parameters.get(key).and_then(Value::as_str)
    }

    /// Get an array parameter, treating anything non-array as absent.
    #[must_use]
    pub fn param_array(&self, key: &str) -> Option<&Vec<Value>> {
        self.parameters.get(key).and_then(Value::as_array)
    }

    /// Check whether a parameter is present with any truthy value.
    #[must_use]
    pub fn param_present(&self, key: &str) -> bool {
        match self.parameters.get(key) {
            None | Some(Value::Null) => false,
            Some(Value::Bool(b)) => *b,
            Some(Value::String(s)) => !s.is_empty(),
            Some(_) => true,
        }
    }

    /// Resolve the call's primary target: a path, URL, or command.
    ///
    /// Auto-rules and escalation prompts match against this string. Falls
    /// back to the empty string when no recognized parameter is present.
    #[must_use]
    pub fn target(&self) -> &str {
        self.param_str("path")
            .or_else(|| self.param_str("file_path"))
            .or_else(|| self.param_str("url"))
            .or_else(|| self.param_str("command"))
            .or_else(|| self.param_str("target"))
            .unwrap_or("")
    }
}

impl fmt::Display for ToolCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let target = self.target();
        if target.is_empty() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{} {}", self.name, target)
        }
    }
}

/// Coarse classification of tool calls; drives which structural cues the
/// signal extractor looks for and which risk threshold applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolKind {
    /// Outbound message (chat, email, broadcast).
    MessageSend,
    /// File creation or overwrite.
    FileWrite,
    /// In-place file edit.
    FileEdit,
    /// Shell command execution.
    Exec,
    /// Browser automation.
    Browser,
    /// Anything else.
    Other,
}

impl ToolKind {
    /// Classify a tool by its runtime name.
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        match name {
            "message:send" | "message" | "send" => Self::MessageSend,
            "write" => Self::FileWrite,
            "edit" => Self::FileEdit,
            "exec" | "shell" | "bash" => Self::Exec,
            "browser" => Self::Browser,
            _ => Self::Other,
        }
    }

    /// Whether this kind touches the filesystem.
    #[must_use]
    pub fn is_file_op(&self) -> bool {
        matches!(self, Self::FileWrite | Self::FileEdit)
    }
}

impl fmt::Display for ToolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MessageSend => write!(f, "message:send"),
            Self::FileWrite => write!(f, "write"),
            Self::FileEdit => write!(f, "edit"),
            Self::Exec => write!(f, "exec"),
            Self::Browser => write!(f, "browser"),
            Self::Other => write!(f, "other"),
        }
    }
}
