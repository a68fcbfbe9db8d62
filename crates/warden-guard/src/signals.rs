//! Signal extraction: lexical and structural risk cues.
//!
//! Extraction is deterministic and total. Every accessor treats absent or
//! malformed parameters as empty, so a hostile or buggy runtime cannot
//! crash the extractor or skip a check by sending garbage. A factor may
//! appear more than once when independent cues hit it; each occurrence
//! contributes weight separately.

use regex::{Regex, RegexSet};
use std::collections::HashSet;
use std::sync::LazyLock;
use warden_core::{AmbientContext, RecentHistory, RiskFactor, ToolCall, ToolKind};

/// Bulk-send target count above which a message looks like exfiltration.
const BULK_TARGET_LIMIT: usize = 3;

/// Word-set similarity above which a turn counts as a repeat.
const REPEAT_SIMILARITY: f64 = 0.7;

/// How many prior turns the anomaly check looks back over.
const ANOMALY_WINDOW: usize = 3;

static SENSITIVE_EXEC: LazyLock<RegexSet> = LazyLock::new(|| {
    RegexSet::new([
        r"\bsudo\b",
        r"\brm\s+-[rf]",
        r"\brm\b.*\*",
        r"\bcurl\b.*\|",
        r"\bwget\b.*\|",
        r"\bssh\b",
        r"\bscp\b",
        r"\bmkfs\b",
        r"\bdd\b.*of=",
        r"\bchmod\s+777\b",
    ])
    .unwrap_or_else(|_| RegexSet::empty())
});

static SENSITIVE_PATHS: LazyLock<RegexSet> = LazyLock::new(|| {
    RegexSet::new([
        r"^/etc/\w+",
        r"^/usr/local/\w+",
        r"^/bin/\w+",
        r"^/sbin/\w+",
        r"^/boot/\w+",
        r"^/sys/\w+",
        r"^/proc/\w+",
        r"/\.ssh/",
        r"/\.gnupg/",
        r"/\.aws/",
        r"\.env$",
        r"\.pem$",
        r"\.key$",
    ])
    .unwrap_or_else(|_| RegexSet::empty())
});

static SOCIAL_ENGINEERING_CUES: LazyLock<RegexSet> = LazyLock::new(|| {
    RegexSet::new([
        r"(?i)urgent",
        r"(?i)immediately",
        r"(?i)asap",
        r"(?i)emergency",
        r"(?i)critical",
        r"(?i)do not tell",
        r"(?i)do not share",
        r"(?i)between you and me",
        r"(?i)confidential",
        r"(?i)secret",
        r"(?i)authorized by",
        r"(?i)manager asked",
        r"(?i)ceo requested",
    ])
    .unwrap_or_else(|_| RegexSet::empty())
});

static SENSITIVE_DOMAINS: LazyLock<RegexSet> = LazyLock::new(|| {
    RegexSet::new([
        r"(?i)password",
        r"(?i)login",
        r"(?i)signin",
        r"(?i)account",
        r"(?i)admin",
        r"(?i)panel",
        r"(?i)dashboard",
        r"(?i)manage",
        r"(?i)portal",
    ])
    .unwrap_or_else(|_| RegexSet::empty())
});

static SUDO: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"\bsudo\b").ok());
static REMOTE_SHELL: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"\b(ssh|scp)\b").ok());
static FETCH_PIPE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"\b(curl|wget)\b.*\|").ok());
static AUTH_URL: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"login|signin|auth").ok());
static SYSTEM_TOPIC: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?i)system|instructions|rules|prompt").ok());

fn matches_opt(re: &Option<Regex>, text: &str) -> bool {
    re.as_ref().is_some_and(|re| re.is_match(text))
}

/// Extract every risk factor present in a tool call under the given
/// context. Same inputs always yield the same factor list.
#[must_use]
pub fn extract(call: &ToolCall, context: &AmbientContext) -> Vec<RiskFactor> {
    let mut factors = Vec::new();

    match call.kind() {
        ToolKind::MessageSend => message_signals(call, &mut factors),
        ToolKind::FileWrite | ToolKind::FileEdit => file_signals(call, context, &mut factors),
        ToolKind::Exec => exec_signals(call, &mut factors),
        ToolKind::Browser => browser_signals(call, &mut factors),
        ToolKind::Other => {},
    }

    if SOCIAL_ENGINEERING_CUES.is_match(&context.recent.joined()) {
        factors.push(RiskFactor::SocialEngineeringCue);
    }

    if is_out_of_scope(call, &context.goals) {
        factors.push(RiskFactor::OutOfScope);
    }

    if has_context_anomaly(&context.recent) {
        factors.push(RiskFactor::ContextAnomaly);
    }

    factors
}

fn message_signals(call: &ToolCall, factors: &mut Vec<RiskFactor>) {
    // Outbound messages always leave the trust boundary.
    factors.push(RiskFactor::ExternalDestination);

    if call.param_present("file_path")
        || call.param_present("attachment")
        || call.param_present("buffer")
    {
        factors.push(RiskFactor::DataExfilPattern);
    }

    if call
        .param_array("targets")
        .is_some_and(|targets| targets.len() > BULK_TARGET_LIMIT)
    {
        factors.push(RiskFactor::DataExfilPattern);
    }

    let message = call.param_str("message").unwrap_or("");
    if SOCIAL_ENGINEERING_CUES.is_match(message) {
        factors.push(RiskFactor::SocialEngineeringCue);
    }

    if call.param_present("channel") || call.param_present("broadcast") {
        factors.push(RiskFactor::IrreversibleAction);
    }
}

fn file_signals(call: &ToolCall, context: &AmbientContext, factors: &mut Vec<RiskFactor>) {
    let path = call
        .param_str("path")
        .or_else(|| call.param_str("file_path"))
        .unwrap_or("");

    if SENSITIVE_PATHS.is_match(path) {
        factors.push(RiskFactor::ExternalDestination);
    }

    if !context.in_workspace(path) {
        factors.push(RiskFactor::OutOfScope);
    }

    if call.param_present("overwrite") || !context.in_workspace(path) {
        factors.push(RiskFactor::IrreversibleAction);
    }
}

fn exec_signals(call: &ToolCall, factors: &mut Vec<RiskFactor>) {
    let command = call.param_str("command").unwrap_or("");

    if SENSITIVE_EXEC.is_match(command) {
        factors.push(RiskFactor::DataExfilPattern);
    }

    if matches_opt(&SUDO, command) {
        factors.push(RiskFactor::IrreversibleAction);
    }

    if matches_opt(&REMOTE_SHELL, command) {
        factors.push(RiskFactor::ExternalDestination);
    }

    if matches_opt(&FETCH_PIPE, command) {
        factors.push(RiskFactor::DataExfilPattern);
    }
}

fn browser_signals(call: &ToolCall, factors: &mut Vec<RiskFactor>) {
    let url = call.param_str("url").unwrap_or("");
    let action = call.param_str("action").unwrap_or("");

    if SENSITIVE_DOMAINS.is_match(url) {
        factors.push(RiskFactor::ExternalDestination);
    }

    if action == "upload" || action == "download" || url.contains("download") {
        factors.push(RiskFactor::DataExfilPattern);
    }

    if matches_opt(&AUTH_URL, url) {
        factors.push(RiskFactor::IrreversibleAction);
    }
}

/// Scope check against stated goals: a call whose keywords share nothing
/// with the goals is out of scope. No goals means everything is in scope.
/// Any keyword overlap at all counts as in scope.
fn is_out_of_scope(call: &ToolCall, goals: &[String]) -> bool {
    if goals.is_empty() {
        return false;
    }

    let description = format!(
        "{} {}",
        call.name,
        serde_json::Value::Object(call.parameters.clone())
    );
    let call_keywords = keywords(&description);
    if call_keywords.is_empty() {
        return false;
    }

    let goal_keywords = keywords(&goals.join(" "));
    call_keywords.is_disjoint(&goal_keywords)
}

/// Conversation anomaly: a sudden jump into system-instruction vocabulary
/// absent from the preceding turns, or near-duplicate repetition of a
/// recent request.
fn has_context_anomaly(recent: &RecentHistory) -> bool {
    if recent.len() < 2 {
        return false;
    }

    let turns = recent.last_n(recent.len());
    let Some((current, prior)) = turns.split_last() else {
        return false;
    };

    if matches_opt(&SYSTEM_TOPIC, current) {
        let window = prior
            .iter()
            .rev()
            .take(ANOMALY_WINDOW)
            .copied()
            .collect::<Vec<_>>()
            .join(" ");
        if !matches_opt(&SYSTEM_TOPIC, &window) {
            return true;
        }
    }

    prior
        .iter()
        .rev()
        .take(ANOMALY_WINDOW)
        .any(|turn| word_similarity(turn, current) > REPEAT_SIMILARITY)
}

/// Word-set overlap: `|A ∩ B| / max(|A|, |B|)` over lowercased words.
fn word_similarity(a: &str, b: &str) -> f64 {
    let words_a: HashSet<String> = a.to_lowercase().split_whitespace().map(String::from).collect();
    let words_b: HashSet<String> = b.to_lowercase().split_whitespace().map(String::from).collect();

    let larger = words_a.len().max(words_b.len());
    if larger == 0 {
        return 0.0;
    }

    let shared = words_a.intersection(&words_b).count();
    #[allow(clippy::cast_precision_loss, clippy::arithmetic_side_effects)]
    {
        shared as f64 / larger as f64
    }
}

const STOP_WORDS: &[&str] = &[
    "the", "a", "an", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with", "by",
    "from", "as", "is", "was", "are", "were", "be", "been", "being", "have", "has", "had", "do",
    "does", "did", "will", "would", "could", "should", "may", "might", "must", "shall", "can",
    "need", "dare", "ought", "used", "this", "that", "these", "those", "i", "you", "he", "she",
    "it", "we", "they", "me", "him", "her", "us", "them", "my", "your", "his", "its", "our",
    "their", "what", "which", "who", "whom", "whose", "where", "when", "why", "how", "all",
    "each", "every", "both", "few", "more", "most", "other", "some", "such", "no", "nor", "not",
    "only", "own", "same", "so", "than", "too", "very", "just", "now",
];

fn keywords(text: &str) -> HashSet<String> {
    text.to_lowercase()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c
            } else {
                ' '
            }
        })
        .collect::<String>()
        .split_whitespace()
        .filter(|word| word.len() > 2 && !STOP_WORDS.contains(word))
        .map(String::from)
        .collect()
}
