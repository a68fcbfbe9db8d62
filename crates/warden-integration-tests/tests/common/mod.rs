//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use warden_audit::MemoryAuditSink;
use warden_config::{Sensitivity, SensitivityProfile};
use warden_core::{AmbientContext, SessionId, ToolCall};
use warden_guard::{Gate, GuardResult, ReviewRequest, Reviewer, ReviewerJudgment};

/// Reviewer that always returns the same judgment.
pub struct StaticReviewer(pub ReviewerJudgment);

#[async_trait::async_trait]
impl Reviewer for StaticReviewer {
    async fn review(&self, _request: &ReviewRequest) -> GuardResult<ReviewerJudgment> {
        Ok(self.0.clone())
    }
}

/// Reviewer that always fails.
pub struct BrokenReviewer;

#[async_trait::async_trait]
impl Reviewer for BrokenReviewer {
    async fn review(&self, _request: &ReviewRequest) -> GuardResult<ReviewerJudgment> {
        Err(warden_guard::GuardError::InvalidJudgment {
            reason: "backend offline".to_string(),
        })
    }
}

pub fn call(name: &str, params: serde_json::Value) -> ToolCall {
    let serde_json::Value::Object(map) = params else {
        panic!("params must be an object");
    };
    ToolCall::new(name, map)
}

pub fn workspace_context() -> AmbientContext {
    AmbientContext::new().with_workspace_roots(vec!["/workspace".to_string()])
}

pub fn judgment(approve: bool, confidence: f64) -> ReviewerJudgment {
    ReviewerJudgment {
        approve,
        confidence,
        reasoning: "fixture".to_string(),
    }
}

pub fn balanced_gate(reviewer: Arc<dyn Reviewer>) -> (Gate, Arc<MemoryAuditSink>) {
    let sink = Arc::new(MemoryAuditSink::new());
    let gate = Gate::new(
        Arc::new(SensitivityProfile::preset(Sensitivity::Balanced)),
        reviewer,
        sink.clone(),
        SessionId::new(),
    )
    .expect("balanced preset must build");
    (gate, sink)
}
