//! The guard's accept/reject decision.

use crate::reason::RejectReason;
use serde::{Deserialize, Serialize};

/// Result of validating one query request. Produced once per request
/// and never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Verdict {
    /// Whether the query may be forwarded to the execution engine.
    pub accepted: bool,

    /// Reason code when rejected.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<RejectReason>,

    /// Human-readable detail when rejected.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,

    /// Row bound the executor must enforce, never above the hard cap.
    pub effective_row_limit: u64,

    /// Whitespace-collapsed, limit-enforced query text. Empty when
    /// rejected.
    pub normalized_text: String,
}

impl Verdict {
    /// An accepted, limit-enforced query.
    pub fn accepted(normalized_text: String, effective_row_limit: u64) -> Self {
        Self {
            accepted: true,
            reason: None,
            detail: None,
            effective_row_limit,
            normalized_text,
        }
    }

    /// A rejection with its reason code and detail message.
    pub fn rejected(reason: RejectReason, detail: impl Into<String>) -> Self {
        Self {
            accepted: false,
            reason: Some(reason),
            detail: Some(detail.into()),
            effective_row_limit: 0,
            normalized_text: String::new(),
        }
    }
}
