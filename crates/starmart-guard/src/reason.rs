//! Rejection reason codes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Why the guard rejected a query. The serialized snake_case codes are
/// part of the API surface and are returned verbatim to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    /// Input text exceeds the maximum query length.
    TooLong,
    /// Input does not begin with the SELECT keyword.
    NotASelect,
    /// Input contains a statement separator or a comment introducer.
    MultipleStatementsOrComment,
    /// Input contains a banned keyword as a standalone token.
    ForbiddenKeyword,
    /// Input references a table absent from the schema registry.
    UnknownTable,
}

impl RejectReason {
    /// The stable machine-readable code for this reason.
    pub fn code(&self) -> &'static str {
        match self {
            RejectReason::TooLong => "too_long",
            RejectReason::NotASelect => "not_a_select",
            RejectReason::MultipleStatementsOrComment => "multiple_statements_or_comment",
            RejectReason::ForbiddenKeyword => "forbidden_keyword",
            RejectReason::UnknownTable => "unknown_table",
        }
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_round_trip_through_serde() {
        for reason in [
            RejectReason::TooLong,
            RejectReason::NotASelect,
            RejectReason::MultipleStatementsOrComment,
            RejectReason::ForbiddenKeyword,
            RejectReason::UnknownTable,
        ] {
            let json = serde_json::to_string(&reason).unwrap();
            assert_eq!(json, format!("\"{}\"", reason.code()));
            let back: RejectReason = serde_json::from_str(&json).unwrap();
            assert_eq!(back, reason);
        }
    }
}
