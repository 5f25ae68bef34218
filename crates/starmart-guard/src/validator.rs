//! The query guard: lexical checks plus row-limit enforcement.

use crate::reason::RejectReason;
use crate::verdict::Verdict;
use regex::Regex;
use starmart_core::config::GuardConfig;
use starmart_core::schema::SchemaRegistry;
use std::sync::Arc;

/// Data-definition and data-modification verbs plus execution
/// primitives. Matched on token boundaries, case-insensitively, so an
/// identifier like `deleted_flag` does not trigger a rejection.
const FORBIDDEN_KEYWORDS: &[&str] = &[
    "INSERT", "UPDATE", "DELETE", "DROP", "CREATE", "ALTER", "TRUNCATE", "EXEC", "EXECUTE",
    "CALL", "PROCEDURE", "FUNCTION", "TRIGGER", "GRANT", "REVOKE", "COMMIT", "ROLLBACK",
    "SAVEPOINT", "PRAGMA", "ATTACH", "DETACH", "VACUUM", "ANALYZE", "EXPLAIN", "COPY",
    "EXPORT", "IMPORT",
];

/// Validates ad-hoc query text against the schema registry and the
/// configured limits.
///
/// The guard is a pure function of its inputs and the registry
/// snapshot: it holds no mutable state, so one instance can be shared
/// freely across concurrent requests.
pub struct QueryGuard {
    registry: Arc<SchemaRegistry>,
    limits: GuardConfig,
    leading_select: Regex,
    forbidden: Regex,
    table_refs: Regex,
    limit_clause: Regex,
}

impl QueryGuard {
    /// Create a guard over a registry snapshot with the given limits.
    pub fn new(registry: Arc<SchemaRegistry>, limits: GuardConfig) -> Self {
        let forbidden_alternation = FORBIDDEN_KEYWORDS.join("|");
        Self {
            registry,
            limits,
            leading_select: Regex::new(r"(?i)^select\b").expect("static pattern"),
            forbidden: Regex::new(&format!(r"(?i)\b(?:{forbidden_alternation})\b"))
                .expect("static pattern"),
            table_refs: Regex::new(r"(?i)\b(?:from|join)\s+([A-Za-z_][A-Za-z0-9_\.]*)")
                .expect("static pattern"),
            limit_clause: Regex::new(r"(?i)\blimit\s+(\d+)\b").expect("static pattern"),
        }
    }

    /// The limits this guard enforces.
    pub fn limits(&self) -> GuardConfig {
        self.limits
    }

    /// The registry snapshot this guard validates against.
    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    /// Classify `raw_text` as a safe, bounded, read-only query or reject
    /// it. Any single failing check short-circuits with its reason; when
    /// every check passes the returned text carries an enforced `LIMIT`
    /// clause and `effective_row_limit` never exceeds the hard cap.
    pub fn validate(&self, raw_text: &str, requested_row_limit: Option<u64>) -> Verdict {
        if raw_text.chars().count() > self.limits.max_query_len {
            return self.reject(
                RejectReason::TooLong,
                format!(
                    "query is longer than the maximum of {} characters",
                    self.limits.max_query_len
                ),
            );
        }

        // Collapse whitespace; casing is preserved in the output text.
        let normalized = raw_text.split_whitespace().collect::<Vec<_>>().join(" ");

        if !self.leading_select.is_match(&normalized) {
            return self.reject(
                RejectReason::NotASelect,
                "query must begin with SELECT; only read operations are allowed",
            );
        }

        if normalized.contains("--") || normalized.contains("/*") {
            return self.reject(
                RejectReason::MultipleStatementsOrComment,
                "comments are not allowed in ad-hoc queries",
            );
        }

        // A single trailing semicolon is tolerated; any other separator
        // means a second statement.
        let body = normalized.strip_suffix(';').unwrap_or(&normalized).trim();
        if body.contains(';') {
            return self.reject(
                RejectReason::MultipleStatementsOrComment,
                "multiple statements are not allowed in ad-hoc queries",
            );
        }

        if let Some(found) = self.forbidden.find(body) {
            return self.reject(
                RejectReason::ForbiddenKeyword,
                format!(
                    "forbidden keyword '{}' detected; only SELECT queries are allowed",
                    found.as_str().to_uppercase()
                ),
            );
        }

        for captures in self.table_refs.captures_iter(body) {
            let table = &captures[1];
            if !self.registry.contains(table) {
                return self.reject(
                    RejectReason::UnknownTable,
                    format!(
                        "table '{}' is not accessible; allowed tables: {}",
                        table.to_lowercase(),
                        self.registry.table_names().join(", ")
                    ),
                );
            }
        }

        let (text, effective_row_limit) = self.enforce_limit(body, requested_row_limit);
        Verdict::accepted(text, effective_row_limit)
    }

    /// Compute the effective row limit and make sure the query text
    /// carries a matching `LIMIT` clause.
    ///
    /// An embedded `LIMIT n` acts as the requested limit: it is kept
    /// as-is when within the hard cap and rewritten down to the cap when
    /// it exceeds it. Without one, the caller's requested limit (or the
    /// default) is clamped to the cap and appended.
    fn enforce_limit(&self, body: &str, requested: Option<u64>) -> (String, u64) {
        let cap = self.limits.hard_row_cap;

        if let Some(captures) = self.limit_clause.captures(body) {
            let embedded: u64 = captures[1].parse().unwrap_or(u64::MAX);
            if embedded > cap {
                let rewritten = self
                    .limit_clause
                    .replace_all(body, format!("LIMIT {cap}"))
                    .into_owned();
                return (rewritten, cap);
            }
            return (body.to_string(), embedded);
        }

        let effective = requested.unwrap_or(self.limits.default_row_limit).min(cap);
        (format!("{body} LIMIT {effective}"), effective)
    }

    fn reject(&self, reason: RejectReason, detail: impl Into<String>) -> Verdict {
        let detail = detail.into();
        tracing::debug!(reason = %reason, %detail, "rejected ad-hoc query");
        Verdict::rejected(reason, detail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn guard() -> QueryGuard {
        QueryGuard::new(
            Arc::new(SchemaRegistry::star_schema()),
            GuardConfig::default(),
        )
    }

    #[test]
    fn accepts_simple_select_and_preserves_embedded_limit() {
        let verdict = guard().validate("SELECT * FROM dim_customer LIMIT 10", None);
        assert!(verdict.accepted);
        assert_eq!(verdict.effective_row_limit, 10);
        assert_eq!(verdict.normalized_text, "SELECT * FROM dim_customer LIMIT 10");
    }

    #[test]
    fn accepts_lowercase_group_by_query() {
        let verdict = guard().validate(
            "select category, count(*) from dim_product group by category",
            None,
        );
        assert!(verdict.accepted, "detail: {:?}", verdict.detail);
    }

    #[test]
    fn appends_default_limit_when_absent() {
        let verdict = guard().validate("SELECT * FROM dim_customer", None);
        assert!(verdict.accepted);
        assert_eq!(verdict.effective_row_limit, 100);
        assert!(verdict.normalized_text.ends_with("LIMIT 100"));
    }

    #[test]
    fn clamps_requested_limit_to_hard_cap() {
        let verdict = guard().validate("SELECT * FROM dim_customer", Some(5000));
        assert!(verdict.accepted);
        assert_eq!(verdict.effective_row_limit, 1000);
        assert!(verdict.normalized_text.ends_with("LIMIT 1000"));
    }

    #[test]
    fn rewrites_embedded_limit_above_hard_cap() {
        let verdict = guard().validate("SELECT * FROM fact_sales LIMIT 5000", None);
        assert!(verdict.accepted);
        assert_eq!(verdict.effective_row_limit, 1000);
        assert!(verdict.normalized_text.ends_with("LIMIT 1000"));
    }

    #[test]
    fn rejects_overlong_text_regardless_of_content() {
        let long = format!("SELECT * FROM dim_customer WHERE city = '{}'", "x".repeat(2000));
        let verdict = guard().validate(&long, None);
        assert!(!verdict.accepted);
        assert_eq!(verdict.reason, Some(RejectReason::TooLong));

        // Even garbage is reported as too_long first.
        let garbage = "z".repeat(2001);
        let verdict = guard().validate(&garbage, None);
        assert_eq!(verdict.reason, Some(RejectReason::TooLong));
    }

    #[test]
    fn rejects_non_select_statements() {
        for text in ["SHOW TABLES", "WITH x AS (SELECT 1) SELECT * FROM x", "  ", ""] {
            let verdict = guard().validate(text, None);
            assert!(!verdict.accepted, "accepted: {text:?}");
            assert_eq!(verdict.reason, Some(RejectReason::NotASelect), "{text:?}");
        }
    }

    #[test]
    fn leading_whitespace_before_select_is_fine() {
        let verdict = guard().validate("   select * from dim_date", None);
        assert!(verdict.accepted);
    }

    #[test]
    fn rejects_comments_and_multiple_statements() {
        let cases = [
            "SELECT * FROM dim_customer -- WHERE customer_id = 1",
            "SELECT * FROM dim_customer /* hidden */",
            "SELECT * FROM dim_customer; SELECT * FROM dim_product",
        ];
        for text in cases {
            let verdict = guard().validate(text, None);
            assert_eq!(
                verdict.reason,
                Some(RejectReason::MultipleStatementsOrComment),
                "{text:?}"
            );
        }

        // A single trailing semicolon is not a second statement.
        let verdict = guard().validate("SELECT * FROM dim_customer;", None);
        assert!(verdict.accepted);
    }

    #[test]
    fn piggybacked_statement_is_rejected_before_keyword_scan() {
        let verdict = guard().validate(
            "SELECT * FROM dim_customer; DROP TABLE dim_customer;",
            None,
        );
        assert!(!verdict.accepted);
        assert_eq!(
            verdict.reason,
            Some(RejectReason::MultipleStatementsOrComment)
        );
    }

    #[test]
    fn rejects_forbidden_keywords_in_any_case() {
        let cases = [
            "SELECT * FROM dim_customer WHERE 1=1 UNION SELECT * FROM dim_product DROP",
            "select drop from dim_customer",
            "SELECT * FROM dim_customer WHERE name = name DeLeTe",
            "SELECT attach FROM dim_customer",
        ];
        for text in cases {
            let verdict = guard().validate(text, None);
            assert_eq!(verdict.reason, Some(RejectReason::ForbiddenKeyword), "{text:?}");
        }
    }

    #[test]
    fn keyword_embedded_in_identifier_does_not_trigger() {
        let verdict = guard().validate(
            "SELECT deleted_flag, updated_at FROM dim_customer",
            None,
        );
        assert!(verdict.accepted, "detail: {:?}", verdict.detail);
    }

    #[test]
    fn rejects_unknown_tables() {
        let verdict = guard().validate("SELECT * FROM secret_table", None);
        assert_eq!(verdict.reason, Some(RejectReason::UnknownTable));

        let verdict = guard().validate("SELECT * FROM information_schema.tables", None);
        assert_eq!(verdict.reason, Some(RejectReason::UnknownTable));

        let verdict = guard().validate(
            "SELECT * FROM fact_sales f JOIN hidden_dim h ON f.date_id = h.id",
            None,
        );
        assert_eq!(verdict.reason, Some(RejectReason::UnknownTable));
    }

    #[test]
    fn accepts_joins_across_registered_tables() {
        let verdict = guard().validate(
            "SELECT c.customer_name, SUM(f.total_amount) FROM fact_sales f \
             JOIN dim_customer c ON f.customer_id = c.customer_id \
             GROUP BY c.customer_name ORDER BY SUM(f.total_amount) DESC LIMIT 5",
            None,
        );
        assert!(verdict.accepted, "detail: {:?}", verdict.detail);
        assert_eq!(verdict.effective_row_limit, 5);
    }

    #[test]
    fn whitespace_is_collapsed_in_the_normalized_text() {
        let verdict = guard().validate("SELECT  *\n  FROM\t dim_customer   LIMIT 3", None);
        assert!(verdict.accepted);
        assert_eq!(verdict.normalized_text, "SELECT * FROM dim_customer LIMIT 3");
    }

    #[test]
    fn validate_is_idempotent() {
        let g = guard();
        let text = "SELECT city, COUNT(*) FROM dim_customer GROUP BY city";
        let first = g.validate(text, Some(25));
        let second = g.validate(text, Some(25));
        assert_eq!(first.accepted, second.accepted);
        assert_eq!(first.effective_row_limit, second.effective_row_limit);
        assert_eq!(first.normalized_text, second.normalized_text);

        // Re-validating the normalized output is also stable.
        let again = g.validate(&first.normalized_text, Some(25));
        assert_eq!(again.normalized_text, first.normalized_text);
        assert_eq!(again.effective_row_limit, first.effective_row_limit);
    }

    #[test]
    fn effective_limit_never_exceeds_hard_cap() {
        let g = guard();
        for requested in [None, Some(1), Some(999), Some(1000), Some(1001), Some(u64::MAX)] {
            let verdict = g.validate("SELECT * FROM dim_date", requested);
            assert!(verdict.accepted);
            assert!(verdict.effective_row_limit <= 1000, "requested {requested:?}");
        }
    }
}
