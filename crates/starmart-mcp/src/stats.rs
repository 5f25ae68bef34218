//! Statistical helpers over fetched row sets.
//!
//! Pure functions an agent can chain after a fetch tool: uniqueness
//! extraction, value counting, numeric summaries, and row filtering.
//! They operate on JSON rows exactly as the fetch tools return them.

use serde_json::{Map, Value, json};
use std::collections::HashMap;

/// Distinct non-null values of `field` across the rows, sorted by their
/// JSON string rendering.
pub fn unique_values(rows: &[Value], field: &str) -> Vec<Value> {
    let mut seen: Vec<Value> = Vec::new();
    for row in rows {
        if let Some(value) = row.get(field)
            && !value.is_null()
            && !seen.contains(value)
        {
            seen.push(value.clone());
        }
    }
    seen.sort_by_key(|v| render(v));
    seen
}

/// Occurrence counts of `field` values, most common first. Values are
/// compared by their string rendering, as the agent sees them.
pub fn count_by_field(rows: &[Value], field: &str, limit: Option<usize>) -> Vec<Value> {
    let mut counts: HashMap<String, u64> = HashMap::new();
    for row in rows {
        if let Some(value) = row.get(field)
            && !value.is_null()
        {
            *counts.entry(render(value)).or_insert(0) += 1;
        }
    }

    let mut entries: Vec<(String, u64)> = counts.into_iter().collect();
    // Most common first; ties broken by value for a stable order.
    entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    if let Some(limit) = limit {
        entries.truncate(limit);
    }

    entries
        .into_iter()
        .map(|(value, count)| json!({ "value": value, "count": count }))
        .collect()
}

/// Summary statistics for a numeric field: count, min, max, mean,
/// median, sum, and sample standard deviation.
pub fn summarize_numeric_field(rows: &[Value], field: &str) -> Option<Value> {
    let mut values: Vec<f64> = rows
        .iter()
        .filter_map(|row| row.get(field).and_then(Value::as_f64))
        .collect();
    if values.is_empty() {
        return None;
    }
    values.sort_by(|a, b| a.total_cmp(b));

    let count = values.len();
    let sum: f64 = values.iter().sum();
    let mean = sum / count as f64;
    let median = if count % 2 == 1 {
        values[count / 2]
    } else {
        (values[count / 2 - 1] + values[count / 2]) / 2.0
    };
    let std_dev = if count > 1 {
        let variance = values
            .iter()
            .map(|v| (v - mean).powi(2))
            .sum::<f64>()
            / (count - 1) as f64;
        variance.sqrt()
    } else {
        0.0
    };

    Some(json!({
        "field": field,
        "count": count,
        "min": values[0],
        "max": values[count - 1],
        "mean": mean,
        "median": median,
        "sum": sum,
        "std_dev": std_dev,
    }))
}

/// Rows whose fields equal every filter value.
pub fn filter_rows(rows: &[Value], filters: &Map<String, Value>) -> Vec<Value> {
    if filters.is_empty() {
        return rows.to_vec();
    }
    rows.iter()
        .filter(|row| {
            filters
                .iter()
                .all(|(field, expected)| row.get(field) == Some(expected))
        })
        .cloned()
        .collect()
}

fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn products() -> Vec<Value> {
        vec![
            json!({"product_name": "A", "category": "Electronics", "unit_price": 10.0}),
            json!({"product_name": "B", "category": "Books", "unit_price": 20.0}),
            json!({"product_name": "C", "category": "Electronics", "unit_price": 30.0}),
            json!({"product_name": "D", "category": null, "unit_price": 40.0}),
        ]
    }

    #[test]
    fn unique_values_skips_nulls_and_sorts() {
        let unique = unique_values(&products(), "category");
        assert_eq!(unique, vec![json!("Books"), json!("Electronics")]);
    }

    #[test]
    fn count_by_field_orders_most_common_first() {
        let counts = count_by_field(&products(), "category", None);
        assert_eq!(counts[0], json!({"value": "Electronics", "count": 2}));
        assert_eq!(counts[1], json!({"value": "Books", "count": 1}));

        let limited = count_by_field(&products(), "category", Some(1));
        assert_eq!(limited.len(), 1);
    }

    #[test]
    fn numeric_summary_matches_hand_computation() {
        let summary = summarize_numeric_field(&products(), "unit_price").unwrap();
        assert_eq!(summary["count"], json!(4));
        assert_eq!(summary["min"], json!(10.0));
        assert_eq!(summary["max"], json!(40.0));
        assert_eq!(summary["mean"], json!(25.0));
        assert_eq!(summary["median"], json!(25.0));
        assert_eq!(summary["sum"], json!(100.0));
        let std_dev = summary["std_dev"].as_f64().unwrap();
        assert!((std_dev - 12.909944487358056).abs() < 1e-9);
    }

    #[test]
    fn numeric_summary_of_missing_field_is_none() {
        assert!(summarize_numeric_field(&products(), "weight").is_none());
        assert!(summarize_numeric_field(&[], "unit_price").is_none());
    }

    #[test]
    fn filter_rows_matches_all_conditions() {
        let rows = products();
        let filters = json!({"category": "Electronics"});
        let filtered = filter_rows(&rows, filters.as_object().unwrap());
        assert_eq!(filtered.len(), 2);

        let none = filter_rows(&rows, json!({"category": "Toys"}).as_object().unwrap());
        assert!(none.is_empty());

        let all = filter_rows(&rows, json!({}).as_object().unwrap());
        assert_eq!(all.len(), rows.len());
    }
}
