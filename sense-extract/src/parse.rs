//! Model output -> transaction records
//!
//! Accepted shapes:
//!   [ { "date": ..., "description": ..., "amount": ..., ... }, ... ]
//!   { "transactions": [ ... ] }
//! optionally wrapped in a Markdown code fence. Rows that do not decode as a
//! transaction are logged and skipped; the rest of the page is kept.

use anyhow::{Context, Result};
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use std::sync::LazyLock;

use sense_core::Transaction;

static FENCE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^```[A-Za-z0-9_-]*\s*(?P<body>.*?)\s*```$").unwrap()
});

#[derive(Deserialize)]
#[serde(untagged)]
enum Payload {
    List(Vec<Value>),
    Wrapped { transactions: Vec<Value> },
}

/// Parse the text a model returned for one page.
///
/// Blank output means the page had no transactions.
pub fn parse_transactions(text: &str) -> Result<Vec<Transaction>> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(Vec::new());
    }

    let body = match FENCE_RE.captures(text) {
        Some(caps) => caps.name("body").map(|m| m.as_str()).unwrap_or(""),
        None => text,
    };
    if body.is_empty() {
        return Ok(Vec::new());
    }

    let payload: Payload = serde_json::from_str(body).with_context(|| {
        format!("model output is not a transaction list: {}", preview(body))
    })?;

    let rows = match payload {
        Payload::List(rows) => rows,
        Payload::Wrapped { transactions } => transactions,
    };

    let total = rows.len();
    let txns: Vec<Transaction> = rows
        .into_iter()
        .enumerate()
        .filter_map(|(i, row)| match Transaction::deserialize(&row) {
            Ok(t) => Some(t),
            Err(e) => {
                tracing::warn!(row = i, error = %e, "skipping malformed transaction");
                None
            }
        })
        .collect();

    if txns.len() < total {
        tracing::debug!(kept = txns.len(), total, "partial page");
    }
    Ok(txns)
}

fn preview(s: &str) -> String {
    const MAX: usize = 120;
    match s.char_indices().nth(MAX) {
        Some((i, _)) => format!("{}…", &s[..i]),
        None => s.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_array() {
        let text = r#"[
            {"date": "2024-01-05", "description": "Cafe", "amount": -4.5, "category": "dining", "notes": "coffee"},
            {"date": "2024-01-10", "description": "ACME Payroll", "amount": 2000, "category": "salary", "notes": ""}
        ]"#;
        let txns = parse_transactions(text).unwrap();
        assert_eq!(txns.len(), 2);
        assert_eq!(txns[0].amount, -4.5);
        assert_eq!(txns[1].category, "salary");
    }

    #[test]
    fn test_blank_output_is_no_transactions() {
        assert!(parse_transactions("").unwrap().is_empty());
        assert!(parse_transactions("  \n ").unwrap().is_empty());
        assert!(parse_transactions("[]").unwrap().is_empty());
    }

    #[test]
    fn test_fenced_output() {
        let text = "```json\n[{\"date\":\"2024-02-01\",\"description\":\"Bus\",\"amount\":-2.75,\"category\":\"transport\",\"notes\":\"\"}]\n```";
        let txns = parse_transactions(text).unwrap();
        assert_eq!(txns.len(), 1);
        assert_eq!(txns[0].description, "Bus");
    }

    #[test]
    fn test_wrapped_object() {
        let text = r#"{"transactions": [{"date": "2024-03-01", "description": "Rent", "amount": -1200, "category": "bills"}]}"#;
        let txns = parse_transactions(text).unwrap();
        assert_eq!(txns.len(), 1);
        // missing notes defaults to empty
        assert_eq!(txns[0].notes, "");
    }

    #[test]
    fn test_null_fields_become_empty() {
        let text = r#"[{"date": "2024-03-01", "description": null, "amount": -1, "category": null, "notes": null}]"#;
        let txns = parse_transactions(text).unwrap();
        assert_eq!(txns[0].description, "");
        assert_eq!(txns[0].category_or_default(), "Uncategorized");
    }

    #[test]
    fn test_malformed_row_is_skipped_not_fatal() {
        let text = r#"[
            {"date": "2024-01-05", "description": "Cafe", "amount": -4.5, "category": "dining"},
            {"date": "2024-01-06", "description": "Balance forward"},
            {"date": "2024-01-10", "description": "ACME Payroll", "amount": 2000, "category": "salary"}
        ]"#;
        let txns = parse_transactions(text).unwrap();
        assert_eq!(txns.len(), 2);
        assert_eq!(txns[0].description, "Cafe");
        assert_eq!(txns[1].description, "ACME Payroll");
    }

    #[test]
    fn test_wrapped_rows_are_checked_one_by_one() {
        let text = r#"{"transactions": [
            {"date": "2024-03-01", "description": "Rent", "amount": "a lot"},
            {"date": "2024-03-02", "description": "Gym", "amount": -30}
        ]}"#;
        let txns = parse_transactions(text).unwrap();
        assert_eq!(txns.len(), 1);
        assert_eq!(txns[0].amount, -30.0);
    }

    #[test]
    fn test_prose_is_an_error() {
        let err = parse_transactions("Sorry, I can't read this page.").unwrap_err();
        assert!(err.to_string().contains("not a transaction list"));
    }
}
