//! Transaction records extracted from statement pages

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

/// Label used for expenses the model left without a category
pub const UNCATEGORIZED: &str = "Uncategorized";

/// A single statement line as returned by the extraction model
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Transaction {
    /// Date of the transaction (YYYY-MM-DD). Ordering compares this string.
    pub date: String,
    /// Human-readable description
    #[serde(default, deserialize_with = "null_as_empty")]
    pub description: String,
    /// Positive = inflow, negative = outflow
    pub amount: f64,
    /// Free-text category label, may be empty
    #[serde(default, deserialize_with = "null_as_empty")]
    pub category: String,
    /// Contextual annotation, may be empty
    #[serde(default, deserialize_with = "null_as_empty")]
    pub notes: String,
}

impl Transaction {
    pub fn new(
        date: impl Into<String>,
        description: impl Into<String>,
        amount: f64,
        category: impl Into<String>,
        notes: impl Into<String>,
    ) -> Self {
        Self {
            date: date.into(),
            description: description.into(),
            amount,
            category: category.into(),
            notes: notes.into(),
        }
    }

    /// Returns true if this is an expense (negative amount)
    pub fn is_expense(&self) -> bool {
        self.amount < 0.0
    }

    /// Returns true if this is income (positive amount)
    pub fn is_income(&self) -> bool {
        self.amount > 0.0
    }

    /// Get the absolute amount
    pub fn abs_amount(&self) -> f64 {
        self.amount.abs()
    }

    /// Category used for bucketing; an empty label falls back to "Uncategorized"
    pub fn category_or_default(&self) -> &str {
        if self.category.is_empty() {
            UNCATEGORIZED
        } else {
            &self.category
        }
    }

    /// Calendar date, when the model produced a well-formed one
    pub fn parsed_date(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(self.date.trim(), "%Y-%m-%d").ok()
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Stable sort, most recent first. Equal dates keep their extraction order.
pub fn sort_newest_first(txns: &mut [Transaction]) {
    txns.sort_by(|a, b| b.date.cmp(&a.date));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expense_and_income_flags() {
        let coffee = Transaction::new("2024-01-05", "Blue Bottle", -4.5, "dining", "");
        assert!(coffee.is_expense());
        assert!(!coffee.is_income());
        assert_eq!(coffee.abs_amount(), 4.5);

        let zero = Transaction::new("2024-01-05", "Adjustment", 0.0, "", "");
        assert!(!zero.is_expense());
        assert!(!zero.is_income());
    }

    #[test]
    fn test_blank_category_defaults() {
        let t = Transaction::new("2024-01-05", "ATM", -20.0, "", "");
        assert_eq!(t.category_or_default(), "Uncategorized");

        let t = Transaction::new("2024-01-05", "ATM", -20.0, "cash", "");
        assert_eq!(t.category_or_default(), "cash");
    }

    #[test]
    fn test_deserialize_tolerates_missing_and_null_fields() {
        let json = r#"[
            {"date": "2024-02-01", "description": "Payroll", "amount": 1500.25},
            {"date": "2024-02-02", "description": "Cafe", "amount": -3, "category": null, "notes": null}
        ]"#;
        let txns: Vec<Transaction> = serde_json::from_str(json).unwrap();
        assert_eq!(txns.len(), 2);
        assert_eq!(txns[0].category, "");
        assert_eq!(txns[1].notes, "");
        assert_eq!(txns[1].amount, -3.0);
    }

    #[test]
    fn test_sort_newest_first_is_stable() {
        let mut txns = vec![
            Transaction::new("2024-01-05", "first", -1.0, "", ""),
            Transaction::new("2024-01-10", "newest", 1.0, "", ""),
            Transaction::new("2024-01-05", "second", -2.0, "", ""),
        ];
        sort_newest_first(&mut txns);
        let order: Vec<_> = txns.iter().map(|t| t.description.as_str()).collect();
        assert_eq!(order, vec!["newest", "first", "second"]);
    }

    #[test]
    fn test_parsed_date() {
        let t = Transaction::new("2024-03-31", "x", 1.0, "", "");
        assert_eq!(t.parsed_date(), NaiveDate::from_ymd_opt(2024, 3, 31));
        let bad = Transaction::new("31/03/2024", "x", 1.0, "", "");
        assert_eq!(bad.parsed_date(), None);
    }
}
