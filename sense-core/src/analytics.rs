//! Summary analytics over a transaction list.
//!
//! Everything here is recomputed from scratch on every call: totals,
//! the expense-by-category ranking, the spending distribution and the
//! income/expense mix. Zero denominators yield zero or empty results.

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::HashMap;

use crate::transaction::Transaction;

/// Summed expenses for one category label
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryTotal {
    pub category: String,
    /// Absolute amount, always >= 0
    pub amount: f64,
}

/// One arc of the spending distribution
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PieSlice {
    pub category: String,
    pub amount: f64,
    /// Share of total expenses, 0-100
    pub percent: f64,
    /// Sum of the percents of all previous slices
    pub offset: f64,
}

/// Share of transactions that are expenses vs income, 0-100 each
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct CashflowSplit {
    pub expense_percent: f64,
    pub income_percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub total_count: usize,
    pub income_count: usize,
    pub expense_count: usize,
    pub total_income: f64,
    pub total_expenses: f64,
    pub net_balance: f64,
    /// Largest first; equal totals keep first-seen order
    pub categories: Vec<CategoryTotal>,
    pub max_category_spend: f64,
    /// Empty when there are no expenses
    pub slices: Vec<PieSlice>,
    pub cashflow: CashflowSplit,
    /// Earliest and latest well-formed dates
    pub date_range: Option<(NaiveDate, NaiveDate)>,
}

impl Summary {
    pub fn from_transactions(txns: &[Transaction]) -> Self {
        let total_count = txns.len();
        let income: Vec<&Transaction> = txns.iter().filter(|t| t.is_income()).collect();
        let expenses: Vec<&Transaction> = txns.iter().filter(|t| t.is_expense()).collect();

        let total_income: f64 = income.iter().map(|t| t.amount).sum();
        let total_expenses = expenses.iter().map(|t| t.amount).sum::<f64>().abs();
        let net_balance = total_income - total_expenses;

        let categories = category_totals(&expenses);
        let max_category_spend = categories.first().map(|c| c.amount).unwrap_or(0.0);
        let slices = pie_slices(&categories, total_expenses);

        let cashflow = if total_count == 0 {
            CashflowSplit::default()
        } else {
            CashflowSplit {
                expense_percent: expenses.len() as f64 / total_count as f64 * 100.0,
                income_percent: income.len() as f64 / total_count as f64 * 100.0,
            }
        };

        let dates: Vec<NaiveDate> = txns.iter().filter_map(Transaction::parsed_date).collect();
        let date_range = dates
            .iter()
            .min()
            .zip(dates.iter().max())
            .map(|(min, max)| (*min, *max));

        Self {
            total_count,
            income_count: income.len(),
            expense_count: expenses.len(),
            total_income,
            total_expenses,
            net_balance,
            categories,
            max_category_spend,
            slices,
            cashflow,
            date_range,
        }
    }
}

impl CategoryTotal {
    /// Bar length relative to the biggest category, in [0, 1]
    pub fn share_of_max(&self, max_category_spend: f64) -> f64 {
        if max_category_spend <= 0.0 {
            0.0
        } else {
            self.amount / max_category_spend
        }
    }
}

fn category_totals(expenses: &[&Transaction]) -> Vec<CategoryTotal> {
    // Vec keeps first-seen order; the map only indexes into it
    let mut totals: Vec<CategoryTotal> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for &t in expenses {
        let category = t.category_or_default();
        match index.get(category) {
            Some(&i) => totals[i].amount += t.abs_amount(),
            None => {
                index.insert(category, totals.len());
                totals.push(CategoryTotal {
                    category: category.to_string(),
                    amount: t.abs_amount(),
                });
            }
        }
    }

    // sort_by is stable, ties stay in first-seen order
    totals.sort_by(|a, b| b.amount.total_cmp(&a.amount));
    totals
}

fn pie_slices(categories: &[CategoryTotal], total_expenses: f64) -> Vec<PieSlice> {
    if total_expenses <= 0.0 {
        return Vec::new();
    }

    let mut offset = 0.0;
    categories
        .iter()
        .map(|c| {
            let percent = c.amount / total_expenses * 100.0;
            let slice = PieSlice {
                category: c.category.clone(),
                amount: c.amount,
                percent,
                offset,
            };
            offset += percent;
            slice
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(date: &str, amount: f64, category: &str) -> Transaction {
        Transaction::new(date, "x", amount, category, "")
    }

    #[test]
    fn test_totals_and_net_balance() {
        let txns = vec![
            t("2024-01-10", 2000.0, "salary"),
            t("2024-01-05", -50.0, "dining"),
            t("2024-01-05", -20.0, "groceries"),
        ];
        let s = Summary::from_transactions(&txns);
        assert_eq!(s.total_count, 3);
        assert_eq!(s.total_income, 2000.0);
        assert_eq!(s.total_expenses, 70.0);
        assert_eq!(s.net_balance, 1930.0);
        assert_eq!(s.net_balance, s.total_income - s.total_expenses);
    }

    #[test]
    fn test_zero_amount_only_counts() {
        let txns = vec![
            t("2024-01-01", 0.0, "fees"),
            t("2024-01-02", -10.0, "fees"),
            t("2024-01-03", 10.0, "refund"),
        ];
        let s = Summary::from_transactions(&txns);
        assert_eq!(s.total_count, 3);
        assert_eq!(s.income_count, 1);
        assert_eq!(s.expense_count, 1);
        assert_eq!(s.categories.len(), 1);
        assert_eq!(s.categories[0].amount, 10.0);
        // 1 of 3 each; the zero-amount row is in neither share
        assert!((s.cashflow.expense_percent - 100.0 / 3.0).abs() < 1e-9);
        assert!((s.cashflow.income_percent - 100.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_categories_ranked_with_stable_ties() {
        let txns = vec![
            t("2024-01-01", -5.0, "transport"),
            t("2024-01-01", -30.0, "dining"),
            t("2024-01-01", -5.0, "bills"),
            t("2024-01-01", -10.0, "transport"),
            t("2024-01-01", -15.0, ""),
            t("2024-01-01", 500.0, "salary"),
        ];
        let s = Summary::from_transactions(&txns);
        let ranked: Vec<_> = s
            .categories
            .iter()
            .map(|c| (c.category.as_str(), c.amount))
            .collect();
        // transport (15) was seen before Uncategorized (15)
        assert_eq!(
            ranked,
            vec![
                ("dining", 30.0),
                ("transport", 15.0),
                ("Uncategorized", 15.0),
                ("bills", 5.0),
            ]
        );
        assert_eq!(s.max_category_spend, 30.0);
        assert_eq!(s.categories[1].share_of_max(s.max_category_spend), 0.5);
        assert!(!s.categories.iter().any(|c| c.category == "salary"));
    }

    #[test]
    fn test_category_sum_matches_total_expenses() {
        let txns = vec![
            t("2024-01-01", -12.25, "dining"),
            t("2024-01-02", -7.5, "groceries"),
            t("2024-01-03", -0.25, "dining"),
            t("2024-01-04", 100.0, "salary"),
        ];
        let s = Summary::from_transactions(&txns);
        let sum: f64 = s.categories.iter().map(|c| c.amount).sum();
        assert_eq!(sum, s.total_expenses);
    }

    #[test]
    fn test_slices_cover_full_circle() {
        let txns = vec![
            t("2024-01-01", -33.0, "a"),
            t("2024-01-01", -33.0, "b"),
            t("2024-01-01", -34.0, "c"),
            t("2024-01-01", -7.77, "d"),
        ];
        let s = Summary::from_transactions(&txns);
        let total: f64 = s.slices.iter().map(|p| p.percent).sum();
        assert!((total - 100.0).abs() < 1e-9);

        assert_eq!(s.slices[0].offset, 0.0);
        for w in s.slices.windows(2) {
            assert!((w[1].offset - (w[0].offset + w[0].percent)).abs() < 1e-9);
        }
    }

    #[test]
    fn test_no_expenses_means_no_slices() {
        let s = Summary::from_transactions(&[t("2024-01-01", 10.0, "salary")]);
        assert_eq!(s.total_expenses, 0.0);
        assert!(s.slices.is_empty());
        assert!(s.categories.is_empty());
        assert_eq!(s.max_category_spend, 0.0);
    }

    #[test]
    fn test_empty_list_is_all_zero() {
        let s = Summary::from_transactions(&[]);
        assert_eq!(s.total_count, 0);
        assert_eq!(s.net_balance, 0.0);
        assert_eq!(s.cashflow, CashflowSplit::default());
        assert!(s.slices.is_empty());
        assert_eq!(s.date_range, None);
    }

    #[test]
    fn test_date_range_ignores_malformed_dates() {
        let txns = vec![
            t("2024-03-01", -1.0, "a"),
            t("not a date", -1.0, "a"),
            t("2023-12-31", -1.0, "a"),
        ];
        let s = Summary::from_transactions(&txns);
        assert_eq!(
            s.date_range,
            Some((
                NaiveDate::from_ymd_opt(2023, 12, 31).unwrap(),
                NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
            ))
        );
    }
}
