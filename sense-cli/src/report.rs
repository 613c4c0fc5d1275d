//! Plain-text rendering of batch progress, the summary dashboard and the
//! transaction list.

use std::fmt;

use sense_core::{BatchEvent, BatchState, FileEntry, FileStatus, Summary, Transaction};

const BAR_WIDTH: f64 = 30.0;
const DESCRIPTION_WIDTH: usize = 40;

/// Dollar amount rounded to cents, grouped by thousands: `-$1,234.56`.
/// Anything that rounds to zero cents prints unsigned.
pub fn money(val: f64) -> String {
    let cents = (val * 100.0).round() as i64;
    let sign = if cents < 0 { "-" } else { "" };
    let cents = cents.unsigned_abs();

    let digits = (cents / 100).to_string();
    let groups: Vec<&str> = digits
        .as_bytes()
        .rchunks(3)
        .rev()
        .filter_map(|chunk| std::str::from_utf8(chunk).ok())
        .collect();

    format!("{sign}${}.{:02}", groups.join(","), cents % 100)
}

/// One stderr line per interesting progress event
pub fn progress_line(event: &BatchEvent, state: &BatchState) -> Option<String> {
    let total_files = state.files().len();
    let name = |i: usize| state.files().get(i).map(|f| f.name.as_str()).unwrap_or("?");

    match event {
        BatchEvent::FileStarted { file_index } => Some(format!(
            "[{}/{}] {}",
            file_index + 1,
            total_files,
            name(*file_index)
        )),
        BatchEvent::PageProgress { current, total, .. } => {
            Some(format!("      page {current}/{total}"))
        }
        BatchEvent::FileFinished { file_index, status } if *status == FileStatus::Error => {
            Some(format!("      {} failed", name(*file_index)))
        }
        _ => None,
    }
}

pub struct FileTable<'a>(pub &'a [FileEntry]);

impl fmt::Display for FileTable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Files")?;
        for entry in self.0 {
            let pages = entry
                .page_count
                .map(|n| format!("{n} page{}", if n == 1 { "" } else { "s" }))
                .unwrap_or_else(|| "-".to_string());
            writeln!(f, "  {:<10} {:>9}  {}", entry.status.as_str(), pages, entry.name)?;
        }
        Ok(())
    }
}

pub struct SummaryReport<'a>(pub &'a Summary);

impl fmt::Display for SummaryReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = self.0;

        writeln!(f, "Summary")?;
        writeln!(
            f,
            "  Transactions  {} ({} income, {} expenses)",
            s.total_count, s.income_count, s.expense_count
        )?;
        if let Some((first, last)) = s.date_range {
            writeln!(f, "  Period        {first} .. {last}")?;
        }
        writeln!(f, "  Income        {}", money(s.total_income))?;
        writeln!(f, "  Expenses      {}", money(s.total_expenses))?;
        writeln!(f, "  Net balance   {}", money(s.net_balance))?;

        if !s.categories.is_empty() {
            writeln!(f)?;
            writeln!(f, "Spending by category")?;
            for c in &s.categories {
                let bar_len = (c.share_of_max(s.max_category_spend) * BAR_WIDTH).round() as usize;
                writeln!(
                    f,
                    "  {:<16} {:>12}  {}",
                    c.category,
                    money(c.amount),
                    "█".repeat(bar_len)
                )?;
            }
        }

        if !s.slices.is_empty() {
            writeln!(f)?;
            writeln!(f, "Distribution")?;
            for slice in &s.slices {
                writeln!(f, "  {:<16} {:>5.1}%", slice.category, slice.percent)?;
            }
        }

        if s.total_count > 0 {
            writeln!(f)?;
            writeln!(
                f,
                "Cashflow mix    {:.1}% expenses / {:.1}% income",
                s.cashflow.expense_percent, s.cashflow.income_percent
            )?;
        }
        Ok(())
    }
}

/// The newest `limit` transactions
pub struct TransactionList<'a> {
    pub transactions: &'a [Transaction],
    pub limit: usize,
}

impl fmt::Display for TransactionList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let shown = self.transactions.len().min(self.limit);
        writeln!(f, "Transactions ({} of {})", shown, self.transactions.len())?;
        writeln!(
            f,
            "  {:<10}  {:>12}  {:<16} {}",
            "Date", "Amount", "Category", "Description"
        )?;

        for t in self.transactions.iter().take(self.limit) {
            write!(
                f,
                "  {:<10}  {:>12}  {:<16} {}",
                t.date,
                money(t.amount),
                t.category_or_default(),
                truncate(&t.description, DESCRIPTION_WIDTH)
            )?;
            if !t.notes.is_empty() {
                write!(f, "  ({})", t.notes)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

fn truncate(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((i, _)) => format!("{}…", &s[..i]),
        None => s.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<Transaction> {
        vec![
            Transaction::new("2024-01-10", "ACME Payroll", 2000.0, "salary", ""),
            Transaction::new("2024-01-05", "Trattoria", -50.0, "dining", "team lunch"),
            Transaction::new("2024-01-05", "Market", -20.0, "groceries", ""),
        ]
    }

    #[test]
    fn test_money_groups_and_signs() {
        assert_eq!(money(2000.0), "$2,000.00");
        assert_eq!(money(-70.0), "-$70.00");
        assert_eq!(money(999.999), "$1,000.00");
        assert_eq!(money(-1234567.8), "-$1,234,567.80");
        assert_eq!(money(0.05), "$0.05");
    }

    #[test]
    fn test_money_near_zero_is_unsigned() {
        assert_eq!(money(-0.001), "$0.00");
        assert_eq!(money(-0.0), "$0.00");
        assert_eq!(money(-0.005), "-$0.01");
    }

    #[test]
    fn test_summary_report_lines() {
        let summary = Summary::from_transactions(&sample());
        let text = SummaryReport(&summary).to_string();

        assert!(text.contains("Transactions  3 (1 income, 2 expenses)"));
        assert!(text.contains("Period        2024-01-05 .. 2024-01-10"));
        assert!(text.contains("Net balance   $1,930.00"));
        assert!(text.contains("Cashflow mix    66.7% expenses / 33.3% income"));

        // dining is the biggest category and gets the full bar
        let dining = text.lines().find(|l| l.trim_start().starts_with("dining")).unwrap();
        assert!(dining.ends_with(&"█".repeat(30)));
        let groceries = text
            .lines()
            .find(|l| l.trim_start().starts_with("groceries") && l.contains('$'))
            .unwrap();
        assert!(groceries.ends_with(&"█".repeat(12)));
    }

    #[test]
    fn test_empty_summary_has_no_sections() {
        let text = SummaryReport(&Summary::from_transactions(&[])).to_string();
        assert!(text.contains("Transactions  0"));
        assert!(!text.contains("Spending by category"));
        assert!(!text.contains("Cashflow mix"));
    }

    #[test]
    fn test_transaction_list_respects_limit() {
        let txns = sample();
        let text = TransactionList {
            transactions: &txns,
            limit: 2,
        }
        .to_string();

        assert!(text.starts_with("Transactions (2 of 3)"));
        assert!(text.contains("ACME Payroll"));
        assert!(text.contains("(team lunch)"));
        assert!(!text.contains("Market"));
    }

    #[test]
    fn test_truncate_is_char_safe() {
        assert_eq!(truncate("café au lait", 4), "café…");
        assert_eq!(truncate("short", 40), "short");
    }

    #[test]
    fn test_progress_lines() {
        let mut state = BatchState::new();
        state.start_batch(["jan.pdf", "feb.png"]);

        let started = progress_line(&BatchEvent::FileStarted { file_index: 1 }, &state);
        assert_eq!(started.as_deref(), Some("[2/2] feb.png"));

        let page = BatchEvent::PageProgress {
            file_index: 0,
            current: 2,
            total: 5,
        };
        assert_eq!(progress_line(&page, &state).as_deref(), Some("      page 2/5"));

        let ok = BatchEvent::FileFinished {
            file_index: 0,
            status: FileStatus::Completed,
        };
        assert_eq!(progress_line(&ok, &state), None);
    }
}
