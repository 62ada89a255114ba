//! Expense statistics: monthly and per-category totals, the grand total and the average spent per
//! active month, optionally restricted to a time range.
//!
//! Everything here is a pure function of its inputs. Callers own the expenses and the selected
//! range and call back in whenever either changes.

use crate::model::{Amount, Expense, TimeRange};
use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::fmt::{Display, Formatter};

/// Month labels in calendar order.
pub const MONTH_LABELS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// A named running total.
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct Bucket {
    pub name: String,
    pub total: Decimal,
}

impl Bucket {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            total: Decimal::ZERO,
        }
    }
}

/// Totals over a set of expenses.
#[derive(Debug, Default, Clone, Eq, PartialEq, Serialize)]
pub struct Summary {
    pub total: Decimal,
    pub average_per_active_month: Decimal,
    /// Distinct (year, month) pairs among the expenses.
    pub active_months: usize,
    pub expenses: usize,
}

/// Returns the expenses dated on or after `range`'s cutoff relative to `now`.
///
/// `TimeRange::All` returns every expense, including those whose date cannot be parsed. For the
/// bounded ranges an unparseable date is outside the window.
pub fn filter_by_range<'a, I>(expenses: I, range: TimeRange, now: NaiveDate) -> Vec<&'a Expense>
where
    I: IntoIterator<Item = &'a Expense>,
{
    match range.cutoff(now) {
        None if range == TimeRange::All => expenses.into_iter().collect(),
        // A bounded range whose cutoff underflows the calendar admits every valid date.
        None => expenses.into_iter().filter(|e| e.date().is_some()).collect(),
        Some(cutoff) => expenses
            .into_iter()
            .filter(|e| e.date().is_some_and(|d| d >= cutoff))
            .collect(),
    }
}

// Totals saturate at `Decimal::MAX` rather than overflow, so absurd amounts in the store can never
// stop statistics from being computed.

/// Sums expenses into the 12 calendar months, Jan through Dec, ignoring the year.
///
/// All 12 buckets are always present. Expenses without a usable date land in no bucket.
pub fn group_by_month<'a, I>(expenses: I) -> Vec<Bucket>
where
    I: IntoIterator<Item = &'a Expense>,
{
    let mut buckets: Vec<Bucket> = MONTH_LABELS.iter().map(|m| Bucket::new(*m)).collect();
    for expense in expenses {
        if let Some(date) = expense.date() {
            let bucket = &mut buckets[date.month0() as usize];
            bucket.total = bucket.total.saturating_add(expense.amount());
        }
    }
    buckets
}

/// Sums expenses by category (description, or `Other`), in the order categories first appear.
pub fn group_by_category<'a, I>(expenses: I) -> Vec<Bucket>
where
    I: IntoIterator<Item = &'a Expense>,
{
    let mut buckets: Vec<Bucket> = Vec::new();
    let mut index: HashMap<&'a str, usize> = HashMap::new();
    for expense in expenses {
        let category = expense.category();
        let ix = *index.entry(category).or_insert_with(|| {
            buckets.push(Bucket::new(category));
            buckets.len() - 1
        });
        buckets[ix].total = buckets[ix].total.saturating_add(expense.amount());
    }
    buckets
}

/// Computes the total and the average per active month. Empty input gives zeros.
pub fn summarize<'a, I>(expenses: I) -> Summary
where
    I: IntoIterator<Item = &'a Expense>,
{
    let mut total = Decimal::ZERO;
    let mut months: HashSet<(i32, u32)> = HashSet::new();
    let mut count = 0;
    for expense in expenses {
        total = total.saturating_add(expense.amount());
        if let Some(date) = expense.date() {
            months.insert((date.year(), date.month()));
        }
        count += 1;
    }
    let divisor = Decimal::from(months.len().max(1));
    Summary {
        total,
        average_per_active_month: total / divisor,
        active_months: months.len(),
        expenses: count,
    }
}

/// Everything the statistics screen shows for one time range.
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct StatsReport {
    pub range: TimeRange,
    pub now: NaiveDate,
    pub monthly: Vec<Bucket>,
    pub categories: Vec<Bucket>,
    pub summary: Summary,
}

impl StatsReport {
    /// Filters `expenses` to `range` and aggregates what remains.
    pub fn compute(expenses: &[Expense], range: TimeRange, now: NaiveDate) -> Self {
        let selected = filter_by_range(expenses, range, now);
        Self {
            range,
            now,
            monthly: group_by_month(selected.iter().copied()),
            categories: group_by_category(selected.iter().copied()),
            summary: summarize(selected.iter().copied()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.summary.expenses == 0
    }
}

impl Display for StatsReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "Spending for {} (as of {})",
            self.range.describe(),
            self.now
        )?;
        if self.is_empty() {
            return writeln!(f, "No expense data available");
        }

        writeln!(f)?;
        writeln!(f, "Monthly Spending")?;
        for bucket in &self.monthly {
            writeln!(
                f,
                "  {:<4}{:>14}",
                bucket.name,
                Amount::new(bucket.total).to_string()
            )?;
        }

        writeln!(f)?;
        writeln!(f, "Spending by Category")?;
        let width = self
            .categories
            .iter()
            .map(|b| b.name.chars().count())
            .max()
            .unwrap_or(0);
        for bucket in &self.categories {
            writeln!(
                f,
                "  {:<width$}  {:>14}",
                bucket.name,
                Amount::new(bucket.total).to_string()
            )?;
        }

        writeln!(f)?;
        writeln!(
            f,
            "Average Monthly: {}",
            Amount::new(self.summary.average_per_active_month)
        )?;
        writeln!(f, "Total:           {}", Amount::new(self.summary.total))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn expense(date: &str, amount: &str, description: Option<&str>) -> Expense {
        Expense::new(
            format!("{date}-{amount}"),
            date,
            amount,
            description.map(String::from),
        )
    }

    fn savings_history() -> Vec<Expense> {
        vec![
            expense("2023-04-10", "150", Some("Emergency Fund")),
            expense("2023-04-05", "75", Some("New Laptop")),
        ]
    }

    fn mixed() -> Vec<Expense> {
        vec![
            expense("2022-01-15", "100", Some("Rent")),
            expense("2023-01-03", "20.50", Some("Food")),
            expense("2023-03-01", "$1,000.00", None),
            expense("2023-05-01", "12.25", Some("")),
            expense("2023-09-30", "oops", Some("Food")),
            expense("2023-09-12", "40", Some("Transportation")),
            expense("not a date", "99", Some("Rent")),
        ]
    }

    fn totals(buckets: &[Bucket]) -> Vec<(&str, Decimal)> {
        buckets.iter().map(|b| (b.name.as_str(), b.total)).collect()
    }

    #[test]
    fn test_savings_history_example() {
        let expenses = savings_history();

        let summary = summarize(&expenses);
        assert_eq!(summary.total, dec("225"));
        assert_eq!(summary.average_per_active_month, dec("225"));
        assert_eq!(summary.active_months, 1);

        let monthly = group_by_month(&expenses);
        for bucket in &monthly {
            let expected = if bucket.name == "Apr" {
                dec("225")
            } else {
                Decimal::ZERO
            };
            assert_eq!(bucket.total, expected, "{}", bucket.name);
        }

        assert_eq!(
            totals(&group_by_category(&expenses)),
            vec![("Emergency Fund", dec("150")), ("New Laptop", dec("75"))]
        );
    }

    #[test]
    fn test_six_month_window() {
        let now = ymd(2023, 10, 1);
        let expenses = vec![
            expense("2023-03-01", "10", Some("Seven months ago")),
            expense("2023-05-01", "20", Some("Five months ago")),
        ];
        let selected = filter_by_range(&expenses, TimeRange::SixMonths, now);
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].description(), Some("Five months ago"));
    }

    #[test]
    fn test_window_includes_cutoff_day() {
        let now = ymd(2023, 10, 1);
        let expenses = vec![
            expense("2023-04-01", "1", None),
            expense("2023-03-31", "1", None),
            expense("2022-10-01", "1", None),
            expense("2022-09-30", "1", None),
        ];
        assert_eq!(filter_by_range(&expenses, TimeRange::SixMonths, now).len(), 1);
        assert_eq!(filter_by_range(&expenses, TimeRange::OneYear, now).len(), 3);
    }

    #[test]
    fn test_all_is_identity() {
        let expenses = mixed();
        let selected = filter_by_range(&expenses, TimeRange::All, ymd(2023, 10, 1));
        let expected: Vec<&Expense> = expenses.iter().collect();
        assert_eq!(selected, expected);
    }

    #[test]
    fn test_bounded_ranges_drop_unparseable_dates() {
        let expenses = mixed();
        let now = ymd(2100, 1, 1);
        let long_ago = filter_by_range(&expenses, TimeRange::OneYear, now);
        assert!(long_ago.is_empty());
        let now = ymd(2023, 10, 1);
        let selected = filter_by_range(&expenses, TimeRange::OneYear, now);
        assert!(selected.iter().all(|e| e.date().is_some()));
        assert_eq!(selected.len(), 5);
    }

    #[test]
    fn test_group_by_month_always_has_twelve() {
        let empty: Vec<Expense> = Vec::new();
        let monthly = group_by_month(&empty);
        assert_eq!(monthly.len(), 12);
        let names: Vec<&str> = monthly.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, MONTH_LABELS.to_vec());
        assert!(monthly.iter().all(|b| b.total.is_zero()));
    }

    #[test]
    fn test_group_by_month_merges_years() {
        let monthly = group_by_month(&mixed());
        assert_eq!(monthly[0].total, dec("120.50"));
        assert_eq!(monthly[2].total, dec("1000"));
        assert_eq!(monthly[4].total, dec("12.25"));
        assert_eq!(monthly[8].total, dec("40"));
    }

    #[test]
    fn test_group_by_category_first_seen_order() {
        assert_eq!(
            totals(&group_by_category(&mixed())),
            vec![
                ("Rent", dec("199")),
                ("Food", dec("20.50")),
                ("Other", dec("1012.25")),
                ("Transportation", dec("40")),
            ]
        );
    }

    #[test]
    fn test_summarize_empty() {
        let empty: Vec<Expense> = Vec::new();
        let summary = summarize(&empty);
        assert_eq!(summary.total, Decimal::ZERO);
        assert_eq!(summary.average_per_active_month, Decimal::ZERO);
        assert_eq!(summary.active_months, 0);
        assert_eq!(summary.expenses, 0);
    }

    #[test]
    fn test_summarize_counts_year_qualified_months() {
        let expenses = vec![
            expense("2022-01-15", "100", None),
            expense("2023-01-15", "100", None),
            expense("2023-01-20", "100", None),
        ];
        let summary = summarize(&expenses);
        assert_eq!(summary.total, dec("300"));
        assert_eq!(summary.active_months, 2);
        assert_eq!(summary.average_per_active_month, dec("150"));
    }

    #[test]
    fn test_totals_agree_for_dated_expenses() {
        let expenses: Vec<Expense> = mixed()
            .into_iter()
            .filter(|e| e.date().is_some())
            .collect();
        for range in [TimeRange::SixMonths, TimeRange::OneYear, TimeRange::All] {
            let report = StatsReport::compute(&expenses, range, ymd(2023, 10, 1));
            let monthly: Decimal = report.monthly.iter().map(|b| b.total).sum();
            let by_category: Decimal = report.categories.iter().map(|b| b.total).sum();
            assert_eq!(monthly, report.summary.total, "{range}");
            assert_eq!(by_category, report.summary.total, "{range}");
        }
    }

    #[test]
    fn test_huge_amounts_saturate() {
        let max = "79228162514264337593543950335";
        let expenses = vec![
            expense("2023-05-01", max, Some("Yacht")),
            expense("2023-05-02", max, Some("Yacht")),
            expense("2023-06-01", "5", Some("Coffee")),
        ];
        let report = StatsReport::compute(&expenses, TimeRange::All, ymd(2023, 10, 1));
        assert_eq!(report.monthly[4].total, Decimal::MAX);
        assert_eq!(report.monthly[5].total, dec("5"));
        assert_eq!(report.categories[0].total, Decimal::MAX);
        assert_eq!(report.summary.total, Decimal::MAX);
        assert_eq!(report.summary.active_months, 2);
        assert_eq!(report.summary.average_per_active_month, Decimal::MAX / dec("2"));
        assert!(report.to_string().contains("Yacht"));
    }

    #[test]
    fn test_compute_is_repeatable() {
        let expenses = mixed();
        let now = ymd(2023, 10, 1);
        let a = StatsReport::compute(&expenses, TimeRange::OneYear, now);
        let b = StatsReport::compute(&expenses, TimeRange::OneYear, now);
        assert_eq!(a, b);
        assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap()
        );
    }

    #[test]
    fn test_display() {
        let report = StatsReport::compute(&savings_history(), TimeRange::All, ymd(2023, 10, 1));
        let text = report.to_string();
        assert!(text.contains("Spending for all time"));
        assert!(text.contains("Emergency Fund"));
        assert!(text.contains("Total:           $225.00"));

        let empty = StatsReport::compute(&[], TimeRange::SixMonths, ymd(2023, 10, 1));
        assert!(empty.to_string().contains("No expense data available"));
    }
}
