use crate::model::Amount;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// The category label used when an expense has no description.
pub const FALLBACK_CATEGORY: &str = "Other";

/// A single row from the expenses table.
///
/// `date` and `amount` are kept exactly as the store returned them. Whether they make sense is
/// decided when they are read through `date()` and `amount()`, so that one malformed row never
/// prevents the others from being aggregated.
#[derive(Default, Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Expense {
    id: String,
    date: String,
    amount: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
}

impl Expense {
    pub fn new<S1, S2, S3>(id: S1, date: S2, amount: S3, description: Option<String>) -> Self
    where
        S1: Into<String>,
        S2: Into<String>,
        S3: Into<String>,
    {
        Self {
            id: id.into(),
            date: date.into(),
            amount: amount.into(),
            description,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// The date as stored.
    pub fn raw_date(&self) -> &str {
        &self.date
    }

    /// The amount as stored.
    pub fn raw_amount(&self) -> &str {
        &self.amount
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// The calendar day of the expense, or `None` if the stored value is not a date we understand.
    pub fn date(&self) -> Option<NaiveDate> {
        parse_date(&self.date)
    }

    /// The numeric amount. Values that are not numbers count as zero.
    pub fn amount(&self) -> Decimal {
        Amount::coerce(&self.amount).value()
    }

    /// The label this expense is grouped under: its description, or `Other` when it has none.
    pub fn category(&self) -> &str {
        match self.description() {
            Some(d) if !d.is_empty() => d,
            _ => FALLBACK_CATEGORY,
        }
    }
}

/// Parses the date spellings we see in the expenses table and in imported files, truncating
/// timestamps to the day written in the text.
///
/// ```
/// # use finny::model::parse_date;
/// # use chrono::NaiveDate;
/// let day = NaiveDate::from_ymd_opt(2023, 4, 10).unwrap();
/// assert_eq!(parse_date("2023-04-10"), Some(day));
/// assert_eq!(parse_date("2023-04-10T23:30:00-07:00"), Some(day));
/// assert_eq!(parse_date("4/10/2023"), Some(day));
/// assert_eq!(parse_date("not a date"), None);
/// ```
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(s) {
        return Some(timestamp.date_naive());
    }
    for fmt in [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M:%S%.f",
    ] {
        if let Ok(timestamp) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(timestamp.date());
        }
    }
    NaiveDate::parse_from_str(s, "%m/%d/%Y").ok()
}
