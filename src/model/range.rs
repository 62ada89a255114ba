use chrono::{Months, NaiveDate};
use serde::{Deserialize, Serialize};

/// The window of expenses that statistics are computed over.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum TimeRange {
    /// Expenses dated within the last 6 calendar months.
    #[default]
    #[serde(rename = "6months")]
    SixMonths,
    /// Expenses dated within the last 12 calendar months.
    #[serde(rename = "1year")]
    OneYear,
    /// Every expense.
    #[serde(rename = "all")]
    All,
}

serde_plain::derive_display_from_serialize!(TimeRange);
serde_plain::derive_fromstr_from_deserialize!(TimeRange);

impl TimeRange {
    /// The earliest date inside the window ending at `now`. `None` means there is no lower bound.
    ///
    /// Months are subtracted on the calendar, clamping to the end of shorter months, so
    /// 2024-08-31 minus 6 months is 2024-02-29.
    pub fn cutoff(&self, now: NaiveDate) -> Option<NaiveDate> {
        let months = match self {
            TimeRange::SixMonths => 6,
            TimeRange::OneYear => 12,
            TimeRange::All => return None,
        };
        // Only fails below NaiveDate::MIN, where every date is inside the window anyway.
        now.checked_sub_months(Months::new(months))
    }

    pub fn describe(&self) -> &'static str {
        match self {
            TimeRange::SixMonths => "the last 6 months",
            TimeRange::OneYear => "the last year",
            TimeRange::All => "all time",
        }
    }
}
