//! Reading expenses from CSV files with `Date,Amount,Description` headers.

use crate::model::{parse_date, Amount, Expense};
use crate::{utils, Result};
use anyhow::Context;
use serde::Deserialize;
use std::io::Read;
use std::path::Path;
use tracing::warn;

// "Date","Amount","Description"
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct CsvRecord {
    date: String,
    amount: String,
    #[serde(default)]
    description: Option<String>,
}

/// Parses CSV data into expenses with freshly generated ids.
///
/// Dates that parse are stored as `YYYY-MM-DD`. Rows whose date or amount cannot be understood are
/// kept as written, because statistics tolerate them, and so are negative amounts. Each of those
/// is reported with `warn!`.
pub(crate) fn parse_csv(reader: impl Read) -> Result<Vec<Expense>> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut expenses = Vec::new();
    for (ix, result) in rdr.deserialize().enumerate() {
        // Row 1 is the header.
        let row = ix + 2;
        let record: CsvRecord = result.with_context(|| format!("Unable to read CSV row {row}"))?;
        let date = match parse_date(&record.date) {
            Some(date) => date.format("%Y-%m-%d").to_string(),
            None => {
                warn!("Row {row} has a date we do not understand: '{}'", record.date);
                record.date
            }
        };
        match record.amount.parse::<Amount>() {
            Ok(amount) if amount.is_negative() => {
                warn!("Row {row} has a negative amount: '{}'", record.amount);
            }
            Ok(_) => {}
            Err(_) => warn!("Row {row} has an amount that is not a number: '{}'", record.amount),
        }
        let expense = Expense::new(
            utils::generate_id(),
            date,
            record.amount,
            record.description.filter(|d| !d.is_empty()),
        );
        expenses.push(expense);
    }
    Ok(expenses)
}

/// Reads and parses the CSV file at `path`.
pub(crate) async fn read_csv(path: &Path) -> Result<Vec<Expense>> {
    let content = utils::read(path).await?;
    parse_csv(content.as_bytes())
        .with_context(|| format!("Unable to parse expenses from {}", path.display()))
}
