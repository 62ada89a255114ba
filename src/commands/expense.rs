//! Handlers for `finny add`, `finny import`, `finny list` and `finny delete`.

use crate::args::{AddArgs, DeleteArgs};
use crate::commands::Out;
use crate::model::{parse_date, Amount, Expense};
use crate::{import, utils, Config, Result};
use anyhow::{bail, ensure, Context};
use chrono::Local;
use serde::Serialize;
use std::path::Path;

/// Records one expense and returns it.
///
/// The date must be one the statistics understand and defaults to today. It is stored as
/// `YYYY-MM-DD` whatever spelling was given. The amount must not be negative.
pub async fn add_expense(config: Config, args: &AddArgs) -> Result<Out<Expense>> {
    ensure!(
        !args.amount().is_negative(),
        "An expense cannot be negative, got {}",
        args.amount().for_display()
    );
    let date = match args.date() {
        Some(raw) => match parse_date(raw) {
            Some(date) => date,
            None => bail!("'{raw}' is not a date, use a form like 2025-03-14"),
        },
        None => Local::now().date_naive(),
    };
    let description = args
        .description()
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(String::from);
    let expense = Expense::new(
        utils::generate_id(),
        date.format("%Y-%m-%d").to_string(),
        args.amount().value().to_string(),
        description,
    );
    config.db().insert_expense(&expense).await?;
    Ok(Out::new(
        format!(
            "Recorded {} for {} on {}",
            args.amount().for_display(),
            expense.category(),
            expense.raw_date()
        ),
        expense,
    ))
}

/// What `finny import` did.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize)]
pub struct Imported {
    pub expenses: usize,
    pub total_in_store: u64,
}

/// Records every expense in the CSV file at `path`. Either all rows are stored or none are.
pub async fn import_expenses(config: Config, path: &Path) -> Result<Out<Imported>> {
    let expenses = import::read_csv(path).await?;
    let count = config
        .db()
        .insert_expenses(&expenses)
        .await
        .with_context(|| format!("Unable to import {}", path.display()))?;
    let imported = Imported {
        expenses: count,
        total_in_store: config.db().count_expenses().await?,
    };
    Ok(Out::new(
        format!("Imported {count} expenses from {}", path.display()),
        imported,
    ))
}

/// Lists every expense, newest first, one per line.
pub async fn list_expenses(config: Config) -> Result<Out<Vec<Expense>>> {
    let expenses = config.db().list_expenses().await?;
    if expenses.is_empty() {
        return Ok(Out::new("No expenses recorded", expenses));
    }
    let mut message = String::new();
    for expense in &expenses {
        message.push_str(&format!(
            "{}  {:<10}  {:>12}  {}\n",
            expense.id(),
            expense.raw_date(),
            Amount::new(expense.amount()).to_string(),
            expense.category()
        ));
    }
    Ok(Out::new(message, expenses))
}

pub async fn delete_expense(config: Config, args: &DeleteArgs) -> Result<Out<()>> {
    config.db().delete_expense(args.id()).await?;
    Ok(format!("Deleted expense {}", args.id()).into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Amount;
    use crate::test::TestEnv;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    #[tokio::test]
    async fn test_add_expense() {
        let env = TestEnv::new().await;
        let args = AddArgs::new(
            Some(String::from("03/14/2025")),
            Amount::from_str("$1,200.00").unwrap(),
            Some(String::from("Housing")),
        );
        let out = add_expense(env.config(), &args).await.unwrap();
        assert_eq!(out.message(), "Recorded $1,200.00 for Housing on 2025-03-14");

        let stored = env.config().db().list_expenses().await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].raw_date(), "2025-03-14");
        assert_eq!(stored[0].amount(), Decimal::from(1200));
    }

    #[tokio::test]
    async fn test_add_expense_rejects_bad_date() {
        let env = TestEnv::new().await;
        let args = AddArgs::new(Some(String::from("someday")), Amount::default(), None);
        assert!(add_expense(env.config(), &args).await.is_err());
        assert_eq!(env.config().db().count_expenses().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_add_expense_rejects_negative_amount() {
        let env = TestEnv::new().await;
        let args = AddArgs::new(None, Amount::from_str("-50").unwrap(), None);
        let err = add_expense(env.config(), &args).await.unwrap_err();
        assert!(err.to_string().contains("cannot be negative"));
        assert_eq!(env.config().db().count_expenses().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_import_expenses() {
        let env = TestEnv::new().await;
        env.insert_expense("2025-01-01", "1", None).await;
        let path = env.config().root().join("expenses.csv");
        utils::write(
            &path,
            "Date,Amount,Description\n2025-02-01,10,Coffee\n2025-02-02,20,Books\n",
        )
        .await
        .unwrap();
        let out = import_expenses(env.config(), &path).await.unwrap();
        assert_eq!(
            out.structure(),
            Some(&Imported {
                expenses: 2,
                total_in_store: 3
            })
        );
    }

    #[tokio::test]
    async fn test_list_and_delete() {
        let env = TestEnv::new().await;
        let out = list_expenses(env.config()).await.unwrap();
        assert_eq!(out.message(), "No expenses recorded");

        let older = env.insert_expense("2025-01-01", "1200", None).await;
        env.insert_expense("2025-02-01", "4.5", Some("Coffee")).await;
        let out = list_expenses(env.config()).await.unwrap();
        let lines: Vec<&str> = out.message().lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("$4.50  Coffee"));
        assert!(lines[1].contains(older.id()));
        assert!(lines[1].ends_with("$1,200.00  Other"));

        delete_expense(env.config(), &DeleteArgs::new(older.id()))
            .await
            .unwrap();
        assert_eq!(env.config().db().count_expenses().await.unwrap(), 1);
        assert!(delete_expense(env.config(), &DeleteArgs::new(older.id()))
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_list_after_importing_mixed_date_spellings() {
        let env = TestEnv::new().await;
        let path = env.config().root().join("expenses.csv");
        utils::write(
            &path,
            "Date,Amount,Description\n\
             9/1/2024,1,Old\n\
             2025-03-01,2,New\n\
             12/25/2024,3,Gifts\n",
        )
        .await
        .unwrap();
        import_expenses(env.config(), &path).await.unwrap();

        let out = list_expenses(env.config()).await.unwrap();
        let dates: Vec<&str> = out
            .structure()
            .unwrap()
            .iter()
            .map(|e| e.raw_date())
            .collect();
        assert_eq!(dates, vec!["2025-03-01", "2024-12-25", "2024-09-01"]);
    }
}
