//! This module is responsible for reading, writing and managing the SQLite database

mod migrations;

use crate::model::{Expense, SavingsGoal};
use crate::source::{Change, ChangeFeed, ChangeKind, EXPENSES, SAVINGS_GOALS};
use crate::{utils, Result};
use anyhow::{bail, ensure, Context};
use rust_decimal::Decimal;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info};

/// The schema version this build of the program expects.
const CURRENT_VERSION: i32 = 1;

/// The local expense store. Clones share the connection pool and the change feed, so a write
/// through any clone reaches every subscriber.
#[derive(Debug, Clone)]
pub(crate) struct Db {
    pool: SqlitePool,
    changes: ChangeFeed,
}

impl Db {
    /// - Validates that no file currently exists at `path`
    /// - Creates a new SQLite file at `path`
    /// - Initializes the database schema
    pub(crate) async fn init(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            bail!("A database already exists at {}", path.display());
        }
        let pool = connect(path, true).await?;
        sqlx::query("CREATE TABLE schema_version (version INTEGER NOT NULL)")
            .execute(&pool)
            .await
            .context("Unable to create the schema_version table")?;
        sqlx::query("INSERT INTO schema_version (version) VALUES (0)")
            .execute(&pool)
            .await
            .context("Unable to insert the initial schema version")?;
        migrations::run(&pool, 0, CURRENT_VERSION).await?;
        info!("Created database at {}", path.display());
        Ok(Self::new(pool))
    }

    /// - Validates that there is a SQLite file at `path`
    /// - Updates the database schema with migrations if it is out-of-date
    pub(crate) async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            bail!(
                "No database found at {}, did you run 'finny init'?",
                path.display()
            );
        }
        let pool = connect(path, false).await?;
        let (version,): (i32,) = sqlx::query_as("SELECT MAX(version) FROM schema_version")
            .fetch_one(&pool)
            .await
            .with_context(|| format!("Unable to read the schema version of {}", path.display()))?;
        if version > CURRENT_VERSION {
            bail!(
                "The database schema is at version {version} but this program only understands \
                up to version {CURRENT_VERSION}"
            );
        }
        migrations::run(&pool, version, CURRENT_VERSION).await?;
        debug!("Loaded database at {}", path.display());
        Ok(Self::new(pool))
    }

    fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            changes: ChangeFeed::default(),
        }
    }

    pub(crate) fn changes(&self) -> &ChangeFeed {
        &self.changes
    }

    pub(crate) async fn insert_expense(&self, expense: &Expense) -> Result<()> {
        insert_expense_row(&self.pool, expense).await?;
        self.changes.publish(Change::new(EXPENSES, ChangeKind::Insert));
        Ok(())
    }

    /// Inserts every expense or none of them. Subscribers hear about it once.
    pub(crate) async fn insert_expenses(&self, expenses: &[Expense]) -> Result<usize> {
        if expenses.is_empty() {
            return Ok(0);
        }
        let mut tx = self
            .pool
            .begin()
            .await
            .context("Unable to begin a transaction")?;
        for expense in expenses {
            insert_expense_row(&mut *tx, expense).await?;
        }
        tx.commit()
            .await
            .context("Unable to commit the inserted expenses")?;
        self.changes.publish(Change::new(EXPENSES, ChangeKind::Insert));
        Ok(expenses.len())
    }

    pub(crate) async fn delete_expense(&self, id: &str) -> Result<()> {
        let result = sqlx::query("DELETE FROM expenses WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .with_context(|| format!("Unable to delete expense {id}"))?;
        if result.rows_affected() == 0 {
            bail!("There is no expense with id '{id}'");
        }
        self.changes.publish(Change::new(EXPENSES, ChangeKind::Delete));
        Ok(())
    }

    /// Newest first by calendar date, with undated rows last. Rows on the same day are in reverse
    /// insertion order.
    pub(crate) async fn list_expenses(&self) -> Result<Vec<Expense>> {
        let rows =
            sqlx::query("SELECT id, date, amount, description FROM expenses ORDER BY rowid DESC")
                .fetch_all(&self.pool)
                .await
                .context("Unable to query expenses")?;
        let mut expenses = rows
            .iter()
            .map(expense_from_row)
            .collect::<Result<Vec<_>>>()?;
        // Stored dates are not all ISO, so text order is not date order. The sort is stable.
        expenses.sort_by_key(|e| std::cmp::Reverse(e.date()));
        Ok(expenses)
    }

    pub(crate) async fn count_expenses(&self) -> Result<u64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM expenses")
            .fetch_one(&self.pool)
            .await
            .context("Unable to count expenses")?;
        Ok(u64::try_from(count).unwrap_or_default())
    }

    pub(crate) async fn insert_goal(
        &self,
        title: &str,
        description: Option<String>,
        target: Decimal,
        deadline: Option<String>,
    ) -> Result<SavingsGoal> {
        let title = title.trim();
        ensure!(!title.is_empty(), "A savings goal needs a title");
        ensure!(
            target > Decimal::ZERO,
            "The target of a savings goal must be more than zero"
        );
        let goal = SavingsGoal {
            id: utils::generate_id(),
            title: title.to_string(),
            description,
            current: Decimal::ZERO,
            target,
            deadline,
        };
        sqlx::query(
            "INSERT INTO savings_goals (id, title, description, current, target, deadline) \
            VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&goal.id)
        .bind(&goal.title)
        .bind(&goal.description)
        .bind(goal.current.to_string())
        .bind(goal.target.to_string())
        .bind(&goal.deadline)
        .execute(&self.pool)
        .await
        .with_context(|| format!("Unable to add savings goal '{}'", goal.title))?;
        self.changes
            .publish(Change::new(SAVINGS_GOALS, ChangeKind::Insert));
        Ok(goal)
    }

    /// In the order they were added.
    pub(crate) async fn list_goals(&self) -> Result<Vec<SavingsGoal>> {
        let rows = sqlx::query(
            "SELECT id, title, description, current, target, deadline FROM savings_goals \
            ORDER BY rowid",
        )
        .fetch_all(&self.pool)
        .await
        .context("Unable to query savings goals")?;
        rows.iter().map(goal_from_row).collect()
    }

    /// Adds `amount` (which may be negative for a withdrawal) to the goal whose id or title is
    /// `goal`, and returns the updated goal.
    pub(crate) async fn contribute_to_goal(
        &self,
        goal: &str,
        amount: Decimal,
    ) -> Result<SavingsGoal> {
        ensure!(!amount.is_zero(), "The contribution must not be zero");
        let mut tx = self
            .pool
            .begin()
            .await
            .context("Unable to begin a transaction")?;
        let row = sqlx::query(
            "SELECT id, title, description, current, target, deadline FROM savings_goals \
            WHERE id = ? OR title = ? LIMIT 1",
        )
        .bind(goal)
        .bind(goal)
        .fetch_optional(&mut *tx)
        .await
        .with_context(|| format!("Unable to look up savings goal '{goal}'"))?;
        let Some(row) = row else {
            bail!("There is no savings goal named '{goal}'");
        };
        let mut found = goal_from_row(&row)?;
        let Some(current) = found.current.checked_add(amount) else {
            bail!("'{}' cannot hold that much", found.title);
        };
        ensure!(
            current >= Decimal::ZERO,
            "Cannot withdraw {} from '{}', it only holds {}",
            -amount,
            found.title,
            found.current()
        );
        sqlx::query("UPDATE savings_goals SET current = ? WHERE id = ?")
            .bind(current.to_string())
            .bind(&found.id)
            .execute(&mut *tx)
            .await
            .with_context(|| format!("Unable to update savings goal '{}'", found.title))?;
        tx.commit()
            .await
            .context("Unable to commit the contribution")?;
        found.current = current;
        self.changes
            .publish(Change::new(SAVINGS_GOALS, ChangeKind::Update));
        Ok(found)
    }
}

async fn connect(path: &Path, create: bool) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", path.display()))
        .context("Unable to build the SQLite connection string")?
        .create_if_missing(create)
        .foreign_keys(true);
    SqlitePoolOptions::new()
        .connect_with(options)
        .await
        .with_context(|| format!("Unable to open the database at {}", path.display()))
}

async fn insert_expense_row<'e, E>(executor: E, expense: &Expense) -> Result<()>
where
    E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
{
    sqlx::query("INSERT INTO expenses (id, date, amount, description) VALUES (?, ?, ?, ?)")
        .bind(expense.id())
        .bind(expense.raw_date())
        .bind(expense.raw_amount())
        .bind(expense.description())
        .execute(executor)
        .await
        .with_context(|| format!("Unable to insert expense {}", expense.id()))?;
    Ok(())
}

fn expense_from_row(row: &SqliteRow) -> Result<Expense> {
    let id: String = row.try_get("id")?;
    let date: String = row.try_get("date")?;
    let amount: String = row.try_get("amount")?;
    let description: Option<String> = row.try_get("description")?;
    Ok(Expense::new(id, date, amount, description))
}

fn goal_from_row(row: &SqliteRow) -> Result<SavingsGoal> {
    let id: String = row.try_get("id")?;
    let current: String = row.try_get("current")?;
    let target: String = row.try_get("target")?;
    Ok(SavingsGoal {
        current: Decimal::from_str(&current)
            .with_context(|| format!("Savings goal {id} has a bad current amount '{current}'"))?,
        target: Decimal::from_str(&target)
            .with_context(|| format!("Savings goal {id} has a bad target amount '{target}'"))?,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        deadline: row.try_get("deadline")?,
        id,
    })
}
