//! Implements `ExpenseSource` on top of the local SQLite store.

use crate::db::Db;
use crate::model::Expense;
use crate::source::{ExpenseSource, Subscription};
use crate::Result;
use tracing::trace;

/// Reads expenses from `Db`. Writes made through the same `Db` (or any clone of it) are delivered
/// to subscribers.
pub struct SqliteSource {
    db: Db,
}

impl SqliteSource {
    pub(crate) fn new(db: Db) -> Self {
        Self { db }
    }
}

#[async_trait::async_trait]
impl ExpenseSource for SqliteSource {
    async fn fetch_expenses(&self) -> Result<Vec<Expense>> {
        let expenses = self.db.list_expenses().await?;
        trace!("Fetched {} expenses", expenses.len());
        Ok(expenses)
    }

    fn subscribe(&self) -> Subscription {
        self.db.changes().subscribe()
    }
}
