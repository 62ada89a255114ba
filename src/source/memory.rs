//! An `ExpenseSource` that keeps its expenses in memory.
//!
//! Note: this is compiled into the release binary so that the program can run against seeded data
//! when `FINNY_IN_TEST_MODE` is set.

use crate::model::Expense;
use crate::source::{Change, ChangeFeed, ChangeKind, ExpenseSource, Subscription, EXPENSES};
use crate::{import, Result};
use anyhow::Context;
use tokio::sync::Mutex;

pub struct MemorySource {
    expenses: Mutex<Vec<Expense>>,
    changes: ChangeFeed,
}

impl MemorySource {
    pub fn new(expenses: Vec<Expense>) -> Self {
        Self {
            expenses: Mutex::new(expenses),
            changes: ChangeFeed::default(),
        }
    }

    /// Creates a source holding the seed expenses from this module.
    pub fn seeded() -> Result<Self> {
        let expenses = import::parse_csv(SEED_DATA.as_bytes())
            .context("Unable to parse the seed expense data")?;
        Ok(Self::new(expenses))
    }

    /// Adds an expense and notifies subscribers, the way a write to the hosted table would.
    pub async fn insert(&self, expense: Expense) {
        self.expenses.lock().await.push(expense);
        self.changes.publish(Change::new(EXPENSES, ChangeKind::Insert));
    }

    /// Removes the expense with `id`. Returns whether anything was removed.
    pub async fn remove(&self, id: &str) -> bool {
        let mut expenses = self.expenses.lock().await;
        let before = expenses.len();
        expenses.retain(|e| e.id() != id);
        let removed = expenses.len() < before;
        if removed {
            self.changes.publish(Change::new(EXPENSES, ChangeKind::Delete));
        }
        removed
    }

    pub fn changes(&self) -> &ChangeFeed {
        &self.changes
    }
}

#[async_trait::async_trait]
impl ExpenseSource for MemorySource {
    async fn fetch_expenses(&self) -> Result<Vec<Expense>> {
        Ok(self.expenses.lock().await.clone())
    }

    fn subscribe(&self) -> Subscription {
        self.changes.subscribe()
    }
}

/// Seed expenses.
const SEED_DATA: &str = r##"Date,Amount,Description
2025-10-20,87.43,Groceries
2025-10-19,6.75,Coffee Shops
2025-10-18,52.30,Gas & Fuel
2025-10-16,142.67,Utilities
2025-10-15,63.21,Groceries
2025-10-12,12.40,Restaurants
2025-09-28,1200.00,Housing
2025-09-21,95.82,Groceries
2025-09-14,89.99,Utilities
2025-09-03,42.30,Restaurants
2025-08-28,1200.00,Housing
2025-08-19,118.56,Groceries
2025-08-11,61.45,Gas & Fuel
2025-08-02,150.00,Entertainment
2025-07-28,1200.00,Housing
2025-07-15,48.90,Gas & Fuel
2025-07-09,,
2025-06-28,1200.00,Housing
2025-06-17,75.00,Utilities
2025-05-28,1200.00,Housing
2025-05-10,9.75,Restaurants
2025-04-10,150.00,Emergency Fund
2025-04-05,75.00,New Laptop
2025-04-01,50.00,Vacation
2024-12-24,230.00,
"##;
