//! Where expenses come from.
//!
//! An `ExpenseSource` answers two questions: "what are all the expenses right now?" and "tell me
//! when they change". The production source reads the local SQLite store. The in-memory source is
//! used by tests and, when `FINNY_IN_TEST_MODE` is set, by the whole program, so that it can be run
//! top-to-bottom without touching a real database.

mod memory;
mod sqlite;

use crate::model::Expense;
use crate::{Config, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tracing::{trace, warn};

pub use memory::MemorySource;
pub use sqlite::SqliteSource;

/// Table names used in change notifications.
pub const EXPENSES: &str = "expenses";
pub const SAVINGS_GOALS: &str = "savings_goals";

/// How many notifications a slow subscriber may fall behind before it starts missing them.
const FEED_CAPACITY: usize = 64;

/// Read access to expenses plus change notifications.
#[async_trait::async_trait]
pub trait ExpenseSource: Send + Sync {
    /// Returns every expense the source currently holds.
    async fn fetch_expenses(&self) -> Result<Vec<Expense>>;

    /// Starts receiving change notifications. They stop when the `Subscription` is dropped.
    fn subscribe(&self) -> Subscription;
}

/// What happened to a table.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
    /// The subscriber fell behind and some notifications were dropped.
    Missed,
}

serde_plain::derive_display_from_serialize!(ChangeKind);

/// A change notification.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct Change {
    pub table: String,
    pub kind: ChangeKind,
}

impl Change {
    pub fn new(table: impl Into<String>, kind: ChangeKind) -> Self {
        Self {
            table: table.into(),
            kind,
        }
    }
}

/// Fans change notifications out to every live `Subscription`.
#[derive(Debug, Clone)]
pub struct ChangeFeed {
    sender: broadcast::Sender<Change>,
}

impl Default for ChangeFeed {
    fn default() -> Self {
        let (sender, _) = broadcast::channel(FEED_CAPACITY);
        Self { sender }
    }
}

impl ChangeFeed {
    pub fn publish(&self, change: Change) {
        trace!("Publishing {} on {}", change.kind, change.table);
        // Sending only fails when nobody is listening, which is fine.
        let _ = self.sender.send(change);
    }

    pub fn subscribe(&self) -> Subscription {
        Subscription {
            receiver: Some(self.sender.subscribe()),
        }
    }

    /// The number of live subscriptions.
    pub fn subscribers(&self) -> usize {
        self.sender.receiver_count()
    }
}

/// A live registration for change notifications. Dropping it, or calling `unsubscribe`, releases
/// the registration.
#[derive(Debug)]
pub struct Subscription {
    receiver: Option<broadcast::Receiver<Change>>,
}

impl Subscription {
    /// Waits for the next change. Returns `None` once the feed is gone or after `unsubscribe`.
    pub async fn recv(&mut self) -> Option<Change> {
        let receiver = self.receiver.as_mut()?;
        match receiver.recv().await {
            Ok(change) => Some(change),
            Err(RecvError::Lagged(missed)) => {
                warn!("Missed {missed} change notifications");
                Some(Change::new(EXPENSES, ChangeKind::Missed))
            }
            Err(RecvError::Closed) => {
                self.receiver = None;
                None
            }
        }
    }

    /// Releases the registration now rather than when the subscription is dropped.
    pub fn unsubscribe(&mut self) {
        self.receiver = None;
    }

    pub fn is_active(&self) -> bool {
        self.receiver.is_some()
    }
}

/// Selects which `ExpenseSource` the commands use.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq)]
pub enum Mode {
    /// The SQLite store in `$FINNY_HOME`.
    #[default]
    Sqlite,
    /// Seeded in-memory data.
    Testing,
}

impl Mode {
    /// `Mode::Testing` when `FINNY_IN_TEST_MODE` is set to anything non-empty.
    pub fn from_env() -> Self {
        match std::env::var("FINNY_IN_TEST_MODE") {
            Ok(value) if !value.is_empty() => Mode::Testing,
            _ => Mode::Sqlite,
        }
    }
}

/// Builds the source for `mode`.
pub fn source(config: &Config, mode: Mode) -> Result<Arc<dyn ExpenseSource>> {
    Ok(match mode {
        Mode::Sqlite => Arc::new(SqliteSource::new(config.db().clone())),
        Mode::Testing => Arc::new(MemorySource::seeded()?),
    })
}
