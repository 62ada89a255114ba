//! Command handlers for the finny CLI.
//!
//! This module contains implementations for all CLI subcommands.

mod expense;
mod goal;
mod init;
mod stats;

use serde::Serialize;
use std::fmt::Debug;
use tracing::{debug, info};

pub use expense::{add_expense, delete_expense, import_expenses, list_expenses, Imported};
pub use goal::{goal_add, goal_contribute, goal_list, GoalList};
pub use init::init;
pub use stats::{stats, watch};

/// The output type for a command: a message for the user and, optionally, the structured data the
/// message was made from.
#[derive(Debug, Clone, Serialize)]
pub struct Out<T>
where
    T: Serialize + Clone + Debug,
{
    /// A message that can be printed to the user regarding the outcome of the command execution.
    message: String,

    /// Any structured data that needs to be output from the call.
    structure: Option<T>,
}

impl<T, S> From<S> for Out<T>
where
    T: Debug + Clone + Serialize,
    S: Into<String>,
{
    fn from(value: S) -> Self {
        Out::new_message(value)
    }
}

impl<T> Out<T>
where
    T: Serialize + Clone + Debug,
{
    /// Create a new `Out` object that has `Some(structure)`.
    pub fn new<S>(message: S, structure: T) -> Self
    where
        S: Into<String>,
    {
        Self {
            message: message.into(),
            structure: Some(structure),
        }
    }

    /// Create a new `Out` object that has `None` for `structure`.
    pub fn new_message<S>(message: S) -> Self
    where
        S: Into<String>,
    {
        Self {
            message: message.into(),
            structure: None,
        }
    }

    /// Get the `message`.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Get the structured data stored in `structure`.
    pub fn structure(&self) -> Option<&T> {
        self.structure.as_ref()
    }

    /// Print the message to `info!` and the structured data (if it exists) as JSON to `debug!`.
    pub fn print(&self) {
        info!("{}", self.message);
        if let Some(structure) = self.structure() {
            if let Ok(json) = serde_json::to_string_pretty(structure) {
                debug!("Command output:\n\n{json}\n\n");
            }
        }
    }

    /// Print the message to stdout, for commands whose message is the data the user asked for.
    pub fn print_stdout(&self) {
        println!("{}", self.message.trim_end());
        if let Some(structure) = self.structure() {
            if let Ok(json) = serde_json::to_string(structure) {
                debug!("Command output: {json}");
            }
        }
    }
}
