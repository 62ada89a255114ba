//! finny computes spending statistics from a store of expenses and tracks progress toward savings
//! goals.
//!
//! The statistics live in [`stats`] and are pure functions over [`model::Expense`] values. Where
//! the expenses come from is behind [`source::ExpenseSource`], and [`refresh::RefreshLoop`] keeps a
//! report current as the source changes.

pub mod args;
pub mod commands;
mod config;
mod db;
mod error;
mod import;
pub mod model;
pub mod refresh;
pub mod source;
pub mod stats;
mod utils;


pub use config::Config;
pub use error::Error;
pub use error::Result;
pub use source::Mode;
