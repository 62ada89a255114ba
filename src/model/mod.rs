//! Types that represent the core data model, such as `Expense` and `SavingsGoal`.
mod amount;
mod expense;
mod goal;
mod range;

pub use amount::{Amount, AmountError, AmountFormat};
pub use expense::{parse_date, Expense, FALLBACK_CATEGORY};
pub use goal::{SavingsGoal, SavingsProgress};
pub use range::TimeRange;
