//! Errors are `anyhow` errors throughout. Expected failures are reported with `bail!` or
//! `ensure!`, and every I/O or database boundary adds context describing what was being attempted.

pub type Error = anyhow::Error;
pub type Result<T> = std::result::Result<T, Error>;
