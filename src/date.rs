//! Date stamp module
//!
//! Resolves the date written next to a signature and formats it as `YYYY-MM-DD`.
//! The current date comes from a [`Clock`] so tests can pin it.

use chrono::{Local, NaiveDate};
use crate::error::{Error, Result};

/// Source of "today"
pub trait Clock {
    fn today(&self) -> NaiveDate;
}

/// The local system clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// A clock stuck on one date
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

/// Date expression types
#[derive(Debug, Clone, PartialEq)]
pub enum DateExpression {
    /// Use today's date
    Today,
    /// Use an explicit date
    Explicit(NaiveDate),
}

/// Parse a date expression string into a DateExpression
///
/// Supported formats:
/// - `"today"` → Today
/// - `"2024-11-20"` → Explicit date (ISO format)
/// - `"11/20/2024"` → Explicit date (US format)
pub fn parse_date_expression(expr: &str) -> Result<DateExpression> {
    let expr = expr.trim();

    if expr.eq_ignore_ascii_case("today") {
        return Ok(DateExpression::Today);
    }

    // ISO format: 2024-11-20
    if let Ok(date) = NaiveDate::parse_from_str(expr, "%Y-%m-%d") {
        return Ok(DateExpression::Explicit(date));
    }

    // US format: 11/20/2024
    if let Ok(date) = NaiveDate::parse_from_str(expr, "%m/%d/%Y") {
        return Ok(DateExpression::Explicit(date));
    }

    Err(Error::InvalidDateExpression(format!("Unable to parse date expression: {}", expr)))
}

/// Resolve a DateExpression to an actual date
pub fn resolve_date(expr: &DateExpression, clock: &dyn Clock) -> NaiveDate {
    match expr {
        DateExpression::Today => clock.today(),
        DateExpression::Explicit(date) => *date,
    }
}

/// Format a date the way it is stamped: "2024-01-01"
pub fn format_date(date: &NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}
