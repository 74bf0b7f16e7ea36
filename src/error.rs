use chrono::NaiveDate;
use thiserror::Error;

/// Input faults, all raised before a schedule is simulated.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum LoanError {
    #[error("principal must be positive, got {0}")]
    InvalidPrincipal(i64),

    #[error("term must be between 1 and {max} years, got {0}", max = crate::loan::MAX_TERM_YEARS)]
    InvalidTerm(i64),

    #[error("annual rate must be a finite, non-negative number, got {0}")]
    InvalidRate(f64),

    #[error(
        "a {term_years} year schedule for {principal} at annual rate {annual_rate} exceeds the currency range"
    )]
    OutOfRange {
        principal: i64,
        term_years: u32,
        annual_rate: f64,
    },

    #[error("monthly payment is not a finite amount: {0}")]
    NonFinitePayment(f64),

    #[error("report interval must be at least 1 month, got {0}")]
    InvalidReportInterval(u32),

    #[error("{0} does not return a next payment date")]
    DateOverflow(NaiveDate),
}
