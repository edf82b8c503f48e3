use chrono::NaiveDate;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MortgageError {
    #[error("invalid total price: {0} (must be positive and finite)")]
    InvalidTotalPrice(f64),

    #[error("invalid loan term: {0} years (must be between 1 and 100)")]
    InvalidTerm(u32),

    #[error("invalid annual interest rate: {0} (must be non-negative and finite)")]
    InvalidInterestRate(f64),

    #[error("invalid down payment fraction: {0} (must be in [0, 1))")]
    InvalidDownPayment(f64),

    #[error("invalid insurance rate: {0} (must be non-negative and finite)")]
    InvalidInsuranceRate(f64),

    #[error("payment date out of range: {months} months after {start}")]
    DateOutOfRange { start: NaiveDate, months: u32 },
}

pub type Result<T> = std::result::Result<T, MortgageError>;
