//! Fixed-rate mortgage amortization and cost summary.

pub mod amortization;
pub mod error;
pub mod mortgage;
pub mod render;

pub use error::{MortgageError, Result};
pub use mortgage::{LoanParameters, Mortgage, MortgageSummary};
