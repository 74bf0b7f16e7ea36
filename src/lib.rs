pub mod error;
pub mod loan;
pub mod report;
