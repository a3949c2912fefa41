pub mod currency;
pub mod error;
pub mod types;

#[cfg(feature = "schedule")]
pub mod schedule;

#[cfg(feature = "inspector")]
pub mod inspector;

#[cfg(feature = "records")]
pub mod records;

pub use error::{ErrorKind, FieldIssue, LoanScheduleError};
pub use types::*;

/// Standard result type for all loan-schedule operations
pub type LoanScheduleResult<T> = Result<T, LoanScheduleError>;
