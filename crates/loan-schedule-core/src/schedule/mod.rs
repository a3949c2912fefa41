pub mod builder;
pub mod form;
pub mod request;

pub use builder::{build_schedule, calculate_schedule, Installment, ScheduleResult};
pub use form::LoanForm;
pub use request::{
    collect_validation_errors, derive_installment_count, loan_totals, validate_request,
    LoanRequest, LoanTotals, RepaymentTerms, ScheduleMode, ValidatedLoan, MAX_INSTALLMENTS,
};
