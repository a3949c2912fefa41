use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::LoanScheduleError;
use crate::schedule::{
    derive_installment_count, LoanRequest, ScheduleMode, ScheduleResult,
};
use crate::types::*;
use crate::LoanScheduleResult;

/// Summary of a granted loan, in the shape the loan store accepts.
///
/// Rows are not stored; `to_request` rebuilds a request that reproduces
/// the same schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanRecord {
    pub loan_id: String,
    pub employee_id: String,
    pub loan_amount: Money,
    pub interest_rate_per_annum: Percent,
    pub installment_amount: Money,
    pub start_from: NaiveDate,
    pub with_interest: bool,
    pub installment_count: u32,
}

impl LoanRecord {
    pub fn from_schedule(
        loan_id: &str,
        employee_id: &str,
        schedule: &ScheduleResult,
    ) -> LoanScheduleResult<Self> {
        let loan_id = required(loan_id, "loan_id")?;
        let employee_id = required(employee_id, "employee_id")?;

        Ok(LoanRecord {
            loan_id,
            employee_id,
            loan_amount: schedule.principal,
            interest_rate_per_annum: schedule.annual_rate_percent,
            installment_amount: schedule.installment_amount,
            start_from: schedule.start_date,
            with_interest: schedule.with_interest,
            installment_count: schedule.installment_count,
        })
    }

    /// Request whose schedule matches the one this record was made from.
    ///
    /// Amount mode reproduces both modes whenever the stored amount covers
    /// the stored count; a count-mode amount that was rounded down would
    /// need one extra row, so those fall back to count mode.
    pub fn to_request(&self) -> LoanRequest {
        let total_repayable = crate::schedule::loan_totals(
            self.loan_amount,
            self.interest_rate_per_annum,
            self.with_interest,
        )
        .map(|t| t.total_repayable);

        let amount_mode_matches = total_repayable
            .and_then(|total| derive_installment_count(total, self.installment_amount))
            == Some(self.installment_count);

        let (mode, installment_amount, installment_count) = if amount_mode_matches {
            (ScheduleMode::ByInstallmentAmount, Some(self.installment_amount), None)
        } else {
            (ScheduleMode::ByInstallmentCount, None, Some(self.installment_count))
        };

        LoanRequest {
            principal: Some(self.loan_amount),
            annual_rate_percent: Some(self.interest_rate_per_annum),
            with_interest: self.with_interest,
            start_date: Some(self.start_from),
            mode,
            installment_amount,
            installment_count,
        }
    }
}

fn required(value: &str, field: &str) -> LoanScheduleResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(LoanScheduleError::MissingField {
            field: field.into(),
            reason: format!("{field} is required to save a loan"),
        });
    }
    Ok(trimmed.to_string())
}
