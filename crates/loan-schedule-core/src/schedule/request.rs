use chrono::{Months, NaiveDate};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::currency::round2;
use crate::error::LoanScheduleError;
use crate::types::*;
use crate::LoanScheduleResult;

/// Longest schedule accepted: 50 years of monthly installments.
pub const MAX_INSTALLMENTS: u32 = 600;

/// Which of installment amount / installment count the caller supplies.
/// The other one is derived.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScheduleMode {
    #[serde(alias = "by_installment_amount", alias = "amount")]
    ByInstallmentAmount,
    #[default]
    #[serde(alias = "by_installment_count", alias = "count")]
    ByInstallmentCount,
}

/// Loan parameters as captured from the loan form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub principal: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annual_rate_percent: Option<Percent>,
    #[serde(default)]
    pub with_interest: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub mode: ScheduleMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub installment_amount: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub installment_count: Option<u32>,
}

/// Caller-supplied side of the repayment plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RepaymentTerms {
    ByAmount(Money),
    ByCount(u32),
}

impl RepaymentTerms {
    pub fn mode(&self) -> ScheduleMode {
        match self {
            RepaymentTerms::ByAmount(_) => ScheduleMode::ByInstallmentAmount,
            RepaymentTerms::ByCount(_) => ScheduleMode::ByInstallmentCount,
        }
    }
}

/// Aggregate flat-interest figures for a loan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanTotals {
    pub total_interest: Money,
    pub total_repayable: Money,
}

/// A request that passed validation, with totals and the installment
/// count/amount pair resolved. Only `validate_request` constructs one.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidatedLoan {
    principal: Money,
    annual_rate_percent: Percent,
    with_interest: bool,
    start_date: NaiveDate,
    terms: RepaymentTerms,
    totals: LoanTotals,
    installment_count: u32,
    installment_amount: Money,
}

impl ValidatedLoan {
    pub fn principal(&self) -> Money {
        self.principal
    }

    /// Effective annual rate: zero for interest-free loans.
    pub fn annual_rate_percent(&self) -> Percent {
        self.annual_rate_percent
    }

    pub fn with_interest(&self) -> bool {
        self.with_interest
    }

    pub fn start_date(&self) -> NaiveDate {
        self.start_date
    }

    pub fn terms(&self) -> RepaymentTerms {
        self.terms
    }

    pub fn mode(&self) -> ScheduleMode {
        self.terms.mode()
    }

    pub fn totals(&self) -> LoanTotals {
        self.totals
    }

    pub fn installment_count(&self) -> u32 {
        self.installment_count
    }

    /// Echoed amount in amount mode, `round2(total / N)` in count mode.
    pub fn installment_amount(&self) -> Money {
        self.installment_amount
    }
}

/// Flat interest on the original principal for the whole term.
///
/// Returns `None` only when the figures overflow the decimal range.
pub fn loan_totals(principal: Money, annual_rate_percent: Percent, with_interest: bool) -> Option<LoanTotals> {
    let rate = if with_interest {
        annual_rate_percent.checked_div(dec!(100))?
    } else {
        Decimal::ZERO
    };
    let total_interest = round2(principal.checked_mul(rate)?);
    let total_repayable = round2(principal.checked_add(total_interest)?);
    Some(LoanTotals {
        total_interest,
        total_repayable,
    })
}

/// Installments needed to repay `total_repayable` at `installment_amount`
/// each, the last one partial: `ceil(total / amount)`.
pub fn derive_installment_count(total_repayable: Money, installment_amount: Money) -> Option<u32> {
    if installment_amount <= Decimal::ZERO {
        return None;
    }
    total_repayable
        .checked_div(installment_amount)?
        .ceil()
        .to_u32()
}

/// Validate a request and resolve its repayment plan.
///
/// Checks run in a fixed order and the first failure is returned:
/// principal, rate, installment amount, installment count, start date.
pub fn validate_request(request: &LoanRequest) -> LoanScheduleResult<ValidatedLoan> {
    let result = resolve(request);
    if let Err(ref e) = result {
        tracing::debug!(kind = ?e.kind(), field = e.field(), "loan request rejected");
    }
    result
}

/// Every validation failure for the request, in check order.
///
/// Checks that depend on the loan totals are skipped while the principal or
/// rate is itself invalid.
pub fn collect_validation_errors(request: &LoanRequest) -> Vec<LoanScheduleError> {
    let mut errors = Vec::new();

    let principal = check_principal(request).map_err(|e| errors.push(e)).ok();
    let rate = check_rate(request).map_err(|e| errors.push(e)).ok();

    let totals = match (principal, rate) {
        (Some(p), Some(r)) => match loan_totals(p, r, request.with_interest) {
            Some(t) => Some(t),
            None => {
                errors.push(too_large_error());
                None
            }
        },
        _ => None,
    };

    let plan = check_terms(request, totals.as_ref())
        .map_err(|e| errors.push(e))
        .ok()
        .flatten();

    let count = plan.map(|(_, n, _)| n);
    if let Err(e) = check_start_date(request, count) {
        errors.push(e);
    }

    errors
}

fn resolve(request: &LoanRequest) -> LoanScheduleResult<ValidatedLoan> {
    let principal = check_principal(request)?;
    let annual_rate_percent = check_rate(request)?;
    let totals = loan_totals(principal, annual_rate_percent, request.with_interest)
        .ok_or_else(too_large_error)?;
    let (terms, installment_count, installment_amount) = check_terms(request, Some(&totals))?
        .ok_or_else(too_large_error)?;
    let start_date = check_start_date(request, Some(installment_count))?;

    Ok(ValidatedLoan {
        principal,
        annual_rate_percent,
        with_interest: request.with_interest,
        start_date,
        terms,
        totals,
        installment_count,
        installment_amount,
    })
}

fn too_large_error() -> LoanScheduleError {
    LoanScheduleError::InvalidAmount {
        field: "principal".into(),
        reason: "Loan figures exceed the supported decimal range".into(),
    }
}

/// The principal is disbursed in whole cents.
fn check_principal(request: &LoanRequest) -> LoanScheduleResult<Money> {
    let Some(principal) = request.principal.map(round2) else {
        return Err(LoanScheduleError::InvalidAmount {
            field: "principal".into(),
            reason: "Loan amount is required".into(),
        });
    };
    if principal <= Decimal::ZERO {
        return Err(LoanScheduleError::InvalidAmount {
            field: "principal".into(),
            reason: "Loan amount must be at least 0.01".into(),
        });
    }
    Ok(principal)
}

fn check_rate(request: &LoanRequest) -> LoanScheduleResult<Percent> {
    if !request.with_interest {
        return Ok(Decimal::ZERO);
    }
    match request.annual_rate_percent {
        None => Err(LoanScheduleError::InvalidRate {
            field: "annual_rate_percent".into(),
            reason: "Interest rate is required when the loan carries interest".into(),
        }),
        Some(rate) if rate < Decimal::ZERO => Err(LoanScheduleError::InvalidRate {
            field: "annual_rate_percent".into(),
            reason: "Interest rate cannot be negative".into(),
        }),
        Some(rate) => Ok(rate),
    }
}

/// Resolves `(terms, count, reported amount)`. The inner `None` means the
/// terms are well-formed but the totals were not available to size them.
fn check_terms(
    request: &LoanRequest,
    totals: Option<&LoanTotals>,
) -> LoanScheduleResult<Option<(RepaymentTerms, u32, Money)>> {
    match request.mode {
        ScheduleMode::ByInstallmentAmount => {
            // Rows are paid in whole cents, so the count is sized on the
            // rounded amount.
            let amount = match request.installment_amount.map(round2) {
                Some(a) if a > Decimal::ZERO => a,
                Some(_) => {
                    return Err(LoanScheduleError::InvalidInstallment {
                        field: "installment_amount".into(),
                        reason: "Installment amount must be at least 0.01".into(),
                    })
                }
                None => {
                    return Err(LoanScheduleError::InvalidInstallment {
                        field: "installment_amount".into(),
                        reason: "Installment amount is required in ByInstallmentAmount mode".into(),
                    })
                }
            };
            let Some(totals) = totals else {
                return Ok(None);
            };
            match derive_installment_count(totals.total_repayable, amount) {
                Some(n) if n <= MAX_INSTALLMENTS => {
                    Ok(Some((RepaymentTerms::ByAmount(amount), n, amount)))
                }
                _ => Err(LoanScheduleError::InvalidInstallment {
                    field: "installment_amount".into(),
                    reason: format!(
                        "Installment amount {amount} would need more than {MAX_INSTALLMENTS} installments to repay {}",
                        totals.total_repayable
                    ),
                }),
            }
        }
        ScheduleMode::ByInstallmentCount => {
            let count = match request.installment_count {
                Some(0) => {
                    return Err(LoanScheduleError::InvalidCount {
                        field: "installment_count".into(),
                        reason: "Installment count must be greater than zero".into(),
                    })
                }
                Some(n) if n > MAX_INSTALLMENTS => {
                    return Err(LoanScheduleError::InvalidCount {
                        field: "installment_count".into(),
                        reason: format!("Installment count cannot exceed {MAX_INSTALLMENTS}"),
                    })
                }
                Some(n) => n,
                None => {
                    return Err(LoanScheduleError::InvalidCount {
                        field: "installment_count".into(),
                        reason: "Installment count is required in ByInstallmentCount mode".into(),
                    })
                }
            };
            let Some(totals) = totals else {
                return Ok(None);
            };
            let amount = round2(totals.total_repayable / Decimal::from(count));
            // Rows before the last are paid at the rounded amount; they must
            // leave a non-negative remainder for the final row.
            if amount * Decimal::from(count - 1) > totals.total_repayable {
                return Err(LoanScheduleError::InvalidCount {
                    field: "installment_count".into(),
                    reason: format!(
                        "{count} installments of {amount} would exceed the total repayable of {}",
                        totals.total_repayable
                    ),
                });
            }
            Ok(Some((RepaymentTerms::ByCount(count), count, amount)))
        }
    }
}

fn check_start_date(request: &LoanRequest, installment_count: Option<u32>) -> LoanScheduleResult<NaiveDate> {
    let Some(start) = request.start_date else {
        return Err(LoanScheduleError::MissingField {
            field: "start_date".into(),
            reason: "Start date is required".into(),
        });
    };
    let months = installment_count.unwrap_or(MAX_INSTALLMENTS);
    if start.checked_add_months(Months::new(months)).is_none() {
        return Err(LoanScheduleError::MissingField {
            field: "start_date".into(),
            reason: format!("Start date {start} leaves no room for {months} monthly installments"),
        });
    }
    Ok(start)
}
