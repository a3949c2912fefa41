use chrono::{Months, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use super::request::{validate_request, LoanRequest, RepaymentTerms, ScheduleMode, ValidatedLoan};
use crate::currency::{round2, CENT};
use crate::types::*;
use crate::LoanScheduleResult;

/// One scheduled repayment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Installment {
    pub number: u32,
    pub due_date: NaiveDate,
    pub capital_repayment: Money,
    pub interest_payment: Money,
    pub installment_amount: Money,
    /// Principal still owed after this installment
    pub outstanding_balance: Money,
}

/// Full repayment schedule for a loan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleResult {
    pub principal: Money,
    pub annual_rate_percent: Percent,
    pub with_interest: bool,
    pub start_date: NaiveDate,
    pub mode: ScheduleMode,
    pub total_interest: Money,
    pub total_repayable: Money,
    pub installment_count: u32,
    pub installment_amount: Money,
    pub installments: Vec<Installment>,
}

impl ScheduleResult {
    pub fn installment(&self, number: u32) -> Option<&Installment> {
        let idx = number.checked_sub(1)? as usize;
        self.installments.get(idx)
    }

    /// Principal owed before installment `number` is paid.
    pub fn outstanding_before(&self, number: u32) -> Option<Money> {
        self.installment(number)?;
        match number {
            1 => Some(self.principal),
            n => self.installment(n - 1).map(|i| i.outstanding_balance),
        }
    }
}

/// Calculate a flat-interest repayment schedule.
///
/// Validates the request, resolves the installment amount or count that was
/// not supplied, and lays out one row per month starting one calendar month
/// after `start_date`. Every currency figure is rounded to the cent as it is
/// produced; the final row absorbs the rounding remainder of each column.
pub fn calculate_schedule(
    request: &LoanRequest,
) -> LoanScheduleResult<ComputationOutput<ScheduleResult>> {
    let start = Instant::now();
    let loan = validate_request(request)?;
    let mut warnings = request_warnings(request, &loan);

    let schedule = build_rows(&loan, &mut warnings);

    tracing::debug!(
        principal = %schedule.principal,
        installments = schedule.installment_count,
        total_repayable = %schedule.total_repayable,
        "loan schedule built"
    );

    let elapsed = u64::try_from(start.elapsed().as_micros()).unwrap_or(u64::MAX);
    Ok(with_metadata(
        "Flat-interest installment schedule",
        &serde_json::json!({
            "principal": loan.principal().to_string(),
            "annual_rate_percent": loan.annual_rate_percent().to_string(),
            "with_interest": loan.with_interest(),
            "mode": loan.mode(),
            "start_date": loan.start_date().to_string(),
            "interest_basis": "original principal, full term",
            "rounding": "half away from zero, 2dp",
        }),
        warnings,
        elapsed,
        schedule,
    ))
}

/// Lay out the schedule for an already validated loan.
pub fn build_schedule(loan: &ValidatedLoan) -> ScheduleResult {
    let mut warnings = Vec::new();
    build_rows(loan, &mut warnings)
}

fn request_warnings(request: &LoanRequest, loan: &ValidatedLoan) -> Vec<String> {
    let mut warnings = Vec::new();

    if !request.with_interest {
        if let Some(rate) = request.annual_rate_percent.filter(|r| !r.is_zero()) {
            warnings.push(format!(
                "annual_rate_percent {rate} ignored: loan is interest-free"
            ));
        }
    }

    match loan.terms() {
        RepaymentTerms::ByAmount(amount) => {
            if request.installment_count.is_some() {
                warnings.push("installment_count ignored in ByInstallmentAmount mode".into());
            }
            if let Some(requested) = request.installment_amount.filter(|a| *a != amount) {
                warnings.push(format!("installment_amount {requested} rounded to {amount}"));
            }
            if amount >= loan.totals().total_repayable {
                warnings.push(format!(
                    "Installment amount {amount} covers the total repayable {}; single installment",
                    loan.totals().total_repayable
                ));
            }
        }
        RepaymentTerms::ByCount(_) => {
            if request.installment_amount.is_some() {
                warnings.push("installment_amount ignored in ByInstallmentCount mode".into());
            }
        }
    }

    warnings
}

fn build_rows(loan: &ValidatedLoan, warnings: &mut Vec<String>) -> ScheduleResult {
    let n = loan.installment_count();
    let totals = loan.totals();
    let n_dec = Decimal::from(n);

    // The two modes round intermediate rows differently; both leave the
    // remainder to the last row.
    let nominal_amount = match loan.terms() {
        RepaymentTerms::ByCount(_) => round2(totals.total_repayable / n_dec),
        RepaymentTerms::ByAmount(amount) => amount,
    };
    let base_interest = totals.total_interest / n_dec;

    let mut installments = Vec::with_capacity(n as usize);
    let mut paid_amount = Decimal::ZERO;
    let mut paid_interest = Decimal::ZERO;
    let mut balance = loan.principal();

    for number in 1..=n {
        let is_last = number == n;

        let amount = if is_last {
            round2(totals.total_repayable - paid_amount)
        } else {
            nominal_amount
        };

        let mut interest = if is_last {
            round2(totals.total_interest - paid_interest)
        } else {
            round2(base_interest).min(totals.total_interest - paid_interest)
        };

        let mut capital = round2(amount - interest);
        if capital < Decimal::ZERO {
            warnings.push(format!(
                "Installment {number}: interest {interest} exceeds installment {amount}; capital set to zero"
            ));
            interest = amount;
            capital = Decimal::ZERO;
        }
        if capital > balance {
            warnings.push(format!(
                "Installment {number}: capital {capital} capped at outstanding balance {balance}"
            ));
            capital = balance;
            interest = amount - capital;
        }

        paid_amount += amount;
        paid_interest += interest;

        balance = round2(balance - capital);
        if balance < CENT {
            balance = Decimal::ZERO;
        }

        if is_last && n > 1 && amount != nominal_amount {
            warnings.push(format!(
                "Final installment {number} is {amount} against a nominal {nominal_amount}"
            ));
        }

        installments.push(Installment {
            number,
            due_date: due_date(loan.start_date(), number),
            capital_repayment: capital,
            interest_payment: interest,
            installment_amount: amount,
            outstanding_balance: balance,
        });
    }

    ScheduleResult {
        principal: loan.principal(),
        annual_rate_percent: loan.annual_rate_percent(),
        with_interest: loan.with_interest(),
        start_date: loan.start_date(),
        mode: loan.mode(),
        total_interest: totals.total_interest,
        total_repayable: totals.total_repayable,
        installment_count: n,
        installment_amount: loan.installment_amount(),
        installments,
    }
}

/// `start + months` calendar months; day-of-month clamps to the month end.
fn due_date(start: NaiveDate, months: u32) -> NaiveDate {
    // Validation already checked the last due date is representable.
    start
        .checked_add_months(Months::new(months))
        .unwrap_or(NaiveDate::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn count_request() -> LoanRequest {
        LoanRequest {
            principal: Some(dec!(100000)),
            annual_rate_percent: Some(dec!(12)),
            with_interest: true,
            start_date: Some(date(2025, 1, 1)),
            mode: ScheduleMode::ByInstallmentCount,
            installment_amount: None,
            installment_count: Some(12),
        }
    }

    fn amount_request() -> LoanRequest {
        LoanRequest {
            principal: Some(dec!(50000)),
            annual_rate_percent: None,
            with_interest: false,
            start_date: Some(date(2025, 3, 15)),
            mode: ScheduleMode::ByInstallmentAmount,
            installment_amount: Some(dec!(7000)),
            installment_count: None,
        }
    }

    #[test]
    fn test_count_mode_twelve_months() {
        let out = calculate_schedule(&count_request()).unwrap();
        let s = &out.result;

        assert_eq!(s.total_interest, dec!(12000.00));
        assert_eq!(s.total_repayable, dec!(112000.00));
        assert_eq!(s.installment_count, 12);
        assert_eq!(s.installment_amount, dec!(9333.33));
        assert_eq!(s.installments.len(), 12);

        for row in &s.installments[..11] {
            assert_eq!(row.installment_amount, dec!(9333.33));
            assert_eq!(row.interest_payment, dec!(1000.00));
            assert_eq!(row.capital_repayment, dec!(8333.33));
        }

        let last = &s.installments[11];
        assert_eq!(last.installment_amount, dec!(9333.37));
        assert_eq!(last.interest_payment, dec!(1000.00));
        assert_eq!(last.capital_repayment, dec!(8333.37));
        assert_eq!(last.outstanding_balance, Decimal::ZERO);

        assert_eq!(s.installments[0].due_date, date(2025, 2, 1));
        assert_eq!(last.due_date, date(2026, 1, 1));
    }

    #[test]
    fn test_amount_mode_interest_free() {
        let out = calculate_schedule(&amount_request()).unwrap();
        let s = &out.result;

        assert_eq!(s.total_interest, Decimal::ZERO);
        assert_eq!(s.total_repayable, dec!(50000.00));
        assert_eq!(s.installment_count, 8);
        assert_eq!(s.installment_amount, dec!(7000));

        for row in &s.installments[..7] {
            assert_eq!(row.installment_amount, dec!(7000.00));
        }
        assert_eq!(s.installments[7].installment_amount, dec!(1000.00));
        assert_eq!(s.installments[0].due_date, date(2025, 4, 15));
        assert_eq!(s.installments[7].due_date, date(2025, 11, 15));
        assert_eq!(s.installments[6].outstanding_balance, dec!(1000.00));
        assert_eq!(s.installments[7].outstanding_balance, Decimal::ZERO);
    }

    #[test]
    fn test_interest_free_rows_are_all_capital() {
        let s = calculate_schedule(&amount_request()).unwrap().result;
        for row in &s.installments {
            assert_eq!(row.interest_payment, Decimal::ZERO);
            assert_eq!(row.capital_repayment, row.installment_amount);
        }
    }

    #[test]
    fn test_columns_sum_exactly() {
        let mut req = count_request();
        req.principal = Some(dec!(12345.67));
        req.annual_rate_percent = Some(dec!(7.5));
        req.installment_count = Some(7);
        let s = calculate_schedule(&req).unwrap().result;

        let capital: Decimal = s.installments.iter().map(|i| i.capital_repayment).sum();
        let interest: Decimal = s.installments.iter().map(|i| i.interest_payment).sum();
        let amount: Decimal = s.installments.iter().map(|i| i.installment_amount).sum();
        assert_eq!(capital, s.principal);
        assert_eq!(interest, s.total_interest);
        assert_eq!(amount, s.total_repayable);
    }

    #[test]
    fn test_month_end_start_clamps() {
        let mut req = count_request();
        req.start_date = Some(date(2024, 1, 31));
        req.installment_count = Some(3);
        let s = calculate_schedule(&req).unwrap().result;
        assert_eq!(s.installments[0].due_date, date(2024, 2, 29));
        assert_eq!(s.installments[1].due_date, date(2024, 3, 31));
        assert_eq!(s.installments[2].due_date, date(2024, 4, 30));
    }

    #[test]
    fn test_large_first_installment_caps_capital() {
        // 1000 at 10%: total 1100; an 1090 installment would overpay capital
        // in row 1 under a plain amount - interest split.
        let req = LoanRequest {
            principal: Some(dec!(1000)),
            annual_rate_percent: Some(dec!(10)),
            with_interest: true,
            start_date: Some(date(2025, 1, 1)),
            mode: ScheduleMode::ByInstallmentAmount,
            installment_amount: Some(dec!(1090)),
            installment_count: None,
        };
        let out = calculate_schedule(&req).unwrap();
        let s = &out.result;

        assert_eq!(s.installment_count, 2);
        assert_eq!(s.installments[0].capital_repayment, dec!(1000));
        assert_eq!(s.installments[0].interest_payment, dec!(90));
        assert_eq!(s.installments[0].outstanding_balance, Decimal::ZERO);
        assert_eq!(s.installments[1].installment_amount, dec!(10.00));
        assert_eq!(s.installments[1].interest_payment, dec!(10.00));
        assert_eq!(s.installments[1].capital_repayment, Decimal::ZERO);
        assert!(out.warnings.iter().any(|w| w.contains("capped")));
    }

    #[test]
    fn test_interest_rounding_never_overshoots() {
        // Interest 0.15 over 10 rows rounds each row up to 0.02.
        let req = LoanRequest {
            principal: Some(dec!(1000)),
            annual_rate_percent: Some(dec!(0.015)),
            with_interest: true,
            start_date: Some(date(2025, 1, 1)),
            mode: ScheduleMode::ByInstallmentCount,
            installment_amount: None,
            installment_count: Some(10),
        };
        let s = calculate_schedule(&req).unwrap().result;
        assert_eq!(s.total_interest, dec!(0.15));
        let interest: Decimal = s.installments.iter().map(|i| i.interest_payment).sum();
        assert_eq!(interest, dec!(0.15));
        assert!(s.installments.iter().all(|i| i.interest_payment >= Decimal::ZERO));
        assert_eq!(s.installments[9].outstanding_balance, Decimal::ZERO);
    }

    #[test]
    fn test_single_installment_warning() {
        let mut req = amount_request();
        req.installment_amount = Some(dec!(60000));
        let out = calculate_schedule(&req).unwrap();
        assert_eq!(out.result.installment_count, 1);
        assert_eq!(out.result.installments[0].installment_amount, dec!(50000.00));
        assert!(out.warnings.iter().any(|w| w.contains("single installment")));
    }

    #[test]
    fn test_inactive_fields_warn() {
        let mut req = count_request();
        req.installment_amount = Some(dec!(5));
        let out = calculate_schedule(&req).unwrap();
        assert!(out
            .warnings
            .iter()
            .any(|w| w.contains("installment_amount ignored")));
    }

    #[test]
    fn test_build_schedule_is_deterministic() {
        let loan = validate_request(&count_request()).unwrap();
        assert_eq!(build_schedule(&loan), build_schedule(&loan));
    }

    #[test]
    fn test_outstanding_before() {
        let s = calculate_schedule(&count_request()).unwrap().result;
        assert_eq!(s.outstanding_before(1), Some(dec!(100000)));
        assert_eq!(s.outstanding_before(2), Some(dec!(91666.67)));
        assert_eq!(s.outstanding_before(0), None);
        assert_eq!(s.outstanding_before(12), Some(s.installments[10].outstanding_balance));
        assert_eq!(s.outstanding_before(13), None);
        assert!(s.installment(13).is_none());
    }

    #[test]
    fn test_sub_cent_amount_warns_and_stays_non_negative() {
        let mut req = amount_request();
        req.principal = Some(dec!(1000));
        req.installment_amount = Some(dec!(2.005));
        let out = calculate_schedule(&req).unwrap();
        let s = &out.result;

        assert_eq!(s.installment_count, 498);
        assert!(s.installments.iter().all(|r| r.installment_amount > Decimal::ZERO));
        assert!(s.installments.iter().all(|r| r.interest_payment == Decimal::ZERO));
        assert!(out.warnings.iter().any(|w| w.contains("rounded to 2.01")));
    }

    #[test]
    fn test_invalid_request_propagates() {
        let mut req = count_request();
        req.principal = Some(Decimal::ZERO);
        assert!(calculate_schedule(&req).is_err());
    }
}
