use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::request::{
    collect_validation_errors, validate_request, LoanRequest, ScheduleMode, ValidatedLoan,
};
use crate::error::LoanScheduleError;
use crate::types::Money;
use crate::LoanScheduleResult;

/// Raw loan form state. Every value field is the text the user typed; blank
/// text counts as absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoanForm {
    #[serde(default)]
    pub principal: Option<String>,
    #[serde(default)]
    pub annual_rate_percent: Option<String>,
    #[serde(default)]
    pub with_interest: bool,
    /// `YYYY-MM-DD`
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub mode: ScheduleMode,
    #[serde(default)]
    pub installment_amount: Option<String>,
    #[serde(default)]
    pub installment_count: Option<String>,
}

impl LoanForm {
    /// Convert the form text into a typed request.
    ///
    /// Only fields the current mode and interest flag actually use are
    /// parsed; the first unparseable one (in validation order) is returned.
    pub fn to_request(&self) -> LoanScheduleResult<LoanRequest> {
        let (request, mut parse_errors) = self.parse_lenient();
        if parse_errors.is_empty() {
            Ok(request)
        } else {
            Err(parse_errors.remove(0))
        }
    }

    /// Parse and validate in one step.
    pub fn validate(&self) -> LoanScheduleResult<ValidatedLoan> {
        match self.issues().into_iter().next() {
            Some(e) => Err(e),
            None => validate_request(&self.parse_lenient().0),
        }
    }

    /// Every problem with the form, one per field, in validation order.
    pub fn issues(&self) -> Vec<LoanScheduleError> {
        let (request, mut parse_errors) = self.parse_lenient();
        collect_validation_errors(&request)
            .into_iter()
            .map(|e| {
                // Text that failed to parse was replaced by a value that fails
                // validation on the same field; report the parse message.
                match parse_errors.iter().position(|p| p.field() == e.field()) {
                    Some(pos) => parse_errors.remove(pos),
                    None => e,
                }
            })
            .collect()
    }

    /// Best-effort request plus the parse failures of active fields.
    /// Unparseable text becomes a value that validation rejects for the same
    /// field.
    fn parse_lenient(&self) -> (LoanRequest, Vec<LoanScheduleError>) {
        let mut errors = Vec::new();

        let principal = match parse_decimal(self.principal.as_deref()) {
            Ok(p) => p,
            Err(text) => {
                errors.push(LoanScheduleError::InvalidAmount {
                    field: "principal".into(),
                    reason: format!("'{text}' is not a valid amount"),
                });
                None
            }
        };

        let annual_rate_percent = if self.with_interest {
            parse_decimal(self.annual_rate_percent.as_deref()).unwrap_or_else(|text| {
                errors.push(LoanScheduleError::InvalidRate {
                    field: "annual_rate_percent".into(),
                    reason: format!("'{text}' is not a valid interest rate"),
                });
                None
            })
        } else {
            parse_decimal(self.annual_rate_percent.as_deref()).unwrap_or(None)
        };

        let installment_amount = match self.mode {
            ScheduleMode::ByInstallmentAmount => parse_decimal(self.installment_amount.as_deref())
                .unwrap_or_else(|text| {
                    errors.push(LoanScheduleError::InvalidInstallment {
                        field: "installment_amount".into(),
                        reason: format!("'{text}' is not a valid installment amount"),
                    });
                    None
                }),
            ScheduleMode::ByInstallmentCount => {
                parse_decimal(self.installment_amount.as_deref()).unwrap_or(None)
            }
        };

        let installment_count = match self.mode {
            ScheduleMode::ByInstallmentCount => parse_count(self.installment_count.as_deref())
                .unwrap_or_else(|reason| {
                    errors.push(LoanScheduleError::InvalidCount {
                        field: "installment_count".into(),
                        reason,
                    });
                    None
                }),
            ScheduleMode::ByInstallmentAmount => {
                parse_count(self.installment_count.as_deref()).unwrap_or(None)
            }
        };

        let start_date = match non_blank(self.start_date.as_deref()) {
            None => None,
            Some(text) => match NaiveDate::parse_from_str(text, "%Y-%m-%d") {
                Ok(d) => Some(d),
                Err(_) => {
                    errors.push(LoanScheduleError::MissingField {
                        field: "start_date".into(),
                        reason: format!("'{text}' is not a date (expected YYYY-MM-DD)"),
                    });
                    None
                }
            },
        };

        let request = LoanRequest {
            principal,
            annual_rate_percent,
            with_interest: self.with_interest,
            start_date,
            mode: self.mode,
            installment_amount,
            installment_count,
        };
        (request, errors)
    }
}

fn non_blank(text: Option<&str>) -> Option<&str> {
    text.map(str::trim).filter(|t| !t.is_empty())
}

/// `Ok(None)` for blank input, `Err(text)` for text that is not a number.
/// Grouping commas are accepted.
fn parse_decimal(text: Option<&str>) -> Result<Option<Money>, String> {
    let Some(text) = non_blank(text) else {
        return Ok(None);
    };
    let cleaned: String = text.chars().filter(|c| *c != ',').collect();
    Decimal::from_str(&cleaned)
        .map(Some)
        .map_err(|_| text.to_string())
}

/// Non-positive counts map to `Some(0)` so validation reports them.
fn parse_count(text: Option<&str>) -> Result<Option<u32>, String> {
    let value = parse_decimal(text).map_err(|t| format!("'{t}' is not a number"))?;
    let Some(value) = value else {
        return Ok(None);
    };
    if !value.fract().is_zero() {
        return Err(format!("'{value}' is not a whole number of installments"));
    }
    if value <= Decimal::ZERO {
        return Ok(Some(0));
    }
    value
        .to_u32()
        .map(Some)
        .ok_or_else(|| format!("'{value}' installments is out of range"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use rust_decimal_macros::dec;

    fn count_form() -> LoanForm {
        LoanForm {
            principal: Some("100,000".into()),
            annual_rate_percent: Some("12".into()),
            with_interest: true,
            start_date: Some("2025-01-01".into()),
            mode: ScheduleMode::ByInstallmentCount,
            installment_amount: None,
            installment_count: Some(" 12 ".into()),
        }
    }

    #[test]
    fn test_form_parses_to_request() {
        let req = count_form().to_request().unwrap();
        assert_eq!(req.principal, Some(dec!(100000)));
        assert_eq!(req.annual_rate_percent, Some(dec!(12)));
        assert_eq!(req.installment_count, Some(12));
        assert_eq!(req.start_date, NaiveDate::from_ymd_opt(2025, 1, 1));
    }

    #[test]
    fn test_form_validates() {
        let loan = count_form().validate().unwrap();
        assert_eq!(loan.installment_amount(), dec!(9333.33));
    }

    #[test]
    fn test_non_numeric_principal_is_invalid_amount() {
        let mut form = count_form();
        form.principal = Some("ten thousand".into());
        let err = form.validate().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidAmount);
        assert!(err.reason().contains("ten thousand"));
    }

    #[test]
    fn test_blank_principal_is_invalid_amount() {
        let mut form = count_form();
        form.principal = Some("   ".into());
        assert_eq!(form.validate().unwrap_err().kind(), ErrorKind::InvalidAmount);
    }

    #[test]
    fn test_fractional_count_is_invalid_count() {
        let mut form = count_form();
        form.installment_count = Some("12.5".into());
        assert_eq!(form.validate().unwrap_err().kind(), ErrorKind::InvalidCount);
    }

    #[test]
    fn test_negative_count_is_invalid_count() {
        let mut form = count_form();
        form.installment_count = Some("-3".into());
        assert_eq!(form.validate().unwrap_err().kind(), ErrorKind::InvalidCount);
    }

    #[test]
    fn test_unparseable_date_is_missing_field() {
        let mut form = count_form();
        form.start_date = Some("01/01/2025".into());
        let err = form.validate().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingField);
        assert_eq!(err.field(), Some("start_date"));
    }

    #[test]
    fn test_inactive_garbage_is_ignored() {
        let mut form = count_form();
        form.installment_amount = Some("abc".into());
        assert!(form.issues().is_empty());

        form.with_interest = false;
        form.annual_rate_percent = Some("n/a".into());
        assert!(form.validate().is_ok());
    }

    #[test]
    fn test_issues_one_per_field_in_order() {
        let form = LoanForm {
            principal: Some("x".into()),
            annual_rate_percent: None,
            with_interest: true,
            start_date: Some("tomorrow".into()),
            mode: ScheduleMode::ByInstallmentAmount,
            installment_amount: Some("0".into()),
            installment_count: None,
        };
        let issues = form.issues();
        let fields: Vec<Option<&str>> = issues.iter().map(|e| e.field()).collect();
        assert_eq!(
            fields,
            vec![
                Some("principal"),
                Some("annual_rate_percent"),
                Some("installment_amount"),
                Some("start_date"),
            ]
        );
        assert!(issues[0].reason().contains("'x'"));
        assert!(issues[3].reason().contains("tomorrow"));
    }

    #[test]
    fn test_form_deserializes_with_defaults() {
        let form: LoanForm =
            serde_json::from_str(r#"{"principal":"5000","mode":"amount","installment_amount":"1000"}"#)
                .unwrap();
        assert!(!form.with_interest);
        assert_eq!(form.mode, ScheduleMode::ByInstallmentAmount);
        assert_eq!(form.start_date, None);
    }
}
