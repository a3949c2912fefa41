use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt::Write;
use std::time::Instant;

use crate::currency::format_amount;
use crate::error::LoanScheduleError;
use crate::schedule::{Installment, ScheduleResult};
use crate::types::*;
use crate::LoanScheduleResult;

/// Presentation settings for installment breakdowns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayOptions {
    /// Prefix for amounts, e.g. "Rs " or "$"
    pub currency_symbol: Option<String>,
    pub thousands_separator: Option<char>,
    /// chrono strftime pattern
    pub date_format: String,
}

impl Default for DisplayOptions {
    fn default() -> Self {
        DisplayOptions {
            currency_symbol: None,
            thousands_separator: Some(','),
            date_format: "%d %b %Y".into(),
        }
    }
}

impl DisplayOptions {
    pub fn money(&self, amount: Money) -> String {
        let body = format_amount(amount, self.thousands_separator);
        match &self.currency_symbol {
            Some(symbol) => format!("{symbol}{body}"),
            None => body,
        }
    }

    /// Falls back to ISO format when the pattern is not a valid strftime
    /// pattern.
    pub fn date(&self, date: NaiveDate) -> String {
        let mut out = String::new();
        match write!(out, "{}", date.format(&self.date_format)) {
            Ok(()) => out,
            Err(_) => date.format("%Y-%m-%d").to_string(),
        }
    }
}

/// Display-ready view of a single installment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstallmentBreakdown {
    pub number: u32,
    pub position: String,
    pub due_date: String,
    pub outstanding_before: String,
    pub capital_repayment: String,
    pub interest_payment: String,
    pub installment_amount: String,
    pub outstanding_after: String,
    pub is_final: bool,
}

/// Format one row of a schedule for display.
pub fn inspect_installment(
    schedule: &ScheduleResult,
    number: u32,
    options: &DisplayOptions,
) -> LoanScheduleResult<ComputationOutput<InstallmentBreakdown>> {
    let start = Instant::now();

    let (row, before) = match (
        schedule.installment(number),
        schedule.outstanding_before(number),
    ) {
        (Some(row), Some(before)) => (row, before),
        _ => {
            return Err(LoanScheduleError::InvalidCount {
                field: "number".into(),
                reason: format!(
                    "Installment {number} does not exist; schedule has {} installments",
                    schedule.installments.len()
                ),
            })
        }
    };

    let breakdown = breakdown_of(row, before, schedule.installment_count, options);

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Installment breakdown",
        &serde_json::json!({
            "number": number,
            "installment_count": schedule.installment_count,
            "date_format": options.date_format,
        }),
        Vec::new(),
        elapsed,
        breakdown,
    ))
}

/// Every row of the schedule, formatted.
pub fn breakdown_rows(schedule: &ScheduleResult, options: &DisplayOptions) -> Vec<InstallmentBreakdown> {
    let mut before = schedule.principal;
    schedule
        .installments
        .iter()
        .map(|row| {
            let b = breakdown_of(row, before, schedule.installment_count, options);
            before = row.outstanding_balance;
            b
        })
        .collect()
}

fn breakdown_of(
    row: &Installment,
    outstanding_before: Money,
    installment_count: u32,
    options: &DisplayOptions,
) -> InstallmentBreakdown {
    InstallmentBreakdown {
        number: row.number,
        position: format!("{} of {}", row.number, installment_count),
        due_date: options.date(row.due_date),
        outstanding_before: options.money(outstanding_before),
        capital_repayment: options.money(row.capital_repayment),
        interest_payment: options.money(row.interest_payment),
        installment_amount: options.money(row.installment_amount),
        outstanding_after: options.money(row.outstanding_balance),
        is_final: row.number == installment_count,
    }
}
