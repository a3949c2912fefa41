use chrono::NaiveDate;
use clap::{Args, ValueEnum};
use rust_decimal::Decimal;
use serde_json::Value;

use loan_schedule_core::inspector::{self, DisplayOptions};
use loan_schedule_core::records::LoanRecord;
use loan_schedule_core::schedule::{self, LoanForm, LoanRequest, ScheduleMode};
use loan_schedule_core::FieldIssue;

use crate::input;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ModeArg {
    /// Fixed installment amount; the count is derived
    Amount,
    /// Fixed number of installments; the amount is derived
    Count,
}

impl From<ModeArg> for ScheduleMode {
    fn from(m: ModeArg) -> Self {
        match m {
            ModeArg::Amount => ScheduleMode::ByInstallmentAmount,
            ModeArg::Count => ScheduleMode::ByInstallmentCount,
        }
    }
}

/// Loan parameters shared by every schedule-based command
#[derive(Args)]
pub struct LoanArgs {
    /// Path to JSON loan request (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Loan amount disbursed
    #[arg(long)]
    pub principal: Option<Decimal>,

    /// Annual flat interest rate in percent (implies --with-interest)
    #[arg(long)]
    pub rate: Option<Decimal>,

    /// Charge flat interest on the principal
    #[arg(long)]
    pub with_interest: bool,

    /// Disbursement date (YYYY-MM-DD); first installment falls a month later
    #[arg(long)]
    pub start_date: Option<NaiveDate>,

    /// Which side of the plan is fixed (default: amount if --installment-amount is given)
    #[arg(long)]
    pub mode: Option<ModeArg>,

    /// Fixed installment amount
    #[arg(long)]
    pub installment_amount: Option<Decimal>,

    /// Fixed number of monthly installments
    #[arg(long)]
    pub installment_count: Option<u32>,
}

impl LoanArgs {
    fn to_request(&self) -> Result<LoanRequest, Box<dyn std::error::Error>> {
        match input::load::<LoanRequest>(self.input.as_deref())? {
            Some(request) => Ok(request),
            None => self.request_from_flags(),
        }
    }

    fn request_from_flags(&self) -> Result<LoanRequest, Box<dyn std::error::Error>> {
        let principal = self
            .principal
            .ok_or("--principal is required (or provide --input)")?;

        let mode = match self.mode {
            Some(m) => m.into(),
            None if self.installment_amount.is_some() => ScheduleMode::ByInstallmentAmount,
            None => ScheduleMode::ByInstallmentCount,
        };

        Ok(LoanRequest {
            principal: Some(principal),
            annual_rate_percent: self.rate,
            with_interest: self.with_interest || self.rate.is_some(),
            start_date: self.start_date,
            mode,
            installment_amount: self.installment_amount,
            installment_count: self.installment_count,
        })
    }
}

/// Arguments for schedule calculation
#[derive(Args)]
pub struct ScheduleArgs {
    #[command(flatten)]
    pub loan: LoanArgs,
}

pub fn run_schedule(args: ScheduleArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let request = args.loan.to_request()?;
    let result = schedule::calculate_schedule(&request)?;
    Ok(serde_json::to_value(result)?)
}

/// Arguments for form validation
#[derive(Args)]
pub struct ValidateArgs {
    /// Path to JSON loan form (all values as text)
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_validate(args: ValidateArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let form: LoanForm = input::load(args.input.as_deref())?
        .ok_or("--input <form.json> or stdin required for validate")?;

    let issues: Vec<FieldIssue> = form.issues().iter().map(FieldIssue::from).collect();
    Ok(serde_json::json!({
        "valid": issues.is_empty(),
        "issues": issues,
    }))
}

/// Arguments for a single installment breakdown
#[derive(Args)]
pub struct InspectArgs {
    #[command(flatten)]
    pub loan: LoanArgs,

    /// Installment number (1-based)
    #[arg(long)]
    pub number: u32,

    /// Prefix for amounts, e.g. "$"
    #[arg(long)]
    pub currency_symbol: Option<String>,

    /// Date pattern (strftime)
    #[arg(long, default_value = "%d %b %Y")]
    pub date_format: String,

    /// Print amounts without thousands separators
    #[arg(long)]
    pub no_grouping: bool,
}

pub fn run_inspect(args: InspectArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let request = args.loan.to_request()?;
    let schedule = schedule::calculate_schedule(&request)?.result;

    let options = DisplayOptions {
        currency_symbol: args.currency_symbol,
        thousands_separator: if args.no_grouping { None } else { Some(',') },
        date_format: args.date_format,
    };
    let result = inspector::inspect_installment(&schedule, args.number, &options)?;
    Ok(serde_json::to_value(result)?)
}

/// Arguments for building a loan record
#[derive(Args)]
pub struct RecordArgs {
    #[command(flatten)]
    pub loan: LoanArgs,

    /// Identifier assigned to the loan
    #[arg(long)]
    pub loan_id: String,

    /// Employee receiving the loan
    #[arg(long)]
    pub employee_id: String,
}

pub fn run_record(args: RecordArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let request = args.loan.to_request()?;
    let schedule = schedule::calculate_schedule(&request)?.result;
    let record = LoanRecord::from_schedule(&args.loan_id, &args.employee_id, &schedule)?;
    Ok(serde_json::to_value(record)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn flags() -> LoanArgs {
        LoanArgs {
            input: None,
            principal: Some(dec!(50000)),
            rate: None,
            with_interest: false,
            start_date: NaiveDate::from_ymd_opt(2025, 3, 15),
            mode: None,
            installment_amount: Some(dec!(7000)),
            installment_count: None,
        }
    }

    #[test]
    fn test_mode_inferred_from_amount_flag() {
        let req = flags().request_from_flags().unwrap();
        assert_eq!(req.mode, ScheduleMode::ByInstallmentAmount);
        assert!(!req.with_interest);
    }

    #[test]
    fn test_rate_flag_implies_interest() {
        let mut args = flags();
        args.rate = Some(dec!(12));
        args.mode = Some(ModeArg::Count);
        let req = args.request_from_flags().unwrap();
        assert!(req.with_interest);
        assert_eq!(req.mode, ScheduleMode::ByInstallmentCount);
    }
}
