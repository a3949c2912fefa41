use napi::Result as NapiResult;
use napi_derive::napi;
use serde::Deserialize;

use loan_schedule_core::inspector::{self, DisplayOptions};
use loan_schedule_core::records::LoanRecord;
use loan_schedule_core::schedule::{self, LoanForm, LoanRequest, ScheduleResult};
use loan_schedule_core::FieldIssue;

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

// ---------------------------------------------------------------------------
// Schedule
// ---------------------------------------------------------------------------

#[napi]
pub fn calculate_schedule(input_json: String) -> NapiResult<String> {
    let input: LoanRequest = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = schedule::calculate_schedule(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

/// Every problem with the raw form text, one entry per field.
#[napi]
pub fn validate_loan_form(form_json: String) -> NapiResult<String> {
    let form: LoanForm = serde_json::from_str(&form_json).map_err(to_napi_error)?;
    let issues: Vec<FieldIssue> = form.issues().iter().map(FieldIssue::from).collect();
    serde_json::to_string(&issues).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Inspector
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct InspectInput {
    schedule: ScheduleResult,
    number: u32,
    #[serde(default)]
    display: DisplayOptions,
}

#[napi]
pub fn inspect_installment(input_json: String) -> NapiResult<String> {
    let input: InspectInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = inspector::inspect_installment(&input.schedule, input.number, &input.display)
        .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct RecordInput {
    loan_id: String,
    employee_id: String,
    schedule: ScheduleResult,
}

#[napi]
pub fn build_loan_record(input_json: String) -> NapiResult<String> {
    let input: RecordInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let record = LoanRecord::from_schedule(&input.loan_id, &input.employee_id, &input.schedule)
        .map_err(to_napi_error)?;
    serde_json::to_string(&record).map_err(to_napi_error)
}
