use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::{
    AllowanceId, CandidateId, DeductionId, EmployeeId, PortalStatus, Stage, TaskStatus,
    TaxBracketId, YesNo,
};

// Wire payloads keep the camelCase field spelling of the record store API.

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Allowance {
    pub id: AllowanceId,
    pub code: String,
    pub name: String,
    pub amount: f64,
    pub one_time: YesNo,
    pub taxable: YesNo,
    pub fixed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAllowance {
    pub code: String,
    pub name: String,
    pub amount: f64,
    pub one_time: YesNo,
    pub taxable: YesNo,
    pub fixed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deduction {
    pub id: DeductionId,
    pub code: String,
    pub name: String,
    pub amount: f64,
    pub taxable: YesNo,
    pub fixed: bool,
    pub one_time_deduction: YesNo,
    pub specific_employees: Vec<String>,
    pub employer_rate: String,
    pub employee_rate: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDeduction {
    pub code: String,
    pub name: String,
    pub amount: f64,
    pub taxable: YesNo,
    pub fixed: bool,
    pub one_time_deduction: YesNo,
    #[serde(default)]
    pub specific_employees: Vec<String>,
    pub employer_rate: String,
    pub employee_rate: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxBracket {
    pub id: TaxBracketId,
    pub tax_rate: String,
    pub min_income: f64,
    pub max_income: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTaxBracket {
    pub tax_rate: String,
    pub min_income: f64,
    pub max_income: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub id: CandidateId,
    pub name: String,
    pub email: String,
    pub job_position: String,
    pub mobile: String,
    pub joining_date: NaiveDate,
    pub stage: Stage,
    pub portal_status: PortalStatus,
    pub task_status: TaskStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCandidate {
    pub name: String,
    pub email: String,
    pub job_position: String,
    pub mobile: String,
    pub joining_date: NaiveDate,
    pub stage: Stage,
    pub portal_status: PortalStatus,
    pub task_status: TaskStatus,
}

/// Directory entry offered by the deduction form's employee picker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Employee {
    pub id: EmployeeId,
    pub name: String,
    pub role: String,
}

/// Body of `POST /api/onboarding/send-email`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OnboardingMailRequest {
    pub email: String,
    pub name: String,
    pub job_position: String,
    pub joining_date: NaiveDate,
}
