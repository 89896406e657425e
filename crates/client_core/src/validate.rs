//! Form drafts and field validation.
//!
//! Each draft mirrors one entry form. Setters follow two disciplines:
//! gated fields (phone, position) refuse input that could never become
//! valid and leave the draft untouched, while committed fields (email)
//! accept every keystroke and track an error alongside. `validate_all`
//! re-checks everything at submit time and either yields the wire
//! payload or the full error map, so an invalid form never reaches the
//! network.

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use shared::{
    domain::{PortalStatus, Stage, TaskStatus, YesNo},
    protocol::{NewAllowance, NewCandidate, NewDeduction, NewTaxBracket},
};
use uuid::Uuid;

pub const PHONE_ERROR: &str = "Please enter a valid 10-digit phone number";
pub const EMAIL_ERROR: &str = "Please enter a valid email address";
pub const POSITION_ERROR: &str = "Position should contain only letters";
pub const REQUIRED_ERROR: &str = "This field is required";
pub const AMOUNT_ERROR: &str = "Please enter a valid amount";
pub const DATE_ERROR: &str = "Please enter a valid date";
pub const INCOME_RANGE_ERROR: &str = "Max income must not be below min income";

/// Identity a draft carries before the server has assigned a real id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DraftId(pub Uuid);

impl DraftId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for DraftId {
    fn default() -> Self {
        Self::new()
    }
}

/// Field name to message map, ordered for stable display.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    entries: BTreeMap<&'static str, &'static str>,
}

impl ValidationErrors {
    pub fn set(&mut self, field: &'static str, message: Option<&'static str>) {
        match message {
            Some(message) => {
                self.entries.insert(field, message);
            }
            None => {
                self.entries.remove(field);
            }
        }
    }

    pub fn message(&self, field: &str) -> Option<&'static str> {
        self.entries.get(field).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &'static str)> + '_ {
        self.entries.iter().map(|(field, message)| (*field, *message))
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, message) in self.iter() {
            if !first {
                write!(f, "; ")?;
            }
            write!(f, "{field}: {message}")?;
            first = false;
        }
        Ok(())
    }
}

/// A phone number is exactly ten ASCII digits.
pub fn is_valid_phone(value: &str) -> bool {
    value.len() == 10 && value.chars().all(|c| c.is_ascii_digit())
}

/// Keystroke gate for phone fields: empty or digits only, any length.
pub fn accepts_phone_input(value: &str) -> bool {
    value.chars().all(|c| c.is_ascii_digit())
}

/// Shape check only: no whitespace, one `@` with a non-empty local part,
/// and a dot inside the domain with characters on both sides.
pub fn is_valid_email(value: &str) -> bool {
    if value.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    domain
        .char_indices()
        .any(|(i, c)| c == '.' && i > 0 && i + 1 < domain.len())
}

/// Letters and whitespace only, non-empty.
pub fn is_valid_position(value: &str) -> bool {
    !value.trim().is_empty()
        && value
            .chars()
            .all(|c| c.is_alphabetic() || c.is_whitespace())
}

/// Keystroke gate for position fields.
pub fn accepts_position_input(value: &str) -> bool {
    value
        .chars()
        .all(|c| c.is_alphabetic() || c.is_whitespace())
}

fn parse_amount(value: &str) -> Option<f64> {
    let parsed: f64 = value.trim().parse().ok()?;
    parsed.is_finite().then_some(parsed)
}

fn check_required(errors: &mut ValidationErrors, field: &'static str, value: &str) -> bool {
    if value.trim().is_empty() {
        errors.set(field, Some(REQUIRED_ERROR));
        false
    } else {
        true
    }
}

/// Onboarding candidate entry form.
#[derive(Debug, Clone)]
pub struct CandidateDraft {
    pub draft_id: DraftId,
    name: String,
    email: String,
    job_position: String,
    mobile: String,
    joining_date: String,
    pub stage: Stage,
    pub portal_status: PortalStatus,
    pub task_status: TaskStatus,
    errors: ValidationErrors,
}

impl Default for CandidateDraft {
    fn default() -> Self {
        Self::new()
    }
}

impl CandidateDraft {
    pub fn new() -> Self {
        Self {
            draft_id: DraftId::new(),
            name: String::new(),
            email: String::new(),
            job_position: String::new(),
            mobile: String::new(),
            joining_date: String::new(),
            stage: Stage::Test,
            portal_status: PortalStatus::Active,
            task_status: TaskStatus::Pending,
            errors: ValidationErrors::default(),
        }
    }

    pub fn set_name(&mut self, input: &str) {
        self.name = input.to_string();
        self.errors.set("name", None);
    }

    /// Commits every keystroke; the error surfaces while the value is
    /// malformed and clears as soon as it is not. Emptiness is a
    /// submit-time concern, so an empty value carries no error here.
    pub fn set_email(&mut self, input: &str) {
        self.email = input.to_string();
        let message = (!input.is_empty() && !is_valid_email(input)).then_some(EMAIL_ERROR);
        self.errors.set("email", message);
    }

    /// Returns whether the input was accepted. Rejected input leaves the
    /// stored value untouched.
    pub fn set_mobile(&mut self, input: &str) -> bool {
        if !accepts_phone_input(input) {
            return false;
        }
        self.mobile = input.to_string();
        let message = (!input.is_empty() && !is_valid_phone(input)).then_some(PHONE_ERROR);
        self.errors.set("mobile", message);
        true
    }

    pub fn set_job_position(&mut self, input: &str) -> bool {
        if !accepts_position_input(input) {
            return false;
        }
        self.job_position = input.to_string();
        let message = (!input.is_empty() && !is_valid_position(input)).then_some(POSITION_ERROR);
        self.errors.set("jobPosition", message);
        true
    }

    pub fn set_joining_date(&mut self, input: &str) {
        self.joining_date = input.to_string();
        self.errors.set("joiningDate", None);
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn job_position(&self) -> &str {
        &self.job_position
    }

    pub fn mobile(&self) -> &str {
        &self.mobile
    }

    pub fn joining_date(&self) -> &str {
        &self.joining_date
    }

    /// Live per-field errors accumulated by the setters.
    pub fn errors(&self) -> &ValidationErrors {
        &self.errors
    }

    /// Re-validates every field from scratch, independent of which setters
    /// ran, and produces the create payload only when all pass.
    pub fn validate_all(&self) -> Result<NewCandidate, ValidationErrors> {
        let mut errors = ValidationErrors::default();

        check_required(&mut errors, "name", &self.name);
        if !is_valid_email(&self.email) {
            errors.set("email", Some(EMAIL_ERROR));
        }
        if !is_valid_position(&self.job_position) {
            errors.set("jobPosition", Some(POSITION_ERROR));
        }
        if !is_valid_phone(&self.mobile) {
            errors.set("mobile", Some(PHONE_ERROR));
        }
        let joining_date = match NaiveDate::parse_from_str(self.joining_date.trim(), "%Y-%m-%d") {
            Ok(date) => Some(date),
            Err(_) => {
                errors.set("joiningDate", Some(DATE_ERROR));
                None
            }
        };

        if !errors.is_empty() {
            return Err(errors);
        }
        let Some(joining_date) = joining_date else {
            return Err(errors);
        };

        Ok(NewCandidate {
            name: self.name.trim().to_string(),
            email: self.email.clone(),
            job_position: self.job_position.trim().to_string(),
            mobile: self.mobile.clone(),
            joining_date,
            stage: self.stage,
            portal_status: self.portal_status,
            task_status: self.task_status,
        })
    }
}

/// Allowance entry form; amounts stay as typed text until submit.
#[derive(Debug, Clone)]
pub struct AllowanceDraft {
    pub draft_id: DraftId,
    pub code: String,
    pub name: String,
    pub amount: String,
    pub one_time: YesNo,
    pub taxable: YesNo,
    pub fixed: bool,
}

impl Default for AllowanceDraft {
    fn default() -> Self {
        Self::new()
    }
}

impl AllowanceDraft {
    pub fn new() -> Self {
        Self {
            draft_id: DraftId::new(),
            code: String::new(),
            name: String::new(),
            amount: String::new(),
            one_time: YesNo::No,
            taxable: YesNo::Yes,
            fixed: true,
        }
    }

    pub fn validate_all(&self) -> Result<NewAllowance, ValidationErrors> {
        let mut errors = ValidationErrors::default();

        check_required(&mut errors, "code", &self.code);
        check_required(&mut errors, "name", &self.name);
        let amount = if check_required(&mut errors, "amount", &self.amount) {
            match parse_amount(&self.amount) {
                Some(amount) => Some(amount),
                None => {
                    errors.set("amount", Some(AMOUNT_ERROR));
                    None
                }
            }
        } else {
            None
        };

        match amount {
            Some(amount) if errors.is_empty() => Ok(NewAllowance {
                code: self.code.trim().to_string(),
                name: self.name.trim().to_string(),
                amount,
                one_time: self.one_time,
                taxable: self.taxable,
                fixed: self.fixed,
            }),
            _ => Err(errors),
        }
    }
}

pub const DEFAULT_EMPLOYER_RATE: &str = "6.25% of Gross Pay";
pub const DEFAULT_EMPLOYEE_RATE: &str = "7.75% of Gross Pay";

/// Deduction entry form. The title doubles as code and display name, and
/// filling the one-time date marks the deduction as one-time.
#[derive(Debug, Clone)]
pub struct DeductionDraft {
    pub draft_id: DraftId,
    pub title: String,
    pub amount: String,
    pub one_time_date: String,
    pub taxable: YesNo,
    pub fixed: bool,
    pub specific_employees: Vec<String>,
    pub employer_rate: String,
    pub employee_rate: String,
}

impl Default for DeductionDraft {
    fn default() -> Self {
        Self::new()
    }
}

impl DeductionDraft {
    pub fn new() -> Self {
        Self {
            draft_id: DraftId::new(),
            title: String::new(),
            amount: String::new(),
            one_time_date: String::new(),
            taxable: YesNo::No,
            fixed: true,
            specific_employees: Vec::new(),
            employer_rate: DEFAULT_EMPLOYER_RATE.to_string(),
            employee_rate: DEFAULT_EMPLOYEE_RATE.to_string(),
        }
    }

    pub fn toggle_employee(&mut self, name: &str) {
        if let Some(index) = self.specific_employees.iter().position(|n| n == name) {
            self.specific_employees.remove(index);
        } else {
            self.specific_employees.push(name.to_string());
        }
    }

    pub fn validate_all(&self) -> Result<NewDeduction, ValidationErrors> {
        let mut errors = ValidationErrors::default();

        check_required(&mut errors, "title", &self.title);
        let amount = if check_required(&mut errors, "amount", &self.amount) {
            match parse_amount(&self.amount) {
                Some(amount) => Some(amount),
                None => {
                    errors.set("amount", Some(AMOUNT_ERROR));
                    None
                }
            }
        } else {
            None
        };

        match amount {
            Some(amount) if errors.is_empty() => {
                let title = self.title.trim().to_string();
                let one_time = YesNo::from_bool(!self.one_time_date.trim().is_empty());
                Ok(NewDeduction {
                    code: title.clone(),
                    name: title,
                    amount,
                    taxable: self.taxable,
                    fixed: self.fixed,
                    one_time_deduction: one_time,
                    specific_employees: self.specific_employees.clone(),
                    employer_rate: self.employer_rate.clone(),
                    employee_rate: self.employee_rate.clone(),
                })
            }
            _ => Err(errors),
        }
    }
}

/// Federal tax bracket entry form.
#[derive(Debug, Clone)]
pub struct TaxBracketDraft {
    pub draft_id: DraftId,
    pub tax_rate: String,
    pub min_income: String,
    pub max_income: String,
    pub description: String,
}

impl Default for TaxBracketDraft {
    fn default() -> Self {
        Self::new()
    }
}

impl TaxBracketDraft {
    pub fn new() -> Self {
        Self {
            draft_id: DraftId::new(),
            tax_rate: String::new(),
            min_income: String::new(),
            max_income: String::new(),
            description: String::new(),
        }
    }

    pub fn validate_all(&self) -> Result<NewTaxBracket, ValidationErrors> {
        let mut errors = ValidationErrors::default();

        check_required(&mut errors, "taxRate", &self.tax_rate);
        let min_income = if check_required(&mut errors, "minIncome", &self.min_income) {
            match parse_amount(&self.min_income) {
                Some(value) => Some(value),
                None => {
                    errors.set("minIncome", Some(AMOUNT_ERROR));
                    None
                }
            }
        } else {
            None
        };
        let max_income = if check_required(&mut errors, "maxIncome", &self.max_income) {
            match parse_amount(&self.max_income) {
                Some(value) => Some(value),
                None => {
                    errors.set("maxIncome", Some(AMOUNT_ERROR));
                    None
                }
            }
        } else {
            None
        };

        if let (Some(min), Some(max)) = (min_income, max_income) {
            if max < min {
                errors.set("maxIncome", Some(INCOME_RANGE_ERROR));
            }
        }

        match (min_income, max_income) {
            (Some(min_income), Some(max_income)) if errors.is_empty() => Ok(NewTaxBracket {
                tax_rate: self.tax_rate.trim().to_string(),
                min_income,
                max_income,
                description: {
                    let description = self.description.trim();
                    (!description.is_empty()).then(|| description.to_string())
                },
            }),
            _ => Err(errors),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phone_accepts_exactly_ten_digits() {
        assert!(is_valid_phone("1234567890"));
        assert!(!is_valid_phone("12345"));
        assert!(!is_valid_phone("12345678901"));
        assert!(!is_valid_phone("12a4567890"));
        assert!(!is_valid_phone(""));
    }

    #[test]
    fn phone_gate_rejects_non_digit_keystrokes() {
        assert!(accepts_phone_input(""));
        assert!(accepts_phone_input("12345"));
        assert!(!accepts_phone_input("12a"));
        assert!(!accepts_phone_input("123-456"));
    }

    #[test]
    fn email_shape_checks() {
        assert!(is_valid_email("a@b.com"));
        assert!(is_valid_email("first.last@sub.domain.org"));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("a@.com"));
        assert!(!is_valid_email("a@b."));
        assert!(!is_valid_email("@b.com"));
        assert!(!is_valid_email("a b@c.com"));
        assert!(!is_valid_email("a@b@c.com"));
    }

    #[test]
    fn position_allows_letters_and_spaces_only() {
        assert!(is_valid_position("Software Engineer"));
        assert!(!is_valid_position("Engineer 2"));
        assert!(!is_valid_position(""));
        assert!(!is_valid_position("   "));
        assert!(accepts_position_input("Software Eng"));
        assert!(!accepts_position_input("Eng2"));
    }

    #[test]
    fn gated_setter_leaves_draft_untouched_on_rejection() {
        let mut draft = CandidateDraft::new();
        assert!(draft.set_mobile("98765"));
        assert!(!draft.set_mobile("98765x"));
        assert_eq!(draft.mobile(), "98765");
        assert_eq!(draft.errors().message("mobile"), Some(PHONE_ERROR));

        assert!(draft.set_mobile("9876543210"));
        assert!(draft.errors().message("mobile").is_none());
    }

    #[test]
    fn email_setter_commits_but_flags_malformed_values() {
        let mut draft = CandidateDraft::new();
        draft.set_email("");
        assert!(draft.errors().message("email").is_none());

        draft.set_email("john@");
        assert_eq!(draft.email(), "john@");
        assert_eq!(draft.errors().message("email"), Some(EMAIL_ERROR));

        draft.set_email("john@corp.com");
        assert_eq!(draft.email(), "john@corp.com");
        assert!(draft.errors().message("email").is_none());
    }

    #[test]
    fn candidate_submit_revalidates_everything() {
        let draft = CandidateDraft::new();
        let errors = draft.validate_all().expect_err("empty form");
        assert!(errors.message("name").is_some());
        assert!(errors.message("email").is_some());
        assert!(errors.message("mobile").is_some());
        assert!(errors.message("jobPosition").is_some());
        assert!(errors.message("joiningDate").is_some());

        let mut draft = CandidateDraft::new();
        draft.set_name("Alice Brown");
        draft.set_email("alice@corp.com");
        assert!(draft.set_job_position("Designer"));
        assert!(draft.set_mobile("9876543210"));
        draft.set_joining_date("2025-06-15");

        let payload = draft.validate_all().expect("valid form");
        assert_eq!(payload.name, "Alice Brown");
        assert_eq!(payload.stage, Stage::Test);
        assert_eq!(
            payload.joining_date,
            NaiveDate::from_ymd_opt(2025, 6, 15).expect("date")
        );
    }

    #[test]
    fn allowance_submit_requires_numeric_amount() {
        let mut draft = AllowanceDraft::new();
        draft.code = "HRA".into();
        draft.name = "Housing".into();
        draft.amount = "abc".into();
        let errors = draft.validate_all().expect_err("non-numeric amount");
        assert_eq!(errors.message("amount"), Some(AMOUNT_ERROR));

        draft.amount = "2500".into();
        let payload = draft.validate_all().expect("valid");
        assert_eq!(payload.amount, 2500.0);
    }

    #[test]
    fn deduction_title_feeds_code_and_name() {
        let mut draft = DeductionDraft::new();
        draft.title = "  Retirement  ".into();
        draft.amount = "350".into();
        draft.one_time_date = "2025-07-01".into();
        draft.toggle_employee("John Doe");
        draft.toggle_employee("Jane Smith");
        draft.toggle_employee("John Doe");

        let payload = draft.validate_all().expect("valid");
        assert_eq!(payload.code, "Retirement");
        assert_eq!(payload.name, "Retirement");
        assert_eq!(payload.one_time_deduction, YesNo::Yes);
        assert_eq!(payload.specific_employees, ["Jane Smith"]);
        assert_eq!(payload.employer_rate, DEFAULT_EMPLOYER_RATE);
    }

    #[test]
    fn empty_deduction_title_blocks_submit() {
        let mut draft = DeductionDraft::new();
        draft.amount = "350".into();
        let errors = draft.validate_all().expect_err("missing title");
        assert_eq!(errors.message("title"), Some(REQUIRED_ERROR));
    }

    #[test]
    fn tax_bracket_income_bounds_must_be_ordered() {
        let mut draft = TaxBracketDraft::new();
        draft.tax_rate = "15.00%".into();
        draft.min_income = "3300".into();
        draft.max_income = "2300".into();
        let errors = draft.validate_all().expect_err("inverted range");
        assert_eq!(errors.message("maxIncome"), Some(INCOME_RANGE_ERROR));

        draft.max_income = "4300".into();
        draft.description = "  ".into();
        let payload = draft.validate_all().expect("valid");
        assert_eq!(payload.min_income, 3300.0);
        assert!(payload.description.is_none());
    }
}
