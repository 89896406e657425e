use chrono::NaiveDate;
use shared::{
    domain::{PortalStatus, TaskStatus},
    protocol::{NewCandidate, NewDeduction, NewTaxBracket},
};

use super::*;

fn allowance(code: &str, name: &str, amount: f64) -> NewAllowance {
    NewAllowance {
        code: code.into(),
        name: name.into(),
        amount,
        one_time: YesNo::No,
        taxable: YesNo::Yes,
        fixed: true,
    }
}

fn candidate(name: &str, email: &str, stage: Stage) -> NewCandidate {
    NewCandidate {
        name: name.into(),
        email: email.into(),
        job_position: "Designer".into(),
        mobile: "9876543210".into(),
        joining_date: NaiveDate::from_ymd_opt(2025, 6, 15).expect("date"),
        stage,
        portal_status: PortalStatus::Active,
        task_status: TaskStatus::Pending,
    }
}

#[tokio::test]
async fn allowance_round_trip_preserves_fields() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    let id = storage
        .insert_allowance(&allowance("HRA", "Housing", 2500.0))
        .await
        .expect("insert");

    let fetched = storage
        .get_allowance(id)
        .await
        .expect("get")
        .expect("present");
    assert_eq!(fetched.code, "HRA");
    assert_eq!(fetched.name, "Housing");
    assert_eq!(fetched.amount, 2500.0);
    assert_eq!(fetched.one_time, YesNo::No);
    assert_eq!(fetched.taxable, YesNo::Yes);
    assert!(fetched.fixed);
}

#[tokio::test]
async fn allowances_list_in_insertion_order() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    for (code, name) in [("A", "first"), ("B", "second"), ("C", "third")] {
        storage
            .insert_allowance(&allowance(code, name, 100.0))
            .await
            .expect("insert");
    }

    let names: Vec<String> = storage
        .list_allowances()
        .await
        .expect("list")
        .into_iter()
        .map(|a| a.name)
        .collect();
    assert_eq!(names, ["first", "second", "third"]);
}

#[tokio::test]
async fn duplicate_allowance_code_reports_unique_violation() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    storage
        .insert_allowance(&allowance("HRA", "Housing", 2500.0))
        .await
        .expect("insert");

    let err = storage
        .insert_allowance(&allowance("HRA", "Housing again", 900.0))
        .await
        .expect_err("duplicate code");
    assert!(is_unique_violation(&err));
}

#[tokio::test]
async fn update_replaces_fields_and_delete_removes_row() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    let id = storage
        .insert_allowance(&allowance("TA", "Travel", 700.0))
        .await
        .expect("insert");

    let mut edited = allowance("TA", "Travel revised", 1200.0);
    edited.taxable = YesNo::No;
    assert!(storage.update_allowance(id, &edited).await.expect("update"));

    let fetched = storage
        .get_allowance(id)
        .await
        .expect("get")
        .expect("present");
    assert_eq!(fetched.name, "Travel revised");
    assert_eq!(fetched.taxable, YesNo::No);

    assert!(storage.delete_allowance(id).await.expect("delete"));
    assert!(!storage.delete_allowance(id).await.expect("second delete"));
    assert!(storage.get_allowance(id).await.expect("get").is_none());
}

#[tokio::test]
async fn deduction_employee_list_round_trips_through_json() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    let new = NewDeduction {
        code: "401K".into(),
        name: "Retirement".into(),
        amount: 350.0,
        taxable: YesNo::No,
        fixed: false,
        one_time_deduction: YesNo::No,
        specific_employees: vec!["John Doe".into(), "Jane Smith".into()],
        employer_rate: "6.25% of Gross Pay".into(),
        employee_rate: "7.75% of Gross Pay".into(),
    };
    let id = storage.insert_deduction(&new).await.expect("insert");

    let fetched = storage
        .get_deduction(id)
        .await
        .expect("get")
        .expect("present");
    assert_eq!(fetched.specific_employees, ["John Doe", "Jane Smith"]);
    assert_eq!(fetched.employer_rate, "6.25% of Gross Pay");
}

#[tokio::test]
async fn tax_bracket_description_may_be_absent() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    let id = storage
        .insert_tax_bracket(&NewTaxBracket {
            tax_rate: "15.00%".into(),
            min_income: 2300.0,
            max_income: 3300.0,
            description: None,
        })
        .await
        .expect("insert");

    let fetched = storage
        .get_tax_bracket(id)
        .await
        .expect("get")
        .expect("present");
    assert_eq!(fetched.tax_rate, "15.00%");
    assert!(fetched.description.is_none());
}

#[tokio::test]
async fn candidates_filter_by_stage() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    storage
        .insert_candidate(&candidate("Alice Brown", "alice@corp.com", Stage::Test))
        .await
        .expect("insert");
    storage
        .insert_candidate(&candidate("Mark Johnson", "mark@corp.com", Stage::Offer))
        .await
        .expect("insert");

    let offers = storage
        .list_candidates_by_stage(Stage::Offer)
        .await
        .expect("list");
    assert_eq!(offers.len(), 1);
    assert_eq!(offers[0].name, "Mark Johnson");
    assert_eq!(offers[0].joining_date, NaiveDate::from_ymd_opt(2025, 6, 15).expect("date"));
}

#[tokio::test]
async fn duplicate_candidate_email_reports_unique_violation() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    storage
        .insert_candidate(&candidate("Alice Brown", "alice@corp.com", Stage::Test))
        .await
        .expect("insert");

    let err = storage
        .insert_candidate(&candidate("Alice B.", "alice@corp.com", Stage::Interview))
        .await
        .expect_err("duplicate email");
    assert!(is_unique_violation(&err));
}
