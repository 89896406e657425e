use anyhow::{anyhow, Context, Result};
use chrono::NaiveDate;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow},
    Pool, Row, Sqlite,
};
use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};

use shared::{
    domain::{
        AllowanceId, CandidateId, DeductionId, PortalStatus, Stage, TaskStatus, TaxBracketId,
        YesNo,
    },
    protocol::{
        Allowance, Candidate, Deduction, NewAllowance, NewCandidate, NewDeduction, NewTaxBracket,
        TaxBracket,
    },
};

#[derive(Clone)]
pub struct Storage {
    pool: Pool<Sqlite>,
}

/// True when `error` wraps a sqlx unique-constraint violation, so callers
/// can map duplicate creates to a conflict instead of an internal error.
pub fn is_unique_violation(error: &anyhow::Error) -> bool {
    match error.downcast_ref::<sqlx::Error>() {
        Some(sqlx::Error::Database(db)) => db.is_unique_violation(),
        _ => false,
    }
}

impl Storage {
    pub async fn new(database_url: &str) -> Result<Self> {
        ensure_sqlite_parent_dir_exists(database_url)?;

        let connect_options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(connect_options)
            .await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    pub async fn health_check(&self) -> Result<()> {
        let _: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("sqlite ping failed")?;
        Ok(())
    }

    // ---- allowances ----

    pub async fn list_allowances(&self) -> Result<Vec<Allowance>> {
        let rows = sqlx::query(
            "SELECT id, code, name, amount, one_time, taxable, fixed
             FROM allowances ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(allowance_from_row).collect()
    }

    pub async fn get_allowance(&self, id: AllowanceId) -> Result<Option<Allowance>> {
        let row = sqlx::query(
            "SELECT id, code, name, amount, one_time, taxable, fixed
             FROM allowances WHERE id = ?",
        )
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(allowance_from_row).transpose()
    }

    pub async fn insert_allowance(&self, new: &NewAllowance) -> Result<AllowanceId> {
        let rec = sqlx::query(
            "INSERT INTO allowances (code, name, amount, one_time, taxable, fixed)
             VALUES (?, ?, ?, ?, ?, ?) RETURNING id",
        )
        .bind(&new.code)
        .bind(&new.name)
        .bind(new.amount)
        .bind(new.one_time.as_str())
        .bind(new.taxable.as_str())
        .bind(new.fixed)
        .fetch_one(&self.pool)
        .await?;
        Ok(AllowanceId(rec.get::<i64, _>(0)))
    }

    pub async fn update_allowance(&self, id: AllowanceId, new: &NewAllowance) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE allowances
             SET code = ?, name = ?, amount = ?, one_time = ?, taxable = ?, fixed = ?
             WHERE id = ?",
        )
        .bind(&new.code)
        .bind(&new.name)
        .bind(new.amount)
        .bind(new.one_time.as_str())
        .bind(new.taxable.as_str())
        .bind(new.fixed)
        .bind(id.0)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn delete_allowance(&self, id: AllowanceId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM allowances WHERE id = ?")
            .bind(id.0)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // ---- deductions ----

    pub async fn list_deductions(&self) -> Result<Vec<Deduction>> {
        let rows = sqlx::query(
            "SELECT id, code, name, amount, taxable, fixed, one_time_deduction,
                    specific_employees, employer_rate, employee_rate
             FROM deductions ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(deduction_from_row).collect()
    }

    pub async fn get_deduction(&self, id: DeductionId) -> Result<Option<Deduction>> {
        let row = sqlx::query(
            "SELECT id, code, name, amount, taxable, fixed, one_time_deduction,
                    specific_employees, employer_rate, employee_rate
             FROM deductions WHERE id = ?",
        )
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(deduction_from_row).transpose()
    }

    pub async fn insert_deduction(&self, new: &NewDeduction) -> Result<DeductionId> {
        let employees = serde_json::to_string(&new.specific_employees)?;
        let rec = sqlx::query(
            "INSERT INTO deductions (code, name, amount, taxable, fixed, one_time_deduction,
                                     specific_employees, employer_rate, employee_rate)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?) RETURNING id",
        )
        .bind(&new.code)
        .bind(&new.name)
        .bind(new.amount)
        .bind(new.taxable.as_str())
        .bind(new.fixed)
        .bind(new.one_time_deduction.as_str())
        .bind(employees)
        .bind(&new.employer_rate)
        .bind(&new.employee_rate)
        .fetch_one(&self.pool)
        .await?;
        Ok(DeductionId(rec.get::<i64, _>(0)))
    }

    pub async fn update_deduction(&self, id: DeductionId, new: &NewDeduction) -> Result<bool> {
        let employees = serde_json::to_string(&new.specific_employees)?;
        let result = sqlx::query(
            "UPDATE deductions
             SET code = ?, name = ?, amount = ?, taxable = ?, fixed = ?,
                 one_time_deduction = ?, specific_employees = ?, employer_rate = ?,
                 employee_rate = ?
             WHERE id = ?",
        )
        .bind(&new.code)
        .bind(&new.name)
        .bind(new.amount)
        .bind(new.taxable.as_str())
        .bind(new.fixed)
        .bind(new.one_time_deduction.as_str())
        .bind(employees)
        .bind(&new.employer_rate)
        .bind(&new.employee_rate)
        .bind(id.0)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn delete_deduction(&self, id: DeductionId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM deductions WHERE id = ?")
            .bind(id.0)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // ---- federal tax brackets ----

    pub async fn list_tax_brackets(&self) -> Result<Vec<TaxBracket>> {
        let rows = sqlx::query(
            "SELECT id, tax_rate, min_income, max_income, description
             FROM federal_tax_brackets ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(tax_bracket_from_row).collect()
    }

    pub async fn get_tax_bracket(&self, id: TaxBracketId) -> Result<Option<TaxBracket>> {
        let row = sqlx::query(
            "SELECT id, tax_rate, min_income, max_income, description
             FROM federal_tax_brackets WHERE id = ?",
        )
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(tax_bracket_from_row).transpose()
    }

    pub async fn insert_tax_bracket(&self, new: &NewTaxBracket) -> Result<TaxBracketId> {
        let rec = sqlx::query(
            "INSERT INTO federal_tax_brackets (tax_rate, min_income, max_income, description)
             VALUES (?, ?, ?, ?) RETURNING id",
        )
        .bind(&new.tax_rate)
        .bind(new.min_income)
        .bind(new.max_income)
        .bind(&new.description)
        .fetch_one(&self.pool)
        .await?;
        Ok(TaxBracketId(rec.get::<i64, _>(0)))
    }

    pub async fn update_tax_bracket(&self, id: TaxBracketId, new: &NewTaxBracket) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE federal_tax_brackets
             SET tax_rate = ?, min_income = ?, max_income = ?, description = ?
             WHERE id = ?",
        )
        .bind(&new.tax_rate)
        .bind(new.min_income)
        .bind(new.max_income)
        .bind(&new.description)
        .bind(id.0)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn delete_tax_bracket(&self, id: TaxBracketId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM federal_tax_brackets WHERE id = ?")
            .bind(id.0)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // ---- onboarding candidates ----

    pub async fn list_candidates(&self) -> Result<Vec<Candidate>> {
        let rows = sqlx::query(
            "SELECT id, name, email, job_position, mobile, joining_date, stage,
                    portal_status, task_status
             FROM onboarding_candidates ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(candidate_from_row).collect()
    }

    pub async fn list_candidates_by_stage(&self, stage: Stage) -> Result<Vec<Candidate>> {
        let rows = sqlx::query(
            "SELECT id, name, email, job_position, mobile, joining_date, stage,
                    portal_status, task_status
             FROM onboarding_candidates WHERE stage = ? ORDER BY id",
        )
        .bind(stage.as_str())
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(candidate_from_row).collect()
    }

    pub async fn get_candidate(&self, id: CandidateId) -> Result<Option<Candidate>> {
        let row = sqlx::query(
            "SELECT id, name, email, job_position, mobile, joining_date, stage,
                    portal_status, task_status
             FROM onboarding_candidates WHERE id = ?",
        )
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(candidate_from_row).transpose()
    }

    pub async fn insert_candidate(&self, new: &NewCandidate) -> Result<CandidateId> {
        let rec = sqlx::query(
            "INSERT INTO onboarding_candidates (name, email, job_position, mobile,
                                                joining_date, stage, portal_status, task_status)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?) RETURNING id",
        )
        .bind(&new.name)
        .bind(&new.email)
        .bind(&new.job_position)
        .bind(&new.mobile)
        .bind(new.joining_date)
        .bind(new.stage.as_str())
        .bind(match new.portal_status {
            PortalStatus::Active => "Active",
            PortalStatus::Inactive => "Inactive",
        })
        .bind(match new.task_status {
            TaskStatus::Pending => "Pending",
            TaskStatus::Completed => "Completed",
        })
        .fetch_one(&self.pool)
        .await?;
        Ok(CandidateId(rec.get::<i64, _>(0)))
    }

    pub async fn delete_candidate(&self, id: CandidateId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM onboarding_candidates WHERE id = ?")
            .bind(id.0)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

fn allowance_from_row(row: &SqliteRow) -> Result<Allowance> {
    Ok(Allowance {
        id: AllowanceId(row.get::<i64, _>(0)),
        code: row.get::<String, _>(1),
        name: row.get::<String, _>(2),
        amount: row.get::<f64, _>(3),
        one_time: yes_no_from_text(&row.get::<String, _>(4))?,
        taxable: yes_no_from_text(&row.get::<String, _>(5))?,
        fixed: row.get::<bool, _>(6),
    })
}

fn deduction_from_row(row: &SqliteRow) -> Result<Deduction> {
    let employees: Vec<String> = serde_json::from_str(&row.get::<String, _>(7))
        .context("malformed specific_employees column")?;
    Ok(Deduction {
        id: DeductionId(row.get::<i64, _>(0)),
        code: row.get::<String, _>(1),
        name: row.get::<String, _>(2),
        amount: row.get::<f64, _>(3),
        taxable: yes_no_from_text(&row.get::<String, _>(4))?,
        fixed: row.get::<bool, _>(5),
        one_time_deduction: yes_no_from_text(&row.get::<String, _>(6))?,
        specific_employees: employees,
        employer_rate: row.get::<String, _>(8),
        employee_rate: row.get::<String, _>(9),
    })
}

fn tax_bracket_from_row(row: &SqliteRow) -> Result<TaxBracket> {
    Ok(TaxBracket {
        id: TaxBracketId(row.get::<i64, _>(0)),
        tax_rate: row.get::<String, _>(1),
        min_income: row.get::<f64, _>(2),
        max_income: row.get::<f64, _>(3),
        description: row.get::<Option<String>, _>(4),
    })
}

fn candidate_from_row(row: &SqliteRow) -> Result<Candidate> {
    Ok(Candidate {
        id: CandidateId(row.get::<i64, _>(0)),
        name: row.get::<String, _>(1),
        email: row.get::<String, _>(2),
        job_position: row.get::<String, _>(3),
        mobile: row.get::<String, _>(4),
        joining_date: row.get::<NaiveDate, _>(5),
        stage: stage_from_text(&row.get::<String, _>(6))?,
        portal_status: match row.get::<String, _>(7).as_str() {
            "Active" => PortalStatus::Active,
            "Inactive" => PortalStatus::Inactive,
            other => return Err(anyhow!("unknown portal status '{other}'")),
        },
        task_status: match row.get::<String, _>(8).as_str() {
            "Pending" => TaskStatus::Pending,
            "Completed" => TaskStatus::Completed,
            other => return Err(anyhow!("unknown task status '{other}'")),
        },
    })
}

fn yes_no_from_text(text: &str) -> Result<YesNo> {
    match text {
        "Yes" => Ok(YesNo::Yes),
        "No" => Ok(YesNo::No),
        other => Err(anyhow!("unknown yes/no value '{other}'")),
    }
}

fn stage_from_text(text: &str) -> Result<Stage> {
    match text {
        "Test" => Ok(Stage::Test),
        "Interview" => Ok(Stage::Interview),
        "Offer" => Ok(Stage::Offer),
        other => Err(anyhow!("unknown stage '{other}'")),
    }
}

fn ensure_sqlite_parent_dir_exists(database_url: &str) -> Result<()> {
    let Some(path) = sqlite_path(database_url) else {
        return Ok(());
    };

    let Some(parent) = path.parent() else {
        return Ok(());
    };

    fs::create_dir_all(parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for database url '{database_url}'",
            parent.display()
        )
    })?;

    Ok(())
}

fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if database_url == "sqlite::memory:" || !database_url.starts_with("sqlite:") {
        return None;
    }

    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();

    if path.is_empty() {
        return None;
    }

    Some(Path::new(path).to_path_buf())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
