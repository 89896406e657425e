use std::sync::Arc;

use shared::{
    domain::{AllowanceId, CandidateId, DeductionId, Stage, TaxBracketId},
    error::{ApiError, ErrorCode},
    protocol::{
        Allowance, Candidate, Deduction, NewAllowance, NewCandidate, NewDeduction, NewTaxBracket,
        OnboardingMailRequest, TaxBracket,
    },
};
use storage::Storage;
use tracing::info;

#[derive(Clone)]
pub struct ApiContext {
    pub storage: Storage,
    pub mailer: Arc<dyn Mailer>,
}

/// Out-of-band notification delivery. The onboarding screen only needs a
/// success/failure signal, so implementations report nothing richer.
pub trait Mailer: Send + Sync {
    fn send_onboarding_mail(&self, request: &OnboardingMailRequest) -> anyhow::Result<()>;
}

/// Default mailer: records the would-be delivery in the log stream.
pub struct LogMailer;

impl Mailer for LogMailer {
    fn send_onboarding_mail(&self, request: &OnboardingMailRequest) -> anyhow::Result<()> {
        info!(
            email = %request.email,
            name = %request.name,
            job_position = %request.job_position,
            joining_date = %request.joining_date,
            "onboarding mail queued"
        );
        Ok(())
    }
}

// ---- allowances ----

pub async fn list_allowances(ctx: &ApiContext) -> Result<Vec<Allowance>, ApiError> {
    ctx.storage.list_allowances().await.map_err(internal)
}

pub async fn create_allowance(
    ctx: &ApiContext,
    new: &NewAllowance,
) -> Result<Allowance, ApiError> {
    require_nonempty("code", &new.code)?;
    require_nonempty("name", &new.name)?;
    let id = ctx
        .storage
        .insert_allowance(new)
        .await
        .map_err(|e| conflict_or_internal(e, "allowance already exists"))?;
    fetch_allowance(ctx, id).await
}

pub async fn update_allowance(
    ctx: &ApiContext,
    id: AllowanceId,
    new: &NewAllowance,
) -> Result<Allowance, ApiError> {
    require_nonempty("code", &new.code)?;
    require_nonempty("name", &new.name)?;
    let updated = ctx
        .storage
        .update_allowance(id, new)
        .await
        .map_err(|e| conflict_or_internal(e, "allowance already exists"))?;
    if !updated {
        return Err(ApiError::new(ErrorCode::NotFound, "allowance not found"));
    }
    fetch_allowance(ctx, id).await
}

pub async fn delete_allowance(ctx: &ApiContext, id: AllowanceId) -> Result<(), ApiError> {
    let deleted = ctx.storage.delete_allowance(id).await.map_err(internal)?;
    if !deleted {
        return Err(ApiError::new(ErrorCode::NotFound, "allowance not found"));
    }
    Ok(())
}

async fn fetch_allowance(ctx: &ApiContext, id: AllowanceId) -> Result<Allowance, ApiError> {
    ctx.storage
        .get_allowance(id)
        .await
        .map_err(internal)?
        .ok_or_else(|| ApiError::new(ErrorCode::NotFound, "allowance not found"))
}

// ---- deductions ----

pub async fn list_deductions(ctx: &ApiContext) -> Result<Vec<Deduction>, ApiError> {
    ctx.storage.list_deductions().await.map_err(internal)
}

pub async fn create_deduction(
    ctx: &ApiContext,
    new: &NewDeduction,
) -> Result<Deduction, ApiError> {
    require_nonempty("code", &new.code)?;
    require_nonempty("name", &new.name)?;
    let id = ctx
        .storage
        .insert_deduction(new)
        .await
        .map_err(|e| conflict_or_internal(e, "deduction already exists"))?;
    fetch_deduction(ctx, id).await
}

pub async fn update_deduction(
    ctx: &ApiContext,
    id: DeductionId,
    new: &NewDeduction,
) -> Result<Deduction, ApiError> {
    require_nonempty("code", &new.code)?;
    require_nonempty("name", &new.name)?;
    let updated = ctx
        .storage
        .update_deduction(id, new)
        .await
        .map_err(|e| conflict_or_internal(e, "deduction already exists"))?;
    if !updated {
        return Err(ApiError::new(ErrorCode::NotFound, "deduction not found"));
    }
    fetch_deduction(ctx, id).await
}

pub async fn delete_deduction(ctx: &ApiContext, id: DeductionId) -> Result<(), ApiError> {
    let deleted = ctx.storage.delete_deduction(id).await.map_err(internal)?;
    if !deleted {
        return Err(ApiError::new(ErrorCode::NotFound, "deduction not found"));
    }
    Ok(())
}

async fn fetch_deduction(ctx: &ApiContext, id: DeductionId) -> Result<Deduction, ApiError> {
    ctx.storage
        .get_deduction(id)
        .await
        .map_err(internal)?
        .ok_or_else(|| ApiError::new(ErrorCode::NotFound, "deduction not found"))
}

// ---- federal tax brackets ----

pub async fn list_tax_brackets(ctx: &ApiContext) -> Result<Vec<TaxBracket>, ApiError> {
    ctx.storage.list_tax_brackets().await.map_err(internal)
}

pub async fn create_tax_bracket(
    ctx: &ApiContext,
    new: &NewTaxBracket,
) -> Result<TaxBracket, ApiError> {
    require_nonempty("taxRate", &new.tax_rate)?;
    if new.max_income < new.min_income {
        return Err(ApiError::new(
            ErrorCode::Validation,
            "maxIncome must not be below minIncome",
        ));
    }
    let id = ctx.storage.insert_tax_bracket(new).await.map_err(internal)?;
    fetch_tax_bracket(ctx, id).await
}

pub async fn update_tax_bracket(
    ctx: &ApiContext,
    id: TaxBracketId,
    new: &NewTaxBracket,
) -> Result<TaxBracket, ApiError> {
    require_nonempty("taxRate", &new.tax_rate)?;
    if new.max_income < new.min_income {
        return Err(ApiError::new(
            ErrorCode::Validation,
            "maxIncome must not be below minIncome",
        ));
    }
    let updated = ctx
        .storage
        .update_tax_bracket(id, new)
        .await
        .map_err(internal)?;
    if !updated {
        return Err(ApiError::new(ErrorCode::NotFound, "tax bracket not found"));
    }
    fetch_tax_bracket(ctx, id).await
}

pub async fn delete_tax_bracket(ctx: &ApiContext, id: TaxBracketId) -> Result<(), ApiError> {
    let deleted = ctx.storage.delete_tax_bracket(id).await.map_err(internal)?;
    if !deleted {
        return Err(ApiError::new(ErrorCode::NotFound, "tax bracket not found"));
    }
    Ok(())
}

async fn fetch_tax_bracket(ctx: &ApiContext, id: TaxBracketId) -> Result<TaxBracket, ApiError> {
    ctx.storage
        .get_tax_bracket(id)
        .await
        .map_err(internal)?
        .ok_or_else(|| ApiError::new(ErrorCode::NotFound, "tax bracket not found"))
}

// ---- onboarding candidates ----

pub async fn list_candidates(
    ctx: &ApiContext,
    stage: Option<Stage>,
) -> Result<Vec<Candidate>, ApiError> {
    match stage {
        Some(stage) => ctx
            .storage
            .list_candidates_by_stage(stage)
            .await
            .map_err(internal),
        None => ctx.storage.list_candidates().await.map_err(internal),
    }
}

pub async fn create_candidate(
    ctx: &ApiContext,
    new: &NewCandidate,
) -> Result<Candidate, ApiError> {
    require_nonempty("name", &new.name)?;
    require_nonempty("email", &new.email)?;
    require_nonempty("jobPosition", &new.job_position)?;
    require_nonempty("mobile", &new.mobile)?;
    let id = ctx
        .storage
        .insert_candidate(new)
        .await
        .map_err(|e| conflict_or_internal(e, "candidate already exists"))?;
    ctx.storage
        .get_candidate(id)
        .await
        .map_err(internal)?
        .ok_or_else(|| ApiError::new(ErrorCode::NotFound, "candidate not found"))
}

pub async fn delete_candidate(ctx: &ApiContext, id: CandidateId) -> Result<(), ApiError> {
    let deleted = ctx.storage.delete_candidate(id).await.map_err(internal)?;
    if !deleted {
        return Err(ApiError::new(ErrorCode::NotFound, "candidate not found"));
    }
    Ok(())
}

pub async fn send_onboarding_email(
    ctx: &ApiContext,
    request: &OnboardingMailRequest,
) -> Result<(), ApiError> {
    require_nonempty("email", &request.email)?;
    require_nonempty("name", &request.name)?;
    ctx.mailer
        .send_onboarding_mail(request)
        .map_err(|e| ApiError::new(ErrorCode::Internal, format!("mail delivery failed: {e}")))
}

fn require_nonempty(field: &str, value: &str) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        return Err(ApiError::new(
            ErrorCode::Validation,
            format!("{field} must not be empty"),
        ));
    }
    Ok(())
}

fn conflict_or_internal(err: anyhow::Error, message: &str) -> ApiError {
    if storage::is_unique_violation(&err) {
        ApiError::new(ErrorCode::Conflict, message)
    } else {
        internal(err)
    }
}

fn internal(err: anyhow::Error) -> ApiError {
    ApiError::new(ErrorCode::Internal, err.to_string())
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use shared::domain::{PortalStatus, TaskStatus, YesNo};

    use super::*;

    async fn setup() -> ApiContext {
        let storage = Storage::new("sqlite::memory:").await.expect("db");
        ApiContext {
            storage,
            mailer: Arc::new(LogMailer),
        }
    }

    fn sample_allowance(code: &str, name: &str, amount: f64) -> NewAllowance {
        NewAllowance {
            code: code.into(),
            name: name.into(),
            amount,
            one_time: YesNo::No,
            taxable: YesNo::Yes,
            fixed: false,
        }
    }

    fn sample_candidate(email: &str) -> NewCandidate {
        NewCandidate {
            name: "Jane Smith".into(),
            email: email.into(),
            job_position: "Product Manager".into(),
            mobile: "1234567890".into(),
            joining_date: NaiveDate::from_ymd_opt(2025, 3, 1).expect("date"),
            stage: Stage::Test,
            portal_status: PortalStatus::Active,
            task_status: TaskStatus::Pending,
        }
    }

    #[tokio::test]
    async fn duplicate_allowance_code_is_a_conflict() {
        let ctx = setup().await;
        create_allowance(&ctx, &sample_allowance("HRA", "Housing", 2000.0))
            .await
            .expect("first create");
        let err = create_allowance(&ctx, &sample_allowance("HRA", "Housing again", 900.0))
            .await
            .expect_err("duplicate code");
        assert_eq!(err.code, ErrorCode::Conflict);
    }

    #[tokio::test]
    async fn empty_name_is_rejected_before_storage() {
        let ctx = setup().await;
        let err = create_allowance(&ctx, &sample_allowance("TA", "  ", 500.0))
            .await
            .expect_err("blank name");
        assert_eq!(err.code, ErrorCode::Validation);
        assert!(list_allowances(&ctx).await.expect("list").is_empty());
    }

    #[tokio::test]
    async fn update_of_unknown_allowance_is_not_found() {
        let ctx = setup().await;
        let err = update_allowance(&ctx, AllowanceId(42), &sample_allowance("TA", "Travel", 1.0))
            .await
            .expect_err("missing id");
        assert_eq!(err.code, ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn stage_filter_only_returns_matching_candidates() {
        let ctx = setup().await;
        create_candidate(&ctx, &sample_candidate("a@b.com"))
            .await
            .expect("create");
        let mut offered = sample_candidate("c@d.com");
        offered.stage = Stage::Offer;
        create_candidate(&ctx, &offered).await.expect("create");

        let tested = list_candidates(&ctx, Some(Stage::Test)).await.expect("list");
        assert_eq!(tested.len(), 1);
        assert_eq!(tested[0].email, "a@b.com");

        let all = list_candidates(&ctx, None).await.expect("list");
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn duplicate_candidate_email_is_a_conflict() {
        let ctx = setup().await;
        create_candidate(&ctx, &sample_candidate("a@b.com"))
            .await
            .expect("create");
        let err = create_candidate(&ctx, &sample_candidate("a@b.com"))
            .await
            .expect_err("duplicate email");
        assert_eq!(err.code, ErrorCode::Conflict);
    }

    #[tokio::test]
    async fn deleted_candidate_disappears_from_listing() {
        let ctx = setup().await;
        let created = create_candidate(&ctx, &sample_candidate("a@b.com"))
            .await
            .expect("create");
        delete_candidate(&ctx, created.id).await.expect("delete");
        assert!(list_candidates(&ctx, None).await.expect("list").is_empty());
        let err = delete_candidate(&ctx, created.id)
            .await
            .expect_err("already gone");
        assert_eq!(err.code, ErrorCode::NotFound);
    }
}
