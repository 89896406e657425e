use std::{net::SocketAddr, sync::Arc};

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;
use server_api::{ApiContext, LogMailer};
use shared::{
    domain::{AllowanceId, CandidateId, DeductionId, Stage, TaxBracketId},
    error::{ApiError, ErrorCode},
    protocol::{
        Allowance, Candidate, Deduction, NewAllowance, NewCandidate, NewDeduction, NewTaxBracket,
        OnboardingMailRequest, TaxBracket,
    },
};
use storage::Storage;
use tower_http::limit::RequestBodyLimitLayer;
use tracing::{error, info};

mod config;

use config::{load_settings, prepare_database_url};

const MAX_BODY_BYTES: usize = 64 * 1024;

#[derive(Clone)]
struct AppState {
    api: ApiContext,
}

#[derive(Debug, Deserialize)]
struct StageQuery {
    stage: Stage,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let settings = load_settings();
    let database_url = prepare_database_url(&settings.database_url)?;
    let storage = Storage::new(&database_url).await.map_err(|error| {
        error!(
            %database_url,
            %error,
            "failed to open SQLite database; verify parent directory exists and permissions are correct"
        );
        error
    })?;
    let api = ApiContext {
        storage,
        mailer: Arc::new(LogMailer),
    };

    let state = AppState { api };
    let app = build_router(Arc::new(state));

    let addr: SocketAddr = settings.server_bind.parse()?;
    info!(%addr, "server listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/api/allowances", get(list_allowances).post(create_allowance))
        .route(
            "/api/allowances/:id",
            put(update_allowance).delete(delete_allowance),
        )
        .route("/api/deductions", get(list_deductions).post(create_deduction))
        .route(
            "/api/deductions/:id",
            put(update_deduction).delete(delete_deduction),
        )
        .route(
            "/api/federal-tax",
            get(list_tax_brackets).post(create_tax_bracket),
        )
        .route(
            "/api/federal-tax/:id",
            put(update_tax_bracket).delete(delete_tax_bracket),
        )
        .route("/api/onboarding", get(list_candidates).post(create_candidate))
        .route("/api/onboarding/filter", get(filter_candidates))
        .route("/api/onboarding/send-email", post(send_onboarding_email))
        .route("/api/onboarding/:id", axum::routing::delete(delete_candidate))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .with_state(state)
}

async fn healthz() -> &'static str {
    "ok"
}

fn reject(err: ApiError) -> (StatusCode, Json<ApiError>) {
    let status = match err.code {
        ErrorCode::Validation => StatusCode::BAD_REQUEST,
        ErrorCode::Conflict => StatusCode::CONFLICT,
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(err))
}

// ---- allowances ----

async fn list_allowances(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Allowance>>, (StatusCode, Json<ApiError>)> {
    let allowances = server_api::list_allowances(&state.api)
        .await
        .map_err(reject)?;
    Ok(Json(allowances))
}

async fn create_allowance(
    State(state): State<Arc<AppState>>,
    Json(new): Json<NewAllowance>,
) -> Result<(StatusCode, Json<Allowance>), (StatusCode, Json<ApiError>)> {
    let created = server_api::create_allowance(&state.api, &new)
        .await
        .map_err(reject)?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn update_allowance(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(new): Json<NewAllowance>,
) -> Result<Json<Allowance>, (StatusCode, Json<ApiError>)> {
    let updated = server_api::update_allowance(&state.api, AllowanceId(id), &new)
        .await
        .map_err(reject)?;
    Ok(Json(updated))
}

async fn delete_allowance(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, (StatusCode, Json<ApiError>)> {
    server_api::delete_allowance(&state.api, AllowanceId(id))
        .await
        .map_err(reject)?;
    Ok(StatusCode::NO_CONTENT)
}

// ---- deductions ----

async fn list_deductions(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Deduction>>, (StatusCode, Json<ApiError>)> {
    let deductions = server_api::list_deductions(&state.api)
        .await
        .map_err(reject)?;
    Ok(Json(deductions))
}

async fn create_deduction(
    State(state): State<Arc<AppState>>,
    Json(new): Json<NewDeduction>,
) -> Result<(StatusCode, Json<Deduction>), (StatusCode, Json<ApiError>)> {
    let created = server_api::create_deduction(&state.api, &new)
        .await
        .map_err(reject)?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn update_deduction(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(new): Json<NewDeduction>,
) -> Result<Json<Deduction>, (StatusCode, Json<ApiError>)> {
    let updated = server_api::update_deduction(&state.api, DeductionId(id), &new)
        .await
        .map_err(reject)?;
    Ok(Json(updated))
}

async fn delete_deduction(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, (StatusCode, Json<ApiError>)> {
    server_api::delete_deduction(&state.api, DeductionId(id))
        .await
        .map_err(reject)?;
    Ok(StatusCode::NO_CONTENT)
}

// ---- federal tax brackets ----

async fn list_tax_brackets(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<TaxBracket>>, (StatusCode, Json<ApiError>)> {
    let brackets = server_api::list_tax_brackets(&state.api)
        .await
        .map_err(reject)?;
    Ok(Json(brackets))
}

async fn create_tax_bracket(
    State(state): State<Arc<AppState>>,
    Json(new): Json<NewTaxBracket>,
) -> Result<(StatusCode, Json<TaxBracket>), (StatusCode, Json<ApiError>)> {
    let created = server_api::create_tax_bracket(&state.api, &new)
        .await
        .map_err(reject)?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn update_tax_bracket(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(new): Json<NewTaxBracket>,
) -> Result<Json<TaxBracket>, (StatusCode, Json<ApiError>)> {
    let updated = server_api::update_tax_bracket(&state.api, TaxBracketId(id), &new)
        .await
        .map_err(reject)?;
    Ok(Json(updated))
}

async fn delete_tax_bracket(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, (StatusCode, Json<ApiError>)> {
    server_api::delete_tax_bracket(&state.api, TaxBracketId(id))
        .await
        .map_err(reject)?;
    Ok(StatusCode::NO_CONTENT)
}

// ---- onboarding candidates ----

async fn list_candidates(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Candidate>>, (StatusCode, Json<ApiError>)> {
    let candidates = server_api::list_candidates(&state.api, None)
        .await
        .map_err(reject)?;
    Ok(Json(candidates))
}

async fn filter_candidates(
    State(state): State<Arc<AppState>>,
    Query(q): Query<StageQuery>,
) -> Result<Json<Vec<Candidate>>, (StatusCode, Json<ApiError>)> {
    let candidates = server_api::list_candidates(&state.api, Some(q.stage))
        .await
        .map_err(reject)?;
    Ok(Json(candidates))
}

async fn create_candidate(
    State(state): State<Arc<AppState>>,
    Json(new): Json<NewCandidate>,
) -> Result<(StatusCode, Json<Candidate>), (StatusCode, Json<ApiError>)> {
    let created = server_api::create_candidate(&state.api, &new)
        .await
        .map_err(reject)?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn delete_candidate(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, (StatusCode, Json<ApiError>)> {
    server_api::delete_candidate(&state.api, CandidateId(id))
        .await
        .map_err(reject)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn send_onboarding_email(
    State(state): State<Arc<AppState>>,
    Json(request): Json<OnboardingMailRequest>,
) -> Result<StatusCode, (StatusCode, Json<ApiError>)> {
    server_api::send_onboarding_email(&state.api, &request)
        .await
        .map_err(reject)?;
    Ok(StatusCode::NO_CONTENT)
}
