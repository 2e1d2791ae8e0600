//! HTTP handlers
//!
//! Thin adapters from requests to the ingestion pipeline, the analytics
//! queries and the evaluation harness.

use std::time::Instant;

use axum::{
    body::Bytes,
    extract::{rejection::QueryRejection, FromRequest, Multipart, Query, Request, State},
    http::{header::CONTENT_TYPE, HeaderMap, StatusCode},
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};

use super::response::{ApiError, ApiResponse, Timed};
use super::SharedState;
use crate::error::InsightsError;
use crate::evaluation::EvaluationReport;
use crate::ingest::{self, SkippedRecord};
use crate::models::{CountryTally, DailyLoginCount, TeamInsight, UserRecord};

type ApiResult<T> = Result<ApiResponse<T>, ApiError>;

/// Health check endpoint
pub async fn health() -> impl IntoResponse {
    "OK"
}

// === Ingestion ===

#[derive(Serialize)]
pub struct StoreUsersResponse {
    pub message: String,
    pub user_count: usize,
    pub accepted: usize,
    pub replaced: usize,
    pub skipped: Vec<SkippedRecord>,
}

/// Form field holding the users file in a multipart upload
pub const UPLOAD_FIELD: &str = "arquivos";

/// POST /users - a JSON array of user records, either as the raw body or as
/// the `arquivos` file of a `multipart/form-data` form
pub async fn upload_users(
    State(state): State<SharedState>,
    request: Request,
) -> ApiResult<StoreUsersResponse> {
    let limit = state.max_upload_bytes;
    let body = if is_multipart(request.headers()) {
        let multipart = Multipart::from_request(request, &state)
            .await
            .map_err(|r| upload_rejected(limit, r.status(), r.body_text()))?;
        read_upload_field(multipart, limit).await?
    } else {
        Bytes::from_request(request, &state)
            .await
            .map_err(|r| upload_rejected(limit, r.status(), r.body_text()))?
    };

    let report = ingest::ingest_slice(&state.store, body).await?;

    Ok(ApiResponse::ok(StoreUsersResponse {
        message: "Users file stored in memory".to_string(),
        user_count: report.record_count,
        accepted: report.accepted,
        replaced: report.replaced,
        skipped: report.skipped,
    }))
}

fn is_multipart(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("multipart/form-data"))
}

async fn read_upload_field(mut multipart: Multipart, limit: usize) -> Result<Bytes, InsightsError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| upload_rejected(limit, e.status(), e.body_text()))?
    {
        if field.name() == Some(UPLOAD_FIELD) {
            return field
                .bytes()
                .await
                .map_err(|e| upload_rejected(limit, e.status(), e.body_text()));
        }
    }
    Err(InsightsError::MalformedInput(format!(
        "form has no {UPLOAD_FIELD:?} file field"
    )))
}

fn upload_rejected(limit: usize, status: StatusCode, detail: String) -> InsightsError {
    if status == StatusCode::PAYLOAD_TOO_LARGE {
        InsightsError::PayloadTooLarge { limit }
    } else {
        InsightsError::MalformedInput(detail)
    }
}

// === Analytics ===

#[derive(Serialize)]
pub struct SuperusersPayload {
    pub data: Vec<UserRecord>,
    pub count: usize,
}

/// GET /superusers
pub async fn superusers(State(state): State<SharedState>) -> ApiResult<Timed<SuperusersPayload>> {
    let started = Instant::now();
    let data = state.analytics.superusers().await?;
    let count = data.len();
    Ok(Timed::finish(started, SuperusersPayload { data, count }))
}

#[derive(Debug, Deserialize)]
pub struct TopCountriesParams {
    pub limit: Option<usize>,
}

#[derive(Serialize)]
pub struct CountriesPayload {
    pub countries: Vec<CountryTally>,
}

/// GET /top-countries?limit=N
pub async fn top_countries(
    State(state): State<SharedState>,
    params: Result<Query<TopCountriesParams>, QueryRejection>,
) -> ApiResult<Timed<CountriesPayload>> {
    let started = Instant::now();
    let Query(params) =
        params.map_err(|e| InsightsError::InvalidParameter(e.body_text()))?;
    if params.limit == Some(0) {
        return Err(InsightsError::InvalidParameter("limit must be at least 1".to_string()).into());
    }

    let countries = state.analytics.top_countries(params.limit).await?;
    Ok(Timed::finish(started, CountriesPayload { countries }))
}

#[derive(Serialize)]
pub struct TeamsPayload {
    pub teams: Vec<TeamInsight>,
}

/// GET /team-insights
pub async fn team_insights(State(state): State<SharedState>) -> ApiResult<Timed<TeamsPayload>> {
    let started = Instant::now();
    let teams = state.analytics.team_insights().await?;
    Ok(Timed::finish(started, TeamsPayload { teams }))
}

#[derive(Serialize)]
pub struct LoginsPayload {
    pub logins: Vec<DailyLoginCount>,
}

/// GET /active-users-per-day
pub async fn active_users_per_day(
    State(state): State<SharedState>,
) -> ApiResult<Timed<LoginsPayload>> {
    let started = Instant::now();
    let logins = state.analytics.active_users_per_day().await?;
    Ok(Timed::finish(started, LoginsPayload { logins }))
}

// === Evaluation ===

/// GET /evaluation - probe the analytical endpoints of this service
pub async fn evaluation(State(state): State<SharedState>) -> ApiResult<Timed<EvaluationReport>> {
    let started = Instant::now();
    let report = state.harness.run().await?;
    Ok(Timed::finish(started, report))
}
