//! Response envelope and error mapping
//!
//! Every response is `{"status": <code>, "body": <payload>}`. Successful
//! query payloads are wrapped in [`Timed`], which adds the response
//! timestamp and the computation time next to the data.

use std::time::Instant;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::{InsightsError, EMPTY_STORE_MESSAGE};

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub status: u16,
    pub body: T,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(body: T) -> Self {
        Self {
            status: StatusCode::OK.as_u16(),
            body,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::OK);
        (status, Json(self)).into_response()
    }
}

/// Query payload stamped with response time and execution duration
#[derive(Debug, Serialize)]
pub struct Timed<T> {
    pub timestamp: DateTime<Utc>,
    pub execution_time_ms: u64,
    #[serde(flatten)]
    pub data: T,
}

impl<T: Serialize> Timed<T> {
    /// Stamp `data` computed since `started`
    pub fn finish(started: Instant, data: T) -> ApiResponse<Self> {
        ApiResponse::ok(Self {
            timestamp: Utc::now(),
            execution_time_ms: started.elapsed().as_millis() as u64,
            data,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub detailed_error: String,
}

/// Handler error: an [`InsightsError`] rendered inside the envelope
#[derive(Debug)]
pub struct ApiError(pub InsightsError);

impl From<InsightsError> for ApiError {
    fn from(e: InsightsError) -> Self {
        ApiError(e)
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match &self.0 {
            InsightsError::MalformedInput(_)
            | InsightsError::RecordDecode { .. }
            | InsightsError::InvalidParameter(_)
            | InsightsError::EmptyStore => StatusCode::BAD_REQUEST,
            InsightsError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            InsightsError::TargetUnreachable { .. } => StatusCode::BAD_GATEWAY,
            InsightsError::IngestTask(_) | InsightsError::Config(_) | InsightsError::Io(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn body(&self) -> ErrorBody {
        let (error, detailed_error) = match &self.0 {
            InsightsError::MalformedInput(detail) => {
                ("Could not read the uploaded JSON array".to_string(), detail.clone())
            }
            InsightsError::EmptyStore => (EMPTY_STORE_MESSAGE.to_string(), String::new()),
            InsightsError::TargetUnreachable { target, detail } => {
                (format!("Could not evaluate endpoint {target}"), detail.clone())
            }
            other => (other.to_string(), String::new()),
        };
        ErrorBody {
            error,
            detailed_error,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self.0, "Request failed");
        } else {
            tracing::debug!(error = %self.0, status = status.as_u16(), "Request rejected");
        }

        ApiResponse {
            status: status.as_u16(),
            body: self.body(),
        }
        .into_response()
    }
}
