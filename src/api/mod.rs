//! HTTP API
//!
//! Provides:
//! - Upload of user record batches
//! - Analytical queries over the in-memory records
//! - Self-evaluation of the analytical endpoints

pub mod response;
pub mod routes;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::analytics::Analytics;
use crate::config::Config;
use crate::error::Result;
use crate::evaluation::{EvaluationHarness, HttpProbe, ProbeTransport, EVALUATION_PATH};
use crate::store::RecordStore;

/// State shared across handlers
pub struct AppState {
    pub store: RecordStore,
    pub analytics: Analytics,
    pub harness: EvaluationHarness,
    pub max_upload_bytes: usize,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    /// Build state with an HTTP probe pointed at this service
    pub fn new(config: &Config) -> Result<Self> {
        let transport = HttpProbe::new(config.evaluation_base_url(), config.evaluation_timeout())?;
        Ok(Self::with_transport(config, RecordStore::new(), Arc::new(transport)))
    }

    pub fn with_transport(
        config: &Config,
        store: RecordStore,
        transport: Arc<dyn ProbeTransport>,
    ) -> Self {
        Self {
            analytics: Analytics::new(store.clone(), config.analytics.top_countries_limit),
            harness: EvaluationHarness::new(
                store.clone(),
                transport,
                config.evaluation.targets.clone(),
            ),
            store,
            max_upload_bytes: config.server.max_upload_bytes,
        }
    }
}

/// Create the API router
pub fn create_router(state: SharedState) -> Router {
    let upload_limit = DefaultBodyLimit::max(state.max_upload_bytes);

    Router::new()
        .route("/users", post(routes::upload_users).layer(upload_limit))
        .route("/superusers", get(routes::superusers))
        .route("/top-countries", get(routes::top_countries))
        .route("/team-insights", get(routes::team_insights))
        .route("/active-users-per-day", get(routes::active_users_per_day))
        .route(EVALUATION_PATH, get(routes::evaluation))
        // Health check
        .route("/health", get(routes::health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
