//! user-insights: in-memory user analytics service
//!
//! Accepts a bulk upload of user records (profile, team membership,
//! projects, login log) as a JSON array, keeps them in memory and answers
//! analytical queries over them:
//! - Superusers (score >= 900 and active)
//! - Countries ranked by superuser count
//! - Per-team membership, leadership, project and activity statistics
//! - Login events per calendar day
//!
//! A self-evaluation harness probes the analytical endpoints and reports
//! latency and validity per endpoint.

pub mod analytics;
pub mod api;
pub mod config;
pub mod error;
pub mod evaluation;
pub mod ingest;
pub mod models;
pub mod store;

pub use analytics::Analytics;
pub use config::Config;
pub use error::{InsightsError, Result};
pub use evaluation::{EvaluationHarness, EvaluationReport, HttpProbe, ProbeTransport};
pub use ingest::{ingest_slice, IngestReport};
pub use models::{CountryTally, DailyLoginCount, LogEntry, Project, Team, TeamInsight, UserRecord};
pub use store::RecordStore;
