//! Self-evaluation harness
//!
//! Probes the service's own analytical endpoints one after another,
//! timing each call. A call that completes is recorded in
//! `tested_endpoints`; a call that fails at the transport level (connect
//! error, timeout, broken body) is recorded in `endpoints_with_errors`.
//! A target lands in exactly one of the two maps.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{InsightsError, Result};
use crate::store::RecordStore;

/// Endpoints probed when no explicit target list is configured
pub const DEFAULT_TARGETS: [&str; 4] = [
    "/superusers",
    "/top-countries",
    "/team-insights",
    "/active-users-per-day",
];

/// Route serving the harness; never a valid target
pub const EVALUATION_PATH: &str = "/evaluation";

/// Raw response of one probe
#[derive(Debug, Clone)]
pub struct ProbeResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

/// Transport used to reach a target
#[async_trait]
pub trait ProbeTransport: Send + Sync {
    /// Issue one call; transport-level failures are `TargetUnreachable`
    async fn get(&self, target: &str) -> Result<ProbeResponse>;
}

/// HTTP transport with a hard per-call timeout
pub struct HttpProbe {
    client: reqwest::Client,
    base_url: String,
}

impl HttpProbe {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| InsightsError::Config(format!("probe client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl ProbeTransport for HttpProbe {
    async fn get(&self, target: &str) -> Result<ProbeResponse> {
        let unreachable = |e: reqwest::Error| InsightsError::TargetUnreachable {
            target: target.to_string(),
            detail: e.to_string(),
        };

        let url = format!("{}{}", self.base_url, target);
        let response = self.client.get(&url).send().await.map_err(unreachable)?;
        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(unreachable)?;

        Ok(ProbeResponse {
            status,
            body: body.to_vec(),
        })
    }
}

/// A completed probe
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub status: u16,
    pub time_ms: u64,
    /// Whether the response body was well-formed JSON
    pub valid_response: bool,
}

/// A probe that never got a response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeFailure {
    pub error: String,
    pub detailed_error: String,
}

/// Outcome of probing one target
#[derive(Debug, Clone, PartialEq)]
pub enum ProbeOutcome {
    Completed(EvaluationResult),
    Unreachable(ProbeFailure),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub tested_endpoints: BTreeMap<String, EvaluationResult>,
    pub endpoints_with_errors: BTreeMap<String, ProbeFailure>,
}

impl FromIterator<(String, ProbeOutcome)> for EvaluationReport {
    fn from_iter<I: IntoIterator<Item = (String, ProbeOutcome)>>(iter: I) -> Self {
        let mut report = EvaluationReport::default();
        for (target, outcome) in iter {
            match outcome {
                ProbeOutcome::Completed(result) => {
                    report.tested_endpoints.insert(target, result);
                }
                ProbeOutcome::Unreachable(failure) => {
                    report.endpoints_with_errors.insert(target, failure);
                }
            }
        }
        report
    }
}

pub struct EvaluationHarness {
    store: RecordStore,
    transport: Arc<dyn ProbeTransport>,
    targets: Vec<String>,
}

impl EvaluationHarness {
    pub fn new(store: RecordStore, transport: Arc<dyn ProbeTransport>, targets: Vec<String>) -> Self {
        Self {
            store,
            transport,
            targets,
        }
    }

    pub fn targets(&self) -> &[String] {
        &self.targets
    }

    /// Probe every target in order.
    ///
    /// Refuses to run against an empty store; the targets would only
    /// report the same condition themselves.
    pub async fn run(&self) -> Result<EvaluationReport> {
        if self.store.is_empty().await {
            return Err(InsightsError::EmptyStore);
        }

        let mut outcomes = Vec::with_capacity(self.targets.len());
        for target in &self.targets {
            outcomes.push((target.clone(), self.probe(target).await));
        }

        let report: EvaluationReport = outcomes.into_iter().collect();
        info!(
            tested = report.tested_endpoints.len(),
            failed = report.endpoints_with_errors.len(),
            "Evaluation finished"
        );
        Ok(report)
    }

    async fn probe(&self, target: &str) -> ProbeOutcome {
        let start = Instant::now();
        match self.transport.get(target).await {
            Ok(response) => ProbeOutcome::Completed(EvaluationResult {
                status: response.status,
                time_ms: start.elapsed().as_millis() as u64,
                valid_response: serde_json::from_slice::<serde_json::Value>(&response.body).is_ok(),
            }),
            Err(e) => {
                warn!(endpoint = target, error = %e, "Evaluation probe failed");
                let detailed_error = match e {
                    InsightsError::TargetUnreachable { detail, .. } => detail,
                    other => other.to_string(),
                };
                ProbeOutcome::Unreachable(ProbeFailure {
                    error: format!("Could not evaluate endpoint {target}"),
                    detailed_error,
                })
            }
        }
    }
}
