use candidate_assessment::access::SessionRegistry;
use candidate_assessment::assessment::{AssessmentService, InMemoryAssessmentRepository};
use candidate_assessment::config::{AccessConfig, AssessmentConfig};
use chrono::{DateTime, Utc};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

pub(crate) type MemoryAssessmentService = AssessmentService<InMemoryAssessmentRepository>;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Wires the service to in-memory storage and the configured staff sessions.
pub(crate) fn build_service(
    assessment: AssessmentConfig,
    access: &AccessConfig,
) -> Arc<MemoryAssessmentService> {
    let repository = Arc::new(InMemoryAssessmentRepository::default());
    let sessions = Arc::new(SessionRegistry::with_staff(&access.staff));
    Arc::new(AssessmentService::new(repository, sessions, assessment))
}

pub(crate) fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(raw.trim())
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(|err| format!("failed to parse '{raw}' as an RFC 3339 timestamp ({err})"))
}
