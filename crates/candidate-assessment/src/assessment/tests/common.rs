use std::sync::Arc;

use axum::http::{header, Request, StatusCode};
use axum::response::Response;
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::Value;

use crate::access::{AccessCode, Principal, SessionRegistry};
use crate::assessment::domain::{
    Assignment, CandidateId, CandidateProfile, CandidateRecord, CodeAnswer, NewCandidate,
    NewProblem, ProblemId, ProblemRecord, Remark, SubmissionId, SubmissionRecord,
    TechnologyStack, TestProgress,
};
use crate::assessment::lifecycle::end_time_for;
use crate::assessment::repository::{AssessmentRepository, RepositoryError};
use crate::assessment::{AssessmentService, InMemoryAssessmentRepository};
use crate::config::AssessmentConfig;

pub(super) fn at(hour: u32, minute: u32, second: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, hour, minute, second)
        .single()
        .expect("valid timestamp")
}

pub(super) fn scheduled() -> DateTime<Utc> {
    at(10, 0, 0)
}

pub(super) fn rust_and_sql() -> Vec<TechnologyStack> {
    vec![TechnologyStack::new("Rust"), TechnologyStack::new("SQL")]
}

pub(super) fn problem() -> ProblemRecord {
    ProblemRecord {
        id: ProblemId("prob-fixture".to_string()),
        title: "Inventory ledger".to_string(),
        statement: "Track stock movements and report balances.".to_string(),
        required_stacks: rust_and_sql(),
    }
}

pub(super) fn new_problem() -> NewProblem {
    NewProblem {
        title: "Inventory ledger".to_string(),
        statement: "Track stock movements and report balances.".to_string(),
        required_stacks: rust_and_sql(),
    }
}

pub(super) fn candidate_record(scheduled_time: DateTime<Utc>) -> CandidateRecord {
    CandidateRecord {
        id: CandidateId("cand-fixture".to_string()),
        profile: CandidateProfile {
            name: "Ada Lovelace".to_string(),
            email: "ada@example.com".to_string(),
            assignment: Assignment {
                department: "Engineering".to_string(),
                position: "Backend Engineer".to_string(),
                problem_id: problem().id,
            },
            scheduled_time,
            end_time: end_time_for(scheduled_time, Duration::hours(4)),
        },
        access_code: AccessCode("Fx7Kq2Lm".to_string()),
        progress: TestProgress::default(),
        created_at: scheduled_time - Duration::days(2),
    }
}

pub(super) fn started(mut record: CandidateRecord, start: DateTime<Utc>) -> CandidateRecord {
    record.progress.start_time = Some(start);
    record
}

pub(super) fn answers() -> Vec<CodeAnswer> {
    vec![
        CodeAnswer {
            technology: TechnologyStack::new("sql"),
            code: "SELECT sku, SUM(qty) FROM moves GROUP BY sku;".to_string(),
        },
        CodeAnswer {
            technology: TechnologyStack::new("rust"),
            code: "fn main() {}".to_string(),
        },
    ]
}

pub(super) fn invitation(problem_id: &ProblemId, email: &str, scheduled_time: DateTime<Utc>) -> NewCandidate {
    NewCandidate {
        name: "Ada Lovelace".to_string(),
        email: email.to_string(),
        department: "Engineering".to_string(),
        position: "Backend Engineer".to_string(),
        problem_id: problem_id.clone(),
        scheduled_time,
    }
}

pub(super) fn submission_record(remarks: Vec<Remark>, recommended: bool) -> SubmissionRecord {
    SubmissionRecord {
        id: SubmissionId("sub-fixture".to_string()),
        candidate_id: CandidateId("cand-fixture".to_string()),
        problem_id: problem().id,
        answers: answers(),
        remarks,
        recommended_for_next_step: recommended,
        submitted_at: at(12, 0, 0),
    }
}

pub(super) fn admin() -> Principal {
    Principal::admin("staff:Dana", "Dana")
}

pub(super) fn interviewer(name: &str) -> Principal {
    Principal::interviewer(format!("staff:{name}"), name)
}

pub(super) type MemoryService = AssessmentService<InMemoryAssessmentRepository>;

pub(super) fn build_service() -> (
    MemoryService,
    Arc<InMemoryAssessmentRepository>,
    Arc<SessionRegistry>,
) {
    let repository = Arc::new(InMemoryAssessmentRepository::default());
    let sessions = Arc::new(SessionRegistry::default());
    let service = AssessmentService::new(
        repository.clone(),
        sessions.clone(),
        AssessmentConfig::default(),
    );
    (service, repository, sessions)
}

/// Admin registers the fixture problem and invites one candidate.
pub(super) fn invited(
    service: &MemoryService,
    email: &str,
    scheduled_time: DateTime<Utc>,
) -> (ProblemRecord, CandidateRecord) {
    let problem = service
        .register_problem(&admin(), new_problem())
        .expect("problem registers");
    let candidate = service
        .create_candidate(
            &admin(),
            invitation(&problem.id, email, scheduled_time),
            scheduled_time - Duration::days(1),
        )
        .expect("candidate invited");
    (problem, candidate)
}

pub(super) fn candidate_principal(record: &CandidateRecord) -> Principal {
    Principal::candidate(&record.id, record.profile.name.clone())
}

pub(super) fn bearer(token: &str) -> String {
    format!("Bearer {token}")
}

pub(super) fn json_request(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<axum::body::Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, bearer(token));
    }
    builder
        .body(axum::body::Body::from(
            serde_json::to_vec(&body).expect("serializable body"),
        ))
        .expect("valid request")
}

pub(super) fn empty_request(method: &str, uri: &str, token: Option<&str>) -> Request<axum::body::Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, bearer(token));
    }
    builder
        .body(axum::body::Body::empty())
        .expect("valid request")
}

pub(super) fn assert_conflict_response(response: &Response) {
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

pub(super) struct UnavailableRepository;

fn offline<T>() -> Result<T, RepositoryError> {
    Err(RepositoryError::Unavailable("database offline".to_string()))
}

impl AssessmentRepository for UnavailableRepository {
    fn insert_problem(&self, _problem: ProblemRecord) -> Result<ProblemRecord, RepositoryError> {
        offline()
    }

    fn fetch_problem(&self, _id: &ProblemId) -> Result<Option<ProblemRecord>, RepositoryError> {
        offline()
    }

    fn insert_candidate(
        &self,
        _record: CandidateRecord,
    ) -> Result<CandidateRecord, RepositoryError> {
        offline()
    }

    fn fetch_candidate(
        &self,
        _id: &CandidateId,
    ) -> Result<Option<CandidateRecord>, RepositoryError> {
        offline()
    }

    fn find_candidate_by_email(
        &self,
        _email: &str,
    ) -> Result<Option<CandidateRecord>, RepositoryError> {
        offline()
    }

    fn list_candidates(&self) -> Result<Vec<CandidateRecord>, RepositoryError> {
        offline()
    }

    fn update_profile(
        &self,
        _id: &CandidateId,
        _profile: CandidateProfile,
    ) -> Result<CandidateRecord, RepositoryError> {
        offline()
    }

    fn replace_access_code(
        &self,
        _id: &CandidateId,
        _code: AccessCode,
    ) -> Result<CandidateRecord, RepositoryError> {
        offline()
    }

    fn delete_candidate(&self, _id: &CandidateId) -> Result<CandidateRecord, RepositoryError> {
        offline()
    }

    fn mark_started(
        &self,
        _id: &CandidateId,
        _started_at: DateTime<Utc>,
    ) -> Result<CandidateRecord, RepositoryError> {
        offline()
    }

    fn record_submission(
        &self,
        _submission: SubmissionRecord,
    ) -> Result<CandidateRecord, RepositoryError> {
        offline()
    }

    fn fetch_submission(
        &self,
        _id: &SubmissionId,
    ) -> Result<Option<SubmissionRecord>, RepositoryError> {
        offline()
    }

    fn list_submissions(&self) -> Result<Vec<SubmissionRecord>, RepositoryError> {
        offline()
    }

    fn append_remark(
        &self,
        _id: &SubmissionId,
        _remark: Remark,
    ) -> Result<SubmissionRecord, RepositoryError> {
        offline()
    }

    fn set_recommendation(
        &self,
        _id: &SubmissionId,
        _recommended: bool,
    ) -> Result<SubmissionRecord, RepositoryError> {
        offline()
    }

    fn apply_review(
        &self,
        _id: &SubmissionId,
        _remark: Option<Remark>,
        _recommended: Option<bool>,
    ) -> Result<SubmissionRecord, RepositoryError> {
        offline()
    }
}
