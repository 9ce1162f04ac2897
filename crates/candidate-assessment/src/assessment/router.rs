use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::Deserialize;

use super::domain::{
    CandidateChanges, CandidateId, CodeAnswer, NewCandidate, NewProblem, ProblemRecord,
    SubmissionId,
};
use super::error::AssessmentError;
use super::repository::AssessmentRepository;
use super::service::{AssessmentService, CandidateSession, SubmissionPatch};
use super::views::{CandidateStateView, CandidateSummaryView, SubmissionView};
use crate::access::Principal;

type SharedService<R> = Arc<AssessmentService<R>>;

#[derive(Debug, Deserialize)]
pub(crate) struct LoginRequest {
    pub(crate) email: String,
    pub(crate) access_code: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SubmitRequest {
    pub(crate) answers: Vec<CodeAnswer>,
}

/// Router builder exposing the candidate, admin, and review endpoints.
pub fn assessment_router<R>(service: SharedService<R>) -> Router
where
    R: AssessmentRepository + 'static,
{
    Router::new()
        .route("/api/v1/sessions", post(login_handler::<R>))
        .route("/api/v1/candidate", get(current_candidate_handler::<R>))
        .route("/api/v1/candidate/start", post(start_handler::<R>))
        .route("/api/v1/candidate/submit", post(submit_handler::<R>))
        .route("/api/v1/admin/problems", post(register_problem_handler::<R>))
        .route(
            "/api/v1/admin/candidates",
            get(list_candidates_handler::<R>).post(create_candidate_handler::<R>),
        )
        .route(
            "/api/v1/admin/candidates/:candidate_id",
            get(candidate_summary_handler::<R>)
                .patch(update_candidate_handler::<R>)
                .delete(delete_candidate_handler::<R>),
        )
        .route(
            "/api/v1/admin/candidates/:candidate_id/access-code",
            post(regenerate_access_code_handler::<R>),
        )
        .route("/api/v1/submissions", get(list_submissions_handler::<R>))
        .route(
            "/api/v1/submissions/:submission_id",
            get(submission_handler::<R>).patch(review_handler::<R>),
        )
        .with_state(service)
}

/// Resolves `Authorization: Bearer <token>` to a principal.
pub(crate) fn principal_from_headers<R>(
    service: &AssessmentService<R>,
    headers: &HeaderMap,
) -> Result<Principal, AssessmentError>
where
    R: AssessmentRepository + 'static,
{
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or(AssessmentError::Unauthorized)?;
    service.authenticate(token)
}

pub(crate) async fn login_handler<R>(
    State(service): State<SharedService<R>>,
    Json(request): Json<LoginRequest>,
) -> Result<(StatusCode, Json<CandidateSession>), AssessmentError>
where
    R: AssessmentRepository + 'static,
{
    let session = service.login(&request.email, &request.access_code)?;
    Ok((StatusCode::CREATED, Json(session)))
}

pub(crate) async fn current_candidate_handler<R>(
    State(service): State<SharedService<R>>,
    headers: HeaderMap,
) -> Result<Json<CandidateStateView>, AssessmentError>
where
    R: AssessmentRepository + 'static,
{
    let principal = principal_from_headers(&service, &headers)?;
    Ok(Json(service.current_candidate(&principal, Utc::now())?))
}

pub(crate) async fn start_handler<R>(
    State(service): State<SharedService<R>>,
    headers: HeaderMap,
) -> Result<Json<CandidateStateView>, AssessmentError>
where
    R: AssessmentRepository + 'static,
{
    let principal = principal_from_headers(&service, &headers)?;
    Ok(Json(service.start_test(&principal, Utc::now())?))
}

pub(crate) async fn submit_handler<R>(
    State(service): State<SharedService<R>>,
    headers: HeaderMap,
    Json(request): Json<SubmitRequest>,
) -> Result<Json<CandidateStateView>, AssessmentError>
where
    R: AssessmentRepository + 'static,
{
    let principal = principal_from_headers(&service, &headers)?;
    Ok(Json(service.submit_test(
        &principal,
        request.answers,
        Utc::now(),
    )?))
}

pub(crate) async fn register_problem_handler<R>(
    State(service): State<SharedService<R>>,
    headers: HeaderMap,
    Json(problem): Json<NewProblem>,
) -> Result<(StatusCode, Json<ProblemRecord>), AssessmentError>
where
    R: AssessmentRepository + 'static,
{
    let principal = principal_from_headers(&service, &headers)?;
    let record = service.register_problem(&principal, problem)?;
    Ok((StatusCode::CREATED, Json(record)))
}

pub(crate) async fn list_candidates_handler<R>(
    State(service): State<SharedService<R>>,
    headers: HeaderMap,
) -> Result<Json<Vec<CandidateSummaryView>>, AssessmentError>
where
    R: AssessmentRepository + 'static,
{
    let principal = principal_from_headers(&service, &headers)?;
    Ok(Json(service.list_candidates(&principal, Utc::now())?))
}

pub(crate) async fn create_candidate_handler<R>(
    State(service): State<SharedService<R>>,
    headers: HeaderMap,
    Json(invitation): Json<NewCandidate>,
) -> Result<(StatusCode, Json<CandidateSummaryView>), AssessmentError>
where
    R: AssessmentRepository + 'static,
{
    let principal = principal_from_headers(&service, &headers)?;
    let now = Utc::now();
    let record = service.create_candidate(&principal, invitation, now)?;
    Ok((
        StatusCode::CREATED,
        Json(CandidateSummaryView::new(&record, now)),
    ))
}

pub(crate) async fn candidate_summary_handler<R>(
    State(service): State<SharedService<R>>,
    headers: HeaderMap,
    Path(candidate_id): Path<String>,
) -> Result<Json<CandidateSummaryView>, AssessmentError>
where
    R: AssessmentRepository + 'static,
{
    let principal = principal_from_headers(&service, &headers)?;
    let id = CandidateId(candidate_id);
    Ok(Json(service.candidate_summary(&principal, &id, Utc::now())?))
}

pub(crate) async fn update_candidate_handler<R>(
    State(service): State<SharedService<R>>,
    headers: HeaderMap,
    Path(candidate_id): Path<String>,
    Json(changes): Json<CandidateChanges>,
) -> Result<Json<CandidateSummaryView>, AssessmentError>
where
    R: AssessmentRepository + 'static,
{
    let principal = principal_from_headers(&service, &headers)?;
    let id = CandidateId(candidate_id);
    let record = service.update_candidate(&principal, &id, changes)?;
    Ok(Json(CandidateSummaryView::new(&record, Utc::now())))
}

pub(crate) async fn delete_candidate_handler<R>(
    State(service): State<SharedService<R>>,
    headers: HeaderMap,
    Path(candidate_id): Path<String>,
) -> Result<StatusCode, AssessmentError>
where
    R: AssessmentRepository + 'static,
{
    let principal = principal_from_headers(&service, &headers)?;
    service.delete_candidate(&principal, &CandidateId(candidate_id))?;
    Ok(StatusCode::NO_CONTENT)
}

pub(crate) async fn regenerate_access_code_handler<R>(
    State(service): State<SharedService<R>>,
    headers: HeaderMap,
    Path(candidate_id): Path<String>,
) -> Result<Json<CandidateSummaryView>, AssessmentError>
where
    R: AssessmentRepository + 'static,
{
    let principal = principal_from_headers(&service, &headers)?;
    let record = service.regenerate_access_code(&principal, &CandidateId(candidate_id))?;
    Ok(Json(CandidateSummaryView::new(&record, Utc::now())))
}

pub(crate) async fn list_submissions_handler<R>(
    State(service): State<SharedService<R>>,
    headers: HeaderMap,
) -> Result<Json<Vec<SubmissionView>>, AssessmentError>
where
    R: AssessmentRepository + 'static,
{
    let principal = principal_from_headers(&service, &headers)?;
    Ok(Json(service.list_submissions(&principal)?))
}

pub(crate) async fn submission_handler<R>(
    State(service): State<SharedService<R>>,
    headers: HeaderMap,
    Path(submission_id): Path<String>,
) -> Result<Json<SubmissionView>, AssessmentError>
where
    R: AssessmentRepository + 'static,
{
    let principal = principal_from_headers(&service, &headers)?;
    Ok(Json(
        service.submission(&principal, &SubmissionId(submission_id))?,
    ))
}

pub(crate) async fn review_handler<R>(
    State(service): State<SharedService<R>>,
    headers: HeaderMap,
    Path(submission_id): Path<String>,
    Json(patch): Json<SubmissionPatch>,
) -> Result<Json<SubmissionView>, AssessmentError>
where
    R: AssessmentRepository + 'static,
{
    let principal = principal_from_headers(&service, &headers)?;
    Ok(Json(service.review(
        &principal,
        &SubmissionId(submission_id),
        patch,
        Utc::now(),
    )?))
}
