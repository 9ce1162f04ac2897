use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Utc};
use serde_json::json;

use super::lifecycle::SubmitRejection;
use super::repository::RepositoryError;

/// Failure of an assessment operation, surfaced to the caller as-is.
#[derive(Debug, thiserror::Error)]
pub enum AssessmentError {
    #[error("authentication required")]
    Unauthorized,
    #[error("operation not permitted for this role")]
    Forbidden,
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Conflict(#[from] ConflictError),
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

impl AssessmentError {
    pub const fn status_code(&self) -> StatusCode {
        match self {
            AssessmentError::Unauthorized => StatusCode::UNAUTHORIZED,
            AssessmentError::Forbidden => StatusCode::FORBIDDEN,
            AssessmentError::NotFound(_) => StatusCode::NOT_FOUND,
            AssessmentError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AssessmentError::Conflict(_) => StatusCode::CONFLICT,
            AssessmentError::Unavailable(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<RepositoryError> for AssessmentError {
    fn from(value: RepositoryError) -> Self {
        match value {
            RepositoryError::Conflict(conflict) => AssessmentError::Conflict(conflict),
            RepositoryError::NotFound(resource) => AssessmentError::NotFound(resource),
            RepositoryError::Unavailable(reason) => AssessmentError::Unavailable(reason),
        }
    }
}

impl From<SubmitRejection> for AssessmentError {
    fn from(value: SubmitRejection) -> Self {
        match value {
            SubmitRejection::Conflict(conflict) => AssessmentError::Conflict(conflict),
            SubmitRejection::Invalid(invalid) => AssessmentError::Validation(invalid),
        }
    }
}

impl IntoResponse for AssessmentError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

/// Malformed or incomplete input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{0} must not be empty")]
    EmptyField(&'static str),
    #[error("'{0}' is not a valid e-mail address")]
    InvalidEmail(String),
    #[error("a problem needs at least one technology stack")]
    NoRequiredStacks,
    #[error("technology stack '{0}' is listed more than once")]
    DuplicateStack(String),
    #[error("missing answer for required technology '{0}'")]
    MissingAnswer(String),
    #[error("technology '{0}' is not required by the assigned problem")]
    UnexpectedAnswer(String),
    #[error("more than one answer for technology '{0}'")]
    DuplicateAnswer(String),
    #[error("submission patch must carry a remark or a recommendation")]
    EmptyReview,
}

/// Operation is illegal in the record's current state.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConflictError {
    #[error("test opens at {opens_at}")]
    NotYetOpen { opens_at: DateTime<Utc> },
    #[error("test already started")]
    AlreadyStarted,
    #[error("test has not been started")]
    NotStarted,
    #[error("test already submitted")]
    AlreadySubmitted,
    #[error("submission time precedes the recorded start at {started_at}")]
    SubmittedBeforeStart { started_at: DateTime<Utc> },
    #[error("schedule and problem are locked once the test has started")]
    ScheduleLocked,
    #[error("a candidate with e-mail '{0}' already exists")]
    EmailTaken(String),
    #[error("reviewer '{0}' has already left a remark on this submission")]
    DuplicateRemark(String),
    #[error("record already exists")]
    Duplicate,
}
