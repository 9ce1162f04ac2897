use chrono::{DateTime, Utc};

use super::domain::{
    CandidateId, CandidateProfile, CandidateRecord, ProblemId, ProblemRecord, Remark,
    SubmissionId, SubmissionRecord,
};
use super::error::ConflictError;
use crate::access::AccessCode;

/// Storage abstraction so the service can be exercised in isolation.
///
/// `mark_started`, `record_submission` and `append_remark` are conditional
/// writes: implementations must check and update under one atomic step so
/// concurrent duplicates cannot both succeed.
pub trait AssessmentRepository: Send + Sync {
    fn insert_problem(&self, problem: ProblemRecord) -> Result<ProblemRecord, RepositoryError>;
    fn fetch_problem(&self, id: &ProblemId) -> Result<Option<ProblemRecord>, RepositoryError>;

    /// Fails with [`ConflictError::EmailTaken`] when the e-mail is already invited.
    fn insert_candidate(&self, record: CandidateRecord)
        -> Result<CandidateRecord, RepositoryError>;
    fn fetch_candidate(&self, id: &CandidateId)
        -> Result<Option<CandidateRecord>, RepositoryError>;
    fn find_candidate_by_email(
        &self,
        email: &str,
    ) -> Result<Option<CandidateRecord>, RepositoryError>;
    fn list_candidates(&self) -> Result<Vec<CandidateRecord>, RepositoryError>;
    /// Replaces the admin-editable profile, leaving progress markers alone.
    fn update_profile(
        &self,
        id: &CandidateId,
        profile: CandidateProfile,
    ) -> Result<CandidateRecord, RepositoryError>;
    fn replace_access_code(
        &self,
        id: &CandidateId,
        code: AccessCode,
    ) -> Result<CandidateRecord, RepositoryError>;
    /// Removes the candidate together with its submission, if any.
    fn delete_candidate(&self, id: &CandidateId) -> Result<CandidateRecord, RepositoryError>;

    /// Sets `start_time` only while it is still empty.
    fn mark_started(
        &self,
        id: &CandidateId,
        started_at: DateTime<Utc>,
    ) -> Result<CandidateRecord, RepositoryError>;
    /// Stores the submission and sets `submission_time` only while the test is in progress.
    fn record_submission(
        &self,
        submission: SubmissionRecord,
    ) -> Result<CandidateRecord, RepositoryError>;

    fn fetch_submission(
        &self,
        id: &SubmissionId,
    ) -> Result<Option<SubmissionRecord>, RepositoryError>;
    fn list_submissions(&self) -> Result<Vec<SubmissionRecord>, RepositoryError>;
    /// Appends unless the reviewer already has a remark on the submission.
    fn append_remark(
        &self,
        id: &SubmissionId,
        remark: Remark,
    ) -> Result<SubmissionRecord, RepositoryError>;
    fn set_recommendation(
        &self,
        id: &SubmissionId,
        recommended: bool,
    ) -> Result<SubmissionRecord, RepositoryError>;
    /// Applies an optional remark and an optional flag together, or neither.
    fn apply_review(
        &self,
        id: &SubmissionId,
        remark: Option<Remark>,
        recommended: Option<bool>,
    ) -> Result<SubmissionRecord, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error(transparent)]
    Conflict(ConflictError),
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

impl From<ConflictError> for RepositoryError {
    fn from(value: ConflictError) -> Self {
        RepositoryError::Conflict(value)
    }
}
