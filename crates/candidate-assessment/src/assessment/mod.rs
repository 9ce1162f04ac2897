//! Candidate assessments: invitations, the timed test lifecycle, and review.

pub mod domain;
pub mod error;
pub mod lifecycle;
pub mod memory;
pub mod repository;
pub mod review;
pub mod router;
pub mod service;
pub mod views;

#[cfg(test)]
mod tests;

pub use domain::{
    Assignment, CandidateChanges, CandidateId, CandidateProfile, CandidateRecord, CodeAnswer,
    NewCandidate, NewProblem, ProblemId, ProblemRecord, Remark, ReviewerIdentity, SubmissionId,
    SubmissionRecord, TechnologyStack, TestProgress,
};
pub use error::{AssessmentError, ConflictError, ValidationError};
pub use lifecycle::{ElapsedTime, LifecycleState};
pub use memory::InMemoryAssessmentRepository;
pub use repository::{AssessmentRepository, RepositoryError};
pub use review::RecommendationStatus;
pub use router::assessment_router;
pub use service::{AssessmentService, CandidateSession, RemarkInput, SubmissionPatch};
pub use views::{CandidateStateView, CandidateSummaryView, ProblemView, SubmissionView};
