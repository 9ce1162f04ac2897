use chrono::{DateTime, Utc};
use serde::Serialize;

use super::domain::{
    CandidateId, CandidateRecord, CodeAnswer, ProblemId, ProblemRecord, Remark, SubmissionId,
    SubmissionRecord, TechnologyStack,
};
use super::lifecycle::{ElapsedTime, LifecycleState};
use super::review::RecommendationStatus;

/// What a logged-in candidate sees. Never carries the access code.
#[derive(Debug, Clone, Serialize)]
pub struct CandidateStateView {
    pub candidate_id: CandidateId,
    pub name: String,
    pub email: String,
    pub department: String,
    pub position: String,
    pub state: LifecycleState,
    pub scheduled_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub start_time: Option<DateTime<Utc>>,
    pub submission_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elapsed: Option<ElapsedTime>,
    pub window_closed: bool,
    pub problem: ProblemView,
}

impl CandidateStateView {
    pub fn new(candidate: &CandidateRecord, problem: &ProblemRecord, now: DateTime<Utc>) -> Self {
        let profile = &candidate.profile;
        Self {
            candidate_id: candidate.id.clone(),
            name: profile.name.clone(),
            email: profile.email.clone(),
            department: profile.assignment.department.clone(),
            position: profile.assignment.position.clone(),
            state: LifecycleState::at(candidate, now),
            scheduled_time: profile.scheduled_time,
            end_time: profile.end_time,
            start_time: candidate.progress.start_time,
            submission_time: candidate.progress.submission_time,
            elapsed: ElapsedTime::for_candidate(candidate, now),
            window_closed: now > profile.end_time,
            problem: ProblemView::from(problem),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProblemView {
    pub problem_id: ProblemId,
    pub title: String,
    pub statement: String,
    pub required_stacks: Vec<TechnologyStack>,
}

impl From<&ProblemRecord> for ProblemView {
    fn from(problem: &ProblemRecord) -> Self {
        Self {
            problem_id: problem.id.clone(),
            title: problem.title.clone(),
            statement: problem.statement.clone(),
            required_stacks: problem.required_stacks.clone(),
        }
    }
}

/// Staff overview of an invitation, including the credential to hand out.
#[derive(Debug, Clone, Serialize)]
pub struct CandidateSummaryView {
    pub candidate_id: CandidateId,
    pub name: String,
    pub email: String,
    pub access_code: String,
    pub department: String,
    pub position: String,
    pub problem_id: ProblemId,
    pub state: LifecycleState,
    pub scheduled_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub start_time: Option<DateTime<Utc>>,
    pub submission_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elapsed: Option<ElapsedTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submission_id: Option<SubmissionId>,
}

impl CandidateSummaryView {
    pub fn new(candidate: &CandidateRecord, now: DateTime<Utc>) -> Self {
        let profile = &candidate.profile;
        Self {
            candidate_id: candidate.id.clone(),
            name: profile.name.clone(),
            email: profile.email.clone(),
            access_code: candidate.access_code.0.clone(),
            department: profile.assignment.department.clone(),
            position: profile.assignment.position.clone(),
            problem_id: profile.assignment.problem_id.clone(),
            state: LifecycleState::at(candidate, now),
            scheduled_time: profile.scheduled_time,
            end_time: profile.end_time,
            start_time: candidate.progress.start_time,
            submission_time: candidate.progress.submission_time,
            elapsed: ElapsedTime::for_candidate(candidate, now),
            submission_id: candidate.progress.submission_id.clone(),
        }
    }
}

/// Reviewer view of a submission.
#[derive(Debug, Clone, Serialize)]
pub struct SubmissionView {
    pub submission_id: SubmissionId,
    pub candidate_id: CandidateId,
    pub problem_id: ProblemId,
    pub submitted_at: DateTime<Utc>,
    pub answers: Vec<CodeAnswer>,
    pub remarks: Vec<Remark>,
    pub recommended_for_next_step: bool,
    pub status: RecommendationStatus,
}

impl From<SubmissionRecord> for SubmissionView {
    fn from(submission: SubmissionRecord) -> Self {
        let status = RecommendationStatus::of(&submission);
        Self {
            submission_id: submission.id,
            candidate_id: submission.candidate_id,
            problem_id: submission.problem_id,
            submitted_at: submission.submitted_at,
            answers: submission.answers,
            remarks: submission.remarks,
            recommended_for_next_step: submission.recommended_for_next_step,
            status,
        }
    }
}
