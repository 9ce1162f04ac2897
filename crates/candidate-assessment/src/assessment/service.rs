use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::domain::{
    normalize_email, non_empty, Assignment, CandidateChanges, CandidateId, CandidateProfile,
    CandidateRecord, CodeAnswer, NewCandidate, NewProblem, ProblemId, ProblemRecord,
    SubmissionId, SubmissionRecord, TestProgress,
};
use super::error::{AssessmentError, ValidationError};
use super::lifecycle;
use super::repository::AssessmentRepository;
use super::review;
use super::views::{CandidateStateView, CandidateSummaryView, SubmissionView};
use crate::access::{AccessCode, Principal, SessionRegistry};
use crate::config::AssessmentConfig;

static CANDIDATE_SEQUENCE: AtomicU64 = AtomicU64::new(1);
static PROBLEM_SEQUENCE: AtomicU64 = AtomicU64::new(1);
static SUBMISSION_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_id(sequence: &AtomicU64, prefix: &str) -> String {
    let id = sequence.fetch_add(1, Ordering::Relaxed);
    format!("{prefix}-{id:06}")
}

/// Issued after a successful access-code login.
#[derive(Debug, Clone, Serialize)]
pub struct CandidateSession {
    pub token: String,
    pub candidate_id: CandidateId,
}

/// Body of a review PATCH; either part may be absent but not both.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubmissionPatch {
    #[serde(default)]
    pub remark: Option<RemarkInput>,
    #[serde(default)]
    pub recommended_for_next_step: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RemarkInput {
    pub text: String,
}

/// Service composing the lifecycle rules, review workflow, and repository.
pub struct AssessmentService<R> {
    repository: Arc<R>,
    sessions: Arc<SessionRegistry>,
    config: AssessmentConfig,
}

impl<R> AssessmentService<R>
where
    R: AssessmentRepository + 'static,
{
    pub fn new(repository: Arc<R>, sessions: Arc<SessionRegistry>, config: AssessmentConfig) -> Self {
        Self {
            repository,
            sessions,
            config,
        }
    }

    pub fn sessions(&self) -> &SessionRegistry {
        &self.sessions
    }

    /// Exchange a candidate's e-mail and access code for a bearer token.
    pub fn login(&self, email: &str, access_code: &str) -> Result<CandidateSession, AssessmentError> {
        let candidate = self
            .repository
            .find_candidate_by_email(email)?
            .filter(|candidate| candidate.access_code.matches(access_code))
            .ok_or_else(|| {
                warn!(email = email.trim(), "rejected candidate login");
                AssessmentError::Unauthorized
            })?;

        let token = self
            .sessions
            .open(Principal::candidate(&candidate.id, candidate.profile.name.clone()));
        info!(candidate = %candidate.id.0, "candidate logged in");

        Ok(CandidateSession {
            token,
            candidate_id: candidate.id,
        })
    }

    pub fn authenticate(&self, token: &str) -> Result<Principal, AssessmentError> {
        self.sessions.resolve(token)
    }

    pub fn register_problem(
        &self,
        principal: &Principal,
        problem: NewProblem,
    ) -> Result<ProblemRecord, AssessmentError> {
        principal.require_admin()?;
        let problem = problem.validate()?;

        let record = ProblemRecord {
            id: ProblemId(next_id(&PROBLEM_SEQUENCE, "prob")),
            title: problem.title,
            statement: problem.statement,
            required_stacks: problem.required_stacks,
        };
        let stored = self.repository.insert_problem(record)?;
        info!(problem = %stored.id.0, stacks = stored.required_stacks.len(), "problem registered");
        Ok(stored)
    }

    pub fn create_candidate(
        &self,
        principal: &Principal,
        invitation: NewCandidate,
        now: DateTime<Utc>,
    ) -> Result<CandidateRecord, AssessmentError> {
        principal.require_admin()?;
        self.require_problem(&invitation.problem_id)?;

        let profile = CandidateProfile {
            name: non_empty("name", &invitation.name)?,
            email: normalize_email(&invitation.email)?,
            assignment: Assignment {
                department: invitation.department.trim().to_string(),
                position: invitation.position.trim().to_string(),
                problem_id: invitation.problem_id,
            },
            scheduled_time: invitation.scheduled_time,
            end_time: lifecycle::end_time_for(invitation.scheduled_time, self.config.test_window()),
        };

        let record = CandidateRecord {
            id: CandidateId(next_id(&CANDIDATE_SEQUENCE, "cand")),
            profile,
            access_code: AccessCode::generate(),
            progress: TestProgress::default(),
            created_at: now,
        };

        let stored = self.repository.insert_candidate(record)?;
        info!(
            candidate = %stored.id.0,
            scheduled = %stored.profile.scheduled_time,
            "candidate invited"
        );
        Ok(stored)
    }

    pub fn update_candidate(
        &self,
        principal: &Principal,
        id: &CandidateId,
        changes: CandidateChanges,
    ) -> Result<CandidateRecord, AssessmentError> {
        principal.require_admin()?;
        let current = self.require_candidate(id)?;
        let mut profile = current.profile.clone();

        if let Some(name) = changes.name {
            profile.name = non_empty("name", &name)?;
        }
        if let Some(email) = changes.email {
            profile.email = normalize_email(&email)?;
        }
        if let Some(department) = changes.department {
            profile.assignment.department = department.trim().to_string();
        }
        if let Some(position) = changes.position {
            profile.assignment.position = position.trim().to_string();
        }
        if let Some(problem_id) = changes.problem_id {
            self.require_problem(&problem_id)?;
            profile.assignment.problem_id = problem_id;
        }
        if let Some(scheduled_time) = changes.scheduled_time {
            profile.scheduled_time = scheduled_time;
            profile.end_time = lifecycle::end_time_for(scheduled_time, self.config.test_window());
        }

        lifecycle::check_profile_edit(&current, &profile)?;
        let updated = self.repository.update_profile(id, profile)?;
        info!(candidate = %id.0, "candidate updated");
        Ok(updated)
    }

    /// Issues a fresh access code and signs the candidate out everywhere.
    pub fn regenerate_access_code(
        &self,
        principal: &Principal,
        id: &CandidateId,
    ) -> Result<CandidateRecord, AssessmentError> {
        principal.require_admin()?;
        let updated = self.repository.replace_access_code(id, AccessCode::generate())?;
        let revoked = self.sessions.revoke_candidate(id);
        info!(candidate = %id.0, revoked, "access code regenerated");
        Ok(updated)
    }

    pub fn delete_candidate(
        &self,
        principal: &Principal,
        id: &CandidateId,
    ) -> Result<(), AssessmentError> {
        principal.require_admin()?;
        let removed = self.repository.delete_candidate(id)?;
        self.sessions.revoke_candidate(id);
        info!(
            candidate = %id.0,
            had_submission = removed.progress.submission_id.is_some(),
            "candidate deleted"
        );
        Ok(())
    }

    pub fn list_candidates(
        &self,
        principal: &Principal,
        now: DateTime<Utc>,
    ) -> Result<Vec<CandidateSummaryView>, AssessmentError> {
        principal.require_staff()?;
        let mut candidates = self.repository.list_candidates()?;
        candidates.sort_by(|a, b| {
            a.profile
                .scheduled_time
                .cmp(&b.profile.scheduled_time)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(candidates
            .iter()
            .map(|candidate| CandidateSummaryView::new(candidate, now))
            .collect())
    }

    pub fn candidate_summary(
        &self,
        principal: &Principal,
        id: &CandidateId,
        now: DateTime<Utc>,
    ) -> Result<CandidateSummaryView, AssessmentError> {
        principal.require_staff()?;
        let candidate = self.require_candidate(id)?;
        Ok(CandidateSummaryView::new(&candidate, now))
    }

    /// State of the logged-in candidate's own assessment.
    pub fn current_candidate(
        &self,
        principal: &Principal,
        now: DateTime<Utc>,
    ) -> Result<CandidateStateView, AssessmentError> {
        let candidate = self.require_candidate(&principal.require_candidate()?)?;
        let problem = self.require_problem(&candidate.profile.assignment.problem_id)?;
        Ok(CandidateStateView::new(&candidate, &problem, now))
    }

    pub fn start_test(
        &self,
        principal: &Principal,
        now: DateTime<Utc>,
    ) -> Result<CandidateStateView, AssessmentError> {
        let id = principal.require_candidate()?;
        let candidate = self.require_candidate(&id)?;
        let problem = self.require_problem(&candidate.profile.assignment.problem_id)?;

        let started_at = lifecycle::start(&candidate, now).map_err(|conflict| {
            warn!(candidate = %id.0, %conflict, "start rejected");
            AssessmentError::from(conflict)
        })?;
        let updated = self.repository.mark_started(&id, started_at)?;

        info!(candidate = %id.0, started_at = %started_at, "test started");
        Ok(CandidateStateView::new(&updated, &problem, now))
    }

    pub fn submit_test(
        &self,
        principal: &Principal,
        answers: Vec<CodeAnswer>,
        now: DateTime<Utc>,
    ) -> Result<CandidateStateView, AssessmentError> {
        let id = principal.require_candidate()?;
        let candidate = self.require_candidate(&id)?;
        let problem = self.require_problem(&candidate.profile.assignment.problem_id)?;

        let answers = lifecycle::submit(&candidate, &problem, answers, now).map_err(|rejection| {
            warn!(candidate = %id.0, %rejection, "submission rejected");
            AssessmentError::from(rejection)
        })?;

        let submission = SubmissionRecord {
            id: SubmissionId(next_id(&SUBMISSION_SEQUENCE, "sub")),
            candidate_id: id.clone(),
            problem_id: problem.id.clone(),
            answers,
            remarks: Vec::new(),
            recommended_for_next_step: false,
            submitted_at: now,
        };
        let submission_id = submission.id.clone();
        let updated = self.repository.record_submission(submission)?;

        info!(candidate = %id.0, submission = %submission_id.0, "test submitted");
        Ok(CandidateStateView::new(&updated, &problem, now))
    }

    pub fn submission(
        &self,
        principal: &Principal,
        id: &SubmissionId,
    ) -> Result<SubmissionView, AssessmentError> {
        principal.require_staff()?;
        Ok(self.require_submission(id)?.into())
    }

    pub fn list_submissions(
        &self,
        principal: &Principal,
    ) -> Result<Vec<SubmissionView>, AssessmentError> {
        principal.require_staff()?;
        let mut submissions = self.repository.list_submissions()?;
        submissions.sort_by(|a, b| a.submitted_at.cmp(&b.submitted_at).then_with(|| a.id.cmp(&b.id)));
        Ok(submissions.into_iter().map(SubmissionView::from).collect())
    }

    pub fn add_remark(
        &self,
        principal: &Principal,
        id: &SubmissionId,
        text: &str,
        now: DateTime<Utc>,
    ) -> Result<SubmissionView, AssessmentError> {
        principal.require_staff()?;
        let remark = review::draft_remark(principal, text, now)?;
        let updated = self.repository.append_remark(id, remark)?;
        info!(submission = %id.0, reviewer = %principal.id, "remark added");
        Ok(updated.into())
    }

    pub fn set_recommendation(
        &self,
        principal: &Principal,
        id: &SubmissionId,
        recommended: bool,
    ) -> Result<SubmissionView, AssessmentError> {
        principal.require_staff()?;
        let updated = self.repository.set_recommendation(id, recommended)?;
        info!(submission = %id.0, recommended, "recommendation updated");
        Ok(updated.into())
    }

    /// Applies a review PATCH in one write: the remark and the flag land together or not at all.
    pub fn review(
        &self,
        principal: &Principal,
        id: &SubmissionId,
        patch: SubmissionPatch,
        now: DateTime<Utc>,
    ) -> Result<SubmissionView, AssessmentError> {
        principal.require_staff()?;
        let SubmissionPatch {
            remark,
            recommended_for_next_step,
        } = patch;
        if remark.is_none() && recommended_for_next_step.is_none() {
            return Err(ValidationError::EmptyReview.into());
        }

        let remark = remark
            .map(|input| review::draft_remark(principal, &input.text, now))
            .transpose()?;
        let remarked = remark.is_some();
        let updated = self
            .repository
            .apply_review(id, remark, recommended_for_next_step)?;

        info!(
            submission = %id.0,
            reviewer = %principal.id,
            remarked,
            recommended = ?recommended_for_next_step,
            "review applied"
        );
        Ok(updated.into())
    }

    fn require_candidate(&self, id: &CandidateId) -> Result<CandidateRecord, AssessmentError> {
        self.repository
            .fetch_candidate(id)?
            .ok_or(AssessmentError::NotFound("candidate"))
    }

    fn require_problem(&self, id: &ProblemId) -> Result<ProblemRecord, AssessmentError> {
        self.repository
            .fetch_problem(id)?
            .ok_or(AssessmentError::NotFound("problem"))
    }

    fn require_submission(&self, id: &SubmissionId) -> Result<SubmissionRecord, AssessmentError> {
        self.repository
            .fetch_submission(id)?
            .ok_or(AssessmentError::NotFound("submission"))
    }
}
