use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};

use super::domain::{
    CandidateId, CandidateProfile, CandidateRecord, ProblemId, ProblemRecord, Remark,
    SubmissionId, SubmissionRecord,
};
use super::error::ConflictError;
use super::lifecycle;
use super::repository::{AssessmentRepository, RepositoryError};
use super::review;
use crate::access::AccessCode;

#[derive(Debug, Default)]
struct Tables {
    problems: BTreeMap<ProblemId, ProblemRecord>,
    candidates: BTreeMap<CandidateId, CandidateRecord>,
    submissions: BTreeMap<SubmissionId, SubmissionRecord>,
}

impl Tables {
    fn email_taken(&self, email: &str, except: Option<&CandidateId>) -> bool {
        self.candidates.values().any(|candidate| {
            Some(&candidate.id) != except && candidate.profile.email.eq_ignore_ascii_case(email)
        })
    }

    fn candidate_mut(&mut self, id: &CandidateId) -> Result<&mut CandidateRecord, RepositoryError> {
        self.candidates
            .get_mut(id)
            .ok_or(RepositoryError::NotFound("candidate"))
    }

    fn submission_mut(
        &mut self,
        id: &SubmissionId,
    ) -> Result<&mut SubmissionRecord, RepositoryError> {
        self.submissions
            .get_mut(id)
            .ok_or(RepositoryError::NotFound("submission"))
    }
}

/// Mutex-guarded store; every conditional write runs under a single lock.
#[derive(Debug, Default)]
pub struct InMemoryAssessmentRepository {
    tables: Mutex<Tables>,
}

impl InMemoryAssessmentRepository {
    fn tables(&self) -> Result<MutexGuard<'_, Tables>, RepositoryError> {
        self.tables
            .lock()
            .map_err(|_| RepositoryError::Unavailable("store lock poisoned".to_string()))
    }
}

impl AssessmentRepository for InMemoryAssessmentRepository {
    fn insert_problem(&self, problem: ProblemRecord) -> Result<ProblemRecord, RepositoryError> {
        let mut tables = self.tables()?;
        if tables.problems.contains_key(&problem.id) {
            return Err(ConflictError::Duplicate.into());
        }
        tables.problems.insert(problem.id.clone(), problem.clone());
        Ok(problem)
    }

    fn fetch_problem(&self, id: &ProblemId) -> Result<Option<ProblemRecord>, RepositoryError> {
        Ok(self.tables()?.problems.get(id).cloned())
    }

    fn insert_candidate(
        &self,
        record: CandidateRecord,
    ) -> Result<CandidateRecord, RepositoryError> {
        let mut tables = self.tables()?;
        if tables.candidates.contains_key(&record.id) {
            return Err(ConflictError::Duplicate.into());
        }
        if tables.email_taken(&record.profile.email, None) {
            return Err(ConflictError::EmailTaken(record.profile.email).into());
        }
        tables.candidates.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    fn fetch_candidate(
        &self,
        id: &CandidateId,
    ) -> Result<Option<CandidateRecord>, RepositoryError> {
        Ok(self.tables()?.candidates.get(id).cloned())
    }

    fn find_candidate_by_email(
        &self,
        email: &str,
    ) -> Result<Option<CandidateRecord>, RepositoryError> {
        let email = email.trim();
        Ok(self
            .tables()?
            .candidates
            .values()
            .find(|candidate| candidate.profile.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    fn list_candidates(&self) -> Result<Vec<CandidateRecord>, RepositoryError> {
        Ok(self.tables()?.candidates.values().cloned().collect())
    }

    fn update_profile(
        &self,
        id: &CandidateId,
        profile: CandidateProfile,
    ) -> Result<CandidateRecord, RepositoryError> {
        let mut tables = self.tables()?;
        if tables.email_taken(&profile.email, Some(id)) {
            return Err(ConflictError::EmailTaken(profile.email).into());
        }
        let candidate = tables.candidate_mut(id)?;
        lifecycle::check_profile_edit(candidate, &profile)?;
        candidate.profile = profile;
        Ok(candidate.clone())
    }

    fn replace_access_code(
        &self,
        id: &CandidateId,
        code: AccessCode,
    ) -> Result<CandidateRecord, RepositoryError> {
        let mut tables = self.tables()?;
        let candidate = tables.candidate_mut(id)?;
        candidate.access_code = code;
        Ok(candidate.clone())
    }

    fn delete_candidate(&self, id: &CandidateId) -> Result<CandidateRecord, RepositoryError> {
        let mut tables = self.tables()?;
        let removed = tables
            .candidates
            .remove(id)
            .ok_or(RepositoryError::NotFound("candidate"))?;
        if let Some(submission_id) = &removed.progress.submission_id {
            tables.submissions.remove(submission_id);
        }
        Ok(removed)
    }

    fn mark_started(
        &self,
        id: &CandidateId,
        started_at: DateTime<Utc>,
    ) -> Result<CandidateRecord, RepositoryError> {
        let mut tables = self.tables()?;
        let candidate = tables.candidate_mut(id)?;
        let recorded = lifecycle::start(candidate, started_at)?;
        candidate.progress.start_time = Some(recorded);
        Ok(candidate.clone())
    }

    fn record_submission(
        &self,
        submission: SubmissionRecord,
    ) -> Result<CandidateRecord, RepositoryError> {
        let mut tables = self.tables()?;
        if tables.submissions.contains_key(&submission.id) {
            return Err(ConflictError::Duplicate.into());
        }

        let candidate = tables.candidate_mut(&submission.candidate_id)?;
        lifecycle::check_submittable(candidate, submission.submitted_at)?;
        candidate.progress.submission_time = Some(submission.submitted_at);
        candidate.progress.submission_id = Some(submission.id.clone());
        let updated = candidate.clone();

        tables.submissions.insert(submission.id.clone(), submission);
        Ok(updated)
    }

    fn fetch_submission(
        &self,
        id: &SubmissionId,
    ) -> Result<Option<SubmissionRecord>, RepositoryError> {
        Ok(self.tables()?.submissions.get(id).cloned())
    }

    fn list_submissions(&self) -> Result<Vec<SubmissionRecord>, RepositoryError> {
        Ok(self.tables()?.submissions.values().cloned().collect())
    }

    fn append_remark(
        &self,
        id: &SubmissionId,
        remark: Remark,
    ) -> Result<SubmissionRecord, RepositoryError> {
        let mut tables = self.tables()?;
        let submission = tables.submission_mut(id)?;
        review::append_remark(submission, remark)?;
        Ok(submission.clone())
    }

    fn set_recommendation(
        &self,
        id: &SubmissionId,
        recommended: bool,
    ) -> Result<SubmissionRecord, RepositoryError> {
        let mut tables = self.tables()?;
        let submission = tables.submission_mut(id)?;
        submission.recommended_for_next_step = recommended;
        Ok(submission.clone())
    }

    fn apply_review(
        &self,
        id: &SubmissionId,
        remark: Option<Remark>,
        recommended: Option<bool>,
    ) -> Result<SubmissionRecord, RepositoryError> {
        let mut tables = self.tables()?;
        let submission = tables.submission_mut(id)?;
        if let Some(remark) = remark {
            review::append_remark(submission, remark)?;
        }
        if let Some(recommended) = recommended {
            submission.recommended_for_next_step = recommended;
        }
        Ok(submission.clone())
    }
}
