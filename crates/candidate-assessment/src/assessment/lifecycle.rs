//! Candidate test-window lifecycle.
//!
//! The state is never stored. It is derived from the candidate's timestamps at
//! read time, and each transition checks the derived state before anything is
//! written:
//!
//! ```text
//! Locked --(scheduled time passes)--> Startable --start--> InProgress --submit--> Submitted
//! ```

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{CandidateProfile, CandidateRecord, CodeAnswer, ProblemRecord};
use super::error::{ConflictError, ValidationError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    Locked,
    Startable,
    InProgress,
    Submitted,
}

impl LifecycleState {
    pub fn at(candidate: &CandidateRecord, now: DateTime<Utc>) -> Self {
        let progress = &candidate.progress;
        if progress.submission_time.is_some() {
            LifecycleState::Submitted
        } else if progress.start_time.is_some() {
            LifecycleState::InProgress
        } else if now < candidate.profile.scheduled_time {
            LifecycleState::Locked
        } else {
            LifecycleState::Startable
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            LifecycleState::Locked => "locked",
            LifecycleState::Startable => "startable",
            LifecycleState::InProgress => "in_progress",
            LifecycleState::Submitted => "submitted",
        }
    }
}

pub fn end_time_for(scheduled_time: DateTime<Utc>, window: Duration) -> DateTime<Utc> {
    scheduled_time + window
}

/// Returns the start time to record for a candidate asking to start at `now`.
pub fn start(candidate: &CandidateRecord, now: DateTime<Utc>) -> Result<DateTime<Utc>, ConflictError> {
    match LifecycleState::at(candidate, now) {
        LifecycleState::Startable => Ok(now),
        LifecycleState::Locked => Err(ConflictError::NotYetOpen {
            opens_at: candidate.profile.scheduled_time,
        }),
        LifecycleState::InProgress | LifecycleState::Submitted => {
            Err(ConflictError::AlreadyStarted)
        }
    }
}

/// Checks the candidate may submit and returns the answer set in the problem's stack order.
pub fn submit(
    candidate: &CandidateRecord,
    problem: &ProblemRecord,
    answers: Vec<CodeAnswer>,
    now: DateTime<Utc>,
) -> Result<Vec<CodeAnswer>, SubmitRejection> {
    check_submittable(candidate, now)?;
    Ok(validate_answers(problem, answers)?)
}

/// A submission needs a running test and may not be timestamped before its start.
pub fn check_submittable(candidate: &CandidateRecord, now: DateTime<Utc>) -> Result<(), ConflictError> {
    match LifecycleState::at(candidate, now) {
        LifecycleState::InProgress => {}
        LifecycleState::Locked | LifecycleState::Startable => return Err(ConflictError::NotStarted),
        LifecycleState::Submitted => return Err(ConflictError::AlreadySubmitted),
    }

    match candidate.progress.start_time {
        Some(started_at) if now < started_at => Err(ConflictError::SubmittedBeforeStart { started_at }),
        _ => Ok(()),
    }
}

/// Exactly one answer per required stack; nothing else.
pub fn validate_answers(
    problem: &ProblemRecord,
    answers: Vec<CodeAnswer>,
) -> Result<Vec<CodeAnswer>, ValidationError> {
    for (index, answer) in answers.iter().enumerate() {
        if !problem
            .required_stacks
            .iter()
            .any(|stack| stack.same_as(&answer.technology))
        {
            return Err(ValidationError::UnexpectedAnswer(answer.technology.0.clone()));
        }
        if answers[..index]
            .iter()
            .any(|earlier| earlier.technology.same_as(&answer.technology))
        {
            return Err(ValidationError::DuplicateAnswer(answer.technology.0.clone()));
        }
    }

    let mut answers = answers;
    let mut ordered = Vec::with_capacity(problem.required_stacks.len());
    for stack in &problem.required_stacks {
        let position = answers
            .iter()
            .position(|answer| answer.technology.same_as(stack))
            .ok_or_else(|| ValidationError::MissingAnswer(stack.0.clone()))?;
        let answer = answers.swap_remove(position);
        ordered.push(CodeAnswer {
            technology: stack.clone(),
            code: answer.code,
        });
    }

    Ok(ordered)
}

/// Rejects edits that would move the goalposts for a candidate who already started.
pub fn check_profile_edit(
    current: &CandidateRecord,
    proposed: &CandidateProfile,
) -> Result<(), ConflictError> {
    let started = current.progress.start_time.is_some();
    let rescheduled = current.profile.scheduled_time != proposed.scheduled_time
        || current.profile.assignment.problem_id != proposed.assignment.problem_id;

    if started && rescheduled {
        Err(ConflictError::ScheduleLocked)
    } else {
        Ok(())
    }
}

/// Why a submit attempt was refused.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubmitRejection {
    #[error(transparent)]
    Conflict(#[from] ConflictError),
    #[error(transparent)]
    Invalid(#[from] ValidationError),
}

/// Wall-clock time a candidate spent on the test, shown as `HH:MM:SS`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ElapsedTime {
    seconds: i64,
}

impl ElapsedTime {
    /// Clamped at zero so a skewed record never renders a negative duration.
    pub fn between(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            seconds: (end - start).num_seconds().max(0),
        }
    }

    /// Final time for a submitted test, or the running time while it is in progress.
    pub fn for_candidate(candidate: &CandidateRecord, now: DateTime<Utc>) -> Option<Self> {
        let start = candidate.progress.start_time?;
        let end = candidate.progress.submission_time.unwrap_or(now);
        Some(Self::between(start, end))
    }

    pub const fn as_seconds(self) -> i64 {
        self.seconds
    }
}

impl fmt::Display for ElapsedTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hours = self.seconds / 3600;
        let minutes = (self.seconds % 3600) / 60;
        let seconds = self.seconds % 60;
        write!(f, "{hours:02}:{minutes:02}:{seconds:02}")
    }
}

impl Serialize for ElapsedTime {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}
