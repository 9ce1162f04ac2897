use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::ValidationError;
use crate::access::AccessCode;

/// Identifier wrapper for invited candidates.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CandidateId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProblemId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubmissionId(pub String);

/// Named language or framework a problem must be answered in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TechnologyStack(pub String);

impl TechnologyStack {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into().trim().to_string())
    }

    /// Stack names compare case-insensitively ("Rust" answers "rust").
    pub fn same_as(&self, other: &TechnologyStack) -> bool {
        self.0.trim().eq_ignore_ascii_case(other.0.trim())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

/// Coding problem a candidate is assigned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProblemRecord {
    pub id: ProblemId,
    pub title: String,
    /// Markdown source, stored and served verbatim.
    pub statement: String,
    pub required_stacks: Vec<TechnologyStack>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProblem {
    pub title: String,
    #[serde(default)]
    pub statement: String,
    pub required_stacks: Vec<TechnologyStack>,
}

impl NewProblem {
    pub(crate) fn validate(self) -> Result<NewProblem, ValidationError> {
        let title = non_empty("title", &self.title)?;
        if self.required_stacks.is_empty() {
            return Err(ValidationError::NoRequiredStacks);
        }

        let mut stacks: Vec<TechnologyStack> = Vec::with_capacity(self.required_stacks.len());
        for stack in self.required_stacks {
            let stack = TechnologyStack::new(stack.0);
            if stack.0.is_empty() {
                return Err(ValidationError::EmptyField("technology stack"));
            }
            if stacks.iter().any(|known| known.same_as(&stack)) {
                return Err(ValidationError::DuplicateStack(stack.0));
            }
            stacks.push(stack);
        }

        Ok(NewProblem {
            title,
            statement: self.statement,
            required_stacks: stacks,
        })
    }
}

/// Where the candidate is being hired and what they have to solve.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    pub department: String,
    pub position: String,
    pub problem_id: ProblemId,
}

/// Admin-editable part of a candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateProfile {
    pub name: String,
    pub email: String,
    pub assignment: Assignment,
    pub scheduled_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

/// Progress markers written by the candidate. Each is set at most once.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestProgress {
    pub start_time: Option<DateTime<Utc>>,
    pub submission_time: Option<DateTime<Utc>>,
    pub submission_id: Option<SubmissionId>,
}

/// Repository record for an invited candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateRecord {
    pub id: CandidateId,
    pub profile: CandidateProfile,
    pub access_code: AccessCode,
    pub progress: TestProgress,
    pub created_at: DateTime<Utc>,
}

/// Invitation payload submitted by an admin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCandidate {
    pub name: String,
    pub email: String,
    pub department: String,
    pub position: String,
    pub problem_id: ProblemId,
    pub scheduled_time: DateTime<Utc>,
}

/// Partial edit of a candidate; absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateChanges {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub position: Option<String>,
    #[serde(default)]
    pub problem_id: Option<ProblemId>,
    #[serde(default)]
    pub scheduled_time: Option<DateTime<Utc>>,
}

/// One code answer for one technology stack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeAnswer {
    pub technology: TechnologyStack,
    pub code: String,
}

/// Identity a remark is recorded under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewerIdentity {
    pub id: String,
    pub name: String,
}

/// Immutable reviewer feedback entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Remark {
    pub reviewer: ReviewerIdentity,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

/// A candidate's submitted answers plus the review trail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionRecord {
    pub id: SubmissionId,
    pub candidate_id: CandidateId,
    pub problem_id: ProblemId,
    pub answers: Vec<CodeAnswer>,
    pub remarks: Vec<Remark>,
    pub recommended_for_next_step: bool,
    pub submitted_at: DateTime<Utc>,
}

pub(crate) fn non_empty(field: &'static str, value: &str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(ValidationError::EmptyField(field))
    } else {
        Ok(trimmed.to_string())
    }
}

/// Light shape check: one `@` with something on both sides and a dotted domain.
pub(crate) fn normalize_email(value: &str) -> Result<String, ValidationError> {
    let email = non_empty("email", value)?;
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    };

    if valid && !email.contains(char::is_whitespace) {
        Ok(email)
    } else {
        Err(ValidationError::InvalidEmail(email))
    }
}
