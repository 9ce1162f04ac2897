use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{non_empty, Remark, ReviewerIdentity, SubmissionRecord};
use super::error::{ConflictError, ValidationError};
use crate::access::Principal;

/// Review outcome shown next to a submission.
///
/// The recommendation flag is set directly by reviewers; remarks only decide
/// whether a submission without the flag is still pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RecommendationStatus {
    Pending,
    NotRecommended,
    Recommended,
}

impl RecommendationStatus {
    pub fn of(submission: &SubmissionRecord) -> Self {
        if submission.recommended_for_next_step {
            RecommendationStatus::Recommended
        } else if submission.remarks.is_empty() {
            RecommendationStatus::Pending
        } else {
            RecommendationStatus::NotRecommended
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            RecommendationStatus::Pending => "pending",
            RecommendationStatus::NotRecommended => "not-recommended",
            RecommendationStatus::Recommended => "recommended",
        }
    }
}

impl From<&Principal> for ReviewerIdentity {
    fn from(principal: &Principal) -> Self {
        Self {
            id: principal.id.clone(),
            name: principal.display_name.clone(),
        }
    }
}

pub fn draft_remark(
    reviewer: &Principal,
    text: &str,
    now: DateTime<Utc>,
) -> Result<Remark, ValidationError> {
    Ok(Remark {
        reviewer: ReviewerIdentity::from(reviewer),
        text: non_empty("remark text", text)?,
        created_at: now,
    })
}

pub fn has_remark_from(submission: &SubmissionRecord, reviewer: &ReviewerIdentity) -> bool {
    submission
        .remarks
        .iter()
        .any(|remark| remark.reviewer.id == reviewer.id)
}

/// Appends in place; one remark per reviewer identity.
pub fn append_remark(submission: &mut SubmissionRecord, remark: Remark) -> Result<(), ConflictError> {
    if has_remark_from(submission, &remark.reviewer) {
        return Err(ConflictError::DuplicateRemark(remark.reviewer.name));
    }
    submission.remarks.push(remark);
    Ok(())
}
