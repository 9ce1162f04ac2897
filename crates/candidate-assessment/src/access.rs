//! Principals, access codes, and bearer-token sessions.
//!
//! Every service operation receives an explicit [`Principal`]; nothing reads
//! ambient session state.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::assessment::domain::CandidateId;
use crate::assessment::AssessmentError;

pub const ACCESS_CODE_LENGTH: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Interviewer,
    Candidate,
}

impl Role {
    pub const fn label(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Interviewer => "interviewer",
            Role::Candidate => "candidate",
        }
    }

    /// Staff roles only; candidates authenticate with an access code instead.
    pub fn staff_from_str(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "admin" => Some(Role::Admin),
            "interviewer" => Some(Role::Interviewer),
            _ => None,
        }
    }

    pub const fn is_staff(self) -> bool {
        matches!(self, Role::Admin | Role::Interviewer)
    }
}

/// Authenticated caller of a service operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub id: String,
    pub display_name: String,
    pub role: Role,
}

impl Principal {
    pub fn admin(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            role: Role::Admin,
        }
    }

    pub fn interviewer(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            role: Role::Interviewer,
        }
    }

    pub fn candidate(id: &CandidateId, display_name: impl Into<String>) -> Self {
        Self {
            id: id.0.clone(),
            display_name: display_name.into(),
            role: Role::Candidate,
        }
    }

    pub fn require_admin(&self) -> Result<(), AssessmentError> {
        match self.role {
            Role::Admin => Ok(()),
            _ => Err(AssessmentError::Forbidden),
        }
    }

    pub fn require_staff(&self) -> Result<(), AssessmentError> {
        if self.role.is_staff() {
            Ok(())
        } else {
            Err(AssessmentError::Forbidden)
        }
    }

    /// The candidate this principal acts as.
    pub fn require_candidate(&self) -> Result<CandidateId, AssessmentError> {
        match self.role {
            Role::Candidate => Ok(CandidateId(self.id.clone())),
            _ => Err(AssessmentError::Forbidden),
        }
    }
}

/// Staff login provisioned through configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaffCredential {
    pub token: String,
    pub role: Role,
    pub display_name: String,
}

/// Short random credential issued to a candidate in lieu of a password.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccessCode(pub String);

impl AccessCode {
    pub fn generate() -> Self {
        let code = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(ACCESS_CODE_LENGTH)
            .map(char::from)
            .collect();
        Self(code)
    }

    pub fn matches(&self, presented: &str) -> bool {
        self.0 == presented.trim()
    }
}

/// In-memory bearer-token registry.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: Mutex<HashMap<String, Principal>>,
}

impl SessionRegistry {
    /// Staff ids carry the credential's position so namesakes stay distinct reviewers.
    pub fn with_staff(staff: &[StaffCredential]) -> Self {
        let registry = Self::default();
        for (index, credential) in staff.iter().enumerate() {
            let principal = Principal {
                id: format!("staff-{}:{}", index + 1, credential.display_name),
                display_name: credential.display_name.clone(),
                role: credential.role,
            };
            registry.insert(credential.token.clone(), principal);
        }
        registry
    }

    /// Opens a session for the principal and returns its bearer token.
    pub fn open(&self, principal: Principal) -> String {
        let token = Uuid::new_v4().to_string();
        self.insert(token.clone(), principal);
        token
    }

    pub fn resolve(&self, token: &str) -> Result<Principal, AssessmentError> {
        self.sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(token)
            .cloned()
            .ok_or(AssessmentError::Unauthorized)
    }

    /// Drops every session held by the given candidate.
    pub fn revoke_candidate(&self, candidate: &CandidateId) -> usize {
        let mut sessions = self.sessions.lock().unwrap_or_else(PoisonError::into_inner);
        let before = sessions.len();
        sessions.retain(|_, principal| {
            !(principal.role == Role::Candidate && principal.id == candidate.0)
        });
        before - sessions.len()
    }

    fn insert(&self, token: String, principal: Principal) {
        self.sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(token, principal);
    }
}
