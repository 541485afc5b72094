//! Per-request session context for clinician views.

use serde::{Deserialize, Serialize};

use crate::error::{RecoveryError, Result};

/// Role attached to an authenticated session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Care-team member allowed to see every patient
    Clinician,
    /// App user; sees only their own conversation
    Patient,
}

/// Identity of whoever is asking for a view
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionContext {
    /// Stable user identifier
    pub user_id: String,
    /// Sign-in email
    pub email: String,
    /// Display name
    pub name: String,
    /// What the session may see
    pub role: Role,
    /// Care-team identifier, clinicians only
    pub clinician_id: Option<String>,
    /// Clinic department, if known
    pub department: Option<String>,
}

impl SessionContext {
    /// A clinician session
    #[must_use]
    pub fn clinician(user_id: &str, email: &str, name: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            email: email.to_string(),
            name: name.to_string(),
            role: Role::Clinician,
            clinician_id: Some(user_id.to_string()),
            department: None,
        }
    }

    /// A patient session
    #[must_use]
    pub fn patient(user_id: &str, email: &str, name: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            email: email.to_string(),
            name: name.to_string(),
            role: Role::Patient,
            clinician_id: None,
            department: None,
        }
    }

    /// Local session used by the command-line tools
    #[must_use]
    pub fn local_operator() -> Self {
        let mut session = Self::clinician("local", "operator@localhost", "Local operator");
        session.department = Some("Recovery Services".to_string());
        session
    }

    /// Attach a department
    #[must_use]
    pub fn with_department(mut self, department: &str) -> Self {
        self.department = Some(department.to_string());
        self
    }

    /// True for clinician sessions
    #[must_use]
    pub fn is_clinician(&self) -> bool {
        self.role == Role::Clinician
    }

    /// Fail with `Unauthorized` unless this is a clinician session
    pub fn require_clinician(&self) -> Result<()> {
        if self.is_clinician() {
            Ok(())
        } else {
            Err(RecoveryError::Unauthorized(format!(
                "user {} is not a clinician",
                self.user_id
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clinician_passes() {
        let session = SessionContext::clinician("c-1", "doc@example.org", "Dr. Lee").with_department("Addiction Medicine");
        assert!(session.require_clinician().is_ok());
        assert_eq!(session.department.as_deref(), Some("Addiction Medicine"));
    }

    #[test]
    fn test_patient_rejected() {
        let session = SessionContext::patient("p-1", "pat@example.org", "Pat");
        assert!(matches!(session.require_clinician(), Err(RecoveryError::Unauthorized(_))));
    }
}
