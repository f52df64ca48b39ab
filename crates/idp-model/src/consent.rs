//! Consent domain model.

use serde::{Deserialize, Serialize};

/// Scopes and claims a resource owner granted to a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Consent {
    /// Consent identifier.
    pub id: String,
    /// Subject of the resource owner.
    pub subject: String,
    /// Client the consent was given to.
    pub client_id: String,
    /// Granted scope names.
    pub granted_scopes: Vec<String>,
    /// Granted claim names, when consent was given per claim.
    pub claims: Vec<String>,
}

impl Consent {
    /// Checks whether every scope in `scopes` was granted.
    #[must_use]
    pub fn covers_scopes<S: AsRef<str>>(&self, scopes: &[S]) -> bool {
        scopes
            .iter()
            .all(|s| self.granted_scopes.iter().any(|g| g == s.as_ref()))
    }

    /// Checks whether every claim in `claims` was granted.
    #[must_use]
    pub fn covers_claims<S: AsRef<str>>(&self, claims: &[S]) -> bool {
        claims
            .iter()
            .all(|c| self.claims.iter().any(|g| g == c.as_ref()))
    }
}
