//! The resource owner behind an authorization request.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Resource owner as seen by the authorization endpoint.
///
/// The host authenticates the user agent and hands the result over; the
/// core never authenticates anyone itself.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    /// Subject identifier. Empty for an anonymous principal.
    pub subject: String,
    /// Whether the user agent carries an authenticated session.
    pub authenticated: bool,
    /// When the resource owner authenticated, in unix seconds.
    pub auth_instant: Option<i64>,
    /// `OpenID` claim values keyed by claim name.
    pub claims: BTreeMap<String, String>,
}

impl Principal {
    /// Creates an unauthenticated principal.
    #[must_use]
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Creates an authenticated principal.
    #[must_use]
    pub fn authenticated(subject: impl Into<String>, auth_instant: i64) -> Self {
        Self {
            subject: subject.into(),
            authenticated: true,
            auth_instant: Some(auth_instant),
            claims: BTreeMap::new(),
        }
    }

    /// Adds a claim value.
    #[must_use]
    pub fn with_claim(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.claims.insert(name.into(), value.into());
        self
    }

    /// Returns whether the principal is authenticated.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    /// Returns a claim value. `sub` resolves to the subject.
    #[must_use]
    pub fn claim(&self, name: &str) -> Option<&str> {
        if name == crate::types::claim_names::SUBJECT && !self.subject.is_empty() {
            return Some(&self.subject);
        }
        self.claims.get(name).map(String::as_str)
    }
}
