//! JWS payload.

use idp_model::ClaimSet;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::JwtError;
use crate::types::claim_names;

/// Claim set carried by a JWS.
///
/// Claims are added once: adding a name that is already present is an
/// error rather than an overwrite.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JwsPayload(ClaimSet);

impl JwsPayload {
    /// Creates an empty payload.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a claim.
    ///
    /// # Errors
    ///
    /// Returns `JwtError::DuplicateClaim` if the claim is already present.
    pub fn add(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Result<(), JwtError> {
        let name = name.into();
        if self.0.contains_key(&name) {
            return Err(JwtError::DuplicateClaim(name));
        }
        self.0.insert(name, value.into());
        Ok(())
    }

    /// Returns a claim.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// Returns a string claim.
    #[must_use]
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.0.get(name).and_then(Value::as_str)
    }

    /// Returns whether the claim is present.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// Returns the `sub` claim.
    #[must_use]
    pub fn subject(&self) -> Option<&str> {
        self.get_str(claim_names::SUBJECT)
    }

    /// Returns the `aud` claim, which may be a string or an array.
    #[must_use]
    pub fn audiences(&self) -> Vec<String> {
        match self.0.get(claim_names::AUDIENCES) {
            Some(Value::String(aud)) => vec![aud.clone()],
            Some(Value::Array(auds)) => auds
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Number of claims.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns whether the payload is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Borrows the claim set.
    #[must_use]
    pub const fn claims(&self) -> &ClaimSet {
        &self.0
    }

    /// Consumes the payload into its claim set.
    #[must_use]
    pub fn into_claims(self) -> ClaimSet {
        self.0
    }
}

impl From<ClaimSet> for JwsPayload {
    fn from(claims: ClaimSet) -> Self {
        Self(claims)
    }
}
