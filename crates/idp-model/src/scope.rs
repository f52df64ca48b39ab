//! Scope domain model.

use serde::{Deserialize, Serialize};

/// A scope a client may request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scope {
    /// Scope name, as it appears in the `scope` parameter.
    pub name: String,
    /// Whether the scope releases resource owner claims. Claims listed on
    /// other scopes are ignored.
    pub is_openid_scope: bool,
    /// Claim names released by the scope.
    pub claims: Vec<String>,
}

impl Scope {
    /// Creates a scope that releases the given claims.
    #[must_use]
    pub fn openid<S: Into<String>>(name: impl Into<String>, claims: impl IntoIterator<Item = S>) -> Self {
        Self {
            name: name.into(),
            is_openid_scope: true,
            claims: claims.into_iter().map(Into::into).collect(),
        }
    }

    /// Creates an API scope that releases no claims.
    #[must_use]
    pub fn resource(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_openid_scope: false,
            claims: Vec::new(),
        }
    }
}
