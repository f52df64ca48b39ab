//! Client, grant and scope validation.
//!
//! ## NIST 800-53 Rev5: AC-3 (Access Enforcement)
//!
//! A client may only use the grant types, response types, redirection URLs
//! and scopes it registered.

use std::sync::Arc;

use idp_model::{Client, GrantType, ResponseType};
use idp_storage::{ClientRepository, ScopeRepository};

use crate::error::{AuthError, AuthResult};
use crate::parameter::AuthorizationParameter;
use crate::pkce::PkceVerifier;
use crate::types::scope_names;

/// Validates the client of an authorization request.
pub struct ClientValidator {
    clients: Arc<dyn ClientRepository>,
}

impl ClientValidator {
    /// Creates a validator backed by the client repository.
    #[must_use]
    pub fn new(clients: Arc<dyn ClientRepository>) -> Self {
        Self { clients }
    }

    /// Checks that the client may use every `required` grant type.
    ///
    /// A client without registered grant types only supports
    /// `authorization_code`.
    #[must_use]
    pub fn check_grant_types(client: &Client, required: &[GrantType]) -> bool {
        if client.grant_types.is_empty() {
            return !required.is_empty() && required.iter().all(|g| *g == GrantType::AuthorizationCode);
        }
        required.iter().all(|g| client.grant_types.contains(g))
    }

    /// Checks that the client registered every requested response type.
    #[must_use]
    pub fn check_response_types(client: &Client, requested: &[ResponseType]) -> bool {
        requested.iter().all(|t| client.supports_response_type(*t))
    }

    /// Returns the registered redirection URL equal to `url`.
    #[must_use]
    pub fn redirection_url<'a>(client: &'a Client, url: &str) -> Option<&'a str> {
        client
            .redirection_urls
            .iter()
            .find(|u| *u == url)
            .map(String::as_str)
    }

    /// Resolves the client and checks the redirection URL and PKCE.
    ///
    /// # Errors
    ///
    /// - `invalid_client` if the client is unknown
    /// - `invalid_request` if the redirection URL is malformed or not
    ///   registered, or the client requires PKCE and no valid challenge was
    ///   sent
    pub async fn validate(&self, parameter: &AuthorizationParameter) -> AuthResult<Client> {
        let state = parameter.state();
        if url::Url::parse(&parameter.redirect_uri).is_err() {
            return Err(AuthError::invalid_request(
                "Based on the RFC-3986 the redirection-uri is not well formed",
            )
            .with_state(state));
        }

        let client = self
            .clients
            .get_by_client_id(&parameter.client_id)
            .await
            .map_err(|e| AuthError::from(e).with_state(state))?
            .ok_or_else(|| {
                AuthError::invalid_client(format!(
                    "the client id parameter {} doesn't exist or is not valid",
                    parameter.client_id
                ))
                .with_state(state)
            })?;

        if Self::redirection_url(&client, &parameter.redirect_uri).is_none() {
            return Err(AuthError::invalid_request(format!(
                "the redirect url {} doesn't exist or is not valid",
                parameter.redirect_uri
            ))
            .with_state(state));
        }

        match parameter.code_challenge.as_deref() {
            Some(challenge) => {
                PkceVerifier::validate_challenge(challenge).map_err(|e| e.with_state(state))?;
            }
            None if client.require_pkce => {
                return Err(AuthError::invalid_request(format!(
                    "the client {} requires PKCE",
                    client.client_id
                ))
                .with_state(state));
            }
            None => {}
        }

        tracing::debug!(client_id = %client.client_id, "client validated");
        Ok(client)
    }
}

/// Validates requested scopes against the client and the scope repository.
pub struct ScopeValidator {
    scopes: Arc<dyn ScopeRepository>,
}

impl ScopeValidator {
    /// Creates a validator backed by the scope repository.
    #[must_use]
    pub fn new(scopes: Arc<dyn ScopeRepository>) -> Self {
        Self { scopes }
    }

    /// Checks the requested scopes.
    ///
    /// # Errors
    ///
    /// Returns `invalid_scope` when a scope is repeated, not allowed for the
    /// client or unknown, or when `openid` is missing.
    pub async fn check(&self, requested: &[String], client: &Client) -> AuthResult<()> {
        let mut seen: Vec<&str> = Vec::new();
        let mut duplicates: Vec<&str> = Vec::new();
        for scope in requested {
            if seen.contains(&scope.as_str()) {
                if !duplicates.contains(&scope.as_str()) {
                    duplicates.push(scope);
                }
            } else {
                seen.push(scope);
            }
        }
        if !duplicates.is_empty() {
            return Err(AuthError::invalid_scope(format!(
                "duplicate scopes {} have been passed in parameter",
                duplicates.join(",")
            )));
        }

        let known: Vec<String> = self
            .scopes
            .search_by_names(requested)
            .await?
            .into_iter()
            .map(|s| s.name)
            .collect();
        let rejected: Vec<&str> = seen
            .iter()
            .copied()
            .filter(|s| !client.allowed_scopes.iter().any(|a| a == s) || !known.iter().any(|k| k == s))
            .collect();
        if !rejected.is_empty() {
            return Err(AuthError::invalid_scope(format!(
                "the scopes {} are not allowed or invalid",
                rejected.join(",")
            )));
        }

        if !seen.contains(&scope_names::OPENID) {
            return Err(AuthError::invalid_scope(format!(
                "the scope(s) {} need(s) to be specified",
                scope_names::OPENID
            )));
        }
        Ok(())
    }
}
