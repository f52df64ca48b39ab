//! Resolution of resource owner claims.
//!
//! Claims reach a token in one of two ways: released by the requested
//! scopes, or named explicitly by the `claims` request parameter. In the
//! second case only standard resource owner claims are honoured, `sub` is
//! always included, and every value must satisfy the request's
//! `essential` / `value` / `values` constraints.

use std::sync::Arc;

use idp_storage::ScopeRepository;
use serde_json::Value;

use crate::error::{AuthError, AuthResult};
use crate::jwt::JwsPayload;
use crate::parameter::ClaimParameter;
use crate::principal::Principal;
use crate::types::claim_names;

/// Claims holding several values. The principal stores them comma separated.
const MULTI_VALUED: &[&str] = &["role"];

/// Resolves claim values for scopes and claim requests.
#[derive(Clone)]
pub struct ClaimsResolver {
    scopes: Arc<dyn ScopeRepository>,
}

impl ClaimsResolver {
    /// Creates a resolver backed by the scope repository.
    #[must_use]
    pub fn new(scopes: Arc<dyn ScopeRepository>) -> Self {
        Self { scopes }
    }

    /// Returns the principal's claims released by `scopes`.
    ///
    /// Unknown scopes and scopes that are not OpenID scopes release nothing;
    /// claims the principal does not hold are skipped.
    ///
    /// # Errors
    ///
    /// Returns `server_error` if the scope repository fails.
    pub async fn claims_for_scopes(&self, scopes: &[String], principal: &Principal) -> AuthResult<JwsPayload> {
        let mut names: Vec<String> = vec![claim_names::SUBJECT.to_string()];
        let found = self.scopes.search_by_names(scopes).await?;
        for scope in found.into_iter().filter(|s| s.is_openid_scope) {
            for claim in scope.claims {
                if !names.contains(&claim) {
                    names.push(claim);
                }
            }
        }

        let mut payload = JwsPayload::new();
        for name in names {
            if let Some(value) = claim_value(principal, &name) {
                payload.add(name, value)?;
            }
        }
        Ok(payload)
    }

    /// Returns the principal's claims named by a claims request.
    ///
    /// # Errors
    ///
    /// Returns `invalid_grant` "the claim {name} is not valid" when a value
    /// does not satisfy its request.
    pub fn filtered_claims(&self, requested: &[ClaimParameter], principal: &Principal) -> AuthResult<JwsPayload> {
        let mut payload = JwsPayload::new();
        for claim in resource_owner_claims(requested) {
            let value = claim_value(principal, &claim.name);
            if !is_satisfied(&claim, value.as_ref()) {
                return Err(invalid_claim(&claim.name));
            }
            if let Some(value) = value {
                payload.add(claim.name, value)?;
            }
        }
        Ok(payload)
    }
}

/// Keeps the standard resource owner claims of a request and makes `sub`
/// essential, adding it when absent.
fn resource_owner_claims(requested: &[ClaimParameter]) -> Vec<ClaimParameter> {
    let mut claims: Vec<ClaimParameter> = requested
        .iter()
        .filter(|c| claim_names::is_resource_owner_claim(&c.name))
        .cloned()
        .collect();

    match claims.iter_mut().find(|c| c.name == claim_names::SUBJECT) {
        Some(sub) => sub.essential = Some(true),
        None => claims.insert(0, ClaimParameter::essential(claim_names::SUBJECT)),
    }
    claims
}

fn claim_value(principal: &Principal, name: &str) -> Option<Value> {
    let raw = principal.claim(name)?;
    if MULTI_VALUED.contains(&name) {
        let values: Vec<Value> = raw
            .split(',')
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(Value::from)
            .collect();
        return Some(Value::Array(values));
    }
    Some(Value::from(raw))
}

/// Checks a resolved claim value against its request.
pub(crate) fn is_satisfied(claim: &ClaimParameter, value: Option<&Value>) -> bool {
    match value {
        Some(Value::Array(items)) => {
            let items: Vec<String> = items.iter().map(value_to_string).collect();
            claim.is_satisfied_by_all(&items)
        }
        Some(other) => claim.is_satisfied_by(&value_to_string(other)),
        None => claim.is_satisfied_by(""),
    }
}

fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

pub(crate) fn invalid_claim(name: &str) -> AuthError {
    AuthError::invalid_grant(format!("the claim {name} is not valid"))
}
