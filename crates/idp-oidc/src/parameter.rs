//! Authorization request parameters.
//!
//! [`AuthorizationRequest`] is the request as it arrives on the wire: every
//! member optional and untyped. [`AuthorizationParameter`] is the validated,
//! typed form the rest of the pipeline works on. Converting one into the
//! other performs the syntactic checks of the authorization endpoint
//! (RFC 6749 Section 4.1.1, OIDC Core Section 3.1.2.1); checks that need the
//! client happen in [`crate::validator::ClientValidator`].

use std::collections::BTreeSet;

use idp_model::{CodeChallengeMethod, ResponseType};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{AuthError, AuthResult};
use crate::types::{parameter_names, Prompt, ResponseMode};

/// Authorization endpoint request, as received.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationRequest {
    /// Client ID.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,

    /// Response types (space-separated).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_type: Option<String>,

    /// Scopes (space-separated).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,

    /// Redirection URI.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_uri: Option<String>,

    /// Opaque client state.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,

    /// Replay protection value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nonce: Option<String>,

    /// Prompt values (space-separated).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,

    /// Maximum authentication age in seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_age: Option<String>,

    /// Previously issued identity token.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id_token_hint: Option<String>,

    /// Claims request (JSON).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub claims: Option<String>,

    /// Response mode.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_mode: Option<String>,

    /// Authentication methods references (space-separated).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amr_values: Option<String>,

    // === PKCE Parameters ===
    /// PKCE code challenge.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code_challenge: Option<String>,

    /// PKCE code challenge method.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code_challenge_method: Option<String>,
}

impl AuthorizationRequest {
    /// Parses a URL-encoded query or form body.
    ///
    /// # Errors
    ///
    /// Returns `invalid_request` if the input is not URL-encoded.
    pub fn from_query(query: &str) -> AuthResult<Self> {
        serde_urlencoded::from_str(query.trim_start_matches('?'))
            .map_err(|e| AuthError::invalid_request(format!("the request cannot be parsed: {e}")))
    }
}

/// A single entry of the `claims` request parameter (OIDC Core Section 5.5.1).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimParameter {
    /// Claim name.
    pub name: String,
    /// Whether the claim is essential.
    pub essential: Option<bool>,
    /// Required value.
    pub value: Option<String>,
    /// Acceptable values.
    pub values: Option<Vec<String>>,
}

impl ClaimParameter {
    /// Requests a claim with no constraint.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Requests an essential claim.
    #[must_use]
    pub fn essential(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            essential: Some(true),
            ..Self::default()
        }
    }

    /// Returns whether the claim was marked essential.
    #[must_use]
    pub fn is_essential(&self) -> bool {
        self.essential == Some(true)
    }

    /// Checks a single-valued claim against the request.
    ///
    /// An essential claim must be non-empty, `value` must be equal and
    /// `values` must contain the claim value.
    #[must_use]
    pub fn is_satisfied_by(&self, claim_value: &str) -> bool {
        if self.is_essential() && claim_value.trim().is_empty() {
            return false;
        }
        if self.value.as_deref().is_some_and(|v| v != claim_value) {
            return false;
        }
        if self
            .values
            .as_ref()
            .is_some_and(|vs| !vs.iter().any(|v| v == claim_value))
        {
            return false;
        }
        true
    }

    /// Checks a multi-valued claim against the request.
    ///
    /// An essential claim must have at least one value, `value` must be one
    /// of them and every entry of `values` must be present.
    #[must_use]
    pub fn is_satisfied_by_all<S: AsRef<str>>(&self, claim_values: &[S]) -> bool {
        let contains = |needle: &str| claim_values.iter().any(|c| c.as_ref() == needle);
        if self.is_essential() && claim_values.is_empty() {
            return false;
        }
        if self.value.as_deref().is_some_and(|v| !contains(v)) {
            return false;
        }
        if self
            .values
            .as_ref()
            .is_some_and(|vs| !vs.iter().all(|v| contains(v)))
        {
            return false;
        }
        true
    }
}

/// The `claims` request parameter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimsParameter {
    /// Claims requested in the identity token.
    pub id_token: Vec<ClaimParameter>,
    /// Claims requested from the `UserInfo` endpoint.
    pub userinfo: Vec<ClaimParameter>,
}

impl ClaimsParameter {
    /// Parses the JSON claims request object.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is not a JSON object of claim requests.
    pub fn from_json(json: &str) -> Result<Self, String> {
        let root: Map<String, Value> =
            serde_json::from_str(json).map_err(|e| e.to_string())?;
        Ok(Self {
            id_token: parse_claim_requests(root.get("id_token"))?,
            userinfo: parse_claim_requests(root.get("userinfo"))?,
        })
    }

    /// Returns whether any identity token claim is requested.
    #[must_use]
    pub fn has_id_token_claims(&self) -> bool {
        !self.id_token.is_empty()
    }

    /// Returns whether any `UserInfo` claim is requested.
    #[must_use]
    pub fn has_userinfo_claims(&self) -> bool {
        !self.userinfo.is_empty()
    }

    /// Names of every requested claim.
    #[must_use]
    pub fn claim_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .id_token
            .iter()
            .chain(self.userinfo.iter())
            .map(|c| c.name.as_str())
            .collect();
        names.sort_unstable();
        names.dedup();
        names
    }
}

fn parse_claim_requests(section: Option<&Value>) -> Result<Vec<ClaimParameter>, String> {
    let Some(section) = section else {
        return Ok(Vec::new());
    };
    let Value::Object(entries) = section else {
        return Err("a claims section must be an object".to_string());
    };

    entries
        .iter()
        .map(|(name, request)| {
            let mut claim = ClaimParameter::named(name.clone());
            match request {
                Value::Null => {}
                Value::Object(members) => {
                    claim.essential = members.get("essential").and_then(Value::as_bool);
                    claim.value = members.get("value").map(claim_value_to_string);
                    claim.values = match members.get("values") {
                        Some(Value::Array(values)) => {
                            Some(values.iter().map(claim_value_to_string).collect())
                        }
                        Some(_) => return Err(format!("the values of claim {name} must be an array")),
                        None => None,
                    };
                }
                _ => return Err(format!("the request for claim {name} must be an object or null")),
            }
            Ok(claim)
        })
        .collect()
}

fn claim_value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// A validated authorization request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationParameter {
    /// Client ID.
    pub client_id: String,
    /// Requested response types.
    pub response_types: BTreeSet<ResponseType>,
    /// Requested scopes, in request order. Duplicates are kept so the
    /// processor can reject them.
    pub scopes: Vec<String>,
    /// Redirection URI.
    pub redirect_uri: String,
    /// Opaque client state.
    pub state: Option<String>,
    /// Replay protection value.
    pub nonce: Option<String>,
    /// Prompt values. Empty when the request carried none.
    pub prompts: Vec<Prompt>,
    /// Maximum authentication age in seconds.
    pub max_age: Option<i64>,
    /// Previously issued identity token.
    pub id_token_hint: Option<String>,
    /// Claims request.
    pub claims: Option<ClaimsParameter>,
    /// PKCE code challenge.
    pub code_challenge: Option<String>,
    /// PKCE code challenge method.
    pub code_challenge_method: Option<CodeChallengeMethod>,
    /// Requested response mode.
    pub response_mode: Option<ResponseMode>,
    /// Requested authentication methods references.
    pub amr_values: Vec<String>,
}

impl AuthorizationParameter {
    /// Creates a parameter with the four required members.
    #[must_use]
    pub fn new(
        client_id: impl Into<String>,
        response_types: impl IntoIterator<Item = ResponseType>,
        scope: &str,
        redirect_uri: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            response_types: response_types.into_iter().collect(),
            scopes: split_spaces(scope),
            redirect_uri: redirect_uri.into(),
            state: None,
            nonce: None,
            prompts: Vec::new(),
            max_age: None,
            id_token_hint: None,
            claims: None,
            code_challenge: None,
            code_challenge_method: None,
            response_mode: None,
            amr_values: Vec::new(),
        }
    }

    /// Sets the state.
    #[must_use]
    pub fn with_state(mut self, state: impl Into<String>) -> Self {
        self.state = Some(state.into());
        self
    }

    /// Sets the nonce.
    #[must_use]
    pub fn with_nonce(mut self, nonce: impl Into<String>) -> Self {
        self.nonce = Some(nonce.into());
        self
    }

    /// Sets the prompt values.
    #[must_use]
    pub fn with_prompts(mut self, prompts: impl IntoIterator<Item = Prompt>) -> Self {
        self.prompts = prompts.into_iter().collect();
        self
    }

    /// Sets `max_age`.
    #[must_use]
    pub const fn with_max_age(mut self, seconds: i64) -> Self {
        self.max_age = Some(seconds);
        self
    }

    /// Sets the identity token hint.
    #[must_use]
    pub fn with_id_token_hint(mut self, token: impl Into<String>) -> Self {
        self.id_token_hint = Some(token.into());
        self
    }

    /// Sets the claims request.
    #[must_use]
    pub fn with_claims(mut self, claims: ClaimsParameter) -> Self {
        self.claims = Some(claims);
        self
    }

    /// Sets the PKCE challenge.
    #[must_use]
    pub fn with_code_challenge(
        mut self,
        challenge: impl Into<String>,
        method: Option<CodeChallengeMethod>,
    ) -> Self {
        self.code_challenge = Some(challenge.into());
        self.code_challenge_method = method;
        self
    }

    /// Sets the response mode.
    #[must_use]
    pub const fn with_response_mode(mut self, mode: ResponseMode) -> Self {
        self.response_mode = Some(mode);
        self
    }

    /// Returns the state as a string slice.
    #[must_use]
    pub fn state(&self) -> Option<&str> {
        self.state.as_deref()
    }

    /// Returns the scopes joined with spaces.
    #[must_use]
    pub fn scope(&self) -> String {
        self.scopes.join(" ")
    }

    /// Returns the response types joined with spaces.
    #[must_use]
    pub fn response_type(&self) -> String {
        self.response_types
            .iter()
            .map(|t| t.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Checks whether `prompt` was requested.
    #[must_use]
    pub fn has_prompt(&self, prompt: Prompt) -> bool {
        self.prompts.contains(&prompt)
    }

    /// Checks whether `response_type` was requested.
    #[must_use]
    pub fn requests(&self, response_type: ResponseType) -> bool {
        self.response_types.contains(&response_type)
    }
}

impl TryFrom<AuthorizationRequest> for AuthorizationParameter {
    type Error = AuthError;

    fn try_from(request: AuthorizationRequest) -> Result<Self, Self::Error> {
        let state = non_blank(request.state);
        let fail = |message: String| AuthError::invalid_request(message).with_state(state.as_deref());
        let missing = |name: &str| fail(format!("the parameter {name} is missing"));

        let scope = non_blank(request.scope).ok_or_else(|| missing(parameter_names::SCOPE))?;
        let client_id =
            non_blank(request.client_id).ok_or_else(|| missing(parameter_names::CLIENT_ID))?;
        let redirect_uri =
            non_blank(request.redirect_uri).ok_or_else(|| missing(parameter_names::REDIRECT_URI))?;
        let response_type = non_blank(request.response_type)
            .ok_or_else(|| missing(parameter_names::RESPONSE_TYPE))?;

        let response_types = split_spaces(&response_type)
            .iter()
            .map(|t| t.parse::<ResponseType>())
            .collect::<Result<BTreeSet<_>, _>>()
            .map_err(|_| fail("at least one response_type parameter is not supported".to_string()))?;

        let prompts = match non_blank(request.prompt) {
            Some(prompt) => parse_prompts(&prompt).map_err(fail)?,
            None => Vec::new(),
        };

        if url::Url::parse(&redirect_uri).is_err() {
            return Err(fail(
                "Based on the RFC-3986 the redirection-uri is not well formed".to_string(),
            ));
        }

        let max_age = non_blank(request.max_age)
            .map(|v| {
                v.parse::<i64>()
                    .ok()
                    .filter(|n| *n >= 0)
                    .ok_or_else(|| fail(format!("the parameter max_age {v} is not valid")))
            })
            .transpose()?;

        let claims = non_blank(request.claims)
            .map(|json| {
                ClaimsParameter::from_json(&json)
                    .map_err(|e| fail(format!("the claims parameter is not valid: {e}")))
            })
            .transpose()?;

        let response_mode = non_blank(request.response_mode)
            .map(|m| {
                m.parse::<ResponseMode>()
                    .map_err(|_| fail(format!("the response mode {m} is not supported")))
            })
            .transpose()?;

        let code_challenge_method = non_blank(request.code_challenge_method)
            .map(|m| {
                m.parse::<CodeChallengeMethod>()
                    .map_err(|_| fail(format!("the code challenge method {m} is not supported")))
            })
            .transpose()?;

        Ok(Self {
            client_id,
            response_types,
            scopes: split_spaces(&scope),
            redirect_uri,
            state,
            nonce: non_blank(request.nonce),
            prompts,
            max_age,
            id_token_hint: non_blank(request.id_token_hint),
            claims,
            code_challenge: non_blank(request.code_challenge),
            code_challenge_method,
            response_mode,
            amr_values: request.amr_values.as_deref().map(split_spaces).unwrap_or_default(),
        })
    }
}

fn parse_prompts(prompt: &str) -> Result<Vec<Prompt>, String> {
    let mut prompts = Vec::new();
    for value in prompt.split_whitespace() {
        let parsed = value
            .parse::<Prompt>()
            .map_err(|_| "at least one prompt parameter is not supported".to_string())?;
        if !prompts.contains(&parsed) {
            prompts.push(parsed);
        }
    }

    if prompts.contains(&Prompt::None) && prompts.len() > 1 {
        return Err("prompt parameter should have only none value".to_string());
    }
    Ok(prompts)
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn split_spaces(value: &str) -> Vec<String> {
    value.split_whitespace().map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AuthErrorCode;

    const BASE: &str = "client_id=web&scope=openid%20profile&redirect_uri=https%3A%2F%2Fweb.example%2Fcb&response_type=code&state=abc";

    fn parse(query: &str) -> AuthResult<AuthorizationParameter> {
        AuthorizationParameter::try_from(AuthorizationRequest::from_query(query)?)
    }

    #[test]
    fn parses_a_code_request() {
        let parameter = parse(BASE).unwrap();
        assert_eq!(parameter.client_id, "web");
        assert_eq!(parameter.scopes, vec!["openid", "profile"]);
        assert!(parameter.requests(ResponseType::Code));
        assert_eq!(parameter.state(), Some("abc"));
        assert!(parameter.prompts.is_empty());
        assert_eq!(parameter.response_type(), "code");
    }

    #[test]
    fn missing_parameters_are_reported_in_order() {
        let err = parse("client_id=web&state=s1").unwrap_err();
        assert_eq!(err.code, AuthErrorCode::InvalidRequest);
        assert_eq!(err.message, "the parameter scope is missing");
        assert_eq!(err.state.as_deref(), Some("s1"));

        let err = parse("scope=openid&client_id=web&redirect_uri=https://a.example/").unwrap_err();
        assert_eq!(err.message, "the parameter response_type is missing");
    }

    #[test]
    fn unknown_response_type_is_rejected() {
        let err = parse(&BASE.replace("response_type=code", "response_type=code%20device"))
            .unwrap_err();
        assert_eq!(err.message, "at least one response_type parameter is not supported");
    }

    #[test]
    fn prompt_validation() {
        let err = parse(&format!("{BASE}&prompt=page")).unwrap_err();
        assert_eq!(err.message, "at least one prompt parameter is not supported");

        let err = parse(&format!("{BASE}&prompt=none%20login")).unwrap_err();
        assert_eq!(err.message, "prompt parameter should have only none value");

        let parameter = parse(&format!("{BASE}&prompt=login%20consent")).unwrap();
        assert_eq!(parameter.prompts, vec![Prompt::Login, Prompt::Consent]);
    }

    #[test]
    fn redirect_uri_must_be_absolute() {
        let err = parse(&BASE.replace("https%3A%2F%2Fweb.example%2Fcb", "%2Fcb")).unwrap_err();
        assert_eq!(err.message, "Based on the RFC-3986 the redirection-uri is not well formed");
        assert_eq!(err.state.as_deref(), Some("abc"));
    }

    #[test]
    fn parses_optional_members() {
        let claims = urlencoding::encode(
            r#"{"id_token":{"auth_time":{"essential":true},"acr":{"values":["a","b"]}},"userinfo":{"email":null}}"#,
        );
        let query = format!(
            "{BASE}&max_age=60&response_mode=form_post&code_challenge_method=plain&amr_values=pwd%20otp&claims={claims}"
        );
        let parameter = parse(&query).unwrap();

        assert_eq!(parameter.max_age, Some(60));
        assert_eq!(parameter.response_mode, Some(ResponseMode::FormPost));
        assert_eq!(parameter.code_challenge_method, Some(CodeChallengeMethod::Plain));
        assert_eq!(parameter.amr_values, vec!["pwd", "otp"]);

        let claims = parameter.claims.unwrap();
        assert!(claims.has_id_token_claims());
        let auth_time = claims.id_token.iter().find(|c| c.name == "auth_time").unwrap();
        assert!(auth_time.is_essential());
        assert_eq!(claims.userinfo, vec![ClaimParameter::named("email")]);
        assert_eq!(claims.claim_names(), vec!["acr", "auth_time", "email"]);
    }

    #[test]
    fn malformed_optional_members_are_rejected() {
        assert!(parse(&format!("{BASE}&max_age=soon")).is_err());
        assert!(parse(&format!("{BASE}&response_mode=web_message")).is_err());
        assert!(parse(&format!("{BASE}&claims=%5B%5D")).is_err());
    }

    #[test]
    fn single_valued_claim_checks() {
        let essential = ClaimParameter::essential("email");
        assert!(essential.is_satisfied_by("alice@example.com"));
        assert!(!essential.is_satisfied_by(""));

        let value = ClaimParameter {
            value: Some("alice".to_string()),
            ..ClaimParameter::named("sub")
        };
        assert!(value.is_satisfied_by("alice"));
        assert!(!value.is_satisfied_by("bob"));

        let values = ClaimParameter {
            values: Some(vec!["a".to_string(), "b".to_string()]),
            ..ClaimParameter::named("acr")
        };
        assert!(values.is_satisfied_by("b"));
        assert!(!values.is_satisfied_by("c"));
    }

    #[test]
    fn multi_valued_claim_checks() {
        let essential = ClaimParameter::essential("aud");
        assert!(essential.is_satisfied_by_all(&["web"]));
        assert!(!essential.is_satisfied_by_all::<&str>(&[]));

        let values = ClaimParameter {
            values: Some(vec!["web".to_string(), "api".to_string()]),
            ..ClaimParameter::named("aud")
        };
        assert!(values.is_satisfied_by_all(&["api", "web", "issuer"]));
        assert!(!values.is_satisfied_by_all(&["web"]));
    }
}
