//! Authorization request processing.
//!
//! Decides whether the user agent must authenticate, give consent, or can go
//! straight back to the client.
//!
//! ## NIST 800-53 Rev5: IA-2 (Identification and Authentication)
//!
//! `prompt` and `max_age` force re-authentication; `prompt=none` never
//! interacts and fails instead. An `id_token_hint` must name the current
//! resource owner.

use std::sync::Arc;

use chrono::Utc;
use idp_core::event::EventBuilder;
use idp_core::{Config, EventSource, EventType};
use idp_model::{Client, ResponseType};

use crate::consent::ConsentHelper;
use crate::error::{AuthError, AuthErrorCode, AuthResult};
use crate::jwt::JwtParser;
use crate::parameter::AuthorizationParameter;
use crate::principal::Principal;
use crate::result::{ActionResult, IdentityServerEndpoint};
use crate::types::Prompt;
use crate::validator::{ClientValidator, ScopeValidator};

/// Processes authorization requests.
pub struct AuthorizationRequestProcessor {
    config: Arc<Config>,
    scope_validator: ScopeValidator,
    consent_helper: ConsentHelper,
    parser: Arc<JwtParser>,
    events: Arc<dyn EventSource>,
}

impl AuthorizationRequestProcessor {
    /// Creates a processor.
    #[must_use]
    pub fn new(
        config: Arc<Config>,
        scope_validator: ScopeValidator,
        consent_helper: ConsentHelper,
        parser: Arc<JwtParser>,
        events: Arc<dyn EventSource>,
    ) -> Self {
        Self {
            config,
            scope_validator,
            consent_helper,
            parser,
            events,
        }
    }

    /// Processes a request for an already validated client.
    ///
    /// # Errors
    ///
    /// Returns the first failed check, with the request state attached.
    pub async fn process(
        &self,
        parameter: &AuthorizationParameter,
        principal: &Principal,
        client: &Client,
        process_id: &str,
    ) -> AuthResult<ActionResult> {
        self.events.record(
            EventBuilder::new(EventType::StartProcessingAuthorizationRequest)
                .process(process_id)
                .client(&parameter.client_id)
                .detail("scope", parameter.scope())
                .detail("response_type", parameter.response_type())
                .build(),
        );

        let result = self
            .decide(parameter, principal, client)
            .await
            .map_err(|e| e.with_state(parameter.state()))?;

        tracing::debug!(
            client_id = %parameter.client_id,
            action = result.destination(),
            "authorization request processed"
        );
        self.events.record(
            EventBuilder::new(EventType::EndProcessingAuthorizationRequest)
                .process(process_id)
                .client(&parameter.client_id)
                .detail("action_type", if result.is_callback() { "RedirectToCallbackUrl" } else { "RedirectToAction" })
                .detail("action_name", result.destination())
                .build(),
        );
        Ok(result)
    }

    async fn decide(
        &self,
        parameter: &AuthorizationParameter,
        principal: &Principal,
        client: &Client,
    ) -> AuthResult<ActionResult> {
        if ClientValidator::redirection_url(client, &parameter.redirect_uri).is_none() {
            return Err(AuthError::invalid_request(format!(
                "the redirect url {} doesn't exist or is not valid",
                parameter.redirect_uri
            )));
        }

        self.scope_validator.check(&parameter.scopes, client).await?;

        let response_types: Vec<ResponseType> = parameter.response_types.iter().copied().collect();
        if response_types.is_empty() {
            return Err(AuthError::invalid_request("the parameter response_type is missing"));
        }
        if !ClientValidator::check_response_types(client, &response_types) {
            let names: Vec<&str> = response_types.iter().map(|t| t.as_str()).collect();
            return Err(AuthError::invalid_request(format!(
                "the client '{}' doesn't support the response type: '{}'",
                client.client_id,
                names.join(",")
            )));
        }

        let authenticated = principal.is_authenticated();
        let has_consent = if authenticated {
            self.consent_helper
                .get_confirmed_consent(parameter, &principal.subject)
                .await?
                .is_some()
        } else {
            false
        };

        if authenticated && max_age_exceeded(parameter.max_age, principal.auth_instant) {
            return Ok(ActionResult::redirect_to_action(IdentityServerEndpoint::AuthenticateIndex));
        }

        let prompts = if parameter.prompts.is_empty() {
            vec![default_prompt(authenticated, has_consent)]
        } else {
            parameter.prompts.clone()
        };

        let result = process_prompts(&prompts, authenticated, has_consent)?;
        if result.is_callback() && prompts.contains(&Prompt::None) {
            if let Some(hint) = parameter.id_token_hint.as_deref() {
                self.check_id_token_hint(hint, principal).await?;
            }
        }
        Ok(result)
    }

    async fn check_id_token_hint(&self, hint: &str, principal: &Principal) -> AuthResult<()> {
        let jws = if self.parser.is_jwe(hint) {
            self.parser
                .decrypt(hint)
                .await?
                .ok_or_else(|| AuthError::invalid_request("the id token hint parameter cannot be decrypted"))?
        } else if self.parser.is_jws(hint) {
            hint.to_string()
        } else {
            return Err(AuthError::invalid_request("the id_token parameter is not a valid token"));
        };

        let payload = self.parser.unsign(&jws).await?.ok_or_else(|| {
            AuthError::invalid_request("the signature of id token hint parameter cannot be checked")
        })?;

        if !payload.audiences().iter().any(|a| *a == self.config.issuer.name) {
            return Err(AuthError::invalid_request(
                "the identity token doesnt contain simple identity server in the audience",
            ));
        }
        if payload.subject() != Some(principal.subject.as_str()) {
            return Err(AuthError::invalid_request(
                "the current authenticated user doesn't match with the identity token",
            ));
        }
        Ok(())
    }
}

const fn default_prompt(authenticated: bool, has_consent: bool) -> Prompt {
    if !authenticated {
        Prompt::Login
    } else if !has_consent {
        Prompt::Consent
    } else {
        Prompt::None
    }
}

fn max_age_exceeded(max_age: Option<i64>, auth_instant: Option<i64>) -> bool {
    match (max_age, auth_instant) {
        (Some(max_age), Some(auth_instant)) => max_age < Utc::now().timestamp() - auth_instant,
        _ => false,
    }
}

fn process_prompts(prompts: &[Prompt], authenticated: bool, has_consent: bool) -> AuthResult<ActionResult> {
    if prompts.contains(&Prompt::None) {
        if !authenticated {
            return Err(AuthError::new(
                AuthErrorCode::LoginRequired,
                "the user needs to be authenticated",
            ));
        }
        if !has_consent {
            return Err(AuthError::new(
                AuthErrorCode::InteractionRequired,
                "the user needs to give his consent",
            ));
        }
        return Ok(ActionResult::redirect_to_callback());
    }

    if prompts.contains(&Prompt::Login) {
        return Ok(ActionResult::redirect_to_action(IdentityServerEndpoint::AuthenticateIndex));
    }

    if prompts.contains(&Prompt::Consent) {
        let page = if authenticated {
            IdentityServerEndpoint::ConsentIndex
        } else {
            IdentityServerEndpoint::AuthenticateIndex
        };
        return Ok(ActionResult::redirect_to_action(page));
    }

    let unsupported: Vec<String> = prompts.iter().map(ToString::to_string).collect();
    Err(AuthError::invalid_request(format!(
        "the prompt parameter {} is not supported",
        unsupported.join(" ")
    )))
}
