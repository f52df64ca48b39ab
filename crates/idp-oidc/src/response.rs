//! Authorization response generation.
//!
//! Fills a callback result with what the response types ask for: an
//! authorization code, an access token and an identity token, then decides
//! how the response reaches the client.

use std::sync::Arc;

use chrono::Utc;
use idp_core::event::EventBuilder;
use idp_core::{Config, EventSource, EventType};
use idp_model::{AuthorizationCode, AuthorizationCodeParams, Client, GrantedToken, ResponseType};
use idp_storage::{AuthorizationCodeStore, TokenStore};

use crate::consent::ConsentHelper;
use crate::error::AuthResult;
use crate::jwt::JwtGenerator;
use crate::parameter::AuthorizationParameter;
use crate::principal::Principal;
use crate::result::{ActionResult, IdentityServerEndpoint};
use crate::types::{response_names, AuthorizationFlow, ResponseMode};

const TOKEN_TYPE: &str = "Bearer";

/// Generates authorization responses.
pub struct AuthorizationResponseGenerator {
    config: Arc<Config>,
    generator: Arc<JwtGenerator>,
    consent_helper: ConsentHelper,
    codes: Arc<dyn AuthorizationCodeStore>,
    tokens: Arc<dyn TokenStore>,
    events: Arc<dyn EventSource>,
}

impl AuthorizationResponseGenerator {
    /// Creates a response generator.
    #[must_use]
    pub fn new(
        config: Arc<Config>,
        generator: Arc<JwtGenerator>,
        consent_helper: ConsentHelper,
        codes: Arc<dyn AuthorizationCodeStore>,
        tokens: Arc<dyn TokenStore>,
        events: Arc<dyn EventSource>,
    ) -> Self {
        Self {
            config,
            generator,
            consent_helper,
            codes,
            tokens,
            events,
        }
    }

    /// Adds the response parameters to `result` and sets its response mode.
    ///
    /// A `form_post` request turns the result into a redirection to the
    /// form page, which carries the client's `redirect_uri`.
    ///
    /// # Errors
    ///
    /// Returns `invalid_grant` when a requested claim cannot be satisfied and
    /// `server_error` when a store or the JWT codec fails.
    pub async fn generate(
        &self,
        result: &mut ActionResult,
        parameter: &AuthorizationParameter,
        principal: &Principal,
        client: &Client,
        flow: AuthorizationFlow,
        process_id: &str,
    ) -> AuthResult<()> {
        self.events.record(
            EventBuilder::new(EventType::StartGeneratingAuthorizationResponse)
                .process(process_id)
                .client(&client.client_id)
                .subject(&principal.subject)
                .build(),
        );

        let mut id_token_payload = self
            .generator
            .generate_id_token_payload(parameter, principal, client)
            .await?;
        let userinfo_payload = self.generator.generate_userinfo_payload(parameter, principal).await?;

        let access_token = if parameter.requests(ResponseType::Token) {
            let token = self
                .granted_token(parameter, client, &id_token_payload, &userinfo_payload, process_id)
                .await?;
            let instruction = result.instruction_mut();
            instruction.add_parameter(response_names::ACCESS_TOKEN, token.access_token.as_str());
            instruction.add_parameter(response_names::TOKEN_TYPE, token.token_type.as_str());
            instruction.add_parameter(response_names::EXPIRES_IN, token.expires_in.to_string());
            Some(token.access_token)
        } else {
            None
        };

        let code = if parameter.requests(ResponseType::Code) {
            let code = self
                .authorization_code(parameter, principal, &id_token_payload, &userinfo_payload, process_id)
                .await?;
            if let Some(code) = code.as_deref() {
                result.instruction_mut().add_parameter(response_names::CODE, code);
            }
            code
        } else {
            None
        };

        if parameter.requests(ResponseType::IdToken) {
            let alg = self.generator.id_token_signing_alg(client)?;
            JwtGenerator::fill_in_hashes(&mut id_token_payload, alg, code.as_deref(), access_token.as_deref())?;
            let id_token = self.generator.generate_id_token(client, &id_token_payload).await?;
            result.instruction_mut().add_parameter(response_names::ID_TOKEN, id_token);
        }

        if let Some(state) = parameter.state() {
            result.instruction_mut().add_parameter(response_names::STATE, state);
        }

        let response_mode = parameter
            .response_mode
            .unwrap_or_else(|| flow.default_response_mode());
        if response_mode == ResponseMode::FormPost {
            let mut instruction = result.instruction().clone();
            instruction.add_parameter(response_names::REDIRECT_URI, parameter.redirect_uri.as_str());
            instruction.response_mode = Some(ResponseMode::FormPost);
            *result = ActionResult::RedirectToAction {
                action: IdentityServerEndpoint::FormIndex,
                instruction,
            };
        } else {
            result.instruction_mut().response_mode = Some(response_mode);
        }

        self.events.record(
            EventBuilder::new(EventType::EndGeneratingAuthorizationResponse)
                .process(process_id)
                .client(&client.client_id)
                .detail("response_mode", response_mode.to_string())
                .detail(
                    "parameters",
                    result
                        .instruction()
                        .parameters
                        .iter()
                        .map(|(k, _)| k.as_str())
                        .collect::<Vec<_>>()
                        .join(","),
                )
                .build(),
        );
        Ok(())
    }

    async fn granted_token(
        &self,
        parameter: &AuthorizationParameter,
        client: &Client,
        id_token_payload: &crate::jwt::JwsPayload,
        userinfo_payload: &crate::jwt::JwsPayload,
        process_id: &str,
    ) -> AuthResult<GrantedToken> {
        let scope = parameter.scope();
        let existing = self
            .tokens
            .get_token(
                &scope,
                &client.client_id,
                Some(id_token_payload.claims()),
                Some(userinfo_payload.claims()),
            )
            .await?;
        if let Some(token) = existing.filter(GrantedToken::is_valid) {
            tracing::debug!(client_id = %client.client_id, "reusing granted token");
            return Ok(token);
        }

        let token = GrantedToken {
            access_token: idp_crypto::random::generate_opaque_token(),
            refresh_token: Some(idp_crypto::random::generate_opaque_token()),
            id_token: None,
            token_type: TOKEN_TYPE.to_string(),
            client_id: client.client_id.clone(),
            scope,
            expires_in: client
                .token_lifetime_seconds
                .unwrap_or(self.config.tokens.validity_seconds),
            id_token_payload: Some(id_token_payload.claims().clone()),
            userinfo_payload: Some(userinfo_payload.claims().clone()),
            created_at: Utc::now(),
        };
        self.tokens.add(&token).await?;

        self.events.record(
            EventBuilder::new(EventType::GrantAccessToClient)
                .process(process_id)
                .client(&client.client_id)
                .detail("scope", token.scope.as_str())
                .build(),
        );
        Ok(token)
    }

    async fn authorization_code(
        &self,
        parameter: &AuthorizationParameter,
        principal: &Principal,
        id_token_payload: &crate::jwt::JwsPayload,
        userinfo_payload: &crate::jwt::JwsPayload,
        process_id: &str,
    ) -> AuthResult<Option<String>> {
        if self
            .consent_helper
            .get_confirmed_consent(parameter, &principal.subject)
            .await?
            .is_none()
        {
            tracing::debug!(client_id = %parameter.client_id, "no confirmed consent, no code issued");
            return Ok(None);
        }

        let raw = idp_crypto::random::generate_auth_code();
        let code = AuthorizationCode::new(AuthorizationCodeParams {
            code: raw.clone(),
            client_id: parameter.client_id.clone(),
            redirect_uri: parameter.redirect_uri.clone(),
            scopes: parameter.scopes.clone(),
            ttl_seconds: self.config.tokens.authorization_code_validity_seconds,
        })
        .with_payloads(
            Some(id_token_payload.claims().clone()),
            Some(userinfo_payload.claims().clone()),
        )
        .with_pkce(parameter.code_challenge.clone(), parameter.code_challenge_method);
        self.codes.add(&code).await?;

        self.events.record(
            EventBuilder::new(EventType::GrantAuthorizationCode)
                .process(process_id)
                .client(&parameter.client_id)
                .subject(&principal.subject)
                .detail("scope", parameter.scope())
                .build(),
        );
        Ok(Some(raw))
    }
}
