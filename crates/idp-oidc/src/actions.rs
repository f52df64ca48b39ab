//! Authorization flow dispatcher.
//!
//! [`AuthorizationActions`] is the entry point of the authorization
//! endpoint: it validates the client, picks the flow from the response
//! types, and publishes the outcome as an event.
//!
//! ## NIST 800-53 Rev5: AU-2 (Event Logging)
//!
//! Every request produces a received event followed by either a granted or
//! an error event carrying the OAuth error code.

use std::sync::Arc;
use std::time::Duration;

use idp_core::event::EventBuilder;
use idp_core::{Config, EventSource, EventType};
use idp_storage::{
    AuthorizationCodeStore, ClientRepository, ConsentRepository, JsonWebKeyRepository, ScopeRepository,
    TokenStore,
};
use tracing::Instrument;

use crate::claims::ClaimsResolver;
use crate::consent::ConsentHelper;
use crate::error::{AuthError, AuthResult};
use crate::flows::{AuthorizationCodeOperation, HybridOperation, ImplicitOperation};
use crate::jwt::{JwksFetcher, JwtGenerator, JwtParser};
use crate::parameter::{AuthorizationParameter, AuthorizationRequest};
use crate::principal::Principal;
use crate::processor::AuthorizationRequestProcessor;
use crate::response::AuthorizationResponseGenerator;
use crate::result::ActionResult;
use crate::types::AuthorizationFlow;
use crate::validator::{ClientValidator, ScopeValidator};

/// Ports the authorization core depends on.
#[derive(Clone)]
pub struct Collaborators {
    /// Registered clients.
    pub clients: Arc<dyn ClientRepository>,
    /// Known scopes.
    pub scopes: Arc<dyn ScopeRepository>,
    /// Server keys.
    pub keys: Arc<dyn JsonWebKeyRepository>,
    /// Confirmed consents.
    pub consents: Arc<dyn ConsentRepository>,
    /// Issued authorization codes.
    pub codes: Arc<dyn AuthorizationCodeStore>,
    /// Granted tokens.
    pub tokens: Arc<dyn TokenStore>,
    /// Audit event sink.
    pub events: Arc<dyn EventSource>,
    /// Client JWKS retrieval.
    pub jwks_fetcher: Arc<dyn JwksFetcher>,
}

/// Dispatches authorization requests to the flow they name.
pub struct AuthorizationActions {
    client_validator: ClientValidator,
    authorization_code: AuthorizationCodeOperation,
    implicit: ImplicitOperation,
    hybrid: HybridOperation,
    events: Arc<dyn EventSource>,
}

impl AuthorizationActions {
    /// Wires the authorization core from its configuration and ports.
    ///
    /// # Errors
    ///
    /// Returns [`idp_core::Error::Config`] if the configuration is invalid.
    pub fn new(config: Config, collaborators: Collaborators) -> idp_core::Result<Self> {
        config.validate()?;
        let config = Arc::new(config);
        let Collaborators {
            clients,
            scopes,
            keys,
            consents,
            codes,
            tokens,
            events,
            jwks_fetcher,
        } = collaborators;

        let consent_helper = ConsentHelper::new(consents);
        let parser = Arc::new(JwtParser::new(
            keys.clone(),
            clients.clone(),
            jwks_fetcher,
            config.crypto.allow_unsigned_tokens,
        ));
        let generator = Arc::new(JwtGenerator::new(
            config.clone(),
            keys,
            clients.clone(),
            ClaimsResolver::new(scopes.clone()),
        ));
        let processor = Arc::new(AuthorizationRequestProcessor::new(
            config.clone(),
            ScopeValidator::new(scopes),
            consent_helper.clone(),
            parser,
            events.clone(),
        ));
        let response_generator = Arc::new(AuthorizationResponseGenerator::new(
            config,
            generator,
            consent_helper,
            codes,
            tokens,
            events.clone(),
        ));

        Ok(Self {
            client_validator: ClientValidator::new(clients),
            authorization_code: AuthorizationCodeOperation::new(
                processor.clone(),
                response_generator.clone(),
                events.clone(),
            ),
            implicit: ImplicitOperation::new(processor.clone(), response_generator.clone(), events.clone()),
            hybrid: HybridOperation::new(processor, response_generator, events.clone()),
            events,
        })
    }

    /// Handles an authorization request.
    ///
    /// # Errors
    ///
    /// Returns the OAuth error to deliver to the client, with the request
    /// state attached.
    #[tracing::instrument(skip_all, fields(client_id = %parameter.client_id))]
    pub async fn get_authorization(
        &self,
        parameter: &AuthorizationParameter,
        principal: &Principal,
    ) -> AuthResult<ActionResult> {
        let process_id = uuid::Uuid::new_v4().to_string();
        self.events.record(
            EventBuilder::new(EventType::AuthorizationRequestReceived)
                .process(&process_id)
                .client(&parameter.client_id)
                .detail("response_type", parameter.response_type())
                .detail("scope", parameter.scope())
                .build(),
        );

        match self.dispatch(parameter, principal, &process_id).await {
            Ok(result) => {
                tracing::info!(action = result.destination(), "authorization request handled");
                self.events.record(
                    EventBuilder::new(EventType::AuthorizationGranted)
                        .process(&process_id)
                        .client(&parameter.client_id)
                        .subject(&principal.subject)
                        .detail("destination", result.destination())
                        .build(),
                );
                Ok(result)
            }
            Err(err) => {
                tracing::warn!(error = err.code.as_str(), "authorization request rejected: {}", err.message);
                self.events.record(
                    EventBuilder::new(EventType::OpenIdErrorReceived)
                        .failure(err.code.as_str())
                        .process(&process_id)
                        .client(&parameter.client_id)
                        .detail("error_description", err.message.as_str())
                        .build(),
                );
                Err(err)
            }
        }
    }

    /// Parses a query string then handles it as [`Self::get_authorization`].
    ///
    /// # Errors
    ///
    /// Returns `invalid_request` if the query is malformed or a required
    /// parameter is missing, otherwise as [`Self::get_authorization`].
    pub async fn get_authorization_for_query(
        &self,
        query: &str,
        principal: &Principal,
    ) -> AuthResult<ActionResult> {
        let parameter = AuthorizationParameter::try_from(AuthorizationRequest::from_query(query)?)?;
        self.get_authorization(&parameter, principal).await
    }

    /// Handles a request, giving up once `deadline` elapses.
    ///
    /// # Errors
    ///
    /// Returns `server_error` when the deadline elapses, otherwise as
    /// [`Self::get_authorization`].
    pub async fn get_authorization_with_deadline(
        &self,
        parameter: &AuthorizationParameter,
        principal: &Principal,
        deadline: Duration,
    ) -> AuthResult<ActionResult> {
        let span = tracing::debug_span!("authorization_deadline", deadline_ms = deadline.as_millis() as u64);
        match tokio::time::timeout(deadline, self.get_authorization(parameter, principal))
            .instrument(span)
            .await
        {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(client_id = %parameter.client_id, "authorization request timed out");
                Err(AuthError::server_error("the authorization request timed out")
                    .with_state(parameter.state()))
            }
        }
    }

    async fn dispatch(
        &self,
        parameter: &AuthorizationParameter,
        principal: &Principal,
        process_id: &str,
    ) -> AuthResult<ActionResult> {
        let client = self.client_validator.validate(parameter).await?;

        self.events.record(
            EventBuilder::new(EventType::StartAuthorization)
                .process(process_id)
                .client(&client.client_id)
                .build(),
        );

        let flow = AuthorizationFlow::from_response_types(&parameter.response_types).ok_or_else(|| {
            AuthError::invalid_request("the authorization flow is not supported").with_state(parameter.state())
        })?;
        tracing::debug!(flow = flow.as_str(), "authorization flow selected");

        let result = match flow {
            AuthorizationFlow::AuthorizationCode => {
                self.authorization_code
                    .execute(parameter, principal, &client, process_id)
                    .await
            }
            AuthorizationFlow::Implicit => self.implicit.execute(parameter, principal, &client, process_id).await,
            AuthorizationFlow::Hybrid => self.hybrid.execute(parameter, principal, &client, process_id).await,
        }?;

        self.events.record(
            EventBuilder::new(EventType::EndAuthorization)
                .process(process_id)
                .client(&client.client_id)
                .detail("flow", flow.as_str())
                .detail("destination", result.destination())
                .build(),
        );
        Ok(result)
    }
}
