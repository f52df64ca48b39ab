//! Authorization flow operations.
//!
//! Each flow checks what it specifically needs (a nonce, a grant type),
//! hands the request to the processor, and fills callback results through
//! the response generator.
//!
//! ## NIST 800-53 Rev5: AC-3 (Access Enforcement)
//!
//! A client only obtains codes or tokens through grant types it registered.

use std::sync::Arc;

use idp_core::event::EventBuilder;
use idp_core::{EventSource, EventType};
use idp_model::{Client, GrantType};

use crate::error::{AuthError, AuthResult};
use crate::parameter::AuthorizationParameter;
use crate::principal::Principal;
use crate::processor::AuthorizationRequestProcessor;
use crate::response::AuthorizationResponseGenerator;
use crate::result::ActionResult;
use crate::types::AuthorizationFlow;
use crate::validator::ClientValidator;

/// Steps shared by every flow.
struct FlowRunner {
    flow: AuthorizationFlow,
    processor: Arc<AuthorizationRequestProcessor>,
    generator: Arc<AuthorizationResponseGenerator>,
    events: Arc<dyn EventSource>,
}

impl FlowRunner {
    const fn requires_nonce(&self) -> bool {
        matches!(self.flow, AuthorizationFlow::Implicit | AuthorizationFlow::Hybrid)
    }

    const fn required_grant(&self) -> GrantType {
        match self.flow {
            AuthorizationFlow::AuthorizationCode => GrantType::AuthorizationCode,
            AuthorizationFlow::Implicit | AuthorizationFlow::Hybrid => GrantType::Implicit,
        }
    }

    fn start_event(&self) -> EventType {
        match self.flow {
            AuthorizationFlow::AuthorizationCode => EventType::StartAuthorizationCodeFlow,
            AuthorizationFlow::Implicit => EventType::StartImplicitFlow,
            AuthorizationFlow::Hybrid => EventType::StartHybridFlow,
        }
    }

    fn end_event(&self) -> EventType {
        match self.flow {
            AuthorizationFlow::AuthorizationCode => EventType::EndAuthorizationCodeFlow,
            AuthorizationFlow::Implicit => EventType::EndImplicitFlow,
            AuthorizationFlow::Hybrid => EventType::EndHybridFlow,
        }
    }

    async fn execute(
        &self,
        parameter: &AuthorizationParameter,
        principal: &Principal,
        client: &Client,
        process_id: &str,
    ) -> AuthResult<ActionResult> {
        let state = parameter.state();
        self.events.record(
            EventBuilder::new(self.start_event())
                .process(process_id)
                .client(&client.client_id)
                .detail("scope", parameter.scope())
                .detail("flow", self.flow.as_str())
                .build(),
        );

        if self.requires_nonce() && parameter.nonce.as_deref().map_or(true, str::is_empty) {
            return Err(AuthError::invalid_request("the parameter nonce is missing").with_state(state));
        }

        let grant = self.required_grant();
        if !ClientValidator::check_grant_types(client, &[grant]) {
            return Err(AuthError::unauthorized_client(format!(
                "the client {} doesn't support the grant type {}",
                client.client_id, grant
            ))
            .with_state(state));
        }

        let mut result = self
            .processor
            .process(parameter, principal, client, process_id)
            .await?;

        if result.is_callback() {
            if !principal.is_authenticated() {
                return Err(AuthError::invalid_request(
                    "the response cannot be generated because the resource owner needs to be authenticated",
                )
                .with_state(state));
            }
            self.generator
                .generate(&mut result, parameter, principal, client, self.flow, process_id)
                .await
                .map_err(|e| e.with_state(state))?;
        }

        tracing::debug!(
            client_id = %client.client_id,
            flow = self.flow.as_str(),
            action = result.destination(),
            "authorization flow finished"
        );
        self.events.record(
            EventBuilder::new(self.end_event())
                .process(process_id)
                .client(&client.client_id)
                .detail("scope", parameter.scope())
                .detail("flow", self.flow.as_str())
                .detail("destination", result.destination())
                .build(),
        );
        Ok(result)
    }
}

macro_rules! flow_operation {
    ($(#[$doc:meta])* $name:ident, $flow:expr) => {
        $(#[$doc])*
        pub struct $name {
            runner: FlowRunner,
        }

        impl $name {
            /// Creates the operation.
            #[must_use]
            pub fn new(
                processor: Arc<AuthorizationRequestProcessor>,
                generator: Arc<AuthorizationResponseGenerator>,
                events: Arc<dyn EventSource>,
            ) -> Self {
                Self {
                    runner: FlowRunner {
                        flow: $flow,
                        processor,
                        generator,
                        events,
                    },
                }
            }

            /// Runs the flow for a validated client.
            ///
            /// # Errors
            ///
            /// Returns the first failed check with the request state attached.
            pub async fn execute(
                &self,
                parameter: &AuthorizationParameter,
                principal: &Principal,
                client: &Client,
                process_id: &str,
            ) -> AuthResult<ActionResult> {
                self.runner.execute(parameter, principal, client, process_id).await
            }
        }
    };
}

flow_operation!(
    /// Authorization code flow (`response_type=code`).
    AuthorizationCodeOperation,
    AuthorizationFlow::AuthorizationCode
);

flow_operation!(
    /// Implicit flow (`id_token`, `id_token token`). Requires a nonce.
    ImplicitOperation,
    AuthorizationFlow::Implicit
);

flow_operation!(
    /// Hybrid flow (`code` with `id_token` and/or `token`). Requires a nonce
    /// and the implicit grant.
    HybridOperation,
    AuthorizationFlow::Hybrid
);
