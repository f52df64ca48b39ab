//! Lookup of the consent covering a request.

use std::sync::Arc;

use idp_model::Consent;
use idp_storage::ConsentRepository;

use crate::error::AuthResult;
use crate::parameter::AuthorizationParameter;

/// Finds the confirmed consent that covers a request.
#[derive(Clone)]
pub struct ConsentHelper {
    consents: Arc<dyn ConsentRepository>,
}

impl ConsentHelper {
    /// Creates a helper backed by the consent repository.
    #[must_use]
    pub fn new(consents: Arc<dyn ConsentRepository>) -> Self {
        Self { consents }
    }

    /// Returns the first consent of `subject` for the request's client that
    /// covers it.
    ///
    /// A request naming claims is covered by a consent granting every named
    /// claim; otherwise by one granting every requested scope.
    ///
    /// # Errors
    ///
    /// Returns `server_error` if the repository fails.
    pub async fn get_confirmed_consent(
        &self,
        parameter: &AuthorizationParameter,
        subject: &str,
    ) -> AuthResult<Option<Consent>> {
        let consents = self
            .consents
            .get_confirmed_consents(subject, &parameter.client_id)
            .await?;

        let claim_names = parameter
            .claims
            .as_ref()
            .map(|c| c.claim_names())
            .unwrap_or_default();

        let consent = if claim_names.is_empty() {
            consents.into_iter().find(|c| c.covers_scopes(&parameter.scopes))
        } else {
            consents.into_iter().find(|c| c.covers_claims(&claim_names))
        };
        Ok(consent)
    }
}
