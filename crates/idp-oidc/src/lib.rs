//! # idp-oidc
//!
//! OAuth 2.0 / `OpenID` Connect authorization core.
//!
//! Turns an incoming authorization request into a redirect instruction
//! (authorization code, implicit token or hybrid response), backed by the
//! JWT pipeline that signs, encrypts, verifies and decrypts identity tokens.
//!
//! ## Request pipeline
//!
//! ```text
//! AuthorizationActions (dispatcher)
//!   -> ClientValidator        client, redirect URL, PKCE
//!   -> flow operation         nonce, grant type
//!   -> AuthorizationRequestProcessor
//!        scopes, response types, prompt, max_age, id_token_hint
//!   -> AuthorizationResponseGenerator
//!        code / access token / id_token, response mode
//!   -> JwtGenerator           sign, then encrypt
//! ```
//!
//! ## Modules
//!
//! - [`actions`] - Flow dispatcher and collaborator wiring
//! - [`claims`] - Claim resolution from scopes and the `claims` parameter
//! - [`consent`] - Lookup of the consent covering a request
//! - [`error`] - OAuth 2.0 / OIDC error types
//! - [`flows`] - Authorization code, implicit and hybrid operations
//! - [`jwt`] - JWS/JWE codec and key resolution
//! - [`parameter`] - Authorization request parsing and validation
//! - [`pkce`] - PKCE (RFC 7636) verification
//! - [`principal`] - The resource owner behind a request
//! - [`processor`] - Authorization request processing
//! - [`response`] - Authorization response generation
//! - [`result`] - Action results and redirect rendering
//! - [`types`] - Flow, prompt and response mode types
//! - [`validator`] - Client, grant and scope validation
//!
//! ## NIST 800-53 Rev5 Controls
//!
//! - IA-2: Identification and Authentication (prompt and `max_age` handling)
//! - SC-13: Cryptographic Protection (identity token signing and encryption)
//! - AU-2: Event Logging (authorization events)

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod actions;
pub mod claims;
pub mod consent;
pub mod error;
pub mod flows;
pub mod jwt;
pub mod parameter;
pub mod pkce;
pub mod principal;
pub mod processor;
pub mod response;
pub mod result;
pub mod types;
pub mod validator;

#[cfg(test)]
mod fixtures;

pub use actions::{AuthorizationActions, Collaborators};
pub use claims::ClaimsResolver;
pub use consent::ConsentHelper;
pub use error::{AuthError, AuthErrorCode, AuthResult, ErrorResponse, JwtError};
pub use flows::{AuthorizationCodeOperation, HybridOperation, ImplicitOperation};
pub use jwt::{JwksFetcher, JwsPayload, JwtGenerator, JwtParser, ReqwestJwksFetcher};
pub use parameter::{AuthorizationParameter, AuthorizationRequest, ClaimParameter, ClaimsParameter};
pub use pkce::PkceVerifier;
pub use principal::Principal;
pub use processor::AuthorizationRequestProcessor;
pub use response::AuthorizationResponseGenerator;
pub use result::{
    render_error, ActionResult, IdentityServerEndpoint, RedirectInstruction, RenderedResponse,
};
pub use types::{AuthorizationFlow, Prompt, ResponseMode};
pub use validator::{ClientValidator, ScopeValidator};
