//! # idp-model
//!
//! Domain entities for the OAuth 2.0 / OpenID Connect authorization core.
//!
//! These types are owned by their repositories and read-only to the
//! authorization flows:
//!
//! - [`Client`]: a registered relying party
//! - [`Scope`]: a scope and the claims it releases
//! - [`Consent`]: scopes and claims a resource owner granted to a client
//! - [`JsonWebKey`]: signing and encryption keys
//! - [`AuthorizationCode`] and [`GrantedToken`]: artifacts issued by the flows

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod client;
pub mod consent;
pub mod grant;
pub mod jwk;
pub mod scope;
pub mod types;

pub use client::{Client, ClientSecret, ClientSecretType};
pub use consent::Consent;
pub use grant::{AuthorizationCode, AuthorizationCodeParams, ClaimSet, GrantedToken};
pub use jwk::{
    EcCurve, JsonWebKey, JsonWebKeySet, KeyAlgorithm, KeyOperation, KeyType, KeyUse,
};
pub use scope::Scope;
pub use types::{CodeChallengeMethod, GrantType, ResponseType};
