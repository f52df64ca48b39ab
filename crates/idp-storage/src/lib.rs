//! # idp-storage
//!
//! Repository ports consumed by the authorization core, with in-memory
//! adapters.
//!
//! ## Ports
//!
//! - [`ClientRepository`]: registered clients
//! - [`ScopeRepository`]: scopes and the claims they release
//! - [`JsonWebKeyRepository`]: server signing and encryption keys
//! - [`ConsentRepository`]: confirmed resource owner consents
//! - [`AuthorizationCodeStore`]: issued authorization codes
//! - [`TokenStore`]: issued access tokens
//!
//! Adapters own their concurrency control. The in-memory adapters guard their
//! maps with `tokio::sync::RwLock`; a persistent adapter would run each
//! mutation in a transaction and report a rollback as a [`StorageError`].

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod client;
pub mod code;
pub mod consent;
pub mod error;
pub mod jwk;
pub mod scope;
pub mod token;

pub use client::{ClientRecord, ClientRepository, InMemoryClientRepository};
pub use code::{AuthorizationCodeStore, InMemoryAuthorizationCodeStore};
pub use consent::{ConsentRepository, InMemoryConsentRepository};
pub use error::{StorageError, StorageResult};
pub use jwk::{InMemoryJsonWebKeyRepository, JsonWebKeyRepository};
pub use scope::{InMemoryScopeRepository, ScopeRepository};
pub use token::{InMemoryTokenStore, TokenStore};
