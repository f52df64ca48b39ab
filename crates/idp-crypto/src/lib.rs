//! # idp-crypto
//!
//! Cryptographic building blocks for the identity provider using aws-lc-rs.
//!
//! - [`algorithm`]: JOSE algorithm identifiers (JWS `alg`, JWE `alg`/`enc`)
//! - [`hash`]: SHA-2 digests used for token hashes and PKCE
//! - [`random`]: authorization codes and opaque tokens
//!
//! ## NIST 800-53 Rev5 Controls
//!
//! - SC-12: Cryptographic key management
//! - SC-13: Cryptographic protection

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod algorithm;
pub mod hash;
pub mod random;

pub use algorithm::{AlgorithmError, HashAlgorithm, JweAlg, JweEnc, JwsAlg};
pub use hash::{constant_time_eq, hash, sha256, sha384, sha512};
