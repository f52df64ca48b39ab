//! End-to-end tests of the authorization core.
//!
//! Requests enter through the flow dispatcher and leave as rendered
//! redirects, with every port backed by the in-memory adapters.

mod auth_flows;
mod jwks;
mod jwt_codec;
