//! # idp-core
//!
//! Core utilities, configuration, and error handling for the identity provider.
//!
//! This crate provides foundational types shared by every other `idp-*` crate:
//! the runtime [`Config`], the crate-level [`Error`], the audit [`event`]
//! vocabulary used by the authorization flows, and tracing initialisation.
//!
//! ## NIST 800-53 Rev5 Controls
//!
//! - AU-2: Event logging framework
//! - SI-11: Error handling

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod event;
pub mod telemetry;

pub use config::Config;
pub use error::{Error, Result};
pub use event::{Event, EventOutcome, EventSource, EventType};
