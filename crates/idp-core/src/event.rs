//! Event logging for the authorization flows.
//!
//! ## NIST 800-53 Rev5: AU-2 (Event Logging)
//!
//! Every authorization request produces a sequence of events: the request is
//! received, each flow stage starts and ends, and the request is either
//! granted or rejected with an OpenID error.
//!
//! ## NIST 800-53 Rev5: AU-3 (Content of Audit Records)
//!
//! All events include:
//! - Timestamp (ISO 8601)
//! - Event type
//! - Process identifier correlating the events of one request (when available)
//! - Client identifier (when available)
//! - Outcome (success/failure)
//!
//! Recording an event is fire-and-forget: an [`EventSource`] never reports
//! failure back to the flow that emitted the event.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Event type categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    // Request lifecycle
    /// An authorization request reached the dispatcher.
    AuthorizationRequestReceived,
    /// The request produced a redirect instruction.
    AuthorizationGranted,
    /// The request was rejected with an OpenID error.
    OpenIdErrorReceived,

    // Dispatcher
    /// Authorization dispatch started.
    StartAuthorization,
    /// Authorization dispatch ended.
    EndAuthorization,

    // Flows
    /// Authorization code flow started.
    StartAuthorizationCodeFlow,
    /// Authorization code flow ended.
    EndAuthorizationCodeFlow,
    /// Implicit flow started.
    StartImplicitFlow,
    /// Implicit flow ended.
    EndImplicitFlow,
    /// Hybrid flow started.
    StartHybridFlow,
    /// Hybrid flow ended.
    EndHybridFlow,

    // Processing
    /// Request processing started.
    StartProcessingAuthorizationRequest,
    /// Request processing ended.
    EndProcessingAuthorizationRequest,
    /// Response generation started.
    StartGeneratingAuthorizationResponse,
    /// Response generation ended.
    EndGeneratingAuthorizationResponse,

    // Grants
    /// An access token was issued to a client.
    GrantAccessToClient,
    /// An authorization code was issued to a client.
    GrantAuthorizationCode,
}

/// Outcome of an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventOutcome {
    /// Operation succeeded.
    Success,
    /// Operation failed.
    Failure,
}

/// An authorization audit event.
///
/// ## NIST 800-53 Rev5: AU-3 (Content of Audit Records)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    /// Unique event identifier.
    pub id: Uuid,

    /// Timestamp of the event (ISO 8601).
    pub timestamp: DateTime<Utc>,

    /// Type of event.
    pub event_type: EventType,

    /// Outcome of the event.
    pub outcome: EventOutcome,

    /// Identifier shared by all events of one authorization request.
    pub process_id: Option<String>,

    /// Client ID associated with the event.
    pub client_id: Option<String>,

    /// Subject of the resource owner, when authenticated.
    pub subject: Option<String>,

    /// Error code (for failure events).
    pub error: Option<String>,

    /// Additional details as key-value pairs.
    pub details: Vec<(String, String)>,
}

impl Event {
    /// Creates a new event builder.
    #[must_use]
    pub const fn builder(event_type: EventType) -> EventBuilder {
        EventBuilder::new(event_type)
    }

    /// Returns the value of the first detail named `key`.
    #[must_use]
    pub fn detail(&self, key: &str) -> Option<&str> {
        self.details
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Builder for creating events.
pub struct EventBuilder {
    event_type: EventType,
    outcome: EventOutcome,
    process_id: Option<String>,
    client_id: Option<String>,
    subject: Option<String>,
    error: Option<String>,
    details: Vec<(String, String)>,
}

impl EventBuilder {
    /// Creates a new event builder.
    #[must_use]
    pub const fn new(event_type: EventType) -> Self {
        Self {
            event_type,
            outcome: EventOutcome::Success,
            process_id: None,
            client_id: None,
            subject: None,
            error: None,
            details: Vec::new(),
        }
    }

    /// Sets the outcome to failure with an error code.
    #[must_use]
    pub fn failure(mut self, error: impl Into<String>) -> Self {
        self.outcome = EventOutcome::Failure;
        self.error = Some(error.into());
        self
    }

    /// Sets the process ID.
    #[must_use]
    pub fn process(mut self, process_id: impl Into<String>) -> Self {
        self.process_id = Some(process_id.into());
        self
    }

    /// Sets the client ID.
    #[must_use]
    pub fn client(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = Some(client_id.into());
        self
    }

    /// Sets the resource owner subject.
    #[must_use]
    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    /// Adds a detail key-value pair.
    #[must_use]
    pub fn detail(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.details.push((key.into(), value.into()));
        self
    }

    /// Builds the event.
    #[must_use]
    pub fn build(self) -> Event {
        Event {
            id: Uuid::now_v7(),
            timestamp: Utc::now(),
            event_type: self.event_type,
            outcome: self.outcome,
            process_id: self.process_id,
            client_id: self.client_id,
            subject: self.subject,
            error: self.error,
            details: self.details,
        }
    }
}

/// Sink for authorization events.
///
/// Implementations must not block and must not fail: the flows ignore the
/// outcome of recording.
pub trait EventSource: Send + Sync {
    /// Records an event.
    fn record(&self, event: Event);
}

/// Event source that writes every event to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingEventSource;

impl EventSource for TracingEventSource {
    fn record(&self, event: Event) {
        let details = event
            .details
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join(" ");

        match event.outcome {
            EventOutcome::Success => tracing::info!(
                event_type = ?event.event_type,
                process_id = event.process_id.as_deref().unwrap_or("-"),
                client_id = event.client_id.as_deref().unwrap_or("-"),
                details = %details,
                "authorization event"
            ),
            EventOutcome::Failure => tracing::warn!(
                event_type = ?event.event_type,
                process_id = event.process_id.as_deref().unwrap_or("-"),
                client_id = event.client_id.as_deref().unwrap_or("-"),
                error = event.error.as_deref().unwrap_or("-"),
                details = %details,
                "authorization event"
            ),
        }
    }
}

/// Event source that keeps events in memory, for tests and diagnostics.
#[derive(Debug, Default)]
pub struct InMemoryEventSource {
    events: Mutex<Vec<Event>>,
}

impl InMemoryEventSource {
    /// Creates an empty event source.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of the recorded events.
    #[must_use]
    pub fn events(&self) -> Vec<Event> {
        self.events.lock().clone()
    }

    /// Returns the recorded event types in emission order.
    #[must_use]
    pub fn event_types(&self) -> Vec<EventType> {
        self.events.lock().iter().map(|e| e.event_type).collect()
    }

    /// Returns the first recorded event of the given type.
    #[must_use]
    pub fn find(&self, event_type: EventType) -> Option<Event> {
        self.events
            .lock()
            .iter()
            .find(|e| e.event_type == event_type)
            .cloned()
    }
}

impl EventSource for InMemoryEventSource {
    fn record(&self, event: Event) {
        self.events.lock().push(event);
    }
}
