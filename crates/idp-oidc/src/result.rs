//! Action results and redirect rendering.
//!
//! The core decides *where* the user agent goes next; the host performs the
//! navigation. [`ActionResult::render`] turns a decision into a location or
//! an auto-submitting form (OAuth 2.0 Form Post Response Mode) so hosts do
//! not have to re-implement response mode encoding.

use serde::{Deserialize, Serialize};

use crate::error::AuthError;
use crate::types::{response_names, ResponseMode};

/// Pages of the identity server a request can be sent to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IdentityServerEndpoint {
    /// Resource owner authentication.
    AuthenticateIndex,
    /// Consent screen.
    ConsentIndex,
    /// Form post of the authorization response.
    FormIndex,
}

impl IdentityServerEndpoint {
    /// Name used in logs and events.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AuthenticateIndex => "AuthenticateIndex",
            Self::ConsentIndex => "ConsentIndex",
            Self::FormIndex => "FormIndex",
        }
    }
}

/// Ordered response parameters and how to deliver them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedirectInstruction {
    /// Parameters, in insertion order.
    pub parameters: Vec<(String, String)>,
    /// Response mode for callbacks.
    pub response_mode: Option<ResponseMode>,
}

impl RedirectInstruction {
    /// Creates an empty instruction.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a parameter.
    pub fn add_parameter(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.parameters.push((name.into(), value.into()));
    }

    /// Returns the first value of a parameter.
    #[must_use]
    pub fn parameter(&self, name: &str) -> Option<&str> {
        self.parameters
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Outcome of an authorization request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionResult {
    /// Send the user agent to an identity server page.
    RedirectToAction {
        /// Target page.
        action: IdentityServerEndpoint,
        /// Parameters for the page.
        instruction: RedirectInstruction,
    },
    /// Send the response to the client's redirection URL.
    RedirectToCallbackUrl(RedirectInstruction),
}

impl ActionResult {
    /// Redirect to an identity server page without parameters.
    #[must_use]
    pub fn redirect_to_action(action: IdentityServerEndpoint) -> Self {
        Self::RedirectToAction {
            action,
            instruction: RedirectInstruction::new(),
        }
    }

    /// Empty callback redirect.
    #[must_use]
    pub fn redirect_to_callback() -> Self {
        Self::RedirectToCallbackUrl(RedirectInstruction::new())
    }

    /// Returns whether this is a callback redirect.
    #[must_use]
    pub const fn is_callback(&self) -> bool {
        matches!(self, Self::RedirectToCallbackUrl(_))
    }

    /// Returns the target page, when redirecting to one.
    #[must_use]
    pub const fn action(&self) -> Option<IdentityServerEndpoint> {
        match self {
            Self::RedirectToAction { action, .. } => Some(*action),
            Self::RedirectToCallbackUrl(_) => None,
        }
    }

    /// Returns the redirect parameters.
    #[must_use]
    pub fn instruction(&self) -> &RedirectInstruction {
        match self {
            Self::RedirectToAction { instruction, .. } | Self::RedirectToCallbackUrl(instruction) => {
                instruction
            }
        }
    }

    /// Returns the redirect parameters for modification.
    pub fn instruction_mut(&mut self) -> &mut RedirectInstruction {
        match self {
            Self::RedirectToAction { instruction, .. } | Self::RedirectToCallbackUrl(instruction) => {
                instruction
            }
        }
    }

    /// Short description used in events: `RedirectToCallbackUrl` or the page.
    #[must_use]
    pub fn destination(&self) -> &'static str {
        self.action()
            .map_or("RedirectToCallbackUrl", IdentityServerEndpoint::as_str)
    }

    /// Renders the result for the user agent.
    ///
    /// Callbacks are delivered to `redirect_uri` using the instruction's
    /// response mode (query when unset). The form page posts to the
    /// `redirect_uri` parameter it carries. Other pages are left to the host.
    #[must_use]
    pub fn render(&self, redirect_uri: &str) -> RenderedResponse {
        match self {
            Self::RedirectToCallbackUrl(instruction) => build_redirect(
                redirect_uri,
                &instruction.parameters,
                instruction.response_mode.unwrap_or(ResponseMode::Query),
            ),
            Self::RedirectToAction {
                action: IdentityServerEndpoint::FormIndex,
                instruction,
            } => {
                let target = instruction
                    .parameter(response_names::REDIRECT_URI)
                    .unwrap_or(redirect_uri);
                let fields: Vec<(String, String)> = instruction
                    .parameters
                    .iter()
                    .filter(|(k, _)| k != response_names::REDIRECT_URI)
                    .cloned()
                    .collect();
                build_redirect(target, &fields, ResponseMode::FormPost)
            }
            Self::RedirectToAction { action, instruction } => RenderedResponse::Action {
                action: *action,
                parameters: instruction.parameters.clone(),
            },
        }
    }
}

/// Rendered authorization response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderedResponse {
    /// HTTP redirect to the location.
    Redirect(String),
    /// HTML page to return with status 200.
    Html(String),
    /// Identity server page the host must display.
    Action {
        /// Page.
        action: IdentityServerEndpoint,
        /// Parameters for the page.
        parameters: Vec<(String, String)>,
    },
}

/// Renders an error for delivery to the client's redirection URL.
#[must_use]
pub fn render_error(error: &AuthError, redirect_uri: &str, mode: ResponseMode) -> RenderedResponse {
    let response = error.to_error_response();
    let mut params = vec![("error".to_string(), response.error)];
    if let Some(desc) = response.error_description {
        params.push(("error_description".to_string(), desc));
    }
    if let Some(state) = response.state {
        params.push((response_names::STATE.to_string(), state));
    }
    build_redirect(redirect_uri, &params, mode)
}

fn build_redirect(redirect_uri: &str, params: &[(String, String)], mode: ResponseMode) -> RenderedResponse {
    let encoded_params: String = params
        .iter()
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&");

    match mode {
        ResponseMode::Query => {
            let separator = if redirect_uri.contains('?') { "&" } else { "?" };
            RenderedResponse::Redirect(format!("{redirect_uri}{separator}{encoded_params}"))
        }
        ResponseMode::Fragment => RenderedResponse::Redirect(format!("{redirect_uri}#{encoded_params}")),
        ResponseMode::FormPost => {
            let form_fields: String = params
                .iter()
                .map(|(k, v)| {
                    format!(
                        r#"<input type="hidden" name="{}" value="{}" />"#,
                        html_escape(k),
                        html_escape(v)
                    )
                })
                .collect::<Vec<_>>()
                .join("\n");

            RenderedResponse::Html(format!(
                r#"<!DOCTYPE html>
<html>
<head><title>Submitting...</title></head>
<body onload="document.forms[0].submit()">
<form method="post" action="{}">
{}
<noscript><button type="submit">Continue</button></noscript>
</form>
</body>
</html>"#,
                html_escape(redirect_uri),
                form_fields
            ))
        }
    }
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}
