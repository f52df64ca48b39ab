//! Protocol enumerations shared by clients and issued artifacts.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// OAuth 2.0 grant types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GrantType {
    /// Authorization code grant (RFC 6749 Section 4.1).
    #[serde(rename = "authorization_code")]
    AuthorizationCode,

    /// Implicit grant (RFC 6749 Section 4.2).
    #[serde(rename = "implicit")]
    Implicit,

    /// Refresh token grant (RFC 6749 Section 6).
    #[serde(rename = "refresh_token")]
    RefreshToken,

    /// Client credentials grant (RFC 6749 Section 4.4).
    #[serde(rename = "client_credentials")]
    ClientCredentials,

    /// Resource owner password credentials grant (RFC 6749 Section 4.3).
    #[serde(rename = "password")]
    Password,

    /// UMA 2.0 permission ticket grant.
    #[serde(rename = "uma_ticket")]
    UmaTicket,
}

impl GrantType {
    /// Returns the registered grant type name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AuthorizationCode => "authorization_code",
            Self::Implicit => "implicit",
            Self::RefreshToken => "refresh_token",
            Self::ClientCredentials => "client_credentials",
            Self::Password => "password",
            Self::UmaTicket => "uma_ticket",
        }
    }
}

impl fmt::Display for GrantType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GrantType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "authorization_code" => Ok(Self::AuthorizationCode),
            "implicit" => Ok(Self::Implicit),
            "refresh_token" => Ok(Self::RefreshToken),
            "client_credentials" => Ok(Self::ClientCredentials),
            "password" => Ok(Self::Password),
            "uma_ticket" => Ok(Self::UmaTicket),
            _ => Err(format!("unknown grant type: {s}")),
        }
    }
}

/// OAuth 2.0 / OpenID Connect response types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ResponseType {
    /// Authorization code response.
    #[serde(rename = "code")]
    Code,

    /// Access token issued from the authorization endpoint.
    #[serde(rename = "token")]
    Token,

    /// `OpenID` Connect - ID token.
    #[serde(rename = "id_token")]
    IdToken,
}

impl ResponseType {
    /// Returns the registered response type name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Code => "code",
            Self::Token => "token",
            Self::IdToken => "id_token",
        }
    }
}

impl fmt::Display for ResponseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResponseType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "code" => Ok(Self::Code),
            "token" => Ok(Self::Token),
            "id_token" => Ok(Self::IdToken),
            _ => Err(format!("unknown response type: {s}")),
        }
    }
}

/// PKCE code challenge methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CodeChallengeMethod {
    /// Plain code verifier.
    #[serde(rename = "plain")]
    Plain,

    /// SHA-256 hash of code verifier.
    #[serde(rename = "S256")]
    #[default]
    S256,
}

impl fmt::Display for CodeChallengeMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Plain => write!(f, "plain"),
            Self::S256 => write!(f, "S256"),
        }
    }
}

impl FromStr for CodeChallengeMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "plain" => Ok(Self::Plain),
            "S256" => Ok(Self::S256),
            _ => Err(format!("unknown code challenge method: {s}")),
        }
    }
}
