//! Authorization flow types and protocol names.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use idp_model::ResponseType;
use serde::{Deserialize, Serialize};

/// Authorization flow derived from the requested response types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthorizationFlow {
    /// `code` (RFC 6749 Section 4.1).
    AuthorizationCode,
    /// `id_token` or `id_token token` (OIDC Core Section 3.2).
    Implicit,
    /// `code` combined with `id_token` and/or `token` (OIDC Core Section 3.3).
    Hybrid,
}

impl AuthorizationFlow {
    /// Derives the flow from a set of response types.
    ///
    /// Returns `None` for combinations that name no flow, such as `token`
    /// alone.
    #[must_use]
    pub fn from_response_types(types: &BTreeSet<ResponseType>) -> Option<Self> {
        let has = |t| types.contains(&t);
        let code = has(ResponseType::Code);
        let token = has(ResponseType::Token);
        let id_token = has(ResponseType::IdToken);

        match (code, id_token, token) {
            (true, false, false) => Some(Self::AuthorizationCode),
            (false, true, _) => Some(Self::Implicit),
            (true, true, _) | (true, false, true) => Some(Self::Hybrid),
            _ => None,
        }
    }

    /// Default response mode of the flow.
    #[must_use]
    pub const fn default_response_mode(self) -> ResponseMode {
        match self {
            Self::AuthorizationCode => ResponseMode::Query,
            Self::Implicit | Self::Hybrid => ResponseMode::Fragment,
        }
    }

    /// Name used in logs and events.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AuthorizationCode => "authorization_code",
            Self::Implicit => "implicit",
            Self::Hybrid => "hybrid",
        }
    }
}

impl fmt::Display for AuthorizationFlow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// OAuth 2.0 response modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseMode {
    /// Query string parameters (default for code).
    Query,
    /// Fragment parameters (default for implicit and hybrid).
    Fragment,
    /// Auto-submitted HTML form.
    FormPost,
}

impl fmt::Display for ResponseMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Query => "query",
            Self::Fragment => "fragment",
            Self::FormPost => "form_post",
        };
        write!(f, "{s}")
    }
}

impl FromStr for ResponseMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "query" => Ok(Self::Query),
            "fragment" => Ok(Self::Fragment),
            "form_post" => Ok(Self::FormPost),
            _ => Err(format!("unknown response mode: {s}")),
        }
    }
}

/// OIDC `prompt` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Prompt {
    /// No interaction allowed.
    None,
    /// Force re-authentication.
    Login,
    /// Force consent.
    Consent,
    /// Account selection.
    SelectAccount,
}

impl fmt::Display for Prompt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::None => "none",
            Self::Login => "login",
            Self::Consent => "consent",
            Self::SelectAccount => "select_account",
        };
        write!(f, "{s}")
    }
}

impl FromStr for Prompt {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(Self::None),
            "login" => Ok(Self::Login),
            "consent" => Ok(Self::Consent),
            "select_account" => Ok(Self::SelectAccount),
            _ => Err(format!("unknown prompt: {s}")),
        }
    }
}

/// Authorization request parameter names.
pub mod parameter_names {
    /// `client_id`.
    pub const CLIENT_ID: &str = "client_id";
    /// `scope`.
    pub const SCOPE: &str = "scope";
    /// `redirect_uri`.
    pub const REDIRECT_URI: &str = "redirect_uri";
    /// `response_type`.
    pub const RESPONSE_TYPE: &str = "response_type";
    /// `nonce`.
    pub const NONCE: &str = "nonce";
}

/// Authorization response parameter names.
pub mod response_names {
    /// Authorization code.
    pub const CODE: &str = "code";
    /// Access token.
    pub const ACCESS_TOKEN: &str = "access_token";
    /// Access token type.
    pub const TOKEN_TYPE: &str = "token_type";
    /// Access token lifetime.
    pub const EXPIRES_IN: &str = "expires_in";
    /// Identity token.
    pub const ID_TOKEN: &str = "id_token";
    /// Request state.
    pub const STATE: &str = "state";
    /// Redirection URL, for `form_post`.
    pub const REDIRECT_URI: &str = "redirect_uri";
}

/// Registered JWT and identity token claim names.
pub mod claim_names {
    /// Issuer.
    pub const ISSUER: &str = "iss";
    /// Audiences.
    pub const AUDIENCES: &str = "aud";
    /// Expiration time.
    pub const EXPIRATION_TIME: &str = "exp";
    /// Issued at.
    pub const ISSUED_AT: &str = "iat";
    /// Authentication time.
    pub const AUTH_TIME: &str = "auth_time";
    /// Nonce.
    pub const NONCE: &str = "nonce";
    /// Authentication context class reference.
    pub const ACR: &str = "acr";
    /// Authentication methods references.
    pub const AMR: &str = "amr";
    /// Authorized party.
    pub const AZP: &str = "azp";
    /// Authorization code hash.
    pub const C_HASH: &str = "c_hash";
    /// Access token hash.
    pub const AT_HASH: &str = "at_hash";
    /// Subject.
    pub const SUBJECT: &str = "sub";

    /// Standard resource owner claims (OIDC Core Section 5.1).
    pub const RESOURCE_OWNER: &[&str] = &[
        "sub",
        "name",
        "given_name",
        "family_name",
        "middle_name",
        "nickname",
        "preferred_username",
        "profile",
        "picture",
        "website",
        "email",
        "email_verified",
        "gender",
        "birthdate",
        "zoneinfo",
        "locale",
        "phone_number",
        "phone_number_verified",
        "address",
        "updated_at",
        "role",
    ];

    /// Checks whether `name` is a standard resource owner claim.
    #[must_use]
    pub fn is_resource_owner_claim(name: &str) -> bool {
        RESOURCE_OWNER.contains(&name)
    }
}

/// Scope names with protocol meaning.
pub mod scope_names {
    /// `openid`.
    pub const OPENID: &str = "openid";
}

/// `acr` value for password authentication.
pub const ACR_PASSWORD: &str = "openid.pape.auth_level.ns.password=1";

/// `amr` value used when the request carries no `amr_values`.
pub const AMR_PASSWORD: &str = "password";
