//! Authorization flow integration tests.

use idp_integration_tests::{
    alice, TestEnv, CODE_CLIENT, HYBRID_CLIENT, IMPLICIT_CLIENT, PKCE_CLIENT, REDIRECT_URI,
};
use idp_oidc::{
    render_error, AuthErrorCode, IdentityServerEndpoint, PkceVerifier, Principal, RenderedResponse, ResponseMode,
};
use idp_storage::AuthorizationCodeStore;
use url::Url;

fn query(pairs: &[(&str, &str)]) -> String {
    let mut url = Url::parse("https://idp.test/authorize").unwrap();
    url.query_pairs_mut().extend_pairs(pairs);
    url.query().unwrap_or_default().to_string()
}

fn code_query(client_id: &str) -> String {
    query(&[
        ("response_type", "code"),
        ("client_id", client_id),
        ("scope", "openid email"),
        ("redirect_uri", REDIRECT_URI),
        ("state", "af0ifjsldkj"),
    ])
}

fn redirect_parameters(response: &RenderedResponse) -> Vec<(String, String)> {
    let RenderedResponse::Redirect(location) = response else {
        panic!("expected a redirect, got {response:?}");
    };
    let url = Url::parse(location).unwrap();
    match url.fragment() {
        Some(fragment) => url::form_urlencoded::parse(fragment.as_bytes()).into_owned().collect(),
        None => url.query_pairs().into_owned().collect(),
    }
}

fn find<'a>(params: &'a [(String, String)], name: &str) -> Option<&'a str> {
    params.iter().find(|(k, _)| k == name).map(|(_, v)| v.as_str())
}

/// Walks a user agent through sign in and consent to the code callback.
#[tokio::test]
async fn test_code_flow_end_to_end() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;
    let request = code_query(CODE_CLIENT);

    let first = env
        .actions
        .get_authorization_for_query(&request, &Principal::anonymous())
        .await?;
    assert_eq!(first.action(), Some(IdentityServerEndpoint::AuthenticateIndex));

    let second = env.actions.get_authorization_for_query(&request, &alice()).await?;
    assert_eq!(second.action(), Some(IdentityServerEndpoint::ConsentIndex));

    env.consent("alice", CODE_CLIENT, &["openid", "email"]).await;
    let callback = env.actions.get_authorization_for_query(&request, &alice()).await?;
    assert!(callback.is_callback());

    let rendered = callback.render(REDIRECT_URI);
    let RenderedResponse::Redirect(location) = &rendered else {
        panic!("expected a redirect");
    };
    assert!(location.starts_with(&format!("{REDIRECT_URI}?")));

    let params = redirect_parameters(&rendered);
    let code = find(&params, "code").expect("code parameter");
    assert!(!code.is_empty());
    assert_eq!(find(&params, "state"), Some("af0ifjsldkj"));
    assert!(find(&params, "error").is_none());
    assert!(find(&params, "access_token").is_none());

    let stored = env.codes.get(code).await?.expect("stored code");
    assert_eq!(stored.client_id, CODE_CLIENT);
    assert_eq!(stored.redirect_uri, REDIRECT_URI);
    assert_eq!(
        stored.userinfo_payload.as_ref().and_then(|p| p.get("email")),
        Some(&serde_json::json!("alice@example.com"))
    );
    Ok(())
}

/// Codes issued to PKCE clients only redeem with the matching verifier.
#[tokio::test]
async fn test_pkce_code_flow() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;
    env.consent("alice", PKCE_CLIENT, &["openid"]).await;

    let without = query(&[
        ("response_type", "code"),
        ("client_id", PKCE_CLIENT),
        ("scope", "openid"),
        ("redirect_uri", REDIRECT_URI),
    ]);
    let err = env.actions.get_authorization_for_query(&without, &alice()).await.unwrap_err();
    assert_eq!(err.code, AuthErrorCode::InvalidRequest);

    let with = query(&[
        ("response_type", "code"),
        ("client_id", PKCE_CLIENT),
        ("scope", "openid"),
        ("redirect_uri", REDIRECT_URI),
        ("code_challenge", "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM"),
        ("code_challenge_method", "S256"),
    ]);
    let result = env.actions.get_authorization_for_query(&with, &alice()).await?;
    let code = result.instruction().parameter("code").expect("code parameter");

    let stored = env.codes.get(code).await?.expect("stored code");
    assert!(PkceVerifier::verify_code(&stored, Some("dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk")).is_ok());
    assert!(PkceVerifier::verify_code(&stored, Some("wrong-verifier-wrong-verifier-wrong-verifier")).is_err());
    assert!(PkceVerifier::verify_code(&stored, None).is_err());
    Ok(())
}

/// An implicit request without nonce fails before anything is issued.
#[tokio::test]
async fn test_implicit_flow_requires_nonce() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;
    env.consent("alice", IMPLICIT_CLIENT, &["openid"]).await;
    let request = query(&[
        ("response_type", "id_token"),
        ("client_id", IMPLICIT_CLIENT),
        ("scope", "openid"),
        ("redirect_uri", REDIRECT_URI),
        ("state", "s-1"),
    ]);

    let err = env.actions.get_authorization_for_query(&request, &alice()).await.unwrap_err();
    assert_eq!(err.code, AuthErrorCode::InvalidRequest);
    assert_eq!(err.message, "the parameter nonce is missing");
    assert_eq!(err.state.as_deref(), Some("s-1"));
    assert!(env.tokens.is_empty().await);
    assert!(env.codes.is_empty().await);
    Ok(())
}

/// Clients are held to the grant types they registered.
#[tokio::test]
async fn test_grant_type_mismatch() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;

    let err = env
        .actions
        .get_authorization_for_query(&code_query(IMPLICIT_CLIENT), &alice())
        .await
        .unwrap_err();
    assert_eq!(err.code, AuthErrorCode::UnauthorizedClient);
    assert!(err.message.contains("authorization_code"), "{}", err.message);
    assert_eq!(err.state.as_deref(), Some("af0ifjsldkj"));

    let implicit = query(&[
        ("response_type", "id_token"),
        ("client_id", CODE_CLIENT),
        ("scope", "openid"),
        ("redirect_uri", REDIRECT_URI),
        ("nonce", "n"),
    ]);
    let err = env.actions.get_authorization_for_query(&implicit, &alice()).await.unwrap_err();
    assert_eq!(err.code, AuthErrorCode::UnauthorizedClient);
    assert_eq!(err.message, "the client code-client doesn't support the grant type implicit");
    Ok(())
}

/// `prompt=none` with nobody signed in redirects back with an error.
#[tokio::test]
async fn test_prompt_none_requires_login() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;
    let request = query(&[
        ("response_type", "code"),
        ("client_id", CODE_CLIENT),
        ("scope", "openid"),
        ("redirect_uri", REDIRECT_URI),
        ("state", "quiet"),
        ("prompt", "none"),
    ]);

    let err = env
        .actions
        .get_authorization_for_query(&request, &Principal::anonymous())
        .await
        .unwrap_err();
    assert_eq!(err.code, AuthErrorCode::LoginRequired);
    assert_eq!(err.state.as_deref(), Some("quiet"));
    assert!(err.is_redirectable());

    let params = redirect_parameters(&render_error(&err, REDIRECT_URI, ResponseMode::Query));
    assert_eq!(find(&params, "error"), Some("login_required"));
    assert_eq!(find(&params, "state"), Some("quiet"));
    Ok(())
}

/// The hybrid response carries a code, an access token, and an encrypted
/// identity token bound to both.
#[tokio::test]
async fn test_hybrid_flow() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;
    env.consent("alice", HYBRID_CLIENT, &["openid", "profile"]).await;
    let request = query(&[
        ("response_type", "code id_token token"),
        ("client_id", HYBRID_CLIENT),
        ("scope", "openid profile"),
        ("redirect_uri", REDIRECT_URI),
        ("state", "h"),
        ("nonce", "n-0S6_WzA2Mj"),
    ]);

    let result = env.actions.get_authorization_for_query(&request, &alice()).await?;
    let rendered = result.render(REDIRECT_URI);
    let RenderedResponse::Redirect(location) = &rendered else {
        panic!("expected a redirect");
    };
    assert!(location.starts_with(&format!("{REDIRECT_URI}#")));

    let params = redirect_parameters(&rendered);
    assert!(find(&params, "code").is_some());
    assert_eq!(find(&params, "token_type"), Some("Bearer"));
    assert_eq!(find(&params, "expires_in"), Some("300"));

    let parser = env.parser()?;
    let id_token = find(&params, "id_token").expect("id_token parameter");
    assert!(parser.is_jwe(id_token));
    let jws = parser.decrypt(id_token).await?.expect("decryptable id_token");
    let payload = parser.unsign(&jws).await?.expect("verifiable id_token");

    assert_eq!(payload.subject(), Some("alice"));
    assert_eq!(payload.get_str("name"), Some("Alice Liddell"));
    assert_eq!(payload.get_str("nonce"), Some("n-0S6_WzA2Mj"));
    assert!(payload.contains("c_hash"));
    assert!(payload.contains("at_hash"));
    assert!(payload.audiences().contains(&HYBRID_CLIENT.to_string()));
    assert_eq!(env.tokens.len().await, 1);
    Ok(())
}

/// `form_post` answers with an auto-submitting form aimed at the client.
#[tokio::test]
async fn test_form_post_response_mode() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;
    env.consent("alice", CODE_CLIENT, &["openid"]).await;
    let request = query(&[
        ("response_type", "code"),
        ("client_id", CODE_CLIENT),
        ("scope", "openid"),
        ("redirect_uri", REDIRECT_URI),
        ("state", "fp"),
        ("response_mode", "form_post"),
    ]);

    let result = env.actions.get_authorization_for_query(&request, &alice()).await?;
    assert_eq!(result.action(), Some(IdentityServerEndpoint::FormIndex));

    let RenderedResponse::Html(html) = result.render("https://unused.example") else {
        panic!("expected an HTML form");
    };
    assert!(html.contains(r#"action="https://app.example/callback""#));
    assert!(html.contains(r#"name="code""#));
    assert!(html.contains(r#"name="state" value="fp""#));
    assert!(!html.contains(r#"name="redirect_uri""#));
    Ok(())
}

/// Unknown clients never reach a flow.
#[tokio::test]
async fn test_unknown_client() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;

    let err = env
        .actions
        .get_authorization_for_query(&code_query("nobody"), &alice())
        .await
        .unwrap_err();
    assert_eq!(err.code, AuthErrorCode::InvalidClient);
    assert!(env
        .events
        .find(idp_core::EventType::StartAuthorization)
        .is_none());
    Ok(())
}
