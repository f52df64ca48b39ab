//! Verification of client-signed tokens through a published key set.

use idp_crypto::JwsAlg;
use idp_integration_tests::{client_rsa_key, TestEnv, REDIRECT_URI};
use idp_model::{Client, GrantType, JsonWebKeySet};
use idp_oidc::jwt::jws;
use idp_oidc::{JwsPayload, JwtError};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const JWKS_CLIENT: &str = "jwks-client";

fn request_object() -> JwsPayload {
    let mut payload = JwsPayload::new();
    payload.add("iss", JWKS_CLIENT).unwrap();
    payload.add("aud", "https://idp.test").unwrap();
    payload.add("scope", "openid").unwrap();
    payload
}

async fn publish(server: &MockServer, keys: JsonWebKeySet) {
    Mock::given(method("GET"))
        .and(path("/jwks"))
        .respond_with(ResponseTemplate::new(200).set_body_json(keys))
        .mount(server)
        .await;
}

async fn register_jwks_client(env: &TestEnv, server: &MockServer) -> anyhow::Result<()> {
    let client = Client::new(JWKS_CLIENT)
        .with_redirection_url(REDIRECT_URI)
        .with_grant_types([GrantType::AuthorizationCode])
        .with_jwks_uri(format!("{}/jwks", server.uri()));
    env.register(&client).await
}

/// A token signed with a published key verifies against the client.
#[tokio::test]
async fn test_verifies_with_published_key() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;
    let server = MockServer::start().await;
    let key = client_rsa_key("client-rs256");
    let public = key.to_public().expect("public half");
    publish(&server, JsonWebKeySet::with_keys(vec![public])).await;
    register_jwks_client(&env, &server).await?;

    let token = jws::sign(&request_object(), JwsAlg::Rs256, &key)?;
    let payload = env.parser()?.unsign_for_client(&token, JWKS_CLIENT).await?;
    assert_eq!(payload, Some(request_object()));
    Ok(())
}

/// A key id the client never published yields nothing.
#[tokio::test]
async fn test_unpublished_kid_yields_nothing() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;
    let server = MockServer::start().await;
    let published = client_rsa_key("published").to_public().expect("public half");
    publish(&server, JsonWebKeySet::with_keys(vec![published])).await;
    register_jwks_client(&env, &server).await?;

    let token = jws::sign(&request_object(), JwsAlg::Rs256, &client_rsa_key("rotated"))?;
    assert_eq!(env.parser()?.unsign_for_client(&token, JWKS_CLIENT).await?, None);
    Ok(())
}

/// An unreachable key set degrades to an unverifiable token.
#[tokio::test]
async fn test_failing_jwks_endpoint_yields_nothing() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;
    register_jwks_client(&env, &server).await?;

    let token = jws::sign(&request_object(), JwsAlg::Rs256, &client_rsa_key("client-rs256"))?;
    assert_eq!(env.parser()?.unsign_for_client(&token, JWKS_CLIENT).await?, None);
    Ok(())
}

/// Client-scoped verification needs a known client.
#[tokio::test]
async fn test_unknown_client_is_an_error() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;
    let token = jws::sign(&request_object(), JwsAlg::Rs256, &client_rsa_key("client-rs256"))?;
    let parser = env.parser()?;

    let err = parser.unsign_for_client(&token, "nobody").await.unwrap_err();
    assert!(matches!(err, JwtError::UnknownClient(ref id) if id == "nobody"));

    let err = parser.unsign_for_client(&token, " ").await.unwrap_err();
    assert!(matches!(err, JwtError::MissingClientId));
    Ok(())
}
