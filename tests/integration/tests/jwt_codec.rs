//! JWT codec integration tests over the server key repository.

use idp_core::Config;
use idp_crypto::{JweAlg, JweEnc, JwsAlg};
use idp_integration_tests::{signing_key, TestEnv, SIGNING_ALGORITHMS};
use idp_oidc::jwt::read_header;
use idp_oidc::JwsPayload;
use idp_storage::JsonWebKeyRepository;
use serde_json::json;

fn payload() -> JwsPayload {
    let mut payload = JwsPayload::new();
    payload.add("sub", "alice").unwrap();
    payload.add("aud", json!(["code-client", "https://idp.test"])).unwrap();
    payload.add("iat", 1_700_000_000).unwrap();
    payload
}

/// Every supported algorithm verifies what it signed.
#[tokio::test]
async fn test_sign_unsign_round_trip() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;
    let generator = env.generator();
    let parser = env.parser()?;

    for alg in SIGNING_ALGORITHMS {
        let token = generator.sign(&payload(), alg).await?;
        let header = read_header(&token).expect("readable header");
        assert_eq!(header.alg, alg.jwa_name());
        assert_eq!(header.kid, Some(signing_key(alg).kid));
        assert_eq!(parser.unsign(&token).await?, Some(payload()), "{alg}");
    }
    Ok(())
}

/// Unsigned tokens round trip only where the capability is switched on.
#[tokio::test]
async fn test_unsigned_tokens_follow_the_capability() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;
    let token = env.generator().sign(&payload(), JwsAlg::None).await?;
    assert!(token.ends_with('.'));
    assert_eq!(env.parser()?.unsign(&token).await?, None);

    let mut config = Config::for_testing();
    config.crypto.allow_unsigned_tokens = true;
    let permissive = TestEnv::with_config(config).await?;
    assert_eq!(permissive.parser()?.unsign(&token).await?, Some(payload()));
    Ok(())
}

/// Key lookups are stable and RS256 signatures are reproducible.
#[tokio::test]
async fn test_keys_and_rs256_are_deterministic() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;

    let first = env.keys.get_by_kid("rs256").await?;
    let second = env.keys.get_by_kid("rs256").await?;
    assert!(first.is_some());
    assert_eq!(first, second);

    let generator = env.generator();
    let a = generator.sign(&payload(), JwsAlg::Rs256).await?;
    let b = generator.sign(&payload(), JwsAlg::Rs256).await?;
    assert_eq!(a, b);
    Ok(())
}

/// Sign-then-encrypt nests a JWS inside a JWE the server can open.
#[tokio::test]
async fn test_encrypt_decrypt_nested_token() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;
    let generator = env.generator();
    let parser = env.parser()?;

    let jws = generator.sign(&payload(), JwsAlg::Ps256).await?;
    for enc in JweEnc::ALL {
        let jwe = generator.encrypt(&jws, JweAlg::A128Kw, enc).await?;
        assert!(parser.is_jwe(&jwe));
        assert!(!parser.is_jws(&jwe));

        let inner = parser.decrypt(&jwe).await?.expect("decryptable token");
        assert_eq!(inner, jws);
    }

    assert!(generator.encrypt(&jws, JweAlg::RsaOaep, JweEnc::A128Gcm).await.is_err());
    Ok(())
}

/// Malformed input degrades to an empty result rather than an error.
#[tokio::test]
async fn test_malformed_tokens_yield_nothing() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;
    let parser = env.parser()?;

    assert_eq!(parser.unsign("not.a.token").await?, None);
    assert_eq!(parser.unsign("").await?, None);
    assert_eq!(parser.decrypt("a.b.c.d.e").await?, None);
    Ok(())
}
