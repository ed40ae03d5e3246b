//! End-to-end bearer credential verification
//!
//! Each test runs a mockito server acting as the issuer and publishing its
//! key set, then verifies RS256 credentials signed with locally generated
//! keys. Time is driven by a shared `ManualClock`.

mod fixtures;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use fixtures::{TokenBuilder, jwks_json, now, primary_key, rotated_key};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use trustgate::{
    Clock, Error, HttpKeySetFetcher, IssuerPattern, JwksLocation, KeySetCache, ManualClock,
    TokenVerifier,
};

const JWKS_PATH: &str = "/.well-known/jwks.json";

/// Verifier trusting exactly `issuer`, with a cache on `clock`
fn verifier_for(issuer: &str, clock: &ManualClock) -> TokenVerifier {
    let cache = KeySetCache::builder(HttpKeySetFetcher::new(reqwest::Client::new()))
        .clock(Arc::new(clock.clone()))
        .build();
    TokenVerifier::new(Arc::new(cache))
        .trusted_issuers([IssuerPattern::parse(issuer).unwrap()])
        .build()
}

#[tokio::test]
async fn test_valid_credential() {
    let mut server = mockito::Server::new_async().await;
    let jwks = server
        .mock("GET", JWKS_PATH)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(jwks_json(&[primary_key()]))
        .expect(1)
        .create_async()
        .await;

    let clock = ManualClock::new(now());
    let verifier = verifier_for(&server.url(), &clock);
    let token = TokenBuilder::new(&server.url())
        .expiration(clock.now() + 600)
        .claim("email", json!("ada@example.com"))
        .claim("given_name", json!("Ada"))
        .claim("family_name", json!("Lovelace"))
        .sign();

    let identity = verifier.verify(&token).await.expect("credential verifies");
    assert_eq!(identity.subject(), "user_123");
    assert_eq!(identity.issuer(), server.url());
    assert_eq!(identity.email(), Some("ada@example.com"));
    assert_eq!(identity.display_name().as_deref(), Some("Ada Lovelace"));

    // Second request is served from the cache
    let header = format!("Bearer {token}");
    assert!(verifier.verify_bearer(&header).await.is_ok());
    jwks.assert_async().await;
}

#[tokio::test]
async fn test_wrong_segment_count_never_fetches() {
    let mut server = mockito::Server::new_async().await;
    let jwks = server.mock("GET", JWKS_PATH).expect(0).create_async().await;

    let clock = ManualClock::new(now());
    let verifier = verifier_for(&server.url(), &clock);
    let token = TokenBuilder::new(&server.url())
        .expiration(clock.now() + 600)
        .sign();
    let parts: Vec<&str> = token.split('.').collect();

    for malformed in [
        String::new(),
        parts[0].to_string(),
        parts[..2].join("."),
        format!("{token}.{}", parts[2]),
        format!("{token}.x.y"),
        format!("{}..{}", parts[0], parts[2]),
    ] {
        assert!(
            matches!(
                verifier.verify(&malformed).await,
                Err(Error::MalformedCredential(_))
            ),
            "{malformed:?} should be malformed"
        );
    }
    jwks.assert_async().await;
}

#[tokio::test]
async fn test_expiry_is_exclusive() {
    let mut server = mockito::Server::new_async().await;
    let _jwks = server
        .mock("GET", JWKS_PATH)
        .with_status(200)
        .with_body(jwks_json(&[primary_key()]))
        .create_async()
        .await;

    let clock = ManualClock::new(now());
    let verifier = verifier_for(&server.url(), &clock);
    let at = clock.now();

    let token = TokenBuilder::new(&server.url()).expiration(at).sign();
    assert_eq!(
        verifier.verify(&token).await,
        Err(Error::TokenExpired {
            expired_at: at,
            now: at,
        })
    );

    let token = TokenBuilder::new(&server.url()).expiration(at + 1).sign();
    assert!(verifier.verify(&token).await.is_ok());
}

#[tokio::test]
async fn test_expired_regardless_of_signature() {
    let clock = ManualClock::new(now());
    let cache = KeySetCache::builder(HttpKeySetFetcher::new(reqwest::Client::new()))
        .clock(Arc::new(clock.clone()))
        .build();
    let verifier = TokenVerifier::new(Arc::new(cache))
        .issuer(|iss| iss == "https://trusted.example")
        .build();

    let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"RS256","kid":"key-1"}"#);
    let claims = URL_SAFE_NO_PAD.encode(format!(
        r#"{{"sub":"u1","iss":"https://trusted.example","exp":{}}}"#,
        clock.now() - 60
    ));
    let token = format!("{header}.{claims}.c2ln");

    assert!(matches!(
        verifier.verify(&token).await,
        Err(Error::TokenExpired { .. })
    ));
}

#[tokio::test]
async fn test_any_signature_bit_flip_is_rejected() {
    let mut server = mockito::Server::new_async().await;
    let jwks = server
        .mock("GET", JWKS_PATH)
        .with_status(200)
        .with_body(jwks_json(&[primary_key()]))
        .expect(1)
        .create_async()
        .await;

    let clock = ManualClock::new(now());
    let verifier = verifier_for(&server.url(), &clock);
    let token = TokenBuilder::new(&server.url())
        .expiration(clock.now() + 600)
        .sign();
    assert!(verifier.verify(&token).await.is_ok());

    let (signing_input, signature_b64) = token.rsplit_once('.').unwrap();
    let signature = URL_SAFE_NO_PAD.decode(signature_b64).unwrap();

    for bit in 0..signature.len() * 8 {
        let mut flipped = signature.clone();
        flipped[bit / 8] ^= 1 << (bit % 8);
        let forged = format!("{signing_input}.{}", URL_SAFE_NO_PAD.encode(&flipped));
        assert_eq!(
            verifier.verify(&forged).await,
            Err(Error::SignatureInvalid),
            "bit {bit}"
        );
    }
    jwks.assert_async().await;
}

#[tokio::test]
async fn test_signature_from_other_key_is_rejected() {
    let mut server = mockito::Server::new_async().await;
    let _jwks = server
        .mock("GET", JWKS_PATH)
        .with_status(200)
        .with_body(jwks_json(&[primary_key()]))
        .create_async()
        .await;

    let clock = ManualClock::new(now());
    let verifier = verifier_for(&server.url(), &clock);

    // Claims kid key-1 but signed by key-2
    let token = TokenBuilder::new(&server.url())
        .expiration(clock.now() + 600)
        .sign_with(rotated_key());
    assert_eq!(verifier.verify(&token).await, Err(Error::SignatureInvalid));
}

#[tokio::test]
async fn test_header_checks_run_before_fetch() {
    let mut server = mockito::Server::new_async().await;
    let jwks = server.mock("GET", JWKS_PATH).expect(0).create_async().await;

    let clock = ManualClock::new(now());
    let verifier = verifier_for(&server.url(), &clock);
    let exp = clock.now() + 600;

    let token = TokenBuilder::new(&server.url())
        .expiration(exp)
        .without_header("kid")
        .sign();
    assert_eq!(verifier.verify(&token).await, Err(Error::KeyIdMissing));

    for alg in ["none", "HS256", "RS512", "ES256"] {
        let token = TokenBuilder::new(&server.url())
            .expiration(exp)
            .header("alg", json!(alg))
            .sign();
        assert_eq!(
            verifier.verify(&token).await,
            Err(Error::AlgorithmUnsupported(alg.into()))
        );
    }

    let token = TokenBuilder::new(&server.url())
        .expiration(exp)
        .without_claim("iss")
        .sign();
    assert_eq!(verifier.verify(&token).await, Err(Error::IssuerMissing));

    let token = TokenBuilder::new("https://attacker.example")
        .expiration(exp)
        .sign();
    assert_eq!(
        verifier.verify(&token).await,
        Err(Error::UntrustedIssuer("https://attacker.example".into()))
    );

    jwks.assert_async().await;
}

#[tokio::test]
async fn test_key_rotation_picked_up_after_ttl() {
    let mut server = mockito::Server::new_async().await;
    let before = server
        .mock("GET", JWKS_PATH)
        .with_status(200)
        .with_body(jwks_json(&[primary_key()]))
        .expect(1)
        .create_async()
        .await;

    let clock = ManualClock::new(now());
    let verifier = verifier_for(&server.url(), &clock);
    let rotated = TokenBuilder::new(&server.url())
        .expiration(clock.now() + 7_200)
        .header("kid", json!(rotated_key().kid))
        .sign_with(rotated_key());

    // Key not yet published
    assert_eq!(
        verifier.verify(&rotated).await,
        Err(Error::SigningKeyNotFound("key-2".into()))
    );
    before.assert_async().await;
    before.remove_async().await;

    let after = server
        .mock("GET", JWKS_PATH)
        .with_status(200)
        .with_body(jwks_json(&[primary_key(), rotated_key()]))
        .expect(1)
        .create_async()
        .await;

    // Still within the TTL: the cached set is served
    clock.advance(3_599);
    assert_eq!(
        verifier.verify(&rotated).await,
        Err(Error::SigningKeyNotFound("key-2".into()))
    );

    clock.advance(1);
    assert!(verifier.verify(&rotated).await.is_ok());
    after.assert_async().await;
}

#[tokio::test]
async fn test_failed_refresh_never_serves_stale_keys() {
    let mut server = mockito::Server::new_async().await;
    let healthy = server
        .mock("GET", JWKS_PATH)
        .with_status(200)
        .with_body(jwks_json(&[primary_key()]))
        .expect(1)
        .create_async()
        .await;

    let clock = ManualClock::new(now());
    let verifier = verifier_for(&server.url(), &clock);
    let token = TokenBuilder::new(&server.url())
        .expiration(clock.now() + 7_200)
        .sign();

    assert!(verifier.verify(&token).await.is_ok());
    healthy.assert_async().await;
    healthy.remove_async().await;

    let _failing = server
        .mock("GET", JWKS_PATH)
        .with_status(503)
        .create_async()
        .await;

    clock.advance(3_600);
    assert!(matches!(
        verifier.verify(&token).await,
        Err(Error::KeySetUnavailable(msg)) if msg.contains("status 503")
    ));
}

#[tokio::test]
async fn test_issuers_have_independent_key_sets() {
    let mut first = mockito::Server::new_async().await;
    let mut second = mockito::Server::new_async().await;
    let _first_jwks = first
        .mock("GET", JWKS_PATH)
        .with_status(200)
        .with_body(jwks_json(&[primary_key()]))
        .create_async()
        .await;
    let _second_jwks = second
        .mock("GET", JWKS_PATH)
        .with_status(200)
        .with_body(jwks_json(&[rotated_key()]))
        .create_async()
        .await;

    let clock = ManualClock::new(now());
    let cache = KeySetCache::builder(HttpKeySetFetcher::new(reqwest::Client::new()))
        .clock(Arc::new(clock.clone()))
        .build();
    let verifier = TokenVerifier::new(Arc::new(cache))
        .trusted_issuers([
            IssuerPattern::parse(&first.url()).unwrap(),
            IssuerPattern::parse(&second.url()).unwrap(),
        ])
        .build();
    let exp = clock.now() + 600;

    let token = TokenBuilder::new(&first.url()).expiration(exp).sign();
    assert!(verifier.verify(&token).await.is_ok());

    let token = TokenBuilder::new(&second.url())
        .expiration(exp)
        .header("kid", json!(rotated_key().kid))
        .sign_with(rotated_key());
    assert!(verifier.verify(&token).await.is_ok());

    // key-1 is only published by the first issuer
    let token = TokenBuilder::new(&second.url()).expiration(exp).sign();
    assert_eq!(
        verifier.verify(&token).await,
        Err(Error::SigningKeyNotFound("key-1".into()))
    );
}

#[tokio::test]
async fn test_discovery_location() {
    let mut server = mockito::Server::new_async().await;
    let discovery = server
        .mock("GET", "/.well-known/openid-configuration")
        .with_status(200)
        .with_body(format!(
            r#"{{"issuer":"{0}","jwks_uri":"{0}/oauth/keys"}}"#,
            server.url()
        ))
        .expect(1)
        .create_async()
        .await;
    let jwks = server
        .mock("GET", "/oauth/keys")
        .with_status(200)
        .with_body(jwks_json(&[primary_key()]))
        .expect(1)
        .create_async()
        .await;

    let fetcher = HttpKeySetFetcher::with_timeout(Duration::from_secs(5))
        .unwrap()
        .location(JwksLocation::Discovery);
    let cache = KeySetCache::new(fetcher);
    let verifier = TokenVerifier::new(Arc::new(cache))
        .trusted_issuers([IssuerPattern::parse(&server.url()).unwrap()])
        .build();

    let token = TokenBuilder::new(&server.url())
        .expiration(now() + 600)
        .sign();
    assert!(verifier.verify(&token).await.is_ok());

    discovery.assert_async().await;
    jwks.assert_async().await;
}

#[tokio::test]
async fn test_authorized_party() {
    let mut server = mockito::Server::new_async().await;
    let _jwks = server
        .mock("GET", JWKS_PATH)
        .with_status(200)
        .with_body(jwks_json(&[primary_key()]))
        .create_async()
        .await;

    let clock = ManualClock::new(now());
    let verifier = verifier_for(&server.url(), &clock)
        .authorized_parties(["https://app.example.com"])
        .build();
    let exp = clock.now() + 600;

    let token = TokenBuilder::new(&server.url())
        .expiration(exp)
        .claim("azp", json!("https://app.example.com"))
        .sign();
    assert!(verifier.verify(&token).await.is_ok());

    let token = TokenBuilder::new(&server.url())
        .expiration(exp)
        .claim("azp", json!("https://phishing.example"))
        .sign();
    assert_eq!(
        verifier.verify(&token).await,
        Err(Error::UnauthorizedParty("https://phishing.example".into()))
    );
}
