//! Run with
//!
//! ```not_rust
//! TRUSTGATE_ISSUERS=https://auth.example.com \
//! TRUSTGATE_WEBHOOK_SECRET=whsec_... \
//! cargo run --example axum
//! ```

use std::sync::Arc;

use axum::{
    Extension, Router,
    body::Bytes,
    extract::{Request, State},
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    middleware::Next,
    response::Response,
    routing::{get, post},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use trustgate::{Error, TokenVerifier, TrustConfig, VerifiedIdentity, WebhookVerifier};

const SIGNATURE_HEADER: &str = "webhook-signature";

#[derive(Clone)]
struct AppState {
    verifier: TokenVerifier,
    webhooks: Option<WebhookVerifier>,
}

#[derive(Debug, miniserde::Deserialize)]
struct Event {
    id: String,
    #[serde(rename = "type")]
    kind: String,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("{}=debug,trustgate=debug", env!("CARGO_CRATE_NAME")).into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = TrustConfig::from_env().unwrap();
    let cache = Arc::new(config.key_set_cache().unwrap());

    let state = AppState {
        verifier: config.token_verifier(cache),
        webhooks: config.webhook_verifier(),
    };

    let protected = Router::new()
        .route("/me", get(handler))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            bearer_auth_middleware,
        ));

    let app = Router::new()
        .merge(protected)
        .route("/webhooks", post(webhook_handler))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:4000")
        .await
        .unwrap();
    tracing::debug!("listening on {}", listener.local_addr().unwrap());
    axum::serve(listener, app).await.unwrap();
}

/// HTTP status for a verification failure
fn status_for(error: &Error) -> StatusCode {
    match error {
        Error::KeySetUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        Error::MalformedCredential(_)
        | Error::MalformedSignatureHeader(_)
        | Error::MalformedWebhookPayload(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::UNAUTHORIZED,
    }
}

async fn bearer_auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let auth_header = request
        .headers()
        .get(AUTHORIZATION)
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let auth_str = auth_header.to_str().map_err(|_| StatusCode::BAD_REQUEST)?;

    let identity = state.verifier.verify_bearer(auth_str).await.map_err(|e| {
        tracing::warn!(reason = e.kind(), "bearer authentication failed");
        status_for(&e)
    })?;

    request.extensions_mut().insert(identity);

    Ok(next.run(request).await)
}

async fn handler(Extension(identity): Extension<VerifiedIdentity>) -> String {
    let name = identity
        .display_name()
        .unwrap_or_else(|| identity.subject().to_string());

    format!("Hello, {name}! Issued by {}", identity.issuer())
}

async fn webhook_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode, StatusCode> {
    let verifier = state.webhooks.as_ref().ok_or(StatusCode::NOT_FOUND)?;

    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok())
        .ok_or(StatusCode::BAD_REQUEST)?;

    let event: Event = verifier.verify_event(&body, signature).map_err(|e| {
        tracing::warn!(reason = e.kind(), "webhook rejected");
        status_for(&e)
    })?;

    tracing::info!(id = %event.id, kind = %event.kind, "webhook accepted");
    Ok(StatusCode::NO_CONTENT)
}
