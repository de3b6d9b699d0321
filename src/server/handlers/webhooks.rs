use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use reqwest::Url;
use serde::Deserialize;
use tracing::{info, warn};

use crate::infrastructure::rate_limit::RateLimitDecision;
use crate::outbound::webhook::send_test_webhook;
use crate::server::AppState;
use crate::server::responses::ActionResponse;

pub const URL_REQUIRED: &str = "URL is required";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TestWebhookRequest {
    #[serde(default)]
    pub url: Option<String>,

    #[serde(default)]
    pub secret: Option<String>,
}

/// `POST /api/webhooks/test`
///
/// Probe a subscriber before it is enabled. Target failures are reported
/// with 200 and `success: false`; only a bad request is a 400.
pub async fn test_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<TestWebhookRequest>, JsonRejection>,
) -> Response {
    let client_key = client_key(&headers);
    if let RateLimitDecision::Limited { retry_after } = state.rate_limiter.check(&client_key) {
        warn!(client = %client_key, "Test webhook rate limited");
        let mut response = (
            StatusCode::TOO_MANY_REQUESTS,
            Json(ActionResponse::error("Too many requests")),
        )
            .into_response();
        if let Ok(value) = HeaderValue::from_str(&retry_after.as_secs().max(1).to_string()) {
            response.headers_mut().insert(header::RETRY_AFTER, value);
        }
        return response;
    }

    let request = payload.map(|Json(body)| body).unwrap_or_default();

    let Some(url) = request.url.as_deref().and_then(valid_url) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(ActionResponse::error(URL_REQUIRED)),
        )
            .into_response();
    };

    info!(url = %url, signed = request.secret.is_some(), "Sending test webhook");

    let body = match send_test_webhook(&state.http_client, url.as_str(), request.secret.as_deref())
        .await
    {
        Ok(_) => ActionResponse::ok(),
        Err(e) => ActionResponse::error(e.to_string()),
    };

    (StatusCode::OK, Json(body)).into_response()
}

fn valid_url(raw: &str) -> Option<Url> {
    let url = Url::parse(raw.trim()).ok()?;
    match url.scheme() {
        "http" | "https" if url.has_host() => Some(url),
        _ => None,
    }
}

/// First hop of `X-Forwarded-For`, or a shared bucket when absent.
fn client_key(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or("anonymous")
        .to_string()
}
