use crate::outbound::webhook::hmac_signer::HmacSigner;
use crate::outbound::webhook::http_client::{HttpClientError, WebhookHttpClient};
use crate::outbound::webhook::schemas::{
    DeliveryOutcome, DeliveryReport, DispatchSummary, WebhookPayload,
};
use crate::outbound::webhook::subscription::WebhookSubscription;
use bytes::Bytes;
use serde_json::{Map, Value};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Fans one event out to every matching subscription.
///
/// Each matching subscription gets exactly one delivery attempt. Attempts run
/// as independent tasks and are joined with an all-settle barrier, so a slow
/// or failing subscriber never holds back the others. Failures are logged and
/// reported in the returned [`DispatchSummary`], never propagated.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    /// HTTP client reused across all requests.
    http_client: Arc<WebhookHttpClient>,
}

impl Dispatcher {
    /// Create a `Dispatcher` with the default HTTP client.
    pub fn new() -> Result<Self, DispatchError> {
        let http_client = WebhookHttpClient::new()
            .map_err(|e| DispatchError::Initialisation(e.to_string()))?;

        Ok(Self::with_client(http_client))
    }

    pub fn with_client(http_client: WebhookHttpClient) -> Self {
        Self {
            http_client: Arc::new(http_client),
        }
    }

    pub fn http_client(&self) -> &WebhookHttpClient {
        &self.http_client
    }

    /// Deliver `event` to every enabled subscription listing it.
    ///
    /// Attempts are spawned before the first await. Cancelling the returned
    /// future only discards the summary; started deliveries still run to
    /// completion.
    pub async fn dispatch(
        &self,
        event: &str,
        data: Map<String, Value>,
        subscriptions: &[WebhookSubscription],
    ) -> DispatchSummary {
        let mut summary = DispatchSummary {
            event: event.to_string(),
            reports: Vec::new(),
        };

        let matching: Vec<&WebhookSubscription> = subscriptions
            .iter()
            .filter(|s| s.matches_event(event))
            .collect();

        if matching.is_empty() {
            debug!(event = %event, "No subscriptions matched – event dropped");
            return summary;
        }

        // One serialization per dispatch; every attempt signs and sends these bytes.
        let body = match WebhookPayload::new(event, data).to_bytes() {
            Ok(body) => body,
            Err(e) => {
                error!(event = %event, error = %e, "Failed to serialise webhook payload – skipping");
                return summary;
            }
        };

        // Detached tasks: dropping this future stops the waiting, not the deliveries.
        let attempts: Vec<JoinHandle<DeliveryReport>> = matching
            .into_iter()
            .map(|sub| {
                let http_client = self.http_client.clone();
                let body = body.clone();
                let sub = sub.clone();
                tokio::spawn(async move { Self::attempt(&http_client, &sub, body).await })
            })
            .collect();

        for attempt in attempts {
            match attempt.await {
                Ok(report) => summary.reports.push(report),
                Err(e) => error!(event = %event, error = %e, "Delivery task aborted"),
            }
        }

        info!(
            event = %event,
            attempted = summary.attempted(),
            succeeded = summary.succeeded(),
            failed = summary.failed(),
            "Dispatch settled"
        );

        summary
    }

    /// Fire-and-forget variant: the caller gets a handle it may ignore.
    pub fn spawn_dispatch(
        &self,
        event: impl Into<String>,
        data: Map<String, Value>,
        subscriptions: Vec<WebhookSubscription>,
    ) -> JoinHandle<DispatchSummary> {
        let dispatcher = self.clone();
        let event = event.into();
        tokio::spawn(async move { dispatcher.dispatch(&event, data, &subscriptions).await })
    }

    /// One delivery attempt to one subscription.
    async fn attempt(
        http_client: &WebhookHttpClient,
        sub: &WebhookSubscription,
        body: Bytes,
    ) -> DeliveryReport {
        let signature = sub
            .secret
            .as_deref()
            .map(|secret| HmacSigner::new(secret).sign(&body));

        let outcome = match http_client.send(&sub.url, body, signature.as_deref()).await {
            Ok(receipt) => {
                info!(
                    subscription_id = %sub.id,
                    url = %sub.url,
                    status_code = receipt.status_code,
                    response_time_ms = receipt.response_time_ms,
                    "Webhook delivered successfully"
                );
                DeliveryOutcome::Delivered {
                    status_code: receipt.status_code,
                    response_time_ms: receipt.response_time_ms,
                }
            }
            Err(e) => {
                warn!(
                    subscription_id = %sub.id,
                    url = %sub.url,
                    error = %e,
                    "Webhook delivery failed"
                );
                failure_outcome(&e)
            }
        };

        DeliveryReport {
            subscription_id: sub.id.clone(),
            url: sub.url.clone(),
            outcome,
        }
    }
}

fn failure_outcome(err: &HttpClientError) -> DeliveryOutcome {
    DeliveryOutcome::Failed {
        status_code: err.status_code(),
        error: err.to_string(),
    }
}

/// Errors that can occur while setting up a `Dispatcher`.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("Initialisation failed: {0}")]
    Initialisation(String),
}
