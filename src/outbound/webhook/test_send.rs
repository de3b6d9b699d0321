use crate::outbound::webhook::hmac_signer::HmacSigner;
use crate::outbound::webhook::http_client::{DeliveryReceipt, HttpClientError, WebhookHttpClient};
use crate::outbound::webhook::schemas::WebhookPayload;
use serde_json::{Map, Value};
use tracing::{info, warn};
use uuid::Uuid;

/// Event name used for operator-triggered probes.
pub const TEST_EVENT: &str = "test";

/// Build the synthetic payload sent by a test delivery
pub fn test_payload() -> WebhookPayload {
    let mut data = Map::new();
    data.insert(
        "message".to_string(),
        Value::String("This is a test webhook from the POS back office".to_string()),
    );
    data.insert(
        "test_id".to_string(),
        Value::String(Uuid::new_v4().to_string()),
    );
    WebhookPayload::new(TEST_EVENT, data)
}

/// Send one synthetic delivery and hand the outcome back to the caller.
///
/// Unlike production dispatch, the error is returned so an operator can tell
/// an unreachable endpoint apart from one that answered with an error status.
pub async fn send_test_webhook(
    http_client: &WebhookHttpClient,
    url: &str,
    secret: Option<&str>,
) -> Result<DeliveryReceipt, HttpClientError> {
    let body = test_payload()
        .to_bytes()
        .map_err(|e| HttpClientError::RequestFailed(e.to_string()))?;

    let signature = secret
        .filter(|s| !s.is_empty())
        .map(|secret| HmacSigner::new(secret).sign(&body));

    match http_client.send(url, body, signature.as_deref()).await {
        Ok(receipt) => {
            info!(url = %url, status_code = receipt.status_code, "Test webhook delivered");
            Ok(receipt)
        }
        Err(e) => {
            warn!(url = %url, error = %e, "Test webhook failed");
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outbound::webhook::hmac_signer::{SIGNATURE_HEADER, verify};
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_payload_shape() {
        let payload = test_payload();

        assert_eq!(payload.event, "test");
        assert!(payload.data.contains_key("test_id"));
        assert_ne!(payload.data["test_id"], test_payload().data["test_id"]);
    }

    #[tokio::test]
    async fn test_signed_probe() -> Result<(), HttpClientError> {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let client = WebhookHttpClient::new()?;
        send_test_webhook(&client, &server.uri(), Some("x")).await?;

        let requests = server.received_requests().await.unwrap();
        let signature = requests[0]
            .headers
            .get(SIGNATURE_HEADER)
            .and_then(|v| v.to_str().ok())
            .expect("signature header");
        assert!(verify(&requests[0].body, signature, "x"));
        Ok(())
    }

    #[tokio::test]
    async fn test_empty_secret_sends_unsigned() -> Result<(), HttpClientError> {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let client = WebhookHttpClient::new()?;
        send_test_webhook(&client, &server.uri(), Some("")).await?;

        let requests = server.received_requests().await.unwrap();
        assert!(requests[0].headers.get(SIGNATURE_HEADER).is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_rejection_carries_status() -> Result<(), HttpClientError> {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = WebhookHttpClient::new()?;
        let err = send_test_webhook(&client, &server.uri(), None)
            .await
            .unwrap_err();

        assert_eq!(err.status_code(), Some(404));
        assert!(err.to_string().contains("404 Not Found"));
        Ok(())
    }
}
