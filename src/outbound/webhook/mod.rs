// Webhook delivery module
//
// Leaf components:
//   hmac_signer, http_client, schemas, subscription
//
// Composition:
//   dispatcher – fans one event out to matching subscriptions, all-settle
//   notifier   – turns POS domain events into background dispatches
//   test_send  – single synchronous probe used by operators

pub mod dispatcher;
pub mod hmac_signer;
pub mod http_client;
pub mod notifier;
pub mod schemas;
pub mod subscription;
pub mod test_send;

// Re-export commonly used types
pub use dispatcher::{DispatchError, Dispatcher};
pub use hmac_signer::{HmacSigner, SIGNATURE_HEADER, sign, verify};
pub use http_client::{DeliveryReceipt, HttpClientError, WebhookHttpClient};
pub use notifier::WebhookNotifier;
pub use schemas::{DeliveryOutcome, DeliveryReport, DispatchSummary, WebhookPayload};
pub use subscription::WebhookSubscription;
pub use test_send::{TEST_EVENT, send_test_webhook};
