/*
   This module specifies the API by which the webhook subsystem reaches its collaborators.
*/

use crate::outbound::webhook::WebhookSubscription;
use async_trait::async_trait;

/// Error type for subscription store operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Failed to load subscriptions: {0}")]
    LoadError(String),

    #[error("Connection error: {0}")]
    ConnectionError(String),
}

/// Source of webhook subscription configuration.
///
/// Implementations return a snapshot; the dispatcher never writes back.
#[async_trait]
pub trait SubscriptionStore: Send + Sync {
    async fn list_subscriptions(&self) -> Result<Vec<WebhookSubscription>, StoreError>;
}
