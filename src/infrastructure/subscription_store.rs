use crate::domain::ports::{StoreError, SubscriptionStore};
use crate::outbound::webhook::WebhookSubscription;
use async_trait::async_trait;
use tokio::sync::RwLock;

/// Subscription store kept in process memory.
#[derive(Debug, Default)]
pub struct InMemorySubscriptionStore {
    subscriptions: RwLock<Vec<WebhookSubscription>>,
}

impl InMemorySubscriptionStore {
    pub fn new(subscriptions: Vec<WebhookSubscription>) -> Self {
        Self {
            subscriptions: RwLock::new(subscriptions),
        }
    }

    /// Insert or replace a subscription by id
    pub async fn upsert(&self, subscription: WebhookSubscription) {
        let mut subs = self.subscriptions.write().await;
        match subs.iter_mut().find(|s| s.id == subscription.id) {
            Some(existing) => *existing = subscription,
            None => subs.push(subscription),
        }
    }

    pub async fn remove(&self, id: &str) -> bool {
        let mut subs = self.subscriptions.write().await;
        let before = subs.len();
        subs.retain(|s| s.id != id);
        subs.len() != before
    }
}

#[async_trait]
impl SubscriptionStore for InMemorySubscriptionStore {
    async fn list_subscriptions(&self) -> Result<Vec<WebhookSubscription>, StoreError> {
        Ok(self.subscriptions.read().await.clone())
    }
}
