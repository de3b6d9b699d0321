use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Webhook subscription configuration
///
/// Subscriptions are owned by the configuration store and handed to the
/// dispatcher as read-only snapshots; delivery outcomes never change them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WebhookSubscription {
    pub id: String,

    pub url: String,

    /// Present means deliveries are signed.
    #[serde(skip_serializing, default)]
    pub secret: Option<String>,

    #[serde(default)]
    pub events: HashSet<String>,

    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl WebhookSubscription {
    /// Create a new, enabled subscription with no events
    pub fn new(id: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            url: url.into(),
            secret: None,
            events: HashSet::new(),
            enabled: true,
        }
    }

    /// Sign deliveries with the given secret
    pub fn with_secret(mut self, secret: impl Into<String>) -> Self {
        self.secret = Some(secret.into());
        self
    }

    /// Subscribe to specific event names
    pub fn subscribe_to<I, S>(mut self, events: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.events = events.into_iter().map(Into::into).collect();
        self
    }

    /// Add an event name to the subscription
    pub fn add_event(&mut self, event: impl Into<String>) {
        self.events.insert(event.into());
    }

    /// Whether this subscription should receive `event`.
    ///
    /// Exact membership only: no wildcards, and an empty set matches nothing.
    pub fn matches_event(&self, event: &str) -> bool {
        self.enabled && self.events.contains(event)
    }

    pub fn disable(&mut self) {
        self.enabled = false;
    }

    pub fn enable(&mut self) {
        self.enabled = true;
    }
}
