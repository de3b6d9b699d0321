use crate::domain::events::PosEvent;
use crate::domain::ports::SubscriptionStore;
use crate::outbound::webhook::dispatcher::Dispatcher;
use crate::outbound::webhook::schemas::DispatchSummary;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, error};

/// Bridges POS business events to webhook dispatch.
///
/// The business operation that raised the event never waits on delivery and
/// never sees a delivery failure: subscriptions are snapshotted from the
/// store and the dispatch runs on its own task.
pub struct WebhookNotifier<S: SubscriptionStore> {
    store: Arc<S>,
    dispatcher: Dispatcher,
}

impl<S: SubscriptionStore + 'static> WebhookNotifier<S> {
    pub fn new(store: Arc<S>, dispatcher: Dispatcher) -> Self {
        Self { store, dispatcher }
    }

    /// Queue `event` for delivery. Returns `None` when nothing was spawned.
    pub async fn notify(&self, event: &PosEvent) -> Option<JoinHandle<DispatchSummary>> {
        let name = event.event_name();

        let data = match event.data() {
            Ok(data) => data,
            Err(e) => {
                error!(event = %name, error = %e, "Failed to serialise event data – skipping");
                return None;
            }
        };

        let subscriptions = match self.store.list_subscriptions().await {
            Ok(subs) => subs,
            Err(e) => {
                error!(event = %name, error = %e, "Failed to load webhook subscriptions");
                return None;
            }
        };

        if !subscriptions.iter().any(|s| s.matches_event(name)) {
            debug!(event = %name, "No subscriptions matched – event dropped");
            return None;
        }

        Some(self.dispatcher.spawn_dispatch(name, data, subscriptions))
    }
}
