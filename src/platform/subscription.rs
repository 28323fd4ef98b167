use std::sync::Arc;
use tokio::sync::mpsc;
use uuid::Uuid;

use super::{PlatformSignal, ServiceWorkerContainer};

/// Scoped signal stream for one registration.
///
/// Dropping the subscription releases it on the platform side, so no signal
/// is delivered to a torn-down manager.
pub struct Subscription {
    id: Uuid,
    scope: String,
    receiver: mpsc::UnboundedReceiver<PlatformSignal>,
    container: Arc<dyn ServiceWorkerContainer>,
}

impl Subscription {
    pub fn open(container: Arc<dyn ServiceWorkerContainer>, scope: &str) -> Self {
        let (id, receiver) = container.subscribe(scope);
        tracing::debug!(subscription_id = %id, scope = %scope, "Opened platform subscription");
        Self {
            id,
            scope: scope.to_string(),
            receiver,
            container,
        }
    }

    /// Wait for the next signal; `None` once the platform closed the stream
    pub async fn recv(&mut self) -> Option<PlatformSignal> {
        self.receiver.recv().await
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn scope(&self) -> &str {
        &self.scope
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.receiver.close();
        self.container.unsubscribe(self.id);
        tracing::debug!(subscription_id = %self.id, scope = %self.scope, "Released platform subscription");
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("scope", &self.scope)
            .field("container", &"<Arc<dyn ServiceWorkerContainer>>")
            .finish()
    }
}
