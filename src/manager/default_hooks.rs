use std::sync::Arc;

use crate::constants::messages;
use crate::lifecycle::ConsentHandle;
use crate::platform::WorkerId;
use crate::presentation::Notifier;
use crate::state_machine::{HookResult, LifecycleEvent, LifecycleHooks, UpdateNotice};

/// Hooks used by the default manager.
///
/// Logs every transition, tells the user once caching is complete, and offers
/// a `REFRESH` action when an update is waiting.
pub struct DefaultLifecycleHooks {
    notifier: Arc<dyn Notifier>,
}

impl DefaultLifecycleHooks {
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self { notifier }
    }
}

impl LifecycleHooks for DefaultLifecycleHooks {
    fn on_installing(&self, event: &LifecycleEvent) -> HookResult {
        tracing::info!(worker = %event.candidate, "Service worker is installing");
        Ok(())
    }

    fn on_installed(&self, event: &LifecycleEvent) -> HookResult {
        tracing::info!(worker = %event.candidate, "Service worker is installed");
        Ok(())
    }

    fn on_activating(&self, event: &LifecycleEvent) -> HookResult {
        tracing::info!(worker = %event.candidate, "Service worker is activating");
        Ok(())
    }

    fn on_activated(&self, event: &LifecycleEvent) -> HookResult {
        tracing::info!(worker = %event.candidate, "Service worker is activated");
        self.notifier.notify(messages::OFFLINE_READY, None);
        Ok(())
    }

    fn on_redundant(&self, event: &LifecycleEvent) -> HookResult {
        tracing::info!(worker = %event.candidate, "Service worker is redundant");
        Ok(())
    }

    fn on_controller_change(&self, controller: Option<&WorkerId>) -> HookResult {
        tracing::info!(controller = ?controller, "Service worker controller changed");
        Ok(())
    }

    fn on_new_candidate_found(&self, notice: &UpdateNotice, consent: ConsentHandle) -> HookResult {
        tracing::info!(worker = %notice.candidate, "New service worker version is waiting");
        self.notifier.notify(
            messages::UPDATE_AVAILABLE,
            Some(consent.into_action(messages::REFRESH_LABEL)),
        );
        Ok(())
    }

    fn hooks_name(&self) -> &str {
        "default_lifecycle_hooks"
    }
}
