use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::lifecycle::ConsentHandle;
use crate::platform::WorkerId;
use crate::presentation::{Navigator, Notifier, NotifyAction};
use crate::state_machine::errors::hook_failed;
use crate::state_machine::{HookResult, LifecycleEvent, LifecycleHooks, UpdateNotice};

/// Notifier that keeps every notification it was asked to show
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    notifications: Mutex<Vec<(String, Option<NotifyAction>)>>,
}

impl RecordingNotifier {
    pub fn messages(&self) -> Vec<String> {
        self.notifications
            .lock()
            .iter()
            .map(|(message, _)| message.clone())
            .collect()
    }

    /// Action attached to the most recent notification
    pub fn last_action(&self) -> Option<NotifyAction> {
        self.notifications
            .lock()
            .last()
            .and_then(|(_, action)| action.clone())
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, message: &str, action: Option<NotifyAction>) {
        self.notifications.lock().push((message.to_string(), action));
    }
}

#[derive(Debug, Default)]
pub struct RecordingNavigator {
    reloads: AtomicUsize,
}

impl RecordingNavigator {
    pub fn reload_count(&self) -> usize {
        self.reloads.load(Ordering::SeqCst)
    }
}

impl Navigator for RecordingNavigator {
    fn reload_page(&self) {
        self.reloads.fetch_add(1, Ordering::SeqCst);
    }
}

/// Hooks that record the order they were called in.
///
/// Individual hooks can be made to fail or panic, and update notices can be
/// granted automatically, as if the user clicked straight away.
#[derive(Debug, Default)]
pub struct RecordingHooks {
    calls: Mutex<Vec<&'static str>>,
    controllers: Mutex<Vec<Option<WorkerId>>>,
    consents: Mutex<Vec<ConsentHandle>>,
    failing: HashSet<&'static str>,
    panicking: HashSet<&'static str>,
    auto_grant: bool,
}

impl RecordingHooks {
    pub fn failing_on(mut self, hook: &'static str) -> Self {
        self.failing.insert(hook);
        self
    }

    pub fn panicking_on(mut self, hook: &'static str) -> Self {
        self.panicking.insert(hook);
        self
    }

    /// Grant consent as soon as an update notice arrives
    pub fn granting(mut self) -> Self {
        self.auto_grant = true;
        self
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().clone()
    }

    pub fn count(&self, hook: &str) -> usize {
        self.calls.lock().iter().filter(|name| **name == hook).count()
    }

    pub fn controller_changes(&self) -> Vec<Option<WorkerId>> {
        self.controllers.lock().clone()
    }

    pub fn consents(&self) -> Vec<ConsentHandle> {
        self.consents.lock().clone()
    }

    fn record(&self, hook: &'static str) -> HookResult {
        self.calls.lock().push(hook);
        if self.panicking.contains(hook) {
            panic!("{hook} blew up");
        }
        if self.failing.contains(hook) {
            return Err(hook_failed(hook, "configured to fail"));
        }
        Ok(())
    }
}

impl LifecycleHooks for RecordingHooks {
    fn on_installing(&self, _event: &LifecycleEvent) -> HookResult {
        self.record("on_installing")
    }

    fn on_installed(&self, _event: &LifecycleEvent) -> HookResult {
        self.record("on_installed")
    }

    fn on_activating(&self, _event: &LifecycleEvent) -> HookResult {
        self.record("on_activating")
    }

    fn on_activated(&self, _event: &LifecycleEvent) -> HookResult {
        self.record("on_activated")
    }

    fn on_redundant(&self, _event: &LifecycleEvent) -> HookResult {
        self.record("on_redundant")
    }

    fn on_controller_change(&self, controller: Option<&WorkerId>) -> HookResult {
        self.controllers.lock().push(controller.cloned());
        self.record("on_controller_change")
    }

    fn on_new_candidate_found(&self, _notice: &UpdateNotice, consent: ConsentHandle) -> HookResult {
        if self.auto_grant {
            consent.grant();
        }
        self.consents.lock().push(consent);
        self.record("on_new_candidate_found")
    }

    fn hooks_name(&self) -> &str {
        "recording_hooks"
    }
}
