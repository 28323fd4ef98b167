use std::panic::{catch_unwind, AssertUnwindSafe};

use super::errors::{HookError, HookResult};
use super::events::{LifecycleEvent, UpdateNotice};
use crate::lifecycle::ConsentHandle;
use crate::platform::WorkerId;

/// Extension points invoked as a registration moves through its lifecycle.
///
/// Every method has a no-op default, so an owner only overrides the ones it
/// cares about. Returning an error (or panicking) is tolerated: the failure is
/// logged and the lifecycle carries on.
pub trait LifecycleHooks: Send + Sync {
    fn on_installing(&self, _event: &LifecycleEvent) -> HookResult {
        Ok(())
    }

    fn on_installed(&self, _event: &LifecycleEvent) -> HookResult {
        Ok(())
    }

    fn on_activating(&self, _event: &LifecycleEvent) -> HookResult {
        Ok(())
    }

    fn on_activated(&self, _event: &LifecycleEvent) -> HookResult {
        Ok(())
    }

    fn on_redundant(&self, _event: &LifecycleEvent) -> HookResult {
        Ok(())
    }

    /// The platform swapped the controlling worker
    fn on_controller_change(&self, _controller: Option<&WorkerId>) -> HookResult {
        Ok(())
    }

    /// A genuine update is installed and waiting. `consent` starts the handover.
    fn on_new_candidate_found(&self, _notice: &UpdateNotice, _consent: ConsentHandle) -> HookResult {
        Ok(())
    }

    /// Get hooks name for identification in logs
    fn hooks_name(&self) -> &str {
        "lifecycle_hooks"
    }
}

/// Hooks that do nothing
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopHooks;

impl LifecycleHooks for NoopHooks {}

/// Dispatch a lifecycle event to the hook matching its target state
pub fn dispatch_lifecycle_hook(hooks: &dyn LifecycleHooks, event: &LifecycleEvent) -> HookResult {
    use super::states::WorkerState;

    guard_hook(event.hook_name(), || match event.to_state {
        WorkerState::Installing => hooks.on_installing(event),
        WorkerState::Installed => hooks.on_installed(event),
        WorkerState::Activating => hooks.on_activating(event),
        WorkerState::Activated => hooks.on_activated(event),
        WorkerState::Redundant => hooks.on_redundant(event),
    })
}

/// Run a hook, turning a panic into a [`HookError`].
///
/// Failures are logged here; callers only need the result when they want to
/// surface it to observers.
pub fn guard_hook<F>(hook: &'static str, f: F) -> HookResult
where
    F: FnOnce() -> HookResult,
{
    let result = match catch_unwind(AssertUnwindSafe(f)) {
        Ok(result) => result,
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| (*s).to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "non-string panic payload".to_string());
            Err(HookError::Panicked { hook, message })
        }
    };

    if let Err(err) = &result {
        crate::log_lifecycle!(warn, "HOOK_FAILED", hook: hook, error: err.to_string());
    }

    result
}
