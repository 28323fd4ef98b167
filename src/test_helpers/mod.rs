// Test Helpers Module - Simulated Platform and Recording Collaborators
//
// Shared by unit tests and the integration suite under tests/. The simulated
// container stands in for the hosting environment; the recorders capture what
// the manager asked of the page so tests can assert on it.

pub mod recorders;
pub mod simulated_container;

pub use recorders::{RecordingHooks, RecordingNavigator, RecordingNotifier};
pub use simulated_container::SimulatedContainer;

use std::time::Duration;
use tokio::sync::broadcast;

use crate::manager::ManagerEvent;
use crate::platform::PlatformRegistration;
use crate::registration::RegistrationHandle;

/// How long `wait_for_event` waits before failing the test
pub const EVENT_TIMEOUT: Duration = Duration::from_secs(2);

/// Handle for a registration that never went through a gateway
pub fn registration_handle(script_url: &str, scope: &str) -> RegistrationHandle {
    RegistrationHandle::new(
        script_url,
        PlatformRegistration {
            scope: scope.to_string(),
            script_url: script_url.to_string(),
            ..PlatformRegistration::default()
        },
    )
}

/// Receive manager events until one matches, panicking on timeout.
///
/// Returns the matching event; events before it are discarded.
pub async fn wait_for_event<F>(rx: &mut broadcast::Receiver<ManagerEvent>, predicate: F) -> ManagerEvent
where
    F: Fn(&ManagerEvent) -> bool,
{
    let result = tokio::time::timeout(EVENT_TIMEOUT, async {
        loop {
            match rx.recv().await {
                Ok(event) if predicate(&event) => return event,
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Test receiver lagged");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    panic!("manager event channel closed before the expected event")
                }
            }
        }
    })
    .await;

    match result {
        Ok(event) => event,
        Err(_) => panic!("timed out waiting for manager event"),
    }
}

/// Collect every event up to and including the first match
pub async fn collect_until<F>(
    rx: &mut broadcast::Receiver<ManagerEvent>,
    predicate: F,
) -> Vec<ManagerEvent>
where
    F: Fn(&ManagerEvent) -> bool,
{
    let mut seen = Vec::new();
    let result = tokio::time::timeout(EVENT_TIMEOUT, async {
        while let Ok(event) = rx.recv().await {
            let done = predicate(&event);
            seen.push(event);
            if done {
                return true;
            }
        }
        false
    })
    .await;

    assert!(
        matches!(result, Ok(true)),
        "expected event not observed; saw {:?}",
        seen.iter().map(ManagerEvent::name).collect::<Vec<_>>()
    );
    seen
}
