use std::sync::Arc;
use std::time::Duration;

use serviceworker_core::config::ManagerConfig;
use serviceworker_core::constants::messages;
use serviceworker_core::lifecycle::{ControllerChangeOutcome, HandoverError};
use serviceworker_core::manager::{ManagerEvent, ServiceWorkerManager};
use serviceworker_core::platform::{ControlMessage, PlatformSignal, WorkerId};
use serviceworker_core::state_machine::WorkerState;
use serviceworker_core::test_helpers::{
    collect_until, wait_for_event, RecordingHooks, RecordingNavigator, RecordingNotifier,
    SimulatedContainer,
};
use tokio_test::assert_ok;

const SCOPE: &str = "/app/";
const SCRIPT: &str = "/app/sw.js";

fn activate(container: &SimulatedContainer, worker: &WorkerId) {
    for state in [
        WorkerState::Installed,
        WorkerState::Activating,
        WorkerState::Activated,
    ] {
        container.set_state(SCOPE, worker, state);
    }
}

fn is_activated(event: &ManagerEvent) -> bool {
    matches!(event, ManagerEvent::Lifecycle(e) if e.to_state == WorkerState::Activated)
}

fn is_reload(event: &ManagerEvent) -> bool {
    matches!(
        event,
        ManagerEvent::ControllerChanged {
            outcome: ControllerChangeOutcome::Reloaded,
            ..
        }
    )
}

/// First install, re-registration of the same scope, an update, consent
/// through the notification action and a single reload
#[tokio::test]
async fn test_app_scope_install_update_and_handover() {
    let container = Arc::new(SimulatedContainer::new().with_auto_activation());
    let notifier = Arc::new(RecordingNotifier::default());
    let navigator = Arc::new(RecordingNavigator::default());

    let manager = ServiceWorkerManager::default_manager(
        SCRIPT,
        container.clone(),
        notifier.clone(),
        navigator.clone(),
    );
    let gateway = manager.gateway();
    let handle = manager.load().await.unwrap();
    let mut events = handle.subscribe();

    // first install
    let first = container.discover(SCOPE);
    activate(&container, &first);
    let seen = collect_until(&mut events, is_activated).await;
    assert!(!seen
        .iter()
        .any(|event| matches!(event, ManagerEvent::UpdateAvailable(_))));
    assert_eq!(notifier.messages(), vec![messages::OFFLINE_READY.to_string()]);

    // re-registering the scope hands back the same registration
    let again = gateway.register(SCRIPT).await.unwrap();
    assert_eq!(&again, handle.registration());

    // an update arrives and waits
    let second = container.discover(SCOPE);
    container.set_state(SCOPE, &second, WorkerState::Installed);
    let notice = wait_for_event(&mut events, |event| {
        matches!(event, ManagerEvent::UpdateAvailable(_))
    })
    .await;
    assert!(matches!(notice, ManagerEvent::UpdateAvailable(n) if n.candidate == second));
    assert_eq!(notifier.messages().last().unwrap(), messages::UPDATE_AVAILABLE);

    // the user clicks REFRESH
    let action = notifier.last_action().unwrap();
    assert_eq!(action.label, messages::REFRESH_LABEL);
    action.invoke();

    wait_for_event(&mut events, is_reload).await;
    assert_eq!(
        container.posted_messages(),
        vec![(second.clone(), ControlMessage::SkipWaiting)]
    );
    assert_eq!(navigator.reload_count(), 1);

    let summary = handle.teardown().await.unwrap();
    assert_eq!(summary.update_notices, 1);
    assert_eq!(summary.handovers_requested, 1);
    assert!(summary.reloaded);
}

#[tokio::test]
async fn test_reload_happens_once_despite_repeated_controller_changes() {
    let container = Arc::new(
        SimulatedContainer::new()
            .with_controller(WorkerId::new("sw-old"))
            .with_auto_activation(),
    );
    let hooks = Arc::new(RecordingHooks::default().granting());
    let navigator = Arc::new(RecordingNavigator::default());
    let handle = ServiceWorkerManager::new(
        ManagerConfig::new(SCRIPT),
        container.clone(),
        hooks.clone(),
        navigator.clone(),
    )
    .load()
    .await
    .unwrap();
    let mut events = handle.subscribe();

    let candidate = container.discover(SCOPE);
    container.set_state(SCOPE, &candidate, WorkerState::Installed);
    wait_for_event(&mut events, is_reload).await;

    container.change_controller(SCOPE, Some(candidate.clone()));
    container.change_controller(SCOPE, None);
    let suppressed = wait_for_event(&mut events, |event| {
        matches!(event, ManagerEvent::ControllerChanged { controller: None, .. })
    })
    .await;
    assert!(matches!(
        suppressed,
        ManagerEvent::ControllerChanged {
            outcome: ControllerChangeOutcome::Suppressed,
            ..
        }
    ));

    assert_eq!(navigator.reload_count(), 1);
    // the hook only runs up to and including the reload
    assert_eq!(hooks.count("on_controller_change"), 1);
    assert_eq!(hooks.count("on_new_candidate_found"), 1);
    assert_ok!(handle.teardown().await);
}

#[tokio::test]
async fn test_consent_for_redundant_candidate_fails_without_reload() {
    let container = Arc::new(SimulatedContainer::new().with_controller(WorkerId::new("sw-old")));
    let hooks = Arc::new(RecordingHooks::default());
    let navigator = Arc::new(RecordingNavigator::default());
    let handle = ServiceWorkerManager::new(
        ManagerConfig::new(SCRIPT),
        container.clone(),
        hooks.clone(),
        navigator.clone(),
    )
    .load()
    .await
    .unwrap();
    let mut events = handle.subscribe();

    let candidate = container.discover(SCOPE);
    container.set_state(SCOPE, &candidate, WorkerState::Installed);
    wait_for_event(&mut events, |event| {
        matches!(event, ManagerEvent::UpdateAvailable(_))
    })
    .await;

    container.set_state(SCOPE, &candidate, WorkerState::Redundant);
    wait_for_event(&mut events, |event| {
        matches!(event, ManagerEvent::Lifecycle(e) if e.to_state == WorkerState::Redundant)
    })
    .await;

    // consent captured before the candidate went away
    let consent = hooks.consents().pop().unwrap();
    assert!(consent.grant());

    let failed = wait_for_event(&mut events, |event| {
        matches!(event, ManagerEvent::HandoverFailed(_))
    })
    .await;
    assert!(matches!(
        failed,
        ManagerEvent::HandoverFailed(HandoverError::CandidateRedundant { .. })
    ));

    container.change_controller(SCOPE, Some(WorkerId::new("sw-other")));
    let changed = wait_for_event(&mut events, |event| {
        matches!(event, ManagerEvent::ControllerChanged { .. })
    })
    .await;
    assert!(matches!(
        changed,
        ManagerEvent::ControllerChanged {
            outcome: ControllerChangeOutcome::Unsolicited,
            ..
        }
    ));
    assert!(container.posted_messages().is_empty());
    assert_eq!(navigator.reload_count(), 0);
    handle.teardown().await.unwrap();
}

#[tokio::test]
async fn test_failing_hooks_do_not_stop_the_lifecycle() {
    let container = Arc::new(SimulatedContainer::new());
    let hooks = Arc::new(
        RecordingHooks::default()
            .failing_on("on_installed")
            .panicking_on("on_activating"),
    );
    let handle = ServiceWorkerManager::new(
        ManagerConfig::new(SCRIPT),
        container.clone(),
        hooks.clone(),
        Arc::new(RecordingNavigator::default()),
    )
    .load()
    .await
    .unwrap();
    let mut events = handle.subscribe();

    let worker = container.discover(SCOPE);
    activate(&container, &worker);
    let seen = collect_until(&mut events, is_activated).await;

    let failures: Vec<&str> = seen
        .iter()
        .filter_map(|event| match event {
            ManagerEvent::HookFailed(err) => Some(err.hook()),
            _ => None,
        })
        .collect();
    assert_eq!(failures, vec!["on_installed", "on_activating"]);
    assert_eq!(hooks.count("on_activated"), 1);

    let summary = handle.teardown().await.unwrap();
    assert_eq!(summary.hook_failures, 2);
    assert_eq!(summary.lifecycle_events, 4);
}

#[tokio::test]
async fn test_protocol_violation_is_published_and_candidate_retired() {
    let container = Arc::new(SimulatedContainer::new());
    let hooks = Arc::new(RecordingHooks::default());
    let handle = ServiceWorkerManager::new(
        ManagerConfig::new(SCRIPT),
        container.clone(),
        hooks.clone(),
        Arc::new(RecordingNavigator::default()),
    )
    .load()
    .await
    .unwrap();
    let mut events = handle.subscribe();

    let worker = container.discover(SCOPE);
    container.emit(
        SCOPE,
        PlatformSignal::StateChanged {
            worker: worker.clone(),
            state: WorkerState::Activating,
        },
    );

    let seen = collect_until(&mut events, |event| {
        matches!(event, ManagerEvent::Lifecycle(e) if e.to_state == WorkerState::Redundant)
    })
    .await;
    assert!(seen
        .iter()
        .any(|event| matches!(event, ManagerEvent::ProtocolViolation(err) if *err.worker() == worker)));
    assert_eq!(hooks.calls(), vec!["on_installing", "on_redundant"]);

    let summary = handle.teardown().await.unwrap();
    assert_eq!(summary.protocol_violations, 1);
}

#[tokio::test]
async fn test_teardown_stops_hooks_and_releases_subscription() {
    let container = Arc::new(SimulatedContainer::new());
    let hooks = Arc::new(RecordingHooks::default());
    let handle = ServiceWorkerManager::new(
        ManagerConfig::new(SCRIPT),
        container.clone(),
        hooks.clone(),
        Arc::new(RecordingNavigator::default()),
    )
    .load()
    .await
    .unwrap();
    let mut events = handle.subscribe();

    assert_eq!(container.subscriber_count(SCOPE), 1);
    handle.teardown().await.unwrap();
    wait_for_event(&mut events, |event| matches!(event, ManagerEvent::Stopped)).await;

    assert_eq!(container.subscriber_count(SCOPE), 0);
    container.discover(SCOPE);
    tokio::task::yield_now().await;
    assert!(hooks.calls().is_empty());
}

#[tokio::test]
async fn test_dropping_handle_stops_the_loop() {
    let container = Arc::new(SimulatedContainer::new());
    let handle = ServiceWorkerManager::default_manager(
        SCRIPT,
        container.clone(),
        Arc::new(RecordingNotifier::default()),
        Arc::new(RecordingNavigator::default()),
    )
    .load()
    .await
    .unwrap();
    let mut events = handle.subscribe();

    drop(handle);
    wait_for_event(&mut events, |event| matches!(event, ManagerEvent::Stopped)).await;
}

#[tokio::test]
async fn test_handle_update_and_unregister() {
    let container = Arc::new(SimulatedContainer::new());
    let handle = ServiceWorkerManager::default_manager(
        SCRIPT,
        container.clone(),
        Arc::new(RecordingNotifier::default()),
        Arc::new(RecordingNavigator::default()),
    )
    .load()
    .await
    .unwrap();

    assert_ok!(handle.update().await);
    assert_eq!(container.update_calls(), 1);

    assert!(handle.unregister().await.unwrap());
    assert!(container.registration(SCOPE).is_none());
    assert!(handle.update().await.is_err());
    handle.teardown().await.unwrap();
}

#[tokio::test]
async fn test_consented_candidate_lost_before_activation_does_not_reload() {
    let container = Arc::new(SimulatedContainer::new().with_controller(WorkerId::new("sw-old")));
    let hooks = Arc::new(RecordingHooks::default());
    let navigator = Arc::new(RecordingNavigator::default());
    let handle = ServiceWorkerManager::new(
        ManagerConfig::new(SCRIPT),
        container.clone(),
        hooks.clone(),
        navigator.clone(),
    )
    .load()
    .await
    .unwrap();
    let mut events = handle.subscribe();

    let candidate = container.discover(SCOPE);
    container.set_state(SCOPE, &candidate, WorkerState::Installed);
    wait_for_event(&mut events, |event| {
        matches!(event, ManagerEvent::UpdateAvailable(_))
    })
    .await;

    handle.consent(&candidate).unwrap();
    wait_for_event(&mut events, |event| {
        matches!(event, ManagerEvent::HandoverRequested { .. })
    })
    .await;

    // activation fails on the platform side
    container.set_state(SCOPE, &candidate, WorkerState::Redundant);
    container.change_controller(SCOPE, Some(WorkerId::new("sw-other")));
    let changed = wait_for_event(&mut events, |event| {
        matches!(event, ManagerEvent::ControllerChanged { .. })
    })
    .await;
    assert!(matches!(
        changed,
        ManagerEvent::ControllerChanged {
            outcome: ControllerChangeOutcome::Unsolicited,
            ..
        }
    ));
    assert_eq!(navigator.reload_count(), 0);

    let summary = handle.teardown().await.unwrap();
    assert_eq!(summary.handovers_requested, 1);
    assert!(!summary.reloaded);
}

#[tokio::test]
async fn test_teardown_is_not_blocked_by_stalled_delivery() {
    let container = Arc::new(SimulatedContainer::new().with_controller(WorkerId::new("sw-old")));
    let handle = ServiceWorkerManager::new(
        ManagerConfig::new(SCRIPT),
        container.clone(),
        Arc::new(RecordingHooks::default()),
        Arc::new(RecordingNavigator::default()),
    )
    .load()
    .await
    .unwrap();
    let mut events = handle.subscribe();

    let candidate = container.discover(SCOPE);
    container.set_state(SCOPE, &candidate, WorkerState::Installed);
    wait_for_event(&mut events, |event| {
        matches!(event, ManagerEvent::UpdateAvailable(_))
    })
    .await;

    container.hang_delivery(&candidate);
    handle.consent(&candidate).unwrap();
    for _ in 0..100 {
        if !container.posted_messages().is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(container.posted_messages().len(), 1);

    let summary = tokio::time::timeout(Duration::from_secs(1), handle.teardown())
        .await
        .expect("teardown stalled behind the pending delivery")
        .unwrap();
    assert_eq!(summary.handovers_requested, 0);
    assert_eq!(container.subscriber_count(SCOPE), 0);
}
