use std::io::Write;
use std::sync::Arc;

use serviceworker_core::config::{ConfigLoader, ConfigurationError, ManagerConfig};
use serviceworker_core::manager::ServiceWorkerManager;
use serviceworker_core::test_helpers::{RecordingHooks, RecordingNavigator, SimulatedContainer};

fn yaml(lines: &[&str]) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
    for line in lines {
        writeln!(file, "{line}").unwrap();
    }
    file
}

#[test]
fn test_environment_overrides_file() {
    let file = yaml(&["resource: /app/sw.js", "event_channel_capacity: 16"]);

    std::env::set_var("SW_EVENT_CHANNEL_CAPACITY", "64");
    let result = ConfigLoader::load(Some(file.path()));
    std::env::remove_var("SW_EVENT_CHANNEL_CAPACITY");

    let config = result.unwrap();
    assert_eq!(config.resource, "/app/sw.js");
    assert_eq!(config.event_channel_capacity, 64);
}

#[test]
fn test_zero_capacity_is_rejected() {
    let file = yaml(&["resource: /app/sw.js", "event_channel_capacity: 0"]);
    let err = ConfigLoader::load_file(file.path()).unwrap_err();
    assert!(matches!(err, ConfigurationError::InvalidValue { ref field, .. } if field == "event_channel_capacity"));
}

#[test]
fn test_config_serializes_for_diagnostics() {
    let config = ManagerConfig::new("/app/sw.js").with_scope("/app/shell/");
    let json = serde_json::to_value(&config).unwrap();
    assert_eq!(json["resource"], "/app/sw.js");
    assert_eq!(json["scope"], "/app/shell/");
    assert_eq!(json["event_channel_capacity"], 256);
}

#[tokio::test]
async fn test_loaded_scope_drives_registration() {
    let file = yaml(&["resource: /app/sw.js", "scope: /app/shell/"]);
    let config = ConfigLoader::load_file(file.path()).unwrap();
    let container = Arc::new(SimulatedContainer::new());

    let handle = ServiceWorkerManager::new(
        config,
        container.clone(),
        Arc::new(RecordingHooks::default()),
        Arc::new(RecordingNavigator::default()),
    )
    .load()
    .await
    .unwrap();

    assert_eq!(handle.registration().scope(), "/app/shell/");
    assert_eq!(container.subscriber_count("/app/shell/"), 1);
    handle.teardown().await.unwrap();
}
