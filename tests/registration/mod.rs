use std::sync::Arc;

use serviceworker_core::platform::PlatformError;
use serviceworker_core::registration::{scope, RegistrationError, RegistrationGateway};
use serviceworker_core::test_helpers::SimulatedContainer;

#[tokio::test]
async fn test_register_same_scope_returns_same_handle() {
    let container = Arc::new(SimulatedContainer::new());
    let gateway = RegistrationGateway::new(container.clone());

    let first = gateway.register("/app/sw.js").await.unwrap();
    let second = gateway.register("/app/sw.js").await.unwrap();

    assert_eq!(first, second);
    assert_eq!(first.id(), second.id());
    assert_eq!(first.scope(), "/app/");
    assert_eq!(container.register_calls(), 1);
    assert_eq!(gateway.registration_count(), 1);
}

#[tokio::test]
async fn test_distinct_scopes_get_distinct_handles() {
    let container = Arc::new(SimulatedContainer::new());
    let gateway = RegistrationGateway::new(container.clone());

    let app = gateway.register("/app/sw.js").await.unwrap();
    let inbox = gateway
        .register_with_scope("/app/sw.js", Some("/app/inbox/"))
        .await
        .unwrap();

    assert_ne!(app, inbox);
    assert_eq!(inbox.scope(), "/app/inbox/");
    assert_eq!(gateway.handle("/app/inbox/"), Some(inbox));
    assert_eq!(container.register_calls(), 2);
}

#[tokio::test]
async fn test_dotted_scope_shares_handle_with_normalised_scope() {
    let container = Arc::new(SimulatedContainer::new());
    let gateway = RegistrationGateway::new(container.clone());

    let dotted = gateway
        .register_with_scope("/app/sw.js", Some("/app/./inbox/"))
        .await
        .unwrap();
    let plain = gateway
        .register_with_scope("/app/sw.js", Some("/app/inbox/"))
        .await
        .unwrap();

    assert_eq!(dotted, plain);
    assert_eq!(dotted.scope(), "/app/inbox/");
    assert_eq!(container.register_calls(), 1);

    let err = gateway
        .register_with_scope("/app/sw.js", Some("/app/../admin/"))
        .await
        .unwrap_err();
    assert!(matches!(err, RegistrationError::InvalidScope { .. }));
    assert!(container.registration("/admin/").is_none());
    assert_eq!(container.register_calls(), 1);
}

#[tokio::test]
async fn test_unsupported_environment_fails_before_platform_call() {
    let container = Arc::new(SimulatedContainer::unsupported());
    let gateway = RegistrationGateway::new(container.clone());

    assert!(!gateway.is_supported());
    let err = gateway.register("/app/sw.js").await.unwrap_err();
    assert_eq!(err, RegistrationError::Unsupported);
    assert_eq!(container.register_calls(), 0);
}

#[tokio::test]
async fn test_script_failures_are_not_retried() {
    let container = Arc::new(SimulatedContainer::new());
    container.fail_script(
        "/app/sw.js",
        PlatformError::ScriptEvaluationFailed {
            script_url: "/app/sw.js".to_string(),
            reason: "SyntaxError".to_string(),
        },
    );
    let gateway = RegistrationGateway::new(container.clone());

    let err = gateway.register("/app/sw.js").await.unwrap_err();
    assert!(matches!(err, RegistrationError::ScriptFailed { ref reason, .. } if reason == "SyntaxError"));
    assert_eq!(gateway.registration_count(), 0);
}

#[tokio::test]
async fn test_scope_outside_script_directory_is_rejected() {
    let container = Arc::new(SimulatedContainer::new());
    let gateway = RegistrationGateway::new(container.clone());

    let err = gateway
        .register_with_scope("/app/sw.js", Some("/admin/"))
        .await
        .unwrap_err();
    assert!(matches!(err, RegistrationError::InvalidScope { .. }));
    assert_eq!(container.register_calls(), 0);
}

#[tokio::test]
async fn test_update_and_unregister_follow_current_handle() {
    let container = Arc::new(SimulatedContainer::new());
    let gateway = RegistrationGateway::new(container.clone());
    let handle = gateway.register("/app/sw.js").await.unwrap();

    gateway.update(&handle).await.unwrap();
    assert_eq!(container.update_calls(), 1);

    assert!(gateway.unregister(&handle).await.unwrap());
    assert_eq!(gateway.handle("/app/"), None);

    // a stale handle can no longer drive the platform
    let err = gateway.update(&handle).await.unwrap_err();
    assert_eq!(
        err,
        RegistrationError::NotRegistered {
            scope: "/app/".to_string()
        }
    );
    assert_eq!(container.update_calls(), 1);

    let fresh = gateway.register("/app/sw.js").await.unwrap();
    assert_ne!(fresh, handle);
}

#[test]
fn test_scope_resolution_strips_origin_and_query() {
    assert_eq!(
        scope::resolve_scope("https://example.com/app/sw.js?v=3#top", None).unwrap(),
        "/app/"
    );
    assert!(matches!(
        scope::script_path("sw.js"),
        Err(RegistrationError::InvalidScriptUrl { .. })
    ));
}
