//! End-to-end: sign in, restart, restore, mount, unmount.

use std::sync::Arc;
use std::time::Duration;

use energyflow::application::DashboardKind;
use energyflow::infrastructure::{FileSessionStorage, SessionStorage};
use energyflow::interfaces::LoginForm;
use energyflow::shared::ShutdownSignal;
use energyflow::{create_event_bus, AppConfig, Dashboard, Role, SessionState, SessionStore};

fn file_store(dir: &std::path::Path) -> SessionStore {
    let storage: Arc<dyn SessionStorage> = Arc::new(FileSessionStorage::new(dir));
    SessionStore::new(storage).with_login_latency(Duration::ZERO)
}

#[tokio::test]
async fn session_survives_restart() {
    let dir = tempfile::tempdir().unwrap();

    let first = file_store(dir.path());
    assert_eq!(first.initialize().await, None);
    let identity = LoginForm::new("field-tech@campus.edu", "pw")
        .submit(&first)
        .await
        .unwrap();
    assert_eq!(identity.role, Role::Technician);
    drop(first);

    let second = file_store(dir.path());
    assert_eq!(second.state().await, SessionState::Uninitialized);
    assert_eq!(second.initialize().await, Some(identity.clone()));
    assert_eq!(second.state().await, SessionState::Authenticated(identity));

    second.logout().await;
    let third = file_store(dir.path());
    assert_eq!(third.initialize().await, None);
    assert_eq!(third.state().await, SessionState::Anonymous);
}

#[tokio::test]
async fn corrupt_record_starts_signed_out() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("user.json"), "{not json").unwrap();

    let store = file_store(dir.path());
    assert_eq!(store.initialize().await, None);
    assert!(!dir.path().join("user.json").exists());
}

#[tokio::test(start_paused = true)]
async fn restored_admin_gets_admin_console() {
    let dir = tempfile::tempdir().unwrap();
    let store = file_store(dir.path());
    store.initialize().await;
    store.login("admin@campus.edu", "pw").await.unwrap();

    let restored = file_store(dir.path());
    restored.initialize().await;

    let bus = create_event_bus();
    let shutdown = ShutdownSignal::new();
    let dashboard = Dashboard::for_session(&restored, &AppConfig::default(), bus, shutdown)
        .await
        .unwrap();
    assert_eq!(dashboard.kind(), DashboardKind::Admin);
    assert_eq!(dashboard.identity().name, "Admin User");

    tokio::time::sleep(Duration::from_millis(6100)).await;
    let rx = dashboard.subscribe_telemetry().unwrap();
    let last = rx.borrow().clone();
    assert_eq!(dashboard.unmount().await, 2);

    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(*rx.borrow(), last);
}

#[tokio::test(start_paused = true)]
async fn anonymous_session_mounts_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let store = file_store(dir.path());
    store.initialize().await;

    let dashboard = Dashboard::for_session(
        &store,
        &AppConfig::default(),
        create_event_bus(),
        ShutdownSignal::new(),
    )
    .await;
    assert!(dashboard.is_none());
}
