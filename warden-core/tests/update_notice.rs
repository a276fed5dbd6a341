//! Join-time update notices.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{RecordingConnection, identity};
use futures::future::BoxFuture;
use warden_core::registry::UPDATE_PERMISSION;
use warden_core::update::{ReleaseSource, UpdateError};
use warden_core::{ConfigStore, Warden};

struct FixedRelease(Option<&'static str>);

impl ReleaseSource for FixedRelease {
    fn latest_release(&self) -> BoxFuture<'_, Result<String, UpdateError>> {
        Box::pin(async move { self.0.map(str::to_owned).ok_or(UpdateError::MissingTag) })
    }
}

fn warden(local: &str, latest: Option<&'static str>) -> Warden {
    Warden::builder(ConfigStore::default())
        .release_source(Arc::new(FixedRelease(latest)))
        .local_version(local)
        .build()
}

fn join(warden: &Warden, name: &str, operator: bool, permissions: &[&str]) -> Arc<RecordingConnection> {
    let connection = Arc::new(RecordingConnection::with_permissions(permissions));
    warden.on_connect(identity(name, operator), connection.clone());
    connection
}

async fn wait_past_delay() {
    tokio::time::sleep(Duration::from_secs(1)).await;
}

#[tokio::test(start_paused = true)]
async fn operators_with_permission_are_notified() {
    let warden = warden("1.0.0", Some("1.1.0"));
    let admin = join(&warden, "Admin", true, &[UPDATE_PERMISSION]);

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(admin.message_count(), 0);

    wait_past_delay().await;
    let messages = admin.messages.lock();
    assert_eq!(messages.len(), 2);
    assert!(messages[1].contains("1.0.0"));
    assert!(messages[1].contains("1.1.0"));
}

#[tokio::test(start_paused = true)]
async fn others_are_not_notified() {
    let warden = warden("1.0.0", Some("1.1.0"));
    let no_permission = join(&warden, "Admin", true, &[]);
    let not_operator = join(&warden, "Alex", false, &[UPDATE_PERMISSION]);

    wait_past_delay().await;
    assert_eq!(no_permission.message_count(), 0);
    assert_eq!(not_operator.message_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn same_version_ignoring_case_is_silent() {
    let warden = warden("1.0.0-RC1", Some("1.0.0-rc1"));
    let admin = join(&warden, "Admin", true, &[UPDATE_PERMISSION]);

    wait_past_delay().await;
    assert_eq!(admin.message_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn disconnected_players_are_skipped() {
    let warden = warden("1.0.0", Some("1.1.0"));
    let connection = Arc::new(RecordingConnection::with_permissions(&[UPDATE_PERMISSION]));
    let state = warden.on_connect(identity("Admin", true), connection.clone());
    warden.on_disconnect(state.id());

    wait_past_delay().await;
    assert_eq!(connection.message_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn fetch_failures_are_swallowed() {
    let warden = warden("1.0.0", None);
    let admin = join(&warden, "Admin", true, &[UPDATE_PERMISSION]);

    wait_past_delay().await;
    assert_eq!(admin.message_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn shutdown_cancels_pending_notices() {
    let warden = warden("1.0.0", Some("1.1.0"));
    let admin = join(&warden, "Admin", true, &[UPDATE_PERMISSION]);
    warden.shutdown();

    wait_past_delay().await;
    assert_eq!(admin.message_count(), 0);
}
