#![allow(clippy::unwrap_used)]
// Coordinator behaviour over the scripted connector.

mod common;

use std::time::Duration;

use pretty_assertions::assert_eq;

use eaton_ups_core::{ConnectionState, Coordinator, UpdateError};

use common::{Behaviour, client_with, publish_fixture};

#[tokio::test]
async fn refresh_reports_update_failed_when_broker_is_silent() {
    let (client, _recorder) = client_with(Behaviour::Silent);
    let coordinator = Coordinator::new(client);

    let err = coordinator.refresh().await.unwrap_err();
    assert!(matches!(err, UpdateError::UpdateFailed(_)), "got {err:?}");
    assert!(!coordinator.available());
    assert_eq!(coordinator.last_error(), Some(err));
    assert_eq!(coordinator.last_update(), None);
}

#[tokio::test]
async fn refresh_returns_current_topics() {
    let (client, recorder) = client_with(Behaviour::Accept);
    let coordinator = Coordinator::new(client);

    let empty = coordinator.refresh().await.unwrap();
    assert!(empty.is_empty());
    assert!(coordinator.available());

    publish_fixture(recorder.handler().as_ref());
    let data = coordinator.refresh().await.unwrap();
    assert!(data.contains("powerDistributions/1/outlets/3/measures"));
    assert!(coordinator.last_update().is_some());
    coordinator.shutdown().await;
}

#[tokio::test]
async fn pushed_messages_update_data() {
    let (client, recorder) = client_with(Behaviour::Accept);
    let coordinator = Coordinator::new(client.clone());
    coordinator.start().await;
    coordinator.start().await;
    assert_eq!(client.subscriber_count(), 1);

    client.setup().await.unwrap();
    let mut updates = coordinator.subscribe();
    publish_fixture(recorder.handler().as_ref());

    let total = common::fixture_topics().len();
    tokio::time::timeout(Duration::from_secs(1), async {
        while updates.borrow_and_update().len() < total {
            updates.changed().await.unwrap();
        }
    })
    .await
    .unwrap();

    assert_eq!(coordinator.data().len(), total);
    assert!(coordinator.available());
    coordinator.shutdown().await;
}

#[tokio::test]
async fn pushes_during_reconnect_still_update_data() {
    let (client, recorder) = client_with(Behaviour::Accept);
    let coordinator = Coordinator::new(client.clone());
    coordinator.start().await;
    client.setup().await.unwrap();

    // Retained topics may arrive while the state still reads connecting.
    recorder.handler().on_disconnect("keep-alive timeout");
    assert_eq!(client.state(), ConnectionState::Connecting);

    publish_fixture(recorder.handler().as_ref());
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(coordinator.available());
    assert!(!coordinator.data().is_empty());
    coordinator.shutdown().await;
}

#[tokio::test]
async fn polling_records_failures() {
    let (client, _recorder) = client_with(Behaviour::Silent);
    let coordinator = Coordinator::new(client);
    coordinator.spawn_polling(Duration::from_millis(20)).await;

    tokio::time::timeout(Duration::from_secs(2), async {
        while coordinator.last_error().is_none() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap();

    assert!(!coordinator.available());
    coordinator.shutdown().await;
}

#[tokio::test]
async fn shutdown_unsubscribes_and_disconnects() {
    let (client, _recorder) = client_with(Behaviour::Accept);
    let coordinator = Coordinator::new(client.clone());
    coordinator.start().await;
    coordinator.refresh().await.unwrap();

    coordinator.shutdown().await;
    assert_eq!(client.subscriber_count(), 0);
    assert_eq!(client.state(), ConnectionState::Disconnected);

    // Shutting down twice is harmless.
    coordinator.shutdown().await;
}
