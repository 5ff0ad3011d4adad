//! Lifecycle tests: bootstrap failures, disconnects, offline queueing,
//! lazy IM opens, and hub-initiated resync.

use std::{sync::Arc, time::Duration};

use hubwire_client::{ConnState, EventKind};
use hubwire_harness::{TestTransport, workspace_snapshot};
use hubwire_runtime::{Client, ClientError, Config};
use serde_json::json;

fn transport() -> Arc<TestTransport> {
    let transport = Arc::new(TestTransport::new());
    transport.respond("rtm.start", workspace_snapshot());
    transport
}

async fn connect(transport: &Arc<TestTransport>) -> Client {
    Client::connect_with(Config::new("xoxb-test"), transport.clone(), transport.clone())
        .await
        .expect("connect failed")
}

async fn wait_for_state(client: &Client, want: ConnState) {
    for _ in 0..500 {
        if client.state().await.expect("driver gone") == want {
            return;
        }
        tokio::time::sleep(Duration::from_millis(2)).await;
    }
    panic!("client never reached {want:?}");
}

#[tokio::test]
async fn bootstrap_failure_fails_connect() {
    let transport = Arc::new(TestTransport::new());
    transport.fail("rtm.start", "connection refused");

    let result =
        Client::connect_with(Config::new("xoxb-test"), transport.clone(), transport.clone())
            .await;
    assert!(matches!(result, Err(ClientError::Session(_))));
}

#[tokio::test]
async fn bootstrap_rejects_api_error_envelopes() {
    let transport = Arc::new(TestTransport::new());
    transport.respond("rtm.start", json!({ "ok": false, "error": "invalid_auth" }));

    let result =
        Client::connect_with(Config::new("xoxb-test"), transport.clone(), transport.clone())
            .await;
    assert!(matches!(result, Err(ClientError::Session(_))));
}

#[tokio::test]
async fn refused_transport_fails_connect() {
    let transport = transport();
    transport.refuse_connect("no route to host");

    let result =
        Client::connect_with(Config::new("xoxb-test"), transport.clone(), transport.clone())
            .await;
    assert!(matches!(result, Err(ClientError::Transport(_))));
}

#[tokio::test]
async fn offline_sends_queue_and_drain_fifo_on_reconnect() {
    let transport = transport();
    let client = connect(&transport).await;

    assert!(transport.close("network down"));
    wait_for_state(&client, ConnState::Disconnected).await;

    client.send("general", "one").expect("send");
    client.send("general", "two").expect("send");
    client.send("general", "three").expect("send");

    // Nothing transmits while disconnected.
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(transport.drain_sent().await.is_empty());

    client.reconnect().expect("reconnect");
    wait_for_state(&client, ConnState::Connected).await;

    let first = transport.next_sent().await.expect("frame");
    let second = transport.next_sent().await.expect("frame");
    let third = transport.next_sent().await.expect("frame");
    assert!(first.contains(r#""id":0"#) && first.contains("one"));
    assert!(second.contains(r#""id":1"#) && second.contains("two"));
    assert!(third.contains(r#""id":2"#) && third.contains("three"));
}

#[tokio::test]
async fn ping_transmits_connected_and_drops_disconnected() {
    let transport = transport();
    let client = connect(&transport).await;

    client.ping().expect("ping");
    assert_eq!(transport.next_sent().await.expect("frame"), r#"{"id":0,"type":"ping"}"#);

    assert!(transport.close("gone"));
    wait_for_state(&client, ConnState::Disconnected).await;

    client.ping().expect("ping");
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(transport.drain_sent().await.is_empty(), "pings are never queued");
}

#[tokio::test]
async fn team_join_opens_an_im_before_dispatch() {
    let transport = transport();
    let client = connect(&transport).await;
    transport.respond("im.open", json!({ "ok": true, "channel": { "id": "D77" } }));
    let mut joins = client.subscribe(EventKind::UserJoined).await.expect("subscribe");

    assert!(transport.inject(&json!({
        "type": "team_join",
        "user": { "id": "U77", "name": "carol" }
    })));

    // Dispatch is deferred until the open completes, so by the time the
    // event arrives the user and the im are both resolvable.
    let event = joins.next().await.expect("event");
    assert_eq!(event.kind, EventKind::UserJoined);

    assert_eq!(client.resolve_user("carol").await.expect("driver").expect("user").id, "U77");
    assert_eq!(client.resolve_im("carol").await.expect("driver").expect("im").id, "D77");

    let opens = transport.calls("im.open");
    assert_eq!(opens.len(), 1);
    assert!(opens[0].contains(&("user".to_string(), "U77".to_string())));

    // Sends to the new user route to the opened im.
    client.send("carol", "welcome").expect("send");
    let frame = transport.next_sent().await.expect("frame");
    assert!(frame.contains(r#""channel":"D77""#) && frame.contains("welcome"));
}

#[tokio::test]
async fn im_open_failure_skips_dispatch_but_keeps_the_user() {
    let transport = transport();
    let client = connect(&transport).await;
    transport.fail("im.open", "service unavailable");
    let mut joins = client.subscribe(EventKind::UserJoined).await.expect("subscribe");

    assert!(transport.inject(&json!({
        "type": "team_join",
        "user": { "id": "U77", "name": "carol" }
    })));

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(joins.try_next().is_none(), "failed open must skip dispatch");
    assert!(client.resolve_user("carol").await.expect("driver").is_some());
    assert!(client.resolve_im("carol").await.expect("driver").is_none());
}

#[tokio::test]
async fn resync_rebootstraps_and_fires_init_again() {
    let transport = transport();
    let client = connect(&transport).await;
    assert_eq!(transport.call_count("rtm.start"), 1);

    let mut init = client.subscribe(EventKind::Init).await.expect("subscribe");
    assert!(transport.inject(&json!({ "type": "team_migration_started" })));

    let event = init.next().await.expect("init after resync");
    assert_eq!(event.body["self"]["id"], "U0");

    wait_for_state(&client, ConnState::Connected).await;
    assert_eq!(transport.call_count("rtm.start"), 2);
    assert_eq!(transport.connected_urls().len(), 2);
}

#[tokio::test]
async fn migration_frame_is_not_dispatched() {
    let transport = transport();
    let client = connect(&transport).await;
    let mut all = client.subscribe_all().await.expect("subscribe");

    assert!(transport.inject(&json!({ "type": "team_migration_started" })));

    // The first thing subscribers see is the fresh init, never the
    // migration trigger itself.
    let event = all.next().await.expect("event");
    assert_eq!(event.kind, EventKind::Init);
}

#[tokio::test]
async fn cache_is_replaced_wholesale_on_resync() {
    let transport = transport();
    let client = connect(&transport).await;
    transport.respond("im.open", json!({ "ok": true, "channel": { "id": "D77" } }));

    // Grow the mirror past the snapshot.
    let mut joins = client.subscribe(EventKind::UserJoined).await.expect("subscribe");
    assert!(transport.inject(&json!({
        "type": "team_join",
        "user": { "id": "U77", "name": "carol" }
    })));
    assert!(joins.next().await.is_some());
    assert!(client.resolve_user("carol").await.expect("driver").is_some());

    let mut init = client.subscribe(EventKind::Init).await.expect("subscribe");
    assert!(transport.inject(&json!({ "type": "team_migration_started" })));
    assert!(init.next().await.is_some());
    wait_for_state(&client, ConnState::Connected).await;

    // The post-snapshot addition is gone with the old cache.
    assert!(client.resolve_user("carol").await.expect("driver").is_none());
    assert!(client.resolve_user("bob").await.expect("driver").is_some());
}

#[tokio::test]
async fn shutdown_stops_the_driver() {
    let transport = transport();
    let client = connect(&transport).await;

    client.shutdown();
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(matches!(client.state().await, Err(ClientError::Closed)));
}
