use crate::tests::start_hub;
use crate::{AUTH_EXPIRED_CLOSE_CODE, ConnectionActor, ConnectionConfig, ConnectionHandle, EventHub, Metrics};

use gp_auth::{AuthError, CredentialValidator};
use gp_config::HubConfig;

use std::panic::Location;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use async_trait::async_trait;
use axum::extract::ws::{Message, close_code};
use bytes::Bytes;
use error_location::ErrorLocation;
use futures::{Sink, StreamExt};
use futures::channel::mpsc::{UnboundedReceiver, UnboundedSender, unbounded};
use serde_json::Value;
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout};

struct StaticValidator {
    tenant_id: Option<String>,
}

#[async_trait]
impl CredentialValidator for StaticValidator {
    async fn validate(&self, _api_key: &str) -> gp_auth::Result<String> {
        self.tenant_id
            .clone()
            .ok_or_else(|| AuthError::TokenExpired {
                location: ErrorLocation::from(Location::caller()),
            })
    }
}

struct SlowValidator {
    tenant_id: String,
    delay: Duration,
}

#[async_trait]
impl CredentialValidator for SlowValidator {
    async fn validate(&self, _api_key: &str) -> gp_auth::Result<String> {
        sleep(self.delay).await;
        Ok(self.tenant_id.clone())
    }
}

/// A transport whose peer never reads
struct StalledSink;

impl Sink<Message> for StalledSink {
    type Error = std::io::Error;

    fn poll_ready(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Pending
    }

    fn start_send(self: Pin<&mut Self>, _item: Message) -> Result<(), Self::Error> {
        Ok(())
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Pending
    }

    fn poll_close(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Pending
    }
}

struct Client {
    handle: ConnectionHandle,
    to_server: UnboundedSender<Result<Message, std::io::Error>>,
    from_server: UnboundedReceiver<Message>,
    actor: JoinHandle<()>,
}

struct StalledClient {
    handle: ConnectionHandle,
    to_server: UnboundedSender<Result<Message, std::io::Error>>,
    actor: JoinHandle<()>,
}

fn spawn_actor<S>(
    hub: &EventHub,
    config: ConnectionConfig,
    validator: Arc<dyn CredentialValidator>,
    sink: S,
) -> (
    ConnectionHandle,
    UnboundedSender<Result<Message, std::io::Error>>,
    JoinHandle<()>,
)
where
    S: Sink<Message> + Unpin + Send + 'static,
{
    let (handle, outbound_rx) = ConnectionHandle::new("tenant-a", config.send_buffer_size);
    hub.register(handle.clone()).unwrap();

    let (to_server, server_stream) = unbounded();
    let actor = ConnectionActor::new(
        hub.clone(),
        handle.clone(),
        outbound_rx,
        validator,
        "key".to_string(),
        config,
        Metrics::default(),
    );
    let actor = tokio::spawn(actor.run(sink, server_stream));

    (handle, to_server, actor)
}

fn connect(hub: &EventHub, config: ConnectionConfig, refreshed_tenant: Option<&str>) -> Client {
    let validator = Arc::new(StaticValidator {
        tenant_id: refreshed_tenant.map(str::to_string),
    });
    let (server_sink, from_server) = unbounded();
    let (handle, to_server, actor) = spawn_actor(hub, config, validator, server_sink);

    Client {
        handle,
        to_server,
        from_server,
        actor,
    }
}

fn connect_stalled(hub: &EventHub, config: ConnectionConfig) -> StalledClient {
    let validator = Arc::new(StaticValidator {
        tenant_id: Some("tenant-a".to_string()),
    });
    let (handle, to_server, actor) = spawn_actor(hub, config, validator, StalledSink);

    StalledClient {
        handle,
        to_server,
        actor,
    }
}

fn subscribe(last_event_id: u64) -> Result<Message, std::io::Error> {
    Ok(Message::Text(
        format!(r#"{{"type":"subscribe","last_event_id":{}}}"#, last_event_id).into(),
    ))
}

fn text_json(message: Message) -> Value {
    match message {
        Message::Text(text) => serde_json::from_str(text.as_str()).unwrap(),
        other => panic!("expected text frame, got {:?}", other),
    }
}

fn close_code_of(message: Message) -> u16 {
    match message {
        Message::Close(Some(frame)) => frame.code,
        other => panic!("expected close frame, got {:?}", other),
    }
}

#[tokio::test(start_paused = true)]
async fn given_subscribe_when_events_buffered_then_replayed_in_order() {
    let hub = start_hub(HubConfig::default(), 100);
    hub.broadcast_event("change", "tenant-a", Bytes::from_static(br#"{"n":1}"#))
        .unwrap();
    hub.broadcast_event("change", "tenant-a", Bytes::from_static(br#"{"n":2}"#))
        .unwrap();
    let mut client = connect(&hub, ConnectionConfig::default(), Some("tenant-a"));

    client.to_server.unbounded_send(subscribe(0)).unwrap();

    let first = text_json(client.from_server.next().await.unwrap());
    let second = text_json(client.from_server.next().await.unwrap());
    assert_eq!(first["id"], 1);
    assert_eq!(second["id"], 2);
    assert_eq!(second["data"]["n"], 2);
}

#[tokio::test(start_paused = true)]
async fn given_malformed_message_when_received_then_ignored() {
    let hub = start_hub(HubConfig::default(), 100);
    hub.broadcast_event("change", "tenant-a", Bytes::from_static(b"{}"))
        .unwrap();
    let mut client = connect(&hub, ConnectionConfig::default(), Some("tenant-a"));

    client
        .to_server
        .unbounded_send(Ok(Message::Text("{not json".into())))
        .unwrap();
    client.to_server.unbounded_send(subscribe(0)).unwrap();

    let frame = text_json(client.from_server.next().await.unwrap());
    assert_eq!(frame["id"], 1);
    assert!(!client.handle.is_closed());
}

#[tokio::test(start_paused = true)]
async fn given_evicted_position_when_subscribing_then_reset_sent() {
    let hub = start_hub(HubConfig::default(), 2);
    for _ in 0..4 {
        hub.broadcast_event("change", "tenant-a", Bytes::from_static(b"{}"))
            .unwrap();
    }
    let mut client = connect(&hub, ConnectionConfig::default(), Some("tenant-a"));

    client.to_server.unbounded_send(subscribe(1)).unwrap();

    let frame = text_json(client.from_server.next().await.unwrap());
    assert_eq!(frame["type"], "reset");
}

#[tokio::test(start_paused = true)]
async fn given_live_broadcast_when_connected_then_forwarded() {
    let hub = start_hub(HubConfig::default(), 100);
    let mut client = connect(&hub, ConnectionConfig::default(), Some("tenant-a"));
    hub.stats().await;

    hub.broadcast_event("node_created", "tenant-a", Bytes::from_static(br#"{"count":2}"#))
        .unwrap();

    let frame = text_json(client.from_server.next().await.unwrap());
    assert_eq!(frame["type"], "node_created");
    assert_eq!(frame["data"]["count"], 2);
}

#[tokio::test(start_paused = true)]
async fn given_no_pongs_when_pinging_then_closed_after_two_misses() {
    let hub = start_hub(HubConfig::default(), 100);
    let mut client = connect(&hub, ConnectionConfig::default(), Some("tenant-a"));

    assert!(matches!(client.from_server.next().await, Some(Message::Ping(_))));
    assert!(matches!(client.from_server.next().await, Some(Message::Ping(_))));
    let close = client.from_server.next().await.unwrap();

    assert_eq!(close_code_of(close), close_code::POLICY);
    client.actor.await.unwrap();
    assert_eq!(hub.stats().await.total, 0);
}

#[tokio::test(start_paused = true)]
async fn given_pongs_when_pinging_then_connection_stays_open() {
    let hub = start_hub(HubConfig::default(), 100);
    let mut client = connect(&hub, ConnectionConfig::default(), Some("tenant-a"));

    for _ in 0..5 {
        assert!(matches!(client.from_server.next().await, Some(Message::Ping(_))));
        client
            .to_server
            .unbounded_send(Ok(Message::Pong(Bytes::new())))
            .unwrap();
    }

    assert!(!client.handle.is_closed());
}

#[tokio::test(start_paused = true)]
async fn given_revoked_credential_when_refreshed_then_closed_with_auth_expired() {
    let hub = start_hub(HubConfig::default(), 100);
    let config = ConnectionConfig {
        ping_interval: Duration::from_secs(3600),
        credential_refresh: Duration::from_secs(60),
        ..ConnectionConfig::default()
    };
    let mut client = connect(&hub, config, None);

    let close = client.from_server.next().await.unwrap();

    assert_eq!(close_code_of(close), AUTH_EXPIRED_CLOSE_CODE);
    client.actor.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn given_credential_for_other_tenant_when_refreshed_then_closed_with_auth_expired() {
    let hub = start_hub(HubConfig::default(), 100);
    let config = ConnectionConfig {
        ping_interval: Duration::from_secs(3600),
        credential_refresh: Duration::from_secs(60),
        ..ConnectionConfig::default()
    };
    let mut client = connect(&hub, config, Some("tenant-b"));

    let close = client.from_server.next().await.unwrap();

    assert_eq!(close_code_of(close), AUTH_EXPIRED_CLOSE_CODE);
}

#[tokio::test(start_paused = true)]
async fn given_max_lifetime_when_elapsed_then_closed() {
    let hub = start_hub(HubConfig::default(), 100);
    let config = ConnectionConfig {
        ping_interval: Duration::from_secs(3600),
        credential_refresh: Duration::from_secs(3600),
        max_lifetime: Duration::from_secs(120),
        ..ConnectionConfig::default()
    };
    let mut client = connect(&hub, config, Some("tenant-a"));

    let close = client.from_server.next().await.unwrap();

    assert_eq!(close_code_of(close), close_code::NORMAL);
}

#[tokio::test(start_paused = true)]
async fn given_hub_close_when_frames_queued_then_flushed_before_close() {
    let hub = start_hub(HubConfig::default(), 100);
    let mut client = connect(&hub, ConnectionConfig::default(), Some("tenant-a"));

    client.handle.outbound.try_send(Arc::from(r#"{"type":"a"}"#)).unwrap();
    client.handle.outbound.try_send(Arc::from(r#"{"type":"b"}"#)).unwrap();
    client.handle.close();

    let mut texts = Vec::new();
    let close = loop {
        match client.from_server.next().await.unwrap() {
            Message::Text(text) => texts.push(text.to_string()),
            other => break other,
        }
    };

    assert_eq!(texts.len(), 2);
    assert_eq!(close_code_of(close), close_code::AWAY);
    client.actor.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn given_client_disconnect_when_stream_ends_then_unregistered() {
    let hub = start_hub(HubConfig::default(), 100);
    let client = connect(&hub, ConnectionConfig::default(), Some("tenant-a"));
    assert_eq!(hub.stats().await.total, 1);

    drop(client.to_server);
    client.actor.await.unwrap();

    assert!(client.handle.is_closed());
    assert_eq!(hub.stats().await.total, 0);
}

#[tokio::test(start_paused = true)]
async fn given_stalled_transport_when_closed_then_actor_finishes() {
    let hub = start_hub(HubConfig::default(), 100);
    let client = connect_stalled(&hub, ConnectionConfig::default());
    hub.broadcast_event("change", "tenant-a", Bytes::from_static(b"{}"))
        .unwrap();
    sleep(Duration::from_secs(1)).await;

    client.handle.close();

    timeout(Duration::from_secs(5), client.actor)
        .await
        .expect("actor should stop after close")
        .unwrap();
    assert_eq!(hub.stats().await.total, 0);
}

#[tokio::test(start_paused = true)]
async fn given_stalled_transport_when_lifetime_elapses_then_actor_finishes() {
    let hub = start_hub(HubConfig::default(), 100);
    let config = ConnectionConfig {
        ping_interval: Duration::from_secs(3600),
        credential_refresh: Duration::from_secs(3600),
        max_lifetime: Duration::from_secs(120),
        ..ConnectionConfig::default()
    };
    let client = connect_stalled(&hub, config);
    hub.broadcast_event("change", "tenant-a", Bytes::from_static(b"{}"))
        .unwrap();

    timeout(Duration::from_secs(300), client.actor)
        .await
        .expect("actor should stop at its lifetime cap")
        .unwrap();
    assert!(client.handle.is_closed());
    assert_eq!(hub.stats().await.total, 0);
}

#[tokio::test(start_paused = true)]
async fn given_pending_credential_check_when_event_broadcast_then_still_delivered() {
    let hub = start_hub(HubConfig::default(), 100);
    let config = ConnectionConfig {
        ping_interval: Duration::from_secs(3600),
        credential_refresh: Duration::from_secs(60),
        credential_timeout: Duration::from_secs(10),
        ..ConnectionConfig::default()
    };
    let validator = Arc::new(SlowValidator {
        tenant_id: "tenant-a".to_string(),
        delay: Duration::from_secs(5),
    });
    let (server_sink, mut from_server) = unbounded();
    let (handle, _to_server, _actor) = spawn_actor(&hub, config, validator, server_sink);
    sleep(Duration::from_secs(61)).await;

    hub.broadcast_event("change", "tenant-a", Bytes::from_static(br#"{"n":1}"#))
        .unwrap();

    let frame = timeout(Duration::from_secs(1), from_server.next())
        .await
        .expect("frame should not wait for the credential check")
        .unwrap();
    assert_eq!(text_json(frame)["data"]["n"], 1);

    sleep(Duration::from_secs(10)).await;
    assert!(!handle.is_closed());
}

#[tokio::test(start_paused = true)]
async fn given_pending_credential_check_when_closed_then_actor_finishes() {
    let hub = start_hub(HubConfig::default(), 100);
    let config = ConnectionConfig {
        ping_interval: Duration::from_secs(3600),
        credential_refresh: Duration::from_secs(60),
        credential_timeout: Duration::from_secs(30),
        ..ConnectionConfig::default()
    };
    let validator = Arc::new(SlowValidator {
        tenant_id: "tenant-a".to_string(),
        delay: Duration::from_secs(3600),
    });
    let (server_sink, mut from_server) = unbounded();
    let (handle, _to_server, actor) = spawn_actor(&hub, config, validator, server_sink);
    sleep(Duration::from_secs(61)).await;

    handle.close();

    timeout(Duration::from_secs(2), actor)
        .await
        .expect("actor should not wait for the credential check")
        .unwrap();
    assert_eq!(close_code_of(from_server.next().await.unwrap()), close_code::AWAY);
}

#[tokio::test(start_paused = true)]
async fn given_full_queue_when_reset_needed_then_connection_closed() {
    let hub = start_hub(HubConfig::default(), 2);
    for _ in 0..4 {
        hub.broadcast_event("change", "tenant-a", Bytes::from_static(b"{}"))
            .unwrap();
    }
    let config = ConnectionConfig {
        send_buffer_size: 1,
        ..ConnectionConfig::default()
    };
    let client = connect_stalled(&hub, config);

    client.handle.outbound.try_send(Arc::from(r#"{"type":"a"}"#)).unwrap();
    while !client.handle.is_drained() {
        tokio::task::yield_now().await;
    }
    client.handle.outbound.try_send(Arc::from(r#"{"type":"b"}"#)).unwrap();
    client.to_server.unbounded_send(subscribe(1)).unwrap();

    timeout(Duration::from_secs(5), client.actor)
        .await
        .expect("actor should stop when the reset cannot be queued")
        .unwrap();
    assert!(client.handle.is_closed());
    assert_eq!(hub.stats().await.total, 0);
}
