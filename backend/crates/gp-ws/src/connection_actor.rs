use crate::{ClientMessage, ConnectionConfig, ConnectionHandle, EventHub, Metrics, wire};

use gp_auth::{ConnectionRateLimiter, CredentialValidator};

use std::fmt::Display;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{CloseFrame, Message, close_code};
use bytes::Bytes;
use futures::{Sink, SinkExt, Stream, StreamExt};
use log::{debug, info, warn};
use tokio::sync::mpsc;
use tokio::time::error::Elapsed;
use tokio::time::{Instant, MissedTickBehavior, Sleep, interval_at, sleep_until, timeout};
use tokio_util::sync::CancellationToken;

/// Close code sent when the periodic credential check fails
pub const AUTH_EXPIRED_CLOSE_CODE: u16 = 4001;

/// Upper bound on the final flush and close handshake once a connection stops
const CLOSE_FLUSH_TIMEOUT: Duration = Duration::from_secs(1);

/// Runs one connection: a read pump and a write pump sharing a close token.
///
/// Generic over the transport so tests can drive it with plain channels.
pub struct ConnectionActor {
    hub: EventHub,
    handle: ConnectionHandle,
    outbound_rx: mpsc::Receiver<Arc<str>>,
    validator: Arc<dyn CredentialValidator>,
    api_key: String,
    config: ConnectionConfig,
    metrics: Metrics,
}

impl ConnectionActor {
    pub fn new(
        hub: EventHub,
        handle: ConnectionHandle,
        outbound_rx: mpsc::Receiver<Arc<str>>,
        validator: Arc<dyn CredentialValidator>,
        api_key: String,
        config: ConnectionConfig,
        metrics: Metrics,
    ) -> Self {
        Self {
            hub,
            handle,
            outbound_rx,
            validator,
            api_key,
            config,
            metrics,
        }
    }

    /// Drive the connection until either pump stops, then unregister
    pub async fn run<S, R, E>(self, sink: S, stream: R)
    where
        S: Sink<Message> + Unpin,
        R: Stream<Item = Result<Message, E>> + Unpin,
        E: Display,
    {
        let Self {
            hub,
            handle,
            outbound_rx,
            validator,
            api_key,
            config,
            metrics,
        } = self;

        info!(
            "Connection {} established for tenant {}",
            handle.id, handle.tenant_id
        );
        metrics.connection_established();

        let rate_limiter = ConnectionRateLimiter::per_second(config.rate_limit_per_sec);

        let ((), reason) = tokio::join!(
            read_pump(stream, &hub, &handle, &rate_limiter, &metrics),
            write_pump(sink, outbound_rx, &handle, validator.as_ref(), &api_key, &config),
        );

        handle.close();
        hub.unregister(handle.id);
        metrics.connection_closed(reason);

        info!(
            "Connection {} closed for tenant {} ({})",
            handle.id, handle.tenant_id, reason
        );
    }
}

async fn read_pump<R, E>(
    mut stream: R,
    hub: &EventHub,
    handle: &ConnectionHandle,
    rate_limiter: &ConnectionRateLimiter,
    metrics: &Metrics,
) where
    R: Stream<Item = Result<Message, E>> + Unpin,
    E: Display,
{
    let close = handle.close_token();

    loop {
        let message = tokio::select! {
            _ = close.cancelled() => break,
            message = stream.next() => message,
        };

        match message {
            Some(Ok(Message::Text(text))) => {
                if rate_limiter.check().is_err() {
                    debug!("Connection {} over inbound rate limit, ignoring", handle.id);
                    metrics.message_ignored("rate_limited");
                    continue;
                }

                match wire::decode_client_message(text.as_str()) {
                    Some(ClientMessage::Subscribe { last_event_id }) => {
                        metrics.message_received("subscribe");
                        if !hub.replay_events(handle, last_event_id)
                            && handle
                                .outbound
                                .try_send(wire::reset_frame("replay window exceeded"))
                                .is_err()
                        {
                            warn!(
                                "Connection {} has no room for its reset frame, closing",
                                handle.id
                            );
                            metrics.message_ignored("reset_dropped");
                            handle.close();
                            break;
                        }
                    }
                    None => {
                        debug!("Ignoring malformed message on connection {}", handle.id);
                        metrics.message_ignored("malformed");
                    }
                }
            }
            Some(Ok(Message::Pong(_))) => handle.pong_received(),
            Some(Ok(Message::Close(_))) | None => {
                debug!("Connection {} closed by client", handle.id);
                break;
            }
            Some(Ok(_)) => {}
            Some(Err(e)) => {
                debug!("Read error on connection {}: {}", handle.id, e);
                break;
            }
        }
    }

    handle.close();
}

async fn write_pump<S>(
    mut sink: S,
    mut outbound_rx: mpsc::Receiver<Arc<str>>,
    handle: &ConnectionHandle,
    validator: &dyn CredentialValidator,
    api_key: &str,
    config: &ConnectionConfig,
) -> &'static str
where
    S: Sink<Message> + Unpin,
{
    let close = handle.close_token();
    let start = Instant::now();

    let mut ping = interval_at(start + config.ping_interval, config.ping_interval);
    ping.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut refresh = interval_at(start + config.credential_refresh, config.credential_refresh);
    refresh.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let lifetime = sleep_until(start + config.max_lifetime);
    tokio::pin!(lifetime);

    let mut credential_check: Option<CredentialCheck<'_>> = None;

    let (reason, close_frame) = loop {
        tokio::select! {
            biased;

            _ = close.cancelled() => {
                break ("closed", close_with(close_code::AWAY, "closing"));
            }
            _ = &mut lifetime => {
                info!("Connection {} reached its maximum lifetime", handle.id);
                break ("lifetime", close_with(close_code::NORMAL, "max lifetime reached"));
            }
            checked = await_check(&mut credential_check), if credential_check.is_some() => {
                credential_check = None;
                match checked {
                    Ok(Ok(tenant_id)) if tenant_id == handle.tenant_id => {
                        debug!("Credential refreshed for connection {}", handle.id);
                    }
                    Ok(Ok(tenant_id)) => {
                        warn!(
                            "Connection {} credential now maps to tenant {} (was {}), closing",
                            handle.id, tenant_id, handle.tenant_id
                        );
                        break ("auth_expired", close_with(AUTH_EXPIRED_CLOSE_CODE, "auth expired"));
                    }
                    Ok(Err(e)) => {
                        warn!("Connection {} credential refresh failed: {}", handle.id, e);
                        break ("auth_expired", close_with(AUTH_EXPIRED_CLOSE_CODE, "auth expired"));
                    }
                    Err(_) => {
                        warn!(
                            "Connection {} credential refresh timed out after {:?}",
                            handle.id, config.credential_timeout
                        );
                        break ("auth_expired", close_with(AUTH_EXPIRED_CLOSE_CODE, "auth expired"));
                    }
                }
            }
            _ = refresh.tick() => {
                if credential_check.is_none() {
                    let check: CredentialCheck<'_> =
                        Box::pin(timeout(config.credential_timeout, validator.validate(api_key)));
                    credential_check = Some(check);
                }
            }
            _ = ping.tick() => {
                if handle.missed_pings() >= config.max_missed_pongs {
                    warn!(
                        "Connection {} missed {} pongs, closing",
                        handle.id,
                        handle.missed_pings()
                    );
                    break ("heartbeat", close_with(close_code::POLICY, "heartbeat timeout"));
                }
                handle.ping_sent();
                let ping = Message::Ping(Bytes::new());
                if let Write::Failed = write(&mut sink, ping, close, lifetime.as_mut()).await {
                    break ("transport", None);
                }
            }
            frame = outbound_rx.recv() => {
                let Some(frame) = frame else {
                    break ("closed", close_with(close_code::AWAY, "closing"));
                };
                let text = Message::Text(frame.as_ref().into());
                if let Write::Failed = write(&mut sink, text, close, lifetime.as_mut()).await {
                    break ("transport", None);
                }
            }
        }
    };

    handle.close();
    drop(credential_check);

    if close_frame.is_some() {
        // Frames queued before the close are still delivered if the peer keeps up.
        let flush = async {
            while let Ok(frame) = outbound_rx.try_recv() {
                if sink.send(Message::Text(frame.as_ref().into())).await.is_err() {
                    return;
                }
            }
            let _ = sink.send(Message::Close(close_frame)).await;
        };
        if timeout(CLOSE_FLUSH_TIMEOUT, flush).await.is_err() {
            debug!("Connection {} did not accept its close frame in time", handle.id);
        }
    }
    let _ = timeout(CLOSE_FLUSH_TIMEOUT, sink.close()).await;

    reason
}

type CredentialCheck<'a> =
    Pin<Box<dyn Future<Output = Result<gp_auth::Result<String>, Elapsed>> + Send + 'a>>;

async fn await_check(
    check: &mut Option<CredentialCheck<'_>>,
) -> Result<gp_auth::Result<String>, Elapsed> {
    match check {
        Some(pending) => pending.await,
        None => std::future::pending().await,
    }
}

enum Write {
    Sent,
    Interrupted,
    Failed,
}

/// Send one message unless the connection closes or expires first
async fn write<S>(
    sink: &mut S,
    message: Message,
    close: &CancellationToken,
    lifetime: Pin<&mut Sleep>,
) -> Write
where
    S: Sink<Message> + Unpin,
{
    tokio::select! {
        biased;

        _ = close.cancelled() => Write::Interrupted,
        _ = lifetime => Write::Interrupted,
        sent = sink.send(message) => match sent {
            Ok(()) => Write::Sent,
            Err(_) => Write::Failed,
        },
    }
}

fn close_with(code: u16, reason: &str) -> Option<CloseFrame> {
    Some(CloseFrame {
        code,
        reason: reason.into(),
    })
}
