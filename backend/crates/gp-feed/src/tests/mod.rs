mod bridge;

use crate::{
    EventSink, FeedError, NotificationSource, NotificationStream, Result as FeedErrorResult,
};

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::mpsc;
use tokio::time::Instant;

pub(crate) enum Listen {
    Fail,
    Stream(mpsc::UnboundedReceiver<String>),
}

/// Plays back a fixed sequence of listen outcomes. Once the script runs out,
/// listens succeed with a stream that never yields.
pub(crate) struct ScriptedSource {
    pub reachable: bool,
    pub script: Mutex<VecDeque<Listen>>,
    pub listens: Mutex<Vec<Instant>>,
    pub pings: Mutex<usize>,
}

impl ScriptedSource {
    pub fn new(script: Vec<Listen>) -> Self {
        Self {
            reachable: true,
            script: Mutex::new(script.into()),
            listens: Mutex::new(Vec::new()),
            pings: Mutex::new(0),
        }
    }

    pub fn listen_times(&self) -> Vec<Instant> {
        self.listens.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotificationSource for ScriptedSource {
    async fn ping(&self) -> FeedErrorResult<()> {
        *self.pings.lock().unwrap() += 1;
        if self.reachable {
            Ok(())
        } else {
            Err(FeedError::unreachable("connection refused"))
        }
    }

    async fn listen(&self, _channel: &str) -> FeedErrorResult<Box<dyn NotificationStream>> {
        self.listens.lock().unwrap().push(Instant::now());

        match self.script.lock().unwrap().pop_front() {
            Some(Listen::Fail) => Err(FeedError::connection_lost("connect refused")),
            Some(Listen::Stream(rx)) => Ok(Box::new(ScriptedStream { rx: Some(rx) })),
            None => Ok(Box::new(ScriptedStream { rx: None })),
        }
    }
}

struct ScriptedStream {
    rx: Option<mpsc::UnboundedReceiver<String>>,
}

#[async_trait]
impl NotificationStream for ScriptedStream {
    async fn recv(&mut self) -> FeedErrorResult<String> {
        match &mut self.rx {
            Some(rx) => rx
                .recv()
                .await
                .ok_or_else(|| FeedError::connection_lost("server closed the connection")),
            None => std::future::pending().await,
        }
    }
}

#[derive(Default)]
pub(crate) struct RecordingSink {
    pub published: Mutex<Vec<(String, String, Bytes)>>,
}

impl RecordingSink {
    pub fn published(&self) -> Vec<(String, String, Bytes)> {
        self.published.lock().unwrap().clone()
    }
}

impl EventSink for RecordingSink {
    fn publish(&self, event_type: &str, tenant_id: &str, data: Bytes) -> gp_ws::Result<u64> {
        let mut published = self.published.lock().unwrap();
        published.push((event_type.to_string(), tenant_id.to_string(), data));
        Ok(published.len() as u64)
    }
}

/// Poll `condition` every 10ms, giving up after ten (virtual) minutes
pub(crate) async fn wait_until(condition: impl Fn() -> bool) -> bool {
    for _ in 0..60_000 {
        if condition() {
            return true;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    false
}
