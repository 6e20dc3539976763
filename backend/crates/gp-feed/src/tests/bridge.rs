use crate::tests::{Listen, RecordingSink, ScriptedSource, wait_until};
use crate::{ChangeFeedBridge, FeedError, Metrics};

use gp_config::ChangeFeedConfig;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

async fn start(
    source: &Arc<ScriptedSource>,
    sink: &Arc<RecordingSink>,
    config: &ChangeFeedConfig,
) -> crate::Result<(ChangeFeedBridge, CancellationToken)> {
    let cancel = CancellationToken::new();
    let bridge = ChangeFeedBridge::start(
        source.clone(),
        sink.clone(),
        config,
        Metrics::default(),
        cancel.clone(),
    )
    .await?;
    Ok((bridge, cancel))
}

fn gaps(source: &ScriptedSource) -> Vec<f64> {
    source
        .listen_times()
        .windows(2)
        .map(|pair| (pair[1] - pair[0]).as_secs_f64())
        .collect()
}

fn assert_within_quarter(actual: f64, nominal: f64) {
    assert!(
        actual >= nominal * 0.75 - 1e-6 && actual <= nominal * 1.25 + 1e-6,
        "{actual}s outside ±25% of {nominal}s"
    );
}

#[tokio::test]
async fn given_invalid_channel_when_starting_then_rejected_before_probe() {
    let source = Arc::new(ScriptedSource::new(vec![]));
    let sink = Arc::new(RecordingSink::default());
    let config = ChangeFeedConfig {
        channel: "graph-changes; NOTIFY x".to_string(),
        ..ChangeFeedConfig::default()
    };

    let result = start(&source, &sink, &config).await;

    assert!(matches!(result, Err(FeedError::InvalidChannel { .. })));
    assert_eq!(*source.pings.lock().unwrap(), 0);
}

#[tokio::test]
async fn given_unreachable_database_when_starting_then_unreachable() {
    let source = Arc::new(ScriptedSource {
        reachable: false,
        ..ScriptedSource::new(vec![])
    });
    let sink = Arc::new(RecordingSink::default());

    let result = start(&source, &sink, &ChangeFeedConfig::default()).await;

    assert!(matches!(result, Err(FeedError::Unreachable { .. })));
    assert!(source.listen_times().is_empty());
}

#[tokio::test(start_paused = true)]
async fn given_notifications_when_received_then_raw_payload_forwarded() {
    let (tx, rx) = mpsc::unbounded_channel();
    let source = Arc::new(ScriptedSource::new(vec![Listen::Stream(rx)]));
    let sink = Arc::new(RecordingSink::default());
    let (bridge, cancel) = start(&source, &sink, &ChangeFeedConfig::default())
        .await
        .unwrap();

    let raw = r#"{"tenant_id":"t1","type":"nodes_changed","count":3}"#;
    tx.send(raw.to_string()).unwrap();
    tx.send(r#"{"tenant_id":"t2"}"#.to_string()).unwrap();

    assert!(wait_until(|| sink.published().len() == 2).await);
    let published = sink.published();
    assert_eq!(published[0].0, "nodes_changed");
    assert_eq!(published[0].1, "t1");
    assert_eq!(&published[0].2[..], raw.as_bytes());
    assert_eq!(published[1].0, "change");
    assert_eq!(published[1].1, "t2");

    cancel.cancel();
    bridge.join().await;
}

#[tokio::test(start_paused = true)]
async fn given_unusable_notifications_when_received_then_dropped_and_loop_continues() {
    let (tx, rx) = mpsc::unbounded_channel();
    let source = Arc::new(ScriptedSource::new(vec![Listen::Stream(rx)]));
    let sink = Arc::new(RecordingSink::default());
    let (bridge, cancel) = start(&source, &sink, &ChangeFeedConfig::default())
        .await
        .unwrap();

    for raw in ["garbage", r#"{"count":1}"#, r#"{"tenant_id":""}"#, r#"{"tenant_id":"ok"}"#] {
        tx.send(raw.to_string()).unwrap();
    }

    assert!(wait_until(|| !sink.published().is_empty()).await);
    let published = sink.published();
    assert_eq!(published.len(), 1);
    assert_eq!(published[0].1, "ok");
    assert_eq!(source.listen_times().len(), 1);

    cancel.cancel();
    bridge.join().await;
}

#[tokio::test(start_paused = true)]
async fn given_failing_listens_when_reconnecting_then_delays_double_with_jitter() {
    let source = Arc::new(ScriptedSource::new(vec![
        Listen::Fail,
        Listen::Fail,
        Listen::Fail,
        Listen::Fail,
        Listen::Fail,
        Listen::Fail,
        Listen::Fail,
    ]));
    let sink = Arc::new(RecordingSink::default());
    let (bridge, cancel) = start(&source, &sink, &ChangeFeedConfig::default())
        .await
        .unwrap();

    assert!(wait_until(|| source.listen_times().len() == 8).await);

    let gaps = gaps(&source);
    for (gap, nominal) in gaps.iter().zip([1.0, 2.0, 4.0, 8.0, 16.0, 30.0, 30.0]) {
        assert_within_quarter(*gap, nominal);
    }

    cancel.cancel();
    bridge.join().await;
}

#[tokio::test(start_paused = true)]
async fn given_successful_subscribe_when_connection_later_lost_then_backoff_restarts() {
    let (tx, rx) = mpsc::unbounded_channel::<String>();
    let source = Arc::new(ScriptedSource::new(vec![
        Listen::Fail,
        Listen::Fail,
        Listen::Stream(rx),
    ]));
    let sink = Arc::new(RecordingSink::default());
    let (bridge, cancel) = start(&source, &sink, &ChangeFeedConfig::default())
        .await
        .unwrap();

    assert!(wait_until(|| source.listen_times().len() == 3).await);
    drop(tx);
    assert!(wait_until(|| source.listen_times().len() == 4).await);

    let gaps = gaps(&source);
    assert_within_quarter(gaps[0], 1.0);
    assert_within_quarter(gaps[1], 2.0);
    assert_within_quarter(gaps[2], 1.0);

    cancel.cancel();
    bridge.join().await;
}

#[tokio::test(start_paused = true)]
async fn given_quiet_channel_when_deadline_expires_then_wait_resumes() {
    let (tx, rx) = mpsc::unbounded_channel();
    let source = Arc::new(ScriptedSource::new(vec![Listen::Stream(rx)]));
    let sink = Arc::new(RecordingSink::default());
    let config = ChangeFeedConfig {
        wait_deadline_secs: 1,
        ..ChangeFeedConfig::default()
    };
    let (bridge, cancel) = start(&source, &sink, &config).await.unwrap();

    tokio::time::sleep(Duration::from_secs(10)).await;
    tx.send(r#"{"tenant_id":"t1"}"#.to_string()).unwrap();

    assert!(wait_until(|| sink.published().len() == 1).await);
    assert_eq!(source.listen_times().len(), 1);

    cancel.cancel();
    bridge.join().await;
}

#[tokio::test(start_paused = true)]
async fn given_cancel_during_backoff_when_stopping_then_no_further_listens() {
    let source = Arc::new(ScriptedSource::new(vec![Listen::Fail, Listen::Fail]));
    let sink = Arc::new(RecordingSink::default());
    let (bridge, _cancel) = start(&source, &sink, &ChangeFeedConfig::default())
        .await
        .unwrap();

    assert!(wait_until(|| source.listen_times().len() == 1).await);
    bridge.stop();
    bridge.join().await;

    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(source.listen_times().len(), 1);
}
