use std::sync::Arc;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::net::TcpListener;
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;

use pubsub_observability::CaptureSink;
use pubsub_pipeline::{PipelineConfig, SinkMode};
use pubsub_transport::{Endpoint, ReconnectPolicy, WsReceiver};

const FAST: ReconnectPolicy = ReconnectPolicy {
    backoff: Duration::from_millis(20),
};

fn frame(account: &str, data: &str, ts: i64) -> Message {
    Message::text(format!(
        r#"{{"accountId":"{account}","data":"{data}","timestamp":{ts}}}"#
    ))
}

/// A one-shot publisher: greets, sends `frames`, then returns the close code
/// it receives from the subscriber.
async fn spawn_publisher(frames: Vec<Message>) -> (Endpoint, tokio::task::JoinHandle<Option<u16>>) {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("failed to bind ephemeral port");
    let port = listener.local_addr().unwrap().port();

    let handle = tokio::spawn(async move {
        let (tcp, _) = listener.accept().await.unwrap();
        let mut ws = accept_async(tcp).await.unwrap();
        ws.send(Message::text("Successfully connected to publisher"))
            .await
            .unwrap();
        for f in frames {
            ws.send(f).await.unwrap();
        }
        while let Some(msg) = ws.next().await {
            if let Ok(Message::Close(frame)) = msg {
                return frame.map(|f| u16::from(f.code));
            }
        }
        None
    });

    (Endpoint::new("127.0.0.1", port).unwrap(), handle)
}

async fn wait_for_lines(lines: &CaptureSink, n: usize) {
    for _ in 0..200 {
        if lines.lines().len() >= n {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("expected {n} lines, got {:?}", lines.lines());
}

#[tokio::test]
async fn prints_filtered_events_and_closes_cleanly() {
    let (endpoint, publisher) =
        spawn_publisher(vec![frame("t1", "a", 1), frame("t2", "b", 2), frame("t1", "c", 3)]).await;

    let lines = Arc::new(CaptureSink::new());
    let interrupt = CancellationToken::new();
    let receiver = Arc::new(WsReceiver::new(endpoint).with_policy(FAST));

    let run = tokio::spawn(pubsub_subscriber::serve(
        receiver,
        PipelineConfig::default().with_filter("t1"),
        lines.clone(),
        interrupt.clone(),
    ));

    wait_for_lines(&lines, 2).await;
    interrupt.cancel();

    tokio::time::timeout(Duration::from_secs(5), run)
        .await
        .expect("subscriber did not stop")
        .unwrap()
        .unwrap();

    assert_eq!(
        lines.lines(),
        vec![
            "Received a data from active account id t1: data: a, time: 1".to_string(),
            "Received a data from active account id t1: data: c, time: 3".to_string(),
        ]
    );
    assert_eq!(publisher.await.unwrap(), Some(1000));
}

#[tokio::test]
async fn aggregates_until_interrupted() {
    let (endpoint, publisher) =
        spawn_publisher(vec![frame("t1", "a", 1), frame("t2", "b", 2), frame("t1", "c", 3)]).await;

    let lines = Arc::new(CaptureSink::new());
    let interrupt = CancellationToken::new();
    let receiver = Arc::new(WsReceiver::new(endpoint).with_policy(FAST));
    let config = PipelineConfig::default()
        .with_mode(SinkMode::Aggregate)
        .with_aggregate_interval(Duration::from_millis(200))
        .with_grace_period(Duration::from_millis(100));

    let run = tokio::spawn(pubsub_subscriber::serve(
        receiver,
        config,
        lines.clone(),
        interrupt.clone(),
    ));

    for _ in 0..200 {
        if lines.count("ID: t1, number of messages 2") > 0 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    interrupt.cancel();

    tokio::time::timeout(Duration::from_secs(5), run)
        .await
        .expect("subscriber did not stop")
        .unwrap()
        .unwrap();

    assert!(lines.count("ID: t1, number of messages 2") > 0, "{:?}", lines.lines());
    assert!(lines.count("ID: t2, number of messages 1") > 0);
    assert_eq!(publisher.await.unwrap(), Some(1000));
}

#[tokio::test]
async fn interrupt_while_dialing_is_a_clean_exit() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let interrupt = CancellationToken::new();
    let receiver = Arc::new(WsReceiver::new(Endpoint::new("127.0.0.1", port).unwrap()).with_policy(FAST));
    let run = tokio::spawn(pubsub_subscriber::serve(
        receiver,
        PipelineConfig::default(),
        Arc::new(CaptureSink::new()),
        interrupt.clone(),
    ));

    tokio::time::sleep(Duration::from_millis(100)).await;
    interrupt.cancel();

    tokio::time::timeout(Duration::from_secs(5), run)
        .await
        .expect("dialing was not interrupted")
        .unwrap()
        .unwrap();
}
