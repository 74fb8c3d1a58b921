use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::net::TcpListener;
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;

use pubsub_core::{AccountId, Event};
use pubsub_transport::{Endpoint, Notifier, ReconnectPolicy, TransportError, WsSender};

const FAST: ReconnectPolicy = ReconnectPolicy {
    backoff: Duration::from_millis(20),
};

#[tokio::test]
async fn sends_one_text_message_per_event() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let endpoint = Endpoint::new("127.0.0.1", listener.local_addr().unwrap().port()).unwrap();

    let server = tokio::spawn(async move {
        let (tcp, _) = listener.accept().await.unwrap();
        let mut ws = accept_async(tcp).await.unwrap();
        // Inbound traffic must not block the sender.
        ws.send(Message::text("Successfully connected to publisher"))
            .await
            .unwrap();

        let mut received = Vec::new();
        while received.len() < 2 {
            match ws.next().await {
                Some(Ok(Message::Text(text))) => received.push(text),
                Some(Ok(_)) => continue,
                other => panic!("unexpected {other:?}"),
            }
        }
        received
    });

    let sender = WsSender::connect(endpoint, FAST, &CancellationToken::new())
        .await
        .unwrap();
    let first = Event::new(AccountId::new("t1").unwrap(), "a", 1);
    let second = Event::new(AccountId::new("t2").unwrap(), "b", 2);
    sender.send_event(&first).await.unwrap();
    sender.send_event(&second).await.unwrap();

    let received = tokio::time::timeout(Duration::from_secs(5), server)
        .await
        .expect("server did not receive both events")
        .unwrap();
    assert_eq!(received[0], first.encode().unwrap());
    assert_eq!(received[1], second.encode().unwrap());
    assert_eq!(Event::decode(received[0].as_bytes()).unwrap(), first);
}

#[tokio::test]
async fn connect_is_cancellable() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let endpoint = Endpoint::new("127.0.0.1", listener.local_addr().unwrap().port()).unwrap();
    drop(listener);

    let cancel = CancellationToken::new();
    let canceller = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            cancel.cancel();
        })
    };

    let result = tokio::time::timeout(
        Duration::from_secs(5),
        WsSender::connect(endpoint, FAST, &cancel),
    )
    .await
    .expect("cancelled connect must return");
    assert!(matches!(result, Err(TransportError::Cancelled)));
    canceller.await.unwrap();
}
