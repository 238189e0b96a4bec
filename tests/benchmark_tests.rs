//! Performance benchmarks for the wire codec and the relay path

use futures_util::{SinkExt, StreamExt};
use server::config::SessionConfig;
use server::network::{Server, GAME_PATH};
use server::session::Session;
use shared::{ClientMessage, ServerMessage};
use std::time::{Duration, Instant};
use tokio::time::timeout;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

/// Benchmarks encoding and decoding of relayed chat frames
#[test]
fn benchmark_message_codec() {
    let message = ServerMessage::Message {
        id: 7,
        text: "the quick brown fox jumps over the lazy dog".to_string(),
    };

    let iterations = 100_000;
    let start = Instant::now();

    for _ in 0..iterations {
        let frame = message.encode();
        let decoded = ServerMessage::decode(&frame).unwrap();
        assert_eq!(decoded.tag(), message.tag());
    }

    let duration = start.elapsed();
    println!(
        "Message codec: {} iterations in {:?} ({:.2} ns/iter)",
        iterations,
        duration,
        duration.as_nanos() as f64 / iterations as f64
    );

    // Should complete in under 1 second
    assert!(duration.as_millis() < 1000);
}

/// Benchmarks decoding of large handshakes
#[test]
fn benchmark_large_name_decoding() {
    let frame = ClientMessage::Name {
        name: "x".repeat(16 * 1024),
    }
    .encode();

    let iterations = 1_000;
    let start = Instant::now();

    for _ in 0..iterations {
        let _ = ClientMessage::decode(&frame).unwrap();
    }

    let duration = start.elapsed();
    println!(
        "Large name decoding: {} iterations in {:?} ({:.2} μs/iter)",
        iterations,
        duration,
        duration.as_micros() as f64 / iterations as f64
    );

    assert!(duration.as_millis() < 1000);
}

/// Measures round trips through a live server: alice sends, bob receives
#[tokio::test]
async fn benchmark_relay_round_trips() {
    let (session, handle) = Session::new(SessionConfig::default());
    let server = Server::bind("127.0.0.1:0", handle).await.unwrap();
    let url = format!("ws://{}{}", server.local_addr().unwrap(), GAME_PATH);
    tokio::spawn(session.run());
    tokio::spawn(server.run());

    // Join one at a time so alice is seated first with id 0
    let mut players = Vec::new();
    for name in ["alice", "bob"] {
        let (mut ws, _) = connect_async(url.as_str()).await.unwrap();
        let hello = ClientMessage::Name {
            name: name.to_string(),
        };
        ws.send(Message::Binary(hello.encode())).await.unwrap();
        timeout(Duration::from_secs(2), ws.next()).await.unwrap();
        players.push(ws);
    }
    let mut bob = players.pop().unwrap();
    let mut alice = players.pop().unwrap();

    // Drain the OTHER_NAME each of them was sent
    for ws in [&mut alice, &mut bob] {
        timeout(Duration::from_secs(2), ws.next()).await.unwrap();
    }

    let iterations = 500;
    let start = Instant::now();

    for i in 0..iterations {
        let message = ClientMessage::Message {
            text: format!("ping {}", i),
        };
        alice
            .send(Message::Binary(message.encode()))
            .await
            .unwrap();

        let frame = timeout(Duration::from_secs(2), bob.next())
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        let relayed = ServerMessage::decode(&frame.into_data()).unwrap();
        assert_eq!(
            relayed,
            ServerMessage::Message {
                id: 0,
                text: format!("ping {}", i)
            }
        );
    }

    let duration = start.elapsed();
    println!(
        "Relay round trips: {} iterations in {:?} ({:.2} μs/iter)",
        iterations,
        duration,
        duration.as_micros() as f64 / iterations as f64
    );

    // Loopback round trips should stay well under 10ms each
    assert!(duration.as_millis() < 5000);
}

/// Stress test: players come and go repeatedly through a single slot
#[tokio::test]
async fn stress_test_join_leave_churn() {
    let (session, handle) = Session::new(SessionConfig::with_capacity(1));
    let server = Server::bind("127.0.0.1:0", handle).await.unwrap();
    let url = format!("ws://{}{}", server.local_addr().unwrap(), GAME_PATH);
    tokio::spawn(session.run());
    tokio::spawn(server.run());

    let rounds = 50;
    let start = Instant::now();

    for round in 0..rounds {
        let (mut ws, _) = connect_async(url.as_str()).await.unwrap();
        let hello = ClientMessage::Name {
            name: format!("player{}", round),
        };
        ws.send(Message::Binary(hello.encode())).await.unwrap();

        let frame = timeout(Duration::from_secs(2), ws.next())
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        assert_eq!(
            ServerMessage::decode(&frame.into_data()).unwrap(),
            ServerMessage::Accepted
        );

        ws.send(Message::Binary(ClientMessage::Leave.encode()))
            .await
            .unwrap();

        // Wait for the server to drop us so the slot is free for the next round
        while let Ok(Some(Ok(_))) = timeout(Duration::from_secs(2), ws.next()).await {}
    }

    let duration = start.elapsed();
    println!(
        "Join/leave churn: {} rounds in {:?} ({:.2} ms/round)",
        rounds,
        duration,
        duration.as_millis() as f64 / rounds as f64
    );

    assert!(duration.as_secs() < 10);
}
