//! Integration tests for reconnection strategies
//!
//! Strategy arithmetic on its own, then the strategy driving a live client.

mod common;

use common::wait_until;
use eventsockets::*;
use std::time::Duration;

#[test]
fn test_exponential_backoff_full_sequence() {
    verbose_println!("Testing exponential backoff full sequence...");

    let strategy = ExponentialBackoff::new(
        Duration::from_millis(100),
        Duration::from_secs(10),
        Some(5),
    );

    let expected_delays = [100, 200, 400, 800, 1600];

    for (attempt, &expected_ms) in expected_delays.iter().enumerate() {
        let delay = strategy.next_delay(attempt).unwrap();
        verbose_println!("  Attempt {}: {:?}", attempt, delay);
        assert_eq!(
            delay.as_millis(),
            expected_ms,
            "Unexpected delay at attempt {}",
            attempt
        );
    }

    // max_attempts = 5
    assert!(strategy.next_delay(5).is_none());
}

#[test]
fn test_exponential_backoff_with_capping() {
    let strategy = ExponentialBackoff::new(
        Duration::from_millis(500),
        Duration::from_secs(2),
        None,
    );

    let delays: Vec<u64> = (0..6)
        .map(|i| strategy.next_delay(i).unwrap().as_millis() as u64)
        .collect();

    verbose_println!("  Delays: {:?}", delays);
    assert_eq!(delays, vec![500, 1000, 2000, 2000, 2000, 2000]);
}

#[test]
fn test_jittered_delays_stay_within_bounds() {
    let strategy = ExponentialBackoff::new(
        Duration::from_millis(1000),
        Duration::from_millis(5000),
        None,
    )
    .with_randomization(0.5);

    for _ in 0..200 {
        let first = strategy.next_delay(0).unwrap();
        assert!(first >= Duration::from_millis(500) && first <= Duration::from_millis(1500));

        let capped = strategy.next_delay(10).unwrap();
        assert!(capped >= Duration::from_millis(2500) && capped <= Duration::from_millis(5000));
    }
}

#[test]
fn test_client_config_strategy_matches_fields() {
    let config = ClientConfig {
        reconnection_attempts: 3,
        reconnection_delay_secs: 0.25,
        reconnection_delay_max_secs: 1.0,
        randomization_factor: 0.0,
        ..Default::default()
    };
    let strategy = config.reconnect_strategy();

    let delays: Vec<Option<Duration>> = (0..4).map(|i| strategy.next_delay(i)).collect();
    assert_eq!(
        delays,
        vec![
            Some(Duration::from_millis(250)),
            Some(Duration::from_millis(500)),
            Some(Duration::from_millis(1000)),
            None
        ]
    );
}

#[test]
fn test_exponential_backoff_overflow_safety() {
    let strategy = ExponentialBackoff::new(
        Duration::from_millis(100),
        Duration::from_secs(3600),
        None,
    );

    let delay = strategy.next_delay(30).unwrap();
    verbose_println!("  Delay at attempt 30: {:?}", delay);
    assert!(delay <= Duration::from_secs(3600));

    // Extreme attempt numbers saturate instead of panicking
    assert_eq!(strategy.next_delay(100), Some(Duration::from_secs(3600)));
    assert_eq!(strategy.next_delay(1000), Some(Duration::from_secs(3600)));
}

#[test]
fn test_fixed_delay_with_max_attempts() {
    let strategy = FixedDelay::new(Duration::from_millis(500), Some(3));

    assert_eq!(strategy.next_delay(0), Some(Duration::from_millis(500)));
    assert_eq!(strategy.next_delay(2), Some(Duration::from_millis(500)));
    assert!(strategy.next_delay(3).is_none());
}

#[test]
fn test_never_reconnect_always_fails() {
    let strategy = NeverReconnect;

    for attempt in 0..10 {
        assert!(strategy.next_delay(attempt).is_none());
        assert!(!strategy.should_reconnect(attempt));
    }
}

#[tokio::test]
async fn test_client_gives_up_after_attempt_limit() {
    let transport = MemoryTransport::new();
    transport.fail_next_opens(10);
    let client = EventClient::builder()
        .transport(transport.clone())
        .reconnect_strategy(FixedDelay::new(Duration::from_millis(5), Some(2)))
        .build()
        .unwrap();

    let err = client
        .connect(ConnectOptions::new("wss://memory").retry(true))
        .await
        .unwrap_err();

    match err {
        EventSocketError::Connection(reason) => assert!(reason.contains("after 2 attempts"), "{reason}"),
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(transport.opens(), 3);
    assert_eq!(client.connection_state(), ConnectionState::Disconnected);

    let mut reconnecting = Vec::new();
    let mut gave_up = false;
    while let Some(event) = client.try_recv_event() {
        match event {
            ClientEvent::Reconnecting(n) => reconnecting.push(n),
            ClientEvent::Error(message) if message.starts_with("Reconnection failed") => gave_up = true,
            _ => {}
        }
    }
    assert_eq!(reconnecting, vec![1, 2]);
    assert!(gave_up);
}

#[tokio::test]
async fn test_attempt_counter_resets_after_success() {
    let transport = MemoryTransport::new();
    let client = EventClient::builder()
        .transport(transport.clone())
        .reconnect_strategy(FixedDelay::new(Duration::from_millis(5), Some(1)))
        .build()
        .unwrap();
    client.connect(ConnectOptions::new("wss://memory")).await.unwrap();

    // Each drop is followed by exactly one successful retry, which is all the
    // strategy allows per outage
    for round in 2..=4 {
        transport.drop_connection();
        assert!(
            wait_until(Duration::from_secs(1), || transport.opens() == round && client.is_connected()).await,
            "round {round} did not reconnect"
        );
    }

    assert_eq!(client.metrics().reconnect_count, 3);
    client.disconnect().await.unwrap();
}

#[tokio::test]
async fn test_disconnect_during_backoff_stops_retrying() {
    let transport = MemoryTransport::new();
    transport.fail_next_opens(1);
    let client = EventClient::builder()
        .transport(transport.clone())
        .reconnect_strategy(FixedDelay::new(Duration::from_secs(30), None))
        .build()
        .unwrap();

    client
        .connect(ConnectOptions::new("wss://memory").retry(true).wait(false))
        .await
        .unwrap();
    assert!(wait_until(Duration::from_secs(1), || client.connection_state() == ConnectionState::Reconnecting).await);

    tokio::time::timeout(Duration::from_secs(1), client.disconnect())
        .await
        .expect("disconnect interrupts the backoff sleep")
        .unwrap();

    assert_eq!(client.connection_state(), ConnectionState::Disconnected);
    assert_eq!(transport.opens(), 1);
}
