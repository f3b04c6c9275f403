//! Integration tests for inbound dispatch
//!
//! Ordering, isolation and the two registration forms.

mod common;

use common::wait_until;
use eventsockets::*;
use parking_lot::Mutex;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

async fn connected() -> (EventClient, MemoryTransport) {
    let transport = MemoryTransport::new();
    let client = EventClient::builder()
        .transport(transport.clone())
        .build()
        .unwrap();
    client.connect(ConnectOptions::new("wss://memory")).await.unwrap();
    (client, transport)
}

type Log = Arc<Mutex<Vec<String>>>;

fn recorder(log: &Log, tag: &'static str) -> impl Listener<Value> {
    let log = Arc::clone(log);
    sync_listener(move |payload: Value| -> ListenerResult {
        log.lock().push(format!("{tag}:{payload}"));
        Ok(())
    })
}

#[tokio::test]
async fn test_listeners_run_in_registration_order() {
    let (client, transport) = connected().await;
    let log: Log = Arc::default();

    client.on("tick", recorder(&log, "a"));
    client.on("tick", recorder(&log, "b"));
    client.on("tick", recorder(&log, "c"));

    assert!(transport.push("tick", json!(1)));
    assert!(transport.push("tick", json!(2)));

    assert!(wait_until(Duration::from_secs(1), || log.lock().len() == 6).await);
    assert_eq!(
        *log.lock(),
        vec!["a:1", "b:1", "c:1", "a:2", "b:2", "c:2"]
    );
    assert_eq!(client.metrics().frames_received, 2);
}

#[tokio::test]
async fn test_frames_of_one_event_are_sequential() {
    let (client, transport) = connected().await;
    let log: Log = Arc::default();

    let sink = Arc::clone(&log);
    client.on("slow", move |payload: Value| {
        let sink = Arc::clone(&sink);
        async move {
            sink.lock().push(format!("start:{payload}"));
            tokio::time::sleep(Duration::from_millis(30)).await;
            sink.lock().push(format!("end:{payload}"));
            anyhow::Ok(())
        }
    });

    transport.push("slow", json!(1));
    transport.push("slow", json!(2));

    assert!(wait_until(Duration::from_secs(1), || log.lock().len() == 4).await);
    assert_eq!(*log.lock(), vec!["start:1", "end:1", "start:2", "end:2"]);
}

#[tokio::test]
async fn test_events_do_not_block_each_other() {
    let (client, transport) = connected().await;
    let gate = Arc::new(Notify::new());
    let log: Log = Arc::default();

    let blocked = Arc::clone(&gate);
    let sink = Arc::clone(&log);
    client.on("blocked", move |_: Value| {
        let blocked = Arc::clone(&blocked);
        let sink = Arc::clone(&sink);
        async move {
            blocked.notified().await;
            sink.lock().push("blocked".to_string());
            anyhow::Ok(())
        }
    });
    client.on("free", recorder(&log, "free"));

    transport.push("blocked", Value::Null);
    transport.push("free", json!("x"));

    assert!(wait_until(Duration::from_secs(1), || log.lock().len() == 1).await);
    assert_eq!(*log.lock(), vec![r#"free:"x""#]);

    gate.notify_one();
    assert!(wait_until(Duration::from_secs(1), || log.lock().len() == 2).await);
}

#[tokio::test]
async fn test_backlog_of_a_slow_event_is_reported() {
    let (client, transport) = connected().await;
    let gate = Arc::new(Notify::new());
    let log: Log = Arc::default();

    let blocked = Arc::clone(&gate);
    let sink = Arc::clone(&log);
    client.on("slow", move |payload: Value| {
        let blocked = Arc::clone(&blocked);
        let sink = Arc::clone(&sink);
        async move {
            blocked.notified().await;
            sink.lock().push(payload.to_string());
            anyhow::Ok(())
        }
    });

    for n in 1..=3 {
        transport.push("slow", json!(n));
    }

    // The first frame is with the listener, the other two wait
    assert!(wait_until(Duration::from_secs(1), || client.metrics().frames_queued == 2).await);

    for done in 1..=3 {
        gate.notify_one();
        assert!(wait_until(Duration::from_secs(1), || log.lock().len() == done).await);
    }
    assert_eq!(*log.lock(), vec!["1", "2", "3"]);
    assert_eq!(client.metrics().frames_queued, 0);
}

#[tokio::test]
async fn test_failing_listeners_are_isolated() {
    let (client, transport) = connected().await;
    let log: Log = Arc::default();

    client.on("quote", |_: Value| async { Err::<(), _>(anyhow::anyhow!("rejected")) });
    client.on(
        "quote",
        sync_listener(|_: Value| -> ListenerResult { panic!("listener bug") }),
    );
    client.on("quote", recorder(&log, "ok"));

    transport.push("quote", json!(1));
    transport.push("quote", json!(2));

    assert!(wait_until(Duration::from_secs(1), || log.lock().len() == 2).await);
    assert_eq!(*log.lock(), vec!["ok:1", "ok:2"]);
    assert!(wait_until(Duration::from_secs(1), || client.metrics().listener_failures == 4).await);
}

#[derive(Debug, Deserialize, PartialEq)]
struct Balance {
    balance: f64,
}

#[tokio::test]
async fn test_typed_registrar_decodes_payload() {
    let (client, transport) = connected().await;
    let seen = Arc::new(Mutex::new(Vec::new()));

    let sink = Arc::clone(&seen);
    client
        .registrar("successupdateBalance", decode_payload::<Balance>)
        .register(sync_listener(move |balance: Balance| -> ListenerResult {
            sink.lock().push(balance);
            Ok(())
        }));

    transport.push("successupdateBalance", json!({"balance": 50000.0, "uid": 1}));
    transport.push("successupdateBalance", json!({"unexpected": true}));
    transport.push("successupdateBalance", json!({"balance": 49990.5}));

    assert!(wait_until(Duration::from_secs(1), || seen.lock().len() == 2).await);
    assert_eq!(
        *seen.lock(),
        vec![Balance { balance: 50000.0 }, Balance { balance: 49990.5 }]
    );
    assert!(wait_until(Duration::from_secs(1), || client.metrics().listener_failures == 1).await);
}

#[tokio::test]
async fn test_immediate_and_deferred_forms_share_a_wire_name() {
    let (client, transport) = connected().await;
    let log: Log = Arc::default();

    client.on("updateStream", recorder(&log, "raw"));
    let registrar = client.listener("updateStream");
    assert_eq!(registrar.event(), "updateStream");
    assert_eq!(client.listener_count("updateStream"), 1);
    registrar.register(recorder(&log, "deferred"));
    assert_eq!(client.listener_count("updateStream"), 2);

    transport.push("updateStream", json!([["EURUSD", 1.0, 1.1]]));

    assert!(wait_until(Duration::from_secs(1), || log.lock().len() == 2).await);
    assert_eq!(
        *log.lock(),
        vec![
            r#"raw:[["EURUSD",1.0,1.1]]"#,
            r#"deferred:[["EURUSD",1.0,1.1]]"#
        ]
    );
}

#[tokio::test]
async fn test_catch_all_sees_unlistened_events() {
    let (client, transport) = connected().await;
    let seen = Arc::new(Mutex::new(Vec::new()));

    let sink = Arc::clone(&seen);
    client.on_any(sync_listener(move |(event, payload): (String, Value)| -> ListenerResult {
        sink.lock().push((event, payload));
        Ok(())
    }));
    client.on("known", |_: Value| async { anyhow::Ok(()) });

    transport.push("known", json!(1));
    transport.push("unknown", json!({"x": 2}));

    assert!(wait_until(Duration::from_secs(1), || seen.lock().len() == 2).await);
    assert_eq!(
        *seen.lock(),
        vec![
            ("known".to_string(), json!(1)),
            ("unknown".to_string(), json!({"x": 2}))
        ]
    );
    assert_eq!(client.metrics().frames_received, 2);
}

#[tokio::test]
async fn test_frames_without_listeners_are_dropped() {
    let (client, transport) = connected().await;

    assert!(transport.push("nobody", json!(null)));
    assert!(wait_until(Duration::from_secs(1), || client.metrics().frames_received == 1).await);
    assert_eq!(client.metrics().listener_failures, 0);
}
