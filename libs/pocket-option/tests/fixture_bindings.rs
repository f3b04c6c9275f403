//! Compiles the `event-bindgen` quotes fixture and drives it over a memory
//! transport: argument defaults, multi-argument arrays and acknowledgements.

mod common;

use common::wait_until;
use eventsockets::{json, sync_listener, ConnectOptions, EventClient, ListenerResult, MemoryTransport, TypedAck};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

mod quotes {
    use eventsockets::EventClient;
    use std::ops::Deref;

    pub mod fixtures {
        #![allow(dead_code)]

        use serde::{Deserialize, Serialize};

        #[derive(Debug, Clone, PartialEq, Deserialize)]
        pub struct Balance {
            pub balance: f64,
        }

        #[derive(Debug, Clone, PartialEq, Deserialize)]
        pub struct Tick {
            pub symbol: String,
            pub price: f64,
        }

        #[derive(Debug, Clone, Serialize)]
        pub struct Order {
            pub asset: String,
            pub amount: i64,
        }

        #[derive(Debug, Clone, PartialEq, Deserialize)]
        pub struct OrderAck {
            pub id: String,
        }

        pub fn ticks(rows: Vec<(String, f64, f64)>) -> Vec<Tick> {
            rows.into_iter()
                .map(|(symbol, _, price)| Tick { symbol, price })
                .collect()
        }
    }

    pub struct QuoteClient(pub EventClient);

    impl Deref for QuoteClient {
        type Target = EventClient;

        fn deref(&self) -> &EventClient {
            &self.0
        }
    }

    include!(concat!(env!("OUT_DIR"), "/quotes_bindings.rs"));
}

use quotes::fixtures::{Order, OrderAck, Tick};
use quotes::QuoteClient;

async fn connected() -> (QuoteClient, MemoryTransport) {
    let transport = MemoryTransport::new();
    let client = EventClient::builder().transport(transport.clone()).build().unwrap();
    client.connect(ConnectOptions::new("ws://memory.test")).await.unwrap();
    (QuoteClient(client), transport)
}

#[tokio::test]
async fn test_defaults_and_arrays() {
    let (client, transport) = connected().await;

    client.emit_change_symbol("EURUSD", None).await.unwrap();
    client.emit_change_symbol("EURUSD", Some(60)).await.unwrap();
    client.emit_history("EURUSD", None).await.unwrap();
    client.emit_history("EURUSD", Some(json!({"period": 5}))).await.unwrap();
    client.emit_subscribe(String::from("GBPUSD")).await.unwrap();
    client.emit_ping().await.unwrap();

    assert_eq!(
        transport.sent_events(),
        vec![
            ("changeSymbol".to_string(), Some(json!(["EURUSD", 30]))),
            ("changeSymbol".to_string(), Some(json!(["EURUSD", 60]))),
            ("loadHistory".to_string(), Some(json!(["EURUSD", {"period": 60, "tags": ["a"]}]))),
            ("loadHistory".to_string(), Some(json!(["EURUSD", {"period": 5}]))),
            ("subscribeSymbol".to_string(), Some(json!("GBPUSD"))),
            ("ps".to_string(), None),
        ]
    );

    client.disconnect().await.unwrap();
}

#[tokio::test]
async fn test_cast_argument_with_typed_ack() {
    let (client, transport) = connected().await;
    transport.reply("openOrder", json!({"id": "o-1"}));

    let acks = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&acks);
    let order = Order {
        asset: "EURUSD".to_string(),
        amount: 3,
    };

    client
        .emit_place(order.clone(), Some(TypedAck::new(move |ack: OrderAck| sink.lock().push(ack))))
        .await
        .unwrap();
    client.emit_place(order, None).await.unwrap();

    assert_eq!(acks.lock().as_slice(), &[OrderAck { id: "o-1".to_string() }]);
    let sent = transport.sent_events();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0].1, Some(json!({"asset": "EURUSD", "amount": 3})));

    client.disconnect().await.unwrap();
}

#[tokio::test]
async fn test_transformed_and_raw_inbound() {
    let (client, transport) = connected().await;

    let ticks = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&ticks);
    client.on_ticks(sync_listener(move |batch: Vec<Tick>| -> ListenerResult {
        sink.lock().extend(batch);
        Ok(())
    }));

    let raw = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&raw);
    client.raw_registrar().register(sync_listener(move |value: eventsockets::Value| -> ListenerResult {
        sink.lock().push(value);
        Ok(())
    }));

    transport.push("updateStream", json!([["EURUSD", 1.0, 1.5], ["GBPUSD", 2.0, 1.25]]));
    transport.push("raw/event", json!({"anything": [1, 2]}));

    assert!(wait_until(Duration::from_secs(2), || ticks.lock().len() == 2 && raw.lock().len() == 1).await);
    assert_eq!(
        ticks.lock()[1],
        Tick {
            symbol: "GBPUSD".to_string(),
            price: 1.25
        }
    );
    assert_eq!(raw.lock()[0], json!({"anything": [1, 2]}));

    client.disconnect().await.unwrap();
}
