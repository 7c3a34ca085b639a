//! The bus adapter against a scripted Redis.

mod common;

use common::FakeRedis;
use serde_json::json;
use slirc_bridge::Shutdown;
use slirc_bridge::bridge::BusEnvelope;
use slirc_bridge::bus::{BusPublisher, spawn_bus};
use slirc_bridge::config::BusConfig;

fn bus_config(port: u16) -> BusConfig {
    BusConfig {
        server: "127.0.0.1".into(),
        port,
        channel: "craniac".into(),
        my_channel: "irc".into(),
    }
}

#[tokio::test]
async fn test_subscribe_publish_and_receive() {
    let mut redis = FakeRedis::start().await.unwrap();
    let shutdown = Shutdown::new();
    let mut link = spawn_bus(&bus_config(redis.port()), shutdown.clone());

    redis.subscribed("irc").await.unwrap();

    link.client.publish(BusEnvelope {
        from: "irc".into(),
        message: "hello".into(),
        ..Default::default()
    });
    let (channel, out) = redis.next_published().await.unwrap();
    assert_eq!(channel, "craniac");
    assert_eq!(out["from"], "irc");
    assert_eq!(out["message"], "hello");

    assert_eq!(redis.publish("irc", &json!({"message": "back"})), 1);
    assert_eq!(
        link.inbound.recv().await.unwrap(),
        r#"{"message":"back"}"#
    );

    // Other channels are not ours.
    assert_eq!(redis.publish("telegram", &json!({"message": "nope"})), 0);

    shutdown.request();
    link.task.await.unwrap();
}
