//! Reconnecting Redis pub/sub client.

use std::time::Duration;

use futures_util::StreamExt;
use redis::AsyncCommands;
use redis::aio::{MultiplexedConnection, PubSub};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::BusPublisher;
use crate::bridge::BusEnvelope;
use crate::config::BusConfig;
use crate::shutdown::Shutdown;

/// Wait between connection attempts.
pub const RECONNECT_DELAY: Duration = Duration::from_secs(3);

/// Upper bound on connecting and subscribing.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Upper bound on the UNSUBSCRIBE sent while shutting down.
const UNSUBSCRIBE_TIMEOUT: Duration = Duration::from_secs(1);

/// Envelopes buffered while Redis is unreachable.
const OUTBOX: usize = 1024;

const INBOX: usize = 1024;

/// Publishing handle. Cheap to clone.
#[derive(Debug, Clone)]
pub struct BusClient {
    channel: String,
    outbox: mpsc::Sender<String>,
}

impl BusPublisher for BusClient {
    fn publish(&self, envelope: BusEnvelope) {
        let payload = match serde_json::to_string(&envelope) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(error = %e, "Unable to serialize envelope");
                return;
            }
        };
        match self.outbox.try_send(payload) {
            Ok(()) => debug!(channel = %self.channel, "queued envelope for bus"),
            Err(e) => warn!(channel = %self.channel, error = %e, "Unable to queue envelope for bus"),
        }
    }
}

/// Everything [`spawn_bus`] hands back.
pub struct BusLink {
    pub client: BusClient,
    /// Raw inbound payloads, one per envelope.
    pub inbound: mpsc::Receiver<String>,
    pub task: JoinHandle<()>,
}

/// Start the connection task.
pub fn spawn_bus(config: &BusConfig, shutdown: Shutdown) -> BusLink {
    let (outbox_tx, outbox_rx) = mpsc::channel(OUTBOX);
    let (inbox_tx, inbox_rx) = mpsc::channel(INBOX);

    let task = tokio::spawn(run(config.clone(), outbox_rx, inbox_tx, shutdown));

    BusLink {
        client: BusClient {
            channel: config.channel.clone(),
            outbox: outbox_tx,
        },
        inbound: inbox_rx,
        task,
    }
}

/// How one connected session ended.
enum Relay {
    Lost,
    Stopped,
}

async fn run(
    config: BusConfig,
    mut outbox: mpsc::Receiver<String>,
    inbox: mpsc::Sender<String>,
    shutdown: Shutdown,
) {
    let client = match redis::Client::open((config.server.clone(), config.port)) {
        Ok(client) => client,
        Err(e) => {
            error!(server = %config.server, port = config.port, error = %e, "Invalid redis endpoint");
            return;
        }
    };

    while !shutdown.is_requested() {
        let connected = tokio::select! {
            res = tokio::time::timeout(CONNECT_TIMEOUT, connect(&client, &config.my_channel)) => res,
            _ = shutdown.wait() => break,
        };
        match connected {
            Ok(Ok((mut publisher, mut pubsub))) => {
                info!(
                    server = %config.server,
                    port = config.port,
                    channel = %config.my_channel,
                    "Subscribed to redis channel"
                );
                let relay = relay(
                    &config,
                    &mut publisher,
                    &mut pubsub,
                    &mut outbox,
                    &inbox,
                    &shutdown,
                )
                .await;
                if matches!(relay, Relay::Stopped) {
                    unsubscribe(&mut pubsub, &config.my_channel).await;
                    break;
                }
            }
            Ok(Err(e)) => {
                warn!(server = %config.server, port = config.port, error = %e, "Unable to connect to redis");
            }
            Err(_) => {
                warn!(server = %config.server, port = config.port, "Timed out connecting to redis");
            }
        }

        if !shutdown.sleep(RECONNECT_DELAY).await {
            break;
        }
    }
    debug!("bus task stopped");
}

async fn connect(
    client: &redis::Client,
    my_channel: &str,
) -> redis::RedisResult<(MultiplexedConnection, PubSub)> {
    let publisher = client.get_multiplexed_async_connection().await?;
    let mut pubsub = client.get_async_pubsub().await?;
    pubsub.subscribe(my_channel).await?;
    Ok((publisher, pubsub))
}

async fn relay(
    config: &BusConfig,
    publisher: &mut MultiplexedConnection,
    pubsub: &mut PubSub,
    outbox: &mut mpsc::Receiver<String>,
    inbox: &mpsc::Sender<String>,
    shutdown: &Shutdown,
) -> Relay {
    let mut messages = std::pin::pin!(pubsub.on_message());
    loop {
        tokio::select! {
            payload = outbox.recv() => {
                let Some(payload) = payload else { return Relay::Stopped };
                let sent: redis::RedisResult<i64> = publisher.publish(&config.channel, &payload).await;
                match sent {
                    Ok(receivers) => {
                        debug!(channel = %config.channel, receivers, %payload, "Sent msg to redis channel");
                    }
                    Err(e) => {
                        warn!(channel = %config.channel, error = %e, "Unable to send data to redis channel");
                        return Relay::Lost;
                    }
                }
            }
            msg = messages.next() => {
                let Some(msg) = msg else {
                    warn!("Redis closed the subscription");
                    return Relay::Lost;
                };
                match msg.get_payload::<String>() {
                    Ok(payload) => {
                        if payload.trim().is_empty() {
                            continue;
                        }
                        if inbox.send(payload).await.is_err() {
                            return Relay::Stopped;
                        }
                    }
                    Err(e) => warn!(channel = %msg.get_channel_name(), error = %e, "Unreadable redis message"),
                }
            }
            _ = shutdown.wait() => return Relay::Stopped,
        }
    }
}

async fn unsubscribe(pubsub: &mut PubSub, my_channel: &str) {
    match tokio::time::timeout(UNSUBSCRIBE_TIMEOUT, pubsub.unsubscribe(my_channel)).await {
        Ok(Ok(())) => debug!(channel = %my_channel, "Unsubscribed from redis channel"),
        Ok(Err(e)) => warn!(error = %e, "Unable to unsubscribe from redis channel cleanly"),
        Err(_) => warn!("Timed out unsubscribing from redis channel"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_while_unreachable() {
        // Port 9 on localhost is almost never listening; either way the task
        // must end once shutdown is requested.
        let config = BusConfig {
            server: "127.0.0.1".into(),
            port: 9,
            channel: "craniac".into(),
            my_channel: "irc".into(),
        };
        let shutdown = Shutdown::new();
        let link = spawn_bus(&config, shutdown.clone());
        tokio::time::sleep(Duration::from_secs(10)).await;
        shutdown.request();
        link.task.await.unwrap();
    }

    #[tokio::test]
    async fn test_publish_queues_json() {
        let (outbox, mut rx) = mpsc::channel(1);
        let client = BusClient {
            channel: "craniac".into(),
            outbox,
        };
        client.publish(BusEnvelope {
            from: "irc".into(),
            message: "hello".into(),
            ..Default::default()
        });
        let payload: serde_json::Value = serde_json::from_str(&rx.recv().await.unwrap()).unwrap();
        assert_eq!(payload["from"], "irc");
        assert_eq!(payload["message"], "hello");
        assert!(payload.get("channel").is_none());

        // Full outbox: dropped, not blocked.
        client.publish(BusEnvelope::default());
        client.publish(BusEnvelope::default());
        assert!(rx.try_recv().is_ok());
        assert!(rx.try_recv().is_err());
    }
}
