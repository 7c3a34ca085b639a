//! Opening connections and running their reader/writer tasks.

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use slirc_wire::{Message, MessageSink, MessageStream, ProtocolError, TlsOptions, Transport};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::event::Event;
use crate::config::IrcConfig;

/// Inbound event queue depth per connection.
const EVENT_QUEUE: usize = 1024;

/// A live connection: inbound events plus the writer queue.
///
/// `events` yields `None` once the server side is gone.
#[derive(Debug)]
pub struct Session {
    pub events: mpsc::Receiver<Event>,
    pub writer: mpsc::UnboundedSender<Message>,
}

/// Establishes transport to the configured server.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, config: &IrcConfig) -> Result<Session, ProtocolError>;
}

/// Plain TCP or TLS, per `irc.ssl` / `irc.ssl_verify`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TcpConnector;

#[async_trait]
impl Connector for TcpConnector {
    async fn connect(&self, config: &IrcConfig) -> Result<Session, ProtocolError> {
        info!(
            server = %config.server,
            port = config.port,
            tls = config.ssl,
            "Connecting"
        );
        let tls = TlsOptions {
            enabled: config.ssl,
            verify: config.ssl_verify,
        };
        let transport = Transport::connect(&config.server, config.port, tls).await?;
        let (sink, stream) = transport.into_split();
        Ok(spawn_session(sink, stream))
    }
}

/// Start the reader and writer tasks for an already framed connection.
///
/// The reader answers PING itself so keepalive never waits behind the
/// lifecycle or the rate governor.
pub fn spawn_session(mut sink: MessageSink, mut stream: MessageStream) -> Session {
    let (writer_tx, mut writer_rx) = mpsc::unbounded_channel::<Message>();
    let (events_tx, events_rx) = mpsc::channel::<Event>(EVENT_QUEUE);

    tokio::spawn(async move {
        while let Some(msg) = writer_rx.recv().await {
            debug!(line = %msg, "->");
            match sink.send(msg).await {
                Ok(()) => {}
                Err(ProtocolError::Io(e)) => {
                    warn!(error = %e, "write failed");
                    break;
                }
                Err(e) => warn!(error = %e, "skipping unencodable message"),
            }
        }
        if let Err(e) = sink.close().await {
            debug!(error = %e, "close failed");
        }
    });

    let pong_tx = writer_tx.clone();
    tokio::spawn(async move {
        while let Some(item) = stream.next().await {
            match item {
                Ok(msg) => {
                    debug!(line = %msg, "<-");
                    if msg.command == "PING" {
                        let token = msg.arg(0).unwrap_or_default().to_owned();
                        if pong_tx.send(Message::pong(token)).is_err() {
                            break;
                        }
                    }
                    if events_tx.send(Event::from(msg)).await.is_err() {
                        break;
                    }
                }
                Err(e) => {
                    warn!(error = %e, "read failed");
                    break;
                }
            }
        }
        debug!("reader finished");
    });

    Session {
        events: events_rx,
        writer: writer_tx,
    }
}
