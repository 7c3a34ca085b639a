//! Outbound primitives.

use std::sync::Arc;

use parking_lot::Mutex;
use slirc_wire::Message;
use tokio::sync::mpsc;
use tracing::debug;

/// Everything the bridge can ask of the IRC connection.
///
/// Implementors provide [`IrcActions::send`]; the rest are conveniences built
/// on it. Calls never block: they queue for the connection's writer task.
pub trait IrcActions: Send + Sync {
    /// Queue a raw message.
    fn send(&self, msg: Message);

    fn join(&self, channel: &str) {
        self.send(Message::join(channel));
    }

    fn part(&self, channel: &str) {
        self.send(Message::part(channel));
    }

    fn set_nick(&self, nick: &str) {
        self.send(Message::nick(nick));
    }

    fn set_mode(&self, target: &str, token: &str) {
        self.send(Message::mode(target, token));
    }

    fn privmsg(&self, target: &str, text: &str) {
        self.send(Message::privmsg(target, text));
    }

    /// CTCP ACTION (`/me`).
    fn action(&self, target: &str, text: &str) {
        self.send(Message::action(target, text));
    }

    fn whois(&self, nick: &str) {
        self.send(Message::whois(nick));
    }

    fn quit(&self, reason: &str) {
        self.send(Message::quit(reason));
    }
}

/// Handle to whatever connection is currently live.
///
/// Cloned freely; the lifecycle attaches a writer queue on connect and
/// detaches it on disconnect. Sends with nothing attached are dropped.
#[derive(Debug, Clone, Default)]
pub struct ClientHandle {
    writer: Arc<Mutex<Option<mpsc::UnboundedSender<Message>>>>,
}

impl ClientHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attach(&self, writer: mpsc::UnboundedSender<Message>) {
        *self.writer.lock() = Some(writer);
    }

    pub fn detach(&self) {
        self.writer.lock().take();
    }

    pub fn is_attached(&self) -> bool {
        self.writer
            .lock()
            .as_ref()
            .is_some_and(|tx| !tx.is_closed())
    }
}

impl IrcActions for ClientHandle {
    fn send(&self, msg: Message) {
        let guard = self.writer.lock();
        match guard.as_ref() {
            Some(tx) => {
                if let Err(e) = tx.send(msg) {
                    debug!(command = %e.0.command, "writer gone, dropping message");
                }
            }
            None => debug!(command = %msg.command, "no live session, dropping message"),
        }
    }
}
