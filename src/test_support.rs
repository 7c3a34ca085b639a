//! Recording collaborators for unit tests.

use async_trait::async_trait;
use parking_lot::Mutex;
use slirc_wire::{Message, ProtocolError};
use tokio::sync::mpsc;
use tokio::time::Instant;

use crate::bridge::BusEnvelope;
use crate::bus::BusPublisher;
use crate::config::IrcConfig;
use crate::irc::{Connector, Event, IrcActions, Session};

/// Records every message handed to the send primitive, with its send time.
#[derive(Debug, Default)]
pub struct Recorder {
    sent: Mutex<Vec<(Instant, Message)>>,
}

impl Recorder {
    pub fn timed(&self) -> Vec<(Instant, Message)> {
        self.sent.lock().clone()
    }

    /// Serialized lines, without CRLF.
    pub fn lines(&self) -> Vec<String> {
        self.sent.lock().iter().map(|(_, m)| m.to_string()).collect()
    }
}

impl IrcActions for Recorder {
    fn send(&self, msg: Message) {
        self.sent.lock().push((Instant::now(), msg));
    }
}

/// Records published envelopes.
#[derive(Debug, Default)]
pub struct RecordingBus {
    published: Mutex<Vec<BusEnvelope>>,
}

impl RecordingBus {
    pub fn envelopes(&self) -> Vec<BusEnvelope> {
        self.published.lock().clone()
    }
}

impl BusPublisher for RecordingBus {
    fn publish(&self, envelope: BusEnvelope) {
        self.published.lock().push(envelope);
    }
}

/// Hands out prepared sessions in order, then fails every later attempt.
#[derive(Debug, Default)]
pub struct ScriptedConnector {
    sessions: Mutex<std::collections::VecDeque<Session>>,
    attempts: std::sync::atomic::AtomicUsize,
}

impl ScriptedConnector {
    pub fn new(sessions: Vec<Session>) -> Self {
        Self {
            sessions: Mutex::new(sessions.into()),
            attempts: Default::default(),
        }
    }

    pub fn push(&self, session: Session) {
        self.sessions.lock().push_back(session);
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[async_trait]
impl Connector for ScriptedConnector {
    async fn connect(&self, _config: &IrcConfig) -> Result<Session, ProtocolError> {
        self.attempts
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        self.sessions
            .lock()
            .pop_front()
            .ok_or_else(|| ProtocolError::Io(std::io::Error::other("connection refused")))
    }
}

/// Server side of a scripted session.
pub struct FakeServer {
    pub events: mpsc::Sender<Event>,
    pub wire: mpsc::UnboundedReceiver<Message>,
}

impl FakeServer {
    pub fn pair() -> (Session, FakeServer) {
        let (events_tx, events_rx) = mpsc::channel(64);
        let (writer_tx, writer_rx) = mpsc::unbounded_channel();
        (
            Session {
                events: events_rx,
                writer: writer_tx,
            },
            FakeServer {
                events: events_tx,
                wire: writer_rx,
            },
        )
    }

    /// Deliver one raw line as an event.
    pub async fn say(&self, line: &str) {
        let msg: Message = line.parse().unwrap();
        self.events.send(Event::from(msg)).await.unwrap();
    }

    /// Everything the client wrote so far.
    pub fn written(&mut self) -> Vec<Message> {
        let mut out = Vec::new();
        while let Ok(msg) = self.wire.try_recv() {
            out.push(msg);
        }
        out
    }

    pub fn written_lines(&mut self) -> Vec<String> {
        self.written().iter().map(Message::to_string).collect()
    }
}
