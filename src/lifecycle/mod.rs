//! Connection lifecycle: connect, register, authenticate, join, recover,
//! reconnect.
//!
//! One [`Lifecycle`] owns the reconnect loop. Every inbound [`Event`] is
//! dispatched from a single task; waits that must not stall that task
//! (nick retry, rejoin after ban or kick) run as spawned cooldowns.

mod handlers;
mod membership;

pub use membership::{ModeChange, member_changes, split_channel_status, split_status_prefix};

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::bridge::Bridge;
use crate::config::Config;
use crate::irc::{ClientHandle, Connector, Event, IrcActions};
use crate::outbound::Outbound;
use crate::shutdown::Shutdown;
use crate::state::{ConnectionState, PrivilegeCache, Status};
use slirc_wire::Message;

/// Sent with QUIT on shutdown.
pub const QUIT_REASON: &str = "Quit";

/// Waits used by recovery paths.
#[derive(Debug, Clone, Copy)]
pub struct Cooldowns {
    /// Between connection attempts.
    pub reconnect: Duration,
    /// After 433, before asking for the configured nick again.
    pub nick_retry: Duration,
    /// After 471/473/474, before rejoining.
    pub obstruction: Duration,
    /// After being kicked, before rejoining.
    pub kick: Duration,
    /// How long to wait for the server to close after our QUIT.
    pub quit_drain: Duration,
}

impl Default for Cooldowns {
    fn default() -> Self {
        Self {
            reconnect: Duration::from_secs(3),
            nick_retry: Duration::from_secs(60),
            obstruction: Duration::from_secs(30),
            kick: Duration::from_secs(10),
            quit_drain: Duration::from_secs(2),
        }
    }
}

/// What a handler wants the event loop to do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    /// The server acknowledged our own QUIT.
    EndSession,
}

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionEnd {
    Closed,
    Quit,
    Shutdown,
}

/// Owns the reconnect loop and the inbound event handlers.
pub struct Lifecycle {
    config: Arc<Config>,
    connector: Arc<dyn Connector>,
    handle: ClientHandle,
    session: Arc<ConnectionState>,
    privileges: Arc<PrivilegeCache>,
    outbound: Outbound,
    bridge: Arc<Bridge>,
    shutdown: Shutdown,
    cooldowns: Cooldowns,
}

impl Lifecycle {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: Arc<Config>,
        connector: Arc<dyn Connector>,
        handle: ClientHandle,
        session: Arc<ConnectionState>,
        privileges: Arc<PrivilegeCache>,
        outbound: Outbound,
        bridge: Arc<Bridge>,
        shutdown: Shutdown,
    ) -> Self {
        Self {
            config,
            connector,
            handle,
            session,
            privileges,
            outbound,
            bridge,
            shutdown,
            cooldowns: Cooldowns::default(),
        }
    }

    pub fn with_cooldowns(mut self, cooldowns: Cooldowns) -> Self {
        self.cooldowns = cooldowns;
        self
    }

    /// Connect, run the session, reconnect; until shutdown.
    pub async fn run(&self) {
        while !self.shutdown.is_requested() {
            self.session.reset(&self.config.irc.nick);
            self.privileges.clear();
            self.session.set_status(Status::Connecting);

            let connected = tokio::select! {
                res = self.connector.connect(&self.config.irc) => res,
                _ = self.shutdown.wait() => break,
            };

            let end = match connected {
                Ok(live) => {
                    self.handle.attach(live.writer);
                    self.register();
                    let end = self.drive(live.events).await;
                    self.handle.detach();
                    end
                }
                Err(e) => {
                    error!(
                        server = %self.config.irc.server,
                        port = self.config.irc.port,
                        error = %e,
                        "Unable to connect"
                    );
                    SessionEnd::Closed
                }
            };

            self.session.set_status(Status::Disconnected);
            match end {
                SessionEnd::Shutdown => break,
                SessionEnd::Quit => info!("Session ended by QUIT"),
                SessionEnd::Closed => warn!("Connection lost"),
            }

            if !self.shutdown.sleep(self.cooldowns.reconnect).await {
                break;
            }
        }
        self.session.shut_down();
        info!("Lifecycle stopped");
    }

    /// Present ourselves: optional SASL request, then NICK and USER.
    fn register(&self) {
        let irc = &self.config.irc;
        if irc.uses_sasl() {
            self.session.set_sasl_pending(true);
            self.handle.send(Message::cap("REQ", Some("sasl")));
        }
        self.handle.set_nick(&irc.nick);
        self.handle.send(Message::user(&irc.user, &irc.user));
    }

    async fn drive(&self, mut events: mpsc::Receiver<Event>) -> SessionEnd {
        loop {
            tokio::select! {
                event = events.recv() => {
                    let Some(event) = event else {
                        return SessionEnd::Closed;
                    };
                    if self.dispatch(event).await == Flow::EndSession {
                        return SessionEnd::Quit;
                    }
                }
                _ = self.shutdown.wait() => {
                    self.session.shut_down();
                    info!("Shutting down, sending QUIT");
                    self.handle.quit(QUIT_REASON);
                    let drained = tokio::time::timeout(self.cooldowns.quit_drain, async {
                        while events.recv().await.is_some() {}
                    })
                    .await;
                    if drained.is_err() {
                        debug!("server did not close after QUIT");
                    }
                    return SessionEnd::Shutdown;
                }
            }
        }
    }

    /// Run `action` after `delay` unless shutdown is requested first.
    fn after<F>(&self, delay: Duration, what: &'static str, action: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let shutdown = self.shutdown.clone();
        tokio::spawn(async move {
            if shutdown.sleep(delay).await {
                action();
            } else {
                debug!(what, "cooldown cancelled by shutdown");
            }
        });
    }
}
