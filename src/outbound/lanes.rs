//! Lane routing and the per-lane consumer tasks.

use std::fmt;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::envelope::{Display, OutboundEnvelope};
use super::policy::{RatePolicy, Throttle};
use crate::irc::IrcActions;
use crate::shutdown::Shutdown;
use crate::state::{ConnectionState, PrivilegeCache};

pub const RESTRICTED_CAPACITY: usize = 10_000;
pub const UNRESTRICTED_CAPACITY: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lane {
    Restricted,
    Unrestricted,
}

impl fmt::Display for Lane {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Lane::Restricted => f.write_str("restricted"),
            Lane::Unrestricted => f.write_str("unrestricted"),
        }
    }
}

/// Producer side of both lanes.
#[derive(Clone)]
pub struct Outbound {
    restricted: mpsc::Sender<OutboundEnvelope>,
    unrestricted: mpsc::Sender<OutboundEnvelope>,
    privileges: Arc<PrivilegeCache>,
    session: Arc<ConnectionState>,
}

impl Outbound {
    /// Pick a lane from what the cache currently says about our own status
    /// on the destination. The data may be stale; that is accepted.
    pub fn lane_for(&self, destination: &str) -> Lane {
        if self
            .privileges
            .is_privileged(destination, &self.session.nick())
        {
            Lane::Unrestricted
        } else {
            Lane::Restricted
        }
    }

    /// Queue an envelope on the appropriate lane.
    ///
    /// Returns the lane used, or `None` if the lane was full or closed and
    /// the envelope was dropped.
    pub fn enqueue(&self, envelope: OutboundEnvelope) -> Option<Lane> {
        let lane = self.lane_for(&envelope.destination);
        let tx = match lane {
            Lane::Restricted => &self.restricted,
            Lane::Unrestricted => &self.unrestricted,
        };
        match tx.try_send(envelope) {
            Ok(()) => Some(lane),
            Err(e) => {
                warn!(%lane, error = %e, "outbound lane rejected message");
                None
            }
        }
    }
}

/// Both lane consumers plus the shared producer handle.
pub struct Lanes {
    pub outbound: Outbound,
    pub restricted: JoinHandle<()>,
    pub unrestricted: JoinHandle<()>,
}

/// Start one consumer per lane.
pub fn spawn_lanes(
    actions: Arc<dyn IrcActions>,
    policy: RatePolicy,
    privileges: Arc<PrivilegeCache>,
    session: Arc<ConnectionState>,
    shutdown: Shutdown,
) -> Lanes {
    let (restricted_tx, restricted_rx) = mpsc::channel(RESTRICTED_CAPACITY);
    let (unrestricted_tx, unrestricted_rx) = mpsc::channel(UNRESTRICTED_CAPACITY);

    info!(?policy, "Starting outbound lanes");

    let restricted = tokio::spawn(run_lane(
        Lane::Restricted,
        restricted_rx,
        Arc::clone(&actions),
        Some(Throttle::new(policy)),
        shutdown.clone(),
    ));
    let unrestricted = tokio::spawn(run_lane(
        Lane::Unrestricted,
        unrestricted_rx,
        actions,
        None,
        shutdown,
    ));

    Lanes {
        outbound: Outbound {
            restricted: restricted_tx,
            unrestricted: unrestricted_tx,
            privileges,
            session,
        },
        restricted,
        unrestricted,
    }
}

async fn run_lane(
    lane: Lane,
    mut rx: mpsc::Receiver<OutboundEnvelope>,
    actions: Arc<dyn IrcActions>,
    mut throttle: Option<Throttle>,
    shutdown: Shutdown,
) {
    loop {
        let envelope = tokio::select! {
            item = rx.recv() => match item {
                Some(envelope) => envelope,
                None => break,
            },
            _ = shutdown.wait() => break,
        };
        if shutdown.is_requested() {
            break;
        }

        if let Some(throttle) = throttle.as_mut() {
            tokio::select! {
                _ = throttle.before_send() => {}
                _ = shutdown.wait() => break,
            }
        }

        deliver(actions.as_ref(), &envelope);

        if let Some(throttle) = throttle.as_mut() {
            tokio::select! {
                _ = throttle.after_send() => {}
                _ = shutdown.wait() => break,
            }
        }
    }
    debug!(%lane, "outbound lane stopped");
}

/// Hand one envelope to the send primitive.
pub fn deliver(actions: &dyn IrcActions, envelope: &OutboundEnvelope) {
    if envelope.text.is_empty() {
        debug!(destination = %envelope.destination, "skipping empty line");
        return;
    }
    match envelope.display {
        Display::Message => actions.privmsg(&envelope.destination, &envelope.text),
        Display::Action => actions.action(&envelope.destination, &envelope.text),
    }
}
