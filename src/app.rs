//! Wiring: build every component from a validated [`Config`] and run them
//! until shutdown.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::bridge::Bridge;
use crate::bus::{BusLink, spawn_bus};
use crate::config::Config;
use crate::error::BridgeError;
use crate::irc::{ClientHandle, Connector};
use crate::lifecycle::{Cooldowns, Lifecycle};
use crate::outbound::{RatePolicy, spawn_lanes};
use crate::settings::{RedbSettings, SettingsStore};
use crate::shutdown::Shutdown;
use crate::state::{ConnectionState, PrivilegeCache};

/// Open the persistent settings store under `data_dir`.
pub fn open_settings(config: &Config) -> Result<Arc<dyn SettingsStore>, BridgeError> {
    let store = RedbSettings::open(&config.data_dir)?;
    Ok(Arc::new(store))
}

/// Every running task of one bridge instance.
pub struct App {
    shutdown: Shutdown,
    tasks: Vec<(&'static str, JoinHandle<()>)>,
}

impl App {
    /// Start the lanes, the bus link, the bus pump and the lifecycle.
    pub fn start(
        config: Config,
        connector: Arc<dyn Connector>,
        settings: Arc<dyn SettingsStore>,
        cooldowns: Cooldowns,
    ) -> Self {
        let config = Arc::new(config);
        let shutdown = Shutdown::new();
        let session = Arc::new(ConnectionState::new(&config.irc.nick));
        let privileges = Arc::new(PrivilegeCache::new(config.irc.channels.iter()));
        let handle = ClientHandle::new();

        let lanes = spawn_lanes(
            Arc::new(handle.clone()),
            RatePolicy::from(&config.irc.rate_limit),
            Arc::clone(&privileges),
            Arc::clone(&session),
            shutdown.clone(),
        );
        let BusLink {
            client: bus_client,
            inbound: mut bus_inbound,
            task: bus_task,
        } = spawn_bus(&config.bus, shutdown.clone());

        let bridge = Arc::new(Bridge::new(
            Arc::clone(&config),
            Arc::clone(&privileges),
            Arc::clone(&session),
            lanes.outbound.clone(),
            Arc::new(bus_client),
            settings,
            shutdown.clone(),
        ));

        let pump = {
            let bridge = Arc::clone(&bridge);
            let shutdown = shutdown.clone();
            tokio::spawn(async move {
                loop {
                    let line = tokio::select! {
                        line = bus_inbound.recv() => line,
                        _ = shutdown.wait() => None,
                    };
                    let Some(line) = line else { break };
                    bridge.on_bus_line(&line);
                }
                debug!("bus pump stopped");
            })
        };

        let lifecycle = Lifecycle::new(
            Arc::clone(&config),
            connector,
            handle,
            session,
            privileges,
            lanes.outbound,
            bridge,
            shutdown.clone(),
        )
        .with_cooldowns(cooldowns);
        let irc = tokio::spawn(async move { lifecycle.run().await });

        info!(
            nick = %config.irc.nick,
            channels = config.irc.channels.len(),
            bus_server = %config.bus.server,
            bus_port = config.bus.port,
            "Bridge started"
        );

        Self {
            shutdown,
            tasks: vec![
                ("irc", irc),
                ("bus", bus_task),
                ("bus pump", pump),
                ("restricted lane", lanes.restricted),
                ("unrestricted lane", lanes.unrestricted),
            ],
        }
    }

    pub fn shutdown(&self) -> Shutdown {
        self.shutdown.clone()
    }

    /// Request shutdown and wait for every task to finish.
    pub async fn stop(self) {
        self.shutdown.request();
        for (name, task) in self.tasks {
            if let Err(e) = task.await {
                warn!(task = name, error = %e, "task failed");
            }
        }
        info!("Bridge stopped");
    }
}
