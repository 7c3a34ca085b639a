//! Integration test common infrastructure.
//!
//! Provides a scripted IRC server and a scripted Redis server, both listening
//! on 127.0.0.1, an in-memory connector for paused-time tests, and a config
//! builder pointing the bridge at them.

pub mod bus;
pub mod duplex;
pub mod server;

#[allow(unused_imports)]
pub use bus::FakeRedis;
#[allow(unused_imports)]
pub use duplex::DuplexConnector;
#[allow(unused_imports)]
pub use server::FakeIrcServer;

use std::path::Path;
use std::time::Duration;

use slirc_bridge::config::Config;
use slirc_bridge::lifecycle::Cooldowns;

/// How long any single expectation may take.
#[allow(dead_code)]
pub const STEP: Duration = Duration::from_secs(5);

/// A normalized config for a bridge talking to the given endpoints.
#[allow(dead_code)]
pub fn test_config(irc_port: u16, redis_port: u16, data_dir: &Path) -> Config {
    let text = format!(
        r##"
command_prefix = "!"
data_dir = "{}"

[bus]
server = "127.0.0.1"
port = {redis_port}
channel = "craniac"
my_channel = "irc"

[irc]
server = "127.0.0.1"
port = {irc_port}
nick = "bridgebot"
channels = ["#rust"]
"##,
        data_dir.display()
    );
    let mut config: Config = toml::from_str(&text).expect("test config parses");
    config.normalize();
    config
}

/// Short waits so recovery paths finish within a test.
#[allow(dead_code)]
pub fn fast_cooldowns() -> Cooldowns {
    Cooldowns {
        reconnect: Duration::from_millis(100),
        nick_retry: Duration::from_millis(200),
        obstruction: Duration::from_millis(200),
        kick: Duration::from_millis(200),
        quit_drain: Duration::from_millis(200),
    }
}
