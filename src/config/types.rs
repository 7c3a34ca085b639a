//! Core configuration types and loading.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

use super::defaults::*;

/// Config files larger than this are refused.
pub const MAX_CONFIG_SIZE: u64 = 64 * 1024;

/// Candidate locations tried when no path is given on the command line.
const CONFIG_CANDIDATES: &[&str] = &["slirc-bridge.toml", "/etc/slirc-bridge.toml"];

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("config file {path} is {size} bytes, limit is {MAX_CONFIG_SIZE}")]
    TooLarge { path: String, size: u64 },
    #[error("no config file found (tried {0})")]
    NotFound(String),
}

/// Bridge configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Prefix that marks a channel message as a bot command.
    #[serde(default)]
    pub command_prefix: String,
    /// Bus envelopes forwarded more often than this are dropped.
    #[serde(default = "default_forwards_max")]
    pub forwards_max: u32,
    /// Directory for persistent per-channel settings.
    #[serde(default)]
    pub data_dir: PathBuf,
    /// Logging.
    #[serde(default)]
    pub log: LogConfig,
    /// Message bus connection.
    #[serde(default)]
    pub bus: BusConfig,
    /// IRC connection.
    pub irc: IrcConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let size = std::fs::metadata(path)?.len();
        if size > MAX_CONFIG_SIZE {
            return Err(ConfigError::TooLarge {
                path: path.display().to_string(),
                size,
            });
        }
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Resolve the config path: an explicit argument wins, otherwise the
    /// first candidate that exists.
    pub fn locate(explicit: Option<String>) -> Result<PathBuf, ConfigError> {
        if let Some(path) = explicit {
            return Ok(PathBuf::from(path));
        }
        CONFIG_CANDIDATES
            .iter()
            .map(PathBuf::from)
            .find(|p| p.is_file())
            .ok_or_else(|| ConfigError::NotFound(CONFIG_CANDIDATES.join(", ")))
    }

    /// Apply defaults and floors that depend on other fields, logging every
    /// substitution.
    pub fn normalize(&mut self) {
        if self.forwards_max == 0 {
            info!("forwards_max is not set, using {}", default_forwards_max());
            self.forwards_max = default_forwards_max();
        }
        if self.log.level.trim().is_empty() {
            self.log.level = default_log_level();
        }
        self.bus.normalize();
        self.irc.normalize();
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per event.
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// Filter directive used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

/// Redis server and the pub/sub channels used as the message bus.
#[derive(Debug, Clone, Deserialize)]
pub struct BusConfig {
    #[serde(default = "default_bus_server")]
    pub server: String,
    #[serde(default = "default_bus_port")]
    pub port: u16,
    /// Channel our envelopes are published to.
    #[serde(default)]
    pub channel: String,
    /// Channel we subscribe to; also used as the `from` and `plugin` tag.
    #[serde(default)]
    pub my_channel: String,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            server: default_bus_server(),
            port: default_bus_port(),
            channel: String::new(),
            my_channel: String::new(),
        }
    }
}

impl BusConfig {
    fn normalize(&mut self) {
        if self.server.trim().is_empty() {
            info!("bus.server is not set, using {}", default_bus_server());
            self.server = default_bus_server();
        }
        if self.port == 0 {
            info!("bus.port is not set, using {}", default_bus_port());
            self.port = default_bus_port();
        }
    }
}

/// IRC server, identity and channel list.
#[derive(Debug, Clone, Deserialize)]
pub struct IrcConfig {
    #[serde(default = "default_irc_server")]
    pub server: String,
    #[serde(default = "default_irc_port")]
    pub port: u16,
    #[serde(default)]
    pub ssl: bool,
    #[serde(default)]
    pub ssl_verify: bool,
    #[serde(default)]
    pub nick: String,
    /// Username; falls back to the nickname.
    #[serde(default)]
    pub user: String,
    /// Credential for SASL or NickServ.
    #[serde(default)]
    pub password: Option<String>,
    /// Authenticate with SASL PLAIN instead of NickServ.
    #[serde(default)]
    pub sasl: bool,
    #[serde(default)]
    pub channels: Vec<String>,
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
}

impl IrcConfig {
    fn normalize(&mut self) {
        if self.server.trim().is_empty() {
            warn!("irc.server is not set, using {}", default_irc_server());
            self.server = default_irc_server();
        }
        if self.port == 0 {
            info!("irc.port is not set, using {}", default_irc_port());
            self.port = default_irc_port();
        }
        if !self.ssl && self.ssl_verify {
            info!("irc.ssl is off, ignoring irc.ssl_verify");
            self.ssl_verify = false;
        }
        if self.user.is_empty() {
            self.user = self.nick.clone();
        }
        if self.password.as_deref().is_some_and(str::is_empty) {
            self.password = None;
        }
        self.rate_limit.normalize();
    }

    /// Password, when one is configured.
    pub fn credential(&self) -> Option<&str> {
        self.password.as_deref()
    }

    /// SASL is used only when both the flag and a credential are present.
    pub fn uses_sasl(&self) -> bool {
        self.sasl && self.credential().is_some()
    }

    /// Whether `channel` appears in the configured list (case-insensitive).
    pub fn is_configured_channel(&self, channel: &str) -> bool {
        self.channels
            .iter()
            .any(|c| slirc_wire::irc_eq(c, channel))
    }
}

/// Outbound flood control.
#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    /// `none`, `simple_delay` or `token_bucket`.
    #[serde(rename = "type", default = "default_rate_type")]
    pub kind: String,
    /// Milliseconds to hold the lane after each send.
    #[serde(default = "default_simple_delay")]
    pub simple_delay: u64,
    #[serde(default)]
    pub token_bucket: TokenBucketConfig,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            kind: default_rate_type(),
            simple_delay: default_simple_delay(),
            token_bucket: TokenBucketConfig::default(),
        }
    }
}

impl RateLimitConfig {
    /// Shortest accepted `simple_delay`.
    pub const MIN_SIMPLE_DELAY_MS: u64 = 50;

    fn normalize(&mut self) {
        if !matches!(self.kind.as_str(), "none" | "simple_delay" | "token_bucket") {
            warn!(kind = %self.kind, "unknown rate limit type, using none");
            self.kind = default_rate_type();
        }
        if self.simple_delay < Self::MIN_SIMPLE_DELAY_MS {
            info!(
                "irc.rate_limit.simple_delay {} is below the floor, using {}",
                self.simple_delay,
                Self::MIN_SIMPLE_DELAY_MS
            );
            self.simple_delay = Self::MIN_SIMPLE_DELAY_MS;
        }
        self.token_bucket.normalize();
    }
}

/// Token bucket parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenBucketConfig {
    /// Sends allowed inside one window before throttling.
    #[serde(default = "default_bucket_size")]
    pub size: u32,
    /// Divisor applied to the wait once the bucket is full.
    #[serde(default = "default_bucket_limit")]
    pub limit: u32,
    /// Window length in seconds.
    #[serde(default = "default_bucket_expiration")]
    pub expiration_time: u64,
}

impl Default for TokenBucketConfig {
    fn default() -> Self {
        Self {
            size: default_bucket_size(),
            limit: default_bucket_limit(),
            expiration_time: default_bucket_expiration(),
        }
    }
}

impl TokenBucketConfig {
    fn normalize(&mut self) {
        if self.size < 3 {
            info!("token_bucket.size {} is too small, using 5", self.size);
            self.size = default_bucket_size();
        }
        if self.limit == 0 {
            self.limit = default_bucket_limit();
        }
        if self.size < self.limit {
            warn!(
                size = self.size,
                limit = self.limit,
                "token_bucket.size is below limit, using 5/1"
            );
            self.size = default_bucket_size();
            self.limit = default_bucket_limit();
        }
        if self.expiration_time < 2 {
            self.expiration_time = default_bucket_expiration();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(toml: &str) -> Config {
        let mut config: Config = toml::from_str(toml).unwrap();
        config.normalize();
        config
    }

    const MINIMAL: &str = r##"
command_prefix = "!"
data_dir = "/tmp/bridge"

[bus]
channel = "craniac"
my_channel = "irc"

[irc]
nick = "bridgebot"
channels = ["#test"]
"##;

    #[test]
    fn test_minimal_defaults() {
        let config = parse(MINIMAL);
        assert_eq!(config.forwards_max, 5);
        assert_eq!(config.log.level, "info");
        assert_eq!(config.log.format, LogFormat::Text);
        assert_eq!(config.bus.server, "localhost");
        assert_eq!(config.bus.port, 6379);
        assert_eq!(config.irc.server, "localhost");
        assert_eq!(config.irc.port, 6667);
        assert_eq!(config.irc.user, "bridgebot");
        assert_eq!(config.irc.rate_limit.kind, "none");
        assert!(!config.irc.uses_sasl());
    }

    #[test]
    fn test_empty_bus_endpoint_falls_back() {
        let toml = MINIMAL.replace("[bus]\n", "[bus]\nserver = \"\"\nport = 0\n");
        let config = parse(&toml);
        assert_eq!(config.bus.server, "localhost");
        assert_eq!(config.bus.port, 6379);
    }

    #[test]
    fn test_ssl_off_forces_no_verify() {
        let toml = format!("{MINIMAL}ssl = false\nssl_verify = true\n");
        let config = parse(&toml);
        assert!(!config.irc.ssl_verify);
    }

    #[test]
    fn test_unknown_rate_type_becomes_none() {
        let toml = format!("{MINIMAL}\n[irc.rate_limit]\ntype = \"leaky\"\nsimple_delay = 10\n");
        let config = parse(&toml);
        assert_eq!(config.irc.rate_limit.kind, "none");
        assert_eq!(config.irc.rate_limit.simple_delay, 50);
    }

    #[test]
    fn test_token_bucket_floors() {
        let toml = format!(
            "{MINIMAL}\n[irc.rate_limit]\ntype = \"token_bucket\"\n[irc.rate_limit.token_bucket]\nsize = 2\nlimit = 0\nexpiration_time = 1\n"
        );
        let tb = parse(&toml).irc.rate_limit.token_bucket;
        assert_eq!((tb.size, tb.limit, tb.expiration_time), (5, 1, 2));
    }

    #[test]
    fn test_token_bucket_size_below_limit_resets() {
        let toml = format!(
            "{MINIMAL}\n[irc.rate_limit]\ntype = \"token_bucket\"\n[irc.rate_limit.token_bucket]\nsize = 4\nlimit = 8\nexpiration_time = 10\n"
        );
        let tb = parse(&toml).irc.rate_limit.token_bucket;
        assert_eq!((tb.size, tb.limit, tb.expiration_time), (5, 1, 10));
    }

    #[test]
    fn test_empty_password_is_none() {
        let toml = format!("{MINIMAL}password = \"\"\nsasl = true\n");
        let config = parse(&toml);
        assert!(config.irc.credential().is_none());
        assert!(!config.irc.uses_sasl());
    }

    #[test]
    fn test_configured_channel_is_case_insensitive() {
        let config = parse(MINIMAL);
        assert!(config.irc.is_configured_channel("#TEST"));
        assert!(!config.irc.is_configured_channel("#other"));
    }

    #[test]
    fn test_load_rejects_oversized_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        let padding = format!("# {}\n", "x".repeat(MAX_CONFIG_SIZE as usize));
        std::io::Write::write_all(&mut file, padding.as_bytes()).unwrap();
        let err = Config::load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::TooLarge { .. }));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(&mut file, MINIMAL.as_bytes()).unwrap();
        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.irc.nick, "bridgebot");
    }

    #[test]
    fn test_locate_prefers_explicit_path() {
        let path = Config::locate(Some("custom.toml".into())).unwrap();
        assert_eq!(path, PathBuf::from("custom.toml"));
    }
}
