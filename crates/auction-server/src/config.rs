//! Configuration for the auction TCP server.
//!
//! Defaults, optionally overlaid by a TOML file named in `AUCTION_CONFIG`,
//! then by environment variables:
//!
//! - `AUCTION_BIND_ADDR`            (default: "0.0.0.0")
//! - `AUCTION_PORT`                 (default: "9000")
//! - `AUCTION_MAX_CLIENTS`          (default: "1024")
//! - `AUCTION_IDLE_TIMEOUT_SECS`    (default: unset, no timeout)
//! - `AUCTION_SESSION_TTL_SECS`     (default: unset, sessions never expire)
//! - `AUCTION_DATA_PATH`            (default: unset, in-memory only)
//! - `AUCTION_REQUIRE_RUNNING_ROOM` (default: "false")
//!
//! The TOML file uses the same keys in snake_case without the prefix,
//! e.g. `port = 9100` or `idle_timeout_secs = 30`.

use std::env;
use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::Deserialize;

/// Server configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// IP address / interface to bind to (e.g. "0.0.0.0" or "127.0.0.1").
    pub bind_addr: String,

    /// TCP port to listen on.
    pub port: u16,

    /// Maximum number of simultaneously connected clients.
    pub max_clients: usize,

    /// Close a connection that sends no complete frame for this long.
    pub idle_timeout: Option<Duration>,

    /// Expire sessions unused for this long.
    pub session_ttl: Option<Duration>,

    /// JSON snapshot file for the store.
    pub data_path: Option<PathBuf>,

    /// Reject bids on rooms that are not running.
    pub require_running_room: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            bind_addr: "0.0.0.0".to_string(),
            port: 9000,
            max_clients: 1024,
            idle_timeout: None,
            session_ttl: None,
            data_path: None,
            require_running_room: false,
        }
    }
}

/// Shape of the optional TOML file; every key may be omitted.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ConfigFile {
    bind_addr: Option<String>,
    port: Option<u16>,
    max_clients: Option<usize>,
    idle_timeout_secs: Option<u64>,
    session_ttl_secs: Option<u64>,
    data_path: Option<PathBuf>,
    require_running_room: Option<bool>,
}

impl Config {
    /// Construct a `Config` from the optional file and environment
    /// variables, falling back to defaults.
    pub fn from_env() -> Result<Self> {
        let mut config = match env::var("AUCTION_CONFIG") {
            Ok(path) => Config::from_toml_file(&path)?,
            Err(_) => Config::default(),
        };
        config.apply_overrides(|key| env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        Config::from_toml_str(&text).with_context(|| format!("parsing config file {}", path.display()))
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        let file: ConfigFile = toml::from_str(text)?;
        let mut config = Config::default();
        if let Some(v) = file.bind_addr {
            config.bind_addr = v;
        }
        if let Some(v) = file.port {
            config.port = v;
        }
        if let Some(v) = file.max_clients {
            config.max_clients = v;
        }
        if let Some(v) = file.idle_timeout_secs {
            config.idle_timeout = seconds(v);
        }
        if let Some(v) = file.session_ttl_secs {
            config.session_ttl = seconds(v);
        }
        if let Some(v) = file.data_path {
            config.data_path = Some(v);
        }
        if let Some(v) = file.require_running_room {
            config.require_running_room = v;
        }
        Ok(config)
    }

    /// Apply `AUCTION_*` overrides read through `lookup`.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("AUCTION_BIND_ADDR") {
            self.bind_addr = v;
        }
        if let Some(v) = parse_var(&lookup, "AUCTION_PORT")? {
            self.port = v;
        }
        if let Some(v) = parse_var(&lookup, "AUCTION_MAX_CLIENTS")? {
            self.max_clients = v;
        }
        if let Some(v) = parse_var::<u64, _>(&lookup, "AUCTION_IDLE_TIMEOUT_SECS")? {
            self.idle_timeout = seconds(v);
        }
        if let Some(v) = parse_var::<u64, _>(&lookup, "AUCTION_SESSION_TTL_SECS")? {
            self.session_ttl = seconds(v);
        }
        if let Some(v) = lookup("AUCTION_DATA_PATH").filter(|v| !v.is_empty()) {
            self.data_path = Some(PathBuf::from(v));
        }
        if let Some(v) = lookup("AUCTION_REQUIRE_RUNNING_ROOM") {
            self.require_running_room = parse_bool("AUCTION_REQUIRE_RUNNING_ROOM", &v)?;
        }
        Ok(())
    }

    /// Convenience: `addr:port` socket string.
    pub fn socket_addr_string(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }
}

/// Zero means "disabled".
fn seconds(v: u64) -> Option<Duration> {
    (v > 0).then(|| Duration::from_secs(v))
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(val) => match val.trim().parse::<T>() {
            Ok(v) => Ok(Some(v)),
            Err(e) => bail!("invalid {key}={val:?}: {e}"),
        },
        None => Ok(None),
    }
}

fn parse_bool(key: &str, val: &str) -> Result<bool> {
    match val.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => bail!("invalid {key}={val:?}: expected a boolean"),
    }
}
