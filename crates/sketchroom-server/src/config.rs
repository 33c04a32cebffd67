//! Server configuration from the environment.

use std::net::SocketAddr;
use std::path::PathBuf;
use thiserror::Error;

/// Default listen address.
pub const DEFAULT_ADDR: &str = "0.0.0.0:8080";
/// Default per-connection outbound queue capacity.
pub const DEFAULT_PEER_QUEUE: usize = 256;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("JWT_SECRET is not set")]
    MissingSecret,
    #[error("invalid listen address {0:?}")]
    InvalidAddr(String),
    #[error("invalid value {value:?} for {key}")]
    InvalidValue { key: &'static str, value: String },
    #[error("no platform data directory is available")]
    NoDataDir,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub addr: SocketAddr,
    pub jwt_secret: String,
    /// Directory of the file-backed store; in-memory when `None`.
    pub data_dir: Option<PathBuf>,
    /// Create room records on the first persisted write to an unknown room.
    pub auto_create_rooms: bool,
    pub peer_queue: usize,
}

impl ServerConfig {
    /// In-memory configuration with the given secret, bound to an ephemeral
    /// local port.
    pub fn new(jwt_secret: impl Into<String>) -> Self {
        Self {
            addr: SocketAddr::from(([127, 0, 0, 1], 0)),
            jwt_secret: jwt_secret.into(),
            data_dir: None,
            auto_create_rooms: true,
            peer_queue: DEFAULT_PEER_QUEUE,
        }
    }

    /// Load `.env` if present, then read the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                tracing::warn!(error = %e, "Failed to read .env file");
            }
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let jwt_secret = lookup("JWT_SECRET")
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::MissingSecret)?;

        let addr_text = lookup("SKETCHROOM_ADDR").unwrap_or_else(|| DEFAULT_ADDR.to_string());
        let mut addr: SocketAddr = addr_text
            .parse()
            .map_err(|_| ConfigError::InvalidAddr(addr_text.clone()))?;
        if let Some(port) = lookup("PORT") {
            addr.set_port(parse_value("PORT", &port)?);
        }

        let data_dir = match lookup("SKETCHROOM_DATA_DIR").as_deref() {
            None | Some("") => None,
            Some("default") => Some(
                dirs::data_local_dir()
                    .or_else(dirs::home_dir)
                    .ok_or(ConfigError::NoDataDir)?
                    .join("sketchroom")
                    .join("rooms"),
            ),
            Some(path) => Some(PathBuf::from(path)),
        };

        let auto_create_rooms = match lookup("SKETCHROOM_AUTO_CREATE_ROOMS") {
            Some(value) => parse_bool("SKETCHROOM_AUTO_CREATE_ROOMS", &value)?,
            None => true,
        };

        let peer_queue = match lookup("SKETCHROOM_PEER_QUEUE") {
            Some(value) => parse_value("SKETCHROOM_PEER_QUEUE", &value)?,
            None => DEFAULT_PEER_QUEUE,
        };
        if peer_queue == 0 {
            return Err(ConfigError::InvalidValue {
                key: "SKETCHROOM_PEER_QUEUE",
                value: "0".into(),
            });
        }

        Ok(Self {
            addr,
            jwt_secret,
            data_dir,
            auto_create_rooms,
            peer_queue,
        })
    }
}

fn parse_value<T: std::str::FromStr>(key: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key,
        value: value.to_string(),
    })
}

fn parse_bool(key: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key,
            value: value.to_string(),
        }),
    }
}
