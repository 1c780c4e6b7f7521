//! Central module for application-wide configuration settings.
//!
//! This module handles loading and validating configuration parameters such
//! as the listening address, the session-signing secret, the CORS allow-list,
//! the storage backend and the federated-login client id. Everything comes
//! from environment variables; an insecure session secret aborts startup.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

pub const MIN_SESSION_SECRET_LEN: usize = 32;

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_SESSION_TTL_SECS: u64 = 24 * 60 * 60;
const DEFAULT_ALLOWED_ORIGINS: &str = "http://localhost:3000";
const DEFAULT_DATA_DIR: &str = "data";
const DEFAULT_DATABASE_URL: &str = "sqlite://data/reparo.db";
const DEFAULT_BCRYPT_COST: u32 = 10;
const DEFAULT_ADMIN_PASSWORD: &str = "admin123";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("SESSION_SECRET is not set")]
    MissingSessionSecret,

    #[error("SESSION_SECRET must be at least {min} bytes (got {len})")]
    SessionSecretTooShort { len: usize, min: usize },

    #[error("invalid value for {name}: {value}")]
    InvalidValue { name: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageBackend {
    File { dir: PathBuf },
    Sqlite { url: String },
}

/// Account created on first boot when the identity store is empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootstrapAdmin {
    pub username: String,
    pub email: String,
    pub name: String,
    pub password: String,
    /// `true` when the password is the built-in development default.
    pub default_password: bool,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    pub session_secret: String,
    pub session_ttl: Duration,
    pub allowed_origins: Vec<String>,
    pub production: bool,
    pub google_client_id: Option<String>,
    pub storage: StorageBackend,
    pub static_dir: Option<PathBuf>,
    pub bcrypt_cost: u32,
    pub admin: BootstrapAdmin,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let session_secret = var("SESSION_SECRET").ok_or(ConfigError::MissingSessionSecret)?;
        if session_secret.len() < MIN_SESSION_SECRET_LEN {
            return Err(ConfigError::SessionSecretTooShort {
                len: session_secret.len(),
                min: MIN_SESSION_SECRET_LEN,
            });
        }

        let host = match var("HOST") {
            Some(v) => parse("HOST", v)?,
            None => IpAddr::V4(Ipv4Addr::UNSPECIFIED),
        };
        let port = match var("PORT") {
            Some(v) => parse("PORT", v)?,
            None => DEFAULT_PORT,
        };
        let session_ttl = match var("SESSION_TTL_SECS") {
            Some(v) => Duration::from_secs(parse("SESSION_TTL_SECS", v)?),
            None => Duration::from_secs(DEFAULT_SESSION_TTL_SECS),
        };
        let production = match var("PRODUCTION") {
            Some(v) => parse_flag("PRODUCTION", &v)?,
            None => false,
        };
        let allowed_origins = var("ALLOWED_ORIGINS")
            .unwrap_or_else(|| DEFAULT_ALLOWED_ORIGINS.to_string())
            .split(',')
            .map(|origin| origin.trim().trim_end_matches('/').to_string())
            .filter(|origin| !origin.is_empty())
            .collect();

        let storage = match var("STORAGE_BACKEND").as_deref() {
            None | Some("file") => StorageBackend::File {
                dir: PathBuf::from(var("DATA_DIR").unwrap_or_else(|| DEFAULT_DATA_DIR.into())),
            },
            Some("sqlite") => StorageBackend::Sqlite {
                url: var("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.into()),
            },
            Some(other) => {
                return Err(ConfigError::InvalidValue {
                    name: "STORAGE_BACKEND",
                    value: other.to_string(),
                })
            }
        };

        let bcrypt_cost = match var("BCRYPT_COST") {
            Some(v) => {
                let cost: u32 = parse("BCRYPT_COST", v.clone())?;
                if !(4..=31).contains(&cost) {
                    return Err(ConfigError::InvalidValue {
                        name: "BCRYPT_COST",
                        value: v,
                    });
                }
                cost
            }
            None => DEFAULT_BCRYPT_COST,
        };

        let admin_password = var("ADMIN_PASSWORD");
        let admin = BootstrapAdmin {
            username: var("ADMIN_USERNAME").unwrap_or_else(|| "admin".into()),
            email: var("ADMIN_EMAIL").unwrap_or_else(|| "admin@local".into()),
            name: var("ADMIN_NAME").unwrap_or_else(|| "Administrador".into()),
            default_password: admin_password.is_none(),
            password: admin_password.unwrap_or_else(|| DEFAULT_ADMIN_PASSWORD.into()),
        };

        Ok(Self {
            host,
            port,
            session_secret,
            session_ttl,
            allowed_origins,
            production,
            google_client_id: var("GOOGLE_CLIENT_ID"),
            storage,
            static_dir: var("STATIC_DIR").map(PathBuf::from),
            bcrypt_cost,
            admin,
        })
    }

    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

fn parse<T: std::str::FromStr>(name: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .parse()
        .map_err(|_| ConfigError::InvalidValue { name, value })
}

fn parse_flag(name: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            name,
            value: value.to_string(),
        }),
    }
}
