use std::{
    env, fmt,
    net::{IpAddr, Ipv4Addr, SocketAddr},
};

use database::{DatabaseConnectionInfo, DEFAULT_DATABASE_URL};
use thiserror::Error;

pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_HOST: IpAddr = IpAddr::V4(Ipv4Addr::UNSPECIFIED);
pub const DEFAULT_SECRET_KEY: &str = "dev-secret-key";

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },
}

/// Server settings, read from the environment.
///
/// | variable        | default          |
/// |-----------------|------------------|
/// | `DATABASE_URL`  | local postgres   |
/// | `HOST`          | `0.0.0.0`        |
/// | `PORT`          | `5000`           |
/// | `SECRET_KEY`    | `dev-secret-key` |
/// | `APP_ENV`       | `production`     |
///
/// `DATABASE_URL` may be replaced by the individual `DATABASE_*` parts, see
/// [`DatabaseConnectionInfo::from_env`].
#[derive(Clone)]
pub struct Config {
    pub database: DatabaseConnectionInfo,
    pub host: IpAddr,
    pub port: u16,
    pub secret_key: String,
    /// `APP_ENV=development`: verbose logs and error details in responses.
    pub development: bool,
}

impl Config {
    /// Loads `.env` if present and reads the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Ok(path) = dotenvy::dotenv() {
            log::debug!("loaded environment from {}", path.display());
        }
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database = DatabaseConnectionInfo::from_lookup(&lookup)
            .unwrap_or_else(|| DatabaseConnectionInfo::from_url(DEFAULT_DATABASE_URL));

        let host = parse_or("HOST", &lookup, DEFAULT_HOST)?;
        let port = parse_or("PORT", &lookup, DEFAULT_PORT)?;
        let secret_key = lookup("SECRET_KEY").unwrap_or_else(|| DEFAULT_SECRET_KEY.to_owned());
        let development = lookup("APP_ENV")
            .map(|value| value.trim().eq_ignore_ascii_case("development"))
            .unwrap_or(false);

        Ok(Self {
            database,
            host,
            port,
            secret_key,
            development,
        })
    }

    pub fn address(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    pub fn default_log_filter(&self) -> &'static str {
        if self.development {
            "debug"
        } else {
            "info"
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("database", &self.database.redacted())
            .field("host", &self.host)
            .field("port", &self.port)
            .field("secret_key", &"***")
            .field("development", &self.development)
            .finish()
    }
}

fn parse_or<T, F>(key: &'static str, lookup: &F, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue { key, value }),
    }
}
