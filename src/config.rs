use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use super::error::{Error, Result};

/// Runtime settings, read from the environment (and `.env`, via dotenv).
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// `LISTEN_IP` and `PORT`.
    pub listen_addr: SocketAddr,

    /// `DATABASE_URL`: path of the SQLite file.
    pub database_url: String,

    /// `DATABASE_POOL_SIZE`: maximum number of open connections.
    pub pool_size: u32,

    /// `DATABASE_POOL_TIMEOUT`: seconds to wait for a free connection.
    pub pool_timeout: Duration,

    /// `SEED_SAMPLE_DATA`: fill a newly created store with sample rows.
    pub seed_sample_data: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            listen_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 1234),
            database_url: "./data/database.db".to_owned(),
            pool_size: 4,
            pool_timeout: Duration::from_secs(5),
            seed_sample_data: false,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Config> {
        Config::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from any key/value source; unset keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Config>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();

        let ip = parse(&lookup, "LISTEN_IP")?.unwrap_or_else(|| defaults.listen_addr.ip());
        let port = parse(&lookup, "PORT")?.unwrap_or_else(|| defaults.listen_addr.port());

        let pool_size = parse::<u32, _>(&lookup, "DATABASE_POOL_SIZE")?.unwrap_or(defaults.pool_size);
        if pool_size == 0 {
            return Err(Error::ConfigError(
                "DATABASE_POOL_SIZE must be at least 1".to_owned(),
            ));
        }

        let pool_timeout = parse(&lookup, "DATABASE_POOL_TIMEOUT")?
            .map(Duration::from_secs)
            .unwrap_or(defaults.pool_timeout);

        let seed_sample_data = match lookup("SEED_SAMPLE_DATA") {
            None => defaults.seed_sample_data,
            Some(value) => parse_flag(&value).ok_or_else(|| {
                Error::ConfigError(format!("Failed to parse SEED_SAMPLE_DATA={:?}", value))
            })?,
        };

        Ok(Config {
            listen_addr: SocketAddr::new(ip, port),
            database_url: lookup("DATABASE_URL")
                .filter(|url| !url.trim().is_empty())
                .unwrap_or(defaults.database_url),
            pool_size,
            pool_timeout,
            seed_sample_data,
        })
    }
}

fn parse<T, F>(lookup: &F, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| Error::ConfigError(format!("Failed to parse {}={:?}", key, value))),
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}
