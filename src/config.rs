use std::env;
use std::net::SocketAddr;
use std::str::FromStr;

use crate::error::Error;

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    /// Maximum number of terminal rides kept in the read-through cache.
    /// Zero disables caching.
    pub ride_cache_capacity: usize,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

impl Config {
    /// Loads `.env` if present, then reads the process environment.
    pub fn from_env() -> Result<Self, Error> {
        dotenv::dotenv().ok();

        Self::from_lookup(|key| env::var(key))
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, Error>
    where
        F: Fn(&str) -> Result<String, env::VarError>,
    {
        let optional = |key: &str| match lookup(key) {
            Ok(value) => Ok(Some(value)),
            Err(env::VarError::NotPresent) => Ok(None),
            Err(err) => Err(Error::from(err)),
        };

        Ok(Self {
            server: ServerConfig {
                host: optional("SERVER_HOST")?.unwrap_or_else(|| "127.0.0.1".into()),
                port: parse_or("SERVER_PORT", optional("SERVER_PORT")?, 3000)?,
            },
            database: DatabaseConfig {
                url: lookup("DATABASE_URL")?,
                max_connections: parse_or(
                    "DATABASE_MAX_CONNECTIONS",
                    optional("DATABASE_MAX_CONNECTIONS")?,
                    5,
                )?,
            },
            ride_cache_capacity: parse_or(
                "RIDE_CACHE_CAPACITY",
                optional("RIDE_CACHE_CAPACITY")?,
                1024,
            )?,
        })
    }
}

impl ServerConfig {
    pub fn addr(&self) -> Result<SocketAddr, Error> {
        format!("{}:{}", self.host, self.port).parse().map_err(|_| {
            Error::Config(format!("invalid server address {}:{}", self.host, self.port))
        })
    }
}

fn parse_or<T: FromStr>(key: &str, value: Option<String>, default: T) -> Result<T, Error> {
    match value {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| Error::Config(format!("{} has an invalid value: {}", key, raw))),
        None => Ok(default),
    }
}
