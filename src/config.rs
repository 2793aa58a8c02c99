use std::{env, fmt::Display, path::PathBuf, str::FromStr};

use thiserror::Error;
use tracing::{info, warn};

const DEFAULT_PASSWORD_ITERATIONS: u32 = 600_000;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{key} must be set")]
    Missing { key: &'static str },

    #[error("Invalid {key} value {value:?}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    Postgres,
    Memory,
}

impl FromStr for StoreKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "postgres" | "pg" => Ok(Self::Postgres),
            "memory" => Ok(Self::Memory),
            other => Err(format!("unknown store {other}")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub store: StoreKind,
    pub database_url: Option<String>,
    pub pool_size: u32,
    pub media_root: PathBuf,
    pub media_url: String,
    /// PBKDF2 rounds for newly hashed passwords.
    pub password_iterations: u32,
}

impl Config {
    /// Reads the environment, after merging in a `.env` file when one exists.
    pub fn load() -> Result<Self, ConfigError> {
        if let Err(e) = dotenvy::dotenv() {
            info!("No .env file loaded: {e}");
        }

        let store = try_load("STORE", "postgres")?;
        let database_url = var("DATABASE_URL");
        if store == StoreKind::Postgres && database_url.is_none() {
            return Err(ConfigError::Missing { key: "DATABASE_URL" });
        }

        Ok(Self {
            port: try_load("RUST_PORT", "8000")?,
            store,
            database_url,
            pool_size: try_load("DATABASE_POOL_SIZE", "10")?,
            media_root: try_load("MEDIA_ROOT", "media")?,
            media_url: normalize_media_url(try_load("MEDIA_URL", "/media/")?),
            password_iterations: try_load(
                "PASSWORD_ITERATIONS",
                &DEFAULT_PASSWORD_ITERATIONS.to_string(),
            )?,
        })
    }

    /// Configuration for an in-memory deployment rooted at `media_root`.
    pub fn in_memory(media_root: impl Into<PathBuf>) -> Self {
        Self {
            port: 0,
            store: StoreKind::Memory,
            database_url: None,
            pool_size: 1,
            media_root: media_root.into(),
            media_url: "/media/".to_string(),
            password_iterations: DEFAULT_PASSWORD_ITERATIONS,
        }
    }
}

fn normalize_media_url(url: String) -> String {
    let trimmed = url.trim_end_matches('/');
    format!("{trimmed}/")
}

fn var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.is_empty())
}

fn try_load<T: FromStr>(key: &'static str, default: &str) -> Result<T, ConfigError>
where
    T::Err: Display,
{
    let value = var(key).unwrap_or_else(|| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });

    value.parse().map_err(|e: T::Err| {
        warn!("Invalid {key} value: {e}");
        ConfigError::Invalid {
            key,
            reason: e.to_string(),
            value,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn media_url_always_ends_with_a_slash() {
        assert_eq!(normalize_media_url("/media".to_string()), "/media/");
        assert_eq!(normalize_media_url("/media//".to_string()), "/media/");
        assert_eq!(
            normalize_media_url("https://cdn.example.com/m/".to_string()),
            "https://cdn.example.com/m/"
        );
    }

    #[test]
    fn store_kind_parses_case_insensitively() {
        assert_eq!("Memory".parse::<StoreKind>(), Ok(StoreKind::Memory));
        assert_eq!("pg".parse::<StoreKind>(), Ok(StoreKind::Postgres));
        assert!("sqlite".parse::<StoreKind>().is_err());
    }
}
