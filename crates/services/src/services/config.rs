use std::{path::PathBuf, time::Duration};

use tracing::warn;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 3001;
pub const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 300;
pub const DEFAULT_MAX_PHOTO_BYTES: usize = 5 * 1024 * 1024;

/// Runtime settings, read once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub data_dir: PathBuf,
    pub database_url: String,
    pub sweep_interval: Duration,
    pub max_photo_bytes: usize,
    /// `None` allows any origin.
    pub cors_origin: Option<String>,
}

impl Config {
    /// Loads `.env` if present, then reads the process environment.
    pub fn from_env() -> Self {
        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                warn!("Failed to read .env file: {}", e);
            }
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let data_dir = get("HOUSEHOLD_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(utils::assets::data_dir);
        let database_url = get("DATABASE_URL").unwrap_or_else(|| {
            format!("sqlite://{}", data_dir.join("db.sqlite").to_string_lossy())
        });

        let port_var = if get("HOUSEHOLD_PORT").is_some() {
            "HOUSEHOLD_PORT"
        } else {
            "PORT"
        };

        Self {
            host: get("HOUSEHOLD_HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: parse_or(port_var, get(port_var), DEFAULT_PORT),
            database_url,
            sweep_interval: Duration::from_secs(
                parse_or(
                    "HOUSEHOLD_SWEEP_INTERVAL_SECS",
                    get("HOUSEHOLD_SWEEP_INTERVAL_SECS"),
                    DEFAULT_SWEEP_INTERVAL_SECS,
                )
                .max(1),
            ),
            max_photo_bytes: parse_or(
                "HOUSEHOLD_MAX_PHOTO_BYTES",
                get("HOUSEHOLD_MAX_PHOTO_BYTES"),
                DEFAULT_MAX_PHOTO_BYTES,
            ),
            cors_origin: get("HOUSEHOLD_CORS_ORIGIN"),
            data_dir,
        }
    }

    pub fn photos_dir(&self) -> PathBuf {
        self.data_dir.join("photos")
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_or<T>(key: &str, value: Option<String>, default: T) -> T
where
    T: std::str::FromStr + Copy + std::fmt::Display,
{
    match value {
        None => default,
        Some(raw) => match raw.trim().parse() {
            Ok(parsed) => parsed,
            Err(_) => {
                warn!(key, value = %raw, "Invalid value, using default {}", default);
                default
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config(vars: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let cfg = config(&[("HOUSEHOLD_DATA_DIR", "/tmp/hh")]);
        assert_eq!(cfg.host, DEFAULT_HOST);
        assert_eq!(cfg.port, DEFAULT_PORT);
        assert_eq!(cfg.database_url, "sqlite:///tmp/hh/db.sqlite");
        assert_eq!(cfg.photos_dir(), PathBuf::from("/tmp/hh/photos"));
        assert_eq!(cfg.sweep_interval, Duration::from_secs(300));
        assert_eq!(cfg.max_photo_bytes, DEFAULT_MAX_PHOTO_BYTES);
        assert!(cfg.cors_origin.is_none());
    }

    #[test]
    fn household_port_wins_over_port() {
        let cfg = config(&[("HOUSEHOLD_PORT", "8080"), ("PORT", "9090")]);
        assert_eq!(cfg.port, 8080);
        let cfg = config(&[("PORT", "9090")]);
        assert_eq!(cfg.port, 9090);
        assert_eq!(cfg.bind_address(), "127.0.0.1:9090");
    }

    #[test]
    fn invalid_numbers_fall_back() {
        let cfg = config(&[
            ("HOUSEHOLD_PORT", "eighty"),
            ("HOUSEHOLD_SWEEP_INTERVAL_SECS", "-5"),
            ("HOUSEHOLD_MAX_PHOTO_BYTES", "1024"),
            ("DATABASE_URL", "sqlite::memory:"),
        ]);
        assert_eq!(cfg.port, DEFAULT_PORT);
        assert_eq!(cfg.sweep_interval, Duration::from_secs(300));
        assert_eq!(cfg.max_photo_bytes, 1024);
        assert_eq!(cfg.database_url, "sqlite::memory:");
    }
}
