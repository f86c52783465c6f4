//! Application configuration loaded from environment variables.

use std::path::PathBuf;

use anyhow::Context;

/// `TAPCARD_DB_PATH` value that selects the in-memory store.
pub const IN_MEMORY_DB: &str = ":memory:";

/// Default upload size limit (5 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server bind address (e.g., "0.0.0.0:8000").
    pub bind_addr: String,

    /// Origin that canonical card URLs are built on, without trailing slash.
    /// e.g., "https://cards.example.com"
    pub base_origin: String,

    /// SQLite database file, or [`IN_MEMORY_DB`].
    pub db_path: String,

    /// Directory uploaded profile images are written to and served from.
    pub upload_dir: PathBuf,

    /// Largest accepted profile image, in bytes.
    pub max_upload_bytes: usize,

    /// User memory of the NFC tags cards are written to, if bounded.
    pub nfc_capacity: Option<usize>,

    /// Port for the Prometheus `/metrics` server. Disabled when unset.
    pub metrics_port: Option<u16>,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Required:
    /// - None (all have defaults for local development)
    ///
    /// Optional:
    /// - `TAPCARD_BIND_ADDR`: Server bind address (default: "0.0.0.0:8000")
    /// - `TAPCARD_BASE_ORIGIN`: Base of canonical URLs (default: "http://localhost:8000")
    /// - `TAPCARD_DB_PATH`: SQLite file or ":memory:" (default: "./data/cards.db")
    /// - `TAPCARD_UPLOAD_DIR`: Upload directory (default: "./data/uploads")
    /// - `TAPCARD_MAX_UPLOAD_BYTES`: Image size limit (default: 5 MiB)
    /// - `TAPCARD_NFC_CAPACITY`: NFC tag capacity in bytes
    /// - `TAPCARD_METRICS_PORT`: Prometheus metrics port
    pub fn from_env() -> anyhow::Result<Self> {
        let bind_addr =
            std::env::var("TAPCARD_BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8000".to_string());

        let base_origin = std::env::var("TAPCARD_BASE_ORIGIN")
            .unwrap_or_else(|_| "http://localhost:8000".to_string())
            .trim_end_matches('/')
            .to_string();

        let db_path =
            std::env::var("TAPCARD_DB_PATH").unwrap_or_else(|_| "./data/cards.db".to_string());

        let upload_dir = std::env::var("TAPCARD_UPLOAD_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./data/uploads"));

        let max_upload_bytes =
            parse_var("TAPCARD_MAX_UPLOAD_BYTES")?.unwrap_or(DEFAULT_MAX_UPLOAD_BYTES);
        let nfc_capacity = parse_var("TAPCARD_NFC_CAPACITY")?;
        let metrics_port = parse_var("TAPCARD_METRICS_PORT")?;

        tracing::info!(
            bind_addr = %bind_addr,
            base_origin = %base_origin,
            db_path = %db_path,
            upload_dir = %upload_dir.display(),
            max_upload_bytes,
            nfc_capacity = ?nfc_capacity,
            metrics_port = ?metrics_port,
            "configuration loaded"
        );

        Ok(Self {
            bind_addr,
            base_origin,
            db_path,
            upload_dir,
            max_upload_bytes,
            nfc_capacity,
            metrics_port,
        })
    }
}

/// Parse an optional numeric variable. Blank counts as unset.
fn parse_var<T>(key: &str) -> anyhow::Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(value) if !value.trim().is_empty() => value
            .trim()
            .parse()
            .map(Some)
            .with_context(|| format!("{key} must be a number, got {value:?}")),
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Mutex to serialize config tests that manipulate env vars.
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    const ENV_KEYS: &[&str] = &[
        "TAPCARD_BIND_ADDR",
        "TAPCARD_BASE_ORIGIN",
        "TAPCARD_DB_PATH",
        "TAPCARD_UPLOAD_DIR",
        "TAPCARD_MAX_UPLOAD_BYTES",
        "TAPCARD_NFC_CAPACITY",
        "TAPCARD_METRICS_PORT",
    ];

    /// Run `f` with only `vars` set among the tapcard variables.
    fn with_env_vars<F: FnOnce()>(vars: &[(&str, &str)], f: F) {
        let _guard = ENV_MUTEX.lock().unwrap();

        let saved: Vec<_> = ENV_KEYS
            .iter()
            .map(|k| (*k, std::env::var(k).ok()))
            .collect();

        // SAFETY: Serialized by mutex; only test code touches these vars.
        unsafe {
            for k in ENV_KEYS {
                std::env::remove_var(k);
            }
            for (k, v) in vars {
                std::env::set_var(k, v);
            }
        }

        f();

        // SAFETY: Restoring original env state.
        unsafe {
            for (k, v) in &saved {
                match v {
                    Some(val) => std::env::set_var(k, val),
                    None => std::env::remove_var(k),
                }
            }
        }
    }

    #[test]
    fn config_defaults() {
        with_env_vars(&[], || {
            let config = Config::from_env().unwrap();
            assert_eq!(config.bind_addr, "0.0.0.0:8000");
            assert_eq!(config.base_origin, "http://localhost:8000");
            assert_eq!(config.db_path, "./data/cards.db");
            assert_eq!(config.upload_dir, PathBuf::from("./data/uploads"));
            assert_eq!(config.max_upload_bytes, DEFAULT_MAX_UPLOAD_BYTES);
            assert_eq!(config.nfc_capacity, None);
            assert_eq!(config.metrics_port, None);
        });
    }

    #[test]
    fn config_custom_values() {
        with_env_vars(
            &[
                ("TAPCARD_BIND_ADDR", "127.0.0.1:9090"),
                ("TAPCARD_BASE_ORIGIN", "https://cards.example.com"),
                ("TAPCARD_DB_PATH", ":memory:"),
                ("TAPCARD_UPLOAD_DIR", "/var/lib/tapcard/uploads"),
                ("TAPCARD_MAX_UPLOAD_BYTES", "1048576"),
                ("TAPCARD_NFC_CAPACITY", "137"),
                ("TAPCARD_METRICS_PORT", "9091"),
            ],
            || {
                let config = Config::from_env().unwrap();
                assert_eq!(config.bind_addr, "127.0.0.1:9090");
                assert_eq!(config.base_origin, "https://cards.example.com");
                assert_eq!(config.db_path, IN_MEMORY_DB);
                assert_eq!(config.upload_dir, PathBuf::from("/var/lib/tapcard/uploads"));
                assert_eq!(config.max_upload_bytes, 1_048_576);
                assert_eq!(config.nfc_capacity, Some(137));
                assert_eq!(config.metrics_port, Some(9091));
            },
        );
    }

    #[test]
    fn config_base_origin_trailing_slash_stripped() {
        with_env_vars(&[("TAPCARD_BASE_ORIGIN", "https://cards.example.com/")], || {
            let config = Config::from_env().unwrap();
            assert_eq!(config.base_origin, "https://cards.example.com");
        });
    }

    #[test]
    fn config_blank_numbers_are_unset() {
        with_env_vars(&[("TAPCARD_NFC_CAPACITY", " ")], || {
            let config = Config::from_env().unwrap();
            assert_eq!(config.nfc_capacity, None);
        });
    }

    #[test]
    fn config_rejects_non_numeric_values() {
        with_env_vars(&[("TAPCARD_MAX_UPLOAD_BYTES", "lots")], || {
            let err = Config::from_env().unwrap_err();
            assert!(err.to_string().contains("TAPCARD_MAX_UPLOAD_BYTES"));
        });
        with_env_vars(&[("TAPCARD_METRICS_PORT", "70000")], || {
            assert!(Config::from_env().is_err());
        });
    }
}
