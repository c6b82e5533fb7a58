use std::str::FromStr;

use anyhow::{bail, Context};
use serde::Deserialize;

/// Which persistence adapter backs the credential store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Postgres,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "pg" => Ok(Self::Postgres),
            "memory" | "mem" => Ok(Self::Memory),
            other => bail!("unknown STORE_BACKEND {other:?}"),
        }
    }
}

/// Argon2 cost parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct HashConfig {
    pub m_cost: u32, // memory, KiB
    pub t_cost: u32, // iterations
    pub p_cost: u32, // lanes
}

impl Default for HashConfig {
    fn default() -> Self {
        Self {
            m_cost: argon2::Params::DEFAULT_M_COST,
            t_cost: argon2::Params::DEFAULT_T_COST,
            p_cost: argon2::Params::DEFAULT_P_COST,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub store_backend: StoreBackend,
    pub database_url: Option<String>,
    pub host: String,
    pub port: u16,
    pub db_max_connections: u32,
    pub db_reconnect_seconds: u64,
    pub email_case_sensitive: bool,
    pub hash: HashConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let store_backend = match std::env::var("STORE_BACKEND") {
            Ok(v) => v.parse()?,
            Err(_) => StoreBackend::Postgres,
        };
        let database_url = std::env::var("DATABASE_URL").ok();
        if store_backend == StoreBackend::Postgres && database_url.is_none() {
            bail!("DATABASE_URL is required when STORE_BACKEND=postgres");
        }

        let defaults = HashConfig::default();
        Ok(Self {
            store_backend,
            database_url,
            host: std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: env_or("APP_PORT", 1337)?,
            db_max_connections: env_or("DB_MAX_CONNECTIONS", 10)?,
            db_reconnect_seconds: env_or("DB_RECONNECT_SECONDS", 15)?,
            email_case_sensitive: env_or("EMAIL_CASE_SENSITIVE", false)?,
            hash: HashConfig {
                m_cost: env_or("PASSWORD_HASH_M_COST", defaults.m_cost)?,
                t_cost: env_or("PASSWORD_HASH_T_COST", defaults.t_cost)?,
                p_cost: env_or("PASSWORD_HASH_P_COST", defaults.p_cost)?,
            },
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Reads `key` and parses it, falling back to `default` when unset.
/// A value that is set but does not parse is an error rather than a silent default.
fn env_or<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(v) => v
            .trim()
            .parse::<T>()
            .with_context(|| format!("invalid value for {key}")),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VARS: [&str; 10] = [
        "STORE_BACKEND",
        "DATABASE_URL",
        "APP_HOST",
        "APP_PORT",
        "DB_MAX_CONNECTIONS",
        "DB_RECONNECT_SECONDS",
        "EMAIL_CASE_SENSITIVE",
        "PASSWORD_HASH_M_COST",
        "PASSWORD_HASH_T_COST",
        "PASSWORD_HASH_P_COST",
    ];

    fn with_env<F: FnOnce()>(set: &[(&str, &str)], f: F) {
        let mut vars: Vec<(&str, Option<&str>)> = VARS.iter().map(|k| (*k, None)).collect();
        for &(k, v) in set {
            if let Some(slot) = vars.iter_mut().find(|(name, _)| *name == k) {
                slot.1 = Some(v);
            }
        }
        temp_env::with_vars(vars, f);
    }

    #[test]
    fn defaults_for_postgres_backend() {
        with_env(&[("DATABASE_URL", "postgres://localhost/mangoapp")], || {
            let cfg = AppConfig::from_env().expect("config loads");
            assert_eq!(cfg.store_backend, StoreBackend::Postgres);
            assert_eq!(cfg.bind_addr(), "0.0.0.0:1337");
            assert_eq!(cfg.db_max_connections, 10);
            assert_eq!(cfg.db_reconnect_seconds, 15);
            assert!(!cfg.email_case_sensitive);
            assert_eq!(cfg.hash, HashConfig::default());
        });
    }

    #[test]
    fn postgres_backend_requires_database_url() {
        with_env(&[], || {
            let err = AppConfig::from_env().unwrap_err();
            assert!(err.to_string().contains("DATABASE_URL"));
        });
    }

    #[test]
    fn memory_backend_needs_no_database() {
        with_env(
            &[
                ("STORE_BACKEND", "memory"),
                ("APP_PORT", "8080"),
                ("EMAIL_CASE_SENSITIVE", "true"),
                ("PASSWORD_HASH_T_COST", "3"),
            ],
            || {
                let cfg = AppConfig::from_env().expect("config loads");
                assert_eq!(cfg.store_backend, StoreBackend::Memory);
                assert!(cfg.database_url.is_none());
                assert_eq!(cfg.port, 8080);
                assert!(cfg.email_case_sensitive);
                assert_eq!(cfg.hash.t_cost, 3);
            },
        );
    }

    #[test]
    fn rejects_unparseable_numbers() {
        with_env(&[("STORE_BACKEND", "memory"), ("APP_PORT", "http")], || {
            let err = AppConfig::from_env().unwrap_err();
            assert!(err.to_string().contains("APP_PORT"));
        });
    }

    #[test]
    fn rejects_unknown_backend() {
        with_env(&[("STORE_BACKEND", "mongo")], || {
            assert!(AppConfig::from_env().is_err());
        });
    }
}
