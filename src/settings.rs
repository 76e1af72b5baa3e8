//! Runtime settings from environment variables (optionally loaded from `.env`).

use crate::error::AppError;

/// `ZATCH_ENV`. Development enables the local-hostname tenant fallback.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RuntimeEnv {
    #[default]
    Production,
    Development,
}

impl std::str::FromStr for RuntimeEnv {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "production" | "prod" => Ok(RuntimeEnv::Production),
            "development" | "dev" => Ok(RuntimeEnv::Development),
            _ => Err(AppError::BadRequest(format!(
                "invalid ZATCH_ENV: {} (expected production or development)",
                s
            ))),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Settings {
    pub database_url: String,
    pub max_connections: u32,
    pub bind: String,
    pub env: RuntimeEnv,
    pub max_body_bytes: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            database_url: "postgres://localhost/zatch".into(),
            max_connections: 5,
            bind: "0.0.0.0:3000".into(),
            env: RuntimeEnv::Production,
            max_body_bytes: 2 * 1024 * 1024,
        }
    }
}

impl Settings {
    /// Load `.env` if present, then read every setting from the environment.
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let defaults = Settings::default();
        let env = match lookup("ZATCH_ENV") {
            Some(v) => v.parse()?,
            None => defaults.env,
        };
        Ok(Settings {
            database_url: lookup("DATABASE_URL").unwrap_or(defaults.database_url),
            max_connections: parse_number("DATABASE_MAX_CONNECTIONS", lookup("DATABASE_MAX_CONNECTIONS"))?
                .unwrap_or(defaults.max_connections),
            bind: lookup("ZATCH_BIND").unwrap_or(defaults.bind),
            env,
            max_body_bytes: parse_number("ZATCH_MAX_BODY_BYTES", lookup("ZATCH_MAX_BODY_BYTES"))?
                .unwrap_or(defaults.max_body_bytes),
        })
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: Option<String>) -> Result<Option<T>, AppError> {
    value
        .map(|v| {
            v.trim()
                .parse::<T>()
                .map_err(|_| AppError::BadRequest(format!("{} must be a number, got {}", key, v)))
        })
        .transpose()
}

/// Install the fmt subscriber. `RUST_LOG` wins over the default `zatch_backend=info`.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("zatch_backend=info,zatch_server=info")),
        )
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn reads_overrides_and_keeps_defaults() {
        let vars: HashMap<&str, &str> = [("ZATCH_ENV", "development"), ("DATABASE_MAX_CONNECTIONS", "12")]
            .into_iter()
            .collect();
        let s = Settings::from_lookup(|k| vars.get(k).map(|v| v.to_string())).unwrap();
        assert_eq!(s.env, RuntimeEnv::Development);
        assert_eq!(s.max_connections, 12);
        assert_eq!(s.bind, "0.0.0.0:3000");
    }

    #[test]
    fn rejects_bad_values() {
        assert!(Settings::from_lookup(|k| (k == "ZATCH_ENV").then(|| "staging".to_string())).is_err());
        assert!(Settings::from_lookup(|k| (k == "ZATCH_MAX_BODY_BYTES").then(|| "lots".to_string())).is_err());
    }
}
