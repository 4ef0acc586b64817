use std::str::FromStr;

/// Minimum accepted signing secret length (HS256 key material).
pub const MIN_SECRET_LEN: usize = 32;

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),
    #[error("invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
    #[error("JWT_SECRET must be at least {MIN_SECRET_LEN} characters long")]
    WeakSecret,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Postgres,
    Memory,
}

impl FromStr for StorageBackend {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "postgres" | "pg" => Ok(StorageBackend::Postgres),
            "memory" | "inmem" => Ok(StorageBackend::Memory),
            _ => Err(()),
        }
    }
}

/// Process configuration, read once before the storage backend is bound.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: String,
    pub port: u16,
    pub jwt_secret: String,
    pub storage: StorageBackend,
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub frontend_url: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build the config from any variable source; `from_env` passes the
    /// process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        fn parsed<T: FromStr>(
            lookup: &impl Fn(&str) -> Option<String>,
            name: &'static str,
            default: T,
        ) -> Result<T, ConfigError> {
            match lookup(name) {
                None => Ok(default),
                Some(value) => value.trim().parse().map_err(|_| ConfigError::Invalid { name, value }),
            }
        }

        let jwt_secret = lookup("JWT_SECRET")
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::Missing("JWT_SECRET"))?;
        if jwt_secret.len() < MIN_SECRET_LEN {
            return Err(ConfigError::WeakSecret);
        }

        let storage = parsed(&lookup, "STORAGE_BACKEND", StorageBackend::Postgres)?;
        let database_url = lookup("DATABASE_URL").filter(|s| !s.is_empty());
        if storage == StorageBackend::Postgres && database_url.is_none() {
            return Err(ConfigError::Missing("DATABASE_URL"));
        }

        Ok(Self {
            bind_addr: lookup("BIND_ADDR").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parsed(&lookup, "PORT", 8080)?,
            jwt_secret,
            storage,
            database_url,
            db_max_connections: parsed(&lookup, "DB_MAX_CONNECTIONS", 5)?,
            frontend_url: lookup("FRONTEND_URL").filter(|s| !s.is_empty()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const SECRET: &str = "test-secret-must-be-32-bytes-long!!";

    fn load(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let map: HashMap<String, String> =
            vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        AppConfig::from_lookup(|name| map.get(name).cloned())
    }

    #[test]
    fn defaults_apply() {
        let cfg = load(&[("JWT_SECRET", SECRET), ("DATABASE_URL", "postgres://localhost/tp")]).unwrap();
        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.bind_addr, "0.0.0.0");
        assert_eq!(cfg.storage, StorageBackend::Postgres);
        assert_eq!(cfg.db_max_connections, 5);
    }

    #[test]
    fn secret_is_required_and_long_enough() {
        assert_eq!(load(&[]).unwrap_err(), ConfigError::Missing("JWT_SECRET"));
        assert_eq!(load(&[("JWT_SECRET", "short")]).unwrap_err(), ConfigError::WeakSecret);
    }

    #[test]
    fn postgres_needs_database_url() {
        assert_eq!(load(&[("JWT_SECRET", SECRET)]).unwrap_err(), ConfigError::Missing("DATABASE_URL"));
        let cfg = load(&[("JWT_SECRET", SECRET), ("STORAGE_BACKEND", "memory")]).unwrap();
        assert_eq!(cfg.storage, StorageBackend::Memory);
        assert!(cfg.database_url.is_none());
    }

    #[test]
    fn bad_port_is_reported() {
        let err = load(&[("JWT_SECRET", SECRET), ("STORAGE_BACKEND", "memory"), ("PORT", "eighty")]).unwrap_err();
        assert_eq!(err, ConfigError::Invalid { name: "PORT", value: "eighty".into() });
    }
}
