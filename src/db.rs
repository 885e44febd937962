use crate::error::{Error, Result};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection};
use std::str::FromStr;
use std::time::Duration;

/// Connection settings, usually read from the environment (and `.env`).
#[derive(Clone, Debug)]
pub struct DbConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout: Duration,
    pub sql_logging: bool,
}

impl DbConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_connections: 10,
            min_connections: 1,
            connect_timeout: Duration::from_secs(8),
            sql_logging: false,
        }
    }

    /// Reads `DATABASE_URL` and the optional `DATABASE_*` tuning variables.
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Same as `from_env`, reading variables through `var` instead of the
    /// process environment.
    pub fn from_vars<F>(var: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let url = var("DATABASE_URL")
            .ok_or_else(|| Error::Config("DATABASE_URL must be set".to_owned()))?;
        let mut config = Self::new(url);

        if let Some(max) = parse_var::<u32, _>(&var, "DATABASE_MAX_CONNECTIONS")? {
            config.max_connections = max;
        }
        if let Some(min) = parse_var::<u32, _>(&var, "DATABASE_MIN_CONNECTIONS")? {
            config.min_connections = min;
        }
        if let Some(secs) = parse_var::<u64, _>(&var, "DATABASE_CONNECT_TIMEOUT")? {
            config.connect_timeout = Duration::from_secs(secs);
        }
        if let Some(logging) = parse_var::<bool, _>(&var, "DATABASE_SQL_LOGGING")? {
            config.sql_logging = logging;
        }

        if config.min_connections > config.max_connections {
            return Err(Error::Config(format!(
                "DATABASE_MIN_CONNECTIONS ({}) exceeds DATABASE_MAX_CONNECTIONS ({})",
                config.min_connections, config.max_connections
            )));
        }

        Ok(config)
    }
}

fn parse_var<T, F>(var: &F, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match var(key) {
        Some(val) => val
            .parse::<T>()
            .map(Some)
            .map_err(|_| Error::Config(format!("{} cannot be parsed: {:?}", key, val))),
        None => Ok(None),
    }
}

/// Opens a connection pool. The handle is owned by the caller and passed
/// into every operation; nothing here is stored globally.
pub async fn connect(config: &DbConfig) -> Result<DatabaseConnection> {
    let mut opt = ConnectOptions::new(config.url.to_owned());
    opt.max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .connect_timeout(config.connect_timeout)
        .sqlx_logging(config.sql_logging);

    let db = Database::connect(opt).await?;
    log::info!(
        "connected to {:?} database (max {} connections)",
        db.get_database_backend(),
        config.max_connections
    );
    Ok(db)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn from_pairs(pairs: &[(&str, &str)]) -> Result<DbConfig> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        DbConfig::from_vars(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults() {
        let config = DbConfig::new("sqlite::memory:");
        assert_eq!(config.url, "sqlite::memory:");
        assert_eq!(config.max_connections, 10);
        assert_eq!(config.min_connections, 1);
        assert!(!config.sql_logging);
    }

    #[test]
    fn url_only_keeps_defaults() {
        let config = from_pairs(&[("DATABASE_URL", "postgres://localhost/social")]).unwrap();
        assert_eq!(config.url, "postgres://localhost/social");
        assert_eq!(config.max_connections, 10);
        assert_eq!(config.min_connections, 1);
        assert_eq!(config.connect_timeout, Duration::from_secs(8));
        assert!(!config.sql_logging);
    }

    #[test]
    fn reads_every_tuning_variable() {
        let config = from_pairs(&[
            ("DATABASE_URL", "sqlite::memory:"),
            ("DATABASE_MAX_CONNECTIONS", "20"),
            ("DATABASE_MIN_CONNECTIONS", "4"),
            ("DATABASE_CONNECT_TIMEOUT", "3"),
            ("DATABASE_SQL_LOGGING", "true"),
        ])
        .unwrap();
        assert_eq!(config.max_connections, 20);
        assert_eq!(config.min_connections, 4);
        assert_eq!(config.connect_timeout, Duration::from_secs(3));
        assert!(config.sql_logging);
    }

    #[test]
    fn missing_url_is_a_config_error() {
        let err = from_pairs(&[("DATABASE_MAX_CONNECTIONS", "5")]).unwrap_err();
        assert!(matches!(err, Error::Config(msg) if msg.contains("DATABASE_URL")));
    }

    #[test]
    fn unparsable_values_are_rejected() {
        for (key, val) in [
            ("DATABASE_MAX_CONNECTIONS", "lots"),
            ("DATABASE_MIN_CONNECTIONS", "-1"),
            ("DATABASE_CONNECT_TIMEOUT", "8s"),
            ("DATABASE_SQL_LOGGING", "yes"),
        ] {
            let err = from_pairs(&[("DATABASE_URL", "sqlite::memory:"), (key, val)]).unwrap_err();
            assert!(matches!(&err, Error::Config(msg) if msg.contains(key)), "{}: {:?}", key, err);
        }
    }

    #[test]
    fn min_above_max_is_rejected() {
        let err = from_pairs(&[
            ("DATABASE_URL", "sqlite::memory:"),
            ("DATABASE_MAX_CONNECTIONS", "2"),
            ("DATABASE_MIN_CONNECTIONS", "3"),
        ])
        .unwrap_err();
        assert!(matches!(err, Error::Config(msg) if msg.contains("exceeds")));
    }
}
