use anyhow::Context;
use serde::{Deserialize, Serialize};

/// Settings for the process node server
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    pub api_server: ServerConfig,
    pub process: ProcessConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub backend: DatabaseBackend,
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseBackend {
    Sqlite,
    Postgres,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessConfig {
    /// Delay after spawn before a process accepts contract evaluation
    pub boot_delay_ms: u64,
    /// Capacity of each process mailbox
    pub mailbox_size: usize,
}

impl Default for ProcessConfig {
    fn default() -> Self {
        Self {
            boot_delay_ms: 0,
            mailbox_size: 1024,
        }
    }
}

impl ProcessConfig {
    /// Build from raw setting values; unset values take the defaults
    pub fn parse(boot_delay_ms: Option<&str>, mailbox_size: Option<&str>) -> anyhow::Result<Self> {
        let defaults = Self::default();

        let boot_delay_ms = match boot_delay_ms {
            Some(value) => value
                .parse::<u64>()
                .with_context(|| format!("invalid PROCESS_BOOT_DELAY_MS '{value}'"))?,
            None => defaults.boot_delay_ms,
        };
        let mailbox_size = match mailbox_size {
            Some(value) => value
                .parse::<usize>()
                .with_context(|| format!("invalid PROCESS_MAILBOX_SIZE '{value}'"))?,
            None => defaults.mailbox_size,
        };
        if mailbox_size == 0 {
            anyhow::bail!("PROCESS_MAILBOX_SIZE must be at least 1");
        }

        Ok(Self {
            boot_delay_ms,
            mailbox_size,
        })
    }
}

/// Settings for clients talking to a node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    pub node_url: String,
    pub max_attempts: u32,
    pub process_label: String,
    /// Sender recorded on every message this client sends
    pub client_id: String,
}

impl ClientConfig {
    pub const DEFAULT_MAX_ATTEMPTS: u32 = 20;

    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let node_url = std::env::var("PULSE_NODE_URL")
            .unwrap_or_else(|_| "http://127.0.0.1:8080".to_string());

        let max_attempts = match std::env::var("POLL_MAX_ATTEMPTS") {
            Ok(value) => value.parse::<u32>()?,
            Err(_) => Self::DEFAULT_MAX_ATTEMPTS,
        };
        if max_attempts == 0 {
            anyhow::bail!("POLL_MAX_ATTEMPTS must be at least 1");
        }

        let process_label =
            std::env::var("PROCESS_LABEL").unwrap_or_else(|_| "Pulse-Analytics".to_string());
        let client_id = std::env::var("CLIENT_ID").unwrap_or_else(|_| "anonymous".to_string());

        Ok(ClientConfig {
            node_url,
            max_attempts,
            process_label,
            client_id,
        })
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let backend_str =
            std::env::var("DATABASE_BACKEND").unwrap_or_else(|_| "sqlite".to_string());

        let backend = match backend_str.to_lowercase().as_str() {
            "postgres" | "postgresql" => DatabaseBackend::Postgres,
            "sqlite" => DatabaseBackend::Sqlite,
            other => {
                tracing::warn!(
                    "Unknown DATABASE_BACKEND '{other}', falling back to 'sqlite'. Supported values: sqlite, postgres"
                );
                DatabaseBackend::Sqlite
            }
        };

        let database_url =
            std::env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite::memory:".to_string());
        let max_connections = std::env::var("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "5".to_string())
            .parse::<u32>()?;

        let api_host = std::env::var("API_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let api_port = std::env::var("API_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse::<u16>()?;

        let process = ProcessConfig::parse(
            std::env::var("PROCESS_BOOT_DELAY_MS").ok().as_deref(),
            std::env::var("PROCESS_MAILBOX_SIZE").ok().as_deref(),
        )?;

        Ok(Config {
            database: DatabaseConfig {
                backend,
                url: database_url,
                max_connections,
            },
            api_server: ServerConfig {
                host: api_host,
                port: api_port,
            },
            process,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_process_config_defaults_when_unset() {
        let config = ProcessConfig::parse(None, None).unwrap();
        assert_eq!(config.boot_delay_ms, 0);
        assert_eq!(config.mailbox_size, 1024);
    }

    #[test]
    fn test_process_config_parses_values() {
        let config = ProcessConfig::parse(Some("250"), Some("16")).unwrap();
        assert_eq!(config.boot_delay_ms, 250);
        assert_eq!(config.mailbox_size, 16);
    }

    #[test]
    fn test_process_config_rejects_bad_values() {
        let err = ProcessConfig::parse(Some("soon"), None).unwrap_err();
        assert!(err.to_string().contains("PROCESS_BOOT_DELAY_MS"));

        let err = ProcessConfig::parse(None, Some("-1")).unwrap_err();
        assert!(err.to_string().contains("PROCESS_MAILBOX_SIZE"));

        assert!(ProcessConfig::parse(None, Some("0")).is_err());
    }
}
