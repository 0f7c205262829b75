use std::{env, net::SocketAddr, path::PathBuf, time::Duration};

use super::env::{
    AppConfig, ConfigError, DirectoryConfig, LoggingConfig, ModelConfig, ServerConfig,
};

const DEFAULT_MODEL_PATH: &str = "models/inbox_intelligence_model.json";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_MAX_INPUT_BYTES: usize = 1024 * 1024;
const DEFAULT_SHUTDOWN_TIMEOUT_SECS: u64 = 5;
const DEFAULT_LOG_FILE: &str = "service.log";

pub fn load_config() -> Result<AppConfig, ConfigError> {
    AppConfig::from_lookup(|key| env::var(key).ok())
}

impl AppConfig {
    fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let model = ModelConfig {
            artifact_path: PathBuf::from(
                var("MODEL_PATH").unwrap_or_else(|| DEFAULT_MODEL_PATH.to_string()),
            ),
            max_input_bytes: var("MAX_INPUT_BYTES")
                .and_then(|v| v.parse::<usize>().ok())
                .filter(|limit| *limit > 0)
                .unwrap_or(DEFAULT_MAX_INPUT_BYTES),
        };

        let bind_addr = match var("BIND_ADDR") {
            Some(raw) => raw
                .trim()
                .parse::<SocketAddr>()
                .map_err(|_| ConfigError::Invalid {
                    key: "BIND_ADDR",
                    value: raw.clone(),
                })?,
            None => SocketAddr::from(([127, 0, 0, 1], DEFAULT_PORT)),
        };

        let server = ServerConfig {
            bind_addr,
            shutdown_timeout: Duration::from_secs(
                var("SHUTDOWN_TIMEOUT_SECS")
                    .and_then(|v| v.parse::<u64>().ok())
                    .unwrap_or(DEFAULT_SHUTDOWN_TIMEOUT_SECS),
            ),
        };

        let directories = DirectoryConfig {
            logs_dir: var("LOGS_DIR").unwrap_or_else(|| "logs".to_string()),
        };

        let logging = LoggingConfig {
            level: var("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            file_name: match var("LOG_FILE") {
                Some(name) if name.eq_ignore_ascii_case("off") => None,
                Some(name) => Some(name),
                None => Some(DEFAULT_LOG_FILE.to_string()),
            },
        };

        Ok(Self {
            model,
            server,
            directories,
            logging,
        })
    }
}
