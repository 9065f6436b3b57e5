// src/config.rs

use anyhow::{Context, bail};
use dotenvy::dotenv;
use std::{env, path::PathBuf};

#[derive(Debug, Clone)]
pub struct Config {
    pub server_host: String,
    pub server_port: u16,
    /// Absent means the remote document store is not configured.
    pub database_url: Option<String>,
    /// Directory holding the local snapshot slot.
    pub data_dir: PathBuf,
    pub jwt_secret: String,
    pub analysis_url: Option<String>,
    pub analysis_api_key: Option<String>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(var: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        // Blank values count as unset.
        let get = |key: &str| var(key).filter(|v| !v.trim().is_empty());

        let server_port = match get("SERVER_PORT") {
            Some(port) => port.trim().parse().with_context(|| {
                format!("SERVER_PORT must be a valid port number, got '{}'", port)
            })?,
            None => 3000,
        };

        let Some(jwt_secret) = get("AUTH_JWT_SECRET") else {
            bail!("AUTH_JWT_SECRET must be set");
        };

        Ok(Self {
            server_host: get("SERVER_HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            server_port,
            database_url: get("DATABASE_URL"),
            data_dir: get("DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("./data")),
            jwt_secret,
            analysis_url: get("ANALYSIS_URL"),
            analysis_api_key: get("ANALYSIS_API_KEY"),
        })
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> anyhow::Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_only_the_secret_is_set() {
        let config = load(&[("AUTH_JWT_SECRET", "s3cret"), ("DATABASE_URL", " ")]).unwrap();
        assert_eq!(config.server_addr(), "127.0.0.1:3000");
        assert_eq!(config.data_dir, PathBuf::from("./data"));
        assert!(config.database_url.is_none());
        assert!(config.analysis_url.is_none());
    }

    #[test]
    fn missing_secret_is_an_error() {
        let err = load(&[("SERVER_PORT", "8080")]).unwrap_err();
        assert!(err.to_string().contains("AUTH_JWT_SECRET"));
    }

    #[test]
    fn malformed_port_is_an_error_not_a_panic() {
        let err = load(&[("AUTH_JWT_SECRET", "x"), ("SERVER_PORT", "eighty")]).unwrap_err();
        assert!(err.to_string().contains("SERVER_PORT"));
    }
}
