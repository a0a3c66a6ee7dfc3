use std::path::PathBuf;

use anyhow::{Context, Result, bail};

use jibe_core::similarity::DEFAULT_THRESHOLD;

#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub db_path: PathBuf,
    pub host: String,
    pub port: u16,
    pub similarity_threshold: f64,
    /// Extra log destination next to stdout.
    pub log_file: Option<PathBuf>,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let db_path = lookup("JIBE_DB_PATH").unwrap_or_else(|| "jibe.db".into()).into();
        let host = lookup("JIBE_HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port: u16 = lookup("JIBE_PORT")
            .unwrap_or_else(|| "3000".into())
            .parse()
            .context("JIBE_PORT must be a port number")?;

        let similarity_threshold = match lookup("JIBE_SIMILARITY_THRESHOLD") {
            Some(raw) => raw
                .parse::<f64>()
                .context("JIBE_SIMILARITY_THRESHOLD must be a number")?,
            None => DEFAULT_THRESHOLD,
        };
        if !(0.0..=1.0).contains(&similarity_threshold) {
            bail!(
                "JIBE_SIMILARITY_THRESHOLD must be between 0 and 1, got {}",
                similarity_threshold
            );
        }

        let log_file = lookup("JIBE_LOG_FILE").filter(|v| !v.is_empty()).map(PathBuf::from);

        Ok(Self {
            db_path,
            host,
            port,
            similarity_threshold,
            log_file,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<ServerConfig> {
        let vars: HashMap<String, String> =
            vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        ServerConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults() {
        let cfg = config(&[]).unwrap();
        assert_eq!(cfg.db_path, PathBuf::from("jibe.db"));
        assert_eq!(cfg.host, "0.0.0.0");
        assert_eq!(cfg.port, 3000);
        assert_eq!(cfg.similarity_threshold, 0.8);
        assert_eq!(cfg.log_file, None);
    }

    #[test]
    fn overrides() {
        let cfg = config(&[
            ("JIBE_DB_PATH", "/var/lib/jibe/data.db"),
            ("JIBE_PORT", "8080"),
            ("JIBE_SIMILARITY_THRESHOLD", "0.9"),
            ("JIBE_LOG_FILE", "api.log"),
        ])
        .unwrap();
        assert_eq!(cfg.db_path, PathBuf::from("/var/lib/jibe/data.db"));
        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.similarity_threshold, 0.9);
        assert_eq!(cfg.log_file, Some(PathBuf::from("api.log")));
    }

    #[test]
    fn rejects_bad_values() {
        assert!(config(&[("JIBE_PORT", "http")]).is_err());
        assert!(config(&[("JIBE_PORT", "70000")]).is_err());
        assert!(config(&[("JIBE_SIMILARITY_THRESHOLD", "1.5")]).is_err());
        assert!(config(&[("JIBE_SIMILARITY_THRESHOLD", "high")]).is_err());
    }
}
