//! Server configuration, read once from the environment at startup.

use anyhow::{bail, Context};
use std::path::PathBuf;

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_JSON_LIMIT: usize = 1024 * 1024;

#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub db_file:        String,
    pub migrations_dir: PathBuf,
    pub seeds_dir:      PathBuf,
    pub seed_on_start:  bool,
    pub port:           u16,
    /// Allowed CORS origins. Empty allows any origin.
    pub cors_origins:   Vec<String>,
    /// Request body limit in bytes.
    pub json_limit:     usize,
    pub node_env:       String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            db_file:        "database/rosistat.db".into(),
            migrations_dir: PathBuf::from("database/migrations"),
            seeds_dir:      PathBuf::from("database/seed"),
            seed_on_start:  true,
            port:           DEFAULT_PORT,
            cors_origins:   Vec::new(),
            json_limit:     DEFAULT_JSON_LIMIT,
            node_env:       "development".into(),
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from any key lookup. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let defaults = Self::default();

        let node_env = get("NODE_ENV").unwrap_or(defaults.node_env);
        let seed_on_start = match get("SEED_ON_START").as_deref() {
            Some("true") => true,
            Some("false") => false,
            _ => node_env != "production",
        };
        let port = match get("PORT") {
            Some(raw) => raw
                .parse::<u16>()
                .with_context(|| format!("PORT is not a valid port: {raw}"))?,
            None => defaults.port,
        };
        let json_limit = match get("JSON_LIMIT") {
            Some(raw) => parse_size(&raw)?,
            None => defaults.json_limit,
        };
        let cors_origins = get("CORS_ORIGINS")
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|o| !o.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            db_file: get("DB_FILE").unwrap_or(defaults.db_file),
            migrations_dir: get("MIGRATIONS_DIR").map(PathBuf::from).unwrap_or(defaults.migrations_dir),
            seeds_dir: get("SEEDS_DIR").map(PathBuf::from).unwrap_or(defaults.seeds_dir),
            seed_on_start,
            port,
            cors_origins,
            json_limit,
            node_env,
        })
    }
}

/// Parse a body size such as `512kb` or `1mb`. A bare number is bytes.
pub fn parse_size(raw: &str) -> anyhow::Result<usize> {
    let lower = raw.trim().to_ascii_lowercase();
    let split = lower
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(lower.len());
    let (number, unit) = lower.split_at(split);
    let number: f64 = number
        .parse()
        .with_context(|| format!("invalid size: {raw}"))?;
    let scale = match unit.trim() {
        "" | "b" => 1.0,
        "kb" => 1024.0,
        "mb" => 1024.0 * 1024.0,
        "gb" => 1024.0 * 1024.0 * 1024.0,
        other => bail!("unknown size unit '{other}' in {raw}"),
    };
    Ok((number * scale) as usize)
}

/// Exact match, or suffix match for entries written as `*.example.com`.
pub fn origin_allowed(allowed: &[String], origin: &str) -> bool {
    allowed.iter().any(|entry| match entry.strip_prefix('*') {
        Some(suffix) => origin.ends_with(suffix),
        None => entry == origin,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> anyhow::Result<ServerConfig> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_without_environment() {
        let cfg = config(&[]).unwrap();
        assert_eq!(cfg, ServerConfig::default());
        assert!(cfg.seed_on_start);
    }

    #[test]
    fn production_skips_seeds_unless_forced() {
        assert!(!config(&[("NODE_ENV", "production")]).unwrap().seed_on_start);
        let forced = config(&[("NODE_ENV", "production"), ("SEED_ON_START", "true")]).unwrap();
        assert!(forced.seed_on_start);
        assert!(!config(&[("SEED_ON_START", "false")]).unwrap().seed_on_start);
    }

    #[test]
    fn explicit_values_override_defaults() {
        let cfg = config(&[
            ("DB_FILE", "/tmp/x.db"),
            ("PORT", "9000"),
            ("CORS_ORIGINS", "https://a.test, *.b.test,"),
            ("JSON_LIMIT", "2mb"),
        ])
        .unwrap();
        assert_eq!(cfg.db_file, "/tmp/x.db");
        assert_eq!(cfg.port, 9000);
        assert_eq!(cfg.cors_origins, vec!["https://a.test", "*.b.test"]);
        assert_eq!(cfg.json_limit, 2 * 1024 * 1024);
    }

    #[test]
    fn bad_port_is_rejected() {
        assert!(config(&[("PORT", "eighty")]).is_err());
    }

    #[test]
    fn sizes() {
        assert_eq!(parse_size("100").unwrap(), 100);
        assert_eq!(parse_size("100b").unwrap(), 100);
        assert_eq!(parse_size("512kb").unwrap(), 512 * 1024);
        assert_eq!(parse_size("1MB").unwrap(), 1024 * 1024);
        assert_eq!(parse_size("1.5kb").unwrap(), 1536);
        assert!(parse_size("10xb").is_err());
        assert!(parse_size("mb").is_err());
    }

    #[test]
    fn origin_matching() {
        let allowed = vec!["https://app.test".to_string(), "*.preview.test".to_string()];
        assert!(origin_allowed(&allowed, "https://app.test"));
        assert!(origin_allowed(&allowed, "https://pr-12.preview.test"));
        assert!(!origin_allowed(&allowed, "https://evil.test"));
        assert!(!origin_allowed(&allowed, "https://app.test.evil"));
    }
}
