use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use axum::http::HeaderValue;

pub const DEFAULT_GIT_TIMEOUT_SECS: u64 = 5;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub reload: bool,
    pub log_level: String,

    pub dataset_root: PathBuf,
    pub repo_path: Option<PathBuf>,
    pub audit_log: PathBuf,

    /// Empty means any origin.
    pub cors_origins: Vec<String>,

    pub git_bin: String,
    pub git_timeout: Duration,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same parsing as [`AppConfig::from_env`] over any key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let host = get("ZONE_GPT_HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = match get("ZONE_GPT_PORT") {
            Some(v) => v
                .parse::<u16>()
                .with_context(|| format!("ZONE_GPT_PORT must be a port number, got {v:?}"))?,
            None => 8000,
        };
        let reload = get("ZONE_GPT_RELOAD")
            .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);
        let log_level = get("ZONE_GPT_LOG_LEVEL").unwrap_or_else(|| "info".to_string());

        let dataset_root = PathBuf::from(get("ZONE_GPT_DATASET_ROOT").unwrap_or_else(|| "data/datasets".to_string()));
        let repo_path = get("ZONE_GPT_REPO_PATH").map(PathBuf::from);
        let audit_log = PathBuf::from(get("ZONE_GPT_AUDIT_LOG").unwrap_or_else(|| "brain_audit.log".to_string()));

        let cors_origins = parse_origins(get("ZONE_GPT_CORS_ORIGINS").as_deref())?;

        let git_bin = get("ZONE_GPT_GIT_BIN").unwrap_or_else(|| "git".to_string());
        let git_timeout_secs = match get("ZONE_GPT_GIT_TIMEOUT_SECS") {
            Some(v) => v
                .parse::<u64>()
                .with_context(|| format!("ZONE_GPT_GIT_TIMEOUT_SECS must be an integer, got {v:?}"))?,
            None => DEFAULT_GIT_TIMEOUT_SECS,
        };
        if git_timeout_secs == 0 {
            bail!("ZONE_GPT_GIT_TIMEOUT_SECS must be greater than zero");
        }

        Ok(Self {
            host,
            port,
            reload,
            log_level,
            dataset_root,
            repo_path,
            audit_log,
            cors_origins,
            git_bin,
            git_timeout: Duration::from_secs(git_timeout_secs),
        })
    }

    pub fn bind_addr(&self) -> String {
        if self.host.contains(':') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }
}

fn parse_origins(raw: Option<&str>) -> Result<Vec<String>> {
    let Some(raw) = raw else {
        return Ok(vec![]);
    };

    let origins: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .map(str::to_string)
        .collect();

    if origins.iter().any(|o| o == "*") {
        return Ok(vec![]);
    }

    for origin in &origins {
        if !origin.starts_with("http://") && !origin.starts_with("https://") {
            bail!("ZONE_GPT_CORS_ORIGINS entry {origin:?} must start with http:// or https://");
        }
        HeaderValue::from_str(origin)
            .with_context(|| format!("ZONE_GPT_CORS_ORIGINS entry {origin:?} is not a valid header value"))?;
    }
    Ok(origins)
}
