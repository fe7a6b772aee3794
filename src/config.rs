use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Context};
use serde::Deserialize;
use tracing::debug;

use crate::util::http_downloader::Credentials;

const CONFIG_DIR: &str = ".nat";
const CONFIG_FILE_NAME: &str = "config.json";
const CACHE_DIR_NAME: &str = "cache";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NatConfig {
    pub repo: RepoConfig,
    /// directory names for type bundles, keyed by "<groupId>.<artifactId>"
    #[serde(default)]
    pub type_bundle_names: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepoConfig {
    pub url: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default = "default_cache")]
    pub cache: bool,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

fn default_cache() -> bool {
    true
}

fn default_timeout_seconds() -> u64 {
    300
}

fn default_concurrency() -> usize {
    4
}

impl RepoConfig {
    /// basic auth is only sent when a user name is configured
    pub fn credentials(&self) -> Option<Credentials> {
        self.username.as_ref().map(|username| Credentials {
            username: username.clone(),
            password: self.password.clone().unwrap_or_default(),
        })
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

impl NatConfig {
    pub fn parse(json: &str) -> anyhow::Result<NatConfig> {
        Ok(serde_json::from_str(json)?)
    }

    pub async fn load(path: &Path) -> anyhow::Result<NatConfig> {
        debug!("reading configuration from {}", path.display());
        let json = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("reading configuration {}", path.display()))?;
        NatConfig::parse(&json)
            .with_context(|| format!("parsing configuration {}", path.display()))
    }
}

fn nat_dir() -> anyhow::Result<PathBuf> {
    Ok(dirs::home_dir()
        .ok_or_else(|| anyhow!("unable to determine home directory"))?
        .join(CONFIG_DIR))
}

pub fn default_config_path() -> anyhow::Result<PathBuf> {
    Ok(nat_dir()?.join(CONFIG_FILE_NAME))
}

pub fn default_cache_dir() -> anyhow::Result<PathBuf> {
    Ok(nat_dir()?.join(CACHE_DIR_NAME))
}
