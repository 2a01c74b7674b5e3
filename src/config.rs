use std::fs;
use std::path::{Path, PathBuf};

use directories::BaseDirs;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::catalog::DEFAULT_API_URL;
use crate::error::MgError;

pub const API_URL_ENV: &str = "MG_API_URL";

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub token: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub api: Url,
    /// Token stored in the config file; lowest-priority credential.
    pub token: Option<String>,
}

pub struct ConfigLoader;

impl ConfigLoader {
    pub fn default_path() -> Option<PathBuf> {
        BaseDirs::new().map(|dirs| dirs.config_dir().join("mg-download").join("mg-download.json"))
    }

    /// Layer `--url`, `MG_API_URL`, the config file and the built-in default.
    pub fn resolve(path: Option<&Path>, url_flag: Option<&str>) -> Result<ResolvedConfig, MgError> {
        let config = Self::load(path)?;
        let env_url = std::env::var(API_URL_ENV).ok();
        Self::resolve_config(config, url_flag, env_url.as_deref())
    }

    /// An explicit path must exist; a missing default file means defaults.
    pub fn load(path: Option<&Path>) -> Result<Config, MgError> {
        let config_path = match path {
            Some(path) => path.to_path_buf(),
            None => match Self::default_path() {
                Some(path) if path.exists() => path,
                _ => return Ok(Config::default()),
            },
        };

        let content = fs::read_to_string(&config_path)
            .map_err(|_| MgError::ConfigRead(config_path.clone()))?;
        serde_json::from_str(&content).map_err(|err| MgError::ConfigParse(err.to_string()))
    }

    pub fn resolve_config(
        config: Config,
        url_flag: Option<&str>,
        env_url: Option<&str>,
    ) -> Result<ResolvedConfig, MgError> {
        let raw = [url_flag, env_url, config.url.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|value| !value.is_empty())
            .unwrap_or(DEFAULT_API_URL);
        let api = Url::parse(raw).map_err(|err| MgError::InvalidUrl(format!("{raw}: {err}")))?;
        if api.cannot_be_a_base() {
            return Err(MgError::InvalidUrl(raw.to_string()));
        }

        Ok(ResolvedConfig {
            api,
            token: config.token.filter(|token| !token.trim().is_empty()),
        })
    }
}
