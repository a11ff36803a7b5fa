//! Configuration management for Cinelog
//!
//! Handles config file loading/saving and TMDB credential resolution.
//! Config is stored at ~/.config/cinelog/config.toml

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::api::tmdb::{Credentials, DEFAULT_BASE_URL, DEFAULT_LANGUAGE};

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// TMDB v3 API key
    pub tmdb_api_key: Option<String>,
    /// TMDB v4 read access token (preferred over the API key)
    pub tmdb_access_token: Option<String>,
    /// TMDB API root
    pub base_url: Option<String>,
    /// Response locale
    pub language: Option<String>,
    /// Where the watched / saved lists live
    pub data_dir: Option<PathBuf>,
}

impl Config {
    /// Default config file path (~/.config/cinelog/config.toml)
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("cinelog").join("config.toml"))
    }

    /// Load config from `path` (or the default path). A missing file gives
    /// the defaults; a malformed file is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path.map(Path::to_path_buf).or_else(Self::default_path) else {
            return Ok(Self::default());
        };

        match std::fs::read_to_string(&path) {
            Ok(contents) => toml::from_str(&contents)
                .map_err(|e| anyhow!("Archivo de configuración inválido {}: {}", path.display(), e)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e.into()),
        }
    }

    /// Save config to `path` (or the default path)
    pub fn save(&self, path: Option<&Path>) -> Result<PathBuf> {
        let path = path
            .map(Path::to_path_buf)
            .or_else(Self::default_path)
            .ok_or_else(|| anyhow!("No se pudo determinar la ruta de configuración"))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let toml = toml::to_string_pretty(self)?;
        std::fs::write(&path, toml)?;
        Ok(path)
    }

    /// Apply TMDB_API_KEY / TMDB_ACCESS_TOKEN / TMDB_BASE_URL from the environment
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|name| std::env::var(name).ok())
    }

    fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(key) = non_empty("TMDB_API_KEY") {
            self.tmdb_api_key = Some(key);
        }
        if let Some(token) = non_empty("TMDB_ACCESS_TOKEN") {
            self.tmdb_access_token = Some(token);
        }
        if let Some(url) = non_empty("TMDB_BASE_URL") {
            self.base_url = Some(url);
        }
        self
    }

    /// Credentials to use: access token first, then API key
    pub fn credentials(&self) -> Result<Credentials> {
        if let Some(token) = self.tmdb_access_token.as_ref().filter(|t| !t.is_empty()) {
            return Ok(Credentials::Bearer(token.clone()));
        }
        if let Some(key) = self.tmdb_api_key.as_ref().filter(|k| !k.is_empty()) {
            return Ok(Credentials::ApiKey(key.clone()));
        }
        Err(anyhow!(
            "Faltan credenciales de TMDB: define TMDB_ACCESS_TOKEN o TMDB_API_KEY, \
             o ejecuta `cinelog config set-key <KEY>`"
        ))
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL)
    }

    pub fn language(&self) -> &str {
        self.language.as_deref().unwrap_or(DEFAULT_LANGUAGE)
    }

    /// Data directory (~/.local/share/cinelog unless configured)
    pub fn data_dir(&self) -> Result<PathBuf> {
        self.data_dir
            .clone()
            .or_else(|| dirs::data_dir().map(|p| p.join("cinelog")))
            .ok_or_else(|| anyhow!("No se pudo determinar el directorio de datos"))
    }

    /// Copy safe to print: credentials reduced to their last 4 characters
    pub fn masked(&self) -> Self {
        Self {
            tmdb_api_key: self.tmdb_api_key.as_deref().map(mask),
            tmdb_access_token: self.tmdb_access_token.as_deref().map(mask),
            ..self.clone()
        }
    }
}

fn mask(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 4 {
        return "*".repeat(chars.len());
    }
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}{}", "*".repeat(chars.len() - 4), tail)
}
