use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::api::{DEFAULT_SERVER, DEFAULT_TIMEOUT_SECS};
use crate::render::base_map::DEFAULT_MAP_SIZE;

const FILENAME: &str = "config.yaml";
const APP_DIR: &str = "campusmap";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server: Option<ServerConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub map: Option<MapConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub defaults: Option<DefaultsConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Base URL of the routing service.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MapConfig {
    /// Campus map image the route coordinates refer to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<PathBuf>,

    /// Canvas size used when no image can be loaded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DefaultsConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
}

impl Config {
    pub fn path() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|d| d.join(APP_DIR).join(FILENAME))
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                anyhow::anyhow!("No config found. Run `campusmap config show` to see defaults.")
            } else {
                anyhow::anyhow!("Failed to read config: {e}")
            }
        })?;
        let config: Config = serde_yaml::from_str(&contents)
            .map_err(|e| anyhow::anyhow!("Invalid config in {}: {e}", path.display()))?;
        Ok(config)
    }

    /// A missing file is an empty config; an unreadable or invalid one is an error.
    pub fn load_or_empty(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load_from(path)
    }

    pub fn load_or_default() -> Self {
        match Self::path().and_then(|path| Self::load_or_empty(&path)) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("{e:#}; using built-in defaults");
                Self::default()
            }
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let yaml = serde_yaml::to_string(self)?;
        let contents = format!("# campusmap configuration\n{yaml}");
        std::fs::write(path, contents)?;
        Ok(())
    }

    pub fn server_url(&self) -> &str {
        self.server
            .as_ref()
            .and_then(|s| s.url.as_deref())
            .unwrap_or(DEFAULT_SERVER)
    }

    pub fn timeout(&self) -> Duration {
        let secs = self
            .server
            .as_ref()
            .and_then(|s| s.timeout_secs)
            .unwrap_or(DEFAULT_TIMEOUT_SECS);
        Duration::from_secs(secs)
    }

    pub fn map_image(&self) -> Option<&Path> {
        self.map.as_ref().and_then(|m| m.image.as_deref())
    }

    pub fn map_size(&self) -> [u32; 2] {
        let map = self.map.as_ref();
        [
            map.and_then(|m| m.width).unwrap_or(DEFAULT_MAP_SIZE[0]),
            map.and_then(|m| m.height).unwrap_or(DEFAULT_MAP_SIZE[1]),
        ]
    }

    pub fn theme(&self) -> &str {
        self.defaults
            .as_ref()
            .and_then(|d| d.theme.as_deref())
            .unwrap_or("light")
    }

    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "server.url" => {
                let url = url::Url::parse(value)
                    .map_err(|e| anyhow::anyhow!("Invalid server URL: {value} ({e})"))?;
                if !matches!(url.scheme(), "http" | "https") {
                    anyhow::bail!("Invalid server URL: {value}. Must be http:// or https://.");
                }
                self.server.get_or_insert_with(ServerConfig::default).url = Some(value.to_string());
            }
            "server.timeout_secs" => {
                let secs = match value.parse::<u64>() {
                    Ok(secs) if secs > 0 => secs,
                    _ => anyhow::bail!(
                        "Invalid timeout: {value}. Must be a positive number of seconds."
                    ),
                };
                self.server
                    .get_or_insert_with(ServerConfig::default)
                    .timeout_secs = Some(secs);
            }
            "map.image" => {
                self.map.get_or_insert_with(MapConfig::default).image = Some(PathBuf::from(value));
            }
            "map.width" | "map.height" => {
                let pixels = match value.parse::<u32>() {
                    Ok(px) if px > 0 => px,
                    _ => anyhow::bail!("Invalid {key}: {value}. Must be a positive pixel count."),
                };
                let map = self.map.get_or_insert_with(MapConfig::default);
                if key == "map.width" {
                    map.width = Some(pixels);
                } else {
                    map.height = Some(pixels);
                }
            }
            "defaults.theme" => {
                match value {
                    "light" | "dark" => {}
                    _ => anyhow::bail!("Invalid theme: {value}. Must be 'light' or 'dark'."),
                }
                self.defaults
                    .get_or_insert_with(DefaultsConfig::default)
                    .theme = Some(value.to_string());
            }
            _ => anyhow::bail!(
                "Unknown config key: {key}. Valid keys: server.url, server.timeout_secs, map.image, map.width, map.height, defaults.theme"
            ),
        }
        Ok(())
    }
}

/// Effective runtime settings: CLI flags over the config file over built-in defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub server: String,
    pub timeout: Duration,
    pub map_image: Option<PathBuf>,
    pub map_size: [u32; 2],
    pub theme: String,
}

impl Settings {
    pub fn resolve(config: &Config, server: Option<&str>, map_image: Option<&Path>) -> Self {
        Self {
            server: server.unwrap_or(config.server_url()).to_string(),
            timeout: config.timeout(),
            map_image: map_image.or(config.map_image()).map(Path::to_path_buf),
            map_size: config.map_size(),
            theme: config.theme().to_string(),
        }
    }
}
