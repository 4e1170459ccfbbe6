use color_eyre::{eyre::eyre, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::engine::DEFAULT_REFRESH_INTERVAL_MS;
use crate::mapping::defaults::DEFAULT_THRESHOLD;
use crate::mapping::{AxisTable, ButtonTable, MappingProfile};

const CONFIG_DIR: &str = "padflow";
const CONFIG_FILE: &str = "config.toml";

/// Replacement tables for the declared device classes
#[derive(Deserialize, Serialize, Clone, Debug, Default)]
pub struct MappingOverrides {
    #[serde(default)]
    pub gamepad: Option<ButtonTable>,
    #[serde(default)]
    pub keyboard: Option<ButtonTable>,
    #[serde(default)]
    pub axes: Option<AxisTable>,
}

#[derive(Deserialize, Serialize, Clone, Debug)]
#[serde(default)]
pub struct EngineConfig {
    /// Analog activation threshold in `[0, 1)`
    pub threshold: f32,
    pub refresh_interval_ms: u64,
    /// Stick deadzone applied by the gilrs host
    pub joystick_deadzone: f32,
    pub mapping: MappingOverrides,
    pub profiles: Vec<MappingProfile>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            refresh_interval_ms: DEFAULT_REFRESH_INTERVAL_MS,
            joystick_deadzone: 0.05,
            mapping: MappingOverrides::default(),
            profiles: Vec::new(),
        }
    }
}

impl EngineConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: EngineConfig =
            toml::from_str(content).map_err(|e| eyre!("Failed to parse engine config: {}", e))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..1.0).contains(&self.threshold) {
            return Err(eyre!(
                "Threshold must lie in [0, 1), got {}",
                self.threshold
            ));
        }
        if self.refresh_interval_ms == 0 {
            return Err(eyre!("Refresh interval must be at least 1 ms"));
        }
        if !(0.0..1.0).contains(&self.joystick_deadzone) {
            return Err(eyre!(
                "Joystick deadzone must lie in [0, 1), got {}",
                self.joystick_deadzone
            ));
        }
        Ok(())
    }

    /// Reads `path`, falling back to defaults when the file does not exist
    pub async fn load(path: &Path) -> Result<Self> {
        if !tokio::fs::try_exists(path)
            .await
            .map_err(|e| eyre!("Failed to check if config file exists: {}", e))?
        {
            warn!(
                "Config file {} does not exist, using default",
                path.display()
            );
            return Ok(Self::default());
        }

        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;
        let config = Self::from_toml_str(&content)?;
        info!("Loaded engine config from {}", path.display());
        debug!("Engine config: {:?}", config);
        Ok(config)
    }

    pub async fn load_default() -> Result<Self> {
        Self::load(&default_path()).await
    }

    pub async fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| eyre!("Failed to create config directory: {}", e))?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| eyre!("Failed to serialize engine config: {}", e))?;
        tokio::fs::write(path, content)
            .await
            .map_err(|e| eyre!("Failed to write config file: {}", e))?;

        info!("Engine config saved to {}", path.display());
        Ok(())
    }
}

/// `<config dir>/padflow/config.toml`
pub fn default_path() -> PathBuf {
    let mut path = get_config_dir();
    path.push(CONFIG_DIR);
    path.push(CONFIG_FILE);
    path
}

fn get_config_dir() -> PathBuf {
    dirs::config_dir().unwrap_or_else(|| {
        warn!("Could not determine config directory, using current directory");
        PathBuf::from(".")
    })
}
