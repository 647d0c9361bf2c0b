use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::buddy::skin::Skin;
use crate::error::BuddyError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowConfig {
    /// Sprite size in pixels; the window edge is 1.3x this.
    #[serde(default = "WindowConfig::default_companion_size")]
    pub companion_size: u32,
}

impl WindowConfig {
    fn default_companion_size() -> u32 {
        75
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            companion_size: Self::default_companion_size(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoundConfig {
    #[serde(default = "SoundConfig::default_volume")]
    pub volume: f32,
    /// Voice cues such as `sfx/talk1.ogg` are looked up under this directory.
    #[serde(default = "SoundConfig::default_asset_dir")]
    pub asset_dir: PathBuf,
}

impl SoundConfig {
    fn default_volume() -> f32 {
        0.2
    }
    fn default_asset_dir() -> PathBuf {
        PathBuf::from(".")
    }
}

impl Default for SoundConfig {
    fn default() -> Self {
        Self {
            volume: Self::default_volume(),
            asset_dir: Self::default_asset_dir(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuddiesConfig {
    /// One companion is spawned per entry.
    #[serde(default = "BuddiesConfig::default_types")]
    pub types: Vec<String>,
}

impl BuddiesConfig {
    fn default_types() -> Vec<String> {
        vec!["funfriend".to_string()]
    }
}

impl Default for BuddiesConfig {
    fn default() -> Self {
        Self {
            types: Self::default_types(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub window: WindowConfig,
    #[serde(default)]
    pub sound: SoundConfig,
    #[serde(default)]
    pub buddies: BuddiesConfig,
}

impl AppConfig {
    /// Read `path`, or write the defaults there if it doesn't exist yet.
    /// Values are checked by [`AppConfig::validate`] once overrides are in.
    pub fn load_or_default(path: &Path) -> Result<Self, BuddyError> {
        if !path.exists() {
            let cfg = Self::default();
            match toml::to_string_pretty(&cfg) {
                Ok(text) => {
                    if let Err(err) = fs::write(path, text) {
                        log::warn!("Failed to write default config to {}: {err}", path.display());
                    } else {
                        log::info!("Wrote default config to {}", path.display());
                    }
                }
                Err(err) => log::warn!("Failed to serialize default config: {err}"),
            }
            return Ok(cfg);
        }

        let contents = fs::read_to_string(path).map_err(|source| BuddyError::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;
        let cfg: Self = toml::from_str(&contents)?;
        log::info!("Loaded config from {}", path.display());
        Ok(cfg)
    }

    /// Command-line values win over the file.
    pub fn with_overrides(mut self, skins: &[String], size: Option<u32>) -> Self {
        if !skins.is_empty() {
            self.buddies.types = skins.to_vec();
        }
        if let Some(size) = size {
            self.window.companion_size = size;
        }
        self
    }

    pub fn validate(&self) -> Result<(), BuddyError> {
        let size = self.window.companion_size;
        if !(1..=1024).contains(&size) {
            return Err(BuddyError::Config(format!(
                "companion_size must be within 1..=1024, got {size}"
            )));
        }
        let volume = self.sound.volume;
        if !volume.is_finite() || !(0.0..=1.0).contains(&volume) {
            return Err(BuddyError::Config(format!(
                "volume must be within [0, 1], got {volume}"
            )));
        }
        if self.buddies.types.is_empty() {
            return Err(BuddyError::Config("buddies.types is empty".to_string()));
        }
        Ok(())
    }

    /// Resolve every configured companion type up front.
    pub fn skins(&self) -> Result<Vec<Skin>, BuddyError> {
        self.buddies.types.iter().map(|name| Skin::by_name(name)).collect()
    }
}
