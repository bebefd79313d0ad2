//! Surface configuration
//!
//! Describes the physical layout (which sections exist and how many channel
//! strips each has) and a few behaviour settings. Stored as YAML:
//!
//! ```yaml
//! sections:
//!   - name: "main"
//!     section_type: main
//!     channels: 8
//!   - name: "xt"
//!     section_type: extender
//! touch_release_delay_ms: 1500
//! encoder_step: 0.01
//! missing_text:
//!   instrument:
//!     line1: "no instrument on track"
//!     line2: "<< press INSTRUMENT again to browse >>"
//! ```

use crate::types::{SectionType, VPotMode};
use crate::SurfaceError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Channel strips per section unless configured otherwise
pub const DEFAULT_CHANNELS: usize = 8;

/// Delay between the last fader release and the display switching back
pub const DEFAULT_TOUCH_RELEASE_DELAY_MS: u64 = 1500;

/// Parameter change per encoder step
pub const DEFAULT_ENCODER_STEP: f64 = 0.01;

/// Top-level surface configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurfaceConfig {
    /// Sections in strip order (main unit first is conventional)
    #[serde(default = "default_sections")]
    pub sections: Vec<SectionConfig>,

    /// Display recompute delay after all faders are released
    #[serde(default = "default_touch_release_delay_ms")]
    pub touch_release_delay_ms: u64,

    /// Normalized parameter change per encoder step
    #[serde(default = "default_encoder_step")]
    pub encoder_step: f64,

    /// Replacement text for the missing-device display, per mode
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub missing_text: HashMap<VPotMode, MissingText>,
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            sections: default_sections(),
            touch_release_delay_ms: DEFAULT_TOUCH_RELEASE_DELAY_MS,
            encoder_step: DEFAULT_ENCODER_STEP,
            missing_text: HashMap::new(),
        }
    }
}

impl SurfaceConfig {
    pub fn touch_release_delay(&self) -> Duration {
        Duration::from_millis(self.touch_release_delay_ms)
    }

    /// First channel of section `index` across the whole surface
    pub fn channel_offset(&self, index: usize) -> usize {
        self.sections
            .iter()
            .take(index)
            .map(|section| section.channels)
            .sum()
    }

    /// Check the layout before sections are built from it
    pub fn validate(&self) -> Result<(), SurfaceError> {
        if self.sections.is_empty() {
            return Err(SurfaceError::NoSections);
        }
        if let Some(section) = self.sections.iter().find(|s| s.channels == 0) {
            return Err(SurfaceError::EmptySection(section.name.clone()));
        }
        if !self
            .sections
            .iter()
            .any(|s| s.section_type == SectionType::Main)
        {
            return Err(SurfaceError::NoMainSection);
        }
        Ok(())
    }
}

/// One physical unit of the surface
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionConfig {
    pub name: String,

    #[serde(default)]
    pub section_type: SectionType,

    #[serde(default = "default_channels")]
    pub channels: usize,
}

impl SectionConfig {
    pub fn main(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            section_type: SectionType::Main,
            channels: DEFAULT_CHANNELS,
        }
    }

    pub fn extender(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            section_type: SectionType::Extender,
            channels: DEFAULT_CHANNELS,
        }
    }
}

/// Two display lines shown when a mode's device is missing
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissingText {
    pub line1: String,
    pub line2: String,
}

fn default_sections() -> Vec<SectionConfig> {
    vec![SectionConfig::main("main")]
}

fn default_touch_release_delay_ms() -> u64 {
    DEFAULT_TOUCH_RELEASE_DELAY_MS
}

fn default_encoder_step() -> f64 {
    DEFAULT_ENCODER_STEP
}

fn default_channels() -> usize {
    DEFAULT_CHANNELS
}

/// Get the default surface config file path
///
/// Returns: ~/.config/surface-engine/surface.yaml (platform config dir)
pub fn default_surface_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("surface-engine")
        .join("surface.yaml")
}

/// Load surface configuration from a YAML file
///
/// If the file doesn't exist, returns the default single-section layout.
/// If the file exists but is invalid, logs a warning and returns the default.
pub fn load_surface_config(path: &Path) -> SurfaceConfig {
    log::info!("load_surface_config: Loading from {:?}", path);

    if !path.exists() {
        log::info!("load_surface_config: Config file doesn't exist, using defaults");
        return SurfaceConfig::default();
    }

    match try_load_surface_config(path) {
        Ok(config) => config,
        Err(e) => {
            log::warn!("load_surface_config: {}", e);
            SurfaceConfig::default()
        }
    }
}

/// Load and validate surface configuration, reporting every failure
pub fn try_load_surface_config(path: &Path) -> Result<SurfaceConfig, SurfaceError> {
    let contents = std::fs::read_to_string(path).map_err(|source| SurfaceError::ConfigRead {
        path: path.to_path_buf(),
        source,
    })?;
    let config: SurfaceConfig = serde_yaml::from_str(&contents)?;
    config.validate()?;

    log::info!(
        "load_surface_config: Loaded {} section(s)",
        config.sections.len()
    );
    for section in &config.sections {
        log::info!(
            "  - {} ({:?}, {} channels)",
            section.name,
            section.section_type,
            section.channels
        );
    }
    Ok(config)
}

/// Save surface configuration to a YAML file
///
/// Creates parent directories if they don't exist.
pub fn save_surface_config(config: &SurfaceConfig, path: &Path) -> anyhow::Result<()> {
    use anyhow::Context;

    log::info!("save_surface_config: Saving to {:?}", path);

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
    }

    let yaml =
        serde_yaml::to_string(config).context("Failed to serialize surface config to YAML")?;

    std::fs::write(path, yaml)
        .with_context(|| format!("Failed to write surface config file: {:?}", path))?;

    log::info!("save_surface_config: Config saved successfully");
    Ok(())
}
