//! Layer activation engine for motorized MIDI control surfaces
//!
//! This crate provides:
//! - A hardware model of each surface section (encoders with LED rings,
//!   motor faders with touch sensors, channel buttons, a two-line LCD)
//! - Bindings that wire one control to one host target, grouped into layers
//! - Mode configurations deciding which layer owns each role
//! - The per-section state machine reconciling flip, global view, menu hold,
//!   fader touch and modifiers into the active layer set
//! - Change-tracked feedback output
//!
//! # Architecture
//!
//! ```text
//! host / hardware event → flume channel → SurfaceController
//!     → MixControl (per section) → LayerConfiguration → LayerState diff
//!     → Layers (de)activate → Bindings install/clear Surface slots
//! SurfaceController::flush → Surface change tracker → SurfaceOutput
//! ```
//!
//! Everything runs on the host's callback thread. Handlers installed on
//! controls never call back into the engine; anything that needs a state
//! change is posted as a `SurfaceEvent`.

mod binding;
mod config;
mod configuration;
mod controller;
mod host;
mod layer;
mod layer_state;
mod mix_control;
mod mixer_group;
mod scheduler;
mod shared_state;
pub mod surface;
mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use binding::{fixed_parameter, Binding, BindingTarget, ParameterSource};
pub use config::{
    default_surface_config_path, load_surface_config, save_surface_config,
    try_load_surface_config, MissingText, SectionConfig, SurfaceConfig,
};
pub use configuration::{
    missing_device_lines, BrowserConfiguration, ConfigId, ConfigTable, LayerConfiguration,
    MenuConfiguration, MixerConfiguration, TrackConfiguration,
};
pub use controller::{SurfaceController, SurfaceEvent};
pub use host::{
    BrowserColumn, BrowserFilterCursor, CursorDevice, CursorTrack, DeviceFollower,
    DeviceManager, DeviceTypeBank, HostApplication, Parameter, PopupBrowser, Track,
};
pub use layer::{DisplayLayer, Layer, LayerConflict, LayerId, Layers};
pub use layer_state::{ActiveLayers, LayerState};
pub use mix_control::MixControl;
pub use mixer_group::{GroupRefs, MixerGroupRefs, MixerLayerGroup};
pub use scheduler::{Scheduler, TimerQueue};
pub use shared_state::{ModeContext, Modifiers, SharedSurfaceState};
pub use surface::{Surface, SurfaceInput, SurfaceOutput};
pub use types::{
    ChannelButton, ControlId, InfoSource, ParamElement, RingDisplayType, Role, SectionType,
    VPotMode,
};

use std::path::PathBuf;

/// Error type for surface setup and configuration
#[derive(Debug, thiserror::Error)]
pub enum SurfaceError {
    #[error("Failed to read surface config {path:?}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse surface config: {0}")]
    ConfigParse(#[from] serde_yaml::Error),

    #[error("Surface config has no sections")]
    NoSections,

    #[error("Section '{0}' has no channels")]
    EmptySection(String),

    #[error("No section with index {0}")]
    UnknownSection(usize),

    #[error("Surface config has no main section")]
    NoMainSection,
}
