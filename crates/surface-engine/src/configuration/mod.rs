//! Layer configurations ("modes")
//!
//! A configuration decides which layer owns each role (faders, encoders,
//! buttons, display) for the current `ModeContext`. All configurations of a
//! section are built at start-up and kept in a `ConfigTable`; switching modes
//! only changes which `ConfigId` is current.
//!
//! The display role has two slots. Slot 0 is the primary display (what the
//! encoders edit), slot 1 the secondary one (the volume display). Any other
//! row is treated as slot 1.

mod browser;
mod menu;
mod mixer;
mod track;

pub use browser::BrowserConfiguration;
pub use menu::MenuConfiguration;
pub use mixer::MixerConfiguration;
pub use track::{missing_device_lines, TrackConfiguration};

use crate::host::{DeviceFollower, DeviceManager};
use crate::layer::LayerId;
use crate::shared_state::ModeContext;
use crate::types::InfoSource;
use std::rc::Rc;

/// Handler for a navigation direction (-1 / +1)
pub type NavigateHandler = Rc<dyn Fn(i32)>;

/// Identifies one configuration in a section's table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigId {
    Pan,
    Send,
    /// Sends of the cursor track (track-channel mode on the main section)
    SendTrack,
    /// Instrument, note effect and audio effect parameters
    CursorDevice,
    Eq,
    Browser,
}

impl ConfigId {
    pub const ALL: [ConfigId; 6] = [
        ConfigId::Pan,
        ConfigId::Send,
        ConfigId::SendTrack,
        ConfigId::CursorDevice,
        ConfigId::Eq,
        ConfigId::Browser,
    ];
}

/// Optional navigation handlers of a configuration
#[derive(Clone, Default)]
pub struct Navigation {
    pub horizontal: Option<NavigateHandler>,
    pub vertical: Option<NavigateHandler>,
}

impl Navigation {
    fn horizontal(&self, direction: i32) {
        if let Some(handler) = &self.horizontal {
            handler(direction);
        }
    }

    fn vertical(&self, direction: i32) {
        if let Some(handler) = &self.vertical {
            handler(direction);
        }
    }
}

/// A mode of a section
pub enum LayerConfiguration {
    Mixer(MixerConfiguration),
    Track(TrackConfiguration),
    Browser(BrowserConfiguration),
}

impl LayerConfiguration {
    pub fn name(&self) -> &str {
        match self {
            LayerConfiguration::Mixer(config) => config.name(),
            LayerConfiguration::Track(config) => config.name(),
            LayerConfiguration::Browser(config) => config.name(),
        }
    }

    pub fn fader_layer(&self, ctx: &ModeContext) -> LayerId {
        match self {
            LayerConfiguration::Mixer(config) => config.fader_layer(ctx),
            LayerConfiguration::Track(config) => config.fader_layer(ctx),
            LayerConfiguration::Browser(config) => config.fader_layer(ctx),
        }
    }

    pub fn encoder_layer(&self, ctx: &ModeContext) -> LayerId {
        match self {
            LayerConfiguration::Mixer(config) => config.encoder_layer(ctx),
            LayerConfiguration::Track(config) => config.encoder_layer(ctx),
            LayerConfiguration::Browser(config) => config.encoder_layer(ctx),
        }
    }

    pub fn button_layer(&self, ctx: &ModeContext) -> LayerId {
        match self {
            LayerConfiguration::Mixer(config) => config.button_layer(ctx),
            LayerConfiguration::Track(config) => config.button_layer(ctx),
            LayerConfiguration::Browser(config) => config.button_layer(ctx),
        }
    }

    /// Display layer for slot `row` (0 primary, anything else secondary)
    pub fn display_layer(&self, row: usize, ctx: &ModeContext) -> LayerId {
        match self {
            LayerConfiguration::Mixer(config) => config.display_layer(row, ctx),
            LayerConfiguration::Track(config) => config.display_layer(row, ctx),
            LayerConfiguration::Browser(config) => config.display_layer(row, ctx),
        }
    }

    pub fn navigate_horizontal(&self, direction: i32) {
        match self {
            LayerConfiguration::Mixer(config) => config.navigation().horizontal(direction),
            LayerConfiguration::Track(config) => config.navigation().horizontal(direction),
            LayerConfiguration::Browser(_) => {}
        }
    }

    pub fn navigate_vertical(&self, direction: i32) {
        match self {
            LayerConfiguration::Mixer(config) => config.navigation().vertical(direction),
            LayerConfiguration::Track(config) => config.navigation().vertical(direction),
            LayerConfiguration::Browser(_) => {}
        }
    }

    /// Show the info overlay; returns whether the layer set may have changed
    pub fn enable_info(&self, source: InfoSource) -> bool {
        match self {
            LayerConfiguration::Track(config) => config.enable_info(source),
            _ => false,
        }
    }

    /// Hide the info overlay; returns whether the layer set may have changed
    pub fn disable_info(&self) -> bool {
        match self {
            LayerConfiguration::Track(config) => config.disable_info(),
            _ => false,
        }
    }

    pub fn set_current_follower(&mut self, follower: Rc<dyn DeviceFollower>) {
        if let LayerConfiguration::Track(config) = self {
            config.set_current_follower(follower);
        }
    }

    pub fn device_manager(&self) -> Option<Rc<dyn DeviceManager>> {
        match self {
            LayerConfiguration::Track(config) => config.device_manager(),
            _ => None,
        }
    }
}

/// All configurations of one section, indexed by `ConfigId`
pub struct ConfigTable {
    pan: LayerConfiguration,
    send: LayerConfiguration,
    send_track: LayerConfiguration,
    cursor_device: LayerConfiguration,
    eq: LayerConfiguration,
    browser: LayerConfiguration,
}

impl ConfigTable {
    pub fn new(
        pan: MixerConfiguration,
        send: MixerConfiguration,
        send_track: TrackConfiguration,
        cursor_device: TrackConfiguration,
        eq: TrackConfiguration,
        browser: BrowserConfiguration,
    ) -> Self {
        Self {
            pan: LayerConfiguration::Mixer(pan),
            send: LayerConfiguration::Mixer(send),
            send_track: LayerConfiguration::Track(send_track),
            cursor_device: LayerConfiguration::Track(cursor_device),
            eq: LayerConfiguration::Track(eq),
            browser: LayerConfiguration::Browser(browser),
        }
    }

    pub fn get(&self, id: ConfigId) -> &LayerConfiguration {
        match id {
            ConfigId::Pan => &self.pan,
            ConfigId::Send => &self.send,
            ConfigId::SendTrack => &self.send_track,
            ConfigId::CursorDevice => &self.cursor_device,
            ConfigId::Eq => &self.eq,
            ConfigId::Browser => &self.browser,
        }
    }

    pub fn get_mut(&mut self, id: ConfigId) -> &mut LayerConfiguration {
        match id {
            ConfigId::Pan => &mut self.pan,
            ConfigId::Send => &mut self.send,
            ConfigId::SendTrack => &mut self.send_track,
            ConfigId::CursorDevice => &mut self.cursor_device,
            ConfigId::Eq => &mut self.eq,
            ConfigId::Browser => &mut self.browser,
        }
    }

    pub fn mixer_mut(&mut self, id: ConfigId) -> Option<&mut MixerConfiguration> {
        match self.get_mut(id) {
            LayerConfiguration::Mixer(config) => Some(config),
            _ => None,
        }
    }

    pub fn track(&self, id: ConfigId) -> Option<&TrackConfiguration> {
        match self.get(id) {
            LayerConfiguration::Track(config) => Some(config),
            _ => None,
        }
    }

    pub fn track_mut(&mut self, id: ConfigId) -> Option<&mut TrackConfiguration> {
        match self.get_mut(id) {
            LayerConfiguration::Track(config) => Some(config),
            _ => None,
        }
    }

    pub fn browser(&self) -> Option<&BrowserConfiguration> {
        match &self.browser {
            LayerConfiguration::Browser(config) => Some(config),
            _ => None,
        }
    }

    pub fn browser_mut(&mut self) -> Option<&mut BrowserConfiguration> {
        match &mut self.browser {
            LayerConfiguration::Browser(config) => Some(config),
            _ => None,
        }
    }
}
