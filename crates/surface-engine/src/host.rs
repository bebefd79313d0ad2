//! Host object model as seen by the engine
//!
//! The engine never owns tracks, devices or parameters. It talks to the host
//! through these traits and holds `Rc` handles to the host's objects. All
//! methods take `&self`: host objects are shared between many bindings and
//! change state through the host, not through exclusive borrows.
//!
//! Host-side changes the engine must react to (a device appearing, the
//! browser opening) are reported back as `SurfaceEvent`s.

use crate::shared_state::Modifiers;
use crate::types::{InfoSource, VPotMode};
use std::collections::HashMap;
use std::rc::Rc;

/// A normalized host parameter (0.0-1.0)
pub trait Parameter {
    fn name(&self) -> String;
    fn exists(&self) -> bool;
    fn value(&self) -> f64;
    fn set_value(&self, value: f64);

    /// Move the value by `delta`, clamped to the normalized range
    fn increment(&self, delta: f64) {
        self.set_value((self.value() + delta).clamp(0.0, 1.0));
    }

    /// Restore the parameter's default value
    fn reset(&self);

    /// Value formatted for the display (e.g. "-6.0dB")
    fn display_value(&self) -> String;
}

/// One mixer channel
pub trait Track {
    fn exists(&self) -> bool;
    fn name(&self) -> String;
    fn volume(&self) -> Rc<dyn Parameter>;
    fn pan(&self) -> Rc<dyn Parameter>;
    /// Send slot `index`, if the track has that many sends
    fn send(&self, index: usize) -> Option<Rc<dyn Parameter>>;

    fn is_armed(&self) -> bool;
    fn is_solo(&self) -> bool;
    fn is_muted(&self) -> bool;
    fn is_selected(&self) -> bool;
    fn set_armed(&self, armed: bool);
    fn set_solo(&self, solo: bool);
    fn set_muted(&self, muted: bool);

    fn select_in_mixer(&self);
    fn delete(&self);
    fn stop(&self);
    /// Navigate into the track if it is a group
    fn enter_group(&self);
}

/// Application-level actions
pub trait HostApplication {
    fn create_audio_track(&self);
    fn create_effect_track(&self);
    fn create_instrument_track(&self);
    /// Number of effect tracks, which is the number of sends on every track
    fn send_count(&self) -> usize;
}

/// The track the user has selected
pub trait CursorTrack {
    fn name(&self) -> String;
    /// Send slot `index` of the visible send window
    fn send(&self, index: usize) -> Option<Rc<dyn Parameter>>;
    /// Move the visible send window
    fn scroll_sends(&self, direction: i32);
    /// Append an EQ device at the end of the device chain
    fn insert_eq_device(&self);
}

/// Tracks the first device of one kind on the cursor track
pub trait DeviceFollower {
    /// Mode whose device kind this follower tracks
    fn mode(&self) -> VPotMode;
    fn focus_device_exists(&self) -> bool;
    /// Make sure the followed position still points at a device of the kind
    fn ensure_position(&self);
}

/// Parameter source for a device-editing mode
pub trait DeviceManager {
    fn current_follower(&self) -> Option<Rc<dyn DeviceFollower>>;
    fn set_current_follower(&self, follower: Rc<dyn DeviceFollower>);

    /// Whether the device kind of the current follower exists on the track
    fn is_specific_device_present(&self) -> bool;
    fn page_count(&self) -> usize;
    /// Remote-control slot `index` of the current page
    fn parameter(&self, index: usize) -> Rc<dyn Parameter>;
    fn name(&self) -> String;

    fn enable_info(&self, source: InfoSource);
    fn disable_info(&self);
    fn info_source(&self) -> Option<InfoSource>;
    /// Overlay lines for the active info source
    fn info_text(&self) -> [String; 2];

    /// Step through parameter pages
    fn navigate_parameters(&self, direction: i32);

    /// Encoder press on slot `index`
    fn handle_reset(&self, index: usize, _modifiers: Modifiers) {
        self.parameter(index).reset();
    }

    /// Open the host's device browser at the current insertion point
    fn initiate_browsing(&self);
}

/// The device the surface is currently focused on
pub trait CursorDevice {
    fn exists(&self) -> bool;
    fn name(&self) -> String;
    /// Jump to the device tracked by `follower`
    fn select_device(&self, follower: &dyn DeviceFollower);
    /// Step to the previous/next device in the chain
    fn navigate_device(&self, direction: i32);

    fn is_enabled(&self) -> bool;
    fn toggle_enabled(&self);
    fn is_pinned(&self) -> bool;
    fn toggle_pinned(&self);
    fn move_left(&self);
    fn move_right(&self);
    fn delete(&self);
}

/// Filter columns of the popup browser
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BrowserColumn {
    DeviceType,
    Location,
    FileType,
    Category,
    Creator,
}

impl BrowserColumn {
    /// Columns in encoder order
    pub const ALL: [BrowserColumn; 5] = [
        BrowserColumn::DeviceType,
        BrowserColumn::Location,
        BrowserColumn::FileType,
        BrowserColumn::Category,
        BrowserColumn::Creator,
    ];

    /// Cell label (fits a display cell)
    pub fn label(self) -> &'static str {
        match self {
            BrowserColumn::DeviceType => "Type",
            BrowserColumn::Location => "DevLoc",
            BrowserColumn::FileType => "FlType",
            BrowserColumn::Category => "Catgry",
            BrowserColumn::Creator => "Creatr",
        }
    }
}

/// Cursor over the entries of one filter column
pub trait BrowserFilterCursor {
    fn name(&self) -> String;
    fn select_previous(&self);
    fn select_next(&self);
    fn select_first(&self);
}

/// The host's modal device/preset browser
pub trait PopupBrowser {
    fn exists(&self) -> bool;
    fn cancel(&self);
    fn commit(&self);
    fn select_previous_file(&self);
    fn select_next_file(&self);
    fn toggle_audition(&self);
    fn column(&self, column: BrowserColumn) -> Rc<dyn BrowserFilterCursor>;
    /// Name of the selected result
    fn result_name(&self) -> String;
}

/// Followers and device managers per V-Pot mode
#[derive(Default, Clone)]
pub struct DeviceTypeBank {
    followers: HashMap<VPotMode, Rc<dyn DeviceFollower>>,
    managers: HashMap<VPotMode, Rc<dyn DeviceManager>>,
}

impl DeviceTypeBank {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_follower(&mut self, mode: VPotMode, follower: Rc<dyn DeviceFollower>) {
        self.followers.insert(mode, follower);
    }

    pub fn insert_device_manager(&mut self, mode: VPotMode, manager: Rc<dyn DeviceManager>) {
        self.managers.insert(mode, manager);
    }

    pub fn follower(&self, mode: VPotMode) -> Option<Rc<dyn DeviceFollower>> {
        self.followers.get(&mode).cloned()
    }

    pub fn device_manager(&self, mode: VPotMode) -> Option<Rc<dyn DeviceManager>> {
        self.managers.get(&mode).cloned()
    }
}
