//! Flags shared by all sections of one surface
//!
//! The controller owns one `SharedSurfaceState` and hands an `Rc` of it to
//! every section. Button handlers read the modifier bits through it, and the
//! sections read flip/global-view/track-channel flags when they build a
//! `ModeContext` for a transition.
//!
//! Everything runs on the host's callback thread, so plain `Cell`s suffice.

use crate::types::VPotMode;
use std::cell::Cell;

/// Modifier key bitmask
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Modifiers {
    bits: u8,
}

impl Modifiers {
    pub const SHIFT: u8 = 0x01;
    pub const OPTION: u8 = 0x02;
    pub const CONTROL: u8 = 0x04;
    pub const ALT: u8 = 0x08;

    pub const fn from_bits(bits: u8) -> Self {
        Self { bits }
    }

    pub const fn bits(self) -> u8 {
        self.bits
    }

    /// Check that every flag in `flags` is held
    ///
    /// `flags` may combine several modifiers, e.g. `SHIFT | OPTION`.
    pub fn is_set(self, flags: u8) -> bool {
        flags != 0 && self.bits & flags == flags
    }

    pub fn is_shift(self) -> bool {
        self.is_set(Self::SHIFT)
    }

    pub fn is_option(self) -> bool {
        self.is_set(Self::OPTION)
    }

    pub fn is_control(self) -> bool {
        self.is_set(Self::CONTROL)
    }

    pub fn is_alt(self) -> bool {
        self.is_set(Self::ALT)
    }

    /// True if any modifier is held
    pub fn any(self) -> bool {
        self.bits != 0
    }

    fn with(self, flag: u8, held: bool) -> Self {
        if held {
            Self::from_bits(self.bits | flag)
        } else {
            Self::from_bits(self.bits & !flag)
        }
    }
}

/// State shared between all sections of a surface
#[derive(Debug, Default)]
pub struct SharedSurfaceState {
    /// Faders and encoders exchange parameter families
    flipped: Cell<bool>,
    /// Mixer layers follow the global track bank instead of the main one
    global_view: Cell<bool>,
    /// SEND on the main section shows the cursor track's sends
    track_channel_mode: Cell<bool>,
    /// Currently selected V-Pot mode
    vpot_mode: Cell<VPotMode>,
    /// Held modifier keys
    modifiers: Cell<Modifiers>,
    /// First send shown by the send mixer layers
    send_index: Cell<usize>,
}

impl SharedSurfaceState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_flipped(&self) -> bool {
        self.flipped.get()
    }

    pub fn set_flipped(&self, flipped: bool) {
        self.flipped.set(flipped);
    }

    pub fn is_global_view(&self) -> bool {
        self.global_view.get()
    }

    pub fn set_global_view(&self, global_view: bool) {
        self.global_view.set(global_view);
    }

    pub fn is_track_channel_mode(&self) -> bool {
        self.track_channel_mode.get()
    }

    pub fn set_track_channel_mode(&self, enabled: bool) {
        self.track_channel_mode.set(enabled);
    }

    pub fn vpot_mode(&self) -> VPotMode {
        self.vpot_mode.get()
    }

    pub fn set_vpot_mode(&self, mode: VPotMode) {
        self.vpot_mode.set(mode);
    }

    pub fn modifiers(&self) -> Modifiers {
        self.modifiers.get()
    }

    /// Update one modifier key and return the resulting mask
    pub fn set_modifier(&self, flag: u8, held: bool) -> Modifiers {
        let next = self.modifiers.get().with(flag, held);
        self.modifiers.set(next);
        next
    }

    pub fn send_index(&self) -> usize {
        self.send_index.get()
    }

    /// Scroll the send mixer window, saturating at the first and last send
    pub fn scroll_send_index(&self, direction: i32, send_count: usize) -> usize {
        let last = send_count.saturating_sub(1);
        let current = self.send_index.get().min(last);
        let next = if direction < 0 {
            current.saturating_sub(1)
        } else if direction > 0 {
            (current + 1).min(last)
        } else {
            current
        };
        self.send_index.set(next);
        next
    }
}

/// Immutable snapshot of every flag a role accessor may depend on
///
/// Built once per transition by the section and passed into each
/// configuration accessor, so a single recomputation sees consistent flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ModeContext {
    pub flipped: bool,
    pub global_view: bool,
    pub menu_hold: bool,
    pub touched: bool,
    pub modifiers: Modifiers,
}

impl ModeContext {
    /// Display slot shown on the LCD
    ///
    /// Untouched, the display follows the encoders (slot 0); touching a
    /// fader shows the fader family (slot 1). Flip inverts both cases.
    pub fn display_row(&self) -> usize {
        if self.flipped != self.touched {
            1
        } else {
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_modifier_bitmask() {
        let state = SharedSurfaceState::new();
        assert!(!state.modifiers().any());

        state.set_modifier(Modifiers::SHIFT, true);
        let mods = state.set_modifier(Modifiers::OPTION, true);
        assert!(mods.is_shift());
        assert!(mods.is_option());
        assert!(mods.is_set(Modifiers::SHIFT | Modifiers::OPTION));
        assert!(!mods.is_set(Modifiers::SHIFT | Modifiers::ALT));
        assert!(!mods.is_set(0));

        let mods = state.set_modifier(Modifiers::SHIFT, false);
        assert!(!mods.is_shift());
        assert!(mods.is_option());
    }

    #[test]
    fn test_send_index_saturates() {
        let state = SharedSurfaceState::new();
        assert_eq!(state.scroll_send_index(-1, 3), 0);
        assert_eq!(state.scroll_send_index(1, 3), 1);
        assert_eq!(state.scroll_send_index(1, 3), 2);
        assert_eq!(state.scroll_send_index(1, 3), 2);
        assert_eq!(state.scroll_send_index(-1, 3), 1);

        // Fewer sends than the current index pulls the window back
        assert_eq!(state.scroll_send_index(0, 1), 0);
        assert_eq!(state.scroll_send_index(1, 0), 0);
    }

    #[test]
    fn test_display_row_selection() {
        let mut ctx = ModeContext::default();
        assert_eq!(ctx.display_row(), 0);
        ctx.touched = true;
        assert_eq!(ctx.display_row(), 1);
        ctx.flipped = true;
        assert_eq!(ctx.display_row(), 0);
        ctx.touched = false;
        assert_eq!(ctx.display_row(), 1);
    }
}
