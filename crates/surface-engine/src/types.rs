//! Control identifiers and mode enums shared across the engine
//!
//! These types name physical controls independently of the MIDI bytes that
//! address them, so layers, bindings and the ownership checks can reason
//! about "encoder 3" or "the LCD" without knowing the transport.

use serde::{Deserialize, Serialize};

/// Buttons found on every channel strip
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelButton {
    RecArm,
    Solo,
    Mute,
    Select,
}

impl ChannelButton {
    /// All channel buttons in strip order (top to bottom)
    pub const ALL: [ChannelButton; 4] = [
        ChannelButton::RecArm,
        ChannelButton::Solo,
        ChannelButton::Mute,
        ChannelButton::Select,
    ];
}

/// Physical control element of one surface section
///
/// Input and output sides of the same piece of hardware are distinct
/// controls: a fader's position input (`Fader`) and its motor (`Motor`) can
/// be bound independently, as can a button and its LED.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlId {
    /// Relative rotary encoder (turn events)
    Encoder(usize),
    /// Push switch of a rotary encoder
    EncoderPress(usize),
    /// LED ring around a rotary encoder
    Ring(usize),
    /// Fader position input
    Fader(usize),
    /// Fader motor output
    Motor(usize),
    /// Capacitive touch sensor on a fader knob
    FaderTouch(usize),
    /// Channel strip button
    Button(ChannelButton, usize),
    /// LED of a channel strip button
    ButtonLed(ChannelButton, usize),
    /// Two-line text display of the section
    Display,
}

/// Physical role a layer can own
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Fader,
    Encoder,
    Button,
    Display,
}

/// Kind of surface section
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionType {
    /// Main unit (transport, mode buttons, browser access)
    #[default]
    Main,
    /// Extender unit (channel strips only)
    Extender,
}

/// Encoder assignment mode selected by the V-Pot mode buttons
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VPotMode {
    #[default]
    Pan,
    Send,
    Eq,
    Instrument,
    MidiEffect,
    Plugin,
}

impl VPotMode {
    pub const ALL: [VPotMode; 6] = [
        VPotMode::Pan,
        VPotMode::Send,
        VPotMode::Eq,
        VPotMode::Instrument,
        VPotMode::MidiEffect,
        VPotMode::Plugin,
    ];

    /// Whether this mode edits parameters of a device on the cursor track
    pub fn is_device_mode(self) -> bool {
        matches!(
            self,
            VPotMode::Eq | VPotMode::Instrument | VPotMode::MidiEffect | VPotMode::Plugin
        )
    }

    /// Name of the device kind shown in "no ... on track" messages
    pub fn type_display_name(self) -> &'static str {
        match self {
            VPotMode::Pan => "panning",
            VPotMode::Send => "sends",
            VPotMode::Eq => "EQ+ device",
            VPotMode::Instrument => "instrument",
            VPotMode::MidiEffect => "note effect",
            VPotMode::Plugin => "audio effect",
        }
    }

    /// Label of the hardware button that selects this mode
    pub fn button_description(self) -> &'static str {
        match self {
            VPotMode::Pan => "PAN",
            VPotMode::Send => "SEND",
            VPotMode::Eq => "EQ",
            VPotMode::Instrument => "INSTRUMENT",
            VPotMode::MidiEffect => "MIDI FX",
            VPotMode::Plugin => "PLUG-IN",
        }
    }

    /// Device the surface inserts itself when the mode's device is missing
    pub fn device_name(self) -> Option<&'static str> {
        match self {
            VPotMode::Eq => Some("EQ+"),
            _ => None,
        }
    }
}

/// Parameter family a mixer layer binds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamElement {
    Volume,
    Pan,
    SendMixer,
}

impl ParamElement {
    pub const ALL: [ParamElement; 3] = [
        ParamElement::Volume,
        ParamElement::Pan,
        ParamElement::SendMixer,
    ];

    pub(crate) fn index(self) -> usize {
        match self {
            ParamElement::Volume => 0,
            ParamElement::Pan => 1,
            ParamElement::SendMixer => 2,
        }
    }

    /// Ring pattern that suits this parameter family
    pub fn ring_type(self) -> RingDisplayType {
        match self {
            ParamElement::Volume => RingDisplayType::Fill,
            ParamElement::Pan => RingDisplayType::Pan,
            ParamElement::SendMixer => RingDisplayType::Fill,
        }
    }

    /// Short label used in layer names
    pub fn label(self) -> &'static str {
        match self {
            ParamElement::Volume => "VOLUME",
            ParamElement::Pan => "PAN",
            ParamElement::SendMixer => "SEND",
        }
    }
}

/// Source of a transient info overlay on the display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InfoSource {
    NavHorizontal,
    NavVertical,
}

/// Number of LEDs on an encoder ring
pub const RING_LED_COUNT: u8 = 11;

/// LED ring display pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RingDisplayType {
    /// Single dot travelling around the ring
    Pan,
    /// Bar filling from the left, first LED always lit
    Fill,
    /// Bar filling from the left, all LEDs off at zero
    FillFromZero,
    /// Bar growing out from the center (boost/cut)
    Boost,
    /// Symmetric spread from the center (width)
    Spread,
}

impl RingDisplayType {
    /// Encode a normalized value (0.0-1.0) as a ring byte
    ///
    /// The high nibble selects the pattern, the low nibble the position
    /// (1-11). A byte of 0 means "all LEDs off", the neutral ring state.
    pub fn encode(self, value: f64) -> u8 {
        let v = value.clamp(0.0, 1.0);
        let span = (RING_LED_COUNT - 1) as f64;
        match self {
            RingDisplayType::Pan => 1 + (v * span).round() as u8,
            RingDisplayType::Boost => 0x10 | (1 + (v * span).round() as u8),
            RingDisplayType::Fill => 0x20 | (1 + (v * span).round() as u8),
            RingDisplayType::FillFromZero => {
                let position = (v * RING_LED_COUNT as f64).round() as u8;
                if position == 0 {
                    0
                } else {
                    0x20 | position
                }
            }
            RingDisplayType::Spread => 0x30 | (1 + (v * 5.0).round() as u8),
        }
    }
}
