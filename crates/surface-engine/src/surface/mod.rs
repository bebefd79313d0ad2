//! Hardware model of one surface section
//!
//! Every physical control has a slot. Input controls hold at most one
//! handler (installed by the binding that currently owns the control);
//! output controls hold a value supplier plus the value last written to the
//! hardware model. The transport feeds `SurfaceInput`s in and drains
//! feedback out through `flush`.
//!
//! Handlers are shared closures over host objects. They never reach back
//! into the engine directly; if they need a state change they post a
//! `SurfaceEvent` instead.

pub mod display;
pub mod feedback;

pub use display::{DisplayContent, DisplayHandle, LcdDisplay, TextSource};
pub use feedback::{motor_position, FeedbackChangeTracker, SurfaceOutput};

use crate::types::{ChannelButton, ControlId, RingDisplayType};
use std::collections::HashMap;
use std::rc::Rc;

/// Receives relative encoder steps (positive = clockwise)
pub type DeltaHandler = Rc<dyn Fn(i32)>;
/// Receives a button press
pub type ActionHandler = Rc<dyn Fn()>;
/// Receives an absolute fader position (0.0-1.0)
pub type PositionHandler = Rc<dyn Fn(f64)>;
/// Supplies a normalized output value (0.0-1.0)
pub type ValueSupplier = Rc<dyn Fn() -> f64>;
/// Supplies an on/off output value
pub type BoolSupplier = Rc<dyn Fn() -> bool>;

/// Input event from the hardware, already decoded from the wire format
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SurfaceInput {
    EncoderTurn { index: usize, delta: i32 },
    EncoderPress { index: usize, pressed: bool },
    FaderMove { index: usize, position: f64 },
    FaderTouch { index: usize, touched: bool },
    Button { button: ChannelButton, index: usize, pressed: bool },
}

#[derive(Default)]
struct EncoderSlot {
    turn: Option<DeltaHandler>,
    press: Option<ActionHandler>,
}

#[derive(Default)]
struct RingSlot {
    supplier: Option<(ValueSupplier, RingDisplayType)>,
    value: u8,
}

#[derive(Default)]
struct FaderSlot {
    on_move: Option<PositionHandler>,
    motor: Option<ValueSupplier>,
    position: f64,
    touch: Option<ActionHandler>,
    touched: bool,
}

#[derive(Default)]
struct ButtonSlot {
    action: Option<ActionHandler>,
    led_supplier: Option<BoolSupplier>,
    led: bool,
}

/// Hardware state of one section (encoders, rings, faders, buttons, LCD)
pub struct Surface {
    section_index: usize,
    channels: usize,
    encoders: Vec<EncoderSlot>,
    rings: Vec<RingSlot>,
    faders: Vec<FaderSlot>,
    buttons: HashMap<(ChannelButton, usize), ButtonSlot>,
    display: LcdDisplay,
    change_tracker: FeedbackChangeTracker,
}

impl Surface {
    pub fn new(section_index: usize, channels: usize) -> Self {
        let mut buttons = HashMap::new();
        for index in 0..channels {
            for button in ChannelButton::ALL {
                buttons.insert((button, index), ButtonSlot::default());
            }
        }
        Self {
            section_index,
            channels,
            encoders: (0..channels).map(|_| EncoderSlot::default()).collect(),
            rings: (0..channels).map(|_| RingSlot::default()).collect(),
            faders: (0..channels).map(|_| FaderSlot::default()).collect(),
            buttons,
            display: LcdDisplay::new(),
            change_tracker: FeedbackChangeTracker::new(),
        }
    }

    pub fn section_index(&self) -> usize {
        self.section_index
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    // === Slot installation (used by bindings) ===

    pub(crate) fn set_turn_handler(&mut self, index: usize, handler: Option<DeltaHandler>) {
        if let Some(slot) = self.encoders.get_mut(index) {
            slot.turn = handler;
        }
    }

    /// Install the press handler of an encoder push, fader touch or button
    pub(crate) fn set_action(&mut self, control: ControlId, action: Option<ActionHandler>) {
        match control {
            ControlId::EncoderPress(index) => {
                if let Some(slot) = self.encoders.get_mut(index) {
                    slot.press = action;
                }
            }
            ControlId::FaderTouch(index) => {
                if let Some(slot) = self.faders.get_mut(index) {
                    slot.touch = action;
                }
            }
            ControlId::Button(button, index) => {
                if let Some(slot) = self.buttons.get_mut(&(button, index)) {
                    slot.action = action;
                }
            }
            other => log::warn!("Surface: {:?} cannot carry an action", other),
        }
    }

    pub(crate) fn set_move_handler(&mut self, index: usize, handler: Option<PositionHandler>) {
        if let Some(slot) = self.faders.get_mut(index) {
            slot.on_move = handler;
        }
    }

    /// Install a motor supplier; a new supplier moves the motor right away
    pub(crate) fn set_motor_supplier(&mut self, index: usize, supplier: Option<ValueSupplier>) {
        if let Some(slot) = self.faders.get_mut(index) {
            if let Some(supplier) = &supplier {
                slot.position = supplier().clamp(0.0, 1.0);
            }
            slot.motor = supplier;
        }
    }

    /// Install a ring supplier; clearing it turns the ring off
    pub(crate) fn set_ring_supplier(
        &mut self,
        index: usize,
        supplier: Option<(ValueSupplier, RingDisplayType)>,
    ) {
        if let Some(slot) = self.rings.get_mut(index) {
            slot.value = match &supplier {
                Some((value, ring_type)) => ring_type.encode(value()),
                None => 0,
            };
            slot.supplier = supplier;
        }
    }

    /// Install an LED supplier; clearing it switches the LED off
    pub(crate) fn set_led_supplier(
        &mut self,
        button: ChannelButton,
        index: usize,
        supplier: Option<BoolSupplier>,
    ) {
        if let Some(slot) = self.buttons.get_mut(&(button, index)) {
            slot.led = supplier.as_ref().map(|s| s()).unwrap_or(false);
            slot.led_supplier = supplier;
        }
    }

    pub(crate) fn attach_display(&mut self, content: Option<DisplayHandle>) {
        match content {
            Some(content) => self.display.attach(content),
            None => self.display.detach(),
        }
    }

    // === Queries ===

    /// Whether something currently owns `control`
    pub fn is_bound(&self, control: ControlId) -> bool {
        match control {
            ControlId::Encoder(i) => self.encoders.get(i).is_some_and(|s| s.turn.is_some()),
            ControlId::EncoderPress(i) => self.encoders.get(i).is_some_and(|s| s.press.is_some()),
            ControlId::Ring(i) => self.rings.get(i).is_some_and(|s| s.supplier.is_some()),
            ControlId::Fader(i) => self.faders.get(i).is_some_and(|s| s.on_move.is_some()),
            ControlId::Motor(i) => self.faders.get(i).is_some_and(|s| s.motor.is_some()),
            ControlId::FaderTouch(i) => self.faders.get(i).is_some_and(|s| s.touch.is_some()),
            ControlId::Button(b, i) => self
                .buttons
                .get(&(b, i))
                .is_some_and(|s| s.action.is_some()),
            ControlId::ButtonLed(b, i) => self
                .buttons
                .get(&(b, i))
                .is_some_and(|s| s.led_supplier.is_some()),
            ControlId::Display => self.display.is_attached(),
        }
    }

    pub fn ring_value(&self, index: usize) -> u8 {
        self.rings.get(index).map(|s| s.value).unwrap_or(0)
    }

    pub fn motor_position(&self, index: usize) -> f64 {
        self.faders.get(index).map(|s| s.position).unwrap_or(0.0)
    }

    pub fn is_fader_touched(&self, index: usize) -> bool {
        self.faders.get(index).is_some_and(|s| s.touched)
    }

    pub fn led(&self, button: ChannelButton, index: usize) -> bool {
        self.buttons.get(&(button, index)).is_some_and(|s| s.led)
    }

    pub fn display(&self) -> &LcdDisplay {
        &self.display
    }

    pub fn display_lines(&self) -> &[String; 2] {
        self.display.lines()
    }

    // === Input ===

    /// Route a hardware input to the handler owning the control
    ///
    /// Returns whether a handler received the event. Handlers are cloned out
    /// of their slot before being called.
    pub fn handle_input(&mut self, input: SurfaceInput) -> bool {
        match input {
            SurfaceInput::EncoderTurn { index, delta } => {
                let handler = self.encoders.get(index).and_then(|s| s.turn.clone());
                match handler {
                    Some(handler) if delta != 0 => {
                        handler(delta);
                        true
                    }
                    _ => false,
                }
            }
            SurfaceInput::EncoderPress { index, pressed } => {
                let handler = self.encoders.get(index).and_then(|s| s.press.clone());
                fire_on_press(handler, pressed)
            }
            SurfaceInput::FaderMove { index, position } => {
                let Some(slot) = self.faders.get_mut(index) else {
                    return false;
                };
                slot.position = position.clamp(0.0, 1.0);
                match slot.on_move.clone() {
                    Some(handler) => {
                        handler(slot.position);
                        true
                    }
                    None => false,
                }
            }
            SurfaceInput::FaderTouch { index, touched } => {
                let Some(slot) = self.faders.get_mut(index) else {
                    return false;
                };
                slot.touched = touched;
                let handler = slot.touch.clone();
                fire_on_press(handler, touched)
            }
            SurfaceInput::Button {
                button,
                index,
                pressed,
            } => {
                let handler = self
                    .buttons
                    .get(&(button, index))
                    .and_then(|s| s.action.clone());
                fire_on_press(handler, pressed)
            }
        }
    }

    // === Output ===

    /// Re-evaluate all suppliers and send every value that changed
    pub fn flush(&mut self, out: &mut dyn SurfaceOutput) {
        let section = self.section_index;

        for (index, slot) in self.rings.iter_mut().enumerate() {
            if let Some((supplier, ring_type)) = &slot.supplier {
                slot.value = ring_type.encode(supplier());
            }
            if let Some(value) = self
                .change_tracker
                .update(ControlId::Ring(index), slot.value as u16)
            {
                out.send_ring(section, index, value as u8);
            }
        }

        for (index, slot) in self.faders.iter_mut().enumerate() {
            if let Some(supplier) = &slot.motor {
                // A touched fader is under the user's hand; don't fight it
                if !slot.touched {
                    slot.position = supplier().clamp(0.0, 1.0);
                }
            }
            if let Some(position) = self
                .change_tracker
                .update(ControlId::Motor(index), motor_position(slot.position))
            {
                out.send_motor(section, index, position);
            }
        }

        let mut buttons: Vec<_> = self.buttons.iter_mut().collect();
        buttons.sort_by_key(|((button, index), _)| (*index, *button as u8));
        for ((button, index), slot) in buttons {
            if let Some(supplier) = &slot.led_supplier {
                slot.led = supplier();
            }
            if self
                .change_tracker
                .update(ControlId::ButtonLed(*button, *index), slot.led as u16)
                .is_some()
            {
                out.send_led(section, *button, *index, slot.led);
            }
        }

        self.display.refresh();
        self.display.flush(section, out);
    }

    /// Forget all sent state so the next flush retransmits everything
    pub fn full_hardware_update(&mut self) {
        log::debug!("Surface[{}]: full hardware update", self.section_index);
        self.change_tracker.clear();
        self.display.reset();
    }
}

fn fire_on_press(handler: Option<ActionHandler>, pressed: bool) -> bool {
    match handler {
        Some(handler) if pressed => {
            handler();
            true
        }
        _ => false,
    }
}
