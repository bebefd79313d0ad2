//! Bindings: one control wired to one target
//!
//! A binding is inert until activated. Activation installs its handler or
//! supplier into the control's slot on the `Surface`; deactivation clears the
//! slot and leaves the hardware in its neutral state. Both directions check
//! the binding's own flag first, so repeating either call does nothing.

use crate::host::Parameter;
use crate::shared_state::SharedSurfaceState;
use crate::surface::{
    ActionHandler, BoolSupplier, DeltaHandler, DisplayHandle, PositionHandler, Surface,
    ValueSupplier,
};
use crate::types::{ChannelButton, ControlId, RingDisplayType};
use std::fmt;
use std::rc::Rc;

/// Resolves the parameter a binding acts on at the time of use
///
/// Returning `None` (an empty send slot, say) turns input into a no-op and
/// output into the neutral value.
pub type ParameterSource = Rc<dyn Fn() -> Option<Rc<dyn Parameter>>>;

/// Wrap a fixed parameter as a source
pub fn fixed_parameter(parameter: Rc<dyn Parameter>) -> ParameterSource {
    Rc::new(move || Some(parameter.clone()))
}

/// What a binding installs when active
#[derive(Clone)]
pub enum BindingTarget {
    /// Relative steps of encoder `index`
    EncoderTurn { index: usize, handler: DeltaHandler },
    /// Press of an encoder push, fader touch or channel button
    Action { control: ControlId, action: ActionHandler },
    /// Absolute position of fader `index`
    FaderMove { index: usize, handler: PositionHandler },
    /// Motor of fader `index` follows the supplier
    MotorPosition { index: usize, supplier: ValueSupplier },
    /// LED ring of encoder `index`
    Ring {
        index: usize,
        supplier: ValueSupplier,
        ring_type: RingDisplayType,
    },
    /// LED of a channel button
    Led {
        button: ChannelButton,
        index: usize,
        supplier: BoolSupplier,
    },
    /// LCD content
    Display { content: DisplayHandle },
}

impl BindingTarget {
    /// Control this target occupies
    pub fn control(&self) -> ControlId {
        match self {
            BindingTarget::EncoderTurn { index, .. } => ControlId::Encoder(*index),
            BindingTarget::Action { control, .. } => *control,
            BindingTarget::FaderMove { index, .. } => ControlId::Fader(*index),
            BindingTarget::MotorPosition { index, .. } => ControlId::Motor(*index),
            BindingTarget::Ring { index, .. } => ControlId::Ring(*index),
            BindingTarget::Led { button, index, .. } => ControlId::ButtonLed(*button, *index),
            BindingTarget::Display { .. } => ControlId::Display,
        }
    }
}

impl fmt::Debug for BindingTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.control())
    }
}

/// A single control-to-target wiring
#[derive(Debug, Clone)]
pub struct Binding {
    target: BindingTarget,
    active: bool,
}

impl Binding {
    pub fn new(target: BindingTarget) -> Self {
        Self {
            target,
            active: false,
        }
    }

    pub fn encoder_turn(index: usize, handler: impl Fn(i32) + 'static) -> Self {
        Self::new(BindingTarget::EncoderTurn {
            index,
            handler: Rc::new(handler),
        })
    }

    /// Press action on an encoder push, fader touch or channel button
    pub fn action(control: ControlId, action: impl Fn() + 'static) -> Self {
        Self::new(BindingTarget::Action {
            control,
            action: Rc::new(action),
        })
    }

    pub fn encoder_press(index: usize, action: impl Fn() + 'static) -> Self {
        Self::action(ControlId::EncoderPress(index), action)
    }

    pub fn fader_touch(index: usize, action: impl Fn() + 'static) -> Self {
        Self::action(ControlId::FaderTouch(index), action)
    }

    pub fn button(button: ChannelButton, index: usize, action: impl Fn() + 'static) -> Self {
        Self::action(ControlId::Button(button, index), action)
    }

    pub fn fader_move(index: usize, handler: impl Fn(f64) + 'static) -> Self {
        Self::new(BindingTarget::FaderMove {
            index,
            handler: Rc::new(handler),
        })
    }

    pub fn motor(index: usize, supplier: impl Fn() -> f64 + 'static) -> Self {
        Self::new(BindingTarget::MotorPosition {
            index,
            supplier: Rc::new(supplier),
        })
    }

    pub fn ring(
        index: usize,
        ring_type: RingDisplayType,
        supplier: impl Fn() -> f64 + 'static,
    ) -> Self {
        Self::new(BindingTarget::Ring {
            index,
            supplier: Rc::new(supplier),
            ring_type,
        })
    }

    pub fn led(button: ChannelButton, index: usize, supplier: impl Fn() -> bool + 'static) -> Self {
        Self::new(BindingTarget::Led {
            button,
            index,
            supplier: Rc::new(supplier),
        })
    }

    pub fn display(content: DisplayHandle) -> Self {
        Self::new(BindingTarget::Display { content })
    }

    /// Control this binding occupies while active
    pub fn source(&self) -> ControlId {
        self.target.control()
    }

    pub fn target(&self) -> &BindingTarget {
        &self.target
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Install the target into its control slot
    pub fn activate(&mut self, surface: &mut Surface) {
        if self.active {
            return;
        }
        self.active = true;
        match &self.target {
            BindingTarget::EncoderTurn { index, handler } => {
                surface.set_turn_handler(*index, Some(handler.clone()))
            }
            BindingTarget::Action { control, action } => {
                surface.set_action(*control, Some(action.clone()))
            }
            BindingTarget::FaderMove { index, handler } => {
                surface.set_move_handler(*index, Some(handler.clone()))
            }
            BindingTarget::MotorPosition { index, supplier } => {
                surface.set_motor_supplier(*index, Some(supplier.clone()))
            }
            BindingTarget::Ring {
                index,
                supplier,
                ring_type,
            } => surface.set_ring_supplier(*index, Some((supplier.clone(), *ring_type))),
            BindingTarget::Led {
                button,
                index,
                supplier,
            } => surface.set_led_supplier(*button, *index, Some(supplier.clone())),
            BindingTarget::Display { content } => surface.attach_display(Some(content.clone())),
        }
    }

    /// Clear the control slot, leaving the output neutral
    pub fn deactivate(&mut self, surface: &mut Surface) {
        if !self.active {
            return;
        }
        self.active = false;
        match &self.target {
            BindingTarget::EncoderTurn { index, .. } => surface.set_turn_handler(*index, None),
            BindingTarget::Action { control, .. } => surface.set_action(*control, None),
            BindingTarget::FaderMove { index, .. } => surface.set_move_handler(*index, None),
            BindingTarget::MotorPosition { index, .. } => surface.set_motor_supplier(*index, None),
            BindingTarget::Ring { index, .. } => surface.set_ring_supplier(*index, None),
            BindingTarget::Led { button, index, .. } => {
                surface.set_led_supplier(*button, *index, None)
            }
            BindingTarget::Display { .. } => surface.attach_display(None),
        }
    }
}

// === Parameter bindings ===
//
// Shared wiring for anything that edits a host parameter from a fader or an
// encoder. The source is resolved on every event, so bindings survive the
// host swapping the object behind a slot.

pub(crate) fn parameter_encoder(index: usize, source: ParameterSource, step: f64) -> Binding {
    Binding::encoder_turn(index, move |delta| {
        if let Some(parameter) = source() {
            parameter.increment(delta as f64 * step);
        }
    })
}

pub(crate) fn parameter_ring(
    index: usize,
    source: ParameterSource,
    ring_type: RingDisplayType,
) -> Binding {
    Binding::ring(index, ring_type, move || parameter_value(&source))
}

/// Encoder push resets the parameter
pub(crate) fn parameter_press_reset(index: usize, source: ParameterSource) -> Binding {
    Binding::encoder_press(index, move || {
        if let Some(parameter) = source() {
            parameter.reset();
        }
    })
}

pub(crate) fn parameter_fader(index: usize, source: ParameterSource) -> Binding {
    Binding::fader_move(index, move |position| {
        if let Some(parameter) = source() {
            parameter.set_value(position);
        }
    })
}

pub(crate) fn parameter_motor(index: usize, source: ParameterSource) -> Binding {
    Binding::motor(index, move || parameter_value(&source))
}

/// Touching the fader with shift held resets the parameter
pub(crate) fn parameter_touch_reset(
    index: usize,
    source: ParameterSource,
    flags: Rc<SharedSurfaceState>,
) -> Binding {
    Binding::fader_touch(index, move || {
        if flags.modifiers().is_shift() {
            if let Some(parameter) = source() {
                parameter.reset();
            }
        }
    })
}

fn parameter_value(source: &ParameterSource) -> f64 {
    source()
        .filter(|parameter| parameter.exists())
        .map(|parameter| parameter.value())
        .unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::{DisplayContent, SurfaceInput};
    use crate::testing::MockParameter;
    use std::cell::Cell;

    /// Observable state of every slot a binding can touch
    fn snapshot(surface: &Surface, control: ControlId) -> (bool, u8, f64, bool, [String; 2]) {
        let (ring, motor, led) = match control {
            ControlId::Ring(i) => (surface.ring_value(i), 0.0, false),
            ControlId::Motor(i) => (0, surface.motor_position(i), false),
            ControlId::ButtonLed(b, i) => (0, 0.0, surface.led(b, i)),
            _ => (0, 0.0, false),
        };
        (
            surface.is_bound(control),
            ring,
            motor,
            led,
            surface.display_lines().clone(),
        )
    }

    fn all_targets() -> Vec<Binding> {
        let content = DisplayContent::shared("test", 8);
        content.borrow_mut().set_main_text("hello", "world");
        content.borrow_mut().enable_full_text_mode(true);
        vec![
            Binding::encoder_turn(0, |_| {}),
            Binding::encoder_press(1, || {}),
            Binding::fader_touch(2, || {}),
            Binding::button(ChannelButton::Solo, 3, || {}),
            Binding::fader_move(4, |_| {}),
            Binding::ring(5, RingDisplayType::Fill, || 0.7),
            Binding::led(ChannelButton::Mute, 6, || true),
            Binding::display(content),
        ]
    }

    #[test]
    fn test_activation_is_idempotent() {
        for mut binding in all_targets() {
            let control = binding.source();

            let mut once = Surface::new(0, 8);
            binding.activate(&mut once);
            let after_once = snapshot(&once, control);

            let mut binding_twice = binding.clone();
            binding_twice.deactivate(&mut Surface::new(0, 8));
            let mut twice = Surface::new(0, 8);
            binding_twice.activate(&mut twice);
            binding_twice.activate(&mut twice);
            assert_eq!(snapshot(&twice, control), after_once, "{:?}", control);

            binding_twice.deactivate(&mut twice);
            let after_deactivate = snapshot(&twice, control);
            binding_twice.deactivate(&mut twice);
            assert_eq!(snapshot(&twice, control), after_deactivate, "{:?}", control);
        }
    }

    #[test]
    fn test_round_trip_restores_neutral_state() {
        for mut binding in all_targets() {
            let control = binding.source();
            let mut surface = Surface::new(0, 8);
            let before = snapshot(&surface, control);

            binding.activate(&mut surface);
            assert!(surface.is_bound(control), "{:?} not bound", control);
            binding.deactivate(&mut surface);

            assert_eq!(snapshot(&surface, control), before, "{:?}", control);
            assert!(!binding.is_active());
        }
    }

    #[test]
    fn test_motor_keeps_position_after_deactivate() {
        let mut surface = Surface::new(0, 8);
        let mut binding = Binding::motor(0, || 0.5);
        binding.activate(&mut surface);
        assert!(surface.is_bound(ControlId::Motor(0)));
        assert_eq!(surface.motor_position(0), 0.5);

        binding.deactivate(&mut surface);
        assert!(!surface.is_bound(ControlId::Motor(0)));
        assert_eq!(surface.motor_position(0), 0.5);
    }

    #[test]
    fn test_output_written_on_activate() {
        let mut surface = Surface::new(0, 8);
        let mut ring = Binding::ring(2, RingDisplayType::Pan, || 0.5);
        ring.activate(&mut surface);
        assert_eq!(surface.ring_value(2), 0x06);

        let mut led = Binding::led(ChannelButton::RecArm, 1, || true);
        led.activate(&mut surface);
        assert!(surface.led(ChannelButton::RecArm, 1));
    }

    #[test]
    fn test_parameter_encoder_and_reset() {
        let parameter = MockParameter::new("Vol", 0.5);
        let source = fixed_parameter(parameter.clone());
        let flags = Rc::new(SharedSurfaceState::new());
        let mut surface = Surface::new(0, 8);

        let mut bindings = vec![
            parameter_encoder(0, source.clone(), 0.01),
            parameter_touch_reset(0, source.clone(), flags.clone()),
            parameter_fader(0, source.clone()),
        ];
        for binding in &mut bindings {
            binding.activate(&mut surface);
        }

        surface.handle_input(SurfaceInput::EncoderTurn { index: 0, delta: 10 });
        assert!((parameter.value() - 0.6).abs() < 1e-9);

        surface.handle_input(SurfaceInput::FaderMove { index: 0, position: 0.2 });
        assert!((parameter.value() - 0.2).abs() < 1e-9);

        // Touch without shift leaves the value alone
        surface.handle_input(SurfaceInput::FaderTouch { index: 0, touched: true });
        assert!((parameter.value() - 0.2).abs() < 1e-9);

        flags.set_modifier(crate::shared_state::Modifiers::SHIFT, true);
        surface.handle_input(SurfaceInput::FaderTouch { index: 0, touched: true });
        assert_eq!(parameter.reset_count(), 1);
    }

    #[test]
    fn test_empty_source_is_noop() {
        let calls = Rc::new(Cell::new(0));
        let c = calls.clone();
        let source: ParameterSource = Rc::new(move || {
            c.set(c.get() + 1);
            None
        });
        let mut surface = Surface::new(0, 8);
        let mut ring = parameter_ring(0, source.clone(), RingDisplayType::FillFromZero);
        let mut encoder = parameter_encoder(0, source, 0.01);
        ring.activate(&mut surface);
        encoder.activate(&mut surface);

        assert_eq!(surface.ring_value(0), 0);
        surface.handle_input(SurfaceInput::EncoderTurn { index: 0, delta: 1 });
        assert_eq!(calls.get(), 2);
    }
}
