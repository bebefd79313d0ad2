//! Device menu shown while the menu button is held
//!
//! Takes over the encoders and the display of a device configuration and
//! offers device-level actions on fixed encoder pushes:
//!
//! | slot | action |
//! |------|--------|
//! | 0 | enable/bypass (ring shows the state) |
//! | 1 | pin the cursor device |
//! | 2 | move the device left |
//! | 3 | move the device right |
//! | 4 | remove the device |
//! | 7 | browse for a device to insert |

use crate::binding::Binding;
use crate::controller::SurfaceEvent;
use crate::host::CursorDevice;
use crate::layer::{DisplayLayer, LayerId, Layers};
use crate::surface::TextSource;
use crate::types::RingDisplayType;
use flume::Sender;
use std::rc::Rc;

/// Labels of the lower display row, one per slot
const SLOT_LABELS: [&str; 8] = ["Enable", "Pin", "<Move", "Move>", "REMOVE", "", "", "Browse"];

pub struct MenuConfiguration {
    name: String,
    encoder: LayerId,
    display: DisplayLayer,
}

impl MenuConfiguration {
    pub fn new(name: &str, section_index: usize, channels: usize, layers: &mut Layers) -> Self {
        let encoder = layers.create(format!("{}_ENCODER_{}", name, section_index));
        let display = layers.create_display(format!("{}_DISPLAY_{}", name, section_index), channels);
        {
            let mut content = display.content.borrow_mut();
            for (index, label) in SLOT_LABELS.iter().enumerate() {
                content.bind_cell(1, index, TextSource::fixed(*label));
            }
            content.set_row_text(0, TextSource::fixed("no device selected"));
            content.enable_row_full_text(0, true);
        }
        Self {
            name: name.to_string(),
            encoder,
            display,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Bind the menu actions to `cursor_device`
    ///
    /// Browsing is requested through `events` so the section can arm its
    /// browser before the host opens it.
    pub fn init(
        &self,
        layers: &mut Layers,
        cursor_device: Rc<dyn CursorDevice>,
        events: Sender<SurfaceEvent>,
        channels: usize,
    ) {
        let id = self.encoder;

        let device = cursor_device.clone();
        layers.add_binding(id, Binding::encoder_press(0, move || device.toggle_enabled()));
        let device = cursor_device.clone();
        layers.add_binding(
            id,
            Binding::ring(0, RingDisplayType::FillFromZero, move || {
                if device.exists() && device.is_enabled() {
                    1.0
                } else {
                    0.0
                }
            }),
        );

        let device = cursor_device.clone();
        layers.add_binding(id, Binding::encoder_press(1, move || device.toggle_pinned()));
        let device = cursor_device.clone();
        layers.add_binding(id, Binding::encoder_press(2, move || device.move_left()));
        let device = cursor_device.clone();
        layers.add_binding(id, Binding::encoder_press(3, move || device.move_right()));
        let device = cursor_device;
        layers.add_binding(id, Binding::encoder_press(4, move || device.delete()));
        layers.add_binding(
            id,
            Binding::encoder_press(7, move || {
                if events.send(SurfaceEvent::BrowseDevice).is_err() {
                    log::warn!("MenuConfiguration: event queue closed, browse request dropped");
                }
            }),
        );

        // Unused rings stay dark while the menu is up
        for index in 1..channels {
            layers.add_binding(id, Binding::ring(index, RingDisplayType::FillFromZero, || 0.0));
        }
    }

    /// Update the header line for the focused device
    pub fn evaluate_text_display(&self, device_name: &str) {
        let text = if device_name.is_empty() {
            "no device selected".to_string()
        } else {
            format!("Device: {}", device_name)
        };
        self.display
            .content
            .borrow_mut()
            .set_row_text(0, TextSource::Fixed(text));
    }

    pub fn encoder_layer(&self) -> LayerId {
        self.encoder
    }

    pub fn display_layer(&self) -> LayerId {
        self.display.id
    }
}
