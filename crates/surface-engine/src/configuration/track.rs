//! Track/device configuration (send-track, cursor device, EQ)
//!
//! Owns its own fader, encoder and display layers bound to a parameter
//! source (cursor-track sends or a device manager's remote controls). The
//! active group's volume layers fill the other half of the flip.
//!
//! The primary display doubles as the status line for device modes: it
//! shows the missing-device text while no device of the mode's kind exists
//! and a hint when the device has no parameter pages.

use super::{MenuConfiguration, NavigateHandler, Navigation};
use crate::binding::{
    parameter_encoder, parameter_fader, parameter_motor, parameter_ring, parameter_touch_reset,
    Binding, ParameterSource,
};
use crate::config::MissingText;
use crate::host::{CursorDevice, DeviceFollower, DeviceManager};
use crate::layer::{DisplayLayer, LayerId, Layers};
use crate::mixer_group::MixerGroupRefs;
use crate::shared_state::{ModeContext, SharedSurfaceState};
use crate::surface::{ActionHandler, TextSource};
use crate::types::{InfoSource, ParamElement, RingDisplayType, VPotMode};
use std::collections::HashMap;
use std::rc::Rc;

/// Default two-line text for a mode whose device is missing
pub fn missing_device_lines(mode: VPotMode) -> [String; 2] {
    let line1 = format!("no {} on track", mode.type_display_name());
    let line2 = match mode.device_name() {
        Some(device) => format!(
            "<< press {} button to insert {} device >>",
            mode.button_description(),
            device
        ),
        None => format!("<< press {} again to browse >>", mode.button_description()),
    };
    [line1, line2]
}

pub struct TrackConfiguration {
    name: String,
    groups: MixerGroupRefs,
    fader: LayerId,
    encoder: LayerId,
    display: DisplayLayer,
    info: DisplayLayer,
    device_manager: Option<Rc<dyn DeviceManager>>,
    cursor_device: Option<Rc<dyn CursorDevice>>,
    menu: Option<MenuConfiguration>,
    missing_text: HashMap<VPotMode, MissingText>,
    navigation: Navigation,
}

impl TrackConfiguration {
    pub fn new(
        name: &str,
        section_index: usize,
        channels: usize,
        groups: MixerGroupRefs,
        layers: &mut Layers,
    ) -> Self {
        let fader = layers.create(format!("{}_FADER_LAYER_{}", name, section_index));
        let encoder = layers.create(format!("{}_ENCODER_LAYER_{}", name, section_index));
        let display = layers.create_display(format!("{}_DISPLAY_{}", name, section_index), channels);
        let info = layers.create_display(format!("{}_INFO_{}", name, section_index), channels);
        info.content.borrow_mut().enable_full_text_mode(true);
        Self {
            name: name.to_string(),
            groups,
            fader,
            encoder,
            display,
            info,
            device_manager: None,
            cursor_device: None,
            menu: None,
            missing_text: HashMap::new(),
            navigation: Navigation::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn navigation(&self) -> &Navigation {
        &self.navigation
    }

    pub fn set_navigate_horizontal(&mut self, handler: NavigateHandler) {
        self.navigation.horizontal = Some(handler);
    }

    pub fn set_navigate_vertical(&mut self, handler: NavigateHandler) {
        self.navigation.vertical = Some(handler);
    }

    /// Per-mode replacements for the generated missing-device text
    pub fn set_missing_text(&mut self, overrides: HashMap<VPotMode, MissingText>) {
        self.missing_text = overrides;
    }

    /// Bind channel `index` to a parameter
    ///
    /// `reset` runs on encoder push. Shift + fader touch resets through the
    /// parameter itself.
    #[allow(clippy::too_many_arguments)]
    pub fn add_binding(
        &self,
        layers: &mut Layers,
        index: usize,
        source: ParameterSource,
        ring_type: RingDisplayType,
        reset: ActionHandler,
        flags: Rc<SharedSurfaceState>,
        encoder_step: f64,
    ) {
        layers.add_binding(self.fader, parameter_fader(index, source.clone()));
        layers.add_binding(self.fader, parameter_motor(index, source.clone()));
        layers.add_binding(self.fader, parameter_touch_reset(index, source.clone(), flags));

        layers.add_binding(self.encoder, parameter_encoder(index, source.clone(), encoder_step));
        layers.add_binding(self.encoder, parameter_ring(index, source.clone(), ring_type));
        layers.add_binding(self.encoder, Binding::encoder_press(index, move || reset()));

        let mut content = self.display.content.borrow_mut();
        let name_source = source.clone();
        content.bind_cell(
            0,
            index,
            TextSource::dynamic(move || {
                name_source()
                    .filter(|parameter| parameter.exists())
                    .map(|parameter| parameter.name())
                    .unwrap_or_default()
            }),
        );
        content.bind_cell(
            1,
            index,
            TextSource::dynamic(move || {
                source()
                    .filter(|parameter| parameter.exists())
                    .map(|parameter| parameter.display_value())
                    .unwrap_or_default()
            }),
        );
    }

    /// Attach the device side; without it the configuration never shows
    /// missing-device text or the info overlay
    pub fn set_device_manager(
        &mut self,
        manager: Rc<dyn DeviceManager>,
        cursor_device: Rc<dyn CursorDevice>,
        menu: Option<MenuConfiguration>,
    ) {
        for row in 0..2 {
            let manager = manager.clone();
            self.info.content.borrow_mut().set_row_text(
                row,
                TextSource::dynamic(move || {
                    let [line1, line2] = manager.info_text();
                    if row == 0 {
                        line1
                    } else {
                        line2
                    }
                }),
            );
        }
        self.device_manager = Some(manager);
        self.cursor_device = Some(cursor_device);
        self.menu = menu;
        self.evaluate_text_display();
    }

    pub fn device_manager(&self) -> Option<Rc<dyn DeviceManager>> {
        self.device_manager.clone()
    }

    pub fn menu(&self) -> Option<&MenuConfiguration> {
        self.menu.as_ref()
    }

    /// Point the device manager at `follower`'s device kind
    pub fn set_current_follower(&mut self, follower: Rc<dyn DeviceFollower>) {
        let Some(manager) = &self.device_manager else {
            log::debug!("TrackConfiguration '{}': no device manager yet", self.name);
            return;
        };
        manager.set_current_follower(follower);
        self.evaluate_text_display();
    }

    /// Choose between parameter cells, missing-device text and the
    /// no-pages hint for the primary display
    pub fn evaluate_text_display(&self) {
        let Some(manager) = &self.device_manager else {
            return;
        };
        let device_name = self
            .cursor_device
            .as_ref()
            .map(|device| device.name())
            .unwrap_or_default();
        if let Some(menu) = &self.menu {
            menu.evaluate_text_display(&device_name);
        }

        let mut content = self.display.content.borrow_mut();
        if !manager.is_specific_device_present() || device_name.is_empty() {
            let mode = manager
                .current_follower()
                .map(|follower| follower.mode())
                .unwrap_or_default();
            let [line1, line2] = match self.missing_text.get(&mode) {
                Some(text) => [text.line1.clone(), text.line2.clone()],
                None => missing_device_lines(mode),
            };
            content.set_main_text(line1, line2);
            content.enable_full_text_mode(true);
        } else if manager.page_count() == 0 {
            content.set_main_text(
                format!("{} has no Parameter Pages", device_name),
                "<< configure Parameter Pages in the host >>",
            );
            content.enable_full_text_mode(true);
        } else {
            content.enable_full_text_mode(false);
        }
    }

    pub fn enable_info(&self, source: InfoSource) -> bool {
        match &self.device_manager {
            Some(manager) => {
                manager.enable_info(source);
                true
            }
            None => false,
        }
    }

    pub fn disable_info(&self) -> bool {
        match &self.device_manager {
            Some(manager) => {
                manager.disable_info();
                true
            }
            None => false,
        }
    }

    fn is_menu_active(&self, ctx: &ModeContext) -> bool {
        ctx.menu_hold && self.menu.is_some()
    }

    pub fn fader_layer(&self, ctx: &ModeContext) -> LayerId {
        if ctx.flipped {
            self.fader
        } else {
            self.groups.active(ctx).fader_layer(ParamElement::Volume)
        }
    }

    pub fn encoder_layer(&self, ctx: &ModeContext) -> LayerId {
        if let Some(menu) = self.menu.as_ref().filter(|_| ctx.menu_hold) {
            return menu.encoder_layer();
        }
        if ctx.flipped {
            self.groups.active(ctx).encoder_layer(ParamElement::Volume)
        } else {
            self.encoder
        }
    }

    pub fn button_layer(&self, ctx: &ModeContext) -> LayerId {
        self.groups.active(ctx).button_layer()
    }

    pub fn display_layer(&self, row: usize, ctx: &ModeContext) -> LayerId {
        if let Some(menu) = self.menu.as_ref().filter(|_| self.is_menu_active(ctx)) {
            return menu.display_layer();
        }
        if self
            .device_manager
            .as_ref()
            .is_some_and(|manager| manager.info_source().is_some())
        {
            return self.info.id;
        }
        if row == 0 {
            self.display.id
        } else {
            self.groups.active(ctx).display_layer(ParamElement::Volume)
        }
    }

    /// Primary display content (parameter cells or status text)
    pub fn display(&self) -> &DisplayLayer {
        &self.display
    }

    pub fn info_layer(&self) -> &DisplayLayer {
        &self.info
    }
}
