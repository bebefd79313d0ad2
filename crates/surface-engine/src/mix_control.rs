//! Per-section mode state machine
//!
//! A `MixControl` owns everything of one physical section: the hardware
//! model, the layer arena, the configuration table and the flags only this
//! section has (fader touch, menu hold). Shared flags (flip, global view,
//! V-Pot mode, modifiers) are read through `SharedSurfaceState`.
//!
//! Every transition ends in `update_state` (all roles) or
//! `update_display_state` (display only). Both build one `ModeContext`,
//! ask the current configuration for each role's layer and let
//! `LayerState` apply the difference.

use crate::binding::{fixed_parameter, ParameterSource};
use crate::config::{SectionConfig, SurfaceConfig};
use crate::configuration::{
    BrowserConfiguration, ConfigId, ConfigTable, LayerConfiguration, MenuConfiguration,
    MixerConfiguration, TrackConfiguration,
};
use crate::controller::SurfaceEvent;
use crate::host::{
    CursorDevice, CursorTrack, DeviceManager, DeviceTypeBank, HostApplication, Parameter,
    PopupBrowser, Track,
};
use crate::layer::{LayerId, Layers};
use crate::layer_state::{ActiveLayers, LayerState};
use crate::mixer_group::{MixerGroupRefs, MixerLayerGroup};
use crate::scheduler::Scheduler;
use crate::shared_state::{ModeContext, SharedSurfaceState};
use crate::surface::{Surface, SurfaceInput, SurfaceOutput};
use crate::types::{InfoSource, ParamElement, RingDisplayType, Role, SectionType, VPotMode};
use flume::Sender;
use std::rc::Rc;
use std::time::Duration;

pub struct MixControl {
    name: String,
    section_index: usize,
    section_type: SectionType,
    channels: usize,
    surface: Surface,
    layers: Layers,
    layer_state: LayerState,
    main_group: MixerLayerGroup,
    global_group: MixerLayerGroup,
    configs: ConfigTable,
    current: ConfigId,
    touch_count: usize,
    faders_touched: bool,
    menu_hold: bool,
    flags: Rc<SharedSurfaceState>,
    events: Sender<SurfaceEvent>,
    device_bank: Option<DeviceTypeBank>,
    cursor_device: Option<Rc<dyn CursorDevice>>,
    cursor_track: Option<Rc<dyn CursorTrack>>,
    touch_release_delay: Duration,
    encoder_step: f64,
}

impl MixControl {
    /// Build the section's layers and configurations (nothing bound yet)
    pub fn new(
        section_index: usize,
        section: &SectionConfig,
        settings: &SurfaceConfig,
        flags: Rc<SharedSurfaceState>,
        events: Sender<SurfaceEvent>,
    ) -> Self {
        let channels = section.channels;
        let mut layers = Layers::new();
        let main_group = MixerLayerGroup::new("MAIN", section_index, channels, &mut layers);
        let global_group = MixerLayerGroup::new("GLOBAL", section_index, channels, &mut layers);
        let groups = MixerGroupRefs {
            main: main_group.refs(),
            global: global_group.refs(),
        };

        let mut send_track =
            TrackConfiguration::new("TRACK", section_index, channels, groups, &mut layers);
        let mut cursor_device =
            TrackConfiguration::new("DEVICE", section_index, channels, groups, &mut layers);
        let mut eq = TrackConfiguration::new("EQ_DEVICE", section_index, channels, groups, &mut layers);
        for config in [&mut send_track, &mut cursor_device, &mut eq] {
            config.set_missing_text(settings.missing_text.clone());
        }

        let configs = ConfigTable::new(
            MixerConfiguration::new("PAN", groups, ParamElement::Pan),
            MixerConfiguration::new("SEND", groups, ParamElement::SendMixer),
            send_track,
            cursor_device,
            eq,
            BrowserConfiguration::new("BROWSER", section_index, channels, groups, &mut layers),
        );

        log::info!(
            "MixControl[{}]: section '{}' ({:?}, {} channels, {} layers)",
            section_index,
            section.name,
            section.section_type,
            channels,
            layers.len()
        );

        Self {
            name: section.name.clone(),
            section_index,
            section_type: section.section_type,
            channels,
            surface: Surface::new(section_index, channels),
            layers,
            layer_state: LayerState::new(),
            main_group,
            global_group,
            configs,
            current: ConfigId::Pan,
            touch_count: 0,
            faders_touched: false,
            menu_hold: false,
            flags,
            events,
            device_bank: None,
            cursor_device: None,
            cursor_track: None,
            touch_release_delay: settings.touch_release_delay(),
            encoder_step: settings.encoder_step,
        }
    }

    // === Wiring ===

    /// Bind the mixer groups to the main and global track banks
    pub fn init_main_control(
        &mut self,
        mixer_tracks: &[Rc<dyn Track>],
        global_tracks: &[Rc<dyn Track>],
        app: Rc<dyn HostApplication>,
    ) {
        self.main_group.init(
            &mut self.layers,
            mixer_tracks,
            app.clone(),
            self.flags.clone(),
            self.encoder_step,
        );
        self.global_group.init(
            &mut self.layers,
            global_tracks,
            app.clone(),
            self.flags.clone(),
            self.encoder_step,
        );

        let flags = self.flags.clone();
        if let Some(send) = self.configs.mixer_mut(ConfigId::Send) {
            send.set_navigate_horizontal(Rc::new(move |direction| {
                flags.scroll_send_index(direction, app.send_count());
            }));
        }
        self.update_state();
    }

    /// Bind the track/device configurations
    ///
    /// `channel_offset` is the first surface-wide channel of this section, so
    /// an extender continues where the main unit's strips end.
    pub fn init_track_control(
        &mut self,
        cursor_track: Rc<dyn CursorTrack>,
        cursor_device: Rc<dyn CursorDevice>,
        device_bank: DeviceTypeBank,
        channel_offset: usize,
    ) {
        let cursor_manager = device_bank.device_manager(VPotMode::Instrument);
        let eq_manager = device_bank.device_manager(VPotMode::Eq);

        for index in 0..self.channels {
            let slot = channel_offset + index;

            if let Some(config) = self.configs.track(ConfigId::SendTrack) {
                let track = cursor_track.clone();
                let source: ParameterSource = Rc::new(move || track.send(slot));
                let reset_source = source.clone();
                config.add_binding(
                    &mut self.layers,
                    index,
                    source,
                    RingDisplayType::Fill,
                    Rc::new(move || {
                        if let Some(parameter) = reset_source() {
                            parameter.reset();
                        }
                    }),
                    self.flags.clone(),
                    self.encoder_step,
                );
            }

            if let (Some(config), Some(manager)) =
                (self.configs.track(ConfigId::CursorDevice), &cursor_manager)
            {
                let parameter = manager.parameter(slot);
                config.add_binding(
                    &mut self.layers,
                    index,
                    fixed_parameter(parameter.clone()),
                    RingDisplayType::Fill,
                    Rc::new(move || parameter.reset()),
                    self.flags.clone(),
                    self.encoder_step,
                );
            }

            if let (Some(config), Some(manager)) = (self.configs.track(ConfigId::Eq), &eq_manager) {
                let reset_manager = manager.clone();
                let flags = self.flags.clone();
                config.add_binding(
                    &mut self.layers,
                    index,
                    fixed_parameter(manager.parameter(slot)),
                    RingDisplayType::Boost,
                    Rc::new(move || reset_manager.handle_reset(slot, flags.modifiers())),
                    self.flags.clone(),
                    self.encoder_step,
                );
            }
        }

        if let Some(config) = self.configs.track_mut(ConfigId::SendTrack) {
            let track = cursor_track.clone();
            config.set_navigate_horizontal(Rc::new(move |direction| track.scroll_sends(direction)));
        }

        for (id, manager) in [
            (ConfigId::CursorDevice, cursor_manager),
            (ConfigId::Eq, eq_manager),
        ] {
            let Some(manager) = manager else {
                log::debug!("MixControl[{}]: no device manager for {:?}", self.section_index, id);
                continue;
            };
            let menu = MenuConfiguration::new(
                &format!("{:?}_MENU", id).to_uppercase(),
                self.section_index,
                self.channels,
                &mut self.layers,
            );
            menu.init(
                &mut self.layers,
                cursor_device.clone(),
                self.events.clone(),
                self.channels,
            );
            if let Some(config) = self.configs.track_mut(id) {
                let pages = manager.clone();
                config.set_navigate_horizontal(Rc::new(move |direction| {
                    pages.navigate_parameters(direction)
                }));
                let device = cursor_device.clone();
                config.set_navigate_vertical(Rc::new(move |direction| {
                    device.navigate_device(direction)
                }));
                config.set_device_manager(manager, cursor_device.clone(), Some(menu));
            }
        }

        self.device_bank = Some(device_bank);
        self.cursor_device = Some(cursor_device);
        self.cursor_track = Some(cursor_track);
        log::info!("MixControl[{}]: track control wired", self.section_index);
        self.update_state();
    }

    /// Bind the popup browser (main section only)
    pub fn init_browser(&mut self, browser: Rc<dyn PopupBrowser>) {
        if let Some(config) = self.configs.browser_mut() {
            config.init(&mut self.layers, browser);
        }
    }

    // === Queries ===

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn section_index(&self) -> usize {
        self.section_index
    }

    pub fn section_type(&self) -> SectionType {
        self.section_type
    }

    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    pub fn layers(&self) -> &Layers {
        &self.layers
    }

    pub fn current_configuration(&self) -> ConfigId {
        self.current
    }

    pub fn configuration(&self, id: ConfigId) -> &LayerConfiguration {
        self.configs.get(id)
    }

    pub fn browser(&self) -> Option<&BrowserConfiguration> {
        self.configs.browser()
    }

    pub fn active_layers(&self) -> ActiveLayers {
        self.layer_state.active()
    }

    /// Layer currently owning `role`
    pub fn active_layer(&self, role: Role) -> Option<LayerId> {
        let active = self.layer_state.active();
        match role {
            Role::Fader => active.fader,
            Role::Encoder => active.encoder,
            Role::Button => active.button,
            Role::Display => active.display,
        }
    }

    pub fn touch_count(&self) -> usize {
        self.touch_count
    }

    pub fn is_faders_touched(&self) -> bool {
        self.faders_touched
    }

    pub fn is_menu_hold(&self) -> bool {
        self.menu_hold
    }

    pub fn is_browser_active(&self) -> bool {
        self.current == ConfigId::Browser
    }

    /// Snapshot of every flag the role accessors read
    pub fn mode_context(&self) -> ModeContext {
        ModeContext {
            flipped: self.flags.is_flipped(),
            global_view: self.flags.is_global_view(),
            menu_hold: self.menu_hold,
            touched: self.faders_touched,
            modifiers: self.flags.modifiers(),
        }
    }

    // === Recompute ===

    /// Recompute the owner of every role and apply the difference
    pub fn update_state(&mut self) {
        let ctx = self.mode_context();
        let config = self.configs.get(self.current);
        let next = ActiveLayers {
            fader: Some(config.fader_layer(&ctx)),
            encoder: Some(config.encoder_layer(&ctx)),
            button: Some(config.button_layer(&ctx)),
            display: Some(config.display_layer(ctx.display_row(), &ctx)),
        };
        self.layer_state
            .apply(next, &mut self.layers, &mut self.surface);
    }

    /// Recompute only the display owner
    pub fn update_display_state(&mut self) {
        let ctx = self.mode_context();
        let display = self
            .configs
            .get(self.current)
            .display_layer(ctx.display_row(), &ctx);
        self.layer_state
            .apply_display(display, &mut self.layers, &mut self.surface);
    }

    // === Input ===

    /// Route a hardware input; fader touches also drive touch aggregation
    pub fn handle_input(&mut self, input: SurfaceInput, scheduler: &mut dyn Scheduler<SurfaceEvent>) {
        self.surface.handle_input(input);
        if let SurfaceInput::FaderTouch { touched, .. } = input {
            self.handle_touch(touched, scheduler);
        }
    }

    fn touch_tag(&self) -> String {
        format!("touch-{}", self.section_index)
    }

    /// Count touches across all faders of the section
    ///
    /// The first touch switches the display right away. The last release
    /// schedules the switch back; a new touch before it fires cancels it.
    pub fn handle_touch(&mut self, touched: bool, scheduler: &mut dyn Scheduler<SurfaceEvent>) {
        if touched {
            self.touch_count += 1;
        } else {
            self.touch_count = self.touch_count.saturating_sub(1);
        }

        if self.touch_count > 0 && !self.faders_touched {
            self.faders_touched = true;
            scheduler.cancel(&self.touch_tag());
            self.update_display_state();
        } else if self.touch_count == 0 && self.faders_touched {
            self.faders_touched = false;
            scheduler.schedule(
                &self.touch_tag(),
                self.touch_release_delay,
                SurfaceEvent::TouchSettled {
                    section: self.section_index,
                },
            );
        }
    }

    /// Delayed display recompute after the last fader release
    pub fn touch_settled(&mut self) {
        log::trace!("MixControl[{}]: touch settled", self.section_index);
        self.update_display_state();
    }

    // === Mode transitions ===

    /// Mode button press or release
    pub fn notify_mode_change(&mut self, mode: VPotMode, pressed: bool) {
        if pressed {
            self.do_mode_change(mode, true);
        } else {
            self.update_state();
        }
    }

    /// Switch to the configuration of `mode`
    ///
    /// With `focus` the cursor device jumps to the mode's device, otherwise
    /// the follower only re-validates its position. Any open browser is
    /// closed without restoring its snapshot.
    pub fn do_mode_change(&mut self, mode: VPotMode, focus: bool) {
        self.current = self.config_for_mode(mode);
        log::debug!(
            "MixControl[{}]: mode {:?} -> {}",
            self.section_index,
            mode,
            self.configs.get(self.current).name()
        );

        if mode.is_device_mode() {
            if let Some(follower) = self.device_bank.as_ref().and_then(|bank| bank.follower(mode)) {
                self.configs.get_mut(self.current).set_current_follower(follower);
            }
        }

        if let Some(manager) = self.configs.get(self.current).device_manager() {
            if focus {
                self.focus_device(&*manager);
            } else {
                Self::ensure_device_pointer(&*manager);
            }
        }

        self.force_close_browser();
        self.update_state();
    }

    fn config_for_mode(&self, mode: VPotMode) -> ConfigId {
        match mode {
            VPotMode::Pan => ConfigId::Pan,
            VPotMode::Send => {
                if self.section_type == SectionType::Main && self.flags.is_track_channel_mode() {
                    ConfigId::SendTrack
                } else {
                    ConfigId::Send
                }
            }
            VPotMode::Eq => ConfigId::Eq,
            VPotMode::Instrument | VPotMode::MidiEffect | VPotMode::Plugin => ConfigId::CursorDevice,
        }
    }

    fn focus_device(&self, manager: &dyn DeviceManager) {
        match (&self.cursor_device, manager.current_follower()) {
            (Some(device), Some(follower)) => device.select_device(&*follower),
            _ => log::debug!("MixControl[{}]: focus without device/follower", self.section_index),
        }
    }

    fn ensure_device_pointer(manager: &dyn DeviceManager) {
        if let Some(follower) = manager.current_follower() {
            follower.ensure_position();
        }
    }

    /// Make `id` current and recompute
    pub fn set_configuration(&mut self, id: ConfigId) {
        self.current = id;
        self.update_state();
    }

    /// Menu button held or released
    ///
    /// Holding it on the main section also creates what the mode is
    /// missing: an EQ device in EQ mode, or a browser session for the
    /// other device modes.
    pub fn notify_mode_advance(&mut self, pressed: bool) {
        self.menu_hold = pressed;
        if pressed && self.section_type == SectionType::Main {
            if let Some(manager) = self.configs.get(self.current).device_manager() {
                if !manager.is_specific_device_present() {
                    match self.flags.vpot_mode() {
                        VPotMode::Eq => match &self.cursor_track {
                            Some(track) => track.insert_eq_device(),
                            None => log::debug!("MixControl: no cursor track for EQ insert"),
                        },
                        VPotMode::Plugin | VPotMode::Instrument | VPotMode::MidiEffect => {
                            self.initiate_browsing(&*manager)
                        }
                        _ => {}
                    }
                }
            }
        }
        self.update_state();
    }

    /// Menu "browse" slot: start browsing for the current device mode
    pub fn browse_device(&mut self) {
        if let Some(manager) = self.configs.get(self.current).device_manager() {
            self.initiate_browsing(&*manager);
        } else {
            log::debug!("MixControl[{}]: browse without device manager", self.section_index);
        }
    }

    fn initiate_browsing(&mut self, manager: &dyn DeviceManager) {
        match self.configs.browser_mut() {
            Some(browser) if browser.is_wired() => {
                browser.set_browsing_initiated(true);
                manager.initiate_browsing();
            }
            _ => log::debug!("MixControl[{}]: no browser to initiate", self.section_index),
        }
    }

    // === Navigation ===

    pub fn navigate_left_right(&mut self, direction: i32, pressed: bool) {
        if pressed {
            let config = self.configs.get(self.current);
            config.navigate_horizontal(direction);
            if config.enable_info(InfoSource::NavHorizontal) {
                self.update_state();
            }
        } else if self.configs.get(self.current).disable_info() {
            self.update_state();
        }
    }

    pub fn navigate_up_down(&mut self, direction: i32, pressed: bool) {
        if pressed {
            let config = self.configs.get(self.current);
            config.navigate_vertical(direction);
            if config.enable_info(InfoSource::NavVertical) {
                self.update_state();
            }
        } else if self.configs.get(self.current).disable_info() {
            self.update_state();
        }
    }

    // === Browser ===

    /// Host browser opened or closed
    pub fn notify_browser_exists(&mut self, open: bool) {
        let current = self.current;
        let next = self
            .configs
            .browser_mut()
            .and_then(|browser| browser.notify_browser_exists(open, current));
        if let Some(next) = next {
            self.set_configuration(next);
        }
    }

    pub fn force_close_browser(&mut self) {
        if let Some(browser) = self.configs.browser_mut() {
            browser.force_close();
        }
    }

    // === Device tracking ===

    /// Re-evaluate missing-device and no-pages text of all device modes
    pub fn evaluate_device_displays(&mut self) {
        for id in [ConfigId::SendTrack, ConfigId::CursorDevice, ConfigId::Eq] {
            if let Some(config) = self.configs.track(id) {
                config.evaluate_text_display();
            }
        }
        self.update_state();
    }

    /// Cursor device appeared or vanished
    ///
    /// If it vanished while a device of the mode's kind still exists, the
    /// cursor jumps back to that device and the menu closes.
    pub fn cursor_device_exists_changed(&mut self, exists: bool) {
        let manager = self.configs.get(self.current).device_manager();
        if let (false, Some(manager)) = (exists, manager) {
            if manager.is_specific_device_present() {
                self.focus_device(&*manager);
                self.menu_hold = false;
            }
        }
        self.evaluate_device_displays();
    }

    /// The cursor device moved onto a device that fits `fitting_mode`
    ///
    /// Follows it when a device mode is active and no browser is open.
    /// Returns whether the mode changed.
    pub fn cursor_device_moved(&mut self, fitting_mode: Option<VPotMode>) -> bool {
        let Some(mode) = fitting_mode else {
            return false;
        };
        if !self.flags.vpot_mode().is_device_mode() || self.is_browser_active() {
            return false;
        }
        self.flags.set_vpot_mode(mode);
        self.do_mode_change(mode, false);
        true
    }

    // === Output ===

    pub fn flush(&mut self, out: &mut dyn SurfaceOutput) {
        self.surface.flush(out);
    }

    pub fn full_hardware_update(&mut self) {
        self.surface.full_hardware_update();
    }
}
