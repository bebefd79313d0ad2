//! Surface controller: event queue, timers and section fan-out
//!
//! ```text
//! hardware decode / host observers ─┐
//! control handlers (menu, browse) ──┼→ flume channel → process_pending()
//! TimerQueue::poll (tick) ──────────┘        ↓
//!                                   MixControl per section
//! ```
//!
//! Everything is drained and handled on the thread that owns the controller.
//! The channel only decouples producers (including handlers that run while a
//! section is being updated) from the state machine.

use crate::config::SurfaceConfig;
use crate::host::{CursorDevice, CursorTrack, DeviceTypeBank, HostApplication, PopupBrowser, Track};
use crate::mix_control::MixControl;
use crate::scheduler::TimerQueue;
use crate::shared_state::SharedSurfaceState;
use crate::surface::{SurfaceInput, SurfaceOutput};
use crate::types::{SectionType, VPotMode};
use crate::SurfaceError;
use flume::{Receiver, Sender};
use std::rc::Rc;
use std::time::Instant;

/// Everything that can change the state of the surface
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceEvent {
    /// Decoded hardware input for one section
    Input { section: usize, input: SurfaceInput },
    /// V-Pot mode button
    ModeSelect { mode: VPotMode, pressed: bool },
    /// Menu (mode advance) button
    ModeAdvance { pressed: bool },
    FlipChanged(bool),
    GlobalViewChanged(bool),
    /// SEND on the main section edits the cursor track's sends
    TrackChannelModeChanged(bool),
    /// Modifier key; `flag` is one of the `Modifiers` bits
    Modifier { flag: u8, held: bool },
    NavigateHorizontal { direction: i32, pressed: bool },
    NavigateVertical { direction: i32, pressed: bool },
    /// Host popup browser opened or closed
    BrowserExists(bool),
    /// Menu request to browse for a device
    BrowseDevice,
    /// Device name, presence or page count changed
    DeviceChanged,
    CursorDeviceExists(bool),
    /// Cursor device moved; `fitting_mode` is the mode its device belongs to
    CursorDeviceMoved { fitting_mode: Option<VPotMode> },
    /// Fader release delay elapsed
    TouchSettled { section: usize },
}

/// Owner of all sections of one surface
pub struct SurfaceController {
    config: SurfaceConfig,
    flags: Rc<SharedSurfaceState>,
    sections: Vec<MixControl>,
    main_index: usize,
    timers: TimerQueue<SurfaceEvent>,
    event_tx: Sender<SurfaceEvent>,
    event_rx: Receiver<SurfaceEvent>,
}

impl SurfaceController {
    /// Build every section of `config`
    ///
    /// Fails if the layout is invalid. Host objects are attached afterwards
    /// with the `init_*` methods.
    pub fn new(config: SurfaceConfig, now: Instant) -> Result<Self, SurfaceError> {
        config.validate()?;

        let flags = Rc::new(SharedSurfaceState::new());
        let (event_tx, event_rx) = flume::unbounded();

        let sections: Vec<MixControl> = config
            .sections
            .iter()
            .enumerate()
            .map(|(index, section)| {
                MixControl::new(index, section, &config, flags.clone(), event_tx.clone())
            })
            .collect();
        let main_index = sections
            .iter()
            .position(|section| section.section_type() == SectionType::Main)
            .ok_or(SurfaceError::NoMainSection)?;

        log::info!(
            "SurfaceController: {} section(s), main is '{}'",
            sections.len(),
            sections[main_index].name()
        );

        Ok(Self {
            config,
            flags,
            sections,
            main_index,
            timers: TimerQueue::new(now),
            event_tx,
            event_rx,
        })
    }

    // === Wiring ===

    /// Bind the mixer layers of `section` to its slice of the track banks
    pub fn init_main_control(
        &mut self,
        section: usize,
        mixer_tracks: &[Rc<dyn Track>],
        global_tracks: &[Rc<dyn Track>],
        app: Rc<dyn HostApplication>,
    ) -> Result<(), SurfaceError> {
        let section = self
            .sections
            .get_mut(section)
            .ok_or(SurfaceError::UnknownSection(section))?;
        section.init_main_control(mixer_tracks, global_tracks, app);
        Ok(())
    }

    /// Bind track and device control on every section
    ///
    /// Extenders continue the parameter slots where the preceding sections
    /// end.
    pub fn init_track_control(
        &mut self,
        cursor_track: Rc<dyn CursorTrack>,
        cursor_device: Rc<dyn CursorDevice>,
        device_bank: DeviceTypeBank,
    ) {
        for (index, section) in self.sections.iter_mut().enumerate() {
            section.init_track_control(
                cursor_track.clone(),
                cursor_device.clone(),
                device_bank.clone(),
                self.config.channel_offset(index),
            );
        }
    }

    /// Bind the popup browser to the main section
    pub fn init_browser(&mut self, browser: Rc<dyn PopupBrowser>) {
        self.sections[self.main_index].init_browser(browser);
    }

    // === Queries ===

    pub fn flags(&self) -> Rc<SharedSurfaceState> {
        self.flags.clone()
    }

    pub fn config(&self) -> &SurfaceConfig {
        &self.config
    }

    pub fn sections(&self) -> &[MixControl] {
        &self.sections
    }

    pub fn section(&self, index: usize) -> Option<&MixControl> {
        self.sections.get(index)
    }

    pub fn section_mut(&mut self, index: usize) -> Option<&mut MixControl> {
        self.sections.get_mut(index)
    }

    pub fn main_section(&self) -> &MixControl {
        &self.sections[self.main_index]
    }

    /// Sender for hardware decoders and host observers
    pub fn event_sender(&self) -> Sender<SurfaceEvent> {
        self.event_tx.clone()
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.pending_count()
    }

    // === Event processing ===

    /// Queue an event for the next `process_pending`
    pub fn post(&self, event: SurfaceEvent) {
        // The receiver lives in self, so the channel can't be disconnected
        let _ = self.event_tx.send(event);
    }

    /// Handle every queued event as of the current time
    ///
    /// Returns the number of events handled.
    pub fn process_pending(&mut self) -> usize {
        self.process_pending_at(Instant::now())
    }

    /// Handle every queued event, including those posted while handling
    ///
    /// Timers scheduled by these events are measured from `now`.
    pub fn process_pending_at(&mut self, now: Instant) -> usize {
        self.timers.advance(now);
        let mut handled = 0;
        while let Ok(event) = self.event_rx.try_recv() {
            self.handle_event(event);
            handled += 1;
        }
        handled
    }

    /// Advance the timers to `now` and handle whatever became due
    pub fn tick(&mut self, now: Instant) -> usize {
        let due = self.timers.poll(now);
        let mut handled = due.len();
        for event in due {
            self.handle_event(event);
        }
        handled += self.process_pending_at(now);
        handled
    }

    pub fn handle_event(&mut self, event: SurfaceEvent) {
        log::trace!("SurfaceController: {:?}", event);
        match event {
            SurfaceEvent::Input { section, input } => match self.sections.get_mut(section) {
                Some(mix) => mix.handle_input(input, &mut self.timers),
                None => log::warn!("SurfaceController: input for unknown section {}", section),
            },
            SurfaceEvent::ModeSelect { mode, pressed } => {
                if pressed {
                    self.flags.set_vpot_mode(mode);
                }
                for section in &mut self.sections {
                    section.notify_mode_change(mode, pressed);
                }
            }
            SurfaceEvent::ModeAdvance { pressed } => {
                for section in &mut self.sections {
                    section.notify_mode_advance(pressed);
                }
            }
            SurfaceEvent::FlipChanged(flipped) => {
                self.flags.set_flipped(flipped);
                self.update_all();
            }
            SurfaceEvent::GlobalViewChanged(global_view) => {
                self.flags.set_global_view(global_view);
                self.update_all();
            }
            SurfaceEvent::TrackChannelModeChanged(enabled) => {
                self.flags.set_track_channel_mode(enabled);
                let mode = self.flags.vpot_mode();
                for section in &mut self.sections {
                    section.do_mode_change(mode, true);
                }
            }
            SurfaceEvent::Modifier { flag, held } => {
                self.flags.set_modifier(flag, held);
                self.update_all();
            }
            SurfaceEvent::NavigateHorizontal { direction, pressed } => {
                self.navigate(|main| main.navigate_left_right(direction, pressed));
            }
            SurfaceEvent::NavigateVertical { direction, pressed } => {
                self.navigate(|main| main.navigate_up_down(direction, pressed));
            }
            SurfaceEvent::BrowserExists(open) => {
                for section in &mut self.sections {
                    section.notify_browser_exists(open);
                }
            }
            SurfaceEvent::BrowseDevice => {
                self.sections[self.main_index].browse_device();
            }
            SurfaceEvent::DeviceChanged => {
                for section in &mut self.sections {
                    section.evaluate_device_displays();
                }
            }
            SurfaceEvent::CursorDeviceExists(exists) => {
                for section in &mut self.sections {
                    section.cursor_device_exists_changed(exists);
                }
            }
            SurfaceEvent::CursorDeviceMoved { fitting_mode } => {
                if self.sections.iter().any(|section| section.is_browser_active()) {
                    log::debug!("SurfaceController: browser open, not following cursor device");
                    return;
                }
                for section in &mut self.sections {
                    section.cursor_device_moved(fitting_mode);
                }
            }
            SurfaceEvent::TouchSettled { section } => {
                if let Some(mix) = self.sections.get_mut(section) {
                    mix.touch_settled();
                }
            }
        }
    }

    /// Navigation acts on the main section; the others only recompute
    fn navigate(&mut self, action: impl FnOnce(&mut MixControl)) {
        let main_index = self.main_index;
        action(&mut self.sections[main_index]);
        for (index, section) in self.sections.iter_mut().enumerate() {
            if index != main_index {
                section.update_state();
            }
        }
    }

    fn update_all(&mut self) {
        for section in &mut self.sections {
            section.update_state();
        }
    }

    // === Output ===

    /// Send all changed feedback of every section
    pub fn flush(&mut self, out: &mut dyn SurfaceOutput) {
        for section in &mut self.sections {
            section.flush(out);
        }
    }

    /// Resend everything on the next flush (e.g. after a device reconnect)
    pub fn full_hardware_update(&mut self) {
        log::info!("SurfaceController: full hardware update");
        for section in &mut self.sections {
            section.full_hardware_update();
        }
    }
}
