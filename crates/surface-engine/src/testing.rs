//! In-memory host objects and a recording output for unit tests

use crate::config::{SectionConfig, SurfaceConfig};
use crate::controller::SurfaceController;
use crate::host::{
    BrowserColumn, BrowserFilterCursor, CursorDevice, CursorTrack, DeviceFollower, DeviceManager,
    DeviceTypeBank, HostApplication, Parameter, PopupBrowser, Track,
};
use crate::shared_state::SharedSurfaceState;
use crate::surface::SurfaceOutput;
use crate::types::{ChannelButton, InfoSource, VPotMode};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;
use std::time::Instant;

// === Parameters and tracks ===

pub struct MockParameter {
    name: String,
    exists: bool,
    value: Cell<f64>,
    default: f64,
    resets: Cell<usize>,
}

impl MockParameter {
    pub fn new(name: &str, value: f64) -> Rc<Self> {
        Rc::new(Self {
            name: name.to_string(),
            exists: true,
            value: Cell::new(value),
            default: value,
            resets: Cell::new(0),
        })
    }

    pub fn missing() -> Rc<Self> {
        Rc::new(Self {
            name: String::new(),
            exists: false,
            value: Cell::new(0.0),
            default: 0.0,
            resets: Cell::new(0),
        })
    }

    pub fn reset_count(&self) -> usize {
        self.resets.get()
    }
}

impl Parameter for MockParameter {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn exists(&self) -> bool {
        self.exists
    }

    fn value(&self) -> f64 {
        self.value.get()
    }

    fn set_value(&self, value: f64) {
        self.value.set(value);
    }

    fn reset(&self) {
        self.value.set(self.default);
        self.resets.set(self.resets.get() + 1);
    }

    fn display_value(&self) -> String {
        format!("{:.2}", self.value.get())
    }
}

pub struct MockTrack {
    name: String,
    exists: bool,
    volume: Rc<MockParameter>,
    pan: Rc<MockParameter>,
    sends: Vec<Rc<MockParameter>>,
    armed: Cell<bool>,
    solo: Cell<bool>,
    muted: Cell<bool>,
    selected: Cell<usize>,
    stopped: Cell<usize>,
}

impl MockTrack {
    pub fn new(name: &str, sends: usize) -> Rc<Self> {
        Rc::new(Self {
            name: name.to_string(),
            exists: true,
            volume: MockParameter::new("Volume", 0.75),
            pan: MockParameter::new("Pan", 0.5),
            sends: (0..sends)
                .map(|i| MockParameter::new(&format!("FX {}", i + 1), 0.0))
                .collect(),
            armed: Cell::new(false),
            solo: Cell::new(false),
            muted: Cell::new(false),
            selected: Cell::new(0),
            stopped: Cell::new(0),
        })
    }

    /// Empty slot of the track bank
    pub fn missing() -> Rc<Self> {
        Rc::new(Self {
            name: String::new(),
            exists: false,
            volume: MockParameter::missing(),
            pan: MockParameter::missing(),
            sends: Vec::new(),
            armed: Cell::new(false),
            solo: Cell::new(false),
            muted: Cell::new(false),
            selected: Cell::new(0),
            stopped: Cell::new(0),
        })
    }

    pub fn volume_value(&self) -> f64 {
        self.volume.value()
    }

    pub fn send_value(&self, index: usize) -> f64 {
        self.sends.get(index).map(|send| send.value()).unwrap_or(0.0)
    }

    pub fn selected_count(&self) -> usize {
        self.selected.get()
    }

    pub fn stop_count(&self) -> usize {
        self.stopped.get()
    }
}

impl Track for MockTrack {
    fn exists(&self) -> bool {
        self.exists
    }

    fn name(&self) -> String {
        self.name.clone()
    }

    fn volume(&self) -> Rc<dyn Parameter> {
        self.volume.clone()
    }

    fn pan(&self) -> Rc<dyn Parameter> {
        self.pan.clone()
    }

    fn send(&self, index: usize) -> Option<Rc<dyn Parameter>> {
        self.sends
            .get(index)
            .map(|send| send.clone() as Rc<dyn Parameter>)
    }

    fn is_armed(&self) -> bool {
        self.armed.get()
    }

    fn is_solo(&self) -> bool {
        self.solo.get()
    }

    fn is_muted(&self) -> bool {
        self.muted.get()
    }

    fn is_selected(&self) -> bool {
        self.selected.get() > 0
    }

    fn set_armed(&self, armed: bool) {
        self.armed.set(armed);
    }

    fn set_solo(&self, solo: bool) {
        self.solo.set(solo);
    }

    fn set_muted(&self, muted: bool) {
        self.muted.set(muted);
    }

    fn select_in_mixer(&self) {
        self.selected.set(self.selected.get() + 1);
    }

    fn delete(&self) {}

    fn stop(&self) {
        self.stopped.set(self.stopped.get() + 1);
    }

    fn enter_group(&self) {}
}

pub struct MockApp {
    send_count: usize,
    created: RefCell<Vec<&'static str>>,
}

impl MockApp {
    pub fn new(send_count: usize) -> Rc<Self> {
        Rc::new(Self {
            send_count,
            created: RefCell::new(Vec::new()),
        })
    }

    pub fn created(&self) -> Vec<&'static str> {
        self.created.borrow().clone()
    }
}

impl HostApplication for MockApp {
    fn create_audio_track(&self) {
        self.created.borrow_mut().push("audio");
    }

    fn create_effect_track(&self) {
        self.created.borrow_mut().push("effect");
    }

    fn create_instrument_track(&self) {
        self.created.borrow_mut().push("instrument");
    }

    fn send_count(&self) -> usize {
        self.send_count
    }
}

pub struct MockCursorTrack {
    sends: Vec<Rc<MockParameter>>,
    scrolls: RefCell<Vec<i32>>,
    eq_inserts: Cell<usize>,
}

impl MockCursorTrack {
    pub fn new(sends: usize) -> Rc<Self> {
        Rc::new(Self {
            sends: (0..sends)
                .map(|i| MockParameter::new(&format!("FX {}", i + 1), 0.0))
                .collect(),
            scrolls: RefCell::new(Vec::new()),
            eq_inserts: Cell::new(0),
        })
    }

    pub fn send_value(&self, index: usize) -> f64 {
        self.sends.get(index).map(|send| send.value()).unwrap_or(0.0)
    }

    pub fn scrolls(&self) -> Vec<i32> {
        self.scrolls.borrow().clone()
    }

    pub fn eq_inserts(&self) -> usize {
        self.eq_inserts.get()
    }
}

impl CursorTrack for MockCursorTrack {
    fn name(&self) -> String {
        "Cursor".to_string()
    }

    fn send(&self, index: usize) -> Option<Rc<dyn Parameter>> {
        self.sends
            .get(index)
            .map(|send| send.clone() as Rc<dyn Parameter>)
    }

    fn scroll_sends(&self, direction: i32) {
        self.scrolls.borrow_mut().push(direction);
    }

    fn insert_eq_device(&self) {
        self.eq_inserts.set(self.eq_inserts.get() + 1);
    }
}

// === Devices ===

pub struct MockFollower {
    mode: VPotMode,
    ensures: Cell<usize>,
}

impl MockFollower {
    pub fn new(mode: VPotMode) -> Rc<Self> {
        Rc::new(Self {
            mode,
            ensures: Cell::new(0),
        })
    }

    pub fn ensure_count(&self) -> usize {
        self.ensures.get()
    }
}

impl DeviceFollower for MockFollower {
    fn mode(&self) -> VPotMode {
        self.mode
    }

    fn focus_device_exists(&self) -> bool {
        false
    }

    fn ensure_position(&self) {
        self.ensures.set(self.ensures.get() + 1);
    }
}

pub struct MockDeviceManager {
    follower: RefCell<Option<Rc<dyn DeviceFollower>>>,
    present: Cell<bool>,
    page_count: Cell<usize>,
    parameters: RefCell<Vec<Rc<MockParameter>>>,
    info_source: Cell<Option<InfoSource>>,
    page_moves: RefCell<Vec<i32>>,
    browse_requests: Cell<usize>,
}

impl MockDeviceManager {
    pub fn new(follower: Rc<dyn DeviceFollower>) -> Rc<Self> {
        Rc::new(Self {
            follower: RefCell::new(Some(follower)),
            present: Cell::new(false),
            page_count: Cell::new(0),
            parameters: RefCell::new(Vec::new()),
            info_source: Cell::new(None),
            page_moves: RefCell::new(Vec::new()),
            browse_requests: Cell::new(0),
        })
    }

    pub fn set_present(&self, present: bool) {
        self.present.set(present);
    }

    pub fn set_page_count(&self, count: usize) {
        self.page_count.set(count);
    }

    /// Remote control slot `index`, created on first use
    pub fn mock_parameter(&self, index: usize) -> Rc<MockParameter> {
        let mut parameters = self.parameters.borrow_mut();
        while parameters.len() <= index {
            let name = format!("Param{}", parameters.len() + 1);
            parameters.push(MockParameter::new(&name, 0.5));
        }
        parameters[index].clone()
    }

    pub fn current_mode(&self) -> Option<VPotMode> {
        self.follower.borrow().as_ref().map(|follower| follower.mode())
    }

    pub fn page_moves(&self) -> Vec<i32> {
        self.page_moves.borrow().clone()
    }

    pub fn browse_requests(&self) -> usize {
        self.browse_requests.get()
    }
}

impl DeviceManager for MockDeviceManager {
    fn current_follower(&self) -> Option<Rc<dyn DeviceFollower>> {
        self.follower.borrow().clone()
    }

    fn set_current_follower(&self, follower: Rc<dyn DeviceFollower>) {
        *self.follower.borrow_mut() = Some(follower);
    }

    fn is_specific_device_present(&self) -> bool {
        self.present.get()
    }

    fn page_count(&self) -> usize {
        self.page_count.get()
    }

    fn parameter(&self, index: usize) -> Rc<dyn Parameter> {
        self.mock_parameter(index)
    }

    fn name(&self) -> String {
        "Page 1".to_string()
    }

    fn enable_info(&self, source: InfoSource) {
        self.info_source.set(Some(source));
    }

    fn disable_info(&self) {
        self.info_source.set(None);
    }

    fn info_source(&self) -> Option<InfoSource> {
        self.info_source.get()
    }

    fn info_text(&self) -> [String; 2] {
        match self.info_source.get() {
            Some(InfoSource::NavHorizontal) => ["Parameter Page".into(), self.name()],
            Some(InfoSource::NavVertical) => ["Device".into(), "Polysynth".into()],
            None => [String::new(), String::new()],
        }
    }

    fn navigate_parameters(&self, direction: i32) {
        self.page_moves.borrow_mut().push(direction);
    }

    fn initiate_browsing(&self) {
        self.browse_requests.set(self.browse_requests.get() + 1);
    }
}

pub struct MockCursorDevice {
    name: RefCell<String>,
    exists: Cell<bool>,
    enabled: Cell<bool>,
    pinned: Cell<bool>,
    deleted: Cell<usize>,
    selected: RefCell<Vec<VPotMode>>,
}

impl MockCursorDevice {
    pub fn new(name: &str) -> Rc<Self> {
        Rc::new(Self {
            name: RefCell::new(name.to_string()),
            exists: Cell::new(true),
            enabled: Cell::new(true),
            pinned: Cell::new(false),
            deleted: Cell::new(0),
            selected: RefCell::new(Vec::new()),
        })
    }

    pub fn set_name(&self, name: &str) {
        *self.name.borrow_mut() = name.to_string();
    }

    pub fn set_exists(&self, exists: bool) {
        self.exists.set(exists);
    }

    pub fn deleted(&self) -> usize {
        self.deleted.get()
    }

    /// Modes of the followers the cursor was pointed at
    pub fn selected_modes(&self) -> Vec<VPotMode> {
        self.selected.borrow().clone()
    }
}

impl CursorDevice for MockCursorDevice {
    fn exists(&self) -> bool {
        self.exists.get()
    }

    fn name(&self) -> String {
        self.name.borrow().clone()
    }

    fn select_device(&self, follower: &dyn DeviceFollower) {
        self.selected.borrow_mut().push(follower.mode());
    }

    fn navigate_device(&self, _direction: i32) {}

    fn is_enabled(&self) -> bool {
        self.enabled.get()
    }

    fn toggle_enabled(&self) {
        self.enabled.set(!self.enabled.get());
    }

    fn is_pinned(&self) -> bool {
        self.pinned.get()
    }

    fn toggle_pinned(&self) {
        self.pinned.set(!self.pinned.get());
    }

    fn move_left(&self) {}

    fn move_right(&self) {}

    fn delete(&self) {
        self.deleted.set(self.deleted.get() + 1);
    }
}

// === Browser ===

#[derive(Default)]
pub struct MockFilterCursor {
    position: Cell<i32>,
    firsts: Cell<usize>,
}

impl MockFilterCursor {
    pub fn position(&self) -> i32 {
        self.position.get()
    }

    pub fn first_count(&self) -> usize {
        self.firsts.get()
    }
}

impl BrowserFilterCursor for MockFilterCursor {
    fn name(&self) -> String {
        if self.position.get() == 0 {
            "Any".to_string()
        } else {
            format!("Item {}", self.position.get())
        }
    }

    fn select_previous(&self) {
        self.position.set(self.position.get() - 1);
    }

    fn select_next(&self) {
        self.position.set(self.position.get() + 1);
    }

    fn select_first(&self) {
        self.position.set(0);
        self.firsts.set(self.firsts.get() + 1);
    }
}

#[derive(Default)]
pub struct MockBrowser {
    open: Cell<bool>,
    cancels: Cell<usize>,
    commits: Cell<usize>,
    file_position: Cell<i32>,
    auditioning: Cell<bool>,
    columns: RefCell<HashMap<BrowserColumn, Rc<MockFilterCursor>>>,
}

impl MockBrowser {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn column_cursor(&self, column: BrowserColumn) -> Rc<MockFilterCursor> {
        self.columns
            .borrow_mut()
            .entry(column)
            .or_default()
            .clone()
    }

    pub fn set_open(&self, open: bool) {
        self.open.set(open);
    }

    pub fn cancel_count(&self) -> usize {
        self.cancels.get()
    }

    pub fn commit_count(&self) -> usize {
        self.commits.get()
    }

    pub fn file_position(&self) -> i32 {
        self.file_position.get()
    }

    pub fn is_auditioning(&self) -> bool {
        self.auditioning.get()
    }
}

impl PopupBrowser for MockBrowser {
    fn exists(&self) -> bool {
        self.open.get()
    }

    fn cancel(&self) {
        self.cancels.set(self.cancels.get() + 1);
        self.open.set(false);
    }

    fn commit(&self) {
        self.commits.set(self.commits.get() + 1);
        self.open.set(false);
    }

    fn select_previous_file(&self) {
        self.file_position.set(self.file_position.get() - 1);
    }

    fn select_next_file(&self) {
        self.file_position.set(self.file_position.get() + 1);
    }

    fn toggle_audition(&self) {
        self.auditioning.set(!self.auditioning.get());
    }

    fn column(&self, column: BrowserColumn) -> Rc<dyn BrowserFilterCursor> {
        self.column_cursor(column)
    }

    fn result_name(&self) -> String {
        format!("Result {}", self.file_position.get())
    }
}

// === Output ===

/// Collects everything a flush sends
#[derive(Default)]
pub struct RecordingOutput {
    pub rings: Vec<(usize, usize, u8)>,
    pub motors: Vec<(usize, usize, u16)>,
    pub leds: Vec<(usize, ChannelButton, usize, bool)>,
    pub displays: Vec<[String; 2]>,
}

impl RecordingOutput {
    pub fn clear(&mut self) {
        self.rings.clear();
        self.motors.clear();
        self.leds.clear();
        self.displays.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.rings.is_empty()
            && self.motors.is_empty()
            && self.leds.is_empty()
            && self.displays.is_empty()
    }
}

impl SurfaceOutput for RecordingOutput {
    fn send_ring(&mut self, section: usize, index: usize, value: u8) {
        self.rings.push((section, index, value));
    }

    fn send_motor(&mut self, section: usize, index: usize, position: u16) {
        self.motors.push((section, index, position));
    }

    fn send_led(&mut self, section: usize, button: ChannelButton, index: usize, on: bool) {
        self.leds.push((section, button, index, on));
    }

    fn send_display(&mut self, _section: usize, lines: &[String; 2]) {
        self.displays.push(lines.clone());
    }
}

// === Randomized tests ===

/// Deterministic xorshift64 generator
pub struct XorShift(u64);

impl XorShift {
    pub fn new(seed: u64) -> Self {
        Self(seed.max(1))
    }

    pub fn next_u64(&mut self) -> u64 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.0 = x;
        x
    }

    /// Uniform-ish value in `0..n`
    pub fn below(&mut self, n: usize) -> usize {
        (self.next_u64() % n as u64) as usize
    }

    pub fn flip(&mut self) -> bool {
        self.next_u64() & 1 == 1
    }
}

// === Wired controller ===

/// A controller with every section bound to mock host objects
pub struct Fixture {
    pub controller: SurfaceController,
    pub tracks: Vec<Rc<MockTrack>>,
    pub global_tracks: Vec<Rc<MockTrack>>,
    pub app: Rc<MockApp>,
    pub cursor_track: Rc<MockCursorTrack>,
    pub cursor_device: Rc<MockCursorDevice>,
    pub cursor_manager: Rc<MockDeviceManager>,
    pub eq_manager: Rc<MockDeviceManager>,
    pub followers: HashMap<VPotMode, Rc<MockFollower>>,
    pub browser: Rc<MockBrowser>,
}

impl Fixture {
    pub fn new() -> Self {
        Self::with_sections(vec![SectionConfig::main("main")])
    }

    pub fn with_extender() -> Self {
        Self::with_sections(vec![SectionConfig::main("main"), SectionConfig::extender("xt")])
    }

    pub fn with_sections(sections: Vec<SectionConfig>) -> Self {
        let config = SurfaceConfig {
            sections,
            ..SurfaceConfig::default()
        };
        let total: usize = config.sections.iter().map(|s| s.channels).sum();
        let mut controller = match SurfaceController::new(config.clone(), Instant::now()) {
            Ok(controller) => controller,
            Err(e) => panic!("fixture config rejected: {}", e),
        };

        let tracks: Vec<_> = (0..total)
            .map(|i| MockTrack::new(&format!("Track {}", i + 1), 2))
            .collect();
        let global_tracks: Vec<_> = (0..total)
            .map(|i| MockTrack::new(&format!("Bus {}", i + 1), 0))
            .collect();
        let app = MockApp::new(2);

        for (index, section) in config.sections.iter().enumerate() {
            let offset = config.channel_offset(index);
            let slice = |all: &[Rc<MockTrack>]| -> Vec<Rc<dyn Track>> {
                all[offset..offset + section.channels]
                    .iter()
                    .map(|t| t.clone() as Rc<dyn Track>)
                    .collect()
            };
            let result = controller.init_main_control(
                index,
                &slice(&tracks),
                &slice(&global_tracks),
                app.clone(),
            );
            assert!(result.is_ok());
        }

        let followers: HashMap<_, _> = VPotMode::ALL
            .into_iter()
            .filter(|mode| mode.is_device_mode())
            .map(|mode| (mode, MockFollower::new(mode)))
            .collect();
        let cursor_manager = MockDeviceManager::new(followers[&VPotMode::Instrument].clone());
        let eq_manager = MockDeviceManager::new(followers[&VPotMode::Eq].clone());

        let mut bank = DeviceTypeBank::new();
        for (mode, follower) in &followers {
            bank.insert_follower(*mode, follower.clone());
        }
        bank.insert_device_manager(VPotMode::Instrument, cursor_manager.clone());
        bank.insert_device_manager(VPotMode::Eq, eq_manager.clone());

        let cursor_track = MockCursorTrack::new(total);
        let cursor_device = MockCursorDevice::new("");
        let browser = MockBrowser::new();
        controller.init_track_control(cursor_track.clone(), cursor_device.clone(), bank);
        controller.init_browser(browser.clone());

        Self {
            controller,
            tracks,
            global_tracks,
            app,
            cursor_track,
            cursor_device,
            cursor_manager,
            eq_manager,
            followers,
            browser,
        }
    }

    pub fn flags(&self) -> Rc<SharedSurfaceState> {
        self.controller.flags()
    }
}
