//! Modal browser configuration
//!
//! Takes over the section while the host's popup browser is open, but only
//! if the surface itself asked for browsing. Opening snapshots the current
//! configuration; closing restores it unless the browser was force-closed
//! by a mode change, in which case the new mode stays.

use super::ConfigId;
use crate::binding::Binding;
use crate::host::{BrowserColumn, BrowserFilterCursor, PopupBrowser};
use crate::layer::{DisplayLayer, LayerId, Layers};
use crate::mixer_group::MixerGroupRefs;
use crate::shared_state::ModeContext;
use crate::surface::TextSource;
use crate::types::{ParamElement, RingDisplayType};
use std::rc::Rc;

/// Encoder slots of the fixed controls
const AUDITION_SLOT: usize = 0;
const CANCEL_SLOT: usize = 6;
const RESULT_SLOT: usize = 7;

pub struct BrowserConfiguration {
    name: String,
    groups: MixerGroupRefs,
    encoder: LayerId,
    display: DisplayLayer,
    browser: Option<Rc<dyn PopupBrowser>>,
    device_type: Option<Rc<dyn BrowserFilterCursor>>,
    previous: Option<ConfigId>,
    browsing_initiated: bool,
    /// Cleared by `force_close` to keep the configuration that closed it
    restore_on_close: bool,
}

impl BrowserConfiguration {
    pub fn new(
        name: &str,
        section_index: usize,
        channels: usize,
        groups: MixerGroupRefs,
        layers: &mut Layers,
    ) -> Self {
        let encoder = layers.create(format!("{}_ENCODER_LAYER_{}", name, section_index));
        let display = layers.create_display(format!("{}_DISPLAY_{}", name, section_index), channels);
        Self {
            name: name.to_string(),
            groups,
            encoder,
            display,
            browser: None,
            device_type: None,
            previous: None,
            browsing_initiated: false,
            restore_on_close: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Bind the filter columns and result list of `browser`
    pub fn init(&mut self, layers: &mut Layers, browser: Rc<dyn PopupBrowser>) {
        let mut content = self.display.content.borrow_mut();

        for (index, column) in BrowserColumn::ALL.into_iter().enumerate() {
            let cursor = browser.column(column);
            if column == BrowserColumn::DeviceType {
                self.device_type = Some(cursor.clone());
            }
            content.bind_cell(0, index, TextSource::fixed(column.label()));
            let name = cursor.clone();
            content.bind_cell(1, index, TextSource::dynamic(move || name.name()));

            layers.add_binding(
                self.encoder,
                Binding::ring(index, RingDisplayType::FillFromZero, || 1.0),
            );
            layers.add_binding(
                self.encoder,
                increment_binding(index, move |forward| {
                    if forward {
                        cursor.select_next();
                    } else {
                        cursor.select_previous();
                    }
                }),
            );
        }

        let b = browser.clone();
        layers.add_binding(
            self.encoder,
            Binding::encoder_press(AUDITION_SLOT, move || b.toggle_audition()),
        );

        content.bind_cell(0, CANCEL_SLOT, TextSource::fixed("<Cncl>"));
        let b = browser.clone();
        layers.add_binding(self.encoder, Binding::encoder_press(CANCEL_SLOT, move || b.cancel()));

        content.bind_cell(0, RESULT_SLOT, TextSource::fixed("<Okay>"));
        let b = browser.clone();
        content.bind_cell(1, RESULT_SLOT, TextSource::dynamic(move || b.result_name()));
        let b = browser.clone();
        layers.add_binding(self.encoder, Binding::encoder_press(RESULT_SLOT, move || b.commit()));
        let b = browser.clone();
        layers.add_binding(
            self.encoder,
            increment_binding(RESULT_SLOT, move |forward| {
                if forward {
                    b.select_next_file();
                } else {
                    b.select_previous_file();
                }
            }),
        );

        drop(content);
        self.browser = Some(browser);
        log::info!("BrowserConfiguration '{}': browser bound", self.name);
    }

    pub fn is_wired(&self) -> bool {
        self.browser.is_some()
    }

    /// Arm (or disarm) the takeover on the next browser open
    pub fn set_browsing_initiated(&mut self, initiated: bool) {
        self.browsing_initiated = initiated;
        if let Some(cursor) = &self.device_type {
            cursor.select_first();
        }
    }

    pub fn is_browsing_initiated(&self) -> bool {
        self.browsing_initiated
    }

    /// Configuration to return to when the browser closes
    pub fn previous_configuration(&self) -> Option<ConfigId> {
        self.previous
    }

    /// React to the host browser opening or closing
    ///
    /// Returns the configuration the section should switch to, if any.
    pub fn notify_browser_exists(&mut self, open: bool, current: ConfigId) -> Option<ConfigId> {
        if !self.browsing_initiated {
            return None;
        }
        if open {
            self.restore_on_close = true;
            self.previous = Some(current);
            log::debug!("BrowserConfiguration: taking over from {:?}", current);
            return Some(ConfigId::Browser);
        }
        let previous = self.previous.take()?;
        self.browsing_initiated = false;
        if self.restore_on_close {
            log::debug!("BrowserConfiguration: restoring {:?}", previous);
            Some(previous)
        } else {
            log::debug!("BrowserConfiguration: closed by mode change, not restoring");
            None
        }
    }

    /// Cancel an open browser without restoring the snapshot on close
    pub fn force_close(&mut self) {
        let Some(browser) = &self.browser else {
            return;
        };
        if browser.exists() {
            self.restore_on_close = false;
            browser.cancel();
        }
    }

    pub fn fader_layer(&self, ctx: &ModeContext) -> LayerId {
        self.groups.active(ctx).fader_layer(ParamElement::Volume)
    }

    pub fn encoder_layer(&self, _ctx: &ModeContext) -> LayerId {
        self.encoder
    }

    pub fn button_layer(&self, ctx: &ModeContext) -> LayerId {
        self.groups.active(ctx).button_layer()
    }

    pub fn display_layer(&self, _row: usize, _ctx: &ModeContext) -> LayerId {
        self.display.id
    }
}

/// Map encoder steps to single next/previous calls
///
/// Every step counts, so a fast turn of three steps moves three entries.
fn increment_binding(index: usize, step: impl Fn(bool) + 'static) -> Binding {
    Binding::encoder_turn(index, move |delta| {
        for _ in 0..delta.unsigned_abs() {
            step(delta > 0);
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mixer_group::MixerLayerGroup;
    use crate::surface::{Surface, SurfaceInput};
    use crate::testing::MockBrowser;

    fn browser_config() -> (Layers, BrowserConfiguration, Rc<MockBrowser>) {
        let mut layers = Layers::new();
        let groups = MixerGroupRefs {
            main: MixerLayerGroup::new("MAIN", 0, 8, &mut layers).refs(),
            global: MixerLayerGroup::new("GLOBAL", 0, 8, &mut layers).refs(),
        };
        let mut config = BrowserConfiguration::new("BROWSER", 0, 8, groups, &mut layers);
        let browser = MockBrowser::new();
        config.init(&mut layers, browser.clone());
        (layers, config, browser)
    }

    #[test]
    fn test_ignored_unless_initiated() {
        let (_, mut config, _) = browser_config();
        assert_eq!(config.notify_browser_exists(true, ConfigId::Pan), None);
        assert_eq!(config.notify_browser_exists(false, ConfigId::Pan), None);
    }

    #[test]
    fn test_open_and_restore() {
        let (_, mut config, browser) = browser_config();
        config.set_browsing_initiated(true);
        assert_eq!(browser.column_cursor(BrowserColumn::DeviceType).first_count(), 1);

        assert_eq!(
            config.notify_browser_exists(true, ConfigId::CursorDevice),
            Some(ConfigId::Browser)
        );
        assert_eq!(config.previous_configuration(), Some(ConfigId::CursorDevice));
        assert_eq!(
            config.notify_browser_exists(false, ConfigId::Browser),
            Some(ConfigId::CursorDevice)
        );
        assert!(!config.is_browsing_initiated());
    }

    #[test]
    fn test_force_close_suppresses_restore() {
        let (_, mut config, browser) = browser_config();
        config.set_browsing_initiated(true);
        config.notify_browser_exists(true, ConfigId::Eq);
        browser.set_open(true);

        config.force_close();
        assert_eq!(browser.cancel_count(), 1);
        assert_eq!(config.notify_browser_exists(false, ConfigId::Pan), None);
        assert!(!config.is_browsing_initiated());
    }

    #[test]
    fn test_encoders_step_columns() {
        let (mut layers, config, browser) = browser_config();
        let mut surface = Surface::new(0, 8);
        layers.activate(config.encoder_layer(&ModeContext::default()), &mut surface);

        surface.handle_input(SurfaceInput::EncoderTurn { index: 3, delta: 2 });
        surface.handle_input(SurfaceInput::EncoderTurn { index: 3, delta: -1 });
        let category = browser.column_cursor(BrowserColumn::Category);
        assert_eq!(category.position(), 1);

        surface.handle_input(SurfaceInput::EncoderTurn { index: 7, delta: -3 });
        assert_eq!(browser.file_position(), -3);

        surface.handle_input(SurfaceInput::EncoderPress { index: 7, pressed: true });
        surface.handle_input(SurfaceInput::EncoderPress { index: 0, pressed: true });
        assert_eq!(browser.commit_count(), 1);
        assert!(browser.is_auditioning());
        assert_eq!(surface.ring_value(0), 0x2B);
    }

    #[test]
    fn test_display_labels() {
        let (mut layers, config, _) = browser_config();
        let mut surface = Surface::new(0, 8);
        layers.activate(config.display_layer(0, &ModeContext::default()), &mut surface);
        let [upper, _] = surface.display_lines().clone();
        assert!(upper.starts_with("Type   DevLoc FlType Catgry Creatr        <Cncl> <Okay> "));
    }
}
