//! Mixer layers for one track bank
//!
//! Each section has two groups: the main group follows the mixer track bank,
//! the global group follows the global bank (shown while global view is on).
//! A group owns a fader, encoder and display layer per parameter family plus
//! the channel button layer. Configurations only keep the group's `LayerId`s
//! (`GroupRefs`); the group itself is needed once, when wiring tracks.

use crate::binding::{
    parameter_encoder, parameter_fader, parameter_motor, parameter_press_reset, parameter_ring,
    parameter_touch_reset, Binding, ParameterSource,
};
use crate::host::{HostApplication, Parameter, Track};
use crate::layer::{DisplayLayer, LayerId, Layers};
use crate::shared_state::{ModeContext, Modifiers, SharedSurfaceState};
use crate::surface::TextSource;
use crate::types::{ChannelButton, ParamElement};
use std::rc::Rc;

/// Resolved layer ids of one group
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupRefs {
    faders: [LayerId; 3],
    encoders: [LayerId; 3],
    displays: [LayerId; 3],
    buttons: LayerId,
}

impl GroupRefs {
    pub fn fader_layer(&self, element: ParamElement) -> LayerId {
        self.faders[element.index()]
    }

    pub fn encoder_layer(&self, element: ParamElement) -> LayerId {
        self.encoders[element.index()]
    }

    pub fn display_layer(&self, element: ParamElement) -> LayerId {
        self.displays[element.index()]
    }

    pub fn button_layer(&self) -> LayerId {
        self.buttons
    }
}

/// Main and global group of a section
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MixerGroupRefs {
    pub main: GroupRefs,
    pub global: GroupRefs,
}

impl MixerGroupRefs {
    /// Group selected by the global-view flag
    pub fn active(&self, ctx: &ModeContext) -> &GroupRefs {
        if ctx.global_view {
            &self.global
        } else {
            &self.main
        }
    }
}

pub struct MixerLayerGroup {
    name: String,
    channels: usize,
    faders: [LayerId; 3],
    encoders: [LayerId; 3],
    displays: [DisplayLayer; 3],
    buttons: LayerId,
}

impl MixerLayerGroup {
    pub fn new(name: &str, section_index: usize, channels: usize, layers: &mut Layers) -> Self {
        let faders = ParamElement::ALL.map(|element| {
            layers.create(format!("{}_{}_FADER_{}", name, element.label(), section_index))
        });
        let encoders = ParamElement::ALL.map(|element| {
            layers.create(format!("{}_{}_ENCODER_{}", name, element.label(), section_index))
        });
        let displays = ParamElement::ALL.map(|element| {
            layers.create_display(
                format!("{}_{}_DISPLAY_{}", name, element.label(), section_index),
                channels,
            )
        });
        let buttons = layers.create(format!("{}_BUTTONS_{}", name, section_index));
        Self {
            name: name.to_string(),
            channels,
            faders,
            encoders,
            displays,
            buttons,
        }
    }

    pub fn refs(&self) -> GroupRefs {
        GroupRefs {
            faders: self.faders,
            encoders: self.encoders,
            displays: [self.displays[0].id, self.displays[1].id, self.displays[2].id],
            buttons: self.buttons,
        }
    }

    /// Bind the group's layers to `tracks` (one per channel strip)
    pub fn init(
        &self,
        layers: &mut Layers,
        tracks: &[Rc<dyn Track>],
        app: Rc<dyn HostApplication>,
        flags: Rc<SharedSurfaceState>,
        encoder_step: f64,
    ) {
        if tracks.len() < self.channels {
            log::debug!(
                "MixerLayerGroup '{}': {} tracks for {} channels",
                self.name,
                tracks.len(),
                self.channels
            );
        }
        for (index, track) in tracks.iter().take(self.channels).enumerate() {
            for element in ParamElement::ALL {
                let source = parameter_source(track, element, &flags);
                self.bind_parameter(layers, index, element, source, &flags, encoder_step);
                self.bind_display(index, element, track.clone(), &flags);
            }
            self.bind_buttons(layers, index, track.clone(), app.clone(), flags.clone());
        }
        log::info!(
            "MixerLayerGroup '{}': bound {} channels",
            self.name,
            tracks.len().min(self.channels)
        );
    }

    fn bind_parameter(
        &self,
        layers: &mut Layers,
        index: usize,
        element: ParamElement,
        source: ParameterSource,
        flags: &Rc<SharedSurfaceState>,
        encoder_step: f64,
    ) {
        let fader = self.faders[element.index()];
        layers.add_binding(fader, parameter_fader(index, source.clone()));
        layers.add_binding(fader, parameter_motor(index, source.clone()));
        layers.add_binding(
            fader,
            parameter_touch_reset(index, source.clone(), flags.clone()),
        );

        let encoder = self.encoders[element.index()];
        layers.add_binding(encoder, parameter_encoder(index, source.clone(), encoder_step));
        layers.add_binding(
            encoder,
            parameter_ring(index, source.clone(), element.ring_type()),
        );
        layers.add_binding(encoder, parameter_press_reset(index, source));
    }

    /// Upper row shows the track (or send) name, lower row the value
    fn bind_display(
        &self,
        index: usize,
        element: ParamElement,
        track: Rc<dyn Track>,
        flags: &Rc<SharedSurfaceState>,
    ) {
        let mut content = self.displays[element.index()].content.borrow_mut();
        let value_source = parameter_source(&track, element, flags);
        match element {
            ParamElement::SendMixer => {
                let name_source = value_source.clone();
                content.bind_cell(
                    0,
                    index,
                    TextSource::dynamic(move || {
                        name_source()
                            .filter(|send| send.exists())
                            .map(|send| send.name())
                            .unwrap_or_default()
                    }),
                );
            }
            _ => {
                let track = track.clone();
                content.bind_cell(
                    0,
                    index,
                    TextSource::dynamic(move || {
                        if track.exists() {
                            track.name()
                        } else {
                            String::new()
                        }
                    }),
                );
            }
        }
        content.bind_cell(
            1,
            index,
            TextSource::dynamic(move || {
                value_source()
                    .filter(|parameter| parameter.exists())
                    .map(|parameter| parameter.display_value())
                    .unwrap_or_default()
            }),
        );
    }

    fn bind_buttons(
        &self,
        layers: &mut Layers,
        index: usize,
        track: Rc<dyn Track>,
        app: Rc<dyn HostApplication>,
        flags: Rc<SharedSurfaceState>,
    ) {
        let id = self.buttons;

        let t = track.clone();
        layers.add_binding(
            id,
            Binding::button(ChannelButton::RecArm, index, move || {
                if t.exists() {
                    t.set_armed(!t.is_armed());
                }
            }),
        );
        let t = track.clone();
        layers.add_binding(
            id,
            Binding::led(ChannelButton::RecArm, index, move || {
                t.exists() && t.is_armed()
            }),
        );

        let t = track.clone();
        layers.add_binding(
            id,
            Binding::button(ChannelButton::Solo, index, move || handle_solo(&*t)),
        );
        let t = track.clone();
        layers.add_binding(
            id,
            Binding::led(ChannelButton::Solo, index, move || t.exists() && t.is_solo()),
        );

        let t = track.clone();
        layers.add_binding(
            id,
            Binding::button(ChannelButton::Mute, index, move || {
                if t.exists() {
                    t.set_muted(!t.is_muted());
                }
            }),
        );
        let t = track.clone();
        layers.add_binding(
            id,
            Binding::led(ChannelButton::Mute, index, move || t.exists() && t.is_muted()),
        );

        let t = track.clone();
        layers.add_binding(
            id,
            Binding::button(ChannelButton::Select, index, move || {
                handle_track_selection(&*t, &*app, flags.modifiers())
            }),
        );
        layers.add_binding(
            id,
            Binding::led(ChannelButton::Select, index, move || {
                track.exists() && track.is_selected()
            }),
        );
    }
}

fn parameter_source(
    track: &Rc<dyn Track>,
    element: ParamElement,
    flags: &Rc<SharedSurfaceState>,
) -> ParameterSource {
    let track = track.clone();
    match element {
        ParamElement::Volume => Rc::new(move || Some(track.volume())),
        ParamElement::Pan => Rc::new(move || Some(track.pan())),
        ParamElement::SendMixer => {
            let flags = flags.clone();
            Rc::new(move || -> Option<Rc<dyn Parameter>> { track.send(flags.send_index()) })
        }
    }
}

fn handle_solo(track: &dyn Track) {
    if !track.exists() {
        return;
    }
    track.set_solo(!track.is_solo());
}

/// Select an existing track, or create one on an empty strip
///
/// Modifiers pick the variant: control deletes, alt stops, option enters a
/// group. On an empty strip shift creates an audio track, alt an effect
/// track and no modifier an instrument track.
fn handle_track_selection(track: &dyn Track, app: &dyn HostApplication, modifiers: Modifiers) {
    if track.exists() {
        if modifiers.is_control() {
            track.delete();
        } else if modifiers.is_alt() {
            track.stop();
        } else if modifiers.is_option() {
            track.enter_group();
        } else {
            track.select_in_mixer();
        }
    } else if modifiers.is_shift() {
        app.create_audio_track();
    } else if modifiers.is_alt() {
        app.create_effect_track();
    } else {
        app.create_instrument_track();
    }
}
