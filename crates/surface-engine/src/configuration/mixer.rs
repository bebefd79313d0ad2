//! Mixer-parameter configuration (PAN, SEND)

use super::{NavigateHandler, Navigation};
use crate::layer::LayerId;
use crate::mixer_group::MixerGroupRefs;
use crate::shared_state::ModeContext;
use crate::types::ParamElement;

/// Faders on volume, encoders on one mixer parameter family
///
/// Flip swaps the two families between faders and encoders.
pub struct MixerConfiguration {
    name: String,
    groups: MixerGroupRefs,
    encoder_assign: ParamElement,
    navigation: Navigation,
}

impl MixerConfiguration {
    pub fn new(name: impl Into<String>, groups: MixerGroupRefs, encoder_assign: ParamElement) -> Self {
        Self {
            name: name.into(),
            groups,
            encoder_assign,
            navigation: Navigation::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn encoder_assign(&self) -> ParamElement {
        self.encoder_assign
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

    pub fn fader_layer(&self, ctx: &ModeContext) -> LayerId {
        let group = self.groups.active(ctx);
        if ctx.flipped {
            group.fader_layer(self.encoder_assign)
        } else {
            group.fader_layer(ParamElement::Volume)
        }
    }

    pub fn encoder_layer(&self, ctx: &ModeContext) -> LayerId {
        let group = self.groups.active(ctx);
        if ctx.flipped {
            group.encoder_layer(ParamElement::Volume)
        } else {
            group.encoder_layer(self.encoder_assign)
        }
    }

    pub fn button_layer(&self, ctx: &ModeContext) -> LayerId {
        self.groups.active(ctx).button_layer()
    }

    pub fn display_layer(&self, row: usize, ctx: &ModeContext) -> LayerId {
        let group = self.groups.active(ctx);
        if row == 0 {
            group.display_layer(self.encoder_assign)
        } else {
            group.display_layer(ParamElement::Volume)
        }
    }
}
