//! Active layer per role and the diff-and-apply step
//!
//! `LayerState` remembers which layer currently owns each role. Applying a
//! new set first releases every role whose layer changes and only then
//! activates the incoming layers, so two layers never hold the same control
//! at once. Roles whose layer did not change are left alone (no rewrite of
//! motor positions or display buffers).

use crate::layer::{LayerId, Layers};
use crate::surface::Surface;

/// Owner of each role
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActiveLayers {
    pub fader: Option<LayerId>,
    pub encoder: Option<LayerId>,
    pub button: Option<LayerId>,
    pub display: Option<LayerId>,
}

impl ActiveLayers {
    fn roles(&self) -> [Option<LayerId>; 4] {
        [self.fader, self.encoder, self.button, self.display]
    }
}

#[derive(Debug, Default)]
pub struct LayerState {
    active: ActiveLayers,
}

impl LayerState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self) -> ActiveLayers {
        self.active
    }

    /// Switch every role to `next`; returns the number of layer changes
    pub fn apply(&mut self, next: ActiveLayers, layers: &mut Layers, surface: &mut Surface) -> usize {
        let previous = self.active.roles();
        let incoming = next.roles();
        let mut changes = 0;

        for (old, new) in previous.iter().zip(incoming.iter()) {
            if old != new {
                if let Some(old) = old {
                    if !incoming.contains(&Some(*old)) && layers.deactivate(*old, surface) {
                        changes += 1;
                    }
                }
            }
        }
        for (old, new) in previous.iter().zip(incoming.iter()) {
            if old != new {
                if let Some(new) = new {
                    if layers.activate(*new, surface) {
                        changes += 1;
                    }
                }
            }
        }

        self.active = next;
        debug_assert!(
            layers.find_conflict().is_none(),
            "conflicting layers after transition: {:?}",
            layers.find_conflict()
        );
        if changes > 0 {
            log::debug!("LayerState: {} layer change(s) -> {:?}", changes, next);
        }
        changes
    }

    /// Switch only the display role
    pub fn apply_display(
        &mut self,
        display: LayerId,
        layers: &mut Layers,
        surface: &mut Surface,
    ) -> usize {
        let next = ActiveLayers {
            display: Some(display),
            ..self.active
        };
        self.apply(next, layers, surface)
    }
}
