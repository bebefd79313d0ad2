//! Layers and the per-section layer registry
//!
//! A layer is a named group of bindings switched as a unit. Layers live in
//! an arena (`Layers`) and are addressed by a copyable `LayerId`; they are
//! created while a section is wired and never removed.
//!
//! The registry only does bookkeeping. Which layer owns a role is decided by
//! the configurations and applied by `LayerState`, which always releases a
//! role's previous layer before activating the next one.

use crate::binding::Binding;
use crate::surface::{DisplayContent, DisplayHandle, Surface};
use crate::types::ControlId;
use std::collections::HashMap;

/// Handle to a layer in its section's registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LayerId(usize);

impl LayerId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Named, ordered set of bindings
#[derive(Debug)]
pub struct Layer {
    name: String,
    bindings: Vec<Binding>,
    active: bool,
}

impl Layer {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            bindings: Vec::new(),
            active: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn bindings(&self) -> &[Binding] {
        &self.bindings
    }

    /// Controls occupied by this layer's bindings
    pub fn controls(&self) -> impl Iterator<Item = ControlId> + '_ {
        self.bindings.iter().map(Binding::source)
    }

    /// Switch every binding in insertion order
    ///
    /// Returns false if the layer already was in the requested state.
    fn set_active(&mut self, active: bool, surface: &mut Surface) -> bool {
        if self.active == active {
            return false;
        }
        self.active = active;
        for binding in &mut self.bindings {
            if active {
                binding.activate(surface);
            } else {
                binding.deactivate(surface);
            }
        }
        log::trace!(
            "Layer '{}': {} ({} bindings)",
            self.name,
            if active { "activated" } else { "deactivated" },
            self.bindings.len()
        );
        true
    }
}

/// A display layer together with the content it attaches to the LCD
#[derive(Debug, Clone)]
pub struct DisplayLayer {
    pub id: LayerId,
    pub content: DisplayHandle,
}

/// Two active layers occupying the same control
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerConflict {
    pub control: ControlId,
    pub first: LayerId,
    pub second: LayerId,
}

/// Arena of all layers of one section
#[derive(Debug, Default)]
pub struct Layers {
    layers: Vec<Layer>,
}

impl Layers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty, inactive layer
    pub fn create(&mut self, name: impl Into<String>) -> LayerId {
        let id = LayerId(self.layers.len());
        self.layers.push(Layer::new(name));
        id
    }

    /// Create a layer owning the LCD with fresh display content
    pub fn create_display(&mut self, name: impl Into<String>, channels: usize) -> DisplayLayer {
        let name = name.into();
        let content = DisplayContent::shared(name.clone(), channels);
        let id = self.create(name);
        self.add_binding(id, Binding::display(content.clone()));
        DisplayLayer { id, content }
    }

    /// Append a binding
    ///
    /// Bindings added to an active layer stay inactive until the layer is
    /// switched off and on again.
    pub fn add_binding(&mut self, id: LayerId, binding: Binding) {
        match self.layers.get_mut(id.0) {
            Some(layer) => {
                if layer.active {
                    log::debug!(
                        "Layers: binding {:?} added to active layer '{}' stays inactive",
                        binding.source(),
                        layer.name
                    );
                }
                layer.bindings.push(binding);
            }
            None => log::warn!("Layers: add_binding on unknown layer {:?}", id),
        }
    }

    /// Returns true if the layer changed state
    pub fn activate(&mut self, id: LayerId, surface: &mut Surface) -> bool {
        self.layers
            .get_mut(id.0)
            .is_some_and(|layer| layer.set_active(true, surface))
    }

    /// Returns true if the layer changed state
    pub fn deactivate(&mut self, id: LayerId, surface: &mut Surface) -> bool {
        self.layers
            .get_mut(id.0)
            .is_some_and(|layer| layer.set_active(false, surface))
    }

    pub fn is_active(&self, id: LayerId) -> bool {
        self.layers.get(id.0).is_some_and(|layer| layer.active)
    }

    pub fn get(&self, id: LayerId) -> Option<&Layer> {
        self.layers.get(id.0)
    }

    pub fn name(&self, id: LayerId) -> &str {
        self.layers.get(id.0).map(Layer::name).unwrap_or("<unknown>")
    }

    /// Look a layer up by name
    pub fn find(&self, name: &str) -> Option<LayerId> {
        self.layers
            .iter()
            .position(|layer| layer.name == name)
            .map(LayerId)
    }

    /// All currently active layers, in creation order
    pub fn active_layers(&self) -> Vec<LayerId> {
        self.layers
            .iter()
            .enumerate()
            .filter(|(_, layer)| layer.active)
            .map(|(index, _)| LayerId(index))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// First control bound by two active layers at once, if any
    pub fn find_conflict(&self) -> Option<LayerConflict> {
        let mut owners: HashMap<ControlId, LayerId> = HashMap::new();
        for (index, layer) in self.layers.iter().enumerate() {
            if !layer.active {
                continue;
            }
            for control in layer.controls() {
                match owners.get(&control) {
                    Some(&first) if first.0 != index => {
                        return Some(LayerConflict {
                            control,
                            first,
                            second: LayerId(index),
                        });
                    }
                    _ => {
                        owners.insert(control, LayerId(index));
                    }
                }
            }
        }
        None
    }
}
