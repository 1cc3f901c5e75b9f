use std::collections::HashMap;

use log::info;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::chip::{Chip, ChipId};
use crate::error::{LayoutError, Result};
use crate::layer::{Color, LayerId, LayerStack, DEFAULT_LAYER};
use crate::sink::Style;

/// Drawing-wide switches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawingSettings {
    /// Emit fill polygons in the layer colour.
    pub solid_fill: bool,
    /// Keep named layers apart; when off everything lands on the default layer.
    pub multi_layer: bool,
    pub default_layer: String,
}

impl Default for DrawingSettings {
    fn default() -> Self {
        Self {
            solid_fill: true,
            multi_layer: true,
            default_layer: DEFAULT_LAYER.to_string(),
        }
    }
}

/// A mask drawing: layers plus the chips drawn on them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Drawing {
    pub id: Uuid,
    pub name: String,
    pub settings: DrawingSettings,
    pub layer_stack: LayerStack,
    chips: HashMap<ChipId, Chip>,
}

impl Drawing {
    pub fn new(name: &str, settings: DrawingSettings) -> Self {
        let mut layer_stack = LayerStack::new();
        layer_stack.add_layer(&settings.default_layer, Color::WHITE);
        Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            settings,
            layer_stack,
            chips: HashMap::new(),
        }
    }

    // ── Layers ───────────────────────────────────────────────────────

    pub fn add_layer(&mut self, name: &str, color: Color) -> LayerId {
        self.layer_stack.add_layer(name, color)
    }

    /// Layer to draw `name` on. Unknown names are registered on first use;
    /// with multi-layer output off every name maps to the default layer.
    pub fn layer(&mut self, name: &str) -> LayerId {
        let target = if self.settings.multi_layer {
            name
        } else {
            self.settings.default_layer.as_str()
        };
        match self.layer_stack.get_layer_by_name(target) {
            Some(layer) => layer.id,
            None => {
                let target = target.to_string();
                self.layer_stack.add_layer(&target, Color::default())
            }
        }
    }

    /// Fill colour for `layer`, or `None` when solid fill is off.
    pub fn fill_for(&self, layer: LayerId) -> Option<Color> {
        if !self.settings.solid_fill {
            return None;
        }
        self.layer_stack.get_layer(layer).map(|l| l.color)
    }

    /// Outline and fill in the colour of layer `name`.
    pub fn style_for(&mut self, name: &str) -> Style {
        let layer = self.layer(name);
        let color = self
            .layer_stack
            .get_layer(layer)
            .map(|l| l.color)
            .unwrap_or_default();
        Style::new(Some(color), self.fill_for(layer), layer)
    }

    // ── Chip management ──────────────────────────────────────────────

    pub fn add_chip(&mut self, chip: Chip) -> ChipId {
        let id = chip.id;
        info!("Drawing '{}': added chip '{}' ({})", self.name, chip.name, id);
        self.chips.insert(id, chip);
        id
    }

    /// Create a chip styled after layer `layer_name` and add it.
    pub fn new_chip(&mut self, name: &str, width: f64, height: f64, layer_name: &str) -> ChipId {
        let style = self.style_for(layer_name);
        self.add_chip(Chip::new(name, width, height).with_style(style))
    }

    pub fn chip(&self, id: &ChipId) -> Result<&Chip> {
        self.chips.get(id).ok_or(LayoutError::UnknownChip(*id))
    }

    pub fn chip_mut(&mut self, id: &ChipId) -> Result<&mut Chip> {
        self.chips.get_mut(id).ok_or(LayoutError::UnknownChip(*id))
    }

    pub fn remove_chip(&mut self, id: &ChipId) -> Option<Chip> {
        self.chips.remove(id)
    }

    pub fn find_chip_by_name(&self, name: &str) -> Option<&Chip> {
        self.chips.values().find(|c| c.name == name)
    }

    pub fn chip_count(&self) -> usize {
        self.chips.len()
    }

    pub fn all_chips(&self) -> impl Iterator<Item = &Chip> {
        self.chips.values()
    }

    // ── Serialization ────────────────────────────────────────────────

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
