use serde::{Deserialize, Serialize};

/// Index of a mask layer within a [`LayerStack`].
pub type LayerId = u32;

/// The layer every drawing starts with.
pub const DEFAULT_LAYER: &str = "0";

/// RGB colour of an entity or layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const BLACK: Color = Color::rgb(0, 0, 0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::rgb(128, 128, 128)
    }
}

/// A named mask layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    pub id: LayerId,
    pub name: String,
    pub color: Color,
    pub description: String,
}

impl Layer {
    pub fn new(id: LayerId, name: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            color: Color::default(),
            description: String::new(),
        }
    }

    pub fn with_color(mut self, r: u8, g: u8, b: u8) -> Self {
        self.color = Color::rgb(r, g, b);
        self
    }

    pub fn with_description(mut self, desc: &str) -> Self {
        self.description = desc.to_string();
        self
    }
}

/// The ordered set of layers of a drawing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerStack {
    layers: Vec<Layer>,
}

impl LayerStack {
    /// A stack holding only the default layer `"0"`.
    pub fn new() -> Self {
        Self {
            layers: vec![Layer::new(0, DEFAULT_LAYER).with_color(255, 255, 255)],
        }
    }

    /// Register a layer under `name`, returning the existing id if the name
    /// is already taken.
    pub fn add_layer(&mut self, name: &str, color: Color) -> LayerId {
        if let Some(existing) = self.get_layer_by_name(name) {
            return existing.id;
        }
        let id = self.layers.len() as LayerId;
        let mut layer = Layer::new(id, name);
        layer.color = color;
        self.layers.push(layer);
        id
    }

    pub fn get_layer(&self, id: LayerId) -> Option<&Layer> {
        self.layers.iter().find(|l| l.id == id)
    }

    pub fn get_layer_mut(&mut self, id: LayerId) -> Option<&mut Layer> {
        self.layers.iter_mut().find(|l| l.id == id)
    }

    pub fn get_layer_by_name(&self, name: &str) -> Option<&Layer> {
        self.layers.iter().find(|l| l.name == name)
    }

    pub fn all_layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }
}

impl Default for LayerStack {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stack_starts_with_default_layer() {
        let stack = LayerStack::new();
        assert_eq!(stack.layer_count(), 1);
        assert_eq!(stack.get_layer(0).unwrap().name, DEFAULT_LAYER);
    }

    #[test]
    fn test_add_layer_is_idempotent_by_name() {
        let mut stack = LayerStack::new();
        let a = stack.add_layer("METAL", Color::rgb(0, 0, 255));
        let b = stack.add_layer("METAL", Color::rgb(255, 0, 0));
        assert_eq!(a, b);
        assert_eq!(stack.layer_count(), 2);
        assert_eq!(stack.get_layer(a).unwrap().color, Color::rgb(0, 0, 255));
    }
}
