//! Where generated geometry goes.
//!
//! Shape generators never know about files or documents; they push outlines
//! and convex fill polygons into a [`GeometrySink`] together with a colour
//! and a layer.

use serde::{Deserialize, Serialize};

use crate::geometry::{BBox, Outline, Point};
use crate::layer::{Color, LayerId};

/// Colours and layer applied to emitted geometry. A `None` colour suppresses
/// that artifact.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Style {
    pub outline: Option<Color>,
    pub fill: Option<Color>,
    pub layer: LayerId,
}

impl Style {
    pub fn new(outline: Option<Color>, fill: Option<Color>, layer: LayerId) -> Self {
        Self {
            outline,
            fill,
            layer,
        }
    }

    pub fn with_fill(mut self, fill: Option<Color>) -> Self {
        self.fill = fill;
        self
    }

    pub fn on_layer(mut self, layer: LayerId) -> Self {
        self.layer = layer;
        self
    }
}

impl Default for Style {
    fn default() -> Self {
        Self {
            outline: Some(Color::WHITE),
            fill: None,
            layer: 0,
        }
    }
}

/// Receiver of generated geometry.
pub trait GeometrySink {
    /// Style used when the caller does not override it.
    fn style(&self) -> Style;

    fn add_outline(&mut self, outline: &Outline, color: Color, layer: LayerId);

    fn add_filled_polygon(&mut self, points: &[Point], color: Color, layer: LayerId);
}

/// One emitted artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Entity {
    Outline {
        outline: Outline,
        color: Color,
        layer: LayerId,
    },
    Fill {
        points: Vec<Point>,
        color: Color,
        layer: LayerId,
    },
}

impl Entity {
    pub fn layer(&self) -> LayerId {
        match self {
            Entity::Outline { layer, .. } | Entity::Fill { layer, .. } => *layer,
        }
    }

    pub fn color(&self) -> Color {
        match self {
            Entity::Outline { color, .. } | Entity::Fill { color, .. } => *color,
        }
    }

    pub fn points(&self) -> &[Point] {
        match self {
            Entity::Outline { outline, .. } => &outline.points,
            Entity::Fill { points, .. } => points,
        }
    }

    pub fn bbox(&self) -> Option<BBox> {
        BBox::from_points(self.points())
    }

    /// Push this entity into another sink.
    pub fn replay(&self, sink: &mut dyn GeometrySink) {
        match self {
            Entity::Outline {
                outline,
                color,
                layer,
            } => sink.add_outline(outline, *color, *layer),
            Entity::Fill {
                points,
                color,
                layer,
            } => sink.add_filled_polygon(points, *color, *layer),
        }
    }
}

/// Buffers entities in memory.
///
/// Composite routing calls draw into a recorder first and only replay into
/// the real sink once every step has succeeded.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Recorder {
    style: Style,
    entities: Vec<Entity>,
}

impl Recorder {
    pub fn new(style: Style) -> Self {
        Self {
            style,
            entities: Vec::new(),
        }
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn replay_into(&self, sink: &mut dyn GeometrySink) {
        for entity in &self.entities {
            entity.replay(sink);
        }
    }

    pub fn into_entities(self) -> Vec<Entity> {
        self.entities
    }
}

impl GeometrySink for Recorder {
    fn style(&self) -> Style {
        self.style
    }

    fn add_outline(&mut self, outline: &Outline, color: Color, layer: LayerId) {
        self.entities.push(Entity::Outline {
            outline: outline.clone(),
            color,
            layer,
        });
    }

    fn add_filled_polygon(&mut self, points: &[Point], color: Color, layer: LayerId) {
        self.entities.push(Entity::Fill {
            points: points.to_vec(),
            color,
            layer,
        });
    }
}

/// Forwards to an inner sink but reports a different style.
pub struct Restyled<'a> {
    inner: &'a mut dyn GeometrySink,
    style: Style,
}

impl<'a> Restyled<'a> {
    pub fn new(inner: &'a mut dyn GeometrySink, style: Style) -> Self {
        Self { inner, style }
    }

    /// Keep the inner sink's outline colour and layer, replace the fill.
    pub fn fill(inner: &'a mut dyn GeometrySink, fill: Option<Color>) -> Self {
        let style = inner.style().with_fill(fill);
        Self { inner, style }
    }
}

impl GeometrySink for Restyled<'_> {
    fn style(&self) -> Style {
        self.style
    }

    fn add_outline(&mut self, outline: &Outline, color: Color, layer: LayerId) {
        self.inner.add_outline(outline, color, layer);
    }

    fn add_filled_polygon(&mut self, points: &[Point], color: Color, layer: LayerId) {
        self.inner.add_filled_polygon(points, color, layer);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle() -> Vec<Point> {
        vec![Point::new(0.0, 0.0), Point::new(1.0, 0.0), Point::new(0.0, 1.0)]
    }

    #[test]
    fn test_recorder_replays_in_order() {
        let mut staged = Recorder::new(Style::default());
        staged.add_outline(&Outline::new(triangle()), Color::WHITE, 0);
        staged.add_filled_polygon(&triangle(), Color::BLACK, 2);

        let mut target = Recorder::new(Style::default());
        staged.replay_into(&mut target);
        assert_eq!(target.entities(), staged.entities());
        assert_eq!(target.entities()[1].layer(), 2);
    }

    #[test]
    fn test_restyled_overrides_fill_only() {
        let mut target = Recorder::new(Style::new(Some(Color::WHITE), None, 3));
        let restyled = Restyled::fill(&mut target, Some(Color::BLACK));
        let style = restyled.style();
        assert_eq!(style.fill, Some(Color::BLACK));
        assert_eq!(style.outline, Some(Color::WHITE));
        assert_eq!(style.layer, 3);
    }

    #[test]
    fn test_entity_bbox() {
        let entity = Entity::Fill {
            points: triangle(),
            color: Color::WHITE,
            layer: 0,
        };
        let bb = entity.bbox().unwrap();
        assert_eq!(bb.max, Point::new(1.0, 1.0));
    }
}
