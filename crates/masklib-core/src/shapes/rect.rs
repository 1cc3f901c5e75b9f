use serde::{Deserialize, Serialize};

use super::{to_world, Flip, HAlign, Shape, ShapeGenerator, VAlign};
use crate::error::{ensure_finite, Result};
use crate::geometry::{Placement, Point};

/// Axis-aligned (before rotation) rectangle. Width and height may be negative,
/// which mirrors the rectangle about the insertion edge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rectangle {
    pub placement: Placement,
    pub width: f64,
    pub height: f64,
    pub halign: HAlign,
    pub valign: VAlign,
}

impl Rectangle {
    pub fn new(placement: Placement, width: f64, height: f64) -> Self {
        Self {
            placement,
            width,
            height,
            halign: HAlign::Left,
            valign: VAlign::Bottom,
        }
    }

    pub fn with_halign(mut self, halign: HAlign) -> Self {
        self.halign = halign;
        self
    }

    pub fn with_valign(mut self, valign: VAlign) -> Self {
        self.valign = valign;
        self
    }
}

impl ShapeGenerator for Rectangle {
    fn build(&self) -> Result<Shape> {
        ensure_finite(
            "Rectangle",
            &[
                self.width,
                self.height,
                self.placement.position.x,
                self.placement.position.y,
                self.placement.rotation,
            ],
        )?;
        let align = Point::new(self.halign.offset(self.width), self.valign.offset(self.height));
        let local = [
            Point::new(0.0, 0.0),
            Point::new(self.width, 0.0),
            Point::new(self.width, self.height),
            Point::new(0.0, self.height),
        ]
        .map(|p| p + align);
        let points = to_world(&local, self.placement, Flip::NONE);
        Ok(Shape::new(points.clone(), vec![points]))
    }
}
