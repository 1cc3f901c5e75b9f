use serde::{Deserialize, Serialize};

use super::{to_world, Flip, HAlign, Shape, ShapeGenerator, VAlign};
use crate::error::{ensure_finite, Result};
use crate::geometry::{Placement, Point};

/// Edge of the parent rectangle, indexed counterclockwise from the bottom.
///
/// ```text
///  (3)-Top-(2)
///   |       |
///  Left   Right
///   |       |
///  (0)-Bot-(1)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Edge {
    Bottom,
    #[default]
    Right,
    Top,
    Left,
}

impl Edge {
    fn index(self) -> usize {
        match self {
            Edge::Bottom => 0,
            Edge::Right => 1,
            Edge::Top => 2,
            Edge::Left => 3,
        }
    }

    fn is_horizontal(self) -> bool {
        matches!(self, Edge::Bottom | Edge::Top)
    }
}

/// A rectangle with one edge resized to `new_length` and shifted by `offset`.
///
/// Alignment is computed against the unskewed parent rectangle, so a taper
/// stays anchored where the plain rectangle would be. `edge_align` biases the
/// resized edge along its own direction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SkewRect {
    pub placement: Placement,
    pub width: f64,
    pub height: f64,
    pub offset: Point,
    pub new_length: f64,
    pub edge: Edge,
    pub halign: HAlign,
    pub valign: VAlign,
    pub edge_align: VAlign,
}

impl SkewRect {
    pub fn new(
        placement: Placement,
        width: f64,
        height: f64,
        offset: Point,
        new_length: f64,
    ) -> Self {
        Self {
            placement,
            width,
            height,
            offset,
            new_length,
            edge: Edge::Right,
            halign: HAlign::Left,
            valign: VAlign::Bottom,
            edge_align: VAlign::Middle,
        }
    }

    pub fn with_edge(mut self, edge: Edge) -> Self {
        self.edge = edge;
        self
    }

    pub fn with_halign(mut self, halign: HAlign) -> Self {
        self.halign = halign;
        self
    }

    pub fn with_valign(mut self, valign: VAlign) -> Self {
        self.valign = valign;
        self
    }

    pub fn with_edge_align(mut self, edge_align: VAlign) -> Self {
        self.edge_align = edge_align;
        self
    }

    /// Corner points in the local frame, alignment applied.
    pub fn local_corners(&self) -> [Point; 4] {
        let (w, h) = (self.width, self.height);
        let mut pts = [
            Point::new(0.0, 0.0),
            Point::new(w, 0.0),
            Point::new(w, h),
            Point::new(0.0, h),
        ];

        let i = self.edge.index();
        let j = (i + 1) % 4;
        let direction = if i / 2 > 0 { -1.0 } else { 1.0 };
        let base = if self.edge.is_horizontal() { w } else { h };
        let delta = 0.5 * (self.new_length - base) * direction;
        let bias = match self.edge_align {
            VAlign::Top => -delta,
            VAlign::Bottom => delta,
            VAlign::Middle => 0.0,
        };

        let (along_i, along_j) = (bias - delta, bias + delta);
        if self.edge.is_horizontal() {
            pts[i] = pts[i] + self.offset + Point::new(along_i, 0.0);
            pts[j] = pts[j] + self.offset + Point::new(along_j, 0.0);
        } else {
            pts[i] = pts[i] + self.offset + Point::new(0.0, along_i);
            pts[j] = pts[j] + self.offset + Point::new(0.0, along_j);
        }

        let align = Point::new(self.halign.offset(w), self.valign.offset(h));
        pts.map(|p| p + align)
    }
}

impl ShapeGenerator for SkewRect {
    fn build(&self) -> Result<Shape> {
        ensure_finite(
            "SkewRect",
            &[
                self.width,
                self.height,
                self.offset.x,
                self.offset.y,
                self.new_length,
                self.placement.position.x,
                self.placement.position.y,
                self.placement.rotation,
            ],
        )?;
        let points = to_world(&self.local_corners(), self.placement, Flip::NONE);
        Ok(Shape::new(points.clone(), vec![points]))
    }
}
