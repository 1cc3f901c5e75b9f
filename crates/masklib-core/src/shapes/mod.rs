//! Parametric shape generators.
//!
//! Every generator builds its points in an unrotated local frame, applies
//! alignment and flips there, then rotates about the origin and translates to
//! the insertion point. The result is a [`Shape`]: a closed outline plus a
//! decomposition of the same area into convex fill polygons.

mod curve_rect;
mod inside_curve;
mod miter_joint;
mod rect;
mod round_rect;
mod skew_rect;
mod solid_pline;

pub use curve_rect::CurveRect;
pub use inside_curve::InsideCurve;
pub use miter_joint::MiterJoint;
pub use rect::Rectangle;
pub use round_rect::{corner_round, Quadrant, RoundRect, RoundRectInverse};
pub use skew_rect::{Edge, SkewRect};
pub use solid_pline::{FillMode, SolidPline};

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::geometry::{BBox, Outline, Placement, Point};
use crate::sink::{GeometrySink, Style};

/// Default points per full turn for curved shapes.
pub const DEFAULT_DENSITY: f64 = 60.0;

/// Upper bound on the segments of any single arc.
pub const MAX_SEGMENTS: usize = 1 << 14;

/// Horizontal anchor of a shape relative to its insertion point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum HAlign {
    #[default]
    Left,
    Center,
    Right,
}

impl HAlign {
    /// Local x shift that puts the chosen edge on the insertion point.
    pub fn offset(self, width: f64) -> f64 {
        match self {
            HAlign::Left => 0.0,
            HAlign::Center => -width / 2.0,
            HAlign::Right => -width,
        }
    }
}

/// Vertical (or radial) anchor. `Bottom` keeps the insertion point on the
/// low-y edge, `Top` on the high-y edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum VAlign {
    Top,
    Middle,
    #[default]
    Bottom,
}

impl VAlign {
    pub fn offset(self, height: f64) -> f64 {
        match self {
            VAlign::Top => -height,
            VAlign::Middle => -height / 2.0,
            VAlign::Bottom => 0.0,
        }
    }
}

/// Sign multipliers applied to local coordinates before rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Flip {
    pub horizontal: bool,
    pub vertical: bool,
}

impl Flip {
    pub const NONE: Flip = Flip {
        horizontal: false,
        vertical: false,
    };

    pub fn new(horizontal: bool, vertical: bool) -> Self {
        Self {
            horizontal,
            vertical,
        }
    }

    pub fn horizontal() -> Self {
        Self::new(true, false)
    }

    pub fn vertical() -> Self {
        Self::new(false, true)
    }

    pub fn apply(&self, p: Point) -> Point {
        let sx = if self.horizontal { -1.0 } else { 1.0 };
        let sy = if self.vertical { -1.0 } else { 1.0 };
        p.scale(sx, sy)
    }
}

/// Number of arc segments for a span of `angle` degrees at `density` points
/// per full turn. Never less than one nor more than [`MAX_SEGMENTS`].
pub fn segments_for(angle: f64, density: f64) -> usize {
    let raw = (density * angle.abs() / 360.0).round();
    if raw.is_finite() && raw >= 1.0 {
        raw.min(MAX_SEGMENTS as f64) as usize
    } else {
        1
    }
}

/// Generated geometry in world coordinates.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Shape {
    pub outline: Outline,
    /// Convex polygons (triangles or quads) covering the outline's area.
    pub fills: Vec<Vec<Point>>,
}

impl Shape {
    pub fn new(outline: Vec<Point>, fills: Vec<Vec<Point>>) -> Self {
        Self {
            outline: Outline::new(outline),
            fills,
        }
    }

    pub fn bbox(&self) -> Option<BBox> {
        self.outline.bbox()
    }

    /// Write into `sink` using the sink's own style.
    pub fn emit(&self, sink: &mut dyn GeometrySink) {
        let style = sink.style();
        self.emit_with(sink, &style);
    }

    /// Outline only when the style has an outline colour, fills only when it
    /// has a fill colour.
    pub fn emit_with(&self, sink: &mut dyn GeometrySink, style: &Style) {
        if let Some(color) = style.outline {
            sink.add_outline(&self.outline, color, style.layer);
        }
        if let Some(color) = style.fill {
            for polygon in &self.fills {
                sink.add_filled_polygon(polygon, color, style.layer);
            }
        }
    }
}

/// Common surface of every generator.
pub trait ShapeGenerator {
    fn build(&self) -> Result<Shape>;

    fn emit_into(&self, sink: &mut dyn GeometrySink) -> Result<()> {
        self.build()?.emit(sink);
        Ok(())
    }
}

/// Flip, rotate, translate.
pub(crate) fn to_world(points: &[Point], placement: Placement, flip: Flip) -> Vec<Point> {
    points
        .iter()
        .map(|p| placement.apply(flip.apply(*p)))
        .collect()
}

/// `count` triangles `[0, i+1, i+2]` fanned from the first point.
pub(crate) fn triangle_fan(points: &[Point], count: usize) -> Vec<Vec<Point>> {
    (0..count)
        .filter(|i| i + 2 < points.len())
        .map(|i| vec![points[0], points[i + 1], points[i + 2]])
        .collect()
}

/// `count` quads `[i, i+1, n-i-2, n-i-1]` pairing each point with its mirror
/// from the end of the list.
pub(crate) fn quad_strip(points: &[Point], count: usize) -> Vec<Vec<Point>> {
    let n = points.len();
    (0..count)
        .filter(|i| n >= 2 * i + 2)
        .map(|i| vec![points[i], points[i + 1], points[n - i - 2], points[n - i - 1]])
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segments_for_never_zero() {
        assert_eq!(segments_for(90.0, 120.0), 30);
        assert_eq!(segments_for(90.0, 60.0), 15);
        assert_eq!(segments_for(1.0, 60.0), 1);
        assert_eq!(segments_for(0.0, 60.0), 1);
        assert_eq!(segments_for(-180.0, 60.0), 30);
        assert_eq!(segments_for(90.0, 1e300), MAX_SEGMENTS);
    }

    #[test]
    fn test_alignment_offsets() {
        assert_eq!(HAlign::Left.offset(10.0), 0.0);
        assert_eq!(HAlign::Center.offset(10.0), -5.0);
        assert_eq!(HAlign::Right.offset(10.0), -10.0);
        assert_eq!(VAlign::Bottom.offset(4.0), 0.0);
        assert_eq!(VAlign::Middle.offset(4.0), -2.0);
        assert_eq!(VAlign::Top.offset(4.0), -4.0);
    }

    #[test]
    fn test_flip_applies_before_rotation() {
        let placement = Placement::new(Point::new(1.0, 0.0), 90.0);
        let world = to_world(&[Point::new(2.0, 0.0)], placement, Flip::horizontal());
        assert!((world[0].x - 1.0).abs() < 1e-12);
        assert!((world[0].y - -2.0).abs() < 1e-12);
    }

    #[test]
    fn test_quad_strip_pairs_mirrored_points() {
        let pts: Vec<Point> = (0..6).map(|i| Point::new(i as f64, 0.0)).collect();
        let quads = quad_strip(&pts, 2);
        assert_eq!(quads[0], vec![pts[0], pts[1], pts[4], pts[5]]);
        assert_eq!(quads[1], vec![pts[1], pts[2], pts[3], pts[4]]);
    }
}
