use serde::{Deserialize, Serialize};

use super::{segments_for, to_world, triangle_fan, Flip, Shape, ShapeGenerator, DEFAULT_DENSITY};
use crate::error::{ensure_finite, LayoutError, Result};
use crate::geometry::{Placement, Point};

/// Fillet for a concave corner.
///
/// The corner vertex sits at the insertion point with one edge along local
/// -x and the other at `angle` degrees from it; the fillet circle of
/// `radius` is tangent to both and the area between the vertex and the arc
/// is fanned from the vertex.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InsideCurve {
    pub placement: Placement,
    pub radius: f64,
    /// Interior angle of the corner in degrees, strictly between 0 and 180.
    pub angle: f64,
    pub flip: Flip,
    pub density: f64,
}

impl InsideCurve {
    pub fn new(placement: Placement, radius: f64) -> Self {
        Self {
            placement,
            radius,
            angle: 90.0,
            flip: Flip::NONE,
            density: DEFAULT_DENSITY,
        }
    }

    pub fn with_angle(mut self, angle: f64) -> Self {
        self.angle = angle;
        self
    }

    pub fn with_flip(mut self, flip: Flip) -> Self {
        self.flip = flip;
        self
    }

    pub fn with_density(mut self, density: f64) -> Self {
        self.density = density;
        self
    }

    pub fn segments(&self) -> usize {
        segments_for(180.0 - self.angle, self.density)
    }
}

impl ShapeGenerator for InsideCurve {
    fn build(&self) -> Result<Shape> {
        ensure_finite(
            "InsideCurve",
            &[
                self.radius,
                self.angle,
                self.density,
                self.placement.position.x,
                self.placement.position.y,
                self.placement.rotation,
            ],
        )?;
        if self.angle <= 0.0 || self.angle >= 180.0 {
            return Err(LayoutError::degenerate(
                "InsideCurve",
                format!("corner angle must lie strictly between 0 and 180 (got {})", self.angle),
            ));
        }
        if self.density <= 0.0 {
            return Err(LayoutError::degenerate(
                "InsideCurve",
                format!("point density must be positive (got {})", self.density),
            ));
        }

        let r = self.radius;
        let seg = self.segments();
        let center = Point::new(-r / (self.angle.to_radians() / 2.0).tan(), -r);
        let dtheta = (180.0 - self.angle).to_radians() / seg as f64;

        let mut local = Vec::with_capacity(seg + 2);
        local.push(Point::ORIGIN);
        for i in 0..=seg {
            let t = i as f64 * dtheta;
            local.push(center + Point::new(r * t.sin(), r * t.cos()));
        }

        let points = to_world(&local, self.placement, self.flip);
        let fills = triangle_fan(&points, seg);
        Ok(Shape::new(points, fills))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_right_angle_fillet_is_tangent_to_both_edges() {
        let shape = InsideCurve::new(Placement::default(), 10.0).build().unwrap();
        let pts = &shape.outline.points;
        assert_eq!(pts[0], Point::ORIGIN);
        assert!((pts[1].x - -10.0).abs() < 1e-12 && pts[1].y.abs() < 1e-12);
        let last = pts[pts.len() - 1];
        assert!(last.x.abs() < 1e-9 && (last.y - -10.0).abs() < 1e-9);
    }

    #[test]
    fn test_fan_from_vertex() {
        let curve = InsideCurve::new(Placement::default(), 10.0);
        let shape = curve.build().unwrap();
        assert_eq!(shape.outline.len(), curve.segments() + 2);
        assert_eq!(shape.fills.len(), curve.segments());
        assert!(shape.fills.iter().all(|t| t[0] == Point::ORIGIN));
    }

    #[test]
    fn test_straight_angle_rejected() {
        for angle in [0.0, 180.0, 200.0] {
            let curve = InsideCurve::new(Placement::default(), 10.0).with_angle(angle);
            assert!(matches!(curve.build(), Err(LayoutError::Degenerate { .. })));
        }
    }

    #[test]
    fn test_obtuse_corner_sets_center_back() {
        let shape = InsideCurve::new(Placement::default(), 10.0)
            .with_angle(120.0)
            .build()
            .unwrap();
        let first = shape.outline.points[1];
        let expected_x = -10.0 / 60f64.to_radians().tan();
        assert!((first.x - expected_x).abs() < 1e-9);
    }
}
