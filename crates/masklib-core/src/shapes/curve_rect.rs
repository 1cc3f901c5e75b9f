use serde::{Deserialize, Serialize};

use super::{
    quad_strip, segments_for, to_world, triangle_fan, Flip, Shape, ShapeGenerator, VAlign,
    DEFAULT_DENSITY,
};
use crate::error::{ensure_finite, LayoutError, Result};
use crate::geometry::{Placement, Point};

/// Annular sector: the curved wall of a bent trace.
///
/// The arc centre sits at local `(0, -radius)`; the sector sweeps clockwise
/// from the local +y axis by `angle` degrees, so an unflipped sector bends
/// toward local -y. `ralign` picks whether `radius` names the inner edge
/// (`Bottom`), the middle or the outer edge (`Top`); `roffset` shifts both
/// radii. When the inner radius reaches zero the sector becomes a pie slice
/// fanned from its apex.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurveRect {
    pub placement: Placement,
    pub height: f64,
    pub radius: f64,
    /// Span in degrees.
    pub angle: f64,
    pub roffset: f64,
    pub ralign: VAlign,
    pub valign: VAlign,
    pub flip: Flip,
    /// Points per full turn.
    pub density: f64,
}

impl CurveRect {
    pub fn new(placement: Placement, height: f64, radius: f64) -> Self {
        Self {
            placement,
            height,
            radius,
            angle: 90.0,
            roffset: 0.0,
            ralign: VAlign::Bottom,
            valign: VAlign::Bottom,
            flip: Flip::NONE,
            density: DEFAULT_DENSITY,
        }
    }

    pub fn with_angle(mut self, angle: f64) -> Self {
        self.angle = angle;
        self
    }

    pub fn with_roffset(mut self, roffset: f64) -> Self {
        self.roffset = roffset;
        self
    }

    pub fn with_ralign(mut self, ralign: VAlign) -> Self {
        self.ralign = ralign;
        self
    }

    pub fn with_valign(mut self, valign: VAlign) -> Self {
        self.valign = valign;
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
        segments_for(self.angle, self.density)
    }

    /// Inner and outer radius actually drawn.
    pub fn radii(&self) -> (f64, f64) {
        let rmin = self.radius + self.ralign.offset(self.height) + self.roffset;
        let rmax = rmin + self.height;
        if rmin <= 0.0 && !is_quarter_turn(self.angle) {
            (0.0, rmax)
        } else {
            (rmin, rmax)
        }
    }

    /// True when the sector collapses to a pie slice.
    pub fn is_degenerate(&self) -> bool {
        self.radius + self.ralign.offset(self.height) + self.roffset <= 0.0
    }

    fn local_points(&self) -> Vec<Point> {
        let r0 = self.radius;
        let (rmin, rmax) = self.radii();
        let seg = self.segments();
        let a = self.angle.to_radians();
        let dtheta = a / seg as f64;

        let mut pts = Vec::with_capacity(2 * (seg + 1));
        if self.is_degenerate() {
            pts.push(Point::new(0.0, rmin - r0));
            pts.push(Point::new(rmax * a.sin() - rmin, rmax * a.cos() - r0 + rmin));
            for i in 0..seg {
                let t = a - (i as f64 + 0.5) * dtheta;
                pts.push(Point::new(rmax * t.sin() - rmin, rmax * t.cos() - r0));
            }
            pts.push(Point::new(0.0, rmax - r0));
        } else {
            pts.push(Point::new(0.0, rmin - r0));
            for i in 1..seg {
                let t = i as f64 * dtheta;
                pts.push(Point::new(rmin * t.sin(), rmin * t.cos() - r0));
            }
            pts.push(Point::new(rmin * a.sin(), rmin * a.cos() - r0));
            pts.push(Point::new(rmax * a.sin(), rmax * a.cos() - r0));
            for i in 1..seg {
                let t = a - i as f64 * dtheta;
                pts.push(Point::new(rmax * t.sin(), rmax * t.cos() - r0));
            }
            pts.push(Point::new(0.0, rmax - r0));
        }

        let shift = Point::new(
            0.0,
            self.valign.offset(self.height) - self.ralign.offset(self.height),
        );
        pts.into_iter().map(|p| p + shift).collect()
    }
}

fn is_quarter_turn(angle: f64) -> bool {
    (angle.rem_euclid(360.0) - 90.0).abs() < 1e-9
}

impl ShapeGenerator for CurveRect {
    fn build(&self) -> Result<Shape> {
        ensure_finite(
            "CurveRect",
            &[
                self.height,
                self.radius,
                self.angle,
                self.roffset,
                self.density,
                self.placement.position.x,
                self.placement.position.y,
                self.placement.rotation,
            ],
        )?;
        if self.angle <= 0.0 {
            return Err(LayoutError::degenerate(
                "CurveRect",
                format!("angle must be positive (got {})", self.angle),
            ));
        }
        if self.density <= 0.0 {
            return Err(LayoutError::degenerate(
                "CurveRect",
                format!("point density must be positive (got {})", self.density),
            ));
        }

        let seg = self.segments();
        let points = to_world(&self.local_points(), self.placement, self.flip);
        let fills = if self.is_degenerate() {
            triangle_fan(&points, seg + 1)
        } else {
            quad_strip(&points, seg)
        };
        Ok(Shape::new(points, fills))
    }
}
