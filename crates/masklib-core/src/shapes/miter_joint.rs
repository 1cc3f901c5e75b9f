use std::f64::consts::SQRT_2;

use log::warn;
use serde::{Deserialize, Serialize};

use super::{segments_for, to_world, Flip, Shape, ShapeGenerator, VAlign, DEFAULT_DENSITY};
use crate::error::{ensure_finite, LayoutError, Result};
use crate::geometry::{Placement, Point};

const MITER_ANGLE: f64 = 45.0;

/// Joins a right-angle corner of side `height` to a 45° flat of width `w1`
/// through one fillet whose radius follows from the two widths.
///
/// A `w1` wider than the corner's diagonal cannot be met; it is clamped to
/// the diagonal, which is logged and reported by [`MiterJoint::clamped`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MiterJoint {
    pub placement: Placement,
    pub height: f64,
    pub w1: f64,
    pub valign: VAlign,
    pub flip: Flip,
    pub density: f64,
}

impl MiterJoint {
    pub fn new(placement: Placement, height: f64, w1: f64) -> Self {
        Self {
            placement,
            height,
            w1,
            valign: VAlign::Bottom,
            flip: Flip::NONE,
            density: DEFAULT_DENSITY,
        }
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

    pub fn clamped(&self) -> bool {
        self.w1 >= self.height * SQRT_2
    }

    pub fn effective_w1(&self) -> f64 {
        self.w1.min(self.height * SQRT_2)
    }

    pub fn fillet_radius(&self) -> f64 {
        ((self.effective_w1() - SQRT_2 * self.height) / (SQRT_2 - 2.0)).max(0.0)
    }
}

impl ShapeGenerator for MiterJoint {
    fn build(&self) -> Result<Shape> {
        ensure_finite(
            "MiterJoint",
            &[
                self.height,
                self.w1,
                self.density,
                self.placement.position.x,
                self.placement.position.y,
                self.placement.rotation,
            ],
        )?;
        if self.density <= 0.0 {
            return Err(LayoutError::degenerate(
                "MiterJoint",
                format!("point density must be positive (got {})", self.density),
            ));
        }
        if self.clamped() {
            warn!(
                "MiterJoint: w1 = {} exceeds the corner diagonal {}; clamped",
                self.w1,
                self.height * SQRT_2
            );
        }

        let h = self.height;
        let r0 = self.fillet_radius();
        let seg = segments_for(MITER_ANGLE, self.density);
        let a = MITER_ANGLE.to_radians();
        let dtheta = a / seg as f64;

        let mut local = vec![Point::new(0.0, h), Point::ORIGIN];
        for i in 1..seg {
            let t = i as f64 * dtheta;
            local.push(Point::new(r0 * t.sin(), r0 * t.cos() - r0));
        }
        local.push(Point::new(r0 * a.sin(), r0 * a.cos() - r0));
        local.push(Point::new(h + r0 - r0 * a.cos(), h - r0 * a.sin()));
        for i in 1..seg {
            let t = a - i as f64 * dtheta;
            local.push(Point::new(h + r0 - r0 * t.cos(), h - r0 * t.sin()));
        }
        local.push(Point::new(h, h));

        let shift = Point::new(0.0, self.valign.offset(h));
        let local: Vec<Point> = local.into_iter().map(|p| p + shift).collect();
        Ok(Shape::new(to_world(&local, self.placement, self.flip), Vec::new()))
    }
}
