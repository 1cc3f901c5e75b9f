use serde::{Deserialize, Serialize};

use super::{segments_for, to_world, triangle_fan, Flip, HAlign, Shape, ShapeGenerator, VAlign};
use crate::error::{ensure_finite, LayoutError, Result};
use crate::geometry::{Placement, Point};

const ROUND_RECT_DENSITY: f64 = 120.0;

/// Quadrant of a fillet's arc relative to its circle centre.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Quadrant {
    /// +x, +y
    First,
    /// -x, +y
    Second,
    /// -x, -y
    Third,
    /// +x, -y
    Fourth,
}

impl Quadrant {
    fn direction(self) -> Point {
        match self {
            Quadrant::First => Point::new(1.0, 1.0),
            Quadrant::Second => Point::new(-1.0, 1.0),
            Quadrant::Third => Point::new(-1.0, -1.0),
            Quadrant::Fourth => Point::new(1.0, -1.0),
        }
    }

    fn start_angle(self) -> f64 {
        match self {
            Quadrant::First => 0.0,
            Quadrant::Second => 90.0,
            Quadrant::Third => 180.0,
            Quadrant::Fourth => 270.0,
        }
    }
}

/// Replace the square corner at `vertex` with a quarter-circle arc.
///
/// The arc's circle is pulled in from the vertex toward the opposite of
/// `quadrant`, and the arc itself covers that quadrant of the circle. Points
/// run counterclockwise unless `clockwise` is set.
pub fn corner_round(
    vertex: Point,
    quadrant: Quadrant,
    radius: f64,
    clockwise: bool,
    density: f64,
) -> Vec<Point> {
    let center = vertex - quadrant.direction() * radius;
    let seg = segments_for(90.0, density);
    let (start, end) = if clockwise {
        (quadrant.start_angle() + 90.0, quadrant.start_angle())
    } else {
        (quadrant.start_angle(), quadrant.start_angle() + 90.0)
    };
    (0..=seg)
        .map(|i| {
            let t = (start + (end - start) * i as f64 / seg as f64).to_radians();
            center + Point::new(radius * t.cos(), radius * t.sin())
        })
        .collect()
}

/// Rectangle with some corners rounded.
///
/// Corners are indexed counterclockwise from the bottom-left. Width, height
/// and radius are taken as magnitudes; a radius of zero squares every corner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoundRect {
    pub placement: Placement,
    pub width: f64,
    pub height: f64,
    pub radius: f64,
    pub corners: [bool; 4],
    pub halign: HAlign,
    pub valign: VAlign,
    pub flip: Flip,
    pub density: f64,
}

impl RoundRect {
    pub fn new(placement: Placement, width: f64, height: f64, radius: f64) -> Self {
        Self {
            placement,
            width,
            height,
            radius,
            corners: [true; 4],
            halign: HAlign::Left,
            valign: VAlign::Bottom,
            flip: Flip::NONE,
            density: ROUND_RECT_DENSITY,
        }
    }

    pub fn with_corners(mut self, corners: [bool; 4]) -> Self {
        self.corners = corners;
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

    pub fn with_flip(mut self, flip: Flip) -> Self {
        self.flip = flip;
        self
    }

    pub fn with_density(mut self, density: f64) -> Self {
        self.density = density;
        self
    }

    fn validate(&self, context: &str) -> Result<()> {
        ensure_finite(
            context,
            &[
                self.width,
                self.height,
                self.radius,
                self.density,
                self.placement.position.x,
                self.placement.position.y,
                self.placement.rotation,
            ],
        )?;
        if self.density <= 0.0 {
            return Err(LayoutError::degenerate(
                context,
                format!("point density must be positive (got {})", self.density),
            ));
        }
        Ok(())
    }

    /// Shared outline walk; `fillet(i)` picks quadrant and winding for a
    /// rounded corner `i`.
    fn trace(&self, fillet: impl Fn(usize) -> (Quadrant, bool)) -> Shape {
        let w = self.width.abs();
        let h = self.height.abs();
        let r = self.radius.abs();
        let rounded = if r > 0.0 { self.corners } else { [false; 4] };
        let align = Point::new(self.halign.offset(w), self.valign.offset(h));

        let square = [
            Point::new(0.0, 0.0),
            Point::new(w, 0.0),
            Point::new(w, h),
            Point::new(0.0, h),
        ];
        let mut local = vec![Point::new(0.0, h / 2.0) + align];
        for (i, vertex) in square.iter().enumerate() {
            if rounded[i] {
                let (quadrant, clockwise) = fillet(i);
                local.extend(
                    corner_round(*vertex, quadrant, r, clockwise, self.density)
                        .into_iter()
                        .map(|p| p + align),
                );
            } else {
                local.push(*vertex + align);
            }
        }

        let points = to_world(&local, self.placement, self.flip);
        let fills = triangle_fan(&points, points.len().saturating_sub(2));
        Shape::new(points, fills)
    }
}

const CONVEX_QUADRANTS: [Quadrant; 4] = [
    Quadrant::Third,
    Quadrant::Fourth,
    Quadrant::First,
    Quadrant::Second,
];

impl ShapeGenerator for RoundRect {
    fn build(&self) -> Result<Shape> {
        self.validate("RoundRect")?;
        Ok(self.trace(|i| (CONVEX_QUADRANTS[i], false)))
    }
}

/// A [`RoundRect`] whose selected corners curve outward (concave fillets),
/// so the shape mates flush against a neighbouring convex corner.
///
/// `invert_horizontal` chooses whether inverted fillets flare out along the
/// x axis or the y axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoundRectInverse {
    pub base: RoundRect,
    pub inverted: [bool; 4],
    pub invert_horizontal: bool,
}

impl RoundRectInverse {
    pub fn new(base: RoundRect) -> Self {
        Self {
            base,
            inverted: [false, true, true, false],
            invert_horizontal: true,
        }
    }

    pub fn with_inverted(mut self, inverted: [bool; 4]) -> Self {
        self.inverted = inverted;
        self
    }

    pub fn with_invert_horizontal(mut self, invert_horizontal: bool) -> Self {
        self.invert_horizontal = invert_horizontal;
        self
    }
}

impl ShapeGenerator for RoundRectInverse {
    fn build(&self) -> Result<Shape> {
        self.base.validate("RoundRectInverse")?;
        let inverse_quadrants = if self.invert_horizontal {
            [Quadrant::Fourth, Quadrant::Third, Quadrant::Second, Quadrant::First]
        } else {
            [Quadrant::Second, Quadrant::First, Quadrant::Fourth, Quadrant::Third]
        };
        Ok(self.base.trace(|i| {
            if self.inverted[i] {
                (inverse_quadrants[i], true)
            } else {
                (CONVEX_QUADRANTS[i], false)
            }
        }))
    }
}
