use serde::{Deserialize, Serialize};

use super::{quad_strip, to_world, triangle_fan, Flip, Shape, ShapeGenerator};
use crate::error::{ensure_finite, Result};
use crate::geometry::{Placement, Point};

/// How polygons with more than four points are decomposed for filling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FillMode {
    /// Triangles `[0, i+1, i+2]`.
    #[default]
    TriangleFan,
    /// Quads pairing point `i` with its mirror from the end. Only meaningful
    /// when the points were authored left side first, right side reversed.
    QuadStrip,
}

/// Arbitrary closed polyline with a convex fill decomposition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolidPline {
    pub placement: Placement,
    pub points: Vec<Point>,
    pub fill_mode: FillMode,
}

impl SolidPline {
    pub fn new(placement: Placement, points: Vec<Point>) -> Self {
        Self {
            placement,
            points,
            fill_mode: FillMode::TriangleFan,
        }
    }

    pub fn with_fill_mode(mut self, fill_mode: FillMode) -> Self {
        self.fill_mode = fill_mode;
        self
    }

    pub fn add_vertex(&mut self, point: Point) {
        self.points.push(point);
    }

    pub fn add_vertices(&mut self, points: impl IntoIterator<Item = Point>) {
        self.points.extend(points);
    }
}

impl ShapeGenerator for SolidPline {
    fn build(&self) -> Result<Shape> {
        let mut values = vec![
            self.placement.position.x,
            self.placement.position.y,
            self.placement.rotation,
        ];
        values.extend(self.points.iter().flat_map(|p| [p.x, p.y]));
        ensure_finite("SolidPline", &values)?;

        let points = to_world(&self.points, self.placement, Flip::NONE);
        let n = points.len();
        let fills = if n <= 4 {
            if n >= 3 {
                vec![points.clone()]
            } else {
                Vec::new()
            }
        } else {
            match self.fill_mode {
                FillMode::QuadStrip => quad_strip(&points, n / 2 - 1),
                FillMode::TriangleFan => triangle_fan(&points, n - 2),
            }
        };
        Ok(Shape::new(points, fills))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hexagon() -> Vec<Point> {
        (0..6)
            .map(|i| Point::new(1.0, 0.0).rotate_deg(60.0 * i as f64))
            .collect()
    }

    #[test]
    fn test_small_pline_is_single_solid() {
        let pline = SolidPline::new(
            Placement::default(),
            vec![Point::new(0.0, 0.0), Point::new(1.0, 0.0), Point::new(0.0, 1.0)],
        );
        let shape = pline.build().unwrap();
        assert_eq!(shape.fills.len(), 1);
        assert_eq!(shape.fills[0].len(), 3);
    }

    #[test]
    fn test_triangle_fan_from_first_point() {
        let shape = SolidPline::new(Placement::default(), hexagon()).build().unwrap();
        assert_eq!(shape.fills.len(), 4);
        assert!(shape.fills.iter().all(|t| t[0] == shape.outline.points[0]));
    }

    #[test]
    fn test_quad_strip_count() {
        let shape = SolidPline::new(Placement::default(), hexagon())
            .with_fill_mode(FillMode::QuadStrip)
            .build()
            .unwrap();
        assert_eq!(shape.fills.len(), 2);
        assert!(shape.fills.iter().all(|q| q.len() == 4));
    }

    #[test]
    fn test_rotation_then_translation() {
        let pline = SolidPline::new(
            Placement::new(Point::new(10.0, 0.0), 90.0),
            vec![Point::new(1.0, 0.0)],
        );
        let shape = pline.build().unwrap();
        let p = shape.outline.points[0];
        assert!((p.x - 10.0).abs() < 1e-12);
        assert!((p.y - 1.0).abs() < 1e-12);
        assert!(shape.fills.is_empty());
    }
}
