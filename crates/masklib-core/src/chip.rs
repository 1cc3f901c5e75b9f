use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{LayoutError, Result};
use crate::geometry::{BBox, Outline, Placement, Point};
use crate::layer::{Color, LayerId};
use crate::pose::{Pose, TraceDefaults};
use crate::sink::{Entity, GeometrySink, Style};

/// Unique chip identifier.
pub type ChipId = Uuid;

/// Index of a pose stored on a chip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PoseHandle(pub usize);

/// Where a routing call starts: a pose stored on the chip, a caller-owned
/// pose, or a bare placement that seeds a throwaway pose with the chip's
/// defaults.
#[derive(Debug)]
pub enum Cursor<'a> {
    Handle(PoseHandle),
    Pose(&'a mut Pose),
    Placement(Placement),
}

impl From<PoseHandle> for Cursor<'_> {
    fn from(handle: PoseHandle) -> Self {
        Cursor::Handle(handle)
    }
}

impl<'a> From<&'a mut Pose> for Cursor<'a> {
    fn from(pose: &'a mut Pose) -> Self {
        Cursor::Pose(pose)
    }
}

impl From<Placement> for Cursor<'_> {
    fn from(placement: Placement) -> Self {
        Cursor::Placement(placement)
    }
}

/// A chip: the container that owns poses and collects emitted geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chip {
    pub id: ChipId,
    pub name: String,
    pub width: f64,
    pub height: f64,
    pub style: Style,
    /// Defaults handed to poses created through [`Chip::new_structure`].
    pub defaults: TraceDefaults,
    /// Reference point for [`Chip::centered`]; the chip centre unless moved.
    pub center: Point,
    structures: Vec<Pose>,
    entities: Vec<Entity>,
}

impl Chip {
    pub fn new(name: &str, width: f64, height: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            width,
            height,
            style: Style::default(),
            defaults: TraceDefaults::default(),
            center: Point::new(width / 2.0, height / 2.0),
            structures: Vec::new(),
            entities: Vec::new(),
        }
    }

    pub fn with_style(mut self, style: Style) -> Self {
        self.style = style;
        self
    }

    pub fn with_defaults(mut self, defaults: TraceDefaults) -> Result<Self> {
        defaults.validate("Chip::with_defaults")?;
        self.defaults = defaults;
        Ok(self)
    }

    pub fn layer(&self) -> LayerId {
        self.style.layer
    }

    // ── Coordinates ──────────────────────────────────────────────────

    /// `offset` measured from the chip centre.
    pub fn centered(&self, offset: Point) -> Point {
        self.center + offset
    }

    pub fn cx(&self, x: f64) -> f64 {
        self.center.x + x
    }

    pub fn cy(&self, y: f64) -> f64 {
        self.center.y + y
    }

    // ── Structures ───────────────────────────────────────────────────

    pub fn add_structure(&mut self, pose: Pose) -> PoseHandle {
        self.structures.push(pose);
        PoseHandle(self.structures.len() - 1)
    }

    /// Create and store a pose that inherits the chip's defaults.
    pub fn new_structure(&mut self, position: Point, heading: f64) -> Result<PoseHandle> {
        let pose = Pose::new(position, heading, self.defaults)?;
        Ok(self.add_structure(pose))
    }

    pub fn structure(&self, handle: PoseHandle) -> Result<&Pose> {
        self.structures
            .get(handle.0)
            .ok_or(LayoutError::UnknownStructure(handle.0))
    }

    pub fn structure_mut(&mut self, handle: PoseHandle) -> Result<&mut Pose> {
        self.structures
            .get_mut(handle.0)
            .ok_or(LayoutError::UnknownStructure(handle.0))
    }

    pub fn structures(&self) -> &[Pose] {
        &self.structures
    }

    /// Resolve `cursor` into a concrete pose, run `f` against it with this
    /// chip as the sink, and commit the pose only if `f` succeeds.
    ///
    /// A `Placement` cursor is routed on a temporary pose that is dropped
    /// afterwards.
    pub fn route<T, F>(&mut self, cursor: Cursor<'_>, f: F) -> Result<T>
    where
        F: FnOnce(&mut Chip, &mut Pose) -> Result<T>,
    {
        match cursor {
            Cursor::Handle(handle) => {
                let mut pose = self.structure(handle)?.clone();
                let out = f(self, &mut pose)?;
                *self.structure_mut(handle)? = pose;
                Ok(out)
            }
            Cursor::Pose(target) => {
                let mut pose = target.clone();
                let out = f(self, &mut pose)?;
                *target = pose;
                Ok(out)
            }
            Cursor::Placement(placement) => {
                let mut pose = Pose::at(placement, self.defaults)?;
                f(self, &mut pose)
            }
        }
    }

    // ── Entities ─────────────────────────────────────────────────────

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    pub fn add_entity(&mut self, entity: Entity) {
        self.entities.push(entity);
    }

    /// Bounding box of everything drawn on this chip.
    pub fn local_bbox(&self) -> Option<BBox> {
        self.entities
            .iter()
            .filter_map(|e| e.bbox())
            .reduce(|acc, bb| acc.union(&bb))
    }

    pub fn entities_on_layer(&self, layer: LayerId) -> Vec<&Entity> {
        self.entities.iter().filter(|e| e.layer() == layer).collect()
    }

    // ── Serialization ────────────────────────────────────────────────

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

impl GeometrySink for Chip {
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pose::Turn;
    use crate::shapes::{Rectangle, ShapeGenerator};

    fn chip() -> Chip {
        Chip::new("test_chip", 7000.0, 7000.0)
            .with_defaults(TraceDefaults::standard_cpw())
            .unwrap()
    }

    #[test]
    fn test_centered() {
        let chip = chip();
        let p = chip.centered(Point::new(-100.0, 50.0));
        assert!((p.x - 3400.0).abs() < 1e-10);
        assert!((p.y - 3550.0).abs() < 1e-10);
    }

    #[test]
    fn test_new_structure_inherits_chip_defaults() {
        let mut chip = chip();
        let handle = chip.new_structure(Point::ORIGIN, 0.0).unwrap();
        assert_eq!(chip.structure(handle).unwrap().defaults().w, Some(10.0));
        assert!(matches!(
            chip.structure(PoseHandle(7)),
            Err(LayoutError::UnknownStructure(7))
        ));
    }

    #[test]
    fn test_route_commits_pose_on_success() {
        let mut chip = chip();
        let handle = chip.new_structure(Point::ORIGIN, 0.0).unwrap();
        chip.route(Cursor::Handle(handle), |chip, pose| {
            Rectangle::new(pose.placement(), 10.0, 10.0).emit_into(chip)?;
            pose.advance_distance(10.0, Turn::NONE)
        })
        .unwrap();
        assert_eq!(chip.entity_count(), 1);
        assert_eq!(chip.structure(handle).unwrap().position(), Point::new(10.0, 0.0));
    }

    #[test]
    fn test_route_discards_pose_on_failure() {
        let mut chip = chip();
        let mut pose = Pose::new(Point::ORIGIN, 0.0, TraceDefaults::default()).unwrap();
        let result = chip.route(Cursor::Pose(&mut pose), |_, pose| {
            pose.advance_distance(10.0, Turn::NONE)?;
            Err::<(), _>(LayoutError::infeasible("test", "forced"))
        });
        assert!(result.is_err());
        assert_eq!(pose.position(), Point::ORIGIN);
    }

    #[test]
    fn test_bbox_and_layer_filter() {
        let mut chip = chip();
        chip.add_filled_polygon(&[Point::new(0.0, 0.0), Point::new(100.0, 50.0)], Color::WHITE, 0);
        chip.add_filled_polygon(&[Point::new(50.0, 25.0), Point::new(200.0, 75.0)], Color::WHITE, 1);
        let bb = chip.local_bbox().unwrap();
        assert!((bb.max.x - 200.0).abs() < 1e-10);
        assert!((bb.max.y - 75.0).abs() < 1e-10);
        assert_eq!(chip.entities_on_layer(1).len(), 1);
    }

    #[test]
    fn test_json_roundtrip() {
        let mut chip = chip();
        chip.new_structure(Point::new(1.0, 2.0), 90.0).unwrap();
        let json = chip.to_json().unwrap();
        let back = Chip::from_json(&json).unwrap();
        assert_eq!(back, chip);
    }
}
