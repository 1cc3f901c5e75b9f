//! The pose ("structure"): a movable cursor that remembers where the last
//! segment ended, which way it was heading, and the default trace parameters
//! that routing calls fall back on.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ensure_finite, LayoutError, Result};
use crate::geometry::{Placement, Point};

/// Names of the inheritable trace parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParamKey {
    /// Centre conductor width.
    W,
    /// Gap to ground.
    S,
    /// Bend radius.
    Radius,
    /// Outer contact radius.
    ROut,
    /// Inner contact radius.
    RIns,
}

impl fmt::Display for ParamKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ParamKey::W => "w",
            ParamKey::S => "s",
            ParamKey::Radius => "radius",
            ParamKey::ROut => "r_out",
            ParamKey::RIns => "r_ins",
        };
        f.write_str(name)
    }
}

/// Typed default trace parameters carried by a pose.
///
/// The same struct doubles as the explicit override set of a routing call:
/// `Some` fields win over the pose's defaults.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TraceDefaults {
    pub w: Option<f64>,
    pub s: Option<f64>,
    pub radius: Option<f64>,
    pub r_out: Option<f64>,
    pub r_ins: Option<f64>,
}

impl TraceDefaults {
    /// The usual coplanar waveguide setup: conductor, gap and bend radius.
    pub fn cpw(w: f64, s: f64, radius: f64) -> Self {
        Self {
            w: Some(w),
            s: Some(s),
            radius: Some(radius),
            r_out: None,
            r_ins: None,
        }
    }

    /// Defaults of a standard chip: `w = 10`, `s = 5`, `radius = 25`, no
    /// contact rounding.
    pub fn standard_cpw() -> Self {
        Self::cpw(10.0, 5.0, 25.0).with_r_out(0.0).with_r_ins(0.0)
    }

    pub fn with_w(mut self, w: f64) -> Self {
        self.w = Some(w);
        self
    }

    pub fn with_s(mut self, s: f64) -> Self {
        self.s = Some(s);
        self
    }

    pub fn with_radius(mut self, radius: f64) -> Self {
        self.radius = Some(radius);
        self
    }

    pub fn with_r_out(mut self, r_out: f64) -> Self {
        self.r_out = Some(r_out);
        self
    }

    pub fn with_r_ins(mut self, r_ins: f64) -> Self {
        self.r_ins = Some(r_ins);
        self
    }

    pub fn get(&self, key: ParamKey) -> Option<f64> {
        match key {
            ParamKey::W => self.w,
            ParamKey::S => self.s,
            ParamKey::Radius => self.radius,
            ParamKey::ROut => self.r_out,
            ParamKey::RIns => self.r_ins,
        }
    }

    pub fn require(&self, key: ParamKey, context: &str) -> Result<f64> {
        self.get(key).ok_or_else(|| LayoutError::missing(key, context))
    }

    /// Parameters of `self`, replaced field by field by any `Some` in `overrides`.
    pub fn overlay(&self, overrides: &TraceDefaults) -> TraceDefaults {
        TraceDefaults {
            w: overrides.w.or(self.w),
            s: overrides.s.or(self.s),
            radius: overrides.radius.or(self.radius),
            r_out: overrides.r_out.or(self.r_out),
            r_ins: overrides.r_ins.or(self.r_ins),
        }
    }

    /// Every defined value must be finite and non-negative.
    pub fn validate(&self, context: &str) -> Result<()> {
        for key in [
            ParamKey::W,
            ParamKey::S,
            ParamKey::Radius,
            ParamKey::ROut,
            ParamKey::RIns,
        ] {
            if let Some(value) = self.get(key) {
                ensure_finite(context, &[value])?;
                if value < 0.0 {
                    return Err(LayoutError::degenerate(
                        context,
                        format!("'{key}' must not be negative (got {value})"),
                    ));
                }
            }
        }
        Ok(())
    }
}

/// Heading update applied after a move.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Turn {
    /// Add this many degrees to the heading.
    By(f64),
    /// Replace the heading with this absolute value in degrees.
    To(f64),
}

impl Turn {
    pub const NONE: Turn = Turn::By(0.0);

    fn value(&self) -> f64 {
        match self {
            Turn::By(v) | Turn::To(v) => *v,
        }
    }

    fn apply(&self, heading: f64) -> f64 {
        match self {
            Turn::By(delta) => heading + delta,
            Turn::To(absolute) => *absolute,
        }
    }
}

impl Default for Turn {
    fn default() -> Self {
        Turn::NONE
    }
}

/// Bend sense in the mask drawing convention.
///
/// `Ccw` bends toward the pose's local -y side and decreases the heading;
/// `Cw` bends toward local +y and increases it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Sense {
    #[default]
    Ccw,
    Cw,
}

impl Sense {
    /// Sign of the heading change produced by a bend of this sense.
    pub fn heading_sign(&self) -> f64 {
        match self {
            Sense::Ccw => -1.0,
            Sense::Cw => 1.0,
        }
    }

    /// Sign of the local y coordinate of the bend centre.
    pub fn center_side(&self) -> f64 {
        self.heading_sign()
    }

    pub fn flipped(&self) -> Sense {
        match self {
            Sense::Ccw => Sense::Cw,
            Sense::Cw => Sense::Ccw,
        }
    }
}

/// Which of a pose's two remembered frames to read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Frame {
    Current,
    Previous,
}

/// A mutable cursor: position, heading in degrees, the state it had before
/// the last mutation, and its default trace parameters.
///
/// The heading is stored as given and only reduced modulo 360 when compared.
/// A pose is meant for a single writer; routing calls mutate it in order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    position: Point,
    heading: f64,
    last_position: Point,
    last_heading: f64,
    defaults: TraceDefaults,
}

impl Pose {
    pub fn new(position: Point, heading: f64, defaults: TraceDefaults) -> Result<Self> {
        ensure_finite("Pose::new", &[position.x, position.y, heading])?;
        defaults.validate("Pose::new")?;
        Ok(Self {
            position,
            heading,
            last_position: position,
            last_heading: heading,
            defaults,
        })
    }

    pub fn at(placement: Placement, defaults: TraceDefaults) -> Result<Self> {
        Self::new(placement.position, placement.rotation, defaults)
    }

    pub fn position(&self) -> Point {
        self.position
    }

    pub fn heading(&self) -> f64 {
        self.heading
    }

    /// Heading reduced to `[0, 360)`.
    pub fn heading_normalized(&self) -> f64 {
        self.heading.rem_euclid(360.0)
    }

    pub fn last_position(&self) -> Point {
        self.last_position
    }

    pub fn last_heading(&self) -> f64 {
        self.last_heading
    }

    pub fn placement(&self) -> Placement {
        Placement::new(self.position, self.heading)
    }

    pub fn defaults(&self) -> &TraceDefaults {
        &self.defaults
    }

    pub fn set_defaults(&mut self, defaults: TraceDefaults) -> Result<()> {
        defaults.validate("Pose::set_defaults")?;
        self.defaults = defaults;
        Ok(())
    }

    /// Explicit overrides merged over this pose's defaults.
    pub fn resolve(&self, overrides: &TraceDefaults, context: &str) -> Result<TraceDefaults> {
        let merged = self.defaults.overlay(overrides);
        merged.validate(context)?;
        Ok(merged)
    }

    /// Move `distance` forward along the current heading, then turn.
    pub fn advance_distance(&mut self, distance: f64, turn: Turn) -> Result<()> {
        ensure_finite("Pose::advance_distance", &[distance, turn.value()])?;
        let target = self.local_to_world(Point::new(distance, 0.0));
        self.update(target, turn);
        Ok(())
    }

    /// Move by a vector expressed in the current local frame, then turn.
    pub fn advance_vector(&mut self, offset: Point, turn: Turn) -> Result<()> {
        ensure_finite("Pose::advance_vector", &[offset.x, offset.y, turn.value()])?;
        let target = self.local_to_world(offset);
        self.update(target, turn);
        Ok(())
    }

    /// Jump to a world-space position, then turn.
    pub fn set_absolute(&mut self, position: Point, turn: Turn) -> Result<()> {
        ensure_finite("Pose::set_absolute", &[position.x, position.y, turn.value()])?;
        self.update(position, turn);
        Ok(())
    }

    fn update(&mut self, position: Point, turn: Turn) {
        self.last_position = self.position;
        self.last_heading = self.heading;
        self.position = position;
        self.heading = turn.apply(self.heading);
    }

    pub fn local_to_world(&self, offset: Point) -> Point {
        self.position + offset.rotate_deg(self.heading)
    }

    pub fn last_local_to_world(&self, offset: Point) -> Point {
        self.last_position + offset.rotate_deg(self.last_heading)
    }

    pub fn world_to_local(&self, point: Point) -> Point {
        (point - self.position).rotate_deg(-self.heading)
    }

    pub fn last_world_to_local(&self, point: Point) -> Point {
        (point - self.last_position).rotate_deg(-self.last_heading)
    }

    /// World point `distance` away along the heading turned by `angle` degrees.
    pub fn at_distance(&self, distance: f64, angle: f64) -> Point {
        self.position + Point::new(distance, 0.0).rotate_deg(self.heading + angle)
    }

    pub fn frame_to_world(&self, frame: Frame, offset: Point) -> Point {
        match frame {
            Frame::Current => self.local_to_world(offset),
            Frame::Previous => self.last_local_to_world(offset),
        }
    }

    /// Open an independent pose at `offset` in the chosen frame.
    ///
    /// The new heading is always the current heading plus `heading_delta`,
    /// even when the offset is read from the previous frame. Defaults are
    /// copied unless `defaults` replaces them.
    pub fn branch(
        &self,
        frame: Frame,
        offset: Point,
        heading_delta: f64,
        defaults: Option<TraceDefaults>,
    ) -> Result<Pose> {
        ensure_finite("Pose::branch", &[offset.x, offset.y, heading_delta])?;
        let position = self.frame_to_world(frame, offset);
        Pose::new(
            position,
            self.heading + heading_delta,
            defaults.unwrap_or(self.defaults),
        )
    }

    pub fn clone_along(&self, offset: Point, heading_delta: f64) -> Result<Pose> {
        self.branch(Frame::Current, offset, heading_delta, None)
    }

    pub fn clone_along_last(&self, offset: Point, heading_delta: f64) -> Result<Pose> {
        self.branch(Frame::Previous, offset, heading_delta, None)
    }
}

/// True when two headings agree modulo 360 within `tolerance` degrees.
pub fn headings_match(a: f64, b: f64, tolerance: f64) -> bool {
    let diff = (a - b).rem_euclid(360.0);
    diff < tolerance || 360.0 - diff < tolerance
}

#[cfg(test)]
mod tests {
    use super::*;

    fn origin() -> Pose {
        Pose::new(Point::ORIGIN, 0.0, TraceDefaults::cpw(10.0, 5.0, 25.0)).unwrap()
    }

    #[test]
    fn test_advance_distance_records_previous_state() {
        let mut pose = origin();
        pose.advance_distance(100.0, Turn::By(90.0)).unwrap();
        assert!((pose.position().x - 100.0).abs() < 1e-12);
        assert!(pose.position().y.abs() < 1e-12);
        assert_eq!(pose.heading(), 90.0);
        assert_eq!(pose.last_position(), Point::ORIGIN);
        assert_eq!(pose.last_heading(), 0.0);

        pose.advance_distance(50.0, Turn::NONE).unwrap();
        assert!((pose.position().x - 100.0).abs() < 1e-9);
        assert!((pose.position().y - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_advance_vector_uses_old_heading() {
        let mut pose = Pose::new(Point::new(1.0, 1.0), 90.0, TraceDefaults::default()).unwrap();
        pose.advance_vector(Point::new(10.0, 5.0), Turn::To(0.0)).unwrap();
        assert!((pose.position().x - -4.0).abs() < 1e-9);
        assert!((pose.position().y - 11.0).abs() < 1e-9);
        assert_eq!(pose.heading(), 0.0);
    }

    #[test]
    fn test_local_world_roundtrip() {
        let pose = Pose::new(Point::new(3.0, -7.0), 33.0, TraceDefaults::default()).unwrap();
        let world = pose.local_to_world(Point::new(12.0, -4.0));
        let local = pose.world_to_local(world);
        assert!((local.x - 12.0).abs() < 1e-9);
        assert!((local.y - -4.0).abs() < 1e-9);
    }

    #[test]
    fn test_non_finite_input_leaves_pose_untouched() {
        let mut pose = origin();
        let before = pose.clone();
        assert!(pose.advance_distance(f64::NAN, Turn::NONE).is_err());
        assert!(pose.advance_vector(Point::new(1.0, f64::INFINITY), Turn::NONE).is_err());
        assert!(pose.set_absolute(Point::ORIGIN, Turn::To(f64::NAN)).is_err());
        assert_eq!(pose, before);
    }

    #[test]
    fn test_branch_from_previous_frame_keeps_current_heading() {
        let mut pose = origin();
        pose.advance_distance(100.0, Turn::By(45.0)).unwrap();
        let branch = pose.clone_along_last(Point::new(0.0, 20.0), 90.0).unwrap();
        assert!(branch.position().x.abs() < 1e-12);
        assert!((branch.position().y - 20.0).abs() < 1e-12);
        assert_eq!(branch.heading(), 135.0);
        assert_eq!(branch.defaults(), pose.defaults());
    }

    #[test]
    fn test_branch_with_override_defaults() {
        let pose = origin();
        let branch = pose
            .branch(Frame::Current, Point::ORIGIN, 0.0, Some(TraceDefaults::cpw(20.0, 10.0, 100.0)))
            .unwrap();
        assert_eq!(branch.defaults().w, Some(20.0));
        assert_eq!(pose.defaults().w, Some(10.0));
    }

    #[test]
    fn test_overlay_and_require() {
        let defaults = TraceDefaults::cpw(10.0, 5.0, 25.0);
        let merged = defaults.overlay(&TraceDefaults::default().with_w(4.0));
        assert_eq!(merged.w, Some(4.0));
        assert_eq!(merged.s, Some(5.0));
        assert!(matches!(
            merged.require(ParamKey::ROut, "stub"),
            Err(LayoutError::MissingParameter { key: ParamKey::ROut, .. })
        ));
    }

    #[test]
    fn test_negative_default_rejected() {
        let result = Pose::new(Point::ORIGIN, 0.0, TraceDefaults::default().with_s(-1.0));
        assert!(matches!(result, Err(LayoutError::Degenerate { .. })));
    }

    #[test]
    fn test_headings_match_modulo() {
        assert!(headings_match(-90.0, 270.0, 1e-9));
        assert!(headings_match(359.9999999999, 0.0, 1e-6));
        assert!(!headings_match(10.0, 20.0, 1e-6));
    }
}
