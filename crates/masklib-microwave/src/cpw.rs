//! Coplanar waveguide primitives.
//!
//! A CPW is drawn in the negative: the two gaps on either side of the
//! centre conductor are the emitted shapes. `w` is the conductor width and
//! `s` the gap, so every primitive here draws two rails, one on each side of
//! the pose's axis.

use log::debug;
use serde::{Deserialize, Serialize};

use masklib_core::error::{ensure_finite, LayoutError};
use masklib_core::geometry::Point;
use masklib_core::shapes::{
    CurveRect, Flip, HAlign, InsideCurve, Rectangle, ShapeGenerator, SkewRect, VAlign,
};
use masklib_core::{GeometrySink, ParamKey, Pose, Result, Sense, TraceDefaults, Turn};

use crate::{at, staged, wrap_degrees};

/// A circular bend: span in degrees, sense, and arc point density.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bend {
    pub angle: f64,
    pub sense: Sense,
    /// Points per full turn.
    pub density: f64,
}

impl Bend {
    pub const DEFAULT_DENSITY: f64 = 120.0;

    pub fn new(angle: f64, sense: Sense) -> Self {
        Self {
            angle,
            sense,
            density: Self::DEFAULT_DENSITY,
        }
    }

    pub fn ccw(angle: f64) -> Self {
        Self::new(angle, Sense::Ccw)
    }

    pub fn cw(angle: f64) -> Self {
        Self::new(angle, Sense::Cw)
    }

    pub fn with_density(mut self, density: f64) -> Self {
        self.density = density;
        self
    }
}

/// Pose displacement, in the pose's local frame, produced by a bend.
pub(crate) fn bend_offset(radius: f64, angle: f64, sense: Sense) -> Point {
    let t = angle.to_radians();
    Point::new(
        radius * t.sin(),
        sense.center_side() * radius * (1.0 - t.cos()),
    )
}

/// One step of a CPW path.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Segment {
    Straight(f64),
    Bend(Bend),
}

impl Segment {
    /// Length along the centre line for a path of bend radius `radius`.
    pub fn path_length(&self, radius: f64) -> f64 {
        match self {
            Segment::Straight(length) => *length,
            Segment::Bend(bend) => radius * wrap_degrees(bend.angle).to_radians(),
        }
    }
}

/// Transition between two CPW cross-sections. Unset ends take the pose's
/// `w`/`s`; an unset length gives a 30° outer taper.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Taper {
    pub length: Option<f64>,
    pub w0: Option<f64>,
    pub s0: Option<f64>,
    pub w1: Option<f64>,
    pub s1: Option<f64>,
}

impl Taper {
    /// From the pose's cross-section to `(w1, s1)`.
    pub fn to_cpw(w1: f64, s1: f64) -> Self {
        Self {
            w1: Some(w1),
            s1: Some(s1),
            ..Default::default()
        }
    }

    /// From `(w0, s0)` to the pose's cross-section.
    pub fn from_cpw(w0: f64, s0: f64) -> Self {
        Self {
            w0: Some(w0),
            s0: Some(s0),
            ..Default::default()
        }
    }

    pub fn with_length(mut self, length: f64) -> Self {
        self.length = Some(length);
        self
    }
}

/// Options of a shorted stub end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StubShort {
    pub flipped: bool,
    pub curve_ins: bool,
    pub curve_out: bool,
}

impl Default for StubShort {
    fn default() -> Self {
        Self {
            flipped: false,
            curve_ins: true,
            curve_out: true,
        }
    }
}

/// Options of a rounded open end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StubRound {
    pub round_left: bool,
    pub round_right: bool,
    pub flipped: bool,
}

impl Default for StubRound {
    fn default() -> Self {
        Self {
            round_left: true,
            round_right: true,
            flipped: false,
        }
    }
}

/// Bond pad and its taper down to the line.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Launcher {
    pub pad_w: f64,
    pub pad_s: f64,
    pub r_out: f64,
    pub r_ins: f64,
    /// Taper length; `None` gives a 30° taper.
    pub taper_length: Option<f64>,
}

impl Default for Launcher {
    fn default() -> Self {
        Self {
            pad_w: 300.0,
            pad_s: 160.0,
            r_out: 0.0,
            r_ins: 0.0,
            taper_length: None,
        }
    }
}

fn explicit_or(
    value: Option<f64>,
    params: &TraceDefaults,
    key: ParamKey,
    context: &str,
) -> Result<f64> {
    match value {
        Some(v) => Ok(v),
        None => params.require(key, context),
    }
}

fn ensure_positive(context: &str, name: &str, value: f64) -> Result<()> {
    if value > 0.0 {
        Ok(())
    } else {
        Err(LayoutError::degenerate(
            context,
            format!("{name} must be positive (got {value})"),
        ))
    }
}

/// Straight run of `length` along the heading.
pub fn cpw_straight(
    sink: &mut dyn GeometrySink,
    pose: &mut Pose,
    length: f64,
    overrides: &TraceDefaults,
) -> Result<()> {
    const CONTEXT: &str = "cpw_straight";
    ensure_finite(CONTEXT, &[length])?;
    let params = pose.resolve(overrides, CONTEXT)?;
    let w = params.require(ParamKey::W, CONTEXT)?;
    let s = params.require(ParamKey::S, CONTEXT)?;
    debug!(
        "{CONTEXT}: {length} from {:?} heading {}",
        pose.position(),
        pose.heading()
    );

    staged(sink, pose, |buf, pose| {
        Rectangle::new(at(pose, Point::new(0.0, -w / 2.0)), length, -s).emit_into(buf)?;
        Rectangle::new(at(pose, Point::new(0.0, w / 2.0)), length, s).emit_into(buf)?;
        pose.advance_distance(length, Turn::NONE)
    })
}

/// Linear change of cross-section.
pub fn cpw_taper(
    sink: &mut dyn GeometrySink,
    pose: &mut Pose,
    taper: &Taper,
    overrides: &TraceDefaults,
) -> Result<()> {
    const CONTEXT: &str = "cpw_taper";
    let params = pose.resolve(overrides, CONTEXT)?;
    let w0 = explicit_or(taper.w0, &params, ParamKey::W, CONTEXT)?;
    let s0 = explicit_or(taper.s0, &params, ParamKey::S, CONTEXT)?;
    let w1 = explicit_or(taper.w1, &params, ParamKey::W, CONTEXT)?;
    let s1 = explicit_or(taper.s1, &params, ParamKey::S, CONTEXT)?;
    let length = taper
        .length
        .unwrap_or_else(|| 3f64.sqrt() * (w0 / 2.0 + s0 - w1 / 2.0 - s1).abs());
    ensure_finite(CONTEXT, &[w0, s0, w1, s1, length])?;
    debug!(
        "{CONTEXT}: ({w0}, {s0}) -> ({w1}, {s1}) over {length} from {:?}",
        pose.position()
    );

    staged(sink, pose, |buf, pose| {
        SkewRect::new(
            at(pose, Point::new(0.0, -w0 / 2.0)),
            length,
            s0,
            Point::new(0.0, w0 / 2.0 - w1 / 2.0),
            s1,
        )
        .with_valign(VAlign::Top)
        .with_edge_align(VAlign::Top)
        .emit_into(buf)?;
        SkewRect::new(
            at(pose, Point::new(0.0, w0 / 2.0)),
            length,
            s0,
            Point::new(0.0, w1 / 2.0 - w0 / 2.0),
            s1,
        )
        .with_valign(VAlign::Bottom)
        .with_edge_align(VAlign::Bottom)
        .emit_into(buf)?;
        pose.advance_distance(length, Turn::NONE)
    })
}

/// Circular bend of the pose's `radius`.
///
/// The angle is reduced to `[0, 360)` first; a zero angle draws nothing but
/// still records the pose's previous state.
pub fn cpw_bend(
    sink: &mut dyn GeometrySink,
    pose: &mut Pose,
    bend: Bend,
    overrides: &TraceDefaults,
) -> Result<()> {
    const CONTEXT: &str = "cpw_bend";
    ensure_finite(CONTEXT, &[bend.angle, bend.density])?;
    let params = pose.resolve(overrides, CONTEXT)?;
    let w = params.require(ParamKey::W, CONTEXT)?;
    let s = params.require(ParamKey::S, CONTEXT)?;
    let radius = params.require(ParamKey::Radius, CONTEXT)?;
    ensure_positive(CONTEXT, "radius", radius)?;
    ensure_positive(CONTEXT, "point density", bend.density)?;
    let angle = wrap_degrees(bend.angle);
    debug!(
        "{CONTEXT}: {angle} deg {:?} r = {radius} from {:?} heading {}",
        bend.sense,
        pose.position(),
        pose.heading()
    );

    staged(sink, pose, |buf, pose| {
        if angle > 0.0 {
            let start = pose.placement();
            let flip = Flip::new(false, bend.sense == Sense::Cw);
            CurveRect::new(start, s, radius)
                .with_angle(angle)
                .with_density(bend.density)
                .with_roffset(w / 2.0)
                .with_ralign(VAlign::Bottom)
                .with_flip(flip)
                .emit_into(buf)?;
            CurveRect::new(start, s, radius)
                .with_angle(angle)
                .with_density(bend.density)
                .with_roffset(-w / 2.0)
                .with_ralign(VAlign::Top)
                .with_valign(VAlign::Top)
                .with_flip(flip)
                .emit_into(buf)?;
        }
        pose.advance_vector(
            bend_offset(radius, angle, bend.sense),
            Turn::By(bend.sense.heading_sign() * angle),
        )
    })
}

/// Run a sequence of straights and bends as one call.
pub fn cpw_path(
    sink: &mut dyn GeometrySink,
    pose: &mut Pose,
    segments: &[Segment],
    overrides: &TraceDefaults,
) -> Result<()> {
    staged(sink, pose, |buf, pose| {
        for segment in segments {
            match segment {
                Segment::Straight(length) => cpw_straight(buf, pose, *length, overrides)?,
                Segment::Bend(bend) => cpw_bend(buf, pose, *bend, overrides)?,
            }
        }
        Ok(())
    })
}

/// Short the line to ground with rounded returns of radius `r_out`.
///
/// Without a positive `r_out` this is a straight run of `s / 2`. The return
/// radius never exceeds `s / 2`, so the stub ends where the pose does.
pub fn cpw_stub_short(
    sink: &mut dyn GeometrySink,
    pose: &mut Pose,
    stub: StubShort,
    overrides: &TraceDefaults,
) -> Result<()> {
    const CONTEXT: &str = "cpw_stub_short";
    let params = pose.resolve(overrides, CONTEXT)?;
    let w = params.require(ParamKey::W, CONTEXT)?;
    let s = params.require(ParamKey::S, CONTEXT)?;
    let r_out = params.r_out.unwrap_or(0.0).min(s / 2.0);
    if r_out <= 0.0 {
        return cpw_straight(sink, pose, s / 2.0, &params);
    }
    debug!("{CONTEXT}: {stub:?} r_out = {r_out} at {:?}", pose.position());

    let l = r_out;
    let dx = if stub.flipped { l } else { 0.0 };
    let halign = if stub.flipped { HAlign::Right } else { HAlign::Left };
    let hflip = Flip::new(stub.flipped, false);
    let both = Flip::new(stub.flipped, true);

    staged(sink, pose, |buf, pose| {
        let rect = |x: f64, y: f64, width: f64, height: f64, valign: VAlign| {
            Rectangle::new(at(pose, Point::new(x, y)), width, height)
                .with_halign(halign)
                .with_valign(valign)
        };
        let corner = |x: f64, y: f64, flip: Flip| {
            CurveRect::new(at(pose, Point::new(x, y)), l, r_out)
                .with_ralign(VAlign::Top)
                .with_flip(flip)
        };

        if l < s / 2.0 {
            rect(dx, w / 2.0 + l, l, s - 2.0 * l, VAlign::Bottom).emit_into(buf)?;
            rect(dx, -w / 2.0 - l, l, s - 2.0 * l, VAlign::Top).emit_into(buf)?;
        }
        if stub.curve_out {
            corner(dx, w / 2.0 + s - l, hflip).emit_into(buf)?;
            corner(dx, -w / 2.0 - s + l, both).emit_into(buf)?;
        } else {
            rect(dx, w / 2.0 + s - l, l, l, VAlign::Bottom).emit_into(buf)?;
            rect(dx, -w / 2.0 - s + l, l, l, VAlign::Top).emit_into(buf)?;
        }
        if stub.curve_ins {
            corner(dx, w / 2.0 + l, both).emit_into(buf)?;
            corner(dx, -w / 2.0 - l, hflip).emit_into(buf)?;
        } else {
            rect(dx, w / 2.0 + l, l, l, VAlign::Top).emit_into(buf)?;
            rect(dx, -w / 2.0 - l, l, l, VAlign::Bottom).emit_into(buf)?;
        }
        pose.advance_distance(l, Turn::NONE)
    })
}

/// Open the line: a gap of length `s` across the full width, with optional
/// outer (`r_out`) and inner (`r_ins`) rounding.
pub fn cpw_stub_open(
    sink: &mut dyn GeometrySink,
    pose: &mut Pose,
    flipped: bool,
    overrides: &TraceDefaults,
) -> Result<()> {
    const CONTEXT: &str = "cpw_stub_open";
    let params = pose.resolve(overrides, CONTEXT)?;
    let w = params.require(ParamKey::W, CONTEXT)?;
    let s = params.require(ParamKey::S, CONTEXT)?;
    let r_out = params.r_out.unwrap_or(0.0);
    let r_ins = params.r_ins.unwrap_or(0.0);
    debug!(
        "{CONTEXT}: flipped = {flipped} r_out = {r_out} r_ins = {r_ins} at {:?}",
        pose.position()
    );

    let dx = if flipped { s } else { 0.0 };
    let hflip = Flip::new(flipped, false);
    let both = Flip::new(flipped, true);

    staged(sink, pose, |buf, pose| {
        if r_ins > 0.0 {
            InsideCurve::new(at(pose, Point::new(dx, w / 2.0)), r_ins)
                .with_flip(hflip)
                .emit_into(buf)?;
            InsideCurve::new(at(pose, Point::new(dx, -w / 2.0)), r_ins)
                .with_flip(both)
                .emit_into(buf)?;
        }
        if r_out > 0.0 {
            CurveRect::new(at(pose, Point::new(dx, w / 2.0)), s, r_out)
                .with_ralign(VAlign::Top)
                .with_flip(hflip)
                .emit_into(buf)?;
            let span = if flipped { -s } else { s };
            Rectangle::new(at(pose, Point::new(dx, 0.0)), span, w)
                .with_valign(VAlign::Middle)
                .emit_into(buf)?;
            CurveRect::new(at(pose, Point::new(dx, -w / 2.0)), s, r_out)
                .with_ralign(VAlign::Top)
                .with_flip(both)
                .emit_into(buf)?;
        } else {
            Rectangle::new(pose.placement(), s, w + 2.0 * s)
                .with_valign(VAlign::Middle)
                .emit_into(buf)?;
        }
        pose.advance_distance(s, Turn::NONE)
    })
}

/// Open end that keeps the gap width constant around a semicircular tip;
/// the radii follow from `w` and `s`.
pub fn cpw_stub_round(
    sink: &mut dyn GeometrySink,
    pose: &mut Pose,
    stub: StubRound,
    overrides: &TraceDefaults,
) -> Result<()> {
    const CONTEXT: &str = "cpw_stub_round";
    let params = pose.resolve(overrides, CONTEXT)?;
    let w = params.require(ParamKey::W, CONTEXT)?;
    let s = params.require(ParamKey::S, CONTEXT)?;
    debug!("{CONTEXT}: {stub:?} at {:?}", pose.position());

    let flipped = stub.flipped;
    let dx = if flipped { s + w / 2.0 } else { 0.0 };
    let halign = if flipped { HAlign::Right } else { HAlign::Left };
    let inside_x = if flipped { s } else { w / 2.0 };
    let hflip = Flip::new(flipped, false);
    let both = Flip::new(flipped, true);

    staged(sink, pose, |buf, pose| {
        // Upper side.
        if stub.round_left {
            CurveRect::new(at(pose, Point::new(dx, w / 2.0)), s, w / 2.0)
                .with_ralign(VAlign::Bottom)
                .with_flip(hflip)
                .emit_into(buf)?;
        } else {
            Rectangle::new(at(pose, Point::new(0.0, w / 2.0)), s + w / 2.0, s).emit_into(buf)?;
            InsideCurve::new(at(pose, Point::new(inside_x, w / 2.0)), w / 2.0)
                .with_flip(hflip)
                .emit_into(buf)?;
            Rectangle::new(at(pose, Point::new(s + w / 2.0 - dx, w / 2.0)), -s, -w / 2.0)
                .with_halign(halign)
                .emit_into(buf)?;
        }
        // Lower side.
        if stub.round_right {
            CurveRect::new(at(pose, Point::new(dx, -w / 2.0)), s, w / 2.0)
                .with_ralign(VAlign::Bottom)
                .with_flip(both)
                .emit_into(buf)?;
        } else {
            Rectangle::new(at(pose, Point::new(0.0, -w / 2.0)), s + w / 2.0, -s).emit_into(buf)?;
            InsideCurve::new(at(pose, Point::new(inside_x, -w / 2.0)), w / 2.0)
                .with_flip(both)
                .emit_into(buf)?;
            Rectangle::new(at(pose, Point::new(s + w / 2.0 - dx, -w / 2.0)), -s, w / 2.0)
                .with_halign(halign)
                .emit_into(buf)?;
        }
        pose.advance_distance(s + w / 2.0, Turn::NONE)
    })
}

/// Bond pad: an open end, a square pad section, then a taper down to the
/// line's own cross-section.
pub fn cpw_launcher(
    sink: &mut dyn GeometrySink,
    pose: &mut Pose,
    launcher: &Launcher,
    overrides: &TraceDefaults,
) -> Result<()> {
    debug!("cpw_launcher: {launcher:?} at {:?}", pose.position());
    let pad = TraceDefaults {
        w: Some(launcher.pad_w),
        s: Some(launcher.pad_s),
        radius: overrides.radius,
        r_out: Some(launcher.r_out),
        r_ins: Some(launcher.r_ins),
    };
    let taper = Taper {
        length: launcher.taper_length,
        ..Taper::from_cpw(launcher.pad_w, launcher.pad_s)
    };

    staged(sink, pose, |buf, pose| {
        cpw_stub_open(buf, pose, true, &pad)?;
        cpw_straight(buf, pose, launcher.pad_w, &pad)?;
        cpw_taper(buf, pose, &taper, overrides)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use masklib_core::{Entity, Recorder, Style};

    fn pose() -> Pose {
        Pose::new(Point::ORIGIN, 0.0, TraceDefaults::standard_cpw()).unwrap()
    }

    fn sink() -> Recorder {
        Recorder::new(Style::default())
    }

    fn outlines(sink: &Recorder) -> Vec<&Entity> {
        sink.entities()
            .iter()
            .filter(|e| matches!(e, Entity::Outline { .. }))
            .collect()
    }

    #[test]
    fn test_straight_draws_two_rails_and_advances() {
        let mut sink = sink();
        let mut pose = pose();
        cpw_straight(&mut sink, &mut pose, 100.0, &TraceDefaults::default()).unwrap();
        assert_eq!(outlines(&sink).len(), 2);
        assert_eq!(pose.position(), Point::new(100.0, 0.0));

        let lower = outlines(&sink)[0].bbox().unwrap();
        let upper = outlines(&sink)[1].bbox().unwrap();
        assert!((lower.min.y - -10.0).abs() < 1e-12 && (lower.max.y - -5.0).abs() < 1e-12);
        assert!((upper.min.y - 5.0).abs() < 1e-12 && (upper.max.y - 10.0).abs() < 1e-12);
    }

    #[test]
    fn test_explicit_override_wins() {
        let mut sink = sink();
        let mut pose = pose();
        let wide = TraceDefaults::default().with_w(40.0);
        cpw_straight(&mut sink, &mut pose, 10.0, &wide).unwrap();
        let upper = outlines(&sink)[1].bbox().unwrap();
        assert!((upper.min.y - 20.0).abs() < 1e-12);
        assert_eq!(pose.defaults().w, Some(10.0));
    }

    #[test]
    fn test_missing_gap_is_reported() {
        let mut sink = sink();
        let mut pose =
            Pose::new(Point::ORIGIN, 0.0, TraceDefaults::default().with_w(10.0)).unwrap();
        let err = cpw_straight(&mut sink, &mut pose, 10.0, &TraceDefaults::default()).unwrap_err();
        assert!(matches!(
            err,
            LayoutError::MissingParameter {
                key: ParamKey::S,
                ..
            }
        ));
        assert!(sink.is_empty());
        assert_eq!(pose.position(), Point::ORIGIN);
    }

    #[test]
    fn test_taper_default_length_and_end_width() {
        let mut sink = sink();
        let mut pose = pose();
        cpw_taper(&mut sink, &mut pose, &Taper::to_cpw(20.0, 10.0), &TraceDefaults::default())
            .unwrap();
        let expected = 3f64.sqrt() * (5.0 + 5.0 - 10.0 - 10.0f64).abs();
        assert!((pose.position().x - expected).abs() < 1e-9);

        let upper = outlines(&sink)[1].bbox().unwrap();
        assert!((upper.max.y - 20.0).abs() < 1e-9);
        assert!((upper.min.y - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_quarter_bend_pose_update() {
        let mut sink = sink();
        let mut pose = pose();
        cpw_bend(&mut sink, &mut pose, Bend::ccw(90.0), &TraceDefaults::default()).unwrap();
        assert!((pose.position().x - 25.0).abs() < 1e-9);
        assert!((pose.position().y - -25.0).abs() < 1e-9);
        assert!((pose.heading() - -90.0).abs() < 1e-12);

        let mut pose = self::pose();
        cpw_bend(&mut sink, &mut pose, Bend::cw(90.0), &TraceDefaults::default()).unwrap();
        assert!((pose.position().y - 25.0).abs() < 1e-9);
        assert!((pose.heading() - 90.0).abs() < 1e-12);
    }

    #[test]
    fn test_negative_angle_is_normalized() {
        let mut sink = sink();
        let mut a = pose();
        let mut b = pose();
        cpw_bend(&mut sink, &mut a, Bend::ccw(-90.0), &TraceDefaults::default()).unwrap();
        cpw_bend(&mut sink, &mut b, Bend::ccw(270.0), &TraceDefaults::default()).unwrap();
        assert!(a.position().distance_to(&b.position()) < 1e-9);
        assert!((a.heading() - b.heading()).abs() < 1e-9);
    }

    #[test]
    fn test_zero_radius_rejected_without_side_effects() {
        let mut sink = sink();
        let mut pose = pose();
        let flat = TraceDefaults::default().with_radius(0.0);
        let err = cpw_bend(&mut sink, &mut pose, Bend::ccw(90.0), &flat).unwrap_err();
        assert!(matches!(err, LayoutError::Degenerate { .. }));
        assert!(sink.is_empty());
        assert_eq!(pose, self::pose());
    }

    #[test]
    fn test_stub_short_without_radius_is_half_gap_straight() {
        let mut sink = sink();
        let mut pose = pose();
        cpw_stub_short(&mut sink, &mut pose, StubShort::default(), &TraceDefaults::default())
            .unwrap();
        assert!((pose.position().x - 2.5).abs() < 1e-12);
        assert_eq!(outlines(&sink).len(), 2);
    }

    #[test]
    fn test_stub_short_rounded() {
        let mut sink = sink();
        let mut pose = pose();
        let rounded = TraceDefaults::default().with_r_out(1.0);
        cpw_stub_short(&mut sink, &mut pose, StubShort::default(), &rounded).unwrap();
        assert!((pose.position().x - 1.0).abs() < 1e-12);
        assert_eq!(outlines(&sink).len(), 6);
    }

    #[test]
    fn test_stub_short_radius_clamped_to_half_gap() {
        for flipped in [false, true] {
            let mut sink = sink();
            let mut pose = pose();
            let stub = StubShort {
                flipped,
                ..StubShort::default()
            };
            let wide = TraceDefaults::default().with_r_out(10.0);
            cpw_stub_short(&mut sink, &mut pose, stub, &wide).unwrap();
            assert!((pose.position().x - 2.5).abs() < 1e-12);
            assert_eq!(outlines(&sink).len(), 4);
            for entity in sink.entities() {
                for p in entity.points() {
                    assert!(p.x >= -1e-9 && p.x <= pose.position().x + 1e-9, "{p:?}");
                }
            }
        }
    }

    #[test]
    fn test_stub_open_square_end() {
        let mut sink = sink();
        let mut pose = pose();
        cpw_stub_open(&mut sink, &mut pose, false, &TraceDefaults::default()).unwrap();
        let outlines = outlines(&sink);
        assert_eq!(outlines.len(), 1);
        let bb = outlines[0].bbox().unwrap();
        assert!((bb.height() - 20.0).abs() < 1e-12);
        assert!((pose.position().x - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_stub_round_advances_past_tip() {
        let mut sink = sink();
        let mut pose = pose();
        cpw_stub_round(&mut sink, &mut pose, StubRound::default(), &TraceDefaults::default())
            .unwrap();
        assert!((pose.position().x - 10.0).abs() < 1e-12);
        assert_eq!(outlines(&sink).len(), 2);

        let square = StubRound {
            round_left: false,
            round_right: false,
            flipped: false,
        };
        let mut sink = self::sink();
        cpw_stub_round(&mut sink, &mut pose, square, &TraceDefaults::default()).unwrap();
        assert_eq!(outlines(&sink).len(), 6);
    }

    #[test]
    fn test_launcher_ends_on_line_cross_section() {
        let mut sink = sink();
        let mut pose = pose();
        cpw_launcher(&mut sink, &mut pose, &Launcher::default(), &TraceDefaults::default())
            .unwrap();
        let taper = 3f64.sqrt() * (150.0 + 160.0 - 5.0 - 5.0f64).abs();
        assert!((pose.position().x - (160.0 + 300.0 + taper)).abs() < 1e-9);
        assert_eq!(pose.defaults().w, Some(10.0));
    }

    #[test]
    fn test_path_length_of_segments() {
        let bend = Segment::Bend(Bend::ccw(180.0));
        assert!((bend.path_length(10.0) - 10.0 * std::f64::consts::PI).abs() < 1e-12);
        assert_eq!(Segment::Straight(7.0).path_length(10.0), 7.0);
    }
}
