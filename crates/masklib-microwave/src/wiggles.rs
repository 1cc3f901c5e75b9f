//! Meanders of a fixed electrical length.
//!
//! A meander is `n` full wiggles of half-height `h` between an optional
//! entry and exit quarter bend. The planner fixes `n` and `h` so the centre
//! line has exactly the requested length; [`cpw_wiggles`] draws it as a CPW
//! and [`inductor_wiggles`] as a thin wire filled in on both sides.

use std::f64::consts::PI;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use masklib_core::error::{ensure_finite, LayoutError};
use masklib_core::geometry::{Placement, Point};
use masklib_core::shapes::{Rectangle, ShapeGenerator, VAlign};
use masklib_core::{GeometrySink, ParamKey, Pose, Result, Sense, TraceDefaults, Turn};

use crate::cpw::{cpw_path, Bend, Segment};
use crate::wire::wire_bend;
use crate::{at, staged};

/// Most turns a single meander may be planned with.
pub const MAX_TURNS: usize = 100_000;

fn bends(start_bend: bool, stop_bend: bool) -> f64 {
    f64::from(u8::from(start_bend) + u8::from(stop_bend))
}

/// Half-height of the wiggles that give a centre line of `length`.
pub fn wiggle_height(
    length: f64,
    turns: usize,
    radius: f64,
    start_bend: bool,
    stop_bend: bool,
) -> f64 {
    let n = turns as f64;
    let ends = bends(start_bend, stop_bend);
    (length - (ends / 2.0 + 2.0 * n) * PI * radius + ends * radius) / (4.0 * n)
}

/// Centre-line length of `turns` wiggles of half-height `height`.
pub fn wiggle_length(
    height: f64,
    turns: usize,
    radius: f64,
    start_bend: bool,
    stop_bend: bool,
) -> f64 {
    let n = turns as f64;
    let ends = bends(start_bend, stop_bend);
    4.0 * n * height + (ends / 2.0 + 2.0 * n) * PI * radius - ends * radius
}

/// CPW meander request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Wiggles {
    pub length: f64,
    pub min_turns: usize,
    /// Upper bound on the half-height; more turns are added until it holds.
    pub max_width: Option<f64>,
    pub sense: Sense,
    pub start_bend: bool,
    pub stop_bend: bool,
}

impl Wiggles {
    pub fn new(length: f64) -> Self {
        Self {
            length,
            min_turns: 1,
            max_width: None,
            sense: Sense::Ccw,
            start_bend: true,
            stop_bend: true,
        }
    }

    pub fn with_min_turns(mut self, turns: usize) -> Self {
        self.min_turns = turns;
        self
    }

    pub fn with_max_width(mut self, max_width: f64) -> Self {
        self.max_width = Some(max_width);
        self
    }

    pub fn with_sense(mut self, sense: Sense) -> Self {
        self.sense = sense;
        self
    }

    pub fn with_ends(mut self, start_bend: bool, stop_bend: bool) -> Self {
        self.start_bend = start_bend;
        self.stop_bend = stop_bend;
        self
    }
}

/// Solved meander.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WigglePlan {
    pub turns: usize,
    /// Half-height `h`.
    pub height: f64,
    /// Centre-line length.
    pub length: f64,
    pub radius: f64,
    pub sense: Sense,
    pub start_bend: bool,
    pub stop_bend: bool,
}

impl WigglePlan {
    /// The straights and bends that trace this meander as a CPW.
    pub fn segments(&self) -> Vec<Segment> {
        let h = self.height;
        let r = self.radius;
        let forward = self.sense;
        let back = self.sense.flipped();
        let mut out = Vec::with_capacity(4 + 6 * self.turns);
        let tail = |out: &mut Vec<Segment>| {
            if h > r {
                out.push(Segment::Straight(h - r));
            }
        };

        if self.start_bend {
            out.push(Segment::Bend(Bend::new(90.0, forward)));
            tail(&mut out);
        } else {
            out.push(Segment::Straight(h));
        }
        out.push(Segment::Bend(Bend::new(180.0, back)));
        out.push(Segment::Straight(h + r));
        tail(&mut out);
        out.push(Segment::Bend(Bend::new(180.0, forward)));
        tail(&mut out);
        for _ in 1..self.turns {
            out.push(Segment::Straight(h + r));
            out.push(Segment::Bend(Bend::new(180.0, back)));
            out.push(Segment::Straight(h + r));
            tail(&mut out);
            out.push(Segment::Bend(Bend::new(180.0, forward)));
            tail(&mut out);
        }
        if self.stop_bend {
            out.push(Segment::Bend(Bend::new(90.0, back)));
        } else {
            out.push(Segment::Straight(r));
        }
        out
    }
}

fn check_radius(context: &str, radius: f64) -> Result<()> {
    if radius > 0.0 {
        Ok(())
    } else {
        Err(LayoutError::degenerate(
            context,
            format!("radius must be positive (got {radius})"),
        ))
    }
}

/// Turn count to start the search from when the half-height may not exceed
/// `limit`. One below the closed-form bound so rounding cannot skip the
/// smallest admissible count.
fn first_candidate(
    context: &str,
    length: f64,
    limit: f64,
    radius: f64,
    start_bend: bool,
    stop_bend: bool,
) -> Result<usize> {
    let ends = bends(start_bend, stop_bend);
    let bound =
        (length - ends * PI * radius / 2.0 + ends * radius) / (4.0 * limit + 2.0 * PI * radius);
    if bound > MAX_TURNS as f64 {
        return Err(too_many(context, bound));
    }
    Ok((bound.ceil() as usize).saturating_sub(1).max(1))
}

fn too_many(context: &str, turns: f64) -> LayoutError {
    LayoutError::infeasible(
        context,
        format!("meander needs {turns:.0} turns, more than {MAX_TURNS}"),
    )
}

fn too_tight(context: &str, height: f64, radius: f64) -> LayoutError {
    LayoutError::infeasible(
        context,
        format!("wiggle half-height {height:.4} is below the bend radius {radius}"),
    )
}

/// Choose the number of turns and the half-height for a CPW meander.
pub fn plan_wiggles(wiggles: &Wiggles, radius: f64) -> Result<WigglePlan> {
    const CONTEXT: &str = "plan_wiggles";
    ensure_finite(CONTEXT, &[wiggles.length, radius])?;
    if let Some(max_width) = wiggles.max_width {
        ensure_finite(CONTEXT, &[max_width])?;
    }
    check_radius(CONTEXT, radius)?;

    let (start, stop) = (wiggles.start_bend, wiggles.stop_bend);
    let limit = wiggles.max_width.map(|max_width| max_width.max(radius));
    let mut turns = wiggles.min_turns.max(1);
    if let Some(limit) = limit {
        turns = turns.max(first_candidate(CONTEXT, wiggles.length, limit, radius, start, stop)?);
    }
    let mut height = wiggle_height(wiggles.length, turns, radius, start, stop);
    if let Some(limit) = limit {
        while height > limit {
            turns += 1;
            height = wiggle_height(wiggles.length, turns, radius, start, stop);
        }
    }
    if turns > MAX_TURNS {
        return Err(too_many(CONTEXT, turns as f64));
    }
    if height < radius {
        return Err(too_tight(CONTEXT, height, radius));
    }
    debug!("{CONTEXT}: {} -> {turns} turns of h = {height}", wiggles.length);

    Ok(WigglePlan {
        turns,
        height,
        length: wiggles.length,
        radius,
        sense: wiggles.sense,
        start_bend: start,
        stop_bend: stop,
    })
}

/// Draw a CPW meander of exactly `wiggles.length` from the pose.
pub fn cpw_wiggles(
    sink: &mut dyn GeometrySink,
    pose: &mut Pose,
    wiggles: &Wiggles,
    overrides: &TraceDefaults,
) -> Result<WigglePlan> {
    let params = pose.resolve(overrides, "cpw_wiggles")?;
    let radius = params.require(ParamKey::Radius, "cpw_wiggles")?;
    let plan = plan_wiggles(wiggles, radius)?;
    cpw_path(sink, pose, &plan.segments(), overrides)?;
    Ok(plan)
}

/// Thin-wire meander request.
///
/// `width` bounds the total extent of the drawn area on each side of the
/// axis, `max_width` only the wiggle half-height; the tighter one wins.
/// Without a `length` the wiggles fill the width limit exactly.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InductorWiggles {
    pub length: Option<f64>,
    pub min_turns: usize,
    pub max_width: Option<f64>,
    pub width: Option<f64>,
    pub sense: Sense,
    pub start_bend: bool,
    pub stop_bend: bool,
    /// Extend the fill out to `width` on both sides.
    pub pad_to_width: bool,
}

impl Default for InductorWiggles {
    fn default() -> Self {
        Self {
            length: None,
            min_turns: 1,
            max_width: None,
            width: None,
            sense: Sense::Ccw,
            start_bend: true,
            stop_bend: true,
            pad_to_width: false,
        }
    }
}

impl InductorWiggles {
    pub fn with_length(mut self, length: f64) -> Self {
        self.length = Some(length);
        self
    }

    pub fn with_width(mut self, width: f64) -> Self {
        self.width = Some(width);
        self
    }

    pub fn with_max_width(mut self, max_width: f64) -> Self {
        self.max_width = Some(max_width);
        self
    }

    pub fn with_min_turns(mut self, turns: usize) -> Self {
        self.min_turns = turns;
        self
    }

    pub fn with_sense(mut self, sense: Sense) -> Self {
        self.sense = sense;
        self
    }

    pub fn padded(mut self) -> Self {
        self.pad_to_width = true;
        self
    }

    fn limit(&self) -> Option<f64> {
        match (self.max_width, self.width) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }
}

/// Choose turns and half-height for a wire of width `w`.
pub fn plan_inductor(inductor: &InductorWiggles, w: f64, radius: f64) -> Result<WigglePlan> {
    const CONTEXT: &str = "plan_inductor";
    ensure_finite(CONTEXT, &[w, radius])?;
    check_radius(CONTEXT, radius)?;
    let limit = inductor.limit();
    if let Some(limit) = limit {
        ensure_finite(CONTEXT, &[limit])?;
    }

    let (start, stop) = (inductor.start_bend, inductor.stop_bend);
    let mut turns = inductor.min_turns.max(1);
    let height = match (inductor.length, limit) {
        (Some(length), limit) => {
            ensure_finite(CONTEXT, &[length])?;
            if let Some(limit) = limit {
                let room = (limit - radius - w / 2.0).max(radius);
                turns = turns.max(first_candidate(CONTEXT, length, room, radius, start, stop)?);
            }
            let mut height = wiggle_height(length, turns, radius, start, stop);
            if let Some(limit) = limit {
                while height + radius + w / 2.0 > limit && height >= radius {
                    turns += 1;
                    height = wiggle_height(length, turns, radius, start, stop);
                }
            }
            height
        }
        (None, Some(limit)) => limit - radius - w / 2.0,
        (None, None) => {
            return Err(LayoutError::infeasible(
                CONTEXT,
                "either a length or a width limit is required",
            ))
        }
    };
    if turns > MAX_TURNS {
        return Err(too_many(CONTEXT, turns as f64));
    }
    if height < radius {
        return Err(too_tight(CONTEXT, height, radius));
    }
    if let Some(limit) = limit {
        if height + radius + w / 2.0 > limit + 1e-9 {
            return Err(LayoutError::infeasible(
                CONTEXT,
                format!("no number of turns fits within {limit}"),
            ));
        }
    }
    debug!("{CONTEXT}: {turns} turns of h = {height}");

    Ok(WigglePlan {
        turns,
        height,
        length: wiggle_length(height, turns, radius, start, stop),
        radius,
        sense: inductor.sense,
        start_bend: start,
        stop_bend: stop,
    })
}

fn rect(pose: &Pose, x: f64, y: f64, width: f64, height: f64) -> Rectangle {
    Rectangle::new(at(pose, Point::new(x, y)), width, height)
}

/// Draw a wire meander, filling the metal around it.
pub fn inductor_wiggles(
    sink: &mut dyn GeometrySink,
    pose: &mut Pose,
    inductor: &InductorWiggles,
    overrides: &TraceDefaults,
) -> Result<WigglePlan> {
    const CONTEXT: &str = "inductor_wiggles";
    let params = pose.resolve(overrides, CONTEXT)?;
    let w = params.require(ParamKey::W, CONTEXT)?;
    let r = params.require(ParamKey::Radius, CONTEXT)?;
    let plan = plan_inductor(inductor, w, r)?;
    let pad_width = match (inductor.pad_to_width, inductor.width) {
        (false, _) => None,
        (true, Some(width)) => Some(width),
        (true, None) => {
            return Err(LayoutError::infeasible(
                CONTEXT,
                "padding to width needs a total width",
            ))
        }
    };
    info!(
        "{CONTEXT}: {} turns, h = {}, length = {}",
        plan.turns, plan.height, plan.length
    );

    let h = plan.height;
    let n = plan.turns as f64;
    let sense = plan.sense;
    let back = sense.flipped();
    let pm = -sense.heading_sign();
    let span = -h - h.max(r) - r - w / 2.0;
    let stop = f64::from(u8::from(plan.stop_bend));

    staged(sink, pose, |buf, pose| {
        if let Some(total) = pad_width {
            let reach = h + r + w / 2.0;
            if plan.start_bend {
                rect(pose, 0.0, pm * reach, 2.0 * r + n * 4.0 * r, pm * (total - reach))
                    .emit_into(buf)?;
                rect(
                    pose,
                    0.0,
                    -pm * reach,
                    stop * (r + w / 2.0) + n * 4.0 * r + r - w / 2.0,
                    pm * (reach - total),
                )
                .emit_into(buf)?;
            } else {
                rect(pose, -reach, pm * w / 2.0, reach - total, pm * ((r - w / 2.0) + n * 4.0 * r))
                    .emit_into(buf)?;
                rect(
                    pose,
                    reach,
                    -pm * r,
                    total - reach,
                    pm * (stop * (r + w / 2.0) + n * 4.0 * r + w / 2.0),
                )
                .emit_into(buf)?;
            }
        }

        if plan.start_bend {
            rect(pose, 0.0, pm * w / 2.0, r + w / 2.0, pm * (h + r)).emit_into(buf)?;
            wire_bend(buf, pose, 90.0, sense, &params)?;
            if h > r {
                rect(pose, 0.0, -pm * w / 2.0, h + w / 2.0, pm * (r - w / 2.0))
                    .with_valign(VAlign::Top)
                    .emit_into(buf)?;
                pose.advance_distance(h - r, Turn::NONE)?;
            } else {
                rect(pose, 0.0, -pm * w / 2.0, r + w / 2.0, pm * (r - w / 2.0))
                    .with_valign(VAlign::Top)
                    .emit_into(buf)?;
            }
        } else {
            rect(pose, 0.0, -pm * w / 2.0, 2.0 * r + w / 2.0, pm * (r - w / 2.0))
                .with_valign(VAlign::Top)
                .emit_into(buf)?;
            pose.advance_distance(r, Turn::NONE)?;
        }

        rect(pose, 0.0, pm * w / 2.0, span, pm * (2.0 * r - w)).emit_into(buf)?;
        wire_bend(buf, pose, 180.0, back, &params)?;
        pose.advance_distance(h + r, Turn::NONE)?;
        if h > r {
            pose.advance_distance(h - r, Turn::NONE)?;
        }
        rect(pose, 0.0, -pm * w / 2.0, span, pm * (w - 2.0 * r)).emit_into(buf)?;
        wire_bend(buf, pose, 180.0, sense, &params)?;
        if h > r {
            pose.advance_distance(h - r, Turn::NONE)?;
        }

        for _ in 1..plan.turns {
            pose.advance_distance(h + r, Turn::NONE)?;
            rect(pose, 0.0, pm * w / 2.0, span, pm * (2.0 * r - w)).emit_into(buf)?;
            wire_bend(buf, pose, 180.0, back, &params)?;
            pose.advance_distance(2.0 * h, Turn::NONE)?;
            rect(pose, 0.0, -pm * w / 2.0, span, pm * (w - 2.0 * r)).emit_into(buf)?;
            wire_bend(buf, pose, 180.0, sense, &params)?;
            pose.advance_distance(h - r, Turn::NONE)?;
        }

        // Anchored in the previous frame, drawn along the current heading.
        let closing = Placement::new(
            pose.last_local_to_world(Point::new(-r - w / 2.0, pm * w / 2.0)),
            pose.heading(),
        );
        Rectangle::new(closing, w / 2.0 + h, pm * (r - w / 2.0)).emit_into(buf)?;

        if plan.stop_bend {
            rect(pose, r + w / 2.0, -pm * w / 2.0, h + r, pm * (r + w / 2.0)).emit_into(buf)?;
            wire_bend(buf, pose, 90.0, back, &params)?;
        } else {
            rect(pose, 0.0, pm * w / 2.0, r, pm * (r - w / 2.0)).emit_into(buf)?;
            pose.advance_distance(r, Turn::NONE)?;
        }
        Ok(plan)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use masklib_core::{Recorder, Style};

    #[test]
    fn test_height_and_length_are_inverse() {
        for (start, stop) in [(true, true), (true, false), (false, true), (false, false)] {
            let h = wiggle_height(1000.0, 3, 20.0, start, stop);
            let l = wiggle_length(h, 3, 20.0, start, stop);
            assert!((l - 1000.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_plan_segments_sum_to_length() {
        for (start, stop) in [(true, true), (true, false), (false, true), (false, false)] {
            let wiggles = Wiggles::new(2000.0)
                .with_min_turns(2)
                .with_ends(start, stop);
            let plan = plan_wiggles(&wiggles, 25.0).unwrap();
            let total: f64 = plan.segments().iter().map(|s| s.path_length(25.0)).sum();
            assert!((total - 2000.0).abs() < 1e-9, "{start} {stop}: {total}");
        }
    }

    #[test]
    fn test_max_width_adds_turns() {
        let loose = plan_wiggles(&Wiggles::new(3000.0), 25.0).unwrap();
        let tight = plan_wiggles(&Wiggles::new(3000.0).with_max_width(100.0), 25.0).unwrap();
        assert_eq!(loose.turns, 1);
        assert!(tight.turns > loose.turns);
        assert!(tight.height <= 100.0);
        assert!(tight.height >= 25.0);
    }

    #[test]
    fn test_long_meander_finds_fewest_turns() {
        let plan = plan_wiggles(&Wiggles::new(1e6).with_max_width(100.0), 25.0).unwrap();
        assert!(plan.turns > 1000);
        assert!(plan.height <= 100.0);
        assert!(wiggle_height(1e6, plan.turns - 1, 25.0, true, true) > 100.0);
    }

    #[test]
    fn test_turn_count_is_bounded() {
        let err = plan_wiggles(&Wiggles::new(1e12).with_max_width(50.0), 25.0).unwrap_err();
        assert!(matches!(err, LayoutError::Infeasible { .. }));
        let inductor = InductorWiggles::default().with_length(1e12).with_width(100.0);
        let err = plan_inductor(&inductor, 5.0, 10.0).unwrap_err();
        assert!(matches!(err, LayoutError::Infeasible { .. }));
    }

    #[test]
    fn test_too_short_is_infeasible() {
        let err = plan_wiggles(&Wiggles::new(100.0), 25.0).unwrap_err();
        assert!(matches!(err, LayoutError::Infeasible { .. }));
    }

    #[test]
    fn test_segment_shape_without_end_bends() {
        let plan = plan_wiggles(&Wiggles::new(2000.0).with_ends(false, false), 25.0).unwrap();
        let segments = plan.segments();
        assert!(matches!(segments.first(), Some(Segment::Straight(_))));
        assert_eq!(segments.last(), Some(&Segment::Straight(25.0)));
    }

    #[test]
    fn test_inductor_fills_width_without_length() {
        let inductor = InductorWiggles::default().with_width(100.0);
        let plan = plan_inductor(&inductor, 4.0, 10.0).unwrap();
        assert!((plan.height + 10.0 + 2.0 - 100.0).abs() < 1e-12);
        assert_eq!(plan.turns, 1);
    }

    #[test]
    fn test_inductor_needs_length_or_width() {
        let err = plan_inductor(&InductorWiggles::default(), 4.0, 10.0).unwrap_err();
        assert!(matches!(err, LayoutError::Infeasible { .. }));
    }

    #[test]
    fn test_inductor_draw_ends_on_axis() {
        let mut sink = Recorder::new(Style::default());
        let mut pose =
            Pose::new(Point::ORIGIN, 0.0, TraceDefaults::cpw(4.0, 0.0, 10.0)).unwrap();
        let inductor = InductorWiggles::default()
            .with_length(1500.0)
            .with_width(120.0);
        let plan =
            inductor_wiggles(&mut sink, &mut pose, &inductor, &TraceDefaults::default()).unwrap();
        assert!(plan.height + 10.0 + 2.0 <= 120.0 + 1e-9);
        assert!(!sink.is_empty());
        assert!(pose.position().y.abs() < 1e-9);
        assert!(pose.heading().abs() < 1e-9);
    }

    #[test]
    fn test_padding_without_width_rejected() {
        let mut sink = Recorder::new(Style::default());
        let mut pose =
            Pose::new(Point::ORIGIN, 0.0, TraceDefaults::cpw(4.0, 0.0, 10.0)).unwrap();
        let inductor = InductorWiggles::default()
            .with_length(1500.0)
            .with_max_width(120.0)
            .padded();
        let err =
            inductor_wiggles(&mut sink, &mut pose, &inductor, &TraceDefaults::default())
                .unwrap_err();
        assert!(matches!(err, LayoutError::Infeasible { .. }));
        assert!(sink.is_empty());
    }
}
