//! Curve-straight-curve connection between two poses.
//!
//! The route leaves `from` on a circle of the bend radius, follows a common
//! tangent, and arrives at the target on a second circle. Each circle can
//! be entered in either sense; the senses are picked from which side each
//! end sees the other, unless the caller fixes them.

use log::{debug, info};
use serde::{Deserialize, Serialize};

use masklib_core::error::{ensure_finite, LayoutError};
use masklib_core::geometry::Point;
use masklib_core::{GeometrySink, ParamKey, Pose, Result, Sense, TraceDefaults};

use crate::cpw::{cpw_path, Bend, Segment};
use crate::wrap_degrees;

/// Largest bend a connection may use.
const MAX_TURN: f64 = 270.0;

/// Options for [`cpw_direct_to`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectTo {
    /// Arrive against the target's heading, as when the target is the open
    /// end of another line facing this one.
    pub to_flipped: bool,
    pub sense1: Option<Sense>,
    pub sense2: Option<Sense>,
}

impl Default for DirectTo {
    fn default() -> Self {
        Self {
            to_flipped: true,
            sense1: None,
            sense2: None,
        }
    }
}

impl DirectTo {
    pub fn with_senses(mut self, sense1: Sense, sense2: Sense) -> Self {
        self.sense1 = Some(sense1);
        self.sense2 = Some(sense2);
        self
    }

    pub fn unflipped(mut self) -> Self {
        self.to_flipped = false;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DirectPlan {
    pub bend1: Bend,
    pub straight: f64,
    pub bend2: Bend,
}

impl DirectPlan {
    pub fn total_length(&self, radius: f64) -> f64 {
        self.segments().iter().map(|s| s.path_length(radius)).sum()
    }

    pub fn segments(&self) -> [Segment; 3] {
        [
            Segment::Bend(self.bend1),
            Segment::Straight(self.straight),
            Segment::Bend(self.bend2),
        ]
    }

    fn within(&self, limit: f64) -> bool {
        self.bend1.angle <= limit && self.bend2.angle <= limit
    }
}

/// Which way to bend from a frame to reach `point`.
fn side_of(origin: Point, heading: f64, point: Point) -> Sense {
    if (point - origin).rotate_deg(-heading).angle() < 0.0 {
        Sense::Ccw
    } else {
        Sense::Cw
    }
}

fn turn_center(origin: Point, heading: f64, sense: Sense, radius: f64) -> Point {
    origin + Point::new(0.0, sense.center_side() * radius).rotate_deg(heading)
}

/// Connection for one fixed pair of senses.
fn solve(
    start: (Point, f64),
    end: (Point, f64),
    radius: f64,
    sense1: Sense,
    sense2: Sense,
) -> Result<DirectPlan> {
    const CONTEXT: &str = "plan_direct_to";
    let (k1, k2) = (sense1.heading_sign(), sense2.heading_sign());
    let c1 = turn_center(start.0, start.1, sense1, radius);
    let c2 = turn_center(end.0, end.1, sense2, radius);
    let between = c2 - c1;
    let d = between.length();
    if d < 1e-9 {
        return Err(LayoutError::degenerate(CONTEXT, "turn centres coincide"));
    }
    let phi = between.angle().to_degrees();

    let (tangent, straight) = if sense1 == sense2 {
        (phi, d)
    } else {
        if d < 2.0 * radius - 1e-9 {
            return Err(LayoutError::infeasible(
                CONTEXT,
                format!("turn centres {d:.4} apart, closer than twice the radius {radius}"),
            ));
        }
        let correction = (2.0 * radius / d).min(1.0).asin();
        (phi + k1 * correction.to_degrees(), d * correction.cos())
    };

    Ok(DirectPlan {
        bend1: Bend::new(wrap_degrees(k1 * (tangent - start.1)), sense1),
        straight,
        bend2: Bend::new(wrap_degrees(k2 * (end.1 - tangent)), sense2),
    })
}

/// Plan the connection from `from` to `to` without drawing it.
///
/// When no admissible sense pair keeps both bends within 270° the poses are
/// too close for the radius and the call fails with `Infeasible`.
pub fn plan_direct_to(
    from: &Pose,
    to: &Pose,
    radius: f64,
    options: &DirectTo,
) -> Result<DirectPlan> {
    const CONTEXT: &str = "plan_direct_to";
    ensure_finite(CONTEXT, &[radius])?;
    if radius <= 0.0 {
        return Err(LayoutError::degenerate(
            CONTEXT,
            format!("radius must be positive (got {radius})"),
        ));
    }

    let start = (from.position(), from.heading());
    let arrival = if options.to_flipped {
        to.heading() + 180.0
    } else {
        to.heading()
    };
    let end = (to.position(), arrival);

    // First guess from each end's view of the other, then refined against
    // points two radii out to the chosen side.
    let guess1 = side_of(start.0, start.1, end.0);
    let guess2 = side_of(end.0, end.1, start.0);
    let probe1 = turn_center(start.0, start.1, guess1, 2.0 * radius);
    let probe2 = turn_center(end.0, end.1, guess2, 2.0 * radius);
    let sense1 = options
        .sense1
        .unwrap_or_else(|| side_of(start.0, start.1, probe2));
    let sense2 = options
        .sense2
        .unwrap_or_else(|| side_of(end.0, end.1, probe1));

    let primary = solve(start, end, radius, sense1, sense2);
    if let Ok(plan) = &primary {
        if plan.within(MAX_TURN) {
            debug!("{CONTEXT}: {plan:?}");
            return Ok(*plan);
        }
    }

    let choices = |fixed: Option<Sense>| match fixed {
        Some(sense) => vec![sense],
        None => vec![Sense::Ccw, Sense::Cw],
    };
    let mut best: Option<DirectPlan> = None;
    for s1 in choices(options.sense1) {
        for s2 in choices(options.sense2) {
            let Ok(plan) = solve(start, end, radius, s1, s2) else {
                continue;
            };
            if !plan.within(MAX_TURN) {
                continue;
            }
            if best.map_or(true, |b| plan.total_length(radius) < b.total_length(radius)) {
                best = Some(plan);
            }
        }
    }

    match (best, primary) {
        (Some(plan), _) => {
            debug!("{CONTEXT}: shorter turns with {plan:?}");
            Ok(plan)
        }
        (None, Ok(plan)) => Err(LayoutError::infeasible(
            CONTEXT,
            format!(
                "no sense pair keeps both bends within {MAX_TURN} degrees (best {:.2} and {:.2})",
                plan.bend1.angle, plan.bend2.angle
            ),
        )),
        (None, Err(err)) => Err(err),
    }
}

/// Route a CPW from `from` to the target pose, which is read but never
/// modified. Returns the plan that was drawn.
pub fn cpw_direct_to(
    sink: &mut dyn GeometrySink,
    from: &mut Pose,
    to: &Pose,
    options: &DirectTo,
    overrides: &TraceDefaults,
) -> Result<DirectPlan> {
    const CONTEXT: &str = "cpw_direct_to";
    let params = from.resolve(overrides, CONTEXT)?;
    let radius = params.require(ParamKey::Radius, CONTEXT)?;
    let plan = plan_direct_to(from, to, radius, options)?;
    info!(
        "{CONTEXT}: {:?} -> {:?}, {:.3} long",
        from.position(),
        to.position(),
        plan.total_length(radius)
    );
    cpw_path(sink, from, &plan.segments(), overrides)?;
    Ok(plan)
}
