//! # MaskLib Microwave
//!
//! Routing for coplanar waveguides (CPW) and thin wires on top of
//! `masklib-core`: straight runs, tapers, bends, stubs and launchers, fitted
//! meanders, and a curve-straight-curve connector between two poses.
//!
//! Every routing call reads its pose, emits geometry into a
//! [`GeometrySink`], and advances the pose so the next call continues
//! exactly where this one ended. Parameters not passed explicitly come from
//! the pose's [`TraceDefaults`]. A call that fails emits nothing and leaves
//! its pose as it was.

pub mod cpw;
pub mod direct;
pub mod wiggles;
pub mod wire;

pub use cpw::{
    cpw_bend, cpw_launcher, cpw_path, cpw_straight, cpw_stub_open, cpw_stub_round,
    cpw_stub_short, cpw_taper, Bend, Launcher, Segment, StubRound, StubShort, Taper,
};
pub use direct::{cpw_direct_to, plan_direct_to, DirectPlan, DirectTo};
pub use wiggles::{
    cpw_wiggles, inductor_wiggles, plan_inductor, plan_wiggles, wiggle_height, wiggle_length,
    InductorWiggles, WigglePlan, Wiggles,
};
pub use wire::wire_bend;

use masklib_core::geometry::{Placement, Point};
use masklib_core::{GeometrySink, Pose, Recorder, Result};

/// Run `f` against a scratch copy of `pose` that draws into a buffer, then
/// commit both the geometry and the pose only if it succeeded.
pub(crate) fn staged<T, F>(sink: &mut dyn GeometrySink, pose: &mut Pose, f: F) -> Result<T>
where
    F: FnOnce(&mut Recorder, &mut Pose) -> Result<T>,
{
    let mut buffer = Recorder::new(sink.style());
    let mut scratch = pose.clone();
    let out = f(&mut buffer, &mut scratch)?;
    buffer.replay_into(sink);
    *pose = scratch;
    Ok(out)
}

/// Placement at a local offset from the pose, aligned with its heading.
pub(crate) fn at(pose: &Pose, offset: Point) -> Placement {
    Placement::new(pose.local_to_world(offset), pose.heading())
}

/// Reduce to `[0, 360)`, snapping values a rounding error short of a full
/// turn back to zero.
pub(crate) fn wrap_degrees(angle: f64) -> f64 {
    let wrapped = angle.rem_euclid(360.0);
    if 360.0 - wrapped < 1e-9 {
        0.0
    } else {
        wrapped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_degrees() {
        assert_eq!(wrap_degrees(-90.0), 270.0);
        assert_eq!(wrap_degrees(720.0), 0.0);
        assert_eq!(wrap_degrees(360.0 - 1e-12), 0.0);
        assert!((wrap_degrees(45.5) - 45.5).abs() < 1e-12);
    }
}
