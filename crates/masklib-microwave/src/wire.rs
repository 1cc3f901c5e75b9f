//! Thin-wire bends.
//!
//! Unlike a CPW, a wire is drawn as the metal that surrounds it: the fill
//! inside the bend and a fillet outside each quarter turn. Only multiples
//! of 90 degrees are supported.

use log::debug;

use masklib_core::error::{ensure_finite, LayoutError};
use masklib_core::geometry::{Placement, Point};
use masklib_core::shapes::{CurveRect, Flip, InsideCurve, ShapeGenerator, VAlign};
use masklib_core::{GeometrySink, ParamKey, Pose, Result, Sense, TraceDefaults, Turn};

use crate::cpw::bend_offset;
use crate::{staged, wrap_degrees};

/// Bend a wire of width `w` around the pose's `radius` by a multiple of 90°.
pub fn wire_bend(
    sink: &mut dyn GeometrySink,
    pose: &mut Pose,
    angle: f64,
    sense: Sense,
    overrides: &TraceDefaults,
) -> Result<()> {
    const CONTEXT: &str = "wire_bend";
    ensure_finite(CONTEXT, &[angle])?;
    if (angle / 90.0 - (angle / 90.0).round()).abs() > 1e-9 {
        return Err(LayoutError::degenerate(
            CONTEXT,
            format!("angle must be a multiple of 90 (got {angle})"),
        ));
    }
    let params = pose.resolve(overrides, CONTEXT)?;
    let w = params.require(ParamKey::W, CONTEXT)?;
    let radius = params.require(ParamKey::Radius, CONTEXT)?;
    if radius <= 0.0 {
        return Err(LayoutError::degenerate(
            CONTEXT,
            format!("radius must be positive (got {radius})"),
        ));
    }
    let quarters = (wrap_degrees(angle) / 90.0).round() as usize % 4;
    let angle = quarters as f64 * 90.0;
    debug!(
        "{CONTEXT}: {angle} deg {sense:?} w = {w} r = {radius} at {:?}",
        pose.position()
    );

    let flip = Flip::new(false, sense == Sense::Cw);
    let pm = -sense.heading_sign();
    let outer = radius + w / 2.0;

    staged(sink, pose, |buf, pose| {
        if quarters > 0 {
            if radius - w / 2.0 > 0.0 {
                CurveRect::new(pose.placement(), radius - w / 2.0, radius)
                    .with_angle(angle)
                    .with_roffset(-w / 2.0)
                    .with_ralign(VAlign::Top)
                    .with_valign(VAlign::Top)
                    .with_flip(flip)
                    .emit_into(buf)?;
            }
            for i in 0..quarters {
                let turned = i as f64 * 90.0;
                let offset = Point::new(outer, pm * outer).rotate_deg(-pm * turned)
                    + Point::new(0.0, -pm * radius);
                let placement = Placement::new(
                    pose.local_to_world(offset),
                    pose.heading() + sense.heading_sign() * turned,
                );
                InsideCurve::new(placement, outer)
                    .with_flip(flip)
                    .emit_into(buf)?;
            }
        }
        pose.advance_vector(
            bend_offset(radius, angle, sense),
            Turn::By(sense.heading_sign() * angle),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use masklib_core::{Recorder, Style};

    fn pose() -> Pose {
        Pose::new(Point::ORIGIN, 0.0, TraceDefaults::cpw(4.0, 0.0, 10.0)).unwrap()
    }

    #[test]
    fn test_quarter_turn_emits_fill_and_one_fillet() {
        let mut sink = Recorder::new(Style::default());
        let mut pose = pose();
        wire_bend(&mut sink, &mut pose, 90.0, Sense::Ccw, &TraceDefaults::default()).unwrap();
        assert_eq!(sink.len(), 2);
        assert!((pose.position().x - 10.0).abs() < 1e-9);
        assert!((pose.position().y - -10.0).abs() < 1e-9);
        assert!((pose.heading() - -90.0).abs() < 1e-12);
    }

    #[test]
    fn test_half_turn_emits_two_fillets() {
        let mut sink = Recorder::new(Style::default());
        let mut pose = pose();
        wire_bend(&mut sink, &mut pose, 180.0, Sense::Cw, &TraceDefaults::default()).unwrap();
        assert_eq!(sink.len(), 3);
        assert!(pose.position().x.abs() < 1e-9);
        assert!((pose.position().y - 20.0).abs() < 1e-9);
        assert!((pose.heading() - 180.0).abs() < 1e-12);
    }

    #[test]
    fn test_wide_wire_skips_inner_fill() {
        let mut sink = Recorder::new(Style::default());
        let mut pose = pose();
        let wide = TraceDefaults::default().with_w(20.0);
        wire_bend(&mut sink, &mut pose, 90.0, Sense::Ccw, &wide).unwrap();
        assert_eq!(sink.len(), 1);
    }

    #[test]
    fn test_off_grid_angle_rejected() {
        let mut sink = Recorder::new(Style::default());
        let mut pose = pose();
        let err = wire_bend(&mut sink, &mut pose, 45.0, Sense::Ccw, &TraceDefaults::default())
            .unwrap_err();
        assert!(matches!(err, LayoutError::Degenerate { .. }));
        assert!(sink.is_empty());
        assert_eq!(pose.position(), Point::ORIGIN);
    }

    #[test]
    fn test_negative_quarter_is_three_quarters() {
        let mut sink = Recorder::new(Style::default());
        let mut pose = pose();
        wire_bend(&mut sink, &mut pose, -90.0, Sense::Ccw, &TraceDefaults::default()).unwrap();
        assert_eq!(sink.len(), 4);
        assert!((pose.heading() - -270.0).abs() < 1e-9);
    }
}
