use masklib_core::geometry::{Placement, Point};
use masklib_core::shapes::{CurveRect, Flip, Rectangle, RoundRect, VAlign};
use masklib_core::{
    Chip, Color, Drawing, DrawingSettings, Entity, Frame, Pose, ShapeGenerator, TraceDefaults,
    Turn,
};

#[test]
fn test_drawing_collects_shapes_per_layer() {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut drawing = Drawing::new("mask", DrawingSettings::default());
    drawing.add_layer("METAL", Color::rgb(200, 160, 0));
    let id = drawing.new_chip("resonator", 7000.0, 2000.0, "METAL");

    let chip = drawing.chip_mut(&id).unwrap();
    let corner = Placement::new(chip.centered(Point::new(-100.0, 0.0)), 0.0);
    Rectangle::new(corner, 200.0, 50.0)
        .with_valign(VAlign::Middle)
        .emit_into(chip)
        .unwrap();
    RoundRect::new(corner, 80.0, 80.0, 10.0)
        .emit_into(chip)
        .unwrap();

    let chip = drawing.chip(&id).unwrap();
    let layer = chip.layer();
    assert_eq!(drawing.layer_stack.get_layer(layer).unwrap().name, "METAL");
    // Solid fill is on by default, so each shape brings its fills along.
    assert!(chip.entity_count() > 2);
    assert_eq!(chip.entities_on_layer(layer).len(), chip.entity_count());
    let bbox = chip.local_bbox().unwrap();
    assert!((bbox.min.x - 3400.0).abs() < 1e-9);
    assert!((bbox.max.x - 3600.0).abs() < 1e-9);
}

#[test]
fn test_pose_chain_and_branch() {
    let mut pose = Pose::new(Point::ORIGIN, 0.0, TraceDefaults::standard_cpw()).unwrap();
    pose.advance_distance(100.0, Turn::By(90.0)).unwrap();
    pose.advance_distance(50.0, Turn::NONE).unwrap();
    assert!(pose.position().distance_to(&Point::new(100.0, 50.0)) < 1e-9);
    assert!(pose.last_position().distance_to(&Point::new(100.0, 0.0)) < 1e-9);

    let side = pose
        .branch(Frame::Previous, Point::new(0.0, 20.0), -90.0, None)
        .unwrap();
    assert!(side.position().distance_to(&Point::new(80.0, 0.0)) < 1e-9);
    assert!((side.heading() - 0.0).abs() < 1e-12);
    assert_eq!(side.defaults(), pose.defaults());
}

#[test]
fn test_flipped_curve_on_rotated_placement() {
    let placement = Placement::new(Point::new(10.0, 10.0), 90.0);
    let shape = CurveRect::new(placement, 5.0, 20.0)
        .with_flip(Flip::vertical())
        .build()
        .unwrap();
    // Unflipped the sweep centre sits at local (0, -20); flipped at (0, 20),
    // which the 90 degree rotation carries to world (-10, 10).
    let center = Point::new(-10.0, 10.0);
    for p in &shape.outline.points {
        let r = p.distance_to(&center);
        assert!(r > 20.0 - 1e-9 && r < 25.0 + 1e-9);
    }
}

#[test]
fn test_chip_survives_json() {
    let mut chip = Chip::new("json", 500.0, 500.0)
        .with_defaults(TraceDefaults::standard_cpw())
        .unwrap();
    chip.new_structure(Point::new(1.0, 2.0), 45.0).unwrap();
    Rectangle::new(Placement::default(), 3.0, 4.0)
        .emit_into(&mut chip)
        .unwrap();

    let back = Chip::from_json(&chip.to_json().unwrap()).unwrap();
    assert_eq!(back, chip);
    assert!(matches!(back.entities()[0], Entity::Outline { .. }));
}
