use portal_scene::{
    data_structures::material::{MaterialRegistry, U_PIXEL_RATIO, UniformValue},
    viewport::Viewport,
};

mod common;

use common::test_utils::rig;

fn pixel_ratio_of(registry: &MaterialRegistry) -> f32 {
    match registry.fireflies().uniform(U_PIXEL_RATIO) {
        Some(UniformValue::Float(ratio)) => ratio,
        other => panic!("uPixelRatio is not a float: {:?}", other),
    }
}

#[test]
fn resize_updates_aspect_and_pixel_ratio() {
    let registry = MaterialRegistry::default();
    let mut rig = rig(800.0, 600.0);

    for (width, height, dpr) in [
        (1024.0, 768.0, 1.0),
        (1920.0, 1080.0, 1.5),
        (390.0, 844.0, 3.0),
        (500.0, 500.0, 2.0),
    ] {
        Viewport::new(width, height, dpr).apply(&mut rig, &registry);
        assert!((rig.projection.aspect() - width / height).abs() < 1e-6);
        assert_eq!(pixel_ratio_of(&registry), dpr.min(2.0));
    }
}

#[test]
fn drawing_buffer_scales_with_the_capped_ratio() {
    assert_eq!(Viewport::new(800.0, 600.0, 1.0).buffer_size(), (800, 600));
    assert_eq!(Viewport::new(800.0, 600.0, 1.5).buffer_size(), (1200, 900));
    assert_eq!(Viewport::new(800.0, 600.0, 3.0).buffer_size(), (1600, 1200));
}

#[test]
fn physical_sizes_are_converted_to_logical() {
    let viewport = Viewport::from_physical(2560, 1440, 2.0);
    assert_eq!(viewport.width, 1280.0);
    assert_eq!(viewport.height, 720.0);
    assert_eq!(viewport.pixel_ratio(), 2.0);
    assert_eq!(viewport.buffer_size(), (2560, 1440));

    let high_density = Viewport::from_physical(3000, 1500, 3.0);
    assert_eq!(high_density.buffer_size(), (2000, 1000));
}

#[test]
fn custom_cap_is_honoured() {
    let registry = MaterialRegistry::default();
    let mut rig = rig(800.0, 600.0);
    Viewport::new(800.0, 600.0, 3.0)
        .with_cap(1.0)
        .apply(&mut rig, &registry);
    assert_eq!(pixel_ratio_of(&registry), 1.0);
}

#[test]
fn minimised_window_is_empty() {
    assert!(Viewport::from_physical(0, 600, 1.0).is_empty());
    assert!(!Viewport::from_physical(1, 1, 1.0).is_empty());
}

#[test]
fn zero_cap_still_gives_a_drawable_buffer() {
    let registry = MaterialRegistry::default();
    let mut rig = rig(800.0, 600.0);
    let viewport = Viewport::from_physical(1600, 1200, 2.0).with_cap(0.0);
    assert!(!viewport.is_empty());
    assert_eq!(viewport.pixel_ratio(), 2.0);
    assert_eq!(viewport.buffer_size(), (1600, 1200));

    viewport.apply(&mut rig, &registry);
    assert_eq!(pixel_ratio_of(&registry), 2.0);
}
