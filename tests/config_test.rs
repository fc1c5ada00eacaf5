use portal_scene::{
    config::SceneConfig,
    data_structures::material::{
        Colour, MaterialRegistry, U_COLOR_END, U_COLOR_START, U_PIXEL_RATIO, U_SIZE, UniformValue,
    },
    viewport::Viewport,
};

#[test]
fn defaults_describe_the_portal_scene() {
    let config = SceneConfig::default();
    assert_eq!(config.scene_file, "scene.glb");
    assert_eq!(config.baked_texture, "baked.png");
    assert_eq!(config.alpha_texture, "alpha.png");
    assert_eq!(config.clear_colour, Colour::from_hex(0x201919));
    assert_eq!(config.portal_colour_start, Colour::from_hex(0xffffff));
    assert_eq!(config.portal_colour_end, Colour::from_hex(0x7898f5));
    assert_eq!(config.firefly_size, 100.0);
    assert_eq!(config.fireflies.count, 60);
    assert_eq!(config.pixel_ratio_cap, 2.0);
    assert_eq!(config.camera.position, [9.0, 5.0, 9.0]);
    assert_eq!(config.camera.fov_degrees, 45.0);
}

#[test]
fn partial_json_overrides_only_given_fields() {
    let config = SceneConfig::from_json(
        r##"{
            "portal_colour_end": "#ff00ff",
            "firefly_size": 40.0,
            "fireflies": { "count": 10 },
            "camera": { "fov_degrees": 60.0 }
        }"##,
    )
    .unwrap();

    assert_eq!(config.portal_colour_end, Colour::from_hex(0xff00ff));
    assert_eq!(config.firefly_size, 40.0);
    assert_eq!(config.fireflies.count, 10);
    assert_eq!(config.fireflies.max_height, 5.5);
    assert_eq!(config.camera.fov_degrees, 60.0);
    assert_eq!(config.camera.near, 0.1);
    assert_eq!(config.scene_file, "scene.glb");
}

#[test]
fn malformed_json_is_an_error() {
    assert!(SceneConfig::from_json("{ not json").is_err());
    assert!(SceneConfig::from_json(r#"{ "firefly_size": "big" }"#).is_err());
}

#[test]
fn registry_is_built_from_the_config() {
    let mut config = SceneConfig::default();
    config.portal_colour_start = Colour::from_hex(0x010203);
    config.firefly_size = 64.0;
    let registry = MaterialRegistry::new(&config.material_settings(3.0));

    assert_eq!(
        registry.portal().uniform(U_COLOR_START),
        Some(UniformValue::Colour(Colour::from_hex(0x010203)))
    );
    assert_eq!(
        registry.portal().uniform(U_COLOR_END),
        Some(UniformValue::Colour(Colour::from_hex(0x7898f5)))
    );
    assert_eq!(registry.fireflies().uniform(U_SIZE), Some(UniformValue::Float(64.0)));
    assert_eq!(
        registry.fireflies().uniform(U_PIXEL_RATIO),
        Some(UniformValue::Float(2.0))
    );
}

#[test]
fn camera_rig_starts_at_the_configured_position() {
    let rig = SceneConfig::default().camera.rig(1600.0, 900.0);
    assert_eq!(rig.camera.position, cgmath::Point3::new(9.0, 5.0, 9.0));
    assert!((rig.projection.aspect() - 16.0 / 9.0).abs() < 1e-6);
}

#[test]
fn overflowing_firefly_extent_falls_back_to_the_default() {
    let config = SceneConfig::from_json(r#"{ "fireflies": { "extent_xy": 1e39 } }"#).unwrap();
    assert_eq!(config.fireflies.extent_xy, 10.0);

    let field = config.fireflies.generate();
    assert_eq!(field.len(), 60);
    assert!(
        field
            .positions()
            .iter()
            .all(|[x, _, z]| (-5.0..5.0).contains(x) && (-5.0..5.0).contains(z))
    );
}

#[test]
fn unusable_pixel_ratio_cap_falls_back_to_the_default() {
    for json in [
        r#"{ "pixel_ratio_cap": 0 }"#,
        r#"{ "pixel_ratio_cap": -1.5 }"#,
        r#"{ "pixel_ratio_cap": 1e39 }"#,
    ] {
        let config = SceneConfig::from_json(json).unwrap();
        assert_eq!(config.pixel_ratio_cap, 2.0, "{}", json);

        let viewport = Viewport::from_physical(1600, 1200, 2.0).with_cap(config.pixel_ratio_cap);
        assert!(!viewport.is_empty());
        assert_eq!(viewport.buffer_size(), (1600, 1200));
    }

    let config = SceneConfig::from_json(r#"{ "pixel_ratio_cap": 1.0 }"#).unwrap();
    assert_eq!(config.pixel_ratio_cap, 1.0);
}
