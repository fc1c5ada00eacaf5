use portal_scene::{
    Tweak,
    data_structures::material::{
        Colour, MaterialRegistry, U_COLOR_END, U_COLOR_START, U_SIZE, UniformValue,
    },
    tweaks::{TweakTargets, to_clear_colour},
};

fn targets() -> TweakTargets {
    TweakTargets {
        clear_colour: Colour::from_hex(0x201919),
    }
}

#[test]
fn portal_colours_are_overwritten() {
    let registry = MaterialRegistry::default();
    let mut targets = targets();

    Tweak::PortalColourStart(Colour::from_hex(0xff0000)).apply(&registry, &mut targets);
    Tweak::PortalColourEnd(Colour::from_hex(0x00ff00)).apply(&registry, &mut targets);

    assert_eq!(
        registry.portal().uniform(U_COLOR_START),
        Some(UniformValue::Colour(Colour::from_hex(0xff0000)))
    );
    assert_eq!(
        registry.portal().uniform(U_COLOR_END),
        Some(UniformValue::Colour(Colour::from_hex(0x00ff00)))
    );
}

#[test]
fn last_write_wins() {
    let registry = MaterialRegistry::default();
    let mut targets = targets();

    for size in [10.0, 250.0, 42.0] {
        Tweak::FireflySize(size).apply(&registry, &mut targets);
    }
    assert_eq!(registry.fireflies().uniform(U_SIZE), Some(UniformValue::Float(42.0)));
}

#[test]
fn firefly_size_is_never_negative() {
    let registry = MaterialRegistry::default();
    let mut targets = targets();
    Tweak::FireflySize(-5.0).apply(&registry, &mut targets);
    assert_eq!(registry.fireflies().uniform(U_SIZE), Some(UniformValue::Float(0.0)));
}

#[test]
fn clear_colour_changes_the_target_only() {
    let registry = MaterialRegistry::default();
    let before = registry.portal().borrow().clone();
    let mut targets = targets();

    Tweak::ClearColour(Colour::WHITE).apply(&registry, &mut targets);
    assert_eq!(targets.clear_colour, Colour::WHITE);
    assert_eq!(*registry.portal().borrow(), before);

    let clear = to_clear_colour(targets.clear_colour);
    assert!((clear.r - 1.0).abs() < 1e-5 && (clear.b - 1.0).abs() < 1e-5);
    assert_eq!(clear.a, 1.0);
}

#[test]
fn tweaks_reach_nodes_bound_to_the_material() {
    let registry = MaterialRegistry::default();
    let node_material = registry.portal().clone();
    let mut targets = targets();

    Tweak::PortalColourEnd(Colour::from_hex(0x123456)).apply(&registry, &mut targets);
    assert_eq!(
        node_material.uniform(U_COLOR_END),
        Some(UniformValue::Colour(Colour::from_hex(0x123456)))
    );
}
