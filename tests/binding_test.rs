use portal_scene::{
    binder::{ASSET_VERTICAL_OFFSET, AssetBinder, RoleBindingTable},
    data_structures::material::{
        Colour, Material, MaterialRegistry, Role, U_COLOR_END, U_COLOR_START, UniformValue,
    },
    error::BindingError,
    scene::AssetSlot,
};

mod common;

use common::test_utils::{live_scene, portal_asset, portal_asset_without};

#[test]
fn every_expected_node_gets_its_roles_shared_material() {
    let registry = MaterialRegistry::default();
    let binder = AssetBinder::default();
    let mut asset = portal_asset();

    let bindings = binder.bind_materials(&mut asset, &registry).unwrap();
    assert_eq!(bindings.len(), 13);

    for (role, name) in RoleBindingTable::default().entries() {
        let handle = asset.find(name).unwrap();
        let node = asset.node(handle).unwrap();
        let material = node.material.as_ref().unwrap();
        assert!(
            material.ptr_eq(registry.for_role(*role)),
            "{} is not bound to the shared {} material",
            name,
            role
        );
    }
}

#[test]
fn nodes_of_one_role_share_a_single_instance() {
    let registry = MaterialRegistry::default();
    let mut asset = portal_asset();
    AssetBinder::default()
        .bind_materials(&mut asset, &registry)
        .unwrap();

    let papers: Vec<_> = RoleBindingTable::default()
        .names_for(Role::Paper)
        .map(|name| asset.node(asset.find(name).unwrap()).unwrap().material.clone().unwrap())
        .collect();
    assert_eq!(papers.len(), 7);
    assert!(papers.windows(2).all(|pair| pair[0].ptr_eq(&pair[1])));

    // lamps and paper lights are distinct instances with distinct colours
    assert!(!registry.lamp().ptr_eq(registry.paper()));
    assert_ne!(*registry.lamp().borrow(), *registry.paper().borrow());
}

#[test]
fn unlisted_nodes_keep_no_material() {
    let registry = MaterialRegistry::default();
    let mut asset = portal_asset();
    AssetBinder::default()
        .bind_materials(&mut asset, &registry)
        .unwrap();

    let empty = asset.node(asset.find("Empty").unwrap()).unwrap();
    assert!(empty.material.is_none());
    assert_eq!(asset.report_unbound(), 0);
}

#[test]
fn binding_twice_yields_the_same_references() {
    let registry = MaterialRegistry::default();
    let binder = AssetBinder::default();
    let mut asset = portal_asset();

    binder.bind_materials(&mut asset, &registry).unwrap();
    let first: Vec<_> = asset
        .top_level()
        .iter()
        .map(|node| node.material.clone())
        .collect();
    let first_root = asset.root.local;

    binder.bind_materials(&mut asset, &registry).unwrap();
    for (node, before) in asset.top_level().iter().zip(&first) {
        match (&node.material, before) {
            (Some(now), Some(before)) => assert!(now.ptr_eq(before)),
            (None, None) => {}
            _ => panic!("binding changed the material slot of {}", node.name),
        }
    }
    // the placement offset is not applied twice
    assert_eq!(asset.root.local, first_root);
}

#[test]
fn asset_is_lowered_by_the_vertical_offset() {
    let registry = MaterialRegistry::default();
    let mut asset = portal_asset();
    AssetBinder::default()
        .bind_materials(&mut asset, &registry)
        .unwrap();

    assert_eq!(asset.root.local.position.y, ASSET_VERTICAL_OFFSET);
    let portal = asset.node(asset.find("portal_Geo").unwrap()).unwrap();
    assert!((portal.world.position.y - ASSET_VERTICAL_OFFSET).abs() < 1e-6);
}

#[test]
fn portal_node_exposes_default_colours() {
    let registry = MaterialRegistry::default();
    let mut asset = portal_asset();
    AssetBinder::default()
        .bind_materials(&mut asset, &registry)
        .unwrap();

    let portal = asset.node(asset.find("portal_Geo").unwrap()).unwrap();
    let material = portal.material.as_ref().unwrap();
    assert!(matches!(&*material.borrow(), Material::Shader(_)));
    assert_eq!(
        material.uniform(U_COLOR_START),
        Some(UniformValue::Colour(Colour::from_hex(0xffffff)))
    );
    assert_eq!(
        material.uniform(U_COLOR_END),
        Some(UniformValue::Colour(Colour::from_hex(0x7898f5)))
    );
}

#[test]
fn missing_node_is_reported_and_nothing_is_bound() {
    let registry = MaterialRegistry::default();
    let binder = AssetBinder::default();
    let mut asset = portal_asset_without("paperLight003_Geo");

    let err = binder.bind_materials(&mut asset, &registry).unwrap_err();
    assert_eq!(
        err,
        BindingError::MissingNode {
            role: Role::Paper,
            expected_name: "paperLight003_Geo".to_string(),
        }
    );
    assert_eq!(err.expected_name(), "paperLight003_Geo");
    assert!(err.to_string().contains("paperLight003_Geo"));

    assert!(asset.top_level().iter().all(|node| node.material.is_none()));
    assert_eq!(asset.root.local.position.y, 0.0);
}

#[test]
fn first_missing_entry_in_table_order_is_reported() {
    let registry = MaterialRegistry::default();
    let mut asset = portal_asset_without("paperLight006_Geo");
    asset
        .root
        .children
        .retain(|node| node.name != "lampGlass002_Geo");

    let err = AssetBinder::default()
        .bind_materials(&mut asset, &registry)
        .unwrap_err();
    assert_eq!(err.expected_name(), "lampGlass002_Geo");
}

#[test]
fn bind_attaches_only_complete_assets() {
    let registry = MaterialRegistry::default();
    let binder = AssetBinder::default();
    let mut scene = live_scene();
    assert!(!scene.asset().is_bound());

    let err = binder.bind(portal_asset_without("baked_Geo"), &registry, &mut scene);
    assert!(err.is_err());
    assert!(matches!(scene.asset(), AssetSlot::Unbound));
    assert_eq!(scene.generation(), 0);

    binder.bind(portal_asset(), &registry, &mut scene).unwrap();
    assert!(scene.asset().is_bound());
    assert_eq!(scene.generation(), 1);
    let bound = scene.asset().asset().unwrap();
    assert!(bound.find("baked_Geo").is_some());
}

#[test]
fn lookup_only_searches_top_level_nodes() {
    let registry = MaterialRegistry::default();
    let mut asset = portal_asset_without("portal_Geo");
    // a nested node with the right name does not count
    asset.root.children[0].add_child(common::test_utils::mesh_node("portal_Geo"));

    let err = AssetBinder::default()
        .bind_materials(&mut asset, &registry)
        .unwrap_err();
    assert_eq!(err.expected_name(), "portal_Geo");
}
