use portal_scene::resources::scene::{SceneBytes, parse_scene};

/// Four positions followed by six u16 indices, 60 bytes.
fn quad_buffer() -> Vec<u8> {
    let positions: [[f32; 3]; 4] = [
        [-0.5, 0.0, -0.5],
        [0.5, 0.0, -0.5],
        [0.5, 0.0, 0.5],
        [-0.5, 0.0, 0.5],
    ];
    let indices: [u16; 6] = [0, 1, 2, 0, 2, 3];
    let mut bytes = Vec::new();
    for position in positions {
        for component in position {
            bytes.extend_from_slice(&component.to_le_bytes());
        }
    }
    for index in indices {
        bytes.extend_from_slice(&index.to_le_bytes());
    }
    bytes
}

fn document(extra: &str) -> String {
    format!(
        r#"{{
            "asset": {{ "version": "2.0" }},
            {extra}
            "scene": 0,
            "scenes": [{{ "nodes": [0, 1] }}],
            "nodes": [
                {{ "name": "portal_Geo", "mesh": 0, "translation": [0.0, 1.0, 0.0] }},
                {{ "name": "Parent", "children": [2] }},
                {{ "name": "Child", "mesh": 0 }}
            ],
            "meshes": [{{
                "name": "Quad",
                "primitives": [{{ "attributes": {{ "POSITION": 0 }}, "indices": 1 }}]
            }}],
            "accessors": [
                {{
                    "bufferView": 0,
                    "componentType": 5126,
                    "count": 4,
                    "type": "VEC3",
                    "min": [-0.5, 0.0, -0.5],
                    "max": [0.5, 0.0, 0.5]
                }},
                {{ "bufferView": 1, "componentType": 5123, "count": 6, "type": "SCALAR" }}
            ],
            "bufferViews": [
                {{ "buffer": 0, "byteOffset": 0, "byteLength": 48 }},
                {{ "buffer": 0, "byteOffset": 48, "byteLength": 12 }}
            ],
            "buffers": [{{ "uri": "quad.bin", "byteLength": 60 }}]
        }}"#
    )
}

fn scene_bytes(extra: &str) -> SceneBytes {
    SceneBytes {
        file_name: "quad.gltf".to_string(),
        document: document(extra).into_bytes(),
        buffers: vec![quad_buffer()],
    }
}

#[test]
fn top_level_nodes_are_the_scene_roots() {
    let asset = parse_scene(&scene_bytes("")).unwrap();
    let names: Vec<_> = asset
        .top_level()
        .iter()
        .map(|node| node.name.as_str())
        .collect();
    assert_eq!(names, ["portal_Geo", "Parent"]);
    assert!(asset.find("Child").is_none());
}

#[test]
fn meshes_are_decoded_with_u32_indices() {
    let asset = parse_scene(&scene_bytes("")).unwrap();
    let portal = asset.node(asset.find("portal_Geo").unwrap()).unwrap();
    assert_eq!(portal.meshes.len(), 1);

    let mesh = &portal.meshes[0];
    assert_eq!(mesh.name, "Quad");
    assert_eq!(mesh.vertices.len(), 4);
    assert_eq!(mesh.vertices[2].position, [0.5, 0.0, 0.5]);
    // no TEXCOORD_0 in the file
    assert!(mesh.vertices.iter().all(|v| v.tex_coords == [0.0, 0.0]));
    assert_eq!(mesh.indices, vec![0, 1, 2, 0, 2, 3]);
}

#[test]
fn transforms_and_children_are_kept() {
    let asset = parse_scene(&scene_bytes("")).unwrap();
    let portal = asset.node(asset.find("portal_Geo").unwrap()).unwrap();
    assert_eq!(portal.local.position.y, 1.0);
    assert_eq!(portal.world.position.y, 1.0);

    let parent = asset.node(asset.find("Parent").unwrap()).unwrap();
    assert!(parent.meshes.is_empty());
    assert_eq!(parent.children.len(), 1);
    assert_eq!(parent.children[0].name, "Child");
    assert_eq!(parent.children[0].meshes.len(), 1);
    assert_eq!(asset.drawables().len(), 2);
}

#[test]
fn missing_buffer_is_an_error() {
    let mut bytes = scene_bytes("");
    bytes.buffers.clear();
    assert!(parse_scene(&bytes).is_err());
}

#[test]
fn draco_compressed_assets_are_rejected() {
    let bytes = scene_bytes(
        r#""extensionsUsed": ["KHR_draco_mesh_compression"],
            "extensionsRequired": ["KHR_draco_mesh_compression"],"#,
    );
    let message = format!("{:#}", parse_scene(&bytes).unwrap_err());
    assert!(message.contains("Draco"), "{}", message);
    assert!(message.contains("re-export"), "{}", message);
}

#[test]
fn garbage_is_an_error() {
    let bytes = SceneBytes {
        file_name: "broken.glb".to_string(),
        document: b"not a gltf file".to_vec(),
        buffers: Vec::new(),
    };
    let err = parse_scene(&bytes).unwrap_err();
    assert!(format!("{:#}", err).contains("broken.glb"));
}
