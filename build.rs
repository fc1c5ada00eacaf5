use anyhow::*;
use fs_extra::copy_items;
use fs_extra::dir::CopyOptions;
use std::env;
use std::path::PathBuf;

/// Files the scene expects next to the binary. Missing ones are reported, not fatal:
/// the configuration has defaults and the renderer logs a failed asset load.
const SCENE_ASSETS: [&str; 4] = ["scene.glb", "baked.png", "alpha.png", "scene.json"];

fn main() -> Result<()> {
    println!("cargo:rerun-if-changed=assets");

    let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR")?);
    let assets_src = manifest_dir.join("assets");
    if !assets_src.exists() {
        println!("cargo:warning=no assets/ directory, the scene will fail to load at runtime");
        return Ok(());
    }
    for file in SCENE_ASSETS {
        if !assets_src.join(file).exists() {
            println!("cargo:warning=assets/{} is missing", file);
        }
    }

    let out_dir = env::var("OUT_DIR")?;
    let mut copy_options = CopyOptions::new();
    copy_options.overwrite = true;
    copy_items(&[assets_src], out_dir, &copy_options)?;

    Ok(())
}
