use crate::{
    data_structures::texture::{Texture, TextureOptions},
    resources::load_binary,
};

pub async fn load_texture(
    file_name: &str,
    options: TextureOptions,
    device: &wgpu::Device,
    queue: &wgpu::Queue,
) -> anyhow::Result<Texture> {
    let data = load_binary(file_name).await?;
    let format = file_name.rsplit_once('.').map(|(_, ext)| ext);
    Texture::from_bytes(device, queue, &data, file_name, format, options)
        .map_err(|e| e.context(format!("Couldn't load texture {}", file_name)))
}
