use wgpu::util::{DeviceExt, TextureDataOrder};

use crate::source::BackgroundImage;
use crate::types::{FilterMode, Sampling, WrapMode};

use super::context::SurfaceColorSpace;

/// The bound background texture plus the sampler that reads it.
pub(crate) struct BackgroundTexture {
    pub _texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
    pub dimensions: (u32, u32),
}

impl BackgroundTexture {
    pub(crate) fn upload(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        image: &BackgroundImage,
        sampling: Sampling,
        color_space: SurfaceColorSpace,
    ) -> Self {
        if image.width() == 0 || image.height() == 0 {
            return Self::placeholder(device, queue, sampling, color_space);
        }
        Self::create(
            device,
            queue,
            "background texture",
            image.dimensions(),
            image.as_bytes(),
            sampling,
            color_space,
        )
    }

    /// A single transparent texel bound while no image is available.
    pub(crate) fn placeholder(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        sampling: Sampling,
        color_space: SurfaceColorSpace,
    ) -> Self {
        Self::create(
            device,
            queue,
            "placeholder background texture",
            (1, 1),
            &[0u8, 0, 0, 0],
            sampling,
            color_space,
        )
    }

    fn create(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        label: &str,
        (width, height): (u32, u32),
        rgba: &[u8],
        sampling: Sampling,
        color_space: SurfaceColorSpace,
    ) -> Self {
        let texture = device.create_texture_with_data(
            queue,
            &wgpu::TextureDescriptor {
                label: Some(label),
                size: wgpu::Extent3d {
                    width,
                    height,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: texture_format(color_space),
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            },
            TextureDataOrder::LayerMajor,
            rgba,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = create_sampler(device, sampling);

        Self {
            _texture: texture,
            view,
            sampler,
            dimensions: (width, height),
        }
    }
}

pub(crate) fn texture_format(color_space: SurfaceColorSpace) -> wgpu::TextureFormat {
    match color_space {
        SurfaceColorSpace::Gamma => wgpu::TextureFormat::Rgba8Unorm,
        SurfaceColorSpace::Linear => wgpu::TextureFormat::Rgba8UnormSrgb,
    }
}

fn create_sampler(device: &wgpu::Device, sampling: Sampling) -> wgpu::Sampler {
    let address_mode = address_mode(sampling.wrap);
    let filter = filter_mode(sampling.filter);
    device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some("background sampler"),
        address_mode_u: address_mode,
        address_mode_v: address_mode,
        address_mode_w: address_mode,
        mag_filter: filter,
        min_filter: filter,
        mipmap_filter: wgpu::FilterMode::Nearest,
        ..Default::default()
    })
}

fn address_mode(wrap: WrapMode) -> wgpu::AddressMode {
    match wrap {
        WrapMode::Repeat => wgpu::AddressMode::Repeat,
        WrapMode::Clamp => wgpu::AddressMode::ClampToEdge,
        WrapMode::Mirror => wgpu::AddressMode::MirrorRepeat,
    }
}

fn filter_mode(filter: FilterMode) -> wgpu::FilterMode {
    match filter {
        FilterMode::Nearest => wgpu::FilterMode::Nearest,
        FilterMode::Linear => wgpu::FilterMode::Linear,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrap_modes_map_to_wgpu_addressing() {
        assert_eq!(address_mode(WrapMode::Repeat), wgpu::AddressMode::Repeat);
        assert_eq!(address_mode(WrapMode::Clamp), wgpu::AddressMode::ClampToEdge);
        assert_eq!(address_mode(WrapMode::Mirror), wgpu::AddressMode::MirrorRepeat);
    }

    #[test]
    fn colour_space_selects_matching_texture_format() {
        assert_eq!(
            texture_format(SurfaceColorSpace::Gamma),
            wgpu::TextureFormat::Rgba8Unorm
        );
        assert_eq!(
            texture_format(SurfaceColorSpace::Linear),
            wgpu::TextureFormat::Rgba8UnormSrgb
        );
        assert_eq!(filter_mode(FilterMode::Linear), wgpu::FilterMode::Linear);
    }
}
