use crate::error::RenderError;
use crate::geometry::SizeInfo;
use crate::shader::ShaderTier;
use crate::source::BackgroundImage;
use crate::types::{BlendMode, Sampling};

use super::context::SurfaceColorSpace;
use super::pipeline::BackgroundPipeline;
use super::texture::BackgroundTexture;
use super::uniforms::BackgroundUniforms;

/// GPU side of the background pass.
///
/// Holds the pipeline, the bound texture and the bind group tying them to the
/// uniform buffer. The pass only ever draws on top of what is already in the
/// target; clearing is the caller's business.
pub(crate) struct GpuBackground {
    pipeline: BackgroundPipeline,
    texture: BackgroundTexture,
    bind_group: wgpu::BindGroup,
    sampling: Sampling,
    color_space: SurfaceColorSpace,
    uniforms: BackgroundUniforms,
}

impl GpuBackground {
    pub(crate) fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        surface_format: wgpu::TextureFormat,
        tier: ShaderTier,
        blend: BlendMode,
        sampling: Sampling,
        color_space: SurfaceColorSpace,
    ) -> Result<Self, RenderError> {
        let pipeline = BackgroundPipeline::new(device, surface_format, tier, blend)?;
        let texture = BackgroundTexture::placeholder(device, queue, sampling, color_space);
        let bind_group = pipeline.bind(device, &texture);

        Ok(Self {
            pipeline,
            texture,
            bind_group,
            sampling,
            color_space,
            uniforms: BackgroundUniforms::default(),
        })
    }

    /// Uploads `image` and rebinds it. `None`, or an image larger than the
    /// device allows, binds the transparent placeholder instead.
    pub(crate) fn set_image(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        image: Option<&BackgroundImage>,
    ) {
        let max_dimension = device.limits().max_texture_dimension_2d;
        self.texture = match image {
            Some(image) if image.width() > max_dimension || image.height() > max_dimension => {
                tracing::warn!(
                    width = image.width(),
                    height = image.height(),
                    max_dimension,
                    "background image exceeds GPU texture limits; skipping upload"
                );
                BackgroundTexture::placeholder(device, queue, self.sampling, self.color_space)
            }
            Some(image) => {
                BackgroundTexture::upload(device, queue, image, self.sampling, self.color_space)
            }
            None => BackgroundTexture::placeholder(device, queue, self.sampling, self.color_space),
        };
        self.bind_group = self.pipeline.bind(device, &self.texture);
        tracing::debug!(
            width = self.texture.dimensions.0,
            height = self.texture.dimensions.1,
            "bound background texture"
        );
    }

    /// Writes the `sizeInfo` uniform for the next [`encode`](Self::encode).
    pub(crate) fn prepare(&mut self, queue: &wgpu::Queue, size_info: SizeInfo) {
        let uniforms = BackgroundUniforms::new(size_info);
        if uniforms == self.uniforms {
            return;
        }
        self.uniforms = uniforms;
        queue.write_buffer(
            &self.pipeline.uniform_buffer,
            0,
            bytemuck::bytes_of(&self.uniforms),
        );
    }

    pub(crate) fn tier(&self) -> ShaderTier {
        self.pipeline.tier
    }

    /// Records the background draw into `encoder`, loading the existing
    /// contents of `view`.
    pub(crate) fn encode(&self, encoder: &mut wgpu::CommandEncoder, view: &wgpu::TextureView) {
        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("background pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                depth_slice: None,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            occlusion_query_set: None,
            timestamp_writes: None,
        });
        render_pass.set_pipeline(&self.pipeline.pipeline);
        render_pass.set_bind_group(0, &self.bind_group, &[]);
        render_pass.set_vertex_buffer(0, self.pipeline.vertex_buffer.slice(..));
        render_pass.draw(0..4, 0..1);
    }
}
