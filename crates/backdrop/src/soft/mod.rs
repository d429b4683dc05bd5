//! CPU reference backend for the background pass.
//!
//! Runs the same vertex and fragment stage bodies as the GLSL programs over a
//! plain float framebuffer. It is deterministic, needs no adapter, and is what
//! the pixel-level behaviour of the pass is verified against:
//!
//! ```text
//!   vertex bytes ──▶ SoftProgram (tier-specific attribute lookup)
//!                         │
//!                         ▼
//!                   vertex_stage ──▶ strip triangles ──▶ rasterize
//!                                                           │
//!                   SoftTexture::sample ◀── tex coords ◀────┘
//!                         │
//!                         ▼
//!                   fragment_stage ──▶ blend ──▶ Framebuffer
//! ```

mod raster;
mod stage;
mod texture;

pub use stage::{fragment_stage, vertex_stage, ClipVertex};
pub use texture::SoftTexture;

use crate::error::RenderError;
use crate::geometry::{
    SizeInfo, VertexLayout, POSITION_ATTRIBUTE, POSITION_LOCATION, QUAD_VERTICES,
    TEX_COORD_ATTRIBUTE, TEX_COORD_LOCATION,
};
use crate::shader::ShaderTier;
use crate::types::BlendMode;

use raster::{rasterize, strip_triangles, to_screen};

const VEC2_SIZE: u64 = std::mem::size_of::<[f32; 2]>() as u64;

/// Where the fragment stage writes its colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FragmentOutput {
    /// Legacy `gl_FragColor`: always the first colour target.
    Implicit,
    /// A declared `out vec4` bound to an explicit location.
    Declared { location: u32 },
}

impl FragmentOutput {
    /// Index of the colour target this output writes; the framebuffer only
    /// has one.
    fn color_target(self) -> Result<usize, RenderError> {
        match self {
            FragmentOutput::Implicit => Ok(0),
            FragmentOutput::Declared { location: 0 } => Ok(0),
            FragmentOutput::Declared { location } => Err(RenderError::MissingColorTarget(location)),
        }
    }
}

/// A linked program: attribute byte offsets resolved with the tier's binding
/// convention.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoftProgram {
    tier: ShaderTier,
    stride: usize,
    position_offset: usize,
    tex_coord_offset: usize,
    output: FragmentOutput,
}

impl SoftProgram {
    /// Resolves the program's inputs against `layout`.
    ///
    /// Legacy programs look attributes up by their GLSL names, modern ones by
    /// `layout(location = N)`.
    pub fn link(tier: ShaderTier, layout: &VertexLayout) -> Result<Self, RenderError> {
        let (position, tex_coord, output) = match tier {
            ShaderTier::Legacy => (
                layout.by_name(POSITION_ATTRIBUTE).ok_or_else(|| {
                    RenderError::MissingAttribute {
                        tier,
                        binding: format!("name `{POSITION_ATTRIBUTE}`"),
                    }
                })?,
                layout.by_name(TEX_COORD_ATTRIBUTE).ok_or_else(|| {
                    RenderError::MissingAttribute {
                        tier,
                        binding: format!("name `{TEX_COORD_ATTRIBUTE}`"),
                    }
                })?,
                FragmentOutput::Implicit,
            ),
            ShaderTier::Modern => (
                layout.by_location(POSITION_LOCATION).ok_or_else(|| {
                    RenderError::MissingAttribute {
                        tier,
                        binding: format!("location {POSITION_LOCATION}"),
                    }
                })?,
                layout.by_location(TEX_COORD_LOCATION).ok_or_else(|| {
                    RenderError::MissingAttribute {
                        tier,
                        binding: format!("location {TEX_COORD_LOCATION}"),
                    }
                })?,
                FragmentOutput::Declared { location: 0 },
            ),
        };

        for attribute in [position, tex_coord] {
            let end = attribute.offset.checked_add(VEC2_SIZE);
            if !matches!(end, Some(end) if end <= layout.stride) {
                return Err(RenderError::AttributeOutOfBounds {
                    name: attribute.name,
                    offset: attribute.offset,
                    stride: layout.stride,
                });
            }
        }

        Ok(Self {
            tier,
            stride: layout.stride as usize,
            position_offset: position.offset as usize,
            tex_coord_offset: tex_coord.offset as usize,
            output,
        })
    }

    pub fn tier(&self) -> ShaderTier {
        self.tier
    }

    pub fn output(&self) -> FragmentOutput {
        self.output
    }

    /// `link` guarantees `offset + VEC2_SIZE <= stride`.
    fn read_vec2(&self, vertex: &[u8], offset: usize) -> [f32; 2] {
        bytemuck::pod_read_unaligned(&vertex[offset..offset + VEC2_SIZE as usize])
    }
}

/// RGBA float colour target, row 0 at the top.
#[derive(Debug, Clone, PartialEq)]
pub struct Framebuffer {
    width: u32,
    height: u32,
    pixels: Vec<[f32; 4]>,
}

impl Framebuffer {
    pub fn new(width: u32, height: u32, clear: [f32; 4]) -> Self {
        Self {
            width,
            height,
            pixels: vec![clear; (width as usize) * (height as usize)],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixel(&self, x: u32, y: u32) -> [f32; 4] {
        self.pixels[self.index(x, y)]
    }

    pub fn pixels(&self) -> &[[f32; 4]] {
        &self.pixels
    }

    fn index(&self, x: u32, y: u32) -> usize {
        (y as usize) * (self.width as usize) + x as usize
    }

    fn blend(&mut self, x: u32, y: u32, src: [f32; 4], mode: BlendMode) {
        let index = self.index(x, y);
        let dst = self.pixels[index];
        self.pixels[index] = match mode {
            BlendMode::Replace => src,
            BlendMode::Alpha => {
                let a = src[3];
                [
                    (src[0] * a + dst[0] * (1.0 - a)).clamp(0.0, 1.0),
                    (src[1] * a + dst[1] * (1.0 - a)).clamp(0.0, 1.0),
                    (src[2] * a + dst[2] * (1.0 - a)).clamp(0.0, 1.0),
                    (a * a + dst[3]).clamp(0.0, 1.0),
                ]
            }
        };
    }
}

/// The background pass executed on the CPU.
#[derive(Debug, Clone)]
pub struct SoftPipeline {
    program: SoftProgram,
    blend: BlendMode,
}

impl SoftPipeline {
    pub fn new(program: SoftProgram, blend: BlendMode) -> Self {
        Self { program, blend }
    }

    /// Links `tier` against the static quad layout.
    pub fn for_quad(tier: ShaderTier, blend: BlendMode) -> Result<Self, RenderError> {
        Ok(Self::new(SoftProgram::link(tier, &VertexLayout::quad())?, blend))
    }

    pub fn program(&self) -> &SoftProgram {
        &self.program
    }

    /// Draws the static quad.
    pub fn draw_quad(
        &self,
        target: &mut Framebuffer,
        texture: &SoftTexture,
        size_info: SizeInfo,
    ) -> Result<usize, RenderError> {
        self.draw(target, texture, bytemuck::cast_slice(&QUAD_VERTICES), size_info)
    }

    /// Draws `vertices` as a triangle strip and returns how many pixels were
    /// shaded. Each pixel is shaded at most once per draw; pixels outside the
    /// primitive keep their previous contents.
    pub fn draw(
        &self,
        target: &mut Framebuffer,
        texture: &SoftTexture,
        vertices: &[u8],
        size_info: SizeInfo,
    ) -> Result<usize, RenderError> {
        let stride = self.program.stride;
        if stride == 0 || vertices.len() % stride != 0 {
            return Err(RenderError::MisalignedVertexBuffer {
                len: vertices.len(),
                stride: stride as u64,
            });
        }
        self.program.output.color_target()?;

        let (width, height) = (target.width, target.height);
        let screen: Vec<_> = vertices
            .chunks_exact(stride)
            .map(|vertex| {
                let position = self.program.read_vec2(vertex, self.program.position_offset);
                let tex_coord = self.program.read_vec2(vertex, self.program.tex_coord_offset);
                to_screen(&vertex_stage(position, tex_coord, size_info), width, height)
            })
            .collect();

        let mut covered = vec![false; (width as usize) * (height as usize)];
        let mut shaded = 0;
        for [i0, i1, i2] in strip_triangles(screen.len()) {
            rasterize(
                [&screen[i0], &screen[i1], &screen[i2]],
                width,
                height,
                |x, y, tex_coord| {
                    let index = target.index(x, y);
                    if covered[index] {
                        return;
                    }
                    covered[index] = true;
                    shaded += 1;
                    let color = fragment_stage(texture.sample(tex_coord), size_info);
                    target.blend(x, y, color, self.blend);
                },
            );
        }
        Ok(shaded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::VertexAttribute;
    use crate::source::BackgroundImage;
    use crate::types::{FilterMode, Sampling, WrapMode};

    const SENTINEL: [f32; 4] = [0.1, 0.2, 0.3, 0.4];

    fn red_texture() -> SoftTexture {
        let image = BackgroundImage::solid(4, 4, [255, 0, 0, 128]);
        SoftTexture::from_image(&image, Sampling::default())
    }

    /// 4x4 image where every texel has a distinct colour.
    fn gradient_texture() -> SoftTexture {
        let mut rgba = Vec::new();
        for y in 0..4u8 {
            for x in 0..4u8 {
                rgba.extend([x * 60, y * 60, 200, 17]);
            }
        }
        let image = BackgroundImage::from_rgba8(4, 4, rgba).unwrap();
        SoftTexture::from_image(
            &image,
            Sampling {
                wrap: WrapMode::Clamp,
                filter: FilterMode::Nearest,
            },
        )
    }

    fn draw(tier: ShaderTier, texture: &SoftTexture, size_info: SizeInfo) -> (Framebuffer, usize) {
        let pipeline = SoftPipeline::for_quad(tier, BlendMode::Replace).unwrap();
        let mut target = Framebuffer::new(8, 8, SENTINEL);
        let shaded = pipeline.draw_quad(&mut target, texture, size_info).unwrap();
        (target, shaded)
    }

    fn assert_close(actual: [f32; 4], expected: [f32; 4]) {
        for (a, e) in actual.iter().zip(expected.iter()) {
            assert!((a - e).abs() < 1e-6, "expected {expected:?}, got {actual:?}");
        }
    }

    #[test]
    fn full_quad_replaces_alpha_with_opacity() {
        let (target, shaded) = draw(ShaderTier::Modern, &red_texture(), SizeInfo::new(1.0, 1.0, 0.8));
        assert_eq!(shaded, 64);
        for pixel in target.pixels() {
            assert_close(*pixel, [1.0, 0.0, 0.0, 0.8]);
        }
    }

    #[test]
    fn zero_opacity_keeps_colour_but_is_transparent() {
        let (target, _) = draw(ShaderTier::Modern, &red_texture(), SizeInfo::new(1.0, 1.0, 0.0));
        for pixel in target.pixels() {
            assert_close(*pixel, [1.0, 0.0, 0.0, 0.0]);
        }
    }

    #[test]
    fn output_alpha_ignores_texture_alpha() {
        for alpha in [0.0, 0.25, 0.5, 0.75, 1.0] {
            let (target, _) = draw(
                ShaderTier::Modern,
                &gradient_texture(),
                SizeInfo::new(1.0, 1.0, alpha),
            );
            assert!(target.pixels().iter().all(|pixel| pixel[3] == alpha));
        }
    }

    #[test]
    fn rgb_matches_sampled_texels() {
        let texture = gradient_texture();
        let (target, _) = draw(ShaderTier::Modern, &texture, SizeInfo::new(1.0, 1.0, 1.0));
        // Each texel covers a 2x2 block of the 8x8 target.
        for y in 0..8 {
            for x in 0..8 {
                let expected = texture.sample([(x as f32 + 0.5) / 8.0, (y as f32 + 0.5) / 8.0]);
                let pixel = target.pixel(x, y);
                assert_close([pixel[0], pixel[1], pixel[2], 1.0], [expected[0], expected[1], expected[2], 1.0]);
            }
        }
        assert_close(target.pixel(0, 0), [0.0, 0.0, 200.0 / 255.0, 1.0]);
        assert_close(target.pixel(7, 7), [180.0 / 255.0, 180.0 / 255.0, 200.0 / 255.0, 1.0]);
    }

    #[test]
    fn half_extent_quad_leaves_the_border_untouched() {
        let (target, shaded) = draw(ShaderTier::Modern, &red_texture(), SizeInfo::new(0.5, 0.5, 1.0));
        assert_eq!(shaded, 16);
        for y in 0..8 {
            for x in 0..8 {
                let inside = (2..6).contains(&x) && (2..6).contains(&y);
                let expected = if inside { [1.0, 0.0, 0.0, 1.0] } else { SENTINEL };
                assert_close(target.pixel(x, y), expected);
            }
        }
    }

    #[test]
    fn covered_extent_tracks_scale_factors() {
        // [-0.75, 0.75] x [-0.25, 0.25] on a 8x8 target is columns 1..7, rows 3..5.
        let (target, shaded) = draw(ShaderTier::Modern, &red_texture(), SizeInfo::new(0.75, 0.25, 1.0));
        assert_eq!(shaded, 12);
        assert_close(target.pixel(1, 3), [1.0, 0.0, 0.0, 1.0]);
        assert_close(target.pixel(6, 4), [1.0, 0.0, 0.0, 1.0]);
        assert_close(target.pixel(0, 3), SENTINEL);
        assert_close(target.pixel(3, 2), SENTINEL);
    }

    #[test]
    fn quad_edges_on_pixel_centres_cover_like_hardware() {
        // On a 4x1 target the quad's sides land on the centres of columns 0 and 3.
        let pipeline = SoftPipeline::for_quad(ShaderTier::Modern, BlendMode::Replace).unwrap();
        let mut target = Framebuffer::new(4, 1, SENTINEL);
        let shaded = pipeline
            .draw_quad(&mut target, &red_texture(), SizeInfo::new(0.75, 1.0, 1.0))
            .unwrap();
        assert_eq!(shaded, 3);
        for x in 0..3 {
            assert_close(target.pixel(x, 0), [1.0, 0.0, 0.0, 1.0]);
        }
        assert_close(target.pixel(3, 0), SENTINEL);
    }

    #[test]
    fn unset_uniform_draws_nothing() {
        let (target, shaded) = draw(ShaderTier::Modern, &red_texture(), SizeInfo::default());
        assert_eq!(shaded, 0);
        assert!(target.pixels().iter().all(|pixel| *pixel == SENTINEL));
    }

    #[test]
    fn tiers_produce_identical_pixels() {
        let texture = gradient_texture();
        for size_info in [
            SizeInfo::new(1.0, 1.0, 0.8),
            SizeInfo::new(0.5, 0.5, 1.0),
            SizeInfo::new(1.5, 0.75, 0.3),
        ] {
            let (legacy, legacy_count) = draw(ShaderTier::Legacy, &texture, size_info);
            let (modern, modern_count) = draw(ShaderTier::Modern, &texture, size_info);
            assert_eq!(legacy_count, modern_count);
            assert_eq!(legacy, modern);
        }
    }

    #[test]
    fn tiers_resolve_attributes_differently() {
        let mut layout = VertexLayout::quad();
        // Same data, renamed attributes: locations still match, names do not.
        layout.attributes = vec![
            VertexAttribute {
                name: "a_pos",
                location: 0,
                offset: 0,
            },
            VertexAttribute {
                name: "a_uv",
                location: 1,
                offset: 8,
            },
        ];

        assert!(SoftProgram::link(ShaderTier::Modern, &layout).is_ok());
        let error = SoftProgram::link(ShaderTier::Legacy, &layout).unwrap_err();
        assert!(matches!(error, RenderError::MissingAttribute { tier: ShaderTier::Legacy, .. }));
        assert!(error.to_string().contains("`position`"));
    }

    #[test]
    fn link_rejects_attributes_past_the_vertex_end() {
        let mut layout = VertexLayout::quad();
        layout.attributes[1].offset = 12;
        let error = SoftProgram::link(ShaderTier::Modern, &layout).unwrap_err();
        assert!(matches!(
            error,
            RenderError::AttributeOutOfBounds {
                name: "texCoord",
                offset: 12,
                stride: 16
            }
        ));

        let mut layout = VertexLayout::quad();
        layout.stride = 0;
        assert!(matches!(
            SoftProgram::link(ShaderTier::Legacy, &layout),
            Err(RenderError::AttributeOutOfBounds { stride: 0, .. })
        ));

        let mut layout = VertexLayout::quad();
        layout.attributes[0].offset = u64::MAX;
        assert!(SoftProgram::link(ShaderTier::Modern, &layout).is_err());
    }

    #[test]
    fn program_outputs_follow_tier() {
        let layout = VertexLayout::quad();
        let legacy = SoftProgram::link(ShaderTier::Legacy, &layout).unwrap();
        let modern = SoftProgram::link(ShaderTier::Modern, &layout).unwrap();
        assert_eq!(legacy.output(), FragmentOutput::Implicit);
        assert_eq!(modern.output(), FragmentOutput::Declared { location: 0 });
        assert!(FragmentOutput::Declared { location: 1 }.color_target().is_err());
    }

    #[test]
    fn alpha_blend_composites_over_previous_contents() {
        let pipeline = SoftPipeline::for_quad(ShaderTier::Modern, BlendMode::Alpha).unwrap();
        let mut target = Framebuffer::new(2, 2, [0.0, 0.0, 1.0, 1.0]);
        pipeline
            .draw_quad(&mut target, &red_texture(), SizeInfo::new(1.0, 1.0, 0.25))
            .unwrap();
        assert_close(target.pixel(1, 1), [0.25, 0.0, 0.75, 1.0]);
    }

    #[test]
    fn rejects_truncated_vertex_buffers() {
        let pipeline = SoftPipeline::for_quad(ShaderTier::Modern, BlendMode::Replace).unwrap();
        let mut target = Framebuffer::new(2, 2, SENTINEL);
        let bytes: &[u8] = bytemuck::cast_slice(&QUAD_VERTICES);
        let error = pipeline
            .draw(&mut target, &red_texture(), &bytes[..30], SizeInfo::new(1.0, 1.0, 1.0))
            .unwrap_err();
        assert!(matches!(error, RenderError::MisalignedVertexBuffer { len: 30, stride: 16 }));
    }
}
