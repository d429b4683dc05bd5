//! Static quad geometry and the per-draw `SizeInfo` uniform.
//!
//! The quad is uploaded once and never touched again; window resizes and
//! opacity changes only rewrite `SizeInfo`.

use bytemuck::{Pod, Zeroable};

use crate::types::FitMode;

/// GLSL name of the position attribute.
pub const POSITION_ATTRIBUTE: &str = "position";
/// GLSL name of the texture-coordinate attribute.
pub const TEX_COORD_ATTRIBUTE: &str = "texCoord";

/// Location of the position attribute in the location-qualified tier.
pub const POSITION_LOCATION: u32 = 0;
/// Location of the texture-coordinate attribute in the location-qualified tier.
pub const TEX_COORD_LOCATION: u32 = 1;

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 2],
    pub tex_coord: [f32; 2],
}

/// Unit quad drawn as a triangle strip.
///
/// Texture row 0 is the top of the image, so `(-1, 1)` maps to `(0, 0)`.
pub const QUAD_VERTICES: [Vertex; 4] = [
    Vertex {
        position: [-1.0, 1.0],
        tex_coord: [0.0, 0.0],
    },
    Vertex {
        position: [-1.0, -1.0],
        tex_coord: [0.0, 1.0],
    },
    Vertex {
        position: [1.0, 1.0],
        tex_coord: [1.0, 0.0],
    },
    Vertex {
        position: [1.0, -1.0],
        tex_coord: [1.0, 1.0],
    },
];

pub const VERTEX_STRIDE: u64 = std::mem::size_of::<Vertex>() as u64;

/// One attribute of the vertex buffer, addressable by name or by location.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VertexAttribute {
    pub name: &'static str,
    pub location: u32,
    pub offset: u64,
}

/// Describes how attributes are laid out in an interleaved vertex buffer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VertexLayout {
    pub stride: u64,
    pub attributes: Vec<VertexAttribute>,
}

impl VertexLayout {
    /// Layout of [`QUAD_VERTICES`].
    pub fn quad() -> Self {
        Self {
            stride: VERTEX_STRIDE,
            attributes: vec![
                VertexAttribute {
                    name: POSITION_ATTRIBUTE,
                    location: POSITION_LOCATION,
                    offset: 0,
                },
                VertexAttribute {
                    name: TEX_COORD_ATTRIBUTE,
                    location: TEX_COORD_LOCATION,
                    offset: std::mem::size_of::<[f32; 2]>() as u64,
                },
            ],
        }
    }

    pub fn by_name(&self, name: &str) -> Option<&VertexAttribute> {
        self.attributes.iter().find(|attribute| attribute.name == name)
    }

    pub fn by_location(&self, location: u32) -> Option<&VertexAttribute> {
        self.attributes
            .iter()
            .find(|attribute| attribute.location == location)
    }
}

/// Per-draw uniform `(widthScale, heightScale, alpha)`.
///
/// The zeroed default is what an unset uniform looks like on the GPU: a
/// degenerate quad that covers nothing.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SizeInfo {
    pub width_scale: f32,
    pub height_scale: f32,
    pub alpha: f32,
}

impl SizeInfo {
    pub const fn new(width_scale: f32, height_scale: f32, alpha: f32) -> Self {
        Self {
            width_scale,
            height_scale,
            alpha,
        }
    }

    /// Derives the scale factors for an image of `image` pixels shown in a
    /// viewport of `viewport` pixels.
    ///
    /// Zero-sized images (failed loads) and zero-sized viewports produce a
    /// zero scale. `alpha` is clamped to [0, 1].
    pub fn fit(fit: FitMode, image: (u32, u32), viewport: (u32, u32), alpha: f32) -> Self {
        let alpha = alpha.clamp(0.0, 1.0);
        let (image_w, image_h) = (image.0 as f32, image.1 as f32);
        let (view_w, view_h) = (viewport.0 as f32, viewport.1 as f32);
        if view_w <= 0.0 || view_h <= 0.0 || image_w <= 0.0 || image_h <= 0.0 {
            return Self::new(0.0, 0.0, alpha);
        }

        let (width_scale, height_scale) = match fit {
            FitMode::Stretch => (1.0, 1.0),
            FitMode::Center => (image_w / view_w, image_h / view_h),
            FitMode::Contain => {
                let scale = (view_w / image_w).min(view_h / image_h);
                (image_w * scale / view_w, image_h * scale / view_h)
            }
            FitMode::Cover => {
                let scale = (view_w / image_w).max(view_h / image_h);
                (image_w * scale / view_w, image_h * scale / view_h)
            }
        };
        Self::new(width_scale, height_scale, alpha)
    }

    pub fn to_array(self) -> [f32; 3] {
        [self.width_scale, self.height_scale, self.alpha]
    }

    /// Whether a draw with this uniform can cover any pixel.
    pub fn is_degenerate(&self) -> bool {
        self.width_scale == 0.0 || self.height_scale == 0.0
    }
}
