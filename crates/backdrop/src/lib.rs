//! Background-image layer pass for GPU terminal renderers.
//!
//! A single image is drawn as a textured quad underneath the terminal grid.
//! The quad spans `[-1, 1]` in clip space and is scaled per axis by the
//! `sizeInfo` uniform, whose `z` component replaces the sampled alpha so the
//! configured opacity applies uniformly. The overall flow is:
//!
//! ```text
//!   CLI / bgview
//!          │ RendererConfig
//!          ▼
//!   Renderer::run ──▶ WindowState ──▶ winit event loop ──▶ render_frame()
//!                         │                                   │
//!                         │ BackgroundSource                  ├─▶ clear pass
//!                         ▼                                   └─▶ GpuBackground::encode
//!                   SizeInfo::fit ─────────▶ GPU UBO ────────────────┘
//! ```
//!
//! The GLSL comes in two binding tiers (see [`ShaderTier`]). wgpu compiles
//! the modern tier; the [`soft`] backend executes either tier on the CPU and
//! is the reference the pixel behaviour is tested against.

mod error;
mod geometry;
mod gpu;
mod shader;
pub mod soft;
mod source;
mod types;
mod window;

use anyhow::Result;

pub use error::RenderError;
pub use geometry::{
    SizeInfo, Vertex, VertexAttribute, VertexLayout, POSITION_ATTRIBUTE, POSITION_LOCATION,
    QUAD_VERTICES, TEX_COORD_ATTRIBUTE, TEX_COORD_LOCATION, VERTEX_STRIDE,
};
pub use shader::{ShaderProgram, ShaderTier};
pub use source::{BackgroundImage, BackgroundSource};
pub use types::{
    BlendMode, ColorSpaceMode, FilterMode, FitMode, RendererConfig, Sampling, Stage, SurfaceAlpha,
    WrapMode,
};

/// High-level entry point that owns the chosen configuration.
pub struct Renderer {
    config: RendererConfig,
}

impl Renderer {
    pub fn new(config: RendererConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    /// Opens the preview window and blocks until it is closed.
    ///
    /// Fails when no window or adapter can be created, or when the configured
    /// tier cannot be compiled by wgpu.
    pub fn run(&mut self) -> Result<()> {
        window::run_preview(&self.config)
    }
}
