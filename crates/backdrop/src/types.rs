use std::fmt;
use std::path::PathBuf;

use crate::shader::ShaderTier;

/// Pipeline stage a shader source belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Vertex,
    Fragment,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Vertex => f.write_str("vertex"),
            Stage::Fragment => f.write_str("fragment"),
        }
    }
}

/// How the background image is sized against the viewport.
///
/// Every mode keeps the image centred; they only differ in the per-axis scale
/// written into `SizeInfo`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FitMode {
    /// Stretch the quad over the whole viewport, ignoring aspect ratio.
    Stretch,
    /// Keep the image at its native pixel size; larger images are cropped.
    #[default]
    Center,
    /// Scale uniformly until the image fits, letterboxing the remainder.
    Contain,
    /// Scale uniformly until the viewport is covered, cropping the overflow.
    Cover,
}

/// Addressing used when texture coordinates leave the [0, 1] range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WrapMode {
    #[default]
    Repeat,
    Clamp,
    Mirror,
}

/// Texel filtering policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterMode {
    #[default]
    Nearest,
    Linear,
}

/// Sampler settings shared by the GPU and CPU backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Sampling {
    pub wrap: WrapMode,
    pub filter: FilterMode,
}

/// How the fragment output is combined with the colour target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlendMode {
    /// `rgb = src * a + dst * (1 - a)`, `alpha = a * a + dst.a`.
    #[default]
    Alpha,
    /// Write the fragment output untouched.
    Replace,
}

/// Output color handling for the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorSpaceMode {
    /// Same as `Gamma`: image bytes go to the swapchain without conversion.
    #[default]
    Auto,
    /// Non-sRGB texture and surface formats.
    Gamma,
    /// sRGB texture and surface formats; decode and encode cancel out.
    Linear,
}

/// Declares how the compositor should treat the swapchain alpha channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SurfaceAlpha {
    /// Frames fully cover the window without transparency.
    #[default]
    Opaque,
    /// Frames may contain transparency and should be blended by the compositor.
    Transparent,
}

impl SurfaceAlpha {
    /// Transparency is only requested when the background is not fully opaque.
    pub fn for_opacity(opacity: f32) -> Self {
        if opacity < 1.0 {
            SurfaceAlpha::Transparent
        } else {
            SurfaceAlpha::Opaque
        }
    }
}

/// Immutable configuration passed to the renderer at start-up.
///
/// `RendererConfig` mirrors the config file and CLI flags: which image to
/// show, how to fit and sample it, which binding tier to compile, and the
/// opacity that ends up in `sizeInfo.z`.
#[derive(Debug, Clone)]
pub struct RendererConfig {
    /// Initial window size in physical pixels.
    pub surface_size: (u32, u32),
    /// Background image; `None` leaves only the clear colour.
    pub image: Option<PathBuf>,
    /// Background opacity in [0, 1].
    pub opacity: f32,
    /// Colour the preview clears to before the background pass.
    pub clear_color: [f64; 4],
    pub fit: FitMode,
    pub sampling: Sampling,
    pub blend: BlendMode,
    /// Binding convention of the compiled program.
    pub tier: ShaderTier,
    pub color_space: ColorSpaceMode,
}

impl RendererConfig {
    pub fn surface_alpha(&self) -> SurfaceAlpha {
        SurfaceAlpha::for_opacity(self.opacity)
    }
}

impl Default for RendererConfig {
    /// Provides a 1280x800 opaque configuration with no image selected.
    fn default() -> Self {
        Self {
            surface_size: (1280, 800),
            image: None,
            opacity: 1.0,
            clear_color: [0.0, 0.0, 0.0, 1.0],
            fit: FitMode::default(),
            sampling: Sampling::default(),
            blend: BlendMode::default(),
            tier: ShaderTier::default(),
            color_space: ColorSpaceMode::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn surface_alpha_follows_opacity() {
        assert_eq!(SurfaceAlpha::for_opacity(1.0), SurfaceAlpha::Opaque);
        assert_eq!(SurfaceAlpha::for_opacity(0.85), SurfaceAlpha::Transparent);
        assert_eq!(SurfaceAlpha::for_opacity(0.0), SurfaceAlpha::Transparent);
    }

    #[test]
    fn defaults_centre_an_opaque_repeating_image() {
        let config = RendererConfig::default();
        assert_eq!(config.fit, FitMode::Center);
        assert_eq!(config.sampling.wrap, WrapMode::Repeat);
        assert_eq!(config.sampling.filter, FilterMode::Nearest);
        assert_eq!(config.blend, BlendMode::Alpha);
        assert_eq!(config.tier, ShaderTier::Modern);
    }
}
