use anyhow::{anyhow, Context as AnyhowContext, Result};
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use winit::dpi::PhysicalSize;

use crate::types::{ColorSpaceMode, SurfaceAlpha};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum SurfaceColorSpace {
    Gamma,
    Linear,
}

impl From<ColorSpaceMode> for SurfaceColorSpace {
    fn from(mode: ColorSpaceMode) -> Self {
        match mode {
            ColorSpaceMode::Auto | ColorSpaceMode::Gamma => SurfaceColorSpace::Gamma,
            ColorSpaceMode::Linear => SurfaceColorSpace::Linear,
        }
    }
}

/// Device, queue and swapchain for one window.
pub(crate) struct GpuContext {
    pub _instance: wgpu::Instance,
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    pub size: PhysicalSize<u32>,
    pub surface_format: wgpu::TextureFormat,
    pub color_space: SurfaceColorSpace,
}

impl GpuContext {
    pub(crate) fn new<T>(
        target: &T,
        initial_size: PhysicalSize<u32>,
        color_space: ColorSpaceMode,
        surface_alpha: SurfaceAlpha,
    ) -> Result<Self>
    where
        T: HasDisplayHandle + HasWindowHandle,
    {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            flags: wgpu::InstanceFlags::default(),
            memory_budget_thresholds: wgpu::MemoryBudgetThresholds::default(),
            backend_options: wgpu::BackendOptions::default(),
        });

        let window_handle = target
            .window_handle()
            .map_err(|err| anyhow!("failed to acquire window handle: {err}"))?;
        let display_handle = target
            .display_handle()
            .map_err(|err| anyhow!("failed to acquire display handle: {err}"))?;

        // SAFETY: the caller keeps the window alive for as long as the context.
        let surface = unsafe {
            instance.create_surface_unsafe(wgpu::SurfaceTargetUnsafe::RawHandle {
                raw_display_handle: display_handle.as_raw(),
                raw_window_handle: window_handle.as_raw(),
            })
        }
        .context("failed to create rendering surface")?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::LowPower,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .context("failed to find a suitable GPU adapter")?;

        let adapter_info = adapter.get_info();
        let limits = adapter.limits();
        tracing::debug!(
            name = %adapter_info.name,
            backend = ?adapter_info.backend,
            device_type = ?adapter_info.device_type,
            "selected GPU adapter"
        );

        let max_dimension = limits.max_texture_dimension_2d;
        let requested_width = initial_size.width.max(1);
        let requested_height = initial_size.height.max(1);
        if requested_width > max_dimension || requested_height > max_dimension {
            anyhow::bail!(
                "GPU max texture dimension is {max_dimension}, requested surface is {width}x{height}",
                max_dimension = max_dimension,
                width = requested_width,
                height = requested_height
            );
        }

        let surface_caps = surface.get_capabilities(&adapter);
        if surface_caps.formats.is_empty() {
            anyhow::bail!("surface reports no supported formats for this adapter");
        }
        let color_space = SurfaceColorSpace::from(color_space);
        let surface_format = select_surface_format(&surface_caps.formats, color_space);
        let alpha_mode = select_alpha_mode(&surface_caps.alpha_modes, surface_alpha);

        let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
            label: Some("backdrop device"),
            required_features: wgpu::Features::empty(),
            required_limits: limits.clone(),
            memory_hints: wgpu::MemoryHints::MemoryUsage,
            trace: wgpu::Trace::default(),
        }))
        .context("failed to create GPU device")?;

        // Fifo is the one mode every surface supports.
        let present_mode = wgpu::PresentMode::Fifo;
        tracing::debug!(?present_mode, ?surface_format, ?alpha_mode, "configuring surface");

        let size = PhysicalSize::new(requested_width, requested_height);
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width,
            height: size.height,
            present_mode,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        Ok(Self {
            _instance: instance,
            surface,
            device,
            queue,
            config,
            size,
            surface_format,
            color_space,
        })
    }

    pub(crate) fn resize(&mut self, new_size: PhysicalSize<u32>) {
        if new_size.width == 0 || new_size.height == 0 {
            return;
        }

        self.size = new_size;
        self.config.width = new_size.width;
        self.config.height = new_size.height;
        self.surface.configure(&self.device, &self.config);
    }
}

/// Picks a surface format whose sRGB-ness matches the texture format so the
/// image bytes reach the screen unchanged.
fn select_surface_format(
    formats: &[wgpu::TextureFormat],
    color_space: SurfaceColorSpace,
) -> wgpu::TextureFormat {
    let want_srgb = color_space == SurfaceColorSpace::Linear;
    formats
        .iter()
        .copied()
        .find(|format| format.is_srgb() == want_srgb)
        .unwrap_or_else(|| {
            let fallback = formats[0];
            tracing::warn!(
                ?fallback,
                ?color_space,
                "no surface format matches the requested colour space; colours may shift"
            );
            fallback
        })
}

/// Transparent backgrounds need a compositor alpha mode that honours the
/// alpha channel; otherwise the first advertised mode is used. Frames hold
/// straight alpha, so `PostMultiplied` wins over `PreMultiplied`.
fn select_alpha_mode(
    modes: &[wgpu::CompositeAlphaMode],
    surface_alpha: SurfaceAlpha,
) -> wgpu::CompositeAlphaMode {
    let fallback = modes
        .first()
        .copied()
        .unwrap_or(wgpu::CompositeAlphaMode::Auto);
    match surface_alpha {
        SurfaceAlpha::Opaque => fallback,
        SurfaceAlpha::Transparent => [
            wgpu::CompositeAlphaMode::PostMultiplied,
            wgpu::CompositeAlphaMode::PreMultiplied,
        ]
        .into_iter()
        .find(|preferred| modes.contains(preferred))
        .unwrap_or_else(|| {
            tracing::warn!(
                ?fallback,
                "surface cannot composite with alpha; background opacity only affects blending"
            );
            fallback
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn surface_format_matches_colour_space() {
        let formats = [
            wgpu::TextureFormat::Bgra8UnormSrgb,
            wgpu::TextureFormat::Bgra8Unorm,
        ];
        assert_eq!(
            select_surface_format(&formats, SurfaceColorSpace::Gamma),
            wgpu::TextureFormat::Bgra8Unorm
        );
        assert_eq!(
            select_surface_format(&formats, SurfaceColorSpace::Linear),
            wgpu::TextureFormat::Bgra8UnormSrgb
        );
        assert_eq!(
            select_surface_format(&formats[..1], SurfaceColorSpace::Gamma),
            wgpu::TextureFormat::Bgra8UnormSrgb
        );
    }

    #[test]
    fn transparent_surfaces_prefer_alpha_compositing() {
        let modes = [
            wgpu::CompositeAlphaMode::Opaque,
            wgpu::CompositeAlphaMode::PreMultiplied,
        ];
        assert_eq!(
            select_alpha_mode(&modes, SurfaceAlpha::Transparent),
            wgpu::CompositeAlphaMode::PreMultiplied
        );
        assert_eq!(
            select_alpha_mode(&modes, SurfaceAlpha::Opaque),
            wgpu::CompositeAlphaMode::Opaque
        );
        assert_eq!(
            select_alpha_mode(&modes[..1], SurfaceAlpha::Transparent),
            wgpu::CompositeAlphaMode::Opaque
        );
    }

    #[test]
    fn straight_alpha_compositing_is_preferred() {
        let modes = [
            wgpu::CompositeAlphaMode::Opaque,
            wgpu::CompositeAlphaMode::PreMultiplied,
            wgpu::CompositeAlphaMode::PostMultiplied,
        ];
        assert_eq!(
            select_alpha_mode(&modes, SurfaceAlpha::Transparent),
            wgpu::CompositeAlphaMode::PostMultiplied
        );
    }

    #[test]
    fn auto_colour_space_behaves_like_gamma() {
        assert_eq!(
            SurfaceColorSpace::from(ColorSpaceMode::Auto),
            SurfaceColorSpace::Gamma
        );
        assert_eq!(
            SurfaceColorSpace::from(ColorSpaceMode::Linear),
            SurfaceColorSpace::Linear
        );
    }
}
