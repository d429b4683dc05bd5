use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, Event, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::keyboard::{Key, NamedKey};
use winit::window::{Window, WindowBuilder};

use crate::gpu::{GpuBackground, GpuContext};
use crate::source::BackgroundSource;
use crate::types::RendererConfig;

/// Aggregates GPU state for the preview window.
pub(crate) struct WindowState {
    window: Arc<Window>,
    context: GpuContext,
    background: GpuBackground,
    source: BackgroundSource,
    config: RendererConfig,
}

impl WindowState {
    pub(crate) fn new(window: Arc<Window>, config: &RendererConfig) -> Result<Self> {
        let size = window.inner_size();
        let context = GpuContext::new(
            window.as_ref(),
            size,
            config.color_space,
            config.surface_alpha(),
        )?;
        let mut background = GpuBackground::new(
            &context.device,
            &context.queue,
            context.surface_format,
            config.tier,
            config.blend,
            config.sampling,
            context.color_space,
        )
        .context("failed to build background pipeline")?;

        let mut source = BackgroundSource::new();
        if let Some(path) = &config.image {
            source.set_background(path);
        }
        background.set_image(&context.device, &context.queue, source.image());

        tracing::info!(
            tier = %background.tier(),
            fit = ?config.fit,
            opacity = config.opacity,
            "background renderer ready"
        );

        Ok(Self {
            window,
            context,
            background,
            source,
            config: config.clone(),
        })
    }

    pub(crate) fn window(&self) -> &Window {
        &self.window
    }

    pub(crate) fn size(&self) -> PhysicalSize<u32> {
        self.context.size
    }

    pub(crate) fn resize(&mut self, new_size: PhysicalSize<u32>) {
        self.context.resize(new_size);
    }

    /// Clears to the configured colour, then layers the background on top.
    pub(crate) fn render_frame(&mut self) -> Result<(), wgpu::SurfaceError> {
        let frame = self.context.surface.get_current_texture()?;
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder =
            self.context
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("frame encoder"),
                });

        let clear = clear_color(&self.config, self.context.config.alpha_mode);
        encode_clear(&mut encoder, &view, clear);

        if self.source.should_draw() {
            let viewport = (self.context.size.width, self.context.size.height);
            let size_info = self
                .source
                .size_info(self.config.fit, viewport, self.config.opacity);
            self.background.prepare(&self.context.queue, size_info);
            self.background.encode(&mut encoder, &view);
        }

        self.context.queue.submit(std::iter::once(encoder.finish()));
        frame.present();
        Ok(())
    }
}

/// The window opacity scales the clear alpha so a transparent window stays
/// see-through where the background does not cover it. Premultiplying
/// compositors also get premultiplied colour.
fn clear_color(config: &RendererConfig, alpha_mode: wgpu::CompositeAlphaMode) -> wgpu::Color {
    let [r, g, b, a] = config.clear_color;
    let a = a * f64::from(config.opacity.clamp(0.0, 1.0));
    match alpha_mode {
        wgpu::CompositeAlphaMode::PreMultiplied => wgpu::Color {
            r: r * a,
            g: g * a,
            b: b * a,
            a,
        },
        _ => wgpu::Color { r, g, b, a },
    }
}

fn encode_clear(encoder: &mut wgpu::CommandEncoder, view: &wgpu::TextureView, color: wgpu::Color) {
    // The pass only exists for its load op.
    let _pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some("clear pass"),
        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
            view,
            depth_slice: None,
            resolve_target: None,
            ops: wgpu::Operations {
                load: wgpu::LoadOp::Clear(color),
                store: wgpu::StoreOp::Store,
            },
        })],
        depth_stencil_attachment: None,
        occlusion_query_set: None,
        timestamp_writes: None,
    });
}

/// Opens the preview window and drives the `winit` event loop until the
/// window closes or Escape is pressed.
pub(crate) fn run_preview(config: &RendererConfig) -> Result<()> {
    let event_loop = EventLoop::new().context("failed to initialize event loop")?;
    let window_size = PhysicalSize::new(config.surface_size.0, config.surface_size.1);
    let window = WindowBuilder::new()
        .with_title("Background Preview")
        .with_inner_size(window_size)
        .with_transparent(config.opacity < 1.0)
        .build(&event_loop)
        .context("failed to create preview window")?;
    let window = Arc::new(window);

    let mut state = WindowState::new(window.clone(), config)?;
    state.window().request_redraw();

    event_loop
        .run(move |event, elwt| {
            elwt.set_control_flow(ControlFlow::Wait);

            if let Event::WindowEvent { window_id, event } = event {
                if window_id != state.window().id() {
                    return;
                }
                match event {
                    WindowEvent::CloseRequested | WindowEvent::Destroyed => {
                        elwt.exit();
                    }
                    WindowEvent::KeyboardInput { event, .. } => {
                        if event.state == ElementState::Pressed
                            && matches!(event.logical_key, Key::Named(NamedKey::Escape))
                        {
                            elwt.exit();
                        }
                    }
                    WindowEvent::Resized(new_size) => {
                        state.resize(new_size);
                        state.window().request_redraw();
                    }
                    WindowEvent::ScaleFactorChanged {
                        mut inner_size_writer,
                        ..
                    } => {
                        let _ = inner_size_writer.request_inner_size(state.size());
                    }
                    WindowEvent::RedrawRequested => match state.render_frame() {
                        Ok(()) => {}
                        Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                            state.resize(state.size());
                            state.window().request_redraw();
                        }
                        Err(wgpu::SurfaceError::OutOfMemory) => {
                            tracing::error!("surface out of memory; exiting preview");
                            elwt.exit();
                        }
                        Err(wgpu::SurfaceError::Timeout) => {
                            tracing::warn!("surface timeout; retrying next frame");
                            state.window().request_redraw();
                        }
                        Err(other) => {
                            tracing::warn!(error = ?other, "surface error; retrying next frame");
                            state.window().request_redraw();
                        }
                    },
                    _ => {}
                }
            }
        })
        .map_err(|err| anyhow!("event loop error: {err}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clear_colour_comes_from_config() {
        let config = RendererConfig {
            clear_color: [0.1, 0.2, 0.3, 1.0],
            ..RendererConfig::default()
        };
        let color = clear_color(&config, wgpu::CompositeAlphaMode::Opaque);
        assert_eq!((color.r, color.g, color.b, color.a), (0.1, 0.2, 0.3, 1.0));
    }

    #[test]
    fn translucent_window_clears_with_opacity_as_alpha() {
        let config = RendererConfig {
            opacity: 0.5,
            clear_color: [0.2, 0.4, 0.6, 1.0],
            ..RendererConfig::default()
        };

        let straight = clear_color(&config, wgpu::CompositeAlphaMode::PostMultiplied);
        assert_eq!(
            (straight.r, straight.g, straight.b, straight.a),
            (0.2, 0.4, 0.6, 0.5)
        );

        let premultiplied = clear_color(&config, wgpu::CompositeAlphaMode::PreMultiplied);
        assert_eq!(
            (premultiplied.r, premultiplied.g, premultiplied.b, premultiplied.a),
            (0.1, 0.2, 0.3, 0.5)
        );
    }
}
