//! wgpu backend for the background pass.
//!
//! - `context` owns the instance, device and surface and reconfigures the
//!   swapchain on resize.
//! - `texture` uploads the decoded image and builds its sampler.
//! - `pipeline` compiles the modern-tier GLSL and wires the bind group layout
//!   (uniform at 0, texture at 1, sampler at 2).
//! - `uniforms` mirrors the `BackgroundParams` block.
//! - `state` glues the above into `GpuBackground`, which `window` drives.

mod context;
mod pipeline;
mod state;
mod texture;
mod uniforms;

pub(crate) use context::GpuContext;
pub(crate) use state::GpuBackground;
