//! GLSL programs for the background pass.
//!
//! Each capability tier gets its own complete program: a tier prelude that
//! declares the bindings and a handful of `#define` aliases, followed by a
//! stage body shared by both tiers. The host picks exactly one tier when it
//! builds the pipeline; nothing branches at run time.

use std::borrow::Cow;
use std::fmt;

use wgpu::naga::ShaderStage;

use crate::error::RenderError;
use crate::types::Stage;

/// Binding convention of the compiled program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShaderTier {
    /// GL ES 2 style: unqualified `attribute`s bound by name, `varying`
    /// outputs, implicit `gl_FragColor`.
    Legacy,
    /// Explicit `layout(location = N)` inputs and a declared colour output.
    #[default]
    Modern,
}

impl fmt::Display for ShaderTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderTier::Legacy => f.write_str("legacy"),
            ShaderTier::Modern => f.write_str("modern"),
        }
    }
}

impl ShaderTier {
    /// Assembles the vertex and fragment sources for this tier.
    pub fn program(self) -> ShaderProgram {
        let (vertex_prelude, fragment_prelude) = match self {
            ShaderTier::Legacy => (LEGACY_VERTEX_PRELUDE, LEGACY_FRAGMENT_PRELUDE),
            ShaderTier::Modern => (MODERN_VERTEX_PRELUDE, MODERN_FRAGMENT_PRELUDE),
        };
        ShaderProgram {
            tier: self,
            vertex: format!("{vertex_prelude}\n{VERTEX_BODY}"),
            fragment: format!("{fragment_prelude}\n{FRAGMENT_BODY}"),
        }
    }
}

/// Vertex and fragment GLSL for one tier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderProgram {
    pub tier: ShaderTier,
    pub vertex: String,
    pub fragment: String,
}

impl ShaderProgram {
    pub fn source(&self, stage: Stage) -> &str {
        match stage {
            Stage::Vertex => &self.vertex,
            Stage::Fragment => &self.fragment,
        }
    }
}

/// Compiles the quad vertex shader for the wgpu backend.
pub(crate) fn compile_vertex_shader(
    device: &wgpu::Device,
    tier: ShaderTier,
) -> Result<wgpu::ShaderModule, RenderError> {
    compile_stage(device, tier, Stage::Vertex)
}

/// Compiles the sampling fragment shader for the wgpu backend.
pub(crate) fn compile_fragment_shader(
    device: &wgpu::Device,
    tier: ShaderTier,
) -> Result<wgpu::ShaderModule, RenderError> {
    compile_stage(device, tier, Stage::Fragment)
}

/// wgpu only ingests location-qualified GLSL 450 through naga, so the legacy
/// tier is rejected here and left to GL ES 2 hosts via [`ShaderTier::program`].
fn compile_stage(
    device: &wgpu::Device,
    tier: ShaderTier,
    stage: Stage,
) -> Result<wgpu::ShaderModule, RenderError> {
    if tier != ShaderTier::Modern {
        return Err(RenderError::UnsupportedTier {
            tier,
            backend: "wgpu",
        });
    }

    let program = tier.program();
    let (label, naga_stage) = match stage {
        Stage::Vertex => ("background vertex", ShaderStage::Vertex),
        Stage::Fragment => ("background fragment", ShaderStage::Fragment),
    };

    device.push_error_scope(wgpu::ErrorFilter::Validation);
    let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(label),
        source: wgpu::ShaderSource::Glsl {
            shader: Cow::Owned(program.source(stage).to_owned()),
            stage: naga_stage,
            defines: &[],
        },
    });
    if let Some(error) = pollster::block_on(device.pop_error_scope()) {
        return Err(RenderError::Compile {
            stage,
            tier,
            message: error.to_string(),
        });
    }

    tracing::debug!(%stage, %tier, "compiled background shader");
    Ok(module)
}

const LEGACY_VERTEX_PRELUDE: &str = r"#version 100
attribute vec2 position;
attribute vec2 texCoord;
varying vec2 texCoords;

uniform vec3 sizeInfo;
#define SIZE_INFO sizeInfo
";

const LEGACY_FRAGMENT_PRELUDE: &str = r"#version 100
precision mediump float;
varying vec2 texCoords;

uniform vec3 sizeInfo;
uniform sampler2D bg;
#define SIZE_INFO sizeInfo
#define BG bg
#define SAMPLE texture2D
#define FRAG_COLOR gl_FragColor
";

/// The uniform block layout must match `BackgroundUniforms` in `gpu/uniforms.rs`.
const MODERN_VERTEX_PRELUDE: &str = r"#version 450
layout(location = 0) in vec2 position;
layout(location = 1) in vec2 texCoord;
layout(location = 0) out vec2 texCoords;

layout(std140, set = 0, binding = 0) uniform BackgroundParams {
    vec3 sizeInfo;
} ubo;
#define SIZE_INFO ubo.sizeInfo
";

const MODERN_FRAGMENT_PRELUDE: &str = r"#version 450
layout(location = 0) in vec2 texCoords;
layout(location = 0) out vec4 fragColor;

layout(std140, set = 0, binding = 0) uniform BackgroundParams {
    vec3 sizeInfo;
} ubo;
layout(set = 0, binding = 1) uniform texture2D bg_texture;
layout(set = 0, binding = 2) uniform sampler bg_sampler;
#define SIZE_INFO ubo.sizeInfo
#define BG sampler2D(bg_texture, bg_sampler)
#define SAMPLE texture
#define FRAG_COLOR fragColor
";

const VERTEX_BODY: &str = r"void main() {
    gl_Position = vec4(position.x * SIZE_INFO.x, position.y * SIZE_INFO.y, 0.0, 1.0);
    texCoords = texCoord;
}
";

// RGB passes through; only alpha is replaced by the configured opacity.
const FRAGMENT_BODY: &str = r"void main() {
    vec4 color = SAMPLE(BG, texCoords);
    FRAG_COLOR = vec4(color.rgb, SIZE_INFO.z);
}
";
