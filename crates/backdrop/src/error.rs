use std::path::PathBuf;

use crate::shader::ShaderTier;
use crate::types::Stage;

/// Failures of the background pass. None of them can happen inside a draw;
/// they surface while programs are built or resources are bound.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("{stage} shader failed to compile for the {tier} tier: {message}")]
    Compile {
        stage: Stage,
        tier: ShaderTier,
        message: String,
    },
    #[error("the {tier} binding tier is not supported by the {backend} backend")]
    UnsupportedTier {
        tier: ShaderTier,
        backend: &'static str,
    },
    #[error("vertex layout provides no attribute for {binding} required by the {tier} tier")]
    MissingAttribute { tier: ShaderTier, binding: String },
    #[error(
        "attribute `{name}` at offset {offset} does not fit in a {stride}-byte vertex"
    )]
    AttributeOutOfBounds {
        name: &'static str,
        offset: u64,
        stride: u64,
    },
    #[error("vertex buffer is {len} bytes, not a whole number of {stride}-byte vertices")]
    MisalignedVertexBuffer { len: usize, stride: u64 },
    #[error("fragment output location {0} has no colour target")]
    MissingColorTarget(u32),
    #[error("failed to load background image {}: {source}", path.display())]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}
