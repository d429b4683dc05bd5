use bytemuck::{Pod, Zeroable};

use crate::geometry::SizeInfo;

/// CPU mirror of the `BackgroundParams` uniform block.
///
/// std140 gives the `vec3 sizeInfo` member a 16-byte slot; the fourth float
/// is padding.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub(crate) struct BackgroundUniforms {
    pub size_info: [f32; 4],
}

impl BackgroundUniforms {
    pub fn new(size_info: SizeInfo) -> Self {
        let [width_scale, height_scale, alpha] = size_info.to_array();
        Self {
            size_info: [width_scale, height_scale, alpha, 0.0],
        }
    }

    pub const SIZE: u64 = std::mem::size_of::<Self>() as u64;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_block_is_one_std140_slot() {
        assert_eq!(BackgroundUniforms::SIZE, 16);
    }

    #[test]
    fn packs_size_info_in_order() {
        let uniforms = BackgroundUniforms::new(SizeInfo::new(0.5, 0.25, 0.9));
        assert_eq!(uniforms.size_info, [0.5, 0.25, 0.9, 0.0]);
        let bytes = bytemuck::bytes_of(&uniforms);
        assert_eq!(&bytes[8..12], &0.9f32.to_ne_bytes());
    }

    #[test]
    fn zeroed_uniform_matches_unset_size_info() {
        assert_eq!(
            BackgroundUniforms::zeroed(),
            BackgroundUniforms::new(SizeInfo::default())
        );
    }
}
