//! Rust renditions of the two GLSL stage bodies.

use crate::geometry::SizeInfo;

/// Output of the vertex stage.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClipVertex {
    pub position: [f32; 4],
    pub tex_coord: [f32; 2],
}

pub fn vertex_stage(position: [f32; 2], tex_coord: [f32; 2], size_info: SizeInfo) -> ClipVertex {
    ClipVertex {
        position: [
            position[0] * size_info.width_scale,
            position[1] * size_info.height_scale,
            0.0,
            1.0,
        ],
        tex_coord,
    }
}

pub fn fragment_stage(sampled: [f32; 4], size_info: SizeInfo) -> [f32; 4] {
    [sampled[0], sampled[1], sampled[2], size_info.alpha]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertex_stage_scales_per_axis_and_fixes_depth() {
        let out = vertex_stage([-1.0, 1.0], [0.25, 0.75], SizeInfo::new(0.5, 2.0, 0.3));
        assert_eq!(out.position, [-0.5, 2.0, 0.0, 1.0]);
        assert_eq!(out.tex_coord, [0.25, 0.75]);
    }

    #[test]
    fn fragment_stage_only_replaces_alpha() {
        let out = fragment_stage([0.1, 0.2, 0.3, 0.9], SizeInfo::new(1.0, 1.0, 0.4));
        assert_eq!(out, [0.1, 0.2, 0.3, 0.4]);
    }
}
