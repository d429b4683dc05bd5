use crate::source::BackgroundImage;
use crate::types::{FilterMode, Sampling, WrapMode};

/// CPU copy of the background texture with normalised float texels.
#[derive(Debug, Clone)]
pub struct SoftTexture {
    width: u32,
    height: u32,
    texels: Vec<[f32; 4]>,
    sampling: Sampling,
}

impl SoftTexture {
    pub fn from_image(image: &BackgroundImage, sampling: Sampling) -> Self {
        let texels = image
            .as_bytes()
            .chunks_exact(4)
            .map(|px| {
                [
                    px[0] as f32 / 255.0,
                    px[1] as f32 / 255.0,
                    px[2] as f32 / 255.0,
                    px[3] as f32 / 255.0,
                ]
            })
            .collect();
        Self {
            width: image.width(),
            height: image.height(),
            texels,
            sampling,
        }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Samples at normalised coordinates. An empty texture samples as
    /// transparent black.
    pub fn sample(&self, tex_coord: [f32; 2]) -> [f32; 4] {
        if self.width == 0 || self.height == 0 {
            return [0.0; 4];
        }
        let u = tex_coord[0] * self.width as f32;
        let v = tex_coord[1] * self.height as f32;
        match self.sampling.filter {
            FilterMode::Nearest => self.fetch(u.floor() as i64, v.floor() as i64),
            FilterMode::Linear => self.bilinear(u - 0.5, v - 0.5),
        }
    }

    fn bilinear(&self, u: f32, v: f32) -> [f32; 4] {
        let (x0, y0) = (u.floor(), v.floor());
        let (tx, ty) = (u - x0, v - y0);
        let (x0, y0) = (x0 as i64, y0 as i64);

        let top = lerp(self.fetch(x0, y0), self.fetch(x0 + 1, y0), tx);
        let bottom = lerp(self.fetch(x0, y0 + 1), self.fetch(x0 + 1, y0 + 1), tx);
        lerp(top, bottom, ty)
    }

    fn fetch(&self, x: i64, y: i64) -> [f32; 4] {
        let x = wrap(x, self.width, self.sampling.wrap);
        let y = wrap(y, self.height, self.sampling.wrap);
        self.texels[y * self.width as usize + x]
    }
}

fn wrap(index: i64, size: u32, mode: WrapMode) -> usize {
    let size = i64::from(size);
    let wrapped = match mode {
        WrapMode::Repeat => index.rem_euclid(size),
        WrapMode::Clamp => index.clamp(0, size - 1),
        WrapMode::Mirror => {
            let period = index.rem_euclid(size * 2);
            if period < size {
                period
            } else {
                size * 2 - 1 - period
            }
        }
    };
    wrapped as usize
}

fn lerp(a: [f32; 4], b: [f32; 4], t: f32) -> [f32; 4] {
    [
        a[0] + (b[0] - a[0]) * t,
        a[1] + (b[1] - a[1]) * t,
        a[2] + (b[2] - a[2]) * t,
        a[3] + (b[3] - a[3]) * t,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 2x1 image: black on the left, white on the right.
    fn stripes(sampling: Sampling) -> SoftTexture {
        let image =
            BackgroundImage::from_rgba8(2, 1, vec![0, 0, 0, 255, 255, 255, 255, 255]).unwrap();
        SoftTexture::from_image(&image, sampling)
    }

    #[test]
    fn nearest_picks_the_containing_texel() {
        let texture = stripes(Sampling::default());
        assert_eq!(texture.sample([0.25, 0.5])[0], 0.0);
        assert_eq!(texture.sample([0.75, 0.5])[0], 1.0);
    }

    #[test]
    fn repeat_wraps_out_of_range_coordinates() {
        let texture = stripes(Sampling {
            wrap: WrapMode::Repeat,
            filter: FilterMode::Nearest,
        });
        assert_eq!(texture.sample([1.25, 0.5])[0], 0.0);
        assert_eq!(texture.sample([-0.25, 0.5])[0], 1.0);
    }

    #[test]
    fn clamp_holds_the_edge_texel() {
        let texture = stripes(Sampling {
            wrap: WrapMode::Clamp,
            filter: FilterMode::Nearest,
        });
        assert_eq!(texture.sample([1.25, 0.5])[0], 1.0);
        assert_eq!(texture.sample([-0.25, 0.5])[0], 0.0);
    }

    #[test]
    fn mirror_reflects_at_the_border() {
        assert_eq!(wrap(2, 2, WrapMode::Mirror), 1);
        assert_eq!(wrap(3, 2, WrapMode::Mirror), 0);
        assert_eq!(wrap(-1, 2, WrapMode::Mirror), 0);
    }

    #[test]
    fn linear_blends_neighbouring_texels() {
        let texture = stripes(Sampling {
            wrap: WrapMode::Clamp,
            filter: FilterMode::Linear,
        });
        let mid = texture.sample([0.5, 0.5]);
        assert!((mid[0] - 0.5).abs() < 1e-6);
        // Texel centres reproduce the stored values exactly.
        assert_eq!(texture.sample([0.25, 0.5])[0], 0.0);
        assert_eq!(texture.sample([0.75, 0.5])[0], 1.0);
    }

    #[test]
    fn empty_texture_samples_transparent_black() {
        let image = BackgroundImage::solid(0, 0, [255; 4]);
        let texture = SoftTexture::from_image(&image, Sampling::default());
        assert_eq!(texture.sample([0.5, 0.5]), [0.0; 4]);
    }
}
