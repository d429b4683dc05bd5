use std::path::{Path, PathBuf};

use image::GenericImageView;

use crate::error::RenderError;
use crate::geometry::SizeInfo;
use crate::types::FitMode;

/// Decoded background image in tightly packed RGBA8, row 0 at the top.
#[derive(Clone, PartialEq, Eq)]
pub struct BackgroundImage {
    width: u32,
    height: u32,
    rgba: Vec<u8>,
}

impl std::fmt::Debug for BackgroundImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackgroundImage")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish_non_exhaustive()
    }
}

impl BackgroundImage {
    pub fn open(path: &Path) -> Result<Self, RenderError> {
        let image = image::open(path).map_err(|source| RenderError::Image {
            path: path.to_path_buf(),
            source,
        })?;
        let (width, height) = image.dimensions();
        Ok(Self {
            width,
            height,
            rgba: image.to_rgba8().into_raw(),
        })
    }

    /// Wraps raw RGBA8 pixels. Returns `None` when the buffer length does not
    /// match the dimensions.
    pub fn from_rgba8(width: u32, height: u32, rgba: Vec<u8>) -> Option<Self> {
        let expected = (width as usize) * (height as usize) * 4;
        (rgba.len() == expected).then_some(Self {
            width,
            height,
            rgba,
        })
    }

    /// A single-colour image, handy for placeholders and tests.
    pub fn solid(width: u32, height: u32, color: [u8; 4]) -> Self {
        let texels = (width as usize) * (height as usize);
        Self {
            width,
            height,
            rgba: color.repeat(texels),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.rgba
    }

    pub fn texel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let start = ((y as usize) * (self.width as usize) + x as usize) * 4;
        let mut texel = [0u8; 4];
        texel.copy_from_slice(&self.rgba[start..start + 4]);
        Some(texel)
    }
}

/// Tracks which image is bound as the background.
///
/// Loading happens once per distinct path. A failed load is remembered as an
/// empty image so the renderer does not retry on every frame; the resulting
/// `SizeInfo` is degenerate and nothing is drawn.
#[derive(Debug, Default)]
pub struct BackgroundSource {
    path: Option<PathBuf>,
    image: Option<BackgroundImage>,
}

impl BackgroundSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds the image at `path`. Returns `true` when the bound image changed.
    pub fn set_background(&mut self, path: &Path) -> bool {
        if self.path.as_deref() == Some(path) {
            return false;
        }

        self.path = Some(path.to_path_buf());
        match BackgroundImage::open(path) {
            Ok(image) => {
                tracing::info!(
                    path = %path.display(),
                    width = image.width(),
                    height = image.height(),
                    "loaded background image"
                );
                self.image = Some(image);
            }
            Err(error) => {
                tracing::warn!(path = %path.display(), %error, "failed to load background image");
                self.image = None;
            }
        }
        true
    }

    /// Binds an already decoded image, replacing any path-based state.
    pub fn set_image(&mut self, image: BackgroundImage) {
        self.path = None;
        self.image = Some(image);
    }

    pub fn clear(&mut self) {
        self.path = None;
        self.image = None;
    }

    /// A background is drawn once one has been requested, even if it failed
    /// to load.
    pub fn should_draw(&self) -> bool {
        self.path.is_some() || self.image.is_some()
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn image(&self) -> Option<&BackgroundImage> {
        self.image.as_ref()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image
            .as_ref()
            .map(BackgroundImage::dimensions)
            .unwrap_or((0, 0))
    }

    pub fn size_info(&self, fit: FitMode, viewport: (u32, u32), alpha: f32) -> SizeInfo {
        SizeInfo::fit(fit, self.dimensions(), viewport, alpha)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgba};
    use tempfile::TempDir;

    fn write_png(dir: &TempDir, name: &str, width: u32, height: u32) -> PathBuf {
        let path = dir.path().join(name);
        let buffer = ImageBuffer::from_pixel(width, height, Rgba([10u8, 20, 30, 255]));
        buffer.save(&path).unwrap();
        path
    }

    #[test]
    fn solid_image_fills_every_texel() {
        let image = BackgroundImage::solid(3, 2, [255, 0, 0, 128]);
        assert_eq!(image.as_bytes().len(), 24);
        assert_eq!(image.texel(2, 1), Some([255, 0, 0, 128]));
        assert_eq!(image.texel(3, 0), None);
    }

    #[test]
    fn from_rgba8_rejects_short_buffers() {
        assert!(BackgroundImage::from_rgba8(2, 2, vec![0; 15]).is_none());
        assert!(BackgroundImage::from_rgba8(2, 2, vec![0; 16]).is_some());
    }

    #[test]
    fn loads_image_from_disk() {
        let dir = TempDir::new().unwrap();
        let path = write_png(&dir, "bg.png", 4, 3);

        let mut source = BackgroundSource::new();
        assert!(!source.should_draw());
        assert!(source.set_background(&path));
        assert!(source.should_draw());
        assert_eq!(source.dimensions(), (4, 3));
        assert_eq!(source.image().unwrap().texel(0, 0), Some([10, 20, 30, 255]));
    }

    #[test]
    fn same_path_is_not_reloaded() {
        let dir = TempDir::new().unwrap();
        let path = write_png(&dir, "bg.png", 2, 2);

        let mut source = BackgroundSource::new();
        assert!(source.set_background(&path));
        assert!(!source.set_background(&path));

        let other = write_png(&dir, "other.png", 5, 5);
        assert!(source.set_background(&other));
        assert_eq!(source.dimensions(), (5, 5));
    }

    #[test]
    fn failed_load_is_remembered_and_draws_nothing() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("missing.png");

        let mut source = BackgroundSource::new();
        assert!(source.set_background(&missing));
        assert!(!source.set_background(&missing));
        assert!(source.should_draw());
        assert!(source.image().is_none());
        assert!(source
            .size_info(FitMode::Center, (800, 600), 1.0)
            .is_degenerate());
    }

    #[test]
    fn open_reports_path_on_error() {
        let error = BackgroundImage::open(Path::new("/definitely/not/here.png")).unwrap_err();
        assert!(error.to_string().contains("/definitely/not/here.png"));
    }
}
