use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use eframe::egui;

/// Size of the campus map image the routing service's coordinates refer to.
pub const DEFAULT_MAP_SIZE: [u32; 2] = [4330, 2964];

/// The static background image. Route coordinates are pixels of this image.
pub struct BaseMap {
    source: Option<PathBuf>,
    size: [u32; 2],
    pixels: Option<image::RgbaImage>,
    texture: Option<egui::TextureHandle>,
}

impl BaseMap {
    pub fn load(path: &Path) -> Result<Self> {
        let pixels = image::open(path)
            .with_context(|| format!("Failed to load map image {}", path.display()))?
            .into_rgba8();
        let size = [pixels.width(), pixels.height()];
        tracing::info!(
            path = %path.display(),
            width = size[0],
            height = size[1],
            "base map loaded"
        );
        Ok(Self {
            source: Some(path.to_path_buf()),
            size,
            pixels: Some(pixels),
            texture: None,
        })
    }

    /// A map with no image; only the cleared background is shown beneath the overlay.
    pub fn blank(size: [u32; 2]) -> Self {
        Self {
            source: None,
            size,
            pixels: None,
            texture: None,
        }
    }

    /// Load `path` if given, otherwise (or on failure) fall back to a blank map of `size`.
    pub fn load_or_blank(path: Option<&Path>, size: [u32; 2]) -> Self {
        match path {
            Some(path) => Self::load(path).unwrap_or_else(|e| {
                tracing::warn!("{e:#}; drawing on a blank map");
                Self::blank(size)
            }),
            None => {
                tracing::warn!("no map image configured; drawing on a blank map");
                Self::blank(size)
            }
        }
    }

    pub fn size(&self) -> [u32; 2] {
        self.size
    }

    pub fn size_vec2(&self) -> egui::Vec2 {
        egui::vec2(self.size[0] as f32, self.size[1] as f32)
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// Upload the image on first use. Images larger than the GPU allows are downscaled;
    /// drawing always maps the full texture onto the original pixel size.
    pub fn texture(&mut self, ctx: &egui::Context) -> Option<&egui::TextureHandle> {
        if self.texture.is_none() {
            let pixels = self.pixels.take()?;
            let max_side = ctx.input(|i| i.max_texture_side) as u32;
            let pixels = fit_texture(pixels, max_side);
            let color_image = egui::ColorImage::from_rgba_unmultiplied(
                [pixels.width() as usize, pixels.height() as usize],
                pixels.as_raw(),
            );
            self.texture = Some(ctx.load_texture(
                "campus-base-map",
                color_image,
                egui::TextureOptions::LINEAR,
            ));
        }
        self.texture.as_ref()
    }
}

fn fit_texture(pixels: image::RgbaImage, max_side: u32) -> image::RgbaImage {
    let (w, h) = pixels.dimensions();
    if max_side == 0 || (w <= max_side && h <= max_side) {
        return pixels;
    }
    let scale = max_side as f64 / w.max(h) as f64;
    let new_w = ((w as f64 * scale).floor() as u32).max(1);
    let new_h = ((h as f64 * scale).floor() as u32).max(1);
    tracing::debug!(
        from = ?(w, h),
        to = ?(new_w, new_h),
        "downscaling base map for texture limits"
    );
    image::imageops::resize(&pixels, new_w, new_h, image::imageops::FilterType::Triangle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_falls_back_to_blank() {
        let map = BaseMap::load_or_blank(Some(Path::new("/definitely/not/here.jpg")), [640, 480]);
        assert_eq!(map.size(), [640, 480]);
        assert!(map.source().is_none());
    }

    #[test]
    fn test_load_reports_image_size() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("map.png");
        image::RgbaImage::from_pixel(12, 7, image::Rgba([200, 200, 200, 255]))
            .save(&path)
            .unwrap();
        let map = BaseMap::load(&path).unwrap();
        assert_eq!(map.size(), [12, 7]);
        assert_eq!(map.source(), Some(path.as_path()));
    }

    #[test]
    fn test_fit_texture() {
        let img = image::RgbaImage::new(4330, 2964);
        let fitted = fit_texture(img, 2048);
        assert_eq!(fitted.width(), 2048);
        assert!(fitted.height() <= 2048);

        let small = image::RgbaImage::new(100, 50);
        assert_eq!(fit_texture(small, 2048).dimensions(), (100, 50));
    }
}
