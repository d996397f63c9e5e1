//! Derivative-image cache: resize/crop/reformat operations, keyed
//! by source identity + operation + spec, persisted under
//! `cache_dir/image-cache/`.

pub mod spec;

use std::path::{Path, PathBuf};

use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView};
use serde::{Deserialize, Serialize};

use crate::atomic_io;
use crate::error::AssetError;
use crate::hash::{hash_str, ContentHash};
use spec::{Anchor, Format, ImageSpec};

const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Fill,
    Fit,
    Resize,
    Filter,
}

impl Operation {
    fn as_str(self) -> &'static str {
        match self {
            Operation::Fill => "fill",
            Operation::Fit => "fit",
            Operation::Resize => "resize",
            Operation::Filter => "filter",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessedImage {
    pub output_path: PathBuf,
    pub width: u32,
    pub height: u32,
    pub format_ext: String,
    pub rel_permalink: String,
}

pub struct ImageProcessorCache {
    cache_dir: PathBuf,
}

impl ImageProcessorCache {
    pub fn new(cache_root: &Path) -> Self {
        Self {
            cache_dir: cache_root.join("image-cache"),
        }
    }

    /// Resolve (or create) a processed image for `source_path` under
    /// `op`/`spec_string`. Returns `None` only if the source file can't be
    /// read or decoded.
    pub fn process(
        &self,
        source_path: &Path,
        op: Operation,
        spec_string: &str,
    ) -> Result<ProcessedImage, AssetError> {
        let spec = spec::parse(spec_string);
        let key = self.cache_key(source_path, op, spec_string)?;

        if let Some(sidecar) = self.load_sidecar(&key) {
            let image_path = self.image_path(&key, &sidecar.format_ext);
            if image_path.exists() {
                return Ok(sidecar);
            }
        }

        let bytes = std::fs::read(source_path)
            .map_err(|e| AssetError::ImageProcessing(source_path.to_path_buf(), e.to_string()))?;
        let decoded = image::load_from_memory(&bytes)
            .map_err(|e| AssetError::ImageProcessing(source_path.to_path_buf(), e.to_string()))?;

        let transformed = apply_operation(decoded, op, &spec);
        let (width, height) = transformed.dimensions();
        let format = resolve_format(&spec);
        let ext = format.extension();

        let image_path = self.image_path(&key, ext);
        let encoded = encode(&transformed, format, spec.quality)
            .map_err(|e| AssetError::ImageProcessing(source_path.to_path_buf(), e))?;
        atomic_io::write_bytes(&image_path, &encoded)
            .map_err(|e| AssetError::ImageProcessing(source_path.to_path_buf(), e.to_string()))?;

        let rel_permalink = format!(
            "/assets/image-cache/{}.{}",
            key.to_hex(),
            ext
        );
        let sidecar = ProcessedImage {
            output_path: image_path,
            width,
            height,
            format_ext: ext.to_string(),
            rel_permalink,
        };
        let sidecar_path = self.sidecar_path(&key);
        let json = serde_json::to_string_pretty(&sidecar)
            .map_err(|e| AssetError::ImageProcessing(source_path.to_path_buf(), e.to_string()))?;
        atomic_io::write_text(&sidecar_path, &json)
            .map_err(|e| AssetError::ImageProcessing(source_path.to_path_buf(), e.to_string()))?;

        Ok(sidecar)
    }

    fn cache_key(&self, source_path: &Path, op: Operation, spec_string: &str) -> Result<ContentHash, AssetError> {
        let metadata = std::fs::metadata(source_path)
            .map_err(|e| AssetError::ImageProcessing(source_path.to_path_buf(), e.to_string()))?;
        let mtime_ns = metadata
            .modified()
            .ok()
            .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        let identity = format!("{}:{}", source_path.display(), mtime_ns);
        let key_str = format!(
            "v{SCHEMA_VERSION}_{}_{}_{}",
            hash_str(&identity).to_hex(),
            op.as_str(),
            hash_str(spec_string).to_hex()
        );
        Ok(hash_str(&key_str))
    }

    fn image_path(&self, key: &ContentHash, ext: &str) -> PathBuf {
        self.cache_dir.join(format!("{}.{ext}", key.to_hex()))
    }

    fn sidecar_path(&self, key: &ContentHash) -> PathBuf {
        self.cache_dir.join(format!("{}.json", key.to_hex()))
    }

    fn load_sidecar(&self, key: &ContentHash) -> Option<ProcessedImage> {
        let contents = std::fs::read_to_string(self.sidecar_path(key)).ok()?;
        serde_json::from_str(&contents).ok()
    }
}

fn resolve_format(spec: &ImageSpec) -> Format {
    spec.format.unwrap_or(Format::Png)
}

fn encode(image: &DynamicImage, format: Format, quality: u8) -> Result<Vec<u8>, String> {
    let mut buf = std::io::Cursor::new(Vec::new());
    match format {
        Format::Png => image
            .write_to(&mut buf, image::ImageFormat::Png)
            .map_err(|e| e.to_string())?,
        Format::Jpeg => {
            let mut encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buf, quality);
            encoder.encode_image(image).map_err(|e| e.to_string())?;
        }
        Format::Gif => image
            .write_to(&mut buf, image::ImageFormat::Gif)
            .map_err(|e| e.to_string())?,
        // No bundled AVIF encoder in this crate's dependency set; fall back
        // to WebP, which covers the same "modern lossy web format" need.
        Format::Webp | Format::Avif => image
            .write_to(&mut buf, image::ImageFormat::WebP)
            .map_err(|e| e.to_string())?,
    }
    Ok(buf.into_inner())
}

fn apply_operation(image: DynamicImage, op: Operation, spec: &ImageSpec) -> DynamicImage {
    let mut result = match op {
        Operation::Fill => fill(&image, spec.width, spec.height, spec.anchor),
        Operation::Fit => fit(&image, spec.width, spec.height),
        Operation::Resize => resize(&image, spec.width, spec.height),
        Operation::Filter => image,
    };
    for filter in &spec.filters {
        result = apply_filter(result, filter);
    }
    result
}

fn fill(image: &DynamicImage, width: Option<u32>, height: Option<u32>, anchor: Anchor) -> DynamicImage {
    let (src_w, src_h) = image.dimensions();
    let (target_w, target_h) = (width.unwrap_or(src_w), height.unwrap_or(src_h));
    if target_w == 0 || target_h == 0 {
        return image.clone();
    }

    let src_ratio = src_w as f64 / src_h as f64;
    let target_ratio = target_w as f64 / target_h as f64;

    let (crop_w, crop_h) = if src_ratio > target_ratio {
        let crop_h = src_h;
        let crop_w = (src_h as f64 * target_ratio).round() as u32;
        (crop_w.min(src_w), crop_h)
    } else {
        let crop_w = src_w;
        let crop_h = (src_w as f64 / target_ratio).round() as u32;
        (crop_w, crop_h.min(src_h))
    };

    let (x, y) = anchor_offset(src_w, src_h, crop_w, crop_h, anchor);
    let cropped = image.crop_imm(x, y, crop_w, crop_h);
    cropped.resize_exact(target_w, target_h, FilterType::Lanczos3)
}

fn anchor_offset(src_w: u32, src_h: u32, crop_w: u32, crop_h: u32, anchor: Anchor) -> (u32, u32) {
    let max_x = src_w.saturating_sub(crop_w);
    let max_y = src_h.saturating_sub(crop_h);
    // `smart` anchoring falls back to center: no face-detection library is
    // part of this crate's dependency set.
    match anchor {
        Anchor::Center | Anchor::Smart => (max_x / 2, max_y / 2),
        Anchor::Top => (max_x / 2, 0),
        Anchor::Bottom => (max_x / 2, max_y),
        Anchor::Left => (0, max_y / 2),
        Anchor::Right => (max_x, max_y / 2),
        Anchor::TopLeft => (0, 0),
        Anchor::TopRight => (max_x, 0),
        Anchor::BottomLeft => (0, max_y),
        Anchor::BottomRight => (max_x, max_y),
    }
}

fn fit(image: &DynamicImage, width: Option<u32>, height: Option<u32>) -> DynamicImage {
    let (src_w, src_h) = image.dimensions();
    let target_w = width.unwrap_or(src_w);
    let target_h = height.unwrap_or(src_h);
    if target_w >= src_w && target_h >= src_h {
        return image.clone();
    }
    image.resize(target_w, target_h, FilterType::Lanczos3)
}

fn resize(image: &DynamicImage, width: Option<u32>, height: Option<u32>) -> DynamicImage {
    let (src_w, src_h) = image.dimensions();
    match (width, height) {
        (Some(w), Some(h)) => image.resize_exact(w, h, FilterType::Lanczos3),
        (Some(w), None) => {
            let h = (src_h as f64 * (w as f64 / src_w as f64)).round() as u32;
            image.resize_exact(w, h.max(1), FilterType::Lanczos3)
        }
        (None, Some(h)) => {
            let w = (src_w as f64 * (h as f64 / src_h as f64)).round() as u32;
            image.resize_exact(w.max(1), h, FilterType::Lanczos3)
        }
        (None, None) => image.clone(),
    }
}

fn apply_filter(image: DynamicImage, filter: &str) -> DynamicImage {
    if filter == "grayscale" {
        return image.grayscale();
    }
    if let Some(n) = filter.strip_prefix("blur") {
        if let Ok(sigma) = n.trim().parse::<f32>() {
            return image.blur(sigma);
        }
        return image.blur(2.0);
    }
    image
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn make_png(dir: &Path, name: &str, w: u32, h: u32) -> PathBuf {
        let img = DynamicImage::new_rgb8(w, h);
        let path = dir.join(name);
        img.save(&path).unwrap();
        path
    }

    #[test]
    fn test_process_resize_caches_on_second_call() {
        let dir = TempDir::new().unwrap();
        let src = make_png(dir.path(), "a.png", 400, 300);
        let cache = ImageProcessorCache::new(dir.path());

        let first = cache.process(&src, Operation::Resize, "200x").unwrap();
        assert_eq!(first.width, 200);

        let second = cache.process(&src, Operation::Resize, "200x").unwrap();
        assert_eq!(second.output_path, first.output_path);
    }

    #[test]
    fn test_fill_produces_exact_dimensions() {
        let dir = TempDir::new().unwrap();
        let src = make_png(dir.path(), "b.png", 400, 200);
        let cache = ImageProcessorCache::new(dir.path());

        let result = cache.process(&src, Operation::Fill, "100x100").unwrap();
        assert_eq!((result.width, result.height), (100, 100));
    }

    #[test]
    fn test_fit_never_upscales() {
        let dir = TempDir::new().unwrap();
        let src = make_png(dir.path(), "c.png", 100, 100);
        let cache = ImageProcessorCache::new(dir.path());

        let result = cache.process(&src, Operation::Fit, "500x500").unwrap();
        assert!(result.width <= 100 && result.height <= 100);
    }

    #[test]
    fn test_unreadable_source_is_an_error_not_a_panic() {
        let dir = TempDir::new().unwrap();
        let cache = ImageProcessorCache::new(dir.path());
        let missing = dir.path().join("missing.png");
        assert!(cache.process(&missing, Operation::Resize, "100x").is_err());
    }

    #[test]
    fn test_smart_anchor_falls_back_to_center() {
        assert_eq!(
            anchor_offset(400, 200, 200, 200, Anchor::Smart),
            anchor_offset(400, 200, 200, 200, Anchor::Center)
        );
    }
}
