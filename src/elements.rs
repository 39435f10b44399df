//! Image assets and the format-safe embedding step.
//!
//! Upstream image URLs regularly lie about their content (a PNG served from a `.jpg` path, a
//! CDN transcode that changes the format). Decoding therefore trusts the magic bytes first, the
//! URL second, and retries with the other supported codec before giving up on an image.

use std::fmt;

use image::{DynamicImage, GenericImageView};
use log::debug;

use crate::builder::Rect;
use crate::error::CatalogueError;
use crate::resolve::first_success;

const JPEG_MAGIC: [u8; 3] = [0xFF, 0xD8, 0xFF];
const PNG_MAGIC: [u8; 4] = [0x89, 0x50, 0x4E, 0x47];
const MIN_SNIFF_LEN: usize = 4;

/// The two raster formats the page can embed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AssetFormat {
    Jpg,
    Png,
}

impl AssetFormat {
    /// The format tried when decoding with this one fails.
    pub fn other(self) -> Self {
        match self {
            AssetFormat::Jpg => AssetFormat::Png,
            AssetFormat::Png => AssetFormat::Jpg,
        }
    }

    /// Guesses the format from the URL path: `.png` means PNG, anything else JPEG.
    pub fn from_url_hint(url: &str) -> Self {
        let path = url.split(['?', '#']).next().unwrap_or_default();
        if path.to_ascii_lowercase().ends_with(".png") {
            AssetFormat::Png
        } else {
            AssetFormat::Jpg
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AssetFormat::Jpg => "jpg",
            AssetFormat::Png => "png",
        }
    }

    fn codec(self) -> image::ImageFormat {
        match self {
            AssetFormat::Jpg => image::ImageFormat::Jpeg,
            AssetFormat::Png => image::ImageFormat::Png,
        }
    }
}

/// Identifies JPEG and PNG data by their leading bytes.
///
/// Buffers shorter than four bytes, or with any other signature, are inconclusive.
pub fn sniff_format(bytes: &[u8]) -> Option<AssetFormat> {
    if bytes.len() < MIN_SNIFF_LEN {
        return None;
    }
    if bytes.starts_with(&JPEG_MAGIC) {
        Some(AssetFormat::Jpg)
    } else if bytes.starts_with(&PNG_MAGIC) {
        Some(AssetFormat::Png)
    } else {
        None
    }
}

/// Raw bytes of a fetched image together with the format suggested by its URL.
#[derive(Clone, Debug)]
pub struct ImageAsset {
    source: String,
    bytes: Vec<u8>,
    hint: AssetFormat,
}

impl ImageAsset {
    pub fn new(source: impl Into<String>, bytes: Vec<u8>) -> Self {
        let source = source.into();
        let hint = AssetFormat::from_url_hint(&source);
        Self {
            source,
            bytes,
            hint,
        }
    }

    /// The sniffed format, falling back to the URL hint when the bytes are inconclusive.
    pub fn format(&self) -> AssetFormat {
        sniff_format(&self.bytes).unwrap_or(self.hint)
    }

    /// Decodes the asset, retrying once with the other format.
    pub fn embed(&self) -> Result<EmbeddedImage, CatalogueError> {
        let detected = self.format();
        first_success([detected, detected.other()], |format| {
            image::load_from_memory_with_format(&self.bytes, format.codec())
                .map(|decoded| {
                    debug!("decoded {} as {}", self.source, format.as_str());
                    EmbeddedImage::from_dynamic(decoded)
                })
                .map_err(|err| format!("{}: {err}", format.as_str()))
        })
        .map_err(|errors| {
            CatalogueError::AssetUnavailable(format!(
                "could not decode {} ({})",
                self.source,
                errors.join("; ")
            ))
        })
    }
}

/// Largest pixel width kept for an embedded image: twice the widest panel on the page.
pub const MAX_EMBED_WIDTH: u32 = 1022;
/// Largest pixel height kept for an embedded image: twice the tallest panel on the page.
pub const MAX_EMBED_HEIGHT: u32 = 368;

/// A decoded image converted to 8-bit RGB, ready to be placed on the page.
#[derive(Clone)]
pub struct EmbeddedImage {
    pixels: DynamicImage,
    width: u32,
    height: u32,
}

impl EmbeddedImage {
    /// Converts `image` to RGB, shrinking it to at most [`MAX_EMBED_WIDTH`] x
    /// [`MAX_EMBED_HEIGHT`] pixels with its aspect ratio kept.
    pub fn from_dynamic(image: DynamicImage) -> Self {
        let (width, height) = image.dimensions();
        let image = if width > MAX_EMBED_WIDTH || height > MAX_EMBED_HEIGHT {
            image.thumbnail(MAX_EMBED_WIDTH, MAX_EMBED_HEIGHT)
        } else {
            image
        };
        let pixels = DynamicImage::ImageRgb8(image.to_rgb8());
        let (width, height) = pixels.dimensions();
        Self {
            pixels,
            width,
            height,
        }
    }

    /// Pixel width and height.
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn pixels(&self) -> &DynamicImage {
        &self.pixels
    }
}

impl fmt::Debug for EmbeddedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmbeddedImage")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish()
    }
}

/// Scales a `width` x `height` image uniformly to fit `panel` and centers it.
///
/// Returns `None` for degenerate images.
pub fn fit_within(width: u32, height: u32, panel: Rect) -> Option<Rect> {
    if width == 0 || height == 0 {
        return None;
    }
    let (width, height) = (f64::from(width), f64::from(height));
    let scale = (panel.width / width).min(panel.height / height);
    let fitted_width = width * scale;
    let fitted_height = height * scale;
    Some(Rect::new(
        panel.x + (panel.width - fitted_width) / 2.0,
        panel.y + (panel.height - fitted_height) / 2.0,
        fitted_width,
        fitted_height,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, ImageOutputFormat, Rgb};

    fn encoded(format: ImageOutputFormat) -> Vec<u8> {
        let image = DynamicImage::ImageRgb8(ImageBuffer::from_pixel(8, 4, Rgb([200u8, 40, 40])));
        let mut bytes = Vec::new();
        image.write_to(&mut bytes, format).expect("encode test image");
        bytes
    }

    #[test]
    fn sniffing_needs_four_bytes() {
        assert_eq!(sniff_format(&[0xFF, 0xD8, 0xFF, 0xE0]), Some(AssetFormat::Jpg));
        assert_eq!(sniff_format(&[0x89, 0x50, 0x4E, 0x47, 0x0D]), Some(AssetFormat::Png));
        assert_eq!(sniff_format(&[0xFF, 0xD8, 0xFF]), None);
        assert_eq!(sniff_format(b"GIF89a"), None);
        assert_eq!(sniff_format(&[]), None);
    }

    #[test]
    fn url_hint_ignores_query_and_case() {
        assert_eq!(AssetFormat::from_url_hint("https://x/a.PNG?v=2"), AssetFormat::Png);
        assert_eq!(AssetFormat::from_url_hint("https://x/a.jpeg"), AssetFormat::Jpg);
        assert_eq!(AssetFormat::from_url_hint("https://x/a"), AssetFormat::Jpg);
        assert_eq!(AssetFormat::Png.other(), AssetFormat::Jpg);
    }

    #[test]
    fn inconclusive_bytes_use_the_hint() {
        let asset = ImageAsset::new("https://x/logo.png", b"RIFF....".to_vec());
        assert_eq!(asset.format(), AssetFormat::Png);
        let asset = ImageAsset::new("https://x/logo", b"xx".to_vec());
        assert_eq!(asset.format(), AssetFormat::Jpg);
    }

    #[test]
    fn large_images_are_shrunk_to_the_embed_bounds() {
        let embedded = EmbeddedImage::from_dynamic(DynamicImage::new_rgb8(1600, 1200));
        let (width, height) = embedded.dimensions();
        assert!(width <= MAX_EMBED_WIDTH && height <= MAX_EMBED_HEIGHT);
        assert_eq!(height, MAX_EMBED_HEIGHT);
        assert!((f64::from(width) / f64::from(height) - 4.0 / 3.0).abs() < 0.01);
        assert_eq!(embedded.pixels().dimensions(), (width, height));

        let small = EmbeddedImage::from_dynamic(DynamicImage::new_rgb8(8, 4));
        assert_eq!(small.dimensions(), (8, 4));
    }

    #[test]
    fn png_behind_a_jpg_url_still_embeds() {
        let asset = ImageAsset::new("https://x/photo.jpg", encoded(ImageOutputFormat::Png));
        assert_eq!(asset.format(), AssetFormat::Png);
        let embedded = asset.embed().expect("embed png");
        assert_eq!(embedded.dimensions(), (8, 4));
    }

    #[test]
    fn jpeg_decodes_and_broken_signature_fails_both_codecs() {
        let asset = ImageAsset::new("https://x/photo.png", encoded(ImageOutputFormat::Jpeg(90)));
        assert_eq!(asset.format(), AssetFormat::Jpg);
        assert!(asset.embed().is_ok());

        let mut bytes = encoded(ImageOutputFormat::Jpeg(90));
        bytes[0] = 0x00;
        let asset = ImageAsset::new("https://x/photo.png", bytes);
        assert_eq!(asset.format(), AssetFormat::Png);
        let err = asset.embed().expect_err("neither codec accepts the data");
        assert!(err.to_string().contains("png"));
        assert!(err.to_string().contains("jpg"));
    }

    #[test]
    fn garbage_is_unavailable() {
        let asset = ImageAsset::new("https://x/broken.jpg", vec![0xFF, 0xD8, 0xFF, 0x00, 0x01]);
        let err = asset.embed().expect_err("garbage must not decode");
        assert!(matches!(err, CatalogueError::AssetUnavailable(_)));
    }

    #[test]
    fn fitting_preserves_aspect_and_centers() {
        let panel = Rect::new(0.0, 0.0, 100.0, 100.0);
        let fitted = fit_within(200, 100, panel).expect("fit");
        assert_eq!(fitted, Rect::new(0.0, 25.0, 100.0, 50.0));
        assert!(panel.contains(&fitted));

        let fitted = fit_within(10, 40, panel).expect("fit");
        assert_eq!(fitted, Rect::new(37.5, 0.0, 25.0, 100.0));
        assert!(fit_within(0, 5, panel).is_none());
    }
}
