//! SVG rasterization.

use crate::error::{Error, Result};
use resvg::{tiny_skia, usvg};
use log::debug;
use std::io::Cursor;

/// Longest side of a rasterized SVG, in pixels.
pub const MAX_RASTER_SIDE: u32 = 4096;

const SVG_DATA_PREFIX: &str = "data:image/svg+xml";

/// Whether a source URL names an SVG file.
///
/// The check looks at the path only: query and fragment are ignored and
/// the comparison is case-insensitive. `data:image/svg+xml` URIs count too.
pub fn is_svg_source(src: &str) -> bool {
    if src
        .get(..SVG_DATA_PREFIX.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(SVG_DATA_PREFIX))
    {
        return true;
    }
    let end = src.find(['?', '#']).unwrap_or(src.len());
    src[..end].to_ascii_lowercase().ends_with(".svg")
}

/// Rasterize SVG bytes into a PNG at the SVG's intrinsic size.
///
/// Canvases with a side longer than [`MAX_RASTER_SIDE`] are scaled down to
/// fit, keeping the aspect ratio.
pub fn rasterize_svg(url: &str, data: &[u8]) -> Result<Vec<u8>> {
    let tree = usvg::Tree::from_data(data, &usvg::Options::default())
        .map_err(|e| Error::resource(url, format!("invalid SVG: {}", e)))?;

    let (width, height, scale) = raster_size(tree.size().width(), tree.size().height())
        .ok_or_else(|| Error::resource(url, "SVG has an empty canvas"))?;
    if scale < 1.0 {
        debug!("Scaling {} down to {}x{} pixels", url, width, height);
    }
    let mut pixmap = tiny_skia::Pixmap::new(width, height)
        .ok_or_else(|| Error::resource(url, "SVG has an empty canvas"))?;
    resvg::render(
        &tree,
        tiny_skia::Transform::from_scale(scale, scale),
        &mut pixmap.as_mut(),
    );

    // tiny-skia stores premultiplied alpha; PNG wants straight alpha.
    let mut rgba = Vec::with_capacity(pixmap.pixels().len() * 4);
    for pixel in pixmap.pixels() {
        let color = pixel.demultiply();
        rgba.extend_from_slice(&[color.red(), color.green(), color.blue(), color.alpha()]);
    }
    let image = image::RgbaImage::from_raw(width, height, rgba)
        .ok_or_else(|| Error::internal("pixmap size does not match its buffer"))?;

    let mut png = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)
        .map_err(|e| Error::resource(url, e))?;
    Ok(png)
}

/// Pixel size and scale factor for a canvas of `width` by `height` units.
fn raster_size(width: f32, height: f32) -> Option<(u32, u32, f32)> {
    if !(width.is_finite() && height.is_finite()) || width <= 0.0 || height <= 0.0 {
        return None;
    }
    let max = MAX_RASTER_SIDE as f32;
    let scale = (max / width).min(max / height).min(1.0);
    let pixels = |side: f32| ((side * scale).round() as u32).clamp(1, MAX_RASTER_SIDE);
    Some((pixels(width), pixels(height), scale))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::{detect_format_from_bytes, ImageFormat};

    const SQUARE: &[u8] = br##"<svg xmlns="http://www.w3.org/2000/svg" width="4" height="3">
        <rect width="4" height="3" fill="#ff0000"/>
    </svg>"##;

    #[test]
    fn test_is_svg_source() {
        assert!(is_svg_source("https://example.com/logo.svg"));
        assert!(is_svg_source("https://example.com/logo.SVG?v=2"));
        assert!(is_svg_source("logo.svg#layer"));
        assert!(!is_svg_source("https://example.com/logo.png"));
        assert!(!is_svg_source("https://example.com/?file=logo.svg"));
        assert!(is_svg_source("data:image/SVG+xml;base64,PHN2Zy8+"));
        assert!(!is_svg_source("data:image/png;base64,iVBORw0KGgo="));
    }

    #[test]
    fn test_raster_size_is_capped() {
        let pixels = |w, h| raster_size(w, h).map(|(w, h, _)| (w, h));
        assert_eq!(raster_size(4.0, 3.0), Some((4, 3, 1.0)));
        assert_eq!(pixels(100_000.0, 50_000.0), Some((4096, 2048)));
        assert_eq!(pixels(0.4, 10.0), Some((1, 10)));
        assert_eq!(raster_size(0.0, 10.0), None);
    }

    #[test]
    fn test_huge_svg_is_scaled_down() {
        let svg = br##"<svg xmlns="http://www.w3.org/2000/svg" width="100000" height="25000">
            <rect width="100000" height="25000" fill="#00ff00"/>
        </svg>"##;
        let png = rasterize_svg("huge.svg", svg).unwrap();
        let decoded = image::load_from_memory(&png).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (4096, 1024));
    }

    #[test]
    fn test_rasterize_svg() {
        let png = rasterize_svg("square.svg", SQUARE).unwrap();
        assert_eq!(detect_format_from_bytes(&png), Some(ImageFormat::Png));
        let decoded = image::load_from_memory(&png).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (4, 3));
    }

    #[test]
    fn test_rasterize_invalid_svg() {
        let err = rasterize_svg("bad.svg", b"not svg").unwrap_err();
        assert!(matches!(err, Error::Resource { ref url, .. } if url == "bad.svg"));
    }
}
