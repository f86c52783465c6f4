//! QR code generation.
//!
//! The symbol is laid out by `qrcode`, emitted as SVG, then rasterized to PNG
//! with resvg so the image is a plain bitmap any scanner or printer accepts.

use qrcode::render::svg;
use qrcode::types::QrError;
use qrcode::{EcLevel, QrCode};

use crate::error::EncodingError;
use crate::locator::Encoding;

/// Error correction level used for card symbols.
pub const EC_LEVEL: EcLevel = EcLevel::M;

/// Byte-mode capacity of a version 40 symbol at [`EC_LEVEL`].
pub const MAX_PAYLOAD_LEN: usize = 2331;

/// Pixels per QR module in the rendered image.
const MODULE_PX: u32 = 8;

/// Encode `url` as a QR symbol and return it as PNG bytes.
pub fn encode_qr(url: &str) -> Result<Vec<u8>, EncodingError> {
    let code = QrCode::with_error_correction_level(url.as_bytes(), EC_LEVEL).map_err(|e| {
        match e {
            QrError::DataTooLong => EncodingError::CapacityExceeded {
                encoding: Encoding::Qr,
                len: url.len(),
                max: MAX_PAYLOAD_LEN,
            },
            other => EncodingError::Qr(format!("{other:?}")),
        }
    })?;

    let svg_doc = code
        .render::<svg::Color<'_>>()
        .module_dimensions(MODULE_PX, MODULE_PX)
        .dark_color(svg::Color("#000000"))
        .light_color(svg::Color("#ffffff"))
        .build();

    rasterize(&svg_doc)
}

/// Render an SVG document into a PNG of its intrinsic size.
fn rasterize(svg_doc: &str) -> Result<Vec<u8>, EncodingError> {
    let options = resvg::usvg::Options::default();
    let tree = resvg::usvg::Tree::from_str(svg_doc, &options)
        .map_err(|e| EncodingError::Image(format!("SVG parse error: {e}")))?;

    let size = tree.size().to_int_size();
    let mut pixmap = resvg::tiny_skia::Pixmap::new(size.width(), size.height())
        .ok_or_else(|| EncodingError::Image("failed to create pixmap".to_string()))?;

    resvg::render(&tree, resvg::tiny_skia::Transform::default(), &mut pixmap.as_mut());

    pixmap
        .encode_png()
        .map_err(|e| EncodingError::Image(format!("PNG encode error: {e}")))
}
