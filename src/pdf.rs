//! Single-page PDF wrapper for compressed JPEGs.
//!
//! The JPEG bytes are embedded as-is (`DCTDecode` image XObject), so the PDF
//! costs only a few hundred bytes of structure on top of the image. The page
//! is exactly the size of the image at 1 pixel per point and the image fills
//! it edge to edge:
//!
//! ```text
//! Catalog ─► Pages ─► Page (MediaBox 0 0 w h)
//!                      ├─ Resources/XObject/Im0 ─► JPEG stream
//!                      └─ Contents: q  w 0 0 h 0 0 cm  /Im0 Do  Q
//! ```

use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, dictionary};
use serde::Serialize;
use thiserror::Error;

const PDF_VERSION: &str = "1.5";
const IMAGE_NAME: &str = "Im0";

#[derive(Error, Debug)]
pub enum PdfError {
    #[error("expected JPEG data for the page image")]
    NotJpeg,
    #[error("page must have non-zero dimensions, got {width}x{height}")]
    EmptyPage { width: u32, height: u32 },
    #[error("failed to encode page content: {0}")]
    Content(String),
    #[error("failed to write PDF: {0}")]
    Write(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Portrait,
    Landscape,
}

impl Orientation {
    /// Landscape when wider than tall. Squares are portrait.
    pub fn for_dimensions(width: u32, height: u32) -> Self {
        if width > height {
            Orientation::Landscape
        } else {
            Orientation::Portrait
        }
    }
}

/// Wrap an encoded JPEG in a one-page PDF sized to `width × height` points.
///
/// The MediaBox always matches the pixel dimensions. If `orientation`
/// disagrees with them, the page is turned a quarter with `/Rotate 90`
/// rather than stretching the image.
pub fn wrap_as_single_page_document(
    jpeg: &[u8],
    width: u32,
    height: u32,
    orientation: Orientation,
) -> Result<Vec<u8>, PdfError> {
    if !jpeg.starts_with(&[0xFF, 0xD8]) {
        return Err(PdfError::NotJpeg);
    }
    if width == 0 || height == 0 {
        return Err(PdfError::EmptyPage { width, height });
    }
    let (w, h) = (width as i64, height as i64);

    let mut doc = Document::with_version(PDF_VERSION);
    let pages_id = doc.new_object_id();

    let image_id = doc.add_object(Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => w,
            "Height" => h,
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8,
            "Filter" => "DCTDecode",
        },
        jpeg.to_vec(),
    ));

    let content = Content {
        operations: vec![
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![w.into(), 0.into(), 0.into(), h.into(), 0.into(), 0.into()],
            ),
            Operation::new("Do", vec![IMAGE_NAME.into()]),
            Operation::new("Q", vec![]),
        ],
    };
    let content_bytes = content
        .encode()
        .map_err(|e| PdfError::Content(e.to_string()))?;
    let content_id = doc.add_object(Stream::new(dictionary! {}, content_bytes));

    let mut page = dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "MediaBox" => vec![0.into(), 0.into(), w.into(), h.into()],
        "Contents" => content_id,
        "Resources" => dictionary! {
            "XObject" => dictionary! {
                IMAGE_NAME => image_id,
            },
        },
    };
    if orientation != Orientation::for_dimensions(width, height) {
        page.set("Rotate", 90i64);
    }
    let page_id = doc.add_object(page);

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    let info_id = doc.add_object(dictionary! {
        "Producer" => Object::string_literal(concat!("photo-fit ", env!("CARGO_PKG_VERSION"))),
    });
    doc.trailer.set("Root", catalog_id);
    doc.trailer.set("Info", info_id);

    let mut buf = Vec::new();
    doc.save_to(&mut buf)
        .map_err(|e| PdfError::Write(e.to_string()))?;
    Ok(buf)
}
