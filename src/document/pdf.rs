//! PDF backend built on `lopdf`
//!
//! Each image becomes one page whose media box matches the image size in
//! pixels. Merging renumbers every input document into a shared object space
//! and rebuilds a single page tree.

use crate::document::backend::{BackendError, DocumentBackend};
use lopdf::content::{Content, Operation};
use image::{DynamicImage, Rgb, RgbImage, Rgba};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};
use std::path::{Path, PathBuf};
use thiserror::Error;

const PDF_VERSION: &str = "1.5";

/// Errors raised while building PDF files
#[derive(Debug, Error)]
pub enum PdfError {
    #[error("no input files given")]
    NoInput,

    #[error("failed to decode image {path}: {source}")]
    Image {
        path: String,
        source: image::ImageError,
    },

    #[error("failed to read PDF {path}: {message}")]
    Read { path: String, message: String },

    #[error("malformed PDF {path}: {message}")]
    Malformed { path: String, message: String },

    #[error("failed to write PDF {path}: {message}")]
    Write { path: String, message: String },
}

/// Backend that writes PDF files with `lopdf`
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfBackend;

impl PdfBackend {
    pub fn new() -> Self {
        Self
    }
}

impl DocumentBackend for PdfBackend {
    fn convert(&self, images: &[PathBuf], output: &Path) -> Result<(), BackendError> {
        images_to_pdf(images, output).map_err(Into::into)
    }

    fn merge(&self, parts: &[PathBuf], output: &Path) -> Result<(), BackendError> {
        merge_pdfs(parts, output).map_err(Into::into)
    }
}

/// Writes a PDF with one page per image
pub fn images_to_pdf(images: &[PathBuf], output: &Path) -> Result<(), PdfError> {
    if images.is_empty() {
        return Err(PdfError::NoInput);
    }

    let mut doc = Document::with_version(PDF_VERSION);
    let pages_id = doc.new_object_id();
    let mut kids = Vec::with_capacity(images.len());

    for path in images {
        let page_id = add_image_page(&mut doc, pages_id, path)?;
        kids.push(Object::Reference(page_id));
    }

    finish_document(&mut doc, pages_id, kids);
    save(&mut doc, output)
}

fn add_image_page(doc: &mut Document, pages_id: ObjectId, path: &Path) -> Result<ObjectId, PdfError> {
    let decoded = image::open(path).map_err(|source| PdfError::Image {
        path: path.display().to_string(),
        source,
    })?;
    let rgb = flatten_onto_white(decoded);
    let (width, height) = rgb.dimensions();
    let (width, height) = (i64::from(width), i64::from(height));

    let mut xobject = Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => width,
            "Height" => height,
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8,
        },
        rgb.into_raw(),
    );
    // Falls back to an uncompressed stream
    let _ = xobject.compress();
    let image_id = doc.add_object(xobject);

    let content = Content {
        operations: vec![
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![
                    Object::Integer(width),
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Integer(height),
                    Object::Integer(0),
                    Object::Integer(0),
                ],
            ),
            Operation::new("Do", vec![Object::Name(b"Im0".to_vec())]),
            Operation::new("Q", vec![]),
        ],
    };
    let encoded = content.encode().map_err(|e| PdfError::Write {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    let content_id = doc.add_object(Stream::new(Dictionary::new(), encoded));

    Ok(doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "MediaBox" => vec![
            Object::Integer(0),
            Object::Integer(0),
            Object::Integer(width),
            Object::Integer(height),
        ],
        "Contents" => content_id,
        "Resources" => dictionary! {
            "XObject" => dictionary! {
                "Im0" => image_id,
            },
        },
    }))
}

/// Converts a decoded page to RGB, blending any transparency over white
fn flatten_onto_white(image: DynamicImage) -> RgbImage {
    if !image.color().has_alpha() {
        return image.into_rgb8();
    }

    let rgba = image.into_rgba8();
    let (width, height) = rgba.dimensions();
    RgbImage::from_fn(width, height, |x, y| {
        let Rgba([r, g, b, a]) = *rgba.get_pixel(x, y);
        let alpha = u16::from(a);
        let blend = |c: u8| ((u16::from(c) * alpha + 255 * (255 - alpha) + 127) / 255) as u8;
        Rgb([blend(r), blend(g), blend(b)])
    })
}

/// Writes a PDF containing every page of `parts`, in order
pub fn merge_pdfs(parts: &[PathBuf], output: &Path) -> Result<(), PdfError> {
    if parts.is_empty() {
        return Err(PdfError::NoInput);
    }

    let mut merged = Document::with_version(PDF_VERSION);
    let mut next_id = 1;
    let mut loaded = Vec::with_capacity(parts.len());

    for path in parts {
        let mut doc = Document::load(path).map_err(|e| PdfError::Read {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        doc.renumber_objects_with(next_id);
        next_id = doc.max_id + 1;
        loaded.push((path, doc));
    }

    merged.max_id = next_id;
    let pages_id = merged.new_object_id();
    let mut kids = Vec::new();

    for (path, mut doc) in loaded {
        let malformed = |message: String| PdfError::Malformed {
            path: path.display().to_string(),
            message,
        };

        let catalog_id = doc
            .trailer
            .get(b"Root")
            .and_then(Object::as_reference)
            .map_err(|e| malformed(e.to_string()))?;
        let root_pages_id = doc
            .get_dictionary(catalog_id)
            .and_then(|catalog| catalog.get(b"Pages"))
            .and_then(Object::as_reference)
            .map_err(|e| malformed(e.to_string()))?;

        for page_id in doc.get_pages().into_values() {
            doc.get_object_mut(page_id)
                .and_then(Object::as_dict_mut)
                .map_err(|e| malformed(e.to_string()))?
                .set("Parent", pages_id);
            kids.push(Object::Reference(page_id));
        }

        for (id, object) in std::mem::take(&mut doc.objects) {
            if id != catalog_id && id != root_pages_id {
                merged.objects.insert(id, object);
            }
        }
    }

    finish_document(&mut merged, pages_id, kids);
    save(&mut merged, output)
}

/// Installs the page tree and catalog
fn finish_document(doc: &mut Document, pages_id: ObjectId, kids: Vec<Object>) {
    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
}

fn save(doc: &mut Document, output: &Path) -> Result<(), PdfError> {
    doc.compress();
    doc.save(output).map_err(|e| PdfError::Write {
        path: output.display().to_string(),
        message: e.to_string(),
    })?;
    Ok(())
}
