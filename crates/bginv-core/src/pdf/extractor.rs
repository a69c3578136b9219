//! PDF text and page image extraction using lopdf and pdf-extract.

use image::{DynamicImage, GrayImage, RgbImage};
use lopdf::{Dictionary, Document, Object, ObjectId};
use std::panic::{self, AssertUnwindSafe};
use tracing::{debug, trace, warn};

use super::Result;
use crate::error::PdfError;

/// A loaded PDF document.
pub struct PdfDocument {
    document: Document,
    /// Bytes handed to pdf-extract (re-serialized after decryption).
    raw_data: Vec<u8>,
}

impl PdfDocument {
    /// Parse a PDF from memory, decrypting it when it only has an empty
    /// user password.
    pub fn load(data: &[u8]) -> Result<Self> {
        let mut document = Document::load_mem(data).map_err(|e| PdfError::Parse(e.to_string()))?;

        let raw_data = if document.is_encrypted() {
            if document.decrypt("").is_err() {
                return Err(PdfError::Encrypted);
            }
            debug!("Decrypted PDF with empty password");

            let mut decrypted = Vec::new();
            document
                .save_to(&mut decrypted)
                .map_err(|e| PdfError::Parse(format!("failed to save decrypted PDF: {}", e)))?;
            decrypted
        } else {
            data.to_vec()
        };

        let page_count = document.get_pages().len();
        if page_count == 0 {
            return Err(PdfError::NoPages);
        }

        debug!("Loaded PDF with {} pages", page_count);
        Ok(Self { document, raw_data })
    }

    pub fn page_count(&self) -> u32 {
        self.document.get_pages().len() as u32
    }

    /// Text layer of each page, in page order.
    pub fn page_texts(&self) -> Result<Vec<String>> {
        // pdf-extract panics on some malformed content streams.
        let extracted = panic::catch_unwind(AssertUnwindSafe(|| {
            pdf_extract::extract_text_from_mem_by_pages(&self.raw_data)
        }))
        .map_err(|_| PdfError::TextExtraction("text extractor panicked".to_string()))?;

        extracted.map_err(|e| PdfError::TextExtraction(e.to_string()))
    }

    /// Text layer of the whole document, pages joined by newlines.
    pub fn text(&self) -> Result<String> {
        Ok(self.page_texts()?.join("\n"))
    }

    /// Decodable images placed on a page (1-indexed).
    pub fn page_images(&self, page: u32) -> Result<Vec<DynamicImage>> {
        let pages = self.document.get_pages();
        let page_id = pages.get(&page).ok_or(PdfError::InvalidPage(page))?;

        let mut images = Vec::new();
        let Some(resources) = self.page_resources(*page_id) else {
            trace!("Page {} has no resources", page);
            return Ok(images);
        };

        let Ok(xobjects) = resources.get(b"XObject") else {
            return Ok(images);
        };

        if let Ok((_, Object::Dictionary(xobjects))) = self.document.dereference(xobjects) {
            for (name, reference) in xobjects.iter() {
                let Ok((_, object)) = self.document.dereference(reference) else {
                    continue;
                };
                match self.decode_image(object) {
                    Some(img) => images.push(img),
                    None => trace!("Skipping XObject {}", String::from_utf8_lossy(name)),
                }
            }
        }

        debug!("Extracted {} images from page {}", images.len(), page);
        Ok(images)
    }

    /// Resources of a page, following `Parent` links for inherited ones.
    fn page_resources(&self, node_id: ObjectId) -> Option<Dictionary> {
        let Ok(Object::Dictionary(node)) = self.document.get_object(node_id) else {
            return None;
        };

        if let Ok(resources) = node.get(b"Resources") {
            if let Ok((_, Object::Dictionary(dict))) = self.document.dereference(resources) {
                return Some(dict.clone());
            }
        }

        match node.get(b"Parent") {
            Ok(Object::Reference(parent_id)) => self.page_resources(*parent_id),
            _ => None,
        }
    }

    fn decode_image(&self, object: &Object) -> Option<DynamicImage> {
        let Object::Stream(stream) = object else {
            return None;
        };
        let dict = &stream.dict;

        if dict.get(b"Subtype").ok()?.as_name().ok()? != b"Image" {
            return None;
        }

        let width = u32::try_from(dict.get(b"Width").ok()?.as_i64().ok()?).ok()?;
        let height = u32::try_from(dict.get(b"Height").ok()?.as_i64().ok()?).ok()?;

        let filter = dict.get(b"Filter").ok().and_then(|f| match f {
            Object::Name(name) => Some(name.as_slice()),
            Object::Array(filters) => filters.last().and_then(|o| o.as_name().ok()),
            _ => None,
        });

        match filter {
            Some(b"DCTDecode") => {
                trace!("Decoding {}x{} JPEG image", width, height);
                return image::load_from_memory_with_format(&stream.content, image::ImageFormat::Jpeg)
                    .map_err(|e| warn!("Failed to decode JPEG image: {}", e))
                    .ok();
            }
            Some(b"JPXDecode") | Some(b"CCITTFaxDecode") | Some(b"JBIG2Decode") => {
                trace!("Unsupported image filter {:?}", filter.map(String::from_utf8_lossy));
                return None;
            }
            _ => {}
        }

        let bits = dict
            .get(b"BitsPerComponent")
            .ok()
            .and_then(|o| o.as_i64().ok())
            .unwrap_or(8);
        if bits != 8 {
            trace!("Unsupported bits per component: {}", bits);
            return None;
        }

        let color_space = dict
            .get(b"ColorSpace")
            .ok()
            .and_then(|o| match o {
                Object::Name(name) => Some(name.as_slice()),
                Object::Array(arr) => arr.first().and_then(|o| o.as_name().ok()),
                Object::Reference(r) => self
                    .document
                    .get_object(*r)
                    .ok()
                    .and_then(|o| o.as_name().ok()),
                _ => None,
            })
            .unwrap_or(b"DeviceRGB");

        let data = stream
            .decompressed_content()
            .unwrap_or_else(|_| stream.content.clone());

        raw_to_image(data, width, height, color_space)
    }
}

/// Build an image from uncompressed 8-bit RGB or gray samples.
fn raw_to_image(mut data: Vec<u8>, width: u32, height: u32, color_space: &[u8]) -> Option<DynamicImage> {
    let pixels = width as usize * height as usize;

    match color_space {
        b"DeviceRGB" | b"RGB" if data.len() >= pixels * 3 => {
            data.truncate(pixels * 3);
            RgbImage::from_raw(width, height, data).map(DynamicImage::ImageRgb8)
        }
        b"DeviceGray" | b"G" if data.len() >= pixels => {
            data.truncate(pixels);
            GrayImage::from_raw(width, height, data).map(DynamicImage::ImageLuma8)
        }
        _ => {
            trace!(
                "Could not decode image: {} bytes for {}x{} {}",
                data.len(),
                width,
                height,
                String::from_utf8_lossy(color_space)
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_garbage() {
        let err = PdfDocument::load(b"not a pdf").err().unwrap();
        assert!(matches!(err, PdfError::Parse(_)));
    }

    #[test]
    fn test_raw_gray_image() {
        let img = raw_to_image(vec![200u8; 12], 4, 3, b"DeviceGray").unwrap();
        assert_eq!((img.width(), img.height()), (4, 3));
    }

    #[test]
    fn test_raw_rgb_image_too_short() {
        assert!(raw_to_image(vec![0u8; 10], 2, 2, b"DeviceRGB").is_none());
        assert!(raw_to_image(vec![0u8; 12], 2, 2, b"DeviceCMYK").is_none());
    }
}
