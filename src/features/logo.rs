//! The raster logo waiting to be placed, and its conversion into a PDF image XObject.

use std::io::Write;

use flate2::write::ZlibEncoder;
use flate2::Compression;
use image::ImageFormat;
use lopdf::{dictionary, Document, Object, ObjectId, Stream};

use crate::error::{Result, StampError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogoFormat {
    Png,
    Jpeg,
}

impl LogoFormat {
    pub fn from_mime(mime: &str) -> Option<Self> {
        match mime.trim().to_ascii_lowercase().as_str() {
            "image/png" => Some(LogoFormat::Png),
            "image/jpeg" | "image/jpg" | "image/pjpeg" => Some(LogoFormat::Jpeg),
            _ => None,
        }
    }

    pub fn mime(&self) -> &'static str {
        match self {
            LogoFormat::Png => "image/png",
            LogoFormat::Jpeg => "image/jpeg",
        }
    }
}

/// Logo bytes whose format has been checked against their content.
#[derive(Debug, Clone, PartialEq)]
pub struct LogoAsset {
    bytes: Vec<u8>,
    format: LogoFormat,
}

impl LogoAsset {
    /// Validate `bytes` against the mime type the host reported for the file.
    ///
    /// An empty declared type defers to the sniffed one. A declared type other
    /// than PNG or JPEG is rejected even when the bytes would embed.
    pub fn new(bytes: Vec<u8>, declared_mime: Option<&str>) -> Result<Self> {
        let sniffed = infer::get(&bytes).map(|kind| kind.mime_type());
        let sniffed_format = sniffed.and_then(LogoFormat::from_mime);
        let declared = declared_mime.map(str::trim).filter(|m| !m.is_empty());

        let format = match (declared, sniffed_format) {
            (Some(mime), sniffed_format) => {
                let declared_format = LogoFormat::from_mime(mime)
                    .ok_or_else(|| StampError::UnsupportedFormat(mime.to_string()))?;
                match sniffed_format {
                    Some(actual) if actual != declared_format => {
                        log::warn!(
                            "Logo declared as {} but content is {}, using content",
                            mime,
                            actual.mime()
                        );
                        actual
                    }
                    Some(actual) => actual,
                    None => {
                        return Err(StampError::UnsupportedFormat(
                            sniffed.unwrap_or("unknown").to_string(),
                        ))
                    }
                }
            }
            (None, Some(actual)) => actual,
            (None, None) => {
                return Err(StampError::UnsupportedFormat(
                    sniffed.unwrap_or("unknown").to_string(),
                ))
            }
        };

        Ok(Self { bytes, format })
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn format(&self) -> LogoFormat {
        self.format
    }
}

/// Image XObject ready to be inserted into a document.
#[derive(Debug)]
pub struct ImageXObject {
    pub width: u32,
    pub height: u32,
    image: Stream,
    soft_mask: Option<Stream>,
}

impl ImageXObject {
    pub fn from_bytes(format: LogoFormat, bytes: &[u8]) -> Result<Self> {
        match format {
            LogoFormat::Png => Self::from_png(bytes),
            LogoFormat::Jpeg => Self::from_jpeg(bytes),
        }
    }

    /// Decode a PNG and re-encode its samples with FlateDecode.
    fn from_png(bytes: &[u8]) -> Result<Self> {
        let img = image::load_from_memory_with_format(bytes, ImageFormat::Png)
            .map_err(|e| StampError::UnsupportedFormat(format!("png_decode_failed:{e}")))?
            .to_rgba8();
        let (width, height) = img.dimensions();
        let mut rgb = Vec::with_capacity((width * height * 3) as usize);
        let mut alpha = Vec::with_capacity((width * height) as usize);
        for pixel in img.pixels() {
            rgb.push(pixel[0]);
            rgb.push(pixel[1]);
            rgb.push(pixel[2]);
            alpha.push(pixel[3]);
        }

        let soft_mask = if alpha.iter().any(|a| *a != u8::MAX) {
            Some(Stream::new(
                dictionary! {
                    "Type" => "XObject",
                    "Subtype" => "Image",
                    "Width" => width as i64,
                    "Height" => height as i64,
                    "ColorSpace" => "DeviceGray",
                    "BitsPerComponent" => 8,
                    "Filter" => "FlateDecode",
                },
                deflate(&alpha)?,
            ))
        } else {
            None
        };

        let image = Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => width as i64,
                "Height" => height as i64,
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8,
                "Filter" => "FlateDecode",
            },
            deflate(&rgb)?,
        );

        Ok(Self {
            width,
            height,
            image,
            soft_mask,
        })
    }

    /// JPEG data is embedded as-is; only the frame header is read.
    fn from_jpeg(bytes: &[u8]) -> Result<Self> {
        let frame = read_jpeg_frame(bytes)?;
        let mut dict = dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => frame.width as i64,
            "Height" => frame.height as i64,
            "BitsPerComponent" => frame.precision as i64,
            "Filter" => "DCTDecode",
        };
        match frame.components {
            1 => {
                dict.set("ColorSpace", "DeviceGray");
            }
            3 => {
                dict.set("ColorSpace", "DeviceRGB");
            }
            4 => {
                dict.set("ColorSpace", "DeviceCMYK");
                dict.set(
                    "Decode",
                    Object::Array([1, 0, 1, 0, 1, 0, 1, 0].map(Object::Integer).to_vec()),
                );
            }
            other => {
                return Err(StampError::UnsupportedFormat(format!(
                    "jpeg_components:{other}"
                )))
            }
        }

        Ok(Self {
            width: frame.width,
            height: frame.height,
            // Compressed data must not be re-flated on save.
            image: Stream::new(dict, bytes.to_vec()).with_compression(false),
            soft_mask: None,
        })
    }

    /// Add the image (and its soft mask) to `doc`, returning the image object id.
    pub fn insert_into(self, doc: &mut Document) -> ObjectId {
        let mut image = self.image;
        if let Some(mask) = self.soft_mask {
            let mask_id = doc.add_object(mask.with_compression(false));
            image.dict.set("SMask", mask_id);
        }
        doc.add_object(image.with_compression(false))
    }
}

fn deflate(data: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct JpegFrame {
    width: u32,
    height: u32,
    components: u8,
    precision: u8,
}

/// Walk the marker segments up to the first start-of-frame.
fn read_jpeg_frame(data: &[u8]) -> Result<JpegFrame> {
    let invalid = || StampError::UnsupportedFormat("jpeg_header_invalid".into());
    if data.len() < 4 || data[0] != 0xFF || data[1] != 0xD8 {
        return Err(invalid());
    }
    let mut i = 2;
    while i + 4 <= data.len() {
        if data[i] != 0xFF {
            return Err(invalid());
        }
        let marker = data[i + 1];
        // Fill bytes and standalone markers carry no length.
        if marker == 0xFF {
            i += 1;
            continue;
        }
        if marker == 0x01 || (0xD0..=0xD7).contains(&marker) {
            i += 2;
            continue;
        }
        let length = u16::from_be_bytes([data[i + 2], data[i + 3]]) as usize;
        if length < 2 {
            return Err(invalid());
        }
        let is_frame = (0xC0..=0xCF).contains(&marker) && !matches!(marker, 0xC4 | 0xC8 | 0xCC);
        if is_frame {
            if i + 10 > data.len() {
                return Err(invalid());
            }
            let precision = data[i + 4];
            let height = u16::from_be_bytes([data[i + 5], data[i + 6]]) as u32;
            let width = u16::from_be_bytes([data[i + 7], data[i + 8]]) as u32;
            let components = data[i + 9];
            if width == 0 || height == 0 {
                return Err(invalid());
            }
            return Ok(JpegFrame {
                width,
                height,
                components,
                precision,
            });
        }
        i += 2 + length;
    }
    Err(invalid())
}
