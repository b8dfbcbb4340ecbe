use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, StringFormat, dictionary};

const PDF_VERSION: &str = "1.5";
const IMAGE_NAME: &str = "Im0";

const SOI: [u8; 2] = [0xFF, 0xD8];
const APP14: u8 = 0xEE;
const SOS: u8 = 0xDA;
const EOI: u8 = 0xD9;

/// Colour space of an embedded JPEG, as PDF names it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorSpace {
    DeviceGray,
    DeviceRgb,
    DeviceCmyk,
}
impl ColorSpace {
    fn from_components(components: u8) -> Option<Self> {
        match components {
            1 => Some(Self::DeviceGray),
            3 => Some(Self::DeviceRgb),
            4 => Some(Self::DeviceCmyk),
            _ => None,
        }
    }

    fn as_name(&self) -> &'static str {
        match self {
            Self::DeviceGray => "DeviceGray",
            Self::DeviceRgb => "DeviceRGB",
            Self::DeviceCmyk => "DeviceCMYK",
        }
    }
}

/// What the JPEG header says about an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JpegInfo {
    pub width: u32,
    pub height: u32,
    pub color_space: ColorSpace,
    /// Adobe writes CMYK JPEGs with every channel inverted.
    pub inverted: bool,
}

/// Read the JPEG header of `bytes` without decoding the scan data.
///
/// The frame header gives the size and the number of colour components;
/// an Adobe `APP14` segment before it marks inverted CMYK.
pub fn read_jpeg_info(bytes: &[u8]) -> Result<JpegInfo> {
    if !bytes.starts_with(&SOI) {
        exn::bail!(ErrorKind::Decode);
    }
    let mut adobe = false;
    let mut i = SOI.len();
    loop {
        if bytes.get(i) != Some(&0xFF) {
            exn::bail!(ErrorKind::Decode);
        }
        // Fill bytes may pad any marker.
        while bytes.get(i) == Some(&0xFF) {
            i += 1;
        }
        // No frame header before the scan data or the end of the image.
        let Some(&marker) = bytes.get(i).filter(|&&marker| marker != SOS && marker != EOI) else {
            exn::bail!(ErrorKind::Decode);
        };
        let Some(&[hi, lo]) = bytes.get(i + 1..i + 3) else {
            exn::bail!(ErrorKind::Decode);
        };
        let length = usize::from(u16::from_be_bytes([hi, lo]));
        let Some(segment) = bytes.get(i + 3..i + 1 + length).filter(|_| length >= 2) else {
            exn::bail!(ErrorKind::Decode);
        };
        if marker == APP14 && segment.starts_with(b"Adobe") {
            adobe = true;
        }
        if is_frame_marker(marker) {
            return frame_info(segment, adobe);
        }
        i += 1 + length;
    }
}

/// Start-of-frame markers; `C4`, `C8` and `CC` share the range but are not
/// frame headers.
fn is_frame_marker(marker: u8) -> bool {
    matches!(marker, 0xC0..=0xCF) && !matches!(marker, 0xC4 | 0xC8 | 0xCC)
}

/// Frame header: precision, height, width, then the component count.
fn frame_info(segment: &[u8], adobe: bool) -> Result<JpegInfo> {
    let &[_, h0, h1, w0, w1, components, ..] = segment else {
        exn::bail!(ErrorKind::Decode);
    };
    let height = u32::from(u16::from_be_bytes([h0, h1]));
    let width = u32::from(u16::from_be_bytes([w0, w1]));
    let Some(color_space) = ColorSpace::from_components(components) else {
        exn::bail!(ErrorKind::Decode);
    };
    if width == 0 || height == 0 {
        exn::bail!(ErrorKind::Decode);
    }
    let inverted = adobe && color_space == ColorSpace::DeviceCmyk;
    Ok(JpegInfo { width, height, color_space, inverted })
}

/// Append-only PDF of full-page JPEG images.
///
/// Each page is exactly as large as its image (one PDF unit per pixel) and
/// the JPEG stream is embedded untouched with the `DCTDecode` filter.
pub struct PdfBuilder {
    doc: Document,
    pages_id: ObjectId,
    kids: Vec<Object>,
}

impl Default for PdfBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl PdfBuilder {
    pub fn new() -> Self {
        let mut doc = Document::with_version(PDF_VERSION);
        let pages_id = doc.new_object_id();
        Self { doc, pages_id, kids: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.kids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kids.is_empty()
    }

    /// Add `jpeg` as a new last page.
    pub fn push_jpeg(&mut self, jpeg: Vec<u8>, info: JpegInfo) {
        let (width, height) = (i64::from(info.width), i64::from(info.height));
        let mut image = dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => width,
            "Height" => height,
            "ColorSpace" => info.color_space.as_name(),
            "BitsPerComponent" => 8,
            "Filter" => "DCTDecode",
        };
        if info.inverted {
            image.set("Decode", Object::Array([1, 0, 1, 0, 1, 0, 1, 0].into_iter().map(Object::Integer).collect()));
        }
        // Already compressed; deflating it again gains nothing.
        let image_id = self.doc.add_object(Stream::new(image, jpeg).with_compression(false));

        // Scale the unit square to the page and paint the image over it.
        let content = format!("q {width} 0 0 {height} 0 0 cm /{IMAGE_NAME} Do Q");
        let content_id = self.doc.add_object(Stream::new(Dictionary::new(), content.into_bytes()));

        let page_id = self.doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => self.pages_id,
            "MediaBox" => vec![0.into(), 0.into(), width.into(), height.into()],
            "Contents" => content_id,
            "Resources" => dictionary! {
                "XObject" => dictionary! {
                    IMAGE_NAME => image_id,
                },
            },
        });
        self.kids.push(page_id.into());
    }

    /// Close the page tree and serialize the document, with `title` recorded
    /// in the document information dictionary.
    pub fn finish(mut self, title: &str) -> Result<Vec<u8>> {
        let count = self.kids.len() as i64;
        self.doc.objects.insert(
            self.pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => self.kids,
                "Count" => count,
            }),
        );
        let catalog_id = self.doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => self.pages_id,
        });
        let info_id = self.doc.add_object(dictionary! {
            "Title" => text_string(title),
            "Producer" => Object::string_literal(concat!("digivat ", env!("CARGO_PKG_VERSION"))),
        });
        self.doc.trailer.set("Root", catalog_id);
        self.doc.trailer.set("Info", info_id);

        let mut bytes = Vec::new();
        self.doc.save_to(&mut bytes).or_raise(|| ErrorKind::Serialize)?;
        Ok(bytes)
    }
}

/// PDF text string: a literal for ASCII, otherwise UTF-16BE with a byte
/// order mark.
fn text_string(text: &str) -> Object {
    if text.is_ascii() {
        return Object::string_literal(text);
    }
    let mut bytes = vec![0xFE, 0xFF];
    bytes.extend(text.encode_utf16().flat_map(u16::to_be_bytes));
    Object::String(bytes, StringFormat::Hexadecimal)
}
