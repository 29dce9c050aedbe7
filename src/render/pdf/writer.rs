//! PDF object graph assembly with `lopdf`.

use super::fonts::Font;
use super::layout::{Op, Page, PlacedImage};
use crate::detect::ImageFormat;
use crate::error::{Error, Result};
use crate::render::options::RenderOptions;
use chrono::{DateTime, Utc};
use flate2::write::ZlibEncoder;
use flate2::Compression;
use image::GenericImageView;
use log::debug;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, Stream, StringFormat};
use rayon::prelude::*;
use std::io::Write;

/// Bezier control distance for a quarter circle.
const KAPPA: f32 = 0.552_284_8;

/// Document-level metadata.
#[derive(Debug, Clone)]
pub struct PdfMeta<'a> {
    /// Info dictionary `/Title`
    pub title: &'a str,
    /// Catalog `/Lang`
    pub language: &'a str,
    /// Info dictionary `/CreationDate`
    pub creation_date: Option<DateTime<Utc>>,
}

/// An image encoded as XObject streams.
struct EncodedImage {
    image: Stream,
    mask: Option<Stream>,
}

/// Serialize laid out pages into PDF bytes.
pub fn write_pdf(
    meta: &PdfMeta<'_>,
    pages: &[Page],
    images: &[PlacedImage],
    options: &RenderOptions,
) -> Result<Vec<u8>> {
    let mut document = Document::with_version("1.7");
    let pages_id = document.new_object_id();

    let mut fonts = Dictionary::new();
    for font in Font::ALL {
        let font_id = document.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => font.base_font(),
            "Encoding" => "WinAnsiEncoding",
        });
        fonts.set(font.resource_name(), font_id);
    }

    let encoded = images
        .par_iter()
        .map(encode_image)
        .collect::<Result<Vec<_>>>()?;
    let mut xobjects = Dictionary::new();
    for (i, image) in encoded.into_iter().enumerate() {
        let mut stream = image.image;
        if let Some(mask) = image.mask {
            let mask_id = document.add_object(mask);
            stream.dict.set("SMask", mask_id);
        }
        let image_id = document.add_object(stream);
        xobjects.set(image_name(i), image_id);
    }

    let resources_id = document.add_object(dictionary! {
        "Font" => fonts,
        "XObject" => xobjects,
    });

    let width = options.page_size.width;
    let height = options.page_size.height;
    let mut page_ids: Vec<Object> = Vec::with_capacity(pages.len());
    for page in pages {
        let (content, links) = page_content(page, height)?;
        let content_id = document.add_object(Stream::new(
            dictionary! { "Filter" => "FlateDecode" },
            compress(&content)?,
        ));

        let mut page_dict = dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), width.into(), height.into()],
            "Contents" => content_id,
            "Resources" => resources_id,
        };
        if !links.is_empty() {
            let annots: Vec<Object> = links
                .into_iter()
                .map(|link| document.add_object(link).into())
                .collect();
            page_dict.set("Annots", annots);
        }
        page_ids.push(document.add_object(page_dict).into());
    }

    let count = page_ids.len() as i64;
    document.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => page_ids,
            "Count" => count,
        }),
    );

    let catalog_id = document.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
        "Lang" => Object::string_literal(meta.language),
    });
    document.trailer.set("Root", catalog_id);

    let mut info = dictionary! {
        "Title" => text_string(meta.title),
        "Producer" => Object::string_literal("impress"),
    };
    if let Some(date) = meta.creation_date {
        let stamp = date.format("D:%Y%m%d%H%M%SZ").to_string();
        info.set("CreationDate", Object::string_literal(stamp));
    }
    let info_id = document.add_object(info);
    document.trailer.set("Info", info_id);

    let mut out = Vec::new();
    document.save_to(&mut out)?;
    Ok(out)
}

fn image_name(index: usize) -> String {
    format!("Im{}", index + 1)
}

/// A PDF text string: literal for ASCII, UTF-16BE with BOM otherwise.
fn text_string(text: &str) -> Object {
    if text.is_ascii() {
        return Object::string_literal(text);
    }
    let mut bytes = vec![0xFE, 0xFF];
    for unit in text.encode_utf16() {
        bytes.extend_from_slice(&unit.to_be_bytes());
    }
    Object::String(bytes, StringFormat::Hexadecimal)
}

fn compress(data: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}

/// Content stream bytes and link annotations for one page.
fn page_content(page: &Page, page_height: f32) -> Result<(Vec<u8>, Vec<Dictionary>)> {
    let mut ops = Vec::new();
    let mut links = Vec::new();
    // Layout uses a top-left origin; PDF user space starts bottom-left.
    let flip = |y: f32| page_height - y;

    for op in &page.ops {
        match op {
            Op::Text {
                x,
                baseline,
                font,
                size,
                text,
            } => {
                ops.push(Operation::new("BT", vec![]));
                ops.push(Operation::new(
                    "Tf",
                    vec![font.resource_name().into(), (*size).into()],
                ));
                ops.push(Operation::new("Td", vec![(*x).into(), flip(*baseline).into()]));
                ops.push(Operation::new("Tj", vec![Object::string_literal(text.clone())]));
                ops.push(Operation::new("ET", vec![]));
            }
            Op::Fill {
                x,
                y,
                width,
                height,
                color,
            } => {
                ops.push(Operation::new("q", vec![]));
                ops.push(fill_color(color));
                ops.push(Operation::new(
                    "re",
                    vec![
                        (*x).into(),
                        flip(y + height).into(),
                        (*width).into(),
                        (*height).into(),
                    ],
                ));
                ops.push(Operation::new("f", vec![]));
                ops.push(Operation::new("Q", vec![]));
            }
            Op::Disc {
                cx,
                cy,
                r,
                color,
                filled,
            } => {
                ops.push(Operation::new("q", vec![]));
                if *filled {
                    ops.push(fill_color(color));
                } else {
                    ops.push(Operation::new(
                        "RG",
                        vec![color[0].into(), color[1].into(), color[2].into()],
                    ));
                    ops.push(Operation::new("w", vec![0.75f32.into()]));
                }
                circle(&mut ops, *cx, flip(*cy), *r);
                ops.push(Operation::new(if *filled { "f" } else { "S" }, vec![]));
                ops.push(Operation::new("Q", vec![]));
            }
            Op::Image {
                x,
                y,
                width,
                height,
                index,
            } => {
                ops.push(Operation::new("q", vec![]));
                ops.push(Operation::new(
                    "cm",
                    vec![
                        (*width).into(),
                        0.into(),
                        0.into(),
                        (*height).into(),
                        (*x).into(),
                        flip(y + height).into(),
                    ],
                ));
                ops.push(Operation::new("Do", vec![image_name(*index).as_str().into()]));
                ops.push(Operation::new("Q", vec![]));
            }
            Op::Link {
                x,
                y,
                width,
                height,
                uri,
            } => {
                links.push(dictionary! {
                    "Type" => "Annot",
                    "Subtype" => "Link",
                    "Rect" => vec![
                        (*x).into(),
                        flip(y + height).into(),
                        (x + width).into(),
                        flip(*y).into(),
                    ],
                    "Border" => vec![0.into(), 0.into(), 0.into()],
                    "A" => dictionary! {
                        "S" => "URI",
                        "URI" => Object::string_literal(uri.as_str()),
                    },
                });
            }
        }
    }

    let content = Content { operations: ops }.encode()?;
    Ok((content, links))
}

fn fill_color(color: &[f32; 3]) -> Operation {
    Operation::new("rg", vec![color[0].into(), color[1].into(), color[2].into()])
}

fn circle(ops: &mut Vec<Operation>, cx: f32, cy: f32, r: f32) {
    let k = r * KAPPA;
    let point = |x: f32, y: f32| -> Vec<Object> { vec![x.into(), y.into()] };
    let curve = |points: [(f32, f32); 3]| -> Vec<Object> {
        points
            .iter()
            .flat_map(|&(x, y)| [x.into(), y.into()])
            .collect()
    };
    ops.push(Operation::new("m", point(cx + r, cy)));
    ops.push(Operation::new("c", curve([(cx + r, cy + k), (cx + k, cy + r), (cx, cy + r)])));
    ops.push(Operation::new("c", curve([(cx - k, cy + r), (cx - r, cy + k), (cx - r, cy)])));
    ops.push(Operation::new("c", curve([(cx - r, cy - k), (cx - k, cy - r), (cx, cy - r)])));
    ops.push(Operation::new("c", curve([(cx + k, cy - r), (cx + r, cy - k), (cx + r, cy)])));
}

/// Encode one image as an XObject: gray, RGB and CMYK JPEGs pass through,
/// anything else is decoded and written as Flate-compressed RGB with an
/// optional alpha mask.
fn encode_image(placed: &PlacedImage) -> Result<EncodedImage> {
    let data = placed.asset.data.as_slice();

    if placed.asset.format == Some(ImageFormat::Jpeg) {
        if let Some(image) = jpeg_passthrough(placed) {
            return Ok(EncodedImage { image, mask: None });
        }
        debug!("Re-encoding JPEG {} with an unsupported layout", placed.src);
    }

    let decoded =
        image::load_from_memory(data).map_err(|e| Error::resource(placed.src.as_str(), e))?;
    let (width, height) = decoded.dimensions();

    let mask = if decoded.color().has_alpha() {
        let alpha: Vec<u8> = decoded.to_rgba8().pixels().map(|p| p.0[3]).collect();
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
            compress(&alpha)?,
        ))
    } else {
        None
    };

    let rgb = decoded.to_rgb8().into_raw();
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
        compress(&rgb)?,
    );
    Ok(EncodedImage { image, mask })
}

/// A DCT-encoded XObject for a JPEG whose color layout PDF can display as is.
fn jpeg_passthrough(placed: &PlacedImage) -> Option<Stream> {
    let layout = jpeg_layout(&placed.asset.data)?;
    let color_space = match layout.components {
        1 => "DeviceGray",
        3 => "DeviceRGB",
        4 => "DeviceCMYK",
        _ => return None,
    };
    let mut dict = dictionary! {
        "Type" => "XObject",
        "Subtype" => "Image",
        "Width" => placed.pixel_width as i64,
        "Height" => placed.pixel_height as i64,
        "ColorSpace" => color_space,
        "BitsPerComponent" => 8,
        "Filter" => "DCTDecode",
    };
    // Adobe writes CMYK JPEGs with inverted components.
    if layout.components == 4 && layout.adobe {
        let decode: Vec<Object> = [1, 0, 1, 0, 1, 0, 1, 0].map(Object::Integer).to_vec();
        dict.set("Decode", decode);
    }
    Some(Stream::new(dict, placed.asset.data.to_vec()))
}

/// Frame facts read from JPEG markers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct JpegLayout {
    /// Color components in the frame header
    components: u8,
    /// An Adobe APP14 segment precedes the frame header
    adobe: bool,
}

/// Walk the marker segments up to the first frame header.
fn jpeg_layout(data: &[u8]) -> Option<JpegLayout> {
    if !data.starts_with(&[0xFF, 0xD8]) {
        return None;
    }
    let mut adobe = false;
    let mut i = 2;
    while i + 4 <= data.len() {
        if data[i] != 0xFF {
            return None;
        }
        let marker = data[i + 1];
        match marker {
            // Fill byte before a marker
            0xFF => {
                i += 1;
                continue;
            }
            // Markers without a length
            0x01 | 0xD0..=0xD8 => {
                i += 2;
                continue;
            }
            _ => {}
        }

        let length = u16::from_be_bytes([data[i + 2], data[i + 3]]) as usize;
        let body = data.get(i + 4..(i + 2 + length).max(i + 4))?;
        match marker {
            0xEE if body.starts_with(b"Adobe") => adobe = true,
            // SOF0..SOF15 except DHT, JPG and DAC
            0xC0..=0xCF if !matches!(marker, 0xC4 | 0xC8 | 0xCC) => {
                return body.get(5).map(|&components| JpegLayout { components, adobe });
            }
            0xDA | 0xD9 => return None,
            _ => {}
        }
        i += 2 + length.max(2);
    }
    None
}
