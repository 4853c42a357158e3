//! Fixture documents and images built in memory for unit tests.

use std::io::Cursor;

use image::{DynamicImage, GrayImage, ImageOutputFormat, Luma, Rgb, RgbImage, Rgba, RgbaImage};
use lopdf::{dictionary, Document, Object, Stream};

/// A PDF with `page_count` pages sharing one inherited Resources dictionary
/// (holding a `/Stamp` form XObject) and a US Letter MediaBox on the page tree.
/// The second page, when present, overrides the MediaBox with an offset A5 box.
pub fn sample_pdf(page_count: usize) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let stamp_id = doc.add_object(Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Form",
            "BBox" => vec![0.into(), 0.into(), 10.into(), 10.into()],
        },
        b"0 0 10 10 re f\n".to_vec(),
    ));
    let resources_id = doc.add_object(dictionary! {
        "XObject" => dictionary! {
            "Stamp" => stamp_id,
        },
    });

    let mut kids: Vec<Object> = Vec::with_capacity(page_count);
    for i in 0..page_count {
        let content = format!("0 0 m {} {} l S\n/Stamp Do\n", 100 + i * 10, 200 + i * 10);
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.into_bytes()));
        let mut page = dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        };
        if i == 1 {
            page.set(
                "MediaBox",
                vec![10.into(), 20.into(), 430.into(), 615.into()],
            );
        }
        kids.push(doc.add_object(page).into());
    }

    let pages = dictionary! {
        "Type" => "Pages",
        "Kids" => kids,
        "Count" => page_count as i64,
        "Resources" => resources_id,
        "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages));
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).expect("fixture pdf should serialize");
    buffer
}

pub fn opaque_png(width: u32, height: u32) -> Vec<u8> {
    let img = RgbaImage::from_fn(width, height, |x, y| {
        Rgba([(x * 40) as u8, (y * 40) as u8, 128, 255])
    });
    encode(DynamicImage::ImageRgba8(img), ImageOutputFormat::Png)
}

pub fn translucent_png(width: u32, height: u32) -> Vec<u8> {
    let img = RgbaImage::from_fn(width, height, |x, y| {
        let alpha = if (x + y) % 2 == 0 { 255 } else { 64 };
        Rgba([200, 30, 30, alpha])
    });
    encode(DynamicImage::ImageRgba8(img), ImageOutputFormat::Png)
}

pub fn rgb_jpeg(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| Rgb([(x * 20) as u8, 90, (y * 20) as u8]));
    encode(DynamicImage::ImageRgb8(img), ImageOutputFormat::Jpeg(90))
}

pub fn gray_jpeg(width: u32, height: u32) -> Vec<u8> {
    let img = GrayImage::from_fn(width, height, |x, _| Luma([(x * 30) as u8]));
    encode(DynamicImage::ImageLuma8(img), ImageOutputFormat::Jpeg(90))
}

fn encode(img: DynamicImage, format: ImageOutputFormat) -> Vec<u8> {
    let mut bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut bytes), format)
        .expect("fixture image should encode");
    bytes
}
