//! Load-mutate-serialize transactions on PDF bytes.
//!
//! Every edit starts from a fresh parse of the bytes it is given and ends with a
//! full re-serialization; no `Document` outlives a single edit.

use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};

use super::geometry::{PageSize, PdfRect};
use super::logo::{ImageXObject, LogoFormat};
use crate::error::{Result, StampError};

/// Deepest `/Parent` chain followed before the page tree is considered cyclic.
const MAX_TREE_DEPTH: usize = 64;

/// Used when neither the page nor its ancestors carry a MediaBox.
const FALLBACK_PAGE: PageBox = PageBox {
    x0: 0.0,
    y0: 0.0,
    width: 612.0,
    height: 792.0,
};

/// A page's MediaBox: lower-left corner and extent in points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageBox {
    pub x0: f64,
    pub y0: f64,
    pub width: f64,
    pub height: f64,
}

impl PageBox {
    pub fn size(&self) -> PageSize {
        PageSize {
            width: self.width,
            height: self.height,
        }
    }
}

pub fn load_document(bytes: &[u8]) -> Result<Document> {
    Document::load_mem(bytes).map_err(|e| StampError::Parse(e.to_string()))
}

pub fn save_document(doc: &mut Document) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    doc.save_to(&mut buffer)
        .map_err(|e| StampError::Serialize(e.to_string()))?;
    Ok(buffer)
}

/// Object id of the page at zero-based `index`.
pub fn page_id(doc: &Document, index: usize) -> Result<ObjectId> {
    let pages = doc.get_pages();
    u32::try_from(index)
        .ok()
        .and_then(|i| i.checked_add(1))
        .and_then(|number| pages.get(&number).copied())
        .ok_or(StampError::OutOfRange {
            index,
            count: pages.len(),
        })
}

/// The page's MediaBox, inherited through the page tree.
///
/// CropBox and `/Rotate` are not consulted. A viewer that renders the crop
/// region or turns the page will show a different rectangle than the one the
/// overlay is mapped against.
pub fn page_box(doc: &Document, index: usize) -> Result<PageBox> {
    let id = page_id(doc, index)?;
    match inherited_attribute(doc, id, b"MediaBox")?.and_then(box_from_array) {
        Some(found) => Ok(found),
        None => {
            log::warn!("Page {} has no usable MediaBox, assuming US Letter", index);
            Ok(FALLBACK_PAGE)
        }
    }
}

/// Embed `image_bytes` on page `page_index` of `source`, drawn into `rect`.
pub fn embed_and_place(
    source: &[u8],
    page_index: usize,
    format: LogoFormat,
    image_bytes: &[u8],
    rect: PdfRect,
) -> Result<Vec<u8>> {
    let mut doc = load_document(source)?;
    let page = page_id(&doc, page_index)?;
    let xobject = ImageXObject::from_bytes(format, image_bytes)?;
    let (px_w, px_h) = (xobject.width, xobject.height);
    let image_id = xobject.insert_into(&mut doc);
    let name = register_xobject(&mut doc, page, image_id)?;
    draw_over_page(&mut doc, page, &name, rect)?;
    log::info!(
        "Placed {}x{} {} as /{} on page {} at ({:.2}, {:.2}) size {:.2}x{:.2}",
        px_w,
        px_h,
        format.mime(),
        name,
        page_index,
        rect.x,
        rect.y,
        rect.width,
        rect.height
    );
    save_document(&mut doc)
}

/// Look up `key` on the page, then on its `/Parent` chain (inheritable attributes).
fn inherited_attribute<'a>(
    doc: &'a Document,
    page: ObjectId,
    key: &[u8],
) -> Result<Option<&'a Object>> {
    let mut current = Some(page);
    let mut depth = 0;
    while let Some(id) = current {
        let dict = doc
            .get_object(id)
            .and_then(|o| o.as_dict())
            .map_err(|_| StampError::Structure("page_missing_dict".into()))?;
        if let Ok(value) = dict.get(key) {
            return resolve(doc, value).map(Some);
        }
        depth += 1;
        if depth > MAX_TREE_DEPTH {
            return Err(StampError::Structure("page_tree_cycle".into()));
        }
        current = dict.get(b"Parent").and_then(|p| p.as_reference()).ok();
    }
    Ok(None)
}

fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> Result<&'a Object> {
    match obj {
        Object::Reference(id) => doc
            .get_object(*id)
            .map_err(|e| StampError::Structure(format!("dangling_reference:{e}"))),
        other => Ok(other),
    }
}

fn box_from_array(obj: &Object) -> Option<PageBox> {
    let arr = obj.as_array().ok()?;
    if arr.len() != 4 {
        return None;
    }
    let llx = obj_to_f64(&arr[0])?;
    let lly = obj_to_f64(&arr[1])?;
    let urx = obj_to_f64(&arr[2])?;
    let ury = obj_to_f64(&arr[3])?;
    let found = PageBox {
        x0: llx.min(urx),
        y0: lly.min(ury),
        width: (urx - llx).abs(),
        height: (ury - lly).abs(),
    };
    (found.width > 0.0 && found.height > 0.0).then_some(found)
}

fn obj_to_f64(obj: &Object) -> Option<f64> {
    match obj {
        Object::Integer(i) => Some(*i as f64),
        Object::Real(f) => Some((*f).into()),
        _ => None,
    }
}

/// Give the page its own Resources carrying `image_id` under a fresh name.
///
/// Resources reached by reference or inherited from the page tree are copied,
/// so other pages sharing them see no change.
fn register_xobject(doc: &mut Document, page: ObjectId, image_id: ObjectId) -> Result<String> {
    let mut resources = match inherited_attribute(doc, page, b"Resources")? {
        Some(Object::Dictionary(dict)) => dict.clone(),
        Some(_) => return Err(StampError::Structure("resources_invalid".into())),
        None => Dictionary::new(),
    };

    let mut xobjects = match resources.get(b"XObject") {
        Ok(obj) => match resolve(doc, obj)? {
            Object::Dictionary(dict) => dict.clone(),
            _ => return Err(StampError::Structure("xobject_invalid".into())),
        },
        Err(_) => Dictionary::new(),
    };

    let mut n = 1;
    while xobjects.has(format!("Logo{n}").as_bytes()) {
        n += 1;
    }
    let name = format!("Logo{n}");
    xobjects.set(name.clone(), image_id);
    resources.set("XObject", Object::Dictionary(xobjects));

    let page_dict = doc
        .get_object_mut(page)
        .and_then(|o| o.as_dict_mut())
        .map_err(|_| StampError::Structure("page_missing_dict".into()))?;
    page_dict.set("Resources", Object::Dictionary(resources));
    Ok(name)
}

/// Isolate the existing content in `q ... Q` and append the image draw.
fn draw_over_page(doc: &mut Document, page: ObjectId, name: &str, rect: PdfRect) -> Result<()> {
    let existing = content_streams(doc, page)?;
    let mut contents = Vec::with_capacity(existing.len() + 2);
    let mut ops = String::new();
    if !existing.is_empty() {
        let open_id = doc.add_object(Stream::new(dictionary! {}, b"q\n".to_vec()));
        contents.push(Object::Reference(open_id));
        contents.extend(existing);
        ops.push_str("\nQ\n");
    }
    ops.push_str(&image_operators(name, rect));
    let draw_id = doc.add_object(Stream::new(dictionary! {}, ops.into_bytes()));
    contents.push(Object::Reference(draw_id));

    let page_dict = doc
        .get_object_mut(page)
        .and_then(|o| o.as_dict_mut())
        .map_err(|_| StampError::Structure("page_missing_dict".into()))?;
    page_dict.set("Contents", Object::Array(contents));
    Ok(())
}

/// The page's content streams as a flat list of references.
fn content_streams(doc: &Document, page: ObjectId) -> Result<Vec<Object>> {
    let page_dict = doc
        .get_object(page)
        .and_then(|o| o.as_dict())
        .map_err(|_| StampError::Structure("page_missing_dict".into()))?;
    let contents = match page_dict.get(b"Contents") {
        Ok(contents) => contents,
        Err(_) => return Ok(Vec::new()),
    };
    match contents {
        Object::Reference(id) => match doc.get_object(*id) {
            Ok(Object::Array(items)) => Ok(items.clone()),
            Ok(Object::Stream(_)) => Ok(vec![Object::Reference(*id)]),
            _ => Err(StampError::Structure("contents_invalid".into())),
        },
        Object::Array(items) => Ok(items.clone()),
        _ => Err(StampError::Structure("contents_invalid".into())),
    }
}

fn image_operators(name: &str, rect: PdfRect) -> String {
    format!(
        "q\n{} 0 0 {} {} {} cm\n/{} Do\nQ\n",
        pdf_number(rect.width),
        pdf_number(rect.height),
        pdf_number(rect.x),
        pdf_number(rect.y),
        name
    )
}

/// Fixed-point rendering; PDF numbers have no exponent form.
fn pdf_number(value: f64) -> String {
    let fixed = format!("{value:.4}");
    let trimmed = fixed.trim_end_matches('0').trim_end_matches('.');
    match trimmed {
        "" | "-0" => "0".to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{opaque_png, rgb_jpeg, sample_pdf, translucent_png};

    const RECT: PdfRect = PdfRect {
        x: 255.0,
        y: 346.5,
        width: 102.0,
        height: 99.0,
    };

    fn page_text(doc: &Document, index: usize) -> String {
        let id = page_id(doc, index).unwrap();
        String::from_utf8_lossy(&doc.get_page_content(id).unwrap()).into_owned()
    }

    fn page_xobjects(doc: &Document, index: usize) -> Dictionary {
        let id = page_id(doc, index).unwrap();
        let resources = inherited_attribute(doc, id, b"Resources").unwrap().unwrap();
        let xobjects = resources.as_dict().unwrap().get(b"XObject").unwrap();
        resolve(doc, xobjects).unwrap().as_dict().unwrap().clone()
    }

    #[test]
    fn places_png_on_requested_page() {
        let source = sample_pdf(2);
        let out = embed_and_place(&source, 0, LogoFormat::Png, &opaque_png(4, 4), RECT).unwrap();
        let doc = load_document(&out).unwrap();

        let xobjects = page_xobjects(&doc, 0);
        let image_id = xobjects.get(b"Logo1").unwrap().as_reference().unwrap();
        let image = doc.get_object(image_id).unwrap().as_stream().unwrap();
        assert_eq!(image.dict.get(b"Subtype").unwrap().as_name().unwrap(), b"Image");

        let text = page_text(&doc, 0);
        assert!(text.starts_with("q\n"), "{text}");
        assert!(text.contains("102 0 0 99 255 346.5 cm"), "{text}");
        assert!(text.contains("/Logo1 Do"), "{text}");
        assert!(text.find("\nQ\n").unwrap() < text.find("/Logo1 Do").unwrap());
    }

    #[test]
    fn places_jpeg() {
        let source = sample_pdf(1);
        let out = embed_and_place(&source, 0, LogoFormat::Jpeg, &rgb_jpeg(8, 8), RECT).unwrap();
        let doc = load_document(&out).unwrap();
        let image_id = page_xobjects(&doc, 0).get(b"Logo1").unwrap().as_reference().unwrap();
        let image = doc.get_object(image_id).unwrap().as_stream().unwrap();
        assert_eq!(image.dict.get(b"Filter").unwrap().as_name().unwrap(), b"DCTDecode");
    }

    #[test]
    fn page_beyond_document_is_out_of_range() {
        let source = sample_pdf(2);
        let err = embed_and_place(&source, 2, LogoFormat::Png, &opaque_png(2, 2), RECT).unwrap_err();
        assert!(matches!(err, StampError::OutOfRange { index: 2, count: 2 }));
    }

    #[test]
    fn bad_image_bytes_are_unsupported() {
        let source = sample_pdf(1);
        let err = embed_and_place(&source, 0, LogoFormat::Png, b"not an image", RECT).unwrap_err();
        assert!(matches!(err, StampError::UnsupportedFormat(_)));
    }

    #[test]
    fn malformed_source_is_parse_error() {
        let err = embed_and_place(b"%PDF-nope", 0, LogoFormat::Png, &opaque_png(2, 2), RECT)
            .unwrap_err();
        assert!(matches!(err, StampError::Parse(_)));
    }

    #[test]
    fn other_pages_are_untouched() {
        let source = sample_pdf(3);
        let before = load_document(&source).unwrap();
        let out = embed_and_place(&source, 1, LogoFormat::Png, &translucent_png(3, 3), RECT)
            .unwrap();
        let after = load_document(&out).unwrap();

        assert_eq!(after.get_pages().len(), 3);
        for index in [0, 2] {
            assert_eq!(page_text(&before, index), page_text(&after, index));
            assert_eq!(
                format!("{:?}", page_xobjects(&before, index)),
                format!("{:?}", page_xobjects(&after, index))
            );
        }
        assert!(page_xobjects(&after, 1).has(b"Logo1"));
    }

    #[test]
    fn shared_resources_are_copied_not_mutated() {
        let source = sample_pdf(2);
        let out = embed_and_place(&source, 0, LogoFormat::Png, &opaque_png(2, 2), RECT).unwrap();
        let doc = load_document(&out).unwrap();

        let first = page_id(&doc, 0).unwrap();
        let own = doc.get_object(first).unwrap().as_dict().unwrap();
        assert!(matches!(own.get(b"Resources"), Ok(Object::Dictionary(_))));

        // The second page still inherits the untouched shared dictionary.
        let second_xobjects = page_xobjects(&doc, 1);
        assert!(!second_xobjects.has(b"Logo1"));
        assert!(second_xobjects.has(b"Stamp"));
        assert!(page_xobjects(&doc, 0).has(b"Stamp"));
    }

    #[test]
    fn repeated_placements_get_distinct_names() {
        let source = sample_pdf(1);
        let once = embed_and_place(&source, 0, LogoFormat::Png, &opaque_png(2, 2), RECT).unwrap();
        let twice = embed_and_place(&once, 0, LogoFormat::Png, &opaque_png(2, 2), RECT).unwrap();
        let doc = load_document(&twice).unwrap();
        let xobjects = page_xobjects(&doc, 0);
        assert!(xobjects.has(b"Logo1"));
        assert!(xobjects.has(b"Logo2"));
        let text = page_text(&doc, 0);
        assert!(text.contains("/Logo1 Do") && text.contains("/Logo2 Do"));
    }

    #[test]
    fn media_box_is_inherited_from_page_tree() {
        let doc = load_document(&sample_pdf(2)).unwrap();
        let inherited = page_box(&doc, 0).unwrap();
        assert_eq!(inherited.size(), PageSize { width: 612.0, height: 792.0 });
        // Page two overrides with an offset A5 box.
        let own = page_box(&doc, 1).unwrap();
        assert_eq!((own.x0, own.y0), (10.0, 20.0));
        assert_eq!(own.size(), PageSize { width: 420.0, height: 595.0 });
        assert!(matches!(page_box(&doc, 7), Err(StampError::OutOfRange { index: 7, count: 2 })));
    }

    #[test]
    fn numbers_render_without_exponent() {
        assert_eq!(pdf_number(102.0), "102");
        assert_eq!(pdf_number(346.5), "346.5");
        assert_eq!(pdf_number(0.00001), "0");
        assert_eq!(pdf_number(-0.00001), "0");
        assert_eq!(pdf_number(-12.34567), "-12.3457");
        assert_eq!(pdf_number(1e12), "1000000000000");
    }
}
