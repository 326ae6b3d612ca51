//! Text overlays on existing pages

use super::xobject::{inherited_attribute, resolve};
use crate::fonts::{NumberingFont, TrueTypeFont};
use crate::types::*;
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};

/// Add a font object usable from any page of `doc`
pub fn add_font(doc: &mut Document, font: &NumberingFont) -> ObjectId {
    match font {
        NumberingFont::Standard(standard) => {
            let mut font_dict = Dictionary::new();
            font_dict.set("Type", Object::Name(b"Font".to_vec()));
            font_dict.set("Subtype", Object::Name(b"Type1".to_vec()));
            font_dict.set("BaseFont", Object::Name(standard.base_name().as_bytes().to_vec()));
            font_dict.set("Encoding", Object::Name(b"WinAnsiEncoding".to_vec()));
            doc.add_object(font_dict)
        }
        NumberingFont::TrueType(truetype) => add_truetype_font(doc, truetype),
    }
}

/// Embed a TrueType font as a simple font covering printable ASCII
fn add_truetype_font(doc: &mut Document, font: &TrueTypeFont) -> ObjectId {
    let mut file_dict = Dictionary::new();
    file_dict.set("Length1", Object::Integer(font.data.len() as i64));
    let font_file_id = doc.add_object(Stream::new(file_dict, font.data.clone()));

    let base_font = Object::Name(font.name.as_bytes().to_vec());
    let [x_min, y_min, x_max, y_max] = font.bbox;

    let mut descriptor = Dictionary::new();
    descriptor.set("Type", Object::Name(b"FontDescriptor".to_vec()));
    descriptor.set("FontName", base_font.clone());
    descriptor.set("Flags", Object::Integer(font.flags as i64));
    descriptor.set(
        "FontBBox",
        Object::Array(
            [x_min, y_min, x_max, y_max]
                .into_iter()
                .map(|v| Object::Integer(font.to_thousandths(v)))
                .collect(),
        ),
    );
    descriptor.set("ItalicAngle", Object::Real(font.italic_angle));
    descriptor.set("Ascent", Object::Integer(font.to_thousandths(font.ascender)));
    descriptor.set("Descent", Object::Integer(font.to_thousandths(font.descender)));
    descriptor.set("CapHeight", Object::Integer(font.to_thousandths(font.cap_height)));
    descriptor.set("StemV", Object::Integer(80));
    descriptor.set("FontFile2", Object::Reference(font_file_id));
    let descriptor_id = doc.add_object(descriptor);

    let mut font_dict = Dictionary::new();
    font_dict.set("Type", Object::Name(b"Font".to_vec()));
    font_dict.set("Subtype", Object::Name(b"TrueType".to_vec()));
    font_dict.set("BaseFont", base_font);
    font_dict.set("FirstChar", Object::Integer(TrueTypeFont::FIRST_CHAR as i64));
    font_dict.set("LastChar", Object::Integer(TrueTypeFont::LAST_CHAR as i64));
    font_dict.set(
        "Widths",
        Object::Array(
            font.widths
                .iter()
                .map(|&w| Object::Integer(w as i64))
                .collect(),
        ),
    );
    font_dict.set("FontDescriptor", Object::Reference(descriptor_id));
    font_dict.set("Encoding", Object::Name(b"WinAnsiEncoding".to_vec()));
    doc.add_object(font_dict)
}

/// Text space axes of a page displayed without rotation
pub const UPRIGHT: [f32; 4] = [1.0, 0.0, 0.0, 1.0];

/// A line of text to draw, positioned in PDF user space
#[derive(Debug, Clone)]
pub struct TextRun<'a> {
    pub font_name: &'a str,
    pub font_id: ObjectId,
    pub font_size: f32,
    /// Text space axes `[a, b, c, d]`; identity for unrotated pages
    pub axes: [f32; 4],
    pub x: f32,
    pub y: f32,
    pub text: &'a str,
}

/// Draw `run` on top of an existing page.
///
/// The page's existing content is wrapped in `q`/`Q` so any graphics state
/// it leaves behind cannot displace the text.
pub fn append_text(doc: &mut Document, page_id: ObjectId, run: &TextRun<'_>) -> Result<()> {
    register_font(doc, page_id, run.font_name, run.font_id)?;

    let position = if run.axes == UPRIGHT {
        format!("{} {} Td", run.x, run.y)
    } else {
        let [a, b, c, d] = run.axes;
        format!("{} {} {} {} {} {} Tm", a, b, c, d, run.x, run.y)
    };
    let ops = format!(
        "Q\nq BT /{} {} Tf {} ({}) Tj ET Q\n",
        run.font_name,
        run.font_size,
        position,
        escape_text(run.text)
    );
    let open_id = doc.add_object(Stream::new(Dictionary::new(), b"q\n".to_vec()));
    let text_id = doc.add_object(Stream::new(Dictionary::new(), ops.into_bytes()));

    let existing = existing_contents(doc, page_id);
    let mut contents = Vec::with_capacity(existing.len() + 2);
    contents.push(Object::Reference(open_id));
    contents.extend(existing);
    contents.push(Object::Reference(text_id));

    doc.get_dictionary_mut(page_id)?
        .set("Contents", Object::Array(contents));
    Ok(())
}

/// Current content streams of a page as a flat list of references
fn existing_contents(doc: &Document, page_id: ObjectId) -> Vec<Object> {
    let Ok(page) = doc.get_dictionary(page_id) else {
        return Vec::new();
    };
    match page.get(b"Contents") {
        Ok(Object::Reference(id)) => match doc.get_object(*id) {
            Ok(Object::Array(arr)) => arr.clone(),
            _ => vec![Object::Reference(*id)],
        },
        Ok(Object::Array(arr)) => arr.clone(),
        _ => Vec::new(),
    }
}

/// Make `font_id` available as `/font_name` in the page's own resources.
///
/// Inherited or indirect resource dictionaries are copied onto the page
/// first so other pages sharing them are left untouched.
fn register_font(
    doc: &mut Document,
    page_id: ObjectId,
    font_name: &str,
    font_id: ObjectId,
) -> Result<()> {
    let mut resources = match inherited_attribute(doc, page_id, b"Resources") {
        Some(obj) => resolve(doc, obj)
            .as_dict()
            .cloned()
            .unwrap_or_else(|_| Dictionary::new()),
        None => Dictionary::new(),
    };
    let mut fonts = match resources.get(b"Font") {
        Ok(obj) => resolve(doc, obj)
            .as_dict()
            .cloned()
            .unwrap_or_else(|_| Dictionary::new()),
        Err(_) => Dictionary::new(),
    };

    fonts.set(font_name.as_bytes(), Object::Reference(font_id));
    resources.set("Font", Object::Dictionary(fonts));

    doc.get_dictionary_mut(page_id)?
        .set("Resources", Object::Dictionary(resources));
    Ok(())
}

/// Escape a string for use in a PDF literal string
fn escape_text(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '(' | ')' | '\\' => {
                escaped.push('\\');
                escaped.push(ch);
            }
            _ => escaped.push(ch),
        }
    }
    escaped
}
