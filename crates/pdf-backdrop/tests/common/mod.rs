#![allow(dead_code)]

use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use std::path::{Path, PathBuf};

pub const LETTER: (f32, f32) = (612.0, 792.0);
pub const A4: (f32, f32) = (595.0, 842.0);

/// Build a PDF whose page `n` shows the text `<label> <n>`
pub fn create_test_pdf(label: &str, sizes: &[(f32, f32)]) -> Document {
    let mut doc = Document::with_version("1.7");

    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Font".to_vec())),
        ("Subtype", Object::Name(b"Type1".to_vec())),
        ("BaseFont", Object::Name(b"Helvetica".to_vec())),
    ]));

    let mut kids = Vec::new();
    for (index, &(width, height)) in sizes.iter().enumerate() {
        let text = format!("BT /F1 12 Tf 72 72 Td ({} {}) Tj ET", label, index + 1);
        let content_id = doc.add_object(Stream::new(Dictionary::new(), text.into_bytes()));

        let resources = Dictionary::from_iter(vec![(
            "Font",
            Object::Dictionary(Dictionary::from_iter(vec![(
                "F1",
                Object::Reference(font_id),
            )])),
        )]);

        let page_id = doc.add_object(Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Page".to_vec())),
            ("Parent", Object::Reference(pages_id)),
            (
                "MediaBox",
                Object::Array(vec![
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Real(width),
                    Object::Real(height),
                ]),
            ),
            ("Resources", Object::Dictionary(resources)),
            ("Contents", Object::Reference(content_id)),
        ]));
        kids.push(Object::Reference(page_id));
    }

    let pages_dict = Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Pages".to_vec())),
        ("Kids", Object::Array(kids)),
        ("Count", Object::Integer(sizes.len() as i64)),
    ]);
    doc.objects.insert(pages_id, Object::Dictionary(pages_dict));

    let catalog_id = doc.add_object(Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Catalog".to_vec())),
        ("Pages", Object::Reference(pages_id)),
    ]));
    doc.trailer.set("Root", catalog_id);

    doc
}

/// Write a test PDF with `pages` pages of the same size
pub fn write_test_pdf(path: &Path, label: &str, pages: usize, size: (f32, f32)) -> PathBuf {
    write_test_pdf_sizes(path, label, &vec![size; pages])
}

pub fn write_test_pdf_sizes(path: &Path, label: &str, sizes: &[(f32, f32)]) -> PathBuf {
    let mut doc = create_test_pdf(label, sizes);
    let mut writer = Vec::new();
    doc.save_to(&mut writer).unwrap();
    std::fs::write(path, writer).unwrap();
    path.to_path_buf()
}

pub fn load(path: &Path) -> Document {
    Document::load(path).unwrap()
}

pub fn page_ids(doc: &Document) -> Vec<ObjectId> {
    doc.get_pages().into_values().collect()
}

pub fn page_count(path: &Path) -> usize {
    load(path).get_pages().len()
}

fn deref<'a>(doc: &'a Document, obj: &'a Object) -> &'a Object {
    match obj {
        Object::Reference(id) => doc.get_object(*id).unwrap(),
        _ => obj,
    }
}

fn stream_text(stream: &Stream) -> String {
    let bytes = stream
        .decompressed_content()
        .unwrap_or_else(|_| stream.content.clone());
    String::from_utf8_lossy(&bytes).into_owned()
}

/// Content of the page's own streams, without drawn XObjects
pub fn page_content(doc: &Document, page_id: ObjectId) -> String {
    let mut text = String::new();
    for id in doc.get_page_contents(page_id) {
        if let Ok(Object::Stream(stream)) = doc.get_object(id) {
            text.push_str(&stream_text(stream));
            text.push('\n');
        }
    }
    text
}

/// Content of the page plus every Form XObject it draws, recursively
pub fn page_text(doc: &Document, page_id: ObjectId) -> String {
    let mut text = page_content(doc, page_id);
    let page = doc.get_dictionary(page_id).unwrap();
    if let Ok(resources) = page.get(b"Resources") {
        collect_xobject_text(doc, deref(doc, resources), &mut text, 0);
    }
    text
}

fn collect_xobject_text(doc: &Document, resources: &Object, text: &mut String, depth: usize) {
    if depth > 8 {
        return;
    }
    let Ok(resources) = resources.as_dict() else {
        return;
    };
    let Ok(xobjects) = resources.get(b"XObject") else {
        return;
    };
    let Ok(xobjects) = deref(doc, xobjects).as_dict() else {
        return;
    };
    for (_, value) in xobjects.iter() {
        if let Object::Stream(stream) = deref(doc, value) {
            text.push_str(&stream_text(stream));
            text.push('\n');
            if let Ok(inner) = stream.dict.get(b"Resources") {
                collect_xobject_text(doc, deref(doc, inner), text, depth + 1);
            }
        }
    }
}

/// MediaBox as `[x0, y0, x1, y1]`
pub fn media_box(doc: &Document, page_id: ObjectId) -> [f32; 4] {
    let page = doc.get_dictionary(page_id).unwrap();
    let values = deref(doc, page.get(b"MediaBox").unwrap())
        .as_array()
        .unwrap();
    let numbers: Vec<f32> = values
        .iter()
        .map(|v| match v {
            Object::Integer(i) => *i as f32,
            Object::Real(r) => *r,
            other => panic!("unexpected MediaBox entry {:?}", other),
        })
        .collect();
    [numbers[0], numbers[1], numbers[2], numbers[3]]
}

/// Operands of every `a b c d e f cm` operator in `content`
pub fn cm_operands(content: &str) -> Vec<[f32; 6]> {
    let tokens: Vec<&str> = content.split_whitespace().collect();
    tokens
        .iter()
        .enumerate()
        .filter(|(i, token)| **token == "cm" && *i >= 6)
        .map(|(i, _)| {
            let mut operands = [0.0; 6];
            for (slot, token) in operands.iter_mut().zip(&tokens[i - 6..i]) {
                *slot = token.parse().unwrap();
            }
            operands
        })
        .collect()
}

/// Operands of every `x y Td` operator in `content`
pub fn td_operands(content: &str) -> Vec<(f32, f32)> {
    let tokens: Vec<&str> = content.split_whitespace().collect();
    tokens
        .iter()
        .enumerate()
        .filter(|(i, token)| **token == "Td" && *i >= 2)
        .map(|(i, _)| (tokens[i - 2].parse().unwrap(), tokens[i - 1].parse().unwrap()))
        .collect()
}

/// File names in `dir`, sorted
pub fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

/// Set `key` on every page of the PDF at `path`, rewriting the file
pub fn set_on_every_page(path: &Path, key: &str, value: Object) {
    let mut doc = load(path);
    for page in page_ids(&doc) {
        doc.get_dictionary_mut(page).unwrap().set(key, value.clone());
    }
    let mut writer = Vec::new();
    doc.save_to(&mut writer).unwrap();
    std::fs::write(path, writer).unwrap();
}

/// Operands of every `a b c d e f Tm` operator in `content`
pub fn tm_operands(content: &str) -> Vec<[f32; 6]> {
    let tokens: Vec<&str> = content.split_whitespace().collect();
    tokens
        .iter()
        .enumerate()
        .filter(|(i, token)| **token == "Tm" && *i >= 6)
        .map(|(i, _)| {
            let mut operands = [0.0; 6];
            for (slot, token) in operands.iter_mut().zip(&tokens[i - 6..i]) {
                *slot = token.parse().unwrap();
            }
            operands
        })
        .collect()
}

/// `BBox` of the Form XObject a page draws as `/name`
pub fn form_bbox(doc: &Document, page_id: ObjectId, name: &str) -> [f32; 4] {
    let page = doc.get_dictionary(page_id).unwrap();
    let resources = deref(doc, page.get(b"Resources").unwrap()).as_dict().unwrap();
    let xobjects = deref(doc, resources.get(b"XObject").unwrap())
        .as_dict()
        .unwrap();
    let Object::Stream(form) = deref(doc, xobjects.get(name.as_bytes()).unwrap()) else {
        panic!("/{} is not a stream", name);
    };
    let values = form.dict.get(b"BBox").unwrap().as_array().unwrap();
    let numbers: Vec<f32> = values.iter().map(|v| v.as_float().unwrap()).collect();
    [numbers[0], numbers[1], numbers[2], numbers[3]]
}

/// Path of the TrueType font used by the embedding tests
pub fn dejavu_sans() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/DejaVuSans.ttf")
}

/// Font dictionary a page registers as `/name`
pub fn page_font(doc: &Document, page_id: ObjectId, name: &str) -> lopdf::Dictionary {
    let page = doc.get_dictionary(page_id).unwrap();
    let resources = deref(doc, page.get(b"Resources").unwrap()).as_dict().unwrap();
    let fonts = deref(doc, resources.get(b"Font").unwrap()).as_dict().unwrap();
    deref(doc, fonts.get(name.as_bytes()).unwrap())
        .as_dict()
        .unwrap()
        .clone()
}

/// Follow `key` of `dict` to a dictionary, resolving a reference if needed
pub fn dict_entry<'a>(doc: &'a Document, dict: &'a lopdf::Dictionary, key: &str) -> &'a Object {
    deref(doc, dict.get(key.as_bytes()).unwrap())
}
