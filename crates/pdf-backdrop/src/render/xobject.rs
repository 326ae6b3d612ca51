//! XObject creation and object copying
//!
//! Source pages are turned into Form XObjects so they can be drawn onto
//! output pages with a transformation. Objects are copied between documents
//! with a per-source cache so shared resources are copied once.

use crate::constants::{DEFAULT_PAGE_DIMENSIONS, MAX_PAGE_TREE_DEPTH};
use crate::types::*;
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use std::collections::HashMap;

/// Maps object ids of one source document to their copies in the output
pub type ObjectCache = HashMap<ObjectId, ObjectId>;

/// A page turned into a Form XObject, with its bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageForm {
    pub id: ObjectId,
    /// Visible area `[x0, y0, x1, y1]` in the source page's user space
    pub bbox: [f32; 4],
    /// Clockwise rotation the source page is displayed with
    pub rotation: u16,
}

// =============================================================================
// XObject Creation
// =============================================================================

/// Create a Form XObject from a source page.
///
/// # Arguments
/// * `output` - The output document to add the XObject to
/// * `source` - The source document containing the page
/// * `page_id` - The object ID of the source page
/// * `cache` - Cache to avoid copying the same object multiple times
pub fn create_page_xobject(
    output: &mut Document,
    source: &Document,
    page_id: ObjectId,
    cache: &mut ObjectCache,
) -> Result<PageForm> {
    let page_dict = source.get_dictionary(page_id)?;
    let geometry = page_geometry(source, page_id);
    let bbox = geometry.visible;

    let mut xobject_dict = Dictionary::new();
    xobject_dict.set("Type", Object::Name(b"XObject".to_vec()));
    xobject_dict.set("Subtype", Object::Name(b"Form".to_vec()));
    xobject_dict.set(
        "BBox",
        Object::Array(bbox.iter().map(|&v| Object::Real(v)).collect()),
    );
    xobject_dict.set("FormType", Object::Integer(1));

    if let Some(resources) = inherited_attribute(source, page_id, b"Resources") {
        xobject_dict.set(
            "Resources",
            copy_object_deep(output, source, resources, cache)?,
        );
    }

    let content = get_page_content(source, page_dict)?;
    if let Some(filters) = content.filters {
        for (key, value) in filters.iter() {
            xobject_dict.set(key.clone(), copy_object_deep(output, source, value, cache)?);
        }
    }

    let id = output.add_object(Stream::new(xobject_dict, content.data));
    Ok(PageForm {
        id,
        bbox,
        rotation: geometry.rotation,
    })
}

// =============================================================================
// Page Content Extraction
// =============================================================================

struct PageContent {
    data: Vec<u8>,
    /// `Filter`/`DecodeParms` to keep when the data could not be decoded
    filters: Option<Dictionary>,
}

/// Get the content stream data from a page.
fn get_page_content(doc: &Document, page_dict: &Dictionary) -> Result<PageContent> {
    let contents = match page_dict.get(b"Contents") {
        Ok(c) => c,
        Err(_) => {
            return Ok(PageContent {
                data: Vec::new(),
                filters: None,
            });
        }
    };

    match contents {
        Object::Reference(id) => match doc.get_object(*id)? {
            Object::Stream(stream) => Ok(get_single_content_stream(stream)),
            Object::Array(arr) => Ok(get_concatenated_content_streams(doc, arr)),
            _ => Ok(PageContent {
                data: Vec::new(),
                filters: None,
            }),
        },
        Object::Array(arr) => Ok(get_concatenated_content_streams(doc, arr)),
        _ => Ok(PageContent {
            data: Vec::new(),
            filters: None,
        }),
    }
}

/// Content of a single stream, decoded when lopdf knows the filter
fn get_single_content_stream(stream: &Stream) -> PageContent {
    match stream.decompressed_content() {
        Ok(data) => PageContent {
            data,
            filters: None,
        },
        Err(_) => {
            let mut filters = Dictionary::new();
            for key in [&b"Filter"[..], &b"DecodeParms"[..]] {
                if let Ok(value) = stream.dict.get(key) {
                    filters.set(key.to_vec(), value.clone());
                }
            }
            PageContent {
                data: stream.content.clone(),
                filters: (!filters.is_empty()).then_some(filters),
            }
        }
    }
}

/// Concatenate multiple content streams
fn get_concatenated_content_streams(doc: &Document, refs: &[Object]) -> PageContent {
    let mut data = Vec::new();

    for obj in refs {
        if let Object::Reference(id) = obj {
            if let Ok(stream) = doc.get_object(*id).and_then(Object::as_stream) {
                let content = stream
                    .decompressed_content()
                    .unwrap_or_else(|_| stream.content.clone());
                data.extend_from_slice(&content);
                data.push(b'\n');
            }
        }
    }

    PageContent {
        data,
        filters: None,
    }
}

// =============================================================================
// Deep Copy
// =============================================================================

/// Deep copy an object from source to output document, following references.
///
/// References to pages or page tree nodes that are not already in the cache
/// become `null`, so copying a resource never drags in the source page tree.
/// Ids are reserved before recursing, which makes reference cycles safe.
pub fn copy_object_deep(
    output: &mut Document,
    source: &Document,
    obj: &Object,
    cache: &mut ObjectCache,
) -> Result<Object> {
    match obj {
        Object::Reference(id) => {
            if let Some(&new_id) = cache.get(id) {
                return Ok(Object::Reference(new_id));
            }

            let referenced = match source.get_object(*id) {
                Ok(referenced) => referenced,
                // Dangling references are legal and read as null
                Err(_) => return Ok(Object::Null),
            };
            if is_page_tree_node(referenced) {
                return Ok(Object::Null);
            }

            let new_id = output.new_object_id();
            cache.insert(*id, new_id);
            let copied = copy_object_deep(output, source, referenced, cache)?;
            output.objects.insert(new_id, copied);

            Ok(Object::Reference(new_id))
        }
        Object::Dictionary(dict) => Ok(Object::Dictionary(copy_dictionary_deep(
            output, source, dict, cache,
        )?)),
        Object::Array(arr) => {
            let new_arr: Result<Vec<_>> = arr
                .iter()
                .map(|item| copy_object_deep(output, source, item, cache))
                .collect();
            Ok(Object::Array(new_arr?))
        }
        Object::Stream(stream) => Ok(Object::Stream(Stream {
            dict: copy_dictionary_deep(output, source, &stream.dict, cache)?,
            content: stream.content.clone(),
            allows_compression: stream.allows_compression,
            start_position: None,
        })),
        // Primitive types: just clone
        _ => Ok(obj.clone()),
    }
}

fn copy_dictionary_deep(
    output: &mut Document,
    source: &Document,
    dict: &Dictionary,
    cache: &mut ObjectCache,
) -> Result<Dictionary> {
    let mut new_dict = Dictionary::new();
    for (key, value) in dict.iter() {
        new_dict.set(key.clone(), copy_object_deep(output, source, value, cache)?);
    }
    Ok(new_dict)
}

fn is_page_tree_node(obj: &Object) -> bool {
    match obj.as_dict().and_then(|dict| dict.get(b"Type")).and_then(Object::as_name) {
        Ok(name) => name == b"Page" || name == b"Pages",
        Err(_) => false,
    }
}

// =============================================================================
// Page Attributes
// =============================================================================

/// Look up a page attribute, walking up the page tree for inherited keys
/// (`Resources`, `MediaBox`, `CropBox`, `Rotate`).
pub fn inherited_attribute<'a>(
    doc: &'a Document,
    page_id: ObjectId,
    key: &[u8],
) -> Option<&'a Object> {
    let mut current = doc.get_dictionary(page_id).ok()?;
    for _ in 0..MAX_PAGE_TREE_DEPTH {
        if let Ok(value) = current.get(key) {
            return Some(value);
        }
        let parent = current.get(b"Parent").and_then(Object::as_reference).ok()?;
        current = doc.get_dictionary(parent).ok()?;
    }
    None
}

/// Follow a reference to the object it points at
pub fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> &'a Object {
    match obj {
        Object::Reference(id) => doc.get_object(*id).unwrap_or(obj),
        _ => obj,
    }
}

/// Visible area of a page and the rotation it is displayed with
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    /// CropBox clipped to the MediaBox, `[x0, y0, x1, y1]` in user space
    pub visible: [f32; 4],
    /// Clockwise display rotation: 0, 90, 180 or 270
    pub rotation: u16,
}

impl PageGeometry {
    /// Size of the page as displayed, after rotation
    pub fn dimensions(&self) -> PageDimensions {
        let [x0, y0, x1, y1] = self.visible;
        let (width, height) = (x1 - x0, y1 - y0);
        if is_quarter_turn(self.rotation) {
            PageDimensions::new(height, width)
        } else {
            PageDimensions::new(width, height)
        }
    }

    /// Map a point of the displayed page (top-left origin, y down) to user space
    pub fn to_user_space(&self, point: Point) -> (f32, f32) {
        let [x0, y0, x1, y1] = self.visible;
        let p = point.x;
        let q = self.dimensions().height_pt - point.y;
        match self.rotation {
            90 => (x1 - q, y0 + p),
            180 => (x1 - p, y1 - q),
            270 => (x0 + q, y1 - p),
            _ => (x0 + p, y0 + q),
        }
    }

    /// Text space axes `[a, b, c, d]` that read upright on the displayed page
    pub fn upright_axes(&self) -> [f32; 4] {
        match self.rotation {
            90 => [0.0, 1.0, -1.0, 0.0],
            180 => [-1.0, 0.0, 0.0, -1.0],
            270 => [0.0, -1.0, 1.0, 0.0],
            _ => [1.0, 0.0, 0.0, 1.0],
        }
    }
}

pub(crate) fn is_quarter_turn(rotation: u16) -> bool {
    rotation == 90 || rotation == 270
}

/// Visible box and display rotation of a page.
///
/// A CropBox that does not overlap the MediaBox is ignored.
pub fn page_geometry(doc: &Document, page_id: ObjectId) -> PageGeometry {
    let media = page_media_box(doc, page_id);
    let visible = read_box(doc, page_id, b"CropBox")
        .and_then(|crop| intersect(crop, media))
        .unwrap_or(media);
    PageGeometry {
        visible,
        rotation: page_rotation(doc, page_id),
    }
}

/// `/Rotate` normalized to a clockwise quarter turn; other values read as 0
fn page_rotation(doc: &Document, page_id: ObjectId) -> u16 {
    let degrees = inherited_attribute(doc, page_id, b"Rotate")
        .and_then(|obj| resolve(doc, obj).as_i64().ok())
        .unwrap_or(0);
    match degrees.rem_euclid(360) {
        90 => 90,
        180 => 180,
        270 => 270,
        _ => 0,
    }
}

fn intersect(a: [f32; 4], b: [f32; 4]) -> Option<[f32; 4]> {
    let clipped = [a[0].max(b[0]), a[1].max(b[1]), a[2].min(b[2]), a[3].min(b[3])];
    (clipped[2] > clipped[0] && clipped[3] > clipped[1]).then_some(clipped)
}

/// Get the page's MediaBox as `[x0, y0, x1, y1]`, US Letter when missing
pub fn page_media_box(doc: &Document, page_id: ObjectId) -> [f32; 4] {
    read_box(doc, page_id, b"MediaBox").unwrap_or([
        0.0,
        0.0,
        DEFAULT_PAGE_DIMENSIONS.0,
        DEFAULT_PAGE_DIMENSIONS.1,
    ])
}

/// Read an inheritable page rectangle, normalized so `x0 <= x1` and `y0 <= y1`
fn read_box(doc: &Document, page_id: ObjectId, key: &[u8]) -> Option<[f32; 4]> {
    let values = resolve(doc, inherited_attribute(doc, page_id, key)?)
        .as_array()
        .ok()?;
    let numbers: Vec<f32> = values
        .iter()
        .filter_map(|v| extract_number(resolve(doc, v)))
        .collect();

    match numbers.as_slice() {
        &[a, b, c, d] => Some([a.min(c), b.min(d), a.max(c), b.max(d)]),
        _ => None,
    }
}

/// Get source page dimensions in points, as displayed
pub fn get_page_dimensions(doc: &Document, page_id: ObjectId) -> PageDimensions {
    page_geometry(doc, page_id).dimensions()
}

/// Extract numeric value from a PDF object
fn extract_number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r),
        _ => None,
    }
}
