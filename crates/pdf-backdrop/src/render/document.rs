//! Source and output documents
//!
//! A [`SourceDocument`] is a loaded PDF with its page order resolved once.
//! An [`OutputDocument`] is built page by page from imported pages and
//! composed pages, and serialized in memory before anything touches disk.

use super::page::PageBuilder;
use super::xobject::*;
use crate::types::*;
use lopdf::{Dictionary, Document, Object, ObjectId};
use std::path::{Path, PathBuf};

/// Page attributes a page may inherit from its ancestors in the page tree
const INHERITABLE_KEYS: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// A PDF opened for reading
#[derive(Debug)]
pub struct SourceDocument {
    path: PathBuf,
    doc: Document,
    page_ids: Vec<ObjectId>,
}

impl SourceDocument {
    /// Load a document; every failure is reported as [`MergeError::DocumentOpen`]
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| MergeError::open(path, e))?;
        let doc = Document::load_mem(&bytes).map_err(|e| MergeError::open(path, e))?;
        if doc.is_encrypted() {
            return Err(MergeError::open(path, "document is encrypted"));
        }

        let page_ids = doc.get_pages().into_values().collect();
        Ok(Self {
            path: path.to_path_buf(),
            doc,
            page_ids,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    /// Take the loaded document for in-place editing
    pub fn into_document(self) -> Document {
        self.doc
    }

    pub fn page_ids(&self) -> &[ObjectId] {
        &self.page_ids
    }

    pub fn page_count(&self) -> usize {
        self.page_ids.len()
    }

    /// Object id of the page at zero-based `index`
    pub fn page_id(&self, index: usize) -> Result<ObjectId> {
        self.page_ids.get(index).copied().ok_or_else(|| {
            MergeError::Geometry(format!(
                "page {} does not exist in {} ({} pages)",
                index + 1,
                self.path.display(),
                self.page_ids.len()
            ))
        })
    }

    pub fn page_dimensions(&self, index: usize) -> Result<PageDimensions> {
        Ok(get_page_dimensions(&self.doc, self.page_id(index)?))
    }
}

/// A PDF under construction
#[derive(Debug)]
pub struct OutputDocument {
    doc: Document,
    pages_id: ObjectId,
    kids: Vec<ObjectId>,
}

impl Default for OutputDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputDocument {
    pub fn new() -> Self {
        let mut doc = Document::with_version("1.7");
        let pages_id = doc.new_object_id();
        Self {
            doc,
            pages_id,
            kids: Vec::new(),
        }
    }

    pub fn page_count(&self) -> usize {
        self.kids.len()
    }

    /// Copy a source page verbatim and append it.
    ///
    /// Inherited attributes are resolved and set on the copy, so it keeps its
    /// MediaBox and resources once detached from the source page tree.
    pub fn import_page(
        &mut self,
        source: &SourceDocument,
        index: usize,
        cache: &mut ObjectCache,
    ) -> Result<ObjectId> {
        let page_id = source.page_id(index)?;
        let src = source.document();
        let page_dict = src.get_dictionary(page_id)?;

        // Links and annotations pointing back at this page follow the copy
        let new_page_id = self.doc.new_object_id();
        cache.insert(page_id, new_page_id);

        let mut new_dict = Dictionary::new();
        for (key, value) in page_dict.iter() {
            if key == b"Parent" {
                continue;
            }
            new_dict.set(
                key.clone(),
                copy_object_deep(&mut self.doc, src, value, cache)?,
            );
        }
        for key in INHERITABLE_KEYS {
            if new_dict.has(key) {
                continue;
            }
            if let Some(value) = inherited_attribute(src, page_id, key) {
                new_dict.set(key, copy_object_deep(&mut self.doc, src, value, cache)?);
            }
        }
        new_dict.set("Parent", Object::Reference(self.pages_id));

        self.doc
            .objects
            .insert(new_page_id, Object::Dictionary(new_dict));
        self.kids.push(new_page_id);
        Ok(new_page_id)
    }

    /// Import pages `range` of `source` in order
    pub fn import_pages(
        &mut self,
        source: &SourceDocument,
        range: std::ops::Range<usize>,
        cache: &mut ObjectCache,
    ) -> Result<()> {
        for index in range {
            self.import_page(source, index, cache)?;
        }
        Ok(())
    }

    /// Turn a source page into a Form XObject that composed pages can draw
    pub fn page_form(
        &mut self,
        source: &SourceDocument,
        index: usize,
        cache: &mut ObjectCache,
    ) -> Result<PageForm> {
        create_page_xobject(&mut self.doc, source.document(), source.page_id(index)?, cache)
    }

    /// Append a composed page
    pub fn add_page(&mut self, page: PageBuilder) -> ObjectId {
        let page_id = page.finish(&mut self.doc, self.pages_id);
        self.kids.push(page_id);
        page_id
    }

    /// Remove the page at zero-based `index`; orphaned objects are pruned on save
    pub fn delete_page(&mut self, index: usize) -> Result<()> {
        if index >= self.kids.len() {
            return Err(MergeError::Geometry(format!(
                "cannot delete page {} of a {}-page document",
                index + 1,
                self.kids.len()
            )));
        }
        self.kids.remove(index);
        Ok(())
    }

    /// Finalize the page tree and serialize the document
    pub fn into_bytes(mut self) -> Result<Vec<u8>> {
        if self.kids.is_empty() {
            return Err(MergeError::Configuration(
                "the merged document would have no pages".to_string(),
            ));
        }

        let page_refs: Vec<Object> = self.kids.iter().map(|&id| Object::Reference(id)).collect();
        let count = page_refs.len() as i64;
        let pages_dict = Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Pages".to_vec())),
            ("Kids", Object::Array(page_refs)),
            ("Count", Object::Integer(count)),
        ]);
        self.doc
            .objects
            .insert(self.pages_id, Object::Dictionary(pages_dict));

        let catalog_id = self.doc.add_object(Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Catalog".to_vec())),
            ("Pages", Object::Reference(self.pages_id)),
        ]));
        self.doc.trailer.set("Root", catalog_id);

        self.doc.prune_objects();
        self.doc.compress();

        let mut writer = Vec::new();
        self.doc.save_to(&mut writer)?;
        Ok(writer)
    }

    /// Serialize the document and write it, creating parent directories
    pub fn save(self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let bytes = self.into_bytes()?;
        write_document(path, &bytes)
    }
}

/// Write serialized PDF bytes, creating missing parent directories
pub fn write_document(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(MergeError::filesystem(parent))?;
    }
    std::fs::write(path, bytes).map_err(MergeError::filesystem(path))
}

/// Serialize a loaded document into memory
pub fn document_to_bytes(doc: &mut Document) -> Result<Vec<u8>> {
    let mut writer = Vec::new();
    doc.save_to(&mut writer)?;
    Ok(writer)
}
