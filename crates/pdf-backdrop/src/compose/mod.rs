//! Document composition
//!
//! Two modes combine a background template with a content document:
//! - Scaled merge: every content page is shrunk onto a copy of the last
//!   template page, which serves as a backdrop
//! - Append: the content pages simply follow the template pages

mod normalize;

pub use normalize::*;

use crate::layout::compute_content_placement;
use crate::render::{ObjectCache, OutputDocument, PageBuilder, SourceDocument};
use crate::types::*;
use log::debug;
use std::path::Path;

/// First content page to use
fn content_start_index(content: &SourceDocument, remove_first_content_page: bool) -> usize {
    if remove_first_content_page && content.page_count() > 0 {
        1
    } else {
        0
    }
}

/// Scaled merge.
///
/// The output starts with the template pages except the last one, followed
/// by one page per content page: the last template page drawn at full size
/// with the content page centered on top at `scale_fraction`. When the
/// template was normalized from a single page the duplicated first page is
/// dropped as well.
pub fn compose_scaled(
    template: &NormalizedTemplate,
    content_path: &Path,
    output_path: &Path,
    scale_fraction: f32,
    remove_first_content_page: bool,
) -> Result<()> {
    let background = SourceDocument::open(&template.path)?;
    let content = SourceDocument::open(content_path)?;

    let template_pages = background.page_count();
    if template_pages == 0 {
        return Err(MergeError::open(&template.path, "document has no pages"));
    }
    let backdrop_index = template_pages - 1;

    let mut output = OutputDocument::new();
    let mut background_cache = ObjectCache::new();
    let mut content_cache = ObjectCache::new();

    output.import_pages(&background, 0..template_pages, &mut background_cache)?;

    let backdrop_dimensions = background.page_dimensions(backdrop_index)?;
    let backdrop_rect = Rectangle::from_dimensions(backdrop_dimensions);
    let backdrop = output.page_form(&background, backdrop_index, &mut background_cache)?;

    let start = content_start_index(&content, remove_first_content_page);
    debug!(
        "Scaling content pages {}..{} of {} onto backdrop {}x{}pt",
        start + 1,
        content.page_count(),
        content_path.display(),
        backdrop_dimensions.width_pt,
        backdrop_dimensions.height_pt
    );

    for index in start..content.page_count() {
        let placement = compute_content_placement(
            &backdrop_rect,
            content.page_dimensions(index)?,
            scale_fraction,
        )?;
        let form = output.page_form(&content, index, &mut content_cache)?;

        let mut page = PageBuilder::new(backdrop_dimensions);
        page.draw_form(&backdrop, &backdrop_rect)?;
        page.draw_form(&form, &placement)?;
        output.add_page(page);
    }

    output.delete_page(backdrop_index)?;
    if template.drop_leading_page {
        output.delete_page(0)?;
    }

    output.save(output_path)
}

/// Append merge: template pages, then content pages, all unchanged
pub fn compose_append(
    background_path: &Path,
    content_path: &Path,
    output_path: &Path,
    remove_first_content_page: bool,
) -> Result<()> {
    let background = SourceDocument::open(background_path)?;
    let content = SourceDocument::open(content_path)?;

    let mut output = OutputDocument::new();
    let mut background_cache = ObjectCache::new();
    let mut content_cache = ObjectCache::new();

    output.import_pages(&background, 0..background.page_count(), &mut background_cache)?;

    let start = content_start_index(&content, remove_first_content_page);
    debug!(
        "Appending content pages {}..{} of {}",
        start + 1,
        content.page_count(),
        content_path.display()
    );
    output.import_pages(&content, start..content.page_count(), &mut content_cache)?;

    output.save(output_path)
}
