//! Page numbering pass
//!
//! Stamps `1`, `2`, ... on every page of a finished document. The work is
//! done on a copy, which is renamed over the original once every page has
//! been numbered and the result written out.

use crate::constants::NUMBERING_TEMP_SUFFIX;
use crate::fonts::NumberingFont;
use crate::layout::{compute_baseline, compute_numbering_rect};
use crate::options::NumberingConfig;
use crate::paths::{TemporaryArtifacts, copy_file, with_stem_suffix};
use crate::render::{
    SourceDocument, TextRun, add_font, append_text, document_to_bytes, page_geometry,
    write_document,
};
use crate::types::*;
use log::debug;
use std::path::Path;

/// Number every page of the PDF at `path` in place.
///
/// Margin and overflow errors abort the pass before anything is written,
/// leaving `path` untouched. The working copy is always removed.
pub fn number_pages(path: &Path, config: &NumberingConfig) -> Result<()> {
    let working_copy = with_stem_suffix(path, NUMBERING_TEMP_SUFFIX);
    let mut artifacts = TemporaryArtifacts::new();
    artifacts.register(&working_copy);
    copy_file(path, &working_copy)?;

    let font = NumberingFont::load(config)?;
    let font_name = font.resource_name();
    let metrics = font.metrics();
    let font_size = config.font_size_pt();

    let source = SourceDocument::open(&working_copy)?;
    let page_ids = source.page_ids().to_vec();
    let mut doc = source.into_document();
    let font_id = add_font(&mut doc, &font);

    debug!(
        "Numbering {} pages of {} with {} {}pt at {}",
        page_ids.len(),
        path.display(),
        font_name,
        font_size,
        config.position()
    );

    for (index, &page_id) in page_ids.iter().enumerate() {
        let text = (index + 1).to_string();

        let geometry = page_geometry(&doc, page_id);
        let page_rect = Rectangle::from_dimensions(geometry.dimensions());

        let number_rect = compute_numbering_rect(&page_rect, config)?;
        let baseline = compute_baseline(
            &number_rect,
            &page_rect,
            &metrics,
            font.measure_text(&text, font_size),
            font_size,
            config.position(),
        )?;

        let (x, y) = geometry.to_user_space(baseline);
        let run = TextRun {
            font_name: &font_name,
            font_id,
            font_size,
            axes: geometry.upright_axes(),
            x,
            y,
            text: &text,
        };
        append_text(&mut doc, page_id, &run)?;
    }

    doc.compress();
    let bytes = document_to_bytes(&mut doc)?;

    // The original is only ever swapped for a complete file
    write_document(&working_copy, &bytes)?;
    std::fs::rename(&working_copy, path).map_err(MergeError::filesystem(path))
}
