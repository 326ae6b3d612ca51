//! Page number box and baseline
//!
//! The number box spans the page between the left and right margins and is
//! one and a half lines tall, anchored to either the top or the bottom margin.
//! The baseline is then derived from the font's ascender/descender so the
//! glyphs stay inside the box.

use crate::constants::{PAGE_NUMBER_BOX_LINE_FACTOR, mm_to_pt};
use crate::options::{HorizontalAlign, NumberPosition, NumberingConfig};
use crate::types::*;

/// Calculate the box that receives the page number.
///
/// Fails with [`MergeError::Margin`] when the margins leave no horizontal
/// or vertical space on `page`.
pub fn compute_numbering_rect(page: &Rectangle, config: &NumberingConfig) -> Result<Rectangle> {
    let margins = config.margins();
    let left = mm_to_pt(margins.left_mm);
    let right = mm_to_pt(margins.right_mm);
    let top = mm_to_pt(margins.top_mm);
    let bottom = mm_to_pt(margins.bottom_mm);

    let page_width = page.width();
    let page_height = page.height();

    let width = page_width - left - right;
    if width <= 0.0 {
        return Err(MergeError::Margin(
            "margins leave no horizontal space for page numbers".to_string(),
        ));
    }

    let box_height = config.font_size_pt() * PAGE_NUMBER_BOX_LINE_FACTOR;
    let (y0, y1) = if config.position().is_top() {
        (top, top + box_height)
    } else {
        let y1 = page_height - bottom;
        (y1 - box_height, y1)
    };

    if y0 < 0.0 || y1 > page_height || y1 <= y0 {
        return Err(MergeError::Margin(
            "margins leave no vertical space for page numbers".to_string(),
        ));
    }

    Ok(Rectangle::new(
        page.x0 + left,
        page.y0 + y0,
        page.x0 + page_width - right,
        page.y0 + y1,
    ))
}

/// Calculate the baseline origin of a page number inside its box.
///
/// # Arguments
/// * `rect` - The number box from [`compute_numbering_rect`]
/// * `page` - The whole page, used to bound the baseline vertically
/// * `metrics` - Ascender/descender of the font, in em
/// * `text_width` - Measured width of the text in points
/// * `font_size` - Font size in points
/// * `position` - Requested position (alignment and top/bottom anchoring)
pub fn compute_baseline(
    rect: &Rectangle,
    page: &Rectangle,
    metrics: &GlyphMetrics,
    text_width: f32,
    font_size: f32,
    position: NumberPosition,
) -> Result<Point> {
    let available_width = rect.width();
    if text_width > available_width {
        return Err(MergeError::TextOverflow(format!(
            "text is {:.2}pt wide but only {:.2}pt are available",
            text_width, available_width
        )));
    }

    let x = match position.align() {
        HorizontalAlign::Left => rect.x0,
        HorizontalAlign::Center => rect.x0 + (available_width - text_width) / 2.0,
        HorizontalAlign::Right => rect.x1 - text_width,
    };

    // y grows downward: the ascent pushes a top baseline down from the box
    // top, a negative descender lifts a bottom baseline off the box bottom.
    let y = if position.is_top() {
        rect.y0 + metrics.ascender * font_size
    } else {
        rect.y1 + metrics.descender * font_size
    };

    if !(page.y0..=page.y1).contains(&y) {
        return Err(MergeError::TextOverflow(format!(
            "baseline at {:.2}pt falls outside the page",
            y
        )));
    }

    Ok(Point { x, y })
}
