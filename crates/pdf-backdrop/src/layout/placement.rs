//! Content placement on the backdrop
//!
//! A content page is scaled uniformly so that it fits inside the backdrop
//! at `scale_fraction` of the backdrop size, then centered on it.

use crate::types::*;

/// Calculate where a content page lands on the backdrop.
///
/// # Arguments
/// * `background` - The backdrop page rectangle
/// * `content` - Dimensions of the content page
/// * `scale_fraction` - Target size relative to the backdrop (0.85 = 85%)
pub fn compute_content_placement(
    background: &Rectangle,
    content: PageDimensions,
    scale_fraction: f32,
) -> Result<Rectangle> {
    if !(content.width_pt > 0.0 && content.height_pt > 0.0) {
        return Err(MergeError::Geometry(format!(
            "Content page has degenerate size {}x{}",
            content.width_pt, content.height_pt
        )));
    }
    if !scale_fraction.is_finite() || scale_fraction <= 0.0 {
        return Err(MergeError::Geometry(format!(
            "Scale must be positive, got {}",
            scale_fraction
        )));
    }

    let scale = calculate_scale(background, content, scale_fraction);

    let new_width = content.width_pt * scale;
    let new_height = content.height_pt * scale;

    let x_offset = (background.width() - new_width) / 2.0;
    let y_offset = (background.height() - new_height) / 2.0;

    let x0 = background.x0 + x_offset;
    let y0 = background.y0 + y_offset;

    Ok(Rectangle::new(x0, y0, x0 + new_width, y0 + new_height))
}

/// Uniform scale factor: the smaller of the two axis ratios keeps the
/// aspect ratio intact.
fn calculate_scale(background: &Rectangle, content: PageDimensions, scale_fraction: f32) -> f32 {
    let scale_x = (background.width() / content.width_pt) * scale_fraction;
    let scale_y = (background.height() / content.height_pt) * scale_fraction;
    scale_x.min(scale_y)
}
