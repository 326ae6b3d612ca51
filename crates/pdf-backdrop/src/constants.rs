//! Shared constants for page composition
//!
//! This module centralizes magic numbers and constants used throughout
//! the merge and numbering passes.

// =============================================================================
// Unit Conversion
// =============================================================================

/// Points per millimeter (1 inch = 72 points, 1 inch = 25.4mm)
pub const POINTS_PER_MM: f32 = 72.0 / 25.4; // ≈ 2.83465

/// Convert millimeters to points
#[inline]
pub fn mm_to_pt(mm: f32) -> f32 {
    mm * POINTS_PER_MM
}

// =============================================================================
// Default Page Dimensions
// =============================================================================

/// Default page width in points (US Letter: 8.5" × 11")
pub const DEFAULT_PAGE_WIDTH_PT: f32 = 612.0;

/// Default page height in points (US Letter)
pub const DEFAULT_PAGE_HEIGHT_PT: f32 = 792.0;

/// Default page dimensions as tuple (width, height)
pub const DEFAULT_PAGE_DIMENSIONS: (f32, f32) = (DEFAULT_PAGE_WIDTH_PT, DEFAULT_PAGE_HEIGHT_PT);

/// Maximum number of `/Parent` hops when resolving inherited page attributes
pub const MAX_PAGE_TREE_DEPTH: usize = 32;

// =============================================================================
// Merge Defaults
// =============================================================================

/// Default content scale, in percent of the backdrop size
pub const DEFAULT_SCALE_PERCENT: f32 = 85.0;

// =============================================================================
// Page Numbers
// =============================================================================

/// Default font size for page numbers (points)
pub const PAGE_NUMBER_FONT_SIZE: f32 = 11.0;

/// Default margin on every side of the page number box (millimeters)
pub const PAGE_NUMBER_MARGIN_MM: f32 = 10.0;

/// Height of the page number box as a multiple of the font size
pub const PAGE_NUMBER_BOX_LINE_FACTOR: f32 = 1.5;

/// Font used when no other choice is available
pub const DEFAULT_FONT_NAME: &str = "Helvetica";

/// Identifier used for an embedded font whose display name sanitizes to nothing
pub const FALLBACK_FONT_IDENTIFIER: &str = "CustomFont";

// =============================================================================
// Temporary Files
// =============================================================================

/// Stem suffix that marks a file as a temporary artifact
pub const TEMP_SUFFIX: &str = "_temp";

/// Stem suffix for the working copy used by the numbering pass
pub const NUMBERING_TEMP_SUFFIX: &str = "_temp_enumerating";

/// Stem suffix for the two-page copy of a single-page template
pub const ONE_PAGE_TEMP_SUFFIX: &str = "_one_page_temp";

/// Stem suffix for the duplicate-first-page copy of an annex
pub const DUPLICATE_TEMP_SUFFIX: &str = "_dup_temp";

/// Default name of the batch output subdirectory
pub const DEFAULT_OUTPUT_SUBDIR: &str = "output";
