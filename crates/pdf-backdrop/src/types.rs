use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MergeError {
    #[error("Invalid configuration: {0}")]
    Configuration(String),
    #[error("Cannot open {}: {reason}", .path.display())]
    DocumentOpen { path: PathBuf, reason: String },
    #[error("Invalid geometry: {0}")]
    Geometry(String),
    #[error("Margins leave no room for page numbers: {0}")]
    Margin(String),
    #[error("Page number does not fit: {0}")]
    TextOverflow(String),
    #[error("no matching cover found for annex {annex_id}")]
    MissingPair { annex_id: String },
    #[error("Filesystem error at {}: {source}", .path.display())]
    Filesystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Font error: {0}")]
    Font(String),
    #[error("Not a directory: {}", .0.display())]
    NotADirectory(PathBuf),
    #[error("Cover {} is already used by annex {claimed_by}", .cover.display())]
    CoverCollision { cover: PathBuf, claimed_by: String },
    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl MergeError {
    pub(crate) fn filesystem(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| MergeError::Filesystem { path, source }
    }

    pub(crate) fn open(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        MergeError::DocumentOpen {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, MergeError>;

/// A rectangular area in points.
///
/// The origin is the top-left corner of the page and `y` grows downward,
/// so `y0` is the top edge and `y1` the bottom edge.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rectangle {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl Rectangle {
    pub fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    /// Rectangle covering a whole page of the given size
    pub fn from_dimensions(dimensions: PageDimensions) -> Self {
        Self::new(0.0, 0.0, dimensions.width_pt, dimensions.height_pt)
    }

    pub fn width(&self) -> f32 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f32 {
        self.y1 - self.y0
    }

    /// Whether `other` lies entirely inside this rectangle, with a small tolerance
    pub fn contains(&self, other: &Rectangle) -> bool {
        const EPSILON: f32 = 1e-3;
        other.x0 >= self.x0 - EPSILON
            && other.y0 >= self.y0 - EPSILON
            && other.x1 <= self.x1 + EPSILON
            && other.y1 <= self.y1 + EPSILON
    }
}

/// Size of a document page in points
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageDimensions {
    pub width_pt: f32,
    pub height_pt: f32,
}

impl PageDimensions {
    pub fn new(width_pt: f32, height_pt: f32) -> Self {
        Self {
            width_pt,
            height_pt,
        }
    }
}

/// A point in page coordinates (top-left origin, y down)
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

/// Vertical font metrics as fractions of the em square.
///
/// `descender` is negative for fonts whose glyphs drop below the baseline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlyphMetrics {
    pub ascender: f32,
    pub descender: f32,
}
