pub mod batch;
pub mod compose;
mod constants;
pub mod fonts;
pub mod layout;
mod merge;
pub mod numbering;
mod options;
mod paths;
pub mod render;
mod types;

pub use batch::{BatchJobResult, process_batch};
pub use compose::{NormalizedTemplate, compose_append, compose_scaled, normalize};
pub use constants::{POINTS_PER_MM, mm_to_pt};
pub use fonts::{FontCatalog, resolve_font_choice, sanitize_font_name};
pub use merge::merge_documents;
pub use numbering::number_pages;
pub use options::*;
pub use types::*;
