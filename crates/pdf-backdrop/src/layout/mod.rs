//! Layout calculation modules
//!
//! Pure geometry, no I/O:
//! - Content placement (uniform scaling, centering on the backdrop)
//! - Page number box and text baseline

mod label;
mod placement;

pub use label::*;
pub use placement::*;
