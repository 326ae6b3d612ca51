//! PDF rendering on top of lopdf
//!
//! This module handles:
//! - Loading source documents and importing their pages
//! - Converting pages to Form XObjects and drawing them at computed positions
//! - Overlaying page number text on existing pages
//! - Serializing the finished document

mod document;
mod page;
mod text;
mod xobject;

pub use document::*;
pub use page::*;
pub use text::*;
pub use xobject::*;
