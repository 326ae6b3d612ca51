use crate::constants::ONE_PAGE_TEMP_SUFFIX;
use crate::paths::{remove_if_exists, with_stem_suffix};
use crate::render::{ObjectCache, OutputDocument, SourceDocument};
use crate::types::*;
use log::debug;
use std::path::{Path, PathBuf};

/// A background template ready for the scaled merge
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedTemplate {
    /// Template to merge from (the original or a two-page copy)
    pub path: PathBuf,
    /// Temporary file the caller must delete once the merge is done
    pub artifact: Option<PathBuf>,
    /// Whether the merged output starts with a page that must be dropped
    pub drop_leading_page: bool,
}

/// Make sure the template has at least two pages.
///
/// The scaled merge consumes the last template page as the backdrop, so a
/// single-page template is copied next to the original with its page
/// duplicated. The original file is never modified.
pub fn normalize(background_path: &Path) -> Result<NormalizedTemplate> {
    let source = SourceDocument::open(background_path)?;

    match source.page_count() {
        0 => Err(MergeError::open(background_path, "document has no pages")),
        1 => {
            let artifact = with_stem_suffix(background_path, ONE_PAGE_TEMP_SUFFIX);
            debug!(
                "Template {} has a single page, writing two-page copy {}",
                background_path.display(),
                artifact.display()
            );

            let mut output = OutputDocument::new();
            let mut cache = ObjectCache::new();
            output.import_page(&source, 0, &mut cache)?;
            output.import_page(&source, 0, &mut cache)?;

            if let Err(e) = output.save(&artifact) {
                let _ = remove_if_exists(&artifact);
                return Err(e);
            }

            Ok(NormalizedTemplate {
                path: artifact.clone(),
                artifact: Some(artifact),
                drop_leading_page: true,
            })
        }
        _ => Ok(NormalizedTemplate {
            path: background_path.to_path_buf(),
            artifact: None,
            drop_leading_page: false,
        }),
    }
}
