//! Single merge job orchestration

use crate::compose::{NormalizedTemplate, compose_append, compose_scaled, normalize};
use crate::constants::TEMP_SUFFIX;
use crate::numbering::number_pages;
use crate::options::MergeRequest;
use crate::paths::{
    TemporaryArtifacts, copy_file, paths_equal, remove_if_exists, with_stem_suffix,
};
use crate::types::*;
use log::{debug, info};

/// Run one merge job.
///
/// Pipeline: validate, protect the background when it is also the output,
/// normalize the template (scaled mode), compose, then number the pages.
/// Temporary files are removed on every exit path. The background is only
/// deleted when requested, when it is not also the output, and once every
/// step has succeeded.
pub fn merge_documents(request: &MergeRequest) -> Result<()> {
    request.validate()?;

    let mut artifacts = TemporaryArtifacts::new();
    let output_is_background = paths_equal(&request.background_path, &request.output_path);

    // Writing the output replaces the background, so merge from a copy
    let mut background = request.background_path.clone();
    if output_is_background {
        let copy = with_stem_suffix(&background, TEMP_SUFFIX);
        debug!(
            "Output overwrites the background, merging from copy {}",
            copy.display()
        );
        artifacts.register(&copy);
        copy_file(&request.background_path, &copy)?;
        background = copy;
    }

    if request.append_only {
        compose_append(
            &background,
            &request.content_path,
            &request.output_path,
            request.remove_first_content_page,
        )?;
    } else {
        let template: NormalizedTemplate = normalize(&background)?;
        if let Some(artifact) = &template.artifact {
            artifacts.register(artifact);
        }
        compose_scaled(
            &template,
            &request.content_path,
            &request.output_path,
            request.scale_fraction(),
            request.remove_first_content_page,
        )?;
    }

    if let Some(numbering) = &request.numbering {
        number_pages(&request.output_path, numbering)?;
    }

    drop(artifacts);

    if request.delete_background_after && !output_is_background {
        debug!("Deleting background {}", request.background_path.display());
        remove_if_exists(&request.background_path)?;
    }

    info!(
        "Merged {} onto {} -> {}",
        request.content_path.display(),
        request.background_path.display(),
        request.output_path.display()
    );
    Ok(())
}
