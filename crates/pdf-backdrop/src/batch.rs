//! Batch processing of a directory of annexes and covers
//!
//! Annexes are PDFs named `Allegato <id> ...`. Each annex is merged onto the
//! cover whose file name mentions it, preferring `- Allegato <id> -` over a
//! bare `Allegato <id>`. Results are collected per annex; a failing annex
//! never stops the scan.

use crate::constants::{DUPLICATE_TEMP_SUFFIX, TEMP_SUFFIX};
use crate::merge::merge_documents;
use crate::options::{AnnexOverride, BatchOptions, MergeRequest};
use crate::paths::{TemporaryArtifacts, stem_ends_with, with_stem_suffix};
use crate::render::{ObjectCache, OutputDocument, SourceDocument};
use crate::types::*;
use log::{debug, info, warn};
use regex::Regex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

static ANNEX_PATTERN: OnceLock<Option<Regex>> = OnceLock::new();

fn annex_pattern() -> Option<&'static Regex> {
    ANNEX_PATTERN
        .get_or_init(|| Regex::new(r"(?i)^allegato\s+([A-Za-z0-9]+)").ok())
        .as_ref()
}

/// Outcome of one annex in a batch run
#[derive(Debug, Clone, PartialEq)]
pub struct BatchJobResult {
    pub annex_id: String,
    pub annex_path: PathBuf,
    /// Cover the annex was paired with, `None` when no cover matched
    pub cover_path: Option<PathBuf>,
    pub output_path: Option<PathBuf>,
    pub success: bool,
    pub message: String,
}

/// Annex id of a file (`Allegato B - notes.pdf` → `B`), if it is an annex
pub fn annex_id(path: &Path) -> Option<String> {
    let stem = path.file_stem()?.to_str()?;
    let captures = annex_pattern()?.captures(stem)?;
    captures.get(1).map(|id| id.as_str().to_string())
}

/// Pick the cover for an annex among `candidates` (kept in scan order).
pub fn find_cover<'a>(annex_id: &str, candidates: &'a [PathBuf]) -> Option<&'a PathBuf> {
    let id = annex_id.to_lowercase();
    let delimited = format!("- allegato {} -", id);
    let loose = format!("allegato {}", id);

    let mentions = |needle: &str| {
        candidates.iter().find(|path| {
            path.file_name()
                .map(|name| name.to_string_lossy().to_lowercase().contains(needle))
                .unwrap_or(false)
        })
    };

    mentions(&delimited).or_else(|| mentions(&loose))
}

/// Merge every annex in `directory` onto its cover.
///
/// Outputs land in `<directory>/<output_subdir>/<cover file name>`. A cover
/// serves the first annex that merges onto it; later annexes resolving to the
/// same cover fail with [`MergeError::CoverCollision`].
///
/// Fails only when the directory cannot be scanned or the output directory
/// cannot be created; per-annex problems are reported in the results.
pub fn process_batch(directory: &Path, options: &BatchOptions) -> Result<Vec<BatchJobResult>> {
    if !directory.is_dir() {
        return Err(MergeError::NotADirectory(directory.to_path_buf()));
    }
    options.validate()?;

    let mut annexes = Vec::new();
    let mut covers = Vec::new();
    for path in list_pdfs(directory)? {
        // Leftovers of interrupted runs are neither annexes nor covers
        if stem_ends_with(&path, TEMP_SUFFIX) {
            continue;
        }
        match annex_id(&path) {
            Some(id) => annexes.push((id, path)),
            None => covers.push(path),
        }
    }

    info!(
        "Found {} annexes and {} cover candidates in {}",
        annexes.len(),
        covers.len(),
        directory.display()
    );

    let output_dir = directory.join(&options.output_subdir);
    if !annexes.is_empty() {
        std::fs::create_dir_all(&output_dir).map_err(MergeError::filesystem(&output_dir))?;
    }

    // Output path → annex that produced it
    let mut claimed = HashMap::new();
    Ok(annexes
        .into_iter()
        .map(|(id, annex_path)| {
            process_annex(id, annex_path, &covers, &output_dir, options, &mut claimed)
        })
        .collect())
}

/// All `*.pdf` files directly inside `directory`, sorted by file name
fn list_pdfs(directory: &Path) -> Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(directory).map_err(MergeError::filesystem(directory))?;

    let mut pdfs = Vec::new();
    for entry in entries {
        let path = entry.map_err(MergeError::filesystem(directory))?.path();
        let is_pdf = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("pdf"))
            .unwrap_or(false);
        if is_pdf && path.is_file() {
            pdfs.push(path);
        }
    }
    pdfs.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(pdfs)
}

fn process_annex(
    annex_id: String,
    annex_path: PathBuf,
    covers: &[PathBuf],
    output_dir: &Path,
    options: &BatchOptions,
    claimed: &mut HashMap<PathBuf, String>,
) -> BatchJobResult {
    let Some(cover_path) = find_cover(&annex_id, covers) else {
        let error = MergeError::MissingPair {
            annex_id: annex_id.clone(),
        };
        warn!("{}", error);
        return BatchJobResult {
            annex_id,
            annex_path,
            cover_path: None,
            output_path: None,
            success: false,
            message: error.to_string(),
        };
    };

    let output_path = match cover_path.file_name() {
        Some(name) => output_dir.join(name),
        None => output_dir.join(format!("allegato_{}.pdf", annex_id)),
    };
    debug!(
        "Annex {} pairs with cover {}",
        annex_id,
        cover_path.display()
    );

    let outcome = match claimed.get(&output_path) {
        Some(owner) => Err(MergeError::CoverCollision {
            cover: cover_path.clone(),
            claimed_by: owner.clone(),
        }),
        None => run_annex_job(&annex_id, &annex_path, cover_path, &output_path, options),
    };
    let (success, message) = match outcome {
        Ok(()) => {
            claimed.insert(output_path.clone(), annex_id.clone());
            (true, format!("merged into {}", output_path.display()))
        }
        Err(e) => {
            warn!("Annex {} failed: {}", annex_id, e);
            (false, e.to_string())
        }
    };

    BatchJobResult {
        annex_id,
        annex_path,
        cover_path: Some(cover_path.clone()),
        output_path: Some(output_path),
        success,
        message,
    }
}

fn run_annex_job(
    annex_id: &str,
    annex_path: &Path,
    cover_path: &Path,
    output_path: &Path,
    options: &BatchOptions,
) -> Result<()> {
    let mut artifacts = TemporaryArtifacts::new();

    let mut request = MergeRequest::new(cover_path, annex_path, output_path);
    request.scale_percent = options.scale_percent;
    request.remove_first_content_page = options.remove_first_content_page;
    request.numbering = options.numbering.clone();

    match options.override_for(annex_id) {
        Some(AnnexOverride::AppendOnly) => {
            debug!("Annex {}: append only", annex_id);
            request.append_only = true;
        }
        Some(AnnexOverride::DuplicateFirstPage) => {
            let duplicate = with_stem_suffix(annex_path, DUPLICATE_TEMP_SUFFIX);
            debug!(
                "Annex {}: duplicating first page into {}",
                annex_id,
                duplicate.display()
            );
            artifacts.register(&duplicate);
            duplicate_first_page(annex_path, &duplicate)?;
            request.content_path = duplicate;
        }
        None => {}
    }

    merge_documents(&request)
}

/// Write a copy of `source` whose first page appears twice
fn duplicate_first_page(source: &Path, destination: &Path) -> Result<()> {
    let content = SourceDocument::open(source)?;
    if content.page_count() == 0 {
        return Err(MergeError::open(source, "document has no pages"));
    }

    let mut output = OutputDocument::new();
    let mut cache = ObjectCache::new();
    output.import_page(&content, 0, &mut cache)?;
    output.import_pages(&content, 0..content.page_count(), &mut cache)?;
    output.save(destination)
}
