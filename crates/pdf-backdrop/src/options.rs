use crate::constants::{
    DEFAULT_FONT_NAME, DEFAULT_OUTPUT_SUBDIR, DEFAULT_SCALE_PERCENT, PAGE_NUMBER_FONT_SIZE,
    PAGE_NUMBER_MARGIN_MM,
};
use crate::fonts::StandardFont;
use crate::types::*;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Where page numbers are placed on each page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum NumberPosition {
    TopLeft,
    TopCenter,
    TopRight,
    BottomLeft,
    BottomCenter,
    #[default]
    BottomRight,
}

/// Horizontal alignment of text inside its box
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HorizontalAlign {
    Left,
    Center,
    Right,
}

impl NumberPosition {
    pub const ALL: [NumberPosition; 6] = [
        NumberPosition::TopLeft,
        NumberPosition::TopCenter,
        NumberPosition::TopRight,
        NumberPosition::BottomLeft,
        NumberPosition::BottomCenter,
        NumberPosition::BottomRight,
    ];

    /// Whether the number box is anchored to the top margin
    pub fn is_top(self) -> bool {
        matches!(
            self,
            NumberPosition::TopLeft | NumberPosition::TopCenter | NumberPosition::TopRight
        )
    }

    pub fn align(self) -> HorizontalAlign {
        match self {
            NumberPosition::TopLeft | NumberPosition::BottomLeft => HorizontalAlign::Left,
            NumberPosition::TopCenter | NumberPosition::BottomCenter => HorizontalAlign::Center,
            NumberPosition::TopRight | NumberPosition::BottomRight => HorizontalAlign::Right,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            NumberPosition::TopLeft => "top_left",
            NumberPosition::TopCenter => "top_center",
            NumberPosition::TopRight => "top_right",
            NumberPosition::BottomLeft => "bottom_left",
            NumberPosition::BottomCenter => "bottom_center",
            NumberPosition::BottomRight => "bottom_right",
        }
    }
}

impl fmt::Display for NumberPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NumberPosition {
    type Err = MergeError;

    /// Accepts `bottom_right`, `bottom-right` and `Bottom right` spellings.
    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_ascii_lowercase().replace([' ', '-'], "_");
        NumberPosition::ALL
            .into_iter()
            .find(|position| position.as_str() == normalized)
            .ok_or_else(|| {
                MergeError::Configuration(format!("Unsupported page number position: {}", s))
            })
    }
}

/// Distance of the page number box from each page edge
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NumberMargins {
    pub top_mm: f32,
    pub bottom_mm: f32,
    pub left_mm: f32,
    pub right_mm: f32,
}

impl Default for NumberMargins {
    fn default() -> Self {
        Self::uniform(PAGE_NUMBER_MARGIN_MM)
    }
}

impl NumberMargins {
    /// Create uniform margins on all sides
    pub fn uniform(margin_mm: f32) -> Self {
        Self {
            top_mm: margin_mm,
            bottom_mm: margin_mm,
            left_mm: margin_mm,
            right_mm: margin_mm,
        }
    }

    fn validate(&self) -> Result<()> {
        let sides = [
            ("margin_top_mm", self.top_mm),
            ("margin_bottom_mm", self.bottom_mm),
            ("margin_left_mm", self.left_mm),
            ("margin_right_mm", self.right_mm),
        ];
        for (name, value) in sides {
            if !value.is_finite() || value < 0.0 {
                return Err(MergeError::Configuration(format!(
                    "{} must be zero or positive",
                    name
                )));
            }
        }
        Ok(())
    }
}

/// Page numbering options.
///
/// Validated when constructed and immutable afterwards, so a value of this
/// type is always usable by the numbering pass.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(
    feature = "serde",
    serde(try_from = "NumberingFields", into = "NumberingFields")
)]
pub struct NumberingConfig {
    position: NumberPosition,
    font_identifier: String,
    font_file: Option<PathBuf>,
    font_size_pt: f32,
    margins: NumberMargins,
}

impl NumberingConfig {
    pub fn new(
        position: NumberPosition,
        font_identifier: impl Into<String>,
        font_file: Option<PathBuf>,
        font_size_pt: f32,
        margins: NumberMargins,
    ) -> Result<Self> {
        let font_identifier = font_identifier.into();

        if !font_size_pt.is_finite() || font_size_pt <= 0.0 {
            return Err(MergeError::Configuration(
                "font_size must be greater than zero".to_string(),
            ));
        }
        margins.validate()?;

        match &font_file {
            Some(path) if !path.is_file() => {
                return Err(MergeError::Configuration(format!(
                    "Font file does not exist: {}",
                    path.display()
                )));
            }
            Some(_) => {}
            None => {
                if StandardFont::from_identifier(&font_identifier).is_none() {
                    return Err(MergeError::Configuration(format!(
                        "Unknown built-in font: {}",
                        font_identifier
                    )));
                }
            }
        }

        Ok(Self {
            position,
            font_identifier,
            font_file,
            font_size_pt,
            margins,
        })
    }

    /// Same as [`NumberingConfig::new`] with the position given as text
    pub fn parse(
        position: &str,
        font_identifier: impl Into<String>,
        font_file: Option<PathBuf>,
        font_size_pt: f32,
        margins: NumberMargins,
    ) -> Result<Self> {
        Self::new(
            position.parse()?,
            font_identifier,
            font_file,
            font_size_pt,
            margins,
        )
    }

    pub fn position(&self) -> NumberPosition {
        self.position
    }

    pub fn font_identifier(&self) -> &str {
        &self.font_identifier
    }

    pub fn font_file(&self) -> Option<&Path> {
        self.font_file.as_deref()
    }

    pub fn font_size_pt(&self) -> f32 {
        self.font_size_pt
    }

    pub fn margins(&self) -> &NumberMargins {
        &self.margins
    }
}

impl Default for NumberingConfig {
    fn default() -> Self {
        Self {
            position: NumberPosition::default(),
            font_identifier: DEFAULT_FONT_NAME.to_string(),
            font_file: None,
            font_size_pt: PAGE_NUMBER_FONT_SIZE,
            margins: NumberMargins::default(),
        }
    }
}

#[cfg(feature = "serde")]
#[derive(Serialize, Deserialize)]
struct NumberingFields {
    #[serde(default)]
    position: NumberPosition,
    #[serde(default = "default_font_identifier")]
    font: String,
    #[serde(default)]
    font_file: Option<PathBuf>,
    #[serde(default = "default_font_size")]
    font_size_pt: f32,
    #[serde(default)]
    margins: NumberMargins,
}

#[cfg(feature = "serde")]
fn default_font_identifier() -> String {
    DEFAULT_FONT_NAME.to_string()
}

#[cfg(feature = "serde")]
fn default_font_size() -> f32 {
    PAGE_NUMBER_FONT_SIZE
}

#[cfg(feature = "serde")]
impl TryFrom<NumberingFields> for NumberingConfig {
    type Error = MergeError;

    fn try_from(fields: NumberingFields) -> Result<Self> {
        NumberingConfig::new(
            fields.position,
            fields.font,
            fields.font_file,
            fields.font_size_pt,
            fields.margins,
        )
    }
}

#[cfg(feature = "serde")]
impl From<NumberingConfig> for NumberingFields {
    fn from(config: NumberingConfig) -> Self {
        Self {
            position: config.position,
            font: config.font_identifier,
            font_file: config.font_file,
            font_size_pt: config.font_size_pt,
            margins: config.margins,
        }
    }
}

/// A single merge job: background template + content document → output
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MergeRequest {
    pub background_path: PathBuf,
    pub content_path: PathBuf,
    pub output_path: PathBuf,

    /// Content size relative to the backdrop, in percent
    #[cfg_attr(feature = "serde", serde(default = "default_scale_percent"))]
    pub scale_percent: f32,
    /// Skip the content document's cover page
    #[cfg_attr(feature = "serde", serde(default = "default_true"))]
    pub remove_first_content_page: bool,
    /// Delete the background file once the merge has succeeded
    #[cfg_attr(feature = "serde", serde(default))]
    pub delete_background_after: bool,
    /// Concatenate the documents without scaling or backdrops
    #[cfg_attr(feature = "serde", serde(default))]
    pub append_only: bool,

    /// Page numbering pass; `None` leaves pages unnumbered
    #[cfg_attr(feature = "serde", serde(default))]
    pub numbering: Option<NumberingConfig>,
}

#[cfg(feature = "serde")]
fn default_scale_percent() -> f32 {
    DEFAULT_SCALE_PERCENT
}

#[cfg(feature = "serde")]
fn default_true() -> bool {
    true
}

impl MergeRequest {
    pub fn new(
        background_path: impl Into<PathBuf>,
        content_path: impl Into<PathBuf>,
        output_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            background_path: background_path.into(),
            content_path: content_path.into(),
            output_path: output_path.into(),
            scale_percent: DEFAULT_SCALE_PERCENT,
            remove_first_content_page: true,
            delete_background_after: false,
            append_only: false,
            numbering: None,
        }
    }

    /// Scale as a fraction (85% → 0.85)
    pub fn scale_fraction(&self) -> f32 {
        self.scale_percent / 100.0
    }

    /// Validate the request
    pub fn validate(&self) -> Result<()> {
        validate_scale(self.scale_percent)?;

        for (name, path) in [
            ("background", &self.background_path),
            ("content", &self.content_path),
            ("output", &self.output_path),
        ] {
            if path.as_os_str().is_empty() {
                return Err(MergeError::Configuration(format!(
                    "No {} path specified",
                    name
                )));
            }
        }

        Ok(())
    }

    /// Load a request from a JSON file
    #[cfg(feature = "serde")]
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        read_json(path.as_ref())
    }

    /// Save the request to a JSON file
    #[cfg(feature = "serde")]
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        write_json(self, path.as_ref())
    }
}

fn validate_scale(scale_percent: f32) -> Result<()> {
    if !scale_percent.is_finite() || scale_percent <= 0.0 {
        return Err(MergeError::Configuration(
            "scale_percent must be greater than zero".to_string(),
        ));
    }
    Ok(())
}

/// Special handling applied to one annex of a batch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum AnnexOverride {
    /// Concatenate cover and annex without scaling
    AppendOnly,
    /// Merge a copy of the annex whose first page appears twice
    DuplicateFirstPage,
}

/// Options shared by every job of a batch run
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct BatchOptions {
    pub scale_percent: f32,
    pub remove_first_content_page: bool,
    pub numbering: Option<NumberingConfig>,

    /// Name of the subdirectory receiving the merged documents
    pub output_subdir: String,

    /// Per-annex rules keyed by annex id (compared case-insensitively)
    pub overrides: BTreeMap<String, AnnexOverride>,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            scale_percent: DEFAULT_SCALE_PERCENT,
            remove_first_content_page: true,
            numbering: None,
            output_subdir: DEFAULT_OUTPUT_SUBDIR.to_string(),
            overrides: BTreeMap::from([
                ("D".to_string(), AnnexOverride::DuplicateFirstPage),
                ("E".to_string(), AnnexOverride::AppendOnly),
            ]),
        }
    }
}

impl BatchOptions {
    /// Override registered for an annex id, if any
    pub fn override_for(&self, annex_id: &str) -> Option<AnnexOverride> {
        let key = annex_id.to_uppercase();
        self.overrides
            .iter()
            .find(|(id, _)| id.to_uppercase() == key)
            .map(|(_, rule)| *rule)
    }

    /// Validate the options
    pub fn validate(&self) -> Result<()> {
        validate_scale(self.scale_percent)?;

        let mut components = Path::new(&self.output_subdir).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(_)), None) => Ok(()),
            _ => Err(MergeError::Configuration(format!(
                "Output subdirectory must be a single directory name: {:?}",
                self.output_subdir
            ))),
        }
    }

    /// Load options from a JSON file
    #[cfg(feature = "serde")]
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        read_json(path.as_ref())
    }

    /// Save options to a JSON file
    #[cfg(feature = "serde")]
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        write_json(self, path.as_ref())
    }
}

#[cfg(feature = "serde")]
fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let bytes = std::fs::read(path).map_err(MergeError::filesystem(path))?;
    serde_json::from_slice(&bytes)
        .map_err(|e| MergeError::Configuration(format!("Failed to parse config: {}", e)))
}

#[cfg(feature = "serde")]
fn write_json<T: Serialize>(value: &T, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| MergeError::Configuration(format!("Failed to serialize config: {}", e)))?;
    std::fs::write(path, json).map_err(MergeError::filesystem(path))
}
