//! Fonts for the numbering pass
//!
//! Page numbers use either one of the standard PDF fonts (never embedded,
//! metrics from the Adobe AFM files) or an external TrueType file whose
//! metrics are read with `ttf-parser` and which is embedded in the output.

use crate::constants::{DEFAULT_FONT_NAME, FALLBACK_FONT_IDENTIFIER};
use crate::options::NumberingConfig;
use crate::types::*;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Fonts offered to the user: display name → font file (`None` = built-in)
pub type FontCatalog = BTreeMap<String, Option<PathBuf>>;

/// Pick a font from the catalog produced by font discovery.
///
/// Unknown names and empty catalogs fall back to built-in Helvetica.
pub fn resolve_font_choice(catalog: &FontCatalog, name: &str) -> (String, Option<PathBuf>) {
    match catalog.get(name) {
        Some(path) => (name.to_string(), path.clone()),
        None => (DEFAULT_FONT_NAME.to_string(), None),
    }
}

/// Reduce a display name to ASCII alphanumerics so it can serve as a PDF name.
pub fn sanitize_font_name(display_name: &str) -> String {
    let sanitized: String = display_name
        .chars()
        .filter(|ch| ch.is_ascii_alphanumeric())
        .collect();
    if sanitized.is_empty() {
        FALLBACK_FONT_IDENTIFIER.to_string()
    } else {
        sanitized
    }
}

/// Standard PDF fonts usable without embedding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StandardFont {
    Helvetica,
    HelveticaBold,
    TimesRoman,
    TimesBold,
    Courier,
    CourierBold,
}

impl StandardFont {
    pub const ALL: [StandardFont; 6] = [
        StandardFont::Helvetica,
        StandardFont::HelveticaBold,
        StandardFont::TimesRoman,
        StandardFont::TimesBold,
        StandardFont::Courier,
        StandardFont::CourierBold,
    ];

    /// Look up a font by base name or short alias, ignoring case
    pub fn from_identifier(identifier: &str) -> Option<StandardFont> {
        match identifier.trim().to_ascii_lowercase().as_str() {
            "helvetica" | "helv" => Some(StandardFont::Helvetica),
            "helvetica-bold" | "hebo" => Some(StandardFont::HelveticaBold),
            "times-roman" | "times" | "tiro" => Some(StandardFont::TimesRoman),
            "times-bold" | "tibo" => Some(StandardFont::TimesBold),
            "courier" | "cour" => Some(StandardFont::Courier),
            "courier-bold" | "cobo" => Some(StandardFont::CourierBold),
            _ => None,
        }
    }

    /// PDF BaseFont name
    pub fn base_name(self) -> &'static str {
        match self {
            StandardFont::Helvetica => "Helvetica",
            StandardFont::HelveticaBold => "Helvetica-Bold",
            StandardFont::TimesRoman => "Times-Roman",
            StandardFont::TimesBold => "Times-Bold",
            StandardFont::Courier => "Courier",
            StandardFont::CourierBold => "Courier-Bold",
        }
    }

    pub fn metrics(self) -> GlyphMetrics {
        let (ascender, descender) = match self {
            StandardFont::Helvetica | StandardFont::HelveticaBold => (718, -207),
            StandardFont::TimesRoman | StandardFont::TimesBold => (683, -217),
            StandardFont::Courier | StandardFont::CourierBold => (629, -157),
        };
        GlyphMetrics {
            ascender: ascender as f32 / 1000.0,
            descender: descender as f32 / 1000.0,
        }
    }

    /// Advance width in 1/1000 em.
    ///
    /// Only digits and the space are tabulated; page numbers never need more.
    pub fn char_width(self, ch: char) -> u16 {
        match self {
            StandardFont::Courier | StandardFont::CourierBold => 600,
            StandardFont::Helvetica | StandardFont::HelveticaBold => match ch {
                ' ' => 278,
                _ => 556,
            },
            StandardFont::TimesRoman | StandardFont::TimesBold => match ch {
                ' ' => 250,
                _ => 500,
            },
        }
    }
}

/// A TrueType font loaded from disk
#[derive(Debug, Clone)]
pub struct TrueTypeFont {
    pub(crate) name: String,
    pub(crate) data: Vec<u8>,
    pub(crate) units_per_em: u16,
    pub(crate) ascender: i16,
    pub(crate) descender: i16,
    pub(crate) bbox: [i16; 4],
    pub(crate) cap_height: i16,
    pub(crate) italic_angle: f32,
    pub(crate) flags: u32,
    /// Advance widths in 1/1000 em for codes `FIRST_CHAR..=LAST_CHAR`
    pub(crate) widths: Vec<u16>,
}

impl TrueTypeFont {
    /// First character code covered by the width table
    pub const FIRST_CHAR: u8 = 32;
    /// Last character code covered by the width table
    pub const LAST_CHAR: u8 = 126;

    pub fn load(path: &Path, display_name: &str) -> Result<Self> {
        let data = std::fs::read(path).map_err(MergeError::filesystem(path))?;
        Self::from_bytes(data, display_name)
    }

    pub fn from_bytes(data: Vec<u8>, display_name: &str) -> Result<Self> {
        let face = ttf_parser::Face::parse(&data, 0)
            .map_err(|e| MergeError::Font(format!("Failed to parse TrueType font: {}", e)))?;

        let units_per_em = face.units_per_em();
        if units_per_em == 0 {
            return Err(MergeError::Font("Font reports zero units per em".to_string()));
        }

        let ascender = face.ascender();
        let descender = face.descender();
        let bbox = face.global_bounding_box();
        let cap_height = face.capital_height().unwrap_or(ascender);
        let italic_angle = face.italic_angle();

        // Nonsymbolic, plus FixedPitch / Italic when the face says so
        let mut flags = 32u32;
        if face.is_monospaced() {
            flags |= 1;
        }
        if face.is_italic() {
            flags |= 64;
        }

        let notdef_width = face.glyph_hor_advance(ttf_parser::GlyphId(0)).unwrap_or(0);
        let widths = (Self::FIRST_CHAR..=Self::LAST_CHAR)
            .map(|code| {
                let raw = face
                    .glyph_index(code as char)
                    .and_then(|gid| face.glyph_hor_advance(gid))
                    .unwrap_or(notdef_width);
                ((raw as u32 * 1000) / units_per_em as u32) as u16
            })
            .collect();

        Ok(Self {
            name: sanitize_font_name(display_name),
            data,
            units_per_em,
            ascender,
            descender,
            bbox: [bbox.x_min, bbox.y_min, bbox.x_max, bbox.y_max],
            cap_height,
            italic_angle,
            flags,
            widths,
        })
    }

    /// Sanitized font name, used as BaseFont and resource name
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn metrics(&self) -> GlyphMetrics {
        GlyphMetrics {
            ascender: self.ascender as f32 / self.units_per_em as f32,
            descender: self.descender as f32 / self.units_per_em as f32,
        }
    }

    /// Advance width in 1/1000 em
    pub fn char_width(&self, ch: char) -> u16 {
        let code = ch as u32;
        if code < Self::FIRST_CHAR as u32 || code > Self::LAST_CHAR as u32 {
            return self.widths.first().copied().unwrap_or(0);
        }
        self.widths[(code - Self::FIRST_CHAR as u32) as usize]
    }

    /// Scale a font unit value to 1/1000 em
    pub(crate) fn to_thousandths(&self, value: i16) -> i64 {
        (value as i64 * 1000) / self.units_per_em as i64
    }
}

/// Font resolved for one numbering pass
#[derive(Debug, Clone)]
pub enum NumberingFont {
    Standard(StandardFont),
    TrueType(TrueTypeFont),
}

impl NumberingFont {
    /// Resolve the font a numbering configuration asks for
    pub fn load(config: &NumberingConfig) -> Result<Self> {
        match config.font_file() {
            Some(path) => Ok(NumberingFont::TrueType(TrueTypeFont::load(
                path,
                config.font_identifier(),
            )?)),
            None => StandardFont::from_identifier(config.font_identifier())
                .map(NumberingFont::Standard)
                .ok_or_else(|| {
                    MergeError::Font(format!(
                        "Unknown built-in font: {}",
                        config.font_identifier()
                    ))
                }),
        }
    }

    /// Name of the font in page resource dictionaries
    pub fn resource_name(&self) -> String {
        match self {
            NumberingFont::Standard(font) => sanitize_font_name(font.base_name()),
            NumberingFont::TrueType(font) => font.name.clone(),
        }
    }

    pub fn metrics(&self) -> GlyphMetrics {
        match self {
            NumberingFont::Standard(font) => font.metrics(),
            NumberingFont::TrueType(font) => font.metrics(),
        }
    }

    /// Width of `text` in points at `font_size`
    pub fn measure_text(&self, text: &str, font_size: f32) -> f32 {
        let total: u32 = text
            .chars()
            .map(|ch| match self {
                NumberingFont::Standard(font) => font.char_width(ch) as u32,
                NumberingFont::TrueType(font) => font.char_width(ch) as u32,
            })
            .sum();
        total as f32 * font_size / 1000.0
    }
}
