//! Recognition result types

use inkscan_core::{CharacterVariant, MetaClass, Rect, TrainedProfile};
use inkscan_segment::RowBand;

/// Size and placement statistics copied from the matched profile
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GlyphStats {
    /// Average trained width
    pub avg_width: f64,
    /// Average trained height
    pub avg_height: f64,
    /// Lowest observed relative vertical center
    pub center_min: f64,
    /// Highest observed relative vertical center
    pub center_max: f64,
}

impl GlyphStats {
    /// Copies the statistics out of a trained profile
    pub fn from_profile(profile: &TrainedProfile) -> Self {
        Self {
            avg_width: profile.avg_width,
            avg_height: profile.avg_height,
            center_min: profile.center_min,
            center_max: profile.center_max,
        }
    }
}

/// One recognized glyph in a text line
#[derive(Debug, Clone)]
pub struct RecognizedGlyph {
    /// The matched character variant
    pub key: CharacterVariant,
    /// Absolute position and size on the page
    pub bounds: Rect,
    /// Statistics of the matched profile
    pub stats: GlyphStats,
    /// Coarse category after any merges
    pub meta: MetaClass,
    /// Times this glyph was fused with another
    pub merge_count: u32,
    /// Original pixel coordinates, kept for diagnostics
    pub coords: Vec<(u32, u32)>,
}

impl RecognizedGlyph {
    /// The logical character
    pub fn letter(&self) -> char {
        self.key.letter
    }

    /// True for synthesized space glyphs
    pub fn is_space(&self) -> bool {
        self.key.letter == ' '
    }
}

/// An ordered sequence of glyphs sharing one line band
#[derive(Debug, Clone)]
pub struct TextLine {
    /// The band this line occupies
    pub band: RowBand,
    /// Glyphs sorted by x ascending
    pub glyphs: Vec<RecognizedGlyph>,
}

impl TextLine {
    /// Creates an empty line for a band
    pub fn new(band: RowBand) -> Self {
        Self {
            band,
            glyphs: Vec::new(),
        }
    }

    /// Restores the x-ascending glyph order after insertions
    pub fn sort_by_x(&mut self) {
        self.glyphs.sort_by_key(|g| g.bounds.x);
    }

    /// Renders the line's characters left to right
    pub fn text(&self) -> String {
        self.glyphs.iter().map(|g| g.key.letter).collect()
    }
}

/// A recognized page: lines ordered top to bottom
#[derive(Debug, Clone, Default)]
pub struct Page {
    /// The page's text lines
    pub lines: Vec<TextLine>,
}

impl Page {
    /// Renders the page as newline-separated text
    pub fn text(&self) -> String {
        self.lines
            .iter()
            .map(TextLine::text)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl std::fmt::Display for Page {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.text())
    }
}
