//! Configuration for extraction and printing

use clap::ValueEnum;

/// Tunables for text layout analysis.
///
/// Margins are relative to character (or line) size, so the defaults work
/// across font sizes.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutParams {
    /// Two characters overlapping vertically by more than this fraction of
    /// the smaller height are on the same line
    pub line_overlap: f64,
    /// Characters closer than this multiple of the wider character's width
    /// are part of the same line
    pub char_margin: f64,
    /// Characters on a line further apart than this multiple of the
    /// character size are separate words
    pub word_margin: f64,
    /// Lines closer than this multiple of the line height belong to the
    /// same text block
    pub line_margin: f64,
    /// Weight of horizontal (-1.0) versus vertical (+1.0) position when
    /// ordering text blocks. `None` orders blocks strictly top to bottom.
    pub boxes_flow: Option<f64>,
    /// Also build lines of vertically written text
    pub detect_vertical: bool,
}

impl Default for LayoutParams {
    fn default() -> Self {
        Self {
            line_overlap: 0.5,
            char_margin: 2.0,
            word_margin: 0.1,
            line_margin: 0.5,
            boxes_flow: Some(0.5),
            detect_vertical: false,
        }
    }
}

/// Options controlling how a single PDF is read
#[derive(Debug, Clone, Default)]
pub struct ExtractOptions {
    /// Assume a fixed top-to-bottom, left-to-right layout with this many
    /// columns per page instead of inferring reading order from the text
    pub columns_per_page: Option<u32>,
    /// Layout analysis parameters
    pub layout: LayoutParams,
    /// Password for encrypted documents
    pub password: Option<String>,
    /// Show a progress bar on stderr while pages are processed
    pub emit_progress: bool,
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Markdown
    #[default]
    Md,
    /// Plain text with the same layout as Markdown
    Txt,
    /// JSON array (or object keyed by file name)
    Json,
    /// One JSON object per input file, one per line
    Jsonl,
    /// CSV, one row per annotation
    Csv,
    /// CSV to-do list of comments (location, context, explanation)
    Todocsv,
}

/// A section of grouped Markdown output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum Section {
    Highlights,
    Comments,
    Nits,
}

impl Section {
    pub const ALL: [Section; 3] = [Section::Highlights, Section::Comments, Section::Nits];
}

/// Options controlling rendered output
#[derive(Debug, Clone)]
pub struct PrintOptions {
    /// Permit the condensed one-line format for short annotations
    pub condense: bool,
    /// Group annotations into sections (Markdown and text only)
    pub group: bool,
    /// Group highlights by colour within the highlights section
    pub group_highlights_by_color: bool,
    /// Added to 1-based page numbers when no page label is used
    pub page_number_offset: i32,
    /// Print the name of each file with annotations
    pub print_filename: bool,
    /// Remove hyphens when joining text across a line break
    pub remove_hyphens: bool,
    /// Prefer the document's page labels over page numbers
    pub use_page_labels: bool,
    /// Word-wrap output at this column
    pub wrap_column: Option<usize>,
    /// Sections to emit, in order
    pub sections: Vec<Section>,
}

impl Default for PrintOptions {
    fn default() -> Self {
        Self {
            condense: true,
            group: true,
            group_highlights_by_color: false,
            page_number_offset: 0,
            print_filename: false,
            remove_hyphens: true,
            use_page_labels: true,
            wrap_column: None,
            sections: Section::ALL.to_vec(),
        }
    }
}
