//! Command line interface

use crate::config::{ExtractOptions, LayoutParams, OutputFormat, PrintOptions, Section};
use crate::error::Error;
use crate::pdf::AnnotationReader;
use crate::printer::create_printer;
use crate::source::resolve_inputs;
use anyhow::Context;
use clap::Parser;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use tracing::{info, warn};

/// Ordering weight for text blocks, or `None` when disabled
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxesFlow(pub Option<f64>);

fn parse_boxes_flow(s: &str) -> Result<BoxesFlow, String> {
    if s.eq_ignore_ascii_case("disabled") {
        return Ok(BoxesFlow(None));
    }
    let value: f64 = s
        .parse()
        .map_err(|_| format!("'{}' is neither a number nor 'disabled'", s))?;
    if !(-1.0..=1.0).contains(&value) {
        return Err(format!("{} is not between -1.0 and 1.0", value));
    }
    Ok(BoxesFlow(Some(value)))
}

/// Extracts annotations from PDF files
#[derive(Debug, Parser)]
#[command(name = "pdfannots", version, about)]
pub struct Cli {
    /// PDF files to process, or directories to search for them
    #[arg(value_name = "INFILE", required = true)]
    pub infiles: Vec<PathBuf>,

    /// Emit progress information to stderr
    #[arg(short, long)]
    pub progress: bool,

    /// Output file (default is stdout)
    #[arg(short, long, value_name = "OUTFILE")]
    pub output: Option<PathBuf>,

    /// Assume a fixed top-to-bottom left-to-right page layout with this many
    /// columns per page. If unset, PDF layout analysis orders the text.
    #[arg(short = 'n', long, value_name = "COLS", value_parser = clap::value_parser!(u32).range(1..))]
    pub cols: Option<u32>,

    /// When joining text across a line break, keep trailing hyphens
    #[arg(long)]
    pub keep_hyphens: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Md)]
    pub format: OutputFormat,

    /// Password for encrypted PDFs
    #[arg(long)]
    pub password: Option<String>,

    /// Search directories recursively
    #[arg(short, long)]
    pub recursive: bool,

    /// File name pattern for directory inputs (case-insensitive)
    #[arg(long, value_name = "GLOB")]
    pub pattern: Option<String>,

    /// PDFium library file, or the directory containing it
    #[arg(long, value_name = "PATH", env = "PDFANNOTS_PDFIUM_PATH")]
    pub pdfium_path: Option<PathBuf>,

    /// Emit annotations in document order, without grouping into sections
    #[arg(long, help_heading = "Markdown options", conflicts_with = "group_highlights_by_color")]
    pub no_group: bool,

    /// Sections to emit, in order
    #[arg(
        short,
        long,
        value_enum,
        num_args = 1..,
        value_delimiter = ',',
        default_values_t = Section::ALL,
        help_heading = "Markdown options"
    )]
    pub sections: Vec<Section>,

    /// Group highlights by colour in grouped output
    #[arg(long, help_heading = "Markdown options")]
    pub group_highlights_by_color: bool,

    /// Never use the condensed one-line format for short annotations
    #[arg(long, help_heading = "Markdown options")]
    pub no_condense: bool,

    /// Ignore page labels if present, always use page numbers
    #[arg(long, help_heading = "Markdown options")]
    pub no_page_labels: bool,

    /// Offset added to page numbers (when no page label is used)
    #[arg(
        long,
        value_name = "N",
        default_value_t = 0,
        allow_negative_numbers = true,
        help_heading = "Markdown options"
    )]
    pub page_number_offset: i32,

    /// Print the name of each file with annotations
    #[arg(long, help_heading = "Markdown options")]
    pub print_filename: bool,

    /// Wrap text at this many output columns
    #[arg(short, long, value_name = "COLS", help_heading = "Markdown options")]
    pub wrap: Option<usize>,

    /// Minimum vertical overlap between characters of the same line, as a
    /// fraction of their height
    #[arg(long, default_value_t = 0.5, help_heading = "Layout analysis")]
    pub line_overlap: f64,

    /// Characters closer than this (relative to their width) share a line
    #[arg(long, default_value_t = 2.0, help_heading = "Layout analysis")]
    pub char_margin: f64,

    /// Gap between characters (relative to their size) that inserts a space
    #[arg(long, default_value_t = 0.1, help_heading = "Layout analysis")]
    pub word_margin: f64,

    /// Lines closer than this (relative to their height) share a block
    #[arg(long, default_value_t = 0.5, help_heading = "Layout analysis")]
    pub line_margin: f64,

    /// Weight of horizontal (-1.0) versus vertical (+1.0) position when
    /// ordering text blocks, or 'disabled'
    #[arg(
        long,
        value_name = "FLOW",
        value_parser = parse_boxes_flow,
        default_value = "0.5",
        allow_negative_numbers = true,
        help_heading = "Layout analysis"
    )]
    pub boxes_flow: BoxesFlow,

    /// Consider vertically written text when laying out pages
    #[arg(long, help_heading = "Layout analysis")]
    pub detect_vertical: bool,
}

impl Cli {
    pub fn layout_params(&self) -> LayoutParams {
        LayoutParams {
            line_overlap: self.line_overlap,
            char_margin: self.char_margin,
            word_margin: self.word_margin,
            line_margin: self.line_margin,
            boxes_flow: self.boxes_flow.0,
            detect_vertical: self.detect_vertical,
        }
    }

    pub fn extract_options(&self) -> ExtractOptions {
        ExtractOptions {
            columns_per_page: self.cols,
            layout: self.layout_params(),
            password: self.password.clone(),
            emit_progress: self.progress,
        }
    }

    pub fn print_options(&self) -> PrintOptions {
        PrintOptions {
            condense: !self.no_condense,
            group: !self.no_group,
            group_highlights_by_color: self.group_highlights_by_color,
            page_number_offset: self.page_number_offset,
            print_filename: self.print_filename,
            remove_hyphens: !self.keep_hyphens,
            use_page_labels: !self.no_page_labels,
            wrap_column: self.wrap,
            sections: self.sections.clone(),
        }
    }
}

fn emit(out: &mut dyn Write, text: String) -> io::Result<()> {
    if text.is_empty() {
        return Ok(());
    }
    out.write_all(text.as_bytes())
}

/// Context for a file that could not be read
fn failure_context(name: &str, err: &Error) -> String {
    if err.is_password_error() {
        format!("Failed to process {} (supply the password with --password)", name)
    } else {
        format!("Failed to process {}", name)
    }
}

/// Process every input and write the rendered annotations.
pub fn run(cli: Cli) -> anyhow::Result<()> {
    let files = resolve_inputs(&cli.infiles, cli.recursive, cli.pattern.as_deref())?;
    if files.is_empty() {
        warn!("No PDF files to process");
        return Ok(());
    }

    let reader = AnnotationReader::new(cli.pdfium_path.as_deref())
        .context("Failed to load the PDFium library")?;
    let extract_options = cli.extract_options();
    let mut printer = create_printer(cli.format, &cli.print_options(), files.len() > 1);

    let mut out: Box<dyn Write> = match &cli.output {
        Some(path) => Box::new(BufWriter::new(File::create(path).with_context(|| {
            format!("Failed to create output file {}", path.display())
        })?)),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };

    emit(&mut out, printer.begin()?)?;
    for file in &files {
        info!("Processing {}", file.display());
        let name = file.display().to_string();
        let document = reader.read_file(file, &extract_options).map_err(|e| {
            let context = failure_context(&name, &e);
            anyhow::Error::new(e).context(context)
        })?;
        emit(&mut out, printer.print_file(&name, &document)?)?;
    }
    emit(&mut out, printer.end()?)?;
    out.flush()?;

    Ok(())
}
