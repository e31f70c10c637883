//! Output formats
//!
//! Every printer is driven the same way: [`Printer::begin`] once, then
//! [`Printer::print_file`] for each input, then [`Printer::end`]. Each call
//! returns the text to append to the output.

mod csv;
mod json;
mod markdown;

pub use self::csv::{CsvPrinter, CsvStyle};
pub use self::json::{JsonPrinter, JsonlPrinter};
pub use self::markdown::{trim_context, MarkdownPrinter, Style};

use crate::config::{OutputFormat, PrintOptions};
use crate::error::Result;
use crate::types::{Annotation, AnnotationType, Document};
use serde::Serialize;

/// A pretty-printer for extracted annotations
pub trait Printer {
    /// Output preceding the first file
    fn begin(&mut self) -> Result<String> {
        Ok(String::new())
    }

    /// Output for a single document
    fn print_file(&mut self, filename: &str, document: &Document) -> Result<String>;

    /// Output following the last file
    fn end(&mut self) -> Result<String> {
        Ok(String::new())
    }
}

/// Construct the printer for `format`.
///
/// Structured formats always name files when there are several inputs,
/// since their records would otherwise be indistinguishable.
pub fn create_printer(
    format: OutputFormat,
    options: &PrintOptions,
    multiple_inputs: bool,
) -> Box<dyn Printer> {
    let name_files = options.print_filename || multiple_inputs;
    match format {
        OutputFormat::Md => Box::new(MarkdownPrinter::new(options.clone(), Style::Markdown)),
        OutputFormat::Txt => Box::new(MarkdownPrinter::new(options.clone(), Style::Plain)),
        OutputFormat::Json => Box::new(JsonPrinter::new(name_files, options.remove_hyphens)),
        OutputFormat::Jsonl => Box::new(JsonlPrinter::new(options.remove_hyphens)),
        OutputFormat::Csv => Box::new(CsvPrinter::new(
            CsvStyle::Full,
            name_files,
            options.remove_hyphens,
        )),
        OutputFormat::Todocsv => Box::new(CsvPrinter::new(
            CsvStyle::Todo,
            name_files,
            options.remove_hyphens,
        )),
    }
}

/// Flat representation of an annotation for structured output
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnnotationRecord {
    #[serde(rename = "type")]
    pub subtype: &'static str,
    /// 1-based page number
    pub page: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_label: Option<String>,
    pub start_xy: (f64, f64),
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prior_outline: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contents: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl AnnotationRecord {
    pub fn new(document: &Document, annot: &Annotation, remove_hyphens: bool) -> Self {
        let pos = &annot.pos;
        // A suggested replacement's text is what its StrikeOut covers
        let marked = match annot.subtype {
            AnnotationType::Caret => annot
                .child_by_type(AnnotationType::StrikeOut)
                .unwrap_or(annot),
            _ => annot,
        };
        Self {
            subtype: annot.subtype.name(),
            page: pos.page.pageno + 1,
            page_label: document
                .page(pos.page.pageno)
                .and_then(|p| p.label.clone()),
            start_xy: (pos.x, pos.y),
            prior_outline: document.nearest_outline(pos).map(|o| o.title.clone()),
            text: if marked.has_text() {
                marked.gettext(remove_hyphens)
            } else {
                None
            },
            contents: annot.contents.clone(),
            author: annot.author.clone(),
            created: annot
                .created
                .map(|dt| dt.format("%Y-%m-%dT%H:%M:%S").to_string()),
            color: annot.color.map(|c| c.ashex()),
        }
    }

    /// Records for every annotation of the document, in reading order
    pub fn all(document: &Document, remove_hyphens: bool) -> Vec<Self> {
        document
            .iter_annots()
            .map(|a| Self::new(document, a, remove_hyphens))
            .collect()
    }
}
