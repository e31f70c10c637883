//! CSV output

use super::{AnnotationRecord, Printer};
use crate::error::{Error, Result};
use crate::types::Document;

/// Which columns a [`CsvPrinter`] writes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CsvStyle {
    /// One column per annotation field
    Full,
    /// A to-do list of comments: location, context and explanation
    Todo,
}

impl CsvStyle {
    fn fieldnames(&self) -> &'static [&'static str] {
        match self {
            CsvStyle::Full => &[
                "type",
                "page",
                "page_label",
                "start_x",
                "start_y",
                "prior_outline",
                "text",
                "contents",
                "author",
                "created",
                "color",
            ],
            CsvStyle::Todo => &["location", "context", "explanation"],
        }
    }

    fn row(&self, record: AnnotationRecord) -> Vec<String> {
        match self {
            CsvStyle::Full => vec![
                record.subtype.to_string(),
                record.page.to_string(),
                record.page_label.unwrap_or_default(),
                record.start_xy.0.to_string(),
                record.start_xy.1.to_string(),
                record.prior_outline.unwrap_or_default(),
                record.text.unwrap_or_default(),
                record.contents.unwrap_or_default(),
                record.author.unwrap_or_default(),
                record.created.unwrap_or_default(),
                record.color.unwrap_or_default(),
            ],
            CsvStyle::Todo => {
                let mut location = format!("p{}", record.page);
                if let Some(outline) = record.prior_outline {
                    location.push_str(": ");
                    location.push_str(&outline);
                }
                vec![
                    location,
                    record.text.unwrap_or_else(|| "-".to_string()),
                    record.contents.unwrap_or_default(),
                ]
            }
        }
    }
}

/// Prints a header row, then one row per annotation
pub struct CsvPrinter {
    style: CsvStyle,
    print_filename: bool,
    remove_hyphens: bool,
}

impl CsvPrinter {
    pub fn new(style: CsvStyle, print_filename: bool, remove_hyphens: bool) -> Self {
        Self {
            style,
            print_filename,
            remove_hyphens,
        }
    }

    fn write_rows<I>(rows: I) -> Result<String>
    where
        I: IntoIterator<Item = Vec<String>>,
    {
        let mut writer = ::csv::WriterBuilder::new()
            .terminator(::csv::Terminator::CRLF)
            .from_writer(Vec::new());
        for row in rows {
            writer.write_record(&row)?;
        }
        let bytes = writer.into_inner().map_err(|e| Error::Io(e.into_error()))?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

impl Printer for CsvPrinter {
    fn begin(&mut self) -> Result<String> {
        let mut header: Vec<String> = Vec::new();
        if self.print_filename {
            header.push("filename".to_string());
        }
        header.extend(self.style.fieldnames().iter().map(|f| f.to_string()));
        Self::write_rows([header])
    }

    fn print_file(&mut self, filename: &str, document: &Document) -> Result<String> {
        let rows = AnnotationRecord::all(document, self.remove_hyphens)
            .into_iter()
            .map(|record| {
                let mut row = Vec::new();
                if self.print_filename {
                    row.push(filename.to_string());
                }
                row.extend(self.style.row(record));
                row
            });
        Self::write_rows(rows)
    }
}
