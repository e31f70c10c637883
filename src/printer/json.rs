//! JSON and JSON Lines output

use super::{AnnotationRecord, Printer};
use crate::error::Result;
use crate::types::Document;
use serde::Serialize;
use serde_json::ser::PrettyFormatter;

/// Prints a JSON array of annotation records, or an object mapping each
/// file name to its array when file names are printed.
pub struct JsonPrinter {
    print_filename: bool,
    remove_hyphens: bool,
    seen_first: bool,
}

impl JsonPrinter {
    pub fn new(print_filename: bool, remove_hyphens: bool) -> Self {
        Self {
            print_filename,
            remove_hyphens,
            seen_first: false,
        }
    }
}

impl Printer for JsonPrinter {
    fn begin(&mut self) -> Result<String> {
        Ok(if self.print_filename { "{\n" } else { "" }.to_string())
    }

    fn print_file(&mut self, filename: &str, document: &Document) -> Result<String> {
        let mut out = String::new();

        // Separate successive files
        if self.seen_first {
            out.push_str(",\n");
        }
        self.seen_first = true;

        if self.print_filename {
            out.push_str(&format!("  {}: ", serde_json::to_string(filename)?));
        }

        let records = AnnotationRecord::all(document, self.remove_hyphens);
        let mut buf = Vec::new();
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
        records.serialize(&mut ser)?;
        out.push_str(&String::from_utf8_lossy(&buf));
        Ok(out)
    }

    fn end(&mut self) -> Result<String> {
        Ok(if self.print_filename { "\n}\n" } else { "\n" }.to_string())
    }
}

#[derive(Serialize)]
struct FileRecord<'a> {
    file: &'a str,
    annotations: Vec<AnnotationRecord>,
}

/// Prints one JSON object per file, one per line.
pub struct JsonlPrinter {
    remove_hyphens: bool,
    seen_first: bool,
}

impl JsonlPrinter {
    pub fn new(remove_hyphens: bool) -> Self {
        Self {
            remove_hyphens,
            seen_first: false,
        }
    }
}

impl Printer for JsonlPrinter {
    fn print_file(&mut self, filename: &str, document: &Document) -> Result<String> {
        let mut out = String::new();
        if self.seen_first {
            out.push('\n');
        }
        self.seen_first = true;

        let record = FileRecord {
            file: filename,
            annotations: AnnotationRecord::all(document, self.remove_hyphens),
        };
        out.push_str(&serde_json::to_string(&record)?);
        Ok(out)
    }

    fn end(&mut self) -> Result<String> {
        Ok("\n".to_string())
    }
}
