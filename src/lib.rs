//! pdfannots Library
//!
//! Extracts annotations from PDF documents together with the text they
//! mark:
//! - `pdf`: read annotations, outlines and page text through PDFium
//! - `extract`: attach marked text and surrounding context to annotations
//! - `printer`: render documents as Markdown, plain text, JSON or CSV
//! - `source`: expand command-line inputs into PDF files

pub mod cli;
pub mod config;
pub mod error;
pub mod extract;
pub mod layout;
pub mod pdf;
pub mod printer;
pub mod source;
pub mod text;
pub mod types;

pub use config::{ExtractOptions, LayoutParams, OutputFormat, PrintOptions, Section};
pub use error::{Error, Result};
pub use pdf::AnnotationReader;
pub use printer::{create_printer, Printer};
pub use types::{Annotation, AnnotationType, Document, Outline, Page, Pos, Rect, Rgb};
