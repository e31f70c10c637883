//! PDF processing layer
//!
//! This module reads annotations, outlines, page labels and character
//! boxes using PDFium.

mod reader;

pub use reader::{has_pdf_header, AnnotationReader};
