//! PDF reader wrapper for PDFium

use crate::config::ExtractOptions;
use crate::error::{Error, Result};
use crate::extract::process_page;
use crate::layout::TextChar;
use crate::text::{cleanup_text, decode_datetime};
use crate::types::{Annotation, AnnotationType, Document, Outline, Page, Point, Rect, Rgb};
use indicatif::{ProgressBar, ProgressStyle};
use pdfium_render::prelude::*;
use std::collections::HashMap;
use std::os::raw::c_int;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Outline target coordinates; either may be left unspecified
type OutlineTarget = (Option<f64>, Option<f64>);

/// Whether the data starts with a PDF header
pub fn has_pdf_header(data: &[u8]) -> bool {
    data.len() >= 4 && &data[0..4] == b"%PDF"
}

fn ensure_pdf_header(data: &[u8]) -> Result<()> {
    if has_pdf_header(data) {
        Ok(())
    } else {
        Err(Error::InvalidPdf {
            reason: "Not a valid PDF file".to_string(),
        })
    }
}

/// Bind PDFium, trying an explicit location first, then `./`,
/// `/opt/pdfium/lib` and finally the system library.
fn create_pdfium(library_path: Option<&Path>) -> Result<Pdfium> {
    let mut candidates: Vec<PathBuf> = Vec::new();
    if let Some(path) = library_path {
        if path.is_file() {
            candidates.push(path.to_path_buf());
        } else {
            candidates.push(Pdfium::pdfium_platform_library_name_at_path(path));
        }
    }
    candidates.push(Pdfium::pdfium_platform_library_name_at_path("./"));
    candidates.push(Pdfium::pdfium_platform_library_name_at_path(
        "/opt/pdfium/lib",
    ));

    for candidate in &candidates {
        match Pdfium::bind_to_library(candidate) {
            Ok(bindings) => {
                debug!("Bound PDFium from {}", candidate.display());
                return Ok(Pdfium::new(bindings));
            }
            Err(e) => debug!("PDFium not available at {}: {}", candidate.display(), e),
        }
    }

    let bindings = Pdfium::bind_to_system_library().map_err(|e| Error::Pdfium {
        reason: format!("Failed to initialize PDFium: {}", e),
    })?;
    Ok(Pdfium::new(bindings))
}

/// Map PDFium errors to our error type
fn map_pdfium_error(err: PdfiumError, password_given: bool) -> Error {
    match err {
        PdfiumError::PdfiumLibraryInternalError(PdfiumInternalError::PasswordError) => {
            if password_given {
                Error::IncorrectPassword
            } else {
                Error::PasswordRequired
            }
        }
        _ => Error::Pdfium {
            reason: format!("{}", err),
        },
    }
}

fn to_rect(rect: PdfRect) -> Rect {
    Rect::new(
        f64::from(rect.left().value),
        f64::from(rect.bottom().value),
        f64::from(rect.right().value),
        f64::from(rect.top().value),
    )
}

fn annotation_type(ann_type: PdfPageAnnotationType) -> Option<AnnotationType> {
    match ann_type {
        PdfPageAnnotationType::Text => Some(AnnotationType::Text),
        PdfPageAnnotationType::Highlight => Some(AnnotationType::Highlight),
        PdfPageAnnotationType::Squiggly => Some(AnnotationType::Squiggly),
        PdfPageAnnotationType::Strikeout => Some(AnnotationType::StrikeOut),
        PdfPageAnnotationType::Underline => Some(AnnotationType::Underline),
        PdfPageAnnotationType::Square => Some(AnnotationType::Square),
        PdfPageAnnotationType::FreeText => Some(AnnotationType::FreeText),
        PdfPageAnnotationType::Caret => Some(AnnotationType::Caret),
        _ => None,
    }
}

/// Resolve a partially specified outline target against the page.
fn resolve_target((x, y): OutlineTarget, mediabox: &Rect) -> Option<Point> {
    match (x, y) {
        (None, None) => None,
        (x, y) => Some((x.unwrap_or(mediabox.x0), y.unwrap_or(mediabox.y1))),
    }
}

/// Colour of the first visible path in the annotation's appearance stream.
///
/// PDFium does not report `/C` for annotations that carry an `/AP`, but
/// the appearance is drawn in that colour.
fn appearance_color(annotation: &PdfPageAnnotation) -> Option<PdfColor> {
    annotation.objects().iter().find_map(|object| {
        let path = object.as_path_object()?;
        if path.fill_mode().ok()? != PdfPathFillMode::None {
            path.fill_color().ok()
        } else if path.is_stroked().ok()? {
            path.stroke_color().ok()
        } else {
            None
        }
    })
}

/// For each of the first `count` annotations of the page, the `/Annots`
/// index of the annotation it replies to (`/IRT`).
fn reply_targets(
    bindings: &dyn PdfiumLibraryBindings,
    page: &PdfPage,
    count: usize,
) -> Vec<Option<usize>> {
    let page_handle = bindings.get_handle_from_page(page);
    (0..count)
        .map(|index| {
            let annot = bindings.FPDFPage_GetAnnot(page_handle, c_int::try_from(index).ok()?);
            if annot.is_null() {
                return None;
            }
            let linked = bindings.FPDFAnnot_GetLinkedAnnot(annot, "IRT");
            let target = if linked.is_null() {
                None
            } else {
                let target = bindings.FPDFPage_GetAnnotIndex(page_handle, linked);
                bindings.FPDFPage_CloseAnnot(linked);
                usize::try_from(target).ok()
            };
            bindings.FPDFPage_CloseAnnot(annot);
            target
        })
        .collect()
}

/// Reads a PDF's annotations, outlines and text into a [`Document`].
pub struct AnnotationReader {
    pdfium: Pdfium,
}

impl AnnotationReader {
    /// Bind PDFium. `pdfium_path` may name the library file or its directory.
    pub fn new(pdfium_path: Option<&Path>) -> Result<Self> {
        Ok(Self {
            pdfium: create_pdfium(pdfium_path)?,
        })
    }

    /// Read a PDF from a file path
    pub fn read_file<P: AsRef<Path>>(&self, path: P, options: &ExtractOptions) -> Result<Document> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(Error::PdfNotFound {
                path: path.display().to_string(),
            });
        }

        let data = std::fs::read(path)?;
        self.read_bytes(&data, &path.display().to_string(), options)
    }

    /// Read a PDF from bytes. `name` is only used for progress and logging.
    pub fn read_bytes(&self, data: &[u8], name: &str, options: &ExtractOptions) -> Result<Document> {
        ensure_pdf_header(data)?;

        let document = self
            .pdfium
            .load_pdf_from_byte_slice(data, options.password.as_deref())
            .map_err(|e| map_pdfium_error(e, options.password.is_some()))?;

        let mut outlines_by_page = Self::collect_outlines(&document);

        let pages = document.pages();
        let progress = options
            .emit_progress
            .then(|| Self::progress_bar(u64::from(pages.len()), name));

        let mut result = Vec::with_capacity(usize::from(pages.len()));
        for (pageno, pdf_page) in pages.iter().enumerate() {
            let label = pdf_page.label().map(|l| l.to_string());
            let mediabox = Rect::new(
                0.0,
                0.0,
                f64::from(pdf_page.width().value),
                f64::from(pdf_page.height().value),
            );
            let mut page = Page::new(pageno, label, mediabox, options.columns_per_page);

            for (title, target) in outlines_by_page.remove(&pageno).unwrap_or_default() {
                let target = resolve_target(target, &mediabox);
                page.outlines
                    .push(Outline::new(title, page.page_ref(), target));
            }

            let annotations = pdf_page.annotations();
            let replies = reply_targets(
                self.pdfium.bindings(),
                &pdf_page,
                annotations.len(),
            );
            for (index, annotation) in annotations.iter().enumerate() {
                if let Some(annot) = Self::make_annotation(&annotation, &page) {
                    let in_reply_to = replies.get(index).copied().flatten();
                    page.annots.push(annot.with_reply(index, in_reply_to));
                }
            }

            // Only pages with something to place need their text laid out
            if !page.annots.is_empty() || !page.outlines.is_empty() {
                let chars = Self::page_chars(&pdf_page);
                process_page(&mut page, chars, &options.layout);
            }
            page.group_replies();

            result.push(page);
            if let Some(pb) = &progress {
                pb.inc(1);
            }
        }

        if let Some(pb) = progress {
            pb.finish_and_clear();
        }

        for (pageno, outlines) in outlines_by_page {
            for (title, _) in outlines {
                warn!(
                    "Ignoring outline '{}' targeting missing page #{}",
                    title,
                    pageno + 1
                );
            }
        }

        let document = Document::new(result);
        info!(
            "{}: {} pages, {} annotations",
            name,
            document.pages.len(),
            document.iter_annots().count()
        );
        Ok(document)
    }

    /// Bookmarks at every level, grouped by target page
    fn collect_outlines(document: &PdfDocument) -> HashMap<usize, Vec<(String, OutlineTarget)>> {
        let mut by_page: HashMap<usize, Vec<(String, OutlineTarget)>> = HashMap::new();

        // Walks the whole bookmark tree, depth first
        for bookmark in document.bookmarks().iter() {
            let title = bookmark.title().unwrap_or_default();
            let Some(dest) = bookmark.destination() else {
                debug!("Outline '{}' has no destination", title);
                continue;
            };
            let page_index = match dest.page_index() {
                Ok(index) => usize::from(index),
                Err(e) => {
                    warn!("Unsupported target for outline '{}': {}", title, e);
                    continue;
                }
            };
            let target = match dest.view_settings() {
                Ok(PdfDestinationViewSettings::SpecificCoordinatesAndZoom(x, y, _)) => (
                    x.map(|p| f64::from(p.value)),
                    y.map(|p| f64::from(p.value)),
                ),
                _ => (None, None),
            };
            by_page.entry(page_index).or_default().push((title, target));
        }

        by_page
    }

    fn make_annotation(annotation: &PdfPageAnnotation, page: &Page) -> Option<Annotation> {
        let ann_type = annotation.annotation_type();
        let Some(subtype) = annotation_type(ann_type) else {
            debug!("Ignoring {:?} annotation on {}", ann_type, page);
            return None;
        };

        let rect = annotation.bounds().ok().map(to_rect);
        let boxes: Vec<Rect> = annotation
            .attachment_points()
            .iter()
            .map(|quad| to_rect(quad.to_rect()))
            .collect();

        let Some(annot) = Annotation::new(page.page_ref(), subtype, boxes, rect) else {
            warn!(
                "Ignoring {} annotation without rect or quad points on {}",
                subtype, page
            );
            return None;
        };

        // Some apps only set the modification date
        let created = annotation
            .creation_date()
            .or_else(|| annotation.modification_date())
            .and_then(|raw| {
                let parsed = decode_datetime(&raw);
                if parsed.is_none() {
                    debug!("Failed to parse date '{}'", raw);
                }
                parsed
            });

        let color = annotation
            .stroke_color()
            .or_else(|_| annotation.fill_color())
            .ok()
            .or_else(|| appearance_color(annotation))
            .map(|c| Rgb::new(c.red(), c.green(), c.blue()));

        Some(
            annot
                .with_contents(annotation.contents().map(|c| cleanup_text(&c)))
                .with_author(annotation.creator())
                .with_created(created)
                .with_color(color),
        )
    }

    /// Every text character on the page with its loose bounds, in content order
    fn page_chars(page: &PdfPage) -> Vec<TextChar> {
        let text = match page.text() {
            Ok(t) => t,
            Err(e) => {
                warn!("Failed to read text: {}", e);
                return Vec::new();
            }
        };

        let chars = text.chars();
        chars
            .iter()
            .filter_map(|c| {
                let ch = c.unicode_char()?;
                let bounds = c.loose_bounds().ok()?;
                Some(TextChar::new(ch, to_rect(bounds)))
            })
            .collect()
    }

    fn progress_bar(len: u64, name: &str) -> ProgressBar {
        let pb = ProgressBar::new(len);
        let style = ProgressStyle::default_bar()
            .template("{msg} [{bar:40.cyan/blue}] {pos}/{len} pages")
            .map(|s| s.progress_chars("#>-"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        pb.set_style(style);
        pb.set_message(name.to_string());
        pb
    }
}
