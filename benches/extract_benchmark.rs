//! Performance benchmarks for pdfannots
//!
//! Run with: `cargo bench`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use pdfannots::config::{LayoutParams, PrintOptions};
use pdfannots::extract::process_page;
use pdfannots::layout::{analyze, TextChar};
use pdfannots::printer::{MarkdownPrinter, Style};
use pdfannots::{Annotation, AnnotationType, Document, Page, Printer, Rect};

const GLYPH_W: f64 = 5.0;
const GLYPH_H: f64 = 10.0;
const LINE_PITCH: f64 = 12.0;
const LINE: &str = "Lorem ipsum dolor sit amet consectetur adipiscing elit sed do";

fn letter() -> Rect {
    Rect::new(0.0, 0.0, 612.0, 792.0)
}

/// A page of `lines` lines of text in two columns, content-stream order
fn page_chars(lines: usize) -> Vec<TextChar> {
    let mut chars = Vec::new();
    for col in 0..2 {
        let x = 36.0 + 300.0 * f64::from(col);
        for n in 0..lines {
            let y = 750.0 - LINE_PITCH * n as f64;
            for (i, c) in LINE.chars().enumerate().filter(|(_, c)| *c != ' ') {
                let x0 = x + GLYPH_W * i as f64;
                chars.push(TextChar::new(c, Rect::new(x0, y, x0 + GLYPH_W, y + GLYPH_H)));
            }
        }
    }
    chars
}

/// A page with a highlight or strikeout over every fifth line
fn annotated_page(lines: usize) -> Page {
    let mut page = Page::new(0, None, letter(), None);
    for n in (0..lines).step_by(5) {
        let y = 750.0 - LINE_PITCH * n as f64;
        let subtype = if n % 10 == 0 {
            AnnotationType::Highlight
        } else {
            AnnotationType::StrikeOut
        };
        let boxes = vec![Rect::new(35.0, y - 1.0, 36.0 + GLYPH_W * 20.0, y + GLYPH_H + 1.0)];
        if let Some(annot) = Annotation::new(page.page_ref(), subtype, boxes, None) {
            page.annots.push(annot.with_contents(Some(format!("note {}", n))));
        }
    }
    page
}

/// Benchmark layout analysis alone
fn bench_layout(c: &mut Criterion) {
    let mut group = c.benchmark_group("layout");
    let params = LayoutParams::default();

    for lines in [10, 60] {
        let chars = page_chars(lines);
        group.throughput(Throughput::Elements(chars.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(lines), &chars, |b, chars| {
            b.iter(|| analyze(black_box(chars.iter().copied()), &params));
        });
    }

    group.finish();
}

/// Benchmark layout plus annotation capture
fn bench_process_page(c: &mut Criterion) {
    let mut group = c.benchmark_group("process_page");
    let params = LayoutParams::default();

    for lines in [10, 60] {
        let chars = page_chars(lines);
        let template = annotated_page(lines);
        group.bench_with_input(BenchmarkId::from_parameter(lines), &chars, |b, chars| {
            b.iter(|| {
                let mut page = template.clone();
                process_page(&mut page, chars.iter().copied(), &params);
                black_box(page)
            });
        });
    }

    group.finish();
}

/// Benchmark Markdown rendering of an extracted document
fn bench_markdown(c: &mut Criterion) {
    let mut page = annotated_page(60);
    process_page(&mut page, page_chars(60), &LayoutParams::default());
    let doc = Document::new(vec![page]);

    c.bench_function("markdown_grouped", |b| {
        b.iter(|| {
            let mut printer = MarkdownPrinter::new(PrintOptions::default(), Style::Markdown);
            black_box(printer.print_file("bench.pdf", &doc))
        });
    });

    c.bench_function("markdown_wrapped", |b| {
        let options = PrintOptions {
            wrap_column: Some(60),
            ..PrintOptions::default()
        };
        b.iter(|| {
            let mut printer = MarkdownPrinter::new(options.clone(), Style::Markdown);
            black_box(printer.print_file("bench.pdf", &doc))
        });
    });
}

criterion_group!(benches, bench_layout, bench_process_page, bench_markdown);
criterion_main!(benches);
