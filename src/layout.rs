//! Text layout analysis
//!
//! Groups the characters of a page, in content-stream order, into lines
//! and text blocks, inserting word spaces where glyphs are far enough
//! apart. The resulting structure is what annotation capture walks over.

use crate::config::LayoutParams;
use crate::types::Rect;
use std::cmp::Ordering;

/// A single glyph with its bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextChar {
    pub text: char,
    pub bbox: Rect,
}

impl TextChar {
    pub fn new(text: char, bbox: Rect) -> Self {
        Self { text, bbox }
    }
}

/// An item on a line: a real glyph, or a synthetic word space
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LayoutItem {
    Char(TextChar),
    Space,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextLine {
    pub items: Vec<LayoutItem>,
    pub bbox: Rect,
    /// Glyphs run top to bottom
    pub vertical: bool,
}

impl TextLine {
    /// The line's text, with synthetic spaces rendered as `' '`
    pub fn text(&self) -> String {
        self.items
            .iter()
            .map(|item| match item {
                LayoutItem::Char(c) => c.text,
                LayoutItem::Space => ' ',
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextBlock {
    pub lines: Vec<TextLine>,
    pub bbox: Rect,
}

impl TextBlock {
    /// Blocks hold lines of a single orientation
    pub fn is_vertical(&self) -> bool {
        self.lines.first().is_some_and(|l| l.vertical)
    }
}

/// Laid-out page: text blocks in reading order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageLayout {
    pub blocks: Vec<TextBlock>,
}

impl PageLayout {
    pub fn lines(&self) -> impl Iterator<Item = &TextLine> {
        self.blocks.iter().flat_map(|b| b.lines.iter())
    }
}

/// Lay out a page's characters.
pub fn analyze<I>(chars: I, params: &LayoutParams) -> PageLayout
where
    I: IntoIterator<Item = TextChar>,
{
    let lines = group_lines(chars, params);
    let mut blocks = group_blocks(lines, params);
    order_blocks(&mut blocks, params.boxes_flow);
    PageLayout { blocks }
}

/// Writing direction of a line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Orientation {
    Horizontal,
    Vertical,
}

#[derive(Default)]
struct LineBuilder {
    items: Vec<LayoutItem>,
    bbox: Option<Rect>,
    last: Option<TextChar>,
    /// Decided by the line's second glyph
    orientation: Option<Orientation>,
}

impl LineBuilder {
    fn push(&mut self, c: TextChar) {
        self.bbox = Some(match self.bbox {
            Some(bbox) => bbox.union(&c.bbox),
            None => c.bbox,
        });
        self.items.push(LayoutItem::Char(c));
        self.last = Some(c);
    }

    fn push_space(&mut self) {
        if !matches!(self.items.last(), Some(LayoutItem::Space) | None) {
            self.items.push(LayoutItem::Space);
        }
    }

    /// The orientation `c` continues this line in, if it does
    fn continues(&self, c: &TextChar, params: &LayoutParams) -> Option<Orientation> {
        let prev = self.last.as_ref()?;
        let horizontal = || is_same_line(prev, c, params);
        let vertical = || params.detect_vertical && is_same_vertical_line(prev, c, params);
        match self.orientation {
            Some(Orientation::Horizontal) => horizontal().then_some(Orientation::Horizontal),
            Some(Orientation::Vertical) => vertical().then_some(Orientation::Vertical),
            None if horizontal() => Some(Orientation::Horizontal),
            None if vertical() => Some(Orientation::Vertical),
            None => None,
        }
    }

    /// Whether `c` is far enough past the end of the line to start a new word
    fn is_word_gap(&self, c: &TextChar, orientation: Orientation, params: &LayoutParams) -> bool {
        let Some(line_bbox) = self.bbox else {
            return false;
        };
        let margin = params.word_margin * c.bbox.width().max(c.bbox.height());
        match orientation {
            Orientation::Horizontal => line_bbox.x1 < c.bbox.x0 - margin,
            Orientation::Vertical => line_bbox.y0 > c.bbox.y1 + margin,
        }
    }

    fn finish(self) -> Option<TextLine> {
        let mut items = self.items;
        if matches!(items.last(), Some(LayoutItem::Space)) {
            items.pop();
        }
        Some(TextLine {
            items,
            bbox: self.bbox?,
            vertical: self.orientation == Some(Orientation::Vertical),
        })
    }
}

/// Whether `c` continues the horizontal line whose last glyph is `prev`
fn is_same_line(prev: &TextChar, c: &TextChar, params: &LayoutParams) -> bool {
    let (a, b) = (&prev.bbox, &c.bbox);
    let voverlap = a.y1.min(b.y1) - a.y0.max(b.y0);
    let hdistance = if a.x1 >= b.x0 && b.x1 >= a.x0 {
        0.0
    } else {
        (b.x0 - a.x1).max(a.x0 - b.x1)
    };

    voverlap >= 0.0
        && voverlap > params.line_overlap * a.height().min(b.height())
        && hdistance < params.char_margin * a.width().max(b.width())
}

/// Whether `c` continues the vertical line whose last glyph is `prev`
fn is_same_vertical_line(prev: &TextChar, c: &TextChar, params: &LayoutParams) -> bool {
    let (a, b) = (&prev.bbox, &c.bbox);
    let hoverlap = a.x1.min(b.x1) - a.x0.max(b.x0);
    let vdistance = if a.y1 >= b.y0 && b.y1 >= a.y0 {
        0.0
    } else {
        (b.y0 - a.y1).max(a.y0 - b.y1)
    };

    hoverlap >= 0.0
        && hoverlap > params.line_overlap * a.width().min(b.width())
        && vdistance < params.char_margin * a.height().max(b.height())
}

fn group_lines<I>(chars: I, params: &LayoutParams) -> Vec<TextLine>
where
    I: IntoIterator<Item = TextChar>,
{
    let mut lines = Vec::new();
    let mut current = LineBuilder::default();
    let mut pending_space = false;

    for c in chars {
        if c.text.is_control() {
            continue;
        }
        // Generated spaces have no extent; they only separate words
        if c.text.is_whitespace() && c.bbox.area() == 0.0 {
            pending_space = true;
            continue;
        }

        if let Some(prev) = current.last {
            match current.continues(&c, params) {
                Some(orientation) => {
                    if !prev.text.is_whitespace()
                        && !c.text.is_whitespace()
                        && (pending_space || current.is_word_gap(&c, orientation, params))
                    {
                        current.push_space();
                    }
                    current.orientation = Some(orientation);
                }
                None => lines.extend(std::mem::take(&mut current).finish()),
            }
        }

        pending_space = false;
        current.push(c);
    }

    lines.extend(current.finish());
    lines
}

/// Whether `line` is close enough to `prev` to share a block: below it for
/// horizontal text, beside it for vertical text.
fn is_same_block(prev: &TextLine, line: &TextLine, params: &LayoutParams) -> bool {
    if prev.vertical != line.vertical {
        return false;
    }
    let (a, b) = (&prev.bbox, &line.bbox);
    let vgap = (a.y0.max(b.y0) - a.y1.min(b.y1)).max(0.0);
    let hgap = (a.x0.max(b.x0) - a.x1.min(b.x1)).max(0.0);
    let hoverlap = a.x1.min(b.x1) - a.x0.max(b.x0);
    let voverlap = a.y1.min(b.y1) - a.y0.max(b.y0);
    if line.vertical {
        hgap <= params.line_margin * a.width().max(b.width()) && voverlap > 0.0
    } else {
        vgap <= params.line_margin * a.height().max(b.height()) && hoverlap > 0.0
    }
}

fn group_blocks(lines: Vec<TextLine>, params: &LayoutParams) -> Vec<TextBlock> {
    let mut blocks: Vec<TextBlock> = Vec::new();

    for line in lines {
        let target = blocks.iter_mut().rev().find(|block| {
            block
                .lines
                .last()
                .is_some_and(|last| is_same_block(last, &line, params))
        });
        match target {
            Some(block) => {
                block.bbox = block.bbox.union(&line.bbox);
                block.lines.push(line);
            }
            None => blocks.push(TextBlock {
                bbox: line.bbox,
                lines: vec![line],
            }),
        }
    }

    // Horizontal lines read top to bottom, vertical ones right to left
    for block in &mut blocks {
        block.lines.sort_by(|a, b| {
            if a.vertical {
                cmp_f64(b.bbox.x1, a.bbox.x1)
            } else {
                cmp_f64(b.bbox.y1, a.bbox.y1)
            }
        });
    }
    blocks
}

/// Order blocks for reading. Vertical blocks come first, right to left.
fn order_blocks(blocks: &mut [TextBlock], boxes_flow: Option<f64>) {
    match boxes_flow {
        None => blocks.sort_by(|a, b| {
            b.is_vertical().cmp(&a.is_vertical()).then_with(|| {
                if a.is_vertical() {
                    cmp_f64(b.bbox.x1, a.bbox.x1).then_with(|| cmp_f64(b.bbox.y0, a.bbox.y0))
                } else {
                    cmp_f64(b.bbox.y0, a.bbox.y0).then_with(|| cmp_f64(a.bbox.x0, b.bbox.x0))
                }
            })
        }),
        Some(flow) => {
            let key = |b: &TextBlock| {
                if b.is_vertical() {
                    -(1.0 + flow) * b.bbox.x1 - (1.0 - flow) * b.bbox.y1
                } else {
                    (1.0 - flow) * b.bbox.x0 - (1.0 + flow) * b.bbox.y1
                }
            };
            blocks.sort_by(|a, b| {
                b.is_vertical()
                    .cmp(&a.is_vertical())
                    .then_with(|| cmp_f64(key(a), key(b)))
            });
        }
    }
}

fn cmp_f64(a: f64, b: f64) -> Ordering {
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}
