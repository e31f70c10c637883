//! Document model: pages, positions, annotations and outlines
//!
//! All coordinates are PDF user-space points, with the origin at the bottom
//! left of the page.

use crate::text::merge_lines;
use chrono::NaiveDateTime;
use std::cmp::Ordering;
use std::fmt;
use tracing::{debug, warn};

/// An (x, y) point in PDF coordinates
pub type Point = (f64, f64);

/// Coordinates of a rectangular box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

impl Rect {
    /// Create a rectangle from two opposite corners, in any order.
    pub fn new(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Self {
            x0: x0.min(x1),
            y0: y0.min(y1),
            x1: x0.max(x1),
            y1: y0.max(y1),
        }
    }

    pub fn width(&self) -> f64 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f64 {
        self.y1 - self.y0
    }

    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    /// Overlapping area (if any) with another rectangle
    pub fn overlap(&self, other: &Rect) -> f64 {
        let x_overlap = (other.x1.min(self.x1) - other.x0.max(self.x0)).max(0.0);
        let y_overlap = (other.y1.min(self.y1) - other.y0.max(self.y0)).max(0.0);
        x_overlap * y_overlap
    }

    /// Does most of the area of `item` lie inside this rectangle?
    pub fn hit(&self, item: &Rect) -> bool {
        let item_area = item.area();
        let overlap_area = self.overlap(item);

        if overlap_area != 0.0 {
            debug!(
                "Box hit: {:.1}-{:.1},{:.1}-{:.1} in {:.1}-{:.1},{:.1}-{:.1} {:.0}%",
                item.x0,
                item.x1,
                item.y0,
                item.y1,
                self.x0,
                self.x1,
                self.y0,
                self.y1,
                100.0 * overlap_area / item_area
            );
        }

        item_area != 0.0 && overlap_area >= 0.5 * item_area
    }

    pub fn contains_point(&self, (x, y): Point) -> bool {
        x >= self.x0 && x <= self.x1 && y >= self.y0 && y <= self.y1
    }

    /// The point of this rectangle closest to `point`
    pub fn closest_point(&self, (px, py): Point) -> Point {
        (px.max(self.x0).min(self.x1), py.max(self.y0).min(self.y1))
    }

    /// Squared distance from `point` to the closest point of this rectangle
    pub fn square_of_distance_to_closest_point(&self, point: Point) -> f64 {
        let (x, y) = self.closest_point(point);
        let (px, py) = point;
        (px - x).powi(2) + (py - y).powi(2)
    }

    /// Smallest rectangle containing both
    pub fn union(&self, other: &Rect) -> Rect {
        Rect {
            x0: self.x0.min(other.x0),
            y0: self.y0.min(other.y0),
            x1: self.x1.max(other.x1),
            y1: self.y1.max(other.y1),
        }
    }
}

/// The page-level facts a position needs to order itself.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageRef {
    /// Zero-based page number
    pub pageno: usize,
    pub mediabox: Rect,
    /// Fixed number of columns, if reading order is not inferred from text
    pub fixed_columns: Option<u32>,
}

/// A position within the document.
///
/// Positions compare in reading order (see [`Pos::reading_order`]), which
/// within a page is inferred from the nearest line of laid-out text.
#[derive(Debug, Clone, Copy)]
pub struct Pos {
    pub page: PageRef,
    pub x: f64,
    pub y: f64,
    pageseq: u32,
    pageseq_distance: f64,
}

impl Pos {
    pub fn new(page: PageRef, x: f64, y: f64) -> Self {
        Self {
            page,
            x,
            y,
            pageseq: 0,
            pageseq_distance: 0.0,
        }
    }

    /// Sequence number of the closest text line (0 until the page is laid out)
    pub fn pageseq(&self) -> u32 {
        self.pageseq
    }

    /// If close enough to the given line, adopt its sequence number.
    pub fn update_pageseq(&mut self, line: &Rect, pageseq: u32) {
        debug_assert!(pageseq > 0);
        if line.contains_point((self.x, self.y)) {
            self.pageseq = pageseq;
            self.pageseq_distance = 0.0;
        } else {
            let d = line.square_of_distance_to_closest_point((self.x, self.y));
            if self.pageseq == 0 || self.pageseq_distance > d {
                self.pageseq = pageseq;
                self.pageseq_distance = d;
            }
        }
    }

    /// Compare two positions in natural reading order.
    pub fn reading_order(&self, other: &Pos) -> Ordering {
        if self.page.pageno != other.page.pageno {
            return self.page.pageno.cmp(&other.page.pageno);
        }

        if let Some(columns) = self.page.fixed_columns {
            // Fixed layout: left-to-right columns, each read top to bottom
            let mediabox = self.page.mediabox;
            let (sx, sy) = mediabox.closest_point((self.x, self.y));
            let (ox, oy) = mediabox.closest_point((other.x, other.y));
            let colwidth = mediabox.width() / f64::from(columns);
            let self_col = ((sx - mediabox.x0) / colwidth).floor();
            let other_col = ((ox - mediabox.x0) / colwidth).floor();
            return self_col
                .partial_cmp(&other_col)
                .unwrap_or(Ordering::Equal)
                .then_with(|| oy.partial_cmp(&sy).unwrap_or(Ordering::Equal));
        }

        if self.pageseq != 0 && other.pageseq != 0 && self.pageseq != other.pageseq {
            return self.pageseq.cmp(&other.pageseq);
        }

        // Same (or unknown) line: assume top-to-bottom, left-to-right text
        if self.y == other.y {
            self.x.partial_cmp(&other.x).unwrap_or(Ordering::Equal)
        } else {
            other.y.partial_cmp(&self.y).unwrap_or(Ordering::Equal)
        }
    }
}

impl PartialEq for Pos {
    fn eq(&self, other: &Self) -> bool {
        self.page.pageno == other.page.pageno && self.x == other.x && self.y == other.y
    }
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "page #{} ({:.3},{:.3})",
            self.page.pageno + 1,
            self.x,
            self.y
        )
    }
}

/// A supported PDF annotation type. Names match the PDF `Subtype` names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnnotationType {
    /// A "sticky note" comment
    Text,
    Highlight,
    Squiggly,
    StrikeOut,
    Underline,
    /// A single rectangle. Some Apple tools draw custom highlights with it;
    /// its text is not captured.
    Square,
    /// Free-form text written on the page
    FreeText,
    /// An insertion mark between characters
    Caret,
}

impl AnnotationType {
    pub fn name(&self) -> &'static str {
        match self {
            AnnotationType::Text => "Text",
            AnnotationType::Highlight => "Highlight",
            AnnotationType::Squiggly => "Squiggly",
            AnnotationType::StrikeOut => "StrikeOut",
            AnnotationType::Underline => "Underline",
            AnnotationType::Square => "Square",
            AnnotationType::FreeText => "FreeText",
            AnnotationType::Caret => "Caret",
        }
    }

    /// Markup annotations apply to regions of text on the page.
    pub fn is_markup(&self) -> bool {
        matches!(
            self,
            AnnotationType::Highlight
                | AnnotationType::Squiggly
                | AnnotationType::StrikeOut
                | AnnotationType::Underline
        )
    }
}

impl fmt::Display for AnnotationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// An RGB colour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

impl Rgb {
    pub fn new(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }

    /// Lowercase `#rrggbb`
    pub fn ashex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.red, self.green, self.blue)
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.ashex())
    }
}

/// A PDF annotation, and the text it marks.
#[derive(Debug, Clone)]
pub struct Annotation {
    pub subtype: AnnotationType,
    pub pos: Pos,
    /// Regions of the page the annotation covers (markup annotations only)
    pub boxes: Vec<Rect>,
    /// Contents of the annotation in the PDF, i.e. the comment
    pub contents: Option<String>,
    pub author: Option<String>,
    pub created: Option<NaiveDateTime>,
    pub color: Option<Rgb>,
    /// Position in the page's `/Annots` array
    pub index: Option<usize>,
    /// `/Annots` index of the annotation this one replies to (`/IRT`)
    pub in_reply_to: Option<usize>,
    /// Replies grouped under this annotation, e.g. the StrikeOut of a
    /// suggested replacement
    pub group_children: Vec<Annotation>,
    text: String,
    pre_context: Option<String>,
    post_context: Option<String>,
}

impl Annotation {
    /// Construct an annotation from its quad-point boxes and/or rectangle.
    ///
    /// Returns `None` if neither is available, since the annotation then
    /// has no position.
    pub fn new(
        page: PageRef,
        subtype: AnnotationType,
        mut boxes: Vec<Rect>,
        rect: Option<Rect>,
    ) -> Option<Self> {
        if boxes.is_empty() && (subtype.is_markup() || subtype == AnnotationType::Caret) {
            if let Some(rect) = rect {
                debug!("{} annotation without quad points, using its rect", subtype);
                boxes.push(rect);
            }
        }

        let anchor = rect.or_else(|| boxes.first().copied())?;
        // Assume left-to-right, top-to-bottom text
        let pos = Pos::new(page, anchor.x0, anchor.y1);

        Some(Self {
            subtype,
            pos,
            boxes,
            contents: None,
            author: None,
            created: None,
            color: None,
            index: None,
            in_reply_to: None,
            group_children: Vec::new(),
            text: String::new(),
            pre_context: None,
            post_context: None,
        })
    }

    pub fn with_contents(mut self, contents: Option<String>) -> Self {
        self.contents = contents.filter(|c| !c.is_empty());
        self
    }

    pub fn with_author(mut self, author: Option<String>) -> Self {
        self.author = author.filter(|a| !a.is_empty());
        self
    }

    pub fn with_created(mut self, created: Option<NaiveDateTime>) -> Self {
        self.created = created;
        self
    }

    pub fn with_color(mut self, color: Option<Rgb>) -> Self {
        self.color = color;
        self
    }

    pub fn with_reply(mut self, index: usize, in_reply_to: Option<usize>) -> Self {
        self.index = Some(index);
        self.in_reply_to = in_reply_to;
        self
    }

    /// First grouped reply of the given type
    pub fn child_by_type(&self, subtype: AnnotationType) -> Option<&Annotation> {
        self.group_children.iter().find(|c| c.subtype == subtype)
    }

    /// Capture text while rendering the page.
    pub fn capture(&mut self, text: &str) {
        self.text.push_str(text);
    }

    /// Raw captured text, in capture order
    pub fn captured_text(&self) -> &str {
        &self.text
    }

    /// Drop whatever was captured after the first `len` bytes.
    pub(crate) fn truncate_text(&mut self, len: usize) {
        self.text.truncate(len);
    }

    pub fn has_text(&self) -> bool {
        !self.text.is_empty()
    }

    /// Cleaned-up captured text. `None` for annotations without boxes.
    pub fn gettext(&self, remove_hyphens: bool) -> Option<String> {
        if self.boxes.is_empty() {
            return None;
        }
        if self.text.is_empty() {
            // A Caret between words often covers no glyph at all
            if self.subtype.is_markup() {
                warn!("Missing text for {} annotation at {}", self.subtype, self.pos);
            }
            return Some(String::new());
        }
        Some(merge_lines(&self.text, remove_hyphens, !self.has_context()))
    }

    /// Whether this annotation type records the text around it.
    pub fn wants_context(&self) -> bool {
        matches!(
            self.subtype,
            AnnotationType::StrikeOut | AnnotationType::Caret
        )
    }

    pub fn set_pre_context(&mut self, pre_context: String) {
        debug_assert!(self.pre_context.is_none());
        self.pre_context = Some(pre_context);
    }

    /// Set the post-context. Whitespace at the end of the captured text
    /// moves to the start of the context.
    pub fn set_post_context(&mut self, post_context: String) {
        debug_assert!(self.post_context.is_none());
        let trimmed_len = self.text.trim_end().len();
        let mut context = self.text.split_off(trimmed_len);
        context.push_str(&post_context);
        self.post_context = Some(context);
    }

    pub fn has_context(&self) -> bool {
        self.pre_context.is_some() || self.post_context.is_some()
    }

    /// Captured context as `(pre, post)`
    pub fn get_context(&self, remove_hyphens: bool) -> (String, String) {
        (
            merge_lines(
                self.pre_context.as_deref().unwrap_or(""),
                remove_hyphens,
                false,
            ),
            merge_lines(
                self.post_context.as_deref().unwrap_or(""),
                remove_hyphens,
                false,
            ),
        )
    }

    /// Tidy up once all text and context has been captured.
    pub fn postprocess(&mut self) {
        // Skim (https://skim-app.sourceforge.io/) pre-fills the contents of
        // new annotations with the selected text; drop such duplicates.
        if let Some(contents) = &self.contents {
            if !self.text.is_empty() && self.text.trim() == contents.trim() {
                self.contents = None;
            }
        }
    }
}

impl fmt::Display for Annotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} annotation at {}", self.subtype, self.pos)
    }
}

/// A PDF outline (bookmark) pointing somewhere on a page.
#[derive(Debug, Clone)]
pub struct Outline {
    pub title: String,
    pub pos: Pos,
}

impl Outline {
    /// Create an outline targeting `target`, or the top-left of the page.
    pub fn new(title: impl Into<String>, page: PageRef, target: Option<Point>) -> Self {
        let (x, y) = target.unwrap_or((page.mediabox.x0, page.mediabox.y1));
        Self {
            title: title.into(),
            pos: Pos::new(page, x, y),
        }
    }
}

/// A page of the document, with its annotations and the outlines that
/// point into it.
#[derive(Debug, Clone)]
pub struct Page {
    /// Zero-based page number
    pub pageno: usize,
    pub label: Option<String>,
    pub mediabox: Rect,
    pub fixed_columns: Option<u32>,
    pub annots: Vec<Annotation>,
    pub outlines: Vec<Outline>,
}

impl Page {
    pub fn new(
        pageno: usize,
        label: Option<String>,
        mediabox: Rect,
        fixed_columns: Option<u32>,
    ) -> Self {
        Self {
            pageno,
            label: label.filter(|l| !l.is_empty()),
            mediabox,
            fixed_columns: fixed_columns.filter(|&c| c > 0),
            annots: Vec::new(),
            outlines: Vec::new(),
        }
    }

    pub fn page_ref(&self) -> PageRef {
        PageRef {
            pageno: self.pageno,
            mediabox: self.mediabox,
            fixed_columns: self.fixed_columns,
        }
    }

    /// `page <label>` if labels are used and present, else `page #<n>`
    /// with a 1-based number shifted by `page_number_offset`.
    pub fn format_name(&self, use_label: bool, page_number_offset: i32) -> String {
        match &self.label {
            Some(label) if use_label => format!("page {}", label),
            _ => format!(
                "page #{}",
                self.pageno as i64 + 1 + i64::from(page_number_offset)
            ),
        }
    }

    /// Sort annotations and outlines into reading order.
    pub fn sort(&mut self) {
        self.annots.sort_by(|a, b| a.pos.reading_order(&b.pos));
        self.outlines.sort_by(|a, b| a.pos.reading_order(&b.pos));
    }

    /// Move StrikeOut replies of a Caret into its `group_children`, so the
    /// pair reads as one suggested replacement.
    pub fn group_replies(&mut self) {
        let mut i = 0;
        while i < self.annots.len() {
            let reply = &self.annots[i];
            let parent = match reply.in_reply_to {
                Some(target) if reply.subtype == AnnotationType::StrikeOut => self
                    .annots
                    .iter()
                    .position(|a| a.subtype == AnnotationType::Caret && a.index == Some(target)),
                _ => None,
            };

            match parent {
                Some(parent) => {
                    let child = self.annots.remove(i);
                    debug!("Grouping {} under its Caret", child);
                    let parent = if parent > i { parent - 1 } else { parent };
                    self.annots[parent].group_children.push(child);
                }
                None => i += 1,
            }
        }
    }
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format_name(true, 0))
    }
}

/// A fully extracted document: an ordered list of pages.
#[derive(Debug, Clone, Default)]
pub struct Document {
    pub pages: Vec<Page>,
}

impl Document {
    pub fn new(pages: Vec<Page>) -> Self {
        Self { pages }
    }

    /// All annotations in the document, in reading order
    pub fn iter_annots(&self) -> impl Iterator<Item = &Annotation> {
        self.pages.iter().flat_map(|p| p.annots.iter())
    }

    pub fn page(&self, pageno: usize) -> Option<&Page> {
        self.pages.get(pageno)
    }

    /// The last outline at or before `pos` in reading order.
    pub fn nearest_outline(&self, pos: &Pos) -> Option<&Outline> {
        let last = pos.page.pageno.min(self.pages.len().checked_sub(1)?);
        for page in self.pages[..=last].iter().rev() {
            // Outlines are sorted, so a binary search finds the split point
            let idx = page
                .outlines
                .partition_point(|o| o.pos.reading_order(pos) != Ordering::Greater);
            if idx > 0 {
                return Some(&page.outlines[idx - 1]);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn letter() -> Rect {
        Rect::new(0.0, 0.0, 612.0, 792.0)
    }

    fn page_ref(pageno: usize, fixed_columns: Option<u32>) -> PageRef {
        PageRef {
            pageno,
            mediabox: letter(),
            fixed_columns,
        }
    }

    #[test]
    fn test_rect_normalises_corners() {
        let r = Rect::new(10.0, 20.0, 0.0, 5.0);
        assert_eq!(r, Rect::new(0.0, 5.0, 10.0, 20.0));
        assert_eq!(r.width(), 10.0);
        assert_eq!(r.height(), 15.0);
    }

    #[test]
    fn test_rect_overlap() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert_eq!(a.overlap(&Rect::new(5.0, 5.0, 15.0, 15.0)), 25.0);
        assert_eq!(a.overlap(&Rect::new(20.0, 20.0, 30.0, 30.0)), 0.0);
    }

    #[rstest]
    #[case(Rect::new(0.0, 0.0, 6.0, 10.0), true)]
    #[case(Rect::new(7.0, 0.0, 13.0, 10.0), true)] // exactly half inside
    #[case(Rect::new(8.0, 0.0, 14.0, 10.0), false)]
    #[case(Rect::new(2.0, 2.0, 2.0, 8.0), false)] // zero area
    fn test_rect_hit(#[case] item: Rect, #[case] expected: bool) {
        let highlight = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert_eq!(highlight.hit(&item), expected);
    }

    #[test]
    fn test_rect_closest_point_distance() {
        let r = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert_eq!(r.closest_point((5.0, 5.0)), (5.0, 5.0));
        assert_eq!(r.closest_point((13.0, -4.0)), (10.0, 0.0));
        assert_eq!(r.square_of_distance_to_closest_point((13.0, -4.0)), 25.0);
    }

    #[test]
    fn test_pos_update_pageseq_prefers_nearest_line() {
        let mut pos = Pos::new(page_ref(0, None), 100.0, 500.0);
        pos.update_pageseq(&Rect::new(72.0, 700.0, 540.0, 710.0), 1);
        assert_eq!(pos.pageseq(), 1);
        pos.update_pageseq(&Rect::new(72.0, 510.0, 540.0, 520.0), 2);
        assert_eq!(pos.pageseq(), 2);
        // Further away than line 2
        pos.update_pageseq(&Rect::new(72.0, 300.0, 540.0, 310.0), 3);
        assert_eq!(pos.pageseq(), 2);
        // Inside the line
        pos.update_pageseq(&Rect::new(72.0, 495.0, 540.0, 505.0), 4);
        assert_eq!(pos.pageseq(), 4);
    }

    #[test]
    fn test_pos_reading_order_by_pageseq() {
        let mut a = Pos::new(page_ref(0, None), 300.0, 100.0);
        let mut b = Pos::new(page_ref(0, None), 72.0, 700.0);
        // a is on an earlier line in text order, although lower on the page
        a.update_pageseq(&Rect::new(300.0, 95.0, 500.0, 105.0), 1);
        b.update_pageseq(&Rect::new(300.0, 95.0, 500.0, 105.0), 1);
        b.update_pageseq(&Rect::new(72.0, 695.0, 200.0, 705.0), 2);
        assert_eq!(a.pageseq(), 1);
        assert_eq!(b.pageseq(), 2);
        assert_eq!(a.reading_order(&b), Ordering::Less);
        assert_eq!(b.reading_order(&a), Ordering::Greater);
    }

    #[test]
    fn test_pos_reading_order_same_line() {
        let a = Pos::new(page_ref(0, None), 72.0, 700.0);
        let b = Pos::new(page_ref(0, None), 200.0, 700.0);
        let c = Pos::new(page_ref(0, None), 50.0, 600.0);
        assert_eq!(a.reading_order(&b), Ordering::Less);
        assert_eq!(c.reading_order(&a), Ordering::Greater);
    }

    #[test]
    fn test_pos_reading_order_across_pages() {
        let a = Pos::new(page_ref(1, None), 0.0, 0.0);
        let b = Pos::new(page_ref(0, None), 0.0, 792.0);
        assert_eq!(a.reading_order(&b), Ordering::Greater);
    }

    #[test]
    fn test_pos_reading_order_fixed_columns() {
        let page = page_ref(0, Some(2));
        let left_bottom = Pos::new(page, 100.0, 100.0);
        let right_top = Pos::new(page, 400.0, 700.0);
        let left_top = Pos::new(page, 100.0, 700.0);
        assert_eq!(left_bottom.reading_order(&right_top), Ordering::Less);
        assert_eq!(left_top.reading_order(&left_bottom), Ordering::Less);
        // Positions off the page clamp to the media box
        let off_page = Pos::new(page, -50.0, 700.0);
        assert_eq!(left_top.reading_order(&off_page), Ordering::Equal);
    }

    #[test]
    fn test_annotation_requires_position() {
        let page = page_ref(0, None);
        assert!(Annotation::new(page, AnnotationType::Text, vec![], None).is_none());
    }

    #[test]
    fn test_annotation_position_from_rect() {
        let page = page_ref(0, None);
        let a = Annotation::new(
            page,
            AnnotationType::Text,
            vec![],
            Some(Rect::new(50.0, 600.0, 70.0, 620.0)),
        )
        .unwrap();
        assert_eq!((a.pos.x, a.pos.y), (50.0, 620.0));
        assert!(a.boxes.is_empty());
        assert_eq!(a.gettext(true), None);
    }

    #[test]
    fn test_markup_annotation_falls_back_to_rect() {
        let page = page_ref(0, None);
        let rect = Rect::new(50.0, 600.0, 70.0, 620.0);
        let a = Annotation::new(page, AnnotationType::Highlight, vec![], Some(rect)).unwrap();
        assert_eq!(a.boxes, vec![rect]);
    }

    #[test]
    fn test_annotation_gettext() {
        let page = page_ref(0, None);
        let mut a = Annotation::new(
            page,
            AnnotationType::Highlight,
            vec![Rect::new(0.0, 0.0, 10.0, 10.0)],
            None,
        )
        .unwrap();
        assert_eq!(a.gettext(true), Some(String::new()));
        a.capture("hyphen-");
        a.capture("\n");
        a.capture("ated text\n");
        assert_eq!(a.gettext(true).as_deref(), Some("hyphenated text"));
        assert_eq!(a.gettext(false).as_deref(), Some("hyphen-ated text"));
    }

    #[test]
    fn test_set_post_context_moves_trailing_whitespace() {
        let page = page_ref(0, None);
        let mut a = Annotation::new(
            page,
            AnnotationType::StrikeOut,
            vec![Rect::new(0.0, 0.0, 10.0, 10.0)],
            None,
        )
        .unwrap();
        assert!(a.wants_context());
        a.set_pre_context("before ".to_string());
        a.capture("struck");
        a.capture(" \n");
        a.set_post_context("after".to_string());
        assert!(a.has_context());
        assert_eq!(a.captured_text(), "struck");
        assert_eq!(
            a.get_context(true),
            ("before ".to_string(), " after".to_string())
        );
        // Context keeps the surrounding whitespace of the text
        assert_eq!(a.gettext(true).as_deref(), Some("struck"));
    }

    #[test]
    fn test_postprocess_drops_duplicate_contents() {
        let page = page_ref(0, None);
        let mut a = Annotation::new(
            page,
            AnnotationType::Highlight,
            vec![Rect::new(0.0, 0.0, 10.0, 10.0)],
            None,
        )
        .unwrap()
        .with_contents(Some("selected text ".to_string()));
        a.capture("selected text");
        a.postprocess();
        assert_eq!(a.contents, None);
    }

    #[test]
    fn test_postprocess_keeps_real_comment() {
        let page = page_ref(0, None);
        let mut a = Annotation::new(
            page,
            AnnotationType::Highlight,
            vec![Rect::new(0.0, 0.0, 10.0, 10.0)],
            None,
        )
        .unwrap()
        .with_contents(Some("a comment".to_string()));
        a.capture("selected text");
        a.postprocess();
        assert_eq!(a.contents.as_deref(), Some("a comment"));
    }

    #[test]
    fn test_caret_falls_back_to_rect_and_wants_context() {
        let page = page_ref(0, None);
        let rect = Rect::new(50.0, 600.0, 54.0, 610.0);
        let caret = Annotation::new(page, AnnotationType::Caret, vec![], Some(rect)).unwrap();
        assert_eq!(caret.boxes, vec![rect]);
        assert!(caret.wants_context());
        // Nothing captured under the caret is not worth a warning
        assert_eq!(caret.gettext(true), Some(String::new()));
    }

    fn reply(subtype: AnnotationType, index: usize, irt: Option<usize>, x: f64) -> Annotation {
        Annotation::new(
            page_ref(0, None),
            subtype,
            vec![],
            Some(Rect::new(x, 600.0, x + 10.0, 610.0)),
        )
        .unwrap()
        .with_reply(index, irt)
    }

    #[test]
    fn test_group_replies() {
        let mut page = Page::new(0, None, letter(), None);
        page.annots.push(reply(AnnotationType::StrikeOut, 0, Some(1), 10.0));
        page.annots.push(reply(AnnotationType::Caret, 1, None, 20.0));
        page.annots.push(reply(AnnotationType::Highlight, 2, None, 30.0));
        // Replies to something other than a Caret stay where they are
        page.annots.push(reply(AnnotationType::StrikeOut, 3, Some(2), 40.0));
        page.annots.push(reply(AnnotationType::Text, 4, Some(1), 50.0));

        page.group_replies();

        let kinds: Vec<(AnnotationType, Option<usize>)> =
            page.annots.iter().map(|a| (a.subtype, a.index)).collect();
        assert_eq!(
            kinds,
            vec![
                (AnnotationType::Caret, Some(1)),
                (AnnotationType::Highlight, Some(2)),
                (AnnotationType::StrikeOut, Some(3)),
                (AnnotationType::Text, Some(4)),
            ]
        );
        let caret = &page.annots[0];
        assert_eq!(caret.group_children.len(), 1);
        let child = caret.child_by_type(AnnotationType::StrikeOut).unwrap();
        assert_eq!(child.index, Some(0));
        assert!(caret.child_by_type(AnnotationType::Text).is_none());
    }

    #[test]
    fn test_empty_contents_and_author_are_none() {
        let page = page_ref(0, None);
        let a = Annotation::new(page, AnnotationType::Text, vec![], Some(letter()))
            .unwrap()
            .with_contents(Some(String::new()))
            .with_author(Some(String::new()));
        assert_eq!(a.contents, None);
        assert_eq!(a.author, None);
    }

    #[test]
    fn test_annotation_type_names() {
        assert_eq!(AnnotationType::StrikeOut.name(), "StrikeOut");
        assert_eq!(AnnotationType::FreeText.to_string(), "FreeText");
        assert!(AnnotationType::Squiggly.is_markup());
        assert!(!AnnotationType::Caret.is_markup());
    }

    #[test]
    fn test_rgb_hex() {
        assert_eq!(Rgb::new(255, 255, 0).ashex(), "#ffff00");
        assert_eq!(Rgb::new(1, 2, 3).to_string(), "#010203");
    }

    #[rstest]
    #[case(Some("iv"), true, 0, "page iv")]
    #[case(Some("iv"), false, 0, "page #3")]
    #[case(None, true, 0, "page #3")]
    #[case(None, true, -2, "page #1")]
    #[case(Some(""), true, 10, "page #13")]
    fn test_page_format_name(
        #[case] label: Option<&str>,
        #[case] use_label: bool,
        #[case] offset: i32,
        #[case] expected: &str,
    ) {
        let page = Page::new(2, label.map(str::to_string), letter(), None);
        assert_eq!(page.format_name(use_label, offset), expected);
    }

    #[test]
    fn test_outline_defaults_to_page_top() {
        let outline = Outline::new("Intro", page_ref(0, None), None);
        assert_eq!((outline.pos.x, outline.pos.y), (0.0, 792.0));
    }

    #[test]
    fn test_nearest_outline() {
        let mut p0 = Page::new(0, None, letter(), Some(1));
        let mut p1 = Page::new(1, None, letter(), Some(1));
        let mut p2 = Page::new(2, None, letter(), Some(1));
        p0.outlines
            .push(Outline::new("Intro", p0.page_ref(), Some((72.0, 700.0))));
        p1.outlines
            .push(Outline::new("Methods", p1.page_ref(), Some((72.0, 400.0))));
        p1.outlines
            .push(Outline::new("Results", p1.page_ref(), Some((72.0, 200.0))));
        for p in [&mut p0, &mut p1, &mut p2] {
            p.sort();
        }
        let p1_ref = p1.page_ref();
        let p2_ref = p2.page_ref();
        let doc = Document::new(vec![p0, p1, p2]);

        let title = |pos: Pos| doc.nearest_outline(&pos).map(|o| o.title.clone());
        assert_eq!(title(Pos::new(p1_ref, 72.0, 500.0)).as_deref(), Some("Intro"));
        assert_eq!(title(Pos::new(p1_ref, 72.0, 300.0)).as_deref(), Some("Methods"));
        assert_eq!(title(Pos::new(p1_ref, 72.0, 200.0)).as_deref(), Some("Results"));
        assert_eq!(title(Pos::new(p2_ref, 72.0, 792.0)).as_deref(), Some("Results"));

        let before_any = Document::new(vec![Page::new(0, None, letter(), Some(1))]);
        assert!(before_any
            .nearest_outline(&Pos::new(page_ref(0, Some(1)), 0.0, 0.0))
            .is_none());
    }
}
