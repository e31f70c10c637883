//! Annotation text capture
//!
//! Walks the laid-out text of a page in reading order, assigning each
//! annotation and outline a sequence number from its nearest line and
//! feeding every glyph to the annotations whose boxes cover it.

use crate::config::LayoutParams;
use crate::layout::{analyze, LayoutItem, PageLayout, TextChar};
use crate::types::{Page, Rect};
use std::collections::{BTreeSet, VecDeque};
use tracing::debug;

/// Characters of context kept before and after a StrikeOut or Caret
const CONTEXT_CHARS: usize = 256;

/// Lay out `chars` and capture annotation text for `page`.
///
/// Afterwards the page's annotations and outlines are in reading order.
pub fn process_page<I>(page: &mut Page, chars: I, params: &LayoutParams)
where
    I: IntoIterator<Item = TextChar>,
{
    if page.annots.is_empty() && page.outlines.is_empty() {
        debug!("Skipping {}: no annotations or outlines", page);
        return;
    }

    let layout = analyze(chars, params);
    debug!("Laid out {} with {} text blocks", page, layout.blocks.len());

    let mut processor = PageProcessor::new(page);
    processor.render(&layout);
    processor.finish();

    page.sort();
    for annot in &mut page.annots {
        annot.postprocess();
    }
}

/// An annotation waiting for its post-context
struct ContextSubscriber {
    annot: usize,
    /// Length of the annotation's text after its most recent glyph
    text_len: usize,
    post: String,
    post_chars: usize,
}

struct PageProcessor<'a> {
    page: &'a mut Page,
    pageseq: u32,
    /// Annotations hit by the most recent item
    lasthit: Vec<usize>,
    /// Annotations that captured anything on the current line
    curline: BTreeSet<usize>,
    recent_text: VecDeque<char>,
    context_subscribers: Vec<ContextSubscriber>,
}

impl<'a> PageProcessor<'a> {
    fn new(page: &'a mut Page) -> Self {
        Self {
            page,
            pageseq: 0,
            lasthit: Vec::new(),
            curline: BTreeSet::new(),
            recent_text: VecDeque::with_capacity(CONTEXT_CHARS + 1),
            context_subscribers: Vec::new(),
        }
    }

    fn render(&mut self, layout: &PageLayout) {
        for block in &layout.blocks {
            for line in &block.lines {
                self.update_pageseq(&line.bbox);
                for item in &line.items {
                    match item {
                        LayoutItem::Char(c) => self.capture_char(c),
                        LayoutItem::Space => self.capture_space(),
                    }
                }
                self.capture_newline();
            }

            // End of the final line of the block
            self.testboxes(&block.bbox);
            self.capture_newline();
        }
    }

    /// Give outstanding subscribers whatever context the page had left.
    fn finish(&mut self) {
        for sub in self.context_subscribers.drain(..) {
            let annot = &mut self.page.annots[sub.annot];
            annot.truncate_text(sub.text_len);
            annot.set_post_context(sub.post);
        }
    }

    /// Assign sequence numbers based on the nearest line of text.
    fn update_pageseq(&mut self, line: &Rect) {
        self.pageseq += 1;
        for annot in &mut self.page.annots {
            annot.pos.update_pageseq(line, self.pageseq);
        }
        for outline in &mut self.page.outlines {
            outline.pos.update_pageseq(line, self.pageseq);
        }
    }

    /// Annotations whose boxes cover the given item
    fn testboxes(&mut self, item: &Rect) -> Vec<usize> {
        let hits: Vec<usize> = self
            .page
            .annots
            .iter()
            .enumerate()
            .filter(|(_, a)| a.boxes.iter().any(|b| b.hit(item)))
            .map(|(i, _)| i)
            .collect();
        self.curline.extend(hits.iter().copied());
        self.lasthit.clone_from(&hits);
        hits
    }

    fn capture_char(&mut self, c: &TextChar) {
        let hits = self.testboxes(&c.bbox);
        let mut buf = [0u8; 4];
        let text = c.text.encode_utf8(&mut buf);

        for &i in &hits {
            let annot = &self.page.annots[i];
            if annot.wants_context()
                && !annot.has_context()
                && !self.context_subscribers.iter().any(|s| s.annot == i)
            {
                let pre: String = self.recent_text.iter().collect();
                self.page.annots[i].set_pre_context(pre);
                self.context_subscribers.push(ContextSubscriber {
                    annot: i,
                    text_len: 0,
                    post: String::new(),
                    post_chars: 0,
                });
            }
            self.page.annots[i].capture(text);
        }

        self.feed_context(text, &hits);
    }

    /// Synthetic spaces have no position; they belong to whatever was hit last.
    fn capture_space(&mut self) {
        for &i in &self.lasthit {
            self.page.annots[i].capture(" ");
        }
        self.feed_context(" ", &[]);
    }

    /// Broadcast a line break to every annotation that captured text on the
    /// current line, in case it continues on the next.
    fn capture_newline(&mut self) {
        for &i in &self.curline {
            self.page.annots[i].capture("\n");
        }
        self.curline.clear();
        self.feed_context("\n", &[]);
    }

    fn feed_context(&mut self, text: &str, char_hits: &[usize]) {
        for c in text.chars() {
            self.recent_text.push_back(c);
            if self.recent_text.len() > CONTEXT_CHARS {
                self.recent_text.pop_front();
            }
        }

        let annots = &mut self.page.annots;
        self.context_subscribers.retain_mut(|sub| {
            if char_hits.contains(&sub.annot) {
                // Still inside the annotation; context starts after it
                sub.text_len = annots[sub.annot].captured_text().len();
                sub.post.clear();
                sub.post_chars = 0;
                return true;
            }

            sub.post.push_str(text);
            sub.post_chars += text.chars().count();
            if sub.post_chars < CONTEXT_CHARS {
                return true;
            }

            let annot = &mut annots[sub.annot];
            annot.truncate_text(sub.text_len);
            annot.set_post_context(std::mem::take(&mut sub.post));
            false
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Annotation, AnnotationType, Outline};
    use pretty_assertions::assert_eq;

    const GLYPH_W: f64 = 6.0;
    const GLYPH_H: f64 = 10.0;

    fn word_chars(text: &str, x: f64, y: f64) -> Vec<TextChar> {
        text.chars()
            .enumerate()
            .filter(|(_, c)| *c != ' ')
            .map(|(i, c)| {
                let x0 = x + GLYPH_W * i as f64;
                TextChar::new(c, Rect::new(x0, y, x0 + GLYPH_W, y + GLYPH_H))
            })
            .collect()
    }

    /// Box over characters `start..end` of a line laid out by `word_chars`
    fn span(x: f64, y: f64, start: usize, end: usize) -> Rect {
        Rect::new(
            x + GLYPH_W * start as f64 - 1.0,
            y - 1.0,
            x + GLYPH_W * end as f64 + 1.0,
            y + GLYPH_H + 1.0,
        )
    }

    fn new_page() -> Page {
        Page::new(0, None, Rect::new(0.0, 0.0, 612.0, 792.0), None)
    }

    fn markup(page: &Page, subtype: AnnotationType, boxes: Vec<Rect>) -> Annotation {
        Annotation::new(page.page_ref(), subtype, boxes, None).unwrap()
    }

    #[test]
    fn test_highlight_captures_covered_words() {
        let mut page = new_page();
        let highlight = markup(
            &page,
            AnnotationType::Highlight,
            vec![span(72.0, 700.0, 6, 11)],
        );
        page.annots.push(highlight);

        let chars = word_chars("Hello brave new world", 72.0, 700.0);
        process_page(&mut page, chars, &LayoutParams::default());

        assert_eq!(page.annots[0].captured_text(), "brave \n");
        assert_eq!(page.annots[0].gettext(true).as_deref(), Some("brave"));
    }

    #[test]
    fn test_highlight_across_lines() {
        let mut page = new_page();
        let highlight = markup(
            &page,
            AnnotationType::Highlight,
            vec![span(72.0, 700.0, 6, 10), span(72.0, 686.0, 0, 6)],
        );
        page.annots.push(highlight);

        let mut chars = word_chars("first line", 72.0, 700.0);
        chars.extend(word_chars("second line", 72.0, 686.0));
        process_page(&mut page, chars, &LayoutParams::default());

        assert_eq!(page.annots[0].gettext(true).as_deref(), Some("line second"));
    }

    #[test]
    fn test_strikeout_captures_context() {
        let mut page = new_page();
        let strike = markup(
            &page,
            AnnotationType::StrikeOut,
            vec![span(72.0, 700.0, 4, 7)],
        );
        page.annots.push(strike);

        let chars = word_chars("one two three", 72.0, 700.0);
        process_page(&mut page, chars, &LayoutParams::default());

        let annot = &page.annots[0];
        assert!(annot.has_context());
        assert_eq!(annot.gettext(true).as_deref(), Some("two"));
        assert_eq!(
            annot.get_context(true),
            ("one ".to_string(), " three ".to_string())
        );
    }

    #[test]
    fn test_caret_captures_context() {
        let mut page = new_page();
        // Over the space glyph of "one two"
        let caret = Annotation::new(
            page.page_ref(),
            AnnotationType::Caret,
            vec![],
            Some(Rect::new(89.5, 699.0, 96.5, 711.0)),
        )
        .unwrap();
        page.annots.push(caret);

        let chars: Vec<TextChar> = "one two"
            .chars()
            .enumerate()
            .map(|(i, c)| {
                let x0 = 72.0 + GLYPH_W * i as f64;
                TextChar::new(c, Rect::new(x0, 700.0, x0 + GLYPH_W, 700.0 + GLYPH_H))
            })
            .collect();
        process_page(&mut page, chars, &LayoutParams::default());

        let annot = &page.annots[0];
        assert!(annot.has_context());
        assert_eq!(
            annot.get_context(true),
            ("one".to_string(), " two ".to_string())
        );
    }

    #[test]
    fn test_post_context_is_bounded() {
        let mut page = new_page();
        let strike = markup(
            &page,
            AnnotationType::StrikeOut,
            vec![span(72.0, 700.0, 0, 3)],
        );
        page.annots.push(strike);

        // One long line: "cut" followed by far more than the context limit
        let mut chars = word_chars("cut", 72.0, 700.0);
        chars.extend(word_chars(&"x".repeat(300), 90.0, 700.0));
        process_page(&mut page, chars, &LayoutParams::default());

        let (_, post) = page.annots[0].get_context(true);
        assert_eq!(post.chars().count(), CONTEXT_CHARS);
        assert_eq!(page.annots[0].gettext(true).as_deref(), Some("cut"));
    }

    #[test]
    fn test_annotations_sorted_by_text_order() {
        let mut page = new_page();
        let on_lower = markup(
            &page,
            AnnotationType::Highlight,
            vec![span(72.0, 500.0, 0, 5)],
        );
        let note = Annotation::new(
            page.page_ref(),
            AnnotationType::Text,
            vec![],
            Some(Rect::new(20.0, 690.0, 40.0, 705.0)),
        )
        .unwrap()
        .with_contents(Some("margin note".to_string()));
        page.annots.push(on_lower);
        page.annots.push(note);
        page.outlines
            .push(Outline::new("Heading", page.page_ref(), Some((72.0, 720.0))));

        let mut chars = word_chars("upper", 72.0, 700.0);
        chars.extend(word_chars("lower", 72.0, 500.0));
        process_page(&mut page, chars, &LayoutParams::default());

        let order: Vec<AnnotationType> = page.annots.iter().map(|a| a.subtype).collect();
        assert_eq!(order, vec![AnnotationType::Text, AnnotationType::Highlight]);
        assert_eq!(page.annots[0].pos.pageseq(), 1);
        assert_eq!(page.annots[1].pos.pageseq(), 2);
        assert_eq!(page.outlines[0].pos.pageseq(), 1);
    }

    #[test]
    fn test_duplicate_contents_removed() {
        let mut page = new_page();
        let highlight = markup(
            &page,
            AnnotationType::Highlight,
            vec![span(72.0, 700.0, 0, 5)],
        )
        .with_contents(Some("Hello".to_string()));
        page.annots.push(highlight);

        process_page(
            &mut page,
            word_chars("Hello world", 72.0, 700.0),
            &LayoutParams::default(),
        );
        assert_eq!(page.annots[0].contents, None);
    }

    #[test]
    fn test_empty_page_untouched() {
        let mut page = new_page();
        process_page(
            &mut page,
            word_chars("nothing to see", 72.0, 700.0),
            &LayoutParams::default(),
        );
        assert!(page.annots.is_empty());
    }

    #[test]
    fn test_highlight_on_vertical_text() {
        // One column of 10x10 glyphs running downwards
        let chars: Vec<TextChar> = "word"
            .chars()
            .enumerate()
            .map(|(i, c)| {
                let top = 700.0 - 10.0 * i as f64;
                TextChar::new(c, Rect::new(300.0, top - 10.0, 310.0, top))
            })
            .collect();
        let params = LayoutParams {
            detect_vertical: true,
            ..LayoutParams::default()
        };

        let mut page = new_page();
        let highlight = markup(
            &page,
            AnnotationType::Highlight,
            vec![Rect::new(299.0, 659.0, 311.0, 701.0)],
        );
        page.annots.push(highlight);
        process_page(&mut page, chars, &params);

        assert_eq!(page.annots[0].gettext(true).as_deref(), Some("word"));
    }
}
