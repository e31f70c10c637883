//! Markdown and plain-text output

use super::Printer;
use crate::config::{PrintOptions, Section};
use crate::error::Result;
use crate::types::{Annotation, AnnotationType, Document, Pos, Rgb};
use tracing::warn;

/// Maximum number of words kept by [`trim_context`]
const MAX_CONTEXT_WORDS: usize = 10;

/// Number of words kept by [`trim_context`] when no boundary is close
const FALLBACK_CONTEXT_WORDS: usize = 4;

/// Rough natural boundaries in writing: (separator, keep on left, keep on right)
const CONTEXT_BOUNDARIES: &[(&str, bool, bool)] = &[
    (". ", false, true), // sentence
    ("! ", false, true),
    ("? ", false, true),
    (": ", false, false),
    ("; ", false, false),
    ("\" ", false, true), // end of quote
    (" \"", true, false), // start of quote
    (") ", false, true),  // end of parenthesis
    (" (", true, false),  // start of parenthesis
    ("\u{2014}", false, false),
];

const BULLET_INDENT1: &str = " * ";
const BULLET_INDENT2: &str = "   ";

/// Trim captured context at a natural boundary.
///
/// With `keep_right` the end of `context` is kept (text preceding an
/// annotation); otherwise its start (text following one).
pub fn trim_context(context: &str, keep_right: bool) -> String {
    let mut best: Option<&str> = None;

    for &(sep, keep_sep_left, keep_sep_right) in CONTEXT_BOUNDARIES {
        let found = if keep_right {
            context.rfind(sep)
        } else {
            context.find(sep)
        };
        let Some(mut i) = found else {
            continue;
        };

        if (keep_right && !keep_sep_left) || (!keep_right && keep_sep_right) {
            i += sep.len();
        }

        let candidate = if keep_right {
            &context[i..]
        } else {
            &context[..i]
        };

        if best.map_or(true, |b| candidate.len() < b.len()) {
            best = Some(candidate);
            if candidate.split_whitespace().count() <= 1 {
                break;
            }
        }
    }

    if let Some(best) = best {
        if best.split_whitespace().count() <= MAX_CONTEXT_WORDS {
            return best.to_string();
        }
    }

    // Give up and take a few words, whatever they are
    let words: Vec<&str> = context.split_whitespace().collect();
    if keep_right {
        let start = words.len().saturating_sub(FALLBACK_CONTEXT_WORDS);
        let mut fallback = format!("...{}", words[start..].join(" "));
        if let Some(last) = context.chars().last().filter(|c| c.is_whitespace()) {
            fallback.push(last);
        }
        fallback
    } else {
        let end = words.len().min(FALLBACK_CONTEXT_WORDS);
        let mut fallback = format!("{}...", words[..end].join(" "));
        if let Some(first) = context.chars().next().filter(|c| c.is_whitespace()) {
            fallback.insert(0, first);
        }
        fallback
    }
}

/// Greedy word wrap. Words longer than the line are left whole.
fn fill(text: &str, width: usize, initial_indent: &str, subsequent_indent: &str) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut line = initial_indent.to_string();
    let mut line_len = initial_indent.chars().count();
    let mut has_words = false;

    for word in text.split_whitespace() {
        let word_len = word.chars().count();
        if has_words && line_len + 1 + word_len > width {
            lines.push(std::mem::take(&mut line));
            line = subsequent_indent.to_string();
            line_len = subsequent_indent.chars().count();
            has_words = false;
        }
        if has_words {
            line.push(' ');
            line_len += 1;
        }
        line.push_str(word);
        line_len += word_len;
        has_words = true;
    }

    if has_words {
        lines.push(line);
    }
    lines.join("\n")
}

fn capitalize_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Markup flavour of the output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Style {
    /// Markdown headers, block quotes and `~~strikethrough~~`
    Markdown,
    /// Underlined headers, indented quotes and `[-deletions-]`
    Plain,
}

impl Style {
    fn quote_indent(&self) -> &'static str {
        match self {
            Style::Markdown => "   > ",
            Style::Plain => "     ",
        }
    }

    fn header(&self, name: &str, level: usize) -> String {
        match self {
            Style::Markdown => format!("{} {}\n", "#".repeat(level), name),
            Style::Plain => {
                let underline = if level <= 2 { "=" } else { "-" };
                format!("{}\n{}\n", name, underline.repeat(name.chars().count()))
            }
        }
    }

    fn strikeout(&self, text: &str) -> String {
        match self {
            Style::Markdown => format!("~~{}~~", text),
            Style::Plain => format!("[-{}-]", text),
        }
    }
}

/// Prints annotations as Markdown (or plain text), either in document
/// order or grouped into highlights, comments and nits.
pub struct MarkdownPrinter {
    options: PrintOptions,
    style: Style,
}

impl MarkdownPrinter {
    pub fn new(options: PrintOptions, style: Style) -> Self {
        Self { options, style }
    }

    fn format_pos(&self, pos: &Pos, document: &Document) -> String {
        let name = match document.page(pos.page.pageno) {
            Some(page) => page.format_name(
                self.options.use_page_labels,
                self.options.page_number_offset,
            ),
            None => format!(
                "page #{}",
                pos.page.pageno as i64 + 1 + i64::from(self.options.page_number_offset)
            ),
        };

        let mut result = capitalize_first(&name);
        if let Some(outline) = document.nearest_outline(pos) {
            result.push_str(&format!(" ({})", outline.title));
        }
        result
    }

    /// Format a bullet, wrapped as desired. `quote` gives the index and
    /// length of the paragraphs to render as a block quote.
    fn format_bullet(&self, paras: &[String], quote: Option<(usize, usize)>) -> String {
        let quote_indent = self.style.quote_indent();
        let mut ret = match self.options.wrap_column {
            Some(width) => fill(&paras[0], width, BULLET_INDENT1, BULLET_INDENT2),
            None => format!("{}{}", BULLET_INDENT1, paras[0]),
        };

        for (npara, para) in paras.iter().enumerate().skip(1) {
            let inquote = quote.is_some_and(|(pos, len)| npara >= pos && npara < pos + len);

            // Going straight into a quote needs no blank line
            if quote.is_some_and(|(pos, _)| npara == pos) {
                ret.push('\n');
            } else {
                ret.push_str("\n\n");
            }

            let indent = if inquote { quote_indent } else { BULLET_INDENT2 };
            match self.options.wrap_column {
                Some(width) => ret.push_str(&fill(para, width, indent, indent)),
                None => {
                    ret.push_str(indent);
                    ret.push_str(para);
                }
            }
        }

        ret
    }

    /// Merge the context of a StrikeOut or Caret into its text.
    fn merge_context(&self, annot: &Annotation, text: &str) -> String {
        let (pre, post) = annot.get_context(self.options.remove_hyphens);
        let pre = if pre.is_empty() {
            pre
        } else {
            trim_context(&pre, true)
        };
        let post = if post.is_empty() {
            post
        } else {
            trim_context(&post, false)
        };
        match annot.subtype {
            // Whatever glyph the caret touched is not part of the suggestion
            AnnotationType::Caret => format!(
                "{} ^ {}",
                pre.trim_end_matches(' '),
                post.trim_start_matches(' ')
            ),
            _ => format!("{}{}{}", pre, self.style.strikeout(text), post),
        }
    }

    fn format_annot(&self, annot: &Annotation, document: &Document, extra: Option<&str>) -> String {
        // A Caret with a StrikeOut reply is shown as the struck text,
        // commented with the Caret's contents
        let contents = annot.contents.as_deref();
        let annot = match replacement(annot) {
            Some(child) => {
                if let Some(ignored) = &child.contents {
                    warn!("Ignored StrikeOut comment: {}", ignored);
                }
                child
            }
            None => annot,
        };

        let mut text = annot
            .gettext(self.options.remove_hyphens)
            .unwrap_or_default();
        let comment: Vec<&str> = contents
            .map(|c| c.lines().filter(|l| !l.is_empty()).collect())
            .unwrap_or_default();

        if annot.has_context() {
            text = self.merge_context(annot, &text);
        }

        if text.is_empty() && comment.is_empty() {
            warn!("{} has neither text nor a comment; skipped", annot);
            return String::new();
        }

        let mut label = self.format_pos(&annot.pos, document);
        if let Some(extra) = extra {
            label.push(' ');
            label.push_str(extra);
        }
        label.push(':');

        // Short text with at most a short comment fits on one line
        let condensed = self.options.condense
            && !text.is_empty()
            && !annot.has_context()
            && text.split_whitespace().count() <= 10
            && !text.contains('"')
            && !text.contains(". ")
            && comment.len() <= 1;

        if condensed {
            let mut msg = format!("{} \"{}\"", label, text);
            if let Some(first) = comment.first() {
                msg.push_str(" -- ");
                msg.push_str(first);
            }
            format!("{}\n\n", self.format_bullet(&[msg], None))
        } else if text.is_empty() && comment.len() == 1 {
            let msg = format!("{} {}", label, comment[0]);
            format!("{}\n\n", self.format_bullet(&[msg], None))
        } else {
            let mut paras = vec![label];
            let quote = if text.is_empty() {
                None
            } else {
                paras.push(text);
                Some((1, 1))
            };
            paras.extend(comment.iter().map(|c| c.to_string()));
            format!("{}\n\n", self.format_bullet(&paras, quote))
        }
    }

    /// Every annotation in document order, labelled with its type
    fn emit_ungrouped(&self, document: &Document) -> String {
        document
            .iter_annots()
            .map(|a| self.format_annot(a, document, Some(a.subtype.name())))
            .collect()
    }

    fn emit_grouped(&self, document: &Document) -> String {
        let mut nits: Vec<&Annotation> = Vec::new();
        let mut comments: Vec<&Annotation> = Vec::new();
        // Holds only colourless highlights when grouping by colour
        let mut highlights: Vec<&Annotation> = Vec::new();
        let mut highlights_by_color: Vec<(Rgb, Vec<&Annotation>)> = Vec::new();

        for a in document.iter_annots() {
            if is_nit(a.subtype) {
                nits.push(a);
            } else if a.contents.is_some() {
                comments.push(a);
            } else if a.subtype == AnnotationType::Highlight {
                match a.color.filter(|_| self.options.group_highlights_by_color) {
                    Some(color) => match highlights_by_color.iter_mut().find(|(c, _)| *c == color) {
                        Some((_, group)) => group.push(a),
                        None => highlights_by_color.push((color, vec![a])),
                    },
                    None => highlights.push(a),
                }
            }
        }

        let mut out = String::new();
        let mut header_written = false;
        let mut header = |out: &mut String, name: &str, level: usize| {
            if header_written {
                out.push('\n');
            }
            header_written = true;
            out.push_str(&self.style.header(name, level));
        };

        for section in &self.options.sections {
            match section {
                Section::Highlights if !highlights.is_empty() || !highlights_by_color.is_empty() => {
                    header(&mut out, "Highlights", 2);
                    for (color, annots) in &highlights_by_color {
                        header(&mut out, &format!("Color: {}", color.ashex()), 3);
                        for a in annots {
                            out.push_str(&self.format_annot(a, document, None));
                        }
                    }
                    if !highlights.is_empty() && self.options.group_highlights_by_color {
                        header(&mut out, "Color: undefined", 3);
                    }
                    for a in &highlights {
                        out.push_str(&self.format_annot(a, document, None));
                    }
                }
                Section::Comments if !comments.is_empty() => {
                    header(&mut out, "Detailed comments", 2);
                    for a in &comments {
                        out.push_str(&self.format_annot(a, document, None));
                    }
                }
                Section::Nits if !nits.is_empty() => {
                    header(&mut out, "Nits", 2);
                    for a in &nits {
                        let extra = match a.subtype {
                            AnnotationType::Caret if replacement(a).is_some() => {
                                Some("suggested replacement")
                            }
                            AnnotationType::Caret => Some("suggested insertion"),
                            AnnotationType::StrikeOut => Some("suggested deletion"),
                            _ => None,
                        };
                        out.push_str(&self.format_annot(a, document, extra));
                    }
                }
                _ => {}
            }
        }

        out
    }
}

/// The StrikeOut grouped under a Caret, if any
fn replacement(annot: &Annotation) -> Option<&Annotation> {
    if annot.subtype == AnnotationType::Caret {
        annot.child_by_type(AnnotationType::StrikeOut)
    } else {
        None
    }
}

fn is_nit(subtype: AnnotationType) -> bool {
    matches!(
        subtype,
        AnnotationType::Caret
            | AnnotationType::Squiggly
            | AnnotationType::StrikeOut
            | AnnotationType::Underline
    )
}

impl Printer for MarkdownPrinter {
    fn print_file(&mut self, filename: &str, document: &Document) -> Result<String> {
        let body = if self.options.group {
            self.emit_grouped(document)
        } else {
            self.emit_ungrouped(document)
        };

        // Name the file only if it produced some output
        if body.is_empty() || !self.options.print_filename {
            return Ok(body);
        }

        let heading = match self.style {
            Style::Markdown => format!("# File: '{}'\n\n", filename),
            Style::Plain => format!("{}\n", self.style.header(&format!("File: '{}'", filename), 1)),
        };
        Ok(heading + &body)
    }
}
