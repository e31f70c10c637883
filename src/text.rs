//! Text clean-up helpers shared by extraction and printing

use chrono::{NaiveDate, NaiveDateTime};

/// Characters replaced with plain ASCII equivalents
const CHARACTER_SUBSTITUTIONS: &[(char, &str)] = &[
    ('\u{FB00}', "ff"),
    ('\u{FB01}', "fi"),
    ('\u{FB02}', "fl"),
    ('\u{FB03}', "ffi"),
    ('\u{FB04}', "ffl"),
    ('\u{2018}', "'"),
    ('\u{2019}', "'"),
    ('\u{201C}', "\""),
    ('\u{201D}', "\""),
    ('\u{2026}', "..."),
];

fn substitute(c: char) -> Option<&'static str> {
    CHARACTER_SUBSTITUTIONS
        .iter()
        .find(|(from, _)| *from == c)
        .map(|(_, to)| *to)
}

/// Normalise line endings and replace common special characters with plain
/// ASCII equivalents.
pub fn cleanup_text(text: &str) -> String {
    let normalised;
    let text = if text.contains('\r') {
        normalised = text.replace("\r\n", "\n").replace('\r', "\n");
        normalised.as_str()
    } else {
        text
    };

    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match substitute(c) {
            Some(s) => out.push_str(s),
            None => out.push(c),
        }
    }
    out
}

/// Merge the lines of captured text into a single paragraph.
///
/// Consecutive line breaks collapse into one space, unless the line before
/// ends in an apparent hyphenation, in which case the break is dropped (and
/// the hyphen too, when `remove_hyphens` is set).
pub fn merge_lines(captured: &str, remove_hyphens: bool, strip_space: bool) -> String {
    let lines: Vec<&str> = captured.lines().collect();
    let mut results: Vec<String> = Vec::with_capacity(lines.len());

    for (i, &line) in lines.iter().enumerate() {
        if line.is_empty() {
            continue;
        }

        let next = lines.get(i + 1).copied();
        let mut rev = line.chars().rev();
        let last = rev.next();
        let before_last = rev.next();

        let mut this = line.to_string();
        if last == Some('-') && before_last.is_some_and(char::is_lowercase) {
            if remove_hyphens {
                this.pop();
            }
        } else if !last.is_some_and(char::is_whitespace)
            && next.is_some_and(|n| !n.starts_with(char::is_whitespace))
        {
            this.push(' ');
        }

        results.push(cleanup_text(&this));
    }

    if strip_space {
        if let Some(first) = results.first_mut() {
            *first = first.trim_start().to_string();
        }
        if let Some(last) = results.last_mut() {
            *last = last.trim_end().to_string();
        }
    }

    results.concat()
}

/// Empty, `Z`, `Z0000` or `[+-]HHmm` (apostrophes already removed)
fn is_utc_offset(zone: &str) -> bool {
    match zone.as_bytes() {
        [] | [b'Z'] | [b'Z', b'0', b'0', b'0', b'0'] => true,
        [b'+' | b'-', digits @ ..] => digits.len() == 4 && digits.iter().all(u8::is_ascii_digit),
        _ => false,
    }
}

/// Parse a PDF date string (`D:YYYYMMDDHHmmSSOHH'mm'`).
///
/// Everything after the year is optional. The time zone is accepted but
/// not applied: the result is the wall-clock time recorded in the file.
pub fn decode_datetime(raw: &str) -> Option<NaiveDateTime> {
    let s = raw.trim();
    let s = s.strip_prefix("D:").unwrap_or(s);

    let digits_end = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    let (digits, zone) = s.split_at(digits_end);
    if digits.len() < 4 || digits.len() > 14 || digits.len() % 2 != 0 {
        return None;
    }

    let zone: String = zone.chars().filter(|&c| c != '\'').collect();
    if !is_utc_offset(&zone) {
        return None;
    }

    let field = |start: usize, default: u32| -> Option<u32> {
        match digits.get(start..start + 2) {
            Some(part) => part.parse().ok(),
            None => Some(default),
        }
    };

    let year: i32 = digits[0..4].parse().ok()?;
    let date = NaiveDate::from_ymd_opt(year, field(4, 1)?, field(6, 1)?)?;
    date.and_hms_opt(field(8, 0)?, field(10, 0)?, field(12, 0)?)
}
