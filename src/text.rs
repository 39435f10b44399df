//! Text preparation for the catalogue page.
//!
//! The page is set in the PDF base-14 Helvetica faces, which only carry a single-byte glyph set.
//! Every string that ends up on the page goes through [`sanitize`] first, and every width
//! decision is made with a caller-supplied measuring function so the helpers here stay
//! independent of the font tables.

use chrono::NaiveDate;
use unicode_normalization::UnicodeNormalization;

use crate::model::ShapedOffice;

/// Glyph drawn in place of a missing value.
pub const PLACEHOLDER: &str = "\u{2014}";

fn is_bidi_mark(ch: char) -> bool {
    matches!(ch, '\u{200E}' | '\u{200F}' | '\u{202A}'..='\u{202E}')
}

fn is_combining_mark(ch: char) -> bool {
    ('\u{0300}'..='\u{036F}').contains(&ch)
}

fn is_single_byte_printable(ch: char) -> bool {
    matches!(ch, '\u{20}'..='\u{7E}' | '\u{A0}'..='\u{FF}')
}

/// Reduces arbitrary text to characters the single-byte page font can encode.
///
/// Bidi marks are removed, non-breaking spaces become spaces, accented letters lose their
/// diacritics, tabs and line breaks become spaces, and whatever is still outside the printable
/// single-byte range is dropped.
pub fn sanitize(input: &str) -> String {
    input
        .chars()
        .filter(|ch| !is_bidi_mark(*ch))
        .map(|ch| if ch == '\u{A0}' { ' ' } else { ch })
        .nfkd()
        .filter(|ch| !is_combining_mark(*ch))
        .map(|ch| if matches!(ch, '\t' | '\n' | '\r') { ' ' } else { ch })
        .filter(|ch| is_single_byte_printable(*ch))
        .collect()
}

/// Sanitizes `value`, substituting the placeholder glyph when nothing printable is left.
pub fn or_placeholder(value: &str) -> String {
    let clean = sanitize(value);
    if clean.trim().is_empty() {
        PLACEHOLDER.to_string()
    } else {
        clean
    }
}

/// Collapses every whitespace run to a single space and trims the ends.
pub fn collapse_whitespace(input: &str) -> String {
    input.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Greedy word wrap against a measured width.
///
/// Words are appended to the current line while `measure(line) <= max_width`. A word that is
/// wider than `max_width` on its own is split between characters so no emitted line is ever
/// wider than the limit.
pub fn wrap_words<F>(text: &str, max_width: f64, measure: F) -> Vec<String>
where
    F: Fn(&str) -> f64,
{
    let mut lines = Vec::new();
    let mut line = String::new();

    for word in text.split_whitespace() {
        let candidate = if line.is_empty() {
            word.to_string()
        } else {
            format!("{line} {word}")
        };

        if measure(&candidate) <= max_width {
            line = candidate;
            continue;
        }

        if !line.is_empty() {
            lines.push(std::mem::take(&mut line));
        }

        if measure(word) <= max_width {
            line = word.to_string();
        } else {
            let mut pieces = split_to_width(word, max_width, &measure);
            line = pieces.pop().unwrap_or_default();
            lines.extend(pieces);
        }
    }

    if !line.is_empty() {
        lines.push(line);
    }
    lines
}

fn split_to_width<F>(word: &str, max_width: f64, measure: &F) -> Vec<String>
where
    F: Fn(&str) -> f64,
{
    let mut pieces = Vec::new();
    let mut piece = String::new();
    for ch in word.chars() {
        piece.push(ch);
        if measure(&piece) > max_width && piece.chars().count() > 1 {
            piece.pop();
            pieces.push(std::mem::take(&mut piece));
            piece.push(ch);
        }
    }
    if !piece.is_empty() {
        pieces.push(piece);
    }
    pieces
}

/// Shortens `text` with a trailing `...` until it fits into `max_width`.
pub fn truncate_to_width<F>(text: &str, max_width: f64, measure: F) -> String
where
    F: Fn(&str) -> f64,
{
    if measure(text) <= max_width {
        return text.to_string();
    }
    let mut chars: Vec<char> = text.chars().collect();
    while !chars.is_empty() {
        chars.pop();
        let candidate = format!("{}...", chars.iter().collect::<String>().trim_end());
        if measure(&candidate) <= max_width {
            return candidate;
        }
    }
    String::new()
}

/// Builds the footer contact line from whichever contact fields are present.
///
/// Separators only appear between present items.
pub fn contact_line(office: &ShapedOffice) -> String {
    let mut items = Vec::new();
    let phone = sanitize(&office.phone);
    let secondary = sanitize(&office.secondary_phone);
    let whatsapp = sanitize(&office.whatsapp);
    let email = sanitize(&office.email);

    if !phone.trim().is_empty() {
        items.push(format!("Phone: {}", phone.trim()));
    }
    if !secondary.trim().is_empty() {
        items.push(secondary.trim().to_string());
    }
    if !whatsapp.trim().is_empty() {
        items.push(format!("WhatsApp: {}", whatsapp.trim()));
    }
    if !email.trim().is_empty() {
        items.push(format!("Email: {}", email.trim()));
    }
    items.join(" | ")
}

/// Drops a leading `http://` or `https://` and one trailing slash.
pub fn strip_scheme(website: &str) -> String {
    let trimmed = website.trim();
    let without_scheme = trimmed
        .strip_prefix("https://")
        .or_else(|| trimmed.strip_prefix("http://"))
        .unwrap_or(trimmed);
    without_scheme
        .strip_suffix('/')
        .unwrap_or(without_scheme)
        .to_string()
}

/// Collapses every run of characters other than ASCII letters and digits into one hyphen.
pub fn hyphenate(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut in_run = false;
    for ch in input.chars() {
        if ch.is_ascii_alphanumeric() {
            out.push(ch);
            in_run = false;
        } else if !in_run {
            out.push('-');
            in_run = true;
        }
    }
    out
}

/// Download filename for a rendered catalogue: `<name>-<slug>-<YYYY-MM-DD>.pdf`.
pub fn catalogue_filename(product_name: &str, slug: &str, date: NaiveDate) -> String {
    let name = sanitize(product_name);
    let name = if name.trim().is_empty() {
        "catalog".to_string()
    } else {
        name
    };
    format!(
        "{}-{}-{}.pdf",
        hyphenate(&name),
        hyphenate(slug.trim()),
        date.format("%Y-%m-%d")
    )
}
