//! Chunkers for general documents.
//!
//! Each chunker turns one input document into a
//! [`ParsedGenericDocument`](apilens_core::ParsedGenericDocument) whose chunks
//! stay within a configured size band and prefer natural break points:
//!
//! - [`TextChunker`]: Markdown sections or packed plain-text paragraphs
//! - [`JsonChunker`]: object entries and grouped array elements
//! - [`PdfChunker`]: per-page text, oversized pages split by paragraph
//! - [`DocxChunker`], [`HtmlChunker`], [`CsvChunker`]: extraction front-ends
//!
//! The helpers in this module work in character offsets so spans recorded on
//! chunks index the parent content by `char`, not by byte.

pub mod csv;
pub mod docx;
pub mod html;
pub mod json;
pub mod pdf;
pub mod text;

pub use self::csv::CsvChunker;
pub use docx::DocxChunker;
pub use html::HtmlChunker;
pub use json::JsonChunker;
pub use pdf::PdfChunker;
pub use text::{TextChunker, TextMode};

use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;

static BLANK_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n[ \t]*\n\s*").expect("blank-line regex"));

/// A piece of text with its character span in the parent content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct TextSpan {
    pub start: usize,
    pub end: usize,
    pub text: String,
}

/// Split text into fixed windows of at most `size` characters.
///
/// A window that does not reach the end of the text is cut at the last
/// sentence end or blank line in its second half, else at the last
/// whitespace, else hard. Consecutive windows share up to `overlap`
/// characters, starting on a word boundary.
pub(crate) fn split_windows(text: &str, size: usize, overlap: usize) -> Vec<TextSpan> {
    let chars: Vec<char> = text.chars().collect();
    let total = chars.len();
    let size = size.max(1);
    let mut spans = Vec::new();
    let mut start = 0;

    while start < total {
        let hard_end = (start + size).min(total);
        let end = if hard_end < total {
            find_break(&chars, start, hard_end)
        } else {
            hard_end
        };

        let piece: String = chars[start..end].iter().collect();
        let trimmed = piece.trim();
        if !trimmed.is_empty() {
            spans.push(TextSpan {
                start,
                end,
                text: trimmed.to_string(),
            });
        }

        if end >= total {
            break;
        }

        let mut next = end.saturating_sub(overlap).max(start + 1);
        while next < end && !chars[next - 1].is_whitespace() {
            next += 1;
        }
        start = next;
    }

    spans
}

fn find_break(chars: &[char], start: usize, end: usize) -> usize {
    let floor = start + (end - start) / 2;

    let mut i = end;
    while i > floor {
        let c = chars[i - 1];
        if matches!(c, '.' | '!' | '?') && chars[i].is_whitespace() {
            return i;
        }
        if c == '\n' && i >= 2 && chars[i - 2] == '\n' {
            return i;
        }
        i -= 1;
    }

    let mut i = end;
    while i > floor {
        if chars[i - 1].is_whitespace() {
            return i;
        }
        i -= 1;
    }

    end
}

/// Split text on blank lines, keeping character spans.
pub(crate) fn split_paragraphs(text: &str) -> Vec<TextSpan> {
    let mut paragraphs = Vec::new();
    let mut last_byte = 0;
    let mut last_char = 0;

    let mut emit = |from_byte: usize, to_byte: usize, from_char: usize, to_char: usize| {
        let raw = &text[from_byte..to_byte];
        let trimmed = raw.trim();
        if !trimmed.is_empty() {
            paragraphs.push(TextSpan {
                start: from_char,
                end: to_char,
                text: trimmed.to_string(),
            });
        }
    };

    for separator in BLANK_LINE.find_iter(text) {
        let para_end_char = last_char + text[last_byte..separator.start()].chars().count();
        emit(last_byte, separator.start(), last_char, para_end_char);
        last_char = para_end_char + separator.as_str().chars().count();
        last_byte = separator.end();
    }

    let end_char = last_char + text[last_byte..].chars().count();
    emit(last_byte, text.len(), last_char, end_char);

    paragraphs
}

/// Greedily pack paragraphs into chunks of at most `max_chars` characters.
///
/// Paragraphs are joined with a blank line. A paragraph that alone exceeds
/// the limit is split with [`split_windows`].
pub(crate) fn pack_paragraphs(
    paragraphs: &[TextSpan],
    max_chars: usize,
    overlap: usize,
) -> Vec<TextSpan> {
    let mut packed = Vec::new();
    let mut group: Vec<&TextSpan> = Vec::new();
    let mut group_chars = 0;

    for paragraph in paragraphs {
        let len = paragraph.text.chars().count();

        if len > max_chars {
            flush_group(&mut group, &mut packed);
            group_chars = 0;
            packed.extend(
                split_windows(&paragraph.text, max_chars, overlap)
                    .into_iter()
                    .map(|w| TextSpan {
                        start: paragraph.start + w.start,
                        end: paragraph.start + w.end,
                        text: w.text,
                    }),
            );
            continue;
        }

        let joined = if group.is_empty() {
            len
        } else {
            group_chars + 2 + len
        };
        if joined > max_chars {
            flush_group(&mut group, &mut packed);
            group_chars = len;
        } else {
            group_chars = joined;
        }
        group.push(paragraph);
    }
    flush_group(&mut group, &mut packed);

    packed
}

fn flush_group(group: &mut Vec<&TextSpan>, out: &mut Vec<TextSpan>) {
    if let (Some(first), Some(last)) = (group.first(), group.last()) {
        let text = group
            .iter()
            .map(|p| p.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");
        out.push(TextSpan {
            start: first.start,
            end: last.end,
            text,
        });
    }
    group.clear();
}

/// File stem of a source path, used as a fallback title.
pub(crate) fn file_stem(source_file: Option<&str>) -> Option<String> {
    let stem = Path::new(source_file?).file_stem()?.to_str()?;
    (!stem.is_empty()).then(|| stem.to_string())
}

/// Truncate to at most `max` characters.
pub(crate) fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}
