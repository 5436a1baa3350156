/// Pure utility functions for cleaning up generated copy
///
/// These functions contain NO side effects - they take inputs and return outputs
/// without touching databases, making API calls, or performing I/O.
use lazy_static::lazy_static;
use regex::{Captures, Regex};

/// Filler phrases the model likes to open or pad sentences with.
///
/// Each one can be removed without breaking the sentence around it.
pub const BANNED_PHRASES: &[&str] = &[
    "in today's fast-paced world",
    "look no further",
    "it's important to note that",
    "it is important to note that",
    "in conclusion",
    "at the end of the day",
    "without further ado",
    "needless to say",
    "rest assured",
    "simply put",
    "all in all",
    "whether you're a homeowner or a business owner",
    "truly",
];

lazy_static! {
    static ref BANNED_REGEX: Regex = {
        let alternatives = BANNED_PHRASES
            .iter()
            .map(|p| regex::escape(p))
            .collect::<Vec<_>>()
            .join("|");
        Regex::new(&format!(r"(?i)\b(?:{})\b[,:!]?[ \t]*", alternatives)).unwrap()
    };
    static ref REPEATED_BANG: Regex = Regex::new(r"!{2,}").unwrap();
    static ref REPEATED_QUESTION: Regex = Regex::new(r"\?{2,}").unwrap();
    static ref REPEATED_COMMA: Regex = Regex::new(r",{2,}").unwrap();
    static ref LONG_ELLIPSIS: Regex = Regex::new(r"\.{4,}").unwrap();
    static ref SPACE_BEFORE_PUNCT: Regex = Regex::new(r"[ \t]+([,.;:!?])").unwrap();
    static ref MISSING_SPACE_AFTER: Regex = Regex::new(r"([,;:!?])([A-Za-z])").unwrap();
    static ref TOKEN: Regex = Regex::new(r"\S+").unwrap();
    // Dot between word characters with a lowercase/digit after it: domains, e.g., file names.
    static ref INNER_DOT: Regex = Regex::new(r"[A-Za-z0-9]\.[a-z0-9]").unwrap();
    static ref INLINE_WHITESPACE: Regex = Regex::new(r"[ \t]+").unwrap();
    static ref PARAGRAPH_BREAK: Regex = Regex::new(r"\n[ \t]*\n\s*").unwrap();
    static ref DOUBLE_COMMA_SPACED: Regex = Regex::new(r",\s*,").unwrap();
}

/// Replace typographic punctuation with plain ASCII and tidy spacing.
pub fn normalize_punctuation(text: &str) -> String {
    let mut out = text
        .replace(['\u{2018}', '\u{2019}', '\u{02BC}'], "'")
        .replace(['\u{201C}', '\u{201D}'], "\"")
        .replace('\u{2026}', "...")
        .replace(" \u{2014} ", ", ")
        .replace('\u{2014}', ", ")
        .replace('\u{2013}', "-")
        .replace('\u{00A0}', " ");

    out = REPEATED_BANG.replace_all(&out, "!").into_owned();
    out = REPEATED_QUESTION.replace_all(&out, "?").into_owned();
    out = REPEATED_COMMA.replace_all(&out, ",").into_owned();
    out = LONG_ELLIPSIS.replace_all(&out, "...").into_owned();
    out = SPACE_BEFORE_PUNCT.replace_all(&out, "$1").into_owned();
    out = DOUBLE_COMMA_SPACED.replace_all(&out, ",").into_owned();
    out = space_after_marks(&out);

    normalize_whitespace(&out)
}

/// URLs, paths, emails and query strings keep their punctuation as written.
fn looks_like_address(token: &str) -> bool {
    token.contains('/') || token.contains('@') || token.contains('=') || INNER_DOT.is_match(token)
}

fn space_after_marks(text: &str) -> String {
    TOKEN
        .replace_all(text, |caps: &Captures| {
            let token = &caps[0];
            if looks_like_address(token) {
                token.to_string()
            } else {
                MISSING_SPACE_AFTER.replace_all(token, "$1 $2").into_owned()
            }
        })
        .into_owned()
}

/// Collapse runs of spaces, trim lines, and keep paragraphs one blank line apart.
pub fn normalize_whitespace(text: &str) -> String {
    PARAGRAPH_BREAK
        .split(text.trim())
        .map(|paragraph| {
            paragraph
                .lines()
                .map(|line| INLINE_WHITESPACE.replace_all(line.trim(), " ").into_owned())
                .filter(|line| !line.is_empty())
                .collect::<Vec<_>>()
                .join("\n")
        })
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Remove banned filler phrases.
///
/// A removal that leaves a sentence start behind capitalizes the next word;
/// the rest of the text is not touched.
pub fn strip_banned_phrases(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut capitalize_next = false;
    let mut last = 0;

    for found in BANNED_REGEX.find_iter(text) {
        push_segment(&mut out, &text[last..found.start()], &mut capitalize_next);
        if at_sentence_start(&out) {
            capitalize_next = true;
        }
        last = found.end();
    }
    push_segment(&mut out, &text[last..], &mut capitalize_next);
    out
}

fn at_sentence_start(before: &str) -> bool {
    match before.trim_end_matches([' ', '\t', '"', '(']).chars().last() {
        None => true,
        Some(c) => ends_sentence(c) || c == '\n',
    }
}

fn push_segment(out: &mut String, segment: &str, capitalize_next: &mut bool) {
    for c in segment.chars() {
        if *capitalize_next {
            if c.is_alphabetic() {
                out.extend(c.to_uppercase());
                *capitalize_next = false;
                continue;
            }
            if !(c.is_whitespace() || c == '"' || c == '(') {
                *capitalize_next = false;
            }
        }
        out.push(c);
    }
}

fn ends_sentence(c: char) -> bool {
    matches!(c, '.' | '!' | '?')
}

fn is_structural_line(paragraph: &str) -> bool {
    let first = paragraph.trim_start();
    first.starts_with('#') || first.starts_with("- ") || first.starts_with("* ")
}

/// Make sure every prose paragraph ends with `.`, `!` or `?`.
///
/// Headings and list blocks are left alone. A trailing `,`, `;` or `:` is
/// replaced rather than followed.
pub fn ensure_sentence_endings(text: &str) -> String {
    text.split("\n\n")
        .map(|paragraph| {
            if is_structural_line(paragraph) {
                return paragraph.to_string();
            }
            let trimmed = paragraph
                .trim_end()
                .trim_end_matches([',', ';', ':', '-'])
                .trim_end();
            let last = trimmed.chars().last();
            match last {
                None => String::new(),
                Some(c) if ends_sentence(c) => trimmed.to_string(),
                // Closing quote or paren after terminal punctuation.
                Some('"') | Some(')')
                    if trimmed
                        .chars()
                        .rev()
                        .nth(1)
                        .map(ends_sentence)
                        .unwrap_or(false) =>
                {
                    trimmed.to_string()
                }
                Some(_) => format!("{}.", trimmed),
            }
        })
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Clip text to at most `max_chars` characters.
///
/// Prefers to cut after the last complete sentence in the window; when the
/// window has no usable sentence break it cuts at the last word and closes
/// the fragment with a period. Text already within the limit is returned
/// unchanged.
pub fn clip_text(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    if max_chars == 0 {
        return String::new();
    }

    let window: String = text.chars().take(max_chars).collect();

    // Sentence break: terminal punctuation followed by whitespace (or the
    // character right after the window being whitespace).
    let next_char = text.chars().nth(max_chars);
    let mut sentence_cut = None;
    let chars: Vec<(usize, char)> = window.char_indices().collect();
    for (i, &(byte_idx, c)) in chars.iter().enumerate() {
        if !ends_sentence(c) {
            continue;
        }
        let followed_by_space = match chars.get(i + 1) {
            Some(&(_, next)) => next.is_whitespace(),
            None => next_char.map(char::is_whitespace).unwrap_or(true),
        };
        if followed_by_space {
            sentence_cut = Some(byte_idx + c.len_utf8());
        }
    }

    if let Some(end) = sentence_cut {
        if window[..end].chars().count() >= max_chars / 3 {
            return window[..end].trim_end().to_string();
        }
    }

    // Word break, leaving room for the closing period.
    let room: String = text.chars().take(max_chars - 1).collect();
    let cut = room
        .rfind(char::is_whitespace)
        .map(|idx| &room[..idx])
        .unwrap_or(room.as_str());
    let fragment = cut.trim_end().trim_end_matches([',', ';', ':', '-']).trim_end();
    if fragment.is_empty() {
        return String::new();
    }
    if fragment.chars().last().map(ends_sentence).unwrap_or(false) {
        fragment.to_string()
    } else {
        format!("{}.", fragment)
    }
}

/// Full cleanup pass for generated prose: phrases, punctuation, endings, length.
pub fn sanitize_generated_text(text: &str, max_chars: usize) -> String {
    let normalized = normalize_punctuation(text);
    let stripped = strip_banned_phrases(&normalized);
    let tidy = normalize_punctuation(&stripped);
    let ended = ensure_sentence_endings(&tidy);
    clip_text(&ended, max_chars)
}

/// Cleanup for titles: no heading markers, wrapping quotes or trailing period.
pub fn sanitize_title(text: &str, max_chars: usize) -> String {
    let first_line = text.lines().find(|l| !l.trim().is_empty()).unwrap_or("");
    let without_marker = first_line
        .trim()
        .trim_start_matches('#')
        .trim_start()
        .trim_start_matches("Title:")
        .trim_start_matches("title:")
        .trim();
    let normalized = normalize_punctuation(&strip_banned_phrases(without_marker));
    let unquoted = normalized.trim_matches(|c| c == '"' || c == '\'' || c == '*');
    let trimmed = unquoted.trim().trim_end_matches('.').trim_end();

    if trimmed.chars().count() <= max_chars {
        return trimmed.to_string();
    }
    let window: String = trimmed.chars().take(max_chars).collect();
    let cut = window
        .rfind(char::is_whitespace)
        .map(|idx| &window[..idx])
        .unwrap_or(window.as_str());
    cut.trim_end_matches([',', ';', ':', '-', ' ']).to_string()
}

/// Truncate to `max_chars` characters on a character boundary.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}
