//! URL slug helpers.
//!
//! Uniqueness probing lives with the content models; this module only
//! produces candidates.

use chrono::Utc;

/// Number of `base`, `base-2`, ... candidates tried before falling back to a
/// timestamp suffix.
pub const MAX_SLUG_ATTEMPTS: u32 = 20;

const MAX_SLUG_LEN: usize = 80;

/// Lowercase ASCII slug: letters and digits, words joined by single dashes.
///
/// Returns `"post"` when nothing usable remains.
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut pending_dash = false;

    for c in input.chars() {
        let c = match c {
            '\u{2019}' | '\'' => continue,
            'à' | 'á' | 'â' | 'ä' | 'À' | 'Á' | 'Â' | 'Ä' => 'a',
            'è' | 'é' | 'ê' | 'ë' | 'È' | 'É' | 'Ê' | 'Ë' => 'e',
            'ì' | 'í' | 'î' | 'ï' => 'i',
            'ò' | 'ó' | 'ô' | 'ö' | 'Ò' | 'Ó' | 'Ô' | 'Ö' => 'o',
            'ù' | 'ú' | 'û' | 'ü' | 'Ù' | 'Ú' | 'Û' | 'Ü' => 'u',
            'ñ' | 'Ñ' => 'n',
            'ç' | 'Ç' => 'c',
            '&' => {
                if !slug.is_empty() {
                    pending_dash = true;
                }
                slug_push_word(&mut slug, &mut pending_dash, "and");
                pending_dash = true;
                continue;
            }
            c => c,
        };

        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }

    if slug.len() > MAX_SLUG_LEN {
        slug.truncate(MAX_SLUG_LEN);
        if let Some(idx) = slug.rfind('-') {
            if idx > MAX_SLUG_LEN / 2 {
                slug.truncate(idx);
            }
        }
        while slug.ends_with('-') {
            slug.pop();
        }
    }

    if slug.is_empty() {
        "post".to_string()
    } else {
        slug
    }
}

fn slug_push_word(slug: &mut String, pending_dash: &mut bool, word: &str) {
    if *pending_dash && !slug.is_empty() {
        slug.push('-');
    }
    *pending_dash = false;
    slug.push_str(word);
}

/// The `attempt`-th candidate for `base` (1-based): `base`, `base-2`, ...
pub fn slug_candidate(base: &str, attempt: u32) -> String {
    if attempt <= 1 {
        base.to_string()
    } else {
        format!("{}-{}", base, attempt)
    }
}

/// Last-resort slug once the probing attempts are exhausted.
pub fn timestamped_slug(base: &str) -> String {
    format!("{}-{}", base, Utc::now().timestamp_millis())
}
