//! Parsing and cleanup of model output.

use openai_client::strip_code_blocks;
use serde::{Deserialize, Serialize};

use super::fallback::{fallback_body, fallback_title};
use super::models::{GenerationPayload, TargetType};
use crate::common::utils::{clip_text, sanitize_generated_text, sanitize_title};

pub const TITLE_LIMIT: usize = 90;
pub const EXCERPT_LIMIT: usize = 220;
pub const BODY_LIMIT: usize = 2400;

/// Fields as the model returned them, before cleanup
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawDraft {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, alias = "summary")]
    pub excerpt: Option<String>,
    #[serde(default, alias = "description", alias = "content")]
    pub body: Option<String>,
}

/// Cleaned copy ready to persist
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeneratedDraft {
    pub title: String,
    pub excerpt: String,
    pub body: String,
    /// True when the body came from the template instead of the model
    pub used_fallback: bool,
}

/// Read the model's reply as a JSON object, or as free text where a leading
/// `# Heading` or `Title:` line becomes the title.
pub fn parse_draft(raw: &str) -> RawDraft {
    let stripped = strip_code_blocks(raw);

    if stripped.starts_with('{') {
        if let Ok(draft) = serde_json::from_str::<RawDraft>(stripped) {
            return draft;
        }
    }

    let mut lines = stripped.lines().skip_while(|l| l.trim().is_empty()).peekable();
    let mut title = None;
    if let Some(first) = lines.peek() {
        let first = first.trim();
        let heading = first
            .strip_prefix("# ")
            .or_else(|| first.strip_prefix("Title:"))
            .or_else(|| first.strip_prefix("title:"));
        if let Some(heading) = heading {
            title = Some(heading.trim().to_string());
            lines.next();
        }
    }

    let body = lines.collect::<Vec<_>>().join("\n").trim().to_string();
    RawDraft {
        title,
        excerpt: None,
        body: Some(body).filter(|b| !b.is_empty()),
    }
}

/// Sanitize a parsed draft, filling gaps from the request and the template.
pub fn finalize_draft(
    raw: RawDraft,
    target: TargetType,
    payload: &GenerationPayload,
    lead_caption: Option<&str>,
) -> GeneratedDraft {
    let title = raw
        .title
        .as_deref()
        .map(|t| sanitize_title(t, TITLE_LIMIT))
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| sanitize_title(&fallback_title(target, payload), TITLE_LIMIT));

    let mut used_fallback = false;
    let body = raw
        .body
        .as_deref()
        .map(|b| sanitize_generated_text(b, BODY_LIMIT))
        .filter(|b| !b.is_empty())
        .unwrap_or_else(|| {
            used_fallback = true;
            sanitize_generated_text(&fallback_body(target, payload, lead_caption), BODY_LIMIT)
        });

    let excerpt = raw
        .excerpt
        .as_deref()
        .map(|e| sanitize_generated_text(e, EXCERPT_LIMIT))
        .filter(|e| !e.is_empty())
        .unwrap_or_else(|| {
            let first_paragraph = body.split("\n\n").next().unwrap_or(&body);
            clip_text(first_paragraph, EXCERPT_LIMIT)
        });

    GeneratedDraft {
        title,
        excerpt,
        body,
        used_fallback,
    }
}

/// The all-template draft used when the completion call itself failed.
pub fn fallback_draft(
    target: TargetType,
    payload: &GenerationPayload,
    lead_caption: Option<&str>,
) -> GeneratedDraft {
    finalize_draft(RawDraft::default(), target, payload, lead_caption)
}
