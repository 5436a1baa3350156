//! Prompt construction and lead photo selection.

use lazy_static::lazy_static;
use regex::Regex;

use super::models::{GenerationPayload, TargetType};
use crate::domains::photos::Photo;

/// Words that say nothing about the work when used as a whole caption
const STOCK_CAPTIONS: &[&str] = &[
    "photo", "image", "picture", "pic", "untitled", "before", "after", "progress", "img",
    "final", "done", "job", "site", "work",
];

lazy_static! {
    // Camera and phone file names: IMG_1234, DSC01234, PXL_20240101_..., 20240101_123456
    static ref CAMERA_FILENAME: Regex = Regex::new(
        r"(?i)^(img|dsc|dscn|dscf|dcim|pxl|mvimg|photo|image|screenshot)?[-_ ]?\d{3,}[\w-]*(\.(jpe?g|png|heic|heif|webp|gif))?$"
    )
    .unwrap();
    static ref IMAGE_EXTENSION: Regex = Regex::new(r"(?i)\.(jpe?g|png|heic|heif|webp|gif)$").unwrap();
}

/// True for captions that carry no description of the work.
pub fn is_generic_caption(caption: &str) -> bool {
    let trimmed = caption.trim();
    if trimmed.chars().filter(|c| c.is_alphanumeric()).count() < 3 {
        return true;
    }
    if CAMERA_FILENAME.is_match(trimmed) || IMAGE_EXTENSION.is_match(trimmed) {
        return true;
    }

    let words: Vec<String> = trimmed
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(|w| w.to_lowercase())
        .collect();
    words
        .iter()
        .all(|w| STOCK_CAPTIONS.contains(&w.as_str()) || w.chars().all(|c| c.is_ascii_digit()))
}

/// First photo with a descriptive caption, else the first photo.
pub fn select_lead_photo(photos: &[Photo]) -> Option<&Photo> {
    photos
        .iter()
        .find(|p| p.caption().map(|c| !is_generic_caption(c)).unwrap_or(false))
        .or_else(|| photos.first())
}

const DEFAULT_INSTRUCTIONS: &str = "You write project write-ups for a concrete contracting \
company's website. Describe the work shown plainly and specifically. Use only details from the \
request and the photo; do not invent measurements, prices, materials or customer quotes. Avoid \
marketing filler and superlatives. Keep paragraphs short.";

const FORMAT_INSTRUCTIONS: &str = "Respond with a JSON object with the keys \"title\" (under 80 \
characters), \"excerpt\" (one or two sentences) and \"body\" (plain text paragraphs separated by \
blank lines).";

/// System instructions. An override replaces the default instructions; the
/// output format requirement is always kept.
pub fn system_prompt(target: TargetType, prompt_override: Option<&str>) -> String {
    let instructions = match prompt_override.map(str::trim).filter(|p| !p.is_empty()) {
        Some(custom) => custom.to_string(),
        None => {
            let length = match target {
                TargetType::BlogPost => "Write three to five paragraphs.",
                TargetType::JobListing => "Write one or two paragraphs for the project gallery.",
            };
            format!("{} {}", DEFAULT_INSTRUCTIONS, length)
        }
    };
    format!("{}\n\n{}", instructions, FORMAT_INSTRUCTIONS)
}

fn field(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// User prompt listing the request context and every photo caption in order.
pub fn user_prompt(
    target: TargetType,
    payload: &GenerationPayload,
    photos: &[Photo],
    lead: Option<&Photo>,
) -> String {
    let mut lines = vec![format!("Write a {}.", target.label())];

    if let Some(title) = field(payload.title.as_deref()) {
        lines.push(format!("Working title: {}", title));
    }
    if let Some(service) = field(payload.service.as_deref()) {
        lines.push(format!("Service: {}", service));
    }
    if let Some(location) = field(payload.location.as_deref()) {
        lines.push(format!("Location: {}", location));
    }
    if let Some(notes) = field(payload.notes.as_deref()) {
        lines.push(format!("Notes from the crew: {}", notes));
    }

    lines.push(String::new());
    lines.push(format!("Photos ({}), in order:", photos.len()));
    for (i, photo) in photos.iter().enumerate() {
        let caption = photo.caption().unwrap_or("(no caption)");
        let marker = if lead.map(|l| l.id == photo.id).unwrap_or(false) {
            " [attached]"
        } else {
            ""
        };
        lines.push(format!("{}. {}{}", i + 1, caption, marker));
    }

    lines.join("\n")
}
