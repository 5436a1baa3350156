//! Generation step: photos + request in, cleaned draft out.

use anyhow::Result;
use tracing::{info, warn};

use crate::domains::generation::models::{GenerationPayload, TargetType};
use crate::domains::generation::output::{
    fallback_draft, finalize_draft, parse_draft, GeneratedDraft, BODY_LIMIT,
};
use crate::domains::generation::prompt::{select_lead_photo, system_prompt, user_prompt};
use crate::domains::photos::Photo;
use crate::kernel::ai::complete_with_image_retry;
use crate::kernel::{BaseVisionAI, VisionRequest};

/// Build the completion request for a selection; the lead photo is attached.
pub fn build_request(
    target: TargetType,
    payload: &GenerationPayload,
    prompt_override: Option<&str>,
    photos: &[Photo],
) -> VisionRequest {
    let lead = select_lead_photo(photos);
    let mut request = VisionRequest::new(
        system_prompt(target, prompt_override),
        user_prompt(target, payload, photos, lead),
    );
    // Room for the body plus JSON framing
    request.max_tokens = (BODY_LIMIT / 3) as u32 + 400;
    if let Some(lead) = lead {
        request = request.with_image(lead.image_url.clone());
    }
    request
}

/// Write a draft for the selected photos.
///
/// An empty selection is an error and makes no external call. A failed
/// completion (after the single image-less retry) falls back to the template.
pub async fn generate_draft(
    ai: &dyn BaseVisionAI,
    target: TargetType,
    payload: &GenerationPayload,
    prompt_override: Option<&str>,
    photos: &[Photo],
) -> Result<GeneratedDraft> {
    if photos.is_empty() {
        anyhow::bail!("No photos selected");
    }

    let lead_caption = select_lead_photo(photos).and_then(|p| p.caption());
    let request = build_request(target, payload, prompt_override, photos);

    let draft = match complete_with_image_retry(ai, &request).await {
        Ok(text) => finalize_draft(parse_draft(&text), target, payload, lead_caption),
        Err(e) => {
            warn!(error = %format!("{:#}", e), "Completion failed, using template copy");
            fallback_draft(target, payload, lead_caption)
        }
    };

    info!(
        photo_count = photos.len(),
        used_fallback = draft.used_fallback,
        title = %draft.title,
        "Draft generated"
    );
    Ok(draft)
}
