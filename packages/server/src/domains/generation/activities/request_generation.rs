//! Request generation from a photo selection.

use std::collections::HashSet;

use anyhow::Context;
use serde::Deserialize;
use thiserror::Error;
use tracing::info;

use super::claim::claim_candidates;
use super::process_queue::run_job;
use crate::common::{AdminUserId, LockToken, PhotoId};
use crate::domains::generation::models::{
    GenerationJob, GenerationPayload, NewGenerationJob, TargetType,
};
use crate::domains::photos::Photo;
use crate::kernel::ServerDeps;

/// Most photos one request may select
pub const MAX_SELECTION: usize = 24;

#[derive(Debug, Clone, Deserialize)]
pub struct GenerationSelection {
    pub target_type: String,
    #[serde(default)]
    pub photo_ids: Vec<PhotoId>,
    #[serde(flatten)]
    pub payload: GenerationPayload,
    #[serde(default)]
    pub prompt_override: Option<String>,
    /// Claim and process the new job inline instead of waiting for the worker
    #[serde(default)]
    pub process_now: bool,
}

#[derive(Debug, Error)]
pub enum SelectionError {
    #[error("Select at least one photo")]
    Empty,

    #[error("Select at most {max} photos (got {count})")]
    TooMany { max: usize, count: usize },

    #[error("Unknown target type: {0}")]
    UnknownTarget(String),

    #[error("Unknown photos: {}", .0.iter().map(|id| id.to_string()).collect::<Vec<_>>().join(", "))]
    UnknownPhotos(Vec<PhotoId>),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

/// De-duplicate (first occurrence wins) and bound the selection.
pub fn validate_selection(photo_ids: &[PhotoId]) -> Result<Vec<PhotoId>, SelectionError> {
    let mut seen = HashSet::new();
    let unique: Vec<PhotoId> = photo_ids
        .iter()
        .copied()
        .filter(|id| seen.insert(*id))
        .collect();

    if unique.is_empty() {
        return Err(SelectionError::Empty);
    }
    if unique.len() > MAX_SELECTION {
        return Err(SelectionError::TooMany {
            max: MAX_SELECTION,
            count: unique.len(),
        });
    }
    Ok(unique)
}

/// Validate a selection and queue a generation job for it.
///
/// With `process_now` the new job is claimed and processed before returning;
/// the returned row reflects the outcome.
pub async fn request_generation(
    actor: AdminUserId,
    selection: GenerationSelection,
    deps: &ServerDeps,
) -> Result<GenerationJob, SelectionError> {
    let target: TargetType = selection
        .target_type
        .parse()
        .map_err(|_| SelectionError::UnknownTarget(selection.target_type.clone()))?;
    let photo_ids = validate_selection(&selection.photo_ids)?;

    let found = Photo::find_by_ids(&photo_ids, &deps.db_pool)
        .await
        .context("Failed to load selected photos")?;
    if found.len() != photo_ids.len() {
        let known: HashSet<PhotoId> = found.iter().map(|p| p.id).collect();
        let missing = photo_ids
            .iter()
            .copied()
            .filter(|id| !known.contains(id))
            .collect();
        return Err(SelectionError::UnknownPhotos(missing));
    }

    let prompt_override = selection
        .prompt_override
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty());

    let job = GenerationJob::enqueue(
        NewGenerationJob::builder()
            .target_type(target)
            .photo_ids(photo_ids)
            .requested_by(Some(actor))
            .payload(selection.payload)
            .prompt_override(prompt_override)
            .max_attempts(deps.queue.max_attempts)
            .build(),
        &deps.db_pool,
    )
    .await
    .context("Failed to enqueue generation job")?;

    info!(
        job_id = %job.id,
        requested_by = %actor,
        photo_count = job.photo_ids.len(),
        process_now = selection.process_now,
        "Generation requested"
    );

    if !selection.process_now {
        return Ok(job);
    }

    let token = LockToken::new();
    let claimed = claim_candidates(std::slice::from_ref(&job), token, &deps.db_pool).await?;
    if let Some(claimed) = claimed.first() {
        run_job(deps, claimed, token).await;
    }

    let refreshed = GenerationJob::find_by_id(job.id, &deps.db_pool)
        .await?
        .unwrap_or(job);
    Ok(refreshed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_rejects_empty() {
        assert!(matches!(validate_selection(&[]), Err(SelectionError::Empty)));
    }

    #[test]
    fn test_validate_dedupes_preserving_order() {
        let a = PhotoId::new();
        let b = PhotoId::new();
        let c = PhotoId::new();
        assert_eq!(validate_selection(&[b, a, b, c, a]).unwrap(), vec![b, a, c]);
    }

    #[test]
    fn test_validate_bounds_selection() {
        let ids: Vec<PhotoId> = (0..MAX_SELECTION).map(|_| PhotoId::new()).collect();
        assert_eq!(validate_selection(&ids).unwrap().len(), MAX_SELECTION);

        let mut too_many = ids.clone();
        too_many.push(PhotoId::new());
        assert!(matches!(
            validate_selection(&too_many),
            Err(SelectionError::TooMany { max: 24, count: 25 })
        ));

        // Duplicates don't count toward the limit
        let mut with_dupes = ids.clone();
        with_dupes.push(ids[0]);
        assert!(validate_selection(&with_dupes).is_ok());
    }

    #[test]
    fn test_selection_deserializes_flat_payload() {
        let selection: GenerationSelection = serde_json::from_value(serde_json::json!({
            "target_type": "job_listing",
            "photo_ids": [],
            "title": "Deck",
            "location": "Edina",
            "publish": true,
            "process_now": true
        }))
        .unwrap();

        assert_eq!(selection.target_type, "job_listing");
        assert_eq!(selection.payload.title.as_deref(), Some("Deck"));
        assert_eq!(selection.payload.location.as_deref(), Some("Edina"));
        assert!(selection.payload.publish);
        assert!(selection.process_now);
    }
}
