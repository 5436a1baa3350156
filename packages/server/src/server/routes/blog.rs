//! External blog intake endpoint.
//!
//! Accepts either a JSON body or `multipart/form-data` with the same text
//! fields plus an optional `image` file part.

use axum::{
    extract::{Extension, FromRequest, Multipart, Request},
    http::{header::CONTENT_TYPE, StatusCode},
    Json,
};

use crate::domains::content::activities::{
    create_external_post, ExternalPostInput, ImageUpload, MAX_IMAGE_BYTES,
};
use crate::domains::content::BlogPost;
use crate::server::app::AppState;
use crate::server::error::{ApiError, ApiResult};
use crate::server::middleware::{BlogApiKey, ClientIp};

/// POST /api/blog-posts
pub async fn create_blog_post_handler(
    Extension(state): Extension<AppState>,
    _key: BlogApiKey,
    client_ip: Option<Extension<ClientIp>>,
    request: Request,
) -> ApiResult<(StatusCode, Json<BlogPost>)> {
    let is_multipart = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|ct| ct.starts_with("multipart/form-data"))
        .unwrap_or(false);

    let (input, image) = if is_multipart {
        let multipart = Multipart::from_request(request, &())
            .await
            .map_err(|e| ApiError::BadRequest(e.body_text()))?;
        read_multipart(multipart).await?
    } else {
        let Json(input) = Json::<ExternalPostInput>::from_request(request, &())
            .await
            .map_err(|e| ApiError::BadRequest(e.body_text()))?;
        (input, None)
    };

    tracing::info!(
        client_ip = ?client_ip.map(|Extension(ClientIp(ip))| ip),
        has_image = image.is_some(),
        "External blog post received"
    );

    let post = create_external_post(
        input,
        image,
        state.deps.image_store.as_deref(),
        &state.deps.db_pool,
    )
    .await?;

    Ok((StatusCode::CREATED, Json(post)))
}

async fn read_multipart(
    mut multipart: Multipart,
) -> ApiResult<(ExternalPostInput, Option<ImageUpload>)> {
    let mut input = ExternalPostInput::default();
    let mut image = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(e.body_text()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        if name == "image" {
            let file_name = field.file_name().map(String::from);
            let content_type = field.content_type().map(String::from);
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ApiError::BadRequest(e.body_text()))?;
            if bytes.len() > MAX_IMAGE_BYTES {
                return Err(ApiError::PayloadTooLarge(format!(
                    "Image exceeds the {} MiB limit",
                    MAX_IMAGE_BYTES / (1024 * 1024)
                )));
            }
            image = Some(ImageUpload {
                file_name,
                content_type,
                bytes: bytes.to_vec(),
            });
            continue;
        }

        let value = field
            .text()
            .await
            .map_err(|e| ApiError::BadRequest(e.body_text()))?;
        match name.as_str() {
            "title" => input.title = value,
            "body" => input.body = value,
            "excerpt" => input.excerpt = Some(value),
            "slug" => input.slug = Some(value),
            "cover_image_url" => input.cover_image_url = Some(value),
            "status" if !value.trim().is_empty() => {
                input.status = Some(
                    value
                        .parse()
                        .map_err(|e: anyhow::Error| ApiError::BadRequest(e.to_string()))?,
                );
            }
            _ => tracing::debug!(field = %name, "Ignoring unknown form field"),
        }
    }

    Ok((input, image))
}
