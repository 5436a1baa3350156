use axum::{
    extract::Extension,
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
};

use crate::domains::sitemap::load_sitemap;
use crate::server::app::AppState;
use crate::server::error::ApiResult;

/// GET /sitemap.xml
pub async fn sitemap_handler(Extension(state): Extension<AppState>) -> ApiResult<Response> {
    let xml = load_sitemap(&state.site_url, &state.deps.db_pool).await?;

    Ok((
        [
            (
                header::CONTENT_TYPE,
                HeaderValue::from_static("application/xml; charset=utf-8"),
            ),
            (
                header::CACHE_CONTROL,
                HeaderValue::from_static("public, max-age=3600"),
            ),
        ],
        xml,
    )
        .into_response())
}
