//! Selection views over imported photos.

mod common;

use crate::common::{create_album, create_photo, create_photos, publish_post_with_photos, TestHarness};
use site_api::domains::photos::{NewPhoto, Photo, PhotoFilter, PhotoView};
use test_context::test_context;

async fn ids_in(ctx: &TestHarness, view: PhotoView, filter: &PhotoFilter) -> Vec<(String, bool)> {
    Photo::list(view, filter, 100, &ctx.db_pool)
        .await
        .unwrap()
        .into_iter()
        .map(|listing| (listing.photo.id.to_string(), listing.posted))
        .collect()
}

#[test_context(TestHarness)]
#[tokio::test]
async fn posted_photos_leave_ready_view_but_stay_in_expanded_view(ctx: &TestHarness) {
    let photos = create_photos(&ctx.db_pool, 3).await.unwrap();
    publish_post_with_photos(&ctx.db_pool, "new-patio", &[photos[1].id])
        .await
        .unwrap();

    let filter = PhotoFilter::default();
    let ready = ids_in(ctx, PhotoView::Ready, &filter).await;
    let all = ids_in(ctx, PhotoView::All, &filter).await;
    let posted = ids_in(ctx, PhotoView::Posted, &filter).await;

    let posted_id = photos[1].id.to_string();
    assert_eq!(ready.len(), 2);
    assert!(ready.iter().all(|(id, flag)| id != &posted_id && !flag));

    assert_eq!(all.len(), 3);
    assert!(all.contains(&(posted_id.clone(), true)));

    assert_eq!(posted, vec![(posted_id, true)]);
}

#[test_context(TestHarness)]
#[tokio::test]
async fn draft_content_does_not_count_as_posted(ctx: &TestHarness) {
    let photos = create_photos(&ctx.db_pool, 1).await.unwrap();
    let mut tx = ctx.db_pool.begin().await.unwrap();
    let post = site_api::domains::content::models::BlogPost::create(
        site_api::domains::content::models::NewBlogPost::builder()
            .title("Draft".to_string())
            .slug("draft".to_string())
            .body("Not yet.".to_string())
            .build(),
        &mut *tx,
    )
    .await
    .unwrap();
    site_api::domains::content::models::BlogPost::link_photos(post.id, &[photos[0].id], &mut *tx)
        .await
        .unwrap();
    tx.commit().await.unwrap();

    let ready = ids_in(ctx, PhotoView::Ready, &PhotoFilter::default()).await;
    assert_eq!(ready, vec![(photos[0].id.to_string(), false)]);
}

#[test_context(TestHarness)]
#[tokio::test]
async fn filters_by_album_and_batch(ctx: &TestHarness) {
    let first_album = create_album(&ctx.db_pool).await.unwrap();
    let second_album = create_album(&ctx.db_pool).await.unwrap();
    create_photo(&ctx.db_pool, first_album, "Retaining wall footing")
        .await
        .unwrap();
    let batched = Photo::create(
        NewPhoto::builder()
            .album_id(second_album)
            .image_url("https://cdn.test/batched.jpg".to_string())
            .source_caption(Some("Sidewalk forms".to_string()))
            .batch_key(Some("2026-05-jones".to_string()))
            .build(),
        &ctx.db_pool,
    )
    .await
    .unwrap();
    create_photo(&ctx.db_pool, second_album, "Sidewalk finished")
        .await
        .unwrap();

    let by_album = ids_in(
        ctx,
        PhotoView::Ready,
        &PhotoFilter {
            album_id: Some(second_album),
            batch_key: None,
        },
    )
    .await;
    assert_eq!(by_album.len(), 2);

    let by_batch = ids_in(
        ctx,
        PhotoView::Ready,
        &PhotoFilter {
            album_id: None,
            batch_key: Some("2026-05-jones".to_string()),
        },
    )
    .await;
    assert_eq!(by_batch, vec![(batched.id.to_string(), false)]);
}

#[test_context(TestHarness)]
#[tokio::test]
async fn caption_edit_trims_and_clears(ctx: &TestHarness) {
    let photos = create_photos(&ctx.db_pool, 1).await.unwrap();

    let updated = Photo::update_caption(photos[0].id, Some("  Broom finish  "), &ctx.db_pool)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.source_caption.as_deref(), Some("Broom finish"));

    let cleared = Photo::update_caption(photos[0].id, Some("   "), &ctx.db_pool)
        .await
        .unwrap()
        .unwrap();
    assert!(cleared.source_caption.is_none());
}

#[test_context(TestHarness)]
#[tokio::test]
async fn find_by_ids_keeps_selection_order(ctx: &TestHarness) {
    let photos = create_photos(&ctx.db_pool, 3).await.unwrap();
    let order = vec![photos[2].id, photos[0].id, photos[1].id];

    let found = Photo::find_by_ids(&order, &ctx.db_pool).await.unwrap();
    let found_ids: Vec<_> = found.iter().map(|p| p.id).collect();
    assert_eq!(found_ids, order);
}
