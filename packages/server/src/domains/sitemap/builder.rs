//! XML sitemap assembly.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use sqlx::PgPool;

use super::static_routes::STATIC_ROUTES;
use crate::domains::content::models::{BlogPost, JobListing, PublishedPage};

const SITEMAP_NS: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";

/// One `<url>` element, path relative to the site root
#[derive(Debug, Clone, PartialEq)]
pub struct SitemapEntry {
    pub path: String,
    pub lastmod: Option<DateTime<Utc>>,
    pub changefreq: Option<&'static str>,
    pub priority: Option<f32>,
}

impl SitemapEntry {
    pub fn blog_post(page: &PublishedPage) -> Self {
        Self {
            path: format!("/blog/{}", page.slug),
            lastmod: Some(page.updated_at),
            changefreq: Some("monthly"),
            priority: Some(0.6),
        }
    }

    pub fn job_listing(page: &PublishedPage) -> Self {
        Self {
            path: format!("/gallery/{}", page.slug),
            lastmod: Some(page.updated_at),
            changefreq: Some("yearly"),
            priority: Some(0.5),
        }
    }
}

fn absolute_url(site_url: &str, path: &str) -> String {
    format!(
        "{}/{}",
        site_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

fn write_text_element<W: std::io::Write>(
    writer: &mut Writer<W>,
    name: &str,
    text: &str,
) -> Result<()> {
    writer.write_event(Event::Start(BytesStart::new(name)))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

/// Render the sitemap: every static route, then `entries` in order.
pub fn build_sitemap(site_url: &str, entries: &[SitemapEntry]) -> Result<String> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);

    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    writer.write_event(Event::Start(
        BytesStart::new("urlset").with_attributes([("xmlns", SITEMAP_NS)]),
    ))?;

    let static_entries = STATIC_ROUTES.iter().map(|r| SitemapEntry {
        path: r.path.to_string(),
        lastmod: None,
        changefreq: Some(r.changefreq),
        priority: Some(r.priority),
    });

    for entry in static_entries.chain(entries.iter().cloned()) {
        writer.write_event(Event::Start(BytesStart::new("url")))?;
        write_text_element(&mut writer, "loc", &absolute_url(site_url, &entry.path))?;
        if let Some(lastmod) = entry.lastmod {
            write_text_element(&mut writer, "lastmod", &lastmod.format("%Y-%m-%d").to_string())?;
        }
        if let Some(changefreq) = entry.changefreq {
            write_text_element(&mut writer, "changefreq", changefreq)?;
        }
        if let Some(priority) = entry.priority {
            write_text_element(&mut writer, "priority", &format!("{:.1}", priority))?;
        }
        writer.write_event(Event::End(BytesEnd::new("url")))?;
    }

    writer.write_event(Event::End(BytesEnd::new("urlset")))?;

    String::from_utf8(writer.into_inner()).context("Sitemap is not valid UTF-8")
}

/// Load published content and render the full sitemap.
pub async fn load_sitemap(site_url: &str, pool: &PgPool) -> Result<String> {
    let posts = BlogPost::list_published(pool)
        .await
        .context("Failed to load published posts")?;
    let listings = JobListing::list_published(pool)
        .await
        .context("Failed to load published listings")?;

    let entries: Vec<SitemapEntry> = posts
        .iter()
        .map(SitemapEntry::blog_post)
        .chain(listings.iter().map(SitemapEntry::job_listing))
        .collect();

    tracing::debug!(
        posts = posts.len(),
        listings = listings.len(),
        "Building sitemap"
    );
    build_sitemap(site_url, &entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_static_routes_always_present() {
        let xml = build_sitemap("https://example.com", &[]).unwrap();

        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(xml.contains("<urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">"));
        assert!(xml.contains("<loc>https://example.com/</loc>"));
        assert!(xml.contains("<loc>https://example.com/services/stamped-concrete</loc>"));
        assert!(xml.contains("<loc>https://example.com/pricing</loc>"));
        assert!(xml.contains("<loc>https://example.com/contact</loc>"));
        assert_eq!(xml.matches("<url>").count(), STATIC_ROUTES.len());
    }

    #[test]
    fn test_dynamic_entries_with_lastmod() {
        let updated_at = Utc.with_ymd_and_hms(2026, 3, 14, 9, 30, 0).unwrap();
        let entries = vec![
            SitemapEntry::blog_post(&PublishedPage {
                slug: "driveway-replacement".into(),
                updated_at,
            }),
            SitemapEntry::job_listing(&PublishedPage {
                slug: "stamped-patio".into(),
                updated_at,
            }),
        ];

        let xml = build_sitemap("https://example.com/", &entries).unwrap();

        assert!(xml.contains("<loc>https://example.com/blog/driveway-replacement</loc>"));
        assert!(xml.contains("<loc>https://example.com/gallery/stamped-patio</loc>"));
        assert!(xml.contains("<lastmod>2026-03-14</lastmod>"));
        assert_eq!(xml.matches("<url>").count(), STATIC_ROUTES.len() + 2);
    }

    #[test]
    fn test_escapes_text() {
        let entries = vec![SitemapEntry {
            path: "/blog/a&b".into(),
            lastmod: None,
            changefreq: None,
            priority: None,
        }];
        let xml = build_sitemap("https://example.com", &entries).unwrap();
        assert!(xml.contains("<loc>https://example.com/blog/a&amp;b</loc>"));
    }
}
