use serde::{Deserialize, Serialize};

/// Publication state shared by blog posts and job listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, Default)]
#[sqlx(type_name = "content_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ContentStatus {
    #[default]
    Draft,
    Published,
}

impl std::str::FromStr for ContentStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "draft" => Ok(ContentStatus::Draft),
            "published" => Ok(ContentStatus::Published),
            other => Err(anyhow::anyhow!("Invalid status: {}", other)),
        }
    }
}

/// Where a blog post came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, Default)]
#[sqlx(type_name = "blog_post_source", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum BlogPostSource {
    /// Written by the generation queue from job photos
    #[default]
    Generated,
    /// Posted through the intake API
    External,
}

/// Slug and last-modified time of a published page
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PublishedPage {
    pub slug: String,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}
