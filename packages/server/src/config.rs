use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;
use std::str::FromStr;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub openai_api_key: String,
    pub openai_model: String,
    pub openai_base_url: Option<String>,
    pub jwt_secret: String,
    pub jwt_issuer: String,
    pub blog_api_key: String,
    pub worker_secret: Option<String>,
    pub site_url: String,
    pub storage_url: Option<String>,
    pub storage_service_key: Option<String>,
    pub storage_bucket: String,
    /// Empty means any origin
    pub allowed_origins: Vec<String>,
    pub job_batch_size: i64,
    pub job_max_attempts: i32,
    pub job_stale_after_minutes: i64,
    pub worker_cron: Option<String>,
    pub http_timeout_secs: u64,
}

/// Read an optional variable, treating blank values as unset
fn optional(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn required(key: &str) -> Result<String> {
    optional(key).with_context(|| format!("{} must be set", key))
}

fn parse_or<T>(key: &str, raw: Option<String>, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match raw {
        Some(value) => value
            .parse()
            .with_context(|| format!("{} must be a valid number", key)),
        None => Ok(default),
    }
}

/// Split a comma separated list, dropping blanks
pub fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        let config = Self {
            database_url: required("DATABASE_URL")?,
            port: parse_or("PORT", optional("PORT"), 8080)?,
            openai_api_key: required("OPENAI_API_KEY")?,
            openai_model: optional("OPENAI_MODEL").unwrap_or_else(|| "gpt-4o".to_string()),
            openai_base_url: optional("OPENAI_BASE_URL"),
            jwt_secret: required("JWT_SECRET")?,
            jwt_issuer: optional("JWT_ISSUER").unwrap_or_else(|| "site-auth".to_string()),
            blog_api_key: required("BLOG_API_KEY")?,
            worker_secret: optional("WORKER_SECRET"),
            site_url: required("SITE_URL")?,
            storage_url: optional("STORAGE_URL"),
            storage_service_key: optional("STORAGE_SERVICE_KEY"),
            storage_bucket: optional("STORAGE_BUCKET")
                .unwrap_or_else(|| "site-images".to_string()),
            allowed_origins: optional("ALLOWED_ORIGINS")
                .map(|v| parse_list(&v))
                .unwrap_or_default(),
            job_batch_size: parse_or("JOB_BATCH_SIZE", optional("JOB_BATCH_SIZE"), 5)?,
            job_max_attempts: parse_or("JOB_MAX_ATTEMPTS", optional("JOB_MAX_ATTEMPTS"), 3)?,
            job_stale_after_minutes: parse_or(
                "JOB_STALE_AFTER_MINUTES",
                optional("JOB_STALE_AFTER_MINUTES"),
                15,
            )?,
            worker_cron: optional("WORKER_CRON"),
            http_timeout_secs: parse_or("HTTP_TIMEOUT_SECS", optional("HTTP_TIMEOUT_SECS"), 90)?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Queue settings that would stall or thrash the worker
    fn validate(&self) -> Result<()> {
        if self.job_batch_size < 1 {
            anyhow::bail!("JOB_BATCH_SIZE must be at least 1");
        }
        if self.job_max_attempts < 1 {
            anyhow::bail!("JOB_MAX_ATTEMPTS must be at least 1");
        }
        // A zero window would release rows that are still being worked on
        if self.job_stale_after_minutes < 1 {
            anyhow::bail!("JOB_STALE_AFTER_MINUTES must be at least 1");
        }
        Ok(())
    }

    /// Storage settings, when both the URL and the service key are present
    pub fn storage(&self) -> Option<(&str, &str)> {
        match (&self.storage_url, &self.storage_service_key) {
            (Some(url), Some(key)) => Some((url.as_str(), key.as_str())),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Config {
        Config {
            database_url: "postgres://localhost/site".into(),
            port: 8080,
            openai_api_key: "sk-test".into(),
            openai_model: "gpt-4o".into(),
            openai_base_url: None,
            jwt_secret: "secret".into(),
            jwt_issuer: "site-auth".into(),
            blog_api_key: "intake".into(),
            worker_secret: None,
            site_url: "https://concrete.example".into(),
            storage_url: None,
            storage_service_key: None,
            storage_bucket: "site-images".into(),
            allowed_origins: vec![],
            job_batch_size: 5,
            job_max_attempts: 3,
            job_stale_after_minutes: 15,
            worker_cron: None,
            http_timeout_secs: 90,
        }
    }

    #[test]
    fn test_defaults_validate() {
        assert!(sample().validate().is_ok());
    }

    #[test]
    fn test_queue_settings_must_be_positive() {
        for stale in [0, -5] {
            let config = Config {
                job_stale_after_minutes: stale,
                ..sample()
            };
            let err = config.validate().unwrap_err();
            assert!(err.to_string().contains("JOB_STALE_AFTER_MINUTES"));
        }

        let config = Config {
            job_batch_size: 0,
            ..sample()
        };
        assert!(config.validate().is_err());

        let config = Config {
            job_max_attempts: 0,
            ..sample()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_parse_list() {
        assert_eq!(
            parse_list(" https://a.test, ,https://b.test "),
            vec!["https://a.test".to_string(), "https://b.test".to_string()]
        );
        assert!(parse_list("").is_empty());
    }

    #[test]
    fn test_parse_or_uses_default_when_unset() {
        assert_eq!(parse_or::<u16>("PORT", None, 8080).unwrap(), 8080);
        assert_eq!(parse_or::<u16>("PORT", Some("3000".into()), 8080).unwrap(), 3000);
    }

    #[test]
    fn test_parse_or_rejects_garbage() {
        let err = parse_or::<i64>("JOB_BATCH_SIZE", Some("lots".into()), 5).unwrap_err();
        assert!(err.to_string().contains("JOB_BATCH_SIZE"));
    }
}
