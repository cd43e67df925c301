use chrono::{DateTime, Utc};
use secrecy::SecretString;

use super::analytics::AnalyticsData;
use super::urls::UrlSet;
use crate::api::{ArticleRecord, GeneratedArticle};

/// The most recent generation result.
#[derive(Debug, Clone, PartialEq)]
pub struct CurrentArticle {
    pub article: GeneratedArticle,
    /// Server-rendered HTML, when the service sent one.
    pub html_content: Option<String>,
    /// Template the article was generated with.
    pub template: String,
    pub generated_at: DateTime<Utc>,
}

/// Everything the client knows about the current working session.
///
/// Mutated only by the flow `apply_*` methods and direct URL edits.
/// `analytics` always mirrors `current_article` in full.
#[derive(Default)]
pub struct Session {
    pub api_key: Option<SecretString>,
    pub urls: UrlSet,
    pub scraped_data: Vec<ArticleRecord>,
    pub current_article: Option<CurrentArticle>,
    pub analytics: AnalyticsData,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("urls", &self.urls)
            .field("scraped_data", &self.scraped_data.len())
            .field("current_article", &self.current_article.is_some())
            .finish()
    }
}

impl Session {
    pub fn new(api_key: Option<SecretString>) -> Self {
        Self {
            api_key,
            ..Self::default()
        }
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    pub fn set_api_key(&mut self, key: SecretString) {
        self.api_key = Some(key);
    }

    /// Records that were scraped successfully, skipping per-URL failures.
    pub fn scraped_articles(&self) -> impl Iterator<Item = &crate::api::ScrapedArticle> {
        self.scraped_data.iter().filter_map(ArticleRecord::as_scraped)
    }

    pub fn scraped_count(&self) -> usize {
        self.scraped_articles().count()
    }

    /// Generated markdown, if an article with content exists.
    pub fn article_content(&self) -> Option<&str> {
        self.current_article
            .as_ref()
            .map(|current| current.article.content.as_str())
            .filter(|content| !content.is_empty())
    }
}
