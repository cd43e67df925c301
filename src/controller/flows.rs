//! The request/response flows against the service.
//!
//! Each flow is split in two. `Session::prepare_*` checks preconditions and
//! snapshots everything the request needs into an owned job, without any
//! I/O. The job runs on a background task. `Session::apply_*` folds a
//! successful response back into the session. A failed flow never reaches
//! `apply_*`, so prior state stays as it was.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use secrecy::SecretString;
use serde_json::{json, Value};
use thiserror::Error;

use super::analytics::AnalyticsData;
use super::export::{analytics_document, safe_file_name, write_download, DownloadFormat, ExportError};
use super::session::{CurrentArticle, Session};
use crate::api::{ApiClient, ApiError, ArticleRecord, GenerateResponse, ScrapeResponse, TemplateDefaults};

pub const MIN_WORKERS: u8 = 1;
pub const MAX_WORKERS: u8 = 10;
pub const DEFAULT_WORKERS: u8 = 5;

pub const MIN_ARTICLE_LENGTH: u32 = 100;
pub const MAX_ARTICLE_LENGTH: u32 = 5000;
pub const DEFAULT_ARTICLE_LENGTH: u32 = 800;

/// One kind of request cycle. At most one of each runs at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Flow {
    Sources,
    Scrape,
    TemplateDefaults,
    Generate,
    Download,
}

impl Flow {
    /// Busy indicator text while the flow is in flight.
    pub fn busy_message(self) -> &'static str {
        match self {
            Flow::Sources => "Loading sources...",
            Flow::Scrape => "Scraping news sources...",
            Flow::TemplateDefaults => "Loading template...",
            Flow::Generate => "Generating article...",
            Flow::Download => "Preparing download...",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Flow::Sources => "Sources",
            Flow::Scrape => "Scraping",
            Flow::TemplateDefaults => "Template",
            Flow::Generate => "Generation",
            Flow::Download => "Download",
        }
    }
}

#[derive(Debug, Error)]
pub enum FlowError {
    #[error("API key required. Press K to enter one.")]
    MissingApiKey,
    #[error("No articles scraped. Please scrape articles first.")]
    NoScrapedData,
    #[error("No article to download. Please generate an article first.")]
    NoArticle,
    #[error("{0}")]
    Api(#[from] ApiError),
    #[error("{0}")]
    Export(#[from] ExportError),
}

impl FlowError {
    /// True for failures detected before any request was sent.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            FlowError::MissingApiKey | FlowError::NoScrapedData | FlowError::NoArticle
        )
    }
}

// ============================================================================
// Forms
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrapeForm {
    pub topic: String,
    pub search_keyword: String,
    pub max_workers: u8,
}

impl Default for ScrapeForm {
    fn default() -> Self {
        Self {
            topic: "all".to_owned(),
            search_keyword: String::new(),
            max_workers: DEFAULT_WORKERS,
        }
    }
}

impl ScrapeForm {
    pub fn set_workers(&mut self, workers: u8) {
        self.max_workers = workers.clamp(MIN_WORKERS, MAX_WORKERS);
    }
}

/// Generation parameters. Blank overrides mean "use the template default"
/// on the service side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateForm {
    pub template: String,
    pub topic: String,
    pub audience: String,
    pub tone: String,
    pub max_length: u32,
    pub include_images: bool,
}

impl Default for GenerateForm {
    fn default() -> Self {
        Self {
            template: "telecom_news".to_owned(),
            topic: String::new(),
            audience: String::new(),
            tone: String::new(),
            max_length: DEFAULT_ARTICLE_LENGTH,
            include_images: true,
        }
    }
}

impl GenerateForm {
    pub fn set_max_length(&mut self, length: u32) {
        self.max_length = length.clamp(MIN_ARTICLE_LENGTH, MAX_ARTICLE_LENGTH);
    }

    /// Fills the override fields from a template's defaults. A missing or
    /// zero length keeps the current value.
    pub fn apply_defaults(&mut self, defaults: &TemplateDefaults) {
        self.topic = defaults.topic.clone();
        self.audience = defaults.audience.clone();
        self.tone = defaults.tone.clone();
        if let Some(length) = defaults.max_length.filter(|&l| l > 0) {
            self.set_max_length(length);
        }
    }
}

// ============================================================================
// Jobs
// ============================================================================

/// Owned snapshot of a scrape request.
#[derive(Debug)]
pub struct ScrapeJob {
    api_key: SecretString,
    form: ScrapeForm,
    custom_urls: Vec<String>,
}

impl ScrapeJob {
    pub async fn run(self, api: &ApiClient) -> Result<ScrapeResponse, FlowError> {
        let response = api
            .scrape(
                &self.api_key,
                &self.form.topic,
                &self.custom_urls,
                self.form.search_keyword.trim(),
                self.form.max_workers,
            )
            .await?;
        Ok(response)
    }
}

#[derive(Debug)]
pub struct GenerateJob {
    api_key: SecretString,
    scraped_data: Vec<ArticleRecord>,
    form: GenerateForm,
}

impl GenerateJob {
    pub fn template(&self) -> &str {
        &self.form.template
    }

    pub async fn run(self, api: &ApiClient) -> Result<GenerateResponse, FlowError> {
        let form = &self.form;
        let response = api
            .generate(
                &self.api_key,
                &self.scraped_data,
                &form.template,
                form.topic.trim(),
                form.audience.trim(),
                form.tone.trim(),
                form.max_length,
                form.include_images,
            )
            .await?;
        Ok(response)
    }
}

#[derive(Debug)]
pub struct DownloadJob {
    content: String,
    format: DownloadFormat,
    template: String,
    analytics_data: Value,
}

impl DownloadJob {
    pub fn format(&self) -> DownloadFormat {
        self.format
    }

    pub fn analytics_data(&self) -> &Value {
        &self.analytics_data
    }

    /// Has the service render the file, then stores it under `dir`.
    pub async fn run(self, api: &ApiClient, dir: &Path) -> Result<PathBuf, FlowError> {
        let response = api
            .download(
                &self.content,
                self.format.code(),
                &self.template,
                &self.analytics_data,
            )
            .await?;

        let content = match response.content {
            Some(content) if response.success && !content.is_empty() => content,
            _ => {
                return Err(ApiError::Malformed("download response without content".into()).into())
            }
        };
        if let Some(url) = &response.download_url {
            tracing::debug!(download_url = %url, "Service prepared download");
        }

        let file_name = safe_file_name(response.filename.as_deref(), self.format);
        let dir = dir.to_path_buf();
        let path = tokio::task::spawn_blocking(move || write_download(&dir, &file_name, &content))
            .await
            .map_err(|e| {
                ExportError::Write {
                    path: PathBuf::new(),
                    source: std::io::Error::other(e),
                }
            })??;
        Ok(path)
    }
}

// ============================================================================
// Session transitions
// ============================================================================

impl Session {
    pub fn prepare_scrape(&self, form: &ScrapeForm) -> Result<ScrapeJob, FlowError> {
        let api_key = self.api_key.clone().ok_or(FlowError::MissingApiKey)?;
        Ok(ScrapeJob {
            api_key,
            form: form.clone(),
            custom_urls: self.urls.as_slice().to_vec(),
        })
    }

    /// Replaces the scrape results and returns how many records are usable
    /// articles. Error records are kept (the service expects the list back
    /// as-is) but never counted.
    pub fn apply_scrape(&mut self, response: ScrapeResponse) -> usize {
        self.scraped_data = response.results;
        let count = self.scraped_count();
        if let Some(total) = response.total {
            if total != count as u64 {
                tracing::debug!(server_total = total, counted = count, "Scrape totals differ");
            }
        }
        tracing::info!(
            records = self.scraped_data.len(),
            articles = count,
            "Scrape results applied"
        );
        count
    }

    pub fn apply_sources(&mut self, urls: Vec<String>) {
        self.urls.replace(urls);
    }

    /// Checks, in order, for an API key and for scraped data.
    pub fn prepare_generate(&self, form: &GenerateForm) -> Result<GenerateJob, FlowError> {
        let api_key = self.api_key.clone().ok_or(FlowError::MissingApiKey)?;
        if self.scraped_data.is_empty() {
            return Err(FlowError::NoScrapedData);
        }
        Ok(GenerateJob {
            api_key,
            scraped_data: self.scraped_data.clone(),
            form: form.clone(),
        })
    }

    /// Installs a new article and rebuilds analytics from it.
    pub fn apply_generate(
        &mut self,
        template: String,
        response: GenerateResponse,
        generated_at: DateTime<Utc>,
    ) {
        self.analytics = AnalyticsData::from_article(&response.article);
        self.current_article = Some(CurrentArticle {
            article: response.article,
            html_content: response.html_content.filter(|html| !html.is_empty()),
            template,
            generated_at,
        });
    }

    pub fn prepare_download(
        &self,
        format: DownloadFormat,
        date: DateTime<Utc>,
    ) -> Result<DownloadJob, FlowError> {
        let current = self.current_article.as_ref().ok_or(FlowError::NoArticle)?;
        let content = self.article_content().ok_or(FlowError::NoArticle)?;

        let analytics_data = match format {
            DownloadFormat::Json => {
                analytics_document(&current.template, content, &self.analytics, date)
            }
            DownloadFormat::Markdown | DownloadFormat::Html => json!({}),
        };

        Ok(DownloadJob {
            content: content.to_owned(),
            format,
            template: current.template.clone(),
            analytics_data,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::GeneratedArticle;
    use pretty_assertions::assert_eq;

    fn keyed() -> Session {
        Session::new(Some(SecretString::from("k")))
    }

    fn scrape_response(value: Value) -> ScrapeResponse {
        serde_json::from_value(value).unwrap()
    }

    fn generate_response(value: Value) -> GenerateResponse {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_scrape_requires_api_key() {
        let session = Session::new(None);
        let err = session.prepare_scrape(&ScrapeForm::default()).unwrap_err();
        assert!(matches!(err, FlowError::MissingApiKey));
        assert!(err.is_precondition());
    }

    #[test]
    fn test_scrape_job_snapshots_urls() {
        let mut session = keyed();
        session.urls.add("http://a");
        let job = session.prepare_scrape(&ScrapeForm::default()).unwrap();
        session.urls.add("http://b");
        assert_eq!(job.custom_urls, vec!["http://a"]);
    }

    #[test]
    fn test_apply_scrape_counts_non_error_records() {
        let mut session = keyed();
        let count = session.apply_scrape(scrape_response(json!({
            "success": true,
            "total": 2,
            "results": [
                {"url": "https://a", "title": "A"},
                {"url": "https://x", "error": "timeout"},
                {"url": "https://b", "title": "B"}
            ]
        })));
        assert_eq!(count, 2);
        assert_eq!(session.scraped_data.len(), 3);
        let titles: Vec<_> = session
            .scraped_articles()
            .filter_map(|a| a.title.as_deref())
            .collect();
        assert_eq!(titles, vec!["A", "B"]);
    }

    #[test]
    fn test_generate_preconditions_in_order() {
        let no_key = Session::new(None);
        assert!(matches!(
            no_key.prepare_generate(&GenerateForm::default()),
            Err(FlowError::MissingApiKey)
        ));

        let no_data = keyed();
        assert!(matches!(
            no_data.prepare_generate(&GenerateForm::default()),
            Err(FlowError::NoScrapedData)
        ));
    }

    #[test]
    fn test_apply_generate_rebuilds_analytics() {
        let mut session = keyed();
        session.apply_generate(
            "tech_trends".into(),
            generate_response(json!({
                "article": {"content": "first", "keywords": ["a", "b"]},
                "html_content": "<p>first</p>"
            })),
            Utc::now(),
        );
        assert_eq!(session.analytics.keywords.len(), 2);

        session.apply_generate(
            "tech_trends".into(),
            generate_response(json!({"article": {"content": "second"}})),
            Utc::now(),
        );
        let current = session.current_article.as_ref().unwrap();
        assert_eq!(current.article.content, "second");
        assert_eq!(current.html_content, None);
        assert!(session.analytics.keywords.is_empty());
    }

    #[test]
    fn test_download_requires_article_content() {
        let mut session = keyed();
        assert!(matches!(
            session.prepare_download(DownloadFormat::Markdown, Utc::now()),
            Err(FlowError::NoArticle)
        ));

        session.current_article = Some(CurrentArticle {
            article: GeneratedArticle {
                content: String::new(),
                sentiment_analysis: Default::default(),
                keywords: vec![],
                images: vec![],
            },
            html_content: None,
            template: "t".into(),
            generated_at: Utc::now(),
        });
        assert!(matches!(
            session.prepare_download(DownloadFormat::Json, Utc::now()),
            Err(FlowError::NoArticle)
        ));
    }

    #[test]
    fn test_download_payload_by_format() {
        let mut session = keyed();
        session.apply_generate(
            "customer_focus".into(),
            generate_response(json!({"article": {"content": "a b c"}})),
            Utc::now(),
        );

        let md = session
            .prepare_download(DownloadFormat::Markdown, Utc::now())
            .unwrap();
        assert_eq!(md.analytics_data(), &json!({}));

        let js = session
            .prepare_download(DownloadFormat::Json, Utc::now())
            .unwrap();
        assert_eq!(js.analytics_data()["article_info"]["word_count"], json!(3));
        assert_eq!(js.analytics_data()["article_info"]["title"], json!("customer_focus"));
    }

    #[test]
    fn test_form_bounds() {
        let mut scrape = ScrapeForm::default();
        scrape.set_workers(0);
        assert_eq!(scrape.max_workers, MIN_WORKERS);
        scrape.set_workers(99);
        assert_eq!(scrape.max_workers, MAX_WORKERS);

        let mut generate = GenerateForm::default();
        generate.set_max_length(10);
        assert_eq!(generate.max_length, MIN_ARTICLE_LENGTH);
        generate.set_max_length(10_000);
        assert_eq!(generate.max_length, MAX_ARTICLE_LENGTH);
    }

    #[test]
    fn test_apply_template_defaults() {
        let mut form = GenerateForm {
            topic: "old".into(),
            max_length: 900,
            ..GenerateForm::default()
        };
        form.apply_defaults(&TemplateDefaults {
            topic: "Digital inclusion".into(),
            audience: "general public".into(),
            tone: String::new(),
            max_length: None,
        });
        assert_eq!(form.topic, "Digital inclusion");
        assert_eq!(form.tone, "");
        assert_eq!(form.max_length, 900);

        form.apply_defaults(&TemplateDefaults {
            max_length: Some(600),
            ..TemplateDefaults::default()
        });
        assert_eq!(form.max_length, 600);
    }
}
