//! Client for the news scraping service's REST API.

mod client;
mod types;

pub use client::{ApiClient, ApiError};
pub use types::{
    ArticleImage, ArticleRecord, DownloadResponse, GenerateResponse, GeneratedArticle, Keyword,
    ScrapeResponse, ScrapedArticle, TemplateDefaults,
};
