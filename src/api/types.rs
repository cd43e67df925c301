//! Wire types for the scraping service's JSON API.
//!
//! Response types are lenient: optional fields default, unknown fields are
//! kept (scrape records are sent back verbatim to the generate endpoint), and
//! analytics collections of the wrong shape collapse to empty ones. Only
//! `article.content` is required of a generated article.

use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::borrow::Cow;

fn expose<S: Serializer>(key: &SecretString, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(key.expose_secret())
}

/// Decodes a list, dropping entries that do not fit `T`. A `null` or
/// non-array value yields an empty list.
fn lenient_vec<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let Value::Array(items) = Value::deserialize(deserializer)? else {
        return Ok(Vec::new());
    };
    let total = items.len();
    let kept: Vec<T> = items
        .into_iter()
        .filter_map(|item| serde_json::from_value(item).ok())
        .collect();
    if kept.len() < total {
        tracing::debug!(dropped = total - kept.len(), "Skipped list entries of unexpected shape");
    }
    Ok(kept)
}

/// Decodes an object, treating anything else (`null`, a string, a number)
/// as empty.
fn lenient_map<'de, D>(deserializer: D) -> Result<Map<String, Value>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(Map::new()),
        other => {
            tracing::debug!(value = %other, "Ignoring non-object sentiment analysis");
            Ok(Map::new())
        }
    }
}

/// Treats an explicit `null` like a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// ============================================================================
// Scrape
// ============================================================================

/// One entry of a scrape result: an extracted article or a per-URL failure.
///
/// The service marks failures by the presence of an `error` key, whatever its
/// value. Failures keep the raw object so they go back to the generate
/// endpoint exactly as received.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ArticleRecord {
    Failed(Map<String, Value>),
    Scraped(ScrapedArticle),
}

impl<'de> Deserialize<'de> for ArticleRecord {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let map = Map::<String, Value>::deserialize(deserializer)?;
        if map.contains_key("error") {
            return Ok(ArticleRecord::Failed(map));
        }
        ScrapedArticle::deserialize(Value::Object(map))
            .map(ArticleRecord::Scraped)
            .map_err(serde::de::Error::custom)
    }
}

impl ArticleRecord {
    pub fn as_scraped(&self) -> Option<&ScrapedArticle> {
        match self {
            ArticleRecord::Scraped(article) => Some(article),
            ArticleRecord::Failed(_) => None,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, ArticleRecord::Failed(_))
    }

    /// The reported `error` value of a failed record.
    pub fn error(&self) -> Option<&Value> {
        match self {
            ArticleRecord::Failed(raw) => raw.get("error"),
            ArticleRecord::Scraped(_) => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScrapedArticle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publish_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Serialize)]
pub struct ScrapeRequest<'a> {
    #[serde(serialize_with = "expose")]
    pub api_key: &'a SecretString,
    pub topic: &'a str,
    pub custom_urls: &'a [String],
    pub search_keyword: &'a str,
    pub max_workers: u8,
}

#[derive(Debug, Deserialize)]
pub struct ScrapeResponse {
    pub results: Vec<ArticleRecord>,
    #[serde(default)]
    pub total: Option<u64>,
}

// ============================================================================
// Sources and template defaults
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct SourcesResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    pub urls: Vec<String>,
}

/// Generation parameters a template starts from.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TemplateDefaults {
    #[serde(default, deserialize_with = "null_as_default")]
    pub topic: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub audience: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tone: String,
    #[serde(default)]
    pub max_length: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct TemplateDefaultsResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    pub template: TemplateDefaults,
}

// ============================================================================
// Generate
// ============================================================================

#[derive(Debug, Serialize)]
pub struct GenerateRequest<'a> {
    #[serde(serialize_with = "expose")]
    pub api_key: &'a SecretString,
    pub scraped_data: &'a [ArticleRecord],
    pub template: &'a str,
    pub topic: &'a str,
    pub audience: &'a str,
    pub tone: &'a str,
    pub max_length: u32,
    pub include_images: bool,
}

/// A keyword as the service reports it: bare text, a scored entry, or some
/// other JSON value shown as its JSON text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Keyword {
    Text(String),
    Entry {
        #[serde(alias = "text", alias = "word")]
        keyword: String,
    },
    Other(Value),
}

impl Keyword {
    pub fn label(&self) -> Cow<'_, str> {
        match self {
            Keyword::Text(text) => Cow::Borrowed(text),
            Keyword::Entry { keyword } => Cow::Borrowed(keyword),
            Keyword::Other(value) => Cow::Owned(value.to_string()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArticleImage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedArticle {
    pub content: String,
    #[serde(default, deserialize_with = "lenient_map")]
    pub sentiment_analysis: Map<String, Value>,
    #[serde(default, deserialize_with = "lenient_vec")]
    pub keywords: Vec<Keyword>,
    #[serde(default, deserialize_with = "lenient_vec")]
    pub images: Vec<ArticleImage>,
}

#[derive(Debug, Deserialize)]
pub struct GenerateResponse {
    pub article: GeneratedArticle,
    #[serde(default)]
    pub html_content: Option<String>,
}

// ============================================================================
// Download
// ============================================================================

#[derive(Debug, Serialize)]
pub struct DownloadRequest<'a> {
    pub content: &'a str,
    pub format: &'a str,
    pub template_name: &'a str,
    pub analytics_data: &'a Value,
}

#[derive(Debug, Deserialize)]
pub struct DownloadResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub download_url: Option<String>,
}
