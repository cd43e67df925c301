//! Download payloads and writing the service-rendered file to disk.

use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use thiserror::Error;

use super::analytics::{word_count, AnalyticsData};

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Failed to create download directory '{path}': {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to write '{path}': {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// File formats the service can render an article into.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum DownloadFormat {
    #[default]
    Markdown,
    Html,
    Json,
}

impl DownloadFormat {
    pub const ALL: [DownloadFormat; 3] = [
        DownloadFormat::Markdown,
        DownloadFormat::Html,
        DownloadFormat::Json,
    ];

    /// Format code understood by the download endpoint, also the extension.
    pub fn code(self) -> &'static str {
        match self {
            DownloadFormat::Markdown => "md",
            DownloadFormat::Html => "html",
            DownloadFormat::Json => "json",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            DownloadFormat::Markdown => "Markdown",
            DownloadFormat::Html => "HTML",
            DownloadFormat::Json => "JSON",
        }
    }

    pub fn next(self) -> Self {
        match self {
            DownloadFormat::Markdown => DownloadFormat::Html,
            DownloadFormat::Html => DownloadFormat::Json,
            DownloadFormat::Json => DownloadFormat::Markdown,
        }
    }

    pub fn prev(self) -> Self {
        self.next().next()
    }
}

/// Self-contained analytics document sent with JSON downloads.
///
/// Images are reduced to `url`, `title` and `source`; URL-less images are
/// left out because the gallery never shows them either.
pub fn analytics_document(
    template: &str,
    content: &str,
    analytics: &AnalyticsData,
    date: DateTime<Utc>,
) -> Value {
    let images: Vec<Value> = analytics
        .images
        .iter()
        .filter_map(|image| {
            let url = image.url.as_deref().filter(|u| !u.is_empty())?;
            Some(json!({
                "url": url,
                "title": image.title.as_deref().unwrap_or(""),
                "source": image.source.as_deref().unwrap_or(""),
            }))
        })
        .collect();

    json!({
        "article_info": {
            "title": template,
            "date": date.to_rfc3339(),
            "word_count": word_count(content),
        },
        "sentiment": analytics.sentiment,
        "keywords": analytics.keywords,
        "images": images,
    })
}

/// Reduces a service-supplied filename to a bare file name.
///
/// Anything that would escape the download directory, or is empty, falls
/// back to `article.<ext>`.
pub fn safe_file_name(suggested: Option<&str>, format: DownloadFormat) -> String {
    suggested
        .map(|name| name.rsplit(['/', '\\']).next().unwrap_or(""))
        .map(str::trim)
        .filter(|name| !name.is_empty() && *name != "." && *name != "..")
        .map(str::to_owned)
        .unwrap_or_else(|| format!("article.{}", format.code()))
}

/// Writes `content` to `dir/file_name` via a temporary file and rename, so a
/// reader never sees a half-written download.
pub fn write_download(dir: &Path, file_name: &str, content: &str) -> Result<PathBuf, ExportError> {
    std::fs::create_dir_all(dir).map_err(|source| ExportError::CreateDir {
        path: dir.to_path_buf(),
        source,
    })?;

    let target = dir.join(file_name);
    let nanos = Utc::now().timestamp_nanos_opt().unwrap_or_default();
    let temp = dir.join(format!(".{file_name}.tmp.{nanos:016x}"));

    let write_err = |source| ExportError::Write {
        path: target.clone(),
        source,
    };

    let result = std::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&temp)
        .and_then(|mut file| {
            file.write_all(content.as_bytes())?;
            file.sync_all()
        })
        .and_then(|()| std::fs::rename(&temp, &target));

    if let Err(e) = result {
        let _ = std::fs::remove_file(&temp);
        return Err(write_err(e));
    }

    tracing::info!(path = %target.display(), bytes = content.len(), "Download written");
    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::GeneratedArticle;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_analytics_document_shape() {
        let article: GeneratedArticle = serde_json::from_value(json!({
            "content": "one two three",
            "sentiment_analysis": {"polarity": 0.2},
            "keywords": ["5G", "fiber"],
            "images": [
                {"url": "https://a/x.png", "title": "X", "alt": "ignored"},
                {"title": "no url"}
            ]
        }))
        .unwrap();
        let analytics = AnalyticsData::from_article(&article);
        let date = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();

        let doc = analytics_document("tech_trends", &article.content, &analytics, date);
        assert_eq!(
            doc,
            json!({
                "article_info": {
                    "title": "tech_trends",
                    "date": "2024-05-01T12:00:00+00:00",
                    "word_count": 3
                },
                "sentiment": {"polarity": 0.2},
                "keywords": ["5G", "fiber"],
                "images": [{"url": "https://a/x.png", "title": "X", "source": ""}]
            })
        );
    }

    #[test]
    fn test_safe_file_name() {
        let md = DownloadFormat::Markdown;
        assert_eq!(safe_file_name(Some("a.md"), md), "a.md");
        assert_eq!(safe_file_name(Some("../../etc/passwd"), md), "passwd");
        assert_eq!(safe_file_name(Some("dir\\evil.html"), md), "evil.html");
        assert_eq!(safe_file_name(Some(".."), md), "article.md");
        assert_eq!(safe_file_name(Some(""), DownloadFormat::Json), "article.json");
        assert_eq!(safe_file_name(None, DownloadFormat::Html), "article.html");
    }

    #[test]
    fn test_write_download_creates_file() {
        let dir = std::env::temp_dir().join("newsdesk_export_test_write");
        let _ = std::fs::remove_dir_all(&dir);

        let path = write_download(&dir, "article.md", "# Hello").unwrap();
        assert_eq!(path, dir.join("article.md"));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "# Hello");

        // Overwrites in place and leaves no temp files behind.
        write_download(&dir, "article.md", "# Again").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "# Again");
        let entries = std::fs::read_dir(&dir).unwrap().count();
        assert_eq!(entries, 1);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_format_cycle() {
        assert_eq!(DownloadFormat::Markdown.next(), DownloadFormat::Html);
        assert_eq!(DownloadFormat::Json.next(), DownloadFormat::Markdown);
        assert_eq!(DownloadFormat::Markdown.prev(), DownloadFormat::Json);
        assert_eq!(DownloadFormat::Html.code(), "html");
    }
}
