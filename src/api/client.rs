use std::time::Duration;

use futures::StreamExt;
use secrecy::SecretString;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use url::Url;

use super::types::{
    ArticleRecord, DownloadRequest, DownloadResponse, GenerateRequest, GenerateResponse,
    ScrapeRequest, ScrapeResponse, SourcesResponse, TemplateDefaults, TemplateDefaultsResponse,
};
use crate::util::{validate_base_url, UrlValidationError};

/// Generated articles are large but bounded; anything past this is refused.
const MAX_RESPONSE_SIZE: usize = 20 * 1024 * 1024;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    /// The service answered with an `{error}` payload or `success: false`.
    #[error("{message}")]
    Server { status: u16, message: String },
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    /// The body parsed but lacks fields the client relies on. The detail goes
    /// to the log, the user sees the fixed message.
    #[error("Invalid response from server")]
    Malformed(String),
    #[error("Response too large (exceeds {0} bytes)")]
    ResponseTooLarge(usize),
    #[error("Invalid UTF-8 in response")]
    InvalidUtf8,
    #[error("Invalid service URL: {0}")]
    InvalidBaseUrl(#[from] UrlValidationError),
}

/// HTTP client for the scraping service.
///
/// Cloning is cheap; every background task gets its own handle.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url.as_str())
            .finish()
    }
}

impl ApiClient {
    /// Builds a client for the service at `base_url`.
    ///
    /// Only a connect timeout is set. Generation can run for minutes on the
    /// server side, so an overall deadline would abort legitimate requests.
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        let base_url = validate_base_url(base_url)?;
        let http = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .user_agent(concat!("newsdesk/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        self.base_url
            .join(path)
            .map_err(|e| ApiError::InvalidBaseUrl(UrlValidationError::InvalidUrl(e)))
    }

    /// `GET api/get_sources`: the configured source URLs for a topic.
    pub async fn sources_for_topic(&self, topic: &str) -> Result<Vec<String>, ApiError> {
        let mut url = self.endpoint("api/get_sources")?;
        url.query_pairs_mut().append_pair("topic", topic);
        tracing::debug!(topic, "Requesting sources for topic");

        let response: SourcesResponse = self.get(url).await?;
        Ok(response.urls)
    }

    /// `GET api/template_defaults`: the parameters a template starts from.
    pub async fn template_defaults(&self, template: &str) -> Result<TemplateDefaults, ApiError> {
        let mut url = self.endpoint("api/template_defaults")?;
        url.query_pairs_mut().append_pair("template", template);
        tracing::debug!(template, "Requesting template defaults");

        let response: TemplateDefaultsResponse = self.get(url).await?;
        Ok(response.template)
    }

    /// `POST api/scrape`.
    pub async fn scrape(
        &self,
        api_key: &SecretString,
        topic: &str,
        custom_urls: &[String],
        search_keyword: &str,
        max_workers: u8,
    ) -> Result<ScrapeResponse, ApiError> {
        let url = self.endpoint("api/scrape")?;
        tracing::info!(
            topic,
            urls = custom_urls.len(),
            keyword = search_keyword,
            workers = max_workers,
            "Starting scrape"
        );
        let request = ScrapeRequest {
            api_key,
            topic,
            custom_urls,
            search_keyword,
            max_workers,
        };
        self.post(url, &request).await
    }

    /// `POST api/generate`.
    #[allow(clippy::too_many_arguments)]
    pub async fn generate(
        &self,
        api_key: &SecretString,
        scraped_data: &[ArticleRecord],
        template: &str,
        topic: &str,
        audience: &str,
        tone: &str,
        max_length: u32,
        include_images: bool,
    ) -> Result<GenerateResponse, ApiError> {
        let url = self.endpoint("api/generate")?;
        tracing::info!(
            template,
            records = scraped_data.len(),
            max_length,
            include_images,
            "Requesting article generation"
        );
        let request = GenerateRequest {
            api_key,
            scraped_data,
            template,
            topic,
            audience,
            tone,
            max_length,
            include_images,
        };
        self.post(url, &request).await
    }

    /// `POST api/download`: asks the service to render the article as a file.
    pub async fn download(
        &self,
        content: &str,
        format: &str,
        template_name: &str,
        analytics_data: &Value,
    ) -> Result<DownloadResponse, ApiError> {
        let url = self.endpoint("api/download")?;
        tracing::info!(format, template = template_name, "Preparing download");
        let request = DownloadRequest {
            content,
            format,
            template_name,
            analytics_data,
        };
        self.post(url, &request).await
    }

    async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T, ApiError> {
        let response = self.http.get(url).send().await?;
        decode(response).await
    }

    async fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        url: Url,
        body: &B,
    ) -> Result<T, ApiError> {
        let response = self.http.post(url).json(body).send().await?;
        decode(response).await
    }
}

/// Turns a service response into `T` or the matching [`ApiError`].
///
/// Error payloads are recognised on any status: the service reports some
/// failures as `{error}` with 4xx/5xx and others as `success: false`.
async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
    let status = response.status();
    let endpoint = response.url().path().to_owned();
    let body = read_limited_text(response, MAX_RESPONSE_SIZE).await?;

    let value: Option<Value> = serde_json::from_str(&body).ok();
    if let Some(message) = value.as_ref().and_then(server_error_message) {
        tracing::warn!(endpoint = %endpoint, status = status.as_u16(), error = %message, "Service reported an error");
        return Err(ApiError::Server {
            status: status.as_u16(),
            message,
        });
    }

    if !status.is_success() {
        tracing::warn!(endpoint = %endpoint, status = status.as_u16(), "Service returned an error status");
        return Err(ApiError::HttpStatus(status.as_u16()));
    }

    let value = value.ok_or_else(|| {
        tracing::warn!(endpoint = %endpoint, "Response body is not JSON");
        ApiError::Malformed("response body is not JSON".into())
    })?;

    serde_json::from_value(value).map_err(|e| {
        tracing::warn!(endpoint = %endpoint, error = %e, "Response did not match the expected shape");
        ApiError::Malformed(e.to_string())
    })
}

fn server_error_message(value: &Value) -> Option<String> {
    if let Some(message) = value.get("error").and_then(Value::as_str) {
        return Some(message.to_owned());
    }
    if value.get("success") == Some(&Value::Bool(false)) {
        let message = value
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("Request failed");
        return Some(message.to_owned());
    }
    None
}

async fn read_limited_text(response: reqwest::Response, limit: usize) -> Result<String, ApiError> {
    if response.content_length().is_some_and(|len| len as usize > limit) {
        return Err(ApiError::ResponseTooLarge(limit));
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(ApiError::ResponseTooLarge(limit));
        }
        bytes.extend_from_slice(&chunk);
    }

    String::from_utf8(bytes).map_err(|_| ApiError::InvalidUtf8)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn client_for(server: &MockServer) -> ApiClient {
        ApiClient::new(&server.uri()).unwrap()
    }

    #[tokio::test]
    async fn test_sources_for_topic() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/get_sources"))
            .and(query_param("topic", "telecom"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "urls": ["https://a.tn", "https://b.tn"]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let urls = client_for(&server)
            .await
            .sources_for_topic("telecom")
            .await
            .unwrap();
        assert_eq!(urls, vec!["https://a.tn", "https://b.tn"]);
    }

    #[tokio::test]
    async fn test_server_error_message_surfaced() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/scrape"))
            .respond_with(
                ResponseTemplate::new(400).set_body_json(json!({"error": "API key is required"})),
            )
            .mount(&server)
            .await;

        let key = SecretString::from("k");
        let err = client_for(&server)
            .await
            .scrape(&key, "all", &[], "", 5)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Server { status: 400, .. }));
        assert_eq!(err.to_string(), "API key is required");
    }

    #[tokio::test]
    async fn test_success_false_is_server_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/get_sources"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": false})))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .await
            .sources_for_topic("all")
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Server { status: 200, .. }));
    }

    #[tokio::test]
    async fn test_status_without_error_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .await
            .template_defaults("tech_trends")
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::HttpStatus(502)));
    }

    #[tokio::test]
    async fn test_generate_without_content_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "article": {"keywords": ["a"]}
            })))
            .mount(&server)
            .await;

        let key = SecretString::from("k");
        let err = client_for(&server)
            .await
            .generate(&key, &[], "telecom_news", "", "", "", 800, true)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Malformed(_)));
        assert_eq!(err.to_string(), "Invalid response from server");
    }

    #[tokio::test]
    async fn test_non_json_body_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/download"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .await
            .download("x", "md", "tech_trends", &json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Malformed(_)));
    }

    #[tokio::test]
    async fn test_scrape_sends_expected_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/scrape"))
            .and(body_partial_json(json!({
                "api_key": "sk-live",
                "topic": "business",
                "custom_urls": ["https://a.tn"],
                "search_keyword": "fiber",
                "max_workers": 3
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "total": 0,
                "results": []
            })))
            .expect(1)
            .mount(&server)
            .await;

        let key = SecretString::from("sk-live");
        let response = client_for(&server)
            .await
            .scrape(&key, "business", &["https://a.tn".to_string()], "fiber", 3)
            .await
            .unwrap();
        assert!(response.results.is_empty());
        assert_eq!(response.total, Some(0));
    }

    #[tokio::test]
    async fn test_oversized_response_rejected() {
        let server = MockServer::start().await;
        let body = "x".repeat(MAX_RESPONSE_SIZE + 1);
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .await
            .sources_for_topic("all")
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::ResponseTooLarge(_)));
    }

    #[test]
    fn test_insecure_base_url_rejected() {
        let err = ApiClient::new("http://news.example.com").unwrap_err();
        assert!(matches!(
            err,
            ApiError::InvalidBaseUrl(UrlValidationError::Insecure)
        ));
    }

    #[test]
    fn test_debug_shows_base_url() {
        let client = ApiClient::new("https://news.example.com/").unwrap();
        assert!(format!("{:?}", client).contains("news.example.com"));
    }
}
