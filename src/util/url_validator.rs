use std::net::IpAddr;
use thiserror::Error;
use url::Url;

/// Reasons a service base URL is refused.
#[derive(Error, Debug)]
pub enum UrlValidationError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("Unsupported scheme: {0} (only http/https allowed)")]
    UnsupportedScheme(String),
    /// The API key travels in request bodies, so plain HTTP is only tolerated
    /// for a service on this machine.
    #[error("Insecure base URL: HTTPS required except for localhost")]
    Insecure,
}

/// Parses and vets the base URL of the scraping service.
///
/// Accepts `https://` anywhere and `http://` only when the host is loopback
/// (`localhost`, `127.0.0.0/8`, `::1`). A trailing slash is ensured so that
/// endpoint paths join underneath any path prefix.
///
/// ```
/// use newsdesk::util::validate_base_url;
///
/// assert!(validate_base_url("https://news.example.com").is_ok());
/// assert!(validate_base_url("http://127.0.0.1:5000").is_ok());
/// assert!(validate_base_url("http://news.example.com").is_err());
/// ```
pub fn validate_base_url(raw: &str) -> Result<Url, UrlValidationError> {
    let mut url = Url::parse(raw.trim())?;

    match url.scheme() {
        "https" => {}
        "http" => {
            if !url.host_str().is_some_and(is_loopback_host) {
                return Err(UrlValidationError::Insecure);
            }
            tracing::warn!(base_url = %url, "Using plain HTTP service URL (localhost only)");
        }
        other => return Err(UrlValidationError::UnsupportedScheme(other.to_owned())),
    }

    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }

    Ok(url)
}

fn is_loopback_host(host: &str) -> bool {
    if host.eq_ignore_ascii_case("localhost") {
        return true;
    }
    let bare = host
        .strip_prefix('[')
        .and_then(|h| h.strip_suffix(']'))
        .unwrap_or(host);
    bare.parse::<IpAddr>().is_ok_and(|ip| ip.is_loopback())
}

/// Host part of `raw` without a leading `www.`, if it parses as a URL.
pub fn host_label(raw: &str) -> Option<String> {
    let url = Url::parse(raw).ok()?;
    let host = url.host_str()?;
    Some(host.strip_prefix("www.").unwrap_or(host).to_owned())
}
