use std::time::Duration;

use futures_util::StreamExt;
use reqwest::header::{
    HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CACHE_CONTROL, CONTENT_TYPE, PRAGMA,
    USER_AGENT,
};
use reqwest::{Client, Response, Url};
use shelf_logging::shelf_debug;

use crate::{FailureKind, FetchError, FetchMetadata, FetchOutput};

/// How article pages are requested. The header values mimic a desktop
/// browser; some sites serve bare pages to unknown clients.
#[derive(Debug, Clone)]
pub struct FetchSettings {
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub redirect_limit: usize,
    pub max_bytes: u64,
    pub allowed_content_types: Vec<String>,
    pub user_agent: String,
    pub accept: String,
    pub accept_language: String,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            redirect_limit: 5,
            max_bytes: 5 * 1024 * 1024,
            allowed_content_types: vec!["text/html".into(), "application/xhtml+xml".into()],
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36"
                .into(),
            accept: "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8"
                .into(),
            accept_language: "en-US,en;q=0.5".into(),
        }
    }
}

impl FetchSettings {
    /// Headers sent with every page request, caching disabled.
    fn header_map(&self) -> Result<HeaderMap, FetchError> {
        let value = |raw: &str| {
            HeaderValue::from_str(raw).map_err(|err| {
                FetchError::new(FailureKind::Network, format!("invalid header value: {err}"))
            })
        };
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, value(&self.user_agent)?);
        headers.insert(ACCEPT, value(&self.accept)?);
        headers.insert(ACCEPT_LANGUAGE, value(&self.accept_language)?);
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
        headers.insert(PRAGMA, HeaderValue::from_static("no-cache"));
        Ok(headers)
    }

    /// Compares the media type only; parameters such as `charset` are ignored.
    fn accepts_content_type(&self, content_type: &str) -> bool {
        let media_type = content_type.split(';').next().unwrap_or_default().trim();
        self.allowed_content_types
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(media_type))
    }
}

#[async_trait::async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<FetchOutput, FetchError>;
}

/// One GET per call, never retried.
#[derive(Debug, Clone)]
pub struct ReqwestFetcher {
    client: Client,
    settings: FetchSettings,
}

impl ReqwestFetcher {
    pub fn new(settings: FetchSettings) -> Result<Self, FetchError> {
        let client = Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .redirect(reqwest::redirect::Policy::limited(settings.redirect_limit))
            .default_headers(settings.header_map()?)
            .build()
            .map_err(|err| FetchError::new(FailureKind::Network, err.to_string()))?;
        Ok(Self { client, settings })
    }

    fn check_response(&self, response: &Response) -> Result<Option<String>, FetchError> {
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::new(
                FailureKind::HttpStatus(status.as_u16()),
                format!("Failed to fetch: {}", status.as_u16()),
            ));
        }
        if let Some(declared) = response.content_length() {
            self.check_size(declared)?;
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        match content_type.as_deref() {
            Some(ct) if !self.settings.accepts_content_type(ct) => Err(FetchError::new(
                FailureKind::UnsupportedContentType {
                    content_type: ct.to_string(),
                },
                "not an html page",
            )),
            _ => Ok(content_type),
        }
    }

    fn check_size(&self, len: u64) -> Result<(), FetchError> {
        let max_bytes = self.settings.max_bytes;
        if len > max_bytes {
            return Err(FetchError::new(
                FailureKind::TooLarge {
                    max_bytes,
                    actual: Some(len),
                },
                "page too large",
            ));
        }
        Ok(())
    }

    /// Streams the body, giving up as soon as it exceeds `max_bytes`.
    async fn read_body(&self, response: Response) -> Result<Vec<u8>, FetchError> {
        let mut body = Vec::new();
        let mut chunks = response.bytes_stream();
        while let Some(chunk) = chunks.next().await {
            let chunk = chunk.map_err(classify)?;
            self.check_size((body.len() + chunk.len()) as u64)?;
            body.extend_from_slice(&chunk);
        }
        Ok(body)
    }
}

#[async_trait::async_trait]
impl Fetcher for ReqwestFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchOutput, FetchError> {
        let target = web_url(url)?;
        shelf_debug!("Fetching page metadata url={}", target);

        let response = self.client.get(target).send().await.map_err(classify)?;
        let content_type = self.check_response(&response)?;
        let final_url = response.url().to_string();
        let bytes = self.read_body(response).await?;

        let metadata = FetchMetadata {
            requested_url: url.to_string(),
            final_url,
            content_type,
            byte_len: bytes.len() as u64,
        };
        Ok(FetchOutput { bytes, metadata })
    }
}

fn web_url(raw: &str) -> Result<Url, FetchError> {
    let url =
        Url::parse(raw).map_err(|err| FetchError::new(FailureKind::InvalidUrl, err.to_string()))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(FetchError::new(
            FailureKind::InvalidUrl,
            format!("unsupported scheme {other}"),
        )),
    }
}

fn classify(err: reqwest::Error) -> FetchError {
    let kind = if err.is_timeout() {
        FailureKind::Timeout
    } else if err.is_redirect() {
        FailureKind::RedirectLimitExceeded
    } else {
        FailureKind::Network
    };
    FetchError::new(kind, err.to_string())
}
