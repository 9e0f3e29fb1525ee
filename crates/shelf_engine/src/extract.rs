//! Page metadata extraction.
//!
//! Each field walks an ordered list of markup sources and keeps the first
//! non-empty value:
//! - title: `og:title`, `twitter:title`, `<title>`
//! - description: `og:description`, `twitter:description`, `<meta name="description">`
//! - image: `og:image`, `twitter:image`, `<meta name="thumbnail">`

use scraper::{Html, Selector};
use shelf_core::ArticleMetadata;
use url::Url;

use crate::{decode_html, FailureKind, FetchError, Fetcher};

#[derive(Debug, Clone, Copy)]
enum Source {
    /// `<meta property="...">`
    Property(&'static str),
    /// `<meta name="...">`
    Name(&'static str),
    /// Text of the document `<title>`.
    TitleElement,
}

const TITLE_SOURCES: &[Source] = &[
    Source::Property("og:title"),
    Source::Name("twitter:title"),
    Source::TitleElement,
];

const DESCRIPTION_SOURCES: &[Source] = &[
    Source::Property("og:description"),
    Source::Name("twitter:description"),
    Source::Name("description"),
];

const IMAGE_SOURCES: &[Source] = &[
    Source::Property("og:image"),
    Source::Name("twitter:image"),
    Source::Name("thumbnail"),
];

#[async_trait::async_trait]
pub trait MetadataSource: Send + Sync {
    async fn extract(&self, url: &str) -> Result<ArticleMetadata, FetchError>;
}

/// Fetches the page once and reads its structured markup. Results are not
/// cached here.
#[derive(Debug, Clone)]
pub struct HtmlMetadataExtractor<F> {
    fetcher: F,
}

impl<F: Fetcher> HtmlMetadataExtractor<F> {
    pub fn new(fetcher: F) -> Self {
        Self { fetcher }
    }
}

#[async_trait::async_trait]
impl<F: Fetcher> MetadataSource for HtmlMetadataExtractor<F> {
    async fn extract(&self, url: &str) -> Result<ArticleMetadata, FetchError> {
        let output = self.fetcher.fetch(url).await?;
        let decoded = decode_html(&output.bytes, output.metadata.content_type.as_deref())
            .map_err(|err| FetchError::new(FailureKind::Markup, err.to_string()))?;
        let base = Url::parse(&output.metadata.final_url).ok();
        Ok(extract_metadata(&decoded.html, base.as_ref()))
    }
}

/// Pull title, description and image out of an HTML document. Relative image
/// URLs are resolved against `base` when given.
pub fn extract_metadata(html: &str, base: Option<&Url>) -> ArticleMetadata {
    let doc = Html::parse_document(html);
    let image = first_value(&doc, IMAGE_SOURCES).map(|raw| match base {
        Some(base) => base.join(&raw).map(String::from).unwrap_or(raw),
        None => raw,
    });

    ArticleMetadata {
        title: first_value(&doc, TITLE_SOURCES),
        description: first_value(&doc, DESCRIPTION_SOURCES),
        image,
    }
}

fn first_value(doc: &Html, sources: &[Source]) -> Option<String> {
    sources.iter().find_map(|source| read_source(doc, *source))
}

fn read_source(doc: &Html, source: Source) -> Option<String> {
    match source {
        Source::Property(key) => meta_content(doc, &format!("meta[property=\"{key}\"]")),
        Source::Name(key) => meta_content(doc, &format!("meta[name=\"{key}\"]")),
        // A document title beats one nested in the body, e.g. inside an svg.
        Source::TitleElement => ["head > title", "title"]
            .iter()
            .find_map(|css| element_text(doc, css)),
    }
}

fn meta_content(doc: &Html, css: &str) -> Option<String> {
    let selector = Selector::parse(css).ok()?;
    doc.select(&selector)
        .find_map(|element| non_empty(element.value().attr("content")?))
}

fn element_text(doc: &Html, css: &str) -> Option<String> {
    let selector = Selector::parse(css).ok()?;
    doc.select(&selector)
        .find_map(|element| non_empty(&element.text().collect::<String>()))
}

fn non_empty(raw: &str) -> Option<String> {
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    (!collapsed.is_empty()).then_some(collapsed)
}
