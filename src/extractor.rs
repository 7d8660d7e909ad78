//! Page title lookup for link entries.
use std::{future::Future, pin::Pin, time::Duration};

use log::{debug, warn};
use reqwest::{Client, StatusCode, Url};
use scraper::{Html, Selector};

use crate::{Result, StakError};

const FETCH_TIMEOUT: Duration = Duration::from_secs(5);
const MAX_TITLE_CHARS: usize = 100;
const FALLBACK_TITLE: &str = "Link";
const XHTML_NAMESPACE: &str = "http://www.w3.org/1999/xhtml";

/// Future returned by [`TitleFetcher::fetch_title`].
pub type TitleFuture<'a> = Pin<Box<dyn Future<Output = String> + Send + 'a>>;

/// Something that can name a URL. Never fails: implementations fall back to
/// a title derived from the URL itself.
pub trait TitleFetcher: Send + Sync {
    fn fetch_title<'a>(&'a self, url: &'a str) -> TitleFuture<'a>;
}

/// Fetches the HTML `<title>` of a page over HTTP.
pub struct LinkExtractor {
    client: Client,
}

impl LinkExtractor {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .timeout(FETCH_TIMEOUT)
            .build()
            .map_err(StakError::from)?;
        Ok(Self { client })
    }

    /// GETs `url` and returns its trimmed, truncated title.
    pub async fn get_url_title(&self, url: &str) -> Result<String> {
        let response = self.client.get(url).send().await?;
        if response.status() != StatusCode::OK {
            return Err(StakError::Http {
                message: format!("HTTP {}", response.status()),
            });
        }
        let body = response.text().await?;
        title_from_html(&body).ok_or_else(|| StakError::Http {
            message: "page has no title".to_string(),
        })
    }
}

impl TitleFetcher for LinkExtractor {
    fn fetch_title<'a>(&'a self, url: &'a str) -> TitleFuture<'a> {
        Box::pin(async move {
            match self.get_url_title(url).await {
                Ok(title) => {
                    debug!("Fetched title for {}: {}", url, title);
                    title
                }
                Err(e) => {
                    warn!("Title fetch for {} failed: {}", url, e);
                    fallback_title(url)
                }
            }
        })
    }
}

/// Host of `url` without a leading `www.`, or a generic label.
pub fn fallback_title(url: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.to_string()))
        .map(|host| host.strip_prefix("www.").unwrap_or(&host).to_string())
        .unwrap_or_else(|| FALLBACK_TITLE.to_string())
}

fn truncate_title(title: &str) -> String {
    if title.chars().count() <= MAX_TITLE_CHARS {
        return title.to_string();
    }
    let kept: String = title.chars().take(MAX_TITLE_CHARS - 3).collect();
    format!("{}...", kept)
}

/// Text of the first HTML `<title>` element with non-blank text, trimmed
/// and truncated. `<title>` elements of inline SVG or MathML are skipped.
pub fn title_from_html(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("title").ok()?;

    document
        .select(&selector)
        .filter(|element| &*element.value().name.ns == XHTML_NAMESPACE)
        .map(|element| element.text().collect::<String>())
        .find(|text| !text.trim().is_empty())
        .map(|text| truncate_title(text.trim()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_first_title() {
        let html = "<html><head><TITLE lang=\"en\">\n  The Go Programming Language \n</TITLE>\
                    <title>second</title></head></html>";
        assert_eq!(
            title_from_html(html).as_deref(),
            Some("The Go Programming Language")
        );
    }

    #[test]
    fn inner_whitespace_is_kept() {
        assert_eq!(
            title_from_html("<title>  Rust   by\nExample </title>").as_deref(),
            Some("Rust   by\nExample")
        );
    }

    #[test]
    fn blank_or_missing_title_is_none() {
        assert!(title_from_html("<title>   </title>").is_none());
        assert!(title_from_html("<p>no head</p>").is_none());
    }

    #[test]
    fn decodes_named_and_numeric_entities() {
        assert_eq!(
            title_from_html("<title>Q&amp;A &mdash; &#8212; &#x2014; &#39;today&#39;</title>").as_deref(),
            Some("Q&A \u{2014} \u{2014} \u{2014} 'today'")
        );
    }

    #[test]
    fn commented_and_svg_titles_are_ignored() {
        let html = "<!DOCTYPE html><html><head><!-- <title>draft</title> -->\
                    <title>Real page</title></head><body></body></html>";
        assert_eq!(title_from_html(html).as_deref(), Some("Real page"));

        let html = "<html><body><svg><title>icon</title></svg></body></html>";
        assert!(title_from_html(html).is_none());

        let html = "<html><head></head><body><svg><title>logo</title></svg>\
                    <title>Late title</title></body></html>";
        assert_eq!(title_from_html(html).as_deref(), Some("Late title"));
    }

    #[test]
    fn long_titles_are_truncated_to_100_chars() {
        let long = "é".repeat(150);
        let truncated = truncate_title(&long);
        assert_eq!(truncated.chars().count(), 100);
        assert!(truncated.ends_with("..."));
        assert_eq!(truncate_title("short"), "short");
    }

    #[test]
    fn fallback_strips_www() {
        assert_eq!(fallback_title("https://www.rust-lang.org/learn"), "rust-lang.org");
        assert_eq!(fallback_title("http://go.dev"), "go.dev");
        assert_eq!(fallback_title("not a url"), "Link");
    }
}
