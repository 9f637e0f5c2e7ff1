//! Unwrapping of share/short links to the page that actually holds the recipe.

use crate::error::FetchError;
use crate::fetchers::{FetchedPage, RequestFetcher};
use log::{debug, warn};
use reqwest::Url;
use scraper::{Html, Selector};
use serde_json::Value;

/// Meta tags that share pages use to point at the original source
const SOURCE_META_SELECTORS: [&str; 3] = [
    "meta[property='pinterestapp:source']",
    "meta[property='og:see_also']",
    "meta[name='og:see_also']",
];

/// How a link was (or was not) resolved
#[derive(Debug)]
pub enum ResolveOutcome {
    /// Not a short link; used as given without any request
    NotShortLink(String),
    /// Found in a JSON-LD `url` field
    Canonical(String),
    /// Found in a source meta tag
    AlternateLink(String),
    /// No source advertised; the end of the redirect chain is used
    Redirected(String),
    /// Fetching failed; the original link is used unchanged
    Failed { original: String, reason: FetchError },
}

impl ResolveOutcome {
    /// The URL the caller should continue with
    pub fn effective_url(&self) -> &str {
        match self {
            ResolveOutcome::NotShortLink(url)
            | ResolveOutcome::Canonical(url)
            | ResolveOutcome::AlternateLink(url)
            | ResolveOutcome::Redirected(url) => url,
            ResolveOutcome::Failed { original, .. } => original,
        }
    }

    pub fn into_effective_url(self) -> String {
        match self {
            ResolveOutcome::NotShortLink(url)
            | ResolveOutcome::Canonical(url)
            | ResolveOutcome::AlternateLink(url)
            | ResolveOutcome::Redirected(url) => url,
            ResolveOutcome::Failed { original, .. } => original,
        }
    }
}

pub struct LinkResolver {
    fetcher: RequestFetcher,
    short_link_domains: Vec<String>,
}

impl LinkResolver {
    pub fn new(fetcher: RequestFetcher, short_link_domains: Vec<String>) -> Self {
        Self {
            fetcher,
            short_link_domains: short_link_domains
                .into_iter()
                .map(|d| d.trim().to_ascii_lowercase())
                .filter(|d| !d.is_empty())
                .collect(),
        }
    }

    /// Whether the URL's host is one of the short-link domains (or a subdomain of one)
    pub fn is_short_link(&self, url: &str) -> bool {
        let Ok(parsed) = Url::parse(url.trim()) else {
            return false;
        };
        let Some(host) = parsed.host_str() else {
            return false;
        };
        self.short_link_domains
            .iter()
            .any(|domain| host == domain || host.ends_with(&format!(".{domain}")))
    }

    pub async fn resolve(&self, url: &str) -> ResolveOutcome {
        if !self.is_short_link(url) {
            return ResolveOutcome::NotShortLink(url.to_string());
        }

        match self.fetcher.fetch(url).await {
            Ok(page) => self.resolve_from_page(page),
            Err(reason) => {
                warn!("Could not resolve short link {}: {}", url, reason);
                ResolveOutcome::Failed {
                    original: url.to_string(),
                    reason,
                }
            }
        }
    }

    /// Convenience wrapper returning only the URL to continue with
    pub async fn resolve_url(&self, url: &str) -> String {
        self.resolve(url).await.into_effective_url()
    }

    fn resolve_from_page(&self, page: FetchedPage) -> ResolveOutcome {
        let document = Html::parse_document(&page.body);

        if let Some(url) = self.find_json_ld_url(&document) {
            debug!("Resolved via JSON-LD url: {}", url);
            return ResolveOutcome::Canonical(url);
        }

        if let Some(url) = self.find_source_meta(&document) {
            debug!("Resolved via source meta tag: {}", url);
            return ResolveOutcome::AlternateLink(url);
        }

        debug!("No source advertised, using redirect target {}", page.final_url);
        ResolveOutcome::Redirected(page.final_url)
    }

    fn find_json_ld_url(&self, document: &Html) -> Option<String> {
        let selector = Selector::parse("script[type='application/ld+json']").unwrap();

        for script in document.select(&selector) {
            let Ok(json) = serde_json::from_str::<Value>(script.inner_html().trim()) else {
                debug!("Skipping unparseable JSON-LD block");
                continue;
            };

            let candidates: Vec<&Value> = match &json {
                Value::Array(items) => items.iter().collect(),
                other => vec![other],
            };

            let found = candidates
                .into_iter()
                .filter_map(|item| item.get("url").and_then(Value::as_str))
                .find(|url| self.is_external(url));
            if let Some(url) = found {
                return Some(url.to_string());
            }
        }

        None
    }

    fn find_source_meta(&self, document: &Html) -> Option<String> {
        SOURCE_META_SELECTORS.iter().find_map(|selector| {
            let selector = Selector::parse(selector).unwrap();
            document
                .select(&selector)
                .filter_map(|el| el.value().attr("content"))
                .map(str::trim)
                .find(|url| self.is_external(url))
                .map(String::from)
        })
    }

    /// An absolute http(s) link that does not point back at the share site
    fn is_external(&self, url: &str) -> bool {
        match Url::parse(url) {
            Ok(parsed) => {
                matches!(parsed.scheme(), "http" | "https") && !self.is_short_link(url)
            }
            Err(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FetchConfig;

    fn resolver(domains: &[&str]) -> LinkResolver {
        let fetcher = RequestFetcher::from_config(&FetchConfig::default()).unwrap();
        LinkResolver::new(fetcher, domains.iter().map(|d| d.to_string()).collect())
    }

    #[test]
    fn test_is_short_link() {
        let r = resolver(&["pin.it", "pinterest.com"]);
        assert!(r.is_short_link("https://pin.it/abc123"));
        assert!(r.is_short_link("https://www.pinterest.com/pin/42/"));
        assert!(r.is_short_link("https://PIN.IT/abc"));
        assert!(!r.is_short_link("https://spin.it/abc"));
        assert!(!r.is_short_link("https://example.com/pin.it"));
        assert!(!r.is_short_link("not a url"));
    }

    #[tokio::test]
    async fn test_non_short_link_is_returned_without_request() {
        let r = resolver(&["pin.it"]);
        let outcome = r.resolve("https://example.com/recipe").await;
        assert!(matches!(outcome, ResolveOutcome::NotShortLink(_)));
        assert_eq!(outcome.effective_url(), "https://example.com/recipe");
    }

    #[test]
    fn test_json_ld_url_on_share_domain_is_skipped() {
        let r = resolver(&["pin.it", "pinterest.com"]);
        let html = r#"
            <html><head>
            <script type="application/ld+json">{"url": "https://www.pinterest.com/pin/1/"}</script>
            <script type="application/ld+json">not json</script>
            <script type="application/ld+json">{"url": "https://cooking.example.com/chili"}</script>
            </head></html>
        "#;
        let page = FetchedPage {
            status: 200,
            body: html.to_string(),
            final_url: "https://www.pinterest.com/pin/1/".to_string(),
        };

        match r.resolve_from_page(page) {
            ResolveOutcome::Canonical(url) => assert_eq!(url, "https://cooking.example.com/chili"),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn test_meta_tag_then_redirect_fallbacks() {
        let r = resolver(&["pin.it", "pinterest.com"]);
        let with_meta = FetchedPage {
            status: 200,
            body: r#"<html><head>
                <meta property="og:see_also" content="https://blog.example.org/soup">
                </head></html>"#
                .to_string(),
            final_url: "https://www.pinterest.com/pin/2/".to_string(),
        };
        match r.resolve_from_page(with_meta) {
            ResolveOutcome::AlternateLink(url) => assert_eq!(url, "https://blog.example.org/soup"),
            other => panic!("unexpected outcome: {other:?}"),
        }

        let bare = FetchedPage {
            status: 200,
            body: "<html><body>nothing here</body></html>".to_string(),
            final_url: "https://www.pinterest.com/pin/3/".to_string(),
        };
        match r.resolve_from_page(bare) {
            ResolveOutcome::Redirected(url) => assert_eq!(url, "https://www.pinterest.com/pin/3/"),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }
}
