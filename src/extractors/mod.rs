use crate::error::ExtractError;
use crate::fetchers::RequestFetcher;
use async_trait::async_trait;
use html_escape::decode_html_entities;
use log::{debug, info, warn};
use scraper::Html;

mod html_class;
mod json_ld;
mod microdata;

pub use html_class::HtmlClassExtractor;
pub use json_ld::JsonLdExtractor;
pub use microdata::MicroDataExtractor;

/// Title and ingredient lines pulled from a recipe page
#[derive(Debug, Clone, PartialEq)]
pub struct ScrapedRecipe {
    pub title: String,
    pub ingredients: Vec<String>,
}

pub struct ParsingContext {
    pub url: String,
    pub document: Html,
}

impl ParsingContext {
    pub fn new(url: &str, html: &str) -> Self {
        Self {
            url: url.to_string(),
            document: Html::parse_document(html),
        }
    }
}

/// Pulls a recipe out of an already-parsed page
pub trait Extractor {
    fn parse(&self, context: &ParsingContext) -> Result<ScrapedRecipe, ExtractError>;
}

/// A complete strategy for turning a URL into a recipe
#[async_trait]
pub trait RecipeSource: Send + Sync {
    fn name(&self) -> &str;
    async fn scrape(&self, url: &str) -> Result<ScrapedRecipe, ExtractError>;
}

/// General-purpose page scraper: schema.org microdata, then the class names
/// used by common recipe-card plugins.
pub struct PageScraper {
    fetcher: RequestFetcher,
}

impl PageScraper {
    pub fn new(fetcher: RequestFetcher) -> Self {
        Self { fetcher }
    }
}

fn parse_with(
    extractors: &[&dyn Extractor],
    url: &str,
    html: &str,
) -> Result<ScrapedRecipe, ExtractError> {
    let context = ParsingContext::new(url, html);
    let mut last_error = ExtractError::NoRecipeFound;
    for extractor in extractors {
        match extractor.parse(&context) {
            Ok(recipe) => return Ok(recipe),
            Err(e) => last_error = e,
        }
    }
    Err(last_error)
}

#[async_trait]
impl RecipeSource for PageScraper {
    fn name(&self) -> &str {
        "page"
    }

    async fn scrape(&self, url: &str) -> Result<ScrapedRecipe, ExtractError> {
        let page = self.fetcher.fetch(url).await?.ensure_success()?;
        parse_with(&[&MicroDataExtractor, &HtmlClassExtractor], url, &page.body)
    }
}

/// Reads embedded JSON-LD `Recipe` blocks
pub struct JsonLdSource {
    fetcher: RequestFetcher,
}

impl JsonLdSource {
    pub fn new(fetcher: RequestFetcher) -> Self {
        Self { fetcher }
    }
}

#[async_trait]
impl RecipeSource for JsonLdSource {
    fn name(&self) -> &str {
        "json_ld"
    }

    async fn scrape(&self, url: &str) -> Result<ScrapedRecipe, ExtractError> {
        let page = self.fetcher.fetch(url).await?.ensure_success()?;
        parse_with(&[&JsonLdExtractor], url, &page.body)
    }
}

/// Two-tier extraction: a primary strategy, then the JSON-LD fallback
pub struct RecipeExtractor {
    primary: Box<dyn RecipeSource>,
    fallback: Box<dyn RecipeSource>,
}

impl RecipeExtractor {
    pub fn new(fetcher: RequestFetcher) -> Self {
        Self {
            primary: Box::new(PageScraper::new(fetcher.clone())),
            fallback: Box::new(JsonLdSource::new(fetcher)),
        }
    }

    pub fn with_sources(primary: Box<dyn RecipeSource>, fallback: Box<dyn RecipeSource>) -> Self {
        Self { primary, fallback }
    }

    pub async fn extract(&self, url: &str) -> Result<ScrapedRecipe, ExtractError> {
        match self.primary.scrape(url).await {
            Ok(recipe) => {
                info!("Extracted '{}' using {}", recipe.title, self.primary.name());
                return Ok(recipe);
            }
            Err(e) => debug!("{} failed for {}: {}", self.primary.name(), url, e),
        }

        match self.fallback.scrape(url).await {
            Ok(recipe) => {
                info!("Extracted '{}' using {}", recipe.title, self.fallback.name());
                Ok(recipe)
            }
            Err(e) => {
                warn!("Could not extract a recipe from {}: {}", url, e);
                Err(e)
            }
        }
    }

    /// `(title, ingredients)`, with `(None, [])` whenever extraction fails
    pub async fn extract_or_empty(&self, url: &str) -> (Option<String>, Vec<String>) {
        match self.extract(url).await {
            Ok(recipe) => (Some(recipe.title), recipe.ingredients),
            Err(_) => (None, Vec::new()),
        }
    }
}

fn decode_html_symbols(text: &str) -> String {
    // for some reason need to decode twice to get the correct string
    decode_html_entities(&decode_html_entities(text)).into_owned()
}

/// Decode entities and collapse runs of whitespace
pub(crate) fn clean_text(text: &str) -> String {
    decode_html_symbols(text)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
