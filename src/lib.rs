pub mod config;
pub mod cookbook;
pub mod derived;
pub mod error;
pub mod extractors;
pub mod fetchers;
pub mod model;
pub mod picker;
pub mod planner;
pub mod resolver;
pub mod session;
pub mod store;

pub use crate::config::Settings;
pub use crate::error::{DeciderError, ExtractError, FetchError, StoreError};
pub use crate::extractors::{RecipeExtractor, ScrapedRecipe};
pub use crate::model::{Category, Meal, MealDraft, MealTable, Score};
pub use crate::resolver::{LinkResolver, ResolveOutcome};
pub use crate::session::{Notice, SessionState};
pub use crate::store::{CsvSheetStore, MealRepository, MemoryStore};

use crate::fetchers::RequestFetcher;
use log::debug;

/// Short-link resolver and two-tier extractor sharing one HTTP client
pub fn importer(settings: &Settings) -> Result<(LinkResolver, RecipeExtractor), FetchError> {
    let fetcher = RequestFetcher::from_config(&settings.fetch)?;
    let resolver = LinkResolver::new(fetcher.clone(), settings.short_link_domains.clone());
    Ok((resolver, RecipeExtractor::new(fetcher)))
}

/// Resolve a (possibly shortened) recipe link and extract its title and ingredients
pub async fn fetch_recipe(url: &str, settings: &Settings) -> Result<ScrapedRecipe, ExtractError> {
    let (resolver, extractor) = importer(settings)?;
    let target = resolver.resolve_url(url).await;
    debug!("Fetching recipe from {}", target);
    extractor.extract(&target).await
}
