use super::{clean_text, Extractor, ParsingContext, ScrapedRecipe};
use crate::error::ExtractError;
use log::debug;
use scraper::{ElementRef, Html, Selector};

/// Reads schema.org `Recipe` microdata (`itemscope` / `itemprop` attributes)
pub struct MicroDataExtractor;

impl MicroDataExtractor {
    fn find_recipe_container<'a>(&self, document: &'a Html) -> Option<ElementRef<'a>> {
        // Look for elements with itemscope and itemtype containing "Recipe"
        let selector = Selector::parse("[itemscope]").unwrap();
        document.select(&selector).find(|element| {
            element.value().attr("itemtype").is_some_and(|itemtype| {
                itemtype.contains("schema.org/Recipe") || itemtype.contains("data-vocabulary.org/Recipe")
            })
        })
    }

    fn get_itemprop(&self, root: ElementRef, prop: &str) -> Option<String> {
        let selector = Selector::parse(&format!("[itemprop='{}']", prop)).unwrap();
        root.select(&selector)
            .map(|el| {
                // <meta itemprop="name" content="..."> carries the value in an attribute
                el.value()
                    .attr("content")
                    .map(clean_text)
                    .unwrap_or_else(|| clean_text(&el.text().collect::<Vec<_>>().join(" ")))
            })
            .find(|text| !text.is_empty())
    }

    fn get_itemprop_list(&self, root: ElementRef, prop: &str) -> Vec<String> {
        let selector = Selector::parse(&format!("[itemprop='{}']", prop)).unwrap();
        root.select(&selector)
            .map(|el| clean_text(&el.text().collect::<Vec<_>>().join(" ")))
            .filter(|text| !text.is_empty())
            .collect()
    }
}

impl Extractor for MicroDataExtractor {
    fn parse(&self, context: &ParsingContext) -> Result<ScrapedRecipe, ExtractError> {
        debug!("Attempting to extract recipe using MicroData extractor");

        // Only look inside a Recipe item; page-wide itemprops pick up site titles and bios
        let container = self
            .find_recipe_container(&context.document)
            .ok_or(ExtractError::NoRecipeFound)?;

        let title = self
            .get_itemprop(container, "name")
            .ok_or_else(|| ExtractError::Malformed("Could not extract recipe name".to_string()))?;

        // Try 'recipeIngredient' and the older 'ingredients'
        let mut ingredients = self.get_itemprop_list(container, "recipeIngredient");
        if ingredients.is_empty() {
            ingredients = self.get_itemprop_list(container, "ingredients");
        }

        if ingredients.is_empty() {
            return Err(ExtractError::Malformed(
                "Recipe microdata has no ingredients".to_string(),
            ));
        }

        debug!("MicroData recipe '{}' from {}", title, context.url);
        Ok(ScrapedRecipe { title, ingredients })
    }
}
