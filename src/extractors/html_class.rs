use super::{clean_text, Extractor, ParsingContext, ScrapedRecipe};
use crate::error::ExtractError;
use log::debug;
use scraper::{Html, Selector};

/// Recipe-card plugins (WPRM, Tasty, Mediavine, ...) and their class names
const TITLE_CLASSES: &[&str] = &[
    "wprm-recipe-name",
    "tasty-recipes-title",
    "mv-create-title",
    "recipe-name",
    "recipe-title",
    "recipecardname",
    "recipe-card-title",
    "recipe-header-title",
    "wprp-recipe-title",
    "recipe_name",
    "wpzoom-recipe-card-title",
    "recipe-card__title",
    "wpupg-recipe-name",
];

const INGREDIENT_CLASSES: &[&str] = &[
    "wprm-recipe-ingredients-container",
    "tasty-recipes-ingredients",
    "mv-create-ingredients",
    "recipe-ingredients",
    "recipe-ingredient-list",
    "recipe-card-ingredients",
    "wpzoom-recipe-ingredients",
    "recipe-ingredients-section",
    "wpupg-recipe-ingredients",
    "recipe_ingredients",
    "structured-ingredients",
    "mpprecipe-ingredients",
];

pub struct HtmlClassExtractor;

impl HtmlClassExtractor {
    fn find_title(&self, document: &Html) -> Option<String> {
        for class_name in TITLE_CLASSES {
            let Ok(selector) = Selector::parse(&format!(".{class_name}")) else {
                continue;
            };
            let title = document
                .select(&selector)
                .map(|el| clean_text(&el.text().collect::<Vec<_>>().join(" ")))
                .find(|text| !text.is_empty());
            if let Some(title) = title {
                debug!("Found title using class: {}", class_name);
                return Some(title);
            }
        }

        // Try h1 as fallback
        let selector = Selector::parse("h1").unwrap();
        document
            .select(&selector)
            .map(|el| clean_text(&el.text().collect::<Vec<_>>().join(" ")))
            .find(|text| !text.is_empty())
    }

    fn find_ingredients(&self, document: &Html) -> Vec<String> {
        let li_selector = Selector::parse("li").unwrap();

        for class_name in INGREDIENT_CLASSES {
            let Ok(selector) = Selector::parse(&format!(".{class_name}")) else {
                continue;
            };

            // Look for list items within the container
            let items: Vec<String> = document
                .select(&selector)
                .flat_map(|container| container.select(&li_selector))
                .map(|li| clean_text(&li.text().collect::<Vec<_>>().join(" ")))
                .filter(|text| !text.is_empty())
                .collect();

            if !items.is_empty() {
                debug!("Found {} ingredients using class: {}", items.len(), class_name);
                return items;
            }
        }

        Vec::new()
    }
}

impl Extractor for HtmlClassExtractor {
    fn parse(&self, context: &ParsingContext) -> Result<ScrapedRecipe, ExtractError> {
        debug!("Attempting to extract recipe using HTML class matchers");

        let ingredients = self.find_ingredients(&context.document);
        if ingredients.is_empty() {
            return Err(ExtractError::NoRecipeFound);
        }

        let title = self.find_title(&context.document).ok_or_else(|| {
            ExtractError::Malformed("Could not extract recipe title from HTML".to_string())
        })?;

        debug!("Recipe '{}' from {} via class matchers", title, context.url);
        Ok(ScrapedRecipe { title, ingredients })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wprm_card() {
        let html = r#"
        <html><body>
            <h1>Blog post about my weekend</h1>
            <div class="wprm-recipe">
                <h2 class="wprm-recipe-name">Weeknight Tacos</h2>
                <div class="wprm-recipe-ingredients-container">
                    <ul>
                        <li class="wprm-recipe-ingredient">1 lb ground beef</li>
                        <li class="wprm-recipe-ingredient">8  tortillas</li>
                        <li class="wprm-recipe-ingredient"> </li>
                    </ul>
                </div>
            </div>
        </body></html>
        "#;
        let context = ParsingContext::new("https://example.com/tacos", html);
        let recipe = HtmlClassExtractor.parse(&context).unwrap();

        assert_eq!(recipe.title, "Weeknight Tacos");
        assert_eq!(recipe.ingredients, vec!["1 lb ground beef", "8 tortillas"]);
    }

    #[test]
    fn test_h1_fallback_title() {
        let html = r#"
        <html><body>
            <h1>Simple Salad</h1>
            <div class="recipe-ingredients"><ul><li>lettuce</li><li>olive oil</li></ul></div>
        </body></html>
        "#;
        let context = ParsingContext::new("https://example.com/salad", html);
        let recipe = HtmlClassExtractor.parse(&context).unwrap();

        assert_eq!(recipe.title, "Simple Salad");
        assert_eq!(recipe.ingredients, vec!["lettuce", "olive oil"]);
    }

    #[test]
    fn test_page_without_ingredient_list() {
        let html = r#"<html><body><h1>Recipe</h1><p>Nothing structured here.</p></body></html>"#;
        let context = ParsingContext::new("https://example.com", html);

        assert!(matches!(
            HtmlClassExtractor.parse(&context),
            Err(ExtractError::NoRecipeFound)
        ));
    }
}
