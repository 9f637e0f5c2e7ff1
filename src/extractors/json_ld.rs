use super::{clean_text, Extractor, ParsingContext, ScrapedRecipe};
use crate::error::ExtractError;
use log::debug;
use scraper::Selector;
use serde_json::Value;

/// Reads `<script type="application/ld+json">` blocks describing a schema.org Recipe.
///
/// Each block may be a single object, a list of objects, or an object with
/// a nested `@graph` collection.
pub struct JsonLdExtractor;

// Add this new function to clean JSON strings
fn sanitize_json(json_str: &str) -> String {
    // Remove any leading/trailing whitespace
    let mut cleaned = json_str.trim().to_string();

    // Remove any HTML comments or CDATA wrappers that might be present
    cleaned = cleaned
        .replace("<!--", "")
        .replace("-->", "")
        .replace("<![CDATA[", "")
        .replace("]]>", "");

    strip_trailing_commas(cleaned.trim())
}

/// Drop commas that directly precede `]` or `}` (ignoring whitespace), outside strings
fn strip_trailing_commas(json: &str) -> String {
    let chars: Vec<char> = json.chars().collect();
    let mut out = String::with_capacity(json.len());
    let mut in_string = false;
    let mut escaped = false;

    for (i, &c) in chars.iter().enumerate() {
        if in_string {
            out.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }

        match c {
            '"' => {
                in_string = true;
                out.push(c);
            }
            ',' => {
                let next = chars[i + 1..].iter().find(|ch| !ch.is_whitespace());
                if !matches!(next, Some(']' | '}')) {
                    out.push(c);
                }
            }
            _ => out.push(c),
        }
    }

    out
}

/// `"Recipe"`, `"schema:Recipe"` and `"https://schema.org/Recipe"` all count
fn is_recipe_type(type_name: &str) -> bool {
    type_name
        .rsplit(['/', ':'])
        .next()
        .is_some_and(|t| t.eq_ignore_ascii_case("Recipe"))
}

fn has_recipe_type(item: &Value) -> bool {
    match item.get("@type") {
        Some(Value::String(t)) => is_recipe_type(t),
        Some(Value::Array(types)) => types.iter().filter_map(Value::as_str).any(is_recipe_type),
        _ => false,
    }
}

/// Narrow a parsed block down to the single object that should describe the recipe
fn select_candidate(json: &Value) -> Option<&Value> {
    let mut candidate = match json {
        Value::Array(items) => items
            .iter()
            .find(|item| has_recipe_type(item))
            .or_else(|| items.first())?,
        other => other,
    };

    if let Some(Value::Array(graph)) = candidate.get("@graph") {
        if let Some(recipe) = graph.iter().find(|item| has_recipe_type(item)) {
            candidate = recipe;
        }
    }

    has_recipe_type(candidate).then_some(candidate)
}

fn read_ingredients(value: Option<&Value>) -> Vec<String> {
    let lines: Vec<String> = match value {
        Some(Value::String(single)) => vec![single.clone()],
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s.clone()),
                // Some sites emit {"name": "...", "amount": "..."} objects
                Value::Object(obj) => {
                    let name = obj.get("name").and_then(Value::as_str)?;
                    match obj.get("amount").and_then(Value::as_str) {
                        Some(amount) if !amount.trim().is_empty() => {
                            Some(format!("{} {}", amount.trim(), name))
                        }
                        _ => Some(name.to_string()),
                    }
                }
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    };

    lines
        .iter()
        .map(|line| clean_text(line))
        .filter(|line| !line.is_empty())
        .collect()
}

fn read_recipe(candidate: &Value) -> Result<ScrapedRecipe, ExtractError> {
    let title = candidate
        .get("name")
        .and_then(Value::as_str)
        .map(clean_text)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ExtractError::Malformed("Recipe block has no name".to_string()))?;

    Ok(ScrapedRecipe {
        title,
        ingredients: read_ingredients(candidate.get("recipeIngredient")),
    })
}

impl Extractor for JsonLdExtractor {
    fn parse(&self, context: &ParsingContext) -> Result<ScrapedRecipe, ExtractError> {
        let selector = Selector::parse("script[type='application/ld+json']").unwrap();
        let mut last_error = ExtractError::NoRecipeFound;

        // Try each script element until we find a valid recipe
        for script in context.document.select(&selector) {
            let cleaned_json = sanitize_json(&script.inner_html());
            let json_ld = match serde_json::from_str::<Value>(&cleaned_json) {
                Ok(json) => json,
                Err(e) => {
                    debug!("Skipping JSON-LD block on {}: {}", context.url, e);
                    last_error = ExtractError::Malformed(e.to_string());
                    continue;
                }
            };

            let Some(candidate) = select_candidate(&json_ld) else {
                debug!("JSON-LD block on {} is not a Recipe", context.url);
                continue;
            };

            match read_recipe(candidate) {
                Ok(recipe) => {
                    debug!("Found valid recipe: {:#?}", recipe);
                    return Ok(recipe);
                }
                Err(e) => last_error = e,
            }
        }

        Err(last_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Add helper function for tests
    fn context_for(json_ld: &str) -> ParsingContext {
        let html = format!(
            r#"
            <!DOCTYPE html>
            <html>
            <head>
                <script type="application/ld+json">
                    {}
                </script>
            </head>
            <body></body>
            </html>
            "#,
            json_ld
        );
        ParsingContext::new("https://example.com/recipe", &html)
    }

    #[test]
    fn test_parse_single_object() {
        let json_ld = r#"
        {
            "@context": "https://schema.org/",
            "@type": "Recipe",
            "name": "Chocolate Chip Cookies",
            "recipeIngredient": ["flour", "sugar", "chocolate chips"]
        }
        "#;
        let result = JsonLdExtractor.parse(&context_for(json_ld)).unwrap();

        assert_eq!(result.title, "Chocolate Chip Cookies");
        assert_eq!(result.ingredients, vec!["flour", "sugar", "chocolate chips"]);
    }

    #[test]
    fn test_string_ingredient_becomes_single_line() {
        let json_ld = r#"{"@type": ["Recipe"], "name": "Soup", "recipeIngredient": "salt"}"#;
        let result = JsonLdExtractor.parse(&context_for(json_ld)).unwrap();

        assert_eq!(result.title, "Soup");
        assert_eq!(result.ingredients, vec!["salt"]);
    }

    #[test]
    fn test_list_prefers_recipe_typed_item() {
        let json_ld = r#"
        [
            {"@type": "WebSite", "name": "Recipe Website"},
            {"@type": "Recipe", "name": "Pasta Carbonara", "recipeIngredient": ["spaghetti", "eggs"]}
        ]
        "#;
        let result = JsonLdExtractor.parse(&context_for(json_ld)).unwrap();

        assert_eq!(result.title, "Pasta Carbonara");
        assert_eq!(result.ingredients, vec!["spaghetti", "eggs"]);
    }

    #[test]
    fn test_top_level_graph_object() {
        let json_ld = r#"
        {
            "@context": "https://schema.org",
            "@graph": [
                {"@type": "WebPage", "name": "Weeknight Dinners"},
                {"@type": "BreadcrumbList"},
                {"@type": "Recipe", "name": "Lemon Chicken", "recipeIngredient": ["chicken thighs", "lemon"]}
            ]
        }
        "#;
        let result = JsonLdExtractor.parse(&context_for(json_ld)).unwrap();

        assert_eq!(result.title, "Lemon Chicken");
        assert_eq!(result.ingredients, vec!["chicken thighs", "lemon"]);
    }

    #[test]
    fn test_list_first_item_with_graph() {
        let json_ld = r#"
        [
            {
                "@context": "https://schema.org",
                "@graph": [
                    {"@type": "Organization", "name": "Food Blog"},
                    {"@type": "Recipe", "name": "Graph Stew", "recipeIngredient": ["beef", "carrots"]}
                ]
            }
        ]
        "#;
        let result = JsonLdExtractor.parse(&context_for(json_ld)).unwrap();

        assert_eq!(result.title, "Graph Stew");
        assert_eq!(result.ingredients, vec!["beef", "carrots"]);
    }

    #[test]
    fn test_graph_without_recipe_is_not_found() {
        let json_ld = r#"
        {"@graph": [{"@type": "WebPage", "name": "About us"}]}
        "#;
        assert!(matches!(
            JsonLdExtractor.parse(&context_for(json_ld)),
            Err(ExtractError::NoRecipeFound)
        ));
    }

    #[test]
    fn test_type_matching_variants() {
        assert!(is_recipe_type("Recipe"));
        assert!(is_recipe_type("recipe"));
        assert!(is_recipe_type("http://schema.org/Recipe"));
        assert!(is_recipe_type("schema:Recipe"));
        assert!(!is_recipe_type("RecipeCollection"));
        assert!(!is_recipe_type("HowTo"));
    }

    #[test]
    fn test_malformed_block_skipped_for_later_block() {
        let html = r#"
            <html><head>
            <script type="application/ld+json">{ this is not json </script>
            <script type="application/ld+json">
                {"@type": "Recipe", "name": "Fish &amp; Chips", "recipeIngredient": ["cod", "  potatoes  "]}
            </script>
            </head></html>
        "#;
        let context = ParsingContext::new("https://example.com", html);
        let result = JsonLdExtractor.parse(&context).unwrap();

        assert_eq!(result.title, "Fish & Chips");
        assert_eq!(result.ingredients, vec!["cod", "potatoes"]);
    }

    #[test]
    fn test_only_malformed_blocks_reports_malformed() {
        let context = ParsingContext::new(
            "https://example.com",
            r#"<script type="application/ld+json">{ broken </script>"#,
        );
        assert!(matches!(
            JsonLdExtractor.parse(&context),
            Err(ExtractError::Malformed(_))
        ));
    }

    #[test]
    fn test_trailing_commas_and_ingredient_objects() {
        let json_ld = r#"
        {
            "@type": "Recipe",
            "name": "Pancakes",
            "recipeIngredient": [
                {"name": "flour", "amount": "200g"},
                {"name": "milk"},
            ],
        }
        "#;
        let result = JsonLdExtractor.parse(&context_for(json_ld)).unwrap();

        assert_eq!(result.ingredients, vec!["200g flour", "milk"]);
    }

    #[test]
    fn test_strip_trailing_commas_leaves_strings_alone() {
        assert_eq!(
            strip_trailing_commas(r#"{"a": ["x, ]", "y",  ] , }"#),
            r#"{"a": ["x, ]", "y"  ]  }"#
        );
    }

    #[test]
    fn test_missing_ingredients_gives_empty_list() {
        let json_ld = r#"{"@type": "Recipe", "name": "Mystery Dish"}"#;
        let result = JsonLdExtractor.parse(&context_for(json_ld)).unwrap();

        assert_eq!(result.title, "Mystery Dish");
        assert!(result.ingredients.is_empty());
    }
}
