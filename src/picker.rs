//! "Spin the wheel": a random meal, optionally narrowed by category,
//! pantry contents and how recently it was cooked.

use crate::derived::days_since_last_made;
use crate::error::DeciderError;
use crate::model::{fold_case, Category, Meal, MealTable};
use chrono::NaiveDate;
use log::debug;
use rand::seq::IndexedRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpinFilters {
    pub category: Option<Category>,
    /// Keep meals whose ingredients mention at least one of these terms
    #[serde(default)]
    pub pantry: Vec<String>,
    /// Skip meals cooked fewer than this many days ago
    pub not_made_within_days: Option<i64>,
}

impl SpinFilters {
    fn pantry_terms(&self) -> Vec<String> {
        self.pantry
            .iter()
            .map(|term| fold_case(term))
            .filter(|term| !term.is_empty())
            .collect()
    }
}

fn uses_pantry(meal: &Meal, terms: &[String]) -> bool {
    meal.ingredients.iter().any(|line| {
        let line = fold_case(line);
        terms.iter().any(|term| line.contains(term.as_str()))
    })
}

/// Meals that pass every active filter, in table order
pub fn candidates<'a>(table: &'a MealTable, filters: &SpinFilters, today: NaiveDate) -> Vec<&'a Meal> {
    let terms = filters.pantry_terms();

    table
        .meals()
        .iter()
        .filter(|meal| filters.category.map_or(true, |c| meal.category == c))
        .filter(|meal| terms.is_empty() || uses_pantry(meal, &terms))
        .filter(|meal| match filters.not_made_within_days {
            Some(window) => days_since_last_made(table, &meal.name, today)
                .map_or(true, |days| days >= window),
            None => true,
        })
        .collect()
}

/// Pick one meal uniformly at random from those passing the filters
pub fn spin<'a, R: Rng + ?Sized>(
    table: &'a MealTable,
    filters: &SpinFilters,
    today: NaiveDate,
    rng: &mut R,
) -> Result<&'a Meal, DeciderError> {
    spin_avoiding(table, filters, today, None, rng)
}

/// Like [`spin`], but never lands on `avoid` twice in a row unless it is the only candidate
pub fn spin_avoiding<'a, R: Rng + ?Sized>(
    table: &'a MealTable,
    filters: &SpinFilters,
    today: NaiveDate,
    avoid: Option<&str>,
    rng: &mut R,
) -> Result<&'a Meal, DeciderError> {
    if table.is_empty() {
        return Err(DeciderError::EmptyCookbook);
    }

    let mut pool = candidates(table, filters, today);
    if let Some(avoid) = avoid {
        if pool.iter().any(|meal| meal.name != avoid) {
            pool.retain(|meal| meal.name != avoid);
        }
    }
    debug!("Spinning over {} of {} meals", pool.len(), table.len());
    pool.choose(rng).copied().ok_or(DeciderError::NoMatch)
}

/// Choose a meal by exact name instead of at random
pub fn pick<'a>(table: &'a MealTable, name: &str) -> Result<&'a Meal, DeciderError> {
    table
        .find(name)
        .ok_or_else(|| DeciderError::UnknownMeal(name.to_string()))
}
