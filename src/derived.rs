//! Values computed from the meal table for display: rating aggregates,
//! recency and the combined shopping list.

use crate::model::{fold_case, MealTable, Score};
use chrono::NaiveDate;
use log::debug;
use std::collections::HashSet;

/// `(average, count)` for a meal; `(0.0, 0)` when unrated or unknown
pub fn rating(table: &MealTable, name: &str) -> (f64, u32) {
    table
        .find(name)
        .map(|meal| (meal.rating.unwrap_or(0.0), meal.rating_count))
        .unwrap_or((0.0, 0))
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Fold one more score into a meal's running average.
///
/// The table is returned unchanged when no meal has this name.
pub fn add_rating(mut table: MealTable, name: &str, score: Score) -> MealTable {
    let Some(meal) = table.find_mut(name) else {
        debug!("Ignoring rating for unknown meal '{}'", name);
        return table;
    };

    let old_average = meal.rating.unwrap_or(0.0);
    let old_count = meal.rating_count;
    let total = old_average * f64::from(old_count) + f64::from(score.value());

    let new_count = old_count.saturating_add(1);
    meal.rating = Some(round2(total / f64::from(new_count)));
    meal.rating_count = new_count;
    table
}

/// Whole days between `today` and the meal's last cook date.
///
/// `None` if the meal is unknown or was never made. Dates in the future count as 0.
pub fn days_since_last_made(table: &MealTable, name: &str, today: NaiveDate) -> Option<i64> {
    let last_made = table.find(name)?.last_made?;
    Some((today - last_made).num_days().max(0))
}

/// Merge the ingredient lines of the named meals.
///
/// Unknown names are skipped. Lines equal ignoring case collapse into the
/// first one seen; the result is sorted for stable display. "2 eggs" and
/// "eggs" stay separate entries.
pub fn build_shopping_list<S: AsRef<str>>(table: &MealTable, names: &[S]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut items: Vec<String> = names
        .iter()
        .filter_map(|name| table.find(name.as_ref()))
        .flat_map(|meal| meal.ingredients.iter())
        .map(|line| line.trim())
        .filter(|line| !line.is_empty())
        .filter(|line| seen.insert(fold_case(line)))
        .map(String::from)
        .collect();

    items.sort();
    items
}
