//! Record lifecycle on the meal table: validated inserts, "mark as made",
//! and the sortable table view.

use crate::error::DeciderError;
use crate::model::{fold_case, Meal, MealDraft, MealTable};
use chrono::NaiveDate;
use log::{debug, info};
use std::cmp::Ordering;
use std::str::FromStr;

/// A copy of the table with a new meal built from the form draft appended.
///
/// Rejected when the name is blank or matches an existing meal ignoring case.
pub fn add_meal(table: &MealTable, draft: &MealDraft) -> Result<MealTable, DeciderError> {
    let name = draft.name.trim();
    if name.is_empty() {
        return Err(DeciderError::EmptyName);
    }
    if let Some(existing) = table.find_ignore_case(name) {
        return Err(DeciderError::DuplicateName(existing.name.clone()));
    }

    let mut table = table.clone();
    table.push(Meal::new(name, draft.category, draft.ingredient_lines()));
    info!("Added {} ({})", name, draft.category);
    Ok(table)
}

/// Count another cook of this meal and stamp `today` as its last date.
///
/// Unknown names leave the table unchanged.
pub fn mark_made(mut table: MealTable, name: &str, today: NaiveDate) -> MealTable {
    match table.find_mut(name) {
        Some(meal) => {
            meal.made_count = meal.made_count.saturating_add(1);
            meal.last_made = Some(today);
        }
        None => debug!("Ignoring 'made' for unknown meal '{}'", name),
    }
    table
}

/// Column the cookbook view is ordered by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    #[default]
    Name,
    Category,
    Rating,
    MadeCount,
    LastMade,
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "name" | "meal" => Ok(SortKey::Name),
            "category" => Ok(SortKey::Category),
            "rating" => Ok(SortKey::Rating),
            "made" | "made-count" | "times-made" => Ok(SortKey::MadeCount),
            "last-made" | "recent" => Ok(SortKey::LastMade),
            other => Err(format!(
                "unknown sort column '{other}' (expected name, category, rating, made, last-made)"
            )),
        }
    }
}

fn compare(a: &Meal, b: &Meal, key: SortKey) -> Ordering {
    let by_name = || fold_case(&a.name).cmp(&fold_case(&b.name));
    match key {
        SortKey::Name => by_name(),
        SortKey::Category => a.category.cmp(&b.category).then_with(by_name),
        SortKey::Rating => a
            .rating
            .unwrap_or(0.0)
            .total_cmp(&b.rating.unwrap_or(0.0))
            .then_with(by_name),
        SortKey::MadeCount => a.made_count.cmp(&b.made_count).then_with(by_name),
        // Never-made meals sort before any date
        SortKey::LastMade => a.last_made.cmp(&b.last_made).then_with(by_name),
    }
}

/// The table's rows ordered for display
pub fn sorted(table: &MealTable, key: SortKey, descending: bool) -> Vec<&Meal> {
    let mut rows: Vec<&Meal> = table.meals().iter().collect();
    rows.sort_by(|a, b| {
        let ord = compare(a, b, key);
        if descending {
            ord.reverse()
        } else {
            ord
        }
    });
    rows
}
