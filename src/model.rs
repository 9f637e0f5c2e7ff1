use crate::error::DeciderError;
use chrono::NaiveDate;
use log::warn;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// The fixed set of meal categories
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum Category {
    #[default]
    #[serde(rename = "Quick & Easy")]
    QuickAndEasy,
    #[serde(rename = "Date Night")]
    DateNight,
    #[serde(rename = "Healthy")]
    Healthy,
    #[serde(rename = "Takeout Shortcut")]
    TakeoutShortcut,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::QuickAndEasy,
        Category::DateNight,
        Category::Healthy,
        Category::TakeoutShortcut,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Category::QuickAndEasy => "Quick & Easy",
            Category::DateNight => "Date Night",
            Category::Healthy => "Healthy",
            Category::TakeoutShortcut => "Takeout Shortcut",
        }
    }

    fn alias(&self) -> &'static str {
        match self {
            Category::QuickAndEasy => "quick",
            Category::DateNight => "date-night",
            Category::Healthy => "healthy",
            Category::TakeoutShortcut => "takeout",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Category::ALL
            .into_iter()
            .find(|c| c.label().eq_ignore_ascii_case(wanted) || c.alias().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| {
                let known: Vec<&str> = Category::ALL.iter().map(Category::alias).collect();
                format!("unknown category '{wanted}' (expected one of: {})", known.join(", "))
            })
    }
}

/// A whole-number rating from 1 to 5
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Score(u8);

impl Score {
    pub fn value(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Score {
    type Error = DeciderError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        if (1..=5).contains(&value) {
            Ok(Score(value))
        } else {
            Err(DeciderError::InvalidScore(value))
        }
    }
}

/// One row of the shared meal table.
///
/// Column names match the shared sheet. Numeric and date cells are read
/// leniently: blank or unreadable cells become `None` / `0` instead of
/// failing the whole table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meal {
    #[serde(rename = "Meal")]
    pub name: String,
    #[serde(rename = "Category", default, deserialize_with = "category_or_default")]
    pub category: Category,
    #[serde(rename = "Ingredients", with = "ingredient_lines", default)]
    pub ingredients: Vec<String>,
    #[serde(rename = "Rating", default, deserialize_with = "csv::invalid_option")]
    pub rating: Option<f64>,
    #[serde(rename = "RatingCount", default, deserialize_with = "count_or_zero")]
    pub rating_count: u32,
    #[serde(rename = "MadeCount", default, deserialize_with = "count_or_zero")]
    pub made_count: u32,
    #[serde(rename = "LastMade", default, deserialize_with = "csv::invalid_option")]
    pub last_made: Option<NaiveDate>,
}

impl Meal {
    pub fn new(name: impl Into<String>, category: Category, ingredients: Vec<String>) -> Self {
        Meal {
            name: name.into(),
            category,
            ingredients,
            rating: None,
            rating_count: 0,
            made_count: 0,
            last_made: None,
        }
    }
}

// Rows typed into the sheet by hand may carry a blank or misspelt category.
fn category_or_default<'de, D>(de: D) -> Result<Category, D::Error>
where
    D: Deserializer<'de>,
{
    let cell = Option::<String>::deserialize(de)?.unwrap_or_default();
    match cell.parse::<Category>() {
        Ok(category) => Ok(category),
        Err(_) => {
            warn!(
                "Unrecognised category '{}', filing under {}",
                cell.trim(),
                Category::default()
            );
            Ok(Category::default())
        }
    }
}

// Sheets round-trip integer columns containing blanks as floats ("2.0").
fn count_or_zero<'de, D>(de: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let count: Option<f64> = csv::invalid_option(de)?;
    Ok(count
        .filter(|n| n.is_finite() && *n > 0.0)
        .map_or(0, |n| n.round() as u32))
}

/// Ingredients live in a single cell, one per line.
mod ingredient_lines {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(lines: &[String], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&lines.join("\n"))
    }

    pub fn deserialize<'de, D>(de: D) -> Result<Vec<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let cell = Option::<String>::deserialize(de)?;
        Ok(cell.as_deref().map(super::split_lines).unwrap_or_default())
    }
}

/// Split multi-line text into trimmed, non-blank lines.
pub fn split_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect()
}

/// Key used for every case-insensitive comparison of names and ingredient lines.
pub(crate) fn fold_case(text: &str) -> String {
    text.trim().to_lowercase()
}

/// A full snapshot of the meal table, in sheet order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MealTable {
    meals: Vec<Meal>,
}

impl MealTable {
    pub fn new(meals: Vec<Meal>) -> Self {
        MealTable { meals }
    }

    pub fn meals(&self) -> &[Meal] {
        &self.meals
    }

    pub fn into_meals(self) -> Vec<Meal> {
        self.meals
    }

    pub fn len(&self) -> usize {
        self.meals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.meals.is_empty()
    }

    /// Exact-name lookup
    pub fn find(&self, name: &str) -> Option<&Meal> {
        self.meals.iter().find(|m| m.name == name)
    }

    pub(crate) fn find_mut(&mut self, name: &str) -> Option<&mut Meal> {
        self.meals.iter_mut().find(|m| m.name == name)
    }

    /// Case-insensitive lookup used for duplicate detection
    pub fn find_ignore_case(&self, name: &str) -> Option<&Meal> {
        let key = fold_case(name);
        self.meals.iter().find(|m| fold_case(&m.name) == key)
    }

    pub(crate) fn push(&mut self, meal: Meal) {
        self.meals.push(meal);
    }
}

impl FromIterator<Meal> for MealTable {
    fn from_iter<I: IntoIterator<Item = Meal>>(iter: I) -> Self {
        MealTable::new(iter.into_iter().collect())
    }
}

/// Values typed into the "add a meal" form, before they are saved
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealDraft {
    pub name: String,
    pub category: Category,
    /// Raw multi-line text, one ingredient per line
    pub ingredients: String,
}

impl Default for MealDraft {
    fn default() -> Self {
        MealDraft {
            name: String::new(),
            category: Category::QuickAndEasy,
            ingredients: String::new(),
        }
    }
}

impl MealDraft {
    pub fn ingredient_lines(&self) -> Vec<String> {
        split_lines(&self.ingredients)
    }
}
