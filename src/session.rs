//! Interaction handlers.
//!
//! Everything a front end remembers between interactions lives in
//! [`SessionState`]. Each handler takes the current state (plus the meal
//! store and whatever else it needs) and returns the next state, with a
//! [`Notice`] describing the outcome. Handlers never fail: errors become
//! notices and leave the stored table untouched.

use crate::cookbook::{add_meal, mark_made};
use crate::derived::{add_rating, build_shopping_list, rating};
use crate::error::DeciderError;
use crate::extractors::RecipeExtractor;
use crate::model::{Meal, MealDraft, Score};
use crate::picker::{pick, spin_avoiding, SpinFilters};
use crate::planner::{auto_fill_week, day_name, WeekPlan};
use crate::resolver::LinkResolver;
use crate::store::MealRepository;
use chrono::{NaiveDate, Weekday};
use log::{info, warn};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::Path;

/// Message shown after an interaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "level", content = "text", rename_all = "lowercase")]
pub enum Notice {
    Success(String),
    Info(String),
    Warning(String),
    Error(String),
}

impl Notice {
    pub fn text(&self) -> &str {
        match self {
            Notice::Success(t) | Notice::Info(t) | Notice::Warning(t) | Notice::Error(t) => t,
        }
    }
}

impl From<DeciderError> for Notice {
    fn from(err: DeciderError) -> Self {
        match err {
            DeciderError::EmptyCookbook
            | DeciderError::NoMatch
            | DeciderError::DuplicateName(_)
            | DeciderError::UnknownMeal(_) => Notice::Warning(err.to_string()),
            other => Notice::Error(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionState {
    /// The "add a meal" form
    pub draft: MealDraft,
    /// Meal currently shown as tonight's dinner
    pub current_pick: Option<String>,
    /// Result of the most recent spin
    pub last_spun: Option<String>,
    pub week_plan: WeekPlan,
    pub notice: Option<Notice>,
}

impl SessionState {
    fn with_notice(mut self, notice: impl Into<Notice>) -> Self {
        self.notice = Some(notice.into());
        self
    }

    pub fn load(path: &Path) -> Result<Self, DeciderError> {
        match fs::read_to_string(path) {
            Ok(text) => serde_json::from_str(&text).map_err(|e| DeciderError::Session(e.to_string())),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(DeciderError::Session(e.to_string())),
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), DeciderError> {
        let json =
            serde_json::to_string_pretty(self).map_err(|e| DeciderError::Session(e.to_string()))?;
        fs::write(path, json).map_err(|e| DeciderError::Session(e.to_string()))
    }
}

/// Fill the draft's name and ingredients from a recipe URL.
///
/// Short links are unwrapped first. When nothing can be extracted the draft
/// is left exactly as it was.
pub async fn handle_import_url(
    state: SessionState,
    url: &str,
    resolver: &LinkResolver,
    extractor: &RecipeExtractor,
) -> SessionState {
    let target = resolver.resolve_url(url.trim()).await;

    match extractor.extract(&target).await {
        Ok(recipe) => {
            let mut state = state;
            state.draft.name = recipe.title.clone();
            state.draft.ingredients = recipe.ingredients.join("\n");
            state.with_notice(Notice::Success(format!(
                "Found \"{}\" with {} ingredients.",
                recipe.title,
                recipe.ingredients.len()
            )))
        }
        Err(e) => {
            let hint = if e.is_network() {
                " (the page could not be reached)"
            } else {
                ""
            };
            state.with_notice(Notice::Error(format!(
                "Could not extract details automatically{hint}."
            )))
        }
    }
}

/// Save the draft as a new meal. On success the form is cleared.
pub fn handle_save(state: SessionState, repo: &dyn MealRepository) -> SessionState {
    let saved = repo
        .get()
        .map_err(DeciderError::from)
        .and_then(|table| add_meal(&table, &state.draft))
        .and_then(|table| repo.replace(&table).map_err(DeciderError::from));

    match saved {
        Ok(()) => {
            let name = state.draft.name.trim().to_string();
            let mut state = state;
            state.draft = MealDraft::default();
            state.with_notice(Notice::Success(format!("Added {name}!")))
        }
        Err(e) => state.with_notice(e),
    }
}

/// Spin the wheel, avoiding an immediate repeat of the previous spin
pub fn handle_spin<R: Rng + ?Sized>(
    state: SessionState,
    repo: &dyn MealRepository,
    filters: &SpinFilters,
    today: NaiveDate,
    rng: &mut R,
) -> SessionState {
    let table = match repo.get() {
        Ok(table) => table,
        Err(e) => return state.with_notice(DeciderError::from(e)),
    };

    let chosen = spin_avoiding(&table, filters, today, state.last_spun.as_deref(), rng)
        .map(|meal| meal.name.clone());
    match chosen {
        Ok(name) => {
            info!("Spun {}", name);
            let mut state = state;
            state.current_pick = Some(name.clone());
            state.last_spun = Some(name.clone());
            state.with_notice(Notice::Success(format!("You are having: {name}")))
        }
        Err(e) => state.with_notice(e),
    }
}

/// Choose tonight's meal by hand
pub fn handle_pick(state: SessionState, repo: &dyn MealRepository, name: &str) -> SessionState {
    let chosen = repo
        .get()
        .map_err(DeciderError::from)
        .and_then(|table| pick(&table, name).map(|meal| meal.name.clone()));

    match chosen {
        Ok(name) => {
            let mut state = state;
            state.current_pick = Some(name.clone());
            state.with_notice(Notice::Info(format!("You are having: {name}")))
        }
        Err(e) => state.with_notice(e),
    }
}

/// Full row for tonight's pick, so its category and ingredients can be shown.
///
/// `None` when nothing is picked or the meal has since left the table.
pub fn current_meal(state: &SessionState, repo: &dyn MealRepository) -> Option<Meal> {
    let name = state.current_pick.as_deref()?;
    match repo.get() {
        Ok(table) => table.find(name).cloned(),
        Err(e) => {
            warn!("Could not load {} from the meal table: {}", name, e);
            None
        }
    }
}

/// Record a 1-5 rating for a meal
pub fn handle_rate(
    state: SessionState,
    repo: &dyn MealRepository,
    name: &str,
    value: u8,
) -> SessionState {
    let rated = Score::try_from(value).and_then(|score| {
        let table = repo.get()?;
        if table.find(name).is_none() {
            return Err(DeciderError::UnknownMeal(name.to_string()));
        }
        let table = add_rating(table, name, score);
        repo.replace(&table)?;
        Ok(rating(&table, name))
    });

    match rated {
        Ok((average, count)) => {
            let plural = if count == 1 { "" } else { "s" };
            state.with_notice(Notice::Success(format!(
                "{name} now averages {average:.2} from {count} rating{plural}."
            )))
        }
        Err(e) => state.with_notice(e),
    }
}

/// Count a cook of the meal, dated `today`
pub fn handle_mark_made(
    state: SessionState,
    repo: &dyn MealRepository,
    name: &str,
    today: NaiveDate,
) -> SessionState {
    let made = repo.get().map_err(DeciderError::from).and_then(|table| {
        if table.find(name).is_none() {
            return Err(DeciderError::UnknownMeal(name.to_string()));
        }
        let table = mark_made(table, name, today);
        repo.replace(&table)?;
        Ok(table.find(name).map_or(0, |meal| meal.made_count))
    });

    match made {
        Ok(count) => state.with_notice(Notice::Success(format!(
            "Marked {name} as made ({count} so far)."
        ))),
        Err(e) => state.with_notice(e),
    }
}

/// Combined shopping list for the chosen meals, or for the week plan when none are chosen
pub fn handle_shopping_list(
    state: SessionState,
    repo: &dyn MealRepository,
    names: &[String],
) -> (SessionState, Vec<String>) {
    let table = match repo.get() {
        Ok(table) => table,
        Err(e) => return (state.with_notice(DeciderError::from(e)), Vec::new()),
    };

    let list = if names.is_empty() {
        build_shopping_list(&table, &state.week_plan.meal_names())
    } else {
        build_shopping_list(&table, names)
    };

    if list.is_empty() {
        return (state.with_notice(Notice::Info("Nothing to buy.".to_string())), list);
    }
    (state, list)
}

/// Fill all seven planner days from the cookbook
pub fn handle_plan_autofill<R: Rng + ?Sized>(
    state: SessionState,
    repo: &dyn MealRepository,
    rng: &mut R,
) -> SessionState {
    let plan = repo
        .get()
        .map_err(DeciderError::from)
        .and_then(|table| auto_fill_week(&table, rng));

    match plan {
        Ok(plan) => {
            let mut state = state;
            state.week_plan = plan;
            state.with_notice(Notice::Success("Week planned!".to_string()))
        }
        Err(e) => state.with_notice(e),
    }
}

/// Put a meal on one planner day, or clear the day with `None`
pub fn handle_plan_set(
    state: SessionState,
    repo: &dyn MealRepository,
    day: Weekday,
    meal: Option<&str>,
) -> SessionState {
    let Some(name) = meal else {
        let mut state = state;
        state.week_plan.set(day, None);
        return state.with_notice(Notice::Info(format!("{} is a day off.", day_name(day))));
    };

    let chosen = repo
        .get()
        .map_err(DeciderError::from)
        .and_then(|table| pick(&table, name).map(|m| m.name.clone()));

    match chosen {
        Ok(name) => {
            let mut state = state;
            state.week_plan.set(day, Some(name.clone()));
            state.with_notice(Notice::Info(format!("{}: {name}", day_name(day))))
        }
        Err(e) => state.with_notice(e),
    }
}

/// Delete every meal, if the password matches the configured admin secret.
///
/// With no secret configured the action is unavailable.
pub fn handle_wipe(
    state: SessionState,
    repo: &dyn MealRepository,
    password: &str,
    admin_password: Option<&str>,
) -> SessionState {
    let Some(secret) = admin_password.filter(|s| !s.is_empty()) else {
        return state.with_notice(DeciderError::WipeDisabled);
    };
    if password != secret {
        warn!("Rejected wipe attempt with wrong password");
        return state.with_notice(DeciderError::WipeDenied);
    }

    match repo.replace(&Default::default()) {
        Ok(()) => {
            warn!("Meal table wiped");
            let mut state = state;
            state.current_pick = None;
            state.last_spun = None;
            state.week_plan = WeekPlan::default();
            state.with_notice(Notice::Success("All recipes wiped.".to_string()))
        }
        Err(e) => state.with_notice(DeciderError::from(e)),
    }
}
