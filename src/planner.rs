use crate::error::DeciderError;
use crate::model::MealTable;
use chrono::Weekday;
use rand::seq::IndexedRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

pub const WEEK: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

pub fn day_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

/// Dinner for each day of the week, Monday first. `None` is a day off.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeekPlan {
    slots: [Option<String>; 7],
}

impl WeekPlan {
    pub fn get(&self, day: Weekday) -> Option<&str> {
        self.slots[day.num_days_from_monday() as usize].as_deref()
    }

    pub fn set(&mut self, day: Weekday, meal: Option<String>) {
        self.slots[day.num_days_from_monday() as usize] = meal;
    }

    /// `(day, meal)` pairs in week order
    pub fn days(&self) -> impl Iterator<Item = (Weekday, Option<&str>)> + '_ {
        WEEK.iter().map(move |day| (*day, self.get(*day)))
    }

    /// Planned meals in week order, skipping days off
    pub fn meal_names(&self) -> Vec<&str> {
        self.slots.iter().flatten().map(String::as_str).collect()
    }

    pub fn is_complete(&self) -> bool {
        self.slots.iter().all(Option::is_some)
    }
}

/// Fill all seven days from the meal pool.
///
/// With seven or more distinct meals, seven are drawn at random without
/// repeats. Smaller pools are cycled in table order so no day is left empty.
pub fn auto_fill_week<R: Rng + ?Sized>(table: &MealTable, rng: &mut R) -> Result<WeekPlan, DeciderError> {
    let mut seen = HashSet::new();
    let pool: Vec<&str> = table
        .meals()
        .iter()
        .map(|meal| meal.name.as_str())
        .filter(|name| seen.insert(*name))
        .collect();

    if pool.is_empty() {
        return Err(DeciderError::EmptyCookbook);
    }

    let picks: Vec<&str> = if pool.len() < WEEK.len() {
        pool.iter().cycle().take(WEEK.len()).copied().collect()
    } else {
        pool.choose_multiple(rng, WEEK.len()).copied().collect()
    };

    let mut plan = WeekPlan::default();
    for (day, name) in WEEK.iter().zip(picks) {
        plan.set(*day, Some(name.to_string()));
    }
    Ok(plan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Category, Meal};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn table_of(names: &[&str]) -> MealTable {
        names
            .iter()
            .map(|n| Meal::new(*n, Category::QuickAndEasy, vec![]))
            .collect()
    }

    #[test]
    fn test_small_pool_cycles_in_order() {
        let mut rng = StdRng::seed_from_u64(3);
        let plan = auto_fill_week(&table_of(&["Tacos", "Curry", "Soup"]), &mut rng).unwrap();

        assert!(plan.is_complete());
        assert_eq!(
            plan.meal_names(),
            vec!["Tacos", "Curry", "Soup", "Tacos", "Curry", "Soup", "Tacos"]
        );
        assert_eq!(plan.get(Weekday::Sun), Some("Tacos"));
    }

    #[test]
    fn test_large_pool_draws_distinct_meals() {
        let names = ["a", "b", "c", "d", "e", "f", "g", "h", "i", "j"];
        let table = table_of(&names);

        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            let plan = auto_fill_week(&table, &mut rng).unwrap();
            let picked = plan.meal_names();
            let distinct: HashSet<&str> = picked.iter().copied().collect();

            assert_eq!(picked.len(), 7);
            assert_eq!(distinct.len(), 7);
            assert!(picked.iter().all(|p| names.contains(p)));
        }
    }

    #[test]
    fn test_duplicate_rows_count_once() {
        let mut rng = StdRng::seed_from_u64(9);
        let table = table_of(&["Soup", "Soup", "Soup", "Soup", "Soup", "Soup", "Stew"]);
        let plan = auto_fill_week(&table, &mut rng).unwrap();

        assert_eq!(
            plan.meal_names(),
            vec!["Soup", "Stew", "Soup", "Stew", "Soup", "Stew", "Soup"]
        );
    }

    #[test]
    fn test_empty_table() {
        let mut rng = StdRng::seed_from_u64(0);
        assert!(matches!(
            auto_fill_week(&MealTable::default(), &mut rng),
            Err(DeciderError::EmptyCookbook)
        ));
    }

    #[test]
    fn test_manual_slots() {
        let mut plan = WeekPlan::default();
        plan.set(Weekday::Wed, Some("Pasta".to_string()));

        assert_eq!(plan.get(Weekday::Wed), Some("Pasta"));
        assert_eq!(plan.get(Weekday::Mon), None);
        assert!(!plan.is_complete());
        assert_eq!(plan.days().count(), 7);
        assert_eq!(day_name(Weekday::Sat), "Saturday");
    }
}
