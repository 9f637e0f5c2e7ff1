use chrono::{Local, NaiveDate, Weekday};
use clap::{Parser, Subcommand};
use dinner_decider::cookbook::{sorted, SortKey};
use dinner_decider::derived::days_since_last_made;
use dinner_decider::picker::SpinFilters;
use dinner_decider::planner::day_name;
use dinner_decider::session::{
    current_meal, handle_import_url, handle_mark_made, handle_pick, handle_plan_autofill, handle_plan_set,
    handle_rate, handle_save, handle_shopping_list, handle_spin, handle_wipe,
};
use dinner_decider::{
    importer, Category, CsvSheetStore, MealDraft, MealRepository, MealTable, Notice,
    SessionState, Settings,
};
use log::debug;
use std::process;
use tabled::{
    settings::{object::Columns, Alignment, Modify, Style},
    Table, Tabled,
};

#[derive(Parser)]
#[command(
    name = "dinner-decider",
    version,
    about = "Decide what's for dinner from a shared household cookbook"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a meal to the cookbook
    Add {
        /// Meal name
        name: String,
        /// Category: quick, date-night, healthy, takeout (or the full label)
        #[arg(short, long, default_value = "quick")]
        category: Category,
        /// Ingredient line (repeat for each ingredient)
        #[arg(short, long = "ingredient")]
        ingredients: Vec<String>,
    },
    /// Pre-fill the draft meal from a recipe page or share link
    Import {
        /// Recipe URL
        url: String,
    },
    /// Show the draft meal
    Draft,
    /// Save the draft meal, optionally overriding its fields
    Save {
        #[arg(long)]
        name: Option<String>,
        #[arg(short, long)]
        category: Option<Category>,
    },
    /// Spin the wheel for tonight's dinner
    Spin {
        /// Only meals in this category
        #[arg(short, long)]
        category: Option<Category>,
        /// Only meals using at least one of these ingredients (repeatable)
        #[arg(short, long)]
        pantry: Vec<String>,
        /// Skip meals made within this many days
        #[arg(long, value_name = "DAYS")]
        not_made_within: Option<i64>,
    },
    /// Choose tonight's dinner by name
    Pick {
        name: String,
    },
    /// Rate a meal from 1 to 5
    Rate {
        name: String,
        score: u8,
    },
    /// Record that a meal was cooked today
    Made {
        name: String,
    },
    /// List the cookbook
    List {
        /// Sort by: name, category, rating, made, last-made
        #[arg(short, long, default_value = "name")]
        sort: SortKey,
        /// Sort in descending order
        #[arg(long)]
        desc: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Combined shopping list (defaults to this week's plan)
    Shop {
        /// Meal names to shop for
        meals: Vec<String>,
    },
    /// Weekly meal planner
    Plan {
        #[command(subcommand)]
        command: PlanCommands,
    },
    /// Delete every meal in the cookbook
    Wipe {
        /// Admin password
        #[arg(long)]
        password: String,
    },
}

#[derive(Subcommand)]
enum PlanCommands {
    /// Show the week
    Show,
    /// Fill all seven days at random
    Auto,
    /// Put a meal on a day, or clear the day when no meal is given
    Set {
        /// Day of the week (mon, tuesday, ...)
        day: Weekday,
        meal: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let settings = Settings::load()?;
    debug!("Using meal table at {}", settings.store.path.display());

    let store = CsvSheetStore::from_config(&settings.store);
    let mut state = SessionState::load(&settings.session_path)?;
    state.notice = None;
    let today = Local::now().date_naive();
    let mut rng = rand::rng();
    let mut show_pick = false;

    state = match cli.command {
        Commands::Add {
            name,
            category,
            ingredients,
        } => {
            state.draft = MealDraft {
                name,
                category,
                ingredients: ingredients.join("\n"),
            };
            handle_save(state, &store)
        }
        Commands::Import { url } => {
            let (resolver, extractor) = importer(&settings)?;
            let state = handle_import_url(state, &url, &resolver, &extractor).await;
            print_draft(&state.draft);
            state
        }
        Commands::Draft => {
            print_draft(&state.draft);
            state
        }
        Commands::Save { name, category } => {
            if let Some(name) = name {
                state.draft.name = name;
            }
            if let Some(category) = category {
                state.draft.category = category;
            }
            handle_save(state, &store)
        }
        Commands::Spin {
            category,
            pantry,
            not_made_within,
        } => {
            let filters = SpinFilters {
                category,
                pantry,
                not_made_within_days: not_made_within,
            };
            show_pick = true;
            handle_spin(state, &store, &filters, today, &mut rng)
        }
        Commands::Pick { name } => {
            show_pick = true;
            handle_pick(state, &store, &name)
        }
        Commands::Rate { name, score } => handle_rate(state, &store, &name, score),
        Commands::Made { name } => handle_mark_made(state, &store, &name, today),
        Commands::List { sort, desc, json } => {
            let table = store.get()?;
            if json {
                println!("{}", serde_json::to_string_pretty(table.meals())?);
            } else {
                print_meal_table(&table, sort, desc, today);
            }
            state
        }
        Commands::Shop { meals } => {
            let (state, list) = handle_shopping_list(state, &store, &meals);
            for item in &list {
                println!("- {item}");
            }
            state
        }
        Commands::Plan { command } => match command {
            PlanCommands::Show => {
                print_plan(&state);
                state
            }
            PlanCommands::Auto => {
                let state = handle_plan_autofill(state, &store, &mut rng);
                print_plan(&state);
                state
            }
            PlanCommands::Set { day, meal } => handle_plan_set(state, &store, day, meal.as_deref()),
        },
        Commands::Wipe { password } => {
            handle_wipe(state, &store, &password, settings.admin_password.as_deref())
        }
    };

    if let Some(notice) = &state.notice {
        match notice {
            Notice::Success(text) | Notice::Info(text) => println!("{text}"),
            Notice::Warning(text) => eprintln!("Warning: {text}"),
            Notice::Error(text) => eprintln!("Error: {text}"),
        }
    }
    if show_pick {
        print_pick(&state, &store);
    }
    state.save(&settings.session_path)?;
    Ok(())
}

fn print_draft(draft: &MealDraft) {
    println!("Name:     {}", draft.name);
    println!("Category: {}", draft.category);
    println!("Ingredients:");
    for line in draft.ingredient_lines() {
        println!("  - {line}");
    }
}

fn print_pick(state: &SessionState, store: &dyn MealRepository) {
    // A failed spin or pick leaves the previous choice in place
    if !matches!(state.notice, Some(Notice::Success(_) | Notice::Info(_))) {
        return;
    }
    let Some(meal) = current_meal(state, store) else {
        return;
    };
    println!("{} ({})", meal.name, meal.category);
    for line in &meal.ingredients {
        println!("  [ ] {line}");
    }
}

fn print_plan(state: &SessionState) {
    for (day, meal) in state.week_plan.days() {
        println!("{:<10} {}", day_name(day), meal.unwrap_or("-"));
    }
}

fn print_meal_table(table: &MealTable, sort: SortKey, descending: bool, today: NaiveDate) {
    #[derive(Tabled)]
    struct MealRow {
        #[tabled(rename = "Meal")]
        name: String,
        #[tabled(rename = "Category")]
        category: String,
        #[tabled(rename = "Rating")]
        rating: String,
        #[tabled(rename = "Made")]
        made: u32,
        #[tabled(rename = "Last made")]
        last_made: String,
        #[tabled(rename = "Ingredients")]
        ingredients: usize,
    }

    if table.is_empty() {
        println!("The cookbook is empty!");
        return;
    }

    let rows: Vec<MealRow> = sorted(table, sort, descending)
        .into_iter()
        .map(|meal| MealRow {
            name: meal.name.clone(),
            category: meal.category.to_string(),
            rating: meal.rating.map_or("-".into(), |r| {
                format!("{r:.2} ({})", meal.rating_count)
            }),
            made: meal.made_count,
            last_made: match days_since_last_made(table, &meal.name, today) {
                Some(0) => "today".to_string(),
                Some(days) => format!("{days} days ago"),
                None => "never".to_string(),
            },
            ingredients: meal.ingredients.len(),
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(2..4)).with(Alignment::right()))
        .to_string();
    println!("{table}");
}
