//! Persistence of the shared meal table.
//!
//! The table is always read and written whole. There is no locking or
//! versioning: if two sessions read, modify and write concurrently, the later
//! write silently replaces the earlier one. Callers that need more must add
//! optimistic versioning on top.

use crate::config::StoreConfig;
use crate::error::StoreError;
use crate::model::{Meal, MealTable};
use log::{debug, info};
use std::cell::RefCell;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Column order of the shared sheet
const HEADERS: [&str; 7] = [
    "Meal",
    "Category",
    "Ingredients",
    "Rating",
    "RatingCount",
    "MadeCount",
    "LastMade",
];

pub trait MealRepository {
    /// A snapshot of the whole table (possibly served from a short-lived cache)
    fn get(&self) -> Result<MealTable, StoreError>;

    /// Overwrite the whole table. Later reads observe the new contents.
    fn replace(&self, table: &MealTable) -> Result<(), StoreError>;

    /// Drop any cached snapshot so the next `get` goes to the backing store
    fn invalidate(&self) {}
}

struct CachedTable {
    table: MealTable,
    read_at: Instant,
}

/// A CSV file with the shared sheet's columns, one meal per row
pub struct CsvSheetStore {
    path: PathBuf,
    ttl: Duration,
    cache: RefCell<Option<CachedTable>>,
}

impl CsvSheetStore {
    pub fn new(path: impl Into<PathBuf>, ttl: Duration) -> Self {
        Self {
            path: path.into(),
            ttl,
            cache: RefCell::new(None),
        }
    }

    pub fn from_config(config: &StoreConfig) -> Self {
        Self::new(config.path.clone(), config.cache_ttl())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_file(&self) -> Result<MealTable, StoreError> {
        let file = match fs::File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("{} does not exist yet; starting empty", self.path.display());
                return Ok(MealTable::default());
            }
            Err(e) => return Err(e.into()),
        };

        let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(file);
        let meals = reader
            .deserialize::<Meal>()
            .collect::<Result<Vec<_>, _>>()?;
        debug!("Read {} meals from {}", meals.len(), self.path.display());
        Ok(MealTable::new(meals))
    }
}

impl MealRepository for CsvSheetStore {
    fn get(&self) -> Result<MealTable, StoreError> {
        if let Some(cached) = self.cache.borrow().as_ref() {
            if cached.read_at.elapsed() < self.ttl {
                return Ok(cached.table.clone());
            }
        }

        let table = self.read_file()?;
        *self.cache.borrow_mut() = Some(CachedTable {
            table: table.clone(),
            read_at: Instant::now(),
        });
        Ok(table)
    }

    fn replace(&self, table: &MealTable) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        // Write beside the target and rename so readers never see half a table
        let tmp = self.path.with_extension("csv.tmp");
        {
            let mut writer = csv::WriterBuilder::new()
                .has_headers(false)
                .from_path(&tmp)?;
            writer.write_record(HEADERS)?;
            for meal in table.meals() {
                writer.serialize(meal)?;
            }
            writer.flush()?;
        }
        fs::rename(&tmp, &self.path)?;

        self.invalidate();
        info!("Saved {} meals to {}", table.len(), self.path.display());
        Ok(())
    }

    fn invalidate(&self) {
        self.cache.borrow_mut().take();
    }
}

/// Table kept in memory; used by tests and dry runs
#[derive(Default)]
pub struct MemoryStore {
    table: RefCell<MealTable>,
}

impl MemoryStore {
    pub fn new(table: MealTable) -> Self {
        Self {
            table: RefCell::new(table),
        }
    }
}

impl MealRepository for MemoryStore {
    fn get(&self) -> Result<MealTable, StoreError> {
        Ok(self.table.borrow().clone())
    }

    fn replace(&self, table: &MealTable) -> Result<(), StoreError> {
        *self.table.borrow_mut() = table.clone();
        Ok(())
    }
}
