// ============================================================================
// cropper-core/src/registry.rs
// ============================================================================
//
// LOOKUP REGISTRY: Append-only named categories
//
// Queue rows reference three open-ended vocabularies: which local program
// queued the file, which remote source (network or studio) it came from and
// which release group produced it. Values are registered the first time they
// are seen and never removed.
//
// Each registry keeps a full in-memory copy of its table, loaded at startup.
// A cache miss submits one select-or-insert operation to the store lane, so
// concurrent registrations of the same new name converge on one row.

use crate::error::CoreResult;
use crate::store::Store;

use rusqlite::{Connection, OptionalExtension, named_params};
use serde::Serialize;
use std::sync::{Mutex, PoisonError};

/// The three lookup vocabularies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    LocalSource,
    RemoteSource,
    RemoteGroup,
}

impl Category {
    /// Backing table name.
    pub fn table(self) -> &'static str {
        match self {
            Category::LocalSource => "LocalSource",
            Category::RemoteSource => "RemoteSource",
            Category::RemoteGroup => "RemoteGroup",
        }
    }
}

/// One registered value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryValue {
    pub id: i64,
    pub name: String,
}

fn load_values(conn: &Connection, category: Category) -> rusqlite::Result<Vec<CategoryValue>> {
    let mut stmt = conn.prepare(&format!("SELECT id, name FROM {} ORDER BY id", category.table()))?;
    let rows = stmt.query_map([], |row| {
        Ok(CategoryValue {
            id: row.get(0)?,
            name: row.get(1)?,
        })
    })?;
    rows.collect()
}

/// Returns the row for `name`, inserting it first if needed.
pub(crate) fn select_or_insert(
    conn: &Connection,
    category: Category,
    name: &str,
) -> rusqlite::Result<CategoryValue> {
    let table = category.table();
    let existing: Option<i64> = conn
        .query_row(
            &format!("SELECT id FROM {table} WHERE name = :name"),
            named_params! { ":name": name },
            |row| row.get(0),
        )
        .optional()?;

    let id = match existing {
        Some(id) => id,
        None => {
            log::debug!("Registering new {} value '{}'", table, name);
            conn.query_row(
                &format!("INSERT INTO {table} (name) VALUES (:name) RETURNING id"),
                named_params! { ":name": name },
                |row| row.get(0),
            )?
        }
    };

    Ok(CategoryValue {
        id,
        name: name.to_string(),
    })
}

/// In-memory view of one category, backed by its table.
#[derive(Debug)]
pub struct CategoryRegistry {
    category: Category,
    store: Store,
    values: Mutex<Vec<CategoryValue>>,
}

impl CategoryRegistry {
    /// Loads every persisted value of `category`.
    pub async fn load(store: &Store, category: Category) -> CoreResult<Self> {
        let values = store.call(move |conn| load_values(conn, category)).await?;
        log::debug!("Loaded {} {} value(s)", values.len(), category.table());
        Ok(Self {
            category,
            store: store.clone(),
            values: Mutex::new(values),
        })
    }

    pub fn category(&self) -> Category {
        self.category
    }

    fn values(&self) -> std::sync::MutexGuard<'_, Vec<CategoryValue>> {
        self.values.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Cached value named `name`, if registered.
    pub fn resolve(&self, name: &str) -> Option<CategoryValue> {
        self.values().iter().find(|v| v.name == name).cloned()
    }

    /// Cached value with the given id.
    pub fn by_id(&self, id: i64) -> Option<CategoryValue> {
        self.values().iter().find(|v| v.id == id).cloned()
    }

    /// Every cached value, in id order.
    pub fn list(&self) -> Vec<CategoryValue> {
        self.values().clone()
    }

    /// Returns the value named `name`, registering it if it is new.
    pub async fn get_or_add(&self, name: &str) -> CoreResult<CategoryValue> {
        if let Some(value) = self.resolve(name) {
            return Ok(value);
        }

        let category = self.category;
        let owned = name.to_string();
        let value = self
            .store
            .call(move |conn| select_or_insert(conn, category, &owned))
            .await?;

        let mut values = self.values();
        if !values.iter().any(|v| v.id == value.id) {
            values.push(value.clone());
            values.sort_by_key(|v| v.id);
        }
        Ok(value)
    }
}

/// The three registries used by the queue.
#[derive(Debug)]
pub struct Vocabulary {
    pub local_source: CategoryRegistry,
    pub remote_source: CategoryRegistry,
    pub remote_group: CategoryRegistry,
}

impl Vocabulary {
    pub async fn load(store: &Store) -> CoreResult<Self> {
        Ok(Self {
            local_source: CategoryRegistry::load(store, Category::LocalSource).await?,
            remote_source: CategoryRegistry::load(store, Category::RemoteSource).await?,
            remote_group: CategoryRegistry::load(store, Category::RemoteGroup).await?,
        })
    }

    pub fn registry(&self, category: Category) -> &CategoryRegistry {
        match category {
            Category::LocalSource => &self.local_source,
            Category::RemoteSource => &self.remote_source,
            Category::RemoteGroup => &self.remote_group,
        }
    }

    /// Registers an optional value; `None` and blank names stay unset.
    pub async fn get_or_add_optional(
        &self,
        category: Category,
        name: Option<&str>,
    ) -> CoreResult<Option<CategoryValue>> {
        match name.map(str::trim).filter(|n| !n.is_empty()) {
            Some(name) => Ok(Some(self.registry(category).get_or_add(name).await?)),
            None => Ok(None),
        }
    }
}
