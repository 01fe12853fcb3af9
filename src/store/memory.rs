use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::RwLock;

use super::{Item, RecordStore, ScanFilter, StoreError, Table};

/// Fixture layout accepted by [`InMemoryStore::from_seed_file`].
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SeedData {
    pub business_profiles: Vec<Item>,
    pub user_profiles: Vec<Item>,
    pub albums: Vec<Item>,
    pub reviews: Vec<Item>,
}

/// Process-local store used for tests and for running without AWS.
///
/// Records are kept in insertion order, so scans are deterministic here even
/// though they are not against DynamoDB.
#[derive(Default)]
pub struct InMemoryStore {
    tables: RwLock<HashMap<Table, Vec<Item>>>,
    gets: [AtomicUsize; 4],
    scans: [AtomicUsize; 4],
}

fn slot(table: Table) -> usize {
    match table {
        Table::BusinessProfile => 0,
        Table::UserProfile => 1,
        Table::Album => 2,
        Table::Reviews => 3,
    }
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_seed(seed: SeedData) -> Self {
        Self::new()
            .with_items(Table::BusinessProfile, seed.business_profiles)
            .with_items(Table::UserProfile, seed.user_profiles)
            .with_items(Table::Album, seed.albums)
            .with_items(Table::Reviews, seed.reviews)
    }

    pub async fn from_seed_file(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let raw = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| StoreError::Seed(format!("{}: {e}", path.display())))?;
        let seed: SeedData = serde_json::from_str(&raw)
            .map_err(|e| StoreError::Seed(format!("{}: {e}", path.display())))?;

        log::info!(
            "Seeding in-memory store from {}: {} business profiles, {} user profiles, {} album images, {} reviews",
            path.display(),
            seed.business_profiles.len(),
            seed.user_profiles.len(),
            seed.albums.len(),
            seed.reviews.len()
        );
        Ok(Self::from_seed(seed))
    }

    /// Builder-style bulk insert used while wiring a fresh store.
    pub fn with_items(mut self, table: Table, items: Vec<Item>) -> Self {
        self.tables.get_mut().entry(table).or_default().extend(items);
        self
    }

    pub async fn insert(&self, table: Table, item: Item) {
        self.tables.write().await.entry(table).or_default().push(item);
    }

    pub fn get_count(&self, table: Table) -> usize {
        self.gets[slot(table)].load(Ordering::Relaxed)
    }

    pub fn scan_count(&self, table: Table) -> usize {
        self.scans[slot(table)].load(Ordering::Relaxed)
    }
}

#[async_trait]
impl RecordStore for InMemoryStore {
    async fn get_item(&self, table: Table, id: &str) -> Result<Option<Item>, StoreError> {
        log::debug!("get_item {table} id={id}");
        self.gets[slot(table)].fetch_add(1, Ordering::Relaxed);

        let tables = self.tables.read().await;
        let found = tables.get(&table).and_then(|items| {
            items
                .iter()
                .find(|item| item.get("id").and_then(|v| v.as_str()) == Some(id))
                .cloned()
        });
        Ok(found)
    }

    async fn scan(&self, table: Table, filter: &ScanFilter) -> Result<Vec<Item>, StoreError> {
        log::debug!("scan {table} filter={filter}");
        self.scans[slot(table)].fetch_add(1, Ordering::Relaxed);

        let tables = self.tables.read().await;
        let matched = tables
            .get(&table)
            .map(|items| {
                items
                    .iter()
                    .filter(|item| filter.matches(item))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        Ok(matched)
    }
}
