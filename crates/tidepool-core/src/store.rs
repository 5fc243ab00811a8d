//! Catalog persistence capability and its in-memory reference implementation.
//!
//! A [`CatalogStore`] maps names to entities with create-if-absent semantics
//! per namespace:
//!
//! | Entity | Key |
//! |---|---|
//! | Storage, Metastore, Provider, Share | name |
//! | `InternalTable` | (provider, name) |
//! | Schema | (share, name) |
//! | `SharedTable` | (share, schema, name) |
//!
//! Inserts of child entities fail with [`Error::ResourceNotFound`] when the
//! parent is absent, checked atomically with the insert. Lists return
//! point-in-time snapshots in insertion order.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::model::{InternalTable, Metastore, Provider, Schema, Share, SharedTable, Storage};

/// Persistent storage of catalog entities.
#[async_trait]
pub trait CatalogStore: Send + Sync + 'static {
    /// Registers a storage.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AlreadyExists`] if the name is taken.
    async fn insert_storage(&self, storage: Storage) -> Result<Storage>;

    /// Looks up a storage by name.
    async fn get_storage(&self, name: &str) -> Result<Option<Storage>>;

    /// Registers a metastore.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AlreadyExists`] if the name is taken.
    async fn insert_metastore(&self, metastore: Metastore) -> Result<Metastore>;

    /// Looks up a metastore by name.
    async fn get_metastore(&self, name: &str) -> Result<Option<Metastore>>;

    /// Registers a provider.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ResourceNotFound`] if the referenced storage or
    /// metastore is missing, and [`Error::AlreadyExists`] if the name is taken.
    async fn insert_provider(&self, provider: Provider) -> Result<Provider>;

    /// Looks up a provider by name.
    async fn get_provider(&self, name: &str) -> Result<Option<Provider>>;

    /// Registers a table under its provider.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ResourceNotFound`] if the provider is missing, and
    /// [`Error::AlreadyExists`] if the provider already has a table of that name.
    async fn insert_table(&self, table: InternalTable) -> Result<InternalTable>;

    /// Looks up a table inside a provider.
    async fn get_table(&self, provider: &str, name: &str) -> Result<Option<InternalTable>>;

    /// Registers a share.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AlreadyExists`] if the name is taken.
    async fn insert_share(&self, share: Share) -> Result<Share>;

    /// Looks up a share by name.
    async fn get_share(&self, name: &str) -> Result<Option<Share>>;

    /// Lists every share.
    async fn list_shares(&self) -> Result<Vec<Share>>;

    /// Registers a schema inside its share.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ResourceNotFound`] if the share is missing, and
    /// [`Error::AlreadyExists`] if the share already has that schema.
    async fn insert_schema(&self, schema: Schema) -> Result<Schema>;

    /// Lists the schemas of a share, or `None` if the share does not exist.
    async fn list_schemas(&self, share: &str) -> Result<Option<Vec<Schema>>>;

    /// Registers a shared table inside its schema.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ResourceNotFound`] if the share or schema is missing,
    /// and [`Error::AlreadyExists`] if the schema already has that table.
    async fn insert_shared_table(&self, table: SharedTable) -> Result<SharedTable>;

    /// Lists the tables of one schema, or `None` if the share or schema does not exist.
    async fn list_shared_tables(
        &self,
        share: &str,
        schema: &str,
    ) -> Result<Option<Vec<SharedTable>>>;

    /// Lists the tables of every schema in a share, or `None` if the share does not exist.
    async fn list_shared_tables_of_share(&self, share: &str) -> Result<Option<Vec<SharedTable>>>;

    /// Resolves a shared table through its share and schema.
    async fn get_shared_table(
        &self,
        share: &str,
        schema: &str,
        name: &str,
    ) -> Result<Option<SharedTable>>;
}

/// Insertion-ordered map with unique keys.
#[derive(Debug)]
struct Namespace<K, V> {
    entries: Vec<V>,
    index: HashMap<K, usize>,
}

impl<K, V> Default for Namespace<K, V> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<K: Eq + Hash, V: Clone> Namespace<K, V> {
    fn contains(&self, key: &K) -> bool {
        self.index.contains_key(key)
    }

    fn get(&self, key: &K) -> Option<V> {
        self.index.get(key).map(|&i| self.entries[i].clone())
    }

    fn insert_new(&mut self, key: K, value: V) -> bool {
        if self.index.contains_key(&key) {
            return false;
        }
        self.index.insert(key, self.entries.len());
        self.entries.push(value);
        true
    }

    fn values(&self) -> impl Iterator<Item = &V> {
        self.entries.iter()
    }
}

type Key2 = (String, String);
type Key3 = (String, String, String);

#[derive(Debug, Default)]
struct CatalogState {
    storages: Namespace<String, Storage>,
    metastores: Namespace<String, Metastore>,
    providers: Namespace<String, Provider>,
    tables: Namespace<Key2, InternalTable>,
    shares: Namespace<String, Share>,
    schemas: Namespace<Key2, Schema>,
    shared_tables: Namespace<Key3, SharedTable>,
}

/// In-memory catalog guarded by one coarse lock.
#[derive(Debug, Clone, Default)]
pub struct MemoryCatalogStore {
    state: Arc<RwLock<CatalogState>>,
}

impl MemoryCatalogStore {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read<T>(&self, f: impl FnOnce(&CatalogState) -> T) -> Result<T> {
        let state = self.state.read().map_err(|_| Error::lock_poisoned())?;
        Ok(f(&state))
    }

    fn write<T>(&self, f: impl FnOnce(&mut CatalogState) -> Result<T>) -> Result<T> {
        let mut state = self.state.write().map_err(|_| Error::lock_poisoned())?;
        f(&mut state)
    }
}

fn key2(a: &str, b: &str) -> Key2 {
    (a.to_string(), b.to_string())
}

fn key3(a: &str, b: &str, c: &str) -> Key3 {
    (a.to_string(), b.to_string(), c.to_string())
}

#[async_trait]
impl CatalogStore for MemoryCatalogStore {
    async fn insert_storage(&self, storage: Storage) -> Result<Storage> {
        self.write(|state| {
            if !state
                .storages
                .insert_new(storage.name.clone(), storage.clone())
            {
                return Err(Error::already_exists("storage", &storage.name));
            }
            Ok(storage)
        })
    }

    async fn get_storage(&self, name: &str) -> Result<Option<Storage>> {
        self.read(|state| state.storages.get(&name.to_string()))
    }

    async fn insert_metastore(&self, metastore: Metastore) -> Result<Metastore> {
        self.write(|state| {
            if !state
                .metastores
                .insert_new(metastore.name.clone(), metastore.clone())
            {
                return Err(Error::already_exists("metastore", &metastore.name));
            }
            Ok(metastore)
        })
    }

    async fn get_metastore(&self, name: &str) -> Result<Option<Metastore>> {
        self.read(|state| state.metastores.get(&name.to_string()))
    }

    async fn insert_provider(&self, provider: Provider) -> Result<Provider> {
        self.write(|state| {
            if !state.storages.contains(&provider.storage_name) {
                return Err(Error::resource_not_found("storage", &provider.storage_name));
            }
            if let Some(metastore) = &provider.metastore_name {
                if !state.metastores.contains(metastore) {
                    return Err(Error::resource_not_found("metastore", metastore));
                }
            }
            if !state
                .providers
                .insert_new(provider.name.clone(), provider.clone())
            {
                return Err(Error::already_exists("provider", &provider.name));
            }
            Ok(provider)
        })
    }

    async fn get_provider(&self, name: &str) -> Result<Option<Provider>> {
        self.read(|state| state.providers.get(&name.to_string()))
    }

    async fn insert_table(&self, table: InternalTable) -> Result<InternalTable> {
        self.write(|state| {
            if !state.providers.contains(&table.provider_name) {
                return Err(Error::resource_not_found("provider", &table.provider_name));
            }
            let key = key2(&table.provider_name, &table.name);
            if !state.tables.insert_new(key, table.clone()) {
                return Err(Error::already_exists(
                    "table",
                    format!("{}.{}", table.provider_name, table.name),
                ));
            }
            Ok(table)
        })
    }

    async fn get_table(&self, provider: &str, name: &str) -> Result<Option<InternalTable>> {
        self.read(|state| state.tables.get(&key2(provider, name)))
    }

    async fn insert_share(&self, share: Share) -> Result<Share> {
        self.write(|state| {
            if !state.shares.insert_new(share.name.clone(), share.clone()) {
                return Err(Error::already_exists("share", &share.name));
            }
            Ok(share)
        })
    }

    async fn get_share(&self, name: &str) -> Result<Option<Share>> {
        self.read(|state| state.shares.get(&name.to_string()))
    }

    async fn list_shares(&self) -> Result<Vec<Share>> {
        self.read(|state| state.shares.values().cloned().collect())
    }

    async fn insert_schema(&self, schema: Schema) -> Result<Schema> {
        self.write(|state| {
            if !state.shares.contains(&schema.share) {
                return Err(Error::resource_not_found("share", &schema.share));
            }
            if !state
                .schemas
                .insert_new(key2(&schema.share, &schema.name), schema.clone())
            {
                return Err(Error::already_exists(
                    "schema",
                    format!("{}.{}", schema.share, schema.name),
                ));
            }
            Ok(schema)
        })
    }

    async fn list_schemas(&self, share: &str) -> Result<Option<Vec<Schema>>> {
        self.read(|state| {
            state.shares.contains(&share.to_string()).then(|| {
                state
                    .schemas
                    .values()
                    .filter(|schema| schema.share == share)
                    .cloned()
                    .collect()
            })
        })
    }

    async fn insert_shared_table(&self, table: SharedTable) -> Result<SharedTable> {
        self.write(|state| {
            if !state.shares.contains(&table.share) {
                return Err(Error::resource_not_found("share", &table.share));
            }
            if !state.schemas.contains(&key2(&table.share, &table.schema)) {
                return Err(Error::resource_not_found(
                    "schema",
                    format!("{}.{}", table.share, table.schema),
                ));
            }
            let key = key3(&table.share, &table.schema, &table.name);
            if !state.shared_tables.insert_new(key, table.clone()) {
                return Err(Error::already_exists(
                    "shared table",
                    format!("{}.{}.{}", table.share, table.schema, table.name),
                ));
            }
            Ok(table)
        })
    }

    async fn list_shared_tables(
        &self,
        share: &str,
        schema: &str,
    ) -> Result<Option<Vec<SharedTable>>> {
        self.read(|state| {
            state.schemas.contains(&key2(share, schema)).then(|| {
                state
                    .shared_tables
                    .values()
                    .filter(|table| table.share == share && table.schema == schema)
                    .cloned()
                    .collect()
            })
        })
    }

    async fn list_shared_tables_of_share(&self, share: &str) -> Result<Option<Vec<SharedTable>>> {
        self.read(|state| {
            state.shares.contains(&share.to_string()).then(|| {
                state
                    .shared_tables
                    .values()
                    .filter(|table| table.share == share)
                    .cloned()
                    .collect()
            })
        })
    }

    async fn get_shared_table(
        &self,
        share: &str,
        schema: &str,
        name: &str,
    ) -> Result<Option<SharedTable>> {
        self.read(|state| state.shared_tables.get(&key3(share, schema, name)))
    }
}
