use std::{collections::BTreeMap, ops::Deref, path::Path, str::FromStr};

use cozo::{DataValue, DbInstance, NamedRows, ScriptMutability};
use tracing::instrument;

use crate::{error::DbError, schema};

/// Default HNSW search breadth. Raised to `k` for larger requests.
pub const DEFAULT_EF: usize = 50;

/// Storage engine backing the Cozo instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Engine {
    #[default]
    Mem,
    Sqlite,
    RocksDb,
}

impl Engine {
    pub fn as_str(&self) -> &'static str {
        match self {
            Engine::Mem => "mem",
            Engine::Sqlite => "sqlite",
            Engine::RocksDb => "rocksdb",
        }
    }
}

impl FromStr for Engine {
    type Err = DbError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mem" | "memory" => Ok(Engine::Mem),
            "sqlite" => Ok(Engine::Sqlite),
            "rocksdb" => Ok(Engine::RocksDb),
            other => Err(DbError::Cozo(format!("unknown storage engine: {other}"))),
        }
    }
}

/// Handle to the knowledge graph store.
///
/// Constructed once at startup and shared behind an `Arc`; the underlying `DbInstance` is
/// cheap to clone, which is how blocking store calls are moved onto the blocking pool.
/// Dropping the last handle closes the store.
#[derive(Clone)]
pub struct Database {
    db: DbInstance,
    ef: usize,
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("ef", &self.ef)
            .finish_non_exhaustive()
    }
}

impl Deref for Database {
    type Target = DbInstance;

    fn deref(&self) -> &Self::Target {
        &self.db
    }
}

impl Database {
    pub fn new(db: DbInstance) -> Self {
        Self { db, ef: DEFAULT_EF }
    }

    /// Fresh in-memory store, mostly useful for tests and for restoring backups into.
    pub fn init_mem() -> Result<Self, DbError> {
        Self::open(Engine::Mem, "")
    }

    pub fn open(engine: Engine, path: impl AsRef<Path>) -> Result<Self, DbError> {
        let db = DbInstance::new(engine.as_str(), path.as_ref(), "")
            .map_err(|e| DbError::Cozo(format!("failed to open {} store: {e}", engine.as_str())))?;
        tracing::info!(engine = engine.as_str(), path = %path.as_ref().display(), "opened graph store");
        Ok(Self::new(db))
    }

    pub fn with_ef(mut self, ef: usize) -> Self {
        self.ef = ef.max(1);
        self
    }

    pub fn ef(&self) -> usize {
        self.ef
    }

    /// Load a Cozo backup file into this store.
    #[instrument(skip(self, path), fields(path = %path.as_ref().display()))]
    pub fn restore_backup(&self, path: impl AsRef<Path>) -> Result<(), DbError> {
        self.db
            .restore_backup(path.as_ref())
            .map_err(|e| DbError::Cozo(format!("failed to restore backup: {e}")))
    }

    /// Names of all stored relations.
    pub fn relations_vec(&self) -> Result<Vec<String>, DbError> {
        let rels = self.raw_query("::relations")?;
        let name_index = crate::result::get_pos(&rels.headers, "name")?;
        Ok(rels
            .rows
            .iter()
            .filter_map(|r| r.get(name_index).and_then(|v| v.get_str()).map(str::to_string))
            .collect())
    }

    /// Create the node and relationship relations plus the vector index, skipping whatever
    /// already exists.
    #[instrument(skip(self))]
    pub fn init_schema(&self, dims: usize) -> Result<(), DbError> {
        let existing = self.relations_vec()?;
        if !existing.iter().any(|r| r == medkg_core::schema::NODE_RELATION) {
            self.raw_query_mut(&schema::create_node_relation(dims), BTreeMap::new())?;
            self.raw_query_mut(&schema::create_vector_index(dims), BTreeMap::new())?;
            tracing::debug!(dims, "created node relation and vector index");
        }
        if !existing.iter().any(|r| r == medkg_core::schema::EDGE_RELATION) {
            self.raw_query_mut(&schema::create_edge_relation(), BTreeMap::new())?;
            tracing::debug!("created relationship relation");
        }
        Ok(())
    }

    /// Run a script that may not write to the store.
    pub fn raw_query(&self, script: &str) -> Result<NamedRows, DbError> {
        self.db
            .run_script(script, BTreeMap::new(), ScriptMutability::Immutable)
            .map_err(|e| DbError::Cozo(e.to_string()))
    }

    /// Run a script that is allowed to write to the store.
    pub fn raw_query_mut(
        &self,
        script: &str,
        params: BTreeMap<String, DataValue>,
    ) -> Result<NamedRows, DbError> {
        self.db
            .run_script(script, params, ScriptMutability::Mutable)
            .map_err(|e| DbError::Cozo(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_names_round_trip() {
        for engine in [Engine::Mem, Engine::Sqlite, Engine::RocksDb] {
            assert_eq!(engine.as_str().parse::<Engine>().unwrap(), engine);
        }
        assert_eq!("Memory".parse::<Engine>().unwrap(), Engine::Mem);
        assert!("postgres".parse::<Engine>().is_err());
    }

    #[test]
    fn init_schema_is_idempotent() -> Result<(), DbError> {
        let db = Database::init_mem()?;
        db.init_schema(4)?;
        db.init_schema(4)?;
        let rels = db.relations_vec()?;
        assert!(rels.iter().any(|r| r == "node"));
        assert!(rels.iter().any(|r| r == "relation"));
        Ok(())
    }

    #[test]
    fn ef_is_never_zero() -> Result<(), DbError> {
        let db = Database::init_mem()?.with_ef(0);
        assert_eq!(db.ef(), 1);
        Ok(())
    }
}
