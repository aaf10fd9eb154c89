//! Persistence of trades and PFE results, namespaced per engine.
//!
//! A store holds two tables per [`Engine`]: the trades a run was computed
//! for and the results it produced. Writes replace a table wholesale.

pub mod csv_store;
pub mod memory;

use crate::core::trade::Trade;
use crate::exposure::batch::PfeResult;
use crate::exposure::policy::Engine;
use std::path::PathBuf;
use thiserror::Error;

pub use csv_store::CsvStore;
pub use memory::MemoryStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("unsupported connection string '{0}'")]
    UnsupportedConnection(String),
}

/// Table storage used by the batch run and by queries.
pub trait PfeStore {
    fn replace_trades(&mut self, engine: Engine, trades: &[Trade]) -> Result<(), StoreError>;

    fn replace_results(&mut self, engine: Engine, results: &[PfeResult])
        -> Result<(), StoreError>;

    /// An engine with no stored table yields an empty list.
    fn trades(&self, engine: Engine) -> Result<Vec<Trade>, StoreError>;

    fn results(&self, engine: Engine) -> Result<Vec<PfeResult>, StoreError>;
}

/// Open a store from a connection string.
///
/// `memory:` opens an empty in-process store. A bare path or a `file://`
/// URL opens a directory of CSV tables. Any other scheme is rejected.
pub fn open_store(connection_string: &str) -> Result<Box<dyn PfeStore>, StoreError> {
    let connection = connection_string.trim();
    if connection == "memory:" {
        return Ok(Box::new(MemoryStore::new()));
    }
    if let Some(path) = connection.strip_prefix("file://") {
        return Ok(Box::new(CsvStore::new(path)));
    }
    if connection.is_empty() || connection.contains("://") {
        return Err(StoreError::UnsupportedConnection(connection.to_string()));
    }
    Ok(Box::new(CsvStore::new(connection)))
}
