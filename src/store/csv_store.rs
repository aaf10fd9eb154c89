use super::{PfeStore, StoreError};
use crate::core::trade::Trade;
use crate::exposure::batch::PfeResult;
use crate::exposure::policy::Engine;
use log::{debug, info};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// A directory of CSV tables, two per engine:
/// `{engine}_fx_trades.csv` and `{engine}_pfe_results.csv`.
#[derive(Debug, Clone)]
pub struct CsvStore {
    base_path: PathBuf,
}

impl CsvStore {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    fn trades_path(&self, engine: Engine) -> PathBuf {
        self.base_path
            .join(format!("{}_fx_trades.csv", engine.table_prefix()))
    }

    fn results_path(&self, engine: Engine) -> PathBuf {
        self.base_path
            .join(format!("{}_pfe_results.csv", engine.table_prefix()))
    }

    fn ensure_dir(&self) -> Result<(), StoreError> {
        fs::create_dir_all(&self.base_path).map_err(|source| StoreError::Io {
            path: self.base_path.clone(),
            source,
        })
    }
}

impl PfeStore for CsvStore {
    fn replace_trades(&mut self, engine: Engine, trades: &[Trade]) -> Result<(), StoreError> {
        self.ensure_dir()?;
        let path = self.trades_path(engine);
        write_records(&path, trades)?;
        info!("stored {} {} trades in {}", trades.len(), engine, path.display());
        Ok(())
    }

    fn replace_results(
        &mut self,
        engine: Engine,
        results: &[PfeResult],
    ) -> Result<(), StoreError> {
        self.ensure_dir()?;
        let path = self.results_path(engine);
        write_records(&path, results)?;
        info!("stored {} {} results in {}", results.len(), engine, path.display());
        Ok(())
    }

    fn trades(&self, engine: Engine) -> Result<Vec<Trade>, StoreError> {
        read_table(&self.trades_path(engine))
    }

    fn results(&self, engine: Engine) -> Result<Vec<PfeResult>, StoreError> {
        read_table(&self.results_path(engine))
    }
}

fn read_table<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, StoreError> {
    if !path.exists() {
        debug!("{} not found, reading as empty", path.display());
        return Ok(Vec::new());
    }
    read_records(path)
}

/// Read every record of a headed CSV file.
pub fn read_records<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, StoreError> {
    let file = fs::File::open(path).map_err(|source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(file);
    let records = rdr.deserialize().collect::<Result<Vec<T>, csv::Error>>()?;
    Ok(records)
}

/// Write `records` with a header row. The file is written beside its
/// destination and renamed into place.
pub fn write_records<T: Serialize>(path: &Path, records: &[T]) -> Result<(), StoreError> {
    let tmp = path.with_extension("csv.tmp");
    {
        let mut wtr = csv::Writer::from_path(&tmp)?;
        for record in records {
            wtr.serialize(record)?;
        }
        wtr.flush().map_err(|source| StoreError::Io {
            path: tmp.clone(),
            source,
        })?;
    }
    fs::rename(&tmp, path).map_err(|source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    })
}

pub fn read_trades_csv(path: impl AsRef<Path>) -> Result<Vec<Trade>, StoreError> {
    read_records(path.as_ref())
}

pub fn write_trades_csv(path: impl AsRef<Path>, trades: &[Trade]) -> Result<(), StoreError> {
    write_records(path.as_ref(), trades)
}
