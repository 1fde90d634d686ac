use slog::{debug, info, Logger};
use std::sync::Arc;
use tempo_core::ConfigSource;

use crate::{DatasetConfig, PlaceError, PlaceRecord, PlaceTable};

/// Reference tables consulted in priority order.
#[derive(Clone)]
pub struct PlaceDirectory {
    tables: Vec<Arc<PlaceTable>>,
    logger: Logger,
}

impl PlaceDirectory {
    pub fn new(logger: Logger, tables: Vec<Arc<PlaceTable>>) -> Self {
        PlaceDirectory { tables, logger }
    }

    /// Load every configured dataset. Paths are resolved against the config
    /// file location; any unreadable dataset fails the whole directory.
    pub fn load(
        logger: Logger,
        datasets: &[DatasetConfig],
        source: &ConfigSource,
    ) -> Result<Self, PlaceError> {
        let mut tables = Vec::with_capacity(datasets.len());
        for dataset in datasets {
            let path = source.resolve_relative(&dataset.path);
            let table = PlaceTable::load(dataset, &path, &logger)?;
            info!(
                logger,
                "dataset {}: {} places, threshold {}",
                table.name,
                table.records.len(),
                table.threshold
            );
            tables.push(Arc::new(table));
        }
        Ok(PlaceDirectory::new(logger, tables))
    }

    /// First dataset, in priority order, with a match wins.
    pub fn resolve(&self, query: &str) -> Option<&PlaceRecord> {
        for table in &self.tables {
            if let Some(record) = table.resolve(query) {
                debug!(
                    self.logger,
                    "resolved '{}' to {} ({}) in {}", query, record.name, record.code, table.name
                );
                return Some(record);
            }
        }
        debug!(self.logger, "no place matches '{}'", query);
        None
    }

    pub fn tables(&self) -> &[Arc<PlaceTable>] {
        &self.tables
    }
}
