use serde::Deserialize;
use slog::{debug, warn, Logger};
use std::{fs::File, io::Read, path::Path};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceRecord {
    pub code: String,
    pub name: String,
}

#[derive(thiserror::Error, Debug)]
pub enum PlaceError {
    #[error("failed to load reference data '{dataset}': {reason}")]
    ReferenceDataLoad { dataset: String, reason: String },
}

/// One reference table of places, as described in the `[[datasets]]` config
/// section.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DatasetConfig {
    pub name: String,
    pub path: String,
    /// Columns concatenated, in order, into the place code.
    #[serde(default = "default_code_columns")]
    pub code_columns: Vec<usize>,
    #[serde(default = "default_name_column")]
    pub name_column: usize,
    /// Minimum similarity a name must strictly exceed to match.
    pub threshold: f64,
    #[serde(default = "default_delimiter")]
    pub delimiter: char,
    #[serde(default)]
    pub has_headers: bool,
    #[serde(default = "default_case_sensitive")]
    pub case_sensitive: bool,
}

fn default_code_columns() -> Vec<usize> {
    vec![0]
}

fn default_name_column() -> usize {
    1
}

fn default_delimiter() -> char {
    ';'
}

fn default_case_sensitive() -> bool {
    true
}

/// An immutable, loaded reference table.
#[derive(Debug, Clone)]
pub struct PlaceTable {
    pub name: String,
    pub threshold: f64,
    pub case_sensitive: bool,
    pub records: Vec<PlaceRecord>,
}

impl PlaceTable {
    pub fn load(config: &DatasetConfig, path: &Path, logger: &Logger) -> Result<Self, PlaceError> {
        let file = File::open(path).map_err(|e| PlaceError::ReferenceDataLoad {
            dataset: config.name.clone(),
            reason: format!("failed to open '{}': {}", path.display(), e),
        })?;
        let table = Self::from_reader(config, file, logger)?;
        debug!(
            logger,
            "loaded {} places into dataset {} from {}",
            table.records.len(),
            table.name,
            path.display()
        );
        Ok(table)
    }

    /// Read rows from any source.
    ///
    /// The table's width is the header width, or else the width most rows
    /// share. Rows of another width or with invalid UTF-8 are skipped with a
    /// warning; I/O failures and columns beyond the table's width abort the
    /// load.
    pub fn from_reader<R: Read>(
        config: &DatasetConfig,
        reader: R,
        logger: &Logger,
    ) -> Result<Self, PlaceError> {
        let load_error = |reason: String| PlaceError::ReferenceDataLoad {
            dataset: config.name.clone(),
            reason,
        };

        if config.code_columns.is_empty() {
            return Err(load_error(String::from("no code columns configured")));
        }
        if !config.delimiter.is_ascii() {
            return Err(load_error(format!(
                "delimiter '{}' is not a single byte",
                config.delimiter
            )));
        }
        let widest_column = config
            .code_columns
            .iter()
            .copied()
            .chain(std::iter::once(config.name_column))
            .max()
            .unwrap_or_default();

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(config.delimiter as u8)
            .has_headers(config.has_headers)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let header_width = if config.has_headers {
            let headers = reader
                .byte_headers()
                .map_err(|e| load_error(format!("failed reading header: {}", e)))?;
            Some(headers.len())
        } else {
            None
        };

        let mut rows = Vec::new();
        for (idx, result) in reader.byte_records().enumerate() {
            let row = match result {
                Ok(row) => row,
                Err(e) if e.is_io_error() => {
                    return Err(load_error(format!("failed reading rows: {}", e)));
                }
                Err(e) => {
                    warn!(logger, "skipping malformed row {} in {}: {}", idx + 1, config.name, e);
                    continue;
                }
            };
            match csv::StringRecord::from_byte_record(row) {
                Ok(row) => rows.push((idx + 1, row)),
                Err(e) => {
                    warn!(logger, "skipping malformed row {} in {}: {}", idx + 1, config.name, e);
                }
            }
        }

        let Some(width) = header_width.or_else(|| common_width(&rows)) else {
            return Ok(PlaceTable::empty(config));
        };
        if widest_column >= width {
            return Err(load_error(format!(
                "column {} is beyond the {} fields of the table",
                widest_column, width
            )));
        }

        let mut records = Vec::with_capacity(rows.len());
        for (line, row) in rows {
            if row.len() != width {
                warn!(
                    logger,
                    "skipping malformed row {} in {}: {} fields, expected {}",
                    line,
                    config.name,
                    row.len(),
                    width
                );
                continue;
            }
            let code: String = config
                .code_columns
                .iter()
                .filter_map(|column| row.get(*column))
                .collect();
            let name = row.get(config.name_column).unwrap_or_default().to_string();
            records.push(PlaceRecord { code, name });
        }

        Ok(PlaceTable {
            records,
            ..PlaceTable::empty(config)
        })
    }

    fn empty(config: &DatasetConfig) -> Self {
        PlaceTable {
            name: config.name.clone(),
            threshold: config.threshold,
            case_sensitive: config.case_sensitive,
            records: Vec::new(),
        }
    }
}

/// Field count shared by the most rows; ties go to the width seen first.
fn common_width(rows: &[(usize, csv::StringRecord)]) -> Option<usize> {
    let mut counts: Vec<(usize, usize)> = Vec::new();
    for (_, row) in rows {
        match counts.iter_mut().find(|(width, _)| *width == row.len()) {
            Some((_, count)) => *count += 1,
            None => counts.push((row.len(), 1)),
        }
    }
    counts
        .into_iter()
        .rev()
        .max_by_key(|(_, count)| *count)
        .map(|(width, _)| width)
}
