//! Raw source tables and the loaders that produce them.

use std::fs;
use std::path::Path;

use lp_core::{Samples, SourceId};

use crate::error::{StoreError, StoreResult};

/// One loaded source: a time vector plus named columns of equal length.
#[derive(Debug, Clone, PartialEq)]
pub struct RawTable {
    pub source_id: SourceId,
    pub time: Vec<f64>,
    /// Columns in file order.
    pub columns: Vec<(String, Samples)>,
}

impl RawTable {
    pub fn new(source_id: impl Into<SourceId>, time: Vec<f64>) -> Self {
        Self {
            source_id: source_id.into(),
            time,
            columns: Vec::new(),
        }
    }

    pub fn with_column(mut self, name: impl Into<String>, data: impl Into<Samples>) -> Self {
        self.columns.push((name.into(), data.into()));
        self
    }

    pub fn column(&self, name: &str) -> Option<&Samples> {
        self.columns
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, data)| data)
    }
}

/// Turns a file into a [`RawTable`].
pub trait SourceLoader {
    fn load(&self, path: &Path) -> StoreResult<RawTable>;
}

/// How cells on a line are separated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Delimiter {
    /// Comma if the header has one, else tab, else runs of whitespace.
    #[default]
    Auto,
    Char(char),
    Whitespace,
}

/// Header-row text logs (CSV, TSV, whitespace separated).
///
/// Lines starting with `#` and blank lines are skipped. Columns whose
/// cells all parse as integers stay integer; everything else is `f64`.
#[derive(Debug, Clone, Default)]
pub struct DelimitedTextLoader {
    pub delimiter: Delimiter,
    /// Time column by name; the first column when unset.
    pub time_column: Option<String>,
}

impl DelimitedTextLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delimiter(mut self, delimiter: Delimiter) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn with_time_column(mut self, name: impl Into<String>) -> Self {
        self.time_column = Some(name.into());
        self
    }

    /// Parse already-read text as source `source_id`.
    pub fn parse_str(&self, source_id: impl Into<SourceId>, text: &str) -> StoreResult<RawTable> {
        let mut lines = text
            .lines()
            .enumerate()
            .map(|(i, line)| (i + 1, line.trim()))
            .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'));

        let (header_line, header) = lines.next().ok_or(StoreError::Parse {
            line: 0,
            what: "no header row".to_string(),
        })?;
        let delimiter = match self.delimiter {
            Delimiter::Auto if header.contains(',') => Delimiter::Char(','),
            Delimiter::Auto if header.contains('\t') => Delimiter::Char('\t'),
            Delimiter::Auto => Delimiter::Whitespace,
            other => other,
        };
        let names: Vec<String> = split(header, delimiter)
            .map(|s| s.trim_matches('"').to_string())
            .collect();
        for (i, name) in names.iter().enumerate() {
            if name.is_empty() {
                return Err(StoreError::Parse {
                    line: header_line,
                    what: format!("column {} has an empty name", i + 1),
                });
            }
            if names[..i].contains(name) {
                return Err(StoreError::Parse {
                    line: header_line,
                    what: format!("duplicate column '{name}'"),
                });
            }
        }
        let time_index = match &self.time_column {
            Some(wanted) => names
                .iter()
                .position(|n| n == wanted)
                .ok_or_else(|| StoreError::Parse {
                    line: header_line,
                    what: format!("time column '{wanted}' not in header"),
                })?,
            None => 0,
        };

        let mut cells: Vec<Vec<(usize, &str)>> = vec![Vec::new(); names.len()];
        for (line_no, line) in lines {
            let row: Vec<&str> = split(line, delimiter).collect();
            if row.len() != names.len() {
                return Err(StoreError::Parse {
                    line: line_no,
                    what: format!("expected {} cells, found {}", names.len(), row.len()),
                });
            }
            for (column, cell) in cells.iter_mut().zip(row) {
                column.push((line_no, cell));
            }
        }

        let mut columns = Vec::with_capacity(names.len());
        let mut time = Vec::new();
        for (index, (name, column)) in names.into_iter().zip(cells).enumerate() {
            if index == time_index {
                time = parse_floats(&column)?;
            } else {
                columns.push((name, parse_column(&column)?));
            }
        }
        Ok(RawTable {
            source_id: source_id.into(),
            time,
            columns,
        })
    }
}

impl SourceLoader for DelimitedTextLoader {
    /// The source id is the file name.
    fn load(&self, path: &Path) -> StoreResult<RawTable> {
        let text = fs::read_to_string(path)?;
        let source_id = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let table = self.parse_str(source_id, &text)?;
        tracing::debug!(
            path = %path.display(),
            rows = table.time.len(),
            columns = table.columns.len(),
            "loaded delimited text"
        );
        Ok(table)
    }
}

fn split(line: &str, delimiter: Delimiter) -> Box<dyn Iterator<Item = &str> + '_> {
    match delimiter {
        Delimiter::Char(c) => Box::new(line.split(c).map(str::trim)),
        Delimiter::Whitespace | Delimiter::Auto => Box::new(line.split_whitespace()),
    }
}

fn parse_floats(column: &[(usize, &str)]) -> StoreResult<Vec<f64>> {
    column
        .iter()
        .map(|&(line, cell)| {
            cell.parse::<f64>().map_err(|_| StoreError::Parse {
                line,
                what: format!("'{cell}' is not a number"),
            })
        })
        .collect()
}

fn parse_column(column: &[(usize, &str)]) -> StoreResult<Samples> {
    let ints: Option<Vec<i64>> = column.iter().map(|(_, c)| c.parse().ok()).collect();
    match ints {
        Some(v) => Ok(Samples::Int(v)),
        None => parse_floats(column).map(Samples::Float),
    }
}
