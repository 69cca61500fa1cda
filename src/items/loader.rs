// src/items/loader.rs

//! CSV loader for work items.
//!
//! Each record is `name,description,value`. The file is read completely and
//! every record is validated before any item is returned, so a bad file never
//! leads to a partially started run.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use crate::errors::{Result, ThingrunError};
use crate::items::{ItemId, WorkItem};

/// Raw CSV record as read from the input file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemRecord {
    pub name: String,
    pub description: String,
    pub value: String,
}

impl ItemRecord {
    fn from_row(row: &csv::StringRecord) -> Option<Self> {
        Some(Self {
            name: row.get(0)?.to_string(),
            description: row.get(1)?.to_string(),
            value: row.get(2)?.to_string(),
        })
    }

    pub fn into_work_item(self, id: ItemId) -> WorkItem {
        WorkItem::new(id, self.name)
            .with_field("description", self.description)
            .with_field("value", self.value)
    }
}

/// Options controlling how the input file is parsed.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoadOptions {
    /// Treat the first row as a header and skip it.
    pub has_headers: bool,
}

/// Load all work items from the CSV file at `path`.
pub fn load_items(path: impl AsRef<Path>, options: LoadOptions) -> Result<Vec<Arc<WorkItem>>> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| load_error(path, e.to_string()))?;
    let items = read_items(file, options).map_err(|e| match e {
        ThingrunError::Csv(err) => load_error(path, err.to_string()),
        ThingrunError::Load { reason, .. } => load_error(path, reason),
        other => other,
    })?;

    debug!(path = %path.display(), count = items.len(), "loaded work items");
    Ok(items)
}

/// Parse work items from any reader. Used by [`load_items`] and tests.
pub fn read_items(reader: impl std::io::Read, options: LoadOptions) -> Result<Vec<Arc<WorkItem>>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(options.has_headers)
        .flexible(true)
        .trim(csv::Trim::Fields)
        .from_reader(reader);

    let mut items = Vec::new();
    for (index, row) in csv_reader.records().enumerate() {
        let row = row?;
        let Some(record) = ItemRecord::from_row(&row) else {
            let line = row
                .position()
                .map(|p| p.line())
                .unwrap_or(index as u64 + 1);
            return Err(ThingrunError::Load {
                path: PathBuf::new(),
                reason: format!(
                    "line {line}: expected 3 fields (name, description, value), got {}",
                    row.len()
                ),
            });
        };
        items.push(Arc::new(record.into_work_item(ItemId(index))));
    }

    Ok(items)
}

fn load_error(path: &Path, reason: String) -> ThingrunError {
    ThingrunError::Load {
        path: path.to_path_buf(),
        reason,
    }
}
