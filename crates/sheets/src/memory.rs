//! In-process [`SheetStore`] used by tests and dry runs.
//!
//! Behaves like a spreadsheet with append-after-last-row semantics and can
//! be told to fail appends to one partition, every single-cell write, or
//! partition listing.

use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use serde_json::Value;

use crate::error::SheetError;
use crate::store::{CellRef, SheetStore};

#[derive(Debug, Default)]
struct Partition {
    name: String,
    rows: Vec<Vec<Value>>,
}

#[derive(Debug, Default)]
struct State {
    spreadsheets: Vec<String>,
    partitions: Vec<Partition>,
    failing_partition: Option<String>,
    fail_cell_writes: bool,
    fail_listing: bool,
    create_calls: usize,
    append_calls: usize,
}

impl State {
    fn partition_mut(&mut self, name: &str) -> Result<&mut Partition, SheetError> {
        self.partitions
            .iter_mut()
            .find(|p| p.name == name)
            .ok_or_else(|| SheetError::Write(format!("Unable to parse range: {name}")))
    }
}

/// Spreadsheet held in memory.
#[derive(Debug, Default)]
pub struct MemorySheetStore {
    state: Mutex<State>,
}

impl MemorySheetStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Make every append to `partition` fail.
    pub fn fail_appends_to(&self, partition: impl Into<String>) {
        self.lock().failing_partition = Some(partition.into());
    }

    /// Make `write_row`/`write_cell` fail while `fail` is set.
    pub fn fail_cell_writes(&self, fail: bool) {
        self.lock().fail_cell_writes = fail;
    }

    /// Make `list_partitions` fail while `fail` is set.
    pub fn fail_listing(&self, fail: bool) {
        self.lock().fail_listing = fail;
    }

    /// Clear all injected failures.
    pub fn heal(&self) {
        let mut state = self.lock();
        state.failing_partition = None;
        state.fail_cell_writes = false;
        state.fail_listing = false;
    }

    /// Every row of `partition`, header rows included.
    pub fn rows(&self, partition: &str) -> Option<Vec<Vec<Value>>> {
        self.lock()
            .partitions
            .iter()
            .find(|p| p.name == partition)
            .map(|p| p.rows.clone())
    }

    pub fn spreadsheets(&self) -> Vec<String> {
        self.lock().spreadsheets.clone()
    }

    pub fn create_calls(&self) -> usize {
        self.lock().create_calls
    }

    pub fn append_calls(&self) -> usize {
        self.lock().append_calls
    }
}

#[async_trait]
impl SheetStore for MemorySheetStore {
    async fn create_spreadsheet(&self, title: &str) -> Result<String, SheetError> {
        let id = format!("{title}-{}", uuid::Uuid::new_v4());
        self.lock().spreadsheets.push(id.clone());
        Ok(id)
    }

    async fn list_partitions(&self) -> Result<Vec<String>, SheetError> {
        let state = self.lock();
        if state.fail_listing {
            return Err(SheetError::Http {
                status: 503,
                body: "listing unavailable".into(),
            });
        }
        Ok(state.partitions.iter().map(|p| p.name.clone()).collect())
    }

    async fn create_partition(&self, name: &str) -> Result<(), SheetError> {
        let mut state = self.lock();
        state.create_calls += 1;
        if state.partitions.iter().any(|p| p.name == name) {
            return Err(SheetError::Write(format!(
                "A sheet with the name \"{name}\" already exists"
            )));
        }
        state.partitions.push(Partition {
            name: name.to_string(),
            rows: Vec::new(),
        });
        Ok(())
    }

    async fn read_cell(&self, cell: &CellRef) -> Result<Option<Value>, SheetError> {
        let mut state = self.lock();
        let partition = state.partition_mut(&cell.partition)?;
        let value = partition
            .rows
            .get(cell.row.saturating_sub(1) as usize)
            .and_then(|row| row.get(cell.column as usize))
            .filter(|v| !v.is_null())
            .cloned();
        Ok(value)
    }

    async fn write_row(&self, start: &CellRef, values: Vec<Value>) -> Result<(), SheetError> {
        let mut state = self.lock();
        if state.fail_cell_writes {
            return Err(SheetError::Write(format!("write to {} refused", start.a1())));
        }
        if start.row == 0 {
            return Err(SheetError::Write("rows are one-based".into()));
        }

        let partition = state.partition_mut(&start.partition)?;
        let row_index = (start.row - 1) as usize;
        if partition.rows.len() <= row_index {
            partition.rows.resize(row_index + 1, Vec::new());
        }
        let row = &mut partition.rows[row_index];
        let first = start.column as usize;
        if row.len() < first + values.len() {
            row.resize(first + values.len(), Value::Null);
        }
        for (offset, value) in values.into_iter().enumerate() {
            row[first + offset] = value;
        }
        Ok(())
    }

    async fn append_rows(&self, partition: &str, rows: Vec<Vec<Value>>) -> Result<(), SheetError> {
        let mut state = self.lock();
        state.append_calls += 1;
        if state.failing_partition.as_deref() == Some(partition) {
            return Err(SheetError::Write(format!("append to '{partition}' refused")));
        }
        state.partition_mut(partition)?.rows.extend(rows);
        Ok(())
    }
}
