//! Incremental, watermark-filtered export of classified records.
//!
//! One [`IncrementalExporter::export`] call:
//!
//! 1. ensures the `other` partition exists (it holds the watermark cell),
//! 2. reads the watermark,
//! 3. keeps records strictly newer than the watermark and groups them by
//!    partition,
//! 4. creates missing partitions with their header row and appends rows,
//! 5. writes the new watermark only after every append succeeded.
//!
//! The new watermark is the maximum timestamp over *all* input records and
//! the previous watermark, so it never moves backwards.

use std::collections::{BTreeMap, HashSet};

use serde_json::Value;

use petkit_core::record::{MaintenanceRecord, TimedRecord, OTHER_PARTITION};
use petkit_core::types::UnixSeconds;

use crate::error::{ExportError, SheetError};
use crate::store::{CellRef, SheetStore};

/// Label written next to the watermark cell.
pub const WATERMARK_LABEL: &str = "last_modified";

/// Header row of the `other` partition (row 1 holds the watermark).
const OTHER_HEADER_ROW: u32 = 2;

/// Header row of a pet partition.
const PET_HEADER_ROW: u32 = 1;

fn watermark_label_cell() -> CellRef {
    CellRef::new(OTHER_PARTITION, 0, 1)
}

fn watermark_cell() -> CellRef {
    CellRef::new(OTHER_PARTITION, 1, 1)
}

/// Result of one export call.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExportOutcome {
    /// Watermark before the call.
    pub previous_watermark: Option<UnixSeconds>,
    /// Watermark after the call.
    pub watermark: Option<UnixSeconds>,
    /// Rows appended per partition.
    pub appended: BTreeMap<String, usize>,
    /// Records skipped as already exported.
    pub skipped: usize,
}

impl ExportOutcome {
    pub fn rows_appended(&self) -> usize {
        self.appended.values().sum()
    }
}

/// Rows destined for one partition.
struct PartitionBatch {
    header: &'static [&'static str],
    rows: Vec<Vec<Value>>,
}

/// Parse the stored watermark. Sheets may hand numbers back as strings.
fn parse_watermark(value: &Value) -> Result<UnixSeconds, ExportError> {
    let parsed = match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| ExportError::CorruptWatermark(value.to_string()))
}

/// Appends new records to a [`SheetStore`] and tracks the watermark.
pub struct IncrementalExporter<S> {
    store: S,
}

impl<S: SheetStore> IncrementalExporter<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Current watermark, or `None` when nothing was exported yet.
    pub async fn read_watermark(&self) -> Result<Option<UnixSeconds>, ExportError> {
        let value = self
            .store
            .read_cell(&watermark_cell())
            .await
            .map_err(ExportError::ReadWatermark)?;
        value.as_ref().map(parse_watermark).transpose()
    }

    /// Export `records`, skipping any at or before the watermark.
    pub async fn export(&self, records: &[TimedRecord]) -> Result<ExportOutcome, ExportError> {
        let mut existing: HashSet<String> = self
            .store
            .list_partitions()
            .await
            .map_err(ExportError::ListPartitions)?
            .into_iter()
            .collect();

        self.ensure_partition(
            &mut existing,
            OTHER_PARTITION,
            &MaintenanceRecord::HEADER,
        )
        .await?;

        let previous = self.read_watermark().await?;

        let mut batches: BTreeMap<String, PartitionBatch> = BTreeMap::new();
        let mut newest = previous;
        let mut skipped = 0;

        for (ts, record) in records {
            newest = newest.max(Some(*ts));
            if previous.is_some_and(|mark| *ts <= mark) {
                skipped += 1;
                continue;
            }
            batches
                .entry(record.partition().to_string())
                .or_insert_with(|| PartitionBatch {
                    header: record.header(),
                    rows: Vec::new(),
                })
                .rows
                .push(record.to_row());
        }

        let mut appended = BTreeMap::new();
        for (partition, batch) in batches {
            self.ensure_partition(&mut existing, &partition, batch.header)
                .await?;

            let count = batch.rows.len();
            self.store
                .append_rows(&partition, batch.rows)
                .await
                .map_err(|source| ExportError::Partition {
                    partition: partition.clone(),
                    source,
                })?;
            tracing::info!(partition = %partition, rows = count, "Appended records");
            appended.insert(partition, count);
        }

        if newest != previous {
            if let Some(mark) = newest {
                self.store
                    .write_cell(&watermark_cell(), Value::from(mark))
                    .await
                    .map_err(ExportError::Watermark)?;
            }
        }

        tracing::info!(
            previous = ?previous,
            watermark = ?newest,
            skipped,
            "Export finished",
        );

        Ok(ExportOutcome {
            previous_watermark: previous,
            watermark: newest,
            appended,
            skipped,
        })
    }

    /// Create `name` with its header row unless it already exists.
    async fn ensure_partition(
        &self,
        existing: &mut HashSet<String>,
        name: &str,
        header: &'static [&'static str],
    ) -> Result<(), ExportError> {
        if existing.contains(name) {
            return Ok(());
        }

        let wrap = |source: SheetError| ExportError::Partition {
            partition: name.to_string(),
            source,
        };

        self.store.create_partition(name).await.map_err(wrap)?;

        let header_row: Vec<Value> = header.iter().map(|h| Value::from(*h)).collect();
        if name == OTHER_PARTITION {
            self.store
                .write_cell(&watermark_label_cell(), Value::from(WATERMARK_LABEL))
                .await
                .map_err(wrap)?;
            self.store
                .write_row(&CellRef::new(name, 0, OTHER_HEADER_ROW), header_row)
                .await
                .map_err(wrap)?;
        } else {
            self.store
                .write_row(&CellRef::new(name, 0, PET_HEADER_ROW), header_row)
                .await
                .map_err(wrap)?;
        }

        existing.insert(name.to_string());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
