//! The spreadsheet operations the exporter depends on.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::SheetError;

/// A single cell in a named partition (sheet tab).
///
/// `column` is zero-based (`0` = `A`), `row` is one-based as in A1 notation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellRef {
    pub partition: String,
    pub column: u32,
    pub row: u32,
}

impl CellRef {
    pub fn new(partition: impl Into<String>, column: u32, row: u32) -> Self {
        Self {
            partition: partition.into(),
            column,
            row,
        }
    }

    /// A1 notation with a quoted sheet name, e.g. `'other'!B1`.
    pub fn a1(&self) -> String {
        format!(
            "{}!{}{}",
            quote_partition(&self.partition),
            column_letters(self.column),
            self.row
        )
    }
}

/// Quote a sheet name for A1 notation, doubling embedded quotes.
pub fn quote_partition(name: &str) -> String {
    format!("'{}'", name.replace('\'', "''"))
}

/// Spreadsheet column label for a zero-based index (`0` = `A`, `26` = `AA`).
pub fn column_letters(index: u32) -> String {
    let mut n = index + 1;
    let mut letters = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push(b'A' + rem as u8);
        n = (n - 1) / 26;
    }
    letters.reverse();
    String::from_utf8(letters).unwrap_or_default()
}

/// Backend for the destination spreadsheet.
#[async_trait]
pub trait SheetStore: Send + Sync {
    /// Create a new spreadsheet and return its identifier.
    async fn create_spreadsheet(&self, title: &str) -> Result<String, SheetError>;

    /// Names of the existing partitions, in sheet order.
    async fn list_partitions(&self) -> Result<Vec<String>, SheetError>;

    /// Add an empty partition. Fails if it already exists.
    async fn create_partition(&self, name: &str) -> Result<(), SheetError>;

    /// Value of one cell, or `None` when empty.
    async fn read_cell(&self, cell: &CellRef) -> Result<Option<Value>, SheetError>;

    /// Overwrite consecutive cells of one row starting at `start`.
    async fn write_row(&self, start: &CellRef, values: Vec<Value>) -> Result<(), SheetError>;

    async fn write_cell(&self, cell: &CellRef, value: Value) -> Result<(), SheetError> {
        self.write_row(cell, vec![value]).await
    }

    /// Append rows after the last populated row of `partition`.
    async fn append_rows(&self, partition: &str, rows: Vec<Vec<Value>>) -> Result<(), SheetError>;
}
