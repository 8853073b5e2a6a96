/// Errors from a spreadsheet backend.
#[derive(Debug, thiserror::Error)]
pub enum SheetError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The backend returned a non-2xx status code.
    #[error("Sheets API error ({status}): {body}")]
    Http { status: u16, body: String },

    /// Service-account credentials were unusable or rejected.
    #[error("Sheets authentication failed: {0}")]
    Auth(String),

    /// The response body did not have the expected shape.
    #[error("Unexpected Sheets response: {0}")]
    Decode(String),

    /// The backend refused a write.
    #[error("Sheet write rejected: {0}")]
    Write(String),
}

/// Errors from an export run.
///
/// Only [`ExportError::Watermark`] can occur after rows were appended; in
/// every other case the watermark is left as it was.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("Failed to list partitions: {0}")]
    ListPartitions(#[source] SheetError),

    #[error("Failed to read watermark: {0}")]
    ReadWatermark(#[source] SheetError),

    #[error("Watermark cell holds a non-integer value: {0}")]
    CorruptWatermark(String),

    #[error("Failed to write partition '{partition}': {source}")]
    Partition {
        partition: String,
        #[source]
        source: SheetError,
    },

    #[error("Rows were written but the watermark update failed: {0}")]
    Watermark(#[source] SheetError),
}
