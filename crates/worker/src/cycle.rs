//! One poll-classify-export cycle.
//!
//! Devices are listed and their records fetched through a
//! [`DeviceDirectory`]; the pet roster is loaded only when a presence event
//! needs it. Every event is classified, then the whole batch goes to the
//! [`IncrementalExporter`] in timestamp order.

use petkit_core::classifier::{classify, EVENT_PRESENCE};
use petkit_core::device::{Device, RawEvent};
use petkit_core::directory::{DateRange, DeviceDirectory};
use petkit_core::error::CoreError;
use petkit_core::pets::{PetResolver, RosterSource};
use petkit_core::record::TimedRecord;
use petkit_core::types::UnixSeconds;
use petkit_sheets::{ExportError, IncrementalExporter, SheetStore};

use crate::BoxError;

/// Failures that abort a cycle. Nothing is exported when one occurs before
/// the export step.
#[derive(Debug, thiserror::Error)]
pub enum CycleError {
    #[error("Failed to list devices: {0}")]
    ListDevices(#[source] BoxError),

    #[error("Failed to fetch records for device '{device}': {source}")]
    FetchRecords {
        device: String,
        #[source]
        source: BoxError,
    },

    #[error("Failed to load pet roster: {0}")]
    Roster(#[source] BoxError),

    #[error("Pet resolution failed: {0}")]
    Resolver(#[source] CoreError),

    #[error(transparent)]
    Export(#[from] ExportError),
}

/// Counters for one completed cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleSummary {
    pub devices: usize,
    pub fetched: usize,
    pub classified: usize,
    /// Events dropped because their content could not be classified.
    pub rejected: usize,
    pub appended: usize,
    pub watermark: Option<UnixSeconds>,
}

/// Run one cycle over `range` and export the result.
///
/// A fetch failure for any device aborts the cycle so the watermark never
/// moves past records that were not seen. Malformed individual events are
/// logged and skipped.
pub async fn run_export_cycle<D, S>(
    directory: &mut D,
    exporter: &IncrementalExporter<S>,
    range: &DateRange,
) -> Result<CycleSummary, CycleError>
where
    D: DeviceDirectory + RosterSource,
    S: SheetStore,
{
    let devices = DeviceDirectory::list_devices(directory)
        .await
        .map_err(|e| CycleError::ListDevices(Box::new(e)))?;
    tracing::info!(devices = devices.len(), start = %range.start(), end = %range.end(), "Polling devices");

    let mut fetched: Vec<(Device, Vec<RawEvent>)> = Vec::with_capacity(devices.len());
    for device in devices {
        let events = directory
            .fetch_records(&device, range)
            .await
            .map_err(|e| CycleError::FetchRecords {
                device: device.name.clone(),
                source: Box::new(e),
            })?;
        tracing::debug!(device = %device.name, events = events.len(), "Fetched records");
        fetched.push((device, events));
    }

    let mut summary = CycleSummary {
        devices: fetched.len(),
        fetched: fetched.iter().map(|(_, events)| events.len()).sum(),
        ..CycleSummary::default()
    };

    let mut resolver = PetResolver::new();
    let needs_roster = fetched
        .iter()
        .flat_map(|(_, events)| events)
        .any(|event| event.event_type == EVENT_PRESENCE);
    if needs_roster {
        resolver
            .ensure_loaded(directory)
            .await
            .map_err(|e| CycleError::Roster(Box::new(e)))?;
    }

    let mut records: Vec<TimedRecord> = Vec::with_capacity(summary.fetched);
    for (device, events) in &fetched {
        for event in events {
            match classify(device, event, &resolver) {
                Ok(record) => records.push(record),
                Err(e) if e.is_session_wide() => return Err(CycleError::Resolver(e)),
                Err(e) => {
                    tracing::error!(
                        device = %device.name,
                        event_type = event.event_type,
                        timestamp = event.timestamp,
                        error = %e,
                        "Skipping unclassifiable event",
                    );
                    summary.rejected += 1;
                }
            }
        }
    }
    summary.classified = records.len();

    // Stable: events sharing a timestamp keep device-then-fetch order.
    records.sort_by_key(|(ts, _)| *ts);

    let outcome = exporter.export(&records).await?;
    summary.appended = outcome.rows_appended();
    summary.watermark = outcome.watermark;

    tracing::info!(
        devices = summary.devices,
        fetched = summary.fetched,
        rejected = summary.rejected,
        appended = summary.appended,
        watermark = ?summary.watermark,
        "Cycle complete",
    );
    Ok(summary)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
