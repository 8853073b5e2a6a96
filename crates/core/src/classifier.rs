//! Record classification: raw vendor event -> typed, timestamped record.
//!
//! [`EventKind`] is the dispatch table from vendor type codes to record
//! shapes. Each kind deserializes its own typed content struct, so a missing
//! or mistyped field fails that single event with
//! [`CoreError::InvalidContent`]. Unknown codes pass through as
//! [`Record::Unclassified`].

use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::device::{Device, RawEvent};
use crate::error::CoreError;
use crate::pets::PetLookup;
use crate::record::{
    MaintenanceKind, MaintenanceRecord, PresenceRecord, Record, TimedRecord, TriggerReason,
    UnclassifiedEvent,
};
use crate::types::{format_local, UnixSeconds};

// ---------------------------------------------------------------------------
// Event type codes
// ---------------------------------------------------------------------------

pub const EVENT_CLEAN: i64 = 5;
pub const EVENT_RESET: i64 = 7;
pub const EVENT_DEORDER: i64 = 8;
pub const EVENT_PRESENCE: i64 = 10;

/// Recognized vendor event kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Presence,
    Clean,
    Deorder,
    Reset,
}

impl EventKind {
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            EVENT_PRESENCE => Some(Self::Presence),
            EVENT_CLEAN => Some(Self::Clean),
            EVENT_DEORDER => Some(Self::Deorder),
            EVENT_RESET => Some(Self::Reset),
            _ => None,
        }
    }

    pub fn code(self) -> i64 {
        match self {
            Self::Presence => EVENT_PRESENCE,
            Self::Clean => EVENT_CLEAN,
            Self::Deorder => EVENT_DEORDER,
            Self::Reset => EVENT_RESET,
        }
    }
}

// ---------------------------------------------------------------------------
// Typed content
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PresenceContent {
    time_in: UnixSeconds,
    time_out: UnixSeconds,
    pet_weight: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CleanContent {
    start_time: UnixSeconds,
    start_reason: i64,
    litter_percent: i64,
    box_full: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeorderContent {
    start_time: UnixSeconds,
    start_reason: i64,
    liquid: i64,
    liquid_lack: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResetContent {
    start_time: UnixSeconds,
    start_reason: i64,
}

fn parse_content<T: DeserializeOwned>(kind: EventKind, event: &RawEvent) -> Result<T, CoreError> {
    T::deserialize(&event.content).map_err(|e| CoreError::InvalidContent {
        event_type: kind.code(),
        reason: e.to_string(),
    })
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

/// Classify one raw event reported by `device`.
///
/// The returned timestamp is the raw vendor value; the record's own time
/// fields are rendered in local time. `pets` is only consulted for presence
/// events.
pub fn classify<P>(device: &Device, event: &RawEvent, pets: &P) -> Result<TimedRecord, CoreError>
where
    P: PetLookup + ?Sized,
{
    let Some(kind) = EventKind::from_code(event.event_type) else {
        let passthrough = Record::Unclassified(UnclassifiedEvent {
            device_name: device.name.clone(),
            event: event.clone(),
        });
        return Ok((event.timestamp, passthrough));
    };

    let record = match kind {
        EventKind::Presence => {
            let c: PresenceContent = parse_content(kind, event)?;
            Record::Presence(PresenceRecord {
                time_start: format_local(c.time_in),
                time_end: format_local(c.time_out),
                duration: c.time_out - c.time_in,
                pet_name: pets.pet_for_weight(c.pet_weight)?,
                weight: c.pet_weight,
                device_name: device.name.clone(),
            })
        }
        EventKind::Clean => {
            let c: CleanContent = parse_content(kind, event)?;
            let mut record =
                maintenance(MaintenanceKind::Clean, device, event, c.start_time, c.start_reason);
            record.litter_percent = Some(c.litter_percent);
            record.need_clean = Some(c.box_full);
            Record::Maintenance(record)
        }
        EventKind::Deorder => {
            let c: DeorderContent = parse_content(kind, event)?;
            let mut record =
                maintenance(MaintenanceKind::Deorder, device, event, c.start_time, c.start_reason);
            record.deoder_percent = Some(c.liquid);
            record.refill_deoder = Some(c.liquid_lack);
            Record::Maintenance(record)
        }
        EventKind::Reset => {
            let c: ResetContent = parse_content(kind, event)?;
            Record::Maintenance(maintenance(
                MaintenanceKind::Reset,
                device,
                event,
                c.start_time,
                c.start_reason,
            ))
        }
    };

    Ok((event.timestamp, record))
}

/// Fields shared by every maintenance cycle. The cycle ends at the event
/// timestamp.
fn maintenance(
    event_name: MaintenanceKind,
    device: &Device,
    event: &RawEvent,
    start_time: UnixSeconds,
    start_reason: i64,
) -> MaintenanceRecord {
    MaintenanceRecord {
        time_start: format_local(start_time),
        time_end: format_local(event.timestamp),
        duration: event.timestamp - start_time,
        event_name,
        trigger_reason: TriggerReason::lenient(start_reason),
        litter_percent: None,
        need_clean: None,
        deoder_percent: None,
        refill_deoder: None,
        device_name: device.name.clone(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
