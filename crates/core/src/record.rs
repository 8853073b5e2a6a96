//! Normalized records produced by the classifier and their sheet layout.
//!
//! Every record knows which sheet partition it belongs to and how to render
//! itself as a row whose columns line up with its partition's header.

use serde::Serialize;
use serde_json::Value;

use crate::device::RawEvent;
use crate::types::{format_local, UnixSeconds};

// ---------------------------------------------------------------------------
// Partition names
// ---------------------------------------------------------------------------

/// Partition for presence events whose pet could not be resolved.
pub const UNKNOWN_PARTITION: &str = "unknown";

/// Partition for maintenance cycles and unclassified events.
pub const OTHER_PARTITION: &str = "other";

// ---------------------------------------------------------------------------
// Trigger reason
// ---------------------------------------------------------------------------

/// Known `startReason` codes and their labels.
pub const TRIGGER_REASONS: &[(i64, &str)] = &[(0, "auto"), (1, "periodic"), (2, "manual")];

/// Why a maintenance cycle started.
///
/// Serializes as the label for known codes and as the raw number otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum TriggerReason {
    Named(&'static str),
    Raw(i64),
}

impl TriggerReason {
    /// Label for a known code, if any.
    pub fn label(code: i64) -> Option<&'static str> {
        TRIGGER_REASONS
            .iter()
            .find(|(known, _)| *known == code)
            .map(|(_, label)| *label)
    }

    /// Map a code to its label, keeping the raw code when it is unknown.
    pub fn lenient(code: i64) -> Self {
        Self::label(code).map_or(Self::Raw(code), Self::Named)
    }
}

// ---------------------------------------------------------------------------
// Presence
// ---------------------------------------------------------------------------

/// A pet visited the litter box.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PresenceRecord {
    pub time_start: String,
    pub time_end: String,
    /// Seconds spent in the box.
    pub duration: i64,
    pub pet_name: Option<String>,
    /// Scale reading in grams.
    pub weight: i64,
    pub device_name: String,
}

impl PresenceRecord {
    pub const HEADER: [&'static str; 6] = [
        "time_start",
        "time_end",
        "duration",
        "pet_name",
        "weight",
        "device_name",
    ];

    pub fn to_row(&self) -> Vec<Value> {
        vec![
            Value::from(self.time_start.as_str()),
            Value::from(self.time_end.as_str()),
            Value::from(self.duration),
            self.pet_name.as_deref().map_or(Value::Null, Value::from),
            Value::from(self.weight),
            Value::from(self.device_name.as_str()),
        ]
    }
}

// ---------------------------------------------------------------------------
// Maintenance
// ---------------------------------------------------------------------------

/// Which maintenance cycle ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MaintenanceKind {
    Clean,
    /// Vendor spelling, kept so existing sheets stay consistent.
    Deorder,
    Reset,
}

impl MaintenanceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Clean => "clean",
            Self::Deorder => "deorder",
            Self::Reset => "reset",
        }
    }
}

/// A clean, deodorize or reset cycle.
///
/// Fields that do not apply to the cycle kind stay `None`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MaintenanceRecord {
    pub time_start: String,
    pub time_end: String,
    pub duration: i64,
    pub event_name: MaintenanceKind,
    pub trigger_reason: TriggerReason,
    pub litter_percent: Option<i64>,
    pub need_clean: Option<bool>,
    pub deoder_percent: Option<i64>,
    pub refill_deoder: Option<bool>,
    pub device_name: String,
}

impl MaintenanceRecord {
    pub const HEADER: [&'static str; 10] = [
        "time_start",
        "time_end",
        "duration",
        "event_name",
        "trigger_reason",
        "litter_percent",
        "need_clean",
        "deoder_percent",
        "refill_deoder",
        "device_name",
    ];

    pub fn to_row(&self) -> Vec<Value> {
        let reason = match self.trigger_reason {
            TriggerReason::Named(label) => Value::from(label),
            TriggerReason::Raw(code) => Value::from(code),
        };
        vec![
            Value::from(self.time_start.as_str()),
            Value::from(self.time_end.as_str()),
            Value::from(self.duration),
            Value::from(self.event_name.as_str()),
            reason,
            Value::from(self.litter_percent),
            Value::from(self.need_clean),
            Value::from(self.deoder_percent),
            Value::from(self.refill_deoder),
            Value::from(self.device_name.as_str()),
        ]
    }
}

// ---------------------------------------------------------------------------
// Record
// ---------------------------------------------------------------------------

/// An event whose type code the classifier does not recognize.
#[derive(Debug, Clone, PartialEq)]
pub struct UnclassifiedEvent {
    pub device_name: String,
    pub event: RawEvent,
}

/// Output of the classifier.
#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    Presence(PresenceRecord),
    Maintenance(MaintenanceRecord),
    Unclassified(UnclassifiedEvent),
}

/// A record paired with the raw vendor timestamp that drives the watermark.
pub type TimedRecord = (UnixSeconds, Record);

impl Record {
    /// Sheet partition this record is written to.
    ///
    /// Presence records without a usable pet name go to
    /// [`UNKNOWN_PARTITION`]. A pet named like [`OTHER_PARTITION`] is also
    /// sent there, since `other` carries the maintenance columns.
    pub fn partition(&self) -> &str {
        match self {
            Self::Presence(p) => match p.pet_name.as_deref() {
                Some(name) if !name.is_empty() && name != OTHER_PARTITION => name,
                _ => UNKNOWN_PARTITION,
            },
            Self::Maintenance(_) | Self::Unclassified(_) => OTHER_PARTITION,
        }
    }

    /// Column names for the partition this record lands in.
    pub fn header(&self) -> &'static [&'static str] {
        match self {
            Self::Presence(_) => &PresenceRecord::HEADER,
            Self::Maintenance(_) | Self::Unclassified(_) => &MaintenanceRecord::HEADER,
        }
    }

    pub fn to_row(&self) -> Vec<Value> {
        match self {
            Self::Presence(p) => p.to_row(),
            Self::Maintenance(m) => m.to_row(),
            Self::Unclassified(u) => {
                // Only the fields every event carries are known.
                let at = format_local(u.event.timestamp);
                let mut row = vec![Value::Null; MaintenanceRecord::HEADER.len()];
                row[0] = Value::from(at.as_str());
                row[1] = Value::from(at);
                row[3] = Value::from(format!("event_{}", u.event.event_type));
                row[9] = Value::from(u.device_name.as_str());
                row
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn presence(pet_name: Option<&str>) -> PresenceRecord {
        PresenceRecord {
            time_start: "a".into(),
            time_end: "b".into(),
            duration: 40,
            pet_name: pet_name.map(str::to_string),
            weight: 4200,
            device_name: "Box".into(),
        }
    }

    #[test]
    fn lenient_reason_keeps_unknown_code() {
        assert_eq!(TriggerReason::lenient(1), TriggerReason::Named("periodic"));
        assert_eq!(TriggerReason::lenient(9), TriggerReason::Raw(9));
    }

    #[test]
    fn presence_partition_falls_back_to_unknown() {
        assert_eq!(Record::Presence(presence(Some("Mochi"))).partition(), "Mochi");
        assert_eq!(Record::Presence(presence(None)).partition(), UNKNOWN_PARTITION);
    }

    #[test]
    fn unusable_pet_names_go_to_unknown() {
        for name in ["", OTHER_PARTITION] {
            let record = Record::Presence(presence(Some(name)));
            assert_eq!(record.partition(), UNKNOWN_PARTITION);
            assert_eq!(record.header().len(), record.to_row().len());
            assert_eq!(record.to_row()[3], Value::from(name));
        }
    }

    #[test]
    fn presence_row_matches_header_width() {
        let row = presence(None).to_row();
        assert_eq!(row.len(), PresenceRecord::HEADER.len());
        assert!(row[3].is_null());
        assert_eq!(row[4], 4200);
    }

    #[test]
    fn maintenance_row_leaves_unused_fields_null() {
        let record = MaintenanceRecord {
            time_start: "a".into(),
            time_end: "b".into(),
            duration: 30,
            event_name: MaintenanceKind::Reset,
            trigger_reason: TriggerReason::Raw(7),
            litter_percent: None,
            need_clean: None,
            deoder_percent: None,
            refill_deoder: None,
            device_name: "Box".into(),
        };
        let row = record.to_row();
        assert_eq!(row.len(), MaintenanceRecord::HEADER.len());
        assert_eq!(row[3], "reset");
        assert_eq!(row[4], 7);
        assert!(row[5..9].iter().all(Value::is_null));
    }

    #[test]
    fn unclassified_goes_to_other_with_common_fields() {
        let record = Record::Unclassified(UnclassifiedEvent {
            device_name: "Box".into(),
            event: RawEvent {
                event_type: 42,
                timestamp: 100,
                content: serde_json::json!({"foo": 1}),
            },
        });
        assert_eq!(record.partition(), OTHER_PARTITION);
        let row = record.to_row();
        assert_eq!(row.len(), MaintenanceRecord::HEADER.len());
        assert_eq!(row[3], "event_42");
        assert_eq!(row[9], "Box");
        assert!(row[2].is_null(), "duration must not be invented");
    }

    #[test]
    fn trigger_reason_serializes_untagged() {
        assert_eq!(
            serde_json::to_value(TriggerReason::Named("auto")).unwrap(),
            serde_json::json!("auto")
        );
        assert_eq!(
            serde_json::to_value(TriggerReason::Raw(5)).unwrap(),
            serde_json::json!(5)
        );
    }
}
