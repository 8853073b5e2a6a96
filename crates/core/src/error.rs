#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Invalid content for event type {event_type}: {reason}")]
    InvalidContent { event_type: i64, reason: String },

    #[error("Pet roster is empty")]
    EmptyRoster,

    #[error("Pet roster has not been loaded")]
    RosterNotLoaded,

    #[error("Validation failed: {0}")]
    Validation(String),
}

impl CoreError {
    /// Errors that make every further classification in the session fail,
    /// as opposed to a problem with one event's payload.
    pub fn is_session_wide(&self) -> bool {
        matches!(self, Self::EmptyRoster | Self::RosterNotLoaded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roster_errors_are_session_wide() {
        assert!(CoreError::EmptyRoster.is_session_wide());
        assert!(CoreError::RosterNotLoaded.is_session_wide());
        assert!(!CoreError::InvalidContent {
            event_type: 5,
            reason: "missing field `startTime`".into(),
        }
        .is_session_wide());
    }

    #[test]
    fn display_invalid_content() {
        let err = CoreError::InvalidContent {
            event_type: 10,
            reason: "missing field `petWeight`".into(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid content for event type 10: missing field `petWeight`"
        );
    }
}
