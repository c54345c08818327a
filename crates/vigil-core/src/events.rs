//! Event types emitted by the session engine.
//!
//! Every event is delivered in-process to registered observers (the UI
//! layer, or the submission assembler's activity log). The Integrity
//! Monitor emits a full `IntegrityState` snapshot after every sample.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::{
    AssessmentId, CandidateId, CompletionReason, FlagOrigin, IntegrityState, SessionId, Severity,
};

/// Unique identifier for an event.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct EventId(pub Uuid);

impl EventId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for EventId {
    fn default() -> Self {
        Self::new()
    }
}

/// An event emitted by a running session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VigilEvent {
    pub id: EventId,
    pub session_id: SessionId,
    pub timestamp: DateTime<Utc>,
    pub payload: SessionEvent,
}

impl VigilEvent {
    pub fn new(session_id: SessionId, payload: SessionEvent) -> Self {
        Self {
            id: EventId::new(),
            session_id,
            timestamp: Utc::now(),
            payload,
        }
    }
}

/// The event payload, tagged by type.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event_type")]
pub enum SessionEvent {
    /// The candidate accepted the instructions and the session went live.
    SessionStarted {
        assessment_id: AssessmentId,
        candidate_id: CandidateId,
    },
    /// One second elapsed on the session clock.
    ClockTick { remaining_seconds: u64 },
    /// An integrity violation was observed.
    RedFlagRaised {
        description: String,
        severity: Severity,
        origin: FlagOrigin,
    },
    /// A monitor sample completed; carries the full integrity snapshot.
    IntegritySampled { state: IntegrityState },
    /// Camera/microphone acquisition was refused; face sampling is off.
    PermissionDenied,
    /// The session reached a terminal state.
    SessionSubmitted {
        reason: CompletionReason,
        time_spent_seconds: u64,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_serialization_roundtrip() {
        let event = VigilEvent::new(
            SessionId::new(),
            SessionEvent::SessionStarted {
                assessment_id: AssessmentId::new(),
                candidate_id: CandidateId::new(),
            },
        );

        let json = serde_json::to_string(&event).unwrap();
        let deserialized: VigilEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(event.id, deserialized.id);
    }

    #[test]
    fn event_payload_tags() {
        let payload = SessionEvent::RedFlagRaised {
            description: "Tab switching detected".to_string(),
            severity: Severity::Warning,
            origin: FlagOrigin::Guard,
        };

        let json = serde_json::to_string(&payload).unwrap();
        assert!(json.contains("\"event_type\":\"RedFlagRaised\""));
        assert!(json.contains("\"severity\":\"warning\""));
    }
}
