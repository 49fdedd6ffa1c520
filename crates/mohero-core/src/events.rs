use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Every state change in the system produces an Event.
/// Front ends print or forward them; nothing consumes them internally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    SignedIn {
        user_id: String,
        at: DateTime<Utc>,
    },
    SignedOut {
        at: DateTime<Utc>,
    },
    SessionRefreshed {
        user_id: String,
        expires_at: DateTime<Utc>,
    },
    ProgramSelected {
        program_id: String,
        previous_program_id: Option<String>,
        records_cleared: usize,
        at: DateTime<Utc>,
    },
    ExerciseUpdated {
        exercise_id: String,
        day: u32,
        value: u32,
        target: u32,
        completed: bool,
        at: DateTime<Utc>,
    },
    RitualCompleted {
        day: u32,
        next_day: u32,
        streak: u32,
        total_completed_days: u32,
        at: DateTime<Utc>,
    },
    /// Calendar roll-over moved the current day forward.
    DayAdvanced {
        from_day: u32,
        to_day: u32,
        total_completed_days: u32,
        all_exercises_completed: bool,
        at: DateTime<Utc>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_type_tag() {
        let event = Event::SignedOut { at: Utc::now() };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "SignedOut");
    }
}
