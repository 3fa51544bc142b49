use serde::{Deserialize, Serialize};

/// Aggregate usage record.
///
/// `completed` is a lifetime counter of tasks marked done; toggling a task
/// back to incomplete does not decrement it. Unknown fields from older or
/// newer exports are preserved through the flattened map so a round-trip
/// never drops them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    #[serde(default)]
    pub completed: u64,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Stats {
    pub fn record_completion(&mut self) {
        self.completed += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_completion_increments() {
        let mut stats = Stats::default();
        assert_eq!(stats.completed, 0);
        stats.record_completion();
        stats.record_completion();
        assert_eq!(stats.completed, 2);
    }

    #[test]
    fn test_unknown_fields_survive_round_trip() {
        let json = r#"{"completed": 4, "streakDays": 12}"#;
        let stats: Stats = serde_json::from_str(json).unwrap();
        assert_eq!(stats.completed, 4);

        let back = serde_json::to_value(&stats).unwrap();
        assert_eq!(back["streakDays"], 12);
    }

    #[test]
    fn test_empty_record_defaults() {
        let stats: Stats = serde_json::from_str("{}").unwrap();
        assert_eq!(stats.completed, 0);
        assert!(stats.extra.is_empty());
    }
}
