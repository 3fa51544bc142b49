use serde::{Deserialize, Serialize};

/// Task priority level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Med,
    High,
}

impl Default for Priority {
    fn default() -> Self {
        Priority::Med
    }
}

impl Priority {
    /// Parse priority from a tag like "high" (case-insensitive)
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag.to_lowercase().as_str() {
            "low" => Some(Self::Low),
            "med" | "medium" => Some(Self::Med),
            "high" => Some(Self::High),
            _ => None,
        }
    }

    /// Convert priority to its canonical tag
    pub fn as_tag(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Med => "med",
            Self::High => "high",
        }
    }

    /// Short badge for list output
    pub fn badge(&self) -> &'static str {
        match self {
            Self::Low => "·",
            Self::Med => "•",
            Self::High => "!",
        }
    }
}
