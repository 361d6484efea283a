use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Priority
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    High,
    Medium,
    Low,
}

/// Rank given to fichas whose priority could not be interpreted.
pub const UNRANKED: u8 = 4;

impl Priority {
    pub fn all() -> &'static [Priority] {
        &[Priority::High, Priority::Medium, Priority::Low]
    }

    pub fn rank(self) -> u8 {
        match self {
            Priority::High => 1,
            Priority::Medium => 2,
            Priority::Low => 3,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }

    /// Lowercase labels accepted for this priority, canonical first.
    pub fn labels(self) -> &'static [&'static str] {
        match self {
            Priority::High => &["high", "alta"],
            Priority::Medium => &["medium", "media"],
            Priority::Low => &["low", "baja"],
        }
    }

    /// Interpret free-text priority labels, including the legacy Spanish ones.
    ///
    /// Matching is case-insensitive and ignores surrounding whitespace.
    /// Anything unrecognized yields `None`, which ranks last.
    pub fn normalize(raw: &str) -> Option<Priority> {
        let label = raw.trim().to_lowercase();
        Priority::all()
            .iter()
            .copied()
            .find(|p| p.labels().contains(&label.as_str()))
    }
}

/// Triage rank of an optional priority: high=1, medium=2, low=3, unknown=4.
pub fn rank_of(priority: Option<Priority>) -> u8 {
    priority.map(Priority::rank).unwrap_or(UNRANKED)
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Priority {
    type Err = crate::error::FichaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Priority::normalize(s)
            .ok_or_else(|| crate::error::FichaError::InvalidRecord(format!("unknown priority '{s}'")))
    }
}

// ---------------------------------------------------------------------------
// FichaState
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FichaState {
    #[default]
    Pending,
    Contacted,
    Discarded,
}

impl FichaState {
    pub fn all() -> &'static [FichaState] {
        &[
            FichaState::Pending,
            FichaState::Contacted,
            FichaState::Discarded,
        ]
    }

    /// Any ficha may be discarded; only a pending one may be contacted.
    /// Nothing moves back to pending. Re-entering the current state is allowed.
    pub fn can_move_to(self, target: FichaState) -> bool {
        if self == target {
            return true;
        }
        match target {
            FichaState::Discarded => true,
            FichaState::Contacted => self == FichaState::Pending,
            FichaState::Pending => false,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FichaState::Pending => "pending",
            FichaState::Contacted => "contacted",
            FichaState::Discarded => "discarded",
        }
    }

    /// Lowercase labels accepted for this state, canonical first.
    pub fn labels(self) -> &'static [&'static str] {
        match self {
            FichaState::Pending => &["pending", "pendiente"],
            FichaState::Contacted => &["contacted", "contactado"],
            FichaState::Discarded => &["discarded", "descartado"],
        }
    }

    /// Case-insensitive parse that also accepts the legacy Spanish labels.
    pub fn normalize(raw: &str) -> Option<FichaState> {
        let label = raw.trim().to_lowercase();
        FichaState::all()
            .iter()
            .copied()
            .find(|s| s.labels().contains(&label.as_str()))
    }
}

impl fmt::Display for FichaState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for FichaState {
    type Err = crate::error::FichaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FichaState::normalize(s)
            .ok_or_else(|| crate::error::FichaError::InvalidRecord(format!("unknown state '{s}'")))
    }
}
