use std::fmt;

use serde::{Deserialize, Serialize};

/// Raw hazard category reported by the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Disaster {
    Earthquake,
    Flood,
}

impl Disaster {
    pub fn as_str(self) -> &'static str {
        match self {
            Disaster::Earthquake => "earthquake",
            Disaster::Flood => "flood",
        }
    }
}

impl fmt::Display for Disaster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Display-level state carried by every district.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisasterType {
    #[default]
    None,
    Earthquake,
    Flood,
    Both,
}

impl DisasterType {
    pub fn is_affected(self) -> bool {
        self != DisasterType::None
    }

    pub fn has_earthquake(self) -> bool {
        matches!(self, DisasterType::Earthquake | DisasterType::Both)
    }

    pub fn has_flood(self) -> bool {
        matches!(self, DisasterType::Flood | DisasterType::Both)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DisasterType::None => "none",
            DisasterType::Earthquake => "earthquake",
            DisasterType::Flood => "flood",
            DisasterType::Both => "both",
        }
    }
}

impl fmt::Display for DisasterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Collapses a set of hazard categories into the display type. Duplicates and
/// ordering are irrelevant.
pub fn normalize(categories: &[Disaster]) -> DisasterType {
    let earthquake = categories.contains(&Disaster::Earthquake);
    let flood = categories.contains(&Disaster::Flood);
    match (earthquake, flood) {
        (false, false) => DisasterType::None,
        (true, false) => DisasterType::Earthquake,
        (false, true) => DisasterType::Flood,
        (true, true) => DisasterType::Both,
    }
}
