use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Species;
use crate::error::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankingCategory {
    Overall,
    LargestBlue,
    LargestYellow,
    LargestWolffish,
}

impl RankingCategory {
    pub const ALL: [RankingCategory; 4] = [
        RankingCategory::Overall,
        RankingCategory::LargestBlue,
        RankingCategory::LargestYellow,
        RankingCategory::LargestWolffish,
    ];

    pub fn largest(species: Species) -> Self {
        match species {
            Species::BluePeacockBass => Self::LargestBlue,
            Species::YellowPeacockBass => Self::LargestYellow,
            Species::Wolffish => Self::LargestWolffish,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Overall => "overall",
            Self::LargestBlue => "largest_blue",
            Self::LargestYellow => "largest_yellow",
            Self::LargestWolffish => "largest_wolffish",
        }
    }
}

impl fmt::Display for RankingCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RankingCategory {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RankingCategory::ALL
            .into_iter()
            .find(|category| category.as_str() == s)
            .ok_or_else(|| ValidationError::UnknownValue {
                field: "ranking category",
                value: s.to_string(),
            })
    }
}

/// Prize attached to a ranking entry. Serialized as its printed label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum Award {
    /// Podium place, 1 to 3.
    Place(u8),
    Largest(Species),
}

impl Award {
    pub const PODIUM_PLACES: usize = 3;

    /// Podium award for a 1-based position, if it earns one.
    pub fn for_position(position: usize) -> Option<Self> {
        (1..=Self::PODIUM_PLACES)
            .contains(&position)
            .then(|| Self::Place(position as u8))
    }

    pub fn label(&self) -> String {
        match self {
            Self::Place(place) => format!("{place}º Lugar"),
            Self::Largest(species) => format!("Maior {}", species.display_name()),
        }
    }
}

impl fmt::Display for Award {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

impl FromStr for Award {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let podium = (1..=Self::PODIUM_PLACES as u8).map(Award::Place);
        let largest = Species::ALL.into_iter().map(Award::Largest);

        podium
            .chain(largest)
            .find(|award| award.label() == s)
            .ok_or_else(|| ValidationError::UnknownValue {
                field: "award",
                value: s.to_string(),
            })
    }
}

impl From<Award> for String {
    fn from(award: Award) -> Self {
        award.label()
    }
}

impl TryFrom<String> for Award {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// One line of a stage ranking snapshot. Derived, never authoritative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingEntry {
    pub stage_id: Uuid,
    pub registration_id: Uuid,
    pub position: i32,
    pub total_score: Decimal,
    pub largest_fish: Decimal,
    pub counted_fish: i32,
    pub category: RankingCategory,
    pub award: Option<Award>,
    pub generated_at: DateTime<Utc>,
}
