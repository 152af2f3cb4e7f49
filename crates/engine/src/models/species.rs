use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Minimum final size (cm) for either peacock bass species.
pub const PEACOCK_BASS_MIN_SIZE: i64 = 20;

/// The three species accepted by the tournament.
///
/// Wire names are the Portuguese common names used on the score sheets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Species {
    #[serde(rename = "tucunare_azul")]
    BluePeacockBass,
    #[serde(rename = "tucunare_amarelo")]
    YellowPeacockBass,
    #[serde(rename = "traira")]
    Wolffish,
}

impl Species {
    pub const ALL: [Species; 3] = [
        Species::BluePeacockBass,
        Species::YellowPeacockBass,
        Species::Wolffish,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BluePeacockBass => "tucunare_azul",
            Self::YellowPeacockBass => "tucunare_amarelo",
            Self::Wolffish => "traira",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::BluePeacockBass => "Tucunaré Azul",
            Self::YellowPeacockBass => "Tucunaré Amarelo",
            Self::Wolffish => "Traíra",
        }
    }

    /// Smallest final size a validated catch may have, `None` when unconstrained.
    pub fn minimum_size(&self) -> Option<Decimal> {
        match self {
            Self::BluePeacockBass | Self::YellowPeacockBass => {
                Some(Decimal::from(PEACOCK_BASS_MIN_SIZE))
            }
            Self::Wolffish => None,
        }
    }

    /// Wolffish never occupies one of the quota slots.
    pub fn is_quota_exempt(&self) -> bool {
        matches!(self, Self::Wolffish)
    }
}

impl fmt::Display for Species {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Species {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Species::ALL
            .into_iter()
            .find(|species| species.as_str() == s)
            .ok_or_else(|| ValidationError::UnknownSpecies(s.to_string()))
    }
}
