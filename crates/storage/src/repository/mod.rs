use std::str::FromStr;

use engine::error::ValidationError;

use crate::error::{Result, StorageError};

pub mod capture;
pub mod competitor;
pub mod edition;
pub mod ranking;
pub mod registration;
pub mod ruler;
pub mod stage;

pub use capture::CaptureRepository;
pub use competitor::CompetitorRepository;
pub use edition::EditionRepository;
pub use ranking::RankingRepository;
pub use registration::RegistrationRepository;
pub use ruler::RulerRepository;
pub use stage::StageRepository;

/// Parses a text column into one of the closed domain enums.
pub(crate) fn parse_column<T>(value: &str) -> Result<T>
where
    T: FromStr<Err = ValidationError>,
{
    value
        .parse()
        .map_err(|e: ValidationError| StorageError::InvalidRow(e.to_string()))
}
