use std::fmt;

use rust_decimal::Decimal;
use thiserror::Error;

use crate::models::{PaymentStatus, StageStatus};

pub type Result<T> = std::result::Result<T, EngineError>;

/// Every way a tournament operation can be refused.
///
/// None of these are fatal: the caller corrects its input, or re-reads the
/// current state, and tries again.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Eligibility(#[from] EligibilityError),

    #[error(transparent)]
    Conflict(#[from] ConflictError),

    #[error("{0} not found")]
    NotFound(Entity),
}

/// Coarse family of an [`EngineError`], for callers mapping failures to their
/// own status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Eligibility,
    Conflict,
    NotFound,
}

impl EngineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::Eligibility(_) => ErrorKind::Eligibility,
            Self::Conflict(_) => ErrorKind::Conflict,
            Self::NotFound(_) => ErrorKind::NotFound,
        }
    }
}

/// Malformed or out-of-range input.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("unknown species '{0}'")]
    UnknownSpecies(String),

    #[error("unknown {field} '{value}'")]
    UnknownValue { field: &'static str, value: String },

    #[error("penalty {0} must be between 0 and 3")]
    PenaltyOutOfRange(Decimal),

    #[error("size {0} cannot be negative")]
    NegativeSize(Decimal),

    #[error("{field} {value} has more than 2 decimal places")]
    TooPrecise { field: &'static str, value: Decimal },

    #[error("fish below minimum size after penalty: {final_size} < {minimum}")]
    BelowMinimumSize { final_size: Decimal, minimum: Decimal },

    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("ruler count must be at least 1, got {0}")]
    InvalidRulerCount(i32),

    #[error("edition year {0} is out of range")]
    InvalidYear(i32),

    #[error("no changes requested")]
    NothingToUpdate,
}

/// The competitor, stage or registration does not currently permit the action.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EligibilityError {
    #[error("fishing license expired or not provided")]
    LicenseExpired,

    #[error("competitor is inactive")]
    CompetitorInactive,

    #[error("competitor is banned from the tournament")]
    CompetitorBanned,

    #[error("competitor has been removed")]
    CompetitorRemoved,

    #[error("stage is not open for registrations (status: {0})")]
    StageNotOpen(StageStatus),

    #[error("stage has no available slots (capacity {capacity})")]
    StageFull { capacity: i32 },

    #[error("stage start time has already passed")]
    StageAlreadyStarted,

    #[error("payment not confirmed")]
    PaymentNotConfirmed,

    #[error("competitor eliminated")]
    Eliminated,

    #[error("fish quota reached ({max} peacock bass)")]
    QuotaReached { max: usize },
}

/// The action clashes with the entity's current state; re-fetch before retrying.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConflictError {
    #[error("capture has already been validated")]
    AlreadyValidated,

    #[error("capture has already been annulled")]
    AlreadyAnnulled,

    #[error("competitor is already registered for this stage")]
    AlreadyRegistered,

    #[error("registration has already been eliminated")]
    AlreadyEliminated,

    #[error("competitor is already banned")]
    AlreadyBanned,

    #[error("competitor is not banned")]
    NotBanned,

    #[error("payment cannot move from {from} to {to}")]
    InvalidPaymentTransition { from: PaymentStatus, to: PaymentStatus },

    #[error("stage cannot move from {from} to {to}")]
    InvalidStageTransition { from: StageStatus, to: StageStatus },

    #[error("no ruler assigned to this registration")]
    NoRulerAssigned,

    #[error("ruler has already been returned")]
    RulerAlreadyReturned,

    #[error("ruler does not belong to this registration")]
    RulerMismatch,

    #[error("no registrations awaiting a ruler")]
    NothingToAssign,

    #[error("insufficient rulers: {available} available for {required} registrations")]
    InsufficientRulers { available: usize, required: usize },

    #[error("ruler {0} is in use and cannot be deleted")]
    RulerInUse(i32),

    #[error("an edition for {0} already exists")]
    EditionYearTaken(i32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Edition,
    Competitor,
    Stage,
    Registration,
    Capture,
    Ruler,
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Edition => "edition",
            Self::Competitor => "competitor",
            Self::Stage => "stage",
            Self::Registration => "registration",
            Self::Capture => "capture",
            Self::Ruler => "ruler",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_follows_family() {
        let err: EngineError = ConflictError::AlreadyValidated.into();
        assert_eq!(err.kind(), ErrorKind::Conflict);

        let err: EngineError = EligibilityError::LicenseExpired.into();
        assert_eq!(err.kind(), ErrorKind::Eligibility);

        assert_eq!(EngineError::NotFound(Entity::Ruler).kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_messages_are_readable() {
        let err = EngineError::from(ValidationError::BelowMinimumSize {
            final_size: Decimal::from(18),
            minimum: Decimal::from(20),
        });
        assert_eq!(
            err.to_string(),
            "fish below minimum size after penalty: 18 < 20"
        );
        assert_eq!(
            EngineError::NotFound(Entity::Stage).to_string(),
            "stage not found"
        );
    }
}
