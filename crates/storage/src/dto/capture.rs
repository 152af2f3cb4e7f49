use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use engine::capture::{MAX_PENALTY, NewCapture, Officiating, fits_scale};
use engine::error::ValidationError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::Species;

/// A catch submitted by a competitor, with the link to its video evidence
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateCaptureRequest {
    #[validate(custom(function = "validate_species"))]
    pub species: String,

    #[validate(custom(function = "validate_size"))]
    pub original_size: Decimal,

    #[validate(url(message = "Evidence must be a URL"))]
    #[validate(length(max = 500))]
    pub evidence_url: String,

    pub captured_at: Option<DateTime<Utc>>,

    #[validate(length(max = 2000))]
    pub notes: Option<String>,
}

impl TryFrom<CreateCaptureRequest> for NewCapture {
    type Error = ValidationError;

    fn try_from(request: CreateCaptureRequest) -> Result<Self, Self::Error> {
        Ok(Self {
            species: request.species.parse()?,
            original_size: request.original_size,
            evidence_url: request.evidence_url,
            captured_at: request.captured_at,
            notes: request.notes,
        })
    }
}

/// An official's ruling on a pending catch
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ValidateCaptureRequest {
    #[validate(length(min = 1, max = 100, message = "Validator name is required"))]
    pub validated_by: String,

    #[validate(custom(function = "validate_penalty"))]
    #[serde(default)]
    pub penalty: Decimal,

    #[validate(length(max = 1000))]
    pub penalty_reason: Option<String>,
}

impl From<ValidateCaptureRequest> for Officiating {
    fn from(request: ValidateCaptureRequest) -> Self {
        Self {
            validator: request.validated_by,
            penalty: request.penalty,
            penalty_reason: request.penalty_reason,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AnnulCaptureRequest {
    #[validate(length(min = 1, max = 1000, message = "An annulment needs a reason"))]
    pub reason: String,
}

/// Where a capture stands in officiating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptureStatus {
    /// Waiting for an official: neither validated nor annulled.
    Pending,
    /// Validated and not annulled, so it counts.
    Validated,
    Annulled,
}

impl CaptureStatus {
    pub const ALL: [CaptureStatus; 3] = [
        CaptureStatus::Pending,
        CaptureStatus::Validated,
        CaptureStatus::Annulled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Validated => "validated",
            Self::Annulled => "annulled",
        }
    }
}

impl fmt::Display for CaptureStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CaptureStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CaptureStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| ValidationError::UnknownValue {
                field: "capture status",
                value: s.to_string(),
            })
    }
}

/// Narrows a capture listing. Every field is optional and they combine with AND.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CaptureFilter {
    pub stage_id: Option<Uuid>,
    pub registration_id: Option<Uuid>,
    pub species: Option<Species>,
    pub status: Option<CaptureStatus>,
}

fn validate_species(species: &str) -> Result<(), validator::ValidationError> {
    if species.parse::<Species>().is_ok() {
        Ok(())
    } else {
        Err(validator::ValidationError::new("invalid_species"))
    }
}

fn validate_size(size: &Decimal) -> Result<(), validator::ValidationError> {
    if *size < Decimal::ZERO {
        return Err(validator::ValidationError::new("negative_size"));
    }
    if !fits_scale(*size) {
        return Err(validator::ValidationError::new("too_many_decimal_places"));
    }
    Ok(())
}

fn validate_penalty(penalty: &Decimal) -> Result<(), validator::ValidationError> {
    if *penalty < Decimal::ZERO || *penalty > Decimal::from(MAX_PENALTY) {
        return Err(validator::ValidationError::new("penalty_out_of_range"));
    }
    if !fits_scale(*penalty) {
        return Err(validator::ValidationError::new("too_many_decimal_places"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn capture_json(species: &str, size: &str) -> String {
        format!(
            r#"{{
                "species": "{species}",
                "original_size": "{size}",
                "evidence_url": "https://videos.example.com/c/981.mp4",
                "captured_at": null,
                "notes": null
            }}"#
        )
    }

    #[test]
    fn test_capture_request_validation() {
        let request: CreateCaptureRequest =
            serde_json::from_str(&capture_json("tucunare_azul", "42.5")).unwrap();
        assert!(request.validate().is_ok());

        let request: CreateCaptureRequest =
            serde_json::from_str(&capture_json("pirarucu", "42.5")).unwrap();
        let errors = request.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("species"));

        let request: CreateCaptureRequest =
            serde_json::from_str(&capture_json("traira", "-1")).unwrap();
        let errors = request.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("original_size"));
    }

    #[test]
    fn test_sizes_are_limited_to_hundredths() {
        let request: CreateCaptureRequest =
            serde_json::from_str(&capture_json("tucunare_azul", "19.996")).unwrap();
        let errors = request.validate().unwrap_err();
        assert_eq!(
            errors.field_errors()["original_size"][0].code,
            "too_many_decimal_places"
        );

        let request: CreateCaptureRequest =
            serde_json::from_str(&capture_json("tucunare_azul", "19.990")).unwrap();
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_capture_request_into_new_capture() {
        let request: CreateCaptureRequest =
            serde_json::from_str(&capture_json("tucunare_amarelo", "31")).unwrap();
        let new = NewCapture::try_from(request).unwrap();

        assert_eq!(new.species, Species::YellowPeacockBass);
        assert_eq!(new.original_size, Decimal::from(31));
        assert!(new.captured_at.is_none());
    }

    #[test]
    fn test_unknown_species_is_rejected_on_conversion() {
        let request: CreateCaptureRequest =
            serde_json::from_str(&capture_json("dourado", "31")).unwrap();
        assert!(matches!(
            NewCapture::try_from(request),
            Err(ValidationError::UnknownSpecies(_))
        ));
    }

    #[test]
    fn test_penalty_bounds() {
        let ruling = |penalty: Decimal| ValidateCaptureRequest {
            validated_by: "fiscal.joao".to_string(),
            penalty,
            penalty_reason: None,
        };

        assert!(ruling(Decimal::ZERO).validate().is_ok());
        assert!(ruling(Decimal::from(3)).validate().is_ok());
        assert!(ruling(Decimal::new(35, 1)).validate().is_err());
        assert!(ruling(Decimal::from(-1)).validate().is_err());

        let errors = ruling(Decimal::new(4, 3)).validate().unwrap_err();
        assert_eq!(
            errors.field_errors()["penalty"][0].code,
            "too_many_decimal_places"
        );
        assert!(ruling(Decimal::new(250, 2)).validate().is_ok());
    }

    #[test]
    fn test_capture_filter_from_query() {
        let filter: CaptureFilter =
            serde_json::from_str(r#"{"species": "traira", "status": "pending"}"#).unwrap();
        assert_eq!(filter.species, Some(Species::Wolffish));
        assert_eq!(filter.status, Some(CaptureStatus::Pending));
        assert!(filter.stage_id.is_none());

        assert_eq!("annulled".parse::<CaptureStatus>(), Ok(CaptureStatus::Annulled));
        assert!("rejected".parse::<CaptureStatus>().is_err());
    }

    #[test]
    fn test_annul_requires_reason() {
        let request = AnnulCaptureRequest {
            reason: String::new(),
        };
        assert!(request.validate().is_err());
    }
}
