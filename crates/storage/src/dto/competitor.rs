use chrono::{DateTime, Utc};
use engine::lifecycle::CompetitorChanges;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::Competitor;

/// Request payload for enrolling a new competitor
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateCompetitorRequest {
    #[validate(length(
        min = 1,
        max = 100,
        message = "Name must be between 1 and 100 characters"
    ))]
    pub name: String,

    #[validate(email(message = "Email must be a valid address"))]
    #[validate(length(max = 100))]
    pub email: String,

    #[validate(length(min = 1, max = 50))]
    pub license_number: Option<String>,

    pub license_expires_at: Option<DateTime<Utc>>,
}

impl CreateCompetitorRequest {
    pub fn into_competitor(self, now: DateTime<Utc>) -> Competitor {
        Competitor {
            license_number: self.license_number,
            license_expires_at: self.license_expires_at,
            ..Competitor::new(self.name, self.email, now)
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct BanCompetitorRequest {
    #[validate(length(min = 1, max = 1000, message = "A ban needs a reason"))]
    pub reason: String,
}

/// Partial profile correction. Omitted fields keep their stored value.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateCompetitorRequest {
    #[validate(length(
        min = 1,
        max = 100,
        message = "Name must be between 1 and 100 characters"
    ))]
    pub name: Option<String>,

    #[validate(email(message = "Email must be a valid address"))]
    #[validate(length(max = 100))]
    pub email: Option<String>,

    #[validate(length(min = 1, max = 50))]
    pub license_number: Option<String>,

    pub license_expires_at: Option<DateTime<Utc>>,

    pub active: Option<bool>,
}

impl From<UpdateCompetitorRequest> for CompetitorChanges {
    fn from(request: UpdateCompetitorRequest) -> Self {
        Self {
            name: request.name,
            email: request.email,
            license_number: request.license_number,
            license_expires_at: request.license_expires_at,
            active: request.active,
        }
    }
}

/// Narrows a competitor listing. Removed competitors are never listed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompetitorFilter {
    pub active: Option<bool>,
    pub banned: Option<bool>,
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn test_create_competitor_validation() {
        let request = CreateCompetitorRequest {
            name: "Ana Souza".to_string(),
            email: "ana@example.com".to_string(),
            license_number: Some("AM-2231".to_string()),
            license_expires_at: None,
        };
        assert!(request.validate().is_ok());

        let bad_email = CreateCompetitorRequest {
            email: "not-an-email".to_string(),
            ..request.clone()
        };
        let errors = bad_email.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("email"));

        let empty_name = CreateCompetitorRequest {
            name: String::new(),
            ..request
        };
        assert!(empty_name.validate().is_err());
    }

    #[test]
    fn test_into_competitor_keeps_license() {
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        let expiry = Utc.with_ymd_and_hms(2026, 12, 31, 0, 0, 0).unwrap();
        let competitor = CreateCompetitorRequest {
            name: "Ana Souza".to_string(),
            email: "ana@example.com".to_string(),
            license_number: Some("AM-2231".to_string()),
            license_expires_at: Some(expiry),
        }
        .into_competitor(now);

        assert_eq!(competitor.license_expires_at, Some(expiry));
        assert!(competitor.has_valid_license(now));
        assert!(competitor.active);
        assert!(!competitor.banned);
        assert_eq!(competitor.created_at, now);
    }

    #[test]
    fn test_update_request_validates_present_fields_only() {
        let request: UpdateCompetitorRequest =
            serde_json::from_str(r#"{"license_number": "AM-9001"}"#).unwrap();
        assert!(request.validate().is_ok());

        let changes = CompetitorChanges::from(request);
        assert_eq!(changes.license_number.as_deref(), Some("AM-9001"));
        assert!(changes.name.is_none());
        assert!(!changes.is_empty());

        let bad_email = UpdateCompetitorRequest {
            email: Some("ana-at-example".to_string()),
            ..Default::default()
        };
        let errors = bad_email.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("email"));

        assert!(CompetitorChanges::from(UpdateCompetitorRequest::default()).is_empty());
    }

    #[test]
    fn test_ban_requires_reason() {
        let request = BanCompetitorRequest {
            reason: String::new(),
        };
        assert!(request.validate().is_err());
    }
}
