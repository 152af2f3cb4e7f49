use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::PaymentStatus;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateRegistrationRequest {
    pub stage_id: Uuid,
    pub competitor_id: Uuid,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct ConfirmPaymentRequest {
    #[validate(length(min = 1, max = 500))]
    pub payment_receipt: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct EliminateRequest {
    #[validate(length(min = 1, max = 1000, message = "An elimination needs a reason"))]
    pub reason: String,
}

/// Narrows a registration listing. Removed registrations are never listed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegistrationFilter {
    pub stage_id: Option<Uuid>,
    pub competitor_id: Option<Uuid>,
    pub payment_status: Option<PaymentStatus>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_receipt_is_optional_but_not_blank() {
        assert!(ConfirmPaymentRequest::default().validate().is_ok());

        let blank = ConfirmPaymentRequest {
            payment_receipt: Some(String::new()),
        };
        assert!(blank.validate().is_err());
    }

    #[test]
    fn test_registration_filter_from_query() {
        let filter: RegistrationFilter =
            serde_json::from_str(r#"{"payment_status": "paid"}"#).unwrap();
        assert_eq!(filter.payment_status, Some(PaymentStatus::Paid));
        assert!(filter.stage_id.is_none());

        assert!(serde_json::from_str::<RegistrationFilter>(r#"{"payment_status": "waived"}"#).is_err());
    }

    #[test]
    fn test_eliminate_requires_reason() {
        let request: EliminateRequest = serde_json::from_str(r#"{"reason": ""}"#).unwrap();
        assert!(request.validate().is_err());

        let request: EliminateRequest =
            serde_json::from_str(r#"{"reason": "Pescou fora da área"}"#).unwrap();
        assert!(request.validate().is_ok());
    }
}
