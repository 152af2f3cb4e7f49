use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct GenerateRulersRequest {
    #[validate(range(min = 1, max = 500, message = "Count must be between 1 and 500"))]
    pub count: i32,
}

/// Narrows the rulers of one stage by availability.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RulerFilter {
    pub available: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ruler_count_bounds() {
        assert!(GenerateRulersRequest { count: 1 }.validate().is_ok());
        assert!(GenerateRulersRequest { count: 0 }.validate().is_err());
        assert!(GenerateRulersRequest { count: 501 }.validate().is_err());
    }
}
