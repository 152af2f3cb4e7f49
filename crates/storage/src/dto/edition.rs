use engine::editions::NewEdition;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::{Edition, Stage};

/// Request payload for opening a tournament season
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateEditionRequest {
    #[validate(range(min = 2000, max = 2100, message = "Year must be between 2000 and 2100"))]
    pub year: i32,

    #[validate(length(
        min = 1,
        max = 100,
        message = "Name must be between 1 and 100 characters"
    ))]
    pub name: String,

    #[validate(length(max = 5000))]
    pub description: Option<String>,

    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

impl From<CreateEditionRequest> for NewEdition {
    fn from(request: CreateEditionRequest) -> Self {
        Self {
            year: request.year,
            name: request.name,
            description: request.description,
            active: request.active,
        }
    }
}

/// An edition together with its stages in start order.
#[derive(Debug, Clone, Serialize)]
pub struct EditionDetail {
    #[serde(flatten)]
    pub edition: Edition,
    pub stages: Vec<Stage>,
}
