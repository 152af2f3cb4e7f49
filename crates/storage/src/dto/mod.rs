pub mod capture;
pub mod competitor;
pub mod edition;
pub mod ranking;
pub mod registration;
pub mod ruler;
pub mod stage;

pub use capture::{
    AnnulCaptureRequest, CaptureFilter, CaptureStatus, CreateCaptureRequest,
    ValidateCaptureRequest,
};
pub use competitor::{
    BanCompetitorRequest, CompetitorFilter, CreateCompetitorRequest, UpdateCompetitorRequest,
};
pub use edition::{CreateEditionRequest, EditionDetail};
pub use ranking::{RankingEntryResponse, RankingFilter, StageRankingResponse};
pub use registration::{
    ConfirmPaymentRequest, CreateRegistrationRequest, EliminateRequest, RegistrationFilter,
};
pub use ruler::{GenerateRulersRequest, RulerFilter};
pub use stage::{CreateStageRequest, StageFilter};
