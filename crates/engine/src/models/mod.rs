pub mod capture;
pub mod competitor;
pub mod edition;
pub mod ranking;
pub mod registration;
pub mod ruler;
pub mod species;
pub mod stage;

pub use capture::Capture;
pub use competitor::Competitor;
pub use edition::Edition;
pub use ranking::{Award, RankingCategory, RankingEntry};
pub use registration::{PaymentStatus, Registration};
pub use ruler::Ruler;
pub use species::Species;
pub use stage::{Stage, StageStatus};
