pub mod catalog;
pub mod estimate;
pub mod models;
pub mod recommend;
pub mod wizard;

pub use catalog::PlanCatalog;
pub use estimate::{estimate, EstimateError, DOCTOR_VISIT_COST};
pub use models::*;
pub use recommend::{recommend, IncomeTier};
pub use wizard::{extract_number, WizardSession, WizardTurn};
