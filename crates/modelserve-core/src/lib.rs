pub mod deployment;
pub mod iris;
pub mod purchase;
pub mod validate;
pub mod wire;

pub use deployment::{Deployment, UnknownDeployment};
pub use iris::{IrisMeasurements, IrisSpecies, RawIrisQuery, SpeciesDisplay};
pub use purchase::{Gender, PurchaseOutcome, PurchaseProfile, RawPurchaseProfile};
pub use validate::{FieldViolation, Location, ValidationErrors, ViolationKind};
pub use wire::{ErrorMessage, IrisPrediction, PurchasePrediction, Welcome};
