pub mod assembler;
pub mod dataset;
pub mod engine;
pub mod forest;
pub mod histogram;
pub mod prediction;
pub mod schema;

pub use crate::domain::model::{FeatureVector, PredictedDonationCount, RouteObservation};
pub use crate::domain::ports::{ConfigProvider, DonationModel, ModelSource, Storage};
pub use crate::utils::error::Result;
