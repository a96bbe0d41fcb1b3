pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use crate::config::cli::LocalStorage;
pub use crate::config::toml_config::TomlConfig;
#[cfg(feature = "cli")]
pub use crate::config::CliConfig;

pub use crate::core::{
    assembler::FeatureAssembler,
    engine::ReportEngine,
    forest::{JsonModelSource, RandomForestModel},
    prediction::{predict, LoadedModel, ModelHandle, ModelState, PredictionService},
    schema::FeatureSchema,
};
pub use crate::domain::model::{FeatureVector, PredictedDonationCount, RouteObservation};
pub use crate::utils::error::{PredictionError, ReportError, Result, ValidationError};
