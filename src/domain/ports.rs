use crate::utils::error::{PredictionError, Result};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn app_title(&self) -> &str;
    fn dataset_path(&self) -> &str;
    fn dataset_encoding(&self) -> &str;
    fn model_path(&self) -> &str;
    fn inference_timeout(&self) -> Option<Duration>;
    fn histogram_bins(&self) -> usize;
    fn form_url(&self) -> &str;
}

/// A trained classifier that maps one feature row to one numeric label.
///
/// Implementations must be immutable after construction: `predict` takes
/// `&self` and is called concurrently through an `Arc`.
pub trait DonationModel: Send + Sync + std::fmt::Debug {
    fn input_width(&self) -> usize;

    /// Feature schema the artifact was exported for, if it declares one.
    fn schema_version(&self) -> Option<&str> {
        None
    }

    fn predict(&self, features: &[f64]) -> std::result::Result<f64, PredictionError>;
}

/// Where a model comes from. Loading is expected to be expensive.
#[async_trait]
pub trait ModelSource: Send + Sync {
    fn location(&self) -> &str;

    async fn load(&self) -> std::result::Result<Arc<dyn DonationModel>, PredictionError>;
}
