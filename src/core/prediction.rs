use crate::core::assembler::FeatureAssembler;
use crate::domain::model::{FeatureVector, PredictedDonationCount, RouteObservation};
use crate::domain::ports::{DonationModel, ModelSource};
use crate::utils::error::{PredictionError, ReportError, Result};
use std::sync::{Arc, RwLock};
use std::time::Duration;

/// Immutable handle to a deserialized model, cheap to clone.
#[derive(Debug, Clone)]
pub struct LoadedModel {
    inner: Arc<dyn DonationModel>,
    source: String,
}

impl LoadedModel {
    pub fn new(inner: Arc<dyn DonationModel>, source: impl Into<String>) -> Self {
        Self {
            inner,
            source: source.into(),
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn input_width(&self) -> usize {
        self.inner.input_width()
    }

    pub fn schema_version(&self) -> Option<&str> {
        self.inner.schema_version()
    }
}

/// Runs one inference.
///
/// The vector must match the model's width and, when the artifact declares
/// one, its schema version. The result must be a finite, non-negative number.
pub fn predict(
    vector: &FeatureVector,
    model: &LoadedModel,
) -> std::result::Result<PredictedDonationCount, PredictionError> {
    if vector.len() != model.input_width() {
        return Err(PredictionError::SchemaMismatch {
            expected: format!("{} features", model.input_width()),
            actual: format!("{} features", vector.len()),
        });
    }
    if let Some(version) = model.schema_version() {
        if version != vector.schema_version() {
            return Err(PredictionError::SchemaMismatch {
                expected: format!("schema {}", version),
                actual: format!("schema {}", vector.schema_version()),
            });
        }
    }

    let value = model.inner.predict(vector.values())?;
    if !value.is_finite() || value < 0.0 {
        return Err(PredictionError::InferenceFailure {
            reason: format!("model returned {}, expected a non-negative count", value),
        });
    }
    Ok(PredictedDonationCount::new(value))
}

#[derive(Debug, Clone)]
pub enum ModelState {
    Unloaded,
    Ready(LoadedModel),
    /// The last load failed; kept so requests do not retry it implicitly.
    Failed(PredictionError),
}

impl ModelState {
    pub fn is_ready(&self) -> bool {
        matches!(self, ModelState::Ready(_))
    }
}

/// Owns the `Unloaded -> Ready` lifecycle of one model source.
///
/// Loads are serialized by `load_lock`; once `Ready`, readers only take the
/// state read lock long enough to clone the `Arc`.
pub struct ModelHandle<M: ModelSource> {
    source: M,
    state: RwLock<ModelState>,
    load_lock: tokio::sync::Mutex<()>,
}

impl<M: ModelSource> ModelHandle<M> {
    pub fn new(source: M) -> Self {
        Self {
            source,
            state: RwLock::new(ModelState::Unloaded),
            load_lock: tokio::sync::Mutex::new(()),
        }
    }

    pub fn state(&self) -> ModelState {
        self.state
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn settled(&self) -> Option<std::result::Result<LoadedModel, PredictionError>> {
        match self.state() {
            ModelState::Unloaded => None,
            ModelState::Ready(model) => Some(Ok(model)),
            ModelState::Failed(e) => Some(Err(e)),
        }
    }

    fn set_state(&self, state: ModelState) {
        *self
            .state
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = state;
    }

    async fn load_now(&self) -> std::result::Result<LoadedModel, PredictionError> {
        tracing::info!("Loading model from {}", self.source.location());
        match self.source.load().await {
            Ok(inner) => {
                let model = LoadedModel::new(inner, self.source.location());
                tracing::info!(
                    "Model ready: {} inputs, schema {}",
                    model.input_width(),
                    model.schema_version().unwrap_or("undeclared")
                );
                self.set_state(ModelState::Ready(model.clone()));
                Ok(model)
            }
            Err(e) => {
                tracing::error!("Model load failed: {}", e);
                self.set_state(ModelState::Failed(e.clone()));
                Err(e)
            }
        }
    }

    /// Returns the ready model, loading it on first use.
    ///
    /// A previous failed load is returned as-is; call [`ModelHandle::reload`]
    /// to try again.
    pub async fn get(&self) -> std::result::Result<LoadedModel, PredictionError> {
        if let Some(settled) = self.settled() {
            return settled;
        }

        let _guard = self.load_lock.lock().await;
        if let Some(settled) = self.settled() {
            return settled;
        }
        self.load_now().await
    }

    /// Loads the artifact again, replacing whatever state is current.
    pub async fn reload(&self) -> std::result::Result<LoadedModel, PredictionError> {
        let _guard = self.load_lock.lock().await;
        self.load_now().await
    }
}

/// Request/response front for the prediction form.
pub struct PredictionService<M: ModelSource> {
    assembler: FeatureAssembler,
    model: ModelHandle<M>,
    timeout: Option<Duration>,
}

impl<M: ModelSource> PredictionService<M> {
    pub fn new(assembler: FeatureAssembler, source: M) -> Self {
        Self {
            assembler,
            model: ModelHandle::new(source),
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn assembler(&self) -> &FeatureAssembler {
        &self.assembler
    }

    pub fn model(&self) -> &ModelHandle<M> {
        &self.model
    }

    pub async fn predict_observation(
        &self,
        observation: &RouteObservation,
    ) -> Result<PredictedDonationCount> {
        let vector = match self.assembler.assemble(observation) {
            Ok(vector) => vector,
            Err(e) => {
                tracing::warn!(field = %e.field, "Rejected form input: {}", e.reason);
                return Err(e.into());
            }
        };
        tracing::debug!("Assembled feature vector {:?}", vector.values());

        let model = self.model.get().await?;
        let result = match self.timeout {
            None => predict(&vector, &model),
            Some(limit) => Self::predict_bounded(vector, model, limit).await,
        };

        match result {
            Ok(count) => {
                tracing::info!("Predicted donation bags: {}", count);
                Ok(count)
            }
            Err(e @ PredictionError::SchemaMismatch { .. }) => {
                tracing::error!(category = "deployment", "Model/assembler schema mismatch: {}", e);
                Err(ReportError::Prediction(e))
            }
            Err(e) => {
                tracing::error!(category = "inference", "Inference failed: {}", e);
                Err(ReportError::Prediction(e))
            }
        }
    }

    async fn predict_bounded(
        vector: FeatureVector,
        model: LoadedModel,
        limit: Duration,
    ) -> std::result::Result<PredictedDonationCount, PredictionError> {
        let task = tokio::task::spawn_blocking(move || predict(&vector, &model));
        match tokio::time::timeout(limit, task).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_error)) => Err(PredictionError::InferenceFailure {
                reason: format!("inference task failed: {}", join_error),
            }),
            Err(_) => Err(PredictionError::InferenceFailure {
                reason: format!("inference timed out after {:?}", limit),
            }),
        }
    }
}
