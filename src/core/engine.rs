use crate::app::pages;
use crate::core::assembler::FeatureAssembler;
use crate::core::dataset::{DatasetHandle, TextEncoding};
use crate::core::forest::JsonModelSource;
use crate::core::prediction::PredictionService;
use crate::core::{ConfigProvider, Storage};
use crate::domain::model::{PredictedDonationCount, RouteObservation};
use crate::utils::error::Result;
use crate::utils::monitor::SystemMonitor;

/// Wires the dataset, the model and the page renderers for one session.
///
/// Nothing is read from disk until a view needs it.
pub struct ReportEngine<S: Storage + Clone, C: ConfigProvider> {
    config: C,
    dataset: DatasetHandle<S>,
    predictor: PredictionService<JsonModelSource<S>>,
    monitor: SystemMonitor,
}

impl<S: Storage + Clone, C: ConfigProvider> ReportEngine<S, C> {
    pub fn new(storage: S, config: C) -> Result<Self> {
        Self::new_with_monitoring(storage, config, false)
    }

    pub fn new_with_monitoring(storage: S, config: C, monitor_enabled: bool) -> Result<Self> {
        let encoding = TextEncoding::parse(config.dataset_encoding())?;
        let dataset = DatasetHandle::new(storage.clone(), config.dataset_path(), encoding);
        let assembler = FeatureAssembler::default();
        let source = JsonModelSource::new(storage, config.model_path())
            .with_schema(assembler.schema().clone());
        let predictor =
            PredictionService::new(assembler, source).with_timeout(config.inference_timeout());

        Ok(Self {
            config,
            dataset,
            predictor,
            monitor: SystemMonitor::new(monitor_enabled),
        })
    }

    pub fn config(&self) -> &C {
        &self.config
    }

    pub fn dataset(&self) -> &DatasetHandle<S> {
        &self.dataset
    }

    pub fn predictor(&self) -> &PredictionService<JsonModelSource<S>> {
        &self.predictor
    }

    /// Navigation menu followed by the project summary.
    pub fn dashboard(&self) -> String {
        format!(
            "{}\n{}",
            pages::navigation(self.config.app_title()),
            pages::render_dashboard()
        )
    }

    pub async fn explore(&self, bar_width: usize) -> Result<String> {
        let table = self.dataset.init().await?;
        self.monitor.log_stats("Dataset loaded");
        Ok(pages::render_exploration(
            &table,
            self.config.histogram_bins(),
            bar_width,
        ))
    }

    pub async fn predict(&self, observation: &RouteObservation) -> Result<PredictedDonationCount> {
        let result = self.predictor.predict_observation(observation).await;
        self.monitor.log_stats("Prediction");
        result
    }

    pub fn mapping(&self) -> String {
        tracing::debug!("Neighbourhood mapping requested; view is a stub");
        pages::render_mapping()
    }

    pub fn collect(&self) -> String {
        pages::render_collection(self.config.form_url())
    }

    pub fn finish(&self) {
        self.monitor.log_final_stats();
    }
}
