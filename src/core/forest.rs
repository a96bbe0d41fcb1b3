//! Random forest classifier loaded from a JSON export.
//!
//! Training happens outside this crate; the exporter writes every fitted
//! tree as a flat node list (root at index 0, children after their parent).
//! Inference averages per-tree class probabilities and returns the label of
//! the most probable class, the same rule a fitted forest classifier uses.

use crate::core::schema::FeatureSchema;
use crate::domain::ports::{DonationModel, ModelSource, Storage};
use crate::utils::error::PredictionError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub const SUPPORTED_FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForestArtifact {
    pub format_version: u32,
    #[serde(default)]
    pub schema_version: Option<String>,
    pub n_features: usize,
    pub classes: Vec<f64>,
    pub trees: Vec<TreeArtifact>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeArtifact {
    pub nodes: Vec<NodeArtifact>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NodeArtifact {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        value: Vec<f64>,
    },
}

/// A validated forest. Construct with [`RandomForestModel::from_artifact`]
/// or [`RandomForestModel::from_json`].
#[derive(Debug)]
pub struct RandomForestModel {
    schema_version: Option<String>,
    n_features: usize,
    classes: Vec<f64>,
    trees: Vec<TreeArtifact>,
}

fn structural(reason: String) -> PredictionError {
    PredictionError::ModelUnavailable {
        path: "<artifact>".to_string(),
        reason,
    }
}

impl RandomForestModel {
    pub fn from_json(json: &str) -> Result<Self, PredictionError> {
        let artifact: ForestArtifact = serde_json::from_str(json)
            .map_err(|e| structural(format!("JSON parse failed: {}", e)))?;
        Self::from_artifact(artifact)
    }

    pub fn from_artifact(artifact: ForestArtifact) -> Result<Self, PredictionError> {
        if artifact.format_version != SUPPORTED_FORMAT_VERSION {
            return Err(structural(format!(
                "unsupported format_version {} (expected {})",
                artifact.format_version, SUPPORTED_FORMAT_VERSION
            )));
        }
        if artifact.n_features == 0 {
            return Err(structural("n_features must be positive".to_string()));
        }
        if artifact.classes.is_empty() {
            return Err(structural("classifier has no classes".to_string()));
        }
        if artifact.classes.iter().any(|c| !c.is_finite()) {
            return Err(structural("class labels must be finite numbers".to_string()));
        }
        if artifact.trees.is_empty() {
            return Err(structural("forest has no trees".to_string()));
        }

        for (t, tree) in artifact.trees.iter().enumerate() {
            if tree.nodes.is_empty() {
                return Err(structural(format!("tree {} has no nodes", t)));
            }
            for (n, node) in tree.nodes.iter().enumerate() {
                match node {
                    NodeArtifact::Split {
                        feature,
                        threshold,
                        left,
                        right,
                    } => {
                        if *feature >= artifact.n_features {
                            return Err(structural(format!(
                                "tree {} node {} splits on feature {} of {}",
                                t, n, feature, artifact.n_features
                            )));
                        }
                        if threshold.is_nan() {
                            return Err(structural(format!(
                                "tree {} node {} has a NaN threshold",
                                t, n
                            )));
                        }
                        // Children must come after their parent so traversal terminates.
                        for child in [*left, *right] {
                            if child <= n || child >= tree.nodes.len() {
                                return Err(structural(format!(
                                    "tree {} node {} has invalid child index {}",
                                    t, n, child
                                )));
                            }
                        }
                    }
                    NodeArtifact::Leaf { value } => {
                        if value.len() != artifact.classes.len() {
                            return Err(structural(format!(
                                "tree {} leaf {} has {} class weights, expected {}",
                                t,
                                n,
                                value.len(),
                                artifact.classes.len()
                            )));
                        }
                        if value.iter().any(|w| !w.is_finite() || *w < 0.0) {
                            return Err(structural(format!(
                                "tree {} leaf {} has a negative or non-finite class weight",
                                t, n
                            )));
                        }
                    }
                }
            }
        }

        Ok(Self {
            schema_version: artifact.schema_version,
            n_features: artifact.n_features,
            classes: artifact.classes,
            trees: artifact.trees,
        })
    }

    pub fn classes(&self) -> &[f64] {
        &self.classes
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    fn leaf<'a>(tree: &'a TreeArtifact, features: &[f64]) -> &'a [f64] {
        let mut index = 0;
        loop {
            match &tree.nodes[index] {
                NodeArtifact::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    index = if features[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
                NodeArtifact::Leaf { value } => return value,
            }
        }
    }

    /// Averaged class probabilities for one row.
    pub fn predict_proba(&self, features: &[f64]) -> Result<Vec<f64>, PredictionError> {
        if features.len() != self.n_features {
            return Err(PredictionError::SchemaMismatch {
                expected: format!("{} features", self.n_features),
                actual: format!("{} features", features.len()),
            });
        }
        if let Some(i) = features.iter().position(|v| !v.is_finite()) {
            return Err(PredictionError::InferenceFailure {
                reason: format!("feature {} is not a finite number", i),
            });
        }

        let mut proba = vec![0.0; self.classes.len()];
        for (t, tree) in self.trees.iter().enumerate() {
            let weights = Self::leaf(tree, features);
            let total: f64 = weights.iter().sum();
            if !(total.is_finite() && total > 0.0) {
                return Err(PredictionError::InferenceFailure {
                    reason: format!("tree {} reached a leaf with no class weight", t),
                });
            }
            for (p, w) in proba.iter_mut().zip(weights) {
                *p += w / total;
            }
        }

        let n = self.trees.len() as f64;
        proba.iter_mut().for_each(|p| *p /= n);
        Ok(proba)
    }
}

impl DonationModel for RandomForestModel {
    fn input_width(&self) -> usize {
        self.n_features
    }

    fn schema_version(&self) -> Option<&str> {
        self.schema_version.as_deref()
    }

    fn predict(&self, features: &[f64]) -> Result<f64, PredictionError> {
        let proba = self.predict_proba(features)?;

        let mut best = 0;
        for (i, p) in proba.iter().enumerate() {
            if *p > proba[best] {
                best = i;
            }
        }
        Ok(self.classes[best])
    }
}

/// Reads a [`RandomForestModel`] export through a [`Storage`] backend.
///
/// With an expected schema set, an artifact exported for another width or
/// schema version fails to load.
#[derive(Debug, Clone)]
pub struct JsonModelSource<S: Storage> {
    storage: S,
    path: String,
    schema: Option<FeatureSchema>,
}

impl<S: Storage> JsonModelSource<S> {
    pub fn new(storage: S, path: impl Into<String>) -> Self {
        Self {
            storage,
            path: path.into(),
            schema: None,
        }
    }

    pub fn with_schema(mut self, schema: FeatureSchema) -> Self {
        self.schema = Some(schema);
        self
    }

    fn check_schema(&self, model: &RandomForestModel) -> Result<(), PredictionError> {
        let Some(schema) = &self.schema else {
            return Ok(());
        };
        if model.input_width() != schema.width() {
            return Err(PredictionError::SchemaMismatch {
                expected: format!("{} features", schema.width()),
                actual: format!("{} features in {}", model.input_width(), self.path),
            });
        }
        match model.schema_version() {
            Some(version) if version != schema.version() => {
                Err(PredictionError::SchemaMismatch {
                    expected: format!("schema {}", schema.version()),
                    actual: format!("schema {} in {}", version, self.path),
                })
            }
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl<S: Storage> ModelSource for JsonModelSource<S> {
    fn location(&self) -> &str {
        &self.path
    }

    async fn load(&self) -> Result<Arc<dyn DonationModel>, PredictionError> {
        let unavailable = |reason: String| PredictionError::ModelUnavailable {
            path: self.path.clone(),
            reason,
        };

        tracing::debug!("Reading model artifact from {}", self.path);
        let bytes = self
            .storage
            .read_file(&self.path)
            .await
            .map_err(|e| unavailable(e.to_string()))?;
        let json = std::str::from_utf8(&bytes)
            .map_err(|e| unavailable(format!("artifact is not UTF-8: {}", e)))?;

        let model = RandomForestModel::from_json(json).map_err(|e| match e {
            PredictionError::ModelUnavailable { reason, .. } => unavailable(reason),
            other => other,
        })?;
        self.check_schema(&model)?;

        tracing::debug!(
            "Parsed forest with {} trees, {} features, {} classes",
            model.n_trees(),
            model.input_width(),
            model.classes().len()
        );
        Ok(Arc::new(model))
    }
}
