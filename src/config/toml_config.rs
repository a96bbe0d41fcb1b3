use crate::core::ConfigProvider;
use crate::utils::error::{ReportError, Result};
use crate::utils::validation::Validate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_DATASET_PATH: &str = "Food_Drive_2024.csv";
pub const DEFAULT_MODEL_PATH: &str = "random_forest_classifier_model.json";
pub const DEFAULT_FORM_URL: &str = "https://forms.gle/rhuMXa2bLwsaWyKg7";
pub const DEFAULT_HISTOGRAM_BINS: usize = 20;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub app: AppConfig,
    pub dataset: DatasetConfig,
    pub model: ModelConfig,
    pub charts: ChartsConfig,
    pub collection: CollectionConfig,
    pub monitoring: Option<MonitoringConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub title: String,
    /// Directory that relative dataset and model paths resolve against.
    pub base_dir: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            title: "Food Drive App".to_string(),
            base_dir: ".".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetConfig {
    pub path: String,
    pub encoding: String,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            path: DEFAULT_DATASET_PATH.to_string(),
            encoding: "latin1".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub path: String,
    pub inference_timeout_ms: Option<u64>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            path: DEFAULT_MODEL_PATH.to_string(),
            inference_timeout_ms: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartsConfig {
    pub bins: usize,
    pub bar_width: usize,
}

impl Default for ChartsConfig {
    fn default() -> Self {
        Self {
            bins: DEFAULT_HISTOGRAM_BINS,
            bar_width: 40,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectionConfig {
    pub form_url: String,
}

impl Default for CollectionConfig {
    fn default() -> Self {
        Self {
            form_url: DEFAULT_FORM_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MonitoringConfig {
    pub enabled: bool,
    #[serde(default)]
    pub json_logs: bool,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(ReportError::IoError)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| ReportError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replaces `${VAR}` with the environment value; unknown variables are
    /// left untouched.
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| ReportError::ConfigError {
            message: format!("env substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn validate_config(&self) -> Result<()> {
        use crate::utils::validation::*;

        validate_path("app.base_dir", &self.app.base_dir)?;
        validate_path("dataset.path", &self.dataset.path)?;
        validate_file_extension("dataset.path", &self.dataset.path, &["csv"])?;
        crate::core::dataset::TextEncoding::parse(&self.dataset.encoding)?;

        validate_path("model.path", &self.model.path)?;
        validate_file_extension("model.path", &self.model.path, &["json"])?;
        if let Some(timeout) = self.model.inference_timeout_ms {
            validate_range("model.inference_timeout_ms", timeout, 1, 600_000)?;
        }

        validate_range("charts.bins", self.charts.bins, 1, 200)?;
        validate_positive_number("charts.bar_width", self.charts.bar_width, 1)?;

        validate_non_empty_string("app.title", &self.app.title)?;
        validate_url("collection.form_url", &self.collection.form_url)?;

        Ok(())
    }

    pub fn monitoring_enabled(&self) -> bool {
        self.monitoring.as_ref().map(|m| m.enabled).unwrap_or(false)
    }

    pub fn json_logs(&self) -> bool {
        self.monitoring.as_ref().map(|m| m.json_logs).unwrap_or(false)
    }
}

impl ConfigProvider for TomlConfig {
    fn app_title(&self) -> &str {
        &self.app.title
    }

    fn dataset_path(&self) -> &str {
        &self.dataset.path
    }

    fn dataset_encoding(&self) -> &str {
        &self.dataset.encoding
    }

    fn model_path(&self) -> &str {
        &self.model.path
    }

    fn inference_timeout(&self) -> Option<Duration> {
        self.model.inference_timeout_ms.map(Duration::from_millis)
    }

    fn histogram_bins(&self) -> usize {
        self.charts.bins
    }

    fn form_url(&self) -> &str {
        &self.collection.form_url
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults_match_original_app() {
        let config = TomlConfig::from_toml_str("").unwrap();

        assert_eq!(config.dataset_path(), "Food_Drive_2024.csv");
        assert_eq!(config.dataset_encoding(), "latin1");
        assert_eq!(config.model_path(), "random_forest_classifier_model.json");
        assert_eq!(config.histogram_bins(), 20);
        assert!(config.inference_timeout().is_none());
        assert!(!config.monitoring_enabled());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_full_config() {
        let toml_content = r#"
[app]
title = "Edmonton Food Drive"
base_dir = "/srv/food-drive"

[dataset]
path = "data/Food_Drive_2024.csv"
encoding = "utf-8"

[model]
path = "models/forest.json"
inference_timeout_ms = 250

[charts]
bins = 10

[monitoring]
enabled = true
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();

        assert_eq!(config.app.title, "Edmonton Food Drive");
        assert_eq!(config.model_path(), "models/forest.json");
        assert_eq!(config.inference_timeout(), Some(Duration::from_millis(250)));
        assert_eq!(config.histogram_bins(), 10);
        assert_eq!(config.charts.bar_width, 40);
        assert!(config.monitoring_enabled());
        assert!(!config.json_logs());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("FOOD_DRIVE_TEST_MODEL", "/models/from-env.json");

        let config = TomlConfig::from_toml_str(
            r#"
[model]
path = "${FOOD_DRIVE_TEST_MODEL}"
"#,
        )
        .unwrap();
        assert_eq!(config.model_path(), "/models/from-env.json");

        std::env::remove_var("FOOD_DRIVE_TEST_MODEL");
    }

    #[test]
    fn test_config_validation() {
        let bad_model = TomlConfig::from_toml_str("[model]\npath = \"model.pkl\"\n").unwrap();
        assert!(bad_model.validate().is_err());

        let bad_bins = TomlConfig::from_toml_str("[charts]\nbins = 0\n").unwrap();
        assert!(bad_bins.validate().is_err());

        let bad_url =
            TomlConfig::from_toml_str("[collection]\nform_url = \"not a url\"\n").unwrap();
        assert!(bad_url.validate().is_err());

        let bad_encoding =
            TomlConfig::from_toml_str("[dataset]\nencoding = \"ebcdic\"\n").unwrap();
        assert!(bad_encoding.validate().is_err());
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"[dataset]\npath = \"routes.csv\"\n")
            .unwrap();

        let config = TomlConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.dataset_path(), "routes.csv");
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let err = TomlConfig::from_toml_str("[model\npath = 1").unwrap_err();
        assert!(matches!(err, ReportError::ConfigError { .. }));
    }
}
