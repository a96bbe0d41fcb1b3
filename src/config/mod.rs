pub mod cli;
pub mod toml_config;

#[cfg(feature = "cli")]
use crate::domain::model::RouteObservation;
#[cfg(feature = "cli")]
use crate::utils::error::{Result, ValidationError};
#[cfg(feature = "cli")]
use clap::{Args, Parser, Subcommand};
#[cfg(feature = "cli")]
use self::toml_config::TomlConfig;

/// Config file picked up from the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "food-drive.toml";

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "food-drive")]
#[command(about = "Food drive report: dashboard, exploratory charts and donation bag prediction")]
pub struct CliConfig {
    /// Path to a TOML configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Override the dataset CSV path
    #[arg(long, global = true)]
    pub dataset: Option<String>,

    /// Override the model artifact path
    #[arg(long, global = true)]
    pub model: Option<String>,

    /// Directory relative paths resolve against
    #[arg(long, global = true)]
    pub base_dir: Option<String>,

    #[arg(short, long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Log process CPU and memory usage")]
    pub monitor: bool,

    #[arg(long, global = true, help = "Emit logs as JSON lines")]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Project abstract and summary
    Dashboard,
    /// Histograms over the donation dataset
    Explore {
        /// Number of histogram bins
        #[arg(long)]
        bins: Option<usize>,
    },
    /// Predict donation bags for one route
    Predict(PredictArgs),
    /// Neighbourhood mapping (not available yet)
    Mapping,
    /// Link to the data collection form
    Collect,
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Args)]
#[command(allow_negative_numbers = true)]
pub struct PredictArgs {
    /// Completed more than one route (0 or 1)
    #[arg(long, default_value = "0")]
    pub completed_more_than_one_route: String,

    /// Routes completed (1-10)
    #[arg(long, default_value = "5")]
    pub routes_completed: String,

    /// Time to complete in minutes (10-300)
    #[arg(long, default_value = "60")]
    pub time_to_complete: String,

    /// Number of adult volunteers (1-50)
    #[arg(long, default_value = "10")]
    pub adult_volunteers: String,

    /// Number of doors in route (10-500)
    #[arg(long, default_value = "100")]
    pub doors_in_route: String,

    /// Number of youth volunteers (1-50)
    #[arg(long, default_value = "10")]
    pub youth_volunteers: String,

    /// Bound the inference call, in milliseconds
    #[arg(long)]
    pub timeout_ms: Option<u64>,
}

#[cfg(feature = "cli")]
impl PredictArgs {
    /// Values are taken as text so that malformed input is reported per field.
    pub fn observation(&self) -> std::result::Result<RouteObservation, ValidationError> {
        RouteObservation::from_fields([
            (
                "completedMoreThanOneRoute",
                self.completed_more_than_one_route.as_str(),
            ),
            ("routesCompleted", self.routes_completed.as_str()),
            ("timeToCompleteMinutes", self.time_to_complete.as_str()),
            ("adultVolunteers", self.adult_volunteers.as_str()),
            ("doorsInRoute", self.doors_in_route.as_str()),
            ("youthVolunteers", self.youth_volunteers.as_str()),
        ])
    }
}

#[cfg(feature = "cli")]
impl CliConfig {
    /// Built-in defaults, then the TOML file, then command line flags.
    pub fn resolve(&self) -> Result<TomlConfig> {
        let mut config = match &self.config {
            Some(path) => TomlConfig::from_file(path)?,
            None if std::path::Path::new(DEFAULT_CONFIG_FILE).exists() => {
                tracing::debug!("Using {} from the working directory", DEFAULT_CONFIG_FILE);
                TomlConfig::from_file(DEFAULT_CONFIG_FILE)?
            }
            None => TomlConfig::default(),
        };

        if let Some(dataset) = &self.dataset {
            config.dataset.path = dataset.clone();
        }
        if let Some(model) = &self.model {
            config.model.path = model.clone();
        }
        if let Some(base_dir) = &self.base_dir {
            config.app.base_dir = base_dir.clone();
        }
        match &self.command {
            Some(Command::Explore { bins: Some(bins) }) => config.charts.bins = *bins,
            Some(Command::Predict(args)) if args.timeout_ms.is_some() => {
                config.model.inference_timeout_ms = args.timeout_ms;
            }
            _ => {}
        }

        Ok(config)
    }

    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Dashboard)
    }
}

#[cfg(all(test, feature = "cli"))]
mod tests {
    use super::*;
    use crate::core::ConfigProvider;

    #[test]
    fn test_predict_defaults_match_form_sliders() {
        let cli = CliConfig::parse_from(["food-drive", "predict"]);
        match cli.command() {
            Command::Predict(args) => {
                assert_eq!(args.observation().unwrap(), RouteObservation::FORM_DEFAULTS)
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_flags_override_config() {
        let cli = CliConfig::parse_from([
            "food-drive",
            "--model",
            "other.json",
            "explore",
            "--bins",
            "5",
        ]);
        let config = cli.resolve().unwrap();

        assert_eq!(config.model_path(), "other.json");
        assert_eq!(config.histogram_bins(), 5);
    }

    #[test]
    fn test_negative_values_reach_validation() {
        let cli = CliConfig::parse_from(["food-drive", "predict", "--adult-volunteers", "-3"]);
        match cli.command() {
            Command::Predict(args) => {
                assert_eq!(args.observation().unwrap().adult_volunteers, -3)
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_non_numeric_predict_input_is_validation_error() {
        let cli = CliConfig::parse_from(["food-drive", "predict", "--adult-volunteers", "abc"]);
        let args = match cli.command() {
            Command::Predict(args) => args,
            other => panic!("unexpected command {:?}", other),
        };

        let err: crate::utils::error::ReportError = args.observation().unwrap_err().into();
        match &err {
            crate::utils::error::ReportError::Validation(v) => {
                assert_eq!(v.field, "adultVolunteers");
                assert!(v.reason.contains("abc"));
            }
            other => panic!("expected validation error, got {:?}", other),
        }
        assert_eq!(err.exit_code(), 4);
    }

    #[test]
    fn test_default_command_is_dashboard() {
        let cli = CliConfig::parse_from(["food-drive"]);
        assert!(matches!(cli.command(), Command::Dashboard));
    }
}
