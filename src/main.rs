use clap::Parser;
use food_drive_report::config::Command;
use food_drive_report::utils::error::{ErrorCategory, ReportError};
use food_drive_report::utils::{logger, validation::Validate};
use food_drive_report::{CliConfig, LocalStorage, ReportEngine};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = CliConfig::parse();

    let config = match cli.resolve() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());
            std::process::exit(e.exit_code());
        }
    };

    if cli.json_logs || config.json_logs() {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("Starting {}", config.app.title);
    if cli.verbose {
        tracing::debug!("Resolved config: {:?}", config);
    }

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 {}", e.recovery_suggestion());
        std::process::exit(e.exit_code());
    }

    let monitor_enabled = cli.monitor || config.monitoring_enabled();
    if monitor_enabled {
        tracing::info!("🔍 System monitoring enabled");
    }

    let bar_width = config.charts.bar_width;
    let storage = LocalStorage::new(config.app.base_dir.clone());
    let engine = match ReportEngine::new_with_monitoring(storage, config, monitor_enabled) {
        Ok(engine) => engine,
        Err(e) => exit_with(&e),
    };

    let outcome = match cli.command() {
        Command::Dashboard => Ok(engine.dashboard()),
        Command::Explore { .. } => engine.explore(bar_width).await,
        Command::Predict(args) => match args.observation() {
            Ok(observation) => engine
                .predict(&observation)
                .await
                .map(|count| food_drive_report::app::pages::render_prediction(&count)),
            Err(e) => {
                tracing::warn!(field = %e.field, "Rejected form input: {}", e.reason);
                Err(e.into())
            }
        },
        Command::Mapping => Ok(engine.mapping()),
        Command::Collect => Ok(engine.collect()),
    };
    engine.finish();

    match outcome {
        Ok(text) => {
            println!("{}", text);
            Ok(())
        }
        Err(e) => exit_with(&e),
    }
}

fn exit_with(e: &ReportError) -> ! {
    if e.category() == ErrorCategory::Deployment {
        tracing::error!(
            "❌ Deployment problem, model and application disagree: {} (Severity: {:?})",
            e,
            e.severity()
        );
    } else {
        tracing::error!(
            "❌ Request failed: {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );
    }

    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());
    std::process::exit(e.exit_code())
}
