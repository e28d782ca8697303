//! ride-insights - predefined analytical SQL queries over ride bookings.

mod cli;

use std::process::ExitCode;

use anyhow::Context;
use cli::{Cli, Command};
use ride_insights::app::App;
use ride_insights::catalog::Catalog;
use ride_insights::config::Config;
use ride_insights::db::{self, ConnectionProvider};
use ride_insights::error::InsightsError;
use ride_insights::logging;
use ride_insights::query::ExecutionStatus;
use tracing::{error, info};

#[tokio::main]
async fn main() -> ExitCode {
    // A missing .env file is fine
    let _ = dotenvy::dotenv();

    let cli = Cli::parse_args();

    if cli.log_file {
        logging::init_file_logging();
    } else {
        logging::init_stderr_logging();
    }

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            match e.downcast_ref::<InsightsError>() {
                Some(err) => error!("{}: {:#}", err.category(), e),
                None => error!("{:#}", e),
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let config_path = cli.config_path();
    info!("Loading config from: {}", config_path.display());
    let mut config = Config::load_from_file(&config_path)?;

    let catalog = match &config.catalog.path {
        Some(path) => Catalog::load_from_file(path)
            .with_context(|| format!("loading catalog from {}", path.display()))?,
        None => Catalog::builtin()?,
    };
    let app = App::new(catalog, config.export.clone());

    let code = match &cli.command {
        Command::List => {
            print!("{}", app.list());
            ExitCode::SUCCESS
        }
        Command::Show { id } => {
            print!("{}", app.show(*id)?);
            ExitCode::SUCCESS
        }
        Command::Check => {
            let (report, findings) = app.check();
            print!("{report}");
            exit_code(findings == 0)
        }
        Command::Run { id, export, format } => {
            let provider = open_store(&cli, &mut config).await?;
            let output = app.run(provider.as_ref(), *id, *format, *export).await;
            provider.close().await;

            let output = output?;
            print!("{}", output.text);
            exit_code(output.status != ExecutionStatus::Failure)
        }
        Command::RunAll { format } => {
            let provider = open_store(&cli, &mut config).await?;
            let output = app.run_all(provider.as_ref(), *format).await;
            provider.close().await;

            let output = output?;
            print!("{}", output.text);
            exit_code(output.failed_runs == 0)
        }
    };

    Ok(code)
}

/// Builds the connection provider and applies the optional seed script.
async fn open_store(
    cli: &Cli,
    config: &mut Config,
) -> anyhow::Result<Box<dyn ConnectionProvider>> {
    config.database.resolve_url(cli.database_url.as_deref());
    let provider = db::connect(&config.database)?;
    info!("Backing store: {}", provider.describe());

    if let Some(seed_path) = &cli.seed {
        let script = std::fs::read_to_string(seed_path)
            .with_context(|| format!("reading seed file {}", seed_path.display()))?;
        db::seed(provider.as_ref(), &script)
            .await
            .with_context(|| format!("seeding from {}", seed_path.display()))?;
        info!("Seeded store from {}", seed_path.display());
    }

    Ok(provider)
}

fn exit_code(ok: bool) -> ExitCode {
    if ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
