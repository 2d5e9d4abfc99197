use std::sync::Arc;

use clap::{Parser, Subcommand};
use device_grant::device::DeviceAuthorizationService;
use device_grant::settings::{DeviceFlowConfig, Settings};
use device_grant::{jobs, storage};
use miette::{IntoDiagnostic, Result};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(
    name = "device-grant",
    version,
    about = "OAuth 2.0 Device Authorization Grant engine"
)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Apply pending database migrations
    Migrate,
    /// Run cleanup jobs once and exit
    Cleanup {
        /// Run only this job
        #[arg(long)]
        job: Option<String>,
    },
    /// Run the background cleanup scheduler until interrupted
    Run,
}

#[tokio::main]
async fn main() -> Result<()> {
    // logging
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(env_filter).init();

    let cli = Cli::parse();

    // load settings
    let settings = Settings::load(&cli.config)?;
    tracing::info!(?settings, "Loaded configuration");
    let flow_config = DeviceFlowConfig::from_settings(&settings.device_flow)?;

    // init storage (database)
    let db = storage::init(&settings.database).await?;
    let store = Arc::new(storage::SeaOrmDeviceStore::new(db.clone()));
    let service = DeviceAuthorizationService::new(store, flow_config)?;

    match cli.command {
        Command::Migrate => {
            storage::migrate(&db).await?;
            tracing::info!("Migrations applied");
        }
        Command::Cleanup { job } => {
            storage::migrate(&db).await?;
            let names: Vec<String> = match job {
                Some(name) => vec![name],
                None => jobs::available_jobs().iter().map(|s| s.to_string()).collect(),
            };
            for name in names {
                let removed = jobs::trigger_job_manually(&db, &service, &name).await?;
                println!("{name}: removed {removed} device authorizations");
            }
        }
        Command::Run => {
            storage::migrate(&db).await?;
            let mut sched = jobs::init_scheduler(db.clone(), service).await?;
            tokio::signal::ctrl_c().await.into_diagnostic()?;
            tracing::info!("Shutting down");
            sched
                .shutdown()
                .await
                .map_err(|e| miette::miette!("Failed to stop job scheduler: {e}"))?;
        }
    }

    Ok(())
}
