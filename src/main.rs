use clap::{Parser, Subcommand};
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use clinic::{
    build_router,
    seed::{self, SeedOutcome},
    session, AppError, ServerConfig,
};

#[derive(Parser)]
#[command(name = "clinic")]
#[command(about = "Clinic management API server", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API server
    Serve {
        #[command(flatten)]
        config: ServerConfig,

        /// Load demo data before serving
        #[arg(long)]
        seed: bool,
    },

    /// Load demo data and exit
    Seed {
        #[command(flatten)]
        config: ServerConfig,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "clinic=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Serve { config, seed } => serve(config, seed).await,
        Commands::Seed { config } => run_seed(config).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Clinic server stopped with an error");
            ExitCode::FAILURE
        }
    }
}

async fn serve(config: ServerConfig, load_seed: bool) -> Result<(), AppError> {
    info!("Starting clinic API server");

    let state = config.build_state().await?;
    if load_seed {
        seed::seed(&state).await?;
    }

    tokio::spawn(session::start_cleanup_task(
        state.session_service.clone(),
        config.cleanup_interval(),
    ));

    let app = build_router(state, config.cors_origin()?);

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .map_err(|e| AppError::Internal(format!("failed to bind {}: {}", config.bind, e)))?;
    info!(address = %config.bind, "Server listening");

    axum::serve(listener, app)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))
}

async fn run_seed(config: ServerConfig) -> Result<(), AppError> {
    let state = config.build_state().await?;
    if config.database_url.is_none() {
        info!("Seeding in-memory storage; the data disappears when this command exits");
    }

    match seed::seed(&state).await? {
        SeedOutcome::Seeded => info!("Seed completed"),
        SeedOutcome::AlreadySeeded => info!("Database already seeded"),
    }
    Ok(())
}
