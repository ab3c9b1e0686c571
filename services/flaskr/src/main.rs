use anyhow::Result;
use clap::{Parser, Subcommand};
use std::io::Write;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use flaskr::{AppState, create_router, open_database, reset_database, settings::Settings};

const INITIALIZED_MESSAGE: &str = "Initialized the database.";

#[derive(Debug, Parser)]
#[command(name = "flaskr", version, about = "Flaskr blog service")]
struct Cli {
    /// Settings file; missing files are ignored
    #[arg(long, global = true, default_value = flaskr::settings::SETTINGS_FILE)]
    config: String,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Subcommand)]
enum Command {
    /// Run the HTTP server (default)
    Serve,
    /// Clear the existing data and create new tables.
    InitDb,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder().with_env_filter(env_filter).finish();

    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let cli = Cli::parse();
    let settings = Settings::load(&cli.config)?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(settings).await,
        Command::InitDb => init_db(settings, &mut std::io::stdout()).await,
    }
}

async fn init_db(settings: Settings, out: &mut impl Write) -> Result<()> {
    let pool = common::database::init_pool(&settings.database.to_config()).await?;
    reset_database(&pool).await?;
    pool.close().await;
    writeln!(out, "{INITIALIZED_MESSAGE}")?;
    Ok(())
}

async fn serve(settings: Settings) -> Result<()> {
    info!("Starting Flaskr service");

    if settings.uses_default_secret() {
        warn!("Session secret key is the development default; set FLASKR_SESSION__SECRET_KEY");
    }

    // Initialize database connection pool
    let pool = open_database(&settings.database.to_config()).await?;

    // Check database connectivity
    if common::database::health_check(&pool).await? {
        info!("Database connection successful");
    } else {
        anyhow::bail!("Failed to connect to database");
    }

    let app = create_router(AppState::new(pool, &settings));

    let listener = tokio::net::TcpListener::bind(&settings.server.bind).await?;
    info!("Flaskr service listening on {}", settings.server.bind);

    axum::serve(listener, app).await?;

    Ok(())
}
