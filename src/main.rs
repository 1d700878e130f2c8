use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use liftlog::{api, config::ServerConfig, db, seed};

#[derive(Parser)]
#[command(name = "liftlog")]
#[command(about = "Workout tracking server with top-set weight progression")]
struct Cli {
    /// SQLite database file (overrides LIFTLOG_DATABASE)
    #[arg(long, global = true)]
    database: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Port for HTTP API
        #[arg(short, long)]
        port: Option<u16>,

        /// Address to bind
        #[arg(long)]
        host: Option<String>,

        /// Replace all lifts with sample data before serving
        #[arg(long)]
        seed: bool,
    },
    /// Replace all lifts with sample data
    Seed,
    /// Print all lifts as JSON
    List,
    /// Generate the next lift of a top-set progression and print it as JSON
    Next {
        /// ID of the lift to progress from
        lift_id: Uuid,
    },
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "liftlog=debug,tower_http=debug".into()),
    );

    // Logs go to stderr so JSON printed by the CLI commands stays clean.
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn open_database(config: &ServerConfig) -> anyhow::Result<db::Database> {
    let db = match &config.database_path {
        Some(path) => db::Database::open(path.clone())
            .with_context(|| format!("Failed to open database at {}", path.display()))?,
        None => db::Database::open_default()?,
    };
    db.migrate()?;
    Ok(db)
}

async fn serve(config: ServerConfig) -> anyhow::Result<()> {
    let db = open_database(&config)?;

    if config.seed {
        seed::seed(&db)?;
    }

    let app = api::create_router_with_timeout(db, config.request_timeout);

    let address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {}", address))?;
    tracing::info!("liftlog server listening on http://{}", address);

    axum::serve(listener, app).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let mut config = ServerConfig::from_env();
    if let Some(path) = cli.database {
        config.database_path = Some(path);
    }

    match cli.command {
        Some(Commands::Serve { port, host, seed }) => {
            if let Some(port) = port {
                config.port = port;
            }
            if let Some(host) = host {
                config.host = host;
            }
            config.seed |= seed;
            serve(config).await?;
        }
        Some(Commands::Seed) => {
            let db = open_database(&config)?;
            let lifts = seed::seed(&db)?;
            println!("Seeded {} lifts", lifts.len());
        }
        Some(Commands::List) => {
            let db = open_database(&config)?;
            let lifts = db.get_all_lifts()?;
            println!("{}", serde_json::to_string_pretty(&lifts)?);
        }
        Some(Commands::Next { lift_id }) => {
            let db = open_database(&config)?;
            let lift = db.create_next_top_set_lift(lift_id)?;
            println!("{}", serde_json::to_string_pretty(&lift)?);
        }
        None => serve(config).await?,
    }

    Ok(())
}
