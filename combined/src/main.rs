//! Command line entry point for the repository layer.
//!
//! Runs migrations, prepares the document store, checks connectivity and
//! runs confirmation searches against whichever backend is configured.

use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use app_services::{
    ConfirmationManager, ConfirmationService, DateField, SearchConfirmationsParams, SearchMode,
};
use common::{PersistenceConfig, ServiceConfig, StorageBackend};
use persistence::relational::Database;
use persistence::{document, Repositories};

#[derive(Parser)]
#[command(name = "repo-cli")]
#[command(about = "Storage-agnostic repository tooling")]
struct Cli {
    /// Override STORAGE_BACKEND
    #[arg(long, global = true)]
    backend: Option<StorageBackend>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run relational database migrations
    Migrate {
        #[command(subcommand)]
        action: MigrateAction,
    },
    /// Define document store tables and indexes
    InitDocument,
    /// Check that the configured backend answers
    Ping,
    /// Confirmation queries
    Confirmations {
        #[command(subcommand)]
        action: ConfirmationAction,
    },
}

#[derive(Subcommand, Clone, Copy)]
enum MigrateAction {
    /// Run pending migrations
    Up,
    /// Rollback last migration
    Down,
    /// Show migration status
    Status,
    /// Reset database and run all migrations
    Fresh,
}

#[derive(Subcommand)]
enum ConfirmationAction {
    /// Search confirmations of one patient
    Search {
        #[arg(long, value_enum, default_value = "rut")]
        mode: ModeArg,
        #[arg(long)]
        query: String,
        /// First local day, yyyy-mm-dd
        #[arg(long)]
        start_date: Option<String>,
        /// Last local day, yyyy-mm-dd
        #[arg(long)]
        end_date: Option<String>,
        #[arg(long, value_enum, default_value = "created-datetime")]
        date_field: DateFieldArg,
        #[arg(long)]
        order_by: Option<String>,
        #[arg(long)]
        order: Option<String>,
        #[arg(long)]
        limit: Option<u64>,
        #[arg(long)]
        offset: Option<u64>,
        #[arg(long)]
        cursor: Option<String>,
    },
}

#[derive(ValueEnum, Clone, Copy)]
enum ModeArg {
    Rut,
    Phone,
}

#[derive(ValueEnum, Clone, Copy)]
enum DateFieldArg {
    CreatedDatetime,
    StartDatetime,
    AppointmentDatetime,
    DeliveredDatetime,
}

impl From<ModeArg> for SearchMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Rut => SearchMode::Rut,
            ModeArg::Phone => SearchMode::Phone,
        }
    }
}

impl From<DateFieldArg> for DateField {
    fn from(field: DateFieldArg) -> Self {
        match field {
            DateFieldArg::CreatedDatetime => DateField::CreatedDatetime,
            DateFieldArg::StartDatetime => DateField::StartDatetime,
            DateFieldArg::AppointmentDatetime => DateField::AppointmentDatetime,
            DateFieldArg::DeliveredDatetime => DateField::DeliveredDatetime,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let service_config = ServiceConfig::from_env();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("{},sea_orm=warn", service_config.log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let mut config = PersistenceConfig::from_env();
    if let Some(backend) = cli.backend {
        config.backend = backend;
    }

    match cli.command {
        Commands::Migrate { action } => run_migrations(&config, action).await?,
        Commands::InitDocument => {
            let client = document::connect(&config.document).await?;
            document::init_schema(&client).await?;
            info!("Document schema initialised");
        }
        Commands::Ping => {
            match config.backend {
                StorageBackend::Relational => {
                    let db = Database::connect_without_migrations(&config.database).await?;
                    db.ping().await?;
                }
                StorageBackend::Document => {
                    let client = document::connect(&config.document).await?;
                    document::ping(&client).await?;
                }
            }
            println!("{} backend is reachable", config.backend);
        }
        Commands::Confirmations {
            action:
                ConfirmationAction::Search {
                    mode,
                    query,
                    start_date,
                    end_date,
                    date_field,
                    order_by,
                    order,
                    limit,
                    offset,
                    cursor,
                },
        } => {
            let repos = Repositories::connect(&config).await?;
            let service = ConfirmationManager::new(repos.confirmations, service_config);

            let mut params = SearchConfirmationsParams::new(mode.into(), query);
            params.start_date = start_date;
            params.end_date = end_date;
            params.date_field = date_field.into();
            params.order_by = order_by;
            params.order = order;
            params.limit = limit;
            params.offset = offset;
            params.cursor = cursor;

            let page = match service.search(params).await {
                Ok(page) => page,
                Err(e) if e.is_storage_error() => return Err(e.into()),
                Err(e) => {
                    eprintln!("{}: {}", e.code(), e.user_message());
                    std::process::exit(2);
                }
            };
            println!("{}", serde_json::to_string_pretty(&page)?);
        }
    }

    Ok(())
}

async fn run_migrations(
    config: &PersistenceConfig,
    action: MigrateAction,
) -> Result<(), Box<dyn std::error::Error>> {
    if config.backend != StorageBackend::Relational {
        return Err("migrations only apply to the relational backend; use init-document".into());
    }
    let db = Database::connect_without_migrations(&config.database).await?;

    match action {
        MigrateAction::Up => {
            db.run_migrations().await?;
            info!("Migrations applied successfully");
        }
        MigrateAction::Down => {
            db.rollback_migration().await?;
            info!("Rolled back last migration");
        }
        MigrateAction::Status => {
            let status = db.migration_status().await?;
            for (name, applied) in status {
                let marker = if applied { "[x]" } else { "[ ]" };
                println!("{} {}", marker, name);
            }
        }
        MigrateAction::Fresh => {
            db.fresh_migrations().await?;
            info!("Database reset and migrations applied");
        }
    }

    Ok(())
}
