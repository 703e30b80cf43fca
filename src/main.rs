//! notion-tasksync - command line entry point
//!
//! Loads configuration from the environment, runs one reconciliation pass
//! (or a connection check) and maps the outcome to an exit code.

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use notion_tasksync::application::connection_check::check_connection;
use notion_tasksync::application::task_sync::{SyncOptions, SyncTargets, TaskSyncService};
use notion_tasksync::infrastructure::config::SyncConfig;
use notion_tasksync::infrastructure::dry_run_store::DryRunStore;
use notion_tasksync::infrastructure::error::InfraError;
use notion_tasksync::infrastructure::notion_client::{RemoteStore, ReqwestNotionClient};
use serde::Serialize;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const EXIT_PARTIAL_FAILURE: u8 = 1;
const EXIT_FATAL: u8 = 2;

#[derive(Parser, Debug)]
#[command(name = "notion-tasksync")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Reconcile the task page and today's journal into the database (default)
    Sync(SyncArgs),
    /// Verify credentials and the database columns without writing anything
    Check,
}

#[derive(Args, Debug, Default)]
struct SyncArgs {
    /// Journal date to read, YYYY-MM-DD (defaults to today, local time)
    #[arg(long, value_parser = parse_date)]
    date: Option<NaiveDate>,

    /// Perform reads only and log the writes that would happen
    #[arg(long)]
    dry_run: bool,

    /// Also import unchecked to-do items of the task page
    #[arg(long)]
    include_todos: bool,
}

fn parse_date(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|error| format!("expected YYYY-MM-DD: {error}"))
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "notion_tasksync=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config = match SyncConfig::from_env() {
        Ok(config) => config,
        Err(error) => {
            error!(%error, "configuration is incomplete");
            return ExitCode::from(EXIT_FATAL);
        }
    };
    info!(?config, "loaded configuration");

    let outcome = match cli.command.unwrap_or(Command::Sync(SyncArgs::default())) {
        Command::Sync(args) => sync(&config, args).await,
        Command::Check => check(&config).await,
    };

    match outcome {
        Ok(code) => code,
        Err(error) => {
            error!(%error, "run aborted");
            ExitCode::from(EXIT_FATAL)
        }
    }
}

async fn sync(config: &SyncConfig, args: SyncArgs) -> Result<ExitCode, InfraError> {
    let client = Arc::new(ReqwestNotionClient::new(config)?);
    let date = args.date.unwrap_or_else(|| chrono::Local::now().date_naive());
    let options = SyncOptions {
        include_todos: args.include_todos,
    };

    if args.dry_run {
        info!("dry run: writes are logged, not sent");
        run_sync(Arc::new(DryRunStore::new(client)), config, date, &options).await
    } else {
        run_sync(client, config, date, &options).await
    }
}

async fn run_sync<S: RemoteStore>(
    store: Arc<S>,
    config: &SyncConfig,
    date: NaiveDate,
    options: &SyncOptions,
) -> Result<ExitCode, InfraError> {
    let service = TaskSyncService::new(store, SyncTargets::from(config));
    let report = service.run(date, options).await?;
    print_json(&report)?;

    if report.is_success() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::from(EXIT_PARTIAL_FAILURE))
    }
}

async fn check(config: &SyncConfig) -> Result<ExitCode, InfraError> {
    let client = ReqwestNotionClient::new(config)?;
    let report = check_connection(&client, &config.database_id, client.schema()).await?;
    print_json(&report)?;

    if report.is_ready() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::from(EXIT_PARTIAL_FAILURE))
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), InfraError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
