//! `taskman`: offline-first task manager CLI.
//!
//! Every command goes through the sync coordinator: reads fall back to the
//! local cache and failed writes are queued for the next `sync`.
//!
//! ```bash
//! taskman create --title "Write report" --description "Quarterly numbers"
//! taskman update task-1 --status completed
//! taskman pending
//! taskman sync
//!
//! # Keep probing the server and sync whenever it comes back.
//! TASKMAN_API_URL=http://127.0.0.1:3000 taskman watch
//! ```

use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing_appender::non_blocking::WorkerGuard;

use taskman::config::{CliArgs, ClientConfig, Command};
use taskman::connectivity::{self, Connectivity, SyncEvent};
use taskman::remote::http::HttpRemote;
use taskman::remote::{HealthCheck, RemoteError};
use taskman::storage::FileStorage;
use taskman::sync::{SyncCoordinator, SyncReport};
use taskman_proto::task::Task;

type Coordinator = SyncCoordinator<HttpRemote, FileStorage>;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = CliArgs::parse();

    let config = match ClientConfig::load(&cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Warning: failed to load config file: {e}");
            ClientConfig::default()
        }
    };

    let _log_guard = init_logging(&cli.log_level, cli.log_file.as_deref());

    let remote = match HttpRemote::new(&config.api_url, config.request_timeout) {
        Ok(remote) => remote,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };
    let storage = Arc::new(FileStorage::new(&config.data_dir));
    tracing::info!(
        api_url = %config.api_url,
        data_dir = %config.data_dir.display(),
        "taskman starting"
    );

    let coordinator = Arc::new(SyncCoordinator::new(remote, storage));
    let command = cli.command.unwrap_or(Command::List);
    run(&coordinator, &config, command).await
}

/// Initialize file-based logging.
///
/// Logs are written to a file so stdout carries only command output.
/// Returns a [`WorkerGuard`] that must be held until shutdown to ensure all
/// buffered log entries are flushed.
fn init_logging(level: &str, file_path: Option<&Path>) -> Option<WorkerGuard> {
    let default_path = std::env::temp_dir().join("taskman.log");
    let log_path = file_path.unwrap_or(&default_path);

    let log_dir = log_path.parent()?;
    let file_name = log_path.file_name()?.to_str()?;

    let file_appender = tracing_appender::rolling::never(log_dir, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_env_filter(env_filter)
        .with_ansi(false)
        .init();

    Some(guard)
}

async fn run(coordinator: &Arc<Coordinator>, config: &ClientConfig, command: Command) -> ExitCode {
    match command {
        Command::List => {
            let tasks = coordinator.list_tasks().await;
            if tasks.is_empty() {
                println!("No tasks.");
            }
            for task in &tasks {
                print_summary(task);
            }
            ExitCode::SUCCESS
        }
        Command::Get { id } => match coordinator.get_task(&id).await {
            Ok(task) => {
                print_details(&task);
                ExitCode::SUCCESS
            }
            Err(e) if e.is_not_found() => {
                eprintln!("No task {id} on the server or in the local cache.");
                ExitCode::FAILURE
            }
            Err(e) => {
                eprintln!("Error: {e}");
                ExitCode::FAILURE
            }
        },
        Command::Create { .. } => {
            let Some(input) = command.create_payload() else {
                return ExitCode::FAILURE;
            };
            match coordinator.create_task(input).await {
                Ok(task) => {
                    println!("Created {}", task.id);
                    ExitCode::SUCCESS
                }
                Err(e) => saved_offline(coordinator, &e),
            }
        }
        Command::Update { ref id, .. } => {
            let Some(update) = command.update_payload() else {
                return ExitCode::FAILURE;
            };
            match coordinator.update_task(id, update).await {
                Ok(task) => {
                    println!("Updated {}", task.id);
                    ExitCode::SUCCESS
                }
                Err(e) => saved_offline(coordinator, &e),
            }
        }
        Command::Delete { id } => match coordinator.delete_task(&id).await {
            Ok(response) => {
                println!("{}", response.message);
                ExitCode::SUCCESS
            }
            Err(e) => saved_offline(coordinator, &e),
        },
        Command::Sync => match coordinator.sync().await {
            Ok(report) => {
                print_report(&report);
                if report.failed == 0 {
                    ExitCode::SUCCESS
                } else {
                    ExitCode::FAILURE
                }
            }
            Err(e) => {
                eprintln!("Sync replayed the queue but could not refresh tasks: {e}");
                ExitCode::FAILURE
            }
        },
        Command::Pending => {
            let pending = coordinator.queue().list();
            if pending.is_empty() {
                println!("Nothing pending.");
            }
            for op in &pending {
                match serde_json::to_string(op) {
                    Ok(line) => println!("{line}"),
                    Err(e) => eprintln!("Error: {e}"),
                }
            }
            ExitCode::SUCCESS
        }
        Command::Status => {
            let last_sync = coordinator
                .cache()
                .last_sync_time()
                .map_or_else(|| "never".to_string(), |t| t.to_rfc3339());
            let reachable = coordinator.remote().is_reachable().await;
            println!("Server:    {} ({})", config.api_url, reachability(reachable));
            println!("Last sync: {last_sync}");
            println!("Pending:   {}", coordinator.queue().len());
            ExitCode::SUCCESS
        }
        Command::Clear => {
            coordinator.cache().clear();
            coordinator.queue().clear();
            println!("Local cache and pending queue cleared.");
            ExitCode::SUCCESS
        }
        Command::Watch => watch(coordinator, config).await,
    }
}

/// Probes the server until Ctrl-C, replaying the queue on each reconnect.
///
/// The signal starts offline, so the first successful probe counts as a
/// reconnect and flushes anything queued by earlier commands.
async fn watch(coordinator: &Arc<Coordinator>, config: &ClientConfig) -> ExitCode {
    let connectivity = Arc::new(Connectivity::new(false));
    let (sync_task, mut events) =
        connectivity::spawn_sync_on_reconnect(Arc::clone(coordinator), connectivity.subscribe());
    let probe = connectivity::spawn_health_probe(
        Arc::new(coordinator.remote().clone()),
        config.probe_interval,
        Arc::clone(&connectivity),
    );
    let mut online = connectivity.subscribe();

    println!(
        "Watching {} every {}s (Ctrl-C to stop)",
        config.api_url,
        config.probe_interval.as_secs()
    );
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            changed = online.changed() => {
                if changed.is_err() {
                    break;
                }
                let reachable = *online.borrow_and_update();
                println!("Server {}", reachability(reachable));
            }
            Some(event) = events.recv() => match event {
                SyncEvent::Completed(report) => print_report(&report),
                SyncEvent::RefreshFailed(e) => {
                    eprintln!("Sync replayed the queue but could not refresh tasks: {e}");
                }
            },
        }
    }

    probe.abort();
    sync_task.abort();
    tracing::info!("watch stopped");
    ExitCode::SUCCESS
}

fn saved_offline(coordinator: &Coordinator, err: &RemoteError) -> ExitCode {
    if err.is_not_found() {
        eprintln!("Server has no such task ({err}).");
    } else {
        eprintln!("Server unavailable ({err}).");
    }
    eprintln!(
        "Change saved offline and queued for sync ({} pending).",
        coordinator.queue().len()
    );
    ExitCode::FAILURE
}

const fn reachability(reachable: bool) -> &'static str {
    if reachable { "reachable" } else { "unreachable" }
}

fn print_summary(task: &Task) {
    println!(
        "{:<16} {:<12} {:<7} {}",
        task.id,
        task.status.as_str(),
        task.priority.as_str(),
        task.title
    );
}

fn print_details(task: &Task) {
    println!("Id:          {}", task.id);
    println!("Title:       {}", task.title);
    println!("Description: {}", task.description);
    println!("Status:      {}", task.status);
    println!("Priority:    {}", task.priority);
    if let Some(due) = task.due_date {
        println!("Due:         {}", due.to_rfc3339());
    }
    println!("Created:     {}", task.created_at.to_rfc3339());
    println!("Updated:     {}", task.updated_at.to_rfc3339());
}

fn print_report(report: &SyncReport) {
    if report.attempted == 0 {
        println!("Nothing to sync.");
    } else {
        println!(
            "Synced {} of {} pending changes ({} failed).",
            report.succeeded, report.attempted, report.failed
        );
    }
}
