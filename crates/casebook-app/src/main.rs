//! Casebook application binary - composition root.
//!
//! Ties the Casebook crates together into one interactive executable:
//! 1. Parse CLI arguments and load configuration from TOML
//! 2. Initialize storage (WAL-mode SQLite)
//! 3. Build the workspace manager, attachment ingester, and orchestrator
//!    over the Gemini reasoning client
//! 4. Run a line-oriented shell: plain text sends a turn, `:`-commands
//!    manage projects, sessions, uploads, and commits

use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use casebook_assistant::{GeminiClient, ReasoningService};
use casebook_core::config::CasebookConfig;
use casebook_core::types::SyncStatus;
use casebook_storage::Database;
use casebook_workspace::{AttachmentIngester, TurnOrchestrator, WorkspaceManager};

mod cli;

use cli::CliArgs;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Config first so the log level can come from it.
    let config_file = args.resolve_config_path();
    let config = CasebookConfig::load_or_default(&config_file);

    // Tracing.
    let log_level = args.resolve_log_level(&config.general.log_level);
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .init();

    tracing::info!("Starting Casebook v{}", env!("CARGO_PKG_VERSION"));

    // Storage.
    let data_dir = args.resolve_data_dir(&config.general.data_dir);
    std::fs::create_dir_all(&data_dir)?;
    let db_path = data_dir.join("casebook.db");
    let db = Arc::new(Database::open(&db_path)?);
    tracing::info!(path = %db_path.display(), "SQLite database opened");

    // Workspace components.
    let manager = Arc::new(WorkspaceManager::new(db));
    let ingester = AttachmentIngester::new(Arc::clone(&manager));
    let assistant: Arc<dyn ReasoningService> =
        Arc::new(GeminiClient::new(config.assistant.clone())?);
    let orchestrator = TurnOrchestrator::new(Arc::clone(&manager), assistant);

    // Select the most recent project, if any.
    let projects = manager.list_projects()?;
    if let Some(current) = projects.first() {
        tracing::info!(project = %current.name, "Resuming most recent project");
        // Listing auto-provisions a session when the project has none.
        if let Some(last) = manager.sessions(current.id)?.last() {
            manager.load_session(last.id)?;
        }
    }

    run_shell(&manager, &ingester, &orchestrator).await
}

/// The interactive loop. Lines starting with `:` are commands; anything
/// else is sent as a chat turn.
async fn run_shell(
    manager: &Arc<WorkspaceManager>,
    ingester: &AttachmentIngester,
    orchestrator: &TurnOrchestrator,
) -> Result<(), Box<dyn std::error::Error>> {
    println!("Casebook ready. :help for commands, :quit to exit.");
    print_prompt(manager);

    let stdin = std::io::stdin();
    for line in stdin.lock().lines() {
        let line = line?;
        let line = line.trim();

        if line.is_empty() {
            print_prompt(manager);
            continue;
        }

        if let Some(command) = line.strip_prefix(':') {
            if !handle_command(manager, ingester, command) {
                break;
            }
        } else {
            send_turn(orchestrator, line).await;
        }
        print_prompt(manager);
    }

    Ok(())
}

/// Returns false when the shell should exit.
fn handle_command(
    manager: &Arc<WorkspaceManager>,
    ingester: &AttachmentIngester,
    command: &str,
) -> bool {
    let mut parts = command.split_whitespace();
    let verb = parts.next().unwrap_or_default();
    let rest: Vec<&str> = parts.collect();

    match verb {
        "quit" | "q" => return false,
        "help" => print_help(),
        "projects" => match manager.list_projects() {
            Ok(projects) if projects.is_empty() => println!("No projects yet."),
            Ok(projects) => {
                for p in projects {
                    println!("  #{:<4} {}  (last activity {})", p.id, p.name, fmt_ms(p.last_message_at));
                }
            }
            Err(e) => eprintln!("error: {}", e),
        },
        "new" => {
            let name = if rest.is_empty() {
                None
            } else {
                Some(rest.join(" "))
            };
            match manager.create_project(name.as_deref()) {
                Ok(p) => println!("Created project #{} \"{}\"", p.id, p.name),
                Err(e) => eprintln!("error: {}", e),
            }
        }
        "open" => match rest.first().and_then(|s| s.parse::<i64>().ok()) {
            Some(project_id) => match manager.sessions(project_id) {
                Ok(sessions) => {
                    for s in &sessions {
                        let marker = if s.committed { "committed" } else { "volatile" };
                        println!("  session #{:<4} {}  [{}]", s.id, s.name, marker);
                    }
                    if let Some(last) = sessions.last() {
                        match manager.load_session(last.id) {
                            Ok(messages) => {
                                println!("Opened session #{} ({} turns)", last.id, messages.len())
                            }
                            Err(e) => eprintln!("error: {}", e),
                        }
                    }
                }
                Err(e) => eprintln!("error: {}", e),
            },
            None => eprintln!("usage: :open <project-id>"),
        },
        "session" => match rest.first().and_then(|s| s.parse::<i64>().ok()) {
            Some(session_id) => match manager.load_session(session_id) {
                Ok(messages) => println!("Opened session #{} ({} turns)", session_id, messages.len()),
                Err(e) => eprintln!("error: {}", e),
            },
            None => eprintln!("usage: :session <session-id>"),
        },
        "branch" => {
            let (project_id, _) = manager.active();
            match project_id {
                Some(project_id) => {
                    let name = if rest.is_empty() {
                        None
                    } else {
                        Some(rest.join(" "))
                    };
                    match manager.create_session(project_id, name.as_deref()) {
                        Ok(s) => println!("Created session #{} \"{}\"", s.id, s.name),
                        Err(e) => eprintln!("error: {}", e),
                    }
                }
                None => eprintln!("No active project; :new or :open one first."),
            }
        }
        "commit" => {
            let (_, session_id) = manager.active();
            match session_id {
                Some(session_id) => {
                    manager.commit_session(session_id);
                    match manager.status() {
                        SyncStatus::Error => eprintln!("Commit failed; see log."),
                        _ => println!("Session #{} committed.", session_id),
                    }
                }
                None => eprintln!("No active session."),
            }
        }
        "attach" => {
            if rest.is_empty() {
                eprintln!("usage: :attach <path>...");
            } else {
                let paths: Vec<PathBuf> = rest.iter().map(PathBuf::from).collect();
                let report = ingester.ingest_files(&paths);
                for attachment in &report.accepted {
                    println!("  + {} ({}, {} bytes)", attachment.name, attachment.mime_type, attachment.size_bytes);
                }
                for (path, e) in &report.failures {
                    eprintln!("  ! {}: {}", path.display(), e);
                }
                println!("{} attachment(s) pending.", manager.pending_attachments().len());
            }
        }
        "delete" => match rest.first().and_then(|s| s.parse::<i64>().ok()) {
            // The shell is the confirmation boundary the core leaves to the
            // UI: deletion requires an explicit `yes`.
            Some(project_id) if rest.get(1) == Some(&"yes") => {
                match manager.delete_project(project_id) {
                    Ok(()) => println!("Project #{} deleted.", project_id),
                    Err(e) => eprintln!("Partial delete, will retry on next cleanup: {}", e),
                }
            }
            Some(project_id) => println!(
                "This removes project #{} with all its sessions, turns, and uploads.\n\
                 Run `:delete {} yes` to confirm.",
                project_id, project_id
            ),
            None => eprintln!("usage: :delete <project-id> [yes]"),
        },
        "status" => println!("{}", status_label(manager.status())),
        other => eprintln!("Unknown command :{} (try :help)", other),
    }
    true
}

async fn send_turn(orchestrator: &TurnOrchestrator, input: &str) {
    match orchestrator.send(input).await {
        Ok(Some(report)) => {
            println!("{}", report.assistant.content);
            if let Some(grounding) = &report.assistant.grounding {
                println!("  sources:");
                for r in grounding.refs() {
                    println!("    - {} <{}>", r.title, r.uri);
                }
            }
        }
        Ok(None) => eprintln!("A turn is already in flight; wait for its reply."),
        Err(e) => eprintln!("Send failed: {}", e),
    }
}

fn print_prompt(manager: &Arc<WorkspaceManager>) {
    let (project, session) = manager.active();
    let scope = match (project, session) {
        (Some(p), Some(s)) => format!("#{}:{}", p, s),
        (Some(p), None) => format!("#{}", p),
        _ => "-".to_string(),
    };
    print!("[{} {}] > ", scope, status_label(manager.status()));
    let _ = std::io::stdout().flush();
}

fn status_label(status: SyncStatus) -> &'static str {
    match status {
        SyncStatus::Synced => "synced",
        SyncStatus::Syncing => "syncing",
        SyncStatus::Volatile => "volatile",
        SyncStatus::Error => "error",
    }
}

fn fmt_ms(ms: i64) -> String {
    chrono::DateTime::from_timestamp_millis(ms)
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| ms.to_string())
}

fn print_help() {
    println!(
        "  :projects            list projects, most recent first
  :new [name]          create a project (and its first session)
  :open <project-id>   list a project's sessions and open the latest
  :session <id>        open a specific session
  :branch [name]       start another session in the active project
  :commit              mark the active session committed
  :attach <path>...    stage file uploads for the next turn
  :delete <id>         delete a project and everything in it
  :status              show the persistence indicator
  :quit                exit
  anything else        send a chat turn"
    );
}
