//! Reader commands

use crate::error::{CliError, CliResult};
use crate::output::{print_info, print_json, print_success, print_warning, OutputFormat};
use access_matrix::{
    ChangeSyncPoller, JsonFileStorage, MatrixConfig, MatrixStorage, PermissionSnapshot,
    ReaderSession,
};
use clap::Subcommand;
use colored::*;
use serde_json::json;
use std::time::Duration;
use tokio::sync::oneshot;

/// User subcommands
#[derive(Subcommand)]
pub enum UserCommands {
    /// Show the rights of a subject
    Rights {
        /// Subject name
        subject: String,
    },

    /// Filter text through a subject's rights
    Filter {
        /// Subject name
        subject: String,
        /// Text to filter
        text: String,
    },

    /// Follow a subject's rights as the matrix file changes
    Watch {
        /// Subject name
        subject: String,

        /// Poll interval in milliseconds (defaults to the configured one)
        #[arg(long)]
        interval_ms: Option<u64>,

        /// Text to re-filter on every change
        #[arg(short, long)]
        text: Option<String>,
    },

    /// Show details of the matrix file
    Info,
}

fn snapshot_json(snap: &PermissionSnapshot) -> serde_json::Value {
    json!({
        "subject": snap.subject().as_str(),
        "rights": sorted_rights(snap),
    })
}

fn sorted_rights(snap: &PermissionSnapshot) -> Vec<String> {
    let mut letters: Vec<String> = snap.allowed().iter().map(|o| o.to_string()).collect();
    letters.sort();
    letters
}

fn print_snapshot(snap: &PermissionSnapshot, format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Table => {
            println!("{}: {}", snap.subject().as_str().bold(), snap.rights_display());
        }
        OutputFormat::Json => print_json(&snapshot_json(snap))?,
    }
    Ok(())
}

fn login(storage: JsonFileStorage, subject: &str) -> CliResult<ReaderSession<JsonFileStorage>> {
    let (mut session, _) = ReaderSession::open(storage);
    session.login(subject)?;
    Ok(session)
}

/// Execute a user command
pub async fn execute(
    command: UserCommands,
    storage: JsonFileStorage,
    config: &MatrixConfig,
    format: OutputFormat,
) -> CliResult<()> {
    match command {
        UserCommands::Rights { subject } => {
            let session = login(storage, &subject)?;
            if let Some(snap) = session.snapshot() {
                print_snapshot(snap, format)?;
            }
        }

        UserCommands::Filter { subject, text } => {
            let session = login(storage, &subject)?;
            let filtered = session.filter(&text).unwrap_or_default();
            match format {
                OutputFormat::Table => {
                    if filtered.is_empty() {
                        print_warning("No permitted characters in the input");
                    } else {
                        println!("{}", filtered);
                    }
                }
                OutputFormat::Json => print_json(&json!({
                    "subject": subject.trim(),
                    "input": text,
                    "output": filtered,
                }))?,
            }
        }

        UserCommands::Watch {
            subject,
            interval_ms,
            text,
        } => {
            let interval = interval_ms
                .map(|ms| Duration::from_millis(ms.max(1)))
                .unwrap_or_else(|| config.poll_interval());
            watch(storage, &subject, interval, text, format).await?;
        }

        UserCommands::Info => info(&storage, format)?,
    }
    Ok(())
}

async fn watch(
    storage: JsonFileStorage,
    subject: &str,
    interval: Duration,
    text: Option<String>,
    format: OutputFormat,
) -> CliResult<()> {
    let watcher = storage.watcher();
    let (session, _) = ReaderSession::open(storage);
    let mut poller = ChangeSyncPoller::new(session, watcher);
    let snap = poller.login(subject)?;

    let show = |snap: &PermissionSnapshot| -> CliResult<()> {
        print_snapshot(snap, format)?;
        if let Some(text) = &text {
            println!("  {}", snap.filter(text));
        }
        Ok(())
    };

    print_info(&format!(
        "Watching {} every {} ms (Ctrl-C to stop)",
        poller.session().storage().describe(),
        interval.as_millis()
    ));
    show(&snap)?;

    let mut updates = poller.subscribe();
    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let handle = tokio::spawn(poller.run(interval, async {
        let _ = stop_rx.await;
    }));

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    loop {
        tokio::select! {
            _ = &mut ctrl_c => break,
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let current = updates.borrow_and_update().clone();
                if let Some(snap) = current {
                    show(&snap)?;
                }
            }
        }
    }

    let _ = stop_tx.send(());
    handle.await.map_err(|e| CliError::Runtime(e.to_string()))?;
    print_success("Stopped watching");
    Ok(())
}

fn info(storage: &JsonFileStorage, format: OutputFormat) -> CliResult<()> {
    let file = storage.file_info()?;
    let report = storage.load_or_empty();
    let modified = file
        .as_ref()
        .and_then(|f| f.modified)
        .map(|m| m.format("%Y-%m-%d %H:%M:%S").to_string());

    match format {
        OutputFormat::Table => {
            println!("{}", "Matrix file".bold());
            println!("  Path:     {}", storage.path().display());
            match &file {
                Some(f) => {
                    println!("  Size:     {} bytes", f.size);
                    println!("  Modified: {}", modified.as_deref().unwrap_or("unknown"));
                }
                None => println!("  Status:   {}", "does not exist".dimmed()),
            }
            println!("  Subjects: {}", report.matrix.subject_count());
            println!("  Objects:  {}", report.matrix.object_count());
            if let Some(e) = &report.error {
                print_warning(&format!("Could not load matrix: {}", e));
            }
        }
        OutputFormat::Json => print_json(&json!({
            "path": storage.path().display().to_string(),
            "exists": file.is_some(),
            "size": file.as_ref().map(|f| f.size),
            "modified": modified,
            "subjects": report.matrix.subject_count(),
            "objects": report.matrix.object_count(),
            "error": report.error.as_ref().map(|e| e.to_string()),
        }))?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use access_matrix::{parse_objects, AccessMatrix, SubjectName};

    #[test]
    fn snapshot_json_lists_sorted_rights() {
        let mut matrix = AccessMatrix::new();
        matrix.create("alice", &parse_objects("cBA").unwrap()).unwrap();
        let snap = PermissionSnapshot::capture(&matrix, &SubjectName::new("alice").unwrap());

        let value = snapshot_json(&snap);
        assert_eq!(value["subject"], "alice");
        assert_eq!(value["rights"], json!(["A", "B", "c"]));
    }

    #[test]
    fn login_rejects_unknown_subject() {
        let dir = tempfile::tempdir().unwrap();
        let storage = JsonFileStorage::new(dir.path().join("m.json"));
        let err = login(storage, "ghost").unwrap_err();
        assert!(matches!(
            err,
            CliError::Matrix(access_matrix::MatrixError::NotFound { .. })
        ));
    }
}
