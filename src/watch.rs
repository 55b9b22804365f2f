//! Watch mode: re-run the built command when configuration changes.

use std::path::{Path, PathBuf};
use std::time::Duration;

use log::{error, info, warn};
use notify::{RecommendedWatcher, RecursiveMode};
use notify_debouncer_full::{DebounceEventResult, Debouncer, RecommendedCache, new_debouncer};
use thiserror::Error;
use tokio::sync::mpsc;

use crate::command::ToolCommand;
use crate::exec;

#[derive(Error, Debug)]
pub enum WatchError {
    #[error("--watch=<folder?> ({0}) not found")]
    MissingDirectory(PathBuf),
    #[error("file watcher error: {0}")]
    Notify(#[from] notify::Error),
}

const DEBOUNCE_TIMEOUT: Duration = Duration::from_millis(500);
const DEBOUNCE_TICK: Duration = Duration::from_millis(100);

/// Whether a changed path should re-trigger the command.
///
/// Hidden files are ignored and only the terraform configuration
/// extensions (`.tf` and `.tfvars`) count as relevant. Event kinds are
/// not differentiated: any surviving change is a re-run trigger.
#[must_use]
pub fn is_config_change(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
        return false;
    };
    if name.starts_with('.') {
        return false;
    }
    matches!(
        path.extension().and_then(|ext| ext.to_str()),
        Some("tf" | "tfvars")
    )
}

fn attach_watcher(
    target: &Path,
    sender: mpsc::Sender<Vec<PathBuf>>,
) -> Result<Debouncer<RecommendedWatcher, RecommendedCache>, WatchError> {
    let mut watcher = new_debouncer(
        DEBOUNCE_TIMEOUT,
        Some(DEBOUNCE_TICK),
        move |result: DebounceEventResult| match result {
            Ok(events) => {
                let files: Vec<PathBuf> = events
                    .iter()
                    .filter(|event| {
                        event.event.kind.is_create()
                            || event.event.kind.is_modify()
                            || event.event.kind.is_remove()
                    })
                    .flat_map(|event| event.paths.clone())
                    .collect();

                if !files.is_empty()
                    && let Err(e) = sender.blocking_send(files)
                {
                    error!("Failed to send watch event: {e}");
                }
            }
            Err(e) => error!("Watch error: {e:?}"),
        },
    )?;
    watcher.watch(target, RecursiveMode::Recursive)?;
    Ok(watcher)
}

/// Watch `target` recursively, re-running `command` on every relevant
/// configuration change until the process receives ctrl-c.
///
/// A watcher that cannot be attached is downgraded to a warning and
/// the function returns, putting the process back on its normal exit
/// path. Re-run failures are silenced; a broken terraform run must not
/// stop the watch.
///
/// # Errors
///
/// Returns `WatchError::MissingDirectory` if `target` does not exist,
/// before any watcher is attached.
pub async fn run(target: &Path, command: &ToolCommand) -> Result<(), WatchError> {
    if !target.is_dir() {
        return Err(WatchError::MissingDirectory(target.to_path_buf()));
    }

    let (sender, mut receiver) = mpsc::channel(100);
    // The debouncer must stay alive for the duration of the loop
    let _watcher = match attach_watcher(target, sender) {
        Ok(watcher) => watcher,
        Err(e) => {
            warn!("Could not attach file watcher to {}: {e}", target.display());
            return Ok(());
        }
    };
    info!("Watching {} for configuration changes", target.display());

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Stopping watch");
                return Ok(());
            }
            changed = receiver.recv() => match changed {
                Some(paths) => {
                    if paths.iter().any(|path| is_config_change(path)) {
                        info!("Re-run command '{command}'");
                        if let Err(e) = exec::run_streamed(command, true) {
                            error!("Re-run failed: {e}");
                        }
                    }
                }
                None => return Ok(()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_files_trigger() {
        assert!(is_config_change(Path::new("main.tf")));
        assert!(is_config_change(Path::new("prod.tfvars")));
        assert!(is_config_change(Path::new("infra/modules/web/main.tf")));
    }

    #[test]
    fn test_other_extensions_ignored() {
        assert!(!is_config_change(Path::new("notes.txt")));
        assert!(!is_config_change(Path::new("main.tf.bak")));
        assert!(!is_config_change(Path::new("terraform")));
    }

    #[test]
    fn test_hidden_files_ignored() {
        assert!(!is_config_change(Path::new(".hidden.tf")));
        assert!(!is_config_change(Path::new("infra/.cache.tfvars")));
    }

    #[tokio::test]
    async fn test_missing_directory_fails_fast() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("does-not-exist");
        let command = ToolCommand::new("true", std::iter::empty::<&str>());
        match run(&missing, &command).await {
            Err(WatchError::MissingDirectory(path)) => assert_eq!(path, missing),
            other => panic!("Expected MissingDirectory, got: {other:?}"),
        }
    }
}
