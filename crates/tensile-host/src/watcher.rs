use std::ffi::{OsStr, OsString};
use std::path::Path;
use std::thread;
use std::time::Duration;

use crossbeam_channel::{unbounded, RecvTimeoutError};
use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};

use crate::error::{HostError, HostResult};

/// Default quiet period before a change notification fires, giving the
/// writer time to finish flushing the module file before it is remapped.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(100);

/// Watches one directory for modifications to one named file.
///
/// Matching events are debounced on a dedicated thread: a burst of rapid
/// writes coalesces into a single `on_change` invocation once the file has
/// been quiet for the debounce period. The callback runs on the watcher's
/// thread and must not touch host state directly; wire it to post a task
/// onto the [`MainThreadQueue`](crate::MainThreadQueue) instead.
///
/// Dropping the watcher stops the notification stream and lets the debounce
/// thread exit on its own.
pub struct ChangeWatcher {
    _watcher: RecommendedWatcher,
}

impl ChangeWatcher {
    pub fn spawn(
        dir: &Path,
        file_name: &OsStr,
        debounce: Duration,
        on_change: impl Fn() + Send + 'static,
    ) -> HostResult<Self> {
        let (tx, rx) = unbounded::<()>();
        let watched: OsString = file_name.to_owned();

        let mut watcher =
            notify::recommended_watcher(move |res: Result<Event, notify::Error>| match res {
                Ok(event) => {
                    if event_matches(&event, &watched) {
                        let _ = tx.try_send(());
                    }
                }
                Err(e) => log::error!("watcher: notification error: {e}"),
            })
            .map_err(|e| HostError::WatchFailure {
                path: dir.to_path_buf(),
                message: e.to_string(),
            })?;

        watcher
            .watch(dir, RecursiveMode::NonRecursive)
            .map_err(|e| HostError::WatchFailure {
                path: dir.to_path_buf(),
                message: e.to_string(),
            })?;

        thread::Builder::new()
            .name("module-watch".into())
            .spawn(move || loop {
                if rx.recv().is_err() {
                    return;
                }
                // Coalesce the burst: keep absorbing events until the file
                // has been quiet for the full debounce period.
                loop {
                    match rx.recv_timeout(debounce) {
                        Ok(()) => continue,
                        Err(RecvTimeoutError::Timeout) => break,
                        Err(RecvTimeoutError::Disconnected) => return,
                    }
                }
                on_change();
            })
            .map_err(|e| HostError::WatchFailure {
                path: dir.to_path_buf(),
                message: format!("debounce thread spawn failed: {e}"),
            })?;

        log::info!("watcher: observing '{}'", dir.join(file_name).display());

        Ok(Self { _watcher: watcher })
    }
}

/// A notification is relevant when it writes or creates the watched file.
/// Access events and unrelated siblings in the same directory are ignored.
fn event_matches(event: &Event, file_name: &OsStr) -> bool {
    if !(event.kind.is_modify() || event.kind.is_create()) {
        return false;
    }
    event
        .paths
        .iter()
        .any(|p| p.file_name() == Some(file_name))
}
