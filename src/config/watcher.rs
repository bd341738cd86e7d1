//! Config file watcher for hot reload.
//!
//! The parent directory is watched rather than the file itself, because
//! editors that save through a rename would otherwise detach the watch.
//! Events for other files in that directory are ignored, and a burst of
//! events (write, chmod, rename) produces a single reload once it goes quiet.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::config::loader::load_config;
use crate::config::schema::ServiceConfig;

/// Quiet period that ends a burst of file events.
const DEBOUNCE: Duration = Duration::from_millis(300);

pub struct ConfigWatcher {
    path: PathBuf,
    update_tx: mpsc::UnboundedSender<ServiceConfig>,
}

impl ConfigWatcher {
    /// Watcher for `path`, plus the receiver that reloaded configs arrive on.
    pub fn new(path: &Path) -> (Self, mpsc::UnboundedReceiver<ServiceConfig>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();
        let watcher = Self {
            path: path.to_path_buf(),
            update_tx,
        };
        (watcher, update_rx)
    }

    /// Start watching. Must be called inside a tokio runtime, and the returned
    /// handle kept alive for as long as reloads are wanted.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let path = self.path.clone();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) if touches(&event, &path) => {
                    // Fails only once the reload task has stopped.
                    let _ = event_tx.send(());
                }
                Ok(_) => {}
                Err(e) => tracing::error!(error = %e, "Config watch error"),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(watch_dir(&self.path), RecursiveMode::NonRecursive)?;
        tokio::spawn(forward_reloads(event_rx, self.path.clone(), self.update_tx, DEBOUNCE));

        tracing::info!(path = %self.path.display(), "Config watcher started");
        Ok(watcher)
    }
}

fn watch_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    }
}

/// Whether `event` changed the file at `config_path`.
fn touches(event: &Event, config_path: &Path) -> bool {
    if !(event.kind.is_modify() || event.kind.is_create()) {
        return false;
    }
    let name: Option<&OsStr> = config_path.file_name();
    event.paths.iter().any(|p| p.file_name() == name)
}

/// Collapse bursts from `events` into one reload each and send the result on
/// `updates`. Returns when either side of the pipe is gone.
async fn forward_reloads(
    mut events: mpsc::UnboundedReceiver<()>,
    path: PathBuf,
    updates: mpsc::UnboundedSender<ServiceConfig>,
    quiet: Duration,
) {
    while events.recv().await.is_some() {
        loop {
            match tokio::time::timeout(quiet, events.recv()).await {
                Ok(Some(())) => continue,
                Ok(None) | Err(_) => break,
            }
        }

        tracing::info!(path = %path.display(), "Config file changed, reloading");
        match load_config(&path) {
            Ok(config) => {
                if updates.send(config).is_err() {
                    tracing::warn!("Config update receiver dropped, stopping hot reload");
                    return;
                }
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to reload config, keeping current configuration");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{AccessKind, CreateKind, DataChange, ModifyKind};
    use notify::EventKind;
    use std::io::Write;

    fn event(kind: EventKind, path: &str) -> Event {
        Event::new(kind).add_path(PathBuf::from(path))
    }

    #[test]
    fn only_changes_to_the_config_file_count() {
        let config = Path::new("/etc/contact/config.toml");
        let write = || EventKind::Modify(ModifyKind::Data(DataChange::Content));

        assert!(touches(&event(write(), "/etc/contact/config.toml"), config));
        assert!(touches(
            &event(EventKind::Create(CreateKind::File), "/etc/contact/config.toml"),
            config
        ));
        assert!(!touches(&event(write(), "/etc/contact/.config.toml.swp"), config));
        assert!(!touches(
            &event(EventKind::Access(AccessKind::Read), "/etc/contact/config.toml"),
            config
        ));
    }

    #[test]
    fn bare_file_names_watch_the_working_directory() {
        assert_eq!(watch_dir(Path::new("config.toml")), Path::new("."));
        assert_eq!(watch_dir(Path::new("/srv/app/config.toml")), Path::new("/srv/app"));
    }

    #[tokio::test]
    async fn bursts_reload_once_and_stop_when_nobody_listens() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[security]\ndev_mode = true").unwrap();

        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (update_tx, mut update_rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(forward_reloads(
            event_rx,
            file.path().to_path_buf(),
            update_tx,
            Duration::from_millis(20),
        ));

        for _ in 0..5 {
            event_tx.send(()).unwrap();
        }
        let config = update_rx.recv().await.unwrap();
        assert!(config.security.dev_mode);
        tokio::time::sleep(Duration::from_millis(60)).await;
        assert!(update_rx.try_recv().is_err());

        drop(update_rx);
        event_tx.send(()).unwrap();
        tokio::time::timeout(Duration::from_secs(1), task)
            .await
            .unwrap()
            .unwrap();
    }
}
