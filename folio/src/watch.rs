//! File-change subscriptions.
//!
//! The viewer keeps at most one path registered. Backends only report that
//! *something* happened to the watched path; deciding what to do with it is
//! the viewer's job.

use crate::error::{FolioError, FolioResult};
use notify::event::{MetadataKind, ModifyKind};
use notify::{Event, EventKind, PollWatcher, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::time::Duration;
use tracing::{debug, warn};

/// A single-path add/remove registration API with pending-change polling.
pub trait FileWatch {
    /// Register `path`. Registering an already watched path re-arms it.
    fn watch(&mut self, path: &Path) -> FolioResult<()>;

    /// Unregister `path`.
    fn unwatch(&mut self, path: &Path) -> FolioResult<()>;

    /// Paths currently registered.
    fn watched(&self) -> Vec<PathBuf>;

    /// Drain pending notifications; `true` if any of them concerned a
    /// registered path.
    fn take_change(&mut self) -> bool;
}

impl<W: FileWatch + ?Sized> FileWatch for Box<W> {
    fn watch(&mut self, path: &Path) -> FolioResult<()> {
        (**self).watch(path)
    }

    fn unwatch(&mut self, path: &Path) -> FolioResult<()> {
        (**self).unwatch(path)
    }

    fn watched(&self) -> Vec<PathBuf> {
        (**self).watched()
    }

    fn take_change(&mut self) -> bool {
        (**self).take_change()
    }
}

/// OS-backed subscription built on `notify`.
///
/// Events arrive on notify's own thread and are queued on a channel; nothing
/// happens until [`FileWatch::take_change`] is called from the UI loop.
pub struct NotifyWatch<W: Watcher = RecommendedWatcher> {
    watcher: W,
    rx: Receiver<notify::Result<Event>>,
    paths: Vec<PathBuf>,
}

impl NotifyWatch<RecommendedWatcher> {
    /// Native backend for the platform (inotify, FSEvents, ...).
    pub fn new() -> FolioResult<Self> {
        let (tx, rx) = mpsc::channel();
        let watcher = notify::recommended_watcher(tx)?;
        Ok(Self {
            watcher,
            rx,
            paths: Vec::new(),
        })
    }
}

impl NotifyWatch<PollWatcher> {
    /// Polling backend, for file systems that do not deliver native events
    /// (network shares, some container mounts).
    pub fn polling(interval: Duration) -> FolioResult<Self> {
        let (tx, rx) = mpsc::channel();
        let watcher = PollWatcher::new(tx, notify::Config::default().with_poll_interval(interval))?;
        Ok(Self {
            watcher,
            rx,
            paths: Vec::new(),
        })
    }
}

/// Registered paths are kept absolute; native backends report events with
/// absolute paths whatever form the caller registered.
fn normalize(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

impl<W: Watcher> NotifyWatch<W> {
    fn concerns_us(&self, event: &Event) -> bool {
        let relevant_kind = match event.kind {
            // Our own reads produce access events; reacting to them would
            // reload forever.
            EventKind::Access(_) => false,
            EventKind::Modify(ModifyKind::Metadata(MetadataKind::AccessTime)) => false,
            EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_) => true,
            EventKind::Any | EventKind::Other => true,
        };
        relevant_kind
            && (event.paths.is_empty()
                || event
                    .paths
                    .iter()
                    .any(|p| self.paths.contains(&normalize(p))))
    }
}

impl<W: Watcher> FileWatch for NotifyWatch<W> {
    fn watch(&mut self, path: &Path) -> FolioResult<()> {
        let path = normalize(path);
        if self.paths.contains(&path) {
            // Re-arm: some backends silently drop a path after it is replaced.
            if let Err(err) = self.watcher.unwatch(&path) {
                debug!(path = %path.display(), %err, "stale watch already gone");
            }
            self.paths.retain(|p| *p != path);
        }
        self.watcher.watch(&path, RecursiveMode::NonRecursive)?;
        debug!(path = %path.display(), "watching");
        self.paths.push(path);
        Ok(())
    }

    fn unwatch(&mut self, path: &Path) -> FolioResult<()> {
        let path = normalize(path);
        let known = self.paths.contains(&path);
        self.paths.retain(|p| *p != path);
        if !known {
            return Ok(());
        }
        self.watcher.unwatch(&path).map_err(FolioError::from)
    }

    fn watched(&self) -> Vec<PathBuf> {
        self.paths.clone()
    }

    fn take_change(&mut self) -> bool {
        let mut changed = false;
        loop {
            match self.rx.try_recv() {
                Ok(Ok(event)) => {
                    if self.concerns_us(&event) {
                        debug!(kind = ?event.kind, paths = ?event.paths, "file change");
                        changed = true;
                    }
                }
                Ok(Err(err)) => warn!(%err, "file watcher reported an error"),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    warn!("file watcher channel disconnected");
                    break;
                }
            }
        }
        changed
    }
}

/// Subscription without an OS backend: registrations are tracked, and
/// changes only happen when [`ManualWatch::trigger`] is called. Backs the
/// `--no-watch` mode, where only an explicit reload refreshes the preview.
#[derive(Debug, Default)]
pub struct ManualWatch {
    paths: Vec<PathBuf>,
    pending: bool,
}

impl ManualWatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a change notification for the registered path, if any.
    pub fn trigger(&mut self) {
        if !self.paths.is_empty() {
            self.pending = true;
        }
    }
}

impl FileWatch for ManualWatch {
    fn watch(&mut self, path: &Path) -> FolioResult<()> {
        if !self.paths.iter().any(|p| p == path) {
            self.paths.push(path.to_path_buf());
        }
        Ok(())
    }

    fn unwatch(&mut self, path: &Path) -> FolioResult<()> {
        self.paths.retain(|p| p != path);
        if self.paths.is_empty() {
            self.pending = false;
        }
        Ok(())
    }

    fn watched(&self) -> Vec<PathBuf> {
        self.paths.clone()
    }

    fn take_change(&mut self) -> bool {
        std::mem::take(&mut self.pending)
    }
}
