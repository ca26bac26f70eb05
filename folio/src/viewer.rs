//! Live document viewer
//!
//! Tracks a single displayed note, renders it in the selected
//! [`DisplayFormat`], and re-renders it whenever the file changes on disk.
//!
//! Three triggers drive it, all funnelled into the same render path:
//!
//! * [`Viewer::select_file`]: the user picked a note,
//! * [`Viewer::set_display_format`]: the user switched formats,
//! * [`Viewer::on_external_change`]: the watched file changed on disk.
//!
//! Failures never reach the caller. A note that cannot be read leaves the
//! viewer with no current file, an empty surface and no watch.

use crate::error::{FolioError, FolioResult};
use crate::format::DisplayFormat;
use crate::surface::Surface;
use crate::watch::FileWatch;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// What the viewer knows about the note it displays.
///
/// `watched_path` equals `current_path` after a successful load and both are
/// `None` otherwise.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewerState {
    current_path: Option<PathBuf>,
    display_format: DisplayFormat,
    watched_path: Option<PathBuf>,
}

impl ViewerState {
    pub fn current_path(&self) -> Option<&Path> {
        self.current_path.as_deref()
    }

    pub fn display_format(&self) -> DisplayFormat {
        self.display_format
    }

    pub fn watched_path(&self) -> Option<&Path> {
        self.watched_path.as_deref()
    }
}

/// Outcome of activating a link in the rendered note.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkAction {
    /// In-document anchor; the surface scrolled (or stayed put if the anchor
    /// does not exist).
    Anchor { name: String, found: bool },
    /// Anything else. Left to the caller's default handling.
    External(String),
}

pub struct Viewer<S: Surface, W: FileWatch> {
    surface: S,
    watch: W,
    state: ViewerState,
}

impl<S: Surface, W: FileWatch> Viewer<S, W> {
    pub fn new(surface: S, watch: W) -> Self {
        Self::with_format(surface, watch, DisplayFormat::default())
    }

    /// Viewer whose first load uses `format` instead of the default.
    pub fn with_format(mut surface: S, watch: W, format: DisplayFormat) -> Self {
        surface.set_word_wrap(true);
        Self {
            surface,
            watch,
            state: ViewerState {
                display_format: format,
                ..ViewerState::default()
            },
        }
    }

    pub fn state(&self) -> &ViewerState {
        &self.state
    }

    pub fn current_path(&self) -> Option<&Path> {
        self.state.current_path()
    }

    pub fn display_format(&self) -> DisplayFormat {
        self.state.display_format
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn watch(&self) -> &W {
        &self.watch
    }

    /// Bind the viewer to `path` and show it.
    ///
    /// Returns whether the note could be loaded; the viewer itself has
    /// already dealt with a failure by clearing its state.
    pub fn select_file(&mut self, path: impl Into<PathBuf>) -> bool {
        let path = path.into();
        info!(path = %path.display(), format = %self.state.display_format, "selecting file");
        self.bind(Some(path));
        self.show()
    }

    /// Switch formats and re-render the current note, if there is one.
    pub fn set_display_format(&mut self, format: DisplayFormat) -> bool {
        self.state.display_format = format;
        if self.state.current_path.is_none() {
            return false;
        }
        info!(%format, "display format changed");
        self.show()
    }

    /// The watched file was modified, moved or deleted.
    pub fn on_external_change(&mut self) -> bool {
        let Some(path) = self.state.current_path.clone() else {
            return false;
        };
        debug!(path = %path.display(), "reloading after external change");
        self.rearm(&path);
        self.show()
    }

    /// Drain pending notifications and reload once if any arrived.
    pub fn poll_external_change(&mut self) -> bool {
        if self.watch.take_change() {
            self.on_external_change();
            true
        } else {
            false
        }
    }

    /// Intercept in-document anchors; hand everything else back.
    pub fn on_anchor_clicked(&mut self, url: &str) -> LinkAction {
        match url.strip_prefix('#') {
            Some(name) => {
                let found = self.surface.scroll_to_anchor(name);
                debug!(anchor = name, found, "anchor clicked");
                LinkAction::Anchor {
                    name: name.to_string(),
                    found,
                }
            }
            None => LinkAction::External(url.to_string()),
        }
    }

    /// The single place `current_path` and the watch registration change.
    ///
    /// Drops any existing registration, then records `path` as current. The
    /// new path is only registered after a successful load.
    fn bind(&mut self, path: Option<PathBuf>) {
        if let Some(old) = self.state.watched_path.take() {
            if let Err(err) = self.watch.unwatch(&old) {
                warn!(path = %old.display(), %err, "failed to drop file watch");
            }
        }
        self.state.current_path = path;
    }

    fn register(&mut self, path: &Path) {
        if self.state.watched_path.as_deref() == Some(path) {
            return;
        }
        match self.watch.watch(path) {
            Ok(()) => self.state.watched_path = Some(path.to_path_buf()),
            Err(err) => warn!(path = %path.display(), %err, "failed to watch file"),
        }
    }

    /// Re-register the current path; some backends drop a watch after one
    /// event or after the file was replaced through a rename.
    fn rearm(&mut self, path: &Path) {
        self.state.watched_path = None;
        match self.watch.watch(path) {
            Ok(()) => self.state.watched_path = Some(path.to_path_buf()),
            Err(err) => debug!(path = %path.display(), %err, "could not re-arm file watch"),
        }
    }

    /// Render the current path, then keep or drop the binding.
    fn show(&mut self) -> bool {
        let Some(path) = self.state.current_path.clone() else {
            return false;
        };
        match self.load(&path) {
            Ok(()) => {
                self.register(&path);
                true
            }
            Err(err) => {
                debug!(%err, "load failed, clearing viewer");
                self.bind(None);
                false
            }
        }
    }

    fn load(&mut self, path: &Path) -> FolioResult<()> {
        self.surface.clear();
        let bytes = fs::read(path).map_err(|e| FolioError::read(path, e))?;
        let text = String::from_utf8_lossy(&bytes);
        match self.state.display_format {
            DisplayFormat::Markdown => self.surface.render_markdown(&text),
            DisplayFormat::PlainText => self.surface.render_plain_text(&text),
        }
        debug!(path = %path.display(), bytes = bytes.len(), "rendered");
        Ok(())
    }
}

impl<S: Surface, W: FileWatch> Drop for Viewer<S, W> {
    fn drop(&mut self) {
        self.bind(None);
    }
}

impl<S: Surface + std::fmt::Debug, W: FileWatch> std::fmt::Debug for Viewer<S, W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Viewer")
            .field("state", &self.state)
            .field("surface", &self.surface)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;
    use tempfile::{tempdir, TempDir};

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Op {
        Clear,
        Markdown(String),
        Plain(String),
        Scroll(String),
        Wrap(bool),
    }

    #[derive(Debug, Default)]
    struct RecordingSurface {
        ops: Vec<Op>,
    }

    impl RecordingSurface {
        fn last_render(&self) -> Option<&Op> {
            self.ops
                .iter()
                .rev()
                .find(|op| matches!(op, Op::Markdown(_) | Op::Plain(_) | Op::Clear))
        }
    }

    impl Surface for RecordingSurface {
        fn clear(&mut self) {
            self.ops.push(Op::Clear);
        }
        fn render_markdown(&mut self, text: &str) {
            self.ops.push(Op::Markdown(text.to_string()));
        }
        fn render_plain_text(&mut self, text: &str) {
            self.ops.push(Op::Plain(text.to_string()));
        }
        fn scroll_to_anchor(&mut self, name: &str) -> bool {
            self.ops.push(Op::Scroll(name.to_string()));
            true
        }
        fn set_word_wrap(&mut self, enabled: bool) {
            self.ops.push(Op::Wrap(enabled));
        }
    }

    /// Watch whose registrations can be inspected after the viewer is gone.
    #[derive(Debug, Default, Clone)]
    struct SharedWatch {
        paths: Rc<RefCell<Vec<PathBuf>>>,
        registrations: Rc<RefCell<usize>>,
    }

    impl FileWatch for SharedWatch {
        fn watch(&mut self, path: &Path) -> FolioResult<()> {
            *self.registrations.borrow_mut() += 1;
            let mut paths = self.paths.borrow_mut();
            if !paths.iter().any(|p| p == path) {
                paths.push(path.to_path_buf());
            }
            Ok(())
        }
        fn unwatch(&mut self, path: &Path) -> FolioResult<()> {
            self.paths.borrow_mut().retain(|p| p != path);
            Ok(())
        }
        fn watched(&self) -> Vec<PathBuf> {
            self.paths.borrow().clone()
        }
        fn take_change(&mut self) -> bool {
            false
        }
    }

    fn note(dir: &TempDir, name: &str, body: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, body).unwrap();
        path
    }

    fn viewer() -> (Viewer<RecordingSurface, SharedWatch>, SharedWatch) {
        let watch = SharedWatch::default();
        (Viewer::new(RecordingSurface::default(), watch.clone()), watch)
    }

    #[test]
    fn test_new_viewer_defaults() {
        let (viewer, _) = viewer();
        assert_eq!(viewer.display_format(), DisplayFormat::Markdown);
        assert_eq!(viewer.current_path(), None);
        assert_eq!(viewer.state().watched_path(), None);
        assert_eq!(viewer.surface().ops, vec![Op::Wrap(true)]);
    }

    #[test]
    fn test_select_clears_before_rendering() {
        let dir = tempdir().unwrap();
        let a = note(&dir, "a.md", "# A");
        let (mut viewer, _) = viewer();
        assert!(viewer.select_file(&a));
        let ops = &viewer.surface().ops;
        assert_eq!(ops[ops.len() - 2..], [Op::Clear, Op::Markdown("# A".into())]);
    }

    #[test]
    fn test_select_registers_exactly_the_loaded_path() {
        let dir = tempdir().unwrap();
        let a = note(&dir, "a.md", "a");
        let b = note(&dir, "b.md", "b");
        let (mut viewer, watch) = viewer();

        viewer.select_file(&a);
        assert_eq!(watch.watched(), vec![a.clone()]);
        viewer.select_file(&b);
        assert_eq!(watch.watched(), vec![b.clone()]);
        assert_eq!(viewer.state().watched_path(), Some(b.as_path()));
        assert_eq!(viewer.current_path(), Some(b.as_path()));
    }

    #[test]
    fn test_failed_select_leaves_nothing_behind() {
        let dir = tempdir().unwrap();
        let a = note(&dir, "a.md", "a");
        let (mut viewer, watch) = viewer();
        viewer.select_file(&a);

        assert!(!viewer.select_file(dir.path().join("missing.md")));
        assert_eq!(viewer.current_path(), None);
        assert_eq!(viewer.state().watched_path(), None);
        assert!(watch.watched().is_empty());
        assert_eq!(viewer.surface().last_render(), Some(&Op::Clear));
    }

    #[test]
    fn test_directory_is_not_a_note() {
        let dir = tempdir().unwrap();
        let (mut viewer, watch) = viewer();
        assert!(!viewer.select_file(dir.path()));
        assert_eq!(viewer.current_path(), None);
        assert!(watch.watched().is_empty());
    }

    #[test]
    fn test_format_switch_without_file_is_noop() {
        let (mut viewer, _) = viewer();
        assert!(!viewer.set_display_format(DisplayFormat::PlainText));
        assert_eq!(viewer.display_format(), DisplayFormat::PlainText);
        assert_eq!(viewer.surface().ops, vec![Op::Wrap(true)]);
    }

    #[test]
    fn test_format_switch_rerenders_same_file() {
        let dir = tempdir().unwrap();
        let a = note(&dir, "a.md", "**bold**");
        let (mut viewer, watch) = viewer();
        viewer.select_file(&a);

        assert!(viewer.set_display_format(DisplayFormat::PlainText));
        assert_eq!(viewer.surface().last_render(), Some(&Op::Plain("**bold**".into())));
        assert_eq!(viewer.current_path(), Some(a.as_path()));
        assert_eq!(watch.watched(), vec![a]);
    }

    #[test]
    fn test_external_change_rearms_and_reloads() {
        let dir = tempdir().unwrap();
        let a = note(&dir, "a.md", "# Hi");
        let (mut viewer, watch) = viewer();
        viewer.select_file(&a);
        let before = *watch.registrations.borrow();

        fs::write(&a, "# Bye").unwrap();
        assert!(viewer.on_external_change());
        assert_eq!(*watch.registrations.borrow(), before + 1);
        assert_eq!(viewer.surface().last_render(), Some(&Op::Markdown("# Bye".into())));
        assert_eq!(watch.watched(), vec![a]);
    }

    #[test]
    fn test_external_change_on_deleted_file_clears() {
        let dir = tempdir().unwrap();
        let a = note(&dir, "a.md", "# Hi");
        let (mut viewer, watch) = viewer();
        viewer.select_file(&a);

        fs::remove_file(&a).unwrap();
        assert!(!viewer.on_external_change());
        assert_eq!(viewer.current_path(), None);
        assert!(watch.watched().is_empty());
        assert_eq!(viewer.surface().last_render(), Some(&Op::Clear));
    }

    #[test]
    fn test_external_change_without_file_is_ignored() {
        let (mut viewer, watch) = viewer();
        assert!(!viewer.on_external_change());
        assert_eq!(*watch.registrations.borrow(), 0);
    }

    #[test]
    fn test_invalid_utf8_is_decoded_lossily() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("latin1.txt");
        fs::write(&path, b"caf\xe9").unwrap();
        let (mut viewer, _) = viewer();
        viewer.set_display_format(DisplayFormat::PlainText);
        assert!(viewer.select_file(&path));
        assert_eq!(
            viewer.surface().last_render(),
            Some(&Op::Plain("caf\u{FFFD}".into()))
        );
    }

    #[test]
    fn test_anchor_links_scroll_and_others_pass_through() {
        let (mut viewer, _) = viewer();
        assert_eq!(
            viewer.on_anchor_clicked("#section1"),
            LinkAction::Anchor {
                name: "section1".into(),
                found: true
            }
        );
        assert_eq!(
            viewer.surface().ops.last(),
            Some(&Op::Scroll("section1".into()))
        );

        let before = viewer.surface().ops.len();
        assert_eq!(
            viewer.on_anchor_clicked("https://example.com"),
            LinkAction::External("https://example.com".into())
        );
        assert_eq!(viewer.surface().ops.len(), before);
    }

    #[test]
    fn test_drop_releases_watch() {
        let dir = tempdir().unwrap();
        let a = note(&dir, "a.md", "a");
        let (mut viewer, watch) = viewer();
        viewer.select_file(&a);
        assert_eq!(watch.watched().len(), 1);
        drop(viewer);
        assert!(watch.watched().is_empty());
    }
}
