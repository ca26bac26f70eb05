use crate::anchor::Link;
use crate::config::Config;
use crate::error::FolioResult;
use crate::format::DisplayFormat;
use crate::preview::PreviewPane;
use crate::viewer::{LinkAction, Viewer};
use crate::watch::FileWatch;
use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tui_textarea::{CursorMove, Input, Key, TextArea};

/// Name proposed for a new note.
pub const NEW_NOTE_NAME: &str = "new_file.markdown";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
    /// Open an existing note.
    Open,
    /// Create an empty note, then open it.
    Create,
}

/// Path input shown in a popup, backed by a single-line text area.
pub struct Prompt {
    pub kind: PromptKind,
    input: TextArea<'static>,
}

impl Prompt {
    pub fn new(kind: PromptKind, seed: &str) -> Self {
        let mut input = TextArea::default();
        input.insert_str(seed);
        input.move_cursor(CursorMove::End);
        Self { kind, input }
    }

    pub fn title(&self) -> &'static str {
        match self.kind {
            PromptKind::Open => "Open note (Enter open, Esc cancel)",
            PromptKind::Create => "New note (Enter create, Esc cancel)",
        }
    }

    pub fn value(&self) -> &str {
        self.input.lines().first().map(String::as_str).unwrap_or("")
    }

    /// Cursor column in characters.
    pub fn cursor(&self) -> usize {
        self.input.cursor().1
    }

    /// Edit the path. Keys that would start a second line are dropped.
    pub fn handle(&mut self, input: Input) {
        if input.key == Key::Enter || (input.ctrl && input.key == Key::Char('m')) {
            return;
        }
        let _ = self.input.input(input);
    }
}

pub type LiveViewer = Viewer<PreviewPane, Box<dyn FileWatch>>;

pub struct App {
    pub viewer: LiveViewer,
    pub config: Config,
    config_path: Option<PathBuf>,
    pub status: String,
    pub show_help: bool,
    pub prompt: Option<Prompt>,
    /// Whether notifications arrive on their own (false under `--no-watch`).
    pub live: bool,
    quit: bool,
}

impl App {
    pub fn new(config: Config, config_path: Option<PathBuf>, watch: Box<dyn FileWatch>) -> Self {
        let viewer = Viewer::with_format(
            PreviewPane::new(),
            watch,
            config.viewer.display_format,
        );
        Self {
            viewer,
            config,
            config_path,
            status: "Press o to open a note, c to create one, ? for help".into(),
            show_help: false,
            prompt: None,
            live: true,
            quit: false,
        }
    }

    pub fn preview(&self) -> &PreviewPane {
        self.viewer.surface()
    }

    pub fn preview_mut(&mut self) -> &mut PreviewPane {
        self.viewer.surface_mut()
    }

    pub fn current_path(&self) -> Option<&Path> {
        self.viewer.current_path()
    }

    pub fn display_format(&self) -> DisplayFormat {
        self.viewer.display_format()
    }

    /// Title for the preview block: file name and active format.
    pub fn title(&self) -> String {
        let name = self
            .current_path()
            .and_then(|p| p.file_name())
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "(no file)".into());
        format!(" {name} · {} ", self.display_format().label())
    }

    pub fn open_path(&mut self, path: impl Into<PathBuf>) -> bool {
        let path = path.into();
        let path = std::path::absolute(&path).unwrap_or(path);
        let loaded = self.viewer.select_file(&path);
        self.preview_mut().scroll_to_top();
        if loaded {
            self.status = if self.is_watching() || !self.live {
                format!("Opened {}", path.display())
            } else {
                format!("Opened {} (not watched, r to reload)", path.display())
            };
            self.config.general.last_file = Some(path);
        } else {
            self.status = format!("Cannot open {}", path.display());
        }
        loaded
    }

    /// Create `path` as an empty note unless it already exists, then open it.
    pub fn create_note(&mut self, path: impl Into<PathBuf>) -> bool {
        let path = path.into();
        let path = std::path::absolute(&path).unwrap_or(path);
        let created = match create_note_file(&path) {
            Ok(created) => created,
            Err(err) => {
                warn!(path = %path.display(), %err, "failed to create note");
                self.status = format!("Cannot create {}: {err}", path.display());
                return false;
            }
        };
        if !self.open_path(&path) {
            return false;
        }
        if created {
            info!(path = %path.display(), "created note");
            self.status = format!("Created {}", path.display());
        } else {
            self.status = format!("{} already exists, opened it", path.display());
        }
        true
    }

    /// Prompt prefix: empty when a root folder resolves relative input,
    /// otherwise the folder of the note on screen.
    fn prompt_dir(&self) -> String {
        match (&self.config.general.root_folder, self.current_path()) {
            (None, Some(path)) => path
                .parent()
                .map(|d| format!("{}/", d.display()))
                .unwrap_or_default(),
            _ => String::new(),
        }
    }

    pub fn open_prompt(&mut self) {
        let seed = self.prompt_dir();
        self.prompt = Some(Prompt::new(PromptKind::Open, &seed));
    }

    pub fn new_note_prompt(&mut self) {
        let seed = format!("{}{NEW_NOTE_NAME}", self.prompt_dir());
        self.prompt = Some(Prompt::new(PromptKind::Create, &seed));
    }

    pub fn cancel_prompt(&mut self) {
        self.prompt = None;
    }

    pub fn submit_prompt(&mut self) {
        let Some(prompt) = self.prompt.take() else {
            return;
        };
        if prompt.value().trim().is_empty() {
            return;
        }
        let path = self.config.resolve(prompt.value());
        match prompt.kind {
            PromptKind::Open => self.open_path(path),
            PromptKind::Create => self.create_note(path),
        };
    }

    /// Whether the note on screen has a live change subscription.
    pub fn is_watching(&self) -> bool {
        self.viewer.state().watched_path().is_some()
    }

    /// Status bar badge for how changes reach the preview.
    pub fn watch_label(&self) -> &'static str {
        if !self.live {
            "MANUAL"
        } else if self.current_path().is_some() && !self.is_watching() {
            "UNWATCHED"
        } else {
            "LIVE"
        }
    }

    pub fn toggle_format(&mut self) {
        let format = self.display_format().toggled();
        self.viewer.set_display_format(format);
        self.config.viewer.display_format = format;
        self.status = format!("Format: {}", format.label());
    }

    /// Reload the current note as if it had changed on disk.
    pub fn reload(&mut self) {
        if self.current_path().is_none() {
            self.status = "Nothing to reload".into();
            return;
        }
        self.viewer.on_external_change();
        self.status = self.reload_status();
    }

    /// Apply queued file-change notifications. Called once per frame.
    pub fn poll_background_tasks(&mut self) {
        let had_file = self.current_path().map(Path::to_path_buf);
        if self.viewer.poll_external_change() {
            self.status = match (had_file, self.current_path()) {
                (_, Some(_)) => self.reload_status(),
                (Some(gone), None) => format!("{} is no longer available", gone.display()),
                (None, None) => self.status.clone(),
            };
        }
    }

    fn reload_status(&self) -> String {
        match self.current_path() {
            Some(path) => format!("Reloaded {}", path.display()),
            None => "Note is no longer available".into(),
        }
    }

    pub fn focus_next_link(&mut self) {
        self.status = link_status(self.preview_mut().focus_next_link());
    }

    pub fn focus_prev_link(&mut self) {
        self.status = link_status(self.preview_mut().focus_prev_link());
    }

    /// Follow the focused link: anchors scroll the preview, anything else
    /// goes to the OS default handler.
    pub fn activate_link(&mut self) -> Option<LinkAction> {
        let target = self.preview().focused_link()?.target.clone();
        let action = self.viewer.on_anchor_clicked(&target);
        match &action {
            LinkAction::Anchor { name, found: true } => {
                self.status = format!("#{name}");
            }
            LinkAction::Anchor { name, found: false } => {
                self.status = format!("No heading for #{name}");
            }
            LinkAction::External(url) => self.open_external(url),
        }
        Some(action)
    }

    fn open_external(&mut self, url: &str) {
        match opener::open(url) {
            Ok(()) => {
                info!(url, "opened link externally");
                self.status = format!("Opened {url}");
            }
            Err(err) => {
                warn!(url, %err, "failed to open link");
                self.status = format!("Cannot open {url}: {err}");
            }
        }
    }

    pub fn scroll_up(&mut self, rows: u16) {
        self.preview_mut().scroll_up(rows);
    }

    pub fn scroll_down(&mut self, rows: u16) {
        self.preview_mut().scroll_down(rows);
    }

    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }

    pub fn quit(&mut self) {
        self.quit = true;
    }

    pub fn wants_quit(&self) -> bool {
        self.quit
    }

    /// Write settings back, including the format and note in use.
    pub fn persist(&mut self) -> FolioResult<()> {
        self.config.viewer.display_format = self.display_format();
        match &self.config_path {
            Some(path) => self.config.save_to(path),
            None => Ok(()),
        }
    }
}

fn link_status(link: Option<&Link>) -> String {
    match link {
        Some(link) if link.text.is_empty() => {
            format!("Link: {} (Enter to follow)", link.target)
        }
        Some(link) => format!("Link: {} → {} (Enter to follow)", link.text, link.target),
        None => "No links in this note".into(),
    }
}

/// `Ok(true)` when the file was created, `Ok(false)` when it already existed.
fn create_note_file(path: &Path) -> FolioResult<bool> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    match OpenOptions::new().write(true).create_new(true).open(path) {
        Ok(_) => Ok(true),
        Err(err) if err.kind() == io::ErrorKind::AlreadyExists => Ok(false),
        Err(err) => Err(err.into()),
    }
}
