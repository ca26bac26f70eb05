//! # folio
//!
//! Terminal previewer that keeps one Markdown or plain-text note on screen
//! and re-renders it whenever the file changes on disk.
//!
//! ## Core pieces
//!
//! - [`Viewer`] - binds the current note, its display format and its file
//!   watch, and re-renders on every trigger
//! - [`Surface`] - what the viewer renders into; [`PreviewPane`] is the
//!   ratatui implementation
//! - [`FileWatch`] - single-path change subscription; [`NotifyWatch`] for
//!   OS events or polling, [`ManualWatch`] when watching is disabled
//! - [`Config`] - persisted settings
//!
//! ## Example
//!
//! ```no_run
//! use folio::{DisplayFormat, ManualWatch, PreviewPane, Viewer};
//!
//! let mut viewer = Viewer::new(PreviewPane::new(), ManualWatch::new());
//! if viewer.select_file("notes/todo.md") {
//!     viewer.set_display_format(DisplayFormat::PlainText);
//! }
//! ```

pub mod anchor;
pub mod app;
pub mod config;
pub mod error;
pub mod event_handler;
pub mod format;
pub mod preview;
pub mod surface;
pub mod viewer;
pub mod watch;

pub use anchor::{slugify, Heading, Link, Outline};
pub use app::{App, Prompt, PromptKind};
pub use config::{CliOverrides, Config, Session};
pub use error::{FolioError, FolioResult};
pub use event_handler::{handle_key_event, AppMode};
pub use format::DisplayFormat;
pub use preview::PreviewPane;
pub use surface::Surface;
pub use viewer::{LinkAction, Viewer, ViewerState};
pub use watch::{FileWatch, ManualWatch, NotifyWatch};
