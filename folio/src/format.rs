//! Display formats offered by the format selector.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How a loaded note is rendered in the preview pane.
///
/// The selector shows exactly the labels returned by [`DisplayFormat::label`],
/// in the order of [`DisplayFormat::ALL`]. The first entry is the default.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum DisplayFormat {
    /// Interpret the note as lightweight markup.
    #[default]
    Markdown,
    /// Show the note verbatim.
    PlainText,
}

impl DisplayFormat {
    /// Selector entries, in display order.
    pub const ALL: [DisplayFormat; 2] = [DisplayFormat::Markdown, DisplayFormat::PlainText];

    pub fn label(self) -> &'static str {
        match self {
            DisplayFormat::Markdown => "Markdown",
            DisplayFormat::PlainText => "Plain Text",
        }
    }

    /// The other entry of the selector.
    #[must_use]
    pub fn toggled(self) -> Self {
        match self {
            DisplayFormat::Markdown => DisplayFormat::PlainText,
            DisplayFormat::PlainText => DisplayFormat::Markdown,
        }
    }
}

impl fmt::Display for DisplayFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
