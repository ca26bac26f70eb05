//! The display surface the viewer renders into.

/// A rich-text display area that can show a note either as rendered markup
/// or verbatim.
///
/// Implementations own the rendered content; the viewer only decides what to
/// show and when.
pub trait Surface {
    /// Drop all rendered content.
    fn clear(&mut self);

    /// Interpret `text` as Markdown and show the formatted result.
    fn render_markdown(&mut self, text: &str);

    /// Show `text` verbatim.
    fn render_plain_text(&mut self, text: &str);

    /// Scroll so the anchor called `name` is at the top of the view.
    ///
    /// Returns `false` and leaves the view alone when no such anchor exists.
    fn scroll_to_anchor(&mut self, name: &str) -> bool;

    /// Break lines at word boundaries only when enabled.
    fn set_word_wrap(&mut self, enabled: bool);
}
