use crate::anchor::{slugify, Heading, Link, Outline};
use crate::format::DisplayFormat;
use crate::surface::Surface;
use ratatui::{prelude::*, text::Text, widgets::*};
use tui_markdown as md;

/// The ratatui preview pane: the concrete [`Surface`] the terminal shell
/// draws every frame.
#[derive(Debug, Default)]
pub struct PreviewPane {
    text: Text<'static>,
    format: Option<DisplayFormat>,
    // (anchor name, logical line index)
    anchors: Vec<(String, usize)>,
    links: Vec<Link>,
    focused_link: Option<usize>,
    scroll: u16,
    word_wrap: bool,
    inner_width: u16,
    inner_height: u16,
}

impl PreviewPane {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&self) -> &Text<'static> {
        &self.text
    }

    /// Format of the content currently shown, `None` while cleared.
    pub fn format(&self) -> Option<DisplayFormat> {
        self.format
    }

    pub fn is_empty(&self) -> bool {
        self.format.is_none() && self.text.lines.is_empty()
    }

    /// Rendered lines with styling dropped.
    pub fn lines_as_strings(&self) -> Vec<String> {
        self.text
            .lines
            .iter()
            .map(|line| line.spans.iter().map(|s| s.content.as_ref()).collect())
            .collect()
    }

    pub fn anchors(&self) -> impl Iterator<Item = &str> {
        self.anchors.iter().map(|(name, _)| name.as_str())
    }

    // --- Scrolling ----------------------------------------------------------

    pub fn scroll(&self) -> u16 {
        self.scroll
    }

    pub fn scroll_up(&mut self, rows: u16) {
        self.scroll = self.scroll.saturating_sub(rows);
    }

    pub fn scroll_down(&mut self, rows: u16) {
        self.scroll = self.scroll.saturating_add(rows).min(self.max_scroll());
    }

    pub fn page_up(&mut self) {
        self.scroll_up(self.inner_height.max(1));
    }

    pub fn page_down(&mut self) {
        self.scroll_down(self.inner_height.max(1));
    }

    pub fn scroll_to_top(&mut self) {
        self.scroll = 0;
    }

    pub fn scroll_to_bottom(&mut self) {
        self.scroll = self.max_scroll();
    }

    fn max_scroll(&self) -> u16 {
        let rows = self.rows_before(self.text.lines.len());
        clamp_u16(rows.saturating_sub(self.inner_height as usize))
    }

    fn rows_for(&self, line: &Line<'_>) -> usize {
        let width = line.width();
        if !self.word_wrap || self.inner_width == 0 || width == 0 {
            1
        } else {
            width.div_ceil(self.inner_width as usize)
        }
    }

    /// Wrapped rows taken by the first `line_idx` logical lines at the last
    /// drawn width.
    fn rows_before(&self, line_idx: usize) -> usize {
        self.text
            .lines
            .iter()
            .take(line_idx)
            .map(|line| self.rows_for(line))
            .sum()
    }

    // --- Links --------------------------------------------------------------

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    pub fn focused_link(&self) -> Option<&Link> {
        self.focused_link.and_then(|idx| self.links.get(idx))
    }

    pub fn focus_next_link(&mut self) -> Option<&Link> {
        if self.links.is_empty() {
            return None;
        }
        let next = match self.focused_link {
            Some(idx) => (idx + 1) % self.links.len(),
            None => 0,
        };
        self.focused_link = Some(next);
        self.links.get(next)
    }

    pub fn focus_prev_link(&mut self) -> Option<&Link> {
        if self.links.is_empty() {
            return None;
        }
        let prev = match self.focused_link {
            Some(0) | None => self.links.len() - 1,
            Some(idx) => idx - 1,
        };
        self.focused_link = Some(prev);
        self.links.get(prev)
    }

    // --- Drawing ------------------------------------------------------------

    pub fn render(&mut self, f: &mut Frame, area: Rect, title: &str) {
        let block = Block::default()
            .title(title.to_string())
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan));
        let inner = block.inner(area);
        self.inner_width = inner.width;
        self.inner_height = inner.height;
        self.scroll = self.scroll.min(self.max_scroll());

        if self.is_empty() {
            let placeholder = Paragraph::new("(no file)")
                .style(Style::default().fg(Color::DarkGray))
                .alignment(Alignment::Center)
                .block(block);
            f.render_widget(placeholder, area);
            return;
        }

        let mut paragraph = Paragraph::new(self.text.clone())
            .block(block)
            .scroll((self.scroll, 0));
        if self.word_wrap {
            paragraph = paragraph.wrap(Wrap { trim: false });
        }
        f.render_widget(paragraph, area);
    }
}

impl Surface for PreviewPane {
    /// Drops content, anchors and links. The scroll offset is kept so a reload
    /// of the same note stays in place; it is clamped on the next draw.
    fn clear(&mut self) {
        self.text = Text::default();
        self.format = None;
        self.anchors.clear();
        self.links.clear();
        self.focused_link = None;
    }

    fn render_markdown(&mut self, src: &str) {
        let outline = Outline::scan(src);
        let parsed: Text<'_> = md::from_str(src);
        let (text, anchors) = apply_heading_styles(to_owned_text(parsed), &outline.headings);
        self.text = text;
        self.anchors = anchors;
        self.links = outline.links;
        self.focused_link = None;
        self.format = Some(DisplayFormat::Markdown);
    }

    fn render_plain_text(&mut self, src: &str) {
        self.text = Text::raw(src.to_string());
        self.anchors.clear();
        self.links.clear();
        self.focused_link = None;
        self.format = Some(DisplayFormat::PlainText);
    }

    fn scroll_to_anchor(&mut self, name: &str) -> bool {
        let line = self
            .anchors
            .iter()
            .find(|(anchor, _)| anchor == name)
            .map(|(_, line)| *line);
        match line {
            Some(line) => {
                self.scroll = clamp_u16(self.rows_before(line));
                true
            }
            None => false,
        }
    }

    fn set_word_wrap(&mut self, enabled: bool) {
        self.word_wrap = enabled;
    }
}

fn clamp_u16(rows: usize) -> u16 {
    u16::try_from(rows).unwrap_or(u16::MAX)
}

fn to_owned_text(input: Text<'_>) -> Text<'static> {
    let mut out_lines: Vec<Line<'static>> = Vec::with_capacity(input.lines.len());
    for line in input.lines.iter() {
        let mut spans_owned: Vec<Span<'static>> = Vec::with_capacity(line.spans.len());
        for span in line.spans.iter() {
            spans_owned.push(Span::styled(span.content.to_string(), span.style));
        }
        out_lines.push(Line::from(spans_owned).style(line.style));
    }
    Text::from(out_lines)
}

/// Replaces rendered heading lines (with or without leading `#` markers) by
/// a styled title and records the line each heading anchor lands on.
///
/// A line only counts as a heading when it matches the next heading of the
/// parsed outline, so `# comments` inside code blocks stay untouched.
fn apply_heading_styles(
    text: Text<'static>,
    headings: &[Heading],
) -> (Text<'static>, Vec<(String, usize)>) {
    let mut anchors = Vec::with_capacity(headings.len());
    let mut next = 0usize;
    let mut new_lines: Vec<Line<'static>> = Vec::with_capacity(text.lines.len());
    for (idx, line) in text.lines.into_iter().enumerate() {
        let content: String = line.spans.iter().map(|s| s.content.as_ref()).collect();
        let trimmed = content.trim_end_matches('\n');
        // Count leading '#'
        let hashes = trimmed.chars().take_while(|c| *c == '#').count().min(6);
        let has_marker = hashes > 0 && trimmed.chars().nth(hashes) == Some(' ');
        let candidate = if has_marker {
            trimmed[hashes + 1..].trim()
        } else {
            trimmed.trim()
        };
        let key = slugify(candidate);
        let matched = if key.is_empty() || next >= headings.len() {
            None
        } else if has_marker {
            headings[next..]
                .iter()
                .position(|h| slugify(&h.title) == key)
        } else {
            (slugify(&headings[next].title) == key).then_some(0)
        };

        match matched {
            Some(offset) => {
                let heading = &headings[next + offset];
                next += offset + 1;
                anchors.push((heading.slug.clone(), idx));
                let title = if has_marker {
                    candidate.to_string()
                } else {
                    trimmed.to_string()
                };
                new_lines.push(Line::from(Span::styled(title, heading_style(heading.level))));
            }
            None => new_lines.push(line),
        }
    }
    (Text::from(new_lines), anchors)
}

fn heading_style(level: u8) -> Style {
    match level {
        1 | 2 => Style::default().fg(Color::Yellow),
        _ => Style::default().fg(Color::Cyan),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::backend::TestBackend;

    fn screen(pane: &mut PreviewPane, w: u16, h: u16) -> String {
        let mut terminal = Terminal::new(TestBackend::new(w, h)).unwrap();
        terminal.draw(|f| pane.render(f, f.area(), "Preview")).unwrap();
        terminal
            .backend()
            .buffer()
            .content
            .iter()
            .map(|c| c.symbol())
            .collect()
    }

    #[test]
    fn test_new_pane_is_empty() {
        let pane = PreviewPane::new();
        assert!(pane.is_empty());
        assert_eq!(pane.format(), None);
    }

    #[test]
    fn test_plain_text_is_verbatim() {
        let mut pane = PreviewPane::new();
        pane.render_plain_text("**bold**\n# not a heading");
        assert_eq!(pane.lines_as_strings(), ["**bold**", "# not a heading"]);
        assert_eq!(pane.format(), Some(DisplayFormat::PlainText));
        assert!(pane.links().is_empty());
    }

    #[test]
    fn test_markdown_renders_emphasis() {
        let mut pane = PreviewPane::new();
        pane.render_markdown("**bold**");
        let bold = pane
            .text()
            .lines
            .iter()
            .flat_map(|l| l.spans.iter())
            .find(|s| s.content.contains("bold"))
            .expect("bold span");
        assert!(bold.style.add_modifier.contains(Modifier::BOLD));
        assert!(!pane.lines_as_strings().concat().contains("**"));
    }

    #[test]
    fn test_heading_markers_are_replaced_and_anchored() {
        let mut pane = PreviewPane::new();
        pane.render_markdown("# Hello World\n\ntext\n");
        assert!(pane.lines_as_strings().iter().any(|l| l == "Hello World"));
        assert!(!pane.lines_as_strings().iter().any(|l| l.starts_with('#')));
        assert_eq!(pane.anchors().collect::<Vec<_>>(), ["hello-world"]);
    }

    #[test]
    fn test_scroll_to_anchor_moves_heading_to_top() {
        let mut pane = PreviewPane::new();
        pane.set_word_wrap(true);
        let src = format!("# Top\n\n{}## Section1\n\nbody\n", "para\n\n".repeat(20));
        pane.render_markdown(&src);

        assert!(pane.scroll_to_anchor("section1"));
        let top = pane.scroll() as usize;
        assert!(top > 0);
        assert_eq!(pane.lines_as_strings()[top], "Section1");

        assert!(pane.scroll_to_anchor("top"));
        assert!((pane.scroll() as usize) < top);
        assert_eq!(pane.lines_as_strings()[pane.scroll() as usize], "Top");
    }

    #[test]
    fn test_anchor_names_are_matched_exactly() {
        let mut pane = PreviewPane::new();
        pane.render_markdown("# Getting Started
");
        assert!(!pane.scroll_to_anchor("#getting-started"));
        assert!(!pane.scroll_to_anchor("Getting Started"));
        assert!(pane.scroll_to_anchor("getting-started"));
    }

    #[test]
    fn test_unknown_anchor_keeps_scroll() {
        let mut pane = PreviewPane::new();
        pane.render_markdown("# Only\n");
        assert!(!pane.scroll_to_anchor("missing"));
        assert_eq!(pane.scroll(), 0);
    }

    #[test]
    fn test_link_focus_cycles() {
        let mut pane = PreviewPane::new();
        pane.render_markdown("[a](#one) and [b](https://example.com)\n");
        assert_eq!(pane.focused_link(), None);
        assert_eq!(pane.focus_next_link().map(|l| l.target.as_str()), Some("#one"));
        assert_eq!(
            pane.focus_next_link().map(|l| l.target.as_str()),
            Some("https://example.com")
        );
        assert_eq!(pane.focus_next_link().map(|l| l.target.as_str()), Some("#one"));
        assert_eq!(
            pane.focus_prev_link().map(|l| l.target.as_str()),
            Some("https://example.com")
        );
    }

    #[test]
    fn test_clear_drops_content_and_links() {
        let mut pane = PreviewPane::new();
        pane.render_markdown("# Title\n\n[x](#title)\n");
        pane.clear();
        assert!(pane.is_empty());
        assert!(pane.links().is_empty());
        assert_eq!(pane.anchors().count(), 0);
    }

    #[test]
    fn test_render_draws_title_and_content() {
        let mut pane = PreviewPane::new();
        pane.set_word_wrap(true);
        pane.render_plain_text("hello from folio");
        let out = screen(&mut pane, 40, 5);
        assert!(out.contains("Preview"));
        assert!(out.contains("hello from folio"));
    }

    #[test]
    fn test_render_placeholder_when_empty() {
        let mut pane = PreviewPane::new();
        let out = screen(&mut pane, 30, 5);
        assert!(out.contains("(no file)"));
    }

    #[test]
    fn test_word_wrap_rows_follow_width() {
        let mut pane = PreviewPane::new();
        pane.set_word_wrap(true);
        pane.render_plain_text(&"word ".repeat(20));
        screen(&mut pane, 12, 6);
        // 100 columns of text in a 10 column interior
        assert_eq!(pane.rows_before(1), 10);
        pane.scroll_to_bottom();
        assert_eq!(pane.scroll(), 6);
    }
}
