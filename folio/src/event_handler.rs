//! Key event routing
//!
//! Keeps the main loop small: every key press goes through
//! [`handle_key_event`], which picks a handler for the current [`AppMode`].

use crate::app::App;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tui_textarea::{Input as TextInput, Key as TextKey};

fn to_textarea_input(key_event: KeyEvent) -> TextInput {
    let key = match key_event.code {
        KeyCode::Char(c) => TextKey::Char(c),
        KeyCode::Backspace => TextKey::Backspace,
        KeyCode::Enter => TextKey::Enter,
        KeyCode::Left => TextKey::Left,
        KeyCode::Right => TextKey::Right,
        KeyCode::Up => TextKey::Up,
        KeyCode::Down => TextKey::Down,
        KeyCode::Tab => TextKey::Tab,
        KeyCode::Delete => TextKey::Delete,
        KeyCode::Home => TextKey::Home,
        KeyCode::End => TextKey::End,
        KeyCode::PageUp => TextKey::PageUp,
        KeyCode::PageDown => TextKey::PageDown,
        KeyCode::Esc => TextKey::Esc,
        KeyCode::F(n) => TextKey::F(n),
        _ => TextKey::Null,
    };

    TextInput {
        key,
        ctrl: key_event.modifiers.contains(KeyModifiers::CONTROL),
        alt: key_event.modifiers.contains(KeyModifiers::ALT),
        shift: key_event.modifiers.contains(KeyModifiers::SHIFT),
    }
}

/// Main event handler dispatcher
///
/// # Returns
///
/// * `Some(())` - Event was handled, continue the main loop
/// * `None` - Event requests application exit
pub fn handle_key_event(app: &mut App, key_event: KeyEvent) -> Option<()> {
    match app.current_mode() {
        AppMode::Prompt => handle_prompt(app, key_event),
        AppMode::Help => handle_help(app, key_event),
        AppMode::Normal => handle_normal_mode(app, key_event),
    }
}

/// Application modes for event routing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppMode {
    /// "Open note" or "New note" popup is taking input
    Prompt,
    /// Help overlay is displayed
    Help,
    /// Reading the preview
    Normal,
}

impl App {
    pub fn current_mode(&self) -> AppMode {
        if self.prompt.is_some() {
            AppMode::Prompt
        } else if self.show_help {
            AppMode::Help
        } else {
            AppMode::Normal
        }
    }
}

fn handle_prompt(app: &mut App, key_event: KeyEvent) -> Option<()> {
    if key_event.modifiers.contains(KeyModifiers::CONTROL)
        && key_event.code == KeyCode::Char('c')
    {
        return None;
    }
    match key_event.code {
        KeyCode::Enter => app.submit_prompt(),
        KeyCode::Esc => app.cancel_prompt(),
        _ => {
            if let Some(prompt) = app.prompt.as_mut() {
                prompt.handle(to_textarea_input(key_event));
            }
        }
    }
    Some(())
}

fn handle_help(app: &mut App, key_event: KeyEvent) -> Option<()> {
    match key_event.code {
        KeyCode::Esc | KeyCode::Char('?') => app.toggle_help(),
        KeyCode::Char('q') => return None,
        _ => {}
    }
    Some(())
}

fn handle_normal_mode(app: &mut App, key_event: KeyEvent) -> Option<()> {
    match (key_event.code, key_event.modifiers) {
        (KeyCode::Char('q'), _)
        | (KeyCode::Esc, _)
        | (KeyCode::Char('c'), KeyModifiers::CONTROL) => {
            return None;
        }

        (KeyCode::Char('?'), _) => app.toggle_help(),
        (KeyCode::Char('o'), _) => app.open_prompt(),
        (KeyCode::Char('c'), KeyModifiers::NONE) => app.new_note_prompt(),
        (KeyCode::Char('m'), _) | (KeyCode::Tab, _) => app.toggle_format(),
        (KeyCode::Char('r'), _) => app.reload(),

        (KeyCode::Char('n'), _) => app.focus_next_link(),
        (KeyCode::Char('N'), _) | (KeyCode::BackTab, _) => app.focus_prev_link(),
        (KeyCode::Enter, _) => {
            app.activate_link();
        }

        (KeyCode::Up, _) | (KeyCode::Char('k'), _) => app.scroll_up(1),
        (KeyCode::Down, _) | (KeyCode::Char('j'), _) => app.scroll_down(1),
        (KeyCode::PageUp, _) => app.preview_mut().page_up(),
        (KeyCode::PageDown, _) | (KeyCode::Char(' '), _) => app.preview_mut().page_down(),
        (KeyCode::Home, _) | (KeyCode::Char('g'), _) => app.preview_mut().scroll_to_top(),
        (KeyCode::End, _) | (KeyCode::Char('G'), _) => app.preview_mut().scroll_to_bottom(),
        _ => {}
    }
    Some(())
}
