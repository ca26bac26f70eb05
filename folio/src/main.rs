use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyEventKind, MouseEventKind,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use folio::{
    handle_key_event, App, CliOverrides, Config, DisplayFormat, FileWatch, ManualWatch,
    NotifyWatch, Prompt,
};
use ratatui::{prelude::*, widgets::*};
use std::fs::{self, File};
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Live terminal previewer for Markdown and plain-text notes
#[derive(Parser, Debug)]
#[command(name = "folio", version, about)]
struct Args {
    /// Note to open (defaults to the last previewed note)
    file: Option<PathBuf>,

    /// How to display the note
    #[arg(long, value_enum)]
    format: Option<DisplayFormat>,

    /// Base directory for relative paths typed into the open prompt
    #[arg(long)]
    root: Option<PathBuf>,

    /// Settings file to use instead of the default location
    #[arg(long)]
    config: Option<PathBuf>,

    /// Where to write logs
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Do not watch the note; reload only with `r`
    #[arg(long, conflicts_with = "poll_ms")]
    no_watch: bool,

    /// Poll for changes every N milliseconds instead of using OS events
    #[arg(long, value_name = "MS")]
    poll_ms: Option<u64>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

// Ensures terminal is restored even if the app panics or exits abruptly
struct TermGuard;
impl Drop for TermGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let mut stdout = std::io::stdout();
        let _ = execute!(stdout, LeaveAlternateScreen, DisableMouseCapture);
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args)?;

    let config_path = args.config.clone().or_else(|| Config::config_path().ok());
    let session = Config::load_session(config_path);
    if let Some(e) = &session.warning {
        warn!(error = %e, "settings not loaded, they will not be saved this run");
        eprintln!("Warning: {e}");
        eprintln!("Using default configuration; settings will not be saved...");
    }
    let mut config = session.config;
    config.apply_cli(CliOverrides {
        format: args.format,
        root_folder: args.root.clone(),
        poll_interval_ms: args.poll_ms,
    });

    let (watch, live) = build_watch(&args, &config);
    let mut app = App::new(config, session.save_path, watch);
    app.live = live;

    let startup = args
        .file
        .clone()
        .or_else(|| app.config.startup_file().map(PathBuf::from));
    if let Some(path) = startup {
        app.open_path(path);
    }

    let result = run(&mut app);
    if let Err(e) = app.persist() {
        warn!(error = %e, "failed to save settings");
    }
    result
}

fn init_logging(args: &Args) -> Result<()> {
    let path = match &args.log_file {
        Some(path) => path.clone(),
        None => match dirs::cache_dir() {
            Some(dir) => dir.join("folio").join("folio.log"),
            None => return Ok(()),
        },
    };
    if let Some(parent) = path.parent() {
        if fs::create_dir_all(parent).is_err() {
            return Ok(());
        }
    }
    // The terminal belongs to the UI; without a log file we stay silent.
    let Ok(file) = File::create(&path) else {
        return Ok(());
    };

    let filter = if args.verbose {
        EnvFilter::from_default_env().add_directive("folio=debug".parse()?)
    } else {
        EnvFilter::from_default_env().add_directive("folio=info".parse()?)
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .with_thread_ids(false)
        .init();
    Ok(())
}

fn build_watch(args: &Args, config: &Config) -> (Box<dyn FileWatch>, bool) {
    if args.no_watch {
        info!("file watching disabled");
        return (Box::new(ManualWatch::new()), false);
    }
    let watch = match config.poll_interval() {
        Some(interval) => NotifyWatch::polling(interval).map(|w| Box::new(w) as Box<dyn FileWatch>),
        None => NotifyWatch::new().map(|w| Box::new(w) as Box<dyn FileWatch>),
    };
    match watch {
        Ok(watch) => (watch, true),
        Err(e) => {
            warn!(error = %e, "file watcher unavailable, falling back to manual reload");
            (Box::new(ManualWatch::new()), false)
        }
    }
}

fn run(app: &mut App) -> Result<()> {
    // Create a guard to always restore terminal state on exit/panic
    let _tg = TermGuard;
    enable_raw_mode().context("Failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    while !app.wants_quit() {
        terminal.draw(|f| ui(f, app))?;
        if event::poll(Duration::from_millis(200))? {
            match event::read()? {
                Event::Key(k) if k.kind == KeyEventKind::Press => {
                    if handle_key_event(app, k).is_none() {
                        app.quit();
                    }
                }
                Event::Mouse(me) => match me.kind {
                    MouseEventKind::ScrollDown => app.scroll_down(3),
                    MouseEventKind::ScrollUp => app.scroll_up(3),
                    _ => {}
                },
                _ => {}
            }
        }
    }

    disable_raw_mode()?;
    let mut stdout = std::io::stdout();
    execute!(stdout, LeaveAlternateScreen, DisableMouseCapture)?;
    Ok(())
}

fn ui(f: &mut Frame, app: &mut App) {
    app.poll_background_tasks();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(3),    // Preview
            Constraint::Length(1), // Status bar
        ])
        .split(f.area());

    let title = app.title();
    app.preview_mut().render(f, chunks[0], &title);

    let mode = app.watch_label();
    let status = Paragraph::new(format!(
        "{mode} │ m format  o open  c new  r reload  n link  ? help │ {}",
        app.status
    ))
    .style(
        Style::default()
            .fg(Color::Black)
            .bg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    );
    f.render_widget(status, chunks[1]);

    if app.show_help {
        draw_centered_help(f, f.area());
    }
    if let Some(prompt) = &app.prompt {
        draw_prompt(f, f.area(), prompt);
    }
}

fn draw_centered_help(f: &mut Frame, area: Rect) {
    let help = [
        "folio · live note preview",
        "",
        "Open note: o (Enter confirm, Esc cancel)",
        "New note: c (creates an empty file)",
        "Toggle Markdown / Plain Text: m or Tab",
        "Reload: r",
        "",
        "Scroll: ↑↓ j/k, PgUp/PgDn, Home/End",
        "Links: n next, N previous, Enter follow",
        "",
        "Help: ? (toggle)",
        "Quit: q / Esc",
    ]
    .join("\n");
    let paragraph = Paragraph::new(help)
        .block(Block::default().title("Help").borders(Borders::ALL))
        .wrap(Wrap { trim: false });
    let w = area.width.min(50);
    let h = area.height.min(14);
    let x = area.x + (area.width.saturating_sub(w)) / 2;
    let y = area.y + (area.height.saturating_sub(h)) / 2;
    let popup = Rect {
        x,
        y,
        width: w,
        height: h,
    };
    f.render_widget(Clear, popup);
    f.render_widget(paragraph, popup);
}

fn draw_prompt(f: &mut Frame, area: Rect, prompt: &Prompt) {
    let w = area.width.min(70);
    let h = 3;
    let x = area.x + (area.width.saturating_sub(w)) / 2;
    let y = area.y + (area.height.saturating_sub(h)) / 2;
    let popup = Rect {
        x,
        y,
        width: w,
        height: h,
    };
    let block = Block::default()
        .title(prompt.title())
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Green));
    let inner = block.inner(popup);

    // Keep the cursor visible on long paths
    let width = inner.width.max(1) as usize;
    let skip = (prompt.cursor() + 1).saturating_sub(width);
    let visible: String = prompt.value().chars().skip(skip).collect();

    f.render_widget(Clear, popup);
    f.render_widget(block, popup);
    f.render_widget(Paragraph::new(visible), inner);
    let cursor_x = inner.x + (prompt.cursor() - skip) as u16;
    f.set_cursor_position((cursor_x, inner.y));
}
