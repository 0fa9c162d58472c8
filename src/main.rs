use std::fs::OpenOptions;
use std::io;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Wrap};

use ctest::app::{App, AppScreen, Finished, Run};
use ctest::client::{LocalSubmitter, Submitter};
use ctest::config::Config;
use ctest::event::{AppEvent, EventHandler};
use ctest::exercise::input::WidgetKey;
use ctest::exercise::style::PresentationStyle;
use ctest::exercise::test::{CTest, TestPhase};
use ctest::server;
use ctest::store::result_store::ResultStore;
use ctest::text::catalog::Catalog;
use ctest::ui::components::completion::{Completion, CompletionKind, format_score};
use ctest::ui::components::notice::Notice;
use ctest::ui::components::passage_view::PassageView;
use ctest::ui::components::progress_bar::ProgressBar;
use ctest::ui::components::style_examples::StyleExamples;
use ctest::ui::components::test_picker::TestPicker;
use ctest::ui::layout::{AppLayout, centered_rect, pack_hint_lines, reading_column};
use ctest::ui::theme::Theme;

const INSTRUCTIONS: &str = "Fill in the missing letters for each word. The first half of each \
target word (rounded up) is provided. Use context clues to determine the complete word.";

const READING_WIDTH: u16 = 90;

#[derive(Parser)]
#[command(name = "ctest", version, about = "C-test reading comprehension study in the terminal")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    #[arg(short, long, help = "Theme name")]
    theme: Option<String>,

    #[arg(short, long, value_enum, help = "Presentation style for single tests")]
    style: Option<PresentationStyle>,

    #[arg(long, help = "Open the test with this id directly")]
    test: Option<String>,

    #[arg(long, help = "Directory for results and session state")]
    data_dir: Option<PathBuf>,

    #[arg(long, help = "Submit results to a ctest server at this URL")]
    server: Option<String>,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the result submission endpoints over HTTP
    Serve {
        #[arg(long, default_value = "127.0.0.1:3000")]
        addr: SocketAddr,

        #[arg(long, help = "Directory for results")]
        data_dir: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let first_run = !Config::config_path().exists();
    let mut config = Config::load().unwrap_or_else(|e| {
        eprintln!("ignoring unreadable config: {e:#}");
        Config::default()
    });
    if first_run && let Err(e) = config.save() {
        eprintln!("could not write default config: {e:#}");
    }

    if let Some(Command::Serve { addr, data_dir }) = cli.command {
        if let Some(dir) = data_dir {
            config.data_dir = dir.to_string_lossy().to_string();
        }
        return run_server(addr, &config);
    }

    if let Some(dir) = cli.data_dir {
        config.data_dir = dir.to_string_lossy().to_string();
    }
    if let Some(url) = cli.server {
        config.submit_url = Some(url);
    }
    if let Some(name) = cli.theme {
        config.theme = name;
    }
    config.normalize();

    init_file_logging(&config)?;
    log::info!("ctest starting, data in {}", config.data_path().display());

    let theme = Theme::load(&config.theme).unwrap_or_else(|| {
        log::warn!(
            "theme {} not found (available: {}), using default",
            config.theme,
            Theme::available_themes().join(", ")
        );
        Theme::default()
    });
    let theme: &'static Theme = Box::leak(Box::new(theme));
    let catalog = Catalog::load();
    let submitter = build_submitter(&config)?;

    let mut app = App::new(config, catalog, theme, submitter);
    if let Some(style) = cli.style {
        app.picker_style = style;
    }
    if let Some(test_id) = cli.test {
        app.start_single(&test_id, app.picker_style);
    }

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let events = EventHandler::new(Duration::from_millis(100));

    let result = run_app(&mut terminal, &mut app, &events);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = result {
        log::error!("{err:?}");
        eprintln!("Error: {err:?}");
    }

    Ok(())
}

fn run_server(addr: SocketAddr, config: &Config) -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let store = ResultStore::new(config.results_path());
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;
    runtime.block_on(server::serve(addr, store))
}

/// The TUI owns the terminal, so log lines go to a file in the data directory.
fn init_file_logging(config: &Config) -> Result<()> {
    let dir = config.data_path();
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create {}", dir.display()))?;
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(dir.join("ctest.log"))
        .context("failed to open log file")?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .init();
    Ok(())
}

fn build_submitter(config: &Config) -> Result<Arc<dyn Submitter>> {
    if let Some(url) = config.submit_url.as_deref() {
        #[cfg(feature = "network")]
        {
            log::info!("submitting results to {url}");
            let submitter = ctest::client::HttpSubmitter::new(url)?;
            return Ok(Arc::new(submitter));
        }
        #[cfg(not(feature = "network"))]
        log::warn!("built without network support; ignoring submit url {url}");
    }
    Ok(Arc::new(LocalSubmitter::new(ResultStore::new(
        config.results_path(),
    ))))
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    events: &EventHandler,
) -> Result<()> {
    loop {
        terminal.draw(|frame| render(frame, app))?;

        match events.next()? {
            AppEvent::Key(key) => handle_key(app, key),
            AppEvent::Tick => app.tick(Instant::now()),
            AppEvent::Resize => {}
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn widget_key(key: &KeyEvent) -> Option<WidgetKey> {
    match key.code {
        KeyCode::Char(ch) => Some(WidgetKey::Char(ch)),
        KeyCode::Backspace => Some(WidgetKey::Backspace),
        KeyCode::Left => Some(WidgetKey::Left),
        KeyCode::Right => Some(WidgetKey::Right),
        KeyCode::Tab => Some(WidgetKey::Tab),
        KeyCode::BackTab => Some(WidgetKey::BackTab),
        KeyCode::Enter => Some(WidgetKey::Enter),
        _ => None,
    }
}

fn handle_key(app: &mut App, key: KeyEvent) {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        app.should_quit = true;
        return;
    }

    // The failure notice blocks everything else.
    if app.notice.is_some() {
        match key.code {
            KeyCode::Enter => app.retry_submission(),
            KeyCode::Esc => app.dismiss_notice(),
            _ => {}
        }
        return;
    }

    match app.screen {
        AppScreen::Menu => handle_menu_key(app, key),
        AppScreen::TestPicker => handle_picker_key(app, key),
        AppScreen::Test => handle_test_key(app, key),
        AppScreen::Completion => match key.code {
            KeyCode::Char('q') => app.should_quit = true,
            KeyCode::Enter | KeyCode::Esc => app.go_to_menu(),
            _ => {}
        },
        AppScreen::NotFound | AppScreen::StyleExamples => {
            if matches!(key.code, KeyCode::Enter | KeyCode::Esc | KeyCode::Char('q')) {
                app.go_to_menu();
            }
        }
    }
}

fn handle_menu_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.should_quit = true,
        KeyCode::Up | KeyCode::Char('k') => app.menu.prev(),
        KeyCode::Down | KeyCode::Char('j') => app.menu.next(),
        KeyCode::Enter => {
            if let Some(action) = app.menu.selected_action() {
                app.activate(action);
            }
        }
        KeyCode::Char(ch) => {
            if let Some(action) = app.menu.action_for_key(ch) {
                app.activate(action);
            }
        }
        _ => {}
    }
}

fn handle_picker_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc | KeyCode::Char('q') => app.go_to_menu(),
        KeyCode::Up | KeyCode::Char('k') => app.picker_prev(),
        KeyCode::Down | KeyCode::Char('j') => app.picker_next(),
        KeyCode::Left | KeyCode::Char('h') => app.picker_style = app.picker_style.prev(),
        KeyCode::Right | KeyCode::Char('l') => app.picker_style = app.picker_style.next(),
        KeyCode::Enter => app.start_picked(),
        _ => {}
    }
}

fn handle_test_key(app: &mut App, key: KeyEvent) {
    if key.code != KeyCode::Esc {
        app.cancel_leave();
    }
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        match key.code {
            KeyCode::Char('s') => app.check_answers(),
            KeyCode::Char('u') => app.submit_all(),
            KeyCode::Char('r') => app.retry_submission(),
            _ => {}
        }
        return;
    }

    match key.code {
        KeyCode::Esc => app.leave_test(),
        KeyCode::PageDown => app.switch_test(true),
        KeyCode::PageUp => app.switch_test(false),
        KeyCode::Enter if app.can_continue() => app.continue_test(),
        _ => {
            if let Some(widget_key) = widget_key(&key) {
                app.handle_test_key(widget_key);
            }
        }
    }
}

fn render(frame: &mut ratatui::Frame, app: &App) {
    let area = frame.area();
    let colors = &app.theme.colors;

    let bg = Block::default().style(Style::default().bg(colors.bg()));
    frame.render_widget(bg, area);

    match app.screen {
        AppScreen::Menu => render_menu(frame, app),
        AppScreen::TestPicker => render_picker(frame, app),
        AppScreen::Test => render_test(frame, app),
        AppScreen::Completion => render_completion(frame, app),
        AppScreen::NotFound => render_not_found(frame, app),
        AppScreen::StyleExamples => {
            frame.render_widget(StyleExamples::new(app.theme), centered_rect(80, 80, area));
        }
    }

    if let Some(message) = app.notice {
        let hint = "[Enter] Try again  [Esc] Dismiss";
        frame.render_widget(Notice::new("Submission failed", message, hint, app.theme), area);
    }
}

fn render_header(frame: &mut ratatui::Frame, app: &App, area: Rect, title: &str, info: &str) {
    let colors = &app.theme.colors;
    let header = Paragraph::new(Line::from(vec![
        Span::styled(
            format!(" {title} "),
            Style::default()
                .fg(colors.header_fg())
                .bg(colors.header_bg())
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            info.to_string(),
            Style::default().fg(colors.text_muted()).bg(colors.header_bg()),
        ),
    ]))
    .block(Block::default().style(Style::default().bg(colors.header_bg())));
    frame.render_widget(header, area);
}

fn render_footer(frame: &mut ratatui::Frame, app: &App, area: Rect, lines: &[String]) {
    let style = Style::default().fg(app.theme.colors.text_muted());
    let lines: Vec<Line> = lines
        .iter()
        .map(|l| Line::from(Span::styled(l.clone(), style)))
        .collect();
    frame.render_widget(Paragraph::new(lines), area);
}

fn render_menu(frame: &mut ratatui::Frame, app: &App) {
    let area = frame.area();
    let hints = pack_hint_lines(
        &["[1-3] Start", "[e] Style examples", "[j/k] Move", "[q] Quit"],
        area.width as usize,
    );
    let layout = AppLayout::new(area, hints.len() as u16);

    let info = match app.config.submit_url.as_deref() {
        Some(url) => format!("results to {url}"),
        None => format!("results in {}", app.config.results_path().display()),
    };
    render_header(frame, app, layout.header, "ctest", &info);
    frame.render_widget(&app.menu, centered_rect(60, 90, layout.main));
    render_footer(frame, app, layout.footer, &hints);
}

fn render_picker(frame: &mut ratatui::Frame, app: &App) {
    let area = frame.area();
    let hints = pack_hint_lines(
        &["[j/k] Choose text", "[h/l] Change style", "[Enter] Start", "[Esc] Back"],
        area.width as usize,
    );
    let layout = AppLayout::new(area, hints.len() as u16);

    render_header(frame, app, layout.header, "Single test", app.picker_style.label());
    let picker = TestPicker::new(
        app.catalog.all(),
        app.picker_selected,
        app.picker_style,
        app.theme,
    );
    frame.render_widget(picker, reading_column(layout.main, READING_WIDTH));
    render_footer(frame, app, layout.footer, &hints);
}

fn test_hints(app: &App, test: &CTest) -> Vec<&'static str> {
    let mut hints = Vec::new();
    match test.phase {
        TestPhase::Initial => {
            if test.style.has_letter_slots() {
                hints.push("[Left/Right] Move");
            } else {
                hints.push("[Tab/Enter] Next word");
                hints.push("[Shift+Tab] Previous word");
            }
            hints.push("[Ctrl+S] Check answers");
        }
        TestPhase::ShowingAnswers { .. } => {}
        TestPhase::ShowingContinue => {
            if app.can_continue() {
                hints.push("[Enter] Continue");
            }
        }
    }
    if matches!(app.run, Some(Run::AllAtOnce { .. })) {
        hints.push("[PgUp/PgDn] Switch text");
        if app.can_submit_all() {
            hints.push("[Ctrl+U] Submit all");
        }
    }
    if app.pending_retry.is_some() {
        hints.push("[Ctrl+R] Retry submission");
    }
    hints.push("[Esc] Menu");
    hints
}

fn status_line(app: &App, test: &CTest) -> Line<'static> {
    let colors = &app.theme.colors;
    if app.confirm_leave {
        return Line::from(Span::styled(
            "Press Esc again to leave. Completed tests in this session will be lost.",
            Style::default().fg(colors.warning()),
        ));
    }
    if app.is_submitting() {
        return Line::from(Span::styled(
            "Submitting results...",
            Style::default().fg(colors.warning()),
        ));
    }
    let score = test.summary.as_ref().map(|s| {
        format!(
            "Score: {} ({} of {} words correct)",
            format_score(s.score),
            s.correct_words,
            s.total_words
        )
    });
    match (test.phase, score) {
        (TestPhase::Initial, _) => Line::from(Span::styled(
            format!("{:.0}% of missing letters filled", test.fill_ratio() * 100.0),
            Style::default().fg(colors.text_muted()),
        )),
        (TestPhase::ShowingAnswers { .. }, Some(score)) => {
            let wait = test
                .remaining_delay(Instant::now())
                .map(|d| d.as_secs_f64().ceil() as u64)
                .unwrap_or(0);
            Line::from(vec![
                Span::styled(score, Style::default().fg(colors.accent())),
                Span::styled(
                    format!("  \u{00b7} continue in {wait}s"),
                    Style::default().fg(colors.text_muted()),
                ),
            ])
        }
        (_, Some(score)) => Line::from(Span::styled(
            score,
            Style::default()
                .fg(colors.accent())
                .add_modifier(Modifier::BOLD),
        )),
        (_, None) => Line::from(""),
    }
}

fn tab_line(app: &App) -> Option<Line<'static>> {
    let Some(Run::AllAtOnce {
        session,
        tests,
        active,
    }) = &app.run
    else {
        return None;
    };
    let colors = &app.theme.colors;
    let spans = tests
        .iter()
        .enumerate()
        .map(|(i, test)| {
            let done = session.is_completed(&test.test_id);
            let label = format!(" {}{} ", i + 1, if done { "\u{2713}" } else { "" });
            let style = if i == *active {
                Style::default()
                    .fg(colors.focus_fg())
                    .bg(colors.focus_bg())
                    .add_modifier(Modifier::BOLD)
            } else if done {
                Style::default().fg(colors.correct())
            } else {
                Style::default().fg(colors.text_muted()).bg(colors.accent_dim())
            };
            Span::styled(label, style)
        })
        .collect::<Vec<_>>();
    Some(Line::from(spans))
}

fn render_test(frame: &mut ratatui::Frame, app: &App) {
    let area = frame.area();
    let colors = &app.theme.colors;
    let Some(test) = app.current_test() else {
        return;
    };

    let hints = pack_hint_lines(&test_hints(app, test), area.width as usize);
    let layout = AppLayout::new(area, hints.len() as u16);

    let mut info = format!(
        "{} \u{00b7} {}",
        test.style.label(),
        if test.simplified { "Simplified" } else { "Standard" }
    );
    if let Some(pid) = app.run.as_ref().and_then(Run::participant_id) {
        info.push_str(&format!(" \u{00b7} participant {pid}"));
    }
    render_header(frame, app, layout.header, &test.title, &info);

    let column = reading_column(layout.main, READING_WIDTH);
    let tabs = tab_line(app);
    let progress = app.session_progress();

    let mut constraints = Vec::new();
    if app.config.show_instructions {
        constraints.push(Constraint::Length(5));
    }
    if tabs.is_some() {
        constraints.push(Constraint::Length(1));
    }
    constraints.push(Constraint::Min(5));
    constraints.push(Constraint::Length(1));
    if progress.is_some() {
        constraints.push(Constraint::Length(3));
    }
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(column);

    let mut idx = 0;
    if app.config.show_instructions {
        let instructions = Paragraph::new(vec![
            Line::from(Span::styled(INSTRUCTIONS, Style::default().fg(colors.fg()))),
            Line::from(Span::styled(
                format!(
                    "Style: {} \u{00b7} Text type: {}",
                    test.style.label(),
                    if test.simplified { "Simplified" } else { "Standard" }
                ),
                Style::default().fg(colors.text_muted()),
            )),
        ])
        .block(
            Block::bordered()
                .title(" Instructions ")
                .border_style(Style::default().fg(colors.border())),
        )
        .wrap(Wrap { trim: true });
        frame.render_widget(instructions, rows[idx]);
        idx += 1;
    }
    if let Some(tabs) = tabs {
        frame.render_widget(Paragraph::new(tabs), rows[idx]);
        idx += 1;
    }

    frame.render_widget(
        PassageView::new(test, app.theme).title(test.title.clone()),
        rows[idx],
    );
    idx += 1;
    frame.render_widget(
        Paragraph::new(status_line(app, test)).alignment(Alignment::Center),
        rows[idx],
    );
    idx += 1;
    if let Some((done, total)) = progress {
        frame.render_widget(ProgressBar::new("Tests completed", done, total, app.theme), rows[idx]);
    }

    render_footer(frame, app, layout.footer, &hints);
}

fn render_completion(frame: &mut ratatui::Frame, app: &App) {
    let area = centered_rect(60, 60, frame.area());
    let kind = match &app.finished {
        Some(Finished::Single(result)) => CompletionKind::Single(result),
        Some(Finished::Session {
            participant_id,
            completed,
        }) => CompletionKind::Session {
            participant_id,
            completed: *completed,
        },
        None => return,
    };
    frame.render_widget(Completion::new(kind, app.theme), area);
}

fn render_not_found(frame: &mut ratatui::Frame, app: &App) {
    let colors = &app.theme.colors;
    let area = centered_rect(50, 30, frame.area());
    let id = app.missing_test.as_deref().unwrap_or_default();
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            "Test not found",
            Style::default()
                .fg(colors.error())
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            format!("No text with id \"{id}\"."),
            Style::default().fg(colors.fg()),
        )),
        Line::from(""),
        Line::from(Span::styled(
            "[Enter] Return to menu",
            Style::default().fg(colors.accent()),
        )),
    ];
    frame.render_widget(
        Paragraph::new(lines)
            .alignment(Alignment::Center)
            .block(Block::bordered().border_style(Style::default().fg(colors.border()))),
        area,
    );
}
