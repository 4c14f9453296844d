mod app;
mod ui;

pub use app::App;

use crate::utils::AppConfig;
use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::path::PathBuf;
use std::time::Duration;

pub fn run(catalog_path: Option<PathBuf>, config: AppConfig, initial_query: Option<String>) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    terminal.clear()?;

    // Index builds in background; the UI is usable immediately
    let mut app = App::new(catalog_path, config);

    if let Some(query) = initial_query {
        app.set_query(&query);
        app.execute_search();
    }

    let result = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn run_app(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App) -> Result<()> {
    loop {
        app.poll_load();

        terminal.draw(|f| ui::draw(f, app))?;

        if !event::poll(Duration::from_millis(100))? {
            continue;
        }

        let Event::Key(key) = event::read()? else {
            continue;
        };
        // Only handle key press events, not release or repeat
        if key.kind != KeyEventKind::Press {
            continue;
        }

        match (key.modifiers, key.code) {
            (KeyModifiers::CONTROL, KeyCode::Char('c')) => return Ok(()),
            (KeyModifiers::CONTROL, KeyCode::Char('q')) => return Ok(()),
            _ => {}
        }

        if app.mode == app::Mode::Help {
            // Any key closes help
            app.hide_help();
            continue;
        }

        match (key.modifiers, key.code) {
            (KeyModifiers::CONTROL, KeyCode::Char('j'))
            | (KeyModifiers::CONTROL, KeyCode::Char('n')) => app.select_next(),
            (KeyModifiers::CONTROL, KeyCode::Char('k'))
            | (KeyModifiers::CONTROL, KeyCode::Char('p')) => app.select_prev(),
            (KeyModifiers::CONTROL, KeyCode::Char('w')) => app.delete_word(),
            (KeyModifiers::CONTROL, KeyCode::Char('h')) => app.backspace(),
            (KeyModifiers::CONTROL, KeyCode::Char('a')) => app.select_first(),
            (KeyModifiers::CONTROL, KeyCode::Char('e')) => app.select_last(),
            (KeyModifiers::NONE | KeyModifiers::SHIFT, code) => match code {
                KeyCode::Esc => {
                    if app.query.is_empty() {
                        return Ok(());
                    }
                    app.clear_query();
                }
                KeyCode::Enter => app.open_selected(),
                KeyCode::Down | KeyCode::Tab => app.select_next(),
                KeyCode::Up | KeyCode::BackTab => app.select_prev(),
                KeyCode::Home => app.select_first(),
                KeyCode::End => app.select_last(),
                KeyCode::Char('?') => app.show_help(),
                KeyCode::Char(c) => app.push_char(c),
                KeyCode::Backspace => app.backspace(),
                KeyCode::F(1) => app.show_help(),
                KeyCode::F(5) => app.reindex(),
                _ => {}
            },
            _ => {}
        }
    }
}
