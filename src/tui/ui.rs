use crate::index::types::EntityEntry;
use crate::query::ResultItem;
use crate::tui::app::{App, Mode};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Wrap},
    Frame,
};

pub fn draw(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Query input
            Constraint::Min(10),   // Suggestions / details
            Constraint::Length(1), // Status bar
        ])
        .split(f.area());

    draw_query_input(f, app, chunks[0]);
    draw_main_area(f, app, chunks[1]);
    draw_status_bar(f, app, chunks[2]);

    if app.mode == Mode::Help {
        draw_help(f, f.area());
    }
}

fn draw_query_input(f: &mut Frame, app: &App, area: Rect) {
    let input = Paragraph::new(app.query.as_str())
        .style(Style::default().fg(Color::Yellow))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Restaurants & cuisines (Enter: open cuisine, F5: reindex, ?: help, Esc: quit) "),
        );

    f.render_widget(input, area);

    if app.mode == Mode::Search {
        let cursor = app.query.chars().count() as u16;
        f.set_cursor_position((area.x + cursor + 1, area.y + 1));
    }
}

fn draw_main_area(f: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    draw_results_list(f, app, chunks[0]);
    draw_details(f, app, chunks[1]);
}

fn draw_results_list(f: &mut Frame, app: &App, area: Rect) {
    let needle = app.query.to_lowercase();

    let items: Vec<ListItem> = app
        .results
        .iter()
        .enumerate()
        .map(|(i, result)| {
            let style = if i == app.selected {
                Style::default()
                    .bg(Color::DarkGray)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };

            let (tag, tag_style) = if result.is_cuisine() {
                ("cuisine    ", Style::default().fg(Color::Cyan))
            } else {
                ("restaurant ", Style::default().fg(Color::Magenta))
            };

            let mut spans = vec![Span::styled(tag, tag_style)];
            spans.extend(highlight_match(result.name(), &needle));
            if let ResultItem::Restaurant(entry) = result
                && !entry.location.is_empty()
            {
                spans.push(Span::styled(
                    format!("  {}", entry.location),
                    Style::default().fg(Color::Green),
                ));
            }

            ListItem::new(Line::from(spans)).style(style)
        })
        .collect();

    let title = if app.is_loading() {
        " Suggestions (indexing...) ".to_string()
    } else {
        format!(" Suggestions ({}) ", app.results.len())
    };

    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(title))
        .highlight_style(Style::default().bg(Color::DarkGray));

    f.render_widget(list, area);
}

fn draw_details(f: &mut Frame, app: &App, area: Rect) {
    let (title, content) = match (&app.cuisine_page, app.get_selected_result()) {
        (Some(page), Some(selected)) => {
            let mut lines = Vec::with_capacity(page.data.len() + 1);
            for summary in &page.data {
                lines.push(Line::from(vec![
                    Span::styled(summary.name.clone(), Style::default().add_modifier(Modifier::BOLD)),
                    Span::styled(format!("  {}", summary.location), Style::default().fg(Color::Green)),
                    Span::styled(format!("  {}", summary.rate), Style::default().fg(Color::Yellow)),
                ]));
            }
            if page.total_pages > 1 {
                lines.push(Line::styled(
                    format!("... {} restaurants in total", page.total_records),
                    Style::default().fg(Color::DarkGray),
                ));
            }
            (format!(" {} ", selected.name()), Text::from(lines))
        }
        (None, Some(ResultItem::Restaurant(entry))) => (format!(" {} ", entry.name), restaurant_text(entry)),
        (None, Some(ResultItem::Cuisine { name })) => (
            format!(" {} ", name),
            Text::raw("Press Enter to list restaurants serving this cuisine"),
        ),
        (_, None) => (" Details ".to_string(), Text::raw("")),
    };

    let details = Paragraph::new(content)
        .block(Block::default().borders(Borders::ALL).title(title))
        .wrap(Wrap { trim: false });

    f.render_widget(details, area);
}

fn restaurant_text(entry: &EntityEntry) -> Text<'static> {
    let label = Style::default().fg(Color::DarkGray);
    let yes_no = |v: bool| if v { "yes" } else { "no" };

    let rows = [
        ("Location", entry.location.clone()),
        ("Address", entry.address.clone()),
        ("Cuisines", entry.cuisines.clone()),
        ("Type", entry.category.clone()),
        ("Rating", format!("{} ({} votes)", entry.rating, entry.vote_count)),
        ("Online order", yes_no(entry.online_order).to_string()),
        ("Book table", yes_no(entry.book_table).to_string()),
    ];

    let lines: Vec<Line> = rows
        .into_iter()
        .filter(|(_, value)| !value.trim().is_empty())
        .map(|(name, value)| {
            Line::from(vec![
                Span::styled(format!("{:13}", name), label),
                Span::raw(value),
            ])
        })
        .collect();

    Text::from(lines)
}

fn draw_status_bar(f: &mut Frame, app: &App, area: Rect) {
    let prefix = if app.using_daemon() { "[daemon] " } else { "" };
    let status = Paragraph::new(format!("{}{}", prefix, app.status_message))
        .style(Style::default().fg(Color::Cyan));

    f.render_widget(status, area);
}

fn draw_help(f: &mut Frame, area: Rect) {
    let help = [
        ("type", "refine suggestions"),
        ("Up/Down, Tab", "move selection"),
        ("Ctrl+J / Ctrl+K", "move selection"),
        ("Home / End", "first / last suggestion"),
        ("Ctrl+A / Ctrl+E", "first / last suggestion"),
        ("Enter", "list restaurants for a cuisine"),
        ("Ctrl+W", "delete word"),
        ("F5", "rebuild index from catalog"),
        ("Esc", "clear query, quit when empty"),
        ("Ctrl+C", "quit"),
    ];

    let lines: Vec<Line> = help
        .iter()
        .map(|(key, action)| {
            Line::from(vec![
                Span::styled(format!("{:18}", key), Style::default().fg(Color::Yellow)),
                Span::raw(*action),
            ])
        })
        .collect();

    let width = area.width.min(60);
    let height = area.height.min(lines.len() as u16 + 2);
    let popup = Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    };

    f.render_widget(Clear, popup);
    f.render_widget(
        Paragraph::new(Text::from(lines))
            .block(Block::default().borders(Borders::ALL).title(" Help ")),
        popup,
    );
}

/// Split `text` into spans with the first case-insensitive match highlighted
fn highlight_match(text: &str, needle_lower: &str) -> Vec<Span<'static>> {
    let lower = text.to_lowercase();
    // Byte offsets only line up when lowercasing kept the length
    let found = if lower.len() == text.len() && !needle_lower.is_empty() {
        lower.find(needle_lower)
    } else {
        None
    };

    match found {
        Some(start) if text.is_char_boundary(start) && text.is_char_boundary(start + needle_lower.len()) => {
            let end = start + needle_lower.len();
            vec![
                Span::raw(text[..start].to_string()),
                Span::styled(
                    text[start..end].to_string(),
                    Style::default()
                        .fg(Color::Black)
                        .bg(Color::Yellow)
                        .add_modifier(Modifier::BOLD),
                ),
                Span::raw(text[end..].to_string()),
            ]
        }
        _ => vec![Span::raw(text.to_string())],
    }
}
