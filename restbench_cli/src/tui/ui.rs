//! TUI rendering functions

use super::app::{BrowseApp, View};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState, Wrap},
    Frame,
};
use restbench_common::LogEntry;

/// Draw the TUI
pub fn draw(frame: &mut Frame, app: &BrowseApp) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Title bar
            Constraint::Min(5),    // History or detail
            Constraint::Length(1), // Footer
        ])
        .split(frame.area());

    draw_title_bar(frame, app, chunks[0]);
    match app.view {
        View::List => draw_history(frame, app, chunks[1]),
        View::Detail => draw_detail(frame, app, chunks[1]),
    }
    draw_footer(frame, app, chunks[2]);
}

fn draw_title_bar(frame: &mut Frame, app: &BrowseApp, area: Rect) {
    let loaded = app.browser.entries().len();
    let total = app
        .browser
        .total()
        .map(|t| t.to_string())
        .unwrap_or_else(|| "?".to_string());

    let line = Line::from(vec![
        Span::styled(
            " restbench ",
            Style::default().fg(Color::Black).bg(Color::Magenta).add_modifier(Modifier::BOLD),
        ),
        Span::raw(format!(" {}  ", app.server_url)),
        Span::styled(
            format!("{}/{} loaded", loaded, total),
            Style::default().fg(Color::DarkGray),
        ),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

/// Color for an HTTP method badge
pub fn method_color(method: &str) -> Color {
    match method {
        "GET" => Color::Green,
        "POST" => Color::Blue,
        "PUT" => Color::Yellow,
        "DELETE" => Color::Red,
        _ => Color::Gray,
    }
}

/// Color for a status code
pub fn status_color(status: i32) -> Color {
    match status {
        200..=299 => Color::Green,
        300..=399 => Color::Blue,
        400..=499 => Color::Yellow,
        _ => Color::Red,
    }
}

fn draw_history(frame: &mut Frame, app: &BrowseApp, area: Rect) {
    let entries = app.browser.entries();

    if entries.is_empty() {
        let text = if app.browser.needs_load() {
            "Loading history..."
        } else {
            "No requests yet. Send one with `restbench send GET <URL>`."
        };
        let empty = Paragraph::new(text)
            .style(Style::default().fg(Color::DarkGray))
            .block(Block::default().borders(Borders::ALL).title(" Request History "));
        frame.render_widget(empty, area);
        return;
    }

    let rows: Vec<Row> = entries
        .iter()
        .map(|entry| {
            Row::new(vec![
                Cell::from(entry.id.to_string()),
                Cell::from(entry.method.clone()).style(
                    Style::default()
                        .fg(method_color(&entry.method))
                        .add_modifier(Modifier::BOLD),
                ),
                Cell::from(entry.url.clone()),
                Cell::from(entry.status_code.to_string())
                    .style(Style::default().fg(status_color(entry.status_code))),
                Cell::from(entry.created_at.format("%Y-%m-%d %H:%M:%S").to_string()),
            ])
        })
        .collect();

    let title = if app.browser.has_more() {
        " Request History (scroll for more) "
    } else {
        " Request History "
    };

    let table = Table::new(
        rows,
        [
            Constraint::Length(6),
            Constraint::Length(7),
            Constraint::Min(20),
            Constraint::Length(6),
            Constraint::Length(19),
        ],
    )
    .header(
        Row::new(vec!["ID", "METHOD", "URL", "STATUS", "CREATED"])
            .style(Style::default().add_modifier(Modifier::BOLD)),
    )
    .block(Block::default().borders(Borders::ALL).title(title))
    .row_highlight_style(Style::default().bg(Color::DarkGray));

    let mut state = TableState::default().with_selected(Some(app.selected_index));
    frame.render_stateful_widget(table, area, &mut state);
}

fn draw_detail(frame: &mut Frame, app: &BrowseApp, area: Rect) {
    let Some(entry) = app.selected() else {
        return;
    };

    let paragraph = Paragraph::new(detail_lines(entry))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!(" #{} ", entry.id)),
        )
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

fn detail_lines(entry: &LogEntry) -> Vec<Line<'static>> {
    let mut lines = vec![
        Line::from(vec![
            Span::styled(
                format!("{} ", entry.method),
                Style::default().fg(method_color(&entry.method)).add_modifier(Modifier::BOLD),
            ),
            Span::raw(entry.url.clone()),
        ]),
        Line::from(vec![
            Span::raw("Status: "),
            Span::styled(
                entry.status_code.to_string(),
                Style::default().fg(status_color(entry.status_code)),
            ),
            Span::raw(format!("   Created: {}", entry.created_at.to_rfc3339())),
        ]),
        Line::raw(""),
    ];

    let mut section = |title: &str, value: &serde_json::Value| {
        lines.push(Line::styled(
            title.to_string(),
            Style::default().add_modifier(Modifier::BOLD),
        ));
        let pretty = serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string());
        lines.extend(pretty.lines().map(|l| Line::raw(l.to_string())));
        lines.push(Line::raw(""));
    };

    section("Headers", &entry.headers);
    if let Some(body) = &entry.body {
        section("Body", body);
    }
    section("Response", &entry.response);

    lines
}

fn draw_footer(frame: &mut Frame, app: &BrowseApp, area: Rect) {
    let hint = match app.view {
        View::List => " ↑/↓ move  Enter details  q quit",
        View::Detail => " Esc back  q quit",
    };
    let mut spans = vec![Span::styled(hint, Style::default().fg(Color::DarkGray))];
    if let Some(status) = &app.status {
        spans.push(Span::styled(
            format!("  {}", status),
            Style::default().fg(Color::Red),
        ));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}
