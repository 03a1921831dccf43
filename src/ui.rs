//! Terminal UI rendering.
//!
//! All drawing logic lives here, separated from application state ([`App`])
//! and input handling ([`crate::input`]).
//!
//! The layout is a two-row split: a scrollable list on top and a one-line
//! status bar at the bottom.

use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph},
    Frame,
};

use crate::app::App;

/// Draw the complete UI for one frame.
pub fn draw(app: &mut App, frame: &mut Frame) {
    let [main_area, status_area] = Layout::vertical([
        Constraint::Min(1),
        Constraint::Length(1),
    ])
    .areas(frame.area());

    draw_list(app, frame, main_area);
    draw_status_bar(app, frame, status_area);
}

/// Render the scrollable list of articles or sources.
fn draw_list(app: &mut App, frame: &mut Frame, area: Rect) {
    let list_items: Vec<ListItem> = app
        .entries
        .iter()
        .map(|entry| {
            let line = Line::from(vec![
                Span::styled(
                    format!("{:<18}", entry.detail),
                    Style::default().fg(Color::DarkGray),
                ),
                Span::raw(" "),
                Span::styled(&entry.title, Style::default().fg(Color::White)),
                Span::raw("  "),
                Span::styled(
                    format!("[{}]", entry.tag),
                    Style::default().fg(Color::Cyan),
                ),
            ]);

            ListItem::new(line)
        })
        .collect();

    let list = List::new(list_items)
        .block(
            Block::default()
                .title(app.title.as_str())
                .borders(Borders::ALL),
        )
        .highlight_style(
            Style::default()
                .add_modifier(Modifier::BOLD)
                .bg(Color::DarkGray),
        )
        .highlight_symbol("▸ ");

    frame.render_stateful_widget(list, area, &mut app.list_state);
}

/// Render the bottom status bar.
fn draw_status_bar(app: &App, frame: &mut Frame, area: Rect) {
    let status = Paragraph::new(Line::from(vec![
        Span::styled(" ", Style::default()),
        Span::styled(&app.status, Style::default().fg(Color::Yellow)),
        Span::raw("  "),
        Span::styled(
            format!("{} items", app.entries.len()),
            Style::default().fg(Color::Green),
        ),
        Span::raw("  q: quit  r: refresh  ↑/↓: scroll  Home/End: jump"),
    ]));
    frame.render_widget(status, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::Entry;
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    fn sample_app() -> App {
        let mut app = App::new(" Headlines: technology / us ");
        app.show(vec![
            Entry {
                detail: "2024-05-01 08:00".into(),
                title: "Chips get faster".into(),
                tag: "Example".into(),
            },
            Entry {
                detail: "no date".into(),
                title: "Compilers get smarter".into(),
                tag: "Wire".into(),
            },
        ]);
        app
    }

    fn render(app: &mut App) -> String {
        let backend = TestBackend::new(100, 24);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal.draw(|f| draw(app, f)).unwrap();
        let buf = terminal.backend().buffer().clone();
        buf.content()
            .iter()
            .map(|c| c.symbol().chars().next().unwrap_or(' '))
            .collect()
    }

    #[test]
    fn draw_does_not_panic_with_no_entries() {
        let mut app = App::new(" Search: rust ");
        render(&mut app);
    }

    #[test]
    fn draw_shows_titles_and_border_label() {
        let mut app = sample_app();
        app.select_first();

        let text = render(&mut app);

        assert!(text.contains("Chips get faster"));
        assert!(text.contains("[Wire]"));
        assert!(text.contains("Headlines: technology / us"));
    }

    #[test]
    fn draw_status_shows_item_count() {
        let mut app = sample_app();
        app.status = "OK".to_string();

        let text = render(&mut app);

        assert!(text.contains("2 items"), "status bar should show item count");
    }
}
