//! Render functions for the TUI.
//!
//! Lays out the tab bar, the active tab, the banner and the status bar, then
//! draws overlays on top.

use crate::app::{App, BannerKind, Field, Tab};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Paragraph, Tabs},
    Frame,
};

use super::{analytics, help, preview, prompt, results, sources, status};

/// Minimum terminal dimensions required for normal operation.
pub(super) const MIN_WIDTH: u16 = 60;
pub(super) const MIN_HEIGHT: u16 = 12;

pub(super) fn render(f: &mut Frame, app: &mut App) {
    let area = f.area();
    if area.width < 1 || area.height < 1 {
        return;
    }

    if area.width < MIN_WIDTH || area.height < MIN_HEIGHT {
        let msg = if area.height < 3 || area.width < 20 {
            Paragraph::new("Too small")
        } else {
            Paragraph::new(format!(
                "Terminal too small\n\nMinimum: {}x{}\nCurrent: {}x{}",
                MIN_WIDTH, MIN_HEIGHT, area.width, area.height
            ))
            .alignment(Alignment::Center)
        };
        f.render_widget(msg, area);
        return;
    }

    let banner_height = u16::from(app.banner.is_some());
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(banner_height),
            Constraint::Length(1),
        ])
        .split(area);

    render_tab_bar(f, app, chunks[0]);

    match app.tab {
        Tab::Sources => sources::render(f, app, chunks[1]),
        Tab::Results => results::render(f, app, chunks[1]),
        Tab::Article => preview::render(f, app, chunks[1]),
        Tab::Analytics => analytics::render(f, app, chunks[1]),
    }

    if banner_height > 0 {
        render_banner(f, app, chunks[2]);
    }
    status::render(f, app, chunks[3]);

    if app.tab == Tab::Results && app.show_detail {
        results::render_detail(f, app);
    }
    if app.api_key_prompt.is_some() {
        prompt::render(f, app);
    }
    if app.show_help {
        help::render(f, app);
    }
}

fn render_tab_bar(f: &mut Frame, app: &App, area: Rect) {
    let titles = Tab::ALL
        .iter()
        .enumerate()
        .map(|(i, tab)| Line::from(format!("{} {}", i + 1, tab.title())));

    let tabs = Tabs::new(titles)
        .select(app.tab.index())
        .style(app.style("tab_inactive"))
        .highlight_style(app.style("tab_active"))
        .divider(Span::raw("|"));
    f.render_widget(tabs, area);
}

fn render_banner(f: &mut Frame, app: &App, area: Rect) {
    let Some(banner) = &app.banner else {
        return;
    };
    let style = match banner.kind {
        BannerKind::Error => app.style("banner_error"),
        BannerKind::Success => app.style("banner_success"),
    };
    let text = format!(" {}  (Esc to dismiss)", banner.text);
    f.render_widget(Paragraph::new(text).style(style), area);
}

/// One `label: value` row of a form. The focused field is highlighted;
/// while editing, the edit buffer is shown with a cursor.
pub(super) fn form_line(app: &App, field: Field) -> Line<'static> {
    let focused = app.focused_field() == Some(field);
    let label = Span::styled(
        format!("{}{:<15} ", if focused { "> " } else { "  " }, field.label()),
        app.style("field_label"),
    );

    let value = match &app.edit {
        Some(edit) if edit.field == field => {
            Span::styled(format!("{}_", edit.buffer), app.style("field_editing"))
        }
        _ => {
            let raw = app.field_value(field);
            let shown = if field.is_text() {
                if raw.is_empty() {
                    "(empty, Enter to edit)".to_string()
                } else {
                    raw.into_owned()
                }
            } else if focused {
                format!("< {} >", raw)
            } else {
                raw.into_owned()
            };
            let style = if focused {
                app.style("field_focused")
            } else {
                app.style("field_value")
            };
            Span::styled(shown, style)
        }
    };
    Line::from(vec![label, value])
}

/// Create a centered rectangle with the given percentage of the parent area.
pub(super) fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let width = area.width * percent_x / 100;
    let height = area.height * percent_y / 100;
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width, height)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiClient;
    use crate::config::Config;
    use crate::storage::Database;
    use ratatui::{backend::TestBackend, Terminal};

    async fn test_app() -> App {
        let db = Database::open(":memory:").await.unwrap();
        let api = ApiClient::new("http://127.0.0.1:5000").unwrap();
        App::new(db, api, &Config::default(), None)
    }

    fn screen_text(terminal: &Terminal<TestBackend>) -> String {
        let buffer = terminal.backend().buffer();
        buffer
            .content()
            .chunks(buffer.area.width as usize)
            .map(|row| row.iter().map(|cell| cell.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn test_centered_rect() {
        let rect = centered_rect(50, 50, Rect::new(0, 0, 100, 40));
        assert_eq!(rect, Rect::new(25, 10, 50, 20));
    }

    #[tokio::test]
    async fn test_too_small_terminal() {
        let mut app = test_app().await;
        let mut terminal = Terminal::new(TestBackend::new(40, 8)).unwrap();
        terminal.draw(|f| render(f, &mut app)).unwrap();
        assert!(screen_text(&terminal).contains("Terminal too small"));
    }

    #[tokio::test]
    async fn test_every_tab_renders_empty_state() {
        let mut app = test_app().await;
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        for tab in Tab::ALL {
            app.switch_tab(tab);
            terminal.draw(|f| render(f, &mut app)).unwrap();
            assert!(screen_text(&terminal).contains("Analytics"));
        }
        app.switch_tab(Tab::Results);
        terminal.draw(|f| render(f, &mut app)).unwrap();
        assert!(screen_text(&terminal).contains("No articles scraped yet"));
    }

    #[tokio::test]
    async fn test_overlays_render() {
        let mut app = test_app().await;
        app.open_api_key_prompt();
        app.api_key_prompt = Some("secret".into());
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        terminal.draw(|f| render(f, &mut app)).unwrap();
        let text = screen_text(&terminal);
        assert!(text.contains("API Key"));
        assert!(!text.contains("secret"));

        app.api_key_prompt = None;
        app.show_help = true;
        terminal.draw(|f| render(f, &mut app)).unwrap();
        assert!(screen_text(&terminal).contains("Help"));
    }
}
