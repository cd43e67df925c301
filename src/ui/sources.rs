//! Sources tab: scrape settings and the URL set.

use crate::app::{App, Field};
use crate::util::truncate_to_width;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame,
};

use super::render::form_line;

pub fn render(f: &mut Frame, app: &App, area: Rect) {
    if area.width < 3 || area.height < 3 {
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(6), Constraint::Min(3)])
        .split(area);

    let settings: Vec<Line> = [
        Field::Topic,
        Field::SearchKeyword,
        Field::Workers,
        Field::NewUrl,
    ]
    .into_iter()
    .map(|field| form_line(app, field))
    .collect();
    let form = Paragraph::new(settings).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(app.style("panel_border"))
            .title(" Scrape settings "),
    );
    f.render_widget(form, chunks[0]);

    render_url_list(f, app, chunks[1]);
}

fn render_url_list(f: &mut Frame, app: &App, area: Rect) {
    let focused = app.focused_field() == Some(Field::UrlList);
    let border = if focused {
        app.style("panel_border_focused")
    } else {
        app.style("panel_border")
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border)
        .title(format!(" Source URLs ({}) ", app.session.urls.len()));

    if app.session.urls.is_empty() {
        let empty = Paragraph::new(Span::styled(
            "No URLs. Add one above, or pick a topic and press l to load its sources.",
            app.style("empty_state"),
        ))
        .block(block);
        f.render_widget(empty, area);
        return;
    }

    let width = area.width.saturating_sub(4) as usize;
    let items: Vec<ListItem> = app
        .session
        .urls
        .iter()
        .map(|url| ListItem::new(truncate_to_width(url, width).into_owned()))
        .collect();

    let list = List::new(items)
        .block(block)
        .style(app.style("list_normal"))
        .highlight_style(app.style("list_selected"))
        .highlight_symbol(if focused { "> " } else { "  " });

    let mut state = ListState::default().with_selected(Some(app.selected_url));
    f.render_stateful_widget(list, area, &mut state);
}
