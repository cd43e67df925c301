//! Results tab: scraped articles as a table, with an excerpt of the selected
//! row and a full-record overlay.

use crate::api::ScrapedArticle;
use crate::app::{App, MAX_SCROLL};
use crate::controller::analytics::word_count;
use crate::util::{strip_control_chars, truncate_chars};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState, Wrap},
    Frame,
};

use super::render::centered_rect;

/// Source URLs in the table are cut to this many characters.
const SOURCE_CHARS: usize = 30;

/// Characters of content shown under the table.
const EXCERPT_CHARS: usize = 400;

fn title_of(article: &ScrapedArticle) -> &str {
    article
        .title
        .as_deref()
        .filter(|t| !t.trim().is_empty())
        .unwrap_or("Untitled")
}

fn date_of(article: &ScrapedArticle) -> &str {
    article
        .publish_date
        .as_deref()
        .filter(|d| !d.trim().is_empty())
        .unwrap_or("Unknown")
}

/// Title, date, source and word count. Every scraped string is stripped of
/// control characters before it reaches the terminal.
fn row_cells(article: &ScrapedArticle) -> [String; 4] {
    let source = article
        .url
        .as_deref()
        .map(|u| truncate_chars(&strip_control_chars(u), SOURCE_CHARS).into_owned())
        .unwrap_or_default();
    let words = article.content.as_deref().map(word_count).unwrap_or(0);
    [
        strip_control_chars(title_of(article)).into_owned(),
        strip_control_chars(date_of(article)).into_owned(),
        source,
        words.to_string(),
    ]
}

pub fn render(f: &mut Frame, app: &App, area: Rect) {
    if area.width < 3 || area.height < 3 {
        return;
    }

    let count = app.session.scraped_count();
    let failed = app.session.scraped_data.len() - count;
    let title = if failed > 0 {
        format!(" Scraped articles ({}, {} failed) ", count, failed)
    } else {
        format!(" Scraped articles ({}) ", count)
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(app.style("panel_border"))
        .title(title);

    if count == 0 {
        let empty = Paragraph::new(Span::styled(
            "No articles scraped yet. Press s to scrape.",
            app.style("empty_state"),
        ))
        .block(block);
        f.render_widget(empty, area);
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(5), Constraint::Length(8)])
        .split(area);

    let rows: Vec<Row> = app
        .session
        .scraped_articles()
        .map(|article| Row::new(row_cells(article).map(Cell::from)))
        .collect();

    let widths = [
        Constraint::Percentage(45),
        Constraint::Length(20),
        Constraint::Length(SOURCE_CHARS as u16 + 4),
        Constraint::Length(7),
    ];
    let table = Table::new(rows, widths)
        .header(Row::new(vec!["Title", "Date", "Source", "Words"]).style(app.style("table_header")))
        .block(block)
        .style(app.style("list_normal"))
        .row_highlight_style(app.style("list_selected"));

    let mut state = TableState::default().with_selected(Some(app.selected_result));
    f.render_stateful_widget(table, chunks[0], &mut state);

    let excerpt = app
        .selected_scraped()
        .and_then(|a| a.content.as_deref())
        .map(|c| truncate_chars(&strip_control_chars(c), EXCERPT_CHARS).into_owned())
        .unwrap_or_else(|| "No content".to_owned());
    let excerpt = Paragraph::new(excerpt)
        .style(app.style("preview_body"))
        .wrap(Wrap { trim: true })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(app.style("panel_border"))
                .title(" Excerpt (Enter for full record) "),
        );
    f.render_widget(excerpt, chunks[1]);
}

/// Full record of the selected article in a centered overlay.
pub fn render_detail(f: &mut Frame, app: &App) {
    let Some(article) = app.selected_scraped() else {
        return;
    };
    let overlay = centered_rect(80, 80, f.area());
    if overlay.width < 20 || overlay.height < 6 {
        return;
    }
    f.render_widget(Clear, overlay);

    let label = app.style("field_label");
    let field = |name: &'static str, value: &str| {
        Line::from(vec![
            Span::styled(format!("{:<8}", name), label),
            Span::raw(strip_control_chars(value).into_owned()),
        ])
    };

    let mut lines = vec![
        Line::from(Span::styled(
            strip_control_chars(title_of(article)).into_owned(),
            app.style("preview_heading"),
        )),
        Line::from(""),
        field("Date", date_of(article)),
        field("Source", article.url.as_deref().unwrap_or("Unknown")),
    ];
    if let Some(author) = article.author.as_deref().filter(|a| !a.is_empty()) {
        lines.push(field("Author", author));
    }
    if let Some(image) = article.image_url.as_deref().filter(|i| !i.is_empty()) {
        lines.push(field("Image", image));
    }
    lines.push(Line::from(""));
    let content = article.content.as_deref().unwrap_or("No content");
    lines.extend(
        strip_control_chars(content)
            .lines()
            .map(|l| Line::from(l.to_owned())),
    );

    let paragraph = Paragraph::new(lines)
        .style(app.style("preview_body"))
        .wrap(Wrap { trim: false })
        .scroll((app.detail_scroll.min(MAX_SCROLL) as u16, 0))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(app.style("panel_border_focused"))
                .title(" Article record (Esc to close) "),
        );
    f.render_widget(paragraph, overlay);
}
