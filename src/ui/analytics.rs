//! Analytics tab: sentiment gauges, keyword chart and tags, image gallery.
//!
//! Each panel shows its own empty state, so a sparse article still renders.

use crate::app::App;
use crate::controller::analytics::{SentimentBand, MAX_CHART_KEYWORDS};
use crate::util::truncate_to_width;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Bar, BarChart, BarGroup, Block, Borders, Gauge, Paragraph, Wrap},
    Frame,
};

const GAUGE_HEIGHT: u16 = 2;

pub fn render(f: &mut Frame, app: &App, area: Rect) {
    if area.width < 3 || area.height < 3 {
        return;
    }

    if app.session.current_article.is_none() {
        let empty = Paragraph::new(Span::styled(
            "Generate an article to see its analytics.",
            app.style("empty_state"),
        ))
        .block(panel(app, " Analytics "));
        f.render_widget(empty, area);
        return;
    }

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);
    let top = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
        .split(rows[0]);

    render_sentiment(f, app, top[0]);
    render_keywords(f, app, top[1]);
    render_gallery(f, app, rows[1]);
}

fn panel(app: &App, title: &'static str) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(app.style("panel_border"))
        .title(title)
}

fn empty_state(f: &mut Frame, app: &App, block: Block<'static>, text: &'static str, area: Rect) {
    f.render_widget(
        Paragraph::new(Span::styled(text, app.style("empty_state"))).block(block),
        area,
    );
}

fn band_style(app: &App, band: SentimentBand) -> Style {
    match band {
        SentimentBand::Negative => app.style("gauge_negative"),
        SentimentBand::Neutral => app.style("gauge_neutral"),
        SentimentBand::Positive => app.style("gauge_positive"),
    }
}

fn render_sentiment(f: &mut Frame, app: &App, area: Rect) {
    let block = panel(app, " Sentiment ");
    let gauges = app.session.analytics.gauges();
    let notes = app.session.analytics.sentiment_notes();
    if gauges.is_empty() && notes.is_empty() {
        return empty_state(f, app, block, "No sentiment data available", area);
    }

    let inner = block.inner(area);
    f.render_widget(block, area);

    // Scrolling works in whole gauges.
    let skip = app.analytics_scroll.min(gauges.len().saturating_sub(1));
    let mut y = inner.y;
    for gauge in gauges.iter().skip(skip) {
        if y + GAUGE_HEIGHT > inner.y + inner.height {
            break;
        }
        let label_area = Rect::new(inner.x, y, inner.width, 1);
        let bar_area = Rect::new(inner.x, y + 1, inner.width, 1);
        f.render_widget(
            Paragraph::new(Span::styled(
                format!("{} ({:+.2})", gauge.label, gauge.raw),
                app.style("field_label"),
            )),
            label_area,
        );
        f.render_widget(
            Gauge::default()
                .gauge_style(band_style(app, gauge.band()))
                .ratio(gauge.value / 100.0)
                .label(format!("{:.0}%", gauge.value)),
            bar_area,
        );
        y += GAUGE_HEIGHT;
    }

    for (label, text) in notes {
        if y >= inner.y + inner.height {
            break;
        }
        f.render_widget(
            Paragraph::new(Line::from(vec![
                Span::styled(format!("{}: ", label), app.style("field_label")),
                Span::styled(text, app.style("field_value")),
            ])),
            Rect::new(inner.x, y, inner.width, 1),
        );
        y += 1;
    }
}

fn render_keywords(f: &mut Frame, app: &App, area: Rect) {
    let block = panel(app, " Keywords ");
    let bars = app.session.analytics.keyword_bars();
    if bars.is_empty() {
        return empty_state(f, app, block, "No keywords available", area);
    }

    let inner = block.inner(area);
    f.render_widget(block, area);

    let tags: Vec<Span> = app
        .session
        .analytics
        .keyword_tags()
        .flat_map(|tag| {
            [
                Span::styled(format!(" {} ", tag), app.style("keyword_tag")),
                Span::raw(" "),
            ]
        })
        .collect();
    let tag_height = if tags.is_empty() { 0 } else { 2 };

    let parts = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(tag_height)])
        .split(inner);

    // Horizontal bars so labels have room.
    let label_width = parts[0].width.saturating_sub(8) as usize / 2;
    let chart_bars: Vec<Bar> = bars
        .iter()
        .map(|bar| {
            Bar::default()
                .label(Line::from(
                    truncate_to_width(&bar.label, label_width.max(4)).into_owned(),
                ))
                .value(bar.weight)
                .text_value(bar.weight.to_string())
        })
        .collect();
    let chart = BarChart::default()
        .direction(Direction::Horizontal)
        .bar_width(1)
        .bar_gap(0)
        .bar_style(app.style("keyword_bar"))
        .max(MAX_CHART_KEYWORDS as u64)
        .data(BarGroup::default().bars(&chart_bars));
    f.render_widget(chart, parts[0]);

    if tag_height > 0 {
        f.render_widget(
            Paragraph::new(Line::from(tags)).wrap(Wrap { trim: true }),
            parts[1],
        );
    }
}

fn render_gallery(f: &mut Frame, app: &App, area: Rect) {
    let block = panel(app, " Images ");
    let cards = app.session.analytics.gallery();
    if cards.is_empty() {
        return empty_state(f, app, block, "No images available", area);
    }

    let lines: Vec<Line> = cards
        .iter()
        .enumerate()
        .flat_map(|(i, card)| {
            [
                Line::from(vec![
                    Span::styled(format!("{:>2}. ", i + 1), app.style("field_label")),
                    Span::styled(card.title.clone(), app.style("preview_strong")),
                    Span::styled(format!("  {}", card.source), app.style("preview_metadata")),
                ]),
                Line::from(Span::styled(
                    format!("    {}", card.url),
                    app.style("preview_link"),
                )),
            ]
        })
        .collect();

    f.render_widget(Paragraph::new(lines).block(block), area);
}
