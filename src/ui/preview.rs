//! Article tab: the generation form and the generated article.

use crate::app::{App, Field, MAX_SCROLL};
use crate::controller::ArticleStats;
use crate::theme::StyleMap;
use pulldown_cmark::{Event, Parser, Tag, TagEnd};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use super::render::form_line;

const FORM_FIELDS: [Field; 7] = [
    Field::Template,
    Field::GenTopic,
    Field::Audience,
    Field::Tone,
    Field::MaxLength,
    Field::IncludeImages,
    Field::Format,
];

pub fn render(f: &mut Frame, app: &mut App, area: Rect) {
    if area.width < 3 || area.height < 3 {
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(FORM_FIELDS.len() as u16 + 2),
            Constraint::Length(1),
            Constraint::Min(3),
        ])
        .split(area);

    let form: Vec<Line> = FORM_FIELDS.iter().map(|&field| form_line(app, field)).collect();
    f.render_widget(
        Paragraph::new(form).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(app.style("panel_border"))
                .title(" Generation "),
        ),
        chunks[0],
    );

    render_stats(f, app, chunks[1]);
    render_article(f, app, chunks[2]);
}

/// Counts are taken from the raw text on every draw.
fn render_stats(f: &mut Frame, app: &App, area: Rect) {
    let Some(current) = &app.session.current_article else {
        return;
    };
    let stats = ArticleStats::of(&current.article.content);
    let text = format!(
        " Words: {}  Characters: {}  Lines: {}  Generated {} with {}",
        stats.words,
        stats.characters,
        stats.lines,
        current.generated_at.format("%Y-%m-%d %H:%M UTC"),
        current.template,
    );
    f.render_widget(
        Paragraph::new(Span::styled(text, app.style("preview_metadata"))),
        area,
    );
}

fn render_article(f: &mut Frame, app: &mut App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(app.style("panel_border_focused"));

    let Some(current) = &app.session.current_article else {
        let empty = Paragraph::new(Span::styled(
            "No article yet. Scrape some sources, then press g to generate.",
            app.style("empty_state"),
        ))
        .block(block.title(" Article "));
        f.render_widget(empty, area);
        return;
    };

    let (title, lines): (&str, Vec<Line<'static>>) = match (&current.html_content, app.show_html) {
        (Some(html), true) => {
            let style = app.style("preview_inline_code");
            let lines = html
                .lines()
                .map(|l| Line::from(Span::styled(l.to_owned(), style)))
                .collect();
            (" HTML source (h for preview) ", lines)
        }
        _ => {
            let stale = !matches!(&app.preview_cache, Some((variant, _)) if *variant == app.theme_variant);
            if stale {
                let rendered = render_markdown(&current.article.content, &app.theme);
                app.preview_cache = Some((app.theme_variant, rendered));
            }
            let lines = app
                .preview_cache
                .as_ref()
                .map(|(_, lines)| lines.clone())
                .unwrap_or_default();
            let title = if current.html_content.is_some() {
                " Preview (h for HTML source) "
            } else {
                " Preview "
            };
            (title, lines)
        }
    };

    let inner_width = area.width.saturating_sub(2).max(1) as usize;
    let visible = area.height.saturating_sub(2) as usize;
    let total: usize = lines
        .iter()
        .map(|l| l.width().max(1).div_ceil(inner_width))
        .sum();
    app.preview_metrics = (total, visible);
    app.clamp_article_scroll();

    let paragraph = Paragraph::new(Text::from(lines))
        .block(block.title(title))
        .style(app.style("preview_body"))
        .wrap(Wrap { trim: false })
        .scroll((app.article_scroll.min(MAX_SCROLL) as u16, 0));
    f.render_widget(paragraph, area);
}

/// Convert markdown to styled lines.
///
/// Returns owned lines so the result can be cached between draws.
pub fn render_markdown(md: &str, theme: &StyleMap) -> Vec<Line<'static>> {
    let parser = Parser::new(md);
    let mut lines: Vec<Line<'static>> = Vec::with_capacity(md.lines().count());
    let mut current_spans: Vec<Span<'static>> = Vec::with_capacity(4);
    let mut in_code_block = false;
    let mut in_heading = false;
    let mut in_emphasis = false;
    let mut in_strong = false;
    let mut in_link = false;
    let mut list_depth: usize = 0;

    let flush = |lines: &mut Vec<Line<'static>>, spans: &mut Vec<Span<'static>>| {
        if !spans.is_empty() {
            lines.push(Line::from(std::mem::take(spans)));
        }
    };

    for event in parser {
        match event {
            Event::Start(Tag::Heading { .. }) => in_heading = true,
            Event::End(TagEnd::Heading(_)) => {
                flush(&mut lines, &mut current_spans);
                lines.push(Line::from(""));
                in_heading = false;
            }
            Event::Start(Tag::Paragraph) => {}
            Event::End(TagEnd::Paragraph) => {
                flush(&mut lines, &mut current_spans);
                if list_depth == 0 {
                    lines.push(Line::from(""));
                }
            }
            Event::Start(Tag::CodeBlock(_)) => in_code_block = true,
            Event::End(TagEnd::CodeBlock) => {
                flush(&mut lines, &mut current_spans);
                in_code_block = false;
                lines.push(Line::from(""));
            }
            Event::Start(Tag::List(_)) => list_depth += 1,
            Event::End(TagEnd::List(_)) => {
                list_depth = list_depth.saturating_sub(1);
                if list_depth == 0 {
                    lines.push(Line::from(""));
                }
            }
            Event::Start(Tag::Item) => {
                flush(&mut lines, &mut current_spans);
                current_spans.push(Span::raw(format!(
                    "{}• ",
                    "  ".repeat(list_depth.saturating_sub(1))
                )));
            }
            Event::End(TagEnd::Item) => flush(&mut lines, &mut current_spans),
            Event::Start(Tag::Emphasis) => in_emphasis = true,
            Event::End(TagEnd::Emphasis) => in_emphasis = false,
            Event::Start(Tag::Strong) => in_strong = true,
            Event::End(TagEnd::Strong) => in_strong = false,
            Event::Start(Tag::Link { .. }) => in_link = true,
            Event::End(TagEnd::Link) => in_link = false,
            Event::Start(Tag::Image { dest_url, .. }) => {
                current_spans.push(Span::styled(
                    format!("[Image: {}]", dest_url),
                    theme.resolve("preview_link"),
                ));
            }
            Event::Text(text) => {
                let style = if in_code_block {
                    theme.resolve("preview_code_block")
                } else if in_heading {
                    theme.resolve("preview_heading")
                } else if in_link {
                    theme.resolve("preview_link")
                } else if in_strong {
                    theme.resolve("preview_strong")
                } else if in_emphasis {
                    theme.resolve("preview_emphasis")
                } else {
                    theme.resolve("preview_body")
                };
                if in_code_block {
                    // Code blocks keep their own line structure.
                    for line in text.lines() {
                        lines.push(Line::from(Span::styled(line.to_owned(), style)));
                    }
                } else {
                    current_spans.push(Span::styled(text.into_string(), style));
                }
            }
            Event::Code(code) => {
                current_spans.push(Span::styled(
                    format!("`{}`", code),
                    theme.resolve("preview_inline_code"),
                ));
            }
            Event::SoftBreak => current_spans.push(Span::raw(" ")),
            Event::HardBreak => flush(&mut lines, &mut current_spans),
            Event::Rule => {
                flush(&mut lines, &mut current_spans);
                lines.push(Line::from(Span::styled(
                    "─".repeat(40),
                    theme.resolve("preview_metadata"),
                )));
            }
            _ => {}
        }
    }

    flush(&mut lines, &mut current_spans);

    while lines.last().is_some_and(|l| l.width() == 0) {
        lines.pop();
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theme::ThemeVariant;

    fn theme() -> StyleMap {
        StyleMap::from_palette(&ThemeVariant::Dark.palette())
    }

    fn plain(lines: &[Line]) -> Vec<String> {
        lines
            .iter()
            .map(|l| l.spans.iter().map(|s| s.content.as_ref()).collect())
            .collect()
    }

    #[test]
    fn test_render_plain_text() {
        let lines = render_markdown("Hello world", &theme());
        assert_eq!(plain(&lines), vec!["Hello world"]);
    }

    #[test]
    fn test_heading_is_styled() {
        let theme = theme();
        let lines = render_markdown("# Telecom update\n\nBody", &theme);
        assert_eq!(lines[0].spans[0].style, theme.resolve("preview_heading"));
        assert_eq!(plain(&lines), vec!["Telecom update", "", "Body"]);
    }

    #[test]
    fn test_emphasis_and_strong() {
        let theme = theme();
        let lines = render_markdown("a **bold** and *soft* word", &theme);
        let spans = &lines[0].spans;
        assert!(spans
            .iter()
            .any(|s| s.content == "bold" && s.style == theme.resolve("preview_strong")));
        assert!(spans
            .iter()
            .any(|s| s.content == "soft" && s.style == theme.resolve("preview_emphasis")));
    }

    #[test]
    fn test_list_items_get_bullets() {
        let lines = render_markdown("- one\n- two", &theme());
        assert_eq!(plain(&lines), vec!["• one", "• two"]);
    }

    #[test]
    fn test_code_block_keeps_lines() {
        let lines = render_markdown("```\nlet a = 1;\nlet b = 2;\n```", &theme());
        assert_eq!(plain(&lines), vec!["let a = 1;", "let b = 2;"]);
    }

    #[test]
    fn test_render_empty() {
        assert!(render_markdown("", &theme()).is_empty());
    }

    #[test]
    fn test_render_unicode() {
        let lines = render_markdown("Hello 世界 🌍", &theme());
        assert_eq!(plain(&lines), vec!["Hello 世界 🌍"]);
    }
}
