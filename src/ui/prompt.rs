//! API key prompt. The key is never drawn; only its length shows as dots.

use crate::app::App;
use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

pub fn render(f: &mut Frame, app: &App) {
    let Some(buffer) = &app.api_key_prompt else {
        return;
    };
    let area = f.area();
    let width = (area.width * 60 / 100).max(40).min(area.width);
    let height = 7.min(area.height);
    let overlay = Rect::new(
        area.x + (area.width - width) / 2,
        area.y + (area.height - height) / 2,
        width,
        height,
    );
    f.render_widget(Clear, overlay);

    let masked = "•".repeat(buffer.chars().count());
    let lines = vec![
        Line::from(Span::styled(
            "The key is sent with scrape and generate requests and saved locally.",
            app.style("preview_metadata"),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled("Key: ", app.style("field_label")),
            Span::styled(format!("{}_", masked), app.style("field_editing")),
        ]),
        Line::from(""),
        Line::from(Span::styled(
            "Enter to save, Esc to cancel",
            app.style("preview_metadata"),
        )),
    ];

    let paragraph = Paragraph::new(lines).wrap(Wrap { trim: true }).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(app.style("panel_border_focused"))
            .title(" API Key "),
    );
    f.render_widget(paragraph, overlay);
}
