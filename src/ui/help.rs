//! Help overlay: the scrape → generate → download workflow, then every live
//! binding grouped by context (config overrides included).

use crate::app::App;
use crate::keybindings::{Action, Context};
use ratatui::{
    layout::{Constraint, Direction, Layout},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Row, Table},
    Frame,
};

use super::render::centered_rect;

const CONTEXT_ORDER: [Context; 6] = [
    Context::Global,
    Context::Sources,
    Context::Results,
    Context::Article,
    Context::Analytics,
    Context::Editing,
];

/// Steps of a typical session, each with the action that performs it.
const WORKFLOW: [(Action, &str); 4] = [
    (Action::EnterApiKey, "enter API key"),
    (Action::Scrape, "scrape sources"),
    (Action::Generate, "generate article"),
    (Action::Download, "download"),
];

fn workflow_line(app: &App) -> Line<'static> {
    let mut spans = vec![Span::styled(" Workflow: ", app.style("field_label"))];
    for (i, (action, step)) in WORKFLOW.iter().enumerate() {
        if i > 0 {
            spans.push(Span::styled(" → ", app.style("preview_metadata")));
        }
        let key = app.keybindings.key_hint(*action).unwrap_or_else(|| "?".into());
        spans.push(Span::styled(key, app.style("keyword_tag")));
        spans.push(Span::styled(format!(" {}", step), app.style("preview_body")));
    }
    Line::from(spans)
}

fn binding_rows(app: &App) -> Vec<Row<'static>> {
    let bindings = app.keybindings.all_bindings();
    let mut rows = Vec::with_capacity(bindings.len() + CONTEXT_ORDER.len() * 2);

    for ctx in CONTEXT_ORDER {
        let mut in_ctx = bindings.iter().filter(|(c, ..)| *c == ctx).peekable();
        if in_ctx.peek().is_none() {
            continue;
        }
        if !rows.is_empty() {
            rows.push(Row::new(vec![String::new(), String::new()]));
        }
        rows.push(
            Row::new(vec![format!("{} keys", ctx.label()), String::new()])
                .style(app.style("preview_heading")),
        );
        rows.extend(
            in_ctx.map(|(_, key, _, description)| {
                Row::new(vec![format!("  {}", key), (*description).to_owned()])
            }),
        );
    }
    rows
}

pub fn render(f: &mut Frame, app: &App) {
    let overlay = centered_rect(80, 80, f.area());
    if overlay.width < 20 || overlay.height < 8 {
        return;
    }
    f.render_widget(Clear, overlay);

    let rows = binding_rows(app);
    // Border, workflow line and table header take five rows.
    let visible = overlay.height.saturating_sub(5) as usize;
    let max_scroll = rows.len().saturating_sub(visible);
    let scroll = app.help_scroll_offset.min(max_scroll);

    let title = if max_scroll > 0 {
        format!(" Help {}/{} (j/k scroll, ? or Esc close) ", scroll + 1, max_scroll + 1)
    } else {
        " Help (? or Esc to close) ".to_owned()
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(app.style("panel_border_focused"))
        .title(title);
    let inner = block.inner(overlay);
    f.render_widget(block, overlay);

    let parts = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(2), Constraint::Min(1)])
        .split(inner);
    f.render_widget(Paragraph::new(workflow_line(app)), parts[0]);

    let table = Table::new(
        rows.into_iter().skip(scroll).take(visible),
        [Constraint::Length(18), Constraint::Min(20)],
    )
    .header(
        Row::new(vec!["Key", "Action"])
            .style(app.style("table_header"))
            .bottom_margin(1),
    )
    .style(app.style("preview_body"));
    f.render_widget(table, parts[1]);
}
