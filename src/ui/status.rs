use crate::app::{App, Tab};
use crate::keybindings::Action;
use ratatui::{layout::Rect, widgets::Paragraph, Frame};
use std::borrow::Cow;

const SPINNER: [&str; super::loop_runner::SPINNER_FRAMES] =
    ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// Render the status bar: busy flows first, then transient text, then hints.
pub fn render(f: &mut Frame, app: &App, area: Rect) {
    if area.width < 1 || area.height < 1 {
        return;
    }

    if let Some(busy) = app.busy_message() {
        let frame = SPINNER[app.spinner_frame % SPINNER.len()];
        let paragraph =
            Paragraph::new(format!("{} {}", frame, busy)).style(app.style("status_busy"));
        f.render_widget(paragraph, area);
        return;
    }

    let text: Cow<'_, str> = if let Some((msg, _)) = &app.status_message {
        Cow::Borrowed(msg.as_ref())
    } else if app.edit.is_some() {
        Cow::Borrowed("Type to edit | Enter confirm | Esc cancel")
    } else {
        Cow::Owned(hints(app))
    };

    f.render_widget(Paragraph::new(text).style(app.style("status_bar")), area);
}

/// Key hints for the active tab, using the keys actually bound.
fn hints(app: &App) -> String {
    let actions: &[(Action, &str)] = match app.tab {
        Tab::Sources => &[
            (Action::LoadSources, "load"),
            (Action::RemoveUrl, "remove"),
            (Action::Scrape, "scrape"),
            (Action::Generate, "generate"),
        ],
        Tab::Results => &[
            (Action::Select, "details"),
            (Action::Generate, "generate"),
        ],
        Tab::Article => &[
            (Action::Generate, "generate"),
            (Action::Download, "download"),
            (Action::ToggleHtml, "html"),
        ],
        Tab::Analytics => &[(Action::Download, "download")],
    };

    let mut parts: Vec<String> = actions
        .iter()
        .filter_map(|(action, label)| {
            app.keybindings
                .key_hint(*action)
                .map(|key| format!("[{}]{}", key, label))
        })
        .collect();
    parts.push("[Tab]field [1-4]tab [K]ey [?]help [q]uit".to_string());
    parts.join(" ")
}
