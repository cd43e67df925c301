//! Input handling for the TUI.
//!
//! Overlays capture keys first (help, API key prompt, record detail), then
//! text editing, then the active tab's bindings.

use crate::app::{App, AppEvent, Field, Tab, MAX_INPUT_LENGTH};
use crate::keybindings::{Action as KbAction, Context as KbContext};
use anyhow::Result;
use crossterm::event::{KeyCode, KeyModifiers};
use tokio::sync::mpsc;

use super::helpers::{
    spawn_download, spawn_generate, spawn_save_api_key, spawn_scrape, spawn_sources_load,
    spawn_template_defaults,
};
use super::Action;

pub(super) fn handle_input(
    app: &mut App,
    code: KeyCode,
    modifiers: KeyModifiers,
    event_tx: &mpsc::Sender<AppEvent>,
) -> Result<Action> {
    if app.show_help {
        return Ok(handle_help_input(app, code));
    }

    if app.api_key_prompt.is_some() {
        return Ok(handle_prompt_input(app, code, modifiers, event_tx));
    }

    if app.show_detail {
        return Ok(handle_detail_input(app, code));
    }

    if app.edit.is_some() {
        return Ok(handle_edit_input(app, code, modifiers));
    }

    let action = app
        .keybindings
        .action_for_key(code, modifiers, app.tab.context());
    Ok(match action {
        Some(action) => dispatch(app, action, event_tx),
        None => Action::Continue,
    })
}

fn handle_help_input(app: &mut App, code: KeyCode) -> Action {
    match code {
        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('?') => {
            app.show_help = false;
            app.help_scroll_offset = 0;
        }
        KeyCode::Char('j') | KeyCode::Down => {
            app.help_scroll_offset = app.help_scroll_offset.saturating_add(1);
        }
        KeyCode::Char('k') | KeyCode::Up => {
            app.help_scroll_offset = app.help_scroll_offset.saturating_sub(1);
        }
        _ => {}
    }
    Action::Continue
}

/// Masked key entry. Enter saves, Esc cancels, Ctrl+C quits.
fn handle_prompt_input(
    app: &mut App,
    code: KeyCode,
    modifiers: KeyModifiers,
    event_tx: &mpsc::Sender<AppEvent>,
) -> Action {
    if modifiers.contains(KeyModifiers::CONTROL) {
        return match code {
            KeyCode::Char('c') => Action::Quit,
            _ => Action::Continue,
        };
    }
    match code {
        KeyCode::Enter => {
            if let Some(key) = app.take_api_key_input() {
                spawn_save_api_key(app, key.clone(), event_tx);
                app.session.set_api_key(key);
                app.set_status("API key set");
            }
        }
        KeyCode::Esc => {
            app.api_key_prompt = None;
            if !app.session.has_api_key() {
                app.set_status("No API key set. Press K to enter one.");
            }
        }
        KeyCode::Backspace => {
            if let Some(buffer) = app.api_key_prompt.as_mut() {
                buffer.pop();
            }
        }
        KeyCode::Char(c) if !c.is_control() => {
            if let Some(buffer) = app.api_key_prompt.as_mut() {
                if buffer.len() < MAX_INPUT_LENGTH {
                    buffer.push(c);
                }
            }
        }
        _ => {}
    }
    Action::Continue
}

fn handle_detail_input(app: &mut App, code: KeyCode) -> Action {
    match code {
        KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q') => {
            app.show_detail = false;
            app.detail_scroll = 0;
        }
        KeyCode::Char('j') | KeyCode::Down => {
            app.detail_scroll = app.detail_scroll.saturating_add(1);
        }
        KeyCode::Char('k') | KeyCode::Up => {
            app.detail_scroll = app.detail_scroll.saturating_sub(1);
        }
        _ => {}
    }
    Action::Continue
}

fn handle_edit_input(app: &mut App, code: KeyCode, modifiers: KeyModifiers) -> Action {
    match app
        .keybindings
        .action_for_key(code, modifiers, KbContext::Editing)
    {
        Some(KbAction::CommitEdit) => {
            app.commit_edit();
            return Action::Continue;
        }
        Some(KbAction::CancelEdit) => {
            app.cancel_edit();
            return Action::Continue;
        }
        _ => {}
    }

    if modifiers.contains(KeyModifiers::CONTROL) {
        return Action::Continue;
    }
    let Some(edit) = app.edit.as_mut() else {
        return Action::Continue;
    };
    match code {
        KeyCode::Backspace => {
            edit.buffer.pop();
        }
        KeyCode::Char(c) if !c.is_control() && edit.buffer.len() < MAX_INPUT_LENGTH => {
            edit.buffer.push(c);
        }
        _ => {}
    }
    Action::Continue
}

fn dispatch(app: &mut App, action: KbAction, event_tx: &mpsc::Sender<AppEvent>) -> Action {
    match action {
        KbAction::Quit => return Action::Quit,
        KbAction::ShowHelp => app.show_help = true,
        KbAction::Back => {
            if app.banner.take().is_none() {
                app.status_message = None;
            }
        }
        KbAction::NextField => app.focus_next(),
        KbAction::PrevField => app.focus_prev(),
        KbAction::NavDown => nav(app, true),
        KbAction::NavUp => nav(app, false),
        KbAction::Select => select(app, event_tx),
        KbAction::ValueNext => change_value(app, true, event_tx),
        KbAction::ValuePrev => change_value(app, false, event_tx),
        KbAction::TabSources => app.switch_tab(Tab::Sources),
        KbAction::TabResults => app.switch_tab(Tab::Results),
        KbAction::TabArticle => app.switch_tab(Tab::Article),
        KbAction::TabAnalytics => app.switch_tab(Tab::Analytics),
        KbAction::LoadSources => {
            if app.is_in_flight(crate::controller::Flow::Sources) {
                app.set_status("Sources already loading");
            } else {
                spawn_sources_load(app, event_tx);
            }
        }
        KbAction::Scrape => spawn_scrape(app, event_tx),
        KbAction::Generate => spawn_generate(app, event_tx),
        KbAction::Download => spawn_download(app, event_tx),
        KbAction::RemoveUrl => app.remove_selected_url(),
        KbAction::ClearUrls => app.clear_urls(),
        KbAction::EnterApiKey => app.open_api_key_prompt(),
        KbAction::ToggleHtml => app.toggle_html(),
        KbAction::ScrollDown => scroll(app, 1),
        KbAction::ScrollUp => scroll(app, -1),
        KbAction::PageDown => {
            let page = app.page_size();
            scroll(app, page);
        }
        KbAction::PageUp => {
            let page = app.page_size();
            scroll(app, -page);
        }
        KbAction::CycleTheme => app.cycle_theme(),
        // Only reachable from the Editing context.
        KbAction::CommitEdit | KbAction::CancelEdit => {}
    }
    Action::Continue
}

/// Up/Down: moves the list cursor where the tab has a list, otherwise the
/// field focus.
fn nav(app: &mut App, down: bool) {
    match (app.tab, app.focused_field()) {
        (Tab::Sources, Some(Field::UrlList)) => {
            if down {
                app.select_url_down()
            } else {
                app.select_url_up()
            }
        }
        (Tab::Results, _) => {
            if down {
                app.select_result_down()
            } else {
                app.select_result_up()
            }
        }
        (Tab::Analytics, _) => scroll(app, if down { 1 } else { -1 }),
        _ => {
            if down {
                app.focus_next()
            } else {
                app.focus_prev()
            }
        }
    }
}

fn scroll(app: &mut App, delta: isize) {
    match app.tab {
        Tab::Article => app.scroll_article(delta),
        Tab::Analytics => {
            app.analytics_scroll = app.analytics_scroll.saturating_add_signed(delta);
        }
        Tab::Sources | Tab::Results => {}
    }
}

fn select(app: &mut App, event_tx: &mpsc::Sender<AppEvent>) {
    if app.tab == Tab::Results {
        if app.selected_scraped().is_some() {
            app.show_detail = true;
            app.detail_scroll = 0;
        }
        return;
    }
    if app.begin_edit() {
        return;
    }
    match app.focused_field() {
        Some(Field::UrlList) | None => {}
        Some(_) => change_value(app, true, event_tx),
    }
}

fn change_value(app: &mut App, forward: bool, event_tx: &mpsc::Sender<AppEvent>) {
    match app.focused_field() {
        Some(Field::Topic) => {
            if app.cycle_topic(forward) {
                spawn_sources_load(app, event_tx);
            }
        }
        Some(Field::Template) => {
            if app.cycle_template(forward) {
                spawn_template_defaults(app, event_tx);
            }
        }
        Some(Field::Workers) => app.step_workers(forward),
        Some(Field::MaxLength) => app.step_max_length(forward),
        Some(Field::IncludeImages) => {
            app.generate_form.include_images = !app.generate_form.include_images;
        }
        Some(Field::Format) => {
            app.download_format = if forward {
                app.download_format.next()
            } else {
                app.download_format.prev()
            };
        }
        _ => {}
    }
}
