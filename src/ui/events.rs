//! Folding flow results back into the app.
//!
//! Only the success branch touches the session; failures report and leave
//! state as it was.

use crate::api::ApiError;
use crate::app::{App, AppEvent, Tab};
use crate::controller::{Flow, FlowError};
use chrono::Utc;
use tokio::sync::mpsc;

use super::helpers::{spawn_sources_load, spawn_template_defaults};

pub(super) const MALFORMED_DOWNLOAD: &str = "Error preparing download. Please try again.";

pub(super) fn handle_app_event(
    app: &mut App,
    event: AppEvent,
    event_tx: &mpsc::Sender<AppEvent>,
) {
    match event {
        AppEvent::SourcesLoaded { topic, result } => {
            app.finish_flow(Flow::Sources);
            if topic != app.scrape_form.topic {
                tracing::debug!(stale = %topic, current = %app.scrape_form.topic, "Discarding sources for previous topic");
                spawn_sources_load(app, event_tx);
                return;
            }
            match result {
                Ok(urls) => {
                    app.session.apply_sources(urls);
                    app.selected_url = 0;
                    app.clamp_selections();
                    app.set_status(format!(
                        "Loaded {} source(s) for {}",
                        app.session.urls.len(),
                        topic
                    ));
                }
                Err(e) => {
                    log_api_failure(Flow::Sources, &e);
                    app.show_error(format!("Failed to load sources: {}", e));
                }
            }
        }
        AppEvent::TemplateDefaultsLoaded { template, result } => {
            app.finish_flow(Flow::TemplateDefaults);
            if template != app.generate_form.template {
                tracing::debug!(stale = %template, "Discarding defaults for previous template");
                spawn_template_defaults(app, event_tx);
                return;
            }
            match result {
                Ok(defaults) => {
                    app.generate_form.apply_defaults(&defaults);
                    app.set_status(format!("Loaded defaults for {}", template));
                }
                Err(e) => {
                    log_api_failure(Flow::TemplateDefaults, &e);
                    app.set_status(format!("Failed to load template defaults: {}", e));
                }
            }
        }
        AppEvent::ScrapeFinished(result) => {
            app.finish_flow(Flow::Scrape);
            match result {
                Ok(response) => {
                    let count = app.session.apply_scrape(response);
                    app.selected_result = 0;
                    app.clamp_selections();
                    app.switch_tab(Tab::Results);
                    app.show_success(format!("Successfully scraped {} articles.", count));
                }
                Err(e) => report_flow_failure(app, Flow::Scrape, e),
            }
        }
        AppEvent::GenerateFinished { template, result } => {
            app.finish_flow(Flow::Generate);
            match result {
                Ok(response) => {
                    app.session.apply_generate(template, response, Utc::now());
                    app.preview_cache = None;
                    app.article_scroll = 0;
                    app.analytics_scroll = 0;
                    app.show_html = false;
                    app.switch_tab(Tab::Article);
                    app.show_success("Article generated successfully!");
                }
                Err(e) => report_flow_failure(app, Flow::Generate, e),
            }
        }
        AppEvent::DownloadFinished { format, result } => {
            app.finish_flow(Flow::Download);
            match result {
                Ok(path) => {
                    tracing::info!(path = %path.display(), format = format.code(), "Download written");
                    app.show_success(format!(
                        "{} file downloaded successfully: {}",
                        format.label(),
                        path.display()
                    ));
                }
                Err(FlowError::Api(ApiError::Malformed(detail))) => {
                    tracing::warn!(detail = %detail, "Malformed download response");
                    app.show_error(MALFORMED_DOWNLOAD);
                }
                Err(e) => report_flow_failure(app, Flow::Download, e),
            }
        }
        AppEvent::ApiKeySaved => {
            tracing::info!("API key saved");
            app.set_status("API key saved");
        }
        AppEvent::ApiKeySaveFailed(error) => {
            // The key stays usable for this run.
            tracing::error!(error = %error, "Failed to save API key");
            app.set_status(format!("API key set but not saved: {}", error));
        }
        AppEvent::TaskPanicked { flow, error } => {
            app.finish_flow(flow);
            tracing::error!(flow = flow.label(), error = %error, "Flow task panicked");
            app.show_error(format!("{} failed unexpectedly: {}", flow.label(), error));
        }
    }
}

fn log_api_failure(flow: Flow, error: &ApiError) {
    match error {
        ApiError::Malformed(detail) => {
            tracing::warn!(flow = flow.label(), detail = %detail, "Malformed response")
        }
        other => tracing::warn!(flow = flow.label(), error = %other, "Request failed"),
    }
}

fn report_flow_failure(app: &mut App, flow: Flow, error: FlowError) {
    if let FlowError::Api(api_error) = &error {
        log_api_failure(flow, api_error);
    } else {
        tracing::warn!(flow = flow.label(), error = %error, "Flow failed");
    }
    app.show_error(error.to_string());
}
