//! Spawning flow tasks.
//!
//! Every flow is started the same way: refuse if it is already in flight,
//! prepare an owned job from the session (preconditions fail here, before
//! any request), mark the flow busy and run the job on a tokio task that
//! reports back with exactly one `AppEvent`.

use crate::app::{App, AppEvent};
use crate::controller::{Flow, FlowError};
use chrono::Utc;
use futures::FutureExt;
use secrecy::SecretString;
use std::panic::AssertUnwindSafe;
use tokio::sync::mpsc;

/// Wraps a future to catch panics and convert them to errors.
///
/// Without this a panicking task would vanish and leave its flow marked busy
/// forever.
pub(super) async fn catch_task_panic<F, T>(future: F) -> Result<T, String>
where
    F: std::future::Future<Output = T>,
{
    AssertUnwindSafe(future)
        .catch_unwind()
        .await
        .map_err(|panic| {
            if let Some(s) = panic.downcast_ref::<&'static str>() {
                s.to_string()
            } else if let Some(s) = panic.downcast_ref::<String>() {
                s.clone()
            } else {
                format!("Unknown panic: {:?}", (*panic).type_id())
            }
        })
}

async fn send(tx: &mpsc::Sender<AppEvent>, event: AppEvent) {
    if let Err(e) = tx.send(event).await {
        tracing::warn!(error = %e, "Failed to send flow result (receiver dropped)");
    }
}

/// Loads run once the loop is up: sources for the initial topic, defaults
/// for the initial template, and the key prompt when no key was restored.
pub(super) fn startup_loads(app: &mut App, event_tx: &mpsc::Sender<AppEvent>) {
    spawn_sources_load(app, event_tx);
    spawn_template_defaults(app, event_tx);
    if !app.session.has_api_key() {
        app.open_api_key_prompt();
    }
}

/// Reports a user-triggered flow that is already running.
fn refuse_duplicate(app: &mut App, flow: Flow) -> bool {
    if app.is_in_flight(flow) {
        app.set_status(format!("{} already in progress", flow.label()));
        return true;
    }
    false
}

/// Shows a precondition failure. A missing key also opens the prompt.
fn report_precondition(app: &mut App, flow: Flow, error: FlowError) {
    tracing::debug!(flow = flow.label(), error = %error, "Flow precondition failed");
    if matches!(error, FlowError::MissingApiKey) {
        app.open_api_key_prompt();
    }
    app.set_status(error.to_string());
}

/// Fetches the source list for the selected topic.
///
/// Quiet when a load is already running: the completion handler notices a
/// stale topic and loads again.
pub(super) fn spawn_sources_load(app: &mut App, event_tx: &mpsc::Sender<AppEvent>) {
    if !app.begin_flow(Flow::Sources) {
        tracing::debug!("Sources load already in flight");
        return;
    }
    let topic = app.scrape_form.topic.clone();
    let api = app.api.clone();
    let tx = event_tx.clone();

    tokio::spawn(async move {
        let event = match catch_task_panic(api.sources_for_topic(&topic)).await {
            Ok(result) => AppEvent::SourcesLoaded { topic, result },
            Err(error) => AppEvent::TaskPanicked {
                flow: Flow::Sources,
                error,
            },
        };
        send(&tx, event).await;
    });
}

/// Fetches defaults for the selected template. Same staleness handling as
/// [`spawn_sources_load`].
pub(super) fn spawn_template_defaults(app: &mut App, event_tx: &mpsc::Sender<AppEvent>) {
    if !app.begin_flow(Flow::TemplateDefaults) {
        tracing::debug!("Template defaults load already in flight");
        return;
    }
    let template = app.generate_form.template.clone();
    let api = app.api.clone();
    let tx = event_tx.clone();

    tokio::spawn(async move {
        let event = match catch_task_panic(api.template_defaults(&template)).await {
            Ok(result) => AppEvent::TemplateDefaultsLoaded { template, result },
            Err(error) => AppEvent::TaskPanicked {
                flow: Flow::TemplateDefaults,
                error,
            },
        };
        send(&tx, event).await;
    });
}

pub(super) fn spawn_scrape(app: &mut App, event_tx: &mpsc::Sender<AppEvent>) {
    if refuse_duplicate(app, Flow::Scrape) {
        return;
    }
    let job = match app.session.prepare_scrape(&app.scrape_form) {
        Ok(job) => job,
        Err(e) => return report_precondition(app, Flow::Scrape, e),
    };
    app.begin_flow(Flow::Scrape);
    app.banner = None;
    let api = app.api.clone();
    let tx = event_tx.clone();

    tokio::spawn(async move {
        let event = match catch_task_panic(job.run(&api)).await {
            Ok(result) => AppEvent::ScrapeFinished(result),
            Err(error) => AppEvent::TaskPanicked {
                flow: Flow::Scrape,
                error,
            },
        };
        send(&tx, event).await;
    });
}

pub(super) fn spawn_generate(app: &mut App, event_tx: &mpsc::Sender<AppEvent>) {
    if refuse_duplicate(app, Flow::Generate) {
        return;
    }
    let job = match app.session.prepare_generate(&app.generate_form) {
        Ok(job) => job,
        Err(e) => return report_precondition(app, Flow::Generate, e),
    };
    app.begin_flow(Flow::Generate);
    app.banner = None;
    let template = job.template().to_owned();
    let api = app.api.clone();
    let tx = event_tx.clone();

    tokio::spawn(async move {
        let event = match catch_task_panic(job.run(&api)).await {
            Ok(result) => AppEvent::GenerateFinished { template, result },
            Err(error) => AppEvent::TaskPanicked {
                flow: Flow::Generate,
                error,
            },
        };
        send(&tx, event).await;
    });
}

pub(super) fn spawn_download(app: &mut App, event_tx: &mpsc::Sender<AppEvent>) {
    if refuse_duplicate(app, Flow::Download) {
        return;
    }
    let job = match app.session.prepare_download(app.download_format, Utc::now()) {
        Ok(job) => job,
        Err(e) => return report_precondition(app, Flow::Download, e),
    };
    app.begin_flow(Flow::Download);
    app.banner = None;
    let format = job.format();
    let dir = app.download_dir.clone();
    let api = app.api.clone();
    let tx = event_tx.clone();

    tokio::spawn(async move {
        let event = match catch_task_panic(job.run(&api, &dir)).await {
            Ok(result) => AppEvent::DownloadFinished { format, result },
            Err(error) => AppEvent::TaskPanicked {
                flow: Flow::Download,
                error,
            },
        };
        send(&tx, event).await;
    });
}

/// Persists a newly entered key in the background.
pub(super) fn spawn_save_api_key(
    app: &App,
    key: SecretString,
    event_tx: &mpsc::Sender<AppEvent>,
) {
    let db = app.db.clone();
    let tx = event_tx.clone();

    tokio::spawn(async move {
        let event = match catch_task_panic(db.save_api_key(&key)).await {
            Ok(Ok(())) => AppEvent::ApiKeySaved,
            Ok(Err(e)) => AppEvent::ApiKeySaveFailed(e.to_string()),
            Err(panic) => AppEvent::ApiKeySaveFailed(panic),
        };
        send(&tx, event).await;
    });
}
