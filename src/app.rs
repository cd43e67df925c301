use crate::api::{ApiClient, ApiError, GenerateResponse, ScrapeResponse, ScrapedArticle, TemplateDefaults};
use crate::config::Config;
use crate::controller::flows::{MAX_ARTICLE_LENGTH, MAX_WORKERS, MIN_ARTICLE_LENGTH, MIN_WORKERS};
use crate::controller::{DownloadFormat, Flow, FlowError, GenerateForm, ScrapeForm, Session};
use crate::keybindings::{Context, KeybindingRegistry};
use crate::storage::Database;
use crate::theme::{StyleMap, ThemeVariant};
use ratatui::style::Style;
use ratatui::text::Line;
use secrecy::SecretString;
use std::borrow::Cow;
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::time::Duration;
use tokio::time::Instant;

/// Maximum scroll offset for scrollable panes (ratatui u16 limit).
pub const MAX_SCROLL: usize = u16::MAX as usize;

/// Transient status text stays this long.
const STATUS_TTL: Duration = Duration::from_secs(3);

/// Success banners dismiss themselves after this long.
const SUCCESS_TTL: Duration = Duration::from_secs(5);

/// Step for the article length field.
const LENGTH_STEP: u32 = 100;

/// Longest text accepted in a single-line input.
pub const MAX_INPUT_LENGTH: usize = 2048;

// ============================================================================
// Tabs and Fields
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Sources,
    Results,
    Article,
    Analytics,
}

impl Tab {
    pub const ALL: [Tab; 4] = [Tab::Sources, Tab::Results, Tab::Article, Tab::Analytics];

    pub fn title(self) -> &'static str {
        match self {
            Tab::Sources => "Sources",
            Tab::Results => "Results",
            Tab::Article => "Article",
            Tab::Analytics => "Analytics",
        }
    }

    pub fn index(self) -> usize {
        match self {
            Tab::Sources => 0,
            Tab::Results => 1,
            Tab::Article => 2,
            Tab::Analytics => 3,
        }
    }

    pub fn context(self) -> Context {
        match self {
            Tab::Sources => Context::Sources,
            Tab::Results => Context::Results,
            Tab::Article => Context::Article,
            Tab::Analytics => Context::Analytics,
        }
    }

    /// Focusable form fields, in Tab order.
    pub fn fields(self) -> &'static [Field] {
        match self {
            Tab::Sources => &[
                Field::Topic,
                Field::NewUrl,
                Field::UrlList,
                Field::SearchKeyword,
                Field::Workers,
            ],
            Tab::Article => &[
                Field::Template,
                Field::GenTopic,
                Field::Audience,
                Field::Tone,
                Field::MaxLength,
                Field::IncludeImages,
                Field::Format,
            ],
            Tab::Results | Tab::Analytics => &[],
        }
    }
}

/// A form control. Text fields are edited in place; the rest cycle values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Topic,
    NewUrl,
    UrlList,
    SearchKeyword,
    Workers,
    Template,
    GenTopic,
    Audience,
    Tone,
    MaxLength,
    IncludeImages,
    Format,
}

impl Field {
    pub fn label(self) -> &'static str {
        match self {
            Field::Topic => "Topic",
            Field::NewUrl => "Add URL",
            Field::UrlList => "Source URLs",
            Field::SearchKeyword => "Search keyword",
            Field::Workers => "Workers",
            Field::Template => "Template",
            Field::GenTopic => "Topic",
            Field::Audience => "Audience",
            Field::Tone => "Tone",
            Field::MaxLength => "Max length",
            Field::IncludeImages => "Include images",
            Field::Format => "Download as",
        }
    }

    pub fn is_text(self) -> bool {
        matches!(
            self,
            Field::NewUrl | Field::SearchKeyword | Field::GenTopic | Field::Audience | Field::Tone
        )
    }
}

/// In-progress edit of a text field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextEdit {
    pub field: Field,
    pub buffer: String,
}

// ============================================================================
// Banner
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BannerKind {
    Error,
    Success,
}

/// Prominent one-line notice above the status bar. Errors stay until
/// dismissed or replaced; successes expire.
#[derive(Debug, Clone)]
pub struct Banner {
    pub kind: BannerKind,
    pub text: String,
    shown_at: Instant,
}

// ============================================================================
// Events
// ============================================================================

/// Completion events sent by background tasks. Each flow task sends exactly
/// one.
#[derive(Debug)]
pub enum AppEvent {
    SourcesLoaded {
        topic: String,
        result: Result<Vec<String>, ApiError>,
    },
    ScrapeFinished(Result<ScrapeResponse, FlowError>),
    TemplateDefaultsLoaded {
        template: String,
        result: Result<TemplateDefaults, ApiError>,
    },
    GenerateFinished {
        template: String,
        result: Result<GenerateResponse, FlowError>,
    },
    DownloadFinished {
        format: DownloadFormat,
        result: Result<PathBuf, FlowError>,
    },
    ApiKeySaved,
    ApiKeySaveFailed(String),
    /// A flow task panicked. The flow is released so it can run again.
    TaskPanicked {
        flow: Flow,
        error: String,
    },
}

// ============================================================================
// App
// ============================================================================

pub struct App {
    pub db: Database,
    pub api: ApiClient,
    pub session: Session,

    // Configuration-derived
    pub topics: Vec<String>,
    pub templates: Vec<String>,
    pub download_dir: PathBuf,
    pub theme_variant: ThemeVariant,
    pub theme: StyleMap,
    pub keybindings: KeybindingRegistry,

    // Forms
    pub scrape_form: ScrapeForm,
    pub generate_form: GenerateForm,
    pub download_format: DownloadFormat,

    // Navigation
    pub tab: Tab,
    pub field_index: usize,
    pub edit: Option<TextEdit>,
    pub selected_url: usize,
    pub selected_result: usize,
    pub show_detail: bool,
    pub detail_scroll: usize,
    pub article_scroll: usize,
    pub analytics_scroll: usize,
    pub show_html: bool,

    /// Rendered markdown for the current article and the theme it was
    /// styled with. Cleared whenever either changes.
    pub preview_cache: Option<(ThemeVariant, Vec<Line<'static>>)>,
    /// Lines in the last rendered preview and the height of its pane.
    pub preview_metrics: (usize, usize),

    // Overlays
    pub api_key_prompt: Option<String>,
    pub show_help: bool,
    pub help_scroll_offset: usize,

    // Feedback
    pub in_flight: BTreeSet<Flow>,
    pub banner: Option<Banner>,
    pub status_message: Option<(Cow<'static, str>, Instant)>,
    pub spinner_frame: usize,
    pub needs_redraw: bool,
}

impl App {
    pub fn new(
        db: Database,
        api: ApiClient,
        config: &Config,
        api_key: Option<SecretString>,
    ) -> Self {
        let theme_variant = ThemeVariant::from_str_name(&config.theme).unwrap_or_else(|| {
            tracing::warn!(theme = %config.theme, "Unknown theme, using dark");
            ThemeVariant::Dark
        });

        let mut keybindings = KeybindingRegistry::new();
        let warnings = keybindings.apply_overrides(&config.keybindings);
        for warning in &warnings {
            tracing::warn!("{}", warning);
        }

        let mut scrape_form = ScrapeForm {
            topic: config.topics.first().cloned().unwrap_or_default(),
            ..ScrapeForm::default()
        };
        scrape_form.set_workers(config.default_workers);

        let mut generate_form = GenerateForm {
            template: config.templates.first().cloned().unwrap_or_default(),
            ..GenerateForm::default()
        };
        generate_form.set_max_length(config.default_max_length);

        let mut app = Self {
            db,
            api,
            session: Session::new(api_key),
            topics: config.topics.clone(),
            templates: config.templates.clone(),
            download_dir: config.download_dir(),
            theme_variant,
            theme: StyleMap::from_palette(&theme_variant.palette()),
            keybindings,
            scrape_form,
            generate_form,
            download_format: DownloadFormat::default(),
            tab: Tab::Sources,
            field_index: 0,
            edit: None,
            selected_url: 0,
            selected_result: 0,
            show_detail: false,
            detail_scroll: 0,
            article_scroll: 0,
            analytics_scroll: 0,
            show_html: false,
            preview_cache: None,
            preview_metrics: (0, 0),
            api_key_prompt: None,
            show_help: false,
            help_scroll_offset: 0,
            in_flight: BTreeSet::new(),
            banner: None,
            status_message: None,
            spinner_frame: 0,
            needs_redraw: true,
        };

        if let Some(first) = warnings.into_iter().next() {
            app.set_status(first);
        }
        app
    }

    pub fn style(&self, role: &str) -> Style {
        self.theme.resolve(role)
    }

    pub fn cycle_theme(&mut self) {
        self.theme_variant = self.theme_variant.next();
        self.theme = StyleMap::from_palette(&self.theme_variant.palette());
        self.preview_cache = None;
        self.set_status(format!("Theme: {}", self.theme_variant.name()));
        tracing::debug!(theme = self.theme_variant.name(), "Switched theme");
    }

    // ========================================================================
    // Status and banners
    // ========================================================================

    pub fn set_status(&mut self, msg: impl Into<Cow<'static, str>>) {
        self.status_message = Some((msg.into(), Instant::now()));
    }

    /// Returns true if a message was actually cleared.
    pub fn clear_expired_status(&mut self) -> bool {
        if let Some((_, time)) = &self.status_message {
            if time.elapsed() >= STATUS_TTL {
                self.status_message = None;
                return true;
            }
        }
        false
    }

    pub fn show_error(&mut self, text: impl Into<String>) {
        self.banner = Some(Banner {
            kind: BannerKind::Error,
            text: text.into(),
            shown_at: Instant::now(),
        });
    }

    pub fn show_success(&mut self, text: impl Into<String>) {
        self.banner = Some(Banner {
            kind: BannerKind::Success,
            text: text.into(),
            shown_at: Instant::now(),
        });
    }

    /// Drops a success banner once it has been shown long enough.
    pub fn clear_expired_banner(&mut self) -> bool {
        match &self.banner {
            Some(banner)
                if banner.kind == BannerKind::Success && banner.shown_at.elapsed() >= SUCCESS_TTL =>
            {
                self.banner = None;
                true
            }
            _ => false,
        }
    }

    // ========================================================================
    // Flows in flight
    // ========================================================================

    pub fn is_in_flight(&self, flow: Flow) -> bool {
        self.in_flight.contains(&flow)
    }

    /// Marks `flow` busy. False if it already was.
    pub fn begin_flow(&mut self, flow: Flow) -> bool {
        let started = self.in_flight.insert(flow);
        if started {
            tracing::debug!(flow = flow.label(), "Flow started");
        }
        started
    }

    pub fn finish_flow(&mut self, flow: Flow) {
        self.in_flight.remove(&flow);
    }

    /// Busy text for every flow in flight, `None` when idle.
    pub fn busy_message(&self) -> Option<String> {
        if self.in_flight.is_empty() {
            return None;
        }
        let parts: Vec<&str> = self.in_flight.iter().map(|f| f.busy_message()).collect();
        Some(parts.join("  "))
    }

    // ========================================================================
    // Navigation
    // ========================================================================

    pub fn switch_tab(&mut self, tab: Tab) {
        if self.tab != tab {
            self.tab = tab;
            self.field_index = 0;
            self.show_detail = false;
        }
        // Layout depends on the pane size, which only the next draw knows.
        self.needs_redraw = true;
    }

    pub fn focused_field(&self) -> Option<Field> {
        self.tab.fields().get(self.field_index).copied()
    }

    pub fn focus_next(&mut self) {
        let count = self.tab.fields().len();
        if count > 0 {
            self.field_index = (self.field_index + 1) % count;
        }
    }

    pub fn focus_prev(&mut self) {
        let count = self.tab.fields().len();
        if count > 0 {
            self.field_index = (self.field_index + count - 1) % count;
        }
    }

    pub fn select_url_down(&mut self) {
        if self.selected_url + 1 < self.session.urls.len() {
            self.selected_url += 1;
        }
    }

    pub fn select_url_up(&mut self) {
        self.selected_url = self.selected_url.saturating_sub(1);
    }

    /// Keeps the URL and result selections inside their lists.
    pub fn clamp_selections(&mut self) {
        self.selected_url = self
            .selected_url
            .min(self.session.urls.len().saturating_sub(1));
        self.selected_result = self
            .selected_result
            .min(self.session.scraped_count().saturating_sub(1));
    }

    pub fn select_result_down(&mut self) {
        if self.selected_result + 1 < self.session.scraped_count() {
            self.selected_result += 1;
        }
    }

    pub fn select_result_up(&mut self) {
        self.selected_result = self.selected_result.saturating_sub(1);
    }

    /// The scraped article under the results cursor. Failed records are not
    /// listed, so the index runs over successful ones only.
    pub fn selected_scraped(&self) -> Option<&ScrapedArticle> {
        self.session.scraped_articles().nth(self.selected_result)
    }

    pub fn scroll_article(&mut self, delta: isize) {
        self.article_scroll = self.article_scroll.saturating_add_signed(delta).min(MAX_SCROLL);
        self.clamp_article_scroll();
    }

    /// Half a pane, at least one line.
    pub fn page_size(&self) -> isize {
        (self.preview_metrics.1 / 2).max(1) as isize
    }

    pub fn clamp_article_scroll(&mut self) {
        let (total, visible) = self.preview_metrics;
        let max = total.saturating_sub(visible).min(MAX_SCROLL);
        self.article_scroll = self.article_scroll.min(max);
    }

    pub fn toggle_html(&mut self) {
        let has_html = self
            .session
            .current_article
            .as_ref()
            .is_some_and(|c| c.html_content.is_some());
        if has_html {
            self.show_html = !self.show_html;
            self.article_scroll = 0;
            self.preview_metrics = (0, self.preview_metrics.1);
        } else {
            self.set_status("No HTML rendition for this article");
        }
    }

    // ========================================================================
    // Form values
    // ========================================================================

    /// Display value of a field.
    pub fn field_value(&self, field: Field) -> Cow<'_, str> {
        match field {
            Field::Topic => Cow::Borrowed(self.scrape_form.topic.as_str()),
            Field::NewUrl => Cow::Borrowed(""),
            Field::UrlList => Cow::Owned(format!("{} URL(s)", self.session.urls.len())),
            Field::SearchKeyword => Cow::Borrowed(self.scrape_form.search_keyword.as_str()),
            Field::Workers => Cow::Owned(self.scrape_form.max_workers.to_string()),
            Field::Template => Cow::Borrowed(self.generate_form.template.as_str()),
            Field::GenTopic => Cow::Borrowed(self.generate_form.topic.as_str()),
            Field::Audience => Cow::Borrowed(self.generate_form.audience.as_str()),
            Field::Tone => Cow::Borrowed(self.generate_form.tone.as_str()),
            Field::MaxLength => Cow::Owned(format!("{} words", self.generate_form.max_length)),
            Field::IncludeImages => Cow::Borrowed(if self.generate_form.include_images {
                "yes"
            } else {
                "no"
            }),
            Field::Format => Cow::Borrowed(self.download_format.label()),
        }
    }

    /// Moves to the neighbouring topic. Returns true if it changed.
    pub fn cycle_topic(&mut self, forward: bool) -> bool {
        match cycle_in(&self.topics, &self.scrape_form.topic, forward) {
            Some(next) => {
                self.scrape_form.topic = next;
                true
            }
            None => false,
        }
    }

    /// Moves to the neighbouring template. Returns true if it changed.
    pub fn cycle_template(&mut self, forward: bool) -> bool {
        match cycle_in(&self.templates, &self.generate_form.template, forward) {
            Some(next) => {
                self.generate_form.template = next;
                true
            }
            None => false,
        }
    }

    pub fn step_workers(&mut self, forward: bool) {
        let workers = self.scrape_form.max_workers;
        let next = if forward {
            workers.saturating_add(1).min(MAX_WORKERS)
        } else {
            workers.saturating_sub(1).max(MIN_WORKERS)
        };
        self.scrape_form.set_workers(next);
    }

    pub fn step_max_length(&mut self, forward: bool) {
        let length = self.generate_form.max_length;
        let next = if forward {
            length.saturating_add(LENGTH_STEP).min(MAX_ARTICLE_LENGTH)
        } else {
            length.saturating_sub(LENGTH_STEP).max(MIN_ARTICLE_LENGTH)
        };
        self.generate_form.set_max_length(next);
    }

    /// Starts editing the focused field if it takes text.
    pub fn begin_edit(&mut self) -> bool {
        let Some(field) = self.focused_field().filter(|f| f.is_text()) else {
            return false;
        };
        let buffer = match field {
            Field::NewUrl => String::new(),
            other => self.field_value(other).into_owned(),
        };
        self.edit = Some(TextEdit { field, buffer });
        true
    }

    /// Writes the edit buffer back into its field.
    pub fn commit_edit(&mut self) {
        let Some(TextEdit { field, buffer }) = self.edit.take() else {
            return;
        };
        match field {
            Field::NewUrl => {
                if self.session.urls.add(&buffer) {
                    self.selected_url = self.session.urls.len().saturating_sub(1);
                    tracing::debug!(urls = self.session.urls.len(), "Added source URL");
                } else if !buffer.trim().is_empty() {
                    self.set_status("URL already in the list");
                }
            }
            Field::SearchKeyword => self.scrape_form.search_keyword = buffer,
            Field::GenTopic => self.generate_form.topic = buffer,
            Field::Audience => self.generate_form.audience = buffer,
            Field::Tone => self.generate_form.tone = buffer,
            _ => {}
        }
    }

    pub fn cancel_edit(&mut self) {
        self.edit = None;
    }

    pub fn remove_selected_url(&mut self) {
        if let Some(url) = self.session.urls.remove_at(self.selected_url) {
            tracing::debug!(url = %url, "Removed source URL");
            self.clamp_selections();
        }
    }

    pub fn clear_urls(&mut self) {
        self.session.urls.clear();
        self.selected_url = 0;
        self.set_status("URL list cleared");
    }

    // ========================================================================
    // API key prompt
    // ========================================================================

    pub fn open_api_key_prompt(&mut self) {
        self.edit = None;
        self.api_key_prompt = Some(String::new());
    }

    /// Takes the entered key out of the prompt. `None` leaves the prompt
    /// open because the input was blank.
    pub fn take_api_key_input(&mut self) -> Option<SecretString> {
        let input = self.api_key_prompt.as_deref()?.trim();
        if input.is_empty() {
            self.set_status("API key cannot be empty");
            return None;
        }
        let key = SecretString::from(input.to_owned());
        self.api_key_prompt = None;
        Some(key)
    }
}

/// Neighbour of `current` in `options`, wrapping. An unknown current value
/// moves to the first option.
fn cycle_in(options: &[String], current: &str, forward: bool) -> Option<String> {
    if options.is_empty() {
        return None;
    }
    let len = options.len();
    let next = match options.iter().position(|o| o == current) {
        Some(i) if forward => (i + 1) % len,
        Some(i) => (i + len - 1) % len,
        None => 0,
    };
    let value = &options[next];
    (value != current).then(|| value.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    async fn test_app() -> App {
        let db = Database::open(":memory:").await.unwrap();
        let api = ApiClient::new("http://127.0.0.1:5000").unwrap();
        App::new(db, api, &Config::default(), None)
    }

    #[tokio::test]
    async fn test_initial_state_from_config() {
        let app = test_app().await;
        assert_eq!(app.tab, Tab::Sources);
        assert_eq!(app.scrape_form.topic, "all");
        assert_eq!(app.scrape_form.max_workers, 5);
        assert_eq!(app.generate_form.template, "telecom_news");
        assert_eq!(app.generate_form.max_length, 800);
        assert!(app.generate_form.include_images);
        assert_eq!(app.focused_field(), Some(Field::Topic));
    }

    #[tokio::test]
    async fn test_config_bounds_are_clamped() {
        let db = Database::open(":memory:").await.unwrap();
        let api = ApiClient::new("http://127.0.0.1:5000").unwrap();
        let config = Config {
            default_workers: 40,
            default_max_length: 20,
            ..Config::default()
        };
        let app = App::new(db, api, &config, None);
        assert_eq!(app.scrape_form.max_workers, MAX_WORKERS);
        assert_eq!(app.generate_form.max_length, MIN_ARTICLE_LENGTH);
    }

    #[tokio::test]
    async fn test_focus_wraps_within_tab() {
        let mut app = test_app().await;
        app.focus_prev();
        assert_eq!(app.focused_field(), Some(Field::Workers));
        app.focus_next();
        assert_eq!(app.focused_field(), Some(Field::Topic));

        app.switch_tab(Tab::Results);
        app.focus_next();
        assert_eq!(app.focused_field(), None);
    }

    #[tokio::test]
    async fn test_flow_deduplication() {
        let mut app = test_app().await;
        assert!(app.begin_flow(Flow::Scrape));
        assert!(!app.begin_flow(Flow::Scrape));
        assert!(app.begin_flow(Flow::Generate));
        assert_eq!(
            app.busy_message().as_deref(),
            Some("Scraping news sources...  Generating article...")
        );
        app.finish_flow(Flow::Scrape);
        app.finish_flow(Flow::Generate);
        assert_eq!(app.busy_message(), None);
    }

    #[tokio::test]
    async fn test_edit_new_url_adds_to_set() {
        let mut app = test_app().await;
        app.field_index = 1;
        assert!(app.begin_edit());
        app.edit.as_mut().unwrap().buffer.push_str("  http://a  ");
        app.commit_edit();

        app.begin_edit();
        app.edit.as_mut().unwrap().buffer.push_str("http://a");
        app.commit_edit();

        assert_eq!(app.session.urls.as_slice(), ["http://a".to_string()]);
        assert!(app.status_message.is_some());
    }

    #[tokio::test]
    async fn test_cancel_edit_keeps_value() {
        let mut app = test_app().await;
        app.switch_tab(Tab::Article);
        app.field_index = 3;
        app.generate_form.tone = "formal".into();
        assert!(app.begin_edit());
        app.edit.as_mut().unwrap().buffer = "casual".into();
        app.cancel_edit();
        assert_eq!(app.generate_form.tone, "formal");
    }

    #[tokio::test]
    async fn test_value_stepping_is_bounded() {
        let mut app = test_app().await;
        for _ in 0..20 {
            app.step_workers(true);
        }
        assert_eq!(app.scrape_form.max_workers, 10);
        for _ in 0..20 {
            app.step_workers(false);
        }
        assert_eq!(app.scrape_form.max_workers, 1);

        app.generate_form.max_length = 4950;
        app.step_max_length(true);
        assert_eq!(app.generate_form.max_length, 5000);
    }

    #[tokio::test]
    async fn test_cycle_topic_wraps() {
        let mut app = test_app().await;
        assert!(app.cycle_topic(false));
        assert_eq!(app.scrape_form.topic, "general");
        assert!(app.cycle_topic(true));
        assert_eq!(app.scrape_form.topic, "all");
    }

    #[test]
    fn test_cycle_in_single_option() {
        let options = vec!["only".to_string()];
        assert_eq!(cycle_in(&options, "only", true), None);
        assert_eq!(cycle_in(&options, "missing", true), Some("only".into()));
        assert_eq!(cycle_in(&[], "x", true), None);
    }

    #[tokio::test]
    async fn test_blank_api_key_keeps_prompt_open() {
        let mut app = test_app().await;
        app.open_api_key_prompt();
        app.api_key_prompt = Some("   ".into());
        assert!(app.take_api_key_input().is_none());
        assert!(app.api_key_prompt.is_some());

        app.api_key_prompt = Some(" sk-1 ".into());
        assert!(app.take_api_key_input().is_some());
        assert!(app.api_key_prompt.is_none());
    }

    #[tokio::test]
    async fn test_success_banner_expires() {
        let mut app = test_app().await;
        tokio::time::pause();
        app.show_success("done");
        assert!(!app.clear_expired_banner());
        tokio::time::advance(SUCCESS_TTL).await;
        assert!(app.clear_expired_banner());

        app.show_error("broken");
        tokio::time::advance(SUCCESS_TTL * 2).await;
        assert!(!app.clear_expired_banner());
        assert!(app.banner.is_some());
    }
}
