//! Keybinding registry: maps key events to actions, with config overrides.
use crossterm::event::{KeyCode, KeyModifiers};
use std::collections::HashMap;

// ============================================================================
// Action Enum
// ============================================================================

/// All user-facing actions that can be triggered by keybindings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Quit,
    NextField,
    PrevField,
    NavDown,
    NavUp,
    Select,
    Back,
    ValueNext,
    ValuePrev,
    TabSources,
    TabResults,
    TabArticle,
    TabAnalytics,
    LoadSources,
    Scrape,
    Generate,
    Download,
    RemoveUrl,
    ClearUrls,
    EnterApiKey,
    ToggleHtml,
    ScrollDown,
    ScrollUp,
    PageDown,
    PageUp,
    CycleTheme,
    ShowHelp,
    CommitEdit,
    CancelEdit,
}

impl Action {
    /// Description for the help screen.
    pub fn describe(self) -> &'static str {
        match self {
            Self::Quit => "Quit application",
            Self::NextField => "Next field",
            Self::PrevField => "Previous field",
            Self::NavDown => "Move selection down",
            Self::NavUp => "Move selection up",
            Self::Select => "Edit field / add URL / open record",
            Self::Back => "Dismiss banner or overlay",
            Self::ValueNext => "Next value / increase",
            Self::ValuePrev => "Previous value / decrease",
            Self::TabSources => "Sources tab",
            Self::TabResults => "Results tab",
            Self::TabArticle => "Article tab",
            Self::TabAnalytics => "Analytics tab",
            Self::LoadSources => "Load sources for topic",
            Self::Scrape => "Start scraping",
            Self::Generate => "Generate article",
            Self::Download => "Download article",
            Self::RemoveUrl => "Remove selected URL",
            Self::ClearUrls => "Clear all URLs",
            Self::EnterApiKey => "Enter API key",
            Self::ToggleHtml => "Toggle HTML source",
            Self::ScrollDown => "Scroll down one line",
            Self::ScrollUp => "Scroll up one line",
            Self::PageDown => "Page down",
            Self::PageUp => "Page up",
            Self::CycleTheme => "Cycle theme",
            Self::ShowHelp => "Show help",
            Self::CommitEdit => "Confirm input",
            Self::CancelEdit => "Cancel input",
        }
    }
}

// ============================================================================
// Context Enum
// ============================================================================

/// Dispatch context: the active tab, or text entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Context {
    Global,
    Sources,
    Results,
    Article,
    Analytics,
    Editing,
}

impl Context {
    pub fn label(self) -> &'static str {
        match self {
            Self::Global => "Global",
            Self::Sources => "Sources",
            Self::Results => "Results",
            Self::Article => "Article",
            Self::Analytics => "Analytics",
            Self::Editing => "Text input",
        }
    }
}

// ============================================================================
// Key Specification
// ============================================================================

/// A key event: code + modifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeySpec {
    pub code: KeyCode,
    pub modifiers: KeyModifiers,
}

impl KeySpec {
    pub const fn new(code: KeyCode, modifiers: KeyModifiers) -> Self {
        Self { code, modifiers }
    }

    pub const fn plain(code: KeyCode) -> Self {
        Self::new(code, KeyModifiers::NONE)
    }

    pub const fn ch(c: char) -> Self {
        Self::plain(KeyCode::Char(c))
    }

    pub const fn ctrl(c: char) -> Self {
        Self::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    /// Terminals report Shift alongside upper-case letters and BackTab; the
    /// character already carries that information.
    fn normalized(self) -> Self {
        match self.code {
            KeyCode::Char(_) | KeyCode::BackTab => {
                Self::new(self.code, self.modifiers - KeyModifiers::SHIFT)
            }
            _ => self,
        }
    }
}

/// Parse a key string from config.
///
/// Accepts single characters ("q", "/"), named keys ("Enter", "Esc", "Tab",
/// "BackTab", arrows, "PageUp", "PageDown", "Backspace", "Space"),
/// "Ctrl+<char>" and "F1" to "F12".
fn parse_key_string(s: &str) -> Option<KeySpec> {
    let s = s.trim();

    if let Some(rest) = s.strip_prefix("Ctrl+").or_else(|| s.strip_prefix("ctrl+")) {
        let mut chars = rest.trim().chars();
        return match (chars.next(), chars.next()) {
            (Some(c), None) => Some(KeySpec::ctrl(c)),
            _ => None,
        };
    }

    let named = match s.to_lowercase().as_str() {
        "enter" | "return" => Some(KeyCode::Enter),
        "esc" | "escape" => Some(KeyCode::Esc),
        "tab" => Some(KeyCode::Tab),
        "backtab" => Some(KeyCode::BackTab),
        "up" => Some(KeyCode::Up),
        "down" => Some(KeyCode::Down),
        "left" => Some(KeyCode::Left),
        "right" => Some(KeyCode::Right),
        "pageup" => Some(KeyCode::PageUp),
        "pagedown" => Some(KeyCode::PageDown),
        "backspace" => Some(KeyCode::Backspace),
        "space" => Some(KeyCode::Char(' ')),
        _ => None,
    };
    if let Some(code) = named {
        return Some(KeySpec::plain(code));
    }

    if let Some(n) = s
        .strip_prefix(['F', 'f'])
        .and_then(|digits| digits.parse::<u8>().ok())
    {
        return (1..=12).contains(&n).then(|| KeySpec::plain(KeyCode::F(n)));
    }

    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Some(KeySpec::ch(c)),
        _ => None,
    }
}

/// Human-readable key name for the help screen.
fn format_key(key: &KeySpec) -> String {
    let modifier = if key.modifiers.contains(KeyModifiers::CONTROL) {
        "Ctrl+"
    } else {
        ""
    };

    let name = match key.code {
        KeyCode::Char(' ') => "Space".to_string(),
        KeyCode::Char(c) => c.to_string(),
        KeyCode::Enter => "Enter".to_string(),
        KeyCode::Esc => "Esc".to_string(),
        KeyCode::Tab => "Tab".to_string(),
        KeyCode::BackTab => "Shift+Tab".to_string(),
        KeyCode::Up => "Up".to_string(),
        KeyCode::Down => "Down".to_string(),
        KeyCode::Left => "Left".to_string(),
        KeyCode::Right => "Right".to_string(),
        KeyCode::PageUp => "PageUp".to_string(),
        KeyCode::PageDown => "PageDown".to_string(),
        KeyCode::Backspace => "Backspace".to_string(),
        KeyCode::F(n) => format!("F{}", n),
        _ => "?".to_string(),
    };

    format!("{}{}", modifier, name)
}

// ============================================================================
// Keybinding Registry
// ============================================================================

/// Context-aware keybinding table with default bindings and overrides.
///
/// The same key may mean different things per context; lookups fall back to
/// `Global` when the context has no binding of its own.
pub struct KeybindingRegistry {
    lookup: HashMap<(Context, KeySpec), Action>,
    /// Registration order, for the help screen.
    bindings: Vec<(Context, KeySpec, Action)>,
}

impl KeybindingRegistry {
    pub fn new() -> Self {
        let mut registry = Self {
            lookup: HashMap::new(),
            bindings: Vec::new(),
        };
        registry.register_defaults();
        registry
    }

    fn bind(&mut self, context: Context, key: KeySpec, action: Action) {
        self.lookup.insert((context, key), action);
        self.bindings.push((context, key, action));
    }

    fn register_defaults(&mut self) {
        use Context::*;

        let global = [
            (KeySpec::ch('q'), Action::Quit),
            (KeySpec::ctrl('c'), Action::Quit),
            (KeySpec::plain(KeyCode::Tab), Action::NextField),
            (KeySpec::plain(KeyCode::BackTab), Action::PrevField),
            (KeySpec::ch('j'), Action::NavDown),
            (KeySpec::plain(KeyCode::Down), Action::NavDown),
            (KeySpec::ch('k'), Action::NavUp),
            (KeySpec::plain(KeyCode::Up), Action::NavUp),
            (KeySpec::plain(KeyCode::Enter), Action::Select),
            (KeySpec::plain(KeyCode::Esc), Action::Back),
            (KeySpec::plain(KeyCode::Right), Action::ValueNext),
            (KeySpec::plain(KeyCode::Left), Action::ValuePrev),
            (KeySpec::ch('1'), Action::TabSources),
            (KeySpec::ch('2'), Action::TabResults),
            (KeySpec::ch('3'), Action::TabArticle),
            (KeySpec::ch('4'), Action::TabAnalytics),
            (KeySpec::ch('s'), Action::Scrape),
            (KeySpec::ch('g'), Action::Generate),
            (KeySpec::ch('d'), Action::Download),
            (KeySpec::ch('K'), Action::EnterApiKey),
            (KeySpec::ch('T'), Action::CycleTheme),
            (KeySpec::ch('?'), Action::ShowHelp),
        ];
        for (key, action) in global {
            self.bind(Global, key, action);
        }

        self.bind(Sources, KeySpec::ch('l'), Action::LoadSources);
        self.bind(Sources, KeySpec::ch('x'), Action::RemoveUrl);
        self.bind(Sources, KeySpec::plain(KeyCode::Delete), Action::RemoveUrl);
        self.bind(Sources, KeySpec::ch('C'), Action::ClearUrls);

        self.bind(Article, KeySpec::ch('h'), Action::ToggleHtml);
        self.bind(Article, KeySpec::ch('j'), Action::ScrollDown);
        self.bind(Article, KeySpec::plain(KeyCode::Down), Action::ScrollDown);
        self.bind(Article, KeySpec::ch('k'), Action::ScrollUp);
        self.bind(Article, KeySpec::plain(KeyCode::Up), Action::ScrollUp);
        self.bind(Article, KeySpec::ctrl('d'), Action::PageDown);
        self.bind(Article, KeySpec::plain(KeyCode::PageDown), Action::PageDown);
        self.bind(Article, KeySpec::ctrl('u'), Action::PageUp);
        self.bind(Article, KeySpec::plain(KeyCode::PageUp), Action::PageUp);

        self.bind(Analytics, KeySpec::ch('j'), Action::ScrollDown);
        self.bind(Analytics, KeySpec::ch('k'), Action::ScrollUp);

        self.bind(Editing, KeySpec::plain(KeyCode::Enter), Action::CommitEdit);
        self.bind(Editing, KeySpec::plain(KeyCode::Esc), Action::CancelEdit);
    }

    /// Apply user overrides from the config `[keybindings]` table.
    ///
    /// Keys are action names ("scrape", "toggle_html"), values key strings
    /// ("S", "Ctrl+g", "F5"). The new key replaces the action's default in
    /// every context it was bound in. Returns warnings for entries that were
    /// skipped.
    pub fn apply_overrides(&mut self, overrides: &HashMap<String, String>) -> Vec<String> {
        let mut warnings = Vec::new();

        let mut entries: Vec<_> = overrides.iter().collect();
        entries.sort();

        for (action_name, key_str) in entries {
            let Some(action) = parse_action_name(action_name) else {
                warnings.push(format!("Unknown action '{}', ignoring", action_name));
                continue;
            };
            let Some(key) = parse_key_string(key_str) else {
                warnings.push(format!(
                    "Cannot parse key '{}' for action '{}', ignoring",
                    key_str, action_name
                ));
                continue;
            };

            let mut contexts: Vec<Context> = Vec::new();
            for (ctx, _, a) in &self.bindings {
                if *a == action && !contexts.contains(ctx) {
                    contexts.push(*ctx);
                }
            }

            self.lookup.retain(|_, a| *a != action);
            self.bindings.retain(|(_, _, a)| *a != action);
            for ctx in contexts {
                self.bind(ctx, key, action);
            }

            tracing::info!(action = %action_name, key = %key_str, "Applied keybinding override");
        }

        warnings
    }

    /// The action bound to a key in `context`, falling back to `Global`.
    pub fn action_for_key(
        &self,
        code: KeyCode,
        modifiers: KeyModifiers,
        context: Context,
    ) -> Option<Action> {
        let key = KeySpec::new(code, modifiers).normalized();

        self.lookup.get(&(context, key)).copied().or_else(|| {
            (context != Context::Global && context != Context::Editing)
                .then(|| self.lookup.get(&(Context::Global, key)).copied())
                .flatten()
        })
    }

    /// (context, key display, action, description) for every binding.
    pub fn all_bindings(&self) -> Vec<(Context, String, Action, &'static str)> {
        self.bindings
            .iter()
            .map(|(ctx, key, action)| (*ctx, format_key(key), *action, action.describe()))
            .collect()
    }

    /// First key bound to `action`, for inline hints.
    pub fn key_hint(&self, action: Action) -> Option<String> {
        self.bindings
            .iter()
            .find(|(_, _, a)| *a == action)
            .map(|(_, key, _)| format_key(key))
    }
}

impl Default for KeybindingRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_action_name(name: &str) -> Option<Action> {
    let action = match name.to_lowercase().replace('-', "_").as_str() {
        "quit" => Action::Quit,
        "next_field" | "tab" => Action::NextField,
        "prev_field" => Action::PrevField,
        "nav_down" | "down" => Action::NavDown,
        "nav_up" | "up" => Action::NavUp,
        "select" | "enter" => Action::Select,
        "back" => Action::Back,
        "value_next" | "increase" => Action::ValueNext,
        "value_prev" | "decrease" => Action::ValuePrev,
        "tab_sources" => Action::TabSources,
        "tab_results" => Action::TabResults,
        "tab_article" => Action::TabArticle,
        "tab_analytics" => Action::TabAnalytics,
        "load_sources" | "sources" => Action::LoadSources,
        "scrape" => Action::Scrape,
        "generate" => Action::Generate,
        "download" => Action::Download,
        "remove_url" => Action::RemoveUrl,
        "clear_urls" => Action::ClearUrls,
        "enter_api_key" | "api_key" => Action::EnterApiKey,
        "toggle_html" | "html" => Action::ToggleHtml,
        "scroll_down" => Action::ScrollDown,
        "scroll_up" => Action::ScrollUp,
        "page_down" => Action::PageDown,
        "page_up" => Action::PageUp,
        "cycle_theme" | "theme" => Action::CycleTheme,
        "show_help" | "help" => Action::ShowHelp,
        "commit_edit" => Action::CommitEdit,
        "cancel_edit" => Action::CancelEdit,
        _ => return None,
    };
    Some(action)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup(reg: &KeybindingRegistry, code: KeyCode, ctx: Context) -> Option<Action> {
        reg.action_for_key(code, KeyModifiers::NONE, ctx)
    }

    #[test]
    fn test_default_flow_keys() {
        let reg = KeybindingRegistry::new();
        assert_eq!(lookup(&reg, KeyCode::Char('s'), Context::Global), Some(Action::Scrape));
        assert_eq!(lookup(&reg, KeyCode::Char('g'), Context::Sources), Some(Action::Generate));
        assert_eq!(lookup(&reg, KeyCode::Char('d'), Context::Article), Some(Action::Download));
    }

    #[test]
    fn test_context_overrides_global() {
        let reg = KeybindingRegistry::new();
        assert_eq!(lookup(&reg, KeyCode::Char('j'), Context::Sources), Some(Action::NavDown));
        assert_eq!(lookup(&reg, KeyCode::Char('j'), Context::Article), Some(Action::ScrollDown));
    }

    #[test]
    fn test_tab_specific_keys() {
        let reg = KeybindingRegistry::new();
        assert_eq!(lookup(&reg, KeyCode::Char('x'), Context::Sources), Some(Action::RemoveUrl));
        assert_eq!(lookup(&reg, KeyCode::Char('x'), Context::Results), None);
        assert_eq!(lookup(&reg, KeyCode::Char('h'), Context::Article), Some(Action::ToggleHtml));
        assert_eq!(lookup(&reg, KeyCode::Char('h'), Context::Sources), None);
    }

    #[test]
    fn test_editing_does_not_fall_back() {
        let reg = KeybindingRegistry::new();
        assert_eq!(lookup(&reg, KeyCode::Enter, Context::Editing), Some(Action::CommitEdit));
        assert_eq!(lookup(&reg, KeyCode::Esc, Context::Editing), Some(Action::CancelEdit));
        // Typing 'q' into a field must not quit.
        assert_eq!(lookup(&reg, KeyCode::Char('q'), Context::Editing), None);
    }

    #[test]
    fn test_shift_is_ignored_for_chars() {
        let reg = KeybindingRegistry::new();
        assert_eq!(
            reg.action_for_key(KeyCode::Char('K'), KeyModifiers::SHIFT, Context::Sources),
            Some(Action::EnterApiKey)
        );
        assert_eq!(
            reg.action_for_key(KeyCode::BackTab, KeyModifiers::SHIFT, Context::Article),
            Some(Action::PrevField)
        );
    }

    #[test]
    fn test_ctrl_modifiers() {
        let reg = KeybindingRegistry::new();
        assert_eq!(
            reg.action_for_key(KeyCode::Char('d'), KeyModifiers::CONTROL, Context::Article),
            Some(Action::PageDown)
        );
        assert_eq!(
            reg.action_for_key(KeyCode::Char('c'), KeyModifiers::CONTROL, Context::Results),
            Some(Action::Quit)
        );
    }

    #[test]
    fn test_apply_overrides_valid() {
        let mut reg = KeybindingRegistry::new();
        let overrides = HashMap::from([("scrape".to_string(), "F5".to_string())]);

        assert!(reg.apply_overrides(&overrides).is_empty());
        assert_eq!(lookup(&reg, KeyCode::Char('s'), Context::Global), None);
        assert_eq!(lookup(&reg, KeyCode::F(5), Context::Sources), Some(Action::Scrape));
    }

    #[test]
    fn test_override_preserves_contexts() {
        let mut reg = KeybindingRegistry::new();
        let overrides = HashMap::from([("scroll_down".to_string(), "n".to_string())]);
        assert!(reg.apply_overrides(&overrides).is_empty());

        assert_eq!(lookup(&reg, KeyCode::Char('n'), Context::Article), Some(Action::ScrollDown));
        assert_eq!(lookup(&reg, KeyCode::Char('n'), Context::Analytics), Some(Action::ScrollDown));
        assert_eq!(lookup(&reg, KeyCode::Char('n'), Context::Global), None);
    }

    #[test]
    fn test_apply_overrides_warnings() {
        let mut reg = KeybindingRegistry::new();
        let overrides = HashMap::from([
            ("nonexistent_action".to_string(), "q".to_string()),
            ("quit".to_string(), "Ctrl+Alt+Q".to_string()),
        ]);
        let warnings = reg.apply_overrides(&overrides);
        assert_eq!(warnings.len(), 2);
        assert!(warnings.iter().any(|w| w.contains("Unknown action")));
        assert!(warnings.iter().any(|w| w.contains("Cannot parse key")));
    }

    #[test]
    fn test_parse_key_string() {
        assert_eq!(parse_key_string("Enter"), Some(KeySpec::plain(KeyCode::Enter)));
        assert_eq!(parse_key_string("space"), Some(KeySpec::ch(' ')));
        assert_eq!(parse_key_string("Ctrl+g"), Some(KeySpec::ctrl('g')));
        assert_eq!(parse_key_string("F12"), Some(KeySpec::plain(KeyCode::F(12))));
        assert_eq!(parse_key_string("F13"), None);
        assert_eq!(parse_key_string("é"), Some(KeySpec::ch('é')));
        assert_eq!(parse_key_string("xy"), None);
    }

    #[test]
    fn test_format_key_display() {
        assert_eq!(format_key(&KeySpec::ch('q')), "q");
        assert_eq!(format_key(&KeySpec::ctrl('d')), "Ctrl+d");
        assert_eq!(format_key(&KeySpec::plain(KeyCode::BackTab)), "Shift+Tab");
        assert_eq!(format_key(&KeySpec::ch(' ')), "Space");
    }

    #[test]
    fn test_key_hint_and_listing() {
        let reg = KeybindingRegistry::new();
        assert_eq!(reg.key_hint(Action::Generate).as_deref(), Some("g"));
        assert!(reg.all_bindings().len() >= 30);
    }
}
