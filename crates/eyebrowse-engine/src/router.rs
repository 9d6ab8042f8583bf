//! Command router
//!
//! Receives commands addressed to tabs, persists the new settings, and
//! forwards them to the tab's coordinator. Every navigation gets a fresh
//! coordinator, so no engine state survives a page load.

use std::collections::BTreeMap;

use eyebrowse_dom::Document;
use serde::Deserialize;
use serde_json::{Value, json};
use url::Url;

use crate::config::{
    Configuration, FilterType, FontChoice, SCALE_RANGE, TextSetting, clamp_f64, keys,
};
use crate::coordinator::SettingsCoordinator;
use crate::error::{EngineError, EngineResult};
use crate::store::SettingsStore;

/// Schemes the engine may never touch
const RESTRICTED_SCHEMES: &[&str] = &[
    "chrome",
    "chrome-extension",
    "edge",
    "about",
    "devtools",
    "view-source",
];

/// Browser tab handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TabId(pub u32);

impl std::fmt::Display for TabId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Message sent to a tab, tagged by its `command` field
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "command", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Command {
    SetFilter { filter_type: FilterType },
    SetFont { font: FontChoice },
    SetTextSetting { key: String, value: Value },
    AdjustTextSize { percentage: f64 },
    SetPageZoom { factor: f64 },
    ApplyAllSettings,
    ResetSettings,
}

impl Command {
    /// Decode a `{"command": ..., ...}` message
    pub fn from_message(message: &Value) -> EngineResult<Self> {
        Command::deserialize(message).map_err(|e| EngineError::invalid("command", e))
    }

    pub fn name(&self) -> &'static str {
        match self {
            Command::SetFilter { .. } => "setFilter",
            Command::SetFont { .. } => "setFont",
            Command::SetTextSetting { .. } => "setTextSetting",
            Command::AdjustTextSize { .. } => "adjustTextSize",
            Command::SetPageZoom { .. } => "setPageZoom",
            Command::ApplyAllSettings => "applyAllSettings",
            Command::ResetSettings => "resetSettings",
        }
    }
}

/// Validated command, ready to persist and apply
enum Action {
    Filter(FilterType),
    Font(FontChoice),
    Text(TextSetting),
    TextSize(f64),
    Zoom(f64),
    ApplyAll,
    Reset,
}

impl Action {
    fn validate(command: Command) -> EngineResult<Self> {
        let action = match command {
            Command::SetFilter { filter_type } => Action::Filter(filter_type),
            Command::SetFont { font } => Action::Font(font),
            Command::SetTextSetting { key, value } => Action::Text(TextSetting::parse(&key, &value)?),
            Command::AdjustTextSize { percentage } => {
                if !percentage.is_finite() || percentage <= 0.0 {
                    return Err(EngineError::invalid(keys::TEXT_SIZE, percentage));
                }
                let (min, max) = SCALE_RANGE;
                Action::TextSize(percentage.clamp(min * 100.0, max * 100.0))
            }
            Command::SetPageZoom { factor } => {
                if !factor.is_finite() || factor <= 0.0 {
                    return Err(EngineError::invalid(keys::ZOOM, factor));
                }
                Action::Zoom(clamp_f64(factor, SCALE_RANGE))
            }
            Command::ApplyAllSettings => Action::ApplyAll,
            Command::ResetSettings => Action::Reset,
        };
        Ok(action)
    }
}

/// What became of a dispatched command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    Applied,
    /// Settings were persisted but the page was left alone
    Skipped(String),
}

/// A loaded page and the engines bound to it
#[derive(Debug)]
pub struct TabSession {
    pub url: String,
    pub document: Document,
    pub coordinator: SettingsCoordinator,
}

impl TabSession {
    fn new(url: &str, document: Document) -> Self {
        Self {
            url: url.to_string(),
            document,
            coordinator: SettingsCoordinator::new(),
        }
    }
}

/// Whether the engine must leave a page alone
pub fn is_restricted_url(url: &str) -> bool {
    match Url::parse(url) {
        Ok(parsed) => {
            let scheme = parsed.scheme();
            if scheme == "about" && parsed.path() == "blank" {
                return false;
            }
            RESTRICTED_SCHEMES.contains(&scheme)
        }
        Err(e) => {
            tracing::debug!("Unparsable url {:?}: {}", url, e);
            true
        }
    }
}

fn check_access(url: &str) -> EngineResult<()> {
    if is_restricted_url(url) {
        return Err(EngineError::AccessDenied {
            url: url.to_string(),
        });
    }
    Ok(())
}

/// Owner of the settings store and every open tab
#[derive(Debug)]
pub struct CommandRouter<S: SettingsStore> {
    store: S,
    tabs: BTreeMap<TabId, TabSession>,
    next_id: u32,
}

impl<S: SettingsStore> CommandRouter<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            tabs: BTreeMap::new(),
            next_id: 1,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Stored configuration
    pub fn configuration(&self) -> Configuration {
        Configuration::load(&self.store)
    }

    /// Register a loaded page and apply the stored configuration to it
    pub fn open_tab(&mut self, url: &str, document: Document) -> TabId {
        let id = TabId(self.next_id);
        self.next_id += 1;
        self.tabs.insert(id, TabSession::new(url, document));
        self.on_load_complete(id);
        tracing::debug!("Opened tab {} at {}", id, url);
        id
    }

    /// Replace the tab's page. The previous engine state is dropped with it.
    pub fn navigate(&mut self, tab: TabId, url: &str, document: Document) -> EngineResult<()> {
        let session = self.tabs.get_mut(&tab).ok_or(EngineError::TabNotFound(tab))?;
        *session = TabSession::new(url, document);
        self.on_load_complete(tab);
        tracing::debug!("Tab {} navigated to {}", tab, url);
        Ok(())
    }

    pub fn close_tab(&mut self, tab: TabId) -> Option<TabSession> {
        self.tabs.remove(&tab)
    }

    pub fn session(&self, tab: TabId) -> EngineResult<&TabSession> {
        self.tabs.get(&tab).ok_or(EngineError::TabNotFound(tab))
    }

    pub fn session_mut(&mut self, tab: TabId) -> EngineResult<&mut TabSession> {
        self.tabs.get_mut(&tab).ok_or(EngineError::TabNotFound(tab))
    }

    pub fn tab_ids(&self) -> impl Iterator<Item = TabId> + '_ {
        self.tabs.keys().copied()
    }

    /// Deliver queued mutations on the tab's page
    pub fn process_mutations(&mut self, tab: TabId) -> EngineResult<usize> {
        let session = self.session_mut(tab)?;
        Ok(session.coordinator.process_mutations(&mut session.document))
    }

    fn on_load_complete(&mut self, tab: TabId) {
        let config = Configuration::load(&self.store);
        let Some(session) = self.tabs.get_mut(&tab) else {
            return;
        };
        if let Err(e) = check_access(&session.url) {
            tracing::debug!("Not applying stored settings: {}", e);
            return;
        }
        let report = session.coordinator.apply_all(&mut session.document, &config);
        if !report.is_ok() {
            tracing::warn!("Tab {}: {} engines failed on load", tab, report.failures.len());
        }
    }

    /// Persist the command's new value, then apply it to the tab.
    ///
    /// Invalid values are rejected before anything is stored or mutated.
    /// Missing tabs and restricted pages are skipped.
    pub fn dispatch(&mut self, tab: TabId, command: Command) -> EngineResult<CommandOutcome> {
        let name = command.name();
        let action = Action::validate(command)?;
        let config = self.persist(&action)?;

        let session = match self.session_mut(tab) {
            Ok(session) => session,
            Err(e) => {
                tracing::debug!("{} skipped: {}", name, e);
                return Ok(CommandOutcome::Skipped(e.to_string()));
            }
        };
        if let Err(e) = check_access(&session.url) {
            tracing::debug!("{} skipped: {}", name, e);
            return Ok(CommandOutcome::Skipped(e.to_string()));
        }

        let coordinator = &mut session.coordinator;
        let doc = &mut session.document;
        match action {
            Action::Filter(filter) => coordinator.set_filter(doc, filter)?,
            Action::Font(font) => coordinator.set_font(doc, &font)?,
            Action::Text(setting) => coordinator.set_text_setting(doc, &setting)?,
            Action::TextSize(percentage) => coordinator.adjust_text_size(doc, percentage)?,
            Action::Zoom(factor) => coordinator.set_page_zoom(doc, factor)?,
            Action::ApplyAll => {
                let report = coordinator.apply_all(doc, &config);
                if !report.is_ok() {
                    tracing::warn!("{} on tab {}: {} engines failed", name, tab, report.failures.len());
                }
            }
            Action::Reset => {
                coordinator.reset_all(doc);
            }
        }
        tracing::debug!("{} applied to tab {}", name, tab);
        Ok(CommandOutcome::Applied)
    }

    /// Write the action's value to the store and return the resulting configuration
    fn persist(&mut self, action: &Action) -> EngineResult<Configuration> {
        match action {
            Action::Filter(filter) => self.store.set(keys::FILTER, json!(filter.as_str()))?,
            Action::Font(font) => self.store.set(keys::FONT, json!(font.as_str()))?,
            Action::Text(setting) => self.store.set(setting.key(), setting.to_json())?,
            Action::TextSize(percentage) => {
                self.store.set(keys::TEXT_SIZE, json!(percentage / 100.0))?
            }
            Action::Zoom(factor) => self.store.set(keys::ZOOM, json!(factor))?,
            Action::ApplyAll => {}
            Action::Reset => return Ok(Configuration::reset_defaults(&mut self.store)?),
        }
        Ok(Configuration::load(&self.store))
    }
}
