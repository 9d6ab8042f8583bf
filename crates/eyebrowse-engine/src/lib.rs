//! EyeBrowse Engine
//!
//! Reconciles a live document with the persisted accessibility
//! configuration: color filters, font substitution, text metrics and page
//! zoom. Every change is recorded so it can be undone exactly.
//!
//! # Architecture
//!
//! ```text
//! CommandRouter (tabs, store)
//!   └── SettingsCoordinator (one per page load)
//!         ├── FilterEngine ─┐
//!         ├── FontEngine ───┤── EngineState { StyleLedger, ObserverRegistry }
//!         ├── TextMetricsEngine
//!         └── ZoomEngine
//! ```

mod config;
mod coordinator;
mod error;
mod filter;
mod font;
mod ledger;
mod observers;
mod router;
mod setup;
mod speech;
mod store;
mod stylesheet;
mod text;
mod zoom;

pub use config::{ContrastMode, Configuration, FilterType, FontChoice, TextCustomization, TextSetting};
pub use coordinator::{ApplyReport, SettingsCoordinator};
pub use error::{EngineError, EngineResult};
pub use filter::FilterEngine;
pub use font::FontEngine;
pub use ledger::{Concern, LedgerTarget, OriginalValue, RestoreReport, StyleLedger};
pub use observers::{NodeHandler, NodePredicate, ObserverRegistry};
pub use router::{Command, CommandOutcome, CommandRouter, TabId, TabSession, is_restricted_url};
pub use setup::SetupProfile;
pub use speech::{NO_CONTENT_ANNOUNCEMENT, ReadingQueue, SpeechSettings, Utterance, describe_for_hover};
pub use store::{JsonFileStore, MemoryStore, SettingsStore, StoreError};
pub use text::TextMetricsEngine;
pub use zoom::ZoomEngine;

/// Prefix of every element id the engine creates
pub const ID_PREFIX: &str = "eyebrowse-";

/// Prefix of every root/body class the engine adds
pub const CLASS_PREFIX: &str = "eyebrowse-";

/// Attribute holding an element's pre-scaling font size
pub const ORIGINAL_SIZE_ATTR: &str = "data-original-size";

/// Attribute marking fixed/sticky elements corrected for zoom
pub const ZOOM_PROCESSED_ATTR: &str = "data-zoom-processed";

/// Per-document engine bookkeeping. Never outlives the page it was built for.
#[derive(Debug, Default)]
pub struct EngineState {
    pub ledger: StyleLedger,
    pub observers: ObserverRegistry,
}

impl EngineState {
    pub fn new() -> Self {
        Self::default()
    }
}
