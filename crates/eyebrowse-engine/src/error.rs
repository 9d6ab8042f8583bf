//! Engine errors

use eyebrowse_css::CssError;
use eyebrowse_dom::DomError;

use crate::router::TabId;
use crate::store::StoreError;

pub type EngineResult<T> = Result<T, EngineError>;

/// Errors raised by the reconciliation engine
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Access denied to restricted page: {url}")]
    AccessDenied { url: String },

    #[error("Invalid value for {setting}: {value}")]
    InvalidValue { setting: String, value: String },

    #[error("Unknown setting: {0}")]
    UnknownSetting(String),

    #[error("Missing element: {0}")]
    MissingElement(&'static str),

    #[error("No tab with id {0}")]
    TabNotFound(TabId),

    #[error("Invalid stylesheet: {0}")]
    Stylesheet(#[from] CssError),

    #[error("DOM error: {0}")]
    Dom(#[from] DomError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl EngineError {
    pub(crate) fn invalid(setting: &str, value: impl std::fmt::Display) -> Self {
        Self::InvalidValue {
            setting: setting.to_string(),
            value: value.to_string(),
        }
    }
}
