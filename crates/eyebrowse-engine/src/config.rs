//! Engine configuration
//!
//! The persisted settings snapshot, its store keys, and the tolerant loading
//! rules for values written by earlier versions of the extension.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::error::{EngineError, EngineResult};
use crate::speech::SpeechSettings;
use crate::store::{SettingsStore, StoreError};

/// Store keys
pub mod keys {
    pub const FILTER: &str = "focusMode";
    pub const FONT: &str = "fontPreference";
    pub const ZOOM: &str = "zoomFactor";
    pub const TEXT_SIZE: &str = "textSize";
    pub const LINE_SPACING: &str = "lineSpacing";
    pub const PARAGRAPH_SPACING: &str = "paragraphSpacing";
    pub const LETTER_SPACING: &str = "letterSpacing";
    pub const WORD_SPACING: &str = "wordSpacing";
    pub const COLUMN_WIDTH: &str = "columnWidth";
    pub const TEXT_GUIDE: &str = "textGuide";
    pub const HIGH_CONTRAST: &str = "highContrast";
    pub const CONTRAST_MODE: &str = "contrastMode";
    pub const TTS_ENABLED: &str = "ttsEnabled";
    pub const TTS_RATE: &str = "ttsRate";
    pub const TTS_PITCH: &str = "ttsPitch";
    pub const TTS_VOICE: &str = "ttsVoice";
    pub const TTS_HOVER: &str = "ttsHoverEnabled";
}

const SPACING_RANGE: (f64, f64) = (1.0, 3.0);
pub(crate) const SCALE_RANGE: (f64, f64) = (0.1, 10.0);
const COLUMN_RANGE: (u32, u32) = (10, 100);

/// Color filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FilterType {
    #[default]
    Off,
    Grayscale,
    Protanopia,
    Deuteranopia,
    Tritanopia,
    Dark,
}

impl FilterType {
    pub const ALL: [FilterType; 6] = [
        FilterType::Off,
        FilterType::Grayscale,
        FilterType::Protanopia,
        FilterType::Deuteranopia,
        FilterType::Tritanopia,
        FilterType::Dark,
    ];

    /// Wire name (`GRAYSCALE`)
    pub fn as_str(self) -> &'static str {
        match self {
            FilterType::Off => "OFF",
            FilterType::Grayscale => "GRAYSCALE",
            FilterType::Protanopia => "PROTANOPIA",
            FilterType::Deuteranopia => "DEUTERANOPIA",
            FilterType::Tritanopia => "TRITANOPIA",
            FilterType::Dark => "DARK",
        }
    }

    fn slug(self) -> Option<&'static str> {
        match self {
            FilterType::Off => None,
            FilterType::Grayscale => Some("grayscale"),
            FilterType::Protanopia => Some("protanopia"),
            FilterType::Deuteranopia => Some("deuteranopia"),
            FilterType::Tritanopia => Some("tritanopia"),
            FilterType::Dark => Some("dark-mode"),
        }
    }

    /// Id of the injected stylesheet
    pub fn style_id(self) -> Option<String> {
        self.slug().map(|s| format!("eyebrowse-{s}-style"))
    }

    /// Whether this filter also needs an SVG color matrix
    pub fn is_color_vision(self) -> bool {
        matches!(
            self,
            FilterType::Protanopia | FilterType::Deuteranopia | FilterType::Tritanopia
        )
    }

    /// Id of the SVG `<filter>` element (`protanopia-filter`)
    pub fn svg_filter_id(self) -> Option<String> {
        self.is_color_vision()
            .then(|| self.slug().map(|s| format!("{s}-filter")))
            .flatten()
    }

    /// Id of the element wrapping the SVG definition
    pub fn container_id(self) -> Option<String> {
        self.svg_filter_id().map(|id| format!("eyebrowse-{id}"))
    }
}

impl FromStr for FilterType {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        FilterType::ALL
            .into_iter()
            .find(|f| f.as_str() == upper)
            .ok_or_else(|| EngineError::invalid(keys::FILTER, s))
    }
}

impl std::fmt::Display for FilterType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Font substitution
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FontChoice {
    #[default]
    Default,
    OpenDyslexic,
    Arial,
    ComicSans,
    /// Any other family name, applied without a spacing preset
    Other(String),
}

impl FontChoice {
    /// Wire name (`comic-sans`)
    pub fn as_str(&self) -> &str {
        match self {
            FontChoice::Default => "default",
            FontChoice::OpenDyslexic => "opendyslexic",
            FontChoice::Arial => "arial",
            FontChoice::ComicSans => "comic-sans",
            FontChoice::Other(name) => name,
        }
    }

    /// Suffix of the root marker class
    pub fn slug(&self) -> String {
        match self {
            FontChoice::Other(name) => name
                .trim()
                .to_ascii_lowercase()
                .chars()
                .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
                .collect(),
            known => known.as_str().to_string(),
        }
    }
}

impl From<String> for FontChoice {
    fn from(value: String) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "" | "default" => FontChoice::Default,
            "opendyslexic" => FontChoice::OpenDyslexic,
            "arial" => FontChoice::Arial,
            "comic-sans" | "comicsans" | "comic_sans" => FontChoice::ComicSans,
            _ => FontChoice::Other(value.trim().to_string()),
        }
    }
}

impl From<&str> for FontChoice {
    fn from(value: &str) -> Self {
        FontChoice::from(value.to_string())
    }
}

impl From<FontChoice> for String {
    fn from(value: FontChoice) -> Self {
        value.as_str().to_string()
    }
}

impl std::fmt::Display for FontChoice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// High-contrast flavour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContrastMode {
    #[default]
    Normal,
    Inverted,
}

impl ContrastMode {
    pub fn as_str(self) -> &'static str {
        match self {
            ContrastMode::Normal => "normal",
            ContrastMode::Inverted => "inverted",
        }
    }
}

/// Text settings written through CSS variables and class toggles
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextCustomization {
    pub line_spacing: f64,
    pub paragraph_spacing: f64,
    pub letter_spacing: u32,
    pub word_spacing: u32,
    pub column_width: u32,
    pub text_guide: bool,
    pub high_contrast: bool,
    pub contrast_mode: ContrastMode,
}

impl Default for TextCustomization {
    fn default() -> Self {
        Self {
            line_spacing: 1.0,
            paragraph_spacing: 1.0,
            letter_spacing: 0,
            word_spacing: 0,
            column_width: 100,
            text_guide: false,
            high_contrast: false,
            contrast_mode: ContrastMode::Normal,
        }
    }
}

impl TextCustomization {
    /// Whether any setting differs from its inactive state.
    ///
    /// Numeric defaults (1.0 / 0 / 100) and disabled toggles are inactive.
    /// Contrast mode alone is not a customization.
    pub fn is_active(&self) -> bool {
        const EPSILON: f64 = 1e-9;
        (self.line_spacing - 1.0).abs() > EPSILON
            || (self.paragraph_spacing - 1.0).abs() > EPSILON
            || self.letter_spacing != 0
            || self.word_spacing != 0
            || self.column_width != 100
            || self.text_guide
            || self.high_contrast
    }

    /// Apply one setting to this snapshot
    pub fn update(&mut self, setting: &TextSetting) {
        match *setting {
            TextSetting::LineSpacing(v) => self.line_spacing = v,
            TextSetting::ParagraphSpacing(v) => self.paragraph_spacing = v,
            TextSetting::LetterSpacing(v) => self.letter_spacing = v,
            TextSetting::WordSpacing(v) => self.word_spacing = v,
            TextSetting::ColumnWidth(v) => self.column_width = v,
            TextSetting::TextGuide(v) => self.text_guide = v,
            TextSetting::HighContrast(v) => self.high_contrast = v,
            TextSetting::ContrastMode(m) => self.contrast_mode = m,
        }
    }
}

/// One `setTextSetting(key, value)` command
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TextSetting {
    LineSpacing(f64),
    ParagraphSpacing(f64),
    LetterSpacing(u32),
    WordSpacing(u32),
    ColumnWidth(u32),
    TextGuide(bool),
    HighContrast(bool),
    ContrastMode(ContrastMode),
}

impl TextSetting {
    /// Parse a setting from its store key and a JSON value.
    ///
    /// Numbers may arrive as strings. Unparsable or non-finite values are
    /// rejected before anything is mutated.
    pub fn parse(key: &str, value: &Value) -> EngineResult<Self> {
        let setting = match key {
            keys::LINE_SPACING => TextSetting::LineSpacing(clamp_f64(strict_f64(key, value)?, SPACING_RANGE)),
            keys::PARAGRAPH_SPACING => {
                TextSetting::ParagraphSpacing(clamp_f64(strict_f64(key, value)?, SPACING_RANGE))
            }
            keys::LETTER_SPACING => TextSetting::LetterSpacing(to_px(strict_f64(key, value)?)),
            keys::WORD_SPACING => TextSetting::WordSpacing(to_px(strict_f64(key, value)?)),
            keys::COLUMN_WIDTH => TextSetting::ColumnWidth(to_column(strict_f64(key, value)?)),
            keys::TEXT_GUIDE => TextSetting::TextGuide(truthy(value)),
            keys::HIGH_CONTRAST => TextSetting::HighContrast(truthy(value)),
            keys::CONTRAST_MODE => TextSetting::ContrastMode(parse_contrast(value)),
            other => return Err(EngineError::UnknownSetting(other.to_string())),
        };
        Ok(setting)
    }

    /// Store key
    pub fn key(&self) -> &'static str {
        match self {
            TextSetting::LineSpacing(_) => keys::LINE_SPACING,
            TextSetting::ParagraphSpacing(_) => keys::PARAGRAPH_SPACING,
            TextSetting::LetterSpacing(_) => keys::LETTER_SPACING,
            TextSetting::WordSpacing(_) => keys::WORD_SPACING,
            TextSetting::ColumnWidth(_) => keys::COLUMN_WIDTH,
            TextSetting::TextGuide(_) => keys::TEXT_GUIDE,
            TextSetting::HighContrast(_) => keys::HIGH_CONTRAST,
            TextSetting::ContrastMode(_) => keys::CONTRAST_MODE,
        }
    }

    /// Value as persisted
    pub fn to_json(&self) -> Value {
        match *self {
            TextSetting::LineSpacing(v) | TextSetting::ParagraphSpacing(v) => json!(v),
            TextSetting::LetterSpacing(v)
            | TextSetting::WordSpacing(v)
            | TextSetting::ColumnWidth(v) => json!(v),
            TextSetting::TextGuide(v) | TextSetting::HighContrast(v) => json!(v),
            TextSetting::ContrastMode(m) => json!(m.as_str()),
        }
    }
}

/// Persisted configuration snapshot
#[derive(Debug, Clone, PartialEq)]
pub struct Configuration {
    pub filter: FilterType,
    pub font: FontChoice,
    pub zoom_factor: f64,
    pub text_size_factor: f64,
    pub line_spacing: f64,
    pub paragraph_spacing: f64,
    pub letter_spacing: u32,
    pub word_spacing: u32,
    pub column_width: u32,
    pub text_guide: bool,
    pub high_contrast: bool,
    pub contrast_mode: ContrastMode,
    pub speech: SpeechSettings,
}

impl Default for Configuration {
    fn default() -> Self {
        let text = TextCustomization::default();
        Self {
            filter: FilterType::Off,
            font: FontChoice::Default,
            zoom_factor: 1.0,
            text_size_factor: 1.0,
            line_spacing: text.line_spacing,
            paragraph_spacing: text.paragraph_spacing,
            letter_spacing: text.letter_spacing,
            word_spacing: text.word_spacing,
            column_width: text.column_width,
            text_guide: text.text_guide,
            high_contrast: text.high_contrast,
            contrast_mode: text.contrast_mode,
            speech: SpeechSettings::default(),
        }
    }
}

impl Configuration {
    /// Read every key, normalizing and clamping as needed
    pub fn load(store: &dyn SettingsStore) -> Self {
        let defaults = Self::default();
        let filter = match store.get(keys::FILTER) {
            Some(Value::String(s)) => s.parse().unwrap_or_else(|_| {
                tracing::warn!("Unknown filter {:?}, using OFF", s);
                FilterType::Off
            }),
            Some(Value::Null | Value::Bool(false)) | None => FilterType::Off,
            Some(other) => {
                tracing::warn!("Malformed {}: {}", keys::FILTER, other);
                FilterType::Off
            }
        };
        let font = match store.get(keys::FONT) {
            Some(Value::String(s)) => FontChoice::from(s),
            Some(Value::Null) | None => FontChoice::Default,
            Some(other) => {
                tracing::warn!("Malformed {}: {}", keys::FONT, other);
                FontChoice::Default
            }
        };
        // textSize holds the factor, not the percentage
        let text_size_factor = read_f64(store, keys::TEXT_SIZE)
            .map(|f| clamp_f64(f, SCALE_RANGE))
            .unwrap_or(defaults.text_size_factor);

        Self {
            filter,
            font,
            zoom_factor: read_f64(store, keys::ZOOM)
                .map(|z| clamp_f64(z, SCALE_RANGE))
                .unwrap_or(defaults.zoom_factor),
            text_size_factor,
            line_spacing: read_f64(store, keys::LINE_SPACING)
                .map(|v| clamp_f64(v, SPACING_RANGE))
                .unwrap_or(defaults.line_spacing),
            paragraph_spacing: read_f64(store, keys::PARAGRAPH_SPACING)
                .map(|v| clamp_f64(v, SPACING_RANGE))
                .unwrap_or(defaults.paragraph_spacing),
            letter_spacing: read_f64(store, keys::LETTER_SPACING)
                .map(to_px)
                .unwrap_or(defaults.letter_spacing),
            word_spacing: read_f64(store, keys::WORD_SPACING)
                .map(to_px)
                .unwrap_or(defaults.word_spacing),
            column_width: read_f64(store, keys::COLUMN_WIDTH)
                .map(to_column)
                .unwrap_or(defaults.column_width),
            text_guide: store.get(keys::TEXT_GUIDE).is_some_and(|v| truthy(&v)),
            high_contrast: store.get(keys::HIGH_CONTRAST).is_some_and(|v| truthy(&v)),
            contrast_mode: store
                .get(keys::CONTRAST_MODE)
                .map(|v| parse_contrast(&v))
                .unwrap_or_default(),
            speech: SpeechSettings::load(store),
        }
    }

    /// Write every key
    pub fn save(&self, store: &mut dyn SettingsStore) -> Result<(), StoreError> {
        store.set_many(self.to_entries())
    }

    /// Persist the defaults and return them
    pub fn reset_defaults(store: &mut dyn SettingsStore) -> Result<Self, StoreError> {
        let defaults = Self::default();
        defaults.save(store)?;
        Ok(defaults)
    }

    /// (key, value) pairs as persisted
    pub fn to_entries(&self) -> Vec<(&'static str, Value)> {
        let mut entries = vec![
            (keys::FILTER, json!(self.filter.as_str())),
            (keys::FONT, json!(self.font.as_str())),
            (keys::ZOOM, json!(self.zoom_factor)),
            (keys::TEXT_SIZE, json!(self.text_size_factor)),
        ];
        let text = self.text_customization();
        for setting in [
            TextSetting::LineSpacing(text.line_spacing),
            TextSetting::ParagraphSpacing(text.paragraph_spacing),
            TextSetting::LetterSpacing(text.letter_spacing),
            TextSetting::WordSpacing(text.word_spacing),
            TextSetting::ColumnWidth(text.column_width),
            TextSetting::TextGuide(text.text_guide),
            TextSetting::HighContrast(text.high_contrast),
            TextSetting::ContrastMode(text.contrast_mode),
        ] {
            entries.push((setting.key(), setting.to_json()));
        }
        entries.extend(self.speech.to_entries());
        entries
    }

    /// Text settings slice of this configuration
    pub fn text_customization(&self) -> TextCustomization {
        TextCustomization {
            line_spacing: self.line_spacing,
            paragraph_spacing: self.paragraph_spacing,
            letter_spacing: self.letter_spacing,
            word_spacing: self.word_spacing,
            column_width: self.column_width,
            text_guide: self.text_guide,
            high_contrast: self.high_contrast,
            contrast_mode: self.contrast_mode,
        }
    }

    /// Fold one text setting into the snapshot
    pub fn apply_text_setting(&mut self, setting: &TextSetting) {
        let mut text = self.text_customization();
        text.update(setting);
        self.line_spacing = text.line_spacing;
        self.paragraph_spacing = text.paragraph_spacing;
        self.letter_spacing = text.letter_spacing;
        self.word_spacing = text.word_spacing;
        self.column_width = text.column_width;
        self.text_guide = text.text_guide;
        self.high_contrast = text.high_contrast;
        self.contrast_mode = text.contrast_mode;
    }
}

/// Truthiness for persisted toggles: `"OFF"`, `false`, `"false"`, `0`, `""` and `null` are off
pub(crate) fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => {
            let s = s.trim();
            !(s.is_empty()
                || s.eq_ignore_ascii_case("off")
                || s.eq_ignore_ascii_case("false")
                || s == "0")
        }
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn as_f64(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    number.is_finite().then_some(number)
}

fn strict_f64(key: &str, value: &Value) -> EngineResult<f64> {
    as_f64(value).ok_or_else(|| EngineError::invalid(key, value))
}

/// Lenient numeric read: malformed values fall back to the default with a warning
pub(crate) fn read_f64(store: &dyn SettingsStore, key: &str) -> Option<f64> {
    let value = store.get(key)?;
    if value.is_null() {
        return None;
    }
    let number = as_f64(&value);
    if number.is_none() {
        tracing::warn!("Malformed {}: {}, using default", key, value);
    }
    number
}

pub(crate) fn clamp_f64(value: f64, (min, max): (f64, f64)) -> f64 {
    value.clamp(min, max)
}

fn to_px(value: f64) -> u32 {
    value.round().clamp(0.0, u32::MAX as f64) as u32
}

fn to_column(value: f64) -> u32 {
    (value.round() as i64).clamp(COLUMN_RANGE.0 as i64, COLUMN_RANGE.1 as i64) as u32
}

fn parse_contrast(value: &Value) -> ContrastMode {
    match value.as_str() {
        Some(s) if s.trim().eq_ignore_ascii_case("inverted") => ContrastMode::Inverted,
        _ => ContrastMode::Normal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[test]
    fn test_filter_ids() {
        assert_eq!(
            FilterType::Dark.style_id().as_deref(),
            Some("eyebrowse-dark-mode-style")
        );
        assert_eq!(
            FilterType::Protanopia.container_id().as_deref(),
            Some("eyebrowse-protanopia-filter")
        );
        assert_eq!(FilterType::Grayscale.svg_filter_id(), None);
        assert_eq!(FilterType::Off.style_id(), None);
        assert_eq!("deuteranopia".parse::<FilterType>().unwrap(), FilterType::Deuteranopia);
        assert!("SEPIA".parse::<FilterType>().is_err());
    }

    #[test]
    fn test_font_choice_wire_names() {
        assert_eq!(FontChoice::from("comic-sans"), FontChoice::ComicSans);
        assert_eq!(FontChoice::from("OpenDyslexic"), FontChoice::OpenDyslexic);
        assert_eq!(FontChoice::from(""), FontChoice::Default);
        assert_eq!(
            FontChoice::from("Times New Roman").slug(),
            "times-new-roman"
        );
        let json = serde_json::to_value(FontChoice::ComicSans).unwrap();
        assert_eq!(json, json!("comic-sans"));
    }

    #[test]
    fn test_truthiness() {
        for off in [json!("OFF"), json!(false), json!("false"), json!(0), Value::Null, json!("")] {
            assert!(!truthy(&off), "{} should be off", off);
        }
        for on in [json!(true), json!("ON"), json!(1), json!("true")] {
            assert!(truthy(&on), "{} should be on", on);
        }
    }

    #[test]
    fn test_load_clamps_and_defaults() {
        let store = MemoryStore::from_value(json!({
            "focusMode": "PROTANOPIA",
            "fontPreference": "arial",
            "textSize": 1.5,
            "lineSpacing": 7,
            "letterSpacing": -3,
            "wordSpacing": "4",
            "zoomFactor": "not a number",
            "textGuide": "OFF",
            "highContrast": true,
            "contrastMode": "inverted",
        }));
        let config = Configuration::load(&store);
        assert_eq!(config.filter, FilterType::Protanopia);
        assert_eq!(config.font, FontChoice::Arial);
        assert!((config.text_size_factor - 1.5).abs() < 1e-9);
        assert_eq!(config.line_spacing, 3.0);
        assert_eq!(config.letter_spacing, 0);
        assert_eq!(config.word_spacing, 4);
        assert_eq!(config.zoom_factor, 1.0);
        assert!(!config.text_guide);
        assert!(config.high_contrast);
        assert_eq!(config.contrast_mode, ContrastMode::Inverted);
    }

    #[test]
    fn test_save_then_load() {
        let mut store = MemoryStore::new();
        let mut config = Configuration {
            filter: FilterType::Dark,
            zoom_factor: 1.25,
            ..Configuration::default()
        };
        config.apply_text_setting(&TextSetting::ColumnWidth(80));
        config.save(&mut store).unwrap();
        assert_eq!(Configuration::load(&store), config);
    }

    #[test]
    fn test_text_size_stored_as_factor() {
        let config = Configuration {
            text_size_factor: 1.3,
            ..Configuration::default()
        };
        let entries = config.to_entries();
        let stored = entries.iter().find(|(key, _)| *key == keys::TEXT_SIZE).unwrap();
        assert_eq!(stored.1, json!(1.3));

        let reset = MemoryStore::from_value(json!({"textSize": 1.0}));
        assert_eq!(Configuration::load(&reset).text_size_factor, 1.0);
        let huge = MemoryStore::from_value(json!({"textSize": 150}));
        assert_eq!(Configuration::load(&huge).text_size_factor, 10.0);
    }

    #[test]
    fn test_activity_rule() {
        let mut text = TextCustomization::default();
        assert!(!text.is_active());
        text.update(&TextSetting::ContrastMode(ContrastMode::Inverted));
        assert!(!text.is_active());
        text.update(&TextSetting::LetterSpacing(2));
        assert!(text.is_active());
    }

    #[test]
    fn test_text_setting_parse() {
        assert_eq!(
            TextSetting::parse("lineSpacing", &json!("1.5")).unwrap(),
            TextSetting::LineSpacing(1.5)
        );
        assert!(matches!(
            TextSetting::parse("lineSpacing", &json!("abc")),
            Err(EngineError::InvalidValue { .. })
        ));
        assert!(matches!(
            TextSetting::parse("fontWeight", &json!(700)),
            Err(EngineError::UnknownSetting(_))
        ));
        assert_eq!(
            TextSetting::parse("textGuide", &json!("OFF")).unwrap(),
            TextSetting::TextGuide(false)
        );
    }
}
