//! First-run setup profile
//!
//! Maps the answers of the setup wizard onto a [`Configuration`].

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::config::{Configuration, ContrastMode, FilterType, FontChoice};
use crate::store::{SettingsStore, StoreError};

/// Sensitivity above which high contrast is turned on
const HIGH_CONTRAST_THRESHOLD: u8 = 7;

/// Smallest text size for readers reporting small text
const SMALL_TEXT_MIN_FACTOR: f64 = 1.2;

/// Wizard answers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SetupProfile {
    /// `none`, `achromatopsia`, `grayscale`, `protanopia`, `deuteranopia` or `tritanopia`
    pub color_vision: String,
    /// Any of `dyslexia`, `small-text`, `focus`, `tracking`
    pub reading_difficulties: Vec<String>,
    pub font_preference: FontChoice,
    /// 1 to 10
    pub brightness_sensitivity: u8,
    /// Percentage
    pub text_size: u32,
    pub dark_mode: bool,
}

impl Default for SetupProfile {
    fn default() -> Self {
        Self {
            color_vision: "none".to_string(),
            reading_difficulties: Vec::new(),
            font_preference: FontChoice::Default,
            brightness_sensitivity: 5,
            text_size: 100,
            dark_mode: false,
        }
    }
}

impl SetupProfile {
    fn has_difficulty(&self, name: &str) -> bool {
        self.reading_difficulties
            .iter()
            .any(|d| d.eq_ignore_ascii_case(name))
    }

    fn filter(&self) -> FilterType {
        let vision = self.color_vision.trim().to_ascii_lowercase();
        match vision.as_str() {
            "achromatopsia" | "grayscale" => FilterType::Grayscale,
            "" | "none" => {
                if self.has_difficulty("focus") {
                    FilterType::Grayscale
                } else if self.dark_mode {
                    FilterType::Dark
                } else {
                    FilterType::Off
                }
            }
            other => other.parse().unwrap_or_else(|_| {
                tracing::warn!("Unknown color vision type {:?}", other);
                FilterType::Off
            }),
        }
    }

    /// Configuration implied by the answers
    pub fn to_configuration(&self) -> Configuration {
        let mut text_size = f64::from(self.text_size.max(1)) / 100.0;
        let mut config = Configuration::default();

        if self.has_difficulty("dyslexia") {
            config.line_spacing = 1.5;
            config.letter_spacing = 2;
            config.word_spacing = 4;
        } else if self.has_difficulty("small-text") {
            text_size = text_size.max(SMALL_TEXT_MIN_FACTOR);
        }

        config.filter = self.filter();
        config.font = self.font_preference.clone();
        config.text_size_factor = text_size;
        config.zoom_factor = text_size;
        config.text_guide = self.has_difficulty("tracking");
        config.high_contrast = self.brightness_sensitivity > HIGH_CONTRAST_THRESHOLD;
        config.contrast_mode = if self.dark_mode {
            ContrastMode::Inverted
        } else {
            ContrastMode::Normal
        };
        config
    }

    /// Persist the answers and the configuration they imply
    pub fn save(&self, store: &mut dyn SettingsStore) -> Result<Configuration, StoreError> {
        let config = self.to_configuration();
        config.save(store)?;
        store.set_many(vec![
            ("userSetup", json!(true)),
            ("colorVisionType", json!(self.color_vision)),
            ("readingDifficulties", json!(self.reading_difficulties)),
            ("brightnessSensitivity", json!(self.brightness_sensitivity)),
            ("darkMode", json!(self.dark_mode)),
        ])?;
        tracing::info!("Setup profile saved (filter {})", config.filter);
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_precedence() {
        let mut profile = SetupProfile {
            color_vision: "achromatopsia".into(),
            dark_mode: true,
            ..SetupProfile::default()
        };
        assert_eq!(profile.to_configuration().filter, FilterType::Grayscale);

        profile.color_vision = "tritanopia".into();
        assert_eq!(profile.to_configuration().filter, FilterType::Tritanopia);

        profile.color_vision = "none".into();
        profile.reading_difficulties = vec!["focus".into()];
        assert_eq!(profile.to_configuration().filter, FilterType::Grayscale);

        profile.reading_difficulties.clear();
        assert_eq!(profile.to_configuration().filter, FilterType::Dark);
    }

    #[test]
    fn test_dyslexia_wins_over_small_text() {
        let profile = SetupProfile {
            reading_difficulties: vec!["dyslexia".into(), "small-text".into()],
            text_size: 110,
            ..SetupProfile::default()
        };
        let config = profile.to_configuration();
        assert_eq!(config.line_spacing, 1.5);
        assert_eq!(config.letter_spacing, 2);
        assert_eq!(config.word_spacing, 4);
        assert!((config.text_size_factor - 1.1).abs() < 1e-9);
    }

    #[test]
    fn test_small_text_minimum() {
        let profile = SetupProfile {
            reading_difficulties: vec!["small-text".into(), "tracking".into()],
            brightness_sensitivity: 8,
            dark_mode: true,
            ..SetupProfile::default()
        };
        let config = profile.to_configuration();
        assert!((config.text_size_factor - 1.2).abs() < 1e-9);
        assert_eq!(config.zoom_factor, config.text_size_factor);
        assert!(config.text_guide);
        assert!(config.high_contrast);
        assert_eq!(config.contrast_mode, ContrastMode::Inverted);
    }

    #[test]
    fn test_deserialize_wizard_json() {
        let profile: SetupProfile = serde_json::from_value(json!({
            "colorVision": "protanopia",
            "fontPreference": "opendyslexic",
            "textSize": 130,
        }))
        .unwrap();
        assert_eq!(profile.font_preference, FontChoice::OpenDyslexic);
        assert_eq!(profile.brightness_sensitivity, 5);
        assert_eq!(profile.to_configuration().filter, FilterType::Protanopia);
    }
}
