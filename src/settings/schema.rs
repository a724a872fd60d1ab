//! Declared setting keys
//!
//! Every mutable key carries a declared kind (color, bounded number,
//! enumerated choice, toggle, free text) and a default. Validation happens
//! once, at the state-manager boundary: numeric values clamp to their range
//! with a warning, invalid enum and color values are rejected outright.

use std::collections::BTreeMap;

use crate::error::SyncError;
use crate::settings::value::{SettingValue, is_valid_color};

#[derive(Debug, Clone)]
pub enum SettingKind {
    /// Hex or rgb()/rgba() color literal
    Color,
    /// Number clamped into an inclusive range
    Number { min: f64, max: f64 },
    /// One of a fixed set of string options
    Choice(&'static [&'static str]),
    Toggle,
    Text,
}

#[derive(Debug, Clone)]
pub struct SettingSpec {
    pub kind: SettingKind,
    pub default: SettingValue,
}

/// Result of validating one value against its spec
#[derive(Debug, Clone)]
pub struct Checked {
    pub value: SettingValue,
    /// Present when a numeric value was clamped into range
    pub clamp_warning: Option<String>,
}

/// Registry of all declared setting keys
#[derive(Debug, Clone)]
pub struct Schema {
    specs: BTreeMap<String, SettingSpec>,
}

const TEXT_TRANSFORMS: &[&str] = &["none", "uppercase", "lowercase", "capitalize"];
const SHADOW_INTENSITIES: &[&str] = &["none", "subtle", "medium", "strong"];
const SHADOW_DIRECTIONS: &[&str] = &["top", "right", "bottom", "left", "center"];
const HEIGHT_MODES: &[&str] = &["full", "content"];

impl Schema {
    /// The theming core's key registry, mirroring the server's defaults
    pub fn core() -> Self {
        let mut schema = Schema {
            specs: BTreeMap::new(),
        };

        // Admin bar
        schema.color("admin_bar.bg_color", "#23282d");
        schema.color("admin_bar.text_color", "#ffffff");
        schema.number("admin_bar.height", 32.0, 20.0, 100.0);

        // Admin menu
        schema.color("admin_menu.bg_color", "#23282d");
        schema.color("admin_menu.text_color", "#ffffff");
        schema.color("admin_menu.hover_bg_color", "#191e23");
        schema.color("admin_menu.hover_text_color", "#00b9eb");
        schema.number("admin_menu.width", 160.0, 120.0, 400.0);
        schema.choice("admin_menu.height_mode", "full", HEIGHT_MODES);
        schema.text_key("admin_menu.item_padding", "6px 12px");
        schema.number("admin_menu.font_size", 13.0, 10.0, 20.0);
        schema.number("admin_menu.line_height", 18.0, 12.0, 30.0);

        // Typography, one group per surface
        for group in ["admin_bar", "admin_menu", "content"] {
            schema.number(format!("typography.{group}.font_size"), 13.0, 10.0, 24.0);
            schema.number(format!("typography.{group}.font_weight"), 400.0, 100.0, 900.0);
            schema.number(format!("typography.{group}.line_height"), 1.5, 1.0, 3.0);
            schema.number(format!("typography.{group}.letter_spacing"), 0.0, -5.0, 10.0);
            schema.choice(
                format!("typography.{group}.text_transform"),
                "none",
                TEXT_TRANSFORMS,
            );
            schema.text_key(format!("typography.{group}.font_family"), "system");
        }

        // Visual effects per surface
        for surface in ["admin_bar", "admin_menu"] {
            schema.toggle(format!("visual_effects.{surface}.glassmorphism"), false);
            schema.number(format!("visual_effects.{surface}.blur_intensity"), 20.0, 0.0, 50.0);
            schema.toggle(format!("visual_effects.{surface}.floating"), false);
            schema.number(format!("visual_effects.{surface}.floating_margin"), 8.0, 0.0, 32.0);
            schema.number(format!("visual_effects.{surface}.border_radius"), 0.0, 0.0, 30.0);
            schema.choice(
                format!("visual_effects.{surface}.shadow_intensity"),
                "none",
                SHADOW_INTENSITIES,
            );
            schema.choice(
                format!("visual_effects.{surface}.shadow_direction"),
                "bottom",
                SHADOW_DIRECTIONS,
            );
            schema.number(format!("visual_effects.{surface}.shadow_blur"), 10.0, 0.0, 50.0);
            schema.color(
                format!("visual_effects.{surface}.shadow_color"),
                "rgba(0, 0, 0, 0.15)",
            );
        }

        // Dark mode master toggle
        schema.toggle("dark_mode.enabled", false);

        // Currently applied bundles
        schema.text_key("palettes.current", "professional-blue");
        schema.text_key("templates.current", "default");

        schema
    }

    pub fn spec(&self, key: &str) -> Option<&SettingSpec> {
        self.specs.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.specs.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.specs.keys().map(String::as_str)
    }

    /// Default value for every declared key
    pub fn defaults(&self) -> Vec<(String, SettingValue)> {
        self.specs
            .iter()
            .map(|(k, spec)| (k.clone(), spec.default.clone()))
            .collect()
    }

    /// Validate one value against the key's declared kind.
    ///
    /// Numbers clamp into range (reported via `clamp_warning`), everything
    /// else either passes unchanged or fails with a `Validation` error.
    pub fn validate(&self, key: &str, value: SettingValue) -> Result<Checked, SyncError> {
        let spec = self
            .spec(key)
            .ok_or_else(|| SyncError::validation(key, "unknown setting key"))?;

        match &spec.kind {
            SettingKind::Color => match value.as_str() {
                Some(s) if is_valid_color(s) => Ok(Checked {
                    value,
                    clamp_warning: None,
                }),
                Some(s) => Err(SyncError::validation(key, format!("'{s}' is not a valid color"))),
                None => Err(SyncError::validation(key, "expected a color string")),
            },
            SettingKind::Number { min, max } => match value.as_number() {
                Some(n) if n < *min => Ok(Checked {
                    value: SettingValue::Number(*min),
                    clamp_warning: Some(format!("{n} below minimum, clamped to {min}")),
                }),
                Some(n) if n > *max => Ok(Checked {
                    value: SettingValue::Number(*max),
                    clamp_warning: Some(format!("{n} exceeds maximum, clamped to {max}")),
                }),
                Some(_) => Ok(Checked {
                    value,
                    clamp_warning: None,
                }),
                None => Err(SyncError::validation(key, "expected a number")),
            },
            SettingKind::Choice(options) => match value.as_str() {
                Some(s) if options.contains(&s) => Ok(Checked {
                    value,
                    clamp_warning: None,
                }),
                Some(s) => Err(SyncError::validation(
                    key,
                    format!("'{s}' is not one of {options:?}"),
                )),
                None => Err(SyncError::validation(key, "expected an option string")),
            },
            SettingKind::Toggle => match value.as_bool() {
                Some(_) => Ok(Checked {
                    value,
                    clamp_warning: None,
                }),
                None => Err(SyncError::validation(key, "expected true or false")),
            },
            SettingKind::Text => match value.as_str() {
                Some(_) => Ok(Checked {
                    value,
                    clamp_warning: None,
                }),
                None => Err(SyncError::validation(key, "expected a string")),
            },
        }
    }

    fn insert(&mut self, key: impl Into<String>, kind: SettingKind, default: SettingValue) {
        self.specs.insert(key.into(), SettingSpec { kind, default });
    }

    fn color(&mut self, key: impl Into<String>, default: &str) {
        self.insert(key, SettingKind::Color, SettingValue::text(default));
    }

    fn number(&mut self, key: impl Into<String>, default: f64, min: f64, max: f64) {
        self.insert(key, SettingKind::Number { min, max }, SettingValue::Number(default));
    }

    fn choice(&mut self, key: impl Into<String>, default: &str, options: &'static [&'static str]) {
        self.insert(key, SettingKind::Choice(options), SettingValue::text(default));
    }

    fn toggle(&mut self, key: impl Into<String>, default: bool) {
        self.insert(key, SettingKind::Toggle, SettingValue::Toggle(default));
    }

    fn text_key(&mut self, key: impl Into<String>, default: &str) {
        self.insert(key, SettingKind::Text, SettingValue::text(default));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_schema_has_admin_bar_keys() {
        let schema = Schema::core();
        assert!(schema.contains("admin_bar.bg_color"));
        assert!(schema.contains("admin_bar.height"));
        assert!(schema.contains("typography.content.font_size"));
        assert!(schema.contains("visual_effects.admin_menu.shadow_blur"));
        assert!(schema.contains("dark_mode.enabled"));
    }

    #[test]
    fn test_number_clamps_with_warning() {
        let schema = Schema::core();
        let checked = schema
            .validate("admin_bar.height", SettingValue::Number(500.0))
            .unwrap();
        assert_eq!(checked.value, SettingValue::Number(100.0));
        assert!(checked.clamp_warning.is_some());

        let checked = schema
            .validate("admin_bar.height", SettingValue::Number(5.0))
            .unwrap();
        assert_eq!(checked.value, SettingValue::Number(20.0));
        assert!(checked.clamp_warning.is_some());
    }

    #[test]
    fn test_number_in_range_passes_unchanged() {
        let schema = Schema::core();
        let checked = schema
            .validate("admin_bar.height", SettingValue::Number(40.0))
            .unwrap();
        assert_eq!(checked.value, SettingValue::Number(40.0));
        assert!(checked.clamp_warning.is_none());
    }

    #[test]
    fn test_invalid_choice_rejected() {
        let schema = Schema::core();
        let err = schema
            .validate("admin_menu.height_mode", SettingValue::text("sideways"))
            .unwrap_err();
        assert!(matches!(err, SyncError::Validation { .. }));
    }

    #[test]
    fn test_invalid_color_rejected() {
        let schema = Schema::core();
        let err = schema
            .validate("admin_bar.bg_color", SettingValue::text("not-a-color"))
            .unwrap_err();
        assert!(matches!(err, SyncError::Validation { .. }));
    }

    #[test]
    fn test_type_mismatch_rejected() {
        let schema = Schema::core();
        assert!(schema
            .validate("dark_mode.enabled", SettingValue::Number(1.0))
            .is_err());
        assert!(schema
            .validate("admin_bar.height", SettingValue::text("tall"))
            .is_err());
    }

    #[test]
    fn test_unknown_key_rejected() {
        let schema = Schema::core();
        assert!(schema
            .validate("no.such.key", SettingValue::Toggle(true))
            .is_err());
    }

    #[test]
    fn test_defaults_cover_every_key() {
        let schema = Schema::core();
        let defaults = schema.defaults();
        assert_eq!(defaults.len(), schema.keys().count());
        // Every default must validate against its own spec
        for (key, value) in defaults {
            let checked = schema.validate(&key, value.clone()).unwrap();
            assert_eq!(checked.value, value);
            assert!(checked.clamp_warning.is_none());
        }
    }
}
