//! Settings: persisted key/value configuration pairs.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// A single persisted setting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Setting {
  pub key:   String,
  pub value: String,
}

/// Seeded at first initialisation; never overwrites an existing value.
pub const SEEDED_SETTINGS: &[(&str, &str)] = &[
  ("theme", "dark"),
  ("map_style", "dark"),
  ("default_view", "dashboard"),
];

// ─── Preferences ─────────────────────────────────────────────────────────────

pub const THEME: &str = "theme";
pub const MAP_STYLE: &str = "map_style";
pub const FONT_SIZE: &str = "font_size";
pub const ACCENT_COLOR: &str = "accent_color";
pub const ZOOM_LEVEL: &str = "zoom_level";
pub const SHOW_LABELS: &str = "show_labels";
pub const DEFAULT_VIEW: &str = "default_view";
pub const DEFAULT_PAGE: &str = "default_page";
pub const REFRESH_INTERVAL: &str = "refresh_interval";
pub const SHOW_SPLASH: &str = "show_splash";

/// Every preference key with its default, in display order.
/// `reset_settings` writes exactly this table.
pub const PREFERENCE_DEFAULTS: &[(&str, &str)] = &[
  (THEME, "dark"),
  (MAP_STYLE, "dark"),
  (FONT_SIZE, "12"),
  (ACCENT_COLOR, "#0066cc"),
  (ZOOM_LEVEL, "10"),
  (SHOW_LABELS, "true"),
  (DEFAULT_VIEW, "dashboard"),
  (DEFAULT_PAGE, "Dashboard"),
  (REFRESH_INTERVAL, "5"),
  (SHOW_SPLASH, "true"),
];

/// Typed read model over the settings table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
  pub theme:            String,
  pub map_style:        String,
  pub font_size:        u32,
  pub accent_color:     String,
  pub zoom_level:       u32,
  pub show_labels:      bool,
  pub default_view:     String,
  pub default_page:     String,
  /// Dashboard auto-refresh period, in seconds.
  pub refresh_interval: u64,
  pub show_splash:      bool,
}

impl Default for Preferences {
  fn default() -> Self { Self::from_settings(&[]) }
}

impl Preferences {
  /// Build from whatever settings are stored. Missing or unparseable values
  /// fall back to [`PREFERENCE_DEFAULTS`].
  pub fn from_settings(settings: &[Setting]) -> Self {
    let raw = |key: &str| lookup(settings, key);
    let parsed = |key: &str| -> Option<u64> { raw(key).trim().parse().ok() };
    let default_num =
      |key: &str| -> u64 { default_for(key).and_then(|v| v.parse().ok()).unwrap_or(0) };
    let small = |key: &str| -> u32 {
      parsed(key)
        .and_then(|n| u32::try_from(n).ok())
        .or_else(|| u32::try_from(default_num(key)).ok())
        .unwrap_or_default()
    };

    Self {
      theme:            raw(THEME).to_owned(),
      map_style:        raw(MAP_STYLE).to_owned(),
      font_size:        small(FONT_SIZE),
      accent_color:     raw(ACCENT_COLOR).to_owned(),
      zoom_level:       small(ZOOM_LEVEL),
      show_labels:      raw(SHOW_LABELS) == "true",
      default_view:     raw(DEFAULT_VIEW).to_owned(),
      default_page:     raw(DEFAULT_PAGE).to_owned(),
      refresh_interval: parsed(REFRESH_INTERVAL)
        .filter(|&n| n > 0)
        .unwrap_or(default_num(REFRESH_INTERVAL)),
      show_splash:      raw(SHOW_SPLASH) == "true",
    }
  }

  pub fn refresh_period(&self) -> Duration { Duration::from_secs(self.refresh_interval) }
}

fn lookup<'a>(settings: &'a [Setting], key: &str) -> &'a str {
  settings
    .iter()
    .find(|s| s.key == key)
    .map(|s| s.value.as_str())
    .or_else(|| default_for(key))
    .unwrap_or_default()
}

/// The default value for a known preference key.
pub fn default_for(key: &str) -> Option<&'static str> {
  PREFERENCE_DEFAULTS
    .iter()
    .find(|(k, _)| *k == key)
    .map(|(_, v)| *v)
}

#[cfg(test)]
mod tests {
  use super::*;

  fn setting(key: &str, value: &str) -> Setting {
    Setting { key: key.into(), value: value.into() }
  }

  #[test]
  fn defaults_when_nothing_stored() {
    let p = Preferences::default();
    assert_eq!(p.theme, "dark");
    assert_eq!(p.font_size, 12);
    assert_eq!(p.refresh_interval, 5);
    assert!(p.show_labels);
    assert_eq!(p.refresh_period(), Duration::from_secs(5));
  }

  #[test]
  fn stored_values_override_defaults() {
    let p = Preferences::from_settings(&[
      setting(THEME, "light"),
      setting(REFRESH_INTERVAL, "30"),
      setting(SHOW_SPLASH, "false"),
    ]);
    assert_eq!(p.theme, "light");
    assert_eq!(p.refresh_interval, 30);
    assert!(!p.show_splash);
  }

  #[test]
  fn garbage_numbers_fall_back() {
    let p = Preferences::from_settings(&[
      setting(FONT_SIZE, "huge"),
      setting(REFRESH_INTERVAL, "0"),
    ]);
    assert_eq!(p.font_size, 12);
    assert_eq!(p.refresh_interval, 5);
  }

  #[test]
  fn oversized_numbers_fall_back_instead_of_truncating() {
    let p = Preferences::from_settings(&[
      setting(FONT_SIZE, "4294967308"),
      setting(ZOOM_LEVEL, "4294967306"),
    ]);
    assert_eq!(p.font_size, 12);
    assert_eq!(p.zoom_level, 10);
  }

  #[test]
  fn seeded_keys_are_preferences() {
    for (key, value) in SEEDED_SETTINGS {
      assert_eq!(default_for(key), Some(*value));
    }
  }
}
