use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct WidgetConfig {
    #[serde(default)]
    pub window: WindowConfig,
    #[serde(default)]
    pub clock: ClockSettings,
    #[serde(default)]
    pub theme: ThemeConfig,
    #[serde(default)]
    pub widget: WidgetSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowConfig {
    #[serde(default = "default_layer")]
    pub layer: String,
    #[serde(default = "default_anchor")]
    pub anchor: String,
    #[serde(default = "default_margin")]
    pub margin_top: i32,
    #[serde(default)]
    pub margin_bottom: i32,
    #[serde(default)]
    pub margin_left: i32,
    #[serde(default = "default_margin")]
    pub margin_right: i32,
    #[serde(default = "default_opacity")]
    pub opacity: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClockSettings {
    #[serde(default = "default_font")]
    pub font: String,
    #[serde(default = "default_font_size")]
    pub font_size: f32,
    #[serde(default = "default_true")]
    pub show_date: bool,
    #[serde(default = "default_true")]
    pub show_millis: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThemeConfig {
    #[serde(default = "default_fg_color", deserialize_with = "deserialize_color")]
    pub fg_color: [u8; 4],
    #[serde(default = "default_bg_color", deserialize_with = "deserialize_color")]
    pub bg_color: [u8; 4],
    #[serde(default = "default_accent_color", deserialize_with = "deserialize_color")]
    pub accent_color: [u8; 4],
    #[serde(default = "default_second_flash", deserialize_with = "deserialize_color")]
    pub second_flash_color: [u8; 4],
    #[serde(default = "default_minute_flash", deserialize_with = "deserialize_color")]
    pub minute_flash_color: [u8; 4],
    #[serde(default = "default_map_color", deserialize_with = "deserialize_color")]
    pub map_color: [u8; 4],
    #[serde(default = "default_marker_day", deserialize_with = "deserialize_color")]
    pub marker_day_color: [u8; 4],
    #[serde(default = "default_marker_night", deserialize_with = "deserialize_color")]
    pub marker_night_color: [u8; 4],
    #[serde(default = "default_terminator", deserialize_with = "deserialize_color")]
    pub terminator_color: [u8; 4],
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WidgetSettings {
    /// City shown at startup. Runtime selection is never written back.
    #[serde(default = "default_city_id")]
    pub default_city: String,
    /// BCP-47 code of the startup language; unknown codes degrade to en-US.
    #[serde(default = "default_language")]
    pub default_language: String,
}

// Defaults

fn default_layer() -> String { "top".into() }
fn default_anchor() -> String { "top right".into() }
fn default_margin() -> i32 { 20 }
fn default_true() -> bool { true }
fn default_opacity() -> f32 { 1.0 }
fn default_font() -> String { "monospace".into() }
fn default_font_size() -> f32 { 44.0 }
fn default_city_id() -> String { "seoul".into() }
fn default_language() -> String { "ko-KR".into() }

fn default_fg_color() -> [u8; 4] { [0xF5, 0xF5, 0xF5, 0xFF] }
fn default_bg_color() -> [u8; 4] { [0x10, 0x14, 0x24, 0xE6] }
fn default_accent_color() -> [u8; 4] { [0x7F, 0xB4, 0xFF, 0xFF] }
fn default_second_flash() -> [u8; 4] { [0xFF, 0xD7, 0x6B, 0xFF] }
fn default_minute_flash() -> [u8; 4] { [0xFF, 0x6B, 0x6B, 0xFF] }
fn default_map_color() -> [u8; 4] { [0x1B, 0x24, 0x40, 0xFF] }
fn default_marker_day() -> [u8; 4] { [0xFF, 0xC9, 0x4D, 0xFF] }
fn default_marker_night() -> [u8; 4] { [0x41, 0x50, 0x75, 0xFF] }
fn default_terminator() -> [u8; 4] { [0x8A, 0x9C, 0xC9, 0x66] }

fn deserialize_color<'de, D: Deserializer<'de>>(d: D) -> Result<[u8; 4], D::Error> {
    let s = String::deserialize(d)?;
    parse_color(&s).map_err(serde::de::Error::custom)
}

pub fn parse_color(s: &str) -> Result<[u8; 4]> {
    let s = s.trim_start_matches('#');
    anyhow::ensure!(s.len() == 6 || s.len() == 8, "Color must be RRGGBB or RRGGBBAA");
    let r = u8::from_str_radix(&s[0..2], 16)?;
    let g = u8::from_str_radix(&s[2..4], 16)?;
    let b = u8::from_str_radix(&s[4..6], 16)?;
    let a = if s.len() == 8 { u8::from_str_radix(&s[6..8], 16)? } else { 0xFF };
    Ok([r, g, b, a])
}

// Implementations

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            layer: default_layer(),
            anchor: default_anchor(),
            margin_top: default_margin(),
            margin_bottom: 0,
            margin_left: 0,
            margin_right: default_margin(),
            opacity: default_opacity(),
        }
    }
}

impl Default for ClockSettings {
    fn default() -> Self {
        Self {
            font: default_font(),
            font_size: default_font_size(),
            show_date: true,
            show_millis: true,
        }
    }
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            fg_color: default_fg_color(),
            bg_color: default_bg_color(),
            accent_color: default_accent_color(),
            second_flash_color: default_second_flash(),
            minute_flash_color: default_minute_flash(),
            map_color: default_map_color(),
            marker_day_color: default_marker_day(),
            marker_night_color: default_marker_night(),
            terminator_color: default_terminator(),
        }
    }
}

impl Default for WidgetSettings {
    fn default() -> Self {
        Self {
            default_city: default_city_id(),
            default_language: default_language(),
        }
    }
}

pub fn default_config_path() -> PathBuf {
    dirs_path().join("config.toml")
}

fn dirs_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
            PathBuf::from(home).join(".config")
        });
    base.join("chronomap")
}

pub fn load_config(path: &std::path::Path) -> Result<WidgetConfig> {
    if !path.exists() {
        log::info!("Config file not found at {}, generating default", path.display());
        let content = generate_default_config();
        if let Some(parent) = path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        match std::fs::write(path, &content) {
            Ok(()) => log::info!("Created default config at {}", path.display()),
            Err(e) => log::warn!("Failed to write default config: {}", e),
        }
        return Ok(WidgetConfig::default());
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config: {}", path.display()))?;
    let config: WidgetConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config: {}", path.display()))?;
    Ok(config)
}

fn generate_default_config() -> String {
    r#"# chronomap — Wayland layer-shell world-clock widget
# Configuration file — generated automatically on first run.
# Uncomment and edit values to customise. Defaults are shown.

[window]
# Layer: background | bottom | top | overlay
layer  = "top"
# Anchor edges: top | bottom | left | right (space-separated)
anchor = "top right"
# Margins from anchored edges (px)
margin_top    = 20
margin_right  = 20
margin_bottom = 0
margin_left   = 0
# Window opacity 0.0–1.0
opacity = 1.0

[clock]
# Font: system font name or path to .ttf/.otf
font = "monospace"
# Main time text size in px (window auto-sizes to fit)
font_size = 44.0
# Show the long-form date line
show_date = true
# Show the millisecond counter next to the digits
show_millis = true

[theme]
# Colours in RRGGBB or RRGGBBAA hex (# prefix optional)
fg_color           = "F5F5F5FF"
bg_color           = "101424E6"
accent_color       = "7FB4FFFF"
# Digit flash on second / minute rollover
second_flash_color = "FFD76BFF"
minute_flash_color = "FF6B6BFF"
# Map panel
map_color          = "1B2440FF"
marker_day_color   = "FFC94DFF"
marker_night_color = "415075FF"
terminator_color   = "8A9CC966"

[widget]
# City shown at startup (see `chronomapctl cities` for ids)
default_city = "seoul"
# Startup UI language: ko-KR | en-US | ja-JP
default_language = "ko-KR"
"#.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_default_parses_back() {
        let config: WidgetConfig = toml::from_str(&generate_default_config()).unwrap();
        assert_eq!(config.widget.default_city, "seoul");
        assert_eq!(config.widget.default_language, "ko-KR");
        assert_eq!(config.window.anchor, "top right");
    }

    #[test]
    fn partial_config_fills_defaults() {
        let config: WidgetConfig = toml::from_str(
            r#"
            [widget]
            default_city = "tokyo"
            "#,
        )
        .unwrap();
        assert_eq!(config.widget.default_city, "tokyo");
        assert_eq!(config.widget.default_language, "ko-KR");
        assert_eq!(config.clock.font_size, 44.0);
        assert!(config.clock.show_millis);
    }

    #[test]
    fn empty_config_is_valid() {
        let config: WidgetConfig = toml::from_str("").unwrap();
        assert_eq!(config.window.margin_top, 20);
    }

    #[test]
    fn color_parsing() {
        assert_eq!(parse_color("#FF6B6B").unwrap(), [0xFF, 0x6B, 0x6B, 0xFF]);
        assert_eq!(parse_color("8A9CC966").unwrap(), [0x8A, 0x9C, 0xC9, 0x66]);
        assert!(parse_color("nope").is_err());
        assert!(parse_color("FFF").is_err());
    }
}
