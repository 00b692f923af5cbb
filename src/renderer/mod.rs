pub mod clock;
pub mod map;

use crate::canvas::{Canvas, FontState};
use crate::cities::{City, CITIES};
use crate::config::WidgetConfig;
use crate::locale::Language;
use crate::state::Highlight;
use crate::time_utils::ClockTime;

/// Everything one redraw needs, assembled by the event loop.
pub struct Frame<'a> {
    pub config: &'a WidgetConfig,
    pub city: &'static City,
    pub language: Language,
    pub time: &'a ClockTime,
    /// Cosmetic sub-second counter, refreshed by frame callbacks.
    pub millis: u32,
    pub offset_label: &'a str,
    pub highlight: Highlight,
    /// Minutes since UTC midnight, drives the terminator rotation.
    pub utc_minutes: u32,
    /// Night flags aligned with [`CITIES`].
    pub night: &'a [bool],
}

pub struct Marker {
    pub city: &'static City,
    pub cx: f32,
    pub cy: f32,
    pub r: f32,
}

/// Pixel geometry shared by drawing and pointer hit-testing.
pub struct Layout {
    pub width: f32,
    pub height: f32,
    pub pad: f32,
    pub clock_h: f32,
    pub map_top: f32,
    pub map_h: f32,
    pub hint_top: f32,
    pub markers: Vec<Marker>,
    /// Language toggle rect: (x, y, w, h).
    pub toggle: (f32, f32, f32, f32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitAction {
    SelectCity(&'static str),
    CycleLanguage,
}

fn clock_panel_height(font_size: f32) -> f32 {
    let pad = font_size * 0.35;
    pad + font_size * 0.5 + font_size * 1.3 + font_size * 0.5 + font_size * 0.45 + pad
}

fn hint_row_height(font_size: f32) -> f32 {
    font_size * 0.7
}

/// Window size derived from the configured font size.
pub fn compute_size(config: &WidgetConfig) -> (u32, u32) {
    let fs = config.clock.font_size.max(16.0);
    let width = (fs * 8.0).max(320.0);
    let height = clock_panel_height(fs) + width * 0.48 + hint_row_height(fs);
    (width.round() as u32, height.round() as u32)
}

pub fn layout(config: &WidgetConfig, width: u32, height: u32) -> Layout {
    let w = width as f32;
    let h = height as f32;
    let fs = config.clock.font_size.max(16.0);
    let pad = fs * 0.35;
    let clock_h = clock_panel_height(fs).min(h);
    let hint_h = hint_row_height(fs);
    let map_top = clock_h;
    let map_h = (h - clock_h - hint_h).max(0.0);
    let hint_top = map_top + map_h;

    let r = (fs * 0.28).max(10.0);
    let markers = CITIES
        .iter()
        .map(|city| Marker {
            city,
            cx: (w * city.x / 100.0).clamp(r, w - r),
            cy: (map_top + map_h * city.y / 100.0).clamp(map_top + r, (hint_top - r).max(map_top + r)),
            r,
        })
        .collect();

    let toggle_w = fs * 2.8;
    let toggle_h = hint_h * 0.8;
    let toggle = (
        w - pad - toggle_w,
        hint_top + (hint_h - toggle_h) / 2.0,
        toggle_w,
        toggle_h,
    );

    Layout {
        width: w,
        height: h,
        pad,
        clock_h,
        map_top,
        map_h,
        hint_top,
        markers,
        toggle,
    }
}

/// Map a pointer press to a widget action using the same geometry the
/// renderer draws with.
pub fn hit_test(layout: &Layout, x: f64, y: f64) -> Option<HitAction> {
    let (x, y) = (x as f32, y as f32);

    let (tx, ty, tw, th) = layout.toggle;
    if x >= tx && x <= tx + tw && y >= ty && y <= ty + th {
        return Some(HitAction::CycleLanguage);
    }

    // Slightly generous radius so small markers remain clickable.
    for marker in &layout.markers {
        let dx = x - marker.cx;
        let dy = y - marker.cy;
        if (dx * dx + dy * dy).sqrt() <= marker.r + 2.0 {
            return Some(HitAction::SelectCity(marker.city.id));
        }
    }
    None
}

pub fn render(canvas: &mut Canvas, frame: &Frame, font: &FontState) {
    let layout = layout(frame.config, canvas.width(), canvas.height());
    canvas.clear(frame.config.theme.bg_color);
    clock::render(canvas, frame, font, &layout);
    map::render(canvas, frame, font, &layout);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_layout() -> (WidgetConfig, Layout) {
        let config = WidgetConfig::default();
        let (w, h) = compute_size(&config);
        let l = layout(&config, w, h);
        (config, l)
    }

    #[test]
    fn computed_size_is_sane() {
        let config = WidgetConfig::default();
        let (w, h) = compute_size(&config);
        assert!(w >= 320);
        assert!(h > w / 2);
    }

    #[test]
    fn markers_stay_inside_the_map_panel() {
        let (_, l) = test_layout();
        assert_eq!(l.markers.len(), CITIES.len());
        for m in &l.markers {
            assert!(m.cx - m.r >= 0.0 && m.cx + m.r <= l.width, "{}", m.city.id);
            assert!(m.cy - m.r >= l.map_top && m.cy + m.r <= l.hint_top, "{}", m.city.id);
        }
    }

    #[test]
    fn every_marker_is_clickable_at_its_centre() {
        let (_, l) = test_layout();
        for m in &l.markers {
            // Markers may overlap where cities are dense; the hit must at
            // least resolve to some city, and an isolated marker to itself.
            match hit_test(&l, m.cx as f64, m.cy as f64) {
                Some(HitAction::SelectCity(_)) => {}
                other => panic!("{} hit produced {:?}", m.city.id, other),
            }
        }
    }

    #[test]
    fn toggle_rect_is_clickable() {
        let (_, l) = test_layout();
        let (tx, ty, tw, th) = l.toggle;
        let hit = hit_test(&l, (tx + tw / 2.0) as f64, (ty + th / 2.0) as f64);
        assert_eq!(hit, Some(HitAction::CycleLanguage));
    }

    #[test]
    fn clock_panel_is_not_interactive() {
        let (_, l) = test_layout();
        assert_eq!(hit_test(&l, (l.width / 2.0) as f64, (l.pad) as f64), None);
    }
}
