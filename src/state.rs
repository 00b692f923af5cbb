use std::time::{Duration, Instant};

use crate::cities::{self, City};
use crate::locale::Language;

/// Transient digit highlight. Minute rollover wins over second rollover
/// when both happen on the same tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Highlight {
    None,
    Second,
    Minute,
}

/// Mutable widget selection state. Only ever touched on the UI thread.
pub struct WidgetState {
    pub city: &'static City,
    pub language: Language,
    prev_minute: Option<u32>,
    prev_second: Option<u32>,
    pub highlight: Highlight,
    highlight_since: Option<Instant>,
}

impl WidgetState {
    pub fn new(city: &'static City, language: Language) -> Self {
        Self {
            city,
            language,
            prev_minute: None,
            prev_second: None,
            highlight: Highlight::None,
            highlight_since: None,
        }
    }

    /// Switch the active city. Unknown ids are rejected and leave the
    /// selection untouched.
    pub fn select_city(&mut self, id: &str) -> bool {
        match cities::find(id) {
            Some(city) => {
                self.city = city;
                true
            }
            None => false,
        }
    }

    pub fn cycle_language(&mut self) {
        self.language = self.language.next();
    }

    /// Compare this tick's formatted minute/second against the previous
    /// tick and pick the highlight. The first observation never flashes.
    pub fn observe(&mut self, minute: u32, second: u32) {
        if self.prev_minute.is_some_and(|m| m != minute) {
            self.highlight = Highlight::Minute;
            self.highlight_since = Some(Instant::now());
        } else if self.prev_second.is_some_and(|s| s != second) {
            self.highlight = Highlight::Second;
            self.highlight_since = Some(Instant::now());
        }
        self.prev_minute = Some(minute);
        self.prev_second = Some(second);
    }

    /// Clear the highlight once its animation has run its course. Called
    /// from frame callbacks; returns true when something was cleared.
    pub fn expire_highlight(&mut self, animation: Duration) -> bool {
        match self.highlight_since {
            Some(since) if since.elapsed() >= animation => {
                self.highlight = Highlight::None;
                self.highlight_since = None;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cities::default_city;

    fn state() -> WidgetState {
        WidgetState::new(default_city(), Language::Korean)
    }

    #[test]
    fn first_observation_never_highlights() {
        let mut s = state();
        s.observe(30, 15);
        assert_eq!(s.highlight, Highlight::None);
    }

    #[test]
    fn second_rollover_flashes_second() {
        let mut s = state();
        s.observe(30, 15);
        s.observe(30, 16);
        assert_eq!(s.highlight, Highlight::Second);
    }

    #[test]
    fn minute_rollover_beats_second_rollover() {
        let mut s = state();
        s.observe(30, 59);
        // Both fields change on this tick; minute takes precedence.
        s.observe(31, 0);
        assert_eq!(s.highlight, Highlight::Minute);
    }

    #[test]
    fn unchanged_tick_keeps_previous_highlight() {
        let mut s = state();
        s.observe(30, 15);
        s.observe(30, 16);
        // A render with identical fields (e.g. forced redraw) must not
        // re-trigger or clear anything.
        s.observe(30, 16);
        assert_eq!(s.highlight, Highlight::Second);
    }

    #[test]
    fn highlight_expires_after_animation() {
        let mut s = state();
        s.observe(30, 15);
        s.observe(30, 16);
        assert!(s.expire_highlight(Duration::ZERO));
        assert_eq!(s.highlight, Highlight::None);
        // Nothing left to clear.
        assert!(!s.expire_highlight(Duration::ZERO));
    }

    #[test]
    fn highlight_survives_until_animation_ends() {
        let mut s = state();
        s.observe(30, 15);
        s.observe(31, 0);
        assert!(!s.expire_highlight(Duration::from_secs(3600)));
        assert_eq!(s.highlight, Highlight::Minute);
    }

    #[test]
    fn select_city_rejects_unknown() {
        let mut s = state();
        assert!(!s.select_city("atlantis"));
        assert_eq!(s.city.id, default_city().id);
        assert!(s.select_city("tokyo"));
        assert_eq!(s.city.id, "tokyo");
    }

    #[test]
    fn language_cycles_through_all() {
        let mut s = state();
        s.cycle_language();
        assert_eq!(s.language, Language::English);
        s.cycle_language();
        assert_eq!(s.language, Language::Japanese);
        s.cycle_language();
        assert_eq!(s.language, Language::Korean);
    }
}
