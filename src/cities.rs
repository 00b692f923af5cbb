use chrono_tz::Tz;

use crate::locale::Language;

/// A selectable city on the map. The table is fixed at compile time.
#[derive(Debug)]
pub struct City {
    pub id: &'static str,
    pub abbr: &'static str,
    pub tz: Tz,
    /// Marker position in percent of the map panel (x rightward, y downward).
    pub x: f32,
    pub y: f32,
    /// Localized names, indexed by [`Language::index`].
    names: [&'static str; 3],
}

impl City {
    pub fn name(&self, language: Language) -> &'static str {
        self.names[language.index()]
    }
}

pub const DEFAULT_CITY_ID: &str = "seoul";

pub static CITIES: &[City] = &[
    City {
        id: "seoul",
        abbr: "SEL",
        tz: chrono_tz::Asia::Seoul,
        x: 50.0,
        y: 44.0,
        names: ["서울", "Seoul", "ソウル"],
    },
    City {
        id: "tokyo",
        abbr: "TYO",
        tz: chrono_tz::Asia::Tokyo,
        x: 56.0,
        y: 45.0,
        names: ["도쿄", "Tokyo", "東京"],
    },
    City {
        id: "sydney",
        abbr: "SYD",
        tz: chrono_tz::Australia::Sydney,
        x: 64.0,
        y: 78.0,
        names: ["시드니", "Sydney", "シドニー"],
    },
    City {
        id: "dubai",
        abbr: "DXB",
        tz: chrono_tz::Asia::Dubai,
        x: 38.0,
        y: 56.0,
        names: ["두바이", "Dubai", "ドバイ"],
    },
    City {
        id: "mumbai",
        abbr: "BOM",
        tz: chrono_tz::Asia::Kolkata,
        x: 41.0,
        y: 53.0,
        names: ["뭄바이", "Mumbai", "ムンバイ"],
    },
    City {
        id: "london",
        abbr: "LON",
        tz: chrono_tz::Europe::London,
        x: 22.0,
        y: 38.0,
        names: ["런던", "London", "ロンドン"],
    },
    City {
        id: "paris",
        abbr: "PAR",
        tz: chrono_tz::Europe::Paris,
        x: 24.0,
        y: 41.0,
        names: ["파리", "Paris", "パリ"],
    },
    City {
        id: "newyork",
        abbr: "NYC",
        tz: chrono_tz::America::New_York,
        x: 6.0,
        y: 45.0,
        names: ["뉴욕", "New York", "ニューヨーク"],
    },
    City {
        id: "losangeles",
        abbr: "LAX",
        tz: chrono_tz::America::Los_Angeles,
        x: 2.0,
        y: 50.0,
        names: ["로스앤젤레스", "Los Angeles", "ロサンゼルス"],
    },
    City {
        id: "santiago",
        abbr: "SCL",
        tz: chrono_tz::America::Santiago,
        x: 8.0,
        y: 78.0,
        names: ["산티아고", "Santiago", "サンティアゴ"],
    },
];

pub fn find(id: &str) -> Option<&'static City> {
    CITIES.iter().find(|c| c.id == id)
}

pub fn default_city() -> &'static City {
    find(DEFAULT_CITY_ID).expect("default city missing from table")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_is_non_empty() {
        assert!(!CITIES.is_empty());
    }

    #[test]
    fn ids_are_unique() {
        for (i, a) in CITIES.iter().enumerate() {
            for b in &CITIES[i + 1..] {
                assert_ne!(a.id, b.id);
            }
        }
    }

    #[test]
    fn default_city_resolves() {
        assert_eq!(default_city().id, DEFAULT_CITY_ID);
    }

    #[test]
    fn every_city_has_a_name_in_every_language() {
        for city in CITIES {
            for lang in Language::ALL {
                assert!(!city.name(lang).is_empty(), "{} missing name", city.id);
            }
        }
    }

    #[test]
    fn coordinates_are_percentages() {
        for city in CITIES {
            assert!((0.0..=100.0).contains(&city.x), "{} x out of range", city.id);
            assert!((0.0..=100.0).contains(&city.y), "{} y out of range", city.id);
        }
    }

    #[test]
    fn find_rejects_unknown_ids() {
        assert!(find("atlantis").is_none());
    }
}
