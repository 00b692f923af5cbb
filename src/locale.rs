use chrono::{DateTime, Datelike, Weekday};
use chrono_tz::Tz;

/// The three bundled UI languages. Each variant carries its translated
/// strings and label formatting as data, so rendering code never branches
/// on locale strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    Korean,
    English,
    Japanese,
}

impl Language {
    pub const ALL: [Language; 3] = [Language::Korean, Language::English, Language::Japanese];

    /// Position in [`Self::ALL`], also used to index city name tables.
    pub fn index(self) -> usize {
        match self {
            Language::Korean => 0,
            Language::English => 1,
            Language::Japanese => 2,
        }
    }

    /// Cyclic successor: ko-KR → en-US → ja-JP → ko-KR.
    pub fn next(self) -> Language {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    pub fn code(self) -> &'static str {
        match self {
            Language::Korean => "ko-KR",
            Language::English => "en-US",
            Language::Japanese => "ja-JP",
        }
    }

    /// Parse a BCP-47 code, degrading to English for anything unknown.
    pub fn from_code(code: &str) -> Language {
        Self::ALL
            .into_iter()
            .find(|l| l.code().eq_ignore_ascii_case(code))
            .unwrap_or(Language::English)
    }

    /// Native-script name shown on the language toggle.
    pub fn label(self) -> &'static str {
        match self {
            Language::Korean => "한국어",
            Language::English => "English",
            Language::Japanese => "日本語",
        }
    }

    pub fn map_hint(self) -> &'static str {
        match self {
            Language::Korean => "도시를 클릭해 시간을 변경하세요.",
            Language::English => "Click a city to jump to that timezone.",
            Language::Japanese => "都市をクリックしてタイムゾーンを切り替えます。",
        }
    }

    pub fn meridiem(self, is_pm: bool) -> &'static str {
        match (self, is_pm) {
            (Language::Korean, false) => "오전",
            (Language::Korean, true) => "오후",
            (Language::English, false) => "AM",
            (Language::English, true) => "PM",
            (Language::Japanese, false) => "午前",
            (Language::Japanese, true) => "午後",
        }
    }

    /// "{city} local time" headline above the digits.
    pub fn selected_label(self, city: &str) -> String {
        match self {
            Language::Korean => format!("{} 현재 시간", city),
            Language::English => format!("{} local time", city),
            Language::Japanese => format!("{}の現在時刻", city),
        }
    }

    /// "{city} · {zone} ({offset})" line under the date.
    pub fn timezone_label(self, city: &str, zone: &str, offset: &str) -> String {
        match self {
            Language::Korean | Language::English => format!("{} · {} ({})", city, zone, offset),
            Language::Japanese => format!("{}・{}（{}）", city, zone, offset),
        }
    }

    fn weekday_name(self, weekday: Weekday) -> &'static str {
        let idx = weekday.num_days_from_sunday() as usize;
        match self {
            Language::Korean => {
                ["일요일", "월요일", "화요일", "수요일", "목요일", "금요일", "토요일"][idx]
            }
            Language::English => {
                ["Sunday", "Monday", "Tuesday", "Wednesday", "Thursday", "Friday", "Saturday"][idx]
            }
            Language::Japanese => {
                ["日曜日", "月曜日", "火曜日", "水曜日", "木曜日", "金曜日", "土曜日"][idx]
            }
        }
    }

    fn month_name(self, month: u32) -> String {
        match self {
            Language::Korean => format!("{}월", month),
            Language::English => [
                "January", "February", "March", "April", "May", "June", "July", "August",
                "September", "October", "November", "December",
            ][(month - 1) as usize]
                .to_string(),
            Language::Japanese => format!("{}月", month),
        }
    }

    /// Long-form localized date: weekday plus full month.
    pub fn format_date(self, local: &DateTime<Tz>) -> String {
        let weekday = self.weekday_name(local.weekday());
        match self {
            Language::Korean => format!(
                "{}년 {} {}일 {}",
                local.year(),
                self.month_name(local.month()),
                local.day(),
                weekday
            ),
            Language::English => format!(
                "{}, {} {}, {}",
                weekday,
                self.month_name(local.month()),
                local.day(),
                local.year()
            ),
            Language::Japanese => format!(
                "{}年{}月{}日{}",
                local.year(),
                local.month(),
                local.day(),
                weekday
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn cycling_wraps_after_last_entry() {
        assert_eq!(Language::Korean.next(), Language::English);
        assert_eq!(Language::English.next(), Language::Japanese);
        assert_eq!(Language::Japanese.next(), Language::Korean);
    }

    #[test]
    fn three_nexts_return_to_start() {
        for lang in Language::ALL {
            assert_eq!(lang.next().next().next(), lang);
        }
    }

    #[test]
    fn from_code_round_trips() {
        for lang in Language::ALL {
            assert_eq!(Language::from_code(lang.code()), lang);
        }
    }

    #[test]
    fn from_code_degrades_to_english() {
        assert_eq!(Language::from_code("fr-FR"), Language::English);
        assert_eq!(Language::from_code(""), Language::English);
    }

    #[test]
    fn date_formats_per_locale() {
        // A Saturday.
        let local = chrono_tz::Asia::Seoul
            .with_ymd_and_hms(2024, 3, 9, 12, 0, 0)
            .unwrap();
        assert_eq!(Language::Korean.format_date(&local), "2024년 3월 9일 토요일");
        assert_eq!(Language::English.format_date(&local), "Saturday, March 9, 2024");
        assert_eq!(Language::Japanese.format_date(&local), "2024年3月9日土曜日");
    }

    #[test]
    fn meridiem_strings() {
        assert_eq!(Language::English.meridiem(false), "AM");
        assert_eq!(Language::English.meridiem(true), "PM");
        assert_eq!(Language::Korean.meridiem(true), "오후");
        assert_eq!(Language::Japanese.meridiem(false), "午前");
    }

    #[test]
    fn timezone_label_shapes() {
        assert_eq!(
            Language::English.timezone_label("Seoul", "Asia/Seoul", "GMT+09:00"),
            "Seoul · Asia/Seoul (GMT+09:00)"
        );
        assert_eq!(
            Language::Japanese.timezone_label("東京", "Asia/Tokyo", "GMT+09:00"),
            "東京・Asia/Tokyo（GMT+09:00）"
        );
    }
}
