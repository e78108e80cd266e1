use std::sync::LazyLock;

use chrono::{DateTime, Datelike, Duration, Utc, Weekday};
use regex::Regex;
use serde::Serialize;

use crate::places::{MenuInfo, OpeningHours, Place, NO_INFO};
use crate::utils::geo::format_distance;

/// Shown when a weekly schedule has no entry for today.
pub const HOURS_UNKNOWN: &str = "정보 확인 필요";

pub const WEEKDAYS: [&str; 7] = ["월", "화", "수", "목", "금", "토", "일"];

static YOUTUBE_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?:youtu\.be/|youtube\.com/(?:.*v/|.*u/\w/|embed/|watch\?.*v=))([^"&?/\s]{11})"#)
        .expect("valid youtube id pattern")
});

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayHours {
    pub day: &'static str,
    pub hours: String,
    pub is_today: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MenuEntry {
    pub name: String,
    pub price: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

/// A place with its display-ready extras.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlaceDetail {
    #[serde(flatten)]
    pub place: Place,
    pub address_display: String,
    pub distance_text: Option<String>,
    pub today_hours: Option<String>,
    pub weekly_hours: Vec<DayHours>,
    pub menu: Vec<MenuEntry>,
    pub youtube_id: Option<String>,
}

impl PlaceDetail {
    pub fn build(place: Place, now: DateTime<Utc>) -> Self {
        let today = korean_weekday(kst_weekday(now));

        let address_display = if place.address.trim().is_empty() {
            NO_INFO.to_string()
        } else {
            place.address.clone()
        };

        Self {
            address_display,
            distance_text: place.distance.map(format_distance),
            today_hours: place.opening_hours.as_ref().map(|h| h.for_day(today).to_string()),
            weekly_hours: place
                .opening_hours
                .as_ref()
                .map(|h| h.weekly(today))
                .unwrap_or_default(),
            menu: place.menu_info.as_ref().map(MenuInfo::entries).unwrap_or_default(),
            youtube_id: place.video_url.as_deref().and_then(youtube_id),
            place,
        }
    }
}

/// Opening hours are kept in Korean local time.
pub fn kst_weekday(now: DateTime<Utc>) -> Weekday {
    (now + Duration::hours(9)).weekday()
}

pub fn korean_weekday(weekday: Weekday) -> &'static str {
    WEEKDAYS[weekday.num_days_from_monday() as usize]
}

impl OpeningHours {
    /// Hours for `day`; free text applies to every day.
    pub fn for_day(&self, day: &str) -> &str {
        match self {
            OpeningHours::Text(text) => text,
            OpeningHours::Weekly(days) => days
                .get(day)
                .map(String::as_str)
                .filter(|h| !h.trim().is_empty())
                .unwrap_or(HOURS_UNKNOWN),
        }
    }

    /// Monday-first rows for a weekly schedule. Free text has no rows.
    pub fn weekly(&self, today: &str) -> Vec<DayHours> {
        let OpeningHours::Weekly(days) = self else {
            return Vec::new();
        };

        WEEKDAYS
            .iter()
            .map(|&day| DayHours {
                day,
                hours: days
                    .get(day)
                    .filter(|h| !h.trim().is_empty())
                    .cloned()
                    .unwrap_or_else(|| NO_INFO.to_string()),
                is_today: day == today,
            })
            .collect()
    }
}

impl MenuInfo {
    pub fn entries(&self) -> Vec<MenuEntry> {
        match self {
            MenuInfo::Items(items) => items
                .iter()
                .map(|item| MenuEntry {
                    name: item.name.clone(),
                    price: Some(item.price.clone()),
                    description: item.description.clone(),
                    image_url: item.image_url.clone(),
                })
                .collect(),
            MenuInfo::Legacy(text) => text
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(|line| {
                    let (name, price) = match line.split_once(':') {
                        Some((name, price)) => (name.trim(), Some(price.trim().to_string())),
                        None => (line, None),
                    };
                    MenuEntry {
                        name: name.to_string(),
                        price: price.filter(|p| !p.is_empty()),
                        description: None,
                        image_url: None,
                    }
                })
                .collect(),
        }
    }
}

/// Extract the 11 character video id from the common YouTube URL shapes.
pub fn youtube_id(url: &str) -> Option<String> {
    YOUTUBE_ID
        .captures(url)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use chrono::TimeZone;
    use uuid::Uuid;

    use super::*;
    use crate::places::MenuItem;

    fn place() -> Place {
        Place {
            id: Uuid::new_v4(),
            restaurant_name: "우래옥".to_string(),
            category: "한식".to_string(),
            address: String::new(),
            lat: 37.568,
            lng: 126.998,
            broadcasts: Vec::new(),
            image_url: None,
            video_url: Some("https://www.youtube.com/watch?v=dQw4w9WgXcQ&t=42".to_string()),
            vod_url: None,
            thumbnail_url: None,
            opening_hours: None,
            menu_info: None,
            distance: Some(0.42),
        }
    }

    fn weekly() -> OpeningHours {
        OpeningHours::Weekly(BTreeMap::from([
            ("월".to_string(), "휴무".to_string()),
            ("화".to_string(), "11:30 - 21:00".to_string()),
        ]))
    }

    #[test]
    fn test_kst_weekday_crosses_midnight() {
        // 2026-01-05 16:00 UTC is Tuesday 01:00 in Seoul
        let now = Utc.with_ymd_and_hms(2026, 1, 5, 16, 0, 0).unwrap();
        assert_eq!(now.weekday(), Weekday::Mon);
        assert_eq!(korean_weekday(kst_weekday(now)), "화");
    }

    #[test]
    fn test_hours_for_day() {
        assert_eq!(weekly().for_day("화"), "11:30 - 21:00");
        assert_eq!(weekly().for_day("수"), HOURS_UNKNOWN);
        assert_eq!(OpeningHours::Text("매일 10시-22시".to_string()).for_day("수"), "매일 10시-22시");
    }

    #[test]
    fn test_weekly_rows() {
        let rows = weekly().weekly("화");
        assert_eq!(rows.len(), 7);
        assert_eq!(rows[0].day, "월");
        assert_eq!(rows[0].hours, "휴무");
        assert!(rows[1].is_today);
        assert_eq!(rows[6].hours, NO_INFO);
        assert!(OpeningHours::Text("24시간".to_string()).weekly("화").is_empty());
    }

    #[test]
    fn test_legacy_menu_lines() {
        let menu = MenuInfo::Legacy("물냉면: 16,000원\n\n불고기 :38,000원\n오늘의 메뉴".to_string());
        let entries = menu.entries();

        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].name, "물냉면");
        assert_eq!(entries[0].price.as_deref(), Some("16,000원"));
        assert_eq!(entries[1].name, "불고기");
        assert_eq!(entries[2].price, None);
    }

    #[test]
    fn test_menu_json_shapes() {
        let items: MenuInfo = serde_json::from_value(serde_json::json!([
            { "id": "existing-0", "name": "평양냉면", "price": "16,000원" }
        ]))
        .unwrap();
        assert_eq!(
            items,
            MenuInfo::Items(vec![MenuItem {
                name: "평양냉면".to_string(),
                price: "16,000원".to_string(),
                description: None,
                image_url: None,
            }])
        );

        let legacy: MenuInfo = serde_json::from_value(serde_json::json!("냉면:15000")).unwrap();
        assert!(matches!(legacy, MenuInfo::Legacy(_)));
    }

    #[test]
    fn test_youtube_id() {
        assert_eq!(youtube_id("https://youtu.be/dQw4w9WgXcQ").as_deref(), Some("dQw4w9WgXcQ"));
        assert_eq!(
            youtube_id("https://www.youtube.com/embed/dQw4w9WgXcQ?autoplay=1").as_deref(),
            Some("dQw4w9WgXcQ")
        );
        assert_eq!(youtube_id("https://tv.naver.com/v/12345"), None);
    }

    #[test]
    fn test_detail_build() {
        let mut p = place();
        p.opening_hours = Some(weekly());
        p.menu_info = Some(MenuInfo::Legacy("냉면:16,000원".to_string()));

        let now = Utc.with_ymd_and_hms(2026, 1, 6, 3, 0, 0).unwrap(); // Tuesday noon KST
        let detail = PlaceDetail::build(p, now);

        assert_eq!(detail.address_display, NO_INFO);
        assert_eq!(detail.distance_text.as_deref(), Some("420m"));
        assert_eq!(detail.today_hours.as_deref(), Some("11:30 - 21:00"));
        assert_eq!(detail.weekly_hours.len(), 7);
        assert_eq!(detail.menu.len(), 1);
        assert_eq!(detail.youtube_id.as_deref(), Some("dQw4w9WgXcQ"));
    }
}
