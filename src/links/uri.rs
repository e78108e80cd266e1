use std::fmt;

use serde::{Deserialize, Serialize};
use urlencoding::encode;

use crate::links::platform::{Os, Platform};
use crate::utils::geo::Coordinates;

/// Identifies the calling app to Naver Map.
const NAVER_APP_NAME: &str = "fromscreen";
/// Label used for the user's own position as a route origin.
const ORIGIN_LABEL: &str = "내 위치";

const TMAP_APP_STORE_URL: &str = "https://apps.apple.com/kr/app/t-map/id431589174";
const TMAP_PLAY_STORE_URL: &str = "https://play.google.com/store/apps/details?id=com.skt.tmap.ku";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MapApp {
    Naver,
    Kakao,
    Google,
    Tmap,
}

impl MapApp {
    pub fn as_str(&self) -> &'static str {
        match self {
            MapApp::Naver => "naver",
            MapApp::Kakao => "kakao",
            MapApp::Google => "google",
            MapApp::Tmap => "tmap",
        }
    }
}

impl fmt::Display for MapApp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Destination (and optional origin) of a navigation request.
#[derive(Debug, Clone, PartialEq)]
pub struct MapLinkParams {
    pub lat: f64,
    pub lng: f64,
    pub name: String,
    pub address: String,
    pub origin: Option<Coordinates>,
}

impl MapLinkParams {
    /// `"{name} ({address})"`, or just the name when the address is blank.
    pub fn label(&self) -> String {
        let address = self.address.trim();
        if address.is_empty() {
            self.name.clone()
        } else {
            format!("{} ({})", self.name, address)
        }
    }

    fn encoded_label(&self) -> String {
        encode(&self.label()).into_owned()
    }
}

/// Decimal rendering that always keeps a fractional part (`127.0`, not `127`).
fn coord(value: f64) -> String {
    let s = value.to_string();
    if value.is_finite() && !s.contains('.') {
        format!("{}.0", s)
    } else {
        s
    }
}

fn pair(lat: f64, lng: f64) -> String {
    format!("{},{}", coord(lat), coord(lng))
}

/// Build the native deep link for `app`. Google has no custom scheme and
/// uses its universal https link instead.
pub fn build_app_uri(app: MapApp, params: &MapLinkParams) -> String {
    let label = params.encoded_label();
    let (lat, lng) = (coord(params.lat), coord(params.lng));

    match app {
        MapApp::Naver => {
            let origin = params
                .origin
                .map(|o| {
                    format!(
                        "&slat={}&slng={}&sname={}",
                        coord(o.lat),
                        coord(o.lng),
                        encode(ORIGIN_LABEL)
                    )
                })
                .unwrap_or_default();
            format!(
                "nmap://route/public?dlat={lat}&dlng={lng}&dname={label}{origin}&appname={NAVER_APP_NAME}"
            )
        }
        MapApp::Kakao => {
            let origin = params
                .origin
                .map(|o| format!("&sp={}", pair(o.lat, o.lng)))
                .unwrap_or_default();
            format!(
                "kakaomap://route?ep={}{origin}&by=PUBLICTRANSIT",
                pair(params.lat, params.lng)
            )
        }
        MapApp::Tmap => {
            let origin = params
                .origin
                .map(|o| format!("&slat={}&slng={}", coord(o.lat), coord(o.lng)))
                .unwrap_or_default();
            format!("tmap://route?dname={label}&dlat={lat}&dlng={lng}{origin}")
        }
        MapApp::Google => google_directions(params),
    }
}

/// Build the https URL used when the native app is unavailable. For tmap
/// this is the store listing on iOS and Android and Naver's web directions
/// everywhere else.
pub fn build_web_fallback(app: MapApp, params: &MapLinkParams, platform: Platform) -> String {
    match app {
        MapApp::Naver => naver_web_directions(params),
        MapApp::Kakao => {
            let origin = params
                .origin
                .map(|o| format!("/from/{},{}", encode(ORIGIN_LABEL), pair(o.lat, o.lng)))
                .unwrap_or_default();
            format!(
                "https://map.kakao.com/link/to/{},{}{origin}",
                encode(&params.name),
                pair(params.lat, params.lng)
            )
        }
        MapApp::Tmap => match platform.os {
            Os::Ios => TMAP_APP_STORE_URL.to_string(),
            Os::Android => TMAP_PLAY_STORE_URL.to_string(),
            Os::Other => naver_web_directions(params),
        },
        MapApp::Google => google_directions(params),
    }
}

fn naver_web_directions(params: &MapLinkParams) -> String {
    // Naver's web route takes lng before lat
    let start = params
        .origin
        .map(|o| format!("{},{},{}", coord(o.lng), coord(o.lat), encode(ORIGIN_LABEL)))
        .unwrap_or_else(|| "-".to_string());
    format!(
        "https://map.naver.com/v5/directions/{start}/{},{},{},/walk",
        coord(params.lng),
        coord(params.lat),
        params.encoded_label()
    )
}

fn google_directions(params: &MapLinkParams) -> String {
    let origin = params
        .origin
        .map(|o| format!("&origin={}", pair(o.lat, o.lng)))
        .unwrap_or_default();
    format!(
        "https://www.google.com/maps/dir/?api=1&destination={}{origin}&query={}",
        pair(params.lat, params.lng),
        params.encoded_label()
    )
}
