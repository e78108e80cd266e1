use std::future::Future;
use std::time::Duration;

use serde::Serialize;

use crate::links::platform::Platform;
use crate::links::uri::{build_app_uri, build_web_fallback, MapApp, MapLinkParams};

pub const TMAP_DESKTOP_NOTICE: &str =
    "티맵은 모바일 앱에서만 지원됩니다. 네이버 지도로 연결해 드릴게요!";
pub const TMAP_STORE_PROMPT: &str =
    "티맵 앱이 설치되어 있지 않은 것 같습니다. 스토어로 이동할까요?";

/// What to do for a navigation request on a given platform.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum DispatchPlan {
    /// Open an https URL directly.
    OpenWeb { url: String },
    /// The requested app cannot serve this platform; open another app's web
    /// directions in a new tab after showing `notice`.
    Substitute { app: MapApp, url: String, notice: String },
    /// Launch the native app, then fall back to `fallback_url` if the page is
    /// still in the foreground after `timeout_ms`. When `confirm` is set the
    /// fallback needs the user's consent.
    TryApp {
        app_uri: String,
        fallback_url: String,
        confirm: Option<String>,
        timeout_ms: u64,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchOutcome {
    OpenedWeb,
    Substituted,
    /// The app took over before the timeout.
    Launched,
    /// The timeout fired and the fallback was opened.
    FellBack,
    /// The timeout fired and the user declined the fallback.
    Declined,
}

/// Decide how to open `app` for a caller on `platform`.
pub fn plan(
    app: MapApp,
    params: &MapLinkParams,
    platform: Platform,
    timeout: Duration,
) -> DispatchPlan {
    if app == MapApp::Tmap && !platform.is_mobile() {
        return DispatchPlan::Substitute {
            app: MapApp::Naver,
            url: build_web_fallback(MapApp::Naver, params, platform),
            notice: TMAP_DESKTOP_NOTICE.to_string(),
        };
    }

    // Google's web and app experiences are interchangeable
    if app == MapApp::Google || !platform.is_mobile() {
        return DispatchPlan::OpenWeb {
            url: build_web_fallback(app, params, platform),
        };
    }

    DispatchPlan::TryApp {
        app_uri: build_app_uri(app, params),
        fallback_url: build_web_fallback(app, params, platform),
        confirm: (app == MapApp::Tmap).then(|| TMAP_STORE_PROMPT.to_string()),
        timeout_ms: timeout.as_millis() as u64,
    }
}

/// The page-side collaborator a dispatch drives.
pub trait Navigator {
    /// Replace the current page with `url`.
    fn navigate(&self, url: &str);
    /// Open `url` in a new tab, keeping the current page.
    fn open_new_tab(&self, url: &str);
    fn alert(&self, message: &str);
    fn confirm(&self, message: &str) -> bool;
    /// Resolves once the page has lost the foreground to another application.
    fn handoff(&self) -> impl Future<Output = ()>;
}

/// Open `app` through `navigator`.
///
/// There is no reliable signal that a custom scheme failed to launch, so
/// `TryApp` races the navigator's hand-off against `timeout`. A slow app
/// launch can lose the race and a quick return to the page can win it; both
/// are accepted. The timer is dropped as soon as the hand-off resolves.
/// Never fails and never retries.
pub async fn dispatch<N: Navigator>(
    navigator: &N,
    app: MapApp,
    params: &MapLinkParams,
    platform: Platform,
    timeout: Duration,
) -> DispatchOutcome {
    match plan(app, params, platform, timeout) {
        DispatchPlan::OpenWeb { url } => {
            tracing::debug!(app = %app, url = %url, "Opening web directions");
            navigator.navigate(&url);
            DispatchOutcome::OpenedWeb
        }
        DispatchPlan::Substitute { app: substitute, url, notice } => {
            tracing::debug!(app = %app, substitute = %substitute, "Substituting map app");
            navigator.alert(&notice);
            navigator.open_new_tab(&url);
            DispatchOutcome::Substituted
        }
        DispatchPlan::TryApp { app_uri, fallback_url, confirm, .. } => {
            navigator.navigate(&app_uri);

            tokio::select! {
                _ = navigator.handoff() => {
                    tracing::debug!(app = %app, "Map app took over");
                    DispatchOutcome::Launched
                }
                _ = tokio::time::sleep(timeout) => {
                    tracing::debug!(app = %app, timeout_ms = timeout.as_millis() as u64, "Map app did not launch");
                    if let Some(prompt) = confirm {
                        if !navigator.confirm(&prompt) {
                            return DispatchOutcome::Declined;
                        }
                    }
                    navigator.navigate(&fallback_url);
                    DispatchOutcome::FellBack
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::links::platform::Os;
    use crate::utils::geo::Coordinates;

    const TIMEOUT: Duration = Duration::from_millis(2000);

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Navigate(String),
        NewTab(String),
        Alert(String),
        Confirm(String),
    }

    struct FakeNavigator {
        calls: RefCell<Vec<Call>>,
        hands_off: bool,
        accepts: bool,
    }

    impl FakeNavigator {
        fn new(hands_off: bool, accepts: bool) -> Self {
            Self { calls: RefCell::new(Vec::new()), hands_off, accepts }
        }

        fn calls(&self) -> Vec<Call> {
            self.calls.borrow().clone()
        }
    }

    impl Navigator for FakeNavigator {
        fn navigate(&self, url: &str) {
            self.calls.borrow_mut().push(Call::Navigate(url.to_string()));
        }

        fn open_new_tab(&self, url: &str) {
            self.calls.borrow_mut().push(Call::NewTab(url.to_string()));
        }

        fn alert(&self, message: &str) {
            self.calls.borrow_mut().push(Call::Alert(message.to_string()));
        }

        fn confirm(&self, message: &str) -> bool {
            self.calls.borrow_mut().push(Call::Confirm(message.to_string()));
            self.accepts
        }

        async fn handoff(&self) {
            if self.hands_off {
                tokio::time::sleep(Duration::from_millis(300)).await;
            } else {
                std::future::pending::<()>().await;
            }
        }
    }

    fn params() -> MapLinkParams {
        MapLinkParams {
            lat: 37.5,
            lng: 127.0,
            name: "우래옥".to_string(),
            address: "서울 중구 창경궁로".to_string(),
            origin: Some(Coordinates::new(37.56, 126.97)),
        }
    }

    fn android() -> Platform {
        Platform::new(Os::Android)
    }

    #[test]
    fn test_desktop_plans_web_without_app_uri() {
        for app in [MapApp::Naver, MapApp::Kakao] {
            let plan = plan(app, &params(), Platform::DESKTOP, TIMEOUT);
            assert_eq!(
                plan,
                DispatchPlan::OpenWeb {
                    url: build_web_fallback(app, &params(), Platform::DESKTOP)
                }
            );
        }
    }

    #[test]
    fn test_google_always_web() {
        for platform in [Platform::DESKTOP, android(), Platform::new(Os::Ios)] {
            assert!(matches!(
                plan(MapApp::Google, &params(), platform, TIMEOUT),
                DispatchPlan::OpenWeb { .. }
            ));
        }
    }

    #[test]
    fn test_tmap_desktop_substitutes_naver() {
        let plan = plan(MapApp::Tmap, &params(), Platform::DESKTOP, TIMEOUT);
        let DispatchPlan::Substitute { app, url, .. } = plan else {
            panic!("expected substitute, got {plan:?}");
        };
        assert_eq!(app, MapApp::Naver);
        assert!(url.starts_with("https://map.naver.com/"));
        assert!(!url.contains("apps.apple.com") && !url.contains("play.google.com"));
    }

    #[test]
    fn test_mobile_tries_app() {
        let plan = plan(MapApp::Kakao, &params(), android(), TIMEOUT);
        assert_eq!(
            plan,
            DispatchPlan::TryApp {
                app_uri: build_app_uri(MapApp::Kakao, &params()),
                fallback_url: build_web_fallback(MapApp::Kakao, &params(), android()),
                confirm: None,
                timeout_ms: 2000,
            }
        );

        let tmap = plan_tmap_ios();
        assert!(matches!(tmap, DispatchPlan::TryApp { confirm: Some(_), .. }));
    }

    fn plan_tmap_ios() -> DispatchPlan {
        plan(MapApp::Tmap, &params(), Platform::new(Os::Ios), TIMEOUT)
    }

    #[tokio::test(start_paused = true)]
    async fn test_dispatch_desktop_never_touches_app_uri() {
        for app in [MapApp::Naver, MapApp::Kakao] {
            let nav = FakeNavigator::new(false, true);
            let outcome = dispatch(&nav, app, &params(), Platform::DESKTOP, TIMEOUT).await;

            assert_eq!(outcome, DispatchOutcome::OpenedWeb);
            let calls = nav.calls();
            assert_eq!(calls.len(), 1);
            let Call::Navigate(url) = &calls[0] else {
                panic!("unexpected call {calls:?}");
            };
            assert!(url.starts_with("https://"));
            assert_ne!(url, &build_app_uri(app, &params()));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_dispatch_tmap_desktop_opens_naver() {
        let nav = FakeNavigator::new(false, true);
        let outcome = dispatch(&nav, MapApp::Tmap, &params(), Platform::DESKTOP, TIMEOUT).await;

        assert_eq!(outcome, DispatchOutcome::Substituted);
        assert_eq!(
            nav.calls(),
            vec![
                Call::Alert(TMAP_DESKTOP_NOTICE.to_string()),
                Call::NewTab(build_web_fallback(MapApp::Naver, &params(), Platform::DESKTOP)),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_dispatch_launches_when_app_takes_over() {
        let nav = FakeNavigator::new(true, true);
        let outcome = dispatch(&nav, MapApp::Naver, &params(), android(), TIMEOUT).await;

        assert_eq!(outcome, DispatchOutcome::Launched);
        assert_eq!(nav.calls(), vec![Call::Navigate(build_app_uri(MapApp::Naver, &params()))]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dispatch_falls_back_after_timeout() {
        let nav = FakeNavigator::new(false, true);
        let started = tokio::time::Instant::now();
        let outcome = dispatch(&nav, MapApp::Kakao, &params(), android(), TIMEOUT).await;

        assert_eq!(outcome, DispatchOutcome::FellBack);
        assert!(started.elapsed() >= TIMEOUT);
        assert_eq!(
            nav.calls(),
            vec![
                Call::Navigate(build_app_uri(MapApp::Kakao, &params())),
                Call::Navigate(build_web_fallback(MapApp::Kakao, &params(), android())),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_dispatch_tmap_asks_before_store() {
        let declined = FakeNavigator::new(false, false);
        let outcome = dispatch(&declined, MapApp::Tmap, &params(), android(), TIMEOUT).await;
        assert_eq!(outcome, DispatchOutcome::Declined);
        assert_eq!(
            declined.calls(),
            vec![
                Call::Navigate(build_app_uri(MapApp::Tmap, &params())),
                Call::Confirm(TMAP_STORE_PROMPT.to_string()),
            ]
        );

        let accepted = FakeNavigator::new(false, true);
        let outcome = dispatch(&accepted, MapApp::Tmap, &params(), android(), TIMEOUT).await;
        assert_eq!(outcome, DispatchOutcome::FellBack);
        assert_eq!(
            accepted.calls().last(),
            Some(&Call::Navigate(
                "https://play.google.com/store/apps/details?id=com.skt.tmap.ku".to_string()
            ))
        );
    }

    #[test]
    fn test_plan_serializes_with_action_tag() {
        let value = serde_json::to_value(plan(MapApp::Google, &params(), android(), TIMEOUT)).unwrap();
        assert_eq!(value["action"], "open_web");
        assert!(value["url"].as_str().unwrap().contains("destination=37.5,127.0"));
    }
}
