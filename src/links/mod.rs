//! Outbound navigation to external map applications.
//!
//! `uri` builds the per-application deep links and web fallbacks,
//! `platform` classifies the caller from its User-Agent and `dispatch`
//! decides and executes what to open.

pub mod dispatch;
pub mod platform;
pub mod uri;

pub use dispatch::{dispatch, plan, DispatchOutcome, DispatchPlan, Navigator};
pub use platform::{Os, Platform};
pub use uri::{build_app_uri, build_web_fallback, MapApp, MapLinkParams};
