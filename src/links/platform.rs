use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Os {
    Ios,
    Android,
    Other,
}

/// The platform a navigation request comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Platform {
    pub os: Os,
}

impl Platform {
    pub const DESKTOP: Platform = Platform { os: Os::Other };

    pub fn new(os: Os) -> Self {
        Self { os }
    }

    pub fn from_user_agent(user_agent: &str) -> Self {
        let ua = user_agent.to_ascii_lowercase();
        let os = if ["iphone", "ipad", "ipod"].iter().any(|d| ua.contains(d)) {
            Os::Ios
        } else if ua.contains("android") {
            Os::Android
        } else {
            Os::Other
        };
        Self { os }
    }

    pub fn is_mobile(&self) -> bool {
        matches!(self.os, Os::Ios | Os::Android)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detects_ios() {
        let ua = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) AppleWebKit/605.1.15";
        let platform = Platform::from_user_agent(ua);
        assert_eq!(platform.os, Os::Ios);
        assert!(platform.is_mobile());
    }

    #[test]
    fn test_detects_android() {
        let ua = "Mozilla/5.0 (Linux; Android 14; SM-S918N) AppleWebKit/537.36 Chrome/120.0 Mobile";
        assert_eq!(Platform::from_user_agent(ua).os, Os::Android);
    }

    #[test]
    fn test_desktop_is_not_mobile() {
        let ua = "Mozilla/5.0 (Macintosh; Intel Mac OS X 14_0) AppleWebKit/605.1.15 Safari/605.1.15";
        let platform = Platform::from_user_agent(ua);
        assert_eq!(platform, Platform::DESKTOP);
        assert!(!platform.is_mobile());
        assert!(!Platform::from_user_agent("").is_mobile());
    }
}
