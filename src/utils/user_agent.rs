//! User-agent classification: device category and bot detection.

use regex::Regex;
use std::sync::LazyLock;

use crate::domain::entities::DeviceClass;

/// Tablet-specific tokens. Checked before the mobile heuristics because many
/// tablet user agents also contain mobile-adjacent substrings.
static TABLET_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)tablet|ipad|playbook").unwrap());

static MOBILE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)up\.browser|up\.link|mmp|symbian|smartphone|midp|wap|phone|android|iemobile")
        .unwrap()
});

/// Substrings that mark a user agent as an automated client.
const BOT_KEYWORDS: &[&str] = &[
    "bot",
    "crawler",
    "spider",
    "slurp",
    "googlebot",
    "bingbot",
    "yandexbot",
];

/// Classifies a user agent into desktop/mobile/tablet.
///
/// Android without a "Mobile" marker is a tablet per Google's UA guidance;
/// Opera Mini identifies as Android but is always a phone browser.
pub fn classify_device(user_agent: &str) -> DeviceClass {
    let lower = user_agent.to_lowercase();

    let android_tablet =
        lower.contains("android") && !lower.contains("mobi") && !lower.contains("opera mini");

    if TABLET_RE.is_match(user_agent) || android_tablet {
        return DeviceClass::Tablet;
    }

    if MOBILE_RE.is_match(user_agent) {
        return DeviceClass::Mobile;
    }

    DeviceClass::Desktop
}

/// Returns true when the user agent matches a known bot keyword.
/// A missing user agent is not treated as a bot.
pub fn is_bot(user_agent: Option<&str>) -> bool {
    let Some(ua) = user_agent else {
        return false;
    };
    let lower = ua.to_lowercase();
    BOT_KEYWORDS.iter().any(|keyword| lower.contains(keyword))
}
