//! Request metadata helpers: OS detection and column-safe truncation.

/// Longest user agent / referer stored with a click.
pub const MAX_HEADER_VALUE_CHARS: usize = 512;

/// Detects the client operating system from a user agent.
///
/// Matching is case-insensitive and the first rule that matches wins, so
/// mobile platforms are checked before the desktop systems their agents
/// also mention.
pub fn detect_os(user_agent: Option<&str>) -> String {
    let ua = match user_agent {
        Some(ua) if !ua.trim().is_empty() => ua.to_lowercase(),
        _ => return "Unknown".to_string(),
    };

    let os = if ["iphone", "ipad", "ipod"].iter().any(|m| ua.contains(m)) {
        "iOS"
    } else if ua.contains("android") {
        "Android"
    } else if ua.contains("windows phone") {
        "Windows Phone"
    } else if ua.contains("windows") {
        if ua.contains("windows nt 10.0") {
            "Windows 10/11"
        } else if ua.contains("windows nt 6.3") {
            "Windows 8.1"
        } else if ua.contains("windows nt 6.2") {
            "Windows 8"
        } else if ua.contains("windows nt 6.1") {
            "Windows 7"
        } else {
            "Windows"
        }
    } else if ua.contains("macintosh") || ua.contains("mac os x") {
        "macOS"
    } else if ua.contains("linux") {
        if ua.contains("ubuntu") {
            "Ubuntu"
        } else if ua.contains("fedora") {
            "Fedora"
        } else {
            "Linux"
        }
    } else if ua.contains("cros") {
        "Chrome OS"
    } else if ["bot", "crawler", "spider"].iter().any(|m| ua.contains(m)) {
        "Bot"
    } else {
        "Other"
    };

    os.to_string()
}

/// Truncates to at most `max_chars` characters on a char boundary.
pub fn truncate_chars(value: &str, max_chars: usize) -> String {
    match value.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => value[..byte_idx].to_string(),
        None => value.to_string(),
    }
}

/// Trims, drops empty values and truncates a header value for storage.
pub fn clean_header_value(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(|v| truncate_chars(v, MAX_HEADER_VALUE_CHARS))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mobile_before_desktop() {
        let iphone = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) AppleWebKit/605.1.15";
        assert_eq!(detect_os(Some(iphone)), "iOS");

        let android = "Mozilla/5.0 (Linux; Android 14; Pixel 8) AppleWebKit/537.36";
        assert_eq!(detect_os(Some(android)), "Android");

        let wp = "Mozilla/5.0 (Windows Phone 10.0; Android 6.0.1; Microsoft; Lumia 950)";
        assert_eq!(detect_os(Some(wp)), "Android");
    }

    #[test]
    fn test_windows_versions() {
        assert_eq!(
            detect_os(Some("Mozilla/5.0 (Windows NT 10.0; Win64; x64)")),
            "Windows 10/11"
        );
        assert_eq!(detect_os(Some("Mozilla/5.0 (Windows NT 6.3)")), "Windows 8.1");
        assert_eq!(detect_os(Some("Mozilla/5.0 (Windows NT 6.2)")), "Windows 8");
        assert_eq!(detect_os(Some("Mozilla/5.0 (Windows NT 6.1)")), "Windows 7");
        assert_eq!(detect_os(Some("Mozilla/5.0 (Windows NT 5.1)")), "Windows");
        assert_eq!(
            detect_os(Some("Mozilla/5.0 (Windows Phone 8.1; ARM; Trident/7.0)")),
            "Windows Phone"
        );
    }

    #[test]
    fn test_desktop_unix() {
        assert_eq!(
            detect_os(Some("Mozilla/5.0 (Macintosh; Intel Mac OS X 14_2)")),
            "macOS"
        );
        assert_eq!(
            detect_os(Some("Mozilla/5.0 (X11; Ubuntu; Linux x86_64; rv:120.0)")),
            "Ubuntu"
        );
        assert_eq!(
            detect_os(Some("Mozilla/5.0 (X11; Fedora; Linux x86_64)")),
            "Fedora"
        );
        assert_eq!(detect_os(Some("Mozilla/5.0 (X11; Linux x86_64)")), "Linux");
        assert_eq!(
            detect_os(Some("Mozilla/5.0 (X11; CrOS x86_64 15633.69.0)")),
            "Chrome OS"
        );
    }

    #[test]
    fn test_bots_and_fallbacks() {
        assert_eq!(
            detect_os(Some("Googlebot/2.1 (+http://www.google.com/bot.html)")),
            "Bot"
        );
        assert_eq!(detect_os(Some("curl/8.4.0")), "Other");
        assert_eq!(detect_os(Some("")), "Unknown");
        assert_eq!(detect_os(None), "Unknown");
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("abc", 10), "abc");
        assert_eq!(truncate_chars(&"я".repeat(600), 512).chars().count(), 512);
    }

    #[test]
    fn test_clean_header_value() {
        assert_eq!(clean_header_value(None), None);
        assert_eq!(clean_header_value(Some("   ")), None);
        assert_eq!(
            clean_header_value(Some(" https://ref.example/ ")).as_deref(),
            Some("https://ref.example/")
        );
        assert_eq!(
            clean_header_value(Some(&"x".repeat(700))).unwrap().len(),
            MAX_HEADER_VALUE_CHARS
        );
    }
}
