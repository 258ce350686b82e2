//! # Session Cookies
//!
//! The session token travels in an HTTP-only, `SameSite=Strict` cookie.

use chrono::Duration;
use tracing::warn;

/// Name of the session cookie
pub const SESSION_COOKIE: &str = "jwt";

/// Longest accepted session token lifetime, in days
pub const MAX_TOKEN_LIFETIME_DAYS: i64 = 365;

/// Why a token lifetime was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifetimeError {
    /// Not of the form `<n><s|m|h|d>` with a positive `n`
    Malformed,
    /// Longer than [`MAX_TOKEN_LIFETIME_DAYS`]
    TooLong,
}

/// Parse a token lifetime such as `30s`, `15m`, `12h` or `1d`.
pub fn parse_token_lifetime(value: &str) -> Result<Duration, LifetimeError> {
    let value = value.trim();
    let unit = value.chars().last().ok_or(LifetimeError::Malformed)?;
    let amount: i64 = value[..value.len() - unit.len_utf8()]
        .parse()
        .map_err(|_| LifetimeError::Malformed)?;
    if amount <= 0 {
        return Err(LifetimeError::Malformed);
    }
    let lifetime = match unit {
        's' => Duration::try_seconds(amount),
        'm' => Duration::try_minutes(amount),
        'h' => Duration::try_hours(amount),
        'd' => Duration::try_days(amount),
        _ => return Err(LifetimeError::Malformed),
    };
    match lifetime {
        Some(lifetime) if lifetime <= Duration::days(MAX_TOKEN_LIFETIME_DAYS) => Ok(lifetime),
        _ => Err(LifetimeError::TooLong),
    }
}

/// Like [`parse_token_lifetime`], falling back to one day on bad input
pub fn token_lifetime_or_default(value: &str) -> Duration {
    parse_token_lifetime(value).unwrap_or_else(|reason| {
        warn!(value, ?reason, "invalid token lifetime, using default of 1d");
        Duration::days(1)
    })
}

/// Builds `Set-Cookie` values for the session cookie
#[derive(Debug, Clone)]
pub struct SessionCookie {
    /// Add the `Secure` attribute
    pub secure: bool,

    /// Cookie lifetime, matching the token lifetime
    pub max_age: Duration,
}

impl SessionCookie {
    /// Cookie carrying a freshly issued token
    pub fn issue(&self, token: &str) -> String {
        self.render(token, self.max_age.num_seconds())
    }

    /// Cookie that makes the client drop the session
    pub fn clear(&self) -> String {
        self.render("", 0)
    }

    fn render(&self, value: &str, max_age: i64) -> String {
        let mut cookie = format!(
            "{SESSION_COOKIE}={value}; Max-Age={max_age}; Path=/; HttpOnly; SameSite=Strict"
        );
        if self.secure {
            cookie.push_str("; Secure");
        }
        cookie
    }
}

/// Find a cookie value in a `Cookie` request header
pub fn find_cookie<'a>(header: &'a str, name: &str) -> Option<&'a str> {
    header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value)
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_token_lifetime() {
        assert_eq!(parse_token_lifetime("30s"), Ok(Duration::seconds(30)));
        assert_eq!(parse_token_lifetime("15m"), Ok(Duration::minutes(15)));
        assert_eq!(parse_token_lifetime("12h"), Ok(Duration::hours(12)));
        assert_eq!(parse_token_lifetime("1d"), Ok(Duration::days(1)));
        assert_eq!(parse_token_lifetime("1w"), Err(LifetimeError::Malformed));
        assert_eq!(parse_token_lifetime("d"), Err(LifetimeError::Malformed));
        assert_eq!(parse_token_lifetime("0h"), Err(LifetimeError::Malformed));
        assert_eq!(parse_token_lifetime(""), Err(LifetimeError::Malformed));
    }

    #[test]
    fn test_lifetime_capped_at_one_year() {
        assert_eq!(parse_token_lifetime("365d"), Ok(Duration::days(365)));
        assert_eq!(parse_token_lifetime("366d"), Err(LifetimeError::TooLong));
        assert_eq!(parse_token_lifetime("8761h"), Err(LifetimeError::TooLong));
        assert_eq!(parse_token_lifetime("100000000d"), Err(LifetimeError::TooLong));
        assert_eq!(
            parse_token_lifetime("9223372036854775807d"),
            Err(LifetimeError::TooLong)
        );
    }

    #[test]
    fn test_invalid_lifetime_falls_back_to_one_day() {
        assert_eq!(token_lifetime_or_default("soon"), Duration::days(1));
        assert_eq!(token_lifetime_or_default("100000000d"), Duration::days(1));
    }

    #[test]
    fn test_issue_cookie_attributes() {
        let cookie = SessionCookie {
            secure: true,
            max_age: Duration::days(1),
        };
        let value = cookie.issue("abc.def.ghi");
        assert!(value.starts_with("jwt=abc.def.ghi;"));
        assert!(value.contains("Max-Age=86400"));
        assert!(value.contains("HttpOnly"));
        assert!(value.contains("SameSite=Strict"));
        assert!(value.ends_with("; Secure"));
    }

    #[test]
    fn test_clear_cookie_expires_immediately() {
        let cookie = SessionCookie {
            secure: false,
            max_age: Duration::days(1),
        };
        let value = cookie.clear();
        assert!(value.starts_with("jwt=;"));
        assert!(value.contains("Max-Age=0"));
        assert!(!value.contains("Secure"));
    }

    #[test]
    fn test_find_cookie() {
        let header = "theme=dark; jwt=abc.def.ghi; other=1";
        assert_eq!(find_cookie(header, "jwt"), Some("abc.def.ghi"));
        assert_eq!(find_cookie(header, "missing"), None);
        assert_eq!(find_cookie("jwt=", "jwt"), None);
    }
}
