use axum::http::{header, HeaderMap, HeaderValue};
use time::{macros::format_description, Duration, OffsetDateTime, UtcOffset};

pub const COOKIE_NAME: &str = "user_id";

/// How long the identity cookie stays valid in the browser.
pub const COOKIE_TTL: Duration = Duration::days(365);

/// Value of the first `user_id` cookie across all `Cookie` headers.
pub fn read_user_id(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|line| line.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| name.trim() == COOKIE_NAME)
        .map(|(_, value)| value.trim().trim_matches('"').to_string())
}

/// `Set-Cookie` value for a freshly issued identity.
pub fn issue(user_id: &str, now: OffsetDateTime) -> anyhow::Result<HeaderValue> {
    // IMF-fixdate, e.g. `Sun, 06 Nov 1994 08:49:37 GMT`.
    let expires = (now + COOKIE_TTL).to_offset(UtcOffset::UTC).format(format_description!(
        "[weekday repr:short], [day] [month repr:short] [year] [hour]:[minute]:[second] GMT"
    ))?;
    let cookie = format!("{}={}; Path=/; Expires={}", COOKIE_NAME, user_id, expires);
    Ok(HeaderValue::from_str(&cookie)?)
}
