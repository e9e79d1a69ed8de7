use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use sha1::Sha1;

pub const SESSION_COOKIE: &str = "admin_session";
pub const SESSION_TTL_HOURS: i64 = 12;

type HmacSha1 = Hmac<Sha1>;

fn mac(secret: &str) -> Option<HmacSha1> {
    HmacSha1::new_from_slice(secret.as_bytes()).ok()
}

/// Session value `<expiry unix seconds>.<base64url hmac>`.
pub fn issue(secret: &str, now: DateTime<Utc>) -> Option<String> {
    let expires = (now + Duration::hours(SESSION_TTL_HOURS)).timestamp();
    let mut mac = mac(secret)?;
    mac.update(expires.to_string().as_bytes());
    let sig = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());
    Some(format!("{expires}.{sig}"))
}

pub fn verify(secret: &str, value: &str, now: DateTime<Utc>) -> bool {
    let Some((expires, sig)) = value.split_once('.') else {
        return false;
    };
    let Ok(expires_at) = expires.parse::<i64>() else {
        return false;
    };
    if expires_at <= now.timestamp() {
        return false;
    }
    let Ok(sig) = URL_SAFE_NO_PAD.decode(sig) else {
        return false;
    };
    let Some(mut mac) = mac(secret) else {
        return false;
    };
    mac.update(expires.as_bytes());
    mac.verify_slice(&sig).is_ok()
}

pub fn set_cookie_header(value: &str, secure: bool) -> String {
    let mut cookie = format!(
        "{SESSION_COOKIE}={value}; HttpOnly; SameSite=Lax; Path=/; Max-Age={}",
        SESSION_TTL_HOURS * 3600
    );
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

pub fn clear_cookie_header(secure: bool) -> String {
    let mut cookie = format!("{SESSION_COOKIE}=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0");
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// Extracts a cookie value from a raw `Cookie` header.
pub fn cookie_value<'a>(header: &'a str, name: &str) -> Option<&'a str> {
    header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(k, _)| *k == name)
        .map(|(_, v)| v)
}
