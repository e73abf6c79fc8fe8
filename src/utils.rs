use axum::http::{header::InvalidHeaderValue, HeaderValue};

use crate::names;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub fn cookie(
    name: &str,
    value: &str,
    secure: bool,
) -> Result<HeaderValue, InvalidHeaderValue> {
    let secure = if secure { " Secure;" } else { "" };
    let max_age = names::SESSION_MAX_AGE.as_secs();
    HeaderValue::from_str(&format!(
        "{name}={value}; HttpOnly; Max-Age={max_age};{secure} Path=/; SameSite=Strict"
    ))
}

pub fn expired_cookie(name: &str) -> Result<HeaderValue, InvalidHeaderValue> {
    HeaderValue::from_str(&format!("{name}=; HttpOnly; Max-Age=0; Path=/; SameSite=Strict"))
}
