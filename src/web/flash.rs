//! One-shot messages carried across a redirect in a short-lived cookie.

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

pub const FLASH_COOKIE: &str = "flash";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlashKind {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Flash {
    pub kind: FlashKind,
    pub message: String,
}

impl Flash {
    pub fn success(message: impl Into<String>) -> Self {
        Self { kind: FlashKind::Success, message: message.into() }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self { kind: FlashKind::Error, message: message.into() }
    }

    pub fn is_error(&self) -> bool {
        self.kind == FlashKind::Error
    }

    fn encode(&self) -> String {
        let prefix = match self.kind {
            FlashKind::Success => "s",
            FlashKind::Error => "e",
        };
        hex::encode(format!("{}:{}", prefix, self.message))
    }

    fn decode(value: &str) -> Option<Self> {
        let raw = String::from_utf8(hex::decode(value).ok()?).ok()?;
        let (prefix, message) = raw.split_once(':')?;
        let kind = match prefix {
            "s" => FlashKind::Success,
            "e" => FlashKind::Error,
            _ => return None,
        };
        Some(Self { kind, message: message.to_string() })
    }
}

pub fn set(jar: CookieJar, flash: Flash) -> CookieJar {
    jar.add(
        Cookie::build((FLASH_COOKIE, flash.encode()))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .max_age(cookie::time::Duration::minutes(5))
            .build(),
    )
}

/// Reads the pending message, if any, and clears it.
pub fn take(jar: CookieJar) -> (CookieJar, Option<Flash>) {
    let flash = jar.get(FLASH_COOKIE).and_then(|c| Flash::decode(c.value()));

    if jar.get(FLASH_COOKIE).is_none() {
        return (jar, None);
    }

    let jar = jar.remove(Cookie::build(FLASH_COOKIE).path("/").build());
    (jar, flash)
}
