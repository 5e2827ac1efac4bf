//! Defines functions for carrying the session token in a private cookie.

use axum_extra::extract::{
    PrivateCookieJar,
    cookie::{Cookie, SameSite},
};
use time::{Duration, OffsetDateTime};

use crate::session::SessionToken;

pub(crate) const COOKIE_SESSION: &str = "session";

/// Add the session cookie to the cookie jar, indicating that a user is logged
/// in and authenticated.
///
/// The cookie expires after `duration`, matching the server-side session it
/// refers to. Returns the cookie jar with the cookie added.
pub(crate) fn set_session_cookie(
    jar: PrivateCookieJar,
    token: &SessionToken,
    duration: Duration,
) -> PrivateCookieJar {
    jar.add(
        Cookie::build((COOKIE_SESSION, token.as_str().to_owned()))
            .expires(OffsetDateTime::now_utc() + duration)
            .http_only(true)
            .same_site(SameSite::Strict)
            .secure(true),
    )
}

/// Set the session cookie to an invalid value and set its max age to zero,
/// which should delete the cookie on the client side.
pub(crate) fn invalidate_session_cookie(jar: PrivateCookieJar) -> PrivateCookieJar {
    jar.add(
        Cookie::build((COOKIE_SESSION, "deleted"))
            .expires(OffsetDateTime::UNIX_EPOCH)
            .max_age(Duration::ZERO)
            .http_only(true)
            .same_site(SameSite::Strict)
            .secure(true),
    )
}

/// Read the session token from the cookie jar, if present.
///
/// A missing cookie means the client is anonymous; whether the token still
/// maps to a live session is for the session authenticator to decide.
pub(crate) fn session_token_from_cookies(jar: &PrivateCookieJar) -> Option<SessionToken> {
    jar.get(COOKIE_SESSION)
        .map(|cookie| SessionToken::from_raw(cookie.value_trimmed()))
}
