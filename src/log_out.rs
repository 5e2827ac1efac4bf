//! Log-out route handler that discards the user's session and redirects them
//! to the log-in page.

use axum::{
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::PrivateCookieJar;

use crate::{
    auth_cookie::{invalidate_session_cookie, session_token_from_cookies},
    auth_middleware::AuthState,
    endpoints,
};

/// Discard the session, invalidate the session cookie and redirect the client
/// to the log-in page.
pub async fn get_log_out(State(state): State<AuthState>, jar: PrivateCookieJar) -> Response {
    if let Some(token) = session_token_from_cookies(&jar) {
        state.sessions.logout(&token);
    }

    let jar = invalidate_session_cookie(jar);

    (jar, Redirect::to(endpoints::LOG_IN_VIEW)).into_response()
}
