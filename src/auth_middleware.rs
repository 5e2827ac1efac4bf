//! Authentication middleware that resolves the session cookie and guards
//! protected routes.

use axum::{
    extract::{FromRef, FromRequestParts, Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::{PrivateCookieJar, cookie::Key};

use crate::{
    AppState, auth_cookie::session_token_from_cookies, endpoints, session::SessionAuthenticator,
};

/// The state needed for the auth middleware.
#[derive(Clone)]
pub struct AuthState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// The authenticator that maps session tokens to users.
    pub sessions: SessionAuthenticator,
}

impl FromRef<AppState> for AuthState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            sessions: state.sessions.clone(),
        }
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<AuthState> for Key {
    fn from_ref(state: &AuthState) -> Self {
        state.cookie_key.clone()
    }
}

/// Middleware function that checks for a valid session cookie.
///
/// The user ID is placed into the request and the request executed normally
/// if the session is valid, otherwise a redirect to the log-in page is
/// returned.
///
/// **Note**: Route handlers can use the function argument
/// `Extension(user_id): Extension<UserID>` to receive the user ID.
///
/// **Note**: The app state must contain an `axum_extra::extract::cookie::Key`
/// for decrypting and verifying the cookie contents.
pub async fn auth_guard(State(state): State<AuthState>, request: Request, next: Next) -> Response {
    let (mut parts, body) = request.into_parts();

    let jar = match PrivateCookieJar::from_request_parts(&mut parts, &state).await {
        Ok(jar) => jar,
        Err(err) => {
            tracing::error!("Error getting cookie jar: {err:?}. Redirecting to log in page.");
            return Redirect::to(endpoints::LOG_IN_VIEW).into_response();
        }
    };

    let token = session_token_from_cookies(&jar);
    let user = match state.sessions.require_authenticated(token.as_ref()) {
        Ok(user) => user,
        Err(error) => {
            tracing::debug!("Rejected request to protected route: {error}");
            return Redirect::to(endpoints::LOG_IN_VIEW).into_response();
        }
    };

    parts.extensions.insert(user.id());
    let request = Request::from_parts(parts, body);

    next.run(request).await
}

#[cfg(test)]
mod auth_guard_tests {
    use axum::{Extension, Router, extract::State, middleware, routing::get};
    use axum_extra::extract::PrivateCookieJar;
    use axum_test::TestServer;
    use rusqlite::Connection;

    use crate::{
        AppState,
        auth_cookie::{COOKIE_SESSION, set_session_cookie},
        endpoints,
        user::UserID,
    };

    use super::{AuthState, auth_guard};

    const TEST_LOG_IN_ROUTE: &str = "/log_in";
    const TEST_PROTECTED_ROUTE: &str = "/protected";

    async fn protected_handler(Extension(user_id): Extension<UserID>) -> String {
        format!("user {user_id}")
    }

    async fn stub_log_in_route(
        State(state): State<AuthState>,
        jar: PrivateCookieJar,
    ) -> PrivateCookieJar {
        let token = state
            .sessions
            .login("alice", "hunter2")
            .expect("Could not log in test user");

        set_session_cookie(jar, &token, state.sessions.session_duration())
    }

    fn get_test_server() -> TestServer {
        let conn = Connection::open_in_memory().unwrap();
        let state = AppState::new(conn, "42").unwrap();
        state
            .credentials
            .create_user("alice", "hunter2", 4)
            .unwrap();

        let app = Router::new()
            .route(TEST_PROTECTED_ROUTE, get(protected_handler))
            .route_layer(middleware::from_fn_with_state(state.clone(), auth_guard))
            .route(TEST_LOG_IN_ROUTE, get(stub_log_in_route))
            .with_state(state);

        TestServer::new(app)
    }

    #[tokio::test]
    async fn get_protected_route_with_no_session_cookie_redirects_to_log_in() {
        let server = get_test_server();

        let response = server.get(TEST_PROTECTED_ROUTE).await;

        response.assert_status_see_other();
        assert_eq!(response.header("location"), endpoints::LOG_IN_VIEW);
    }

    #[tokio::test]
    async fn get_protected_route_with_valid_session_cookie_succeeds() {
        let server = get_test_server();

        let log_in_response = server.get(TEST_LOG_IN_ROUTE).await;
        log_in_response.assert_status_ok();
        let session_cookie = log_in_response.cookie(COOKIE_SESSION);

        let response = server
            .get(TEST_PROTECTED_ROUTE)
            .add_cookie(session_cookie)
            .await;

        response.assert_status_ok();
        response.assert_text("user 1");
    }

    #[tokio::test]
    async fn get_protected_route_with_garbage_cookie_redirects_to_log_in() {
        let server = get_test_server();

        let response = server
            .get(TEST_PROTECTED_ROUTE)
            .add_cookie(axum_extra::extract::cookie::Cookie::new(
                COOKIE_SESSION,
                "not a real token",
            ))
            .await;

        response.assert_status_see_other();
        assert_eq!(response.header("location"), endpoints::LOG_IN_VIEW);
    }
}
