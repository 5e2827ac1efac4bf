//! This file defines the routes for displaying the log-in page and handling
//! log-in requests. The session module handles the lower level authentication
//! logic.

use axum::{
    Form,
    extract::{FromRef, State},
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::{PrivateCookieJar, cookie::Key};
use maud::{Markup, html};
use serde::{Deserialize, Serialize};

use crate::{
    AppState,
    auth_cookie::set_session_cookie,
    endpoints,
    html::{BUTTON_PRIMARY_STYLE, base, log_in_register, password_input, text_input},
    session::{AuthError, SessionAuthenticator},
};

/// The error message shown when the username or password is wrong.
///
/// The same message covers both cases so that the response does not reveal
/// which usernames are registered.
pub const INVALID_CREDENTIALS_ERROR_MSG: &str = "Incorrect username or password.";

fn log_in_form(username: &str, error_message: Option<&str>) -> Markup {
    html! {
        form method="post" action=(endpoints::LOG_IN_VIEW) class="space-y-4 md:space-y-6"
        {
            (text_input("username", "Username", username, None))
            (password_input("password", "Password", error_message))

            button type="submit" tabindex="0" class=(BUTTON_PRIMARY_STYLE)
            {
                "Log in"
            }

            p class="text-sm font-light text-gray-500 dark:text-gray-400"
            {
                "Don't have an account? "

                a
                    href=(endpoints::REGISTER_VIEW) tabindex="0"
                    class="font-semibold leading-6 text-blue-600 hover:text-blue-500 dark:text-blue-500 dark:hover:text-blue-400"
                {
                    "Register here"
                }
            }
        }
    }
}

fn log_in_page(username: &str, error_message: Option<&str>) -> Response {
    let form = log_in_form(username, error_message);
    let content = log_in_register("Log in to your account", &form);

    base("Log in", &content).into_response()
}

/// Display the log-in page.
pub async fn get_log_in_page() -> Response {
    log_in_page("", None)
}

/// The state needed to perform a log-in.
#[derive(Debug, Clone)]
pub struct LogInState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// The authenticator that issues session tokens.
    pub sessions: SessionAuthenticator,
}

impl FromRef<AppState> for LogInState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            sessions: state.sessions.clone(),
        }
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<LogInState> for Key {
    fn from_ref(state: &LogInState) -> Self {
        state.cookie_key.clone()
    }
}

/// The raw data entered by the user in the log-in form.
///
/// The username and password are stored as plain strings. There is no need for
/// validation here since they will be compared against the username and
/// password in the database, which have been verified.
#[derive(Clone, Serialize, Deserialize)]
pub struct LogInData {
    /// Username entered during log-in.
    pub username: String,
    /// Password entered during log-in.
    pub password: String,
}

/// Handler for log-in requests via the POST method.
///
/// On a successful log-in request the session cookie is set and the client is
/// redirected to the dashboard page. Otherwise, the log-in page is rendered
/// again with an error message.
pub async fn post_log_in(
    State(state): State<LogInState>,
    jar: PrivateCookieJar,
    Form(user_data): Form<LogInData>,
) -> Response {
    let token = match state
        .sessions
        .login(&user_data.username, &user_data.password)
    {
        Ok(token) => token,
        Err(AuthError::InvalidCredentials) => {
            return log_in_page(&user_data.username, Some(INVALID_CREDENTIALS_ERROR_MSG));
        }
        Err(error) => {
            tracing::error!("Unhandled error while verifying credentials: {error}");

            return log_in_page(
                &user_data.username,
                Some("An internal error occurred. Please try again later."),
            );
        }
    };

    let jar = set_session_cookie(jar, &token, state.sessions.session_duration());

    (jar, Redirect::to(endpoints::DASHBOARD_VIEW)).into_response()
}

#[cfg(test)]
mod log_in_page_tests {
    use axum::http::{StatusCode, header::CONTENT_TYPE};
    use scraper::Html;

    use crate::endpoints;

    use super::get_log_in_page;

    #[tokio::test]
    async fn log_in_page_displays_form() {
        let response = get_log_in_page().await;

        assert_eq!(response.status(), StatusCode::OK);
        assert!(
            response
                .headers()
                .get(CONTENT_TYPE)
                .unwrap()
                .to_str()
                .unwrap()
                .starts_with("text/html")
        );

        let body = response.into_body();
        let body = axum::body::to_bytes(body, usize::MAX).await.unwrap();
        let text = String::from_utf8_lossy(&body).to_string();
        let document = scraper::Html::parse_document(&text);
        assert_valid_html(&document);

        let form_selector = scraper::Selector::parse("form").unwrap();
        let forms = document.select(&form_selector).collect::<Vec<_>>();
        assert_eq!(forms.len(), 1, "want 1 form, got {}", forms.len());
        let form = forms.first().unwrap();
        assert_eq!(
            form.value().attr("action"),
            Some(endpoints::LOG_IN_VIEW),
            "want form posting to {}, got {:?}",
            endpoints::LOG_IN_VIEW,
            form.value().attr("action")
        );

        for selector_string in ["input[type=text]", "input[type=password]", "button[type=submit]"] {
            let selector = scraper::Selector::parse(selector_string).unwrap();
            let elements = form.select(&selector).collect::<Vec<_>>();
            assert_eq!(
                elements.len(),
                1,
                "want 1 element matching {selector_string}, got {}",
                elements.len()
            );
        }

        let register_link_selector = scraper::Selector::parse("a[href]").unwrap();
        let links = form.select(&register_link_selector).collect::<Vec<_>>();
        assert_eq!(links.len(), 1, "want 1 link, got {}", links.len());
        let link = links.first().unwrap();
        assert_eq!(
            link.value().attr("href"),
            Some(endpoints::REGISTER_VIEW),
            "want link to {}, got {:?}",
            endpoints::REGISTER_VIEW,
            link.value().attr("href")
        );
    }

    #[track_caller]
    fn assert_valid_html(html: &Html) {
        assert!(
            html.errors.is_empty(),
            "Got HTML parsing errors: {:?}",
            html.errors
        );
    }
}
