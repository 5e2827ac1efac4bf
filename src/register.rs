//! The registration page for creating a new user account.

use axum::{
    Form,
    extract::{FromRef, State},
    response::{IntoResponse, Redirect, Response},
};
use maud::{Markup, html};
use serde::{Deserialize, Serialize};

use crate::{
    AppState,
    credentials::{CredentialError, SqliteCredentialStore},
    endpoints,
    html::{BUTTON_PRIMARY_STYLE, base, log_in_register, password_input, text_input},
    password::PasswordHash,
};

/// Per-field error messages shown in the registration form.
#[derive(Default)]
struct RegistrationErrors<'a> {
    username: Option<&'a str>,
    password: Option<&'a str>,
    confirm_password: Option<&'a str>,
}

fn registration_form(username: &str, errors: RegistrationErrors) -> Markup {
    html! {
        form method="post" action=(endpoints::REGISTER_VIEW) class="space-y-4 md:space-y-6"
        {
            (text_input("username", "Username", username, errors.username))
            (password_input("password", "Password", errors.password))
            (password_input("confirm_password", "Confirm Password", errors.confirm_password))

            button type="submit" tabindex="0" class=(BUTTON_PRIMARY_STYLE)
            {
                "Create Account"
            }

            p class="text-sm font-light text-gray-500 dark:text-gray-400"
            {
                "Already have an account? "

                a
                    href=(endpoints::LOG_IN_VIEW) tabindex="0"
                    class="font-semibold leading-6 text-blue-600 hover:text-blue-500 dark:text-blue-500 dark:hover:text-blue-400"
                {
                    "Log in here"
                }
            }
        }
    }
}

/// Display the registration page.
pub async fn get_register_page() -> Response {
    let form = registration_form("", RegistrationErrors::default());
    let content = log_in_register("Create an account", &form);
    base("Register", &content).into_response()
}

/// The state needed for creating a new user.
#[derive(Debug, Clone)]
pub struct RegistrationState {
    /// The store that new user records are written to.
    pub credentials: SqliteCredentialStore,
}

impl FromRef<AppState> for RegistrationState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            credentials: state.credentials.clone(),
        }
    }
}

/// The data for the registration form.
#[derive(Serialize, Deserialize)]
pub struct RegisterForm {
    /// The name the user will log in with.
    pub username: String,
    /// The user's password in plain text.
    pub password: String,
    /// A repeat of `password` to catch typos.
    pub confirm_password: String,
}

/// Create a new user account and redirect to the log-in page.
///
/// On validation errors the registration page is rendered again with an
/// error message next to the offending field.
pub async fn register_user(
    State(state): State<RegistrationState>,
    Form(user_data): Form<RegisterForm>,
) -> Response {
    if user_data.password != user_data.confirm_password {
        let form = registration_form(
            &user_data.username,
            RegistrationErrors {
                confirm_password: Some("Passwords do not match"),
                ..Default::default()
            },
        );
        let content = log_in_register("Create an account", &form);

        return base("Register", &content).into_response();
    }

    match state.credentials.create_user(
        &user_data.username,
        &user_data.password,
        PasswordHash::DEFAULT_COST,
    ) {
        Ok(_) => Redirect::to(endpoints::LOG_IN_VIEW).into_response(),
        Err(error) => {
            let errors = match &error {
                CredentialError::DuplicateUsername => RegistrationErrors {
                    username: Some("That username is already taken"),
                    ..Default::default()
                },
                CredentialError::InvalidInput(message) if message.contains("password") => {
                    RegistrationErrors {
                        password: Some("The password must not be empty"),
                        ..Default::default()
                    }
                }
                CredentialError::InvalidInput(_) => RegistrationErrors {
                    username: Some("Please enter a valid username"),
                    ..Default::default()
                },
                CredentialError::Hashing(_) | CredentialError::Storage(_) => {
                    tracing::error!("an unhandled error occurred while creating a user: {error}");

                    RegistrationErrors {
                        username: Some("An unexpected error occurred, please try again"),
                        ..Default::default()
                    }
                }
            };

            let form = registration_form(&user_data.username, errors);
            let content = log_in_register("Create an account", &form);

            base("Register", &content).into_response()
        }
    }
}
