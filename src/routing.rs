//! Application router configuration with protected and unprotected route
//! definitions.

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    middleware,
    response::{IntoResponse, Redirect, Response},
    routing::get,
};
use axum_extra::extract::PrivateCookieJar;
use maud::html;

use crate::{
    AppState,
    auth_cookie::session_token_from_cookies,
    auth_middleware::{AuthState, auth_guard},
    dashboard::get_dashboard_page,
    endpoints,
    html::{BUTTON_PRIMARY_STYLE, LINK_STYLE, PAGE_CONTAINER_STYLE, base},
    log_in::{get_log_in_page, post_log_in},
    log_out::get_log_out,
    new_transaction::{create_transaction, get_new_transaction_page},
    register::{get_register_page, register_user},
    transactions_page::get_transactions_page,
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    let unprotected_routes = Router::new()
        .route(endpoints::ROOT, get(get_index_page))
        .route(endpoints::LOG_IN_VIEW, get(get_log_in_page).post(post_log_in))
        .route(
            endpoints::REGISTER_VIEW,
            get(get_register_page).post(register_user),
        )
        .route(endpoints::LOG_OUT, get(get_log_out));

    let protected_routes = Router::new()
        .route(endpoints::DASHBOARD_VIEW, get(get_dashboard_page))
        .route(endpoints::TRANSACTIONS_VIEW, get(get_transactions_page))
        .route(
            endpoints::NEW_TRANSACTION_VIEW,
            get(get_new_transaction_page).post(create_transaction),
        )
        .layer(middleware::from_fn_with_state(state.clone(), auth_guard));

    protected_routes
        .merge(unprotected_routes)
        .fallback(get_404_not_found)
        .with_state(state)
}

/// The public landing page at the root path '/'.
///
/// Visitors with a valid session are sent straight to the dashboard,
/// everyone else gets a welcome page linking to log in and registration.
async fn get_index_page(State(state): State<AuthState>, jar: PrivateCookieJar) -> Response {
    let token = session_token_from_cookies(&jar);

    if state.sessions.require_authenticated(token.as_ref()).is_ok() {
        return Redirect::to(endpoints::DASHBOARD_VIEW).into_response();
    }

    let content = html! {
        main class=(PAGE_CONTAINER_STYLE)
        {
            h1 class="text-2xl font-bold mb-6" { "Welcome to Saldo" }

            p class="mb-6" { "Track your income and expenses in one place." }

            p
            {
                a href=(endpoints::LOG_IN_VIEW) class=(BUTTON_PRIMARY_STYLE) { "Log in" }
            }

            p class="mt-4"
            {
                "New here? "

                a href=(endpoints::REGISTER_VIEW) class=(LINK_STYLE) { "Create an account" }
            }
        }
    };

    base("Welcome", &content).into_response()
}

/// The 404 page shown when no route matches the request path.
async fn get_404_not_found() -> Response {
    let content = html! {
        main class=(PAGE_CONTAINER_STYLE)
        {
            h1 class="text-2xl font-bold mb-6" { "Page not found" }

            p
            {
                "The page you are looking for does not exist. "

                a href=(endpoints::DASHBOARD_VIEW) class=(LINK_STYLE) { "Go to the dashboard" }
            }
        }
    };

    (StatusCode::NOT_FOUND, base("Not Found", &content)).into_response()
}
