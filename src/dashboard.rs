//! This file defines the dashboard route and its handlers.

use axum::{
    Extension,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use maud::html;

use crate::{
    AppState, endpoints,
    html::{PAGE_CONTAINER_STYLE, base, format_currency},
    ledger::{SqliteTransactionLedger, Summary},
    navigation::NavBar,
    user::UserID,
};

/// The state needed to render the dashboard.
#[derive(Debug, Clone)]
pub struct DashboardState {
    /// The ledger that transaction summaries are read from.
    pub ledger: SqliteTransactionLedger,
}

impl FromRef<AppState> for DashboardState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            ledger: state.ledger.clone(),
        }
    }
}

fn summary_card(title: &str, amount: f64) -> maud::Markup {
    html! {
        div class="p-6 bg-white border border-gray-200 rounded-lg shadow-sm dark:bg-gray-800 dark:border-gray-700"
        {
            h5 class="mb-2 text-sm font-medium text-gray-500 dark:text-gray-400" { (title) }
            p class="text-2xl font-bold" { (format_currency(amount)) }
        }
    }
}

/// Display a page with an overview of the user's finances.
pub async fn get_dashboard_page(
    State(state): State<DashboardState>,
    Extension(user_id): Extension<UserID>,
) -> Response {
    let nav_bar = NavBar::new(endpoints::DASHBOARD_VIEW);

    let Summary {
        total_income,
        total_expense,
        balance,
    } = match state.ledger.summarize(user_id) {
        Ok(summary) => summary,
        Err(error) => {
            tracing::error!("Unhandled error while summarizing transactions: {error}");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let content = html! {
        (nav_bar.into_html())

        main class=(PAGE_CONTAINER_STYLE)
        {
            h1 class="text-2xl font-bold mb-6" { "Dashboard" }

            div class="grid grid-cols-1 md:grid-cols-3 gap-4 w-full"
            {
                (summary_card("Income", total_income))
                (summary_card("Expenses", total_expense))
                (summary_card("Balance", balance))
            }
        }
    };

    base("Dashboard", &content).into_response()
}
