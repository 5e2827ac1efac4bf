//! Displays the user's transactions in a table.

use axum::{
    Extension,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use maud::html;

use crate::{
    AppState, endpoints,
    html::{
        LINK_STYLE, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE,
        base, format_currency,
    },
    ledger::SqliteTransactionLedger,
    navigation::NavBar,
    user::UserID,
};

/// The state needed for the [get_transactions_page](crate::transactions_page::get_transactions_page) route handler.
#[derive(Debug, Clone)]
pub struct TransactionsState {
    /// The ledger that transactions are read from.
    pub ledger: SqliteTransactionLedger,
}

impl FromRef<AppState> for TransactionsState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            ledger: state.ledger.clone(),
        }
    }
}

/// Display a page listing the user's transactions in the order they were
/// recorded.
pub async fn get_transactions_page(
    State(state): State<TransactionsState>,
    Extension(user_id): Extension<UserID>,
) -> Response {
    let nav_bar = NavBar::new(endpoints::TRANSACTIONS_VIEW);

    let transactions = match state.ledger.list_transactions(user_id) {
        Ok(transactions) => transactions,
        Err(error) => {
            tracing::error!("Unhandled error while listing transactions: {error}");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let content = html! {
        (nav_bar.into_html())

        main class=(PAGE_CONTAINER_STYLE)
        {
            h1 class="text-2xl font-bold mb-6" { "Transactions" }

            @if transactions.is_empty() {
                p
                {
                    "No transactions yet. "

                    a href=(endpoints::NEW_TRANSACTION_VIEW) class=(LINK_STYLE)
                    {
                        "Add your first transaction"
                    }
                }
            } @else {
                table class="w-full text-sm text-left rtl:text-right text-gray-500 dark:text-gray-400"
                {
                    thead class=(TABLE_HEADER_STYLE)
                    {
                        tr
                        {
                            th scope="col" class=(TABLE_CELL_STYLE) { "Kind" }
                            th scope="col" class=(TABLE_CELL_STYLE) { "Description" }
                            th scope="col" class=(TABLE_CELL_STYLE) { "Amount" }
                            th scope="col" class=(TABLE_CELL_STYLE) { "Date" }
                        }
                    }

                    tbody
                    {
                        @for transaction in &transactions
                        {
                            tr class=(TABLE_ROW_STYLE)
                            {
                                td class=(TABLE_CELL_STYLE) { (transaction.kind.as_str()) }
                                td class=(TABLE_CELL_STYLE) { (transaction.description) }
                                td class=(TABLE_CELL_STYLE) { (format_currency(transaction.amount)) }
                                td class=(TABLE_CELL_STYLE) { (transaction.date) }
                            }
                        }
                    }
                }
            }
        }
    };

    base("Transactions", &content).into_response()
}
