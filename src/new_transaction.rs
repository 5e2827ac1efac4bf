//! The page and handler for recording a new transaction.

use axum::{
    Extension, Form,
    extract::{FromRef, State},
    response::{IntoResponse, Redirect, Response},
};
use maud::{Markup, html};
use serde::{Deserialize, Serialize};

use crate::{
    AppState, endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, PAGE_CONTAINER_STYLE, base,
        text_input,
    },
    ledger::{LedgerError, SqliteTransactionLedger},
    navigation::NavBar,
    transaction::TransactionKind,
    user::UserID,
};

/// The state needed to record a new transaction.
#[derive(Debug, Clone)]
pub struct NewTransactionState {
    /// The ledger that new transactions are written to.
    pub ledger: SqliteTransactionLedger,
}

impl FromRef<AppState> for NewTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            ledger: state.ledger.clone(),
        }
    }
}

/// The data for the new transaction form.
#[derive(Serialize, Deserialize)]
pub struct TransactionForm {
    /// Either `income` or `expense`.
    pub kind: String,
    /// A short note on what the transaction was for.
    pub description: String,
    /// The amount of money as entered by the user.
    pub amount: String,
    /// The date the transaction occurred, e.g. `2024-01-31`.
    pub date: String,
}

impl TransactionForm {
    fn empty() -> Self {
        Self {
            kind: TransactionKind::Expense.as_str().to_string(),
            description: String::new(),
            amount: String::new(),
            date: String::new(),
        }
    }
}

fn kind_select(selected: &str) -> Markup {
    html! {
        div
        {
            label for="kind" class=(FORM_LABEL_STYLE) { "Kind" }

            select name="kind" id="kind" class=(FORM_TEXT_INPUT_STYLE) required
            {
                @for kind in [TransactionKind::Income, TransactionKind::Expense]
                {
                    option value=(kind.as_str()) selected[selected == kind.as_str()]
                    {
                        (kind.as_str())
                    }
                }
            }
        }
    }
}

fn new_transaction_form(form: &TransactionForm, error_message: Option<&str>) -> Markup {
    html! {
        form method="post" action=(endpoints::NEW_TRANSACTION_VIEW) class="space-y-4 md:space-y-6 w-full max-w-md"
        {
            (kind_select(&form.kind))
            (text_input("description", "Description", &form.description, None))
            (text_input("amount", "Amount", &form.amount, None))

            div
            {
                label for="date" class=(FORM_LABEL_STYLE) { "Date" }

                input
                    type="date"
                    name="date"
                    id="date"
                    value=(form.date)
                    class=(FORM_TEXT_INPUT_STYLE)
                    required;
            }

            @if let Some(error_message) = error_message
            {
                p class="text-red-500 text-base" { (error_message) }
            }

            button type="submit" tabindex="0" class=(BUTTON_PRIMARY_STYLE)
            {
                "Add Transaction"
            }
        }
    }
}

fn new_transaction_page(form: &TransactionForm, error_message: Option<&str>) -> Response {
    let nav_bar = NavBar::new(endpoints::NEW_TRANSACTION_VIEW);

    let content = html! {
        (nav_bar.into_html())

        main class=(PAGE_CONTAINER_STYLE)
        {
            h1 class="text-2xl font-bold mb-6" { "Add Transaction" }

            (new_transaction_form(form, error_message))
        }
    };

    base("Add Transaction", &content).into_response()
}

/// Display the form for recording a new transaction.
pub async fn get_new_transaction_page() -> Response {
    new_transaction_page(&TransactionForm::empty(), None)
}

/// Record a new transaction and redirect to the dashboard.
///
/// On validation errors the form is rendered again with an error message and
/// nothing is recorded.
pub async fn create_transaction(
    State(state): State<NewTransactionState>,
    Extension(user_id): Extension<UserID>,
    Form(form): Form<TransactionForm>,
) -> Response {
    match state.ledger.add_transaction(
        user_id,
        &form.kind,
        &form.description,
        &form.amount,
        &form.date,
    ) {
        Ok(_) => Redirect::to(endpoints::DASHBOARD_VIEW).into_response(),
        Err(error @ (LedgerError::MissingField(_) | LedgerError::InvalidAmount(_))) => {
            new_transaction_page(&form, Some(&error.to_string()))
        }
        Err(error) => {
            tracing::error!("Unhandled error while recording a transaction: {error}");

            new_transaction_page(
                &form,
                Some("An internal error occurred. Please try again later."),
            )
        }
    }
}

#[cfg(test)]
mod new_transaction_page_tests {
    use axum::http::StatusCode;
    use scraper::{Html, Selector};

    use crate::endpoints;

    use super::get_new_transaction_page;

    #[tokio::test]
    async fn new_transaction_page_displays_form() {
        let response = get_new_transaction_page().await;

        assert_eq!(response.status(), StatusCode::OK);

        let body = response.into_body();
        let body = axum::body::to_bytes(body, usize::MAX).await.unwrap();
        let text = String::from_utf8_lossy(&body).to_string();
        let document = Html::parse_document(&text);

        let form_selector = Selector::parse("form").unwrap();
        let forms = document.select(&form_selector).collect::<Vec<_>>();
        assert_eq!(forms.len(), 1, "want 1 form, got {}", forms.len());
        let form = forms.first().unwrap();
        assert_eq!(
            form.value().attr("action"),
            Some(endpoints::NEW_TRANSACTION_VIEW),
            "want form posting to {}, got {:?}",
            endpoints::NEW_TRANSACTION_VIEW,
            form.value().attr("action")
        );

        for selector_string in [
            "select#kind",
            "input#description",
            "input#amount",
            "input[type=date]#date",
        ] {
            let selector = Selector::parse(selector_string).unwrap();
            let elements = form.select(&selector).collect::<Vec<_>>();
            assert_eq!(
                elements.len(),
                1,
                "want 1 element matching {selector_string}, got {}",
                elements.len()
            );
        }

        let option_selector = Selector::parse("select#kind option").unwrap();
        let options = form
            .select(&option_selector)
            .filter_map(|option| option.value().attr("value"))
            .collect::<Vec<_>>();
        assert_eq!(options, vec!["income", "expense"]);
    }
}

#[cfg(test)]
mod create_transaction_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Extension,
        body::Body,
        extract::State,
        http::{Response, StatusCode},
    };
    use rusqlite::Connection;
    use scraper::{Html, Selector};

    use crate::{
        credentials::SqliteCredentialStore, db::initialize, ledger::SqliteTransactionLedger,
        user::UserID,
    };

    use super::{NewTransactionState, TransactionForm, create_transaction};

    fn get_test_state() -> (NewTransactionState, UserID) {
        let connection =
            Connection::open_in_memory().expect("Could not open in-memory SQLite database");
        initialize(&connection).expect("Could not initialize database");

        let connection = Arc::new(Mutex::new(connection));
        let credentials = SqliteCredentialStore::new(connection.clone());
        let user = credentials
            .create_user("alice", "averysecurepassword", 4)
            .expect("Could not create test user");

        (
            NewTransactionState {
                ledger: SqliteTransactionLedger::new(connection),
            },
            user.id(),
        )
    }

    #[tokio::test]
    async fn create_transaction_succeeds_and_redirects() {
        let (state, user_id) = get_test_state();

        let response = create_transaction(
            State(state.clone()),
            Extension(user_id),
            axum::Form(TransactionForm {
                kind: "income".to_string(),
                description: "Salary".to_string(),
                amount: "1500.00".to_string(),
                date: "2024-01-01".to_string(),
            }),
        )
        .await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);

        let transactions = state
            .ledger
            .list_transactions(user_id)
            .expect("Could not list transactions");
        assert_eq!(transactions.len(), 1);
        assert_eq!(transactions[0].description, "Salary");
    }

    #[tokio::test]
    async fn create_transaction_rejects_missing_description() {
        let (state, user_id) = get_test_state();

        let response = create_transaction(
            State(state.clone()),
            Extension(user_id),
            axum::Form(TransactionForm {
                kind: "income".to_string(),
                description: "".to_string(),
                amount: "1500.00".to_string(),
                date: "2024-01-01".to_string(),
            }),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_error_message_contains(response, "description").await;

        let transactions = state
            .ledger
            .list_transactions(user_id)
            .expect("Could not list transactions");
        assert!(transactions.is_empty(), "nothing should be recorded");
    }

    #[tokio::test]
    async fn create_transaction_rejects_invalid_amount() {
        let (state, user_id) = get_test_state();

        let response = create_transaction(
            State(state.clone()),
            Extension(user_id),
            axum::Form(TransactionForm {
                kind: "expense".to_string(),
                description: "Rent".to_string(),
                amount: "abc".to_string(),
                date: "2024-01-02".to_string(),
            }),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_error_message_contains(response, "abc").await;

        let transactions = state
            .ledger
            .list_transactions(user_id)
            .expect("Could not list transactions");
        assert!(transactions.is_empty(), "nothing should be recorded");
    }

    async fn assert_error_message_contains(response: Response<Body>, want: &str) {
        let body = response.into_body();
        let body = axum::body::to_bytes(body, usize::MAX).await.unwrap();
        let text = String::from_utf8_lossy(&body).to_string();
        let document = Html::parse_document(&text);

        let p_selector = Selector::parse("p.text-red-500").unwrap();
        let paragraphs = document.select(&p_selector).collect::<Vec<_>>();
        assert_eq!(paragraphs.len(), 1, "want 1 p, got {}", paragraphs.len());
        let paragraph_text = paragraphs[0].text().collect::<String>().to_lowercase();
        assert!(
            paragraph_text.contains(want),
            "'{paragraph_text}' does not contain the text '{want}'"
        );
    }
}
