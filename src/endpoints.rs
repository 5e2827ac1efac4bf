//! The application route URIs.

/// The root route which redirects logged-in users to the dashboard.
pub const ROOT: &str = "/";
/// The landing page for logged in users.
pub const DASHBOARD_VIEW: &str = "/dashboard";
/// The page for displaying a user's transactions.
pub const TRANSACTIONS_VIEW: &str = "/transactions";
/// The page and endpoint for creating a new transaction.
pub const NEW_TRANSACTION_VIEW: &str = "/transactions/new";
/// The page and endpoint for registering a new user.
pub const REGISTER_VIEW: &str = "/register";
/// The page and endpoint for logging in a user.
pub const LOG_IN_VIEW: &str = "/log_in";
/// The route for logging out the current user.
pub const LOG_OUT: &str = "/log_out";
