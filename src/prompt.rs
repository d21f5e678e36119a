//! Prompt text for the statement-to-CSV generation request.
//!
//! Centralising every prompt here serves two purposes:
//!
//! 1. **Single source of truth** — changing the requested CSV shape (a new
//!    summary row, another category) requires editing exactly one place.
//!
//! 2. **Testability** — unit tests can inspect the prompt directly without
//!    calling a real generation service, making prompt regressions easy to
//!    catch.
//!
//! Callers can override the system instruction via
//! [`crate::config::ConversionConfig::system_prompt`]; the constants here are
//! used when no override is provided.

/// Default system instruction sent with every generation request.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant.";

/// Title of the first requested table.
pub const ACCOUNT_SUMMARY_TITLE: &str = "Account Summary";

/// Column headers of the first requested table.
pub const ACCOUNT_SUMMARY_HEADER: &str = "Name, Amount";

/// The fixed rows of the account-summary table, in order.
pub const ACCOUNT_SUMMARY_ROWS: [&str; 5] = [
    "Transactions",
    "Fees",
    "Interest",
    "New Balance",
    "Rewards Balance",
];

/// Column headers of the per-transaction table.
pub const EXPENSE_TABLE_HEADER: &str =
    "Expense Name, Description, Trans Date, Post Date, Amount (USD), Category";

/// The closed set of expense categories the service must choose from.
pub const EXPENSE_CATEGORIES: [&str; 8] = [
    "restaurant",
    "groceries",
    "entertainment",
    "rent",
    "gas",
    "transportation",
    "shopping",
    "miscellaneous",
];

/// Build the conversion instruction for one statement.
///
/// `table_name` is the statement name (source file base name) and becomes
/// the second table's title. The statement text is embedded verbatim; no
/// chunking is applied even when the text exceeds the service's context
/// window.
pub fn conversion_prompt(statement_text: &str, table_name: &str) -> String {
    format!(
        "I have a credit card statement with the following data:\n\
         \n\
         {statement_text}\n\
         \n\
         Please format this into a CSV file with two tables:\n\
         \n\
         Table 1: {summary_title}\n\
         Column Headers: {summary_header}\n\
         Rows: {summary_rows}\n\
         \n\
         Table 2: {table_name}\n\
         Column Headers: {expense_header}\n\
         Category options: {categories}.\n\
         Rows: Each transaction parsed from the statement.\n",
        summary_title = ACCOUNT_SUMMARY_TITLE,
        summary_header = ACCOUNT_SUMMARY_HEADER,
        summary_rows = ACCOUNT_SUMMARY_ROWS.join(", "),
        expense_header = EXPENSE_TABLE_HEADER,
        categories = EXPENSE_CATEGORIES.join(", "),
    )
}
