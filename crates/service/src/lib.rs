//! Service layer for travel expenses and users.
//! - Business rules live here; persistence goes through an injected `DocumentStore`.
//! - Reuses validation and record definitions from the `models` crate.
//! - Provides clear error types and documented interfaces.

pub mod bootstrap;
pub mod errors;
pub mod expense_store;
pub mod messages;
pub mod pagination;
pub mod password;
pub mod storage;
#[cfg(test)]
pub mod test_support;
pub mod user_store;

pub use bootstrap::Stores;
pub use errors::ServiceError;
pub use expense_store::{CursorPage, ExpenseAdded, ExpensePage, ExpenseStore};
pub use user_store::{UserAdded, UserStore};
