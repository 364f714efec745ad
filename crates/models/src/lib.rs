//! Record types for the travel-expense backend plus the SeaORM entity used
//! when documents are persisted in PostgreSQL.

pub mod errors;
pub mod db;
pub mod document;
pub mod expense;
pub mod user;
pub mod validate;

#[cfg(test)]
mod tests;
