#![cfg(test)]
use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use models::expense::NewExpense;
use models::user::{NewUser, Role};

use crate::password::PasswordHasher;
use crate::storage::{Document, DocumentStore, Filter, Query, StoreError};

/// Backend whose every call fails, for error-path tests.
pub struct FailingStore;

fn unavailable() -> StoreError {
    StoreError::Backend("connection reset".into())
}

#[async_trait]
impl DocumentStore for FailingStore {
    async fn get(&self, _: &str, _: &str) -> Result<Option<Document>, StoreError> { Err(unavailable()) }
    async fn set(&self, _: &str, _: &str, _: Document) -> Result<(), StoreError> { Err(unavailable()) }
    async fn delete(&self, _: &str, _: &str) -> Result<bool, StoreError> { Err(unavailable()) }
    async fn query(&self, _: &str, _: &Query) -> Result<Vec<(String, Document)>, StoreError> { Err(unavailable()) }
    async fn count(&self, _: &str, _: &[Filter]) -> Result<u64, StoreError> { Err(unavailable()) }
}

/// 2024-10-27T08:00:00Z plus `ms` milliseconds.
pub fn at(ms: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 10, 27, 8, 0, 0).unwrap() + Duration::milliseconds(ms)
}

/// A valid one-night trip departing on `odhod`.
pub fn new_expense(oseba: &str, odhod: &str, kilometrina: f64) -> NewExpense {
    let prihod = NaiveDate::parse_from_str(odhod, "%Y-%m-%d").unwrap() + Duration::days(1);
    NewExpense {
        naziv: "Sestanek".into(),
        datum_odhoda: odhod.into(),
        datum_prihoda: prihod.format("%Y-%m-%d").to_string(),
        kilometrina,
        lokacija: "Ljubljana".into(),
        opis: "desc".into(),
        oseba: oseba.into(),
    }
}

pub fn new_user(email: &str) -> NewUser {
    NewUser {
        ime: "Test".into(),
        priimek: "User".into(),
        email: email.into(),
        geslo: "password".into(),
        tip: Role::Delavec,
    }
}

/// Minimum-cost hasher so tests do not spend seconds in argon2.
pub fn fast_hasher() -> PasswordHasher {
    PasswordHasher::with_params(8, 1, 1).unwrap()
}
