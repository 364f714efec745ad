//! Travel expense store over an injected [`DocumentStore`].
//!
//! Expenses live in the `Potni_stroski` collection keyed by
//! `<oseba>_<timestamp>`. Listing by owner is available both as numbered
//! pages (the cursor is rediscovered from the start on every call) and as a
//! plain key cursor.

use std::slice;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use models::expense::{month_bounds, reimbursement, Expense, ExpensePatch, NewExpense, COLLECTION};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use crate::errors::{storage, ServiceError};
use crate::messages::{self, Ack};
use crate::pagination::PageLimits;
use crate::storage::{
    from_document, shallow_merge, to_document, Document, DocumentStore, Filter, Query, StoreError, MAX_IN_VALUES,
};

const OWNER: &str = "oseba";
const DEPARTURE: &str = "datum_odhoda";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExpenseAdded {
    pub message: String,
    pub strosek: Expense,
}

/// One numbered page of an owner listing.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpensePage {
    pub stroski: Vec<Expense>,
    /// All matches, independent of paging.
    pub total_items: u64,
}

/// One page of an owner listing addressed by key cursor.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CursorPage {
    pub stroski: Vec<Expense>,
    /// Pass back as `after` for the next page; `None` once exhausted.
    pub next: Option<String>,
}

fn decode(key: String, mut doc: Document) -> Result<Expense, StoreError> {
    doc.entry("id").or_insert(Value::String(key));
    from_document(doc)
}

fn decode_all(rows: Vec<(String, Document)>) -> Result<Vec<Expense>, StoreError> {
    rows.into_iter().map(|(key, doc)| decode(key, doc)).collect()
}

fn owner_filter<E: AsRef<str>>(emails: &[E]) -> Result<Filter, ServiceError> {
    if emails.is_empty() || emails.len() > MAX_IN_VALUES {
        return Err(ServiceError::Validation(format!(
            "seznam e-naslovov mora vsebovati 1..={MAX_IN_VALUES} naslovov, prejetih {}",
            emails.len()
        )));
    }
    Ok(Filter::in_values(OWNER, emails.iter().map(|e| e.as_ref().to_string())))
}

/// Expense business operations, independent of the storage backend.
pub struct ExpenseStore<S: DocumentStore + ?Sized> {
    store: Arc<S>,
    limits: PageLimits,
}

impl<S: DocumentStore + ?Sized> ExpenseStore<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store, limits: PageLimits::default() }
    }

    pub fn with_limits(mut self, limits: PageLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Record a new expense created now.
    ///
    /// # Examples
    /// ```
    /// use service::expense_store::ExpenseStore;
    /// use service::storage::MemoryDocumentStore;
    /// use models::expense::NewExpense;
    /// use std::sync::Arc;
    /// let expenses = ExpenseStore::new(Arc::new(MemoryDocumentStore::new()));
    /// let input = NewExpense {
    ///     naziv: "Sestanek".into(),
    ///     datum_odhoda: "2024-10-27".into(),
    ///     datum_prihoda: "2024-10-28".into(),
    ///     kilometrina: 100.0,
    ///     lokacija: "Ljubljana".into(),
    ///     opis: "desc".into(),
    ///     oseba: "a@x.com".into(),
    /// };
    /// let added = tokio_test::block_on(expenses.add(input)).unwrap();
    /// assert_eq!(added.message, "Uspešno dodan potni strošek");
    /// assert_eq!(added.strosek.cena, "43.00");
    /// assert!(added.strosek.id.starts_with("a@x.com_"));
    /// ```
    pub async fn add(&self, input: NewExpense) -> Result<ExpenseAdded, ServiceError> {
        self.add_at(input, Utc::now()).await
    }

    /// Record a new expense as if created at `at`.
    #[instrument(skip(self, input), fields(oseba = %input.oseba))]
    pub async fn add_at(&self, input: NewExpense, at: DateTime<Utc>) -> Result<ExpenseAdded, ServiceError> {
        let strosek = input.into_expense(at)?;
        let doc = to_document(&strosek).map_err(storage(messages::ERR_ADD_EXPENSE))?;
        self.store
            .set(COLLECTION, &strosek.id, doc)
            .await
            .map_err(storage(messages::ERR_ADD_EXPENSE))?;
        info!(id = %strosek.id, cena = %strosek.cena, "expense_added");
        Ok(ExpenseAdded { message: messages::EXPENSE_ADDED.to_string(), strosek })
    }

    /// Up to `limit` expenses after skipping `offset`, in key order.
    #[instrument(skip(self))]
    pub async fn get_all(&self, limit: u32, offset: u32) -> Result<Vec<Expense>, ServiceError> {
        let query = Query::new().offset(offset as usize).limit(self.limits.limit(limit));
        let rows = self
            .store
            .query(COLLECTION, &query)
            .await
            .map_err(storage(messages::ERR_LIST_EXPENSES))?;
        debug!(count = rows.len(), "expenses_listed");
        decode_all(rows).map_err(storage(messages::ERR_LIST_EXPENSES))
    }

    #[instrument(skip(self))]
    pub async fn get_by_id(&self, id: &str) -> Result<Option<Expense>, ServiceError> {
        let doc = self.store.get(COLLECTION, id).await.map_err(storage(messages::ERR_GET_EXPENSE))?;
        doc.map(|d| decode(id.to_string(), d))
            .transpose()
            .map_err(storage(messages::ERR_GET_EXPENSE))
    }

    /// Shallow-merge `patch` over the stored expense.
    ///
    /// `cena` follows a patched `kilometrina`. An empty patch only checks
    /// that the expense exists.
    #[instrument(skip(self, patch))]
    pub async fn put(&self, id: &str, patch: ExpensePatch) -> Result<Ack, ServiceError> {
        let mut doc = self
            .store
            .get(COLLECTION, id)
            .await
            .map_err(storage(messages::ERR_UPDATE_EXPENSE))?
            .ok_or_else(|| {
                warn!("expense_not_found");
                ServiceError::NotFound(messages::EXPENSE_NOT_FOUND.to_string())
            })?;
        patch.validate()?;
        if patch.is_empty() {
            debug!("empty_patch");
            return Ok(Ack::new(messages::EXPENSE_UPDATED));
        }

        shallow_merge(&mut doc, &patch).map_err(storage(messages::ERR_UPDATE_EXPENSE))?;
        if let Some(km) = patch.kilometrina {
            doc.insert("cena".to_string(), Value::String(reimbursement(km)));
        }
        let merged = decode(id.to_string(), doc.clone()).map_err(storage(messages::ERR_UPDATE_EXPENSE))?;
        merged.validate()?;

        self.store
            .set(COLLECTION, id, doc)
            .await
            .map_err(storage(messages::ERR_UPDATE_EXPENSE))?;
        info!(cena = %merged.cena, "expense_updated");
        Ok(Ack::new(messages::EXPENSE_UPDATED))
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: &str) -> Result<Ack, ServiceError> {
        let existed = self
            .store
            .delete(COLLECTION, id)
            .await
            .map_err(storage(messages::ERR_DELETE_EXPENSE))?;
        if !existed {
            warn!("expense_not_found");
            return Err(ServiceError::NotFound(messages::EXPENSE_NOT_FOUND_ON_DELETE.to_string()));
        }
        info!("expense_deleted");
        Ok(Ack::new(messages::EXPENSE_DELETED))
    }

    /// Page `page` (1-based) of the expenses owned by any of `emails`.
    ///
    /// # Examples
    /// ```
    /// use service::expense_store::ExpenseStore;
    /// use service::storage::MemoryDocumentStore;
    /// use std::sync::Arc;
    /// let expenses = ExpenseStore::new(Arc::new(MemoryDocumentStore::new()));
    /// let page = tokio_test::block_on(expenses.get_by_emails(&["nobody@x.com"], 10, 1)).unwrap();
    /// assert!(page.stroski.is_empty());
    /// assert_eq!(page.total_items, 0);
    /// ```
    #[instrument(skip(self, emails), fields(email_count = emails.len()))]
    pub async fn get_by_emails<E: AsRef<str>>(&self, emails: &[E], limit: u32, page: u32) -> Result<ExpensePage, ServiceError> {
        let filter = owner_filter(emails)?;
        let (page_idx, per_page) = self.limits.page(page, limit);
        let total_items = self
            .store
            .count(COLLECTION, slice::from_ref(&filter))
            .await
            .map_err(storage(messages::ERR_EXPENSES_BY_EMAILS))?;

        let skip = page_idx * per_page;
        let start_after = if skip == 0 {
            None
        } else {
            let beyond = ExpensePage { stroski: Vec::new(), total_items };
            if skip >= total_items {
                debug!(total_items, skip, "page_beyond_range");
                return Ok(beyond);
            }
            // Walk the preceding pages to find the last key before this one.
            let prefix = self
                .store
                .query(COLLECTION, &Query::new().filter(filter.clone()).limit(skip as usize))
                .await
                .map_err(storage(messages::ERR_EXPENSES_BY_EMAILS))?;
            if (prefix.len() as u64) < skip {
                debug!(found = prefix.len(), skip, "page_beyond_range");
                return Ok(beyond);
            }
            prefix.last().map(|(key, _)| key.clone())
        };

        let (stroski, _) = self
            .page_after(filter, per_page as usize, start_after, messages::ERR_EXPENSES_BY_EMAILS)
            .await?;
        debug!(page = page_idx + 1, returned = stroski.len(), total_items, "expenses_by_emails");
        Ok(ExpensePage { stroski, total_items })
    }

    /// Up to `limit` expenses owned by any of `emails` with keys after `after`.
    #[instrument(skip(self, emails), fields(email_count = emails.len()))]
    pub async fn get_by_emails_after<E: AsRef<str>>(
        &self,
        emails: &[E],
        limit: u32,
        after: Option<&str>,
    ) -> Result<CursorPage, ServiceError> {
        let filter = owner_filter(emails)?;
        let limit = self.limits.limit(limit);
        let (stroski, next) = self
            .page_after(filter, limit, after.map(str::to_string), messages::ERR_EXPENSES_BY_EMAILS)
            .await?;
        Ok(CursorPage { stroski, next })
    }

    async fn page_after(
        &self,
        filter: Filter,
        limit: usize,
        after: Option<String>,
        context: &'static str,
    ) -> Result<(Vec<Expense>, Option<String>), ServiceError> {
        let query = Query::new().filter(filter).start_after(after).limit(limit);
        let rows = self.store.query(COLLECTION, &query).await.map_err(storage(context))?;
        let next = if rows.len() == limit { rows.last().map(|(key, _)| key.clone()) } else { None };
        let stroski = decode_all(rows).map_err(storage(context))?;
        Ok((stroski, next))
    }

    /// Every expense owned by `email`, unpaginated.
    #[instrument(skip(self))]
    pub async fn get_by_user_email(&self, email: &str) -> Result<Vec<Expense>, ServiceError> {
        let query = Query::new().filter(Filter::eq(OWNER, email));
        let rows = self
            .store
            .query(COLLECTION, &query)
            .await
            .map_err(storage(messages::ERR_EXPENSES_BY_EMAIL))?;
        decode_all(rows).map_err(storage(messages::ERR_EXPENSES_BY_EMAIL))
    }

    /// Expenses departing within the given calendar month.
    #[instrument(skip(self))]
    pub async fn get_by_month(&self, year: i32, month: u32, limit: u32, offset: u32) -> Result<Vec<Expense>, ServiceError> {
        let (from, until) = month_bounds(year, month)?;
        let query = Query::new()
            .filter(Filter::gte(DEPARTURE, from))
            .filter(Filter::lt(DEPARTURE, until))
            .offset(offset as usize)
            .limit(self.limits.limit(limit));
        let rows = self
            .store
            .query(COLLECTION, &query)
            .await
            .map_err(storage(messages::ERR_EXPENSES_BY_MONTH))?;
        decode_all(rows).map_err(storage(messages::ERR_EXPENSES_BY_MONTH))
    }
}
