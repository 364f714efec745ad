use std::sync::Arc;

use models::user::{NewUser, User, UserPatch, COLLECTION};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::errors::{storage, ServiceError};
use crate::messages::{self, Ack};
use crate::pagination::PageLimits;
use crate::password::PasswordHasher;
use crate::storage::{from_document, shallow_merge, to_document, Document, DocumentStore, Filter, Query, StoreError};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UserAdded {
    pub message: String,
    pub uporabnik: User,
}

fn decode_all(rows: Vec<(String, Document)>) -> Result<Vec<User>, StoreError> {
    rows.into_iter().map(|(_, doc)| from_document(doc)).collect()
}

/// User business operations; users are keyed by email.
pub struct UserStore<S: DocumentStore + ?Sized> {
    store: Arc<S>,
    hasher: PasswordHasher,
    limits: PageLimits,
}

impl<S: DocumentStore + ?Sized> UserStore<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store, hasher: PasswordHasher::default(), limits: PageLimits::default() }
    }

    pub fn with_hasher(mut self, hasher: PasswordHasher) -> Self {
        self.hasher = hasher;
        self
    }

    pub fn with_limits(mut self, limits: PageLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Register a new user with a hashed password.
    ///
    /// # Examples
    /// ```
    /// use service::user_store::UserStore;
    /// use service::storage::MemoryDocumentStore;
    /// use models::user::{NewUser, Role};
    /// use std::sync::Arc;
    /// let users = UserStore::new(Arc::new(MemoryDocumentStore::new()));
    /// let input = NewUser { ime: "Test".into(), priimek: "User".into(), email: "test@example.com".into(), geslo: "password".into(), tip: Role::Delavec };
    /// let added = tokio_test::block_on(users.add(input)).unwrap();
    /// assert_eq!(added.message, "Uspešna registracija");
    /// assert_ne!(added.uporabnik.geslo, "password");
    /// ```
    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn add(&self, input: NewUser) -> Result<UserAdded, ServiceError> {
        input.validate()?;
        let existing = self
            .store
            .get(COLLECTION, &input.email)
            .await
            .map_err(storage(messages::ERR_REGISTER_USER))?;
        if existing.is_some() {
            debug!("user exists: {}", input.email);
            return Err(ServiceError::Conflict(messages::USER_EXISTS.to_string()));
        }

        let hash = self.hasher.hash(&input.geslo)?;
        let uporabnik = input.into_user(hash);
        let doc = to_document(&uporabnik).map_err(storage(messages::ERR_REGISTER_USER))?;
        self.store
            .set(COLLECTION, &uporabnik.email, doc)
            .await
            .map_err(storage(messages::ERR_REGISTER_USER))?;
        info!(tip = %uporabnik.tip, "user_registered");
        Ok(UserAdded { message: messages::USER_REGISTERED.to_string(), uporabnik })
    }

    #[instrument(skip(self))]
    pub async fn get_all(&self, limit: u32, offset: u32) -> Result<Vec<User>, ServiceError> {
        let query = Query::new().offset(offset as usize).limit(self.limits.limit(limit));
        let rows = self
            .store
            .query(COLLECTION, &query)
            .await
            .map_err(storage(messages::ERR_LIST_USERS))?;
        decode_all(rows).map_err(storage(messages::ERR_LIST_USERS))
    }

    #[instrument(skip(self))]
    pub async fn get_by_id(&self, email: &str) -> Result<Option<User>, ServiceError> {
        let doc = self.store.get(COLLECTION, email).await.map_err(storage(messages::ERR_GET_USER))?;
        doc.map(from_document).transpose().map_err(storage(messages::ERR_GET_USER))
    }

    /// Point lookup; the email is the document key.
    pub async fn get_by_email(&self, email: &str) -> Result<Option<User>, ServiceError> {
        self.get_by_id(email).await
    }

    /// Shallow-merge `patch` over the stored user. A plaintext `geslo` is
    /// hashed before it is merged.
    #[instrument(skip(self, patch))]
    pub async fn put(&self, email: &str, mut patch: UserPatch) -> Result<Ack, ServiceError> {
        let mut doc = self
            .store
            .get(COLLECTION, email)
            .await
            .map_err(storage(messages::ERR_UPDATE_USER))?
            .ok_or_else(|| {
                warn!("user_not_found");
                ServiceError::NotFound(messages::USER_NOT_FOUND.to_string())
            })?;
        patch.validate()?;
        if patch.is_empty() {
            debug!("empty_patch");
            return Ok(Ack::new(messages::USER_UPDATED));
        }

        if let Some(plain) = patch.geslo.take() {
            patch.geslo = Some(self.hasher.hash(&plain)?);
        }
        shallow_merge(&mut doc, &patch).map_err(storage(messages::ERR_UPDATE_USER))?;
        let merged: User = from_document(doc.clone()).map_err(storage(messages::ERR_UPDATE_USER))?;

        self.store
            .set(COLLECTION, email, doc)
            .await
            .map_err(storage(messages::ERR_UPDATE_USER))?;
        info!(tip = %merged.tip, "user_updated");
        Ok(Ack::new(messages::USER_UPDATED))
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, email: &str) -> Result<Ack, ServiceError> {
        let existed = self
            .store
            .delete(COLLECTION, email)
            .await
            .map_err(storage(messages::ERR_DELETE_USER))?;
        if !existed {
            warn!("user_not_found");
            return Err(ServiceError::NotFound(messages::USER_NOT_FOUND.to_string()));
        }
        info!("user_deleted");
        Ok(Ack::new(messages::USER_DELETED))
    }

    #[instrument(skip(self))]
    pub async fn get_by_full_name(&self, ime: &str, priimek: &str) -> Result<Vec<User>, ServiceError> {
        let query = Query::new().filter(Filter::eq("ime", ime)).filter(Filter::eq("priimek", priimek));
        let rows = self
            .store
            .query(COLLECTION, &query)
            .await
            .map_err(storage(messages::ERR_USERS_BY_NAME))?;
        decode_all(rows).map_err(storage(messages::ERR_USERS_BY_NAME))
    }

    /// Check `geslo` against the stored hash. Unknown users never match.
    #[instrument(skip(self, geslo))]
    pub async fn verify_credentials(&self, email: &str, geslo: &str) -> Result<bool, ServiceError> {
        match self.get_by_id(email).await? {
            Some(user) => self.hasher.verify(geslo, &user.geslo),
            None => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryDocumentStore;
    use crate::test_support::{fast_hasher, new_user, FailingStore};
    use models::user::Role;

    fn store() -> UserStore<MemoryDocumentStore> {
        UserStore::new(Arc::new(MemoryDocumentStore::new())).with_hasher(fast_hasher())
    }

    #[tokio::test]
    async fn registration_hashes_the_password() {
        let users = store();
        let added = users.add(new_user("test@example.com")).await.unwrap();
        assert_eq!(added.message, "Uspešna registracija");
        assert!(added.uporabnik.geslo.starts_with("$argon2id$"));

        let stored = users.get_by_email("test@example.com").await.unwrap().expect("stored");
        assert_eq!(stored, added.uporabnik);
        assert!(users.verify_credentials("test@example.com", "password").await.unwrap());
        assert!(!users.verify_credentials("test@example.com", "wrong-password").await.unwrap());
        assert!(!users.verify_credentials("nobody@example.com", "password").await.unwrap());
    }

    #[tokio::test]
    async fn duplicate_email_is_a_conflict() {
        let users = store();
        users.add(new_user("test@example.com")).await.unwrap();
        let err = users.add(new_user("test@example.com")).await.unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));
        assert_eq!(err.to_string(), "Uporabnik s tem e-naslovom že obstaja");
    }

    #[tokio::test]
    async fn put_rehashes_password_and_keeps_other_fields() {
        let users = store();
        users.add(new_user("test@example.com")).await.unwrap();
        let patch = UserPatch { ime: Some("Updated".into()), tip: Some(Role::Admin), geslo: Some("new-password".into()), ..Default::default() };
        assert_eq!(users.put("test@example.com", patch).await.unwrap().message, "Uporabnik je bil posodobljen");

        let u = users.get_by_id("test@example.com").await.unwrap().unwrap();
        assert_eq!(u.ime, "Updated");
        assert_eq!(u.priimek, "User");
        assert_eq!(u.tip, Role::Admin);
        assert_ne!(u.geslo, "new-password");
        assert!(users.verify_credentials("test@example.com", "new-password").await.unwrap());
    }

    #[tokio::test]
    async fn missing_user_is_not_found() {
        let users = store();
        let patch = UserPatch { ime: Some("X".into()), ..Default::default() };
        assert_eq!(users.put("nobody@example.com", patch).await.unwrap_err().to_string(), "Uporabnik ne obstaja");
        assert!(users.delete("nobody@example.com").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn missing_user_wins_over_an_invalid_patch() {
        let users = store();
        let patch = UserPatch { ime: Some(String::new()), ..Default::default() };
        assert!(users.put("nobody@example.com", patch.clone()).await.unwrap_err().is_not_found());

        users.add(new_user("test@example.com")).await.unwrap();
        assert!(matches!(users.put("test@example.com", patch).await, Err(ServiceError::Validation(_))));
    }

    #[tokio::test]
    async fn delete_then_lookup_is_none() {
        let users = store();
        users.add(new_user("test@example.com")).await.unwrap();
        assert_eq!(users.delete("test@example.com").await.unwrap().message, "Uporabnik je bil izbrisan");
        assert!(users.get_by_id("test@example.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn full_name_lookup_matches_both_fields() {
        let users = store();
        users.add(new_user("a@example.com")).await.unwrap();
        let mut other = new_user("b@example.com");
        other.priimek = "Novak".into();
        users.add(other).await.unwrap();

        let found = users.get_by_full_name("Test", "User").await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].email, "a@example.com");
        assert_eq!(users.get_all(10, 0).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn registration_failure_carries_context() {
        let users = UserStore::new(Arc::new(FailingStore)).with_hasher(fast_hasher());
        let err = users.add(new_user("test@example.com")).await.unwrap_err();
        assert_eq!(err.to_string(), "Napaka pri registraciji: backend error: connection reset");
    }
}
