//! User-facing messages and the acknowledgement envelope.

use serde::{Deserialize, Serialize};

// Expenses
pub const EXPENSE_ADDED: &str = "Uspešno dodan potni strošek";
pub const EXPENSE_UPDATED: &str = "Potni strošek je uspešno posodobljen";
pub const EXPENSE_DELETED: &str = "Strosek je bil izbrisan";
pub const EXPENSE_NOT_FOUND: &str = "Potni strošek ne obstaja";
pub const EXPENSE_NOT_FOUND_ON_DELETE: &str = "Strosek ne obstaja";

pub const ERR_ADD_EXPENSE: &str = "Napaka pri dodajanju potnega stroška v bazo";
pub const ERR_LIST_EXPENSES: &str = "Napaka pri pridobivanju stroskov iz baze";
pub const ERR_GET_EXPENSE: &str = "Napaka pri pridobivanju stroska iz baze";
pub const ERR_UPDATE_EXPENSE: &str = "Napaka pri posodabljanju potnega stroška v bazi";
pub const ERR_DELETE_EXPENSE: &str = "Napaka pri brisanju stroska iz baze";
pub const ERR_EXPENSES_BY_EMAILS: &str = "Error retrieving expenses by emails with pagination";
pub const ERR_EXPENSES_BY_EMAIL: &str = "Error retrieving expenses by email";
pub const ERR_EXPENSES_BY_MONTH: &str = "Napaka pri pridobivanju stroskov za izbrani mesec";

// Users
pub const USER_REGISTERED: &str = "Uspešna registracija";
pub const USER_UPDATED: &str = "Uporabnik je bil posodobljen";
pub const USER_DELETED: &str = "Uporabnik je bil izbrisan";
pub const USER_NOT_FOUND: &str = "Uporabnik ne obstaja";
pub const USER_EXISTS: &str = "Uporabnik s tem e-naslovom že obstaja";

pub const ERR_REGISTER_USER: &str = "Napaka pri registraciji";
pub const ERR_LIST_USERS: &str = "Napaka pri pridobivanju uporabnikov iz baze";
pub const ERR_GET_USER: &str = "Napaka pri pridobivanju uporabnika iz baze";
pub const ERR_UPDATE_USER: &str = "Napaka pri posodabljanju uporabnika v bazi";
pub const ERR_DELETE_USER: &str = "Napaka pri brisanju uporabnika iz baze";
pub const ERR_USERS_BY_NAME: &str = "Napaka pri iskanju uporabnikov po imenu";

/// Result of an update or delete.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ack {
    pub message: String,
}

impl Ack {
    pub fn new(message: &str) -> Self {
        Self { message: message.to_string() }
    }
}
