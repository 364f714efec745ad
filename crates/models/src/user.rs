use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::ModelError;
use crate::validate::{validate_email, validate_password, validate_required};

/// Collection holding user documents, keyed by email.
pub const COLLECTION: &str = "Uporabniki";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Delavec,
    Admin,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Delavec => write!(f, "delavec"),
            Role::Admin => write!(f, "admin"),
        }
    }
}

impl FromStr for Role {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "delavec" => Ok(Role::Delavec),
            "admin" => Ok(Role::Admin),
            other => Err(ModelError::invalid(format!("unknown tip '{other}'"))),
        }
    }
}

/// Stored user document. `geslo` holds a PHC-formatted hash.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub ime: String,
    pub priimek: String,
    pub email: String,
    pub geslo: String,
    pub tip: Role,
}

/// Registration input; `geslo` is plaintext until the store hashes it.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NewUser {
    pub ime: String,
    pub priimek: String,
    pub email: String,
    pub geslo: String,
    pub tip: Role,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UserPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ime: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priimek: Option<String>,
    /// Plaintext; replaced by its hash before the patch is merged.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geslo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tip: Option<Role>,
}

impl NewUser {
    pub fn validate(&self) -> Result<(), ModelError> {
        validate_required("ime", &self.ime)?;
        validate_required("priimek", &self.priimek)?;
        validate_email("email", &self.email)?;
        validate_password(&self.geslo)?;
        Ok(())
    }

    /// Build the stored record around an already hashed password.
    pub fn into_user(self, geslo_hash: String) -> User {
        User { ime: self.ime, priimek: self.priimek, email: self.email, geslo: geslo_hash, tip: self.tip }
    }
}

impl UserPatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn validate(&self) -> Result<(), ModelError> {
        if let Some(ime) = &self.ime {
            validate_required("ime", ime)?;
        }
        if let Some(priimek) = &self.priimek {
            validate_required("priimek", priimek)?;
        }
        if let Some(geslo) = &self.geslo {
            validate_password(geslo)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_user() -> NewUser {
        NewUser {
            ime: "Test".into(),
            priimek: "User".into(),
            email: "test@example.com".into(),
            geslo: "password".into(),
            tip: Role::Delavec,
        }
    }

    #[test]
    fn role_round_trips_through_lowercase_names() {
        assert_eq!("Admin".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!("delavec".parse::<Role>().unwrap(), Role::Delavec);
        assert!("vodja".parse::<Role>().is_err());
        assert_eq!(serde_json::to_value(Role::Admin).unwrap(), serde_json::json!("admin"));
        assert_eq!(Role::Delavec.to_string(), "delavec");
    }

    #[test]
    fn registration_input_is_validated() {
        assert!(test_user().validate().is_ok());

        let mut short = test_user();
        short.geslo = "kratko".into();
        assert!(short.validate().is_err());

        let mut no_email = test_user();
        no_email.email = "test.example.com".into();
        assert!(no_email.validate().is_err());
    }

    #[test]
    fn patch_cannot_rename_the_key() {
        let res: Result<UserPatch, _> = serde_json::from_value(serde_json::json!({ "email": "new@example.com" }));
        assert!(res.is_err());
        let ok: UserPatch = serde_json::from_value(serde_json::json!({ "ime": "Updated", "tip": "admin" })).unwrap();
        assert_eq!(ok.tip, Some(Role::Admin));
    }
}
