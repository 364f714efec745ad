//! Travel expense ("potni strošek") records.
//!
//! A record is keyed by `<oseba>_<creation timestamp>` and carries a cost
//! derived from the travelled distance at a fixed per-kilometre rate.

use chrono::{DateTime, Datelike, NaiveDate, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::ModelError;
use crate::validate::{parse_date, validate_distance, validate_email, validate_required, DATE_FORMAT};

/// Collection holding expense documents.
pub const COLLECTION: &str = "Potni_stroski";

/// Reimbursement per kilometre.
pub const RATE_PER_KM: f64 = 0.43;

/// Stored expense document.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    pub id: String,
    pub naziv: String,
    pub datum_odhoda: String,
    pub datum_prihoda: String,
    pub kilometrina: f64,
    pub lokacija: String,
    pub opis: String,
    /// Owner email.
    pub oseba: String,
    /// Cost with two decimals, always derived from `kilometrina`.
    pub cena: String,
}

/// Input for creating an expense.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NewExpense {
    pub naziv: String,
    pub datum_odhoda: String,
    pub datum_prihoda: String,
    pub kilometrina: f64,
    pub lokacija: String,
    #[serde(default)]
    pub opis: String,
    pub oseba: String,
}

/// Partial update. Absent fields keep their stored value.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExpensePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub naziv: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datum_odhoda: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datum_prihoda: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kilometrina: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lokacija: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opis: Option<String>,
}

/// `kilometrina * RATE_PER_KM` formatted with two decimals.
pub fn reimbursement(kilometrina: f64) -> String {
    two_decimals(kilometrina * RATE_PER_KM)
}

/// Two decimals of the exact binary value, ties rounded away from zero.
fn two_decimals(value: f64) -> String {
    if !value.is_finite() || value.abs() >= 1e15 {
        return format!("{value:.2}");
    }
    // 60 places print any double of this magnitude exactly.
    let exact = format!("{:.60}", value.abs());
    let Some((whole, frac)) = exact.split_once('.') else {
        return format!("{value:.2}");
    };
    let digits = |s: &str| s.bytes().fold(0u64, |acc, b| acc * 10 + u64::from(b - b'0'));
    let round_up = frac.as_bytes()[2] >= b'5';
    let cents = digits(whole) * 100 + digits(&frac[..2]) + u64::from(round_up);
    let sign = if value < 0.0 { "-" } else { "" };
    format!("{sign}{}.{:02}", cents / 100, cents % 100)
}

/// Build the document key for an expense created by `oseba` at `at`.
///
/// The timestamp has millisecond resolution, so two expenses created by the
/// same owner within one millisecond share a key.
pub fn expense_id(oseba: &str, at: DateTime<Utc>) -> String {
    format!("{}_{}", oseba, at.to_rfc3339_opts(SecondsFormat::Millis, true))
}

/// Half-open `[first day, first day of next month)` bounds as stored date strings.
pub fn month_bounds(year: i32, month: u32) -> Result<(String, String), ModelError> {
    let start = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| ModelError::invalid(format!("invalid month {year}-{month}")))?;
    let end = if start.month() == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    }
    .ok_or_else(|| ModelError::invalid(format!("invalid month {year}-{month}")))?;
    Ok((start.format(DATE_FORMAT).to_string(), end.format(DATE_FORMAT).to_string()))
}

fn validate_trip(datum_odhoda: &str, datum_prihoda: &str) -> Result<(), ModelError> {
    let odhod = parse_date("datum_odhoda", datum_odhoda)?;
    let prihod = parse_date("datum_prihoda", datum_prihoda)?;
    if prihod < odhod {
        return Err(ModelError::invalid("datum_prihoda must not be before datum_odhoda"));
    }
    Ok(())
}

impl NewExpense {
    pub fn validate(&self) -> Result<(), ModelError> {
        validate_required("naziv", &self.naziv)?;
        validate_trip(&self.datum_odhoda, &self.datum_prihoda)?;
        validate_distance(self.kilometrina)?;
        validate_required("lokacija", &self.lokacija)?;
        validate_email("oseba", &self.oseba)?;
        Ok(())
    }

    /// Validate and turn the input into a record created at `at`.
    pub fn into_expense(self, at: DateTime<Utc>) -> Result<Expense, ModelError> {
        self.validate()?;
        Ok(Expense {
            id: expense_id(&self.oseba, at),
            cena: reimbursement(self.kilometrina),
            naziv: self.naziv,
            datum_odhoda: self.datum_odhoda,
            datum_prihoda: self.datum_prihoda,
            kilometrina: self.kilometrina,
            lokacija: self.lokacija,
            opis: self.opis,
            oseba: self.oseba,
        })
    }
}

impl ExpensePatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Validate the fields that are present. Cross-field rules are checked on
    /// the merged record.
    pub fn validate(&self) -> Result<(), ModelError> {
        if let Some(naziv) = &self.naziv {
            validate_required("naziv", naziv)?;
        }
        if let Some(d) = &self.datum_odhoda {
            parse_date("datum_odhoda", d)?;
        }
        if let Some(d) = &self.datum_prihoda {
            parse_date("datum_prihoda", d)?;
        }
        if let Some(km) = self.kilometrina {
            validate_distance(km)?;
        }
        if let Some(lokacija) = &self.lokacija {
            validate_required("lokacija", lokacija)?;
        }
        Ok(())
    }
}

impl Expense {
    /// Check a record produced by merging a patch over a stored document.
    pub fn validate(&self) -> Result<(), ModelError> {
        validate_required("naziv", &self.naziv)?;
        validate_trip(&self.datum_odhoda, &self.datum_prihoda)?;
        validate_distance(self.kilometrina)?;
        validate_required("lokacija", &self.lokacija)?;
        Ok(())
    }
}
