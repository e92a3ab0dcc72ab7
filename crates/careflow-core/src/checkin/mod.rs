//! Kiosk check-in tokens.
//!
//! A token is 32 random bytes shown to the patient exactly once; only its
//! SHA-256 digest is stored. Issuing replaces any prior token outright,
//! and a token is good for one check-in within five minutes of issuance.
//! Expiry is enforced at validation time; nothing sweeps expired rows.

use chrono::{DateTime, Duration, Utc};
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::db::Database;
use crate::models::{format_timestamp, IssuedToken};

/// Check-in token errors.
#[derive(Error, Debug)]
pub enum CheckInError {
    #[error("Database error: {0}")]
    Database(#[from] crate::db::DbError),

    #[error("Appointment not found or no token issued: {0}")]
    NotFound(String),

    #[error("Check-in token has expired")]
    Expired,

    #[error("Check-in token does not match")]
    Mismatch,

    #[error("Check-in token was already used")]
    AlreadyConsumed,
}

pub type CheckInResult<T> = Result<T, CheckInError>;

/// How long an issued token stays valid.
const TOKEN_TTL_MINUTES: i64 = 5;

/// Issues and validates one-shot kiosk check-in tokens.
pub struct CheckInTokenService<'a> {
    db: &'a Database,
}

impl<'a> CheckInTokenService<'a> {
    /// Create a new token service over the given database.
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Issue a fresh token for an appointment. Any previously issued token
    /// is dead from this moment, whatever its own expiry said.
    pub fn issue_token(&self, appointment_id: &str) -> CheckInResult<IssuedToken> {
        self.issue_token_at(appointment_id, Utc::now())
    }

    /// Variant taking the issuance time explicitly.
    pub fn issue_token_at(
        &self,
        appointment_id: &str,
        issued: DateTime<Utc>,
    ) -> CheckInResult<IssuedToken> {
        // 1. Mint the secret; only its digest is ever stored
        let token = generate_token();
        let digest = hash_token(&token);
        let expires_at = format_timestamp(issued + Duration::minutes(TOKEN_TTL_MINUTES));

        // 2. Overwrite whatever token the appointment had
        let updated = self.db.set_checkin_token(
            appointment_id,
            &digest,
            &expires_at,
            &format_timestamp(issued),
        )?;
        if !updated {
            return Err(CheckInError::NotFound(appointment_id.to_string()));
        }

        tracing::info!(
            "Issued check-in token for appointment {} (expires {})",
            appointment_id,
            expires_at
        );
        Ok(IssuedToken {
            appointment_id: appointment_id.to_string(),
            token,
            expires_at,
        })
    }

    /// Validate a presented token and consume it. Exactly one presentation
    /// of a live token succeeds; every other call reports why it cannot.
    pub fn validate_token(&self, appointment_id: &str, presented: &str) -> CheckInResult<()> {
        self.validate_token_at(appointment_id, presented, Utc::now())
    }

    /// Variant taking the validation time explicitly.
    pub fn validate_token_at(
        &self,
        appointment_id: &str,
        presented: &str,
        now: DateTime<Utc>,
    ) -> CheckInResult<()> {
        let digest = hash_token(presented);
        let now_str = format_timestamp(now);

        // 1. Try the consume; digest, consumed flag and expiry are checked
        //    in the same statement that marks the token used, so two kiosks
        //    racing on one token get exactly one success
        if self
            .db
            .consume_checkin_token(appointment_id, &digest, &now_str)?
        {
            tracing::info!("Check-in accepted for appointment {}", appointment_id);
            return Ok(());
        }

        // 2. The consume refused; re-read the row to name the reason
        let appointment = self
            .db
            .get_appointment(appointment_id)?
            .ok_or_else(|| CheckInError::NotFound(appointment_id.to_string()))?;
        let token = appointment
            .checkin_token()
            .ok_or_else(|| CheckInError::NotFound(appointment_id.to_string()))?;

        let err = if now_str >= token.expires_at {
            CheckInError::Expired
        } else if digest != token.token_digest {
            CheckInError::Mismatch
        } else {
            CheckInError::AlreadyConsumed
        };
        tracing::warn!(
            "Check-in refused for appointment {}: {}",
            appointment_id,
            err
        );
        Err(err)
    }
}

/// 32 random bytes, hex-encoded. This is the QR payload handed to the
/// patient's phone.
fn generate_token() -> String {
    let bytes: [u8; 32] = rand::random();
    hex::encode(bytes)
}

fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}
