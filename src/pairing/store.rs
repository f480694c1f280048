//! The pairing code store itself.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::storage::{KeyValueStorage, StorageError};

/// Prefix that namespaces pairing keys among unrelated entries in the
/// shared storage area.
const PAIRING_KEY_PREFIX: &str = "willingtree_pairing_";

/// How long a stored code stays redeemable, in minutes.
const CODE_EXPIRY_MINUTES: i64 = 10;

/// Error type for pairing store operations.
#[derive(Debug, thiserror::Error)]
pub enum PairingStoreError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A stored pairing record.
///
/// Serializes to the wire format `{"phone", "name", "timestamp"}` with the
/// timestamp as an ISO-8601 string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairingRecord {
    /// Phone number associated with the pairing code.
    pub phone: String,
    /// Display name; defaults to the phone number when none is supplied.
    pub name: String,
    /// When the record was written.
    pub timestamp: DateTime<Utc>,
}

/// Short-lived store for pairing codes.
///
/// Codes are opaque caller-supplied strings. Each lives under its own
/// namespaced key, is replaced whole on rewrite, and follows
/// `absent -> present -> (expired-deleted | consumed-deleted)`: a missing,
/// expired or corrupt entry all look absent to callers. Expiry is lazy,
/// checked on read and on explicit sweeps; there is no background eviction.
#[derive(Clone)]
pub struct PairingCodeStore {
    storage: Arc<dyn KeyValueStorage>,
}

impl PairingCodeStore {
    /// Create a store over an injected storage area.
    ///
    /// The storage handle is shared; every store constructed over the same
    /// area sees the same codes.
    pub fn new(storage: Arc<dyn KeyValueStorage>) -> Self {
        Self { storage }
    }

    /// Store a pairing code, overwriting any record already at that code.
    ///
    /// The record carries the current wall-clock time; `display_name` falls
    /// back to `phone_number`. Also sweeps expired codes from the whole
    /// namespace before returning.
    pub fn store_code(
        &self,
        code: &str,
        phone_number: &str,
        display_name: Option<&str>,
    ) -> Result<(), PairingStoreError> {
        let record = PairingRecord {
            phone: phone_number.to_string(),
            name: display_name.unwrap_or(phone_number).to_string(),
            timestamp: Utc::now(),
        };

        let json = serde_json::to_string(&record)?;
        self.storage.set(&pairing_key(code), &json)?;

        self.cleanup_old_codes()?;

        Ok(())
    }

    /// Retrieve and consume a pairing code.
    ///
    /// The lookup is destructive: the entry is deleted as it is read, so a
    /// given code succeeds at most once. Returns `None` when the code is
    /// missing, older than the expiry window, or corrupt (a value that does
    /// not parse as a record is treated as absent rather than surfaced).
    pub fn get_code(&self, code: &str) -> Result<Option<PairingRecord>, PairingStoreError> {
        let key = pairing_key(code);

        // Atomic get-and-delete; expired and corrupt values are gone too.
        let Some(raw) = self.storage.remove(&key)? else {
            return Ok(None);
        };

        let record: PairingRecord = match serde_json::from_str(&raw) {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(code, error = %e, "Discarding corrupt pairing record");
                return Ok(None);
            }
        };

        if is_expired(&record, Utc::now()) {
            tracing::debug!(code, "Pairing code expired");
            return Ok(None);
        }

        Ok(Some(record))
    }

    /// Delete every namespaced entry older than the expiry window.
    ///
    /// A value that fails to parse is treated as corrupt and deleted
    /// unconditionally.
    pub fn cleanup_old_codes(&self) -> Result<(), PairingStoreError> {
        let now = Utc::now();

        for key in self.storage.keys()? {
            if !key.starts_with(PAIRING_KEY_PREFIX) {
                continue;
            }
            let Some(raw) = self.storage.get(&key)? else {
                continue;
            };

            let stale = match serde_json::from_str::<PairingRecord>(&raw) {
                Ok(record) => is_expired(&record, now),
                Err(_) => true,
            };
            if stale {
                tracing::debug!(key = %key, "Removing stale pairing entry");
                self.storage.remove(&key)?;
            }
        }

        Ok(())
    }

    /// List every stored code and its record, diagnostic use only.
    ///
    /// Keys are returned with the namespace prefix stripped. Nothing is
    /// expired or deleted here: entries past the expiry window are still
    /// included, and corrupt values are skipped in place.
    pub fn list_codes(&self) -> Result<HashMap<String, PairingRecord>, PairingStoreError> {
        let mut codes = HashMap::new();

        for key in self.storage.keys()? {
            let Some(code) = key.strip_prefix(PAIRING_KEY_PREFIX) else {
                continue;
            };
            let Some(raw) = self.storage.get(&key)? else {
                continue;
            };
            if let Ok(record) = serde_json::from_str::<PairingRecord>(&raw) {
                codes.insert(code.to_string(), record);
            }
        }

        Ok(codes)
    }
}

fn pairing_key(code: &str) -> String {
    format!("{PAIRING_KEY_PREFIX}{code}")
}

/// A record is expired once strictly more than the expiry window has
/// elapsed since its own timestamp.
fn is_expired(record: &PairingRecord, now: DateTime<Utc>) -> bool {
    now.signed_duration_since(record.timestamp) > Duration::minutes(CODE_EXPIRY_MINUTES)
}

/// Generate a random six-digit pairing code.
///
/// The store accepts any opaque string as a code; this is a convenience for
/// callers that want the usual short numeric form.
pub fn generate_code() -> String {
    let mut rng = rand::thread_rng();
    let code: u32 = rng.gen_range(100_000..1_000_000);
    code.to_string()
}
