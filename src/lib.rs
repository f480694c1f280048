//! Short-lived pairing codes for linking two devices.
//!
//! A device that wants to link generates a short code, stores it with
//! `PairingCodeStore::store_code`, and shows it to the user. The second
//! device redeems the code with `get_code`, which is destructive: a code
//! can be retrieved at most once, and any code older than ten minutes is
//! treated as absent and deleted.
//!
//! The store itself holds no state beyond a handle to an injected
//! [`storage::KeyValueStorage`], so the same storage area can be shared by
//! every component of the surrounding application.

pub mod pairing;
pub mod storage;

pub use pairing::{PairingCodeStore, PairingRecord, PairingStoreError, generate_code};
pub use storage::{FileStorage, KeyValueStorage, MemoryStorage, StorageError};
