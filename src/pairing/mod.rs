//! Pairing codes for linking two devices.
//!
//! One device stores a short code, the other redeems it. Codes live in a
//! shared key-value storage area under a fixed namespace prefix and expire
//! ten minutes after they are written.

mod store;

pub use store::{PairingCodeStore, PairingRecord, PairingStoreError, generate_code};
