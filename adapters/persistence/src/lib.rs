#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Persistence adapter that stores the Deck Tally aggregate in an opaque
//! key-value store.
//!
//! The [`PersistenceCodec`] turns a [`deck_tally_core::TallyState`] into a JSON
//! document and back, rejecting any payload that does not match the expected
//! shape. A [`Session`] owns the authoritative tally, loads it once on open
//! and rewrites the stored payload after every accepted command.

mod codec;
mod session;
mod store;
mod transfer;

pub use codec::{DecodeError, PersistenceCodec, SchemaPolicy};
pub use session::Session;
pub use store::{FileStore, KeyValueStore, MemoryStore, StoreError};
pub use transfer::{decode_transfer, encode_transfer, TransferError, TRANSFER_HEADER};

/// Store key under which the tally aggregate is persisted by default.
pub const STORAGE_KEY: &str = "deck_tally_state";
