//! Save/load persistence
//!
//! Features:
//! - Versioned JSON envelope per record
//! - Field-by-field merge of partially shaped records (serde defaults)
//! - Corruption detection with fallback to defaults

pub mod envelope;

pub use envelope::{Envelope, PersistError, Persisted, load_record, save_record};
