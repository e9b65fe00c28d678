//! Challenge nonce storage trait.
//!
//! A keyed TTL store with bounded size, one live entry per subject. The
//! engine's nonce manager layers the single-use semantics on top; this trait
//! is plain get/put/delete.

use crate::StoreError;
use tokengate_types::{NonceEntry, SubjectId};

pub trait NonceStore: Send + Sync {
    /// Store an entry for a subject, unconditionally replacing any existing
    /// one. Implementations enforce their capacity bound here.
    fn put(&self, subject: &SubjectId, entry: NonceEntry) -> Result<(), StoreError>;

    /// Read the live entry for a subject. Expired entries are treated as
    /// absent (implementations may drop them lazily on read).
    fn get(&self, subject: &SubjectId) -> Result<Option<NonceEntry>, StoreError>;

    /// Remove the entry for a subject. Idempotent.
    fn delete(&self, subject: &SubjectId) -> Result<(), StoreError>;
}
