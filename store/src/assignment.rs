//! Role assignment storage trait.
//!
//! The key IS the (subject, server, role) triple, which makes uniqueness
//! structural: there is no way to create a second row for the same triple.
//! `upsert` runs a caller-supplied closure atomically under the backend's
//! write lock/transaction; a naive read-then-write outside the store would
//! be racy under concurrent verification attempts for the same triple.

use crate::StoreError;
use tokengate_types::{AssignmentKey, RoleAssignment};

pub trait AssignmentStore: Send + Sync {
    /// Read one assignment by its triple.
    fn get(&self, key: &AssignmentKey) -> Result<Option<RoleAssignment>, StoreError>;

    /// Atomically read-modify-write the row for `key`. The closure receives
    /// the current row (if any) and returns the row to persist, or `None` to
    /// leave the store untouched (conditional transitions decline this way).
    /// The closure must be side-effect free.
    ///
    /// Returns the written row, or `None` when the closure declined.
    fn upsert(
        &self,
        key: &AssignmentKey,
        apply: &mut dyn FnMut(Option<&RoleAssignment>) -> Option<RoleAssignment>,
    ) -> Result<Option<RoleAssignment>, StoreError>;

    /// All rows with status `active`, oldest `last_checked_at` first (the
    /// reverification sweep order).
    fn all_active(&self) -> Result<Vec<RoleAssignment>, StoreError>;
}
