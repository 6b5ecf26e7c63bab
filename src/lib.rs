//! # champ-collections
//!
//! Persistent (immutable) collections built on structural sharing, with
//! transient builders for batching edits.
//!
//! ## Overview
//!
//! - **Hash map and set**: [`PersistentHashMap`](persistent::PersistentHashMap)
//!   and [`PersistentHashSet`](persistent::PersistentHashSet), based on the
//!   Compressed Hash-Array Mapped Prefix-tree (CHAMP)
//! - **Sequenced map and set**: [`SequencedHashMap`](persistent::SequencedHashMap)
//!   and [`SequencedHashSet`](persistent::SequencedHashSet), which iterate in
//!   insertion order and can move entries to either end
//! - **Vector**: [`PersistentVector`](persistent::PersistentVector), with cheap
//!   edits at both ends, positional insert and remove, split and append
//! - **Transient builders**: mutable counterparts that edit the nodes they own
//!   in place and freeze back into persistent values in O(1)
//! - **Bounded variants** that fail with
//!   [`CapacityError`](persistent::CapacityError) instead of growing
//!
//! ## Feature Flags
//!
//! - `arc` (default): share nodes through `Arc`, making persistent
//!   collections `Send + Sync`; without it nodes use `Rc`
//! - `serde`: `Serialize` and `Deserialize` for the persistent collections
//! - `fxhash`: hash keys with `FxHasher`
//! - `ahash`: hash keys with `AHasher` (ignored when `fxhash` is enabled)
//! - `full`: `arc` and `serde`
//!
//! ## Example
//!
//! ```rust
//! use champ_collections::prelude::*;
//!
//! let scores: PersistentHashMap<String, u32> = [("ada".to_string(), 3), ("grace".to_string(), 5)]
//!     .into_iter()
//!     .collect();
//! let updated = scores.update_with("ada", |score| score.map(|score| score + 1));
//! assert_eq!(updated.get("ada"), Some(&4));
//! assert_eq!(scores.get("ada"), Some(&3));
//!
//! let mut recent = TransientSequencedHashMap::new();
//! recent.insert_last("a", 1);
//! recent.insert_last("b", 2);
//! recent.insert_last("a", 3);
//! let recent = recent.persistent();
//! assert_eq!(recent.keys().collect::<Vec<_>>(), vec![&"b", &"a"]);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Prelude module for convenient imports.
///
/// Re-exports every collection, builder, cursor and error type.
///
/// # Usage
///
/// ```rust
/// use champ_collections::prelude::*;
/// ```
pub mod prelude {
    pub use crate::persistent::*;
}

pub mod persistent;
