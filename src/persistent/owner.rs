//! Owner tokens of transient builders.

use std::num::NonZeroU64;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_OWNER: AtomicU64 = AtomicU64::new(1);

/// The identity of one transient editing session.
///
/// A transient builder mints an owner when it is created and when it is
/// forked with `Clone`. The owner dies when the builder is frozen with
/// `persistent()`. Cursors remember the owner of the builder they were
/// created from and refuse to operate on any other builder.
///
/// # Examples
///
/// ```rust
/// use champ_collections::persistent::TransientVector;
///
/// let transient: TransientVector<i32> = TransientVector::new();
/// let fork = transient.clone();
/// assert_ne!(transient.owner(), fork.owner());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Owner(NonZeroU64);

impl Owner {
    pub(crate) fn mint() -> Self {
        let id = NEXT_OWNER.fetch_add(1, Ordering::Relaxed);
        Self(NonZeroU64::new(id).unwrap_or(NonZeroU64::MIN))
    }

    /// Returns the numeric id of this owner.
    #[must_use]
    pub const fn id(self) -> u64 {
        self.0.get()
    }
}
