//! Generation-stable handles for runtime entities.
//!
//! Correlation registries key their entries by these opaque integers rather
//! than by object identity. A handle is assigned once, when the entity is
//! constructed, and never reused within the process.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

macro_rules! define_handle {
    ($(#[$meta:meta])* $name:ident, $counter:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(u64);

        static $counter: AtomicU64 = AtomicU64::new(1);

        impl $name {
            /// Allocate the next unused handle.
            pub fn next() -> Self {
                Self($counter.fetch_add(1, Ordering::Relaxed))
            }

            /// Raw handle value.
            pub const fn get(self) -> u64 {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, concat!($prefix, "#{}"), self.0)
            }
        }
    };
}

define_handle!(
    /// Identifies one source test type.
    TypeKey,
    NEXT_TYPE_KEY,
    "type"
);

define_handle!(
    /// Identifies one class descriptor built by the host framework.
    ClassId,
    NEXT_CLASS_ID,
    "class"
);

define_handle!(
    /// Identifies one test instance, plain or enhanced.
    InstanceId,
    NEXT_INSTANCE_ID,
    "instance"
);

define_handle!(
    /// Identifies one run notifier.
    NotifierId,
    NEXT_NOTIFIER_ID,
    "notifier"
);
