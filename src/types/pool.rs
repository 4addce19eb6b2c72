//! Connection pool metric newtypes
//!
//! Type-safe wrappers for pool statistics, so an idle count can never be
//! passed where a lifetime total is expected.

use std::fmt;

/// Generates a `usize` counter newtype with `new`, `get`, `zero`,
/// `Display` and `From<usize>`.
macro_rules! count_newtype {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident;
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
        $vis struct $name(usize);

        impl $name {
            #[doc = concat!("Create a new ", stringify!($name), " value")]
            #[inline]
            pub const fn new(count: usize) -> Self {
                Self(count)
            }

            /// Get the raw value
            #[inline]
            #[must_use]
            pub const fn get(self) -> usize {
                self.0
            }

            /// Zero value
            #[inline]
            pub const fn zero() -> Self {
                Self(0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<usize> for $name {
            fn from(value: usize) -> Self {
                Self(value)
            }
        }
    };
}

count_newtype! {
    /// Number of idle connections currently held by the pool
    ///
    /// Always ≤ [`MaxPoolSize`].
    pub struct AvailableConnections;
}

count_newtype! {
    /// Idle capacity of the pool
    pub struct MaxPoolSize;
}

count_newtype! {
    /// Total number of transports created over the pool's lifetime
    ///
    /// Monotonically increasing; useful for spotting connection churn.
    pub struct CreatedConnections;
}

count_newtype! {
    /// Number of transports currently alive, idle and leased together
    pub struct OpenConnections;
}

count_newtype! {
    /// Number of connections currently leased to callers
    pub struct InUseConnections;
}

impl InUseConnections {
    /// Derive the leased count from the live and idle counts
    #[inline]
    pub fn from_pool_stats(open: OpenConnections, available: AvailableConnections) -> Self {
        Self(open.get().saturating_sub(available.get()))
    }
}
