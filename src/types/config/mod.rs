//! Pool settings that cannot be zero
//!
//! Ports and connection limits share one shape: a `NonZero` integer that
//! parses from text and environment variables and refuses zero in TOML.

/// Declare a non-zero setting
///
/// `zero => Variant` names the [`ValidationError`](crate::types::ValidationError)
/// reported when the value is 0. Parsing trims whitespace and reports
/// `InvalidNumber` for anything that is not an integer in range.
macro_rules! nonzero_setting {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident($int:ty), zero => $zero:ident;
    ) => {
        $(#[$meta])*
        #[repr(transparent)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        $vis struct $name(std::num::NonZero<$int>);

        impl $name {
            /// `None` when `value` is 0
            #[must_use]
            pub const fn new(value: $int) -> Option<Self> {
                match std::num::NonZero::<$int>::new(value) {
                    Some(nz) => Some(Self(nz)),
                    None => None,
                }
            }

            #[must_use]
            #[inline]
            pub const fn get(&self) -> $int {
                self.0.get()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                std::fmt::Display::fmt(&self.0, f)
            }
        }

        impl From<$name> for $int {
            fn from(val: $name) -> Self {
                val.get()
            }
        }

        impl TryFrom<$int> for $name {
            type Error = $crate::types::ValidationError;

            fn try_from(value: $int) -> Result<Self, Self::Error> {
                Self::new(value).ok_or($crate::types::ValidationError::$zero)
            }
        }

        impl std::str::FromStr for $name {
            type Err = $crate::types::ValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let value = s.trim().parse::<$int>().map_err(|_| {
                    $crate::types::ValidationError::InvalidNumber(s.to_string())
                })?;
                Self::try_from(value)
            }
        }

        impl serde::Serialize for $name {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serde::Serialize::serialize(&self.get(), serializer)
            }
        }

        impl<'de> serde::Deserialize<'de> for $name {
            fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let value = <$int as serde::Deserialize>::deserialize(deserializer)?;
                Self::try_from(value).map_err(serde::de::Error::custom)
            }
        }
    };
}

pub mod duration;
mod limits;
mod network;

pub use duration::{duration_serde, option_duration_serde};
pub use limits::MaxConnections;
pub use network::Port;
