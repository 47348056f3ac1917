//! Macro for giving wire-format enums a string form
//!
//! Queue and backup enums are persisted as lowercase strings. This macro
//! derives `as_str`, `Display` and `FromStr` from a single variant table so
//! the three never drift apart.
//!
//! # Example
//!
//! ```rust
//! use carelog_domain::impl_wire_name_conversions;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! pub enum Stage {
//!     Queued,
//!     Sent,
//! }
//!
//! impl_wire_name_conversions!(Stage {
//!     Queued => "queued",
//!     Sent => "sent",
//! });
//!
//! assert_eq!(Stage::Sent.as_str(), "sent");
//! assert_eq!("QUEUED".parse::<Stage>(), Ok(Stage::Queued));
//! ```

/// Implements `as_str`, `Display` and `FromStr` for a fieldless enum.
///
/// Parsing is case-insensitive and treats `_` like `-`.
#[macro_export]
macro_rules! impl_wire_name_conversions {
    ($enum_name:ident { $($variant:ident => $str:literal),+ $(,)? }) => {
        impl $enum_name {
            /// Wire name of this variant.
            pub const fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $str,)+
                }
            }
        }

        impl std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $enum_name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let normalized = s.trim().to_lowercase().replace('_', "-");
                match normalized.as_str() {
                    $($str => Ok(Self::$variant),)+
                    _ => Err(format!("Invalid {}: {}", stringify!($enum_name), s)),
                }
            }
        }
    };
}
