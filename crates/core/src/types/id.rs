//! Newtype IDs for type-safe entity references.
//!
//! Every table in the marketplace schema uses a `SERIAL` primary key. Wrapping
//! each one in its own type keeps a `ProductId` from being passed where a
//! `MarketId` is expected, which matters for orders and ratings that carry
//! several foreign keys at once.

/// Define a type-safe ID wrapper around `i32`.
///
/// The generated type is `Copy`, hashable, serializes as a bare integer, and
/// (with the `postgres` feature) encodes/decodes as a Postgres `INTEGER`.
///
/// # Example
///
/// ```rust
/// # use bazaar_core::define_id;
/// define_id!(WidgetId);
///
/// let id = WidgetId::new(7);
/// assert_eq!(id.as_i32(), 7);
/// assert_eq!(id.to_string(), "7");
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            PartialOrd,
            Ord,
            Hash,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[cfg_attr(feature = "postgres", derive(::sqlx::Type))]
        #[cfg_attr(feature = "postgres", sqlx(transparent))]
        #[serde(transparent)]
        pub struct $name(i32);

        impl $name {
            /// Create a new ID from an i32 value.
            #[must_use]
            pub const fn new(id: i32) -> Self {
                Self(id)
            }

            /// Get the underlying i32 value.
            #[must_use]
            pub const fn as_i32(&self) -> i32 {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl ::core::str::FromStr for $name {
            type Err = ::core::num::ParseIntError;

            fn from_str(s: &str) -> ::core::result::Result<Self, Self::Err> {
                s.trim().parse::<i32>().map(Self)
            }
        }

        impl From<i32> for $name {
            fn from(id: i32) -> Self {
                Self(id)
            }
        }

        impl From<$name> for i32 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id!(UserId);
define_id!(AddressId);
define_id!(OtpId);
define_id!(MarketId);
define_id!(ProductId);
define_id!(OrderId);
define_id!(OrderItemId);
define_id!(RatingId);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_id_serializes_as_bare_integer() {
        let json = serde_json::to_string(&ProductId::new(7)).unwrap();
        assert_eq!(json, "7");

        let parsed: MarketId = serde_json::from_str("2").unwrap();
        assert_eq!(parsed, MarketId::new(2));
    }

    #[test]
    fn test_id_from_str() {
        let id: OrderId = " 42 ".parse().unwrap();
        assert_eq!(id.as_i32(), 42);
        assert!("forty-two".parse::<OrderId>().is_err());
    }
}
