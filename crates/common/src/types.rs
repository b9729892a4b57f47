use serde::{Deserialize, Serialize};

/// Declares a newtype over a database-assigned `i64` key.
///
/// Wrapping the raw integer keeps a user id from being passed where a
/// product id is expected.
macro_rules! integer_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Creates an identifier from a raw key.
            pub const fn new(id: i64) -> Self {
                Self(id)
            }

            /// Returns the raw key.
            pub const fn get(&self) -> i64 {
                self.0
            }

            /// Returns true if the key could have been assigned by storage.
            pub const fn is_valid(&self) -> bool {
                self.0 > 0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self(id)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

integer_id!(
    /// Identifier of a registered buyer.
    UserId
);

integer_id!(
    /// Identifier of a buyer's shipping address.
    AddressId
);

integer_id!(
    /// Identifier of a stored, already authorized payment method.
    PaymentMethodId
);

integer_id!(
    /// Identifier of a catalog product.
    ProductId
);

integer_id!(
    /// Identifier of a catalog category.
    CategoryId
);

integer_id!(
    /// Identifier assigned to an order when it is inserted.
    OrderId
);
