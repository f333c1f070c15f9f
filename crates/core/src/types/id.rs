//! Typed primary keys.
//!
//! Every table uses a `SERIAL` key. Wrapping each one in its own type keeps a
//! `BookId` from being passed where a `UserId` is expected.

/// Define an `i32` key newtype.
///
/// The generated type serializes as a bare integer, displays as one, and
/// (with the `postgres` feature) binds and decodes as `INTEGER`.
///
/// ```rust
/// # use bookstore_core::define_id;
/// define_id!(
///     /// Shelf key.
///     ShelfId
/// );
///
/// let id = ShelfId::new(3);
/// assert_eq!(id.as_i32(), 3);
/// assert_eq!(id.to_string(), "3");
/// ```
#[macro_export]
macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[cfg_attr(feature = "postgres", derive(::sqlx::Type), sqlx(transparent))]
        #[serde(transparent)]
        pub struct $name(i32);

        impl $name {
            #[must_use]
            pub const fn new(id: i32) -> Self {
                Self(id)
            }

            #[must_use]
            pub const fn as_i32(self) -> i32 {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                ::core::fmt::Display::fmt(&self.0, f)
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

define_id!(
    /// `users.user_id`
    UserId
);
define_id!(
    /// `books.book_id`
    BookId
);
define_id!(
    /// `reviews.review_id`
    ReviewId
);
define_id!(
    /// `cart_items.cart_item_id`
    CartItemId
);
define_id!(
    /// `wishlists.wishlist_id`
    WishlistId
);
define_id!(
    /// `orders.order_id`
    OrderId
);
define_id!(
    /// `order_items.order_item_id`
    OrderItemId
);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_id_serializes_as_plain_integer() {
        let id = BookId::new(42);
        assert_eq!(serde_json::to_string(&id).unwrap(), "42");

        let parsed: BookId = serde_json::from_str("42").unwrap();
        assert_eq!(parsed, id);
        assert!(serde_json::from_str::<BookId>("\"42\"").is_err());
    }

    #[test]
    fn test_id_display_and_conversions() {
        let id = OrderId::from(7);
        assert_eq!(id.to_string(), "7");
        assert_eq!(i32::from(id), 7);
        assert!(OrderId::new(2) > OrderId::new(1));
    }
}
