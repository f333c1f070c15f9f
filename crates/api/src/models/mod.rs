//! Domain types.
//!
//! These are validated domain objects returned by the repositories. JSON
//! views live next to the handlers in [`crate::routes`].

pub mod book;
pub mod cart;
pub mod order;
pub mod pagination;
pub mod review;
pub mod user;
pub mod wishlist;

pub use book::{Book, BookChanges, BookFilter, BookSort, NewBook};
pub use cart::{CartItem, CartLine, CartSummary};
pub use order::{Order, OrderFilter, OrderItem, OrderSort, OrderWithItems};
pub use pagination::{Page, PageRequest, Sort, SortDirection, SortField};
pub use review::{Review, ReviewFilter, ReviewSort};
pub use user::{CurrentUser, User};
pub use wishlist::{WishlistEntry, WishlistLine};
