//! Seed the database with demo data.
//!
//! Creates an admin (`admin@example.com` / `Admin123!`), regular users
//! (`user{n}@example.com` / `User123!`), a random catalog, reviews, placed
//! orders in every status, and leaves some carts and wishlists filled.
//!
//! Re-running is safe: existing accounts are reused and duplicate reviews
//! are skipped.

use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;
use sqlx::PgPool;

use bookstore_api::db::{
    BookRepository, CartRepository, OrderRepository, RepositoryError, ReviewRepository,
    UserRepository, WishlistRepository,
};
use bookstore_api::models::{CartItem, NewBook};
use bookstore_api::services::auth::{AuthError, hash_password};
use bookstore_core::{BookId, Email, OrderStatus, Price, UserId, UserRole};

use super::{CommandError, connect};

const ADMIN_EMAIL: &str = "admin@example.com";
const ADMIN_PASSWORD: &str = "Admin123!";
const USER_PASSWORD: &str = "User123!";

const CATEGORIES: &[&str] = &["Fiction", "Tech", "History", "Art", "Science"];

const TITLE_ADJECTIVES: &[&str] = &[
    "Silent", "Hidden", "Last", "Broken", "Golden", "Endless", "Practical", "Forgotten",
    "Modern", "Wild",
];
const TITLE_NOUNS: &[&str] = &[
    "Garden", "Algorithm", "Empire", "Ocean", "Canvas", "Theory", "Compiler", "River",
    "Kingdom", "Machine",
];
const FIRST_NAMES: &[&str] = &["Ada", "Hiro", "Maya", "Tomas", "Lena", "Omar", "Iris", "Noah"];
const LAST_NAMES: &[&str] = &["Kim", "Okafor", "Silva", "Novak", "Haddad", "Berg", "Park", "Reyes"];

const REVIEW_LINES: &[&str] = &[
    "Could not put it down.",
    "Solid, if a little long.",
    "Not for me.",
    "A classic I'll reread.",
    "Great reference to keep on the desk.",
    "The ending fell flat.",
];

/// How much data to generate.
#[derive(Debug, Clone)]
pub struct SeedOptions {
    pub users: u32,
    pub books: u32,
    pub reviews: u32,
    pub orders: u32,
    pub seed: Option<u64>,
}

fn pick<'a>(rng: &mut StdRng, items: &'a [&'a str]) -> &'a str {
    items.choose(rng).copied().unwrap_or_default()
}

/// A random catalog entry.
fn random_book(rng: &mut StdRng) -> NewBook {
    let title = format!("The {} {}", pick(rng, TITLE_ADJECTIVES), pick(rng, TITLE_NOUNS));
    let author = format!("{} {}", pick(rng, FIRST_NAMES), pick(rng, LAST_NAMES));
    let category = pick(rng, CATEGORIES).to_owned();

    // 5.00 ..= 59.99
    let cents = rng.random_range(500_i64..6000);
    let price = Price::new(Decimal::new(cents, 2)).unwrap_or_default();

    NewBook {
        description: Some(format!("A {} title by {author}.", category.to_lowercase())),
        title,
        author,
        category,
        price,
        stock: rng.random_range(0..=100),
        is_bestseller: rng.random_bool(0.15),
        image_url: None,
    }
}

/// A terminal or pending status, weighted towards paid orders.
fn random_status(rng: &mut StdRng) -> OrderStatus {
    match rng.random_range(0..20) {
        0..=6 => OrderStatus::Pending,
        7..=16 => OrderStatus::Paid,
        _ => OrderStatus::Canceled,
    }
}

/// Create the account, or return the existing one with that email.
async fn ensure_user(
    pool: &PgPool,
    name: &str,
    email: &str,
    password_hash: &str,
    role: UserRole,
) -> Result<UserId, CommandError> {
    let users = UserRepository::new(pool);
    let email = Email::parse(email).map_err(AuthError::from)?;

    match users.create(name, &email, password_hash, role).await {
        Ok(user) => Ok(user.id),
        Err(RepositoryError::Conflict(_)) => users
            .get_by_email(&email)
            .await?
            .map(|user| user.id)
            .ok_or_else(|| CommandError::UserNotFound(email.to_string())),
        Err(e) => Err(e.into()),
    }
}

async fn seed_users(pool: &PgPool, count: u32) -> Result<Vec<UserId>, CommandError> {
    let admin_hash = hash_password(ADMIN_PASSWORD)?;
    ensure_user(pool, "Administrator", ADMIN_EMAIL, &admin_hash, UserRole::Admin).await?;
    tracing::info!("Admin ready: {} / {}", ADMIN_EMAIL, ADMIN_PASSWORD);

    // One hash shared by every demo user
    let user_hash = hash_password(USER_PASSWORD)?;
    let mut ids = Vec::with_capacity(count as usize);
    for n in 1..=count {
        let id = ensure_user(
            pool,
            &format!("Reader {n}"),
            &format!("user{n}@example.com"),
            &user_hash,
            UserRole::User,
        )
        .await?;
        ids.push(id);
    }

    tracing::info!("{} users ready (password {})", ids.len(), USER_PASSWORD);
    Ok(ids)
}

async fn seed_books(
    pool: &PgPool,
    rng: &mut StdRng,
    count: u32,
) -> Result<Vec<BookId>, CommandError> {
    let books = BookRepository::new(pool);
    let mut ids = Vec::with_capacity(count as usize);

    for _ in 0..count {
        let book = books.create(&random_book(rng)).await?;
        ids.push(book.id);
    }

    tracing::info!("{} books created", ids.len());
    Ok(ids)
}

async fn seed_reviews(
    pool: &PgPool,
    rng: &mut StdRng,
    users: &[UserId],
    books: &[BookId],
    count: u32,
) -> Result<(), CommandError> {
    let reviews = ReviewRepository::new(pool);
    let mut created = 0_u32;

    for _ in 0..count {
        let (Some(&user), Some(&book)) = (users.choose(rng), books.choose(rng)) else {
            break;
        };
        let rating = rng.random_range(1..=5);
        let content = rng.random_bool(0.8).then(|| pick(rng, REVIEW_LINES));

        match reviews.create(user, book, rating, content).await {
            Ok(review) => {
                created += 1;
                for _ in 0..rng.random_range(0..4) {
                    reviews.like(review.id).await?;
                }
            }
            Err(RepositoryError::Conflict(_)) => {}
            Err(e) => return Err(e.into()),
        }
    }

    tracing::info!("{} reviews created", created);
    Ok(())
}

/// Fill a cart with one to three random books.
async fn fill_cart(
    pool: &PgPool,
    rng: &mut StdRng,
    user: UserId,
    books: &[BookId],
) -> Result<(), CommandError> {
    let cart = CartRepository::new(pool);
    for _ in 0..rng.random_range(1..=3) {
        if let Some(&book) = books.choose(rng) {
            cart.add(user, book, rng.random_range(1..=3), CartItem::MAX_QUANTITY)
                .await?;
        }
    }
    Ok(())
}

async fn seed_orders(
    pool: &PgPool,
    rng: &mut StdRng,
    users: &[UserId],
    books: &[BookId],
    count: u32,
) -> Result<(), CommandError> {
    let orders = OrderRepository::new(pool);
    let mut placed = 0_u32;

    for _ in 0..count {
        let Some(&user) = users.choose(rng) else {
            break;
        };
        // Start from an empty cart so the order holds only what we add here
        CartRepository::new(pool).clear(user).await?;
        fill_cart(pool, rng, user, books).await?;

        let Some(order) = orders.create_from_cart(user).await? else {
            continue;
        };
        let status = random_status(rng);
        if status != OrderStatus::Pending {
            orders.update_status(order.order.id, status).await?;
        }
        placed += 1;
    }

    tracing::info!("{} orders placed", placed);
    Ok(())
}

/// Leave some carts and wishlists filled for manual testing.
async fn seed_carts_and_wishlists(
    pool: &PgPool,
    rng: &mut StdRng,
    users: &[UserId],
    books: &[BookId],
) -> Result<(), CommandError> {
    let wishlists = WishlistRepository::new(pool);

    for &user in users {
        if rng.random_bool(0.5) {
            fill_cart(pool, rng, user, books).await?;
        }
        for _ in 0..rng.random_range(0..=3) {
            if let Some(&book) = books.choose(rng) {
                wishlists.add(user, book).await?;
            }
        }
    }

    tracing::info!("Carts and wishlists filled");
    Ok(())
}

/// Generate demo data.
pub async fn run(options: &SeedOptions) -> Result<(), CommandError> {
    let mut rng = options
        .seed
        .map_or_else(StdRng::from_os_rng, StdRng::seed_from_u64);

    let pool = connect().await?;

    let users = seed_users(&pool, options.users).await?;
    let books = seed_books(&pool, &mut rng, options.books).await?;
    seed_reviews(&pool, &mut rng, &users, &books, options.reviews).await?;
    seed_orders(&pool, &mut rng, &users, &books, options.orders).await?;
    seed_carts_and_wishlists(&pool, &mut rng, &users, &books).await?;

    tracing::info!("Seeding complete!");
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_random_book_is_valid() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let book = random_book(&mut rng);
            assert!(book.title.starts_with("The "));
            assert!(CATEGORIES.contains(&book.category.as_str()));
            assert!(book.price.amount() >= Decimal::new(500, 2));
            assert!(book.price.amount() < Decimal::new(6000, 2));
            assert!((0..=100).contains(&book.stock));
        }
    }

    #[test]
    fn test_seeded_rng_is_reproducible() {
        let a = random_book(&mut StdRng::seed_from_u64(42));
        let b = random_book(&mut StdRng::seed_from_u64(42));
        assert_eq!(a.title, b.title);
        assert_eq!(a.price, b.price);
    }

    #[test]
    fn test_random_status_covers_all() {
        let mut rng = StdRng::seed_from_u64(1);
        let statuses: Vec<_> = (0..500).map(|_| random_status(&mut rng)).collect();
        for status in OrderStatus::ALL {
            assert!(statuses.contains(&status));
        }
    }
}
