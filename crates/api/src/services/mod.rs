//! Business logic services.
//!
//! - `auth` - Signup, login, password hashing, and JWT issuance
//!
//! CRUD resources talk to their repositories directly from the handlers.

pub mod auth;
