//! Bookstore CLI - Database migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! bookstore-cli migrate
//!
//! # Fill a fresh database with demo data
//! bookstore-cli seed --users 20 --books 60
//!
//! # Create a user, or promote an existing one to admin
//! bookstore-cli user create -e reader@example.com -n "Reader" -p 'Str0ngPass!'
//! bookstore-cli user promote -e reader@example.com
//! ```
//!
//! # Environment Variables
//!
//! - `BOOKSTORE_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

use commands::seed::SeedOptions;

#[derive(Parser)]
#[command(name = "bookstore-cli")]
#[command(author, version, about = "Bookstore CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Seed the database with demo data
    Seed {
        /// Regular users to create (besides the admin)
        #[arg(long, default_value_t = 10)]
        users: u32,

        /// Books to create
        #[arg(long, default_value_t = 40)]
        books: u32,

        /// Reviews to attempt (duplicates are skipped)
        #[arg(long, default_value_t = 80)]
        reviews: u32,

        /// Orders to place
        #[arg(long, default_value_t = 15)]
        orders: u32,

        /// RNG seed for reproducible data
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Manage users
    User {
        #[command(subcommand)]
        action: UserAction,
    },
}

#[derive(Subcommand)]
enum UserAction {
    /// Create a new user
    Create {
        /// Email address
        #[arg(short, long)]
        email: String,

        /// Display name
        #[arg(short, long)]
        name: String,

        /// Password
        #[arg(short, long)]
        password: String,

        /// Role (`USER` or `ADMIN`)
        #[arg(short, long, default_value = "USER")]
        role: String,
    },
    /// Grant the admin role to an existing user
    Promote {
        /// Email address
        #[arg(short, long)]
        email: String,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CommandError> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Seed {
            users,
            books,
            reviews,
            orders,
            seed,
        } => {
            let options = SeedOptions {
                users,
                books,
                reviews,
                orders,
                seed,
            };
            commands::seed::run(&options).await?;
        }
        Commands::User { action } => match action {
            UserAction::Create {
                email,
                name,
                password,
                role,
            } => {
                commands::user::create(&email, &name, &password, &role).await?;
            }
            UserAction::Promote { email } => commands::user::promote(&email).await?,
        },
    }
    Ok(())
}
