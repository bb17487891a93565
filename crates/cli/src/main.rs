//! Shop CLI - database migrations, seeding and account management.
//!
//! # Usage
//!
//! ```bash
//! # Apply database migrations
//! shop-cli migrate
//!
//! # Create the starter catalog (safe to repeat)
//! shop-cli seed products
//!
//! # Create a superuser
//! shop-cli user create -u admin -p 'long-password' --superuser
//!
//! # Let a group view order details
//! shop-cli group create -n managers
//! shop-cli group grant -n managers -p shopapp.view_order
//! shop-cli user add-to-group -u jane -g managers
//! ```
//!
//! # Environment Variables
//!
//! - `SHOP_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "shop-cli")]
#[command(author, version, about = "Shop CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Seed the database
    Seed {
        #[command(subcommand)]
        target: SeedTarget,
    },
    /// Manage user accounts
    User {
        #[command(subcommand)]
        action: UserAction,
    },
    /// Manage permission groups
    Group {
        #[command(subcommand)]
        action: GroupAction,
    },
    /// Inspect the permission catalogue
    Permissions {
        #[command(subcommand)]
        action: PermissionsAction,
    },
}

#[derive(Subcommand)]
enum SeedTarget {
    /// Get or create the starter products
    Products,
}

#[derive(Subcommand)]
enum UserAction {
    /// Create a new user
    Create {
        /// Login name
        #[arg(short, long)]
        username: String,

        /// Password (at least 8 characters)
        #[arg(short, long, env = "SHOP_USER_PASSWORD", hide_env_values = true)]
        password: String,

        /// Grant every permission
        #[arg(long)]
        superuser: bool,
    },
    /// Grant a permission directly to a user
    Grant {
        #[arg(short, long)]
        username: String,

        /// Permission code, e.g. `shopapp.view_order`
        #[arg(short, long)]
        permission: String,
    },
    /// Add a user to a group
    AddToGroup {
        #[arg(short, long)]
        username: String,

        #[arg(short, long)]
        group: String,
    },
}

#[derive(Subcommand)]
enum GroupAction {
    /// Create a new group
    Create {
        #[arg(short, long)]
        name: String,
    },
    /// Grant a permission to a group
    Grant {
        #[arg(short, long)]
        name: String,

        /// Permission code, e.g. `shopapp.view_order`
        #[arg(short, long)]
        permission: String,
    },
}

#[derive(Subcommand)]
enum PermissionsAction {
    /// List every known permission
    List,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Seed { target } => match target {
            SeedTarget::Products => commands::seed::products().await?,
        },
        Commands::User { action } => match action {
            UserAction::Create {
                username,
                password,
                superuser,
            } => commands::user::create(&username, &password, superuser).await?,
            UserAction::Grant {
                username,
                permission,
            } => commands::user::grant(&username, &permission).await?,
            UserAction::AddToGroup { username, group } => {
                commands::user::add_to_group(&username, &group).await?;
            }
        },
        Commands::Group { action } => match action {
            GroupAction::Create { name } => commands::group::create(&name).await?,
            GroupAction::Grant { name, permission } => {
                commands::group::grant(&name, &permission).await?;
            }
        },
        Commands::Permissions { action } => match action {
            PermissionsAction::List => commands::group::list_permissions().await?,
        },
    }
    Ok(())
}
