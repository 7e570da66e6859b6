//! Mary's Fashion CLI - back-office tools.
//!
//! # Usage
//!
//! ```bash
//! # Catalog
//! mf-cli products list --category vestidos
//! mf-cli products get 3
//! mf-cli products create --file produto.json
//! mf-cli categories list
//!
//! # Users
//! mf-cli users list --role admin --inactive
//! mf-cli users create --file usuario.json
//! mf-cli users deactivate 6f1c1c52-3c0e-4d6b-9a43-4a1f6f0a9b10
//!
//! # Images
//! mf-cli images upload foto1.jpg foto2.png
//! mf-cli images remove product-images/1736942400000-k3j9x0a2b1c.jpg
//!
//! # Search
//! mf-cli search vestido
//! mf-cli suggest sai
//! ```
//!
//! # Commands
//!
//! - `products` - List, show, create, update and delete products
//! - `categories` - List, create, update and delete categories
//! - `users` - Manage back-office accounts
//! - `images` - Upload and remove product images
//! - `search` / `suggest` - Query the catalog like the storefront does

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use marys_fashion_core::{CategoryId, ProductId, UserFilters, UserId, UserRole};

mod commands;

use commands::catalog::ProductFilter;
use commands::{CliError, Context};

#[derive(Parser)]
#[command(name = "mf-cli")]
#[command(author, version, about = "Mary's Fashion back-office tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage products
    Products {
        #[command(subcommand)]
        action: ProductAction,
    },
    /// Manage categories
    Categories {
        #[command(subcommand)]
        action: CategoryAction,
    },
    /// Manage back-office users
    Users {
        #[command(subcommand)]
        action: UserAction,
    },
    /// Manage product images
    Images {
        #[command(subcommand)]
        action: ImageAction,
    },
    /// Search products by name, description or category
    Search { query: String },
    /// Show autocomplete suggestions for a partial query
    Suggest { query: String },
}

#[derive(Subcommand)]
enum ProductAction {
    /// List products, newest first
    List {
        /// Only products in this category
        #[arg(short, long)]
        category: Option<String>,

        /// Only featured products
        #[arg(short, long)]
        featured: bool,

        /// Substring of name, description or category
        #[arg(short, long)]
        search: Option<String>,
    },
    /// Show one product
    Get { id: ProductId },
    /// Create a product from a JSON file
    Create {
        #[arg(short, long)]
        file: PathBuf,
    },
    /// Update a product from a JSON patch file
    Update {
        id: ProductId,

        #[arg(short, long)]
        file: PathBuf,
    },
    /// Delete a product
    Delete { id: ProductId },
}

#[derive(Subcommand)]
enum CategoryAction {
    /// List categories by name
    List,
    /// Create a category from a JSON file
    Create {
        #[arg(short, long)]
        file: PathBuf,
    },
    /// Update a category from a JSON patch file
    Update {
        id: CategoryId,

        #[arg(short, long)]
        file: PathBuf,
    },
    /// Delete a category
    Delete { id: CategoryId },
}

#[derive(Subcommand)]
enum UserAction {
    /// List users
    List {
        /// Role (`admin`, `moderator`, `user`)
        #[arg(short, long)]
        role: Option<UserRole>,

        /// Only active users
        #[arg(long, conflicts_with = "inactive")]
        active: bool,

        /// Only inactive users
        #[arg(long)]
        inactive: bool,

        /// Substring of email or full name
        #[arg(short, long)]
        search: Option<String>,
    },
    /// Create a user from a JSON file
    Create {
        #[arg(short, long)]
        file: PathBuf,
    },
    /// Reactivate a user
    Activate { id: UserId },
    /// Deactivate a user without deleting it
    Deactivate { id: UserId },
    /// Delete a user permanently
    Delete { id: UserId },
}

#[derive(Subcommand)]
enum ImageAction {
    /// Upload image files
    Upload {
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Bucket (default `product-images`)
        #[arg(short, long)]
        bucket: Option<String>,
    },
    /// Remove a stored image by its path
    Remove {
        path: String,

        /// Bucket (default `product-images`)
        #[arg(short, long)]
        bucket: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    // Logs go to stderr so stdout stays valid JSON
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mf_cli=info,marys_fashion_storefront=warn".into()),
        )
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let ctx = Context::from_env()?;

    match cli.command {
        Commands::Products { action } => match action {
            ProductAction::List {
                category,
                featured,
                search,
            } => {
                let filter = ProductFilter {
                    category,
                    featured,
                    search,
                };
                commands::catalog::list_products(&ctx, &filter).await?;
            }
            ProductAction::Get { id } => commands::catalog::get_product(&ctx, id).await?,
            ProductAction::Create { file } => commands::catalog::create_product(&ctx, &file).await?,
            ProductAction::Update { id, file } => {
                commands::catalog::update_product(&ctx, id, &file).await?;
            }
            ProductAction::Delete { id } => commands::catalog::delete_product(&ctx, id).await?,
        },
        Commands::Categories { action } => match action {
            CategoryAction::List => commands::catalog::list_categories(&ctx).await?,
            CategoryAction::Create { file } => {
                commands::catalog::create_category(&ctx, &file).await?;
            }
            CategoryAction::Update { id, file } => {
                commands::catalog::update_category(&ctx, id, &file).await?;
            }
            CategoryAction::Delete { id } => commands::catalog::delete_category(&ctx, id).await?,
        },
        Commands::Users { action } => match action {
            UserAction::List {
                role,
                active,
                inactive,
                search,
            } => {
                let filters = UserFilters {
                    role,
                    is_active: (active || inactive).then_some(active),
                    search,
                };
                commands::users::list(&ctx, &filters).await?;
            }
            UserAction::Create { file } => commands::users::create(&ctx, &file).await?,
            UserAction::Activate { id } => commands::users::set_active(&ctx, id, true).await?,
            UserAction::Deactivate { id } => commands::users::set_active(&ctx, id, false).await?,
            UserAction::Delete { id } => commands::users::delete(&ctx, id).await?,
        },
        Commands::Images { action } => match action {
            ImageAction::Upload { files, bucket } => {
                commands::images::upload(&ctx, &files, bucket.as_deref()).await?;
            }
            ImageAction::Remove { path, bucket } => {
                commands::images::remove(&ctx, &path, bucket.as_deref()).await?;
            }
        },
        Commands::Search { query } => commands::search::search(&ctx, &query).await?,
        Commands::Suggest { query } => commands::search::suggest(&ctx, &query).await?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parses_user_filters() {
        let cli = Cli::try_parse_from(["mf-cli", "users", "list", "--role", "admin", "--inactive"])
            .unwrap_or_else(|e| panic!("{e}"));
        match cli.command {
            Commands::Users {
                action:
                    UserAction::List {
                        role,
                        active,
                        inactive,
                        ..
                    },
            } => {
                assert_eq!(role, Some(UserRole::Admin));
                assert!(!active);
                assert!(inactive);
            }
            _ => panic!("expected users list"),
        }
    }

    #[test]
    fn test_rejects_bad_product_id() {
        assert!(Cli::try_parse_from(["mf-cli", "products", "get", "abc"]).is_err());
    }
}
