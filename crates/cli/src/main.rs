//! Bistro CLI - Drive the ordering client from a terminal.
//!
//! # Usage
//!
//! ```bash
//! # Log in (password from --password or BISTRO_PASSWORD)
//! bistro login -e ada@bistro.example
//!
//! # Register a customer account
//! bistro register -n "Ada" -e ada@bistro.example
//!
//! # Work with the cart
//! bistro cart add m1 --name "Burger" --price 12.99
//! bistro cart set-qty m1 3
//! bistro cart show
//!
//! # Kitchen dashboard
//! bistro orders list
//! bistro orders advance 31 preparing
//! ```
//!
//! # Commands
//!
//! - `login`, `register`, `logout`, `whoami` - Session
//! - `cart` - Cart of the logged-in user
//! - `favorites` - Favorites of the logged-in user
//! - `orders` - List, advance and cancel orders

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use secrecy::SecretString;

use bistro_client::{ClientConfig, ClientError, ClientState};
use bistro_core::{MenuItem, OrderId, OrderStatus, Price, Role};

mod commands;
mod telemetry;

#[derive(Parser)]
#[command(name = "bistro")]
#[command(author, version, about = "Bistro ordering client")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in with email and password
    Login {
        /// Account email address
        #[arg(short, long)]
        email: String,

        /// Account password
        #[arg(long, env = "BISTRO_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Create an account and log in
    Register {
        /// Display name
        #[arg(short, long)]
        name: String,

        /// Account email address
        #[arg(short, long)]
        email: String,

        /// Account password
        #[arg(long, env = "BISTRO_PASSWORD", hide_env_values = true)]
        password: String,

        /// Requested role (`customer`, `staff`, `admin`); the server decides
        #[arg(short, long, default_value = "customer")]
        role: Role,
    },
    /// Log out and forget the stored session
    Logout,
    /// Show who is logged in
    Whoami,
    /// Manage the cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Manage favorites
    Favorites {
        #[command(subcommand)]
        action: FavoritesAction,
    },
    /// List and transition orders
    Orders {
        #[command(subcommand)]
        action: OrdersAction,
    },
}

/// A menu item given on the command line.
#[derive(Args)]
struct ItemArgs {
    /// Menu item ID
    item_id: String,

    /// Display name
    #[arg(long)]
    name: String,

    /// Unit price, e.g. 12.99
    #[arg(long)]
    price: Price,

    /// Image URL or asset path
    #[arg(long, default_value = "")]
    image: String,

    /// Item is a bundle
    #[arg(long)]
    bundle: bool,
}

impl From<ItemArgs> for MenuItem {
    fn from(args: ItemArgs) -> Self {
        Self {
            item_id: args.item_id.into(),
            name: args.name,
            unit_price: args.price,
            image_ref: args.image,
            is_bundle: args.bundle,
        }
    }
}

#[derive(Subcommand)]
enum CartAction {
    /// Show cart lines and totals
    Show,
    /// Add one unit of an item
    Add(ItemArgs),
    /// Remove an item
    Remove {
        /// Menu item ID
        item_id: String,
    },
    /// Set the quantity of an item (0 removes it)
    SetQty {
        /// Menu item ID
        item_id: String,
        /// New quantity
        quantity: u32,
    },
    /// Empty the cart
    Clear,
}

#[derive(Subcommand)]
enum FavoritesAction {
    /// Show favorites
    Show,
    /// Add an item
    Add(ItemArgs),
    /// Remove an item
    Remove {
        /// Menu item ID
        item_id: String,
    },
    /// Add the item if absent, remove it if present
    Toggle(ItemArgs),
    /// Remove every favorite
    Clear,
}

#[derive(Subcommand)]
enum OrdersAction {
    /// List visible orders
    List,
    /// Move an order to a new status (staff and admin)
    Advance {
        /// Order ID
        id: OrderId,
        /// Target status, e.g. `confirmed`
        status: OrderStatus,
    },
    /// Cancel an order
    Cancel {
        /// Order ID
        id: OrderId,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    // Loads .env, so it must run before clap reads BISTRO_PASSWORD
    let config = ClientConfig::from_env();
    let cli = Cli::parse();

    let _sentry_guard = telemetry::init(config.as_ref().ok());

    let result = match config {
        Ok(config) => run(cli, &config).await,
        Err(e) => Err(ClientError::from(e)),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            telemetry::report(&err);
            commands::print_error(&err);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli, config: &ClientConfig) -> Result<(), ClientError> {
    let mut state = ClientState::from_config(config)?;
    if let Some(identity) = state.start().await? {
        telemetry::set_sentry_user(&identity);
    }

    match cli.command {
        Commands::Login { email, password } => {
            commands::session::login(&mut state, &email, &SecretString::from(password)).await?;
        }
        Commands::Register {
            name,
            email,
            password,
            role,
        } => {
            let secret = SecretString::from(password);
            commands::session::register(&mut state, &name, &email, &secret, role).await?;
        }
        Commands::Logout => commands::session::logout(&mut state),
        Commands::Whoami => commands::session::whoami(&state),
        Commands::Cart { action } => match action {
            CartAction::Show => commands::cart::show(&state),
            CartAction::Add(item) => commands::cart::add(&mut state, item.into())?,
            CartAction::Remove { item_id } => commands::cart::remove(&mut state, &item_id.into())?,
            CartAction::SetQty { item_id, quantity } => {
                commands::cart::set_quantity(&mut state, &item_id.into(), quantity)?;
            }
            CartAction::Clear => commands::cart::clear(&mut state)?,
        },
        Commands::Favorites { action } => match action {
            FavoritesAction::Show => commands::favorites::show(&state),
            FavoritesAction::Add(item) => commands::favorites::add(&mut state, item.into())?,
            FavoritesAction::Remove { item_id } => {
                commands::favorites::remove(&mut state, &item_id.into())?;
            }
            FavoritesAction::Toggle(item) => commands::favorites::toggle(&mut state, item.into())?,
            FavoritesAction::Clear => commands::favorites::clear(&mut state)?,
        },
        Commands::Orders { action } => match action {
            OrdersAction::List => commands::orders::list(&state).await?,
            OrdersAction::Advance { id, status } => {
                commands::orders::transition(&state, id, status).await?;
            }
            OrdersAction::Cancel { id } => {
                commands::orders::transition(&state, id, OrderStatus::Cancelled).await?;
            }
        },
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_cart_add() {
        let cli = Cli::try_parse_from([
            "bistro", "cart", "add", "m1", "--name", "Burger", "--price", "12.99",
        ])
        .unwrap_or_else(|e| panic!("{e}"));
        let Commands::Cart {
            action: CartAction::Add(item),
        } = cli.command
        else {
            panic!("expected cart add");
        };
        let item = MenuItem::from(item);
        assert_eq!(item.unit_price, Price::from_cents(1299));
        assert!(!item.is_bundle);
    }

    #[test]
    fn test_parse_orders_advance() {
        let cli = Cli::try_parse_from(["bistro", "orders", "advance", "31", "preparing"])
            .unwrap_or_else(|e| panic!("{e}"));
        assert!(matches!(
            cli.command,
            Commands::Orders {
                action: OrdersAction::Advance {
                    status: OrderStatus::Preparing,
                    ..
                }
            }
        ));
    }
}
