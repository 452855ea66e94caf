//! Arbatai CLI - Local basket management tools.
//!
//! # Usage
//!
//! ```bash
//! # Show the basket
//! arb-cli cart show
//!
//! # Add a product
//! arb-cli cart add --id tea-1 --name "Miško Uogos" --price "£12.00" \
//!     --image-url https://cdn.example.com/tea-1.jpg
//!
//! # Follow changes made from other shells
//! arb-cli cart watch
//!
//! # Validate checkout details
//! arb-cli checkout -e ona@example.lt -n "Ona Petraitė" \
//!     -a "Gedimino pr. 1" -c Vilnius -p LT-01103
//! ```
//!
//! # Commands
//!
//! - `cart` - Inspect and change the shared basket
//! - `checkout` - Validate checkout details against the basket

#![cfg_attr(not(test), forbid(unsafe_code))]

use arbatai_core::checkout::CheckoutForm;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::commands::cart::AddArgs;
use crate::config::CliConfig;

mod commands;
mod config;

#[derive(Parser)]
#[command(name = "arb-cli")]
#[command(author, version, about = "Arbatai CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Inspect and change the shared basket
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Validate checkout details for the current basket
    Checkout {
        /// Contact email address
        #[arg(short, long)]
        email: String,

        /// Full name
        #[arg(short, long)]
        name: String,

        /// Street address
        #[arg(short, long)]
        address: String,

        /// City
        #[arg(short, long)]
        city: String,

        /// Postcode
        #[arg(short, long)]
        postcode: String,
    },
}

#[derive(Subcommand)]
enum CartAction {
    /// Show the basket and its estimated subtotal
    Show,
    /// Add a product, merging with an existing line
    Add {
        /// Product ID
        #[arg(long)]
        id: String,

        /// Product name
        #[arg(long)]
        name: String,

        /// Price label, e.g. "£12.00"
        #[arg(long)]
        price: String,

        /// Image URL
        #[arg(long)]
        image_url: String,

        /// Image alt text (defaults to the name)
        #[arg(long)]
        image_alt: Option<String>,

        /// Quantity to add
        #[arg(short, long, default_value_t = 1, allow_negative_numbers = true)]
        quantity: i64,
    },
    /// Remove a product
    Remove {
        /// Product ID
        id: String,
    },
    /// Set the quantity of a product already in the basket
    SetQty {
        /// Product ID
        id: String,

        /// New quantity (0 or less removes the line)
        #[arg(allow_negative_numbers = true)]
        quantity: i64,
    },
    /// Empty the basket
    Clear,
    /// Follow the basket and log every change
    Watch,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "arbatai_cli=info,arbatai_cart=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = CliConfig::from_env()?;

    match cli.command {
        Commands::Cart { action } => match action {
            CartAction::Show => commands::cart::show(&config),
            CartAction::Add {
                id,
                name,
                price,
                image_url,
                image_alt,
                quantity,
            } => commands::cart::add(
                &config,
                AddArgs {
                    id,
                    name,
                    price,
                    image_url,
                    image_alt,
                    quantity,
                },
            ),
            CartAction::Remove { id } => commands::cart::remove(&config, &id),
            CartAction::SetQty { id, quantity } => {
                commands::cart::set_quantity(&config, &id, quantity);
            }
            CartAction::Clear => commands::cart::clear(&config),
            CartAction::Watch => commands::cart::watch(&config).await?,
        },
        Commands::Checkout {
            email,
            name,
            address,
            city,
            postcode,
        } => {
            let form = CheckoutForm {
                email,
                full_name: name,
                address1: address,
                city,
                postcode,
            };
            commands::checkout::run(&config, &form)?;
        }
    }
    Ok(())
}
