//! Basket commands.
//!
//! Every invocation behaves like one browser tab on the shared data
//! directory: it reads the current basket, applies at most one change, and
//! exits. `cart watch` stays open and reports changes made by other
//! invocations.
//!
//! # Usage
//!
//! ```bash
//! # Show the basket
//! arb-cli cart show
//!
//! # Add two jars of tea
//! arb-cli cart add --id tea-1 --name "Miško Uogos" --price "£12.00" \
//!     --image-url https://cdn.example.com/tea-1.jpg --quantity 2
//!
//! # Change or remove a line
//! arb-cli cart set-qty tea-1 5
//! arb-cli cart remove tea-1
//!
//! # Follow changes made from other shells
//! arb-cli cart watch
//! ```

use std::sync::Arc;

use arbatai_cart::{
    FileStorage, KeyValueStorage, PollingEventSource, SharedCart, StorageEventSource,
};
use arbatai_core::cart::{badge_text, basket_label};
use arbatai_core::{Cart, ProductSummary};
use tracing::{info, warn};

use crate::config::CliConfig;

/// Product fields for `cart add`.
#[derive(Debug, Clone)]
pub struct AddArgs {
    pub id: String,
    pub name: String,
    pub price: String,
    pub image_url: String,
    pub image_alt: Option<String>,
    pub quantity: i64,
}

impl From<AddArgs> for ProductSummary {
    fn from(args: AddArgs) -> Self {
        let product = Self::new(args.id, args.name, args.price, args.image_url);
        match args.image_alt {
            Some(alt) => product.with_image_alt(alt),
            None => product,
        }
    }
}

/// Open the basket stored in the configured data directory.
#[must_use]
pub fn open(config: &CliConfig) -> SharedCart {
    SharedCart::builder(Arc::new(FileStorage::new(&config.data_dir)))
        .storage_key(config.storage_key.clone())
        .build()
}

/// Log the basket contents and estimated totals.
pub fn show(config: &CliConfig) {
    let cart = open(config);
    log_cart(&cart.snapshot());
}

pub fn add(config: &CliConfig, args: AddArgs) {
    let cart = open(config);
    let quantity = args.quantity;
    let product = ProductSummary::from(args);
    if quantity <= 0 {
        warn!(quantity, "Quantity must be positive, basket unchanged");
    }
    cart.add(&product, quantity);
    report(&cart);
}

pub fn remove(config: &CliConfig, product_id: &str) {
    let cart = open(config);
    if cart.snapshot().line(product_id).is_none() {
        info!(product_id, "Product is not in the basket");
    }
    cart.remove(product_id);
    report(&cart);
}

pub fn set_quantity(config: &CliConfig, product_id: &str, quantity: i64) {
    let cart = open(config);
    if cart.snapshot().line(product_id).is_none() {
        warn!(
            product_id,
            "Product is not in the basket; use `cart add` to add it"
        );
    }
    cart.set_quantity(product_id, quantity);
    report(&cart);
}

pub fn clear(config: &CliConfig) {
    let cart = open(config);
    cart.clear();
    report(&cart);
}

/// Follow the basket until interrupted, logging it on every external change.
///
/// # Errors
///
/// Returns an error if the Ctrl-C handler cannot be installed.
pub async fn watch(config: &CliConfig) -> Result<(), Box<dyn std::error::Error>> {
    let storage: Arc<dyn KeyValueStorage> = Arc::new(FileStorage::new(&config.data_dir));
    let source = Arc::new(PollingEventSource::new(
        Arc::clone(&storage),
        config.storage_key.clone(),
    ));
    let events: Arc<dyn StorageEventSource> = source.clone();
    let cart = SharedCart::builder(storage)
        .storage_key(config.storage_key.clone())
        .events(events)
        .build();

    let reader = cart.clone();
    let _subscription = cart.subscribe(move || log_cart(&reader.snapshot()));

    info!(
        dir = %config.data_dir.display(),
        interval = ?config.watch_interval,
        "Watching basket (Ctrl-C to stop)"
    );
    log_cart(&cart.snapshot());

    let mut ticker = tokio::time::interval(config.watch_interval);
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                source.poll();
            }
            result = &mut shutdown => {
                result?;
                info!("Stopped watching");
                return Ok(());
            }
        }
    }
}

fn report(cart: &SharedCart) {
    if !cart.is_persistence_available() {
        warn!("Basket could not be saved; this change is not shared");
    }
    log_cart(&cart.snapshot());
}

fn log_cart(cart: &Cart) {
    let total = cart.total_quantity();
    let label = basket_label(total);
    match badge_text(total) {
        Some(badge) => info!(badge = %badge, "{label}"),
        None => info!("{label}"),
    }

    if cart.is_empty() {
        info!("Your basket is empty.");
        return;
    }

    for line in cart.lines() {
        let unit = if line.quantity() == 1 { "item" } else { "items" };
        info!(
            product_id = %line.product_id(),
            "  {} · {} · {} {unit}",
            line.name(),
            line.price_label(),
            line.quantity()
        );
    }

    let totals = cart.totals();
    info!(
        "{}: {} ({} distinct)",
        totals.subtotal_heading(),
        totals.subtotal_label(),
        cart.unique_line_count()
    );
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn config(dir: &std::path::Path) -> CliConfig {
        CliConfig {
            data_dir: dir.to_path_buf(),
            storage_key: "test_cart".to_string(),
            watch_interval: Duration::from_millis(10),
        }
    }

    fn add_args(id: &str, quantity: i64) -> AddArgs {
        AddArgs {
            id: id.to_string(),
            name: "Miško Uogos".to_string(),
            price: "£12.00".to_string(),
            image_url: "https://x/y.jpg".to_string(),
            image_alt: None,
            quantity,
        }
    }

    #[test]
    fn test_invocations_share_the_basket() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path());

        add(&config, add_args("tea-1", 2));
        add(&config, add_args("tea-1", 1));
        add(&config, add_args("honey", 1));
        set_quantity(&config, "honey", 4);

        let cart = open(&config).snapshot();
        assert_eq!(cart.line("tea-1").unwrap().quantity(), 3);
        assert_eq!(cart.line("honey").unwrap().quantity(), 4);
        assert!(dir.path().join("test_cart.json").exists());

        remove(&config, "tea-1");
        clear(&config);
        assert!(open(&config).snapshot().is_empty());
    }

    #[test]
    fn test_add_args_image_alt() {
        let mut args = add_args("tea-1", 1);
        args.image_alt = Some("A tin".to_string());
        let product = ProductSummary::from(args);
        assert_eq!(product.display_alt(), "A tin");
    }
}
