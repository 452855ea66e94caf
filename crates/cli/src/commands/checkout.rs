//! Checkout command.
//!
//! Validates the customer's details against the current basket. Orders are
//! not submitted anywhere; a successful run only confirms the details and
//! the estimated total.
//!
//! # Usage
//!
//! ```bash
//! arb-cli checkout --email ona@example.lt --name "Ona Petraitė" \
//!     --address "Gedimino pr. 1" --city Vilnius --postcode LT-01103
//! ```

use arbatai_core::checkout::{CheckoutDetails, CheckoutForm};
use tracing::{info, warn};

use crate::commands::cart::open;
use crate::config::CliConfig;

/// Validate checkout details for the current basket.
///
/// # Errors
///
/// Returns an error if any detail is missing or invalid.
pub fn run(config: &CliConfig, form: &CheckoutForm) -> Result<(), Box<dyn std::error::Error>> {
    let cart = open(config).snapshot();
    if cart.is_empty() {
        info!("Your basket is empty.");
        return Ok(());
    }

    let details = CheckoutDetails::try_from(form)?;
    let totals = cart.totals();

    info!(
        email = %details.email,
        name = %details.full_name,
        "Delivering to {}, {} {}",
        details.address1,
        details.city,
        details.postcode
    );
    info!(
        items = totals.item_count,
        "{}: {}",
        totals.subtotal_heading(),
        totals.subtotal_label()
    );
    warn!("Order submission is not available yet; details were validated only");

    Ok(())
}
