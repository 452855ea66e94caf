//! Coercion of arbitrary decoded JSON into a canonical [`Cart`].
//!
//! Persisted carts outlive the code that wrote them: a tab running an older
//! or newer build, a hand-edited storage entry, or a partial write can all
//! leave something unexpected under the cart key. Sanitizing is therefore
//! total. A document that is not a version-1 cart becomes the empty cart,
//! and inside a valid document each malformed line is dropped on its own so
//! one bad entry does not cost the customer the rest of the basket.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use tracing::debug;

use super::{Cart, CartLine, MAX_QTY, SCHEMA_VERSION, alt_or_name};
use crate::types::ProductId;

/// Validate and coerce a decoded value into a canonical cart.
///
/// Never fails. See the module docs for the policy.
#[must_use]
pub fn sanitize(value: &Value) -> Cart {
    let Some(obj) = value.as_object() else {
        return Cart::empty();
    };
    if !is_supported_version(obj.get("version")) {
        debug!(version = ?obj.get("version"), "Discarding cart with unsupported version");
        return Cart::empty();
    }
    let Some(raw_lines) = obj.get("lines").and_then(Value::as_array) else {
        return Cart::empty();
    };

    let updated_at = obj
        .get("updatedAt")
        .and_then(Value::as_str)
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map_or(DateTime::<Utc>::UNIX_EPOCH, |d| d.with_timezone(&Utc));

    let mut seen = HashSet::new();
    let mut lines = Vec::with_capacity(raw_lines.len());
    for (index, raw) in raw_lines.iter().enumerate() {
        let Some(line) = sanitize_line(raw) else {
            debug!(index, "Dropping malformed cart line");
            continue;
        };
        if !seen.insert(line.product_id.clone()) {
            debug!(index, product_id = %line.product_id, "Dropping duplicate cart line");
            continue;
        }
        lines.push(line);
    }

    Cart { updated_at, lines }
}

fn is_supported_version(version: Option<&Value>) -> bool {
    let Some(Value::Number(n)) = version else {
        return false;
    };
    if let Some(v) = n.as_u64() {
        return v == SCHEMA_VERSION;
    }
    // `1.0` is the same number to the JSON writers we share storage with.
    #[allow(clippy::cast_precision_loss)] // SCHEMA_VERSION is a small literal
    let expected = SCHEMA_VERSION as f64;
    n.as_f64().is_some_and(|v| (v - expected).abs() < f64::EPSILON)
}

fn sanitize_line(raw: &Value) -> Option<CartLine> {
    let obj = raw.as_object()?;
    let product_id = required_text(obj, "productId")?;
    let name = required_text(obj, "name")?;
    let price_label = required_text(obj, "priceLabel")?;
    let image_url = required_text(obj, "imageUrl")?;
    let image_alt = alt_or_name(obj.get("imageAlt").and_then(Value::as_str), name);

    Some(CartLine {
        product_id: ProductId::from(product_id),
        name: name.to_owned(),
        price_label: price_label.to_owned(),
        image_url: image_url.to_owned(),
        image_alt: image_alt.to_owned(),
        quantity: stored_quantity(obj.get("quantity")),
    })
}

fn required_text<'a>(obj: &'a Map<String, Value>, field: &str) -> Option<&'a str> {
    obj.get(field)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}

/// Quantity of a persisted line: 1 when missing or not a number, otherwise
/// floored and clamped into `1..=MAX_QTY`.
fn stored_quantity(raw: Option<&Value>) -> u32 {
    let Some(q) = raw.and_then(Value::as_f64) else {
        return 1;
    };
    // Clamped into 1..=MAX_QTY first, so the cast cannot truncate or lose sign.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let quantity = q.floor().clamp(1.0, f64::from(MAX_QTY)) as u32;
    quantity
}
