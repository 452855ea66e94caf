//! Customer details captured on the checkout page.
//!
//! Only validation lives here. Details are not submitted or stored
//! anywhere; there is no order pipeline behind the checkout form yet.

use core::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when validating checkout details.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CheckoutError {
    /// A required field was empty or whitespace.
    #[error("{0} is required")]
    MissingField(&'static str),
    /// The email address is not plausibly deliverable.
    #[error("invalid email address: {0}")]
    InvalidEmail(String),
}

/// A contact email address.
///
/// Validation is structural only: one `@`, non-empty local part, and a
/// domain containing a dot that neither starts nor ends the domain.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ContactEmail(String);

impl ContactEmail {
    /// Maximum length of an email address (RFC 5321).
    pub const MAX_LENGTH: usize = 254;

    /// Parse and normalise (trim) an email address.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::MissingField` for blank input and
    /// `CheckoutError::InvalidEmail` for anything structurally wrong.
    pub fn parse(input: &str) -> Result<Self, CheckoutError> {
        let s = input.trim();
        if s.is_empty() {
            return Err(CheckoutError::MissingField("email"));
        }
        let invalid = || CheckoutError::InvalidEmail(s.to_owned());

        if s.len() > Self::MAX_LENGTH || s.chars().any(char::is_whitespace) {
            return Err(invalid());
        }
        let (local, domain) = s.split_once('@').ok_or_else(invalid)?;
        if local.is_empty() || domain.contains('@') {
            return Err(invalid());
        }
        if !domain.contains('.') || domain.starts_with('.') || domain.ends_with('.') {
            return Err(invalid());
        }

        Ok(Self(s.to_owned()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContactEmail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for ContactEmail {
    type Error = CheckoutError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ContactEmail> for String {
    fn from(email: ContactEmail) -> Self {
        email.0
    }
}

/// Raw form input, as typed.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutForm {
    pub email: String,
    pub full_name: String,
    pub address1: String,
    pub city: String,
    pub postcode: String,
}

/// Validated checkout details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutDetails {
    pub email: ContactEmail,
    pub full_name: String,
    pub address1: String,
    pub city: String,
    pub postcode: String,
}

impl TryFrom<&CheckoutForm> for CheckoutDetails {
    type Error = CheckoutError;

    fn try_from(form: &CheckoutForm) -> Result<Self, Self::Error> {
        Ok(Self {
            email: ContactEmail::parse(&form.email)?,
            full_name: required(&form.full_name, "full name")?,
            address1: required(&form.address1, "address")?,
            city: required(&form.city, "city")?,
            postcode: required(&form.postcode, "postcode")?,
        })
    }
}

fn required(value: &str, field: &'static str) -> Result<String, CheckoutError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(CheckoutError::MissingField(field))
    } else {
        Ok(trimmed.to_owned())
    }
}
