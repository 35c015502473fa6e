//! Fixtures
//!
//! Quote fixtures describe a priced selection in YAML, for the `quote` command
//! and for tests:
//!
//! ```yaml
//! currency: SAR
//! vat:
//!   vendor:
//!     enabled: true
//!     rate: "5"
//!     registration_number: "300000000000003"
//! items:
//!   - id: 1
//!     name: Deep cleaning
//!     price: "100.00"
//!     duration: 60
//!     quantity: 2
//! coupon:
//!   code: SAVE50
//!   discount: 50
//! ```

use std::{fs, num::NonZeroU32, path::Path};

use rusty_money::iso::Currency;
use serde::Deserialize;
use thiserror::Error;

use crate::{
    amounts::{MinorUnits, Minutes},
    catalog::{LineItems, SubItem, SubItemId},
    config::{ConfigError, currency_for_code},
    pricing::{AppliedCoupon, PricingInput, PricingResult, VatSource, calculate},
    summary::Summary,
};

/// Fixture parsing errors
#[derive(Debug, Error)]
pub enum FixtureError {
    /// IO error reading the fixture file
    #[error("Failed to read fixture file: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_norway::Error),

    /// Unknown or unsupported currency
    #[error(transparent)]
    Currency(#[from] ConfigError),
}

fn default_currency() -> String {
    "SAR".to_string()
}

fn one() -> NonZeroU32 {
    NonZeroU32::MIN
}

/// A selected sub-item in a quote fixture.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct QuoteItem {
    /// Sub-item identifier
    pub id: SubItemId,

    /// Display name
    #[serde(default)]
    pub name: String,

    /// Unit price in major units
    #[serde(default)]
    pub price: MinorUnits,

    /// Minutes per unit
    #[serde(default)]
    pub duration: Minutes,

    /// Quantity, at least one
    #[serde(default = "one")]
    pub quantity: NonZeroU32,
}

/// A coupon that is assumed to have been validated already.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct QuoteCoupon {
    /// Code
    pub code: String,

    /// Discount in major units
    #[serde(default)]
    pub discount: MinorUnits,
}

/// A priced selection loaded from YAML.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct QuoteFixture {
    /// ISO currency code
    #[serde(default = "default_currency")]
    pub currency: String,

    /// VAT sources
    #[serde(default)]
    pub vat: VatSource,

    /// Selected items
    #[serde(default)]
    pub items: Vec<QuoteItem>,

    /// Applied coupon
    #[serde(default)]
    pub coupon: Option<QuoteCoupon>,

    /// Points redeemed
    #[serde(default)]
    pub points: u64,

    /// Discount bought with those points, in major units
    #[serde(default)]
    pub points_discount: MinorUnits,
}

impl QuoteFixture {
    /// Load a fixture from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, FixtureError> {
        let contents = fs::read_to_string(path)?;

        Self::from_yaml(&contents)
    }

    /// Parse a fixture from YAML text.
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML is invalid or an amount is malformed.
    pub fn from_yaml(yaml: &str) -> Result<Self, FixtureError> {
        Ok(serde_norway::from_str(yaml)?)
    }

    /// Resolve the fixture currency.
    ///
    /// # Errors
    ///
    /// Returns an error if the currency is not supported.
    pub fn currency(&self) -> Result<&'static Currency, FixtureError> {
        Ok(currency_for_code(&self.currency)?)
    }

    /// The fixture items as line items.
    pub fn line_items(&self) -> LineItems {
        let mut items = LineItems::new();

        for item in &self.items {
            items.add(
                SubItem {
                    id: item.id,
                    name: item.name.clone(),
                    price: item.price,
                    duration: item.duration,
                },
                item.quantity,
            );
        }

        items
    }

    /// The fixture coupon, as applied.
    pub fn applied_coupon(&self) -> Option<AppliedCoupon> {
        self.coupon.as_ref().map(|coupon| AppliedCoupon {
            code: coupon.code.clone(),
            discount: coupon.discount,
        })
    }

    /// Price the fixture.
    ///
    /// # Errors
    ///
    /// Returns an error if the currency is not supported.
    pub fn quote(&self) -> Result<PricingResult, FixtureError> {
        let items = self.line_items();
        let coupon = self.applied_coupon();

        Ok(calculate(&PricingInput {
            items: items.as_slice(),
            vat: &self.vat,
            coupon: coupon.as_ref(),
            points_discount: self.points_discount,
            currency: self.currency()?,
        }))
    }

    /// A printable summary of the priced fixture.
    ///
    /// # Errors
    ///
    /// Returns an error if the currency is not supported.
    pub fn summary(&self) -> Result<Summary, FixtureError> {
        let currency = self.currency()?;
        let pricing = self.quote()?;

        Ok(Summary::from_quote(
            &self.line_items(),
            pricing,
            self.coupon.as_ref().map(|coupon| coupon.code.clone()),
            self.points,
            currency,
        ))
    }
}
