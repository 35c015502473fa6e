//! Checkout Config

use clap::Args;
use rust_decimal::Decimal;
use rusty_money::iso::Currency;

use super::{ConfigError, currency_for_code};

/// Checkout behaviour settings.
#[derive(Debug, Clone, Args)]
pub struct CheckoutConfig {
    /// ISO code of the currency all prices are quoted in
    #[arg(long = "currency", env = "BAZAAR_CURRENCY", default_value = "SAR")]
    pub currency_code: String,

    /// Loyalty points worth one major currency unit
    #[arg(long, env = "BAZAAR_POINTS_PER_UNIT", default_value = "10")]
    pub points_per_unit: Decimal,
}

impl CheckoutConfig {
    /// Resolve the configured currency.
    ///
    /// # Errors
    ///
    /// Returns an error if the code is not a supported currency.
    pub fn currency(&self) -> Result<&'static Currency, ConfigError> {
        currency_for_code(&self.currency_code)
    }

    /// The points conversion rate, validated.
    ///
    /// # Errors
    ///
    /// Returns an error if the rate is zero or negative.
    pub fn points_rate(&self) -> Result<Decimal, ConfigError> {
        if self.points_per_unit <= Decimal::ZERO {
            return Err(ConfigError::InvalidPointsRate(
                self.points_per_unit.to_string(),
            ));
        }

        Ok(self.points_per_unit)
    }
}
