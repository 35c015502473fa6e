//! Client configuration
//!
//! Settings are read from command-line flags with environment fallbacks. A
//! `.env` file in the working directory is loaded first when present.

use clap::Args;
use rusty_money::iso::{self, Currency};
use thiserror::Error;

pub use api::ApiConfig;
pub use chat::ChatConfig;
pub use checkout::CheckoutConfig;
pub use logging::{LogFormat, LoggingConfig};

mod api;
mod chat;
mod checkout;
mod logging;

/// Errors raised while interpreting configuration values.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    /// The configured currency code is not one the marketplace trades in.
    #[error("unsupported currency code: {0}")]
    UnsupportedCurrency(String),

    /// Points-to-currency conversion rate must be positive.
    #[error("points per currency unit must be positive, got {0}")]
    InvalidPointsRate(String),
}

/// Bazaar client configuration.
#[derive(Debug, Clone, Args)]
pub struct Config {
    /// REST API settings.
    #[command(flatten)]
    pub api: ApiConfig,

    /// Checkout behaviour settings.
    #[command(flatten)]
    pub checkout: CheckoutConfig,

    /// Chat behaviour settings.
    #[command(flatten)]
    pub chat: ChatConfig,

    /// Logging output settings.
    #[command(flatten)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load a `.env` file if present. Call before parsing.
    pub fn load_env() {
        // Missing .env is fine.
        _ = dotenvy::dotenv();
    }
}

/// Resolve a supported currency by its ISO alpha code.
///
/// Only two-decimal currencies are supported; amounts are held in hundredths.
///
/// # Errors
///
/// Returns [`ConfigError::UnsupportedCurrency`] for any other code.
pub fn currency_for_code(code: &str) -> Result<&'static Currency, ConfigError> {
    match code.trim().to_ascii_uppercase().as_str() {
        "SAR" => Ok(iso::SAR),
        "AED" => Ok(iso::AED),
        "QAR" => Ok(iso::QAR),
        "EGP" => Ok(iso::EGP),
        "USD" => Ok(iso::USD),
        "EUR" => Ok(iso::EUR),
        "GBP" => Ok(iso::GBP),
        _ => Err(ConfigError::UnsupportedCurrency(code.to_string())),
    }
}
