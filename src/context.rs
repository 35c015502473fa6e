//! App Context

use std::sync::Arc;

use jiff::SignedDuration;
use rusty_money::iso::Currency;
use thiserror::Error;

use crate::{
    api::{ApiError, ChatApi, CouponValidator, HttpApi, OrdersApi, SlotProvider},
    chat::{ChatSession, models::Sender, realtime::RealtimeChannel},
    checkout::{Checkout, payment::PointsRate},
    config::{Config, ConfigError},
};

/// Errors raised while wiring the application together.
#[derive(Debug, Error)]
pub enum AppInitError {
    /// A configuration value is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The HTTP client could not be built.
    #[error("failed to build API client")]
    Api(#[source] ApiError),
}

/// Shared collaborators for checkout and chat.
#[derive(Clone)]
pub struct AppContext {
    /// Coupon validation
    pub coupons: Arc<dyn CouponValidator>,

    /// Time slot lookup
    pub slots: Arc<dyn SlotProvider>,

    /// Order placement
    pub orders: Arc<dyn OrdersApi>,

    /// Chat persistence
    pub chat: Arc<dyn ChatApi>,

    currency: &'static Currency,
    points_rate: PointsRate,
    echo_tolerance: SignedDuration,
    token: String,
}

impl std::fmt::Debug for AppContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppContext")
            .field("currency", &self.currency.iso_alpha_code)
            .field("points_rate", &self.points_rate)
            .field("echo_tolerance", &self.echo_tolerance)
            .finish_non_exhaustive()
    }
}

impl AppContext {
    /// Build the context from configuration, backed by the REST API.
    ///
    /// # Errors
    ///
    /// Returns an error when a configured value is invalid or the HTTP client
    /// cannot be built.
    pub fn from_config(config: &Config) -> Result<Self, AppInitError> {
        let api = Arc::new(HttpApi::new(&config.api).map_err(AppInitError::Api)?);

        Self::with_api(config, api)
    }

    /// Build the context around a single implementation of every REST trait.
    ///
    /// # Errors
    ///
    /// Returns an error when a configured value is invalid.
    pub fn with_api<A>(config: &Config, api: Arc<A>) -> Result<Self, AppInitError>
    where
        A: CouponValidator + SlotProvider + OrdersApi + ChatApi + 'static,
    {
        let currency = config.checkout.currency()?;
        let per_unit = config.checkout.points_rate()?;
        let points_rate = PointsRate::new(per_unit)
            .ok_or_else(|| ConfigError::InvalidPointsRate(per_unit.to_string()))?;

        Ok(Self {
            coupons: api.clone(),
            slots: api.clone(),
            orders: api.clone(),
            chat: api,
            currency,
            points_rate,
            echo_tolerance: config.chat.echo_tolerance(),
            token: config.api.token.clone().unwrap_or_default(),
        })
    }

    /// Currency prices are quoted in.
    pub fn currency(&self) -> &'static Currency {
        self.currency
    }

    /// Loyalty points conversion rate.
    pub fn points_rate(&self) -> PointsRate {
        self.points_rate
    }

    /// Start a new, empty checkout.
    pub fn checkout(&self) -> Checkout {
        Checkout::new(self.currency, self.points_rate)
    }

    /// Start a chat session for `me`, sending real-time messages through
    /// `realtime`.
    pub fn chat_session(&self, me: Sender, realtime: Arc<dyn RealtimeChannel>) -> ChatSession {
        ChatSession::new(
            me,
            self.token.clone(),
            Arc::clone(&self.chat),
            realtime,
            self.echo_tolerance,
        )
    }
}
