//! REST collaborators.
//!
//! Each concern the core needs from the backend is a small trait so that the
//! checkout flow and chat session can be driven by the HTTP client in
//! production and by mocks in tests.

use async_trait::async_trait;
use jiff::civil::{Date, Time};
use mockall::automock;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{
    amounts::{MinorUnits, Minutes},
    catalog::VendorId,
    chat::models::{Conversation, ConversationId, ServerMessage},
    checkout::order::{OrderRequest, PlacedOrder},
};

mod client;
mod envelope;
mod errors;

pub use client::HttpApi;
pub use errors::ApiError;

/// Body of a coupon validation request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CouponRequest {
    /// Code as entered by the customer
    pub code: String,

    /// Subtotal the coupon is validated against, in major units
    #[serde(with = "rust_decimal::serde::float")]
    pub subtotal: Decimal,
}

/// A successfully validated coupon.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CouponValidation {
    /// Canonical code
    pub code: String,

    /// Absolute discount granted
    #[serde(default)]
    pub discount: MinorUnits,
}

/// Parameters of an available time-slot lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotQuery {
    /// Vendor performing the service
    pub vendor: VendorId,

    /// Requested service date
    pub date: Date,

    /// Total service duration
    pub service_duration: Minutes,
}

/// A technician that can take a slot.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SlotTechnician {
    /// Technician identifier
    pub id: u64,

    /// Display name
    #[serde(default)]
    pub name: String,
}

/// A bookable start time.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TimeSlot {
    /// Start time label as sent by the server, e.g. `"09:30"`
    pub time: String,

    /// Number of technicians free at this time
    #[serde(default)]
    pub available_count: u32,

    /// Technicians free at this time
    #[serde(default)]
    pub available_technicians: Vec<SlotTechnician>,
}

impl TimeSlot {
    /// True when at least one technician can take the slot.
    pub fn is_available(&self) -> bool {
        self.available_count > 0
    }

    /// The start time, if the label parses as `HH:MM` or `HH:MM:SS`.
    pub fn start(&self) -> Option<Time> {
        self.time.trim().parse().ok()
    }
}

/// Validates coupon codes against a subtotal.
#[automock]
#[async_trait]
pub trait CouponValidator: Send + Sync {
    /// `POST /customer/orders/validate-coupon`
    async fn validate_coupon(&self, request: &CouponRequest)
    -> Result<CouponValidation, ApiError>;
}

/// Looks up bookable time slots.
#[automock]
#[async_trait]
pub trait SlotProvider: Send + Sync {
    /// `GET /customer/vendors/{id}/available-time-slots`
    async fn available_slots(&self, query: &SlotQuery) -> Result<Vec<TimeSlot>, ApiError>;
}

/// Places customer orders.
#[automock]
#[async_trait]
pub trait OrdersApi: Send + Sync {
    /// `POST /customer/orders`
    async fn place_order(&self, order: &OrderRequest) -> Result<PlacedOrder, ApiError>;
}

/// Durable chat persistence.
#[automock]
#[async_trait]
pub trait ChatApi: Send + Sync {
    /// `GET /chat/conversations`
    async fn conversations(&self) -> Result<Vec<Conversation>, ApiError>;

    /// `GET /chat/conversations/{id}`
    async fn conversation(&self, id: ConversationId) -> Result<Conversation, ApiError>;

    /// `POST /chat/conversations/{id}/messages`
    async fn send_message(
        &self,
        id: ConversationId,
        message: &str,
    ) -> Result<ServerMessage, ApiError>;

    /// `POST /chat/conversations/{id}/mark-read`
    async fn mark_read(&self, id: ConversationId) -> Result<(), ApiError>;

    /// `GET /chat/unread-count`
    async fn unread_count(&self) -> Result<u32, ApiError>;
}
