//! Order submission payloads.

use jiff::civil::{Date, Time};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{
    catalog::{CategoryId, SubItemId, VendorId},
    checkout::{
        payment::{PaymentType, RemainderMethod},
        schedule::OrderType,
    },
};

/// A line of an order request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderLine {
    /// Sub-item ordered
    pub sub_item_id: SubItemId,

    /// Quantity
    pub quantity: u32,
}

/// Body of `POST /customer/orders`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderRequest {
    /// Service category
    pub category_id: CategoryId,

    /// Vendor performing the service
    pub vendor_id: VendorId,

    /// Ordered sub-items
    pub items: Vec<OrderLine>,

    /// Immediate or scheduled
    pub order_type: OrderType,

    /// Service date, for scheduled orders
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheduled_date: Option<Date>,

    /// Start time, for scheduled orders
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheduled_time: Option<Time>,

    /// Service address
    pub address: String,

    /// Contact name
    pub contact_name: String,

    /// Contact phone
    pub contact_phone: String,

    /// Notes for the technician
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    /// Payment method
    pub payment_type: PaymentType,

    /// Method for the remainder when paying with points
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining_payment_type: Option<RemainderMethod>,

    /// Applied coupon code
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coupon_code: Option<String>,

    /// Points redeemed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub points_used: Option<u64>,

    /// Total the customer was shown, in major units
    #[serde(with = "rust_decimal::serde::float")]
    pub total: Decimal,
}

/// The server's acknowledgement of a placed order.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PlacedOrder {
    /// Order identifier
    pub id: u64,

    /// Initial order status
    #[serde(default)]
    pub status: String,
}
