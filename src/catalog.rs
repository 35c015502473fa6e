//! Catalog
//!
//! Sub-items are the purchasable units a vendor offers under a service. A
//! customer's selection of them during checkout is held as [`LineItems`].

use std::{fmt, num::NonZeroU32};

use jiff::SignedDuration;
use rusty_money::{Money, iso::Currency};
use serde::{Deserialize, Serialize};

use crate::amounts::{MinorUnits, Minutes};

/// Service category identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryId(pub u64);

/// Vendor identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VendorId(pub u64);

impl fmt::Display for VendorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Catalog sub-item identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubItemId(pub u64);

/// A purchasable catalog sub-item.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SubItem {
    /// Identifier
    pub id: SubItemId,

    /// Display name
    #[serde(default)]
    pub name: String,

    /// Unit price
    #[serde(default)]
    pub price: MinorUnits,

    /// Time needed to perform one unit
    #[serde(default)]
    pub duration: Minutes,
}

/// A selected sub-item and its quantity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineItem {
    sub_item: SubItem,
    quantity: NonZeroU32,
}

impl LineItem {
    /// Creates a new line item.
    pub fn new(sub_item: SubItem, quantity: NonZeroU32) -> Self {
        Self { sub_item, quantity }
    }

    /// The referenced sub-item.
    pub fn sub_item(&self) -> &SubItem {
        &self.sub_item
    }

    /// Selected quantity.
    pub fn quantity(&self) -> NonZeroU32 {
        self.quantity
    }

    /// Unit price in the given currency.
    pub fn unit_price(&self, currency: &'static Currency) -> Money<'static, Currency> {
        Money::from_minor(self.sub_item.price.get(), currency)
    }

    /// Unit price multiplied by quantity, in minor units.
    pub fn line_total_minor(&self) -> i64 {
        self.sub_item
            .price
            .get()
            .saturating_mul(i64::from(self.quantity.get()))
    }

    /// Duration multiplied by quantity.
    pub fn line_duration(&self) -> SignedDuration {
        let minutes = i64::from(self.sub_item.duration.get())
            .saturating_mul(i64::from(self.quantity.get()));

        SignedDuration::from_mins(minutes)
    }
}

/// The set of line items selected during one checkout session.
///
/// At most one line item exists per sub-item; adding the same sub-item again
/// increases its quantity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineItems {
    items: Vec<LineItem>,
}

impl LineItems {
    /// Creates an empty selection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `quantity` units of `sub_item`, merging with an existing line.
    pub fn add(&mut self, sub_item: SubItem, quantity: NonZeroU32) {
        if let Some(existing) = self
            .items
            .iter_mut()
            .find(|item| item.sub_item.id == sub_item.id)
        {
            existing.quantity = existing.quantity.saturating_add(quantity.get());
            return;
        }

        self.items.push(LineItem::new(sub_item, quantity));
    }

    /// Removes the line for `id`, returning it if present.
    pub fn remove(&mut self, id: SubItemId) -> Option<LineItem> {
        let position = self.items.iter().position(|item| item.sub_item.id == id)?;

        Some(self.items.remove(position))
    }

    /// Sets the quantity for `id`. A quantity of zero removes the line.
    ///
    /// Returns `false` if no line exists for `id`.
    pub fn set_quantity(&mut self, id: SubItemId, quantity: u32) -> bool {
        let Some(quantity) = NonZeroU32::new(quantity) else {
            return self.remove(id).is_some();
        };

        match self.items.iter_mut().find(|item| item.sub_item.id == id) {
            Some(item) => {
                item.quantity = quantity;
                true
            }
            None => false,
        }
    }

    /// Drops every line.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Selected lines in insertion order.
    pub fn as_slice(&self) -> &[LineItem] {
        &self.items
    }

    /// Iterate over selected lines.
    pub fn iter(&self) -> impl Iterator<Item = &LineItem> {
        self.items.iter()
    }

    /// Number of distinct lines.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// True when nothing has been selected.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
