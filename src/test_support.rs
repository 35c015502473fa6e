//! Shared builders for unit tests.

use std::num::NonZeroU32;

use rust_decimal::Decimal;

use crate::{
    amounts::{MinorUnits, Minutes},
    catalog::{LineItem, SubItem, SubItemId},
    pricing::VatSettings,
};

pub(crate) fn qty(value: u32) -> NonZeroU32 {
    NonZeroU32::new(value).unwrap_or(NonZeroU32::MIN)
}

pub(crate) fn sub_item(id: u64, price_minor: i64, minutes: u32) -> SubItem {
    SubItem {
        id: SubItemId(id),
        name: format!("Sub-item {id}"),
        price: MinorUnits::new(price_minor),
        duration: Minutes::new(minutes),
    }
}

pub(crate) fn line(id: u64, price_minor: i64, minutes: u32, quantity: u32) -> LineItem {
    LineItem::new(sub_item(id, price_minor, minutes), qty(quantity))
}

pub(crate) fn vat(rate: i64, registration_number: Option<&str>) -> VatSettings {
    VatSettings {
        enabled: true,
        rate: Decimal::from(rate),
        registration_number: registration_number.map(str::to_string),
    }
}
