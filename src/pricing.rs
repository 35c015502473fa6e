//! Pricing
//!
//! Derives the checkout totals from the selected line items, the applicable
//! VAT settings, an applied coupon and any redeemed loyalty points. Pricing is
//! pure and infallible: every input has already been normalised by the time it
//! reaches this module.

use decimal_percentage::Percentage;
use jiff::SignedDuration;
use rust_decimal::{Decimal, RoundingStrategy, prelude::ToPrimitive};
use rusty_money::{Money, iso::Currency};
use serde::Deserialize;

use crate::{
    amounts::{MinorUnits, lenient_decimal},
    catalog::LineItem,
};

/// VAT settings as configured by a vendor or by the platform.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct VatSettings {
    /// Whether VAT is charged at all
    #[serde(default)]
    pub enabled: bool,

    /// Rate in percent points (`5` means 5%)
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub rate: Decimal,

    /// Tax registration number printed on the summary
    #[serde(default)]
    pub registration_number: Option<String>,
}

/// Where VAT settings may come from. Vendor settings take precedence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct VatSource {
    /// The selling vendor's own settings
    #[serde(default)]
    pub vendor: Option<VatSettings>,

    /// Platform-wide fallback
    #[serde(default)]
    pub platform: Option<VatSettings>,
}

impl VatSource {
    /// Resolve the effective, enabled VAT settings, if any.
    pub fn resolve(&self) -> Option<&VatSettings> {
        self.vendor
            .as_ref()
            .or(self.platform.as_ref())
            .filter(|settings| settings.enabled)
    }
}

/// A coupon that has been validated against a subtotal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedCoupon {
    /// Coupon code as entered
    pub code: String,

    /// Absolute discount granted by the coupon
    pub discount: MinorUnits,
}

/// VAT as it was applied to a pricing result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedVat {
    /// Rate in percent points
    pub rate: Decimal,

    /// Tax registration number, if configured
    pub registration_number: Option<String>,
}

/// Everything pricing depends on.
#[derive(Debug, Clone, Copy)]
pub struct PricingInput<'a> {
    /// Selected line items
    pub items: &'a [LineItem],

    /// VAT settings sources
    pub vat: &'a VatSource,

    /// Applied coupon, if any
    pub coupon: Option<&'a AppliedCoupon>,

    /// Discount from redeemed loyalty points
    pub points_discount: MinorUnits,

    /// Currency for every amount
    pub currency: &'static Currency,
}

/// Derived checkout totals. Never stored; recomputed from [`PricingInput`].
#[derive(Debug, Clone, PartialEq)]
pub struct PricingResult {
    /// Sum of unit price times quantity
    pub subtotal: Money<'static, Currency>,

    /// Coupon discount
    pub discount: Money<'static, Currency>,

    /// VAT charged on the discounted subtotal
    pub tax: Money<'static, Currency>,

    /// Amount due before loyalty points are taken off
    pub payable_before_points: Money<'static, Currency>,

    /// Loyalty points discount
    pub points_discount: Money<'static, Currency>,

    /// Grand total, never negative
    pub total: Money<'static, Currency>,

    /// Sum of duration times quantity
    pub total_duration: SignedDuration,

    /// VAT that was applied, if enabled
    pub vat: Option<AppliedVat>,
}

/// Calculate checkout totals.
///
/// Tax is charged on `subtotal - coupon discount` and rounded to two decimal
/// places; loyalty points are deducted after tax. The total is floored at zero.
pub fn calculate(input: &PricingInput<'_>) -> PricingResult {
    let subtotal = input
        .items
        .iter()
        .fold(0_i64, |acc, item| acc.saturating_add(item.line_total_minor()));

    let total_duration = input
        .items
        .iter()
        .fold(SignedDuration::ZERO, |acc, item| {
            acc.saturating_add(item.line_duration())
        });

    let discount = input.coupon.map_or(0, |coupon| coupon.discount.get());
    let taxable = subtotal.saturating_sub(discount).max(0);

    let vat = input.vat.resolve();
    let tax = vat.map_or(0, |settings| tax_on(taxable, settings.rate));

    let payable_before_points = subtotal.saturating_sub(discount).saturating_add(tax).max(0);
    let points_discount = input.points_discount.get();
    let total = payable_before_points.saturating_sub(points_discount).max(0);

    let money = |minor: i64| Money::from_minor(minor, input.currency);

    PricingResult {
        subtotal: money(subtotal),
        discount: money(discount),
        tax: money(tax),
        payable_before_points: money(payable_before_points),
        points_discount: money(points_discount),
        total: money(total),
        total_duration,
        vat: vat.map(|settings| AppliedVat {
            rate: settings.rate,
            registration_number: settings.registration_number.clone(),
        }),
    }
}

/// Tax on `taxable` minor units at `rate` percent points, rounded half away
/// from zero to the nearest minor unit.
fn tax_on(taxable: i64, rate: Decimal) -> i64 {
    let Some(fraction) = rate.checked_div(Decimal::ONE_HUNDRED) else {
        return 0;
    };

    (Percentage::from(fraction) * Decimal::from(taxable))
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .unwrap_or(0)
}

#[derive(Debug, Clone, PartialEq)]
struct MemoKey {
    items: Vec<LineItem>,
    vat: VatSource,
    coupon: Option<AppliedCoupon>,
    points_discount: MinorUnits,
    currency: &'static str,
}

impl MemoKey {
    fn of(input: &PricingInput<'_>) -> Self {
        Self {
            items: input.items.to_vec(),
            vat: input.vat.clone(),
            coupon: input.coupon.cloned(),
            points_discount: input.points_discount,
            currency: input.currency.iso_alpha_code,
        }
    }

    fn matches(&self, input: &PricingInput<'_>) -> bool {
        self.items.as_slice() == input.items
            && &self.vat == input.vat
            && self.coupon.as_ref() == input.coupon
            && self.points_discount == input.points_discount
            && self.currency == input.currency.iso_alpha_code
    }
}

/// Caches the most recent pricing result, recomputing only when an input
/// changes.
#[derive(Debug, Clone, Default)]
pub struct PricingMemo {
    cached: Option<(MemoKey, PricingResult)>,
}

impl PricingMemo {
    /// Create an empty memo.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the pricing result for `input`, recomputing if inputs changed.
    pub fn get(&mut self, input: &PricingInput<'_>) -> &PricingResult {
        let fresh = matches!(&self.cached, Some((key, _)) if key.matches(input));

        if !fresh {
            self.cached = None;
        }

        let (_, result) = self
            .cached
            .get_or_insert_with(|| (MemoKey::of(input), calculate(input)));

        result
    }
}
