//! Checkout Summary
//!
//! Renders the review table shown on the last checkout step.

use std::io;

use jiff::{
    SignedDuration,
    civil::{Date, Time},
};
use rust_decimal::Decimal;
use rusty_money::{Money, iso::Currency};
use smallvec::SmallVec;
use tabled::{
    builder::Builder,
    settings::{Alignment, Style, object::Columns},
};
use thiserror::Error;

use crate::{
    catalog::LineItems,
    checkout::{
        Checkout,
        payment::{PaymentType, RemainderMethod},
        schedule::OrderType,
    },
    pricing::PricingResult,
};

/// Errors that can occur when writing a summary.
#[derive(Debug, Error)]
pub enum SummaryError {
    /// Writing to the output failed.
    #[error("failed to write summary")]
    Io(#[from] io::Error),
}

#[derive(Debug, Clone, PartialEq)]
struct SummaryLine {
    name: String,
    quantity: u32,
    unit_price: Money<'static, Currency>,
    amount: Money<'static, Currency>,
    duration: SignedDuration,
}

/// A snapshot of a checkout, ready to print.
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    lines: SmallVec<[SummaryLine; 8]>,
    pricing: PricingResult,
    coupon_code: Option<String>,
    points_used: u64,
    payment_type: Option<PaymentType>,
    remainder: Option<RemainderMethod>,
    order_type: Option<OrderType>,
    date: Option<Date>,
    time: Option<Time>,
}

impl Summary {
    /// Snapshot the checkout's items, totals and choices.
    pub fn from_checkout(checkout: &mut Checkout) -> Self {
        let currency = checkout.currency();
        let pricing = checkout.pricing().clone();
        let payment = checkout.payment();
        let schedule = checkout.schedule();

        Self {
            lines: summary_lines(checkout.items(), currency),
            pricing,
            coupon_code: checkout.coupon().applied().map(|coupon| coupon.code.clone()),
            points_used: payment.redemption().points,
            payment_type: payment.payment_type(),
            remainder: payment.remainder(),
            order_type: Some(schedule.order_type()),
            date: schedule.date(),
            time: schedule.time(),
        }
    }

    /// Summarise a standalone quote with no payment or schedule choices.
    pub fn from_quote(
        items: &LineItems,
        pricing: PricingResult,
        coupon_code: Option<String>,
        points_used: u64,
        currency: &'static Currency,
    ) -> Self {
        Self {
            lines: summary_lines(items, currency),
            pricing,
            coupon_code,
            points_used,
            payment_type: None,
            remainder: None,
            order_type: None,
            date: None,
            time: None,
        }
    }

    /// Totals the summary was built from.
    pub fn pricing(&self) -> &PricingResult {
        &self.pricing
    }

    /// Write the item table followed by the totals.
    ///
    /// # Errors
    ///
    /// Returns an error if writing to `out` fails.
    pub fn write_to(&self, mut out: impl io::Write) -> Result<(), SummaryError> {
        writeln!(out, "{}", self.items_table())?;
        writeln!(out, "{}", self.totals_table())?;

        if let Some(payment) = self.payment_line() {
            writeln!(out, "Payment: {payment}")?;
        }

        if let Some(when) = self.schedule_line() {
            writeln!(out, "When: {when}")?;
        }

        Ok(())
    }

    fn items_table(&self) -> String {
        let mut builder = Builder::default();

        builder.push_record(["#", "Service", "Qty", "Unit price", "Duration", "Amount"]);

        for (idx, line) in self.lines.iter().enumerate() {
            builder.push_record([
                format!("{}", idx + 1),
                line.name.clone(),
                line.quantity.to_string(),
                line.unit_price.to_string(),
                format!("{:#}", line.duration),
                line.amount.to_string(),
            ]);
        }

        let mut table = builder.build();

        table.with(Style::modern_rounded());
        table.modify(Columns::new(2..), Alignment::right());

        table.to_string()
    }

    fn totals_table(&self) -> String {
        let pricing = &self.pricing;
        let mut builder = Builder::default();

        builder.push_record(["Subtotal".to_string(), pricing.subtotal.to_string()]);

        if let Some(code) = &self.coupon_code {
            builder.push_record([format!("Coupon ({code})"), format!("-{}", pricing.discount)]);
        }

        if let Some(vat) = &pricing.vat {
            let label = match &vat.registration_number {
                Some(number) => format!("VAT {}% (reg. {number})", display_rate(vat.rate)),
                None => format!("VAT {}%", display_rate(vat.rate)),
            };

            builder.push_record([label, pricing.tax.to_string()]);
        }

        if pricing.points_discount.to_minor_units() > 0 {
            builder.push_record([
                format!("Points ({})", self.points_used),
                format!("-{}", pricing.points_discount),
            ]);
        }

        builder.push_record(["Total".to_string(), pricing.total.to_string()]);
        builder.push_record(["Duration".to_string(), format!("{:#}", pricing.total_duration)]);

        let mut table = builder.build();

        table.with(Style::modern_rounded());
        table.modify(Columns::last(), Alignment::right());

        table.to_string()
    }

    fn payment_line(&self) -> Option<String> {
        let payment_type = self.payment_type?;

        let label = match (payment_type, self.remainder) {
            (PaymentType::Card, _) => "card".to_string(),
            (PaymentType::Cash, _) => "cash".to_string(),
            (PaymentType::Points, _) if self.pricing.total.to_minor_units() == 0 => {
                "points".to_string()
            }
            (PaymentType::Points, Some(RemainderMethod::Cash)) => {
                "points, remainder in cash".to_string()
            }
            (PaymentType::Points, _) => "points, remainder by card".to_string(),
        };

        Some(label)
    }

    fn schedule_line(&self) -> Option<String> {
        let line = match (self.order_type?, self.date, self.time) {
            (OrderType::Now, _, _) => "as soon as possible".to_string(),
            (OrderType::Scheduled, Some(date), Some(time)) => {
                format!("{date} at {}", time.strftime("%H:%M"))
            }
            (OrderType::Scheduled, Some(date), None) => date.to_string(),
            (OrderType::Scheduled, None, _) => "not scheduled".to_string(),
        };

        Some(line)
    }
}

fn summary_lines(items: &LineItems, currency: &'static Currency) -> SmallVec<[SummaryLine; 8]> {
    items
        .iter()
        .map(|item| SummaryLine {
            name: item.sub_item().name.clone(),
            quantity: item.quantity().get(),
            unit_price: item.unit_price(currency),
            amount: Money::from_minor(item.line_total_minor(), currency),
            duration: item.line_duration(),
        })
        .collect()
}

/// Rate as shown to the customer, without trailing zeros.
pub fn display_rate(rate: Decimal) -> String {
    rate.normalize().to_string()
}
