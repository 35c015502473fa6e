//! Payment
//!
//! Payment method selection and loyalty points redemption. Switching payment
//! type is the only place coupon, points and remainder state are reset; see
//! [`PaymentType::resets`].

use rust_decimal::{Decimal, prelude::ToPrimitive};
use serde::Serialize;

use crate::amounts::{MINOR_PER_MAJOR, MinorUnits};

/// How the order is paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentType {
    /// Card payment
    Card,

    /// Cash on service
    Cash,

    /// Loyalty points, with any remainder paid by [`RemainderMethod`]
    Points,
}

/// How the part of the total that points do not cover is paid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RemainderMethod {
    /// Card payment
    #[default]
    Card,

    /// Cash on service
    Cash,
}

/// Auxiliary state a payment type switch resets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaymentReset {
    /// Drop the applied coupon, its input and error
    pub clears_coupon: bool,

    /// Drop the points redemption
    pub clears_points: bool,

    /// New remainder method
    pub remainder: Option<RemainderMethod>,
}

impl PaymentType {
    /// What switching to this payment type resets.
    ///
    /// | target | coupon  | points  | remainder |
    /// |--------|---------|---------|-----------|
    /// | Card   | kept    | cleared | cleared   |
    /// | Cash   | kept    | cleared | cleared   |
    /// | Points | cleared | kept    | `Card`    |
    pub fn resets(self) -> PaymentReset {
        match self {
            PaymentType::Card | PaymentType::Cash => PaymentReset {
                clears_coupon: false,
                clears_points: true,
                remainder: None,
            },
            PaymentType::Points => PaymentReset {
                clears_coupon: true,
                clears_points: false,
                remainder: Some(RemainderMethod::default()),
            },
        }
    }
}

/// Points chosen for redemption and what they are worth.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PointsRedemption {
    /// Points used
    pub points: u64,

    /// Discount those points buy
    pub discount: MinorUnits,
}

/// Converts between loyalty points and money.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointsRate {
    per_major_unit: Decimal,
}

impl PointsRate {
    /// A rate of `per_major_unit` points to one major currency unit. Returns
    /// `None` unless the rate is positive.
    pub fn new(per_major_unit: Decimal) -> Option<Self> {
        (per_major_unit > Decimal::ZERO).then_some(Self { per_major_unit })
    }

    /// Points worth one major unit.
    pub fn per_major_unit(self) -> Decimal {
        self.per_major_unit
    }

    /// Money `points` buy, rounded down to a whole minor unit.
    pub fn value_of(self, points: u64) -> MinorUnits {
        let minor = (Decimal::from(points) * Decimal::from(MINOR_PER_MAJOR))
            .checked_div(self.per_major_unit)
            .unwrap_or_default()
            .floor()
            .to_i64()
            .unwrap_or(i64::MAX);

        MinorUnits::new(minor)
    }

    /// Fewest points that cover `amount`.
    pub fn points_for(self, amount: MinorUnits) -> u64 {
        (Decimal::from(amount.get()) * self.per_major_unit)
            .checked_div(Decimal::from(MINOR_PER_MAJOR))
            .unwrap_or_default()
            .ceil()
            .to_u64()
            .unwrap_or(u64::MAX)
    }

    /// Redeem up to `requested` points from `balance`, never discounting more
    /// than `cap`.
    pub fn redeem(self, requested: u64, balance: u64, cap: MinorUnits) -> PointsRedemption {
        let points = requested.min(balance).min(self.points_for(cap));
        let discount = self.value_of(points).min(cap);

        PointsRedemption { points, discount }
    }
}

/// Payment selection for the checkout.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaymentState {
    payment_type: Option<PaymentType>,
    remainder: Option<RemainderMethod>,
    balance: u64,
    redemption: PointsRedemption,
}

impl PaymentState {
    /// Selected payment type.
    pub fn payment_type(&self) -> Option<PaymentType> {
        self.payment_type
    }

    /// Selected remainder method.
    pub fn remainder(&self) -> Option<RemainderMethod> {
        self.remainder
    }

    /// Available points balance.
    pub fn balance(&self) -> u64 {
        self.balance
    }

    /// Current redemption.
    pub fn redemption(&self) -> PointsRedemption {
        self.redemption
    }

    /// Points discount fed into pricing. Zero unless paying with points.
    pub fn points_discount(&self) -> MinorUnits {
        match self.payment_type {
            Some(PaymentType::Points) => self.redemption.discount,
            _ => MinorUnits::ZERO,
        }
    }

    /// Switch payment type and apply its resets to the payment state.
    /// Returns the reset so the caller can clear coupon state. Re-selecting
    /// the current type resets nothing.
    pub(crate) fn select(&mut self, payment_type: PaymentType) -> PaymentReset {
        if self.payment_type == Some(payment_type) {
            return PaymentReset {
                clears_coupon: false,
                clears_points: false,
                remainder: self.remainder,
            };
        }

        let reset = payment_type.resets();

        self.payment_type = Some(payment_type);
        self.remainder = reset.remainder;

        if reset.clears_points {
            self.redemption = PointsRedemption::default();
        }

        reset
    }

    pub(crate) fn set_remainder(&mut self, method: RemainderMethod) {
        self.remainder = Some(method);
    }

    pub(crate) fn set_balance(&mut self, balance: u64) {
        self.balance = balance;
    }

    pub(crate) fn set_redemption(&mut self, redemption: PointsRedemption) {
        self.redemption = redemption;
    }
}
