//! Checkout
//!
//! The order wizard: category, vendor and services are chosen first, then the
//! checkout sub-flow collects address and schedule, payment, and a final
//! confirmation. Moving forward validates the current step; moving back is
//! always allowed.

use std::num::NonZeroU32;

use jiff::civil::{Date, Time};
use rusty_money::iso::Currency;
use thiserror::Error;
use tracing::{debug, info};

use crate::{
    amounts::{AmountError, MinorUnits, Minutes, from_minor_units},
    api::{ApiError, CouponRequest, CouponValidator, OrdersApi, SlotProvider, TimeSlot},
    catalog::{CategoryId, LineItems, SubItem, SubItemId, VendorId},
    pricing::{AppliedCoupon, PricingInput, PricingMemo, PricingResult, VatSettings, VatSource},
};

pub mod contact;
pub mod coupon;
pub mod order;
pub mod payment;
pub mod schedule;
pub mod steps;
pub mod validation;

use contact::{ContactDetails, CustomerProfile};
use coupon::CouponState;
use order::{OrderLine, OrderRequest, PlacedOrder};
use payment::{PaymentState, PaymentType, PointsRate, PointsRedemption, RemainderMethod};
use schedule::{OrderType, ScheduleState, SlotRequest};
use steps::{CheckoutStep, Step};
use validation::{FieldId, ValidationErrors};

/// Errors raised by checkout operations.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// The current step has missing or invalid fields
    #[error(transparent)]
    Invalid(#[from] ValidationErrors),

    /// There is no step before the current one
    #[error("already at the first step")]
    AtFirstStep,

    /// There is no step after the current one
    #[error("already at the last step")]
    AtLastStep,

    /// Coupon code was blank
    #[error("enter a coupon code")]
    EmptyCoupon,

    /// Coupons do not combine with points payment
    #[error("coupons cannot be used when paying with points")]
    CouponWithPoints,

    /// Points or remainder chosen without points payment
    #[error("points payment is not selected")]
    PointsNotSelected,

    /// The chosen time is not a free slot
    #[error("{0} is not an available time")]
    SlotUnavailable(Time),

    /// A REST call failed
    #[error(transparent)]
    Api(#[from] ApiError),

    /// An amount could not be represented
    #[error(transparent)]
    Amount(#[from] AmountError),
}

/// An in-progress order.
#[derive(Debug, Clone)]
pub struct Checkout {
    currency: &'static Currency,
    points_rate: PointsRate,
    step: Step,
    entered_checkout: bool,
    category: Option<CategoryId>,
    vendor: Option<VendorId>,
    vat: VatSource,
    items: LineItems,
    profile: Option<CustomerProfile>,
    contact: ContactDetails,
    schedule: ScheduleState,
    payment: PaymentState,
    coupon: CouponState,
    terms_accepted: bool,
    errors: ValidationErrors,
    memo: PricingMemo,
}

impl Checkout {
    /// Start a new checkout quoting in `currency`.
    pub fn new(currency: &'static Currency, points_rate: PointsRate) -> Self {
        Self {
            currency,
            points_rate,
            step: Step::default(),
            entered_checkout: false,
            category: None,
            vendor: None,
            vat: VatSource::default(),
            items: LineItems::new(),
            profile: None,
            contact: ContactDetails::default(),
            schedule: ScheduleState::default(),
            payment: PaymentState::default(),
            coupon: CouponState::default(),
            terms_accepted: false,
            errors: ValidationErrors::new(),
            memo: PricingMemo::new(),
        }
    }

    /// Current step.
    pub fn step(&self) -> Step {
        self.step
    }

    /// Errors from the last blocked forward move.
    pub fn errors(&self) -> &ValidationErrors {
        &self.errors
    }

    /// Currency every amount is quoted in.
    pub fn currency(&self) -> &'static Currency {
        self.currency
    }

    /// Selected category.
    pub fn category(&self) -> Option<CategoryId> {
        self.category
    }

    /// Selected vendor.
    pub fn vendor(&self) -> Option<VendorId> {
        self.vendor
    }

    /// VAT settings in effect.
    pub fn vat(&self) -> &VatSource {
        &self.vat
    }

    /// Selected line items.
    pub fn items(&self) -> &LineItems {
        &self.items
    }

    /// Contact details.
    pub fn contact(&self) -> &ContactDetails {
        &self.contact
    }

    /// Contact details, for editing.
    pub fn contact_mut(&mut self) -> &mut ContactDetails {
        &mut self.contact
    }

    /// Schedule and slots.
    pub fn schedule(&self) -> &ScheduleState {
        &self.schedule
    }

    /// Payment selection.
    pub fn payment(&self) -> &PaymentState {
        &self.payment
    }

    /// Coupon input and result.
    pub fn coupon(&self) -> &CouponState {
        &self.coupon
    }

    /// Whether the terms were accepted.
    pub fn terms_accepted(&self) -> bool {
        self.terms_accepted
    }

    /// Set the signed-in customer's profile. Its points balance becomes the
    /// redeemable balance.
    pub fn set_profile(&mut self, profile: CustomerProfile) {
        self.payment.set_balance(profile.points_balance);
        self.profile = Some(profile);
        self.clamp_points();
    }

    /// Set the platform-wide VAT fallback.
    pub fn set_platform_vat(&mut self, settings: Option<VatSettings>) {
        self.vat.platform = settings;
    }

    /// Choose a category. A different category drops the vendor and items.
    pub fn select_category(&mut self, category: CategoryId) {
        if self.category == Some(category) {
            return;
        }

        self.category = Some(category);
        self.vendor = None;
        self.vat.vendor = None;
        self.clear_selection();
    }

    /// Choose a vendor along with its own VAT settings, if it has any.
    /// A different vendor drops the items.
    pub fn select_vendor(&mut self, vendor: VendorId, vat: Option<VatSettings>) {
        self.vat.vendor = vat;

        if self.vendor == Some(vendor) {
            return;
        }

        self.vendor = Some(vendor);
        self.clear_selection();
    }

    fn clear_selection(&mut self) {
        self.items.clear();
        self.coupon.clear();
        self.payment.set_redemption(PointsRedemption::default());
        self.schedule.invalidate();
    }

    /// Add `quantity` units of a sub-item.
    pub fn add_item(&mut self, sub_item: SubItem, quantity: NonZeroU32) {
        self.items.add(sub_item, quantity);
        self.items_changed();
    }

    /// Remove a sub-item. Returns `false` if it was not selected.
    pub fn remove_item(&mut self, id: SubItemId) -> bool {
        let removed = self.items.remove(id).is_some();

        if removed {
            self.items_changed();
        }

        removed
    }

    /// Change a sub-item's quantity; zero removes it. Returns `false` if it
    /// was not selected.
    pub fn set_quantity(&mut self, id: SubItemId, quantity: u32) -> bool {
        let changed = self.items.set_quantity(id, quantity);

        if changed {
            self.items_changed();
        }

        changed
    }

    fn items_changed(&mut self) {
        // Slots depend on the total duration.
        self.schedule.invalidate();

        // A coupon only holds for the subtotal it was validated against.
        let subtotal = self.subtotal();
        if self.coupon.expire_unless(subtotal) {
            info!(subtotal = %subtotal, "coupon expired by item change");
        }

        self.clamp_points();
    }

    /// Current totals, recomputed only when an input changed.
    pub fn pricing(&mut self) -> &PricingResult {
        let input = PricingInput {
            items: self.items.as_slice(),
            vat: &self.vat,
            coupon: self.coupon.applied(),
            points_discount: self.payment.points_discount(),
            currency: self.currency,
        };

        self.memo.get(&input)
    }

    fn subtotal(&mut self) -> MinorUnits {
        MinorUnits::new(self.pricing().subtotal.to_minor_units())
    }

    fn payable_before_points(&mut self) -> MinorUnits {
        MinorUnits::new(self.pricing().payable_before_points.to_minor_units())
    }

    fn service_minutes(&mut self) -> Minutes {
        let minutes = self.pricing().total_duration.as_mins();

        Minutes::new(u32::try_from(minutes).unwrap_or(u32::MAX))
    }

    /// Move to the next step after validating the current one.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::Invalid`] with every failed field when the
    /// current step is incomplete; the errors are also kept on the checkout.
    pub fn next(&mut self) -> Result<Step, CheckoutError> {
        let next = self.step.next().ok_or(CheckoutError::AtLastStep)?;

        let errors = self.validate_step(self.step);

        if !errors.is_empty() {
            debug!(step = %self.step, failed = errors.len(), "step blocked");
            self.errors = errors.clone();
            return Err(errors.into());
        }

        self.errors = ValidationErrors::new();

        if next.is_checkout() && !self.entered_checkout {
            self.entered_checkout = true;

            if let Some(profile) = &self.profile {
                self.contact.prefill(profile);
            }
        }

        info!(from = %self.step, to = %next, "checkout step");

        self.step = next;

        Ok(next)
    }

    /// Move to the previous step. Never validates.
    ///
    /// # Errors
    ///
    /// Returns an error when already at the first step.
    pub fn back(&mut self) -> Result<Step, CheckoutError> {
        let previous = self.step.previous().ok_or(CheckoutError::AtFirstStep)?;

        self.errors = ValidationErrors::new();

        info!(from = %self.step, to = %previous, "checkout step");

        self.step = previous;

        Ok(previous)
    }

    /// Check the required fields of `step`.
    pub fn validate_step(&mut self, step: Step) -> ValidationErrors {
        let mut errors = ValidationErrors::new();

        match step {
            Step::Category => {
                errors.require(self.category.is_some(), FieldId::Category, "Choose a category");
            }
            Step::Vendor => {
                errors.require(self.vendor.is_some(), FieldId::Vendor, "Choose a vendor");
            }
            Step::Services => {
                errors.require(
                    !self.items.is_empty(),
                    FieldId::Items,
                    "Choose at least one service",
                );
            }
            Step::Checkout(CheckoutStep::AddressSchedule) => self.validate_address(&mut errors),
            Step::Checkout(CheckoutStep::Payment) => self.validate_payment(&mut errors),
            Step::Checkout(CheckoutStep::Summary) => {
                errors.require(
                    self.terms_accepted,
                    FieldId::Terms,
                    "Accept the terms and conditions",
                );
            }
        }

        errors
    }

    fn validate_address(&self, errors: &mut ValidationErrors) {
        let filled = |value: &str| !value.trim().is_empty();

        errors.require(filled(&self.contact.address), FieldId::Address, "Address is required");
        errors.require(filled(&self.contact.name), FieldId::ContactName, "Name is required");
        errors.require(
            filled(&self.contact.phone),
            FieldId::ContactPhone,
            "Phone number is required",
        );

        if self.schedule.order_type() == OrderType::Now {
            return;
        }

        errors.require(self.schedule.date().is_some(), FieldId::Date, "Choose a date");

        match self.schedule.time() {
            None => errors.push(FieldId::Time, "Choose a time"),
            Some(time) if !self.schedule.is_available(time) => {
                errors.push(FieldId::Time, "The chosen time is no longer available");
            }
            Some(_) => {}
        }
    }

    fn validate_payment(&mut self, errors: &mut ValidationErrors) {
        let Some(payment_type) = self.payment.payment_type() else {
            errors.push(FieldId::PaymentType, "Choose a payment method");
            return;
        };

        if payment_type != PaymentType::Points {
            return;
        }

        errors.require(
            self.payment.redemption().points > 0,
            FieldId::Points,
            "Enter the points to redeem",
        );

        let outstanding = self.pricing().total.to_minor_units() > 0;

        errors.require(
            !outstanding || self.payment.remainder().is_some(),
            FieldId::RemainderMethod,
            "Choose how to pay the remaining amount",
        );
    }

    /// Validate `code` against the current subtotal and apply it.
    ///
    /// On failure the error message is kept on the coupon state and any
    /// previously applied coupon is dropped.
    ///
    /// # Errors
    ///
    /// Returns an error if the code is blank, points payment is selected, or
    /// the validation request fails.
    #[tracing::instrument(name = "checkout.apply_coupon", skip(self, validator), err)]
    pub async fn apply_coupon(
        &mut self,
        validator: &dyn CouponValidator,
        code: &str,
    ) -> Result<AppliedCoupon, CheckoutError> {
        let code = code.trim();

        self.coupon.set_input(code);

        if code.is_empty() {
            self.coupon.reject("Enter a coupon code".to_string());
            return Err(CheckoutError::EmptyCoupon);
        }

        if self.payment.payment_type() == Some(PaymentType::Points) {
            self.coupon
                .reject("Coupons cannot be used when paying with points".to_string());
            return Err(CheckoutError::CouponWithPoints);
        }

        let subtotal = self.subtotal();
        let request = CouponRequest {
            code: code.to_string(),
            subtotal: subtotal.to_major(),
        };

        match validator.validate_coupon(&request).await {
            Ok(validation) => {
                let applied = self.coupon.accept(validation, subtotal).clone();

                info!(code = %applied.code, discount = %applied.discount, "coupon applied");

                Ok(applied)
            }
            Err(error) => {
                self.coupon.reject(error.user_message());
                Err(error.into())
            }
        }
    }

    /// Clear the coupon input, result and error.
    pub fn remove_coupon(&mut self) {
        self.coupon.clear();
    }

    /// Switch payment type, resetting coupon, points and remainder state as
    /// [`PaymentType::resets`] describes.
    pub fn set_payment_type(&mut self, payment_type: PaymentType) {
        let reset = self.payment.select(payment_type);

        if reset.clears_coupon {
            self.coupon.clear();
        }

        debug!(?payment_type, ?reset, "payment type selected");
    }

    /// Choose how the amount points do not cover is paid.
    ///
    /// # Errors
    ///
    /// Returns an error unless points payment is selected.
    pub fn set_remainder_method(&mut self, method: RemainderMethod) -> Result<(), CheckoutError> {
        if self.payment.payment_type() != Some(PaymentType::Points) {
            return Err(CheckoutError::PointsNotSelected);
        }

        self.payment.set_remainder(method);

        Ok(())
    }

    /// Redeem up to `points`, limited by the balance and by the amount due.
    ///
    /// # Errors
    ///
    /// Returns an error unless points payment is selected.
    pub fn redeem_points(&mut self, points: u64) -> Result<PointsRedemption, CheckoutError> {
        if self.payment.payment_type() != Some(PaymentType::Points) {
            return Err(CheckoutError::PointsNotSelected);
        }

        let cap = self.payable_before_points();
        let redemption = self
            .points_rate
            .redeem(points, self.payment.balance(), cap);

        self.payment.set_redemption(redemption);

        Ok(redemption)
    }

    fn clamp_points(&mut self) {
        let current = self.payment.redemption();

        if current.points == 0 {
            return;
        }

        let cap = self.payable_before_points();
        let clamped = self
            .points_rate
            .redeem(current.points, self.payment.balance(), cap);

        if clamped != current {
            debug!(from = current.points, to = clamped.points, "points redemption clamped");
            self.payment.set_redemption(clamped);
        }
    }

    /// Choose between an immediate and a scheduled order.
    pub fn set_order_type(&mut self, order_type: OrderType) {
        self.schedule.set_order_type(order_type);
    }

    /// Choose the service date. Clears the chosen time and loaded slots.
    pub fn set_date(&mut self, date: Date) {
        self.schedule.set_date(date);
    }

    /// Choose a start time from the loaded slots.
    ///
    /// # Errors
    ///
    /// Returns an error if slots are not loaded or `time` has no free
    /// technician.
    pub fn select_time(&mut self, time: Time) -> Result<(), CheckoutError> {
        if !self.schedule.time_selectable() || !self.schedule.is_available(time) {
            return Err(CheckoutError::SlotUnavailable(time));
        }

        self.schedule.set_time(time);

        Ok(())
    }

    /// Start a slot lookup if vendor, date and duration are all known and the
    /// order is scheduled. Any lookup already in flight becomes stale.
    pub fn begin_slot_fetch(&mut self) -> Option<SlotRequest> {
        let duration = self.service_minutes();

        self.schedule.begin(self.vendor, duration)
    }

    /// Apply the result of a lookup started by [`Self::begin_slot_fetch`].
    /// Returns `Ok(false)` when the result was stale and ignored.
    ///
    /// # Errors
    ///
    /// Returns the lookup error when it applied to the current generation.
    pub fn complete_slot_fetch(
        &mut self,
        generation: u64,
        result: Result<Vec<TimeSlot>, ApiError>,
    ) -> Result<bool, CheckoutError> {
        match result {
            Ok(slots) => Ok(self.schedule.complete(generation, Ok(slots))),
            Err(error) => {
                if self.schedule.complete(generation, Err(&error)) {
                    Err(error.into())
                } else {
                    Ok(false)
                }
            }
        }
    }

    /// Look up slots for the current date, vendor and duration. Returns
    /// `Ok(false)` if inputs are incomplete.
    ///
    /// # Errors
    ///
    /// Returns an error if the lookup fails; the slot list is left empty.
    #[tracing::instrument(name = "checkout.refresh_slots", skip(self, provider), err)]
    pub async fn refresh_slots(&mut self, provider: &dyn SlotProvider) -> Result<bool, CheckoutError> {
        let Some(request) = self.begin_slot_fetch() else {
            return Ok(false);
        };

        let result = provider.available_slots(&request.query).await;

        self.complete_slot_fetch(request.generation, result)
    }

    /// Accept or withdraw acceptance of the terms.
    pub fn accept_terms(&mut self, accepted: bool) {
        self.terms_accepted = accepted;
    }

    /// Validate every step and build the order payload.
    ///
    /// # Errors
    ///
    /// Returns every failed field across all steps.
    pub fn order_request(&mut self) -> Result<OrderRequest, CheckoutError> {
        let mut errors = ValidationErrors::new();

        for step in Step::ALL {
            errors.extend(self.validate_step(step));
        }

        let (Some(category_id), Some(vendor_id), Some(payment_type), true) = (
            self.category,
            self.vendor,
            self.payment.payment_type(),
            errors.is_empty(),
        ) else {
            return Err(errors.into());
        };

        let scheduled = self.schedule.order_type() == OrderType::Scheduled;
        let redemption = self.payment.redemption();
        let total = self.pricing().total.to_minor_units();

        Ok(OrderRequest {
            category_id,
            vendor_id,
            items: self
                .items
                .iter()
                .map(|item| OrderLine {
                    sub_item_id: item.sub_item().id,
                    quantity: item.quantity().get(),
                })
                .collect(),
            order_type: self.schedule.order_type(),
            scheduled_date: self.schedule.date().filter(|_| scheduled),
            scheduled_time: self.schedule.time().filter(|_| scheduled),
            address: self.contact.address.trim().to_string(),
            contact_name: self.contact.name.trim().to_string(),
            contact_phone: self.contact.phone.trim().to_string(),
            notes: Some(self.contact.notes.trim().to_string()).filter(|notes| !notes.is_empty()),
            payment_type,
            remaining_payment_type: self.payment.remainder(),
            coupon_code: self.coupon.applied().map(|coupon| coupon.code.clone()),
            points_used: (payment_type == PaymentType::Points).then_some(redemption.points),
            total: from_minor_units(total),
        })
    }

    /// Submit the order. On success the session's items, coupon and points
    /// are discarded and the wizard starts over.
    ///
    /// # Errors
    ///
    /// Returns an error if any step is incomplete or the request fails; the
    /// checkout is left unchanged.
    #[tracing::instrument(name = "checkout.place_order", skip(self, orders), err)]
    pub async fn place_order(&mut self, orders: &dyn OrdersApi) -> Result<PlacedOrder, CheckoutError> {
        let request = self.order_request()?;

        let placed = orders.place_order(&request).await?;

        info!(order = placed.id, status = %placed.status, "order placed");

        self.abandon();

        Ok(placed)
    }

    /// Discard the in-progress order. The profile and platform VAT are kept.
    pub fn abandon(&mut self) {
        let mut fresh = Self::new(self.currency, self.points_rate);

        fresh.vat.platform = self.vat.platform.take();

        if let Some(profile) = self.profile.take() {
            fresh.set_profile(profile);
        }

        *self = fresh;
    }
}
