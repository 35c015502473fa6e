//! Coupon state.

use crate::{amounts::MinorUnits, api::CouponValidation, pricing::AppliedCoupon};

/// Coupon input, the applied coupon and the last validation error.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CouponState {
    input: String,
    applied: Option<AppliedCoupon>,
    validated_subtotal: MinorUnits,
    error: Option<String>,
}

impl CouponState {
    /// Code as typed.
    pub fn input(&self) -> &str {
        &self.input
    }

    /// Applied coupon, if validation succeeded.
    pub fn applied(&self) -> Option<&AppliedCoupon> {
        self.applied.as_ref()
    }

    /// Last validation error.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub(crate) fn set_input(&mut self, code: &str) {
        code.clone_into(&mut self.input);
    }

    pub(crate) fn accept(
        &mut self,
        validation: CouponValidation,
        subtotal: MinorUnits,
    ) -> &AppliedCoupon {
        self.error = None;
        self.validated_subtotal = subtotal;

        self.applied.insert(AppliedCoupon {
            code: validation.code,
            discount: validation.discount,
        })
    }

    pub(crate) fn reject(&mut self, message: String) {
        self.applied = None;
        self.error = Some(message);
    }

    /// Drop the applied coupon if it was validated against a different
    /// subtotal. The typed code is kept so it can be re-applied.
    pub(crate) fn expire_unless(&mut self, subtotal: MinorUnits) -> bool {
        if self.applied.is_none() || self.validated_subtotal == subtotal {
            return false;
        }

        self.applied = None;
        self.error = Some("Services changed; re-apply the coupon".to_string());

        true
    }

    /// Clear input, applied coupon and error.
    pub(crate) fn clear(&mut self) {
        *self = Self::default();
    }
}
