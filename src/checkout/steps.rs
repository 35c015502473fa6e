//! Checkout Steps

use std::fmt;

/// Sub-steps of the final checkout stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CheckoutStep {
    /// Service address, contact details and schedule
    AddressSchedule,

    /// Payment method, coupon and points
    Payment,

    /// Review and confirm
    Summary,
}

/// A position in the order wizard.
///
/// `Category → Vendor → Services → Checkout(AddressSchedule → Payment → Summary)`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Step {
    /// Choose a service category
    #[default]
    Category,

    /// Choose a vendor
    Vendor,

    /// Choose services and quantities
    Services,

    /// Checkout sub-flow
    Checkout(CheckoutStep),
}

impl Step {
    /// Every step in order.
    pub const ALL: [Step; 6] = [
        Step::Category,
        Step::Vendor,
        Step::Services,
        Step::Checkout(CheckoutStep::AddressSchedule),
        Step::Checkout(CheckoutStep::Payment),
        Step::Checkout(CheckoutStep::Summary),
    ];

    /// Zero-based position in the wizard.
    pub fn index(self) -> usize {
        match self {
            Step::Category => 0,
            Step::Vendor => 1,
            Step::Services => 2,
            Step::Checkout(CheckoutStep::AddressSchedule) => 3,
            Step::Checkout(CheckoutStep::Payment) => 4,
            Step::Checkout(CheckoutStep::Summary) => 5,
        }
    }

    /// The step after this one, if any.
    pub fn next(self) -> Option<Step> {
        Self::ALL.get(self.index() + 1).copied()
    }

    /// The step before this one, if any.
    pub fn previous(self) -> Option<Step> {
        self.index()
            .checked_sub(1)
            .and_then(|index| Self::ALL.get(index).copied())
    }

    /// True for the checkout sub-steps.
    pub fn is_checkout(self) -> bool {
        matches!(self, Step::Checkout(_))
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Step::Category => "category",
            Step::Vendor => "vendor",
            Step::Services => "services",
            Step::Checkout(CheckoutStep::AddressSchedule) => "address & schedule",
            Step::Checkout(CheckoutStep::Payment) => "payment",
            Step::Checkout(CheckoutStep::Summary) => "summary",
        };

        f.write_str(label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn steps_move_one_at_a_time() {
        assert_eq!(Step::Category.next(), Some(Step::Vendor));
        assert_eq!(
            Step::Services.next(),
            Some(Step::Checkout(CheckoutStep::AddressSchedule))
        );
        assert_eq!(Step::Checkout(CheckoutStep::Summary).next(), None);

        assert_eq!(Step::Category.previous(), None);
        assert_eq!(
            Step::Checkout(CheckoutStep::AddressSchedule).previous(),
            Some(Step::Services)
        );
    }

    #[test]
    fn indexes_follow_declaration_order() {
        for (expected, step) in Step::ALL.iter().enumerate() {
            assert_eq!(step.index(), expected, "index of {step}");
        }
    }
}
