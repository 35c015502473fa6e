//! Step validation results.

use std::fmt;

use smallvec::SmallVec;
use thiserror::Error;

/// Fields that can fail validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldId {
    /// Service category
    Category,

    /// Vendor
    Vendor,

    /// Line items
    Items,

    /// Service address
    Address,

    /// Contact name
    ContactName,

    /// Contact phone number
    ContactPhone,

    /// Service date
    Date,

    /// Service start time
    Time,

    /// Payment method
    PaymentType,

    /// Points to redeem
    Points,

    /// Method paying what points do not cover
    RemainderMethod,

    /// Terms and conditions
    Terms,
}

impl fmt::Display for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FieldId::Category => "category",
            FieldId::Vendor => "vendor",
            FieldId::Items => "items",
            FieldId::Address => "address",
            FieldId::ContactName => "contact_name",
            FieldId::ContactPhone => "contact_phone",
            FieldId::Date => "date",
            FieldId::Time => "time",
            FieldId::PaymentType => "payment_type",
            FieldId::Points => "points",
            FieldId::RemainderMethod => "remainder_method",
            FieldId::Terms => "terms",
        };

        f.write_str(name)
    }
}

/// A single failed field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    /// Field that failed
    pub field: FieldId,

    /// Message shown next to the field
    pub message: String,
}

/// Every field that blocks the current step.
#[derive(Debug, Clone, Default, PartialEq, Eq, Error)]
#[error("{} field(s) need attention", .0.len())]
pub struct ValidationErrors(SmallVec<[FieldError; 4]>);

impl ValidationErrors {
    /// No errors.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a failed field.
    pub fn push(&mut self, field: FieldId, message: impl Into<String>) {
        self.0.push(FieldError {
            field,
            message: message.into(),
        });
    }

    /// Record a failed field unless `condition` holds.
    pub fn require(&mut self, condition: bool, field: FieldId, message: &str) {
        if !condition {
            self.push(field, message);
        }
    }

    /// Append every error from `other`.
    pub fn extend(&mut self, other: ValidationErrors) {
        self.0.extend(other.0);
    }

    /// True when nothing failed.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of failed fields.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// The error recorded for `field`, if any.
    pub fn get(&self, field: FieldId) -> Option<&FieldError> {
        self.0.iter().find(|error| error.field == field)
    }

    /// True when `field` failed.
    pub fn contains(&self, field: FieldId) -> bool {
        self.get(field).is_some()
    }

    /// All errors.
    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.0.iter()
    }
}
