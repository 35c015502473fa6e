//! Contact details.

use serde::Deserialize;

/// Profile of the signed-in customer, used to pre-fill contact details.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CustomerProfile {
    /// Full name
    #[serde(default)]
    pub name: String,

    /// Phone number
    #[serde(default)]
    pub phone: String,

    /// Saved service address
    #[serde(default)]
    pub address: Option<String>,

    /// Loyalty points balance
    #[serde(default)]
    pub points_balance: u64,
}

/// Where and whom the technician should contact.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactDetails {
    /// Service address
    pub address: String,

    /// Contact name
    pub name: String,

    /// Contact phone number
    pub phone: String,

    /// Notes for the technician
    pub notes: String,
}

impl ContactDetails {
    /// Fill empty fields from `profile`. Fields the customer already typed
    /// are left alone.
    pub fn prefill(&mut self, profile: &CustomerProfile) {
        fill(&mut self.name, &profile.name);
        fill(&mut self.phone, &profile.phone);

        if let Some(address) = &profile.address {
            fill(&mut self.address, address);
        }
    }
}

fn fill(field: &mut String, value: &str) {
    if field.trim().is_empty() && !value.trim().is_empty() {
        value.trim().clone_into(field);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile() -> CustomerProfile {
        CustomerProfile {
            name: "Sara Ali".to_string(),
            phone: "+966500000000".to_string(),
            address: Some("King Fahd Rd, Riyadh".to_string()),
            points_balance: 0,
        }
    }

    #[test]
    fn prefill_fills_only_empty_fields() {
        let mut contact = ContactDetails {
            phone: "+966511111111".to_string(),
            ..ContactDetails::default()
        };

        contact.prefill(&profile());

        assert_eq!(contact.name, "Sara Ali");
        assert_eq!(contact.phone, "+966511111111");
        assert_eq!(contact.address, "King Fahd Rd, Riyadh");
    }

    #[test]
    fn profile_decodes_without_optional_fields() -> testresult::TestResult {
        let profile: CustomerProfile = serde_json::from_str(r#"{"name": "Sara"}"#)?;

        assert_eq!(profile.address, None);
        assert_eq!(profile.points_balance, 0);

        Ok(())
    }
}
