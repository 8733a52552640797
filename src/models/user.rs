//! User profile model (owned by the auth/profile layer, read here for context).

use serde::{Deserialize, Serialize};

/// Postal address.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    #[serde(default)]
    pub street: Option<String>,
    pub city: String,
    pub state: String,
    #[serde(alias = "zip_code")]
    pub zip_code: String,
    #[serde(default = "default_country")]
    pub country: String,
}

fn default_country() -> String {
    "India".to_string()
}

/// Geolocated position shared by the user's device.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
    pub city: String,
    pub state: String,
}

/// User profile stored in the `users` collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "UserDocument")]
pub struct User {
    /// Document ID (also the JWT subject)
    pub id: String,
    pub email: String,
    pub name: String,
    pub contact_number: Option<String>,
    pub emergency_contact: Option<String>,
    pub address: Option<Address>,
    pub location: Option<Location>,
}

/// Stored shape of a user document.
///
/// Registration writes the camelCase keys and profile updates write the
/// snake_case ones, so one document can carry both.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserDocument {
    id: String,
    email: String,
    name: String,
    #[serde(default)]
    contact_number: Option<String>,
    #[serde(default, rename = "contact_number")]
    updated_contact_number: Option<String>,
    #[serde(default)]
    emergency_contact: Option<String>,
    #[serde(default, rename = "emergency_contact")]
    updated_emergency_contact: Option<String>,
    #[serde(default)]
    address: Option<Address>,
    #[serde(default)]
    location: Option<Location>,
}

impl From<UserDocument> for User {
    fn from(doc: UserDocument) -> Self {
        Self {
            id: doc.id,
            email: doc.email,
            name: doc.name,
            contact_number: doc.updated_contact_number.or(doc.contact_number),
            emergency_contact: doc.updated_emergency_contact.or(doc.emergency_contact),
            address: doc.address,
            location: doc.location,
        }
    }
}

/// Owner location as used for seasonal/climate context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnerLocation {
    pub city: String,
    pub state: String,
    pub pincode: Option<String>,
}

impl OwnerLocation {
    /// Human-readable place name, e.g. "Pune, Maharashtra" or "PIN code 411001".
    pub fn display_name(&self) -> String {
        match (&self.pincode, self.city.is_empty()) {
            (Some(pin), true) => format!("PIN code {}", pin),
            _ => format!("{}, {}", self.city, self.state),
        }
    }
}

impl User {
    /// Resolve the owner's location, preferring the postal address over
    /// the device location.
    pub fn owner_location(&self) -> Option<OwnerLocation> {
        if let Some(address) = &self.address {
            return Some(OwnerLocation {
                city: address.city.clone(),
                state: address.state.clone(),
                pincode: Some(address.zip_code.clone()).filter(|p| !p.trim().is_empty()),
            });
        }
        self.location.as_ref().map(|loc| OwnerLocation {
            city: loc.city.clone(),
            state: loc.state.clone(),
            pincode: None,
        })
    }

    /// Whether any usable location (city or PIN code) is on file.
    pub fn has_location_data(&self) -> bool {
        self.owner_location()
            .map(|loc| !loc.city.trim().is_empty() || loc.pincode.is_some())
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user_from(value: serde_json::Value) -> User {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_address_preferred_over_location() {
        let user = user_from(serde_json::json!({
            "id": "u1",
            "email": "owner@example.com",
            "name": "Owner",
            "contact_number": "+911234567890",
            "address": {"city": "Pune", "state": "Maharashtra", "zip_code": "411001"},
            "location": {"latitude": 19.0, "longitude": 72.8, "city": "Mumbai", "state": "Maharashtra"}
        }));

        assert_eq!(user.contact_number.as_deref(), Some("+911234567890"));
        let loc = user.owner_location().unwrap();
        assert_eq!(loc.city, "Pune");
        assert_eq!(loc.pincode.as_deref(), Some("411001"));
        assert!(user.has_location_data());
    }

    #[test]
    fn test_no_location() {
        let user = user_from(serde_json::json!({
            "id": "u2",
            "email": "owner@example.com",
            "name": "Owner",
            "contactNumber": "+911234567890"
        }));

        assert_eq!(user.contact_number.as_deref(), Some("+911234567890"));
        assert!(user.owner_location().is_none());
        assert!(!user.has_location_data());
    }

    #[test]
    fn test_registration_and_profile_keys_together() {
        let user = user_from(serde_json::json!({
            "id": "u3",
            "email": "owner@example.com",
            "name": "Owner",
            "contactNumber": "+910000000001",
            "contact_number": "+910000000002",
            "emergencyContact": "+910000000003",
            "emergency_contact": "+910000000004"
        }));

        assert_eq!(user.contact_number.as_deref(), Some("+910000000002"));
        assert_eq!(user.emergency_contact.as_deref(), Some("+910000000004"));

        let user = user_from(serde_json::json!({
            "id": "u4",
            "email": "owner@example.com",
            "name": "Owner",
            "emergencyContact": "+910000000003",
            "emergency_contact": null
        }));
        assert_eq!(user.emergency_contact.as_deref(), Some("+910000000003"));
        assert!(user.contact_number.is_none());
    }

    #[test]
    fn test_serializes_camel_case() {
        let user = user_from(serde_json::json!({
            "id": "u5",
            "email": "owner@example.com",
            "name": "Owner",
            "contact_number": "+910000000002"
        }));
        let value = serde_json::to_value(&user).unwrap();
        assert_eq!(value["contactNumber"], "+910000000002");
        assert!(value.get("contact_number").is_none());
    }

    #[test]
    fn test_display_name() {
        let loc = OwnerLocation {
            city: String::new(),
            state: String::new(),
            pincode: Some("400001".to_string()),
        };
        assert_eq!(loc.display_name(), "PIN code 400001");
    }
}
