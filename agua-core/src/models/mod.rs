//! Domain models stored in the shared collections.
//!
//! Field names serialize in camelCase so records written by any device
//! (or by the web client) deserialize the same way.

mod house;
mod invoice;
mod leak;
mod reading;
pub mod seed;
mod user;

use serde::de::DeserializeOwned;
use serde::ser::Error as _;
use serde::{Deserialize, Serialize};

use crate::record::Record;

pub use house::House;
pub use invoice::{Invoice, InvoiceStatus};
pub use leak::{Leak, LeakSeverity, LeakStatus, LeakType};
pub use reading::{Reading, ReadingStatus};
pub use user::{User, UserRole};

/// A typed record living in a named collection.
pub trait Entity: Serialize + DeserializeOwned {
    /// Collection holding this entity.
    const COLLECTION: &'static str;

    fn id(&self) -> &str;

    /// Default contents used the first time the collection is read.
    fn seed() -> Vec<Self> {
        Vec::new()
    }
}

/// Active/inactive flag shared by houses and users.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActiveStatus {
    #[default]
    Active,
    Inactive,
}

pub fn to_record<E: Entity>(entity: &E) -> Result<Record, serde_json::Error> {
    let value = serde_json::to_value(entity)?;
    Record::try_from(value)
        .map_err(|_| serde_json::Error::custom(format!("{} is not an object", E::COLLECTION)))
}

pub fn from_record<E: Entity>(record: Record) -> Result<E, serde_json::Error> {
    serde_json::from_value(record.into_value())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collection_names_are_valid() {
        let names = [
            House::COLLECTION,
            User::COLLECTION,
            Reading::COLLECTION,
            Invoice::COLLECTION,
            Leak::COLLECTION,
        ];
        assert_eq!(names, ["houses", "users", "readings", "invoices", "leaks"]);
        for name in names {
            assert!(crate::record::validate_collection_name(name).is_ok());
        }
    }

    #[test]
    fn test_entity_record_conversion() {
        let house = House::new("A200", "Ana Mucavele", "840001111", "CNT-200");
        let record = to_record(&house).unwrap();

        assert_eq!(record.id(), Some("A200"));
        assert_eq!(record.get("ownerName").unwrap(), "Ana Mucavele");
        assert!(record.get("secondaryPhone").is_none());

        let back: House = from_record(record).unwrap();
        assert_eq!(back, house);
    }

    #[test]
    fn test_from_record_ignores_unknown_fields() {
        let record = Record::with_id("u9")
            .field("name", "Rosa")
            .field("email", "rosa@example.com")
            .field("phoneNumber", "840009999")
            .field("role", "LEITOR")
            .field("status", "active")
            .field("shiftNotes", "north route");

        let user: User = from_record(record).unwrap();
        assert_eq!(user.role, UserRole::Reader);
    }
}
