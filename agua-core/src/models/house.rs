use serde::{Deserialize, Serialize};
use std::fmt;

use super::{ActiveStatus, Entity};

/// A metered connection, identified by its customer code (e.g. `A113`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct House {
    pub id: String,
    pub owner_name: String,
    pub phone_number: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary_phone: Option<String>,
    #[serde(default)]
    pub reference: String,
    pub meter_id: String,
    #[serde(default)]
    pub status: ActiveStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_reading: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_reading_date: Option<String>,
    /// Client self-service password, stored as entered.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<i64>,
}

impl House {
    pub fn new(
        id: impl Into<String>,
        owner_name: impl Into<String>,
        phone_number: impl Into<String>,
        meter_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            owner_name: owner_name.into(),
            phone_number: phone_number.into(),
            secondary_phone: None,
            reference: String::new(),
            meter_id: meter_id.into(),
            status: ActiveStatus::Active,
            last_reading: None,
            last_reading_date: None,
            password: None,
            updated_at: None,
        }
    }

    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = reference.into();
        self
    }

    /// Records a new meter value read on `date`.
    pub fn with_last_reading(mut self, value: f64, date: impl Into<String>) -> Self {
        self.last_reading = Some(value);
        self.last_reading_date = Some(date.into());
        self
    }
}

impl Entity for House {
    const COLLECTION: &'static str = "houses";

    fn id(&self) -> &str {
        &self.id
    }

    fn seed() -> Vec<Self> {
        super::seed::houses()
    }
}

impl fmt::Display for House {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} (meter {})", self.id, self.owner_name, self.meter_id)?;
        if let Some(value) = self.last_reading {
            write!(f, " last reading {}", value)?;
        }
        Ok(())
    }
}
