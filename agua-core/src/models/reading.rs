use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Entity;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadingStatus {
    #[default]
    Pending,
    Validated,
}

/// A meter reading taken in the field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reading {
    pub id: String,
    pub house_id: String,
    pub previous_value: f64,
    pub current_value: f64,
    pub consumption: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
    #[serde(default)]
    pub status: ReadingStatus,
    pub date: String,
    pub reader_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<i64>,
}

impl Reading {
    /// New pending reading; consumption is the difference of the two
    /// meter values.
    pub fn new(
        house_id: impl Into<String>,
        previous_value: f64,
        current_value: f64,
        date: impl Into<String>,
        reader_id: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            house_id: house_id.into(),
            previous_value,
            current_value,
            consumption: current_value - previous_value,
            photo_url: None,
            status: ReadingStatus::Pending,
            date: date.into(),
            reader_id: reader_id.into(),
            updated_at: None,
        }
    }

    pub fn validate(&mut self) {
        self.status = ReadingStatus::Validated;
    }
}

impl Entity for Reading {
    const COLLECTION: &'static str = "readings";

    fn id(&self) -> &str {
        &self.id
    }

    fn seed() -> Vec<Self> {
        super::seed::readings()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_reading_computes_consumption() {
        let reading = Reading::new("A113", 150.0, 172.5, "2026-02-05", "u2");
        assert_eq!(reading.consumption, 22.5);
        assert_eq!(reading.status, ReadingStatus::Pending);
        assert!(Uuid::parse_str(&reading.id).is_ok());
    }
}
