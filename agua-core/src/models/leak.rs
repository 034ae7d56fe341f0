use serde::{Deserialize, Serialize};

use super::Entity;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeakType {
    Residential,
    Public,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeakSeverity {
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeakStatus {
    #[default]
    Reported,
    Assigned,
    InProgress,
    Resolved,
}

/// A leak report from a client or staff member.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Leak {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub house_id: Option<String>,
    pub reporter_id: String,
    #[serde(rename = "type")]
    pub leak_type: LeakType,
    pub location: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    pub description: String,
    pub severity: LeakSeverity,
    #[serde(default)]
    pub photos: Vec<String>,
    #[serde(default)]
    pub status: LeakStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub technician_id: Option<String>,
    pub reported_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<i64>,
}

impl Leak {
    /// Hands the leak to a technician.
    pub fn assign(&mut self, technician_id: impl Into<String>) {
        self.technician_id = Some(technician_id.into());
        self.status = LeakStatus::Assigned;
    }
}

impl Entity for Leak {
    const COLLECTION: &'static str = "leaks";

    fn id(&self) -> &str {
        &self.id
    }

    fn seed() -> Vec<Self> {
        super::seed::leaks()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_leak_wire_names() {
        let mut leak = super::super::seed::leaks().remove(0);
        leak.assign("u3");

        let value = serde_json::to_value(&leak).unwrap();
        assert_eq!(value["type"], "public");
        assert_eq!(value["status"], "assigned");
        assert_eq!(value["technicianId"], "u3");

        leak.status = LeakStatus::InProgress;
        let value = serde_json::to_value(&leak).unwrap();
        assert_eq!(value["status"], "in_progress");
    }
}
