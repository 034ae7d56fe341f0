use serde::{Deserialize, Serialize};

use super::Entity;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceStatus {
    Paid,
    #[default]
    Pending,
    Overdue,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    pub id: String,
    pub house_id: String,
    pub reading_id: String,
    pub invoice_number: String,
    pub month: String,
    pub year: i32,
    pub amount: f64,
    pub taxes: f64,
    pub total: f64,
    #[serde(default)]
    pub status: InvoiceStatus,
    pub due_date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pdf_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<i64>,
}

impl Entity for Invoice {
    const COLLECTION: &'static str = "invoices";

    fn id(&self) -> &str {
        &self.id
    }

    fn seed() -> Vec<Self> {
        super::seed::invoices()
    }
}
