//! Collection commands: get, replace, upsert, remove.

use std::path::PathBuf;

use agua_core::{Collection, Record};
use clap::Args;
use uuid::Uuid;

use super::{describe_saved, print_collection, CommandError, Engine, OutputFormat};

/// Show a collection from the local cache
#[derive(Debug, Args)]
pub struct GetCommand {
    /// Collection name (e.g. houses, readings)
    pub collection: String,

    /// Output format
    #[arg(long, short, value_enum, default_value = "text")]
    pub format: OutputFormat,
}

impl GetCommand {
    pub fn run(&self, engine: &Engine) -> Result<(), CommandError> {
        let records = engine.get(&self.collection)?;
        print_collection(&self.collection, &records, self.format)
    }
}

/// Replace a whole collection with the records in a JSON file
#[derive(Debug, Args)]
pub struct ReplaceCommand {
    pub collection: String,

    /// File holding a JSON array of records
    pub file: PathBuf,
}

impl ReplaceCommand {
    pub async fn run(&self, engine: &Engine) -> Result<(), CommandError> {
        let contents = std::fs::read_to_string(&self.file)
            .map_err(|e| CommandError::Io(self.file.clone(), e))?;
        let records: Collection = serde_json::from_str(&contents)?;

        let saved = engine.replace_collection(&self.collection, records).await?;
        println!("{}", describe_saved(&self.collection, &saved));
        Ok(())
    }
}

/// Insert or update one record, matched by id
#[derive(Debug, Args)]
pub struct UpsertCommand {
    pub collection: String,

    /// Record as a JSON object; a new id is generated if it has none
    pub json: String,
}

impl UpsertCommand {
    pub async fn run(&self, engine: &Engine) -> Result<(), CommandError> {
        let record = parse_record(&self.json)?;
        let id = record.id().unwrap_or_default().to_string();

        let saved = engine.upsert_record(&self.collection, record).await?;
        println!("{}", describe_saved(&self.collection, &saved));
        println!("  id: {}", id);
        Ok(())
    }
}

/// Remove one record by id
#[derive(Debug, Args)]
pub struct RemoveCommand {
    pub collection: String,
    pub id: String,
}

impl RemoveCommand {
    pub async fn run(&self, engine: &Engine) -> Result<(), CommandError> {
        let saved = engine.remove(&self.collection, &self.id).await?;
        println!("{}", describe_saved(&self.collection, &saved));
        Ok(())
    }
}

/// Parses a record, assigning a fresh id when the input has none.
fn parse_record(json: &str) -> Result<Record, CommandError> {
    let value: serde_json::Value = serde_json::from_str(json)?;
    let mut record = Record::try_from(value)
        .map_err(|_| CommandError::InvalidJson("record must be a JSON object".to_string()))?;

    if record.id().is_none() {
        record.insert("id", Uuid::new_v4().to_string());
    }
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_record_keeps_id() {
        let record = parse_record(r#"{"id": "A113", "lastReading": 170}"#).unwrap();
        assert_eq!(record.id(), Some("A113"));
        assert_eq!(record.get("lastReading").unwrap(), 170);
    }

    #[test]
    fn test_parse_record_generates_id() {
        let record = parse_record(r#"{"location": "Rua das Flores"}"#).unwrap();
        let id = record.id().unwrap();
        assert!(Uuid::parse_str(id).is_ok());
    }

    #[test]
    fn test_parse_record_rejects_non_objects() {
        assert!(matches!(
            parse_record("[1, 2]"),
            Err(CommandError::InvalidJson(_))
        ));
        assert!(matches!(
            parse_record("{oops"),
            Err(CommandError::InvalidJson(_))
        ));
    }
}
