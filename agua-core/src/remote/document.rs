//! The Remote Shared Document.
//!
//! ```json
//! {
//!   "houses":   [ { "id": "A113", ... } ],
//!   "users":    [ ... ],
//!   "updatedAt": 1767225600000,
//!   "_versions": { "houses": 4, "users": 1 }
//! }
//! ```
//!
//! `updatedAt` changes on every write of any collection. `_versions` holds
//! one counter per collection and is the key of conditional writes.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::record::{next_stamp, Collection, Record};

use super::PutOutcome;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RemoteDocument {
    /// Document-wide timestamp (epoch milliseconds) of the last write.
    #[serde(rename = "updatedAt", default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<i64>,
    /// Per-collection version counters.
    #[serde(rename = "_versions", default, skip_serializing_if = "BTreeMap::is_empty")]
    pub versions: BTreeMap<String, u64>,
    /// Collection snapshots keyed by name.
    #[serde(flatten)]
    pub collections: BTreeMap<String, Collection>,
}

impl RemoteDocument {
    pub fn collection(&self, name: &str) -> Option<&Collection> {
        self.collections.get(name)
    }

    /// Version of a collection; 0 if it was never written.
    pub fn version_of(&self, name: &str) -> u64 {
        self.versions.get(name).copied().unwrap_or(0)
    }

    /// Sync cursor form of `updated_at`.
    pub fn stamp(&self) -> Option<String> {
        self.updated_at.map(|ts| ts.to_string())
    }

    /// Unconditionally replaces one collection, bumping its version and
    /// the document timestamp. Returns the new version.
    pub fn set_collection(&mut self, name: &str, records: Collection, now: i64) -> u64 {
        let version = self.version_of(name) + 1;
        self.collections.insert(name.to_string(), records);
        self.versions.insert(name.to_string(), version);
        self.updated_at = Some(next_stamp(now, self.updated_at));
        version
    }

    /// Replaces one collection only if its version still equals
    /// `expected_version`.
    pub fn put_collection_if(
        &mut self,
        name: &str,
        records: &[Record],
        expected_version: u64,
        now: i64,
    ) -> PutOutcome {
        let current_version = self.version_of(name);
        if current_version != expected_version {
            return PutOutcome::Conflict { current_version };
        }

        let version = self.set_collection(name, records.to_vec(), now);
        PutOutcome::Committed {
            version,
            // set_collection always stamps the document
            updated_at: self.updated_at.unwrap_or(now),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deserialize_shared_document() {
        let doc: RemoteDocument = serde_json::from_value(json!({
            "houses": [{"id": "A113", "ownerName": "Maria Santos"}],
            "users": [],
            "updatedAt": 1767225600000_i64,
        }))
        .unwrap();

        assert_eq!(doc.updated_at, Some(1767225600000));
        assert_eq!(doc.collection("houses").unwrap()[0].id(), Some("A113"));
        assert_eq!(doc.collection("users"), Some(&Vec::new()));
        assert_eq!(doc.version_of("houses"), 0);
    }

    #[test]
    fn test_serialize_omits_empty_metadata() {
        let doc = RemoteDocument::default();
        assert_eq!(serde_json::to_value(&doc).unwrap(), json!({}));
    }

    #[test]
    fn test_non_array_field_is_malformed() {
        let result = serde_json::from_value::<RemoteDocument>(json!({
            "houses": {"id": "A113"},
            "updatedAt": 1,
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_set_collection_bumps_version_and_stamp() {
        let mut doc = RemoteDocument::default();
        assert_eq!(doc.set_collection("houses", vec![Record::with_id("a")], 1000), 1);
        assert_eq!(doc.set_collection("houses", Vec::new(), 1000), 2);

        assert_eq!(doc.version_of("houses"), 2);
        assert_eq!(doc.version_of("users"), 0);
        assert_eq!(doc.updated_at, Some(1001));
        assert_eq!(doc.stamp().as_deref(), Some("1001"));
    }

    #[test]
    fn test_conditional_put_rejects_stale_version() {
        let mut doc = RemoteDocument::default();
        doc.set_collection("users", vec![Record::with_id("u1")], 10);

        let outcome = doc.put_collection_if("users", &[Record::with_id("u2")], 0, 20);
        assert_eq!(outcome, PutOutcome::Conflict { current_version: 1 });
        assert_eq!(doc.collection("users").unwrap()[0].id(), Some("u1"));
    }

    #[test]
    fn test_conditional_put_on_disjoint_collections() {
        let mut doc = RemoteDocument::default();
        doc.set_collection("houses", vec![Record::with_id("h1")], 10);

        let outcome = doc.put_collection_if("users", &[Record::with_id("u1")], 0, 20);
        assert_eq!(
            outcome,
            PutOutcome::Committed {
                version: 1,
                updated_at: 20
            }
        );
        assert_eq!(doc.version_of("houses"), 1);
        assert!(doc.collection("houses").is_some());
    }
}
