//! Local mutations and the outbound queue entries that carry them.

use serde::{Deserialize, Serialize};

use crate::record::{Collection, Record};

/// One change to a collection, replayable against any base copy.
///
/// Applying a mutation twice gives the same result as applying it once,
/// so a queued write can be re-merged onto a fresher remote copy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum Mutation {
    /// Replace the entire collection.
    Replace { records: Collection },
    /// Merge a record (already stamped) into the collection by id.
    Upsert { record: Record },
    /// Drop the record with this id.
    Remove { id: String },
}

impl Mutation {
    pub fn apply(&self, mut base: Collection) -> Collection {
        match self {
            Mutation::Replace { records } => records.clone(),
            Mutation::Upsert { record } => {
                let existing = base
                    .iter_mut()
                    .find(|r| r.id().is_some() && r.id() == record.id());
                match existing {
                    Some(current) => current.merge(record),
                    None => base.push(record.clone()),
                }
                base
            }
            Mutation::Remove { id } => {
                base.retain(|r| r.id() != Some(id.as_str()));
                base
            }
        }
    }
}

/// A mutation not yet acknowledged by the remote.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingWrite {
    pub collection: String,
    pub mutation: Mutation,
}
