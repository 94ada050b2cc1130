//! Reconciliation of local state against a remote snapshot.
//!
//! There is no operation log and no merge. The remote snapshot either
//! replaces the whole store or is ignored.
//!
//! # Algorithm
//!
//! 1. Nothing newer reported, or an empty payload: keep local state
//! 2. Payload does not parse, or lacks a required field: discard it
//! 3. Parsed version is not strictly above the local one: keep local state
//! 4. Otherwise: replace lists, items and version wholesale

use crate::{SnapshotMetadata, StoreSnapshot, SyncPayload, Timestamp};
use serde::{Deserialize, Serialize};

/// What a reconciliation did to the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "outcome")]
pub enum ReconcileOutcome {
    /// Remote has nothing newer; store untouched
    UpToDate,
    /// Another reconciliation was already running; nothing was fetched
    Skipped,
    /// Remote payload was corrupt and ignored
    Discarded { reason: String },
    /// Remote snapshot was not newer than local state (a local edit raced
    /// the fetch); store untouched
    Stale { remote: Timestamp, local: Timestamp },
    /// Store was replaced by the remote snapshot
    Replaced {
        previous: Timestamp,
        current: SnapshotMetadata,
    },
}

impl ReconcileOutcome {
    /// Whether the store contents changed.
    pub fn is_replaced(&self) -> bool {
        matches!(self, ReconcileOutcome::Replaced { .. })
    }
}

/// Decision reached for a payload, before it is applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Leave the store as it is
    Keep(ReconcileOutcome),
    /// Replace the store with this snapshot
    Replace(StoreSnapshot),
}

/// Decide what to do with `payload` given the local version clock.
pub fn evaluate(local_version: Timestamp, payload: &SyncPayload) -> Verdict {
    if !payload.has_data() {
        return Verdict::Keep(ReconcileOutcome::UpToDate);
    }

    let snapshot = match StoreSnapshot::from_json(&payload.data) {
        Ok(snapshot) => snapshot,
        Err(e) => {
            return Verdict::Keep(ReconcileOutcome::Discarded {
                reason: e.to_string(),
            })
        }
    };

    if snapshot.last_update <= local_version {
        return Verdict::Keep(ReconcileOutcome::Stale {
            remote: snapshot.last_update,
            local: local_version,
        });
    }

    Verdict::Replace(snapshot)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(json: &str) -> SyncPayload {
        SyncPayload::newer(json)
    }

    #[test]
    fn not_newer_keeps_state() {
        let verdict = evaluate(10, &SyncPayload::none());
        assert_eq!(verdict, Verdict::Keep(ReconcileOutcome::UpToDate));
    }

    #[test]
    fn newer_flag_with_empty_data_keeps_state() {
        let verdict = evaluate(10, &SyncPayload::newer(""));
        assert_eq!(verdict, Verdict::Keep(ReconcileOutcome::UpToDate));
    }

    #[test]
    fn data_without_newer_flag_is_ignored() {
        let p = SyncPayload {
            data: r#"{"todoLists":[],"todoItems":[],"lastUpdate":99}"#.into(),
            is_newer: false,
        };
        assert_eq!(evaluate(10, &p), Verdict::Keep(ReconcileOutcome::UpToDate));
    }

    #[test]
    fn corrupt_payload_is_discarded() {
        let verdict = evaluate(10, &payload(r#"{"todoLists":[],"lastUpdate":99}"#));
        assert!(matches!(
            verdict,
            Verdict::Keep(ReconcileOutcome::Discarded { .. })
        ));
    }

    #[test]
    fn older_snapshot_is_stale() {
        let verdict = evaluate(
            100,
            &payload(r#"{"todoLists":[],"todoItems":[],"lastUpdate":100}"#),
        );
        assert_eq!(
            verdict,
            Verdict::Keep(ReconcileOutcome::Stale {
                remote: 100,
                local: 100
            })
        );
    }

    #[test]
    fn newer_snapshot_replaces() {
        let verdict = evaluate(
            0,
            &payload(r#"{"todoLists":[],"todoItems":[],"lastUpdate":654321}"#),
        );
        match verdict {
            Verdict::Replace(snapshot) => assert_eq!(snapshot.last_update, 654321),
            other => panic!("expected replace, got {:?}", other),
        }
    }

    #[test]
    fn outcome_serialization_is_tagged() {
        let json = serde_json::to_string(&ReconcileOutcome::UpToDate).unwrap();
        assert_eq!(json, r#"{"outcome":"upToDate"}"#);
    }
}
