//! Conflict detection between a stale local record and the authoritative
//! remote snapshot.

use chrono::{DateTime, Utc};

use fieldscope_api::Record;

/// A genuine concurrent-edit conflict on a record.
///
/// `conflicted_fields` is always non-empty: a rejected write whose contended
/// fields carry identical values on both sides is a stale cache, not a
/// conflict, and never produces a `ConflictInfo`.
#[derive(Debug, Clone)]
pub struct ConflictInfo {
    pub record_id: String,
    /// The snapshot the client held before the write attempt.
    pub local: Record,
    /// The authoritative snapshot the backend returned.
    pub remote: Record,
    /// Contended field names whose values actually differ, sorted.
    pub conflicted_fields: Vec<String>,
    /// Actor who made the remote change, when the backend reports it.
    pub remote_actor: Option<String>,
    pub remote_at: Option<DateTime<Utc>>,
}

/// What a rejected write turned out to be.
#[derive(Debug, Clone)]
pub enum Detection {
    /// Contended fields genuinely diverge; user mediation required.
    Genuine(ConflictInfo),
    /// The local copy was merely stale: every contended field already holds
    /// the remote value. Safe to accept `remote` without asking anyone.
    StaleCache { remote: Record },
}

pub struct ConflictDetector;

impl ConflictDetector {
    /// Diff `local` against `remote`, restricted to the fields the rejected
    /// operation actually contended. Fields the operation never touched are
    /// not reported even when they differ.
    pub fn inspect(local: &Record, remote: &Record, contended: &[String]) -> Detection {
        let mut conflicted_fields: Vec<String> = contended
            .iter()
            .filter(|field| local.get(field) != remote.get(field))
            .cloned()
            .collect();
        conflicted_fields.sort();

        if conflicted_fields.is_empty() {
            return Detection::StaleCache {
                remote: remote.clone(),
            };
        }

        Detection::Genuine(ConflictInfo {
            record_id: remote.id.clone(),
            local: local.clone(),
            remote: remote.clone(),
            conflicted_fields,
            remote_actor: remote.updated_by.clone(),
            remote_at: remote.updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fieldscope_api::Value;

    fn local() -> Record {
        Record::new("si-1")
            .with_field("status", "pending")
            .with_field("priority", 2i64)
            .with_field("assigned_to", "dana")
            .with_version(4)
    }

    #[test]
    fn test_untouched_fields_never_reported() {
        // Remote differs on both status and assigned_to, but the operation
        // only contended status.
        let remote = Record::new("si-1")
            .with_field("status", "blocked")
            .with_field("priority", 2i64)
            .with_field("assigned_to", "marco")
            .with_version(5);

        match ConflictDetector::inspect(&local(), &remote, &["status".to_string()]) {
            Detection::Genuine(info) => {
                assert_eq!(info.conflicted_fields, vec!["status"]);
            }
            other => panic!("expected genuine conflict, got {:?}", other),
        }
    }

    #[test]
    fn test_equal_contended_values_is_stale_cache() {
        // Version moved (another actor touched an unrelated field) but the
        // contended field holds the same value on both sides.
        let remote = Record::new("si-1")
            .with_field("status", "pending")
            .with_field("priority", 2i64)
            .with_field("assigned_to", "marco")
            .with_version(5);

        match ConflictDetector::inspect(&local(), &remote, &["status".to_string()]) {
            Detection::StaleCache { remote } => assert_eq!(remote.version, 5),
            other => panic!("expected stale cache, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_local_field_counts_as_difference() {
        let remote = Record::new("si-1")
            .with_field("status", "pending")
            .with_field("unit_cost", Value::Float(12.5))
            .with_version(5);

        match ConflictDetector::inspect(&local(), &remote, &["unit_cost".to_string()]) {
            Detection::Genuine(info) => {
                assert_eq!(info.conflicted_fields, vec!["unit_cost"]);
            }
            other => panic!("expected genuine conflict, got {:?}", other),
        }
    }

    #[test]
    fn test_conflicted_fields_are_sorted() {
        let remote = Record::new("si-1")
            .with_field("status", "blocked")
            .with_field("priority", 3i64)
            .with_field("assigned_to", "marco")
            .with_version(5);

        let contended = vec![
            "status".to_string(),
            "assigned_to".to_string(),
            "priority".to_string(),
        ];
        match ConflictDetector::inspect(&local(), &remote, &contended) {
            Detection::Genuine(info) => {
                assert_eq!(
                    info.conflicted_fields,
                    vec!["assigned_to", "priority", "status"]
                );
                assert_eq!(info.remote_actor, None);
            }
            other => panic!("expected genuine conflict, got {:?}", other),
        }
    }
}
