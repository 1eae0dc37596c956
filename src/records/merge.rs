//! Overlaying partial updates onto stored records.

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;

use crate::db::{Document, CREATED_AT_FIELD, ID_FIELD, UPDATED_AT_FIELD};

/// Merge `update` over `existing` and stamp the modification time.
///
/// Fields present in `update` win, every other field of `existing` is kept as is. The
/// identifier is never part of the result, so it cannot be rewritten through an update.
pub fn merge_update(existing: &Document, update: &Document, now: DateTime<Utc>) -> Document {
    let mut merged = existing.clone();
    for (field, value) in update {
        merged.insert(field.clone(), value.clone());
    }
    merged.remove(ID_FIELD);
    merged.insert(UPDATED_AT_FIELD.to_string(), timestamp(now));
    merged
}

/// Prepare a new record for insertion.
pub fn stamp_created(document: &mut Document, now: DateTime<Utc>) {
    document.remove(ID_FIELD);
    document.insert(CREATED_AT_FIELD.to_string(), timestamp(now));
}

pub fn timestamp(now: DateTime<Utc>) -> Value {
    Value::String(now.to_rfc3339_opts(SecondsFormat::Millis, true))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        value.as_object().unwrap().clone()
    }

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn test_merge_preserves_and_overlays() {
        let existing = doc(json!({
            "_id": "0b6b0bb8-6f43-4d53-b8a2-5d0d3a3f3f0e",
            "name": "Rahim",
            "roll": "12",
            "className": "9",
            "updatedAt": "2020-01-01T00:00:00.000Z"
        }));
        let update = doc(json!({"section": "B", "roll": "13"}));

        let merged = merge_update(&existing, &update, at(1_700_000_000));

        assert_eq!(merged["name"], "Rahim");
        assert_eq!(merged["className"], "9");
        assert_eq!(merged["roll"], "13");
        assert_eq!(merged["section"], "B");
        assert_eq!(merged["updatedAt"], "2023-11-14T22:13:20.000Z");
        assert!(!merged.contains_key("_id"));
    }

    #[test]
    fn test_merge_drops_identifier_from_update() {
        let existing = doc(json!({"_id": "a", "name": "x"}));
        let update = doc(json!({"_id": "b", "name": "y"}));
        let merged = merge_update(&existing, &update, at(0));
        assert!(!merged.contains_key("_id"));
        assert_eq!(merged["name"], "y");
    }

    #[test]
    fn test_fields_absent_from_both_stay_absent() {
        let existing = doc(json!({"name": "x"}));
        let merged = merge_update(&existing, &Document::new(), at(0));
        assert_eq!(merged.len(), 2);
        assert!(!merged.contains_key("section"));
    }

    #[test]
    fn test_stamp_created() {
        let mut record = doc(json!({"_id": "client-supplied", "name": "x"}));
        stamp_created(&mut record, at(0));
        assert!(!record.contains_key("_id"));
        assert_eq!(record["createdAt"], "1970-01-01T00:00:00.000Z");
    }
}
