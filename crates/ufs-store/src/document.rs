use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;
use ufs_types::{read_stored_timestamp, unreadable_timestamp, FileId, FileRecord, TypeError};

use crate::error::{StoreError, StoreResult};

/// One value of the persisted metadata document.
///
/// ```json
/// {
///   "123e4567-e89b-12d3-a456-426614174000": {
///     "name": "test.txt",
///     "size": 13,
///     "mimetype": "text/plain",
///     "create_datetime": "2024-01-15T10:30:00Z",
///     "file_path": "/srv/files/123e4567-e89b-12d3-a456-426614174000.txt"
///   }
/// }
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentEntry {
    pub name: String,
    pub size: u64,
    #[serde(default)]
    pub mimetype: Option<String>,
    pub create_datetime: String,
    pub file_path: String,
}

impl DocumentEntry {
    pub fn from_record(record: &FileRecord) -> Self {
        Self {
            name: record.name.clone(),
            size: record.size,
            mimetype: Some(record.mimetype.clone()),
            create_datetime: record.created_text.clone(),
            file_path: record.storage_path.clone(),
        }
    }

    /// Only the key can make an entry unusable. A creation time that does
    /// not parse is kept as text for display and sorts as the Unix epoch.
    pub fn into_record(self, key: &str) -> Result<FileRecord, TypeError> {
        let id = FileId::parse(key)?;
        let (created_at, created_text) = match read_stored_timestamp(&self.create_datetime) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!(key = %key, error = %e, "keeping entry with unreadable create_datetime");
                (unreadable_timestamp(), self.create_datetime)
            }
        };
        let record = FileRecord::new(
            id,
            self.name,
            self.size,
            self.mimetype.as_deref(),
            created_at,
            self.file_path,
        );
        Ok(record.with_created_text(created_text))
    }
}

/// The whole persisted document, keyed by UUID string.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MetadataDocument {
    pub entries: BTreeMap<String, DocumentEntry>,
}

impl MetadataDocument {
    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a FileRecord>) -> Self {
        let entries = records
            .into_iter()
            .map(|r| (r.id.to_string(), DocumentEntry::from_record(r)))
            .collect();
        Self { entries }
    }

    /// Decode a document, skipping entries that cannot be turned into records.
    ///
    /// Only a document that is not a JSON object at all is an error.
    pub fn decode_records(bytes: &[u8]) -> StoreResult<BTreeMap<FileId, FileRecord>> {
        let raw: BTreeMap<String, Value> = serde_json::from_slice(bytes)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        let mut records = BTreeMap::new();
        for (key, value) in raw {
            let entry: DocumentEntry = match serde_json::from_value(value) {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(key = %key, error = %e, "skipping malformed metadata entry");
                    continue;
                }
            };
            match entry.into_record(&key) {
                Ok(record) => {
                    records.insert(record.id, record);
                }
                Err(e) => warn!(key = %key, error = %e, "skipping invalid metadata entry"),
            }
        }
        Ok(records)
    }

    pub fn to_json(&self) -> StoreResult<Vec<u8>> {
        serde_json::to_vec_pretty(self).map_err(|e| StoreError::Serialization(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use ufs_types::DEFAULT_MIMETYPE;

    const ID: &str = "123e4567-e89b-12d3-a456-426614174000";

    #[test]
    fn decodes_stored_document_format() {
        let json = format!(
            r#"{{"{ID}": {{"name": "test.txt", "size": 13, "mimetype": "text/plain",
                "create_datetime": "2024-01-15T10:30:00Z", "file_path": "files/test.txt"}}}}"#
        );
        let records = MetadataDocument::decode_records(json.as_bytes()).unwrap();
        let rec = &records[&FileId::parse(ID).unwrap()];
        assert_eq!(rec.name, "test.txt");
        assert_eq!(rec.size, 13);
        assert_eq!(rec.mimetype, "text/plain");
        assert_eq!(rec.created_at, Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap());
        assert_eq!(rec.storage_path, "files/test.txt");
    }

    #[test]
    fn stored_timestamp_text_is_kept() {
        let json = format!(
            r#"{{"{ID}": {{"name": "a", "size": 1,
                "create_datetime": "2024-01-15T10:30:00.000+00:00", "file_path": "a"}}}}"#
        );
        let records = MetadataDocument::decode_records(json.as_bytes()).unwrap();
        let rec = records.values().next().unwrap();
        assert_eq!(rec.created_text, "2024-01-15T10:30:00.000+00:00");
        assert_eq!(rec.created_at, Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap());
        let doc = MetadataDocument::from_records([rec]);
        assert_eq!(doc.entries[ID].create_datetime, "2024-01-15T10:30:00.000+00:00");
    }

    #[test]
    fn unreadable_timestamp_keeps_entry() {
        let json = format!(
            r#"{{"{ID}": {{"name": "legacy.txt", "size": 4, "mimetype": "text/plain",
                "create_datetime": "last tuesday", "file_path": "legacy.txt"}}}}"#
        );
        let records = MetadataDocument::decode_records(json.as_bytes()).unwrap();
        let rec = &records[&FileId::parse(ID).unwrap()];
        assert_eq!(rec.name, "legacy.txt");
        assert_eq!(rec.created_text, "last tuesday");
        assert_eq!(rec.created_at.timestamp(), 0);
    }

    #[test]
    fn missing_and_null_mimetype_default() {
        let json = format!(
            r#"{{"{ID}": {{"name": "a", "size": 1, "mimetype": null,
                "create_datetime": "2024-01-15T10:30:00Z", "file_path": "a"}}}}"#
        );
        let records = MetadataDocument::decode_records(json.as_bytes()).unwrap();
        assert_eq!(records.values().next().unwrap().mimetype, DEFAULT_MIMETYPE);
    }

    #[test]
    fn bad_entries_are_skipped() {
        let json = format!(
            r#"{{
                "not-a-uuid": {{"name": "a", "size": 1, "create_datetime": "2024-01-15T10:30:00Z", "file_path": "a"}},
                "{ID}": {{"name": "b", "size": "big"}}
            }}"#
        );
        let records = MetadataDocument::decode_records(json.as_bytes()).unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn non_object_is_error() {
        assert!(matches!(
            MetadataDocument::decode_records(b"[1, 2, 3]"),
            Err(StoreError::Serialization(_))
        ));
    }

    #[test]
    fn encoded_keys_are_uuid_strings() {
        let rec = FileRecord::new(
            FileId::parse(ID).unwrap(),
            "test.txt",
            13,
            Some("text/plain"),
            Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap(),
            "files/test.txt",
        );
        let doc = MetadataDocument::from_records([&rec]);
        let value: Value = serde_json::from_slice(&doc.to_json().unwrap()).unwrap();
        assert_eq!(value[ID]["create_datetime"], "2024-01-15T10:30:00Z");
        assert_eq!(value[ID]["file_path"], "files/test.txt");
        assert_eq!(value[ID]["mimetype"], "text/plain");
    }
}
