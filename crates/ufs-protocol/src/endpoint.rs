use serde::{Deserialize, Serialize};
use ufs_types::{read_stored_timestamp, unreadable_timestamp, FileRecord, FileStat};

/// HTTP endpoint paths for the unary transport.
pub mod endpoints {
    /// Route pattern for `GET` stat.
    pub const STAT: &str = "/file/:uuid/stat/";
    /// Route pattern for `GET` read.
    pub const READ: &str = "/file/:uuid/read/";
    pub const FILES: &str = "/files/";
    pub const HEALTH: &str = "/health";

    pub fn stat_path(uuid: &str) -> String {
        format!("/file/{uuid}/stat/")
    }

    pub fn read_path(uuid: &str) -> String {
        format!("/file/{uuid}/read/")
    }
}

/// JSON body of a successful stat. `create_datetime` is the creation time
/// as stored.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatBody {
    pub name: String,
    pub size: u64,
    pub mimetype: String,
    pub create_datetime: String,
}

impl From<&FileStat> for StatBody {
    fn from(stat: &FileStat) -> Self {
        Self {
            name: stat.name.clone(),
            size: stat.size,
            mimetype: stat.mimetype.clone(),
            create_datetime: stat.created_text.clone(),
        }
    }
}

impl From<StatBody> for FileStat {
    fn from(body: StatBody) -> Self {
        Self {
            name: body.name,
            size: body.size,
            mimetype: body.mimetype,
            created_at: read_stored_timestamp(&body.create_datetime)
                .map(|(at, _)| at)
                .unwrap_or_else(|_| unreadable_timestamp()),
            created_text: body.create_datetime,
        }
    }
}

/// JSON body of every unary-transport error response.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Health check response.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub protocol_version: u32,
    pub files_count: usize,
}

impl HealthResponse {
    pub fn ok(files_count: usize) -> Self {
        Self {
            status: "healthy".into(),
            version: env!("CARGO_PKG_VERSION").into(),
            protocol_version: super::message::PROTOCOL_VERSION,
            files_count,
        }
    }
}

/// One row of the `/files/` listing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListedFile {
    pub uuid: String,
    pub name: String,
    pub size: u64,
    pub mimetype: String,
    pub created: String,
}

/// Body of the `/files/` listing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileListing {
    pub files: Vec<ListedFile>,
    pub total_files: usize,
}

impl FileListing {
    pub fn from_records(records: &[FileRecord]) -> Self {
        let files: Vec<ListedFile> = records
            .iter()
            .map(|r| ListedFile {
                uuid: r.id.to_string(),
                name: r.name.clone(),
                size: r.size,
                mimetype: r.mimetype.clone(),
                created: r.created_text.clone(),
            })
            .collect();
        Self { total_files: files.len(), files }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use ufs_types::FileId;

    #[test]
    fn endpoint_paths() {
        assert_eq!(endpoints::HEALTH, "/health");
        assert_eq!(
            endpoints::stat_path("123e4567-e89b-12d3-a456-426614174000"),
            "/file/123e4567-e89b-12d3-a456-426614174000/stat/"
        );
        assert_eq!(endpoints::read_path("x"), "/file/x/read/");
    }

    #[test]
    fn stat_body_json_shape() {
        let stat = FileStat {
            name: "test.txt".into(),
            size: 13,
            mimetype: "text/plain".into(),
            created_at: Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap(),
            created_text: "2024-01-15T10:30:00Z".into(),
        };
        let json = serde_json::to_value(StatBody::from(&stat)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "name": "test.txt",
                "size": 13,
                "mimetype": "text/plain",
                "create_datetime": "2024-01-15T10:30:00Z",
            })
        );
        let back: StatBody = serde_json::from_value(json).unwrap();
        assert_eq!(FileStat::from(back), stat);
    }

    #[test]
    fn unreadable_create_datetime_is_passed_through() {
        let body = StatBody {
            name: "legacy.txt".into(),
            size: 4,
            mimetype: "text/plain".into(),
            create_datetime: "last tuesday".into(),
        };
        let stat = FileStat::from(body);
        assert_eq!(stat.created_text, "last tuesday");
        assert_eq!(stat.created_at, unreadable_timestamp());
    }

    #[test]
    fn health_defaults() {
        let h = HealthResponse::ok(3);
        assert_eq!(h.status, "healthy");
        assert_eq!(h.protocol_version, 1);
        assert_eq!(h.files_count, 3);
    }

    #[test]
    fn listing_counts_files() {
        let rec = FileRecord::new(
            FileId::new_v4(),
            "a.txt",
            1,
            None,
            Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap(),
            "a.txt",
        );
        let listing = FileListing::from_records(&[rec.clone()]);
        assert_eq!(listing.total_files, 1);
        assert_eq!(listing.files[0].uuid, rec.id.to_string());
        assert_eq!(listing.files[0].mimetype, "application/octet-stream");
    }
}
