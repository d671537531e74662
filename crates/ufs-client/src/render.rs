use std::borrow::Cow;

use ufs_types::{format_timestamp, FileStat};

/// The four-line stat rendering, newline-terminated.
///
/// `Created` shows the creation time as the server stored it, so both
/// transports render the same text.
pub fn render_stat(stat: &FileStat) -> String {
    format!(
        "Name: {}\nSize: {} bytes\nMIME Type: {}\nCreated: {}\n",
        stat.name,
        stat.size,
        stat.mimetype,
        created(stat)
    )
}

fn created(stat: &FileStat) -> Cow<'_, str> {
    if stat.created_text.is_empty() {
        Cow::Owned(format_timestamp(&stat.created_at))
    } else {
        Cow::Borrowed(&stat.created_text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn stat(created_text: &str) -> FileStat {
        FileStat {
            name: "test.txt".into(),
            size: 13,
            mimetype: "text/plain".into(),
            created_at: Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap()
                + chrono::Duration::milliseconds(250),
            created_text: created_text.into(),
        }
    }

    #[test]
    fn renders_four_lines() {
        assert_eq!(
            render_stat(&stat("2024-01-15T10:30:00.250Z")),
            "Name: test.txt\nSize: 13 bytes\nMIME Type: text/plain\nCreated: 2024-01-15T10:30:00.250Z\n"
        );
    }

    #[test]
    fn stored_text_is_echoed() {
        let out = render_stat(&stat("2024-01-15T10:30:00.250000+00:00"));
        assert!(out.ends_with("Created: 2024-01-15T10:30:00.250000+00:00\n"));
    }

    #[test]
    fn missing_text_falls_back_to_instant() {
        assert!(render_stat(&stat("")).ends_with("Created: 2024-01-15T10:30:00.250Z\n"));
    }
}
