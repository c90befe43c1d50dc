//! Entry codes, upload keys and CSV/date formatting

use chrono::{DateTime, NaiveDate, Utc};
use rand::Rng;
use uuid::Uuid;

/// Prefix that marks registrations created by an administrator
pub const MANUAL_ENTRY_PREFIX: &str = "MANUAL-";

const BASE36: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Generate an entry code for an admin-created registration
///
/// Format: `MANUAL-{unix millis}-{9 uppercase base36 characters}`.
pub fn generate_manual_entry_code(now: DateTime<Utc>) -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..9)
        .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
        .collect();

    format!("{}{}-{}", MANUAL_ENTRY_PREFIX, now.timestamp_millis(), suffix)
}

/// Check whether an entry code belongs to an admin-created registration
pub fn is_manual_entry_code(entry_code: &str) -> bool {
    entry_code.starts_with(MANUAL_ENTRY_PREFIX)
}

/// Strip path components and characters object stores dislike from an uploaded file name
pub fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let cleaned: String = base
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') { c } else { '_' })
        .collect();

    let trimmed = cleaned.trim_matches('.');
    if trimmed.is_empty() {
        "upload".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Object key for an uploaded registration file: `{event_id}/{field_id}/{millis}-{file name}`
pub fn registration_file_key(event_id: Uuid, field_id: Uuid, file_name: &str, now: DateTime<Utc>) -> String {
    format!(
        "{}/{}/{}-{}",
        event_id,
        field_id,
        now.timestamp_millis(),
        sanitize_file_name(file_name)
    )
}

/// Escape a single CSV value
///
/// Values containing a comma, a double quote or a line break are wrapped in quotes
/// with embedded quotes doubled.
pub fn csv_escape(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Join escaped values into one CSV line
pub fn csv_line<I, S>(values: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    values
        .into_iter()
        .map(|v| csv_escape(v.as_ref()))
        .collect::<Vec<_>>()
        .join(",")
}

/// Format a timestamp the way exports and logs show it
pub fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
}

/// Format a calendar date as `YYYY-MM-DD`
pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Normalize optional free text: trimmed, `None` when blank
pub fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_manual_entry_code_format() {
        let now = Utc.timestamp_millis_opt(1_699_999_999_999).unwrap();
        let code = generate_manual_entry_code(now);

        assert!(code.starts_with("MANUAL-1699999999999-"));
        let suffix = code.rsplit('-').next().unwrap();
        assert_eq!(suffix.len(), 9);
        assert!(suffix.chars().all(|c| c.is_ascii_digit() || c.is_ascii_uppercase()));
        assert!(is_manual_entry_code(&code));
        assert!(!is_manual_entry_code("A1B2C3D4E5F6"));
    }

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("resume final.pdf"), "resume_final.pdf");
        assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_file_name("C:\\Users\\me\\photo.png"), "photo.png");
        assert_eq!(sanitize_file_name("..."), "upload");
    }

    #[test]
    fn test_registration_file_key() {
        let event_id = Uuid::new_v4();
        let field_id = Uuid::new_v4();
        let now = Utc.timestamp_millis_opt(1_700_000_000_000).unwrap();

        let key = registration_file_key(event_id, field_id, "id card.jpg", now);
        assert_eq!(key, format!("{}/{}/1700000000000-id_card.jpg", event_id, field_id));
    }

    #[test]
    fn test_csv_escape() {
        assert_eq!(csv_escape("plain"), "plain");
        assert_eq!(csv_escape("a,b"), "\"a,b\"");
        assert_eq!(csv_escape("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(csv_escape("line\nbreak"), "\"line\nbreak\"");
        assert_eq!(csv_line(["a", "b,c", ""]), "a,\"b,c\",");
    }

    #[test]
    fn test_non_blank() {
        assert_eq!(non_blank(Some("  hall A ")), Some("hall A".to_string()));
        assert_eq!(non_blank(Some("   ")), None);
        assert_eq!(non_blank(None), None);
    }
}
