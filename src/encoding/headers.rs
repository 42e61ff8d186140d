use crate::request::{BodySpec, KeyValueRow};

const CONTENT_TYPE: &str = "Content-Type";

/// Turn header rows into `"Key: Value"` lines, in row order.
///
/// Disabled rows and rows with a blank key are skipped. `raw` and `graphql`
/// bodies add a `Content-Type` line unless one is already present (compared
/// case-insensitively); no other body mode adds headers.
pub fn resolve_headers(rows: &[KeyValueRow], body: &BodySpec) -> Vec<String> {
    let mut lines = Vec::with_capacity(rows.len() + 1);
    let mut has_content_type = false;

    for row in rows.iter().filter(|row| row.is_active()) {
        let key = row.key.trim();
        has_content_type |= key.eq_ignore_ascii_case(CONTENT_TYPE);
        lines.push(format!("{key}: {}", row.value));
    }

    if !has_content_type {
        let injected = match body {
            BodySpec::Raw { content_type, .. } => Some(content_type.mime()),
            BodySpec::Graphql { .. } => Some("application/json"),
            _ => None,
        };
        if let Some(mime) = injected {
            lines.push(format!("{CONTENT_TYPE}: {mime}"));
        }
    }

    lines
}
