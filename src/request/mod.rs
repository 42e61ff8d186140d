//! # Request Definitions
//!
//! The value object the user edits: method, URL, header rows and a body
//! specification. Deriving the wire form lives in [`crate::encoding`].

pub mod snapshot;

use std::fmt::{self, Display};
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::http::method::HttpMethod;

pub use snapshot::Snapshot;

/// Opaque identifier of a request definition.
pub type RequestId = String;

/// One row of a key/value table (headers, url-encoded fields).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyValueRow {
    pub enabled: bool,
    pub key: String,
    pub value: String,
}

impl KeyValueRow {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            enabled: true,
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn disabled(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            enabled: false,
            ..Self::new(key, value)
        }
    }

    /// Rows that take part in encoding: enabled and with a non-blank key.
    pub fn is_active(&self) -> bool {
        self.enabled && !self.key.trim().is_empty()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormEntryKind {
    #[default]
    Text,
    File,
}

/// A multipart form row. `file_ref` is only meaningful for `File` rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormDataEntry {
    pub enabled: bool,
    pub key: String,
    pub value: String,
    #[serde(default)]
    pub kind: FormEntryKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_ref: Option<PathBuf>,
}

impl FormDataEntry {
    pub fn text(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            enabled: true,
            key: key.into(),
            value: value.into(),
            kind: FormEntryKind::Text,
            file_ref: None,
        }
    }

    pub fn file(key: impl Into<String>, file_ref: impl Into<PathBuf>) -> Self {
        let file_ref = file_ref.into();
        let value = file_ref
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            enabled: true,
            key: key.into(),
            value,
            kind: FormEntryKind::File,
            file_ref: Some(file_ref),
        }
    }

    pub fn is_active(&self) -> bool {
        self.enabled && !self.key.trim().is_empty()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RawContentType {
    #[serde(rename = "text/plain")]
    TextPlain,
    #[default]
    #[serde(rename = "application/json")]
    Json,
    #[serde(rename = "application/xml")]
    Xml,
    #[serde(rename = "text/html")]
    Html,
    #[serde(rename = "application/javascript")]
    JavaScript,
}

impl RawContentType {
    pub const ALL: [RawContentType; 5] = [
        RawContentType::TextPlain,
        RawContentType::Json,
        RawContentType::Xml,
        RawContentType::Html,
        RawContentType::JavaScript,
    ];

    pub fn mime(self) -> &'static str {
        match self {
            RawContentType::TextPlain => "text/plain",
            RawContentType::Json => "application/json",
            RawContentType::Xml => "application/xml",
            RawContentType::Html => "text/html",
            RawContentType::JavaScript => "application/javascript",
        }
    }
}

impl Display for RawContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mime())
    }
}

impl FromStr for RawContentType {
    type Err = String;

    /// Accepts a bare MIME type or a full header value with parameters
    /// (`application/json; charset=utf-8`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let essence = s.split(';').next().unwrap_or_default().trim();
        RawContentType::ALL
            .into_iter()
            .find(|content_type| content_type.mime().eq_ignore_ascii_case(essence))
            .ok_or_else(|| format!("Unsupported raw content type `{essence}`"))
    }
}

/// How the request body is built. Each mode carries only its own fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "camelCase")]
pub enum BodySpec {
    #[default]
    None,
    #[serde(rename_all = "camelCase")]
    Raw {
        content_type: RawContentType,
        text: String,
    },
    FormData { entries: Vec<FormDataEntry> },
    UrlEncoded { entries: Vec<KeyValueRow> },
    #[serde(rename_all = "camelCase")]
    Graphql { query: String, variables_json: String },
    #[serde(rename_all = "camelCase")]
    Binary { file_ref: PathBuf },
}

impl BodySpec {
    pub fn raw(content_type: RawContentType, text: impl Into<String>) -> Self {
        BodySpec::Raw {
            content_type,
            text: text.into(),
        }
    }

    pub fn graphql(query: impl Into<String>, variables_json: impl Into<String>) -> Self {
        BodySpec::Graphql {
            query: query.into(),
            variables_json: variables_json.into(),
        }
    }
}

/// A saved or in-progress definition of one HTTP request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestDefinition {
    id: RequestId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub method: HttpMethod,
    pub url: String,
    #[serde(default)]
    pub header_rows: Vec<KeyValueRow>,
    #[serde(default)]
    pub body: BodySpec,
}

impl RequestDefinition {
    /// An empty GET draft with a freshly generated id.
    pub fn new_draft() -> Self {
        Self::with_id(Uuid::new_v4().to_string())
    }

    /// A draft that adopts an existing id, e.g. one issued by the store.
    pub fn with_id(id: impl Into<RequestId>) -> Self {
        Self {
            id: id.into(),
            name: None,
            method: HttpMethod::Get,
            url: String::new(),
            header_rows: Vec::new(),
            body: BodySpec::None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Deep copy under a new id. The id of `self` is never reused.
    pub fn duplicate(&self) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            ..self.clone()
        }
    }

    /// Label shown in lists: the name when set, otherwise the URL.
    pub fn display_name(&self) -> &str {
        match self.name.as_deref() {
            Some(name) if !name.is_empty() => name,
            _ => &self.url,
        }
    }

    pub fn add_header(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.header_rows.push(KeyValueRow::new(key, value));
    }

    pub fn set_header_enabled(&mut self, index: usize, enabled: bool) -> bool {
        match self.header_rows.get_mut(index) {
            Some(row) => {
                row.enabled = enabled;
                true
            }
            None => false,
        }
    }

    pub fn remove_header(&mut self, index: usize) -> Option<KeyValueRow> {
        (index < self.header_rows.len()).then(|| self.header_rows.remove(index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draft_is_empty_get() {
        let draft = RequestDefinition::new_draft();
        assert_eq!(draft.method, HttpMethod::Get);
        assert!(draft.url.is_empty());
        assert!(draft.header_rows.is_empty());
        assert_eq!(draft.body, BodySpec::None);
        assert!(!draft.id().is_empty());
    }

    #[test]
    fn duplicate_gets_new_id() {
        let mut original = RequestDefinition::new_draft();
        original.url = "https://example.com".into();
        let copy = original.duplicate();

        assert_ne!(copy.id(), original.id());
        assert_eq!(copy.url, original.url);
    }

    #[test]
    fn display_name_falls_back_to_url() {
        let mut def = RequestDefinition::with_id("r1");
        def.url = "https://example.com/users".into();
        assert_eq!(def.display_name(), "https://example.com/users");

        def.name = Some(String::new());
        assert_eq!(def.display_name(), "https://example.com/users");

        def.name = Some("List users".into());
        assert_eq!(def.display_name(), "List users");
    }

    #[test]
    fn disabling_header_keeps_the_row() {
        let mut def = RequestDefinition::new_draft();
        def.add_header("X-One", "1");
        def.add_header("X-Two", "2");

        assert!(def.set_header_enabled(0, false));
        assert!(!def.set_header_enabled(5, false));
        assert_eq!(def.header_rows.len(), 2);
        assert!(!def.header_rows[0].is_active());

        assert_eq!(def.remove_header(1).map(|row| row.key), Some("X-Two".into()));
        assert!(def.remove_header(1).is_none());
    }

    #[test]
    fn blank_key_rows_are_inactive() {
        assert!(!KeyValueRow::new("   ", "v").is_active());
        assert!(!KeyValueRow::disabled("X", "v").is_active());
        assert!(KeyValueRow::new("X", "").is_active());
    }

    #[test]
    fn raw_content_type_parses_header_values() {
        assert_eq!(
            "application/json; charset=utf-8".parse::<RawContentType>().unwrap(),
            RawContentType::Json
        );
        assert_eq!("TEXT/HTML".parse::<RawContentType>().unwrap(), RawContentType::Html);
        assert!("image/png".parse::<RawContentType>().is_err());
    }

    #[test]
    fn body_spec_serializes_with_mode_tag() {
        let body = BodySpec::graphql("{ a }", "");
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"mode": "graphql", "query": "{ a }", "variablesJson": ""})
        );

        let raw: BodySpec = serde_json::from_value(
            serde_json::json!({"mode": "raw", "contentType": "application/xml", "text": "<a/>"}),
        )
        .unwrap();
        assert_eq!(raw, BodySpec::raw(RawContentType::Xml, "<a/>"));
    }

    #[test]
    fn file_entry_takes_file_name_as_value() {
        let entry = FormDataEntry::file("avatar", "/tmp/me.png");
        assert_eq!(entry.value, "me.png");
        assert_eq!(entry.kind, FormEntryKind::File);
    }

    #[test]
    fn definition_round_trips_through_json() {
        let mut def = RequestDefinition::with_id("abc");
        def.method = HttpMethod::Post;
        def.url = "https://example.com".into();
        def.add_header("Accept", "application/json");
        def.body = BodySpec::UrlEncoded {
            entries: vec![KeyValueRow::new("q", "a b")],
        };

        let json = serde_json::to_string(&def).unwrap();
        let back: RequestDefinition = serde_json::from_str(&json).unwrap();
        assert_eq!(back, def);
        assert_eq!(back.id(), "abc");
    }
}
