//! Serialized form of a sent request, as stored in the history ledger.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::{Deserialize, Serialize};
use url::form_urlencoded;

use super::{BodySpec, FormDataEntry, KeyValueRow, RawContentType, RequestDefinition};
use crate::encoding::body::{EncodedBody, encode_body};
use crate::error::StorageError;
use crate::http::PreparedRequest;
use crate::http::method::HttpMethod;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BodyEncoding {
    Base64,
}

/// A request exactly as it went out: resolved header lines and encoded body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<String>,
    pub body: Option<String>,
    /// Set only when `body` holds base64 of a binary payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body_encoding: Option<BodyEncoding>,
}

impl Snapshot {
    /// Record `sent`, the request prepared from `definition`. Everything but
    /// the display name comes from the prepared request.
    pub fn capture(definition: &RequestDefinition, sent: &PreparedRequest) -> Self {
        let (body, body_encoding) = match &sent.body {
            None => (None, None),
            Some(EncodedBody::Text(text)) => (Some(text.clone()), None),
            Some(EncodedBody::Binary(bytes)) => {
                (Some(BASE64.encode(bytes)), Some(BodyEncoding::Base64))
            }
        };

        Self {
            id: sent.request_id.clone(),
            name: definition.name.clone(),
            method: sent.method,
            url: sent.url.clone(),
            headers: sent.headers.clone(),
            body,
            body_encoding,
        }
    }

    pub fn to_json(&self) -> Result<String, StorageError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(raw: &str) -> Result<Self, StorageError> {
        Ok(serde_json::from_str(raw)?)
    }

    /// The body as it went out on the wire.
    pub fn body_bytes(&self) -> Option<Vec<u8>> {
        let body = self.body.as_ref()?;
        match self.body_encoding {
            None => Some(body.clone().into_bytes()),
            Some(BodyEncoding::Base64) => BASE64.decode(body).ok(),
        }
    }

    /// Value of the first `Content-Type` line, if any.
    pub fn content_type(&self) -> Option<&str> {
        self.headers.iter().find_map(|line| {
            let (key, value) = split_header_line(line)?;
            key.eq_ignore_ascii_case("content-type").then_some(value)
        })
    }
}

impl RequestDefinition {
    /// Load a past snapshot into this working definition.
    ///
    /// The id of `self` is kept. Header lines become enabled rows and the body
    /// is restored in a mode that adds no header of its own, so preparing the
    /// applied definition yields the snapshot's headers and body again.
    ///
    /// A text body sent with a `Content-Type` line comes back as `raw`. One
    /// sent without it came from a form mode and is split back into
    /// `urlEncoded` or `formData` rows. Binary bodies point at a file the
    /// snapshot cannot recreate, so the current body is kept.
    pub fn apply_snapshot(&mut self, snapshot: &Snapshot) {
        self.name = snapshot.name.clone();
        self.method = snapshot.method;
        self.url = snapshot.url.clone();
        self.header_rows = snapshot
            .headers
            .iter()
            .map(|line| match split_header_line(line) {
                Some((key, value)) => KeyValueRow::new(key, value),
                None => KeyValueRow::new(line.trim(), ""),
            })
            .collect();

        if snapshot.body_encoding.is_some() {
            return;
        }
        let Some(text) = snapshot.body.clone() else {
            self.body = BodySpec::None;
            return;
        };

        self.body = match snapshot.content_type() {
            Some(value) => BodySpec::Raw {
                content_type: value.parse().unwrap_or(RawContentType::TextPlain),
                text,
            },
            None => form_body(snapshot.method, text),
        };
    }
}

/// Rebuild the form rows that encode to exactly `text`.
fn form_body(method: HttpMethod, text: String) -> BodySpec {
    let url_encoded = BodySpec::UrlEncoded {
        entries: form_urlencoded::parse(text.as_bytes())
            .map(|(key, value)| KeyValueRow::new(key, value))
            .collect(),
    };
    let form_data = BodySpec::FormData {
        entries: text
            .split('&')
            .map(|pair| {
                let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
                FormDataEntry::text(key, value)
            })
            .collect(),
    };

    [url_encoded, form_data]
        .into_iter()
        .find(|candidate| {
            matches!(
                encode_body(method, candidate),
                Ok(Some(EncodedBody::Text(encoded))) if encoded == text
            )
        })
        .unwrap_or_else(|| BodySpec::raw(RawContentType::TextPlain, text))
}

fn split_header_line(line: &str) -> Option<(&str, &str)> {
    let (key, value) = line.split_once(':')?;
    Some((key.trim(), value.strip_prefix(' ').unwrap_or(value)))
}
