use std::path::Path;
use std::{fs, io};

use url::form_urlencoded;

use crate::error::{Error, Result};
use crate::http::method::HttpMethod;
use crate::request::BodySpec;

/// A wire-ready request body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncodedBody {
    Text(String),
    Binary(Vec<u8>),
}

impl EncodedBody {
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            EncodedBody::Text(text) => text.as_bytes(),
            EncodedBody::Binary(bytes) => bytes,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            EncodedBody::Text(text) => Some(text),
            EncodedBody::Binary(_) => None,
        }
    }

    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Build the body for `method` from `body`.
///
/// GET never carries a body. HEAD and OPTIONS are encoded like any other
/// method. Only GraphQL variables and unreadable binary files can fail, and
/// both fail with [`Error::Validation`] before anything is sent.
pub fn encode_body(method: HttpMethod, body: &BodySpec) -> Result<Option<EncodedBody>> {
    if method == HttpMethod::Get {
        return Ok(None);
    }

    let encoded = match body {
        BodySpec::None => return Ok(None),
        BodySpec::Raw { text, .. } => EncodedBody::Text(text.clone()),
        BodySpec::FormData { entries } => EncodedBody::Text(
            entries
                .iter()
                .filter(|entry| entry.is_active())
                .map(|entry| format!("{}={}", entry.key, entry.value))
                .collect::<Vec<_>>()
                .join("&"),
        ),
        BodySpec::UrlEncoded { entries } => EncodedBody::Text(
            entries
                .iter()
                .filter(|entry| entry.is_active())
                .map(|entry| format!("{}={}", form_escape(&entry.key), form_escape(&entry.value)))
                .collect::<Vec<_>>()
                .join("&"),
        ),
        BodySpec::Graphql {
            query,
            variables_json,
        } => EncodedBody::Text(encode_graphql(query, variables_json)?),
        BodySpec::Binary { file_ref } => {
            let bytes = fs::read(file_ref).map_err(|err| unreadable_file(file_ref, err))?;
            EncodedBody::Binary(bytes)
        }
    };

    Ok(Some(encoded))
}

pub(crate) fn unreadable_file(path: &Path, err: io::Error) -> Error {
    Error::Validation(format!("Cannot read binary body file `{}`: {err}", path.display()))
}

fn form_escape(text: &str) -> String {
    form_urlencoded::byte_serialize(text.as_bytes()).collect()
}

fn encode_graphql(query: &str, variables_json: &str) -> Result<String> {
    let variables = if variables_json.trim().is_empty() {
        serde_json::Value::Object(serde_json::Map::new())
    } else {
        serde_json::from_str(variables_json)
            .map_err(|err| Error::Validation(format!("GraphQL variables are not valid JSON: {err}")))?
    };

    let payload = serde_json::json!({
        "query": query,
        "variables": variables,
    });
    Ok(payload.to_string())
}
