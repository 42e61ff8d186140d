//! # Wire Encoding
//!
//! Pure functions deriving the outgoing headers and body from a
//! [`RequestDefinition`]. Same definition in, same request out.

pub mod body;
pub mod headers;

use crate::error::{Error, Result};
use crate::http::PreparedRequest;
use crate::http::method::HttpMethod;
use crate::request::{BodySpec, RequestDefinition};

pub use body::{EncodedBody, encode_body};
pub use headers::resolve_headers;

/// Resolve headers and encode the body of `definition`.
///
/// Every validation failure is reported here, before a transport is involved.
pub fn prepare(definition: &RequestDefinition) -> Result<PreparedRequest> {
    let url = checked_url(definition)?;
    let body = encode_body(definition.method, &definition.body)?;
    Ok(assemble(definition, url, body))
}

/// [`prepare`] for async callers: a binary body file is read through
/// `tokio::fs` instead of blocking the runtime.
pub async fn prepare_async(definition: &RequestDefinition) -> Result<PreparedRequest> {
    let url = checked_url(definition)?;
    let body = match &definition.body {
        BodySpec::Binary { file_ref } if definition.method != HttpMethod::Get => {
            let bytes = tokio::fs::read(file_ref)
                .await
                .map_err(|err| body::unreadable_file(file_ref, err))?;
            Some(EncodedBody::Binary(bytes))
        }
        other => encode_body(definition.method, other)?,
    };
    Ok(assemble(definition, url, body))
}

fn checked_url(definition: &RequestDefinition) -> Result<&str> {
    let url = definition.url.trim();
    if url.is_empty() {
        return Err(Error::Validation("URL cannot be empty".to_string()));
    }
    Ok(url)
}

fn assemble(definition: &RequestDefinition, url: &str, body: Option<EncodedBody>) -> PreparedRequest {
    PreparedRequest {
        request_id: definition.id().to_string(),
        method: definition.method,
        url: url.to_string(),
        headers: resolve_headers(&definition.header_rows, &definition.body),
        body,
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::request::RawContentType;

    #[test]
    fn prepare_combines_headers_and_body() {
        let mut def = RequestDefinition::with_id("r1");
        def.method = HttpMethod::Post;
        def.url = "  https://example.com/items ".into();
        def.add_header("Accept", "application/json");
        def.body = BodySpec::raw(RawContentType::Json, "{}");

        let prepared = prepare(&def).unwrap();
        assert_eq!(prepared.request_id, "r1");
        assert_eq!(prepared.url, "https://example.com/items");
        assert_eq!(
            prepared.headers,
            vec!["Accept: application/json", "Content-Type: application/json"]
        );
        assert_eq!(prepared.body, Some(EncodedBody::Text("{}".into())));
    }

    #[test]
    fn get_keeps_injected_header_but_drops_body() {
        let mut def = RequestDefinition::with_id("r1");
        def.url = "https://example.com".into();
        def.body = BodySpec::raw(RawContentType::TextPlain, "ignored");

        let prepared = prepare(&def).unwrap();
        assert_eq!(prepared.headers, vec!["Content-Type: text/plain"]);
        assert_eq!(prepared.body, None);
    }

    #[test]
    fn empty_url_is_rejected() {
        let def = RequestDefinition::with_id("r1");
        assert!(matches!(prepare(&def), Err(Error::Validation(_))));
    }

    #[tokio::test]
    async fn async_prepare_reads_binary_files() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&[7, 0, 255]).unwrap();

        let mut def = RequestDefinition::with_id("r1");
        def.method = HttpMethod::Put;
        def.url = "https://example.com/blob".into();
        def.body = BodySpec::Binary {
            file_ref: file.path().to_path_buf(),
        };
        assert_eq!(prepare_async(&def).await.unwrap(), prepare(&def).unwrap());

        def.method = HttpMethod::Get;
        assert_eq!(prepare_async(&def).await.unwrap().body, None);

        def.method = HttpMethod::Post;
        def.body = BodySpec::Binary {
            file_ref: "/definitely/not/here.bin".into(),
        };
        assert!(matches!(prepare_async(&def).await, Err(Error::Validation(_))));
    }
}
