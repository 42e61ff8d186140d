use crate::encoding::EncodedBody;
use crate::request::RequestId;

use super::method::HttpMethod;

/// A fully resolved request, ready for a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedRequest {
    /// Id of the definition this request was prepared from. Transports use
    /// it as the cancellation key.
    pub request_id: RequestId,
    pub method: HttpMethod,
    pub url: String,
    /// `"Key: Value"` lines in send order.
    pub headers: Vec<String>,
    pub body: Option<EncodedBody>,
}

impl PreparedRequest {
    /// Split header lines into `(key, value)` pairs.
    pub fn header_pairs(&self) -> Result<Vec<(&str, &str)>, String> {
        self.headers
            .iter()
            .map(|line| {
                let (key, value) = line
                    .split_once(':')
                    .ok_or_else(|| format!("Invalid header format: {line}"))?;
                let key = key.trim();
                if key.is_empty() {
                    return Err(format!("Header key is empty: {line}"));
                }
                Ok((key, value.trim()))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prepared(headers: &[&str]) -> PreparedRequest {
        PreparedRequest {
            request_id: "r1".into(),
            method: HttpMethod::Get,
            url: "https://example.com".into(),
            headers: headers.iter().map(|h| h.to_string()).collect(),
            body: None,
        }
    }

    #[test]
    fn splits_on_first_colon() {
        let request = prepared(&["X-Time: 12:30", "Accept:  */*"]);
        assert_eq!(
            request.header_pairs().unwrap(),
            vec![("X-Time", "12:30"), ("Accept", "*/*")]
        );
    }

    #[test]
    fn rejects_lines_without_separator() {
        assert!(prepared(&["garbage"]).header_pairs().is_err());
        assert!(prepared(&[": value"]).header_pairs().is_err());
    }
}
