use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Proxy};

use crate::config::TransportConfig;
use crate::error::TransportError;

use super::cancel::CancelRegistry;
use super::request::PreparedRequest;
use super::response::RawResponse;
use super::TransportGateway;

/// Sends requests in-process with `reqwest`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
    cancel: Arc<CancelRegistry>,
}

impl ReqwestTransport {
    pub fn new(config: &TransportConfig) -> Result<Self, TransportError> {
        let redirect = if config.max_redirects == 0 {
            reqwest::redirect::Policy::none()
        } else {
            reqwest::redirect::Policy::limited(config.max_redirects)
        };
        let mut builder = Client::builder().redirect(redirect);

        if config.timeout_ms > 0 {
            builder = builder.timeout(Duration::from_millis(config.timeout_ms));
        }

        if let Some(proxy_url) = config.proxy_url.as_deref().filter(|url| !url.is_empty()) {
            let proxy = Proxy::all(proxy_url)
                .map_err(|err| TransportError::InvalidRequest(format!("Invalid proxy URL: {err}")))?;
            builder = builder.proxy(proxy);
        }

        if !config.verify_ssl {
            builder = builder.danger_accept_invalid_certs(true);
        }

        let client = builder.build().map_err(|err| {
            TransportError::InvalidRequest(format!("Failed to build HTTP client: {err}"))
        })?;

        Ok(Self {
            client,
            cancel: Arc::new(CancelRegistry::new()),
        })
    }

    /// Abort every in-flight send of `request_id`.
    pub fn cancel(&self, request_id: &str) -> bool {
        self.cancel.cancel(request_id)
    }

    async fn dispatch(&self, request: &PreparedRequest) -> Result<RawResponse, TransportError> {
        let url = reqwest::Url::parse(&request.url)
            .map_err(|err| TransportError::InvalidRequest(format!("Invalid URL: {err}")))?;

        let mut builder = self
            .client
            .request(request.method.into(), url)
            .headers(build_headers(request)?);
        if let Some(body) = &request.body {
            builder = builder.body(body.as_bytes().to_vec());
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let bytes = response.bytes().await?;

        Ok(RawResponse {
            status,
            body: String::from_utf8_lossy(&bytes).into_owned(),
        })
    }
}

impl TransportGateway for ReqwestTransport {
    async fn execute(&self, request: &PreparedRequest) -> Result<RawResponse, TransportError> {
        let mut cancel_rx = self.cancel.register(&request.request_id);

        let result = tokio::select! {
            res = self.dispatch(request) => res,
            _ = cancel_rx.recv() => Err(TransportError::Cancelled),
        };

        drop(cancel_rx);
        self.cancel.release(&request.request_id);
        result
    }
}

fn build_headers(request: &PreparedRequest) -> Result<HeaderMap, TransportError> {
    let mut headers = HeaderMap::new();

    for (key, value) in request.header_pairs().map_err(TransportError::InvalidRequest)? {
        let header_name = HeaderName::from_bytes(key.as_bytes())
            .map_err(|err| TransportError::InvalidRequest(format!("Invalid header name `{key}`: {err}")))?;
        let header_value = HeaderValue::from_str(value).map_err(|err| {
            TransportError::InvalidRequest(format!("Invalid header value for `{key}`: {err}"))
        })?;
        headers.append(header_name, header_value);
    }

    Ok(headers)
}
