//! # Transport
//!
//! The boundary to whatever actually moves bytes over the network. The core
//! hands a [`PreparedRequest`] to a [`TransportGateway`] and records history
//! only when it returns `Ok`.

pub mod cancel;
pub mod client;
pub mod curl;
pub mod method;
pub mod request;
pub mod response;

use std::future::Future;

use crate::config::{TransportBackend, TransportConfig};
use crate::error::TransportError;

pub use client::ReqwestTransport;
pub use curl::{CurlTransport, curl_command};
pub use method::HttpMethod;
pub use request::PreparedRequest;
pub use response::{RawResponse, ResponseSummary};

/// Executes a fully resolved request.
///
/// Timeouts and cancellation are reported as errors; retry policy, TLS and
/// redirects are the implementation's business.
pub trait TransportGateway: Send + Sync {
    fn execute(
        &self,
        request: &PreparedRequest,
    ) -> impl Future<Output = Result<RawResponse, TransportError>> + Send;
}

/// The transport selected in [`TransportConfig::backend`].
#[derive(Debug, Clone)]
pub enum Transport {
    Reqwest(ReqwestTransport),
    Curl(CurlTransport),
}

impl Transport {
    pub fn from_config(config: &TransportConfig) -> Result<Self, TransportError> {
        Ok(match config.backend {
            TransportBackend::Reqwest => Transport::Reqwest(ReqwestTransport::new(config)?),
            TransportBackend::Curl => Transport::Curl(CurlTransport::new(config)),
        })
    }
}

impl TransportGateway for Transport {
    async fn execute(&self, request: &PreparedRequest) -> Result<RawResponse, TransportError> {
        match self {
            Transport::Reqwest(transport) => transport.execute(request).await,
            Transport::Curl(transport) => transport.execute(request).await,
        }
    }
}
