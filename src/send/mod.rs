//! # Sending
//!
//! Resolve, execute, record. Validation errors stop before the transport is
//! called; transport errors stop before the ledger is written.

use std::sync::Arc;
use std::time::Instant;

use crate::encoding::{prepare, prepare_async};
use crate::error::Result;
use crate::history::HistoryLedger;
use crate::http::{PreparedRequest, ResponseSummary, TransportGateway, curl_command};
use crate::request::{RequestDefinition, Snapshot};
use crate::storage::PersistentStore;

pub struct Sender<T, S> {
    transport: Arc<T>,
    history: HistoryLedger<S>,
}

impl<T: TransportGateway, S: PersistentStore> Sender<T, S> {
    pub fn new(transport: Arc<T>, history: HistoryLedger<S>) -> Self {
        Self { transport, history }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Send `definition` and record what went out as its next history version.
    pub async fn send(&self, definition: &RequestDefinition) -> Result<ResponseSummary> {
        let prepared = prepare_async(definition).await?;

        let started = Instant::now();
        let result = self.transport.execute(&prepared).await;
        let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        let response = match result {
            Ok(response) => response,
            Err(err) => {
                tracing::warn!(
                    request_id = %prepared.request_id,
                    method = %prepared.method,
                    url = %prepared.url,
                    error = %err,
                    "send failed"
                );
                return Err(err.into());
            }
        };

        let snapshot = Snapshot::capture(definition, &prepared);
        let version = self.history.record_version(&prepared.request_id, &snapshot)?;

        tracing::info!(
            request_id = %prepared.request_id,
            method = %prepared.method,
            url = %prepared.url,
            status = response.status,
            elapsed_ms,
            version,
            "request sent"
        );

        Ok(ResponseSummary {
            status: response.status,
            elapsed_ms,
            size_bytes: response.body.len(),
            raw_body: response.body,
            version,
        })
    }

    /// The cURL command line `definition` would be sent as.
    pub fn curl_command(&self, definition: &RequestDefinition) -> Result<String> {
        Ok(curl_command(&prepare(definition)?))
    }

    /// Resolve `definition` without sending it.
    pub fn preview(&self, definition: &RequestDefinition) -> Result<PreparedRequest> {
        prepare(definition)
    }
}
