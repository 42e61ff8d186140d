//! Request definitions, wire encoding and versioned send history for the
//! Jetraay API client.
//!
//! A presentation layer owns a [`RequestDefinition`], calls
//! [`Sender::send`](send::Sender::send) to execute it, and uses the
//! [`CollectionRegistry`] and [`HistoryLedger`] for saved requests and past
//! versions.

pub mod collections;
pub mod config;
pub mod encoding;
pub mod error;
pub mod history;
pub mod http;
pub mod request;
pub mod send;
pub mod storage;
pub mod workspace;

pub use collections::{CollectionEntry, CollectionRegistry};
pub use config::Config;
pub use encoding::{EncodedBody, encode_body, prepare, prepare_async, resolve_headers};
pub use error::{Error, Result, StorageError, TransportError};
pub use history::{HistoryEntry, HistoryLedger};
pub use http::{HttpMethod, PreparedRequest, ResponseSummary, Transport, TransportGateway};
pub use request::{BodySpec, FormDataEntry, KeyValueRow, RawContentType, RequestDefinition, Snapshot};
pub use send::Sender;
pub use storage::{MemoryStore, PersistentStore, SqliteStore};
pub use workspace::Workspace;
