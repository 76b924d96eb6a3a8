//! Blocking executor that ties request building to a transport.
//!
//! # Design
//! `Pocketbase` owns a `PocketbaseClient`, a `Transport` and a
//! `Connectivity` probe. Each `RecordService` call runs
//! build -> link check -> execute -> parse exactly once, inline, with no
//! retry. The link check comes first so an offline device never touches the
//! transport.

use tracing::{debug, error, info, warn};

use crate::client::{Collection, PocketbaseClient};
use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse};
use crate::transport::{AlwaysConnected, Connectivity, Transport};
use crate::types::{CreateParams, ListParams, RecordParams};

/// A PocketBase client wired to a transport and a link-state probe.
pub struct Pocketbase<T, C = AlwaysConnected> {
    client: PocketbaseClient,
    transport: T,
    connectivity: C,
}

impl<T: Transport> Pocketbase<T> {
    pub fn new(base_url: &str, transport: T) -> Self {
        Self::with_connectivity(base_url, transport, AlwaysConnected)
    }
}

#[cfg(feature = "ureq")]
impl Pocketbase<crate::transport::UreqTransport> {
    /// Client over a default `ureq` agent.
    pub fn with_ureq(base_url: &str) -> Self {
        Self::new(base_url, crate::transport::UreqTransport::new())
    }
}

impl<T: Transport, C: Connectivity> Pocketbase<T, C> {
    pub fn with_connectivity(base_url: &str, transport: T, connectivity: C) -> Self {
        Self {
            client: PocketbaseClient::new(base_url),
            transport,
            connectivity,
        }
    }

    pub fn client(&self) -> &PocketbaseClient {
        &self.client
    }

    pub fn collection(&self, name: &str) -> RecordService<'_, T, C> {
        RecordService {
            collection: self.client.collection(name),
            transport: &self.transport,
            connectivity: &self.connectivity,
        }
    }
}

/// Record operations on one collection, executed over the owning
/// `Pocketbase`'s transport.
pub struct RecordService<'a, T, C> {
    collection: Collection<'a>,
    transport: &'a T,
    connectivity: &'a C,
}

impl<T: Transport, C: Connectivity> RecordService<'_, T, C> {
    pub fn collection(&self) -> &Collection<'_> {
        &self.collection
    }

    /// Fetch one page of records as raw JSON.
    pub fn get_list(&self, params: &ListParams) -> Result<String, ApiError> {
        let request = self.collection.build_get_list(params);
        let response = self.send(&request)?;
        self.collection.parse_get_list(response)
    }

    /// Fetch a single record as raw JSON.
    pub fn get_one(&self, record_id: &str, params: &RecordParams) -> Result<String, ApiError> {
        let request = self.collection.build_get_one(record_id, params);
        let response = self.send(&request)?;
        self.collection.parse_get_one(response).inspect_err(|err| {
            error!(collection = %self.collection.name(), record_id, error = %err, "record lookup refused");
        })
    }

    /// Create a record from a JSON object and return the stored record.
    pub fn create(&self, json_data: &str, params: &CreateParams) -> Result<String, ApiError> {
        let request = self.collection.build_create(json_data, params)?;
        let response = self.send(&request)?;
        self.collection.parse_create(response).inspect_err(|err| {
            error!(collection = %self.collection.name(), error = %err, "record creation failed");
        })
    }

    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
        if !self.connectivity.is_connected() {
            warn!(url = %request.path, "network disconnected, request not sent");
            return Err(ApiError::Offline);
        }

        debug!(method = %request.method, url = %request.path, "sending request");
        match self.transport.execute(request) {
            Ok(response) => {
                info!(status = response.status, "HTTP response received");
                Ok(response)
            }
            Err(err) => {
                error!(code = err.code, error = %err.message, "HTTP request failed");
                Err(ApiError::Transport {
                    code: err.code,
                    message: err.message,
                })
            }
        }
    }
}
