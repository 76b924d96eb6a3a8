//! Blocking PocketBase record client for small devices.
//!
//! # Overview
//! Builds PocketBase REST requests (`HttpRequest`) and interprets their
//! responses (`HttpResponse`) without touching the network, then optionally
//! runs the round-trip through an injected `Transport` guarded by a
//! `Connectivity` probe. Record bodies are passed through as raw JSON text.
//!
//! # Design
//! - `PocketbaseClient` is stateless; it holds only `base_url`.
//! - `Collection` splits each operation into `build_*` and `parse_*`, so
//!   firmware with its own HTTP stack can use it directly (see the FFI crate).
//! - `Pocketbase` / `RecordService` execute one attempt per call and report
//!   failures as `ApiError`; `OrEmpty` collapses them to `""` for callers that
//!   only care about the body.
//! - Logging goes through `tracing`; the host installs the subscriber.
//!
//! ```no_run
//! use pocketbase_core::{ListParams, OrEmpty, Pocketbase};
//!
//! let pb = Pocketbase::with_ureq("http://192.168.1.20:8090");
//! let page = pb.collection("readings").get_list(&ListParams::new().sort("-created")).or_empty();
//! println!("{page}");
//! ```

pub mod client;
pub mod error;
pub mod executor;
pub mod http;
pub mod transport;
pub mod types;

pub use client::{Collection, PocketbaseClient};
pub use error::{ApiError, OrEmpty};
pub use executor::{Pocketbase, RecordService};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use transport::{AlwaysConnected, Connectivity, Transport, TransportError};
#[cfg(feature = "ureq")]
pub use transport::UreqTransport;
pub use types::{CreateParams, ErrorEnvelope, ListPage, ListParams, RecordParams};
