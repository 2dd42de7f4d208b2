//! Portal GraphQL - transport and response decoding for the Portal API.
//!
//! This crate provides:
//! - Request building (query, fragments, variables, bearer token).
//! - A pluggable [`Transport`] with a reqwest-backed default.
//! - Response classification into data or an API error carrying a
//!   [`portal_status::StatusCode`].
//! - Conversion of response data into immutable [`Structured`] records with
//!   UTC timestamps decoded in place.
//!
//! A client instance is not internally synchronized. Requests are sent one
//! at a time by whoever owns it.

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::doc_markdown)]

mod client;
mod error;
mod operation;
pub mod structured;
pub mod temporal;
mod transport;

pub use client::{GraphqlClient, SCHEMA_PROBE_QUERY, classify_response};
pub use error::{GraphqlClientError, HttpErrorInfo};
pub use operation::{GraphqlQuery, GraphqlRequest};
pub use structured::{Record, Scalar, Structured, to_structured};
pub use transport::{ReqwestTransport, Transport, TransportConfig};

pub use async_trait::async_trait;
pub use reqwest::header::HeaderMap;
pub use portal_status::StatusCode;
