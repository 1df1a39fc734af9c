//! The credential-less half of delegated QingStor request signing.
//!
//! A [DelegationClient] sends an operation, or a string to sign that was canonicalized locally, to a
//! signing service and returns the signature artifact, optionally applying it to the operation.
//! This crate never sees a secret access key.
//!
//! ```no_run
//! use {
//!     chrono::Duration,
//!     qs_delegation_client::{ClientConfig, DelegationClient},
//!     qs_signature::{chronoutil::expires_after, Operation},
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//! let client = DelegationClient::from_config(&ClientConfig::load(None)?);
//! let mut op = Operation::builder()
//!     .uri("https://pek3a.qingstor.com:443/bucket/test-file")
//!     .expires(expires_after(Duration::hours(1)))
//!     .build()?;
//!
//! client.sign_and_apply_by_query(&mut op).await?;
//! println!("{}", op.request_uri());
//! # Ok(())
//! # }
//! ```

#![warn(clippy::all)]
#![warn(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![warn(rustdoc::missing_crate_level_docs)]

mod client;
pub mod config;
mod transport;

pub use {client::DelegationClient, config::ClientConfig, transport::HttpTransport};
