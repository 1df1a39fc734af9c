//! The credential-holding half of delegated QingStor request signing.
//!
//! Clients that must not hold a secret access key send either a whole operation or a string to
//! sign to this service, which answers with a query signature or an `Authorization` header value.
//! This is the only crate in the workspace that can name [Credentials].
//!
//! ```
//! use {
//!     bytes::Bytes,
//!     http::Request,
//!     qs_signing_service::{Credentials, Signer, SigningService},
//!     tower::ServiceExt,
//! };
//!
//! # tokio_test::block_on(async {
//! let signer = Signer::new(Credentials::new("AKID", "SECRET").unwrap());
//! let request = Request::post("/string-to-sign?channel=header")
//!     .header("content-type", "application/json")
//!     .body(Bytes::from_static(br#"{"string_to_sign": ""}"#))
//!     .unwrap();
//!
//! let response = SigningService::new(signer).oneshot(request).await.unwrap();
//! assert_eq!(response.status(), 200);
//! assert_eq!(
//!     response.body().as_ref(),
//!     br#"{"authorization":"QS AKID:lcztumGz1CJU4k5eZR5RQawGoHFHkpaSTm4l0OeIKFk="}"#
//! );
//! # });
//! ```

#![warn(clippy::all)]
#![warn(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod config;
mod credentials;
mod crypto;
pub mod dispatch;
mod server;
mod service;
pub mod signer;

pub use {
    credentials::{Credentials, CredentialsError, SecretAccessKey},
    dispatch::{dispatch, BodyFormat},
    server::serve,
    service::{ErrorMapper, JsonErrorMapper, SigningService, DEFAULT_BODY_LIMIT},
    signer::Signer,
};
