//! The `qs_signature` crate holds the credential-free half of delegated QingStor request signing.
//!
//! A client that must not hold the long-lived secret key builds an [Operation], sends it (or its
//! [StringToSign]) to a signing service, and gets back a signature artifact: either a
//! [QuerySignature] for query-parameter authentication or a [HeaderAuthorization] for the
//! `Authorization` header. The client then applies the artifact to the operation and sends it on.
//!
//! This crate provides:
//! * The [Operation] model and its JSON wire form.
//! * Canonicalization of an operation into its QingStor signature v1 string to sign ([canonicalize]).
//! * The wire contracts of the delegation channel ([channel]).
//! * Applying a returned artifact to the operation ([apply_query_signature], [apply_signature]).
//!
//! Nothing here can compute a signature; that requires the secret key, which lives only in the
//! signing service.
//!
//! # Example
//! ```rust
//! use qs_signature::{apply_query_signature, Operation};
//! use std::collections::BTreeMap;
//!
//! let mut params = BTreeMap::new();
//! params.insert("prefix".to_string(), "test/".to_string());
//!
//! let mut op = Operation::builder()
//!     .uri("https://pek3a.qingstor.com:443/bucket")
//!     .params(params)
//!     .build()
//!     .unwrap();
//!
//! // This is what gets sent to the /string-to-sign endpoint.
//! let sts = op.query_string_to_sign(1489571836).unwrap();
//! assert_eq!(sts.as_str(), "GET\n\n\n1489571836\n/bucket");
//!
//! // ... and this is what gets done with the answer.
//! apply_query_signature(&mut op, "AKID", "a1xLNCjtokGUIl7naluQbLsuGKTU79QBDuN8OeZ24vQ=", 1489571836);
//! assert!(op.request_uri().contains("access_key_id=AKID"));
//! ```

#![warn(clippy::all)]
#![warn(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![warn(rustdoc::missing_crate_level_docs)]

mod apply;
mod artifact;
pub mod canonical;
pub mod channel;
pub mod chronoutil;
pub mod constants;
mod error;
mod operation;

pub use {
    apply::{apply_artifact, apply_query_signature, apply_signature},
    artifact::{HeaderAuthorization, QuerySignature, SignatureArtifact},
    canonical::{canonicalize, SigningTimestamp, StringToSign},
    channel::{Channel, DelegationResponse, Endpoint, OperationRequest, StringToSignRequest},
    error::SignatureError,
    operation::{Operation, OperationBuilder, OperationBuilderError},
};
