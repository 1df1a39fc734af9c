//! Common constants used throughout the crate.
//!
//! Tests that are testing the content of an error code or message should not use these constants;
//! they should use hard-coded strings so the tests are also testing for misspellings.
//!
//! Please keep this file organized alphabetically. (This can be a bit hard with comments, etc.)

/// Prefix of the `Authorization` header value produced by QingStor signature v1.
pub const AUTHORIZATION_PREFIX: &str = "QS";

/// Query parameter carrying the access key id for query-signed requests.
pub const PARAM_ACCESS_KEY_ID: &str = "access_key_id";

/// Query parameter carrying the expiry timestamp for query-signed requests.
pub const PARAM_EXPIRES: &str = "expires";

/// Query parameter carrying the signature for query-signed requests.
pub const PARAM_SIGNATURE: &str = "signature";

/// Error code: InternalFailure
pub(crate) const ERR_CODE_INTERNAL_FAILURE: &str = "InternalFailure";

/// Error code: InvalidInput
pub(crate) const ERR_CODE_INVALID_INPUT: &str = "InvalidInput";

/// Error code: MalformedResponse
pub(crate) const ERR_CODE_MALFORMED_RESPONSE: &str = "MalformedResponse";

/// Error code: TransportError
pub(crate) const ERR_CODE_TRANSPORT_ERROR: &str = "TransportError";

/// Header for `authorization`
pub(crate) const HDR_AUTHORIZATION: &str = "authorization";

/// Header for `content-md5`
pub(crate) const HDR_CONTENT_MD5: &str = "content-md5";

/// Header for `content-type`
pub(crate) const HDR_CONTENT_TYPE: &str = "content-type";

/// Header for `date`
pub(crate) const HDR_DATE: &str = "date";

/// Header for delivering the alternate date
pub(crate) const HDR_X_QS_DATE: &str = "x-qs-date";

/// Prefix of headers that take part in the canonicalized header block.
pub(crate) const HDR_X_QS_PREFIX: &str = "x-qs-";

/// Error message: `"Query signing requires 'expires'."`
pub(crate) const MSG_EXPIRES_REQUIRED: &str = "Query signing requires 'expires'.";

/// Error message: `"Header signing requires either a 'Date' or an 'X-QS-Date' header."`
pub(crate) const MSG_HEADER_DATE_REQUIRED: &str = "Header signing requires either a 'Date' or an 'X-QS-Date' header.";

/// Error message: `"Signing service returned an empty response; the request was not signed."`
pub(crate) const MSG_NOT_SIGNED: &str = "Signing service returned an empty response; the request was not signed.";

/// Query parameters that take part in the canonicalized resource. Everything else on the wire is
/// left out of the string to sign.
///
/// Keep this list sorted.
pub(crate) const SIGNABLE_PARAMS: &[&str] = &[
    "acl",
    "append",
    "cors",
    "delete",
    "image",
    "lifecycle",
    "logging",
    "mirror",
    "notification",
    "part_number",
    "policy",
    "position",
    "response-cache-control",
    "response-content-disposition",
    "response-content-encoding",
    "response-content-language",
    "response-content-type",
    "response-expires",
    "stats",
    "upload_id",
    "uploads",
];
