//! Applying a signature artifact to the operation it was computed for.
//!
//! None of these check whether the operation was already signed; applying twice simply overwrites
//! the earlier values.
use {
    crate::{
        artifact::{HeaderAuthorization, QuerySignature, SignatureArtifact},
        constants::*,
        operation::Operation,
        SignatureError,
    },
    http::header::{HeaderName, HeaderValue},
    log::debug,
};

/// Set the `access_key_id`, `signature`, and `expires` query parameters. Nothing else is touched.
pub fn apply_query_signature(operation: &mut Operation, access_key_id: &str, signature: &str, expires: i64) {
    let params = operation.params_mut();
    params.insert(PARAM_ACCESS_KEY_ID.to_string(), access_key_id.to_string());
    params.insert(PARAM_SIGNATURE.to_string(), signature.to_string());
    params.insert(PARAM_EXPIRES.to_string(), expires.to_string());
    debug!("Applied query signature for access key {}", access_key_id);
}

/// Set the `Authorization` header, replacing any previous value. Other headers are untouched.
///
/// # Errors
/// [SignatureError::InvalidInput] if `authorization` isn't a valid header value.
pub fn apply_signature(operation: &mut Operation, authorization: &str) -> Result<(), SignatureError> {
    let value = HeaderValue::from_str(authorization)
        .map_err(|_| SignatureError::InvalidInput("Authorization value contains invalid characters.".to_string()))?;
    operation.headers_mut().insert(HeaderName::from_static(HDR_AUTHORIZATION), value);
    debug!("Applied authorization header");
    Ok(())
}

/// Apply whichever kind of artifact was returned by the signing service.
pub fn apply_artifact(operation: &mut Operation, artifact: &SignatureArtifact) -> Result<(), SignatureError> {
    match artifact {
        SignatureArtifact::Query(QuerySignature {
            access_key_id,
            signature,
            expires,
        }) => {
            apply_query_signature(operation, access_key_id, signature, *expires);
            Ok(())
        }
        SignatureArtifact::Header(HeaderAuthorization {
            authorization,
        }) => apply_signature(operation, authorization),
    }
}
