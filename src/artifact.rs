//! Signature artifacts: what a signing service hands back in place of the secret.
use {
    crate::{constants::AUTHORIZATION_PREFIX, SignatureError},
    lazy_static::lazy_static,
    regex::Regex,
    serde::{Deserialize, Serialize},
};

lazy_static! {
    /// Shape of an `Authorization` header value: `QS {access_key_id}:{base64 signature}`.
    static ref AUTHORIZATION: Regex = Regex::new(r"^QS ([^:\s]+):([A-Za-z0-9+/]+={0,2})$").unwrap();
}

/// The result of query signing. These three values become the `access_key_id`, `signature`, and
/// `expires` query parameters of the signed request.
#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct QuerySignature {
    /// The access key id the request was signed with.
    pub access_key_id: String,

    /// The base64 HMAC-SHA256 signature.
    pub signature: String,

    /// Expiry in seconds since the epoch, as used in the string to sign.
    pub expires: i64,
}

/// The result of header signing: a complete `Authorization` header value.
#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct HeaderAuthorization {
    /// `QS {access_key_id}:{signature}`
    pub authorization: String,
}

impl HeaderAuthorization {
    /// Assemble the `Authorization` value from an access key id and a base64 signature.
    pub fn new(access_key_id: &str, signature: &str) -> Self {
        Self {
            authorization: format!("{} {}:{}", AUTHORIZATION_PREFIX, access_key_id, signature),
        }
    }

    /// The header value.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.authorization
    }

    /// Split the header value into its access key id and signature.
    ///
    /// # Errors
    /// [SignatureError::MalformedResponse] if the value isn't of the form `QS id:signature`.
    pub fn parse(&self) -> Result<(&str, &str), SignatureError> {
        match AUTHORIZATION.captures(&self.authorization) {
            Some(caps) => match (caps.get(1), caps.get(2)) {
                (Some(id), Some(sig)) => Ok((id.as_str(), sig.as_str())),
                _ => Err(self.malformed()),
            },
            None => Err(self.malformed()),
        }
    }

    fn malformed(&self) -> SignatureError {
        SignatureError::MalformedResponse(format!("Malformed authorization value: {:?}", self.authorization))
    }
}

/// Either kind of signature artifact.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum SignatureArtifact {
    /// Query-parameter signature.
    Query(QuerySignature),

    /// `Authorization` header.
    Header(HeaderAuthorization),
}

impl From<QuerySignature> for SignatureArtifact {
    fn from(sig: QuerySignature) -> Self {
        Self::Query(sig)
    }
}

impl From<HeaderAuthorization> for SignatureArtifact {
    fn from(auth: HeaderAuthorization) -> Self {
        Self::Header(auth)
    }
}
