//! Wire contracts of the delegation channel shared by the signing service and its clients.
//!
//! | Endpoint | `channel` | Request | Response |
//! |---|---|---|---|
//! | `POST /operation` | `query` | [OperationRequest] with `expires` | [QuerySignature] |
//! | `POST /operation` | `header` | [OperationRequest] | [HeaderAuthorization] |
//! | `POST /string-to-sign` | `query` | [StringToSignRequest] with `expires` | [QuerySignature] |
//! | `POST /string-to-sign` | `header` | [StringToSignRequest] | [HeaderAuthorization] |
//!
//! Any other `channel` value is answered with `{}` ([DelegationResponse::Empty]).
use {
    crate::{
        artifact::{HeaderAuthorization, QuerySignature, SignatureArtifact},
        operation::Operation,
        SignatureError,
    },
    serde::{Deserialize, Serialize},
    std::fmt::{Display, Formatter, Result as FmtResult},
};

/// Query parameter carrying the channel discriminator.
pub const CHANNEL_PARAM: &str = "channel";

/// The request body of the `/operation` endpoint.
pub type OperationRequest = Operation;

/// The two endpoints of the signing service.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Endpoint {
    /// `/operation`: the service canonicalizes the operation itself.
    Operation,

    /// `/string-to-sign`: the client has already canonicalized the operation.
    StringToSign,
}

impl Endpoint {
    /// The URI path of the endpoint.
    pub fn path(&self) -> &'static str {
        match self {
            Self::Operation => "/operation",
            Self::StringToSign => "/string-to-sign",
        }
    }

    /// Resolve a request path to an endpoint. A single trailing slash is tolerated.
    pub fn from_path(path: &str) -> Option<Self> {
        let path = match path.strip_suffix('/') {
            Some(stripped) if !stripped.is_empty() => stripped,
            _ => path,
        };

        match path {
            "/operation" => Some(Self::Operation),
            "/string-to-sign" => Some(Self::StringToSign),
            _ => None,
        }
    }
}

impl Display for Endpoint {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        f.write_str(self.path())
    }
}

/// The channel discriminator, taken from the `channel` query parameter.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum Channel {
    /// Sign for query-parameter authentication.
    Query,

    /// Sign for `Authorization` header authentication.
    Header,

    /// Anything else, including a missing discriminator. Nothing gets signed.
    Unknown(String),
}

impl Channel {
    /// The value of the `channel` query parameter for this channel.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Query => "query",
            Self::Header => "header",
            Self::Unknown(s) => s,
        }
    }

    /// Find the channel in a raw query string.
    pub fn from_query(query: Option<&str>) -> Self {
        let value = query.and_then(|q| {
            form_urlencoded::parse(q.as_bytes()).find(|(k, _)| k == CHANNEL_PARAM).map(|(_, v)| v.into_owned())
        });

        match value {
            Some(v) => Self::from(v.as_str()),
            None => Self::Unknown(String::new()),
        }
    }
}

impl From<&str> for Channel {
    fn from(s: &str) -> Self {
        match s {
            "query" => Self::Query,
            "header" => Self::Header,
            other => Self::Unknown(other.to_string()),
        }
    }
}

impl Display for Channel {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        f.write_str(self.as_str())
    }
}

/// The request body of the `/string-to-sign` endpoint.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct StringToSignRequest {
    /// The pre-computed string to sign.
    #[serde(default)]
    pub string_to_sign: String,

    /// Expiry in seconds since the epoch; required for the query channel.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires: Option<i64>,
}

impl StringToSignRequest {
    /// Parse an `application/x-www-form-urlencoded` body.
    ///
    /// # Errors
    /// [SignatureError::InvalidInput] if `expires` is present but isn't an integer.
    pub fn from_form(body: &[u8]) -> Result<Self, SignatureError> {
        let mut result = Self::default();

        for (key, value) in form_urlencoded::parse(body) {
            match &*key {
                "string_to_sign" => result.string_to_sign = value.into_owned(),
                "expires" if !value.is_empty() => {
                    let expires = value.parse::<i64>().map_err(|_| {
                        SignatureError::InvalidInput(format!("Invalid value for 'expires': {:?}", value))
                    })?;
                    result.expires = Some(expires);
                }
                _ => (),
            }
        }

        Ok(result)
    }
}

/// Placeholder for the `{}` answer to an unknown channel.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Empty {}

/// Any response body of the signing service.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(untagged)]
pub enum DelegationResponse {
    /// `{access_key_id, signature, expires}`
    Query(QuerySignature),

    /// `{authorization}`
    Header(HeaderAuthorization),

    /// `{}`: the channel was not recognized and nothing was signed.
    Empty(Empty),
}

impl DelegationResponse {
    /// Parse a response body.
    ///
    /// # Errors
    /// [SignatureError::MalformedResponse] if the body is none of the three shapes.
    pub fn from_slice(body: &[u8]) -> Result<Self, SignatureError> {
        serde_json::from_slice(body).map_err(|e| SignatureError::MalformedResponse(e.to_string()))
    }

    /// Convert to a signature artifact.
    ///
    /// # Errors
    /// [SignatureError::MalformedResponse] for an empty response, which means nothing was signed.
    pub fn into_artifact(self) -> Result<SignatureArtifact, SignatureError> {
        match self {
            Self::Query(sig) => Ok(SignatureArtifact::Query(sig)),
            Self::Header(auth) => Ok(SignatureArtifact::Header(auth)),
            Self::Empty(_) => Err(SignatureError::not_signed()),
        }
    }

    /// Indicates whether this is the empty response.
    #[inline]
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty(_))
    }
}

impl From<QuerySignature> for DelegationResponse {
    fn from(sig: QuerySignature) -> Self {
        Self::Query(sig)
    }
}

impl From<HeaderAuthorization> for DelegationResponse {
    fn from(auth: HeaderAuthorization) -> Self {
        Self::Header(auth)
    }
}

impl From<SignatureArtifact> for DelegationResponse {
    fn from(artifact: SignatureArtifact) -> Self {
        match artifact {
            SignatureArtifact::Query(sig) => Self::Query(sig),
            SignatureArtifact::Header(auth) => Self::Header(auth),
        }
    }
}
