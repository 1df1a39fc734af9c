use {
    crate::constants::*,
    http::status::StatusCode,
    scratchstack_errors::ServiceError,
    std::{
        error::Error,
        fmt::{Display, Formatter, Result as FmtResult},
        io::Error as IOError,
    },
    tower::BoxError,
};

/// Error returned when an operation cannot be signed, or when a delegated signing round-trip fails.
///
/// Every variant is fatal to the operation being signed; nothing is retried.
#[derive(Debug)]
#[non_exhaustive]
pub enum SignatureError {
    /// Signing failed due to an internal service error.
    InternalServiceError(BoxError),

    /// The operation is missing a field required by the requested channel, or a field could not be
    /// parsed. Sample messages:
    /// `Query signing requires 'expires'.`
    /// `Header signing requires either a 'Date' or an 'X-QS-Date' header.`
    InvalidInput(/* message */ String),

    /// The signing service answered, but the body could not be parsed into the expected signature
    /// artifact. An empty (`{}`) body means the request was not signed and is reported here too.
    MalformedResponse(/* message */ String),

    /// The delegation round-trip failed: the connection was refused, the call timed out, or the
    /// service answered with a non-success status.
    Transport(/* message */ String),
}

impl SignatureError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::InternalServiceError(_) => ERR_CODE_INTERNAL_FAILURE,
            Self::InvalidInput(_) => ERR_CODE_INVALID_INPUT,
            Self::MalformedResponse(_) => ERR_CODE_MALFORMED_RESPONSE,
            Self::Transport(_) => ERR_CODE_TRANSPORT_ERROR,
        }
    }

    fn http_status(&self) -> StatusCode {
        match self {
            Self::InvalidInput(_) => StatusCode::BAD_REQUEST,
            Self::InternalServiceError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::MalformedResponse(_) | Self::Transport(_) => StatusCode::BAD_GATEWAY,
        }
    }

    /// Shorthand for the missing-`expires` error of the query channel.
    pub fn expires_required() -> Self {
        Self::InvalidInput(MSG_EXPIRES_REQUIRED.to_string())
    }

    /// Shorthand for the error returned when a signing service answers with `{}`.
    pub fn not_signed() -> Self {
        Self::MalformedResponse(MSG_NOT_SIGNED.to_string())
    }
}

impl ServiceError for SignatureError {
    fn error_code(&self) -> &'static str {
        SignatureError::error_code(self)
    }

    fn http_status(&self) -> StatusCode {
        SignatureError::http_status(self)
    }
}

impl Display for SignatureError {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        match self {
            Self::InternalServiceError(ref e) => Display::fmt(e, f),
            Self::InvalidInput(msg) => f.write_str(msg),
            Self::MalformedResponse(msg) => f.write_str(msg),
            Self::Transport(msg) => f.write_str(msg),
        }
    }
}

impl Error for SignatureError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InternalServiceError(ref e) => Some(e.as_ref()),
            _ => None,
        }
    }
}

impl From<IOError> for SignatureError {
    fn from(e: IOError) -> SignatureError {
        SignatureError::Transport(e.to_string())
    }
}

impl From<BoxError> for SignatureError {
    fn from(e: BoxError) -> SignatureError {
        match e.downcast::<SignatureError>() {
            Ok(sig_err) => *sig_err,
            Err(e) => SignatureError::InternalServiceError(e),
        }
    }
}
