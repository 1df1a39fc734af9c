use {
    crate::{config::ClientConfig, transport::HttpTransport},
    bytes::Bytes,
    http::{header::CONTENT_TYPE, Method, Request, Response},
    log::{debug, warn},
    qs_signature::{
        apply_query_signature, apply_signature, Channel, DelegationResponse, Endpoint, HeaderAuthorization, Operation,
        QuerySignature, SignatureArtifact, SignatureError, StringToSign, StringToSignRequest,
    },
    serde::Serialize,
    std::time::Duration,
    tower::{BoxError, Service, ServiceExt},
};

/// Obtains signatures from a remote signing service. Holds no credentials.
///
/// `T` carries the requests; [HttpTransport] in production, or any `tower::Service` (such as an
/// in-process signing service) in tests. Every round-trip is bounded by the client's timeout.
#[derive(Clone, Debug)]
pub struct DelegationClient<T = HttpTransport> {
    transport: T,
    base_url: String,
    timeout: Duration,
}

impl DelegationClient<HttpTransport> {
    /// Create an HTTP client from a [ClientConfig].
    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(HttpTransport::new(), config.base_url(), config.timeout())
    }
}

impl<T> DelegationClient<T>
where
    T: Service<Request<Bytes>, Response = Response<Bytes>, Error = BoxError> + Clone + Send,
    T::Future: Send,
{
    /// Create a client sending requests to `base_url` (scheme, host, and port; e.g.
    /// `http://127.0.0.1:9000`) through `transport`.
    pub fn new<S: Into<String>>(transport: T, base_url: S, timeout: Duration) -> Self {
        let base_url = base_url.into();
        let base_url = base_url.trim_end_matches('/').to_string();
        Self {
            transport,
            base_url,
            timeout,
        }
    }

    /// The base URL of the signing service.
    #[inline]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The per-request timeout.
    #[inline]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Ask the service to canonicalize and sign `operation` for query-parameter authentication.
    ///
    /// # Errors
    /// [SignatureError::InvalidInput] if `operation` has no `expires` (no request is sent).
    /// [SignatureError::Transport] or [SignatureError::MalformedResponse] if the round-trip fails.
    pub async fn sign_operation_by_query(&self, operation: &Operation) -> Result<QuerySignature, SignatureError> {
        if operation.expires().is_none() {
            return Err(SignatureError::expires_required());
        }

        let response = self.round_trip(Endpoint::Operation, Channel::Query, operation).await?;
        expect_query(response)
    }

    /// Ask the service to canonicalize and sign `operation` for `Authorization` header
    /// authentication.
    pub async fn sign_operation_by_header(&self, operation: &Operation) -> Result<HeaderAuthorization, SignatureError> {
        let response = self.round_trip(Endpoint::Operation, Channel::Header, operation).await?;
        expect_header(response)
    }

    /// Ask the service to sign a locally canonicalized string for query-parameter authentication.
    pub async fn sign_string_to_sign_by_query(
        &self,
        string_to_sign: &StringToSign,
        expires: i64,
    ) -> Result<QuerySignature, SignatureError> {
        let request = StringToSignRequest {
            string_to_sign: string_to_sign.to_string(),
            expires: Some(expires),
        };
        let response = self.round_trip(Endpoint::StringToSign, Channel::Query, &request).await?;
        expect_query(response)
    }

    /// Ask the service to sign a locally canonicalized string for `Authorization` header
    /// authentication.
    pub async fn sign_string_to_sign_by_header(
        &self,
        string_to_sign: &StringToSign,
    ) -> Result<HeaderAuthorization, SignatureError> {
        let request = StringToSignRequest {
            string_to_sign: string_to_sign.to_string(),
            expires: None,
        };
        let response = self.round_trip(Endpoint::StringToSign, Channel::Header, &request).await?;
        expect_header(response)
    }

    /// Sign `operation` for query-parameter authentication and add the `access_key_id`,
    /// `signature`, and `expires` parameters to it. On error the operation is left unchanged.
    pub async fn sign_and_apply_by_query(&self, operation: &mut Operation) -> Result<(), SignatureError> {
        let sig = self.sign_operation_by_query(operation).await?;
        apply_query_signature(operation, &sig.access_key_id, &sig.signature, sig.expires);
        Ok(())
    }

    /// Sign `operation` for header authentication and set its `Authorization` header. On error
    /// the operation is left unchanged.
    pub async fn sign_and_apply_by_header(&self, operation: &mut Operation) -> Result<(), SignatureError> {
        let auth = self.sign_operation_by_header(operation).await?;
        apply_signature(operation, auth.as_str())
    }

    async fn round_trip<B: Serialize>(
        &self,
        endpoint: Endpoint,
        channel: Channel,
        body: &B,
    ) -> Result<SignatureArtifact, SignatureError> {
        let uri = format!("{}{}?channel={}", self.base_url, endpoint.path(), channel);
        let body = serde_json::to_vec(body).map_err(|e| SignatureError::InternalServiceError(e.into()))?;
        let req = Request::builder()
            .method(Method::POST)
            .uri(uri.as_str())
            .header(CONTENT_TYPE, "application/json")
            .body(Bytes::from(body))
            .map_err(|e| SignatureError::InvalidInput(format!("Invalid signing service URL {}: {}", uri, e)))?;

        debug!("Requesting {} signature from {}", channel, uri);
        let call = self.transport.clone().oneshot(req);
        let response = match tokio::time::timeout(self.timeout, call).await {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => {
                warn!("Signing service {} unreachable: {}", uri, e);
                return Err(transport_error(e));
            }
            Err(_) => {
                warn!("Signing service {} timed out after {:?}", uri, self.timeout);
                return Err(SignatureError::Transport(format!(
                    "Signing service did not answer within {} ms",
                    self.timeout.as_millis()
                )));
            }
        };

        let status = response.status();
        if !status.is_success() {
            let body = String::from_utf8_lossy(response.body());
            warn!("Signing service answered {}: {}", status, body);
            return Err(SignatureError::Transport(format!("Signing service answered {}: {}", status, body)));
        }

        DelegationResponse::from_slice(response.body())?.into_artifact()
    }
}

fn transport_error(e: BoxError) -> SignatureError {
    match e.downcast::<SignatureError>() {
        Ok(e) => *e,
        Err(e) => SignatureError::Transport(e.to_string()),
    }
}

fn expect_query(artifact: SignatureArtifact) -> Result<QuerySignature, SignatureError> {
    match artifact {
        SignatureArtifact::Query(sig) => Ok(sig),
        SignatureArtifact::Header(_) => {
            Err(SignatureError::MalformedResponse("Expected a query signature, got an authorization header".to_string()))
        }
    }
}

fn expect_header(artifact: SignatureArtifact) -> Result<HeaderAuthorization, SignatureError> {
    match artifact {
        SignatureArtifact::Header(auth) => {
            auth.parse()?;
            Ok(auth)
        }
        SignatureArtifact::Query(_) => {
            Err(SignatureError::MalformedResponse("Expected an authorization header, got a query signature".to_string()))
        }
    }
}
