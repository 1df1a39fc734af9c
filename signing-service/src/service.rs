use {
    crate::{
        dispatch::{dispatch, BodyFormat},
        signer::Signer,
    },
    async_trait::async_trait,
    bytes::Bytes,
    http::{
        header::{HeaderValue, ACCESS_CONTROL_ALLOW_ORIGIN, ALLOW, CONTENT_TYPE},
        Method, Request, Response, StatusCode,
    },
    http_body_util::{BodyExt, Full, LengthLimitError, Limited},
    hyper::body::{Body, Incoming},
    log::{debug, warn},
    qs_signature::{Channel, Endpoint, SignatureError},
    scratchstack_errors::ServiceError,
    serde::Serialize,
    std::{
        any::type_name,
        fmt::{Debug, Formatter, Result as FmtResult},
        future::Future,
        pin::Pin,
        task::{Context, Poll},
    },
    tower::{BoxError, Service, ServiceExt},
};

/// Content type of every JSON body this service emits.
const APPLICATION_JSON: &str = "application/json; charset=utf-8";

/// Methods allowed on the signing endpoints.
const ALLOWED_METHODS: &str = "POST, OPTIONS";

/// Default limit on the size of a request body, in bytes.
pub const DEFAULT_BODY_LIMIT: usize = 64 * 1024;

/// `SigningService` answers delegation requests on `/operation` and `/string-to-sign`.
///
/// It implements `tower::Service` over fully buffered requests, and `hyper::service::Service` over
/// streaming hyper requests (the body is collected before dispatch). Bodies larger than the body
/// limit are answered with `413 Payload Too Large` without being buffered. Errors are rendered by
/// the [ErrorMapper].
#[derive(Clone)]
pub struct SigningService<E = JsonErrorMapper>
where
    E: ErrorMapper,
{
    signer: Signer,
    error_mapper: E,
    body_limit: usize,
}

impl SigningService<JsonErrorMapper> {
    /// Create a service that renders errors as JSON.
    pub fn new(signer: Signer) -> Self {
        Self::with_error_mapper(signer, JsonErrorMapper)
    }
}

impl<E> SigningService<E>
where
    E: ErrorMapper,
{
    /// Create a service with a custom error renderer.
    pub fn with_error_mapper(signer: Signer, error_mapper: E) -> Self {
        Self {
            signer,
            error_mapper,
            body_limit: DEFAULT_BODY_LIMIT,
        }
    }

    /// Replace the request body limit, in bytes.
    pub fn with_body_limit(mut self, body_limit: usize) -> Self {
        self.body_limit = body_limit;
        self
    }

    /// The signer behind this service.
    #[inline]
    pub fn signer(&self) -> &Signer {
        &self.signer
    }

    /// The largest request body accepted, in bytes.
    #[inline]
    pub fn body_limit(&self) -> usize {
        self.body_limit
    }
}

impl<E> Debug for SigningService<E>
where
    E: ErrorMapper,
{
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        f.debug_struct("SigningService")
            .field("signer", &self.signer)
            .field("error_mapper", &type_name::<E>())
            .field("body_limit", &self.body_limit)
            .finish()
    }
}

impl<E> Service<Request<Bytes>> for SigningService<E>
where
    E: ErrorMapper,
{
    type Response = Response<Bytes>;
    type Error = BoxError;
    type Future = Pin<Box<dyn Future<Output = Result<Response<Bytes>, BoxError>> + Send>>;

    fn poll_ready(&mut self, _c: &mut Context) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<Bytes>) -> Self::Future {
        let signer = self.signer.clone();
        let error_mapper = self.error_mapper.clone();
        let body_limit = self.body_limit;

        Box::pin(async move {
            let response = if req.body().len() > body_limit {
                warn!("Request body of {} bytes exceeds the limit of {} bytes", req.body().len(), body_limit);
                payload_too_large(body_limit)?
            } else {
                handle_call(req, signer, error_mapper).await?
            };
            Ok(add_common_headers(response))
        })
    }
}

impl<E> hyper::service::Service<Request<Incoming>> for SigningService<E>
where
    E: ErrorMapper,
{
    type Response = Response<Full<Bytes>>;
    type Error = BoxError;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, BoxError>> + Send>>;

    fn call(&self, req: Request<Incoming>) -> Self::Future {
        let service = self.clone();

        Box::pin(async move {
            let (parts, body) = req.into_parts();
            let response = match collect_limited(body, service.body_limit).await? {
                Some(body) => service.oneshot(Request::from_parts(parts, body)).await?,
                None => {
                    warn!("Request body for {} exceeds the limit of {} bytes", parts.uri, service.body_limit);
                    add_common_headers(payload_too_large(service.body_limit)?)
                }
            };
            Ok(response.map(Full::new))
        })
    }
}

/// Buffer a request body of at most `limit` bytes. Returns `None` if the body is larger.
async fn collect_limited<B>(body: B, limit: usize) -> Result<Option<Bytes>, BoxError>
where
    B: Body,
    B::Error: Into<BoxError>,
{
    match Limited::new(body, limit).collect().await {
        Ok(collected) => Ok(Some(collected.to_bytes())),
        Err(e) if e.is::<LengthLimitError>() => Ok(None),
        Err(e) => Err(e),
    }
}

async fn handle_call<E>(req: Request<Bytes>, signer: Signer, error_mapper: E) -> Result<Response<Bytes>, BoxError>
where
    E: ErrorMapper,
{
    let (parts, body) = req.into_parts();
    debug!("{} {}", parts.method, parts.uri);

    if parts.method == Method::OPTIONS {
        return cors_preflight_response();
    }

    let endpoint = match Endpoint::from_path(parts.uri.path()) {
        Some(endpoint) => endpoint,
        None => {
            warn!("No route for {}", parts.uri.path());
            let message = format!("No such endpoint: {}", parts.uri.path());
            return json_response(StatusCode::NOT_FOUND, &ErrorBody::new("NotFound", &message));
        }
    };

    if parts.method != Method::POST {
        warn!("Method {} not allowed on {}", parts.method, endpoint);
        let message = format!("Method {} is not allowed on {}", parts.method, endpoint);
        let mut response = json_response(StatusCode::METHOD_NOT_ALLOWED, &ErrorBody::new("MethodNotAllowed", &message))?;
        response.headers_mut().insert(ALLOW, HeaderValue::from_static(ALLOWED_METHODS));
        return Ok(response);
    }

    let channel = Channel::from_query(parts.uri.query());
    let format = BodyFormat::from_content_type(parts.headers.get(CONTENT_TYPE).and_then(|ct| ct.to_str().ok()));

    match dispatch(endpoint, &channel, &body, format, &signer) {
        Ok(result) => {
            let response = json_response(StatusCode::OK, &result)?;
            debug!("Sending response: {}", String::from_utf8_lossy(response.body()));
            Ok(response)
        }
        Err(e) => {
            warn!("Rejected {} request on channel {:?}: {}", endpoint, channel.as_str(), e);
            error_mapper.map_error(e.into()).await
        }
    }
}

/// Converts errors raised while handling a request into a response.
#[async_trait]
pub trait ErrorMapper: Clone + Send + Sync + 'static {
    /// Render `error` as a response.
    async fn map_error(self, error: BoxError) -> Result<Response<Bytes>, BoxError>;
}

/// Renders errors as `{"code": "...", "message": "..."}` with the error's HTTP status.
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonErrorMapper;

#[async_trait]
impl ErrorMapper for JsonErrorMapper {
    async fn map_error(self, e: BoxError) -> Result<Response<Bytes>, BoxError> {
        let e = SignatureError::from(e);
        let message = e.to_string();
        json_response(ServiceError::http_status(&e), &ErrorBody::new(ServiceError::error_code(&e), &message))
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    code: &'a str,
    message: &'a str,
}

impl<'a> ErrorBody<'a> {
    fn new(code: &'a str, message: &'a str) -> Self {
        Self {
            code,
            message,
        }
    }
}

fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Result<Response<Bytes>, BoxError> {
    let body = serde_json::to_vec(body)?;
    Ok(Response::builder().status(status).header(CONTENT_TYPE, APPLICATION_JSON).body(Bytes::from(body))?)
}

fn payload_too_large(limit: usize) -> Result<Response<Bytes>, BoxError> {
    let message = format!("Request body exceeds {} bytes", limit);
    json_response(StatusCode::PAYLOAD_TOO_LARGE, &ErrorBody::new("PayloadTooLarge", &message))
}

fn cors_preflight_response() -> Result<Response<Bytes>, BoxError> {
    Ok(Response::builder()
        .status(StatusCode::NO_CONTENT)
        .header("Access-Control-Allow-Methods", ALLOWED_METHODS)
        .header("Access-Control-Allow-Headers", "Content-Type")
        .header("Access-Control-Max-Age", "86400")
        .body(Bytes::new())?)
}

fn add_common_headers(mut response: Response<Bytes>) -> Response<Bytes> {
    response.headers_mut().insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    response
}
