use {
    bytes::Bytes,
    http::{Request, Response},
    log::trace,
    std::{
        future::Future,
        pin::Pin,
        task::{Context, Poll},
    },
    tower::{BoxError, Service},
};

/// Sends delegation requests over HTTP(S) with `reqwest`.
///
/// Cloning is cheap; clones share the connection pool.
#[derive(Clone, Debug, Default)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Create a transport with a fresh connection pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a transport on top of an existing `reqwest` client.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self {
            client,
        }
    }
}

impl Service<Request<Bytes>> for HttpTransport {
    type Response = Response<Bytes>;
    type Error = BoxError;
    type Future = Pin<Box<dyn Future<Output = Result<Response<Bytes>, BoxError>> + Send>>;

    fn poll_ready(&mut self, _c: &mut Context) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<Bytes>) -> Self::Future {
        let client = self.client.clone();

        Box::pin(async move {
            let req = reqwest::Request::try_from(req)?;
            trace!("Sending {} {}", req.method(), req.url());

            let resp = client.execute(req).await?;
            let mut builder = Response::builder().status(resp.status()).version(resp.version());
            if let Some(headers) = builder.headers_mut() {
                headers.extend(resp.headers().iter().map(|(name, value)| (name.clone(), value.clone())));
            }

            let body = resp.bytes().await?;
            Ok(builder.body(body)?)
        })
    }
}
